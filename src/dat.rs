//! Parser for CalculiX `.dat` time-history output.
//!
//! A transient run prints, for every written increment, blocks such as
//!
//! ```text
//!  displacements (vx,vy,vz) for set NALL and time  0.1000000E+00
//!
//!          1  1.234000E-03  0.000000E+00  0.000000E+00
//!          2  1.198000E-03 -2.100000E-05  0.000000E+00
//! ```
//!
//! The parser keeps the latest time marker and tags every nodal row of the
//! active block with it.

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::IdaResult;

const TIME_PATTERN: &str = r"(?i)time\s+(\d+\.\d+[eE]?[+-]?\d*)";
const ROW_PATTERN: &str = r"^\s*(\d+)\s+([-+]?\d+\.\d+[eE]?[-+]?\d*)\s+([-+]?\d+\.\d+[eE]?[-+]?\d*)\s+([-+]?\d+\.\d+[eE]?[-+]?\d*)";

/// One nodal row: time plus the three printed components
/// (U1..U3 for displacements, F1..F3 for forces).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodalSample {
    pub time: f64,
    pub components: [f64; 3],
}

impl NodalSample {
    /// First component (global X), the horizontal direction of the frame.
    pub fn horizontal(&self) -> f64 {
        self.components[0]
    }
}

/// Time histories recovered from one `.dat` file.
#[derive(Debug, Clone, Default)]
pub struct DatResults {
    /// Distinct time markers in order of first appearance
    pub time_steps: Vec<f64>,
    pub displacements: BTreeMap<u32, Vec<NodalSample>>,
    pub forces: BTreeMap<u32, Vec<NodalSample>>,
}

impl DatResults {
    /// No displacement rows were found.
    pub fn is_empty(&self) -> bool {
        self.displacements.is_empty()
    }

    pub fn end_time(&self) -> Option<f64> {
        self.time_steps.iter().copied().reduce(f64::max)
    }

    /// Horizontal displacement history of the roof: for every time step the
    /// signed U1 with the largest magnitude over all nodes.
    pub fn roof_drift_history(&self) -> Vec<(f64, f64)> {
        let index: HashMap<u64, usize> = self
            .time_steps
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_bits(), i))
            .collect();

        let mut peaks: Vec<Option<f64>> = vec![None; self.time_steps.len()];
        for sample in self.displacements.values().flatten() {
            if let Some(&i) = index.get(&sample.time.to_bits()) {
                let u1 = sample.horizontal();
                match peaks[i] {
                    Some(current) if current.abs() >= u1.abs() => {}
                    _ => peaks[i] = Some(u1),
                }
            }
        }

        self.time_steps
            .iter()
            .zip(peaks)
            .filter_map(|(&t, peak)| peak.map(|u| (t, u)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Displacements,
    Forces,
}

/// Line-oriented `.dat` scanner.
pub struct DatParser {
    time_re: Regex,
    row_re: Regex,
}

impl DatParser {
    pub fn new() -> IdaResult<Self> {
        Ok(Self {
            time_re: Regex::new(TIME_PATTERN)?,
            row_re: Regex::new(ROW_PATTERN)?,
        })
    }

    pub fn parse_file(&self, path: &Path) -> IdaResult<DatResults> {
        // Job titles echoed into the header may carry non-UTF-8 bytes
        let bytes = std::fs::read(path)?;
        let results = self.parse_str(&String::from_utf8_lossy(&bytes));
        tracing::debug!(
            "Parsed {:?}: {} time steps, {} displacement nodes, {} force nodes",
            path,
            results.time_steps.len(),
            results.displacements.len(),
            results.forces.len()
        );
        Ok(results)
    }

    pub fn parse_str(&self, content: &str) -> DatResults {
        let mut results = DatResults::default();
        let mut current_time = 0.0;
        let mut section = Section::None;
        // CalculiX separates a block header from its first row with one blank line
        let mut header_gap = false;

        for line in content.lines() {
            if let Some(caps) = self.time_re.captures(line) {
                if let Ok(t) = caps[1].parse::<f64>() {
                    current_time = t;
                    if !results.time_steps.contains(&t) {
                        results.time_steps.push(t);
                    }
                }
            }

            let line_lower = line.to_lowercase();
            if line_lower.contains("displacements (vx,vy,vz) for set")
                || (line_lower.contains("displacements") && line_lower.contains("set"))
            {
                section = Section::Displacements;
                header_gap = true;
                continue;
            }
            if line_lower.contains("forces (fx,fy,fz) for set") {
                section = Section::Forces;
                header_gap = true;
                continue;
            }
            // Any other block (stresses, energies, ...) ends the current one
            if line_lower.contains(" for set") {
                section = Section::None;
                header_gap = false;
                continue;
            }

            if line.starts_with('*') {
                section = Section::None;
            } else if line.trim().is_empty() {
                if header_gap {
                    header_gap = false;
                    continue;
                }
                section = Section::None;
            }

            let target = match section {
                Section::Displacements => &mut results.displacements,
                Section::Forces => &mut results.forces,
                Section::None => continue,
            };

            if let Some((node_id, sample)) = self.parse_row(line, current_time) {
                target.entry(node_id).or_insert_with(Vec::new).push(sample);
                header_gap = false;
            }
        }

        results
    }

    /// Rows with unparsable tokens are dropped.
    fn parse_row(&self, line: &str, time: f64) -> Option<(u32, NodalSample)> {
        let caps = self.row_re.captures(line)?;
        let node_id = caps[1].parse::<u32>().ok()?;
        let c1 = caps[2].parse::<f64>().ok()?;
        let c2 = caps[3].parse::<f64>().ok()?;
        let c3 = caps[4].parse::<f64>().ok()?;
        Some((
            node_id,
            NodalSample {
                time,
                components: [c1, c2, c3],
            },
        ))
    }
}

/// Parse a `.dat` file with a freshly built parser.
pub fn parse_dat_file(path: &Path) -> IdaResult<DatResults> {
    DatParser::new()?.parse_file(path)
}

/// Parse `.dat` content held in memory.
pub fn parse_dat_str(content: &str) -> IdaResult<DatResults> {
    Ok(DatParser::new()?.parse_str(content))
}
