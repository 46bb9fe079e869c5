//! Summary CSV shared by the three stages.
//!
//! The column layout is described once by [`SummarySchema`]: eight fixed
//! columns followed by one `Peak_theta_<hinge>_rad` column per hinge. The
//! writer formats records through it and the reader rebuilds it from the
//! header row.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{IdaError, IdaResult};
use crate::metadata::HingeMap;
use crate::metrics::{AmplitudeMetrics, Status};

pub const AMPLITUDE: &str = "Amplitude_g";
pub const PEAK_DRIFT_CM: &str = "Peak_Drift_cm";
pub const PEAK_DRIFT_PCT: &str = "Peak_Drift_pct";
pub const RESIDUAL_DRIFT_CM: &str = "Residual_Drift_cm";
pub const RESIDUAL_DRIFT_PCT: &str = "Residual_Drift_pct";
pub const STATUS: &str = "Status";
pub const PEAK_BASE_SHEAR: &str = "Peak_Vb_kN";
pub const ENERGY: &str = "Energy_kNm";

const HINGE_PREFIX: &str = "Peak_theta_";
const HINGE_SUFFIX: &str = "_rad";

/// What a column holds and how it is formatted.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    Amplitude,
    PeakDriftCm,
    PeakDriftPct,
    ResidualDriftCm,
    ResidualDriftPct,
    Status,
    PeakBaseShear,
    Energy,
    HingeRotation(String),
}

const FIXED_COLUMNS: [(&str, ColumnKind); 8] = [
    (AMPLITUDE, ColumnKind::Amplitude),
    (PEAK_DRIFT_CM, ColumnKind::PeakDriftCm),
    (PEAK_DRIFT_PCT, ColumnKind::PeakDriftPct),
    (RESIDUAL_DRIFT_CM, ColumnKind::ResidualDriftCm),
    (RESIDUAL_DRIFT_PCT, ColumnKind::ResidualDriftPct),
    (STATUS, ColumnKind::Status),
    (PEAK_BASE_SHEAR, ColumnKind::PeakBaseShear),
    (ENERGY, ColumnKind::Energy),
];

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryColumn {
    pub header: String,
    pub kind: ColumnKind,
}

impl SummaryColumn {
    /// Amplitude 1 decimal, drifts 3, shear and energy 2, rotations 6.
    pub fn format(&self, m: &AmplitudeMetrics) -> String {
        match &self.kind {
            ColumnKind::Amplitude => format!("{:.1}", m.amplitude),
            ColumnKind::PeakDriftCm => format!("{:.3}", m.peak_drift_cm),
            ColumnKind::PeakDriftPct => format!("{:.3}", m.peak_drift_pct),
            ColumnKind::ResidualDriftCm => format!("{:.3}", m.residual_drift_cm),
            ColumnKind::ResidualDriftPct => format!("{:.3}", m.residual_drift_pct),
            ColumnKind::Status => m.status.to_string(),
            ColumnKind::PeakBaseShear => format!("{:.2}", m.peak_base_shear_kn),
            ColumnKind::Energy => format!("{:.2}", m.energy_dissipated_knm),
            ColumnKind::HingeRotation(name) => format!("{:.6}", m.rotation(name)),
        }
    }
}

pub fn hinge_header(name: &str) -> String {
    format!("{}{}{}", HINGE_PREFIX, name, HINGE_SUFFIX)
}

/// Hinge name encoded in a rotation header, if `header` is one.
pub fn hinge_from_header(header: &str) -> Option<&str> {
    header
        .strip_prefix(HINGE_PREFIX)
        .and_then(|rest| rest.strip_suffix(HINGE_SUFFIX))
        .filter(|name| !name.is_empty())
}

/// Ordered column layout of the summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarySchema {
    columns: Vec<SummaryColumn>,
}

impl SummarySchema {
    pub fn new<S: AsRef<str>>(hinge_names: &[S]) -> Self {
        let mut columns: Vec<SummaryColumn> = FIXED_COLUMNS
            .iter()
            .map(|(header, kind)| SummaryColumn {
                header: header.to_string(),
                kind: kind.clone(),
            })
            .collect();
        columns.extend(hinge_names.iter().map(|name| SummaryColumn {
            header: hinge_header(name.as_ref()),
            kind: ColumnKind::HingeRotation(name.as_ref().to_string()),
        }));
        Self { columns }
    }

    pub fn from_hinge_map(hinge_map: &HingeMap) -> Self {
        Self::new(hinge_map.hinge_names().as_slice())
    }

    /// Rebuild the schema from a header row. Hinge columns are recognised by
    /// their name pattern; unrelated extra columns are ignored.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> IdaResult<Self> {
        for (required, _) in FIXED_COLUMNS.iter() {
            if !headers.iter().any(|h| h.as_ref() == *required) {
                return Err(IdaError::MalformedSummary(format!(
                    "missing column '{}'",
                    required
                )));
            }
        }
        let hinge_names: Vec<&str> = headers
            .iter()
            .filter_map(|h| hinge_from_header(h.as_ref()))
            .collect();
        Ok(Self::new(hinge_names.as_slice()))
    }

    pub fn columns(&self) -> &[SummaryColumn] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    pub fn hinge_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| match &c.kind {
                ColumnKind::HingeRotation(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn format_row(&self, m: &AmplitudeMetrics) -> Vec<String> {
        self.columns.iter().map(|c| c.format(m)).collect()
    }
}

/// CSV text for `results`, header first.
pub fn render_summary(schema: &SummarySchema, results: &[AmplitudeMetrics]) -> String {
    let mut csv = join_csv_line(schema.headers());
    csv.push('\n');
    for m in results {
        csv.push_str(&join_csv_line(schema.format_row(m)));
        csv.push('\n');
    }
    csv
}

pub fn write_summary(
    path: &Path,
    schema: &SummarySchema,
    results: &[AmplitudeMetrics],
) -> IdaResult<()> {
    std::fs::write(path, render_summary(schema, results))?;
    tracing::info!("Wrote {} rows to {:?}", results.len(), path);
    Ok(())
}

/// One loosely-typed row: every value kept as text, parsed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    fields: BTreeMap<String, String>,
}

impl SummaryRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn number(&self, column: &str) -> IdaResult<f64> {
        let raw = self
            .get(column)
            .ok_or_else(|| IdaError::MalformedSummary(format!("missing column '{}'", column)))?;
        raw.trim().parse::<f64>().map_err(|_| {
            IdaError::MalformedSummary(format!("'{}' is not a number in column '{}'", raw, column))
        })
    }

    pub fn amplitude(&self) -> IdaResult<f64> {
        self.number(AMPLITUDE)
    }

    pub fn peak_drift_pct(&self) -> IdaResult<f64> {
        self.number(PEAK_DRIFT_PCT)
    }

    pub fn residual_drift_pct(&self) -> IdaResult<f64> {
        self.number(RESIDUAL_DRIFT_PCT)
    }

    pub fn status(&self) -> IdaResult<Status> {
        self.get(STATUS)
            .ok_or_else(|| IdaError::MalformedSummary(format!("missing column '{}'", STATUS)))?
            .parse()
    }

    pub fn rotation(&self, hinge: &str) -> IdaResult<f64> {
        self.number(&hinge_header(hinge))
    }

    /// Parse every column of the schema into a typed record.
    pub fn to_metrics(&self, schema: &SummarySchema) -> IdaResult<AmplitudeMetrics> {
        let peak_rotations = schema
            .hinge_names()
            .into_iter()
            .map(|name| self.rotation(name).map(|theta| (name.to_string(), theta)))
            .collect::<IdaResult<BTreeMap<String, f64>>>()?;

        Ok(AmplitudeMetrics {
            amplitude: self.amplitude()?,
            peak_drift_cm: self.number(PEAK_DRIFT_CM)?,
            peak_drift_pct: self.peak_drift_pct()?,
            residual_drift_cm: self.number(RESIDUAL_DRIFT_CM)?,
            residual_drift_pct: self.residual_drift_pct()?,
            status: self.status()?,
            peak_base_shear_kn: self.number(PEAK_BASE_SHEAR)?,
            energy_dissipated_knm: self.number(ENERGY)?,
            peak_rotations,
        })
    }
}

/// Summary table as read back from disk.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    pub schema: SummarySchema,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn parse(content: &str) -> IdaResult<Self> {
        let mut lines = content
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty());

        let (_, header_line) = lines
            .next()
            .ok_or_else(|| IdaError::MalformedSummary("missing header row".to_string()))?;
        let headers = split_csv_line(header_line);
        let schema = SummarySchema::from_headers(headers.as_slice())?;

        let mut rows = Vec::new();
        for (idx, line) in lines {
            let values = split_csv_line(line);
            if values.len() != headers.len() {
                return Err(IdaError::MalformedSummary(format!(
                    "line {} has {} fields, expected {}",
                    idx + 1,
                    values.len(),
                    headers.len()
                )));
            }
            rows.push(SummaryRow {
                fields: headers.iter().cloned().zip(values).collect(),
            });
        }

        Ok(Self { schema, rows })
    }

    pub fn read(path: &Path) -> IdaResult<Self> {
        if !path.is_file() {
            return Err(IdaError::SummaryNotFound(path.to_path_buf()));
        }
        let table = Self::parse(&std::fs::read_to_string(path)?)?;
        tracing::info!("Loaded {} results from {:?}", table.rows.len(), path);
        Ok(table)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn to_metrics(&self) -> IdaResult<Vec<AmplitudeMetrics>> {
        self.rows.iter().map(|r| r.to_metrics(&self.schema)).collect()
    }
}

/// Read the summary CSV at `path`.
pub fn read_summary(path: &Path) -> IdaResult<SummaryTable> {
    SummaryTable::read(path)
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn join_csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(amplitude: f64, drift_pct: f64, status: Status) -> AmplitudeMetrics {
        let mut peak_rotations = BTreeMap::new();
        peak_rotations.insert("H_L".to_string(), 0.0);
        peak_rotations.insert("H_R".to_string(), 0.0);
        AmplitudeMetrics {
            amplitude,
            peak_drift_cm: drift_pct * 3.0,
            peak_drift_pct: drift_pct,
            residual_drift_cm: 0.123_456,
            residual_drift_pct: 0.041_152,
            status,
            peak_base_shear_kn: 0.0,
            energy_dissipated_knm: 0.0,
            peak_rotations,
        }
    }

    #[test]
    fn test_header_layout() {
        let schema = SummarySchema::new(&["H_L", "H_R"]);
        assert_eq!(
            schema.headers(),
            vec![
                "Amplitude_g",
                "Peak_Drift_cm",
                "Peak_Drift_pct",
                "Residual_Drift_cm",
                "Residual_Drift_pct",
                "Status",
                "Peak_Vb_kN",
                "Energy_kNm",
                "Peak_theta_H_L_rad",
                "Peak_theta_H_R_rad",
            ]
        );
    }

    #[test]
    fn test_row_precision() {
        let schema = SummarySchema::new(&["H_L", "H_R"]);
        let row = schema.format_row(&sample(0.3, 1.234_56, Status::Ok));
        assert_eq!(
            row,
            vec!["0.3", "3.704", "1.235", "0.123", "0.041", "OK", "0.00", "0.00", "0.000000", "0.000000"]
        );
    }

    #[test]
    fn test_round_trip() {
        let schema = SummarySchema::new(&["H_L", "H_R"]);
        let written = vec![sample(0.1, 0.8, Status::Ok), sample(0.7, 6.1, Status::Collapse)];
        let table = SummaryTable::parse(&render_summary(&schema, &written)).unwrap();

        assert_eq!(table.schema, schema);
        assert_eq!(table.len(), 2);
        let read = table.to_metrics().unwrap();
        assert_eq!(read[0].amplitude, 0.1);
        assert_eq!(read[1].amplitude, 0.7);
        assert_eq!(read[1].peak_drift_pct, 6.1);
        assert_eq!(read[1].status, Status::Collapse);
        assert_eq!(read[0].residual_drift_cm, 0.123);
        assert_eq!(read[0].rotation("H_R"), 0.0);
    }

    #[test]
    fn test_hinge_names_recovered_from_headers() {
        assert_eq!(hinge_from_header("Peak_theta_H_TL_rad"), Some("H_TL"));
        assert_eq!(hinge_from_header("Peak_theta__rad"), None);
        assert_eq!(hinge_from_header("Status"), None);
    }

    #[test]
    fn test_missing_fixed_column_rejected() {
        let err = SummaryTable::parse("Amplitude_g,Status\n0.1,OK\n").unwrap_err();
        assert!(matches!(err, IdaError::MalformedSummary(_)));
    }

    #[test]
    fn test_quoted_hinge_name() {
        let schema = SummarySchema::new(&["H,1"]);
        let mut m = sample(0.2, 1.0, Status::Ok);
        m.peak_rotations.insert("H,1".to_string(), 0.0);
        let csv = render_summary(&schema, &[m]);
        assert!(csv.starts_with("Amplitude_g,"));
        assert!(csv.contains("\"Peak_theta_H,1_rad\""));

        let table = SummaryTable::parse(&csv).unwrap();
        assert_eq!(table.schema.hinge_names(), vec!["H,1"]);
    }

    #[test]
    fn test_crlf_lines_accepted() {
        let schema = SummarySchema::new::<&str>(&[]);
        let csv = render_summary(&schema, &[sample(0.1, 0.5, Status::Ok)]).replace('\n', "\r\n");
        let table = SummaryTable::parse(&csv).unwrap();
        assert_eq!(table.rows[0].status().unwrap(), Status::Ok);
    }
}
