//! Per-amplitude response metrics and reductions over a whole IDA sweep.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::config::{AssessmentLimits, IdaConfig};
use crate::dat::{DatParser, DatResults};
use crate::error::{IdaError, IdaResult};
use crate::metadata::HingeMap;

/// Outcome classification of one amplitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    Collapse,
    /// Reserved for runs that did not finish; the extractor never assigns it.
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Collapse => "COLLAPSE",
            Status::Failed => "FAILED",
        }
    }

    /// Marker used in the report's performance table.
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Ok => "✓",
            Status::Collapse => "⚠",
            Status::Failed => "✗",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = IdaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "OK" => Ok(Status::Ok),
            "COLLAPSE" => Ok(Status::Collapse),
            "FAILED" => Ok(Status::Failed),
            other => Err(IdaError::MalformedSummary(format!("unknown status '{}'", other))),
        }
    }
}

/// `COLLAPSE` strictly above the threshold, `OK` otherwise.
pub fn classify(peak_drift_pct: f64, collapse_drift_pct: f64) -> Status {
    if peak_drift_pct > collapse_drift_pct {
        Status::Collapse
    } else {
        Status::Ok
    }
}

/// Scalar response of one amplitude.
#[derive(Debug, Clone, PartialEq)]
pub struct AmplitudeMetrics {
    /// Ground-motion amplitude (g)
    pub amplitude: f64,
    pub peak_drift_cm: f64,
    pub peak_drift_pct: f64,
    pub residual_drift_cm: f64,
    pub residual_drift_pct: f64,
    pub status: Status,
    /// Always zero: reactions are not reduced to a base shear yet
    pub peak_base_shear_kn: f64,
    /// Always zero: hysteretic energy is not integrated yet
    pub energy_dissipated_knm: f64,
    /// Peak plastic rotation (rad) per hinge name; always zero for now
    pub peak_rotations: BTreeMap<String, f64>,
}

impl AmplitudeMetrics {
    pub fn rotation(&self, hinge: &str) -> f64 {
        self.peak_rotations.get(hinge).copied().unwrap_or(0.0)
    }
}

/// Reduce one parsed dump to its metrics. `None` when the dump holds no
/// displacement rows.
pub fn compute_metrics(
    amplitude: f64,
    dat: &DatResults,
    hinge_map: &HingeMap,
    config: &IdaConfig,
) -> Option<AmplitudeMetrics> {
    if dat.is_empty() {
        return None;
    }

    let height = hinge_map.geometry.height;
    let t_end = dat.end_time().unwrap_or(config.default_end_time);

    let mut peak_u1: f64 = 0.0;
    let mut residual_u1: f64 = 0.0;
    for sample in dat.displacements.values().flatten() {
        let u1 = sample.horizontal();
        peak_u1 = peak_u1.max(u1.abs());

        if (sample.time - t_end).abs() < config.residual_time_tolerance
            && u1.abs() > residual_u1.abs()
        {
            residual_u1 = u1;
        }
    }

    let peak_drift_pct = peak_u1 / height * 100.0;
    let residual_abs = residual_u1.abs();

    let peak_rotations = hinge_map
        .hinges
        .iter()
        .map(|h| (h.name.clone(), 0.0))
        .collect();

    Some(AmplitudeMetrics {
        amplitude,
        peak_drift_cm: peak_u1 * 100.0,
        peak_drift_pct,
        residual_drift_cm: residual_abs * 100.0,
        residual_drift_pct: residual_abs / height * 100.0,
        status: classify(peak_drift_pct, config.collapse_drift_pct),
        peak_base_shear_kn: 0.0,
        energy_dissipated_knm: 0.0,
        peak_rotations,
    })
}

/// Parse the dump of `amplitude` in `ida_dir` and compute its metrics.
///
/// A missing dump, or one without displacement rows, yields `Ok(None)`:
/// the amplitude is skipped rather than failing the sweep.
pub fn extract_amplitude(
    parser: &DatParser,
    ida_dir: &Path,
    amplitude: f64,
    hinge_map: &HingeMap,
    config: &IdaConfig,
) -> IdaResult<Option<AmplitudeMetrics>> {
    let dat_path = config.dump_path(ida_dir, amplitude);
    if !dat_path.exists() {
        tracing::info!("No dump for A = {:.1}g ({:?})", amplitude, dat_path);
        return Ok(None);
    }

    tracing::info!("Parsing {:?}", dat_path);
    let dat = parser.parse_file(&dat_path)?;

    let metrics = compute_metrics(amplitude, &dat, hinge_map, config);
    if metrics.is_none() {
        tracing::warn!("No displacement data found in {:?}", dat_path);
    }
    Ok(metrics)
}

/// Reductions over a completed sweep, shared by the console summary, the
/// summary chart and the report.
#[derive(Debug, Clone, PartialEq)]
pub struct IdaSummary {
    pub run_count: usize,
    pub min_amplitude: f64,
    pub max_amplitude: f64,
    /// Spacing between the first two amplitudes, if there are two
    pub amplitude_step: Option<f64>,
    /// First amplitude classified as COLLAPSE and its peak drift (%)
    pub collapse: Option<(f64, f64)>,
    pub collapse_count: usize,
    pub max_drift_pct: f64,
    pub max_drift_amplitude: f64,
    pub min_drift_pct: f64,
    pub max_residual_pct: f64,
    pub max_base_shear_kn: f64,
    pub max_energy_knm: f64,
    /// Largest amplitude with drift below the elastic limit
    pub elastic_limit_amplitude: Option<f64>,
    /// Amplitude span with drift between the elastic and collapse limits
    pub plastic_range: Option<(f64, f64)>,
    /// Status counts in order of first appearance
    pub status_counts: Vec<(Status, usize)>,
}

impl IdaSummary {
    /// `None` for an empty sweep.
    pub fn from_metrics(
        results: &[AmplitudeMetrics],
        limits: &AssessmentLimits,
        collapse_drift_pct: f64,
    ) -> Option<Self> {
        let first = results.first()?;

        let mut max_drift = (first.peak_drift_pct, first.amplitude);
        let mut summary = IdaSummary {
            run_count: results.len(),
            min_amplitude: first.amplitude,
            max_amplitude: first.amplitude,
            amplitude_step: results.get(1).map(|r| r.amplitude - first.amplitude),
            collapse: None,
            collapse_count: 0,
            max_drift_pct: first.peak_drift_pct,
            max_drift_amplitude: first.amplitude,
            min_drift_pct: first.peak_drift_pct,
            max_residual_pct: first.residual_drift_pct,
            max_base_shear_kn: first.peak_base_shear_kn,
            max_energy_knm: first.energy_dissipated_knm,
            elastic_limit_amplitude: None,
            plastic_range: None,
            status_counts: Vec::new(),
        };

        for r in results {
            summary.min_amplitude = summary.min_amplitude.min(r.amplitude);
            summary.max_amplitude = summary.max_amplitude.max(r.amplitude);
            if r.peak_drift_pct > max_drift.0 {
                max_drift = (r.peak_drift_pct, r.amplitude);
            }
            summary.min_drift_pct = summary.min_drift_pct.min(r.peak_drift_pct);
            summary.max_residual_pct = summary.max_residual_pct.max(r.residual_drift_pct);
            summary.max_base_shear_kn = summary.max_base_shear_kn.max(r.peak_base_shear_kn);
            summary.max_energy_knm = summary.max_energy_knm.max(r.energy_dissipated_knm);

            if r.status == Status::Collapse {
                summary.collapse_count += 1;
                if summary.collapse.is_none() {
                    summary.collapse = Some((r.amplitude, r.peak_drift_pct));
                }
            }

            match summary.status_counts.iter_mut().find(|(s, _)| *s == r.status) {
                Some((_, count)) => *count += 1,
                None => summary.status_counts.push((r.status, 1)),
            }

            if r.peak_drift_pct < limits.elastic_drift_pct {
                summary.elastic_limit_amplitude = Some(
                    summary
                        .elastic_limit_amplitude
                        .map_or(r.amplitude, |a| a.max(r.amplitude)),
                );
            } else if r.peak_drift_pct < collapse_drift_pct {
                summary.plastic_range = Some(match summary.plastic_range {
                    Some((lo, hi)) => (lo.min(r.amplitude), hi.max(r.amplitude)),
                    None => (r.amplitude, r.amplitude),
                });
            }
        }

        summary.max_drift_pct = max_drift.0;
        summary.max_drift_amplitude = max_drift.1;
        Some(summary)
    }

    pub fn collapse_amplitude(&self) -> Option<f64> {
        self.collapse.map(|(a, _)| a)
    }
}

/// Peak drift (%) recorded for `amplitude`, if it was analyzed.
pub fn drift_at(results: &[AmplitudeMetrics], amplitude: f64) -> Option<f64> {
    results
        .iter()
        .find(|r| (r.amplitude - amplitude).abs() < 1e-9)
        .map(|r| r.peak_drift_pct)
}
