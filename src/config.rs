//! Run configuration shared by the extractor, plotter and reporter.
//!
//! All thresholds and naming conventions live here and are passed explicitly
//! to each component. `IdaConfig::default()` reproduces the portal-frame IDA
//! setup; a JSON file may override any subset of the fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{IdaError, IdaResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdaConfig {
    /// Peak drift (%) above which a run is classified as COLLAPSE
    pub collapse_drift_pct: f64,
    /// Window (s) around the last time step used for residual drift
    pub residual_time_tolerance: f64,
    /// End time (s) assumed when a dump carries no time markers
    pub default_end_time: f64,
    /// Dump file name is `{dump_prefix}{amplitude:.1}{dump_suffix}`
    pub dump_prefix: String,
    pub dump_suffix: String,
    /// Suffix identifying the hinge-map metadata file
    pub metadata_suffix: String,
    /// Summary CSV file name inside the IDA directory
    pub summary_file: String,
    /// Amplitudes (g) preferred for the drift time-history chart
    pub representative_amplitudes: Vec<f64>,
    pub assessment: AssessmentLimits,
    pub charts: ChartSizes,
}

impl Default for IdaConfig {
    fn default() -> Self {
        Self {
            collapse_drift_pct: 5.0,
            residual_time_tolerance: 0.01,
            default_end_time: 10.0,
            dump_prefix: "portal_A".to_string(),
            dump_suffix: "g.dat".to_string(),
            metadata_suffix: ".hinge_map.json".to_string(),
            summary_file: "ida_results_summary.csv".to_string(),
            representative_amplitudes: vec![0.1, 0.2, 0.3, 0.5, 0.7, 1.0],
            assessment: AssessmentLimits::default(),
            charts: ChartSizes::default(),
        }
    }
}

impl IdaConfig {
    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> IdaResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: IdaConfig = serde_json::from_str(&json)?;
        config.validate()?;
        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// `load` when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> IdaResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> IdaResult<()> {
        if !(self.collapse_drift_pct > 0.0) {
            return Err(IdaError::InvalidConfig(format!(
                "collapse_drift_pct must be positive, got {}",
                self.collapse_drift_pct
            )));
        }
        if self.residual_time_tolerance < 0.0 {
            return Err(IdaError::InvalidConfig(format!(
                "residual_time_tolerance must not be negative, got {}",
                self.residual_time_tolerance
            )));
        }
        if self.metadata_suffix.is_empty() {
            return Err(IdaError::InvalidConfig("metadata_suffix is empty".to_string()));
        }
        Ok(())
    }

    /// File name of the dump for one amplitude, e.g. `portal_A0.3g.dat`.
    pub fn dump_file_name(&self, amplitude: f64) -> String {
        format!("{}{:.1}{}", self.dump_prefix, amplitude, self.dump_suffix)
    }

    pub fn dump_path(&self, ida_dir: &Path, amplitude: f64) -> PathBuf {
        ida_dir.join(self.dump_file_name(amplitude))
    }

    pub fn summary_path(&self, ida_dir: &Path) -> PathBuf {
        ida_dir.join(&self.summary_file)
    }
}

/// Fixed heuristics used by the report's behavior assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentLimits {
    /// Upper bound (%) of the elastic range
    pub elastic_drift_pct: f64,
    /// Upper bound (%) of repairable inelastic deformation
    pub moderate_drift_pct: f64,
    pub residual_low_pct: f64,
    pub residual_high_pct: f64,
    /// Expected drift band (%) at 0.2 g
    pub expected_drift_02g: (f64, f64),
    /// Expected collapse band (g) for typical portal frames
    pub expected_collapse_band: (f64, f64),
    /// Drift (%) at 0.1 g that triggers a material review
    pub material_review_drift_01g: f64,
    /// Collapse amplitude (g) below which a design review is recommended
    pub design_review_amplitude: f64,
}

impl Default for AssessmentLimits {
    fn default() -> Self {
        Self {
            elastic_drift_pct: 1.0,
            moderate_drift_pct: 2.5,
            residual_low_pct: 0.5,
            residual_high_pct: 2.0,
            expected_drift_02g: (1.0, 3.0),
            expected_collapse_band: (0.6, 0.8),
            material_review_drift_01g: 1.5,
            design_review_amplitude: 0.5,
        }
    }
}

/// Pixel sizes of the rendered charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSizes {
    pub single: (u32, u32),
    pub summary: (u32, u32),
}

impl Default for ChartSizes {
    fn default() -> Self {
        Self {
            single: (1000, 750),
            summary: (1600, 1000),
        }
    }
}

/// Amplitude sweep requested on the extractor command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl Default for AmplitudeRange {
    fn default() -> Self {
        Self {
            start: 0.1,
            end: 1.0,
            step: 0.1,
        }
    }
}

impl AmplitudeRange {
    pub fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    /// Expand the sweep into amplitudes rounded to one decimal.
    ///
    /// The end bound is inclusive up to 1e-9. Steps finer than the rounding
    /// would repeat an amplitude; repeats are collapsed so the list stays
    /// strictly increasing.
    pub fn amplitudes(&self) -> IdaResult<Vec<f64>> {
        if !(self.step > 0.0) || !self.step.is_finite() {
            return Err(IdaError::InvalidConfig(format!(
                "amplitude step must be positive, got {}",
                self.step
            )));
        }
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(IdaError::InvalidConfig(
                "amplitude bounds must be finite".to_string(),
            ));
        }

        let mut amplitudes: Vec<f64> = Vec::new();
        let mut a = self.start;
        while a <= self.end + 1e-9 {
            let rounded = round_to_tenth(a);
            if amplitudes.last().map_or(true, |&last| rounded > last) {
                amplitudes.push(rounded);
            }
            a += self.step;
        }
        Ok(amplitudes)
    }
}

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sweep() {
        let amps = AmplitudeRange::default().amplitudes().unwrap();
        assert_eq!(amps, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]);
    }

    #[test]
    fn test_fine_step_does_not_repeat() {
        let amps = AmplitudeRange::new(0.1, 0.3, 0.05).amplitudes().unwrap();
        assert_eq!(amps, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_zero_step_rejected() {
        let err = AmplitudeRange::new(0.1, 1.0, 0.0).amplitudes().unwrap_err();
        assert!(matches!(err, IdaError::InvalidConfig(_)));
    }

    #[test]
    fn test_dump_file_name() {
        let config = IdaConfig::default();
        assert_eq!(config.dump_file_name(0.3), "portal_A0.3g.dat");
        assert_eq!(config.dump_file_name(1.0), "portal_A1.0g.dat");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: IdaConfig = serde_json::from_str(r#"{"collapse_drift_pct": 4.0}"#).unwrap();
        assert_eq!(config.collapse_drift_pct, 4.0);
        assert_eq!(config.summary_file, "ida_results_summary.csv");
        assert_eq!(config.assessment.expected_collapse_band, (0.6, 0.8));
    }
}
