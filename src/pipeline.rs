//! Stage drivers shared by the binaries.

use std::path::{Path, PathBuf};

use crate::config::{AmplitudeRange, IdaConfig};
use crate::dat::DatParser;
use crate::error::{IdaError, IdaResult};
use crate::metadata::HingeMap;
use crate::metrics::{extract_amplitude, AmplitudeMetrics};
use crate::summary::{write_summary, SummarySchema, SummaryTable};

/// What the extraction stage produced.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// Amplitudes (g) requested on the command line
    pub requested: Vec<f64>,
    /// Metrics of the amplitudes that had data, in sweep order
    pub results: Vec<AmplitudeMetrics>,
    pub hinge_map: HingeMap,
    pub schema: SummarySchema,
    pub summary_path: PathBuf,
}

impl ExtractionOutcome {
    pub fn skipped(&self) -> usize {
        self.requested.len() - self.results.len()
    }
}

fn require_dir(ida_dir: &Path) -> IdaResult<()> {
    if ida_dir.is_dir() {
        Ok(())
    } else {
        Err(IdaError::DirectoryNotFound(ida_dir.to_path_buf()))
    }
}

/// Extract every amplitude of `range` from `ida_dir` and write the summary
/// table to `ida_dir/output_name`.
///
/// Amplitudes without a dump, or whose dump has no displacement rows, are
/// skipped. A missing directory or hinge map is fatal.
pub fn run_extraction(
    ida_dir: &Path,
    output_name: &str,
    range: &AmplitudeRange,
    config: &IdaConfig,
) -> IdaResult<ExtractionOutcome> {
    require_dir(ida_dir)?;
    let hinge_map = HingeMap::discover(ida_dir, &config.metadata_suffix)?;
    let requested = range.amplitudes()?;
    let parser = DatParser::new()?;

    tracing::info!("Amplitudes: {:?}", requested);

    let mut results = Vec::new();
    for (i, &amplitude) in requested.iter().enumerate() {
        tracing::info!("[{}/{}] Extracting A = {:.1}g", i + 1, requested.len(), amplitude);

        match extract_amplitude(&parser, ida_dir, amplitude, &hinge_map, config)? {
            Some(m) => {
                tracing::info!(
                    "  Peak drift: {:.2} cm ({:.2}%), residual: {:.2} cm ({:.2}%), status: {}",
                    m.peak_drift_cm,
                    m.peak_drift_pct,
                    m.residual_drift_cm,
                    m.residual_drift_pct,
                    m.status
                );
                results.push(m);
            }
            None => tracing::info!("  Skipping (no data)"),
        }
    }

    tracing::info!("Extracted {} results", results.len());

    let schema = SummarySchema::from_hinge_map(&hinge_map);
    let summary_path = ida_dir.join(output_name);
    write_summary(&summary_path, &schema, &results)?;

    Ok(ExtractionOutcome {
        requested,
        results,
        hinge_map,
        schema,
        summary_path,
    })
}

/// Summary table and metadata as consumed by the plotter and the reporter.
#[derive(Debug, Clone)]
pub struct LoadedSummary {
    pub table: SummaryTable,
    pub results: Vec<AmplitudeMetrics>,
    pub hinge_map: HingeMap,
    pub summary_path: PathBuf,
}

/// Read `ida_dir/summary_name` and the hinge map next to it.
///
/// Fails when the directory or the table is missing and when the table has
/// no result rows. A missing hinge map falls back to the default frame.
pub fn load_summary(
    ida_dir: &Path,
    summary_name: &str,
    config: &IdaConfig,
) -> IdaResult<LoadedSummary> {
    require_dir(ida_dir)?;

    let summary_path = ida_dir.join(summary_name);
    let table = SummaryTable::read(&summary_path)?;
    if table.is_empty() {
        return Err(IdaError::EmptySummary(summary_path));
    }
    let results = table.to_metrics()?;
    let hinge_map = HingeMap::discover_or_default(ida_dir, &config.metadata_suffix)?;

    Ok(LoadedSummary {
        table,
        results,
        hinge_map,
        summary_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_is_fatal() {
        let err = run_extraction(
            Path::new("/nonexistent/ida"),
            "out.csv",
            &AmplitudeRange::default(),
            &IdaConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IdaError::DirectoryNotFound(_)));

        let err = load_summary(Path::new("/nonexistent/ida"), "out.csv", &IdaConfig::default())
            .unwrap_err();
        assert!(matches!(err, IdaError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_missing_metadata_is_fatal_for_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_extraction(
            dir.path(),
            "out.csv",
            &AmplitudeRange::default(),
            &IdaConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IdaError::MetadataNotFound { .. }));
    }

    #[test]
    fn test_header_only_summary_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("s.csv"),
            "Amplitude_g,Peak_Drift_cm,Peak_Drift_pct,Residual_Drift_cm,Residual_Drift_pct,Status,Peak_Vb_kN,Energy_kNm\n",
        )
        .unwrap();
        let err = load_summary(dir.path(), "s.csv", &IdaConfig::default()).unwrap_err();
        assert!(matches!(err, IdaError::EmptySummary(_)));

        let err = load_summary(dir.path(), "missing.csv", &IdaConfig::default()).unwrap_err();
        assert!(matches!(err, IdaError::SummaryNotFound(_)));
    }
}
