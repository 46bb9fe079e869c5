//! IDA post-processing - extraction, charts and reporting for CalculiX
//! Incremental Dynamic Analysis runs of a single-story portal frame.
//!
//! The toolkit runs as three batch stages chained through files:
//! - Result extraction: per-amplitude `.dat` dumps to a summary CSV
//! - Plotting: six validation charts as PNG and SVG
//! - Reporting: a markdown validation report linking the charts
//!
//! ## Example
//! ```rust,no_run
//! use ida_postprocess::prelude::*;
//! use std::path::Path;
//!
//! let config = IdaConfig::default();
//! let range = AmplitudeRange::new(0.1, 1.0, 0.1);
//!
//! // Extract every available amplitude and write the summary table
//! let outcome = run_extraction(Path::new("ida"), "ida_results_summary.csv", &range, &config)?;
//!
//! if let Some(summary) = IdaSummary::from_metrics(
//!     &outcome.results,
//!     &config.assessment,
//!     config.collapse_drift_pct,
//! ) {
//!     println!("collapse at {:?}", summary.collapse_amplitude());
//! }
//! # Ok::<(), IdaError>(())
//! ```

pub mod config;
pub mod dat;
pub mod error;
pub mod metadata;
pub mod metrics;
pub mod pipeline;
pub mod plots;
pub mod report;
pub mod summary;

// Re-export common types
pub mod prelude {
    pub use crate::config::{AmplitudeRange, AssessmentLimits, ChartSizes, IdaConfig};
    pub use crate::dat::{parse_dat_file, parse_dat_str, DatParser, DatResults, NodalSample};
    pub use crate::error::{IdaError, IdaResult};
    pub use crate::metadata::{FrameGeometry, HingeDefinition, HingeMap, SectionDims};
    pub use crate::metrics::{
        classify, compute_metrics, extract_amplitude, AmplitudeMetrics, IdaSummary, Status,
    };
    pub use crate::pipeline::{load_summary, run_extraction, ExtractionOutcome, LoadedSummary};
    pub use crate::plots::{ChartKind, PlotData, PlotGenerator};
    pub use crate::report::{render_report, write_report, ReportContext};
    pub use crate::summary::{read_summary, write_summary, SummarySchema, SummaryTable};
}
