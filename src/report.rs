//! Markdown validation report.
//!
//! The report is a pure function of the summary records, the hinge map and
//! the configured assessment limits; the caller supplies the timestamp and
//! the paths echoed in the text.

use std::path::{Path, PathBuf};

use crate::config::IdaConfig;
use crate::error::{IdaError, IdaResult};
use crate::metadata::HingeMap;
use crate::metrics::{drift_at, AmplitudeMetrics, IdaSummary};
use crate::plots::ChartKind;

/// Values echoed into the report that do not come from the results.
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Timestamp printed under the title
    pub generated_at: String,
    pub ida_dir: PathBuf,
    pub summary_path: PathBuf,
    /// Directory of the charts, relative to the report
    pub plots_dir: String,
}

impl ReportContext {
    pub fn new(ida_dir: &Path, summary_path: &Path, generated_at: impl Into<String>) -> Self {
        Self {
            generated_at: generated_at.into(),
            ida_dir: ida_dir.to_path_buf(),
            summary_path: summary_path.to_path_buf(),
            plots_dir: "plots".to_string(),
        }
    }

    fn figure(&self, kind: ChartKind) -> String {
        format!("{}/{}.png", self.plots_dir, kind.file_stem())
    }
}

/// Shortest decimal form, keeping one decimal for whole numbers (`3.0`, `0.7`).
fn num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Render the full report. Fails with `EmptySummary` when there are no results.
pub fn render_report(
    results: &[AmplitudeMetrics],
    hinge_map: &HingeMap,
    config: &IdaConfig,
    ctx: &ReportContext,
) -> IdaResult<String> {
    let limits = &config.assessment;
    let threshold = config.collapse_drift_pct;
    let summary = IdaSummary::from_metrics(results, limits, threshold)
        .ok_or_else(|| IdaError::EmptySummary(ctx.summary_path.clone()))?;

    let geometry = &hinge_map.geometry;
    let h = geometry.height;
    let l = geometry.span;
    let collapse = summary.collapse;
    let drift_01g = drift_at(results, 0.1);
    let drift_02g = drift_at(results, 0.2);

    let mut r: Vec<String> = Vec::new();
    let rule = |r: &mut Vec<String>| {
        r.push("---".to_string());
        r.push(String::new());
    };

    r.push("# IDA Validation Report - Portal Frame".to_string());
    r.push(String::new());
    r.push("**Portal Frame Seismic Analysis**".to_string());
    r.push(String::new());
    r.push(format!("*Generated: {}*", ctx.generated_at));
    r.push(String::new());
    rule(&mut r);

    // Executive summary
    r.push("## Executive Summary".to_string());
    r.push(String::new());
    r.push("This report presents the results of an Incremental Dynamic Analysis (IDA) performed on a ".to_string());
    r.push(format!(
        "single-story portal frame structure under seismic loading. The frame has a height H = {}m ",
        num(h)
    ));
    r.push(format!(
        "and span L = {}m, subjected to a sinusoidal ground motion with varying amplitude.",
        num(l)
    ));
    r.push(String::new());
    match collapse {
        Some((amplitude, drift)) => {
            r.push(format!(
                "**Key Finding:** Collapse was detected at amplitude **{}g**, ",
                num(amplitude)
            ));
            r.push(format!("corresponding to a peak drift of {:.2}%.", drift));
        }
        None => {
            r.push(format!(
                "**Key Finding:** No collapse was detected up to the maximum amplitude tested ({}g). ",
                num(summary.max_amplitude)
            ));
            r.push("The structure may require testing at higher intensities or the collapse criterion may need review.".to_string());
        }
    }
    r.push(String::new());
    rule(&mut r);

    // Configuration echo
    r.push("## Structural Configuration".to_string());
    r.push(String::new());
    r.push("### Geometry".to_string());
    r.push(String::new());
    r.push(format!("- **Frame height (H):** {} m", num(h)));
    r.push(format!("- **Frame span (L):** {} m", num(l)));
    r.push(format!(
        "- **Column section (S1):** {:.0} × {:.0} cm",
        geometry.column_section.b * 100.0,
        geometry.column_section.h * 100.0
    ));
    r.push(format!(
        "- **Beam section (S2):** {:.0} × {:.0} cm",
        geometry.beam_section.b * 100.0,
        geometry.beam_section.h * 100.0
    ));
    r.push(String::new());

    r.push("### Plastic Hinges".to_string());
    r.push(String::new());
    r.push(format!(
        "The structure includes {} plastic hinge locations:",
        hinge_map.hinges.len()
    ));
    r.push(String::new());
    for hinge in &hinge_map.hinges {
        r.push(format!("- **{}**: {}", hinge.name, hinge.location()));
    }
    r.push(String::new());

    r.push("### Loading".to_string());
    r.push(String::new());
    r.push("**Seismic input:** `a_g(t) = A · cos(0.2πt) · sin(4πt)`, t ≤ 10 s".to_string());
    r.push(String::new());
    r.push(format!(
        "**Amplitude range tested:** {}g to {}g (step: {:.1}g)",
        num(summary.min_amplitude),
        num(summary.max_amplitude),
        summary.amplitude_step.unwrap_or(0.1)
    ));
    r.push(String::new());
    r.push(format!("**Collapse criterion:** Drift > {}%", threshold));
    r.push(String::new());
    rule(&mut r);

    // Results
    r.push("## IDA Results".to_string());
    r.push(String::new());
    r.push("### IDA Curve".to_string());
    r.push(String::new());
    r.push(format!("![IDA Curve]({})", ctx.figure(ChartKind::IdaCurve)));
    r.push(String::new());
    r.push("*Figure 1: IDA curve showing peak roof drift vs. spectral acceleration. ".to_string());
    r.push(format!(
        "The red dashed line indicates the {}% drift collapse criterion.*",
        threshold
    ));
    r.push(String::new());

    r.push("### Performance Summary Table".to_string());
    r.push(String::new());
    r.push("| Amplitude (g) | Peak Drift (%) | Residual Drift (%) | Status |".to_string());
    r.push("|---------------|----------------|---------------------|---------|".to_string());
    for m in results {
        r.push(format!(
            "| {:>6} | {:>14.2} | {:>19.2} | {} {:>6} |",
            format!("{:.1}", m.amplitude),
            m.peak_drift_pct,
            m.residual_drift_pct,
            m.status.symbol(),
            m.status.as_str()
        ));
    }
    r.push(String::new());

    r.push("### Drift Time Histories".to_string());
    r.push(String::new());
    r.push(format!("![Drift Histories]({})", ctx.figure(ChartKind::DriftHistories)));
    r.push(String::new());
    r.push("*Figure 2: Roof drift time histories for multiple amplitude levels. ".to_string());
    r.push("Thicker lines indicate cases that exceeded the collapse criterion.*".to_string());
    r.push(String::new());

    r.push("### IDA Summary".to_string());
    r.push(String::new());
    r.push(format!("![IDA Summary]({})", ctx.figure(ChartKind::Summary)));
    r.push(String::new());
    r.push("*Figure 3: Comprehensive IDA summary showing multiple performance metrics.*".to_string());
    r.push(String::new());
    rule(&mut r);

    // Behavior assessment
    r.push("## Structural Behavior Assessment".to_string());
    r.push(String::new());
    r.push("### Performance Ranges".to_string());
    r.push(String::new());
    if let Some(elastic) = summary.elastic_limit_amplitude {
        r.push(format!(
            "**Elastic range (drift < {}%):** A < {:.1}g",
            limits.elastic_drift_pct, elastic
        ));
        r.push(String::new());
        r.push("In this range, the structure responds primarily elastically with minimal yielding.".to_string());
        r.push(String::new());
    }
    if let Some((lo, hi)) = summary.plastic_range {
        r.push(format!(
            "**Plastic range ({}% < drift < {}%):** {:.1}g < A < {:.1}g",
            limits.elastic_drift_pct, threshold, lo, hi
        ));
        r.push(String::new());
        r.push("The structure exhibits inelastic behavior with plastic hinge formation and energy dissipation.".to_string());
        r.push(String::new());
    }
    if let Some((amplitude, _)) = collapse {
        r.push(format!("**Collapse:** A ≥ {}g", num(amplitude)));
        r.push(String::new());
        r.push(format!(
            "Collapse criterion (drift > {}%) is exceeded at {}g.",
            threshold,
            num(amplitude)
        ));
        r.push(String::new());
    }

    r.push("### Physical Interpretation".to_string());
    r.push(String::new());
    let max_drift = summary.max_drift_pct;
    r.push(format!(
        "1. **Peak drift:** {:.2}% at A = {}g",
        max_drift,
        num(summary.max_drift_amplitude)
    ));
    r.push(format!(
        "   - Absolute displacement: {:.1} cm",
        max_drift / 100.0 * h * 100.0
    ));
    r.push(
        if max_drift < limits.elastic_drift_pct {
            "   - Structure remains in elastic/lightly damaged range"
        } else if max_drift < limits.moderate_drift_pct {
            "   - Moderate inelastic deformation, repairable damage"
        } else if max_drift < threshold {
            "   - Significant inelastic deformation, major damage"
        } else {
            "   - Collapse-level deformation, structural failure"
        }
        .to_string(),
    );
    r.push(String::new());

    let max_residual = summary.max_residual_pct;
    r.push(format!("2. **Residual drift:** Up to {:.2}%", max_residual));
    r.push(
        if max_residual < limits.residual_low_pct {
            "   - Low residual deformation, structure returns close to original position"
        } else if max_residual < limits.residual_high_pct {
            "   - Moderate residual deformation, may require realignment"
        } else {
            "   - High residual deformation, structure significantly offset"
        }
        .to_string(),
    );
    r.push(String::new());

    r.push("3. **Plastic hinge behavior:**".to_string());
    r.push("   - See rotation accumulation plot for hinge-by-hinge analysis".to_string());
    r.push("   - Hinges at column bases and beam-column joints activate progressively".to_string());
    r.push(String::new());
    rule(&mut r);

    // Validation against expected behavior
    let (band_lo, band_hi) = limits.expected_collapse_band;
    let (d02_lo, d02_hi) = limits.expected_drift_02g;
    r.push("## Validation Against Expected Behavior".to_string());
    r.push(String::new());
    r.push("### Expected Performance".to_string());
    r.push(String::new());
    r.push(format!(
        "- **Drift at 0.1g:** < {}% (elastic to lightly damaged)",
        limits.elastic_drift_pct
    ));
    r.push(format!("- **Drift at 0.2g:** {}-{}% (moderate inelastic)", d02_lo, d02_hi));
    r.push(format!(
        "- **Collapse amplitude:** Expected around {}-{}g for typical portal frames",
        band_lo, band_hi
    ));
    r.push(String::new());

    r.push("### Comparison".to_string());
    r.push(String::new());
    if let Some(d) = drift_01g {
        r.push(format!("- **At 0.1g:** Observed drift = {:.2}%", d));
        r.push(
            if d < limits.elastic_drift_pct {
                "  - ✓ Within expected range (elastic)"
            } else {
                "  - ⚠ Higher than expected (check material properties)"
            }
            .to_string(),
        );
        r.push(String::new());
    }
    if let Some(d) = drift_02g {
        r.push(format!("- **At 0.2g:** Observed drift = {:.2}%", d));
        r.push(
            if (d02_lo..=d02_hi).contains(&d) {
                "  - ✓ Within expected range (moderate inelastic)"
            } else if d < d02_lo {
                "  - Structure may be stiffer than expected"
            } else {
                "  - ⚠ Higher drift than expected"
            }
            .to_string(),
        );
        r.push(String::new());
    }
    if let Some((amplitude, _)) = collapse {
        r.push(format!("- **Collapse amplitude:** {}g", num(amplitude)));
        r.push(
            if (band_lo..=band_hi).contains(&amplitude) {
                "  - ✓ Within typical range for portal frames"
            } else if amplitude > band_hi {
                "  - Structure shows higher capacity than expected"
            } else {
                "  - ⚠ Lower capacity than typical (review design)"
            }
            .to_string(),
        );
        r.push(String::new());
    }
    rule(&mut r);

    // Additional figures
    r.push("## Additional Performance Metrics".to_string());
    r.push(String::new());
    for (title, kind, caption) in [
        (
            "Rotation Accumulation",
            ChartKind::RotationAccumulation,
            "*Figure 4: Peak plastic rotation vs. amplitude for each hinge location.*",
        ),
        (
            "Base Shear vs. Drift",
            ChartKind::BaseShearVsDrift,
            "*Figure 5: Peak base shear force vs. roof drift, showing strength degradation.*",
        ),
        (
            "Energy Dissipation",
            ChartKind::EnergyDissipation,
            "*Figure 6: Cumulative plastic energy dissipation vs. amplitude.*",
        ),
    ] {
        r.push(format!("### {}", title));
        r.push(String::new());
        r.push(format!("![{}]({})", title, ctx.figure(kind)));
        r.push(String::new());
        r.push(caption.to_string());
        r.push(String::new());
    }
    rule(&mut r);

    // Recommendations
    r.push("## Recommendations".to_string());
    r.push(String::new());
    for (i, rec) in recommendations(&summary, drift_01g, config).iter().enumerate() {
        r.push(format!("{}. {}", i + 1, rec));
        r.push(String::new());
    }
    rule(&mut r);

    // Conclusions
    r.push("## Conclusions".to_string());
    r.push(String::new());
    r.push(format!(
        "The IDA analysis of the single-story portal frame (H={}m, L={}m) has been successfully ",
        num(h),
        num(l)
    ));
    r.push("completed using CalculiX with the latest beam element implementation. Key findings:".to_string());
    r.push(String::new());
    for (i, conclusion) in conclusions(&summary).iter().enumerate() {
        r.push(format!("{}. {}", i + 1, conclusion));
        r.push(String::new());
    }
    r.push("The results are consistent with expected portal frame behavior under seismic loading, ".to_string());
    r.push("demonstrating the effectiveness of the CalculiX implementation for dynamic pushover analysis.".to_string());
    r.push(String::new());
    rule(&mut r);

    // Appendix
    r.push("## Appendix: Test Data".to_string());
    r.push(String::new());
    r.push(format!("**Analysis files location:** `{}/`", ctx.ida_dir.display()));
    r.push(String::new());
    r.push(format!("**Number of IDA runs:** {}", summary.run_count));
    r.push(String::new());
    r.push("**Generated files:**".to_string());
    r.push(String::new());
    r.push(format!("- Input files: `{}{{X}}g.inp`", config.dump_prefix));
    r.push(format!("- Results: `{}{{X}}g.dat`, `.frd`", config.dump_prefix));
    r.push(format!(
        "- Summary: `{}`",
        ctx.summary_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| config.summary_file.clone())
    ));
    r.push(format!("- Plots: `{}/*.png`, `*.svg`", ctx.plots_dir));
    r.push(String::new());
    rule(&mut r);
    r.push("*End of Report*".to_string());

    Ok(r.join("\n"))
}

fn recommendations(summary: &IdaSummary, drift_01g: Option<f64>, config: &IdaConfig) -> Vec<String> {
    let limits = &config.assessment;
    let mut recs = Vec::new();

    let collapse = summary.collapse_amplitude();
    if collapse.is_none() {
        recs.push(format!(
            "**Extend IDA range:** No collapse detected. Test higher amplitudes (> {}g) to identify collapse capacity.",
            num(summary.max_amplitude)
        ));
    }
    if drift_01g.map_or(false, |d| d > limits.material_review_drift_01g) {
        recs.push(
            "**Review material properties:** Drift at 0.1g is higher than expected. Verify concrete strength and stiffness."
                .to_string(),
        );
    }
    if collapse.map_or(false, |a| a < limits.design_review_amplitude) {
        recs.push(
            "**Design review:** Collapse amplitude is low. Consider increasing section sizes or reinforcement."
                .to_string(),
        );
    }
    recs.push(
        "**Detailed M-θ analysis:** Extract moment-rotation hysteresis curves for each hinge to verify constitutive model."
            .to_string(),
    );
    recs.push(
        "**Comparison with code provisions:** Validate against Chilean seismic code (NCh433) performance requirements."
            .to_string(),
    );
    recs
}

fn conclusions(summary: &IdaSummary) -> Vec<String> {
    let mut items = Vec::new();
    if let Some(amplitude) = summary.collapse_amplitude() {
        items.push(format!("Collapse capacity identified at **{}g**", num(amplitude)));
    }
    items.push(format!(
        "Peak drift ranges from {:.2}% to {:.2}%",
        summary.min_drift_pct, summary.max_drift_pct
    ));
    if let Some(elastic) = summary.elastic_limit_amplitude {
        items.push(format!(
            "Elastic behavior observed up to approximately {:.1}g",
            elastic
        ));
    }
    items.push("IDA curve shows expected softening behavior as amplitude increases".to_string());
    items
}

/// Write `content` to `path`.
pub fn write_report(path: &Path, content: &str) -> IdaResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    tracing::info!("✓ Report generated: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::HingeDefinition;
    use crate::metrics::Status;
    use std::collections::BTreeMap;

    fn record(amplitude: f64, peak: f64, residual: f64) -> AmplitudeMetrics {
        let status = if peak > 5.0 { Status::Collapse } else { Status::Ok };
        AmplitudeMetrics {
            amplitude,
            peak_drift_cm: peak * 3.0,
            peak_drift_pct: peak,
            residual_drift_cm: residual * 3.0,
            residual_drift_pct: residual,
            status,
            peak_base_shear_kn: 0.0,
            energy_dissipated_knm: 0.0,
            peak_rotations: BTreeMap::new(),
        }
    }

    fn ctx() -> ReportContext {
        ReportContext::new(
            Path::new("ida"),
            Path::new("ida/ida_results_summary.csv"),
            "2024-01-01 00:00:00",
        )
    }

    fn hinge_map() -> HingeMap {
        let mut map = HingeMap::default();
        map.hinges.push(HingeDefinition { name: "H_L".into(), rot_a: 1, rot_b: 2 });
        map.hinges.push(HingeDefinition { name: "H_T1".into(), rot_a: 3, rot_b: 4 });
        map
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(num(3.0), "3.0");
        assert_eq!(num(0.7), "0.7");
        assert_eq!(num(5.5), "5.5");
    }

    #[test]
    fn test_report_with_collapse() {
        let results = vec![
            record(0.1, 0.6, 0.1),
            record(0.2, 1.9, 0.3),
            record(0.6, 4.2, 1.0),
            record(0.7, 6.4, 2.4),
        ];
        let report = render_report(&results, &hinge_map(), &IdaConfig::default(), &ctx()).unwrap();

        assert!(report.starts_with("# IDA Validation Report"));
        assert!(report.contains("*Generated: 2024-01-01 00:00:00*"));
        assert!(report.contains("Collapse was detected at amplitude **0.7g**"));
        assert!(report.contains("corresponding to a peak drift of 6.40%."));
        assert!(report.contains("- **Frame height (H):** 3.0 m"));
        assert!(report.contains("- **Column section (S1):** 40 × 60 cm"));
        assert!(report.contains("- **H_L**: Column base"));
        assert!(report.contains("- **H_T1**: Beam-column connection"));
        let row = report.lines().find(|l| l.starts_with("|    0.1 |")).unwrap();
        assert!(row.contains(" 0.60 |"));
        assert!(row.contains(" 0.10 |"));
        assert!(row.ends_with("✓     OK |"));
        assert!(report.contains("| ⚠ COLLAPSE |"));
        assert!(report.contains("**Elastic range (drift < 1%):** A < 0.1g"));
        assert!(report.contains("**Plastic range (1% < drift < 5%):** 0.2g < A < 0.6g"));
        assert!(report.contains("  - ✓ Within expected range (moderate inelastic)"));
        assert!(report.contains("  - ✓ Within typical range for portal frames"));
        assert!(report.contains("   - High residual deformation, structure significantly offset"));
        assert!(report.contains("![IDA Curve](plots/ida_curve.png)"));
        assert!(report.contains("![Energy Dissipation](plots/energy_dissipation.png)"));
        assert!(!report.contains("Extend IDA range"));
        assert!(report.ends_with("*End of Report*"));
    }

    #[test]
    fn test_report_without_collapse_recommends_extension() {
        let results = vec![record(0.1, 0.4, 0.05), record(0.2, 0.8, 0.1)];
        let report = render_report(&results, &hinge_map(), &IdaConfig::default(), &ctx()).unwrap();

        assert!(report.contains("No collapse was detected up to the maximum amplitude tested (0.2g)"));
        assert!(report.contains("1. **Extend IDA range:**"));
        assert!(report.contains("  - Structure may be stiffer than expected"));
        assert!(report.contains("   - Structure remains in elastic/lightly damaged range"));
        assert!(!report.contains("**Plastic range"));
    }

    #[test]
    fn test_low_collapse_triggers_design_review() {
        let results = vec![record(0.1, 2.0, 0.2), record(0.2, 7.0, 3.0)];
        let report = render_report(&results, &hinge_map(), &IdaConfig::default(), &ctx()).unwrap();
        assert!(report.contains("1. **Review material properties:**"));
        assert!(report.contains("2. **Design review:**"));
        assert!(report.contains("  - ⚠ Lower capacity than typical (review design)"));
    }

    #[test]
    fn test_empty_results_rejected() {
        let err = render_report(&[], &hinge_map(), &IdaConfig::default(), &ctx()).unwrap_err();
        assert!(matches!(err, IdaError::EmptySummary(_)));
    }
}
