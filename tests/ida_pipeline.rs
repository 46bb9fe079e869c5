use approx::assert_relative_eq;
use ida_postprocess::plots::load_drift_histories;
use ida_postprocess::prelude::*;
use std::path::Path;

const HINGE_MAP: &str = r#"{
    "geometry": {"H": 3.0, "L": 5.0,
                 "column_section": {"b": 0.4, "h": 0.6},
                 "beam_section": {"b": 0.25, "h": 0.5}},
    "hinges": [
        {"name": "H_L", "rotA": 1001, "rotB": 1002},
        {"name": "H_R", "rotA": 1003, "rotB": 1004},
        {"name": "H_T1", "rotA": 1005, "rotB": 1006},
        {"name": "H_T2", "rotA": 1007, "rotB": 1008}
    ]
}"#;

/// Dump with four output steps; the roof node moves by `peak` scaled by
/// 0.5, 1.0, -0.5 and 0.25.
fn write_dump(dir: &Path, amplitude: f64, peak: f64) {
    let mut content = String::new();
    for (i, scale) in [0.5, 1.0, -0.5, 0.25].iter().enumerate() {
        let t = (i + 1) as f64 * 0.5;
        content.push_str(&format!(
            "\n displacements (vx,vy,vz) for set NALL and time  {:.7E}\n\n",
            t
        ));
        content.push_str(&format!(
            "         1  0.000000E+00  0.000000E+00  0.000000E+00\n         3  {:.6E}  1.000000E-04  0.000000E+00\n",
            peak * scale
        ));
        content.push_str(&format!(
            "\n forces (fx,fy,fz) for set FIX and time  {:.7E}\n\n         1 -1.200000E+01  3.000000E+01  0.000000E+00\n",
            t
        ));
    }
    let path = IdaConfig::default().dump_path(dir, amplitude);
    std::fs::write(path, content).unwrap();
}

fn ida_fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("portal.hinge_map.json"), HINGE_MAP).unwrap();
    std::fs::write(
        dir.path().join("zz_other.hinge_map.json"),
        r#"{"geometry": {"H": 4.0}, "hinges": []}"#,
    )
    .unwrap();
    write_dump(dir.path(), 0.1, 0.03);
    write_dump(dir.path(), 0.2, 0.06);
    // 0.3 g deliberately missing
    write_dump(dir.path(), 0.4, 0.18);
    dir
}

#[test]
fn test_extraction_skips_missing_amplitudes() {
    let dir = ida_fixture();
    let config = IdaConfig::default();
    let range = AmplitudeRange::new(0.1, 0.4, 0.1);

    let outcome = run_extraction(dir.path(), "summary.csv", &range, &config).unwrap();

    assert_eq!(outcome.requested, vec![0.1, 0.2, 0.3, 0.4]);
    assert_eq!(outcome.results.len(), 3);
    assert_eq!(outcome.skipped(), 1);
    // first sorted metadata file wins
    assert_eq!(outcome.hinge_map.geometry.height, 3.0);
    assert_eq!(outcome.schema.hinge_names(), vec!["H_L", "H_R", "H_T1", "H_T2"]);

    let first = &outcome.results[0];
    assert_relative_eq!(first.peak_drift_cm, 3.0, epsilon = 1e-9);
    assert_relative_eq!(first.peak_drift_pct, 1.0, epsilon = 1e-9);
    assert_relative_eq!(first.residual_drift_cm, 0.75, epsilon = 1e-9);
    assert_eq!(first.status, Status::Ok);

    let last = &outcome.results[2];
    assert_relative_eq!(last.peak_drift_pct, 6.0, epsilon = 1e-9);
    assert_eq!(last.status, Status::Collapse);

    let csv = std::fs::read_to_string(dir.path().join("summary.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "Amplitude_g,Peak_Drift_cm,Peak_Drift_pct,Residual_Drift_cm,Residual_Drift_pct,Status,\
         Peak_Vb_kN,Energy_kNm,Peak_theta_H_L_rad,Peak_theta_H_R_rad,Peak_theta_H_T1_rad,Peak_theta_H_T2_rad"
    );
    assert_eq!(
        lines[1],
        "0.1,3.000,1.000,0.750,0.250,OK,0.00,0.00,0.000000,0.000000,0.000000,0.000000"
    );
    assert!(lines[3].starts_with("0.4,18.000,6.000,4.500,1.500,COLLAPSE,"));
}

#[test]
fn test_summary_reads_back_what_was_written() {
    let dir = ida_fixture();
    let config = IdaConfig::default();
    let outcome = run_extraction(
        dir.path(),
        &config.summary_file,
        &AmplitudeRange::new(0.1, 0.4, 0.1),
        &config,
    )
    .unwrap();

    let loaded = load_summary(dir.path(), &config.summary_file, &config).unwrap();
    assert_eq!(loaded.table.len(), 3);
    assert_eq!(loaded.table.schema.hinge_names(), outcome.schema.hinge_names());
    assert_eq!(loaded.table.rows[1].get("Status"), Some("OK"));

    for (read, written) in loaded.results.iter().zip(&outcome.results) {
        assert_relative_eq!(read.amplitude, written.amplitude, epsilon = 0.05);
        assert_relative_eq!(read.peak_drift_pct, written.peak_drift_pct, epsilon = 5e-4);
        assert_relative_eq!(read.residual_drift_cm, written.residual_drift_cm, epsilon = 5e-4);
        assert_eq!(read.status, written.status);
        assert_eq!(read.peak_rotations, written.peak_rotations);
    }
}

#[test]
fn test_sweep_without_dumps_leaves_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("portal.hinge_map.json"), HINGE_MAP).unwrap();
    let config = IdaConfig::default();

    let outcome = run_extraction(
        dir.path(),
        &config.summary_file,
        &AmplitudeRange::default(),
        &config,
    )
    .unwrap();
    assert!(outcome.results.is_empty());

    let err = load_summary(dir.path(), &config.summary_file, &config).unwrap_err();
    assert!(matches!(err, IdaError::EmptySummary(_)));
}

#[test]
fn test_plotter_writes_png_and_svg_for_every_chart() {
    let dir = ida_fixture();
    let config = IdaConfig::default();
    run_extraction(
        dir.path(),
        &config.summary_file,
        &AmplitudeRange::new(0.1, 0.4, 0.1),
        &config,
    )
    .unwrap();

    let loaded = load_summary(dir.path(), &config.summary_file, &config).unwrap();
    let histories =
        load_drift_histories(dir.path(), &loaded.results, loaded.hinge_map.geometry.height, &config)
            .unwrap();
    // 0.1, 0.2 and 0.4 analyzed; 0.4 is not a representative amplitude
    assert_eq!(
        histories.iter().map(|h| h.amplitude).collect::<Vec<_>>(),
        vec![0.1, 0.2]
    );
    assert_eq!(histories[0].points.len(), 4);
    assert_relative_eq!(histories[0].points[1].1, 1.0, epsilon = 1e-9);

    let data = PlotData::new(
        loaded.results,
        loaded.hinge_map.hinge_names(),
        histories,
        &config,
    )
    .unwrap();
    let plots_dir = dir.path().join("plots");
    let written = PlotGenerator::new(&config, &plots_dir).render_all(&data).unwrap();

    assert_eq!(written.len(), 12);
    for kind in ChartKind::ALL {
        for ext in ["png", "svg"] {
            let path = plots_dir.join(format!("{}.{}", kind.file_stem(), ext));
            let meta = std::fs::metadata(&path).unwrap();
            assert!(meta.len() > 0, "{:?} is empty", path);
        }
    }
}

#[test]
fn test_plotter_skips_rotation_without_hinges() {
    let dir = tempfile::tempdir().unwrap();
    let config = IdaConfig::default();
    let results = vec![AmplitudeMetrics {
        amplitude: 0.1,
        peak_drift_cm: 3.0,
        peak_drift_pct: 1.0,
        residual_drift_cm: 0.3,
        residual_drift_pct: 0.1,
        status: Status::Ok,
        peak_base_shear_kn: 0.0,
        energy_dissipated_knm: 0.0,
        peak_rotations: Default::default(),
    }];
    let data = PlotData::new(results, Vec::new(), Vec::new(), &config).unwrap();

    let written = PlotGenerator::new(&config, dir.path()).render_all(&data).unwrap();
    assert_eq!(written.len(), 10);
    assert!(!dir.path().join("rotation_accumulation.png").exists());
}

#[test]
fn test_report_links_plot_files() {
    let dir = ida_fixture();
    let config = IdaConfig::default();
    run_extraction(
        dir.path(),
        &config.summary_file,
        &AmplitudeRange::new(0.1, 0.4, 0.1),
        &config,
    )
    .unwrap();

    let loaded = load_summary(dir.path(), &config.summary_file, &config).unwrap();
    let ctx = ReportContext::new(dir.path(), &loaded.summary_path, "2025-03-01 12:00:00");
    let report = render_report(&loaded.results, &loaded.hinge_map, &config, &ctx).unwrap();

    for kind in ChartKind::ALL {
        if kind == ChartKind::DriftHistories || kind == ChartKind::Summary {
            continue;
        }
        assert!(
            report.contains(&format!("(plots/{}.png)", kind.file_stem())),
            "missing figure {}",
            kind.file_stem()
        );
    }
    assert!(report.contains("(plots/drift_histories.png)"));
    assert!(report.contains("(plots/ida_summary.png)"));
    assert!(report.contains("Collapse was detected at amplitude **0.4g**"));
    assert!(report.contains("- **H_T2**: Beam-column connection"));
    assert!(report.contains("**Number of IDA runs:** 3"));
    assert!(report.contains("- Summary: `ida_results_summary.csv`"));

    let out = dir.path().join("reports").join("IDA_VALIDATION_REPORT.md");
    write_report(&out, &report).unwrap();
    assert_eq!(std::fs::read_to_string(&out).unwrap(), report);
}

#[test]
fn test_config_file_overrides_threshold() {
    let dir = ida_fixture();
    let cfg_path = dir.path().join("cfg.json");
    std::fs::write(&cfg_path, r#"{"collapse_drift_pct": 10.0}"#).unwrap();
    let config = IdaConfig::load(&cfg_path).unwrap();
    assert_eq!(config.summary_file, "ida_results_summary.csv");

    let outcome = run_extraction(
        dir.path(),
        "summary.csv",
        &AmplitudeRange::new(0.1, 0.4, 0.1),
        &config,
    )
    .unwrap();
    assert!(outcome.results.iter().all(|r| r.status == Status::Ok));
}

#[test]
fn test_non_utf8_dump_does_not_abort_sweep() {
    let dir = ida_fixture();
    let config = IdaConfig::default();
    let dump = config.dump_path(dir.path(), 0.2);
    let mut bytes = b" Problema 4 - p\xf3rtico\n".to_vec();
    bytes.extend(std::fs::read(&dump).unwrap());
    std::fs::write(&dump, bytes).unwrap();

    let outcome = run_extraction(
        dir.path(),
        "summary.csv",
        &AmplitudeRange::new(0.1, 0.4, 0.1),
        &config,
    )
    .unwrap();
    assert_eq!(outcome.results.len(), 3);
    assert_relative_eq!(outcome.results[1].peak_drift_pct, 2.0, epsilon = 1e-9);

    let csv = std::fs::read_to_string(dir.path().join("summary.csv")).unwrap();
    assert_eq!(csv.lines().count(), 4);
}
