//! IDA validation charts.
//!
//! Every chart is drawn once per backend: a PNG raster through
//! `BitMapBackend` and an SVG vector copy through `SVGBackend`. Drawing code
//! is generic over the backend so both files come from the same routine.

use plotters::coord::{CoordTranslate, Shift};
use plotters::prelude::*;
use std::error::Error;
use std::path::{Path, PathBuf};

use crate::config::IdaConfig;
use crate::dat::DatParser;
use crate::error::{IdaError, IdaResult};
use crate::metrics::{AmplitudeMetrics, IdaSummary, Status};

type DrawResult = Result<(), Box<dyn Error>>;

const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180);
const CORAL: RGBColor = RGBColor(255, 127, 80);
const FOREST_GREEN: RGBColor = RGBColor(0, 128, 0);
const DARK_GREEN: RGBColor = RGBColor(0, 100, 0);
const PURPLE: RGBColor = RGBColor(128, 0, 128);
const ORANGE: RGBColor = RGBColor(255, 165, 0);
const HINGE_COLORS: [RGBColor; 4] = [STEEL_BLUE, CORAL, FOREST_GREEN, PURPLE];

/// The six charts written by the plotter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    IdaCurve,
    DriftHistories,
    RotationAccumulation,
    BaseShearVsDrift,
    EnergyDissipation,
    Summary,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::IdaCurve,
        ChartKind::DriftHistories,
        ChartKind::RotationAccumulation,
        ChartKind::BaseShearVsDrift,
        ChartKind::EnergyDissipation,
        ChartKind::Summary,
    ];

    /// File name without extension; the report links `<stem>.png`.
    pub fn file_stem(&self) -> &'static str {
        match self {
            ChartKind::IdaCurve => "ida_curve",
            ChartKind::DriftHistories => "drift_histories",
            ChartKind::RotationAccumulation => "rotation_accumulation",
            ChartKind::BaseShearVsDrift => "base_shear_vs_drift",
            ChartKind::EnergyDissipation => "energy_dissipation",
            ChartKind::Summary => "ida_summary",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::IdaCurve => "IDA curve",
            ChartKind::DriftHistories => "Drift time histories",
            ChartKind::RotationAccumulation => "Rotation accumulation",
            ChartKind::BaseShearVsDrift => "Base shear vs drift",
            ChartKind::EnergyDissipation => "Energy dissipation",
            ChartKind::Summary => "Summary figure",
        }
    }
}

/// Roof drift history (%) of one amplitude.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftHistory {
    pub amplitude: f64,
    pub status: Status,
    /// `(time s, drift %)`
    pub points: Vec<(f64, f64)>,
}

/// Everything the charts are drawn from.
#[derive(Debug, Clone)]
pub struct PlotData {
    pub results: Vec<AmplitudeMetrics>,
    pub hinge_names: Vec<String>,
    pub histories: Vec<DriftHistory>,
    pub summary: IdaSummary,
    pub collapse_drift_pct: f64,
}

impl PlotData {
    /// `None` when `results` is empty.
    pub fn new(
        results: Vec<AmplitudeMetrics>,
        hinge_names: Vec<String>,
        histories: Vec<DriftHistory>,
        config: &IdaConfig,
    ) -> Option<Self> {
        let summary =
            IdaSummary::from_metrics(&results, &config.assessment, config.collapse_drift_pct)?;
        Some(Self {
            results,
            hinge_names,
            histories,
            summary,
            collapse_drift_pct: config.collapse_drift_pct,
        })
    }

    fn amplitudes(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.amplitude).collect()
    }

    fn by_status(&self, status: Status) -> impl Iterator<Item = &AmplitudeMetrics> {
        self.results.iter().filter(move |r| r.status == status)
    }
}

/// Amplitudes whose time histories are overlaid: the preferred subset that
/// was analyzed, or the first six available ones.
pub fn select_history_amplitudes(available: &[f64], preferred: &[f64]) -> Vec<f64> {
    let selected: Vec<f64> = preferred
        .iter()
        .copied()
        .filter(|p| available.iter().any(|a| (a - p).abs() < 1e-9))
        .collect();
    if selected.is_empty() {
        available.iter().copied().take(6).collect()
    } else {
        selected
    }
}

/// Re-read the dumps of the selected amplitudes and convert their roof
/// displacement histories to drift (%). Missing or empty dumps are skipped.
pub fn load_drift_histories(
    ida_dir: &Path,
    results: &[AmplitudeMetrics],
    height: f64,
    config: &IdaConfig,
) -> IdaResult<Vec<DriftHistory>> {
    let parser = DatParser::new()?;
    let available: Vec<f64> = results.iter().map(|r| r.amplitude).collect();
    let mut histories = Vec::new();

    for amplitude in select_history_amplitudes(&available, &config.representative_amplitudes) {
        let dat_path = config.dump_path(ida_dir, amplitude);
        if !dat_path.exists() {
            tracing::debug!("No dump for history at A = {:.1}g", amplitude);
            continue;
        }
        let dat = parser.parse_file(&dat_path)?;
        let points: Vec<(f64, f64)> = dat
            .roof_drift_history()
            .into_iter()
            .map(|(t, u1)| (t, u1 / height * 100.0))
            .collect();
        if points.is_empty() {
            continue;
        }

        let status = results
            .iter()
            .find(|r| (r.amplitude - amplitude).abs() < 1e-9)
            .map_or(Status::Ok, |r| r.status);
        histories.push(DriftHistory {
            amplitude,
            status,
            points,
        });
    }

    Ok(histories)
}

/// Writes the charts into one output directory.
pub struct PlotGenerator<'a> {
    config: &'a IdaConfig,
    output_dir: PathBuf,
}

impl<'a> PlotGenerator<'a> {
    pub fn new(config: &'a IdaConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render all charts, returning the written files.
    pub fn render_all(&self, data: &PlotData) -> IdaResult<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.output_dir)?;

        let mut written = Vec::new();
        for kind in ChartKind::ALL {
            if kind == ChartKind::RotationAccumulation && data.hinge_names.is_empty() {
                tracing::info!("Skipping rotation accumulation (no hinge data)");
                continue;
            }
            written.extend(self.render(kind, data)?);
            tracing::info!("✓ {}", kind.title());
        }
        Ok(written)
    }

    /// Render one chart as PNG and SVG.
    pub fn render(&self, kind: ChartKind, data: &PlotData) -> IdaResult<Vec<PathBuf>> {
        let size = match kind {
            ChartKind::Summary => self.config.charts.summary,
            _ => self.config.charts.single,
        };
        let stem = kind.file_stem();
        let plot_err = |e: Box<dyn Error>| IdaError::Plot(format!("{}: {}", stem, e));

        let png_path = self.output_dir.join(format!("{}.png", stem));
        {
            let root = BitMapBackend::new(&png_path, size).into_drawing_area();
            draw_chart(kind, &root, data).map_err(plot_err)?;
        }

        let svg_path = self.output_dir.join(format!("{}.svg", stem));
        {
            let root = SVGBackend::new(&svg_path, size).into_drawing_area();
            draw_chart(kind, &root, data).map_err(plot_err)?;
        }

        Ok(vec![png_path, svg_path])
    }
}

fn draw_chart<DB>(kind: ChartKind, root: &DrawingArea<DB, Shift>, data: &PlotData) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    match kind {
        ChartKind::IdaCurve => draw_ida_curve(root, data, false)?,
        ChartKind::DriftHistories => draw_drift_histories(root, data)?,
        ChartKind::RotationAccumulation => draw_rotation_accumulation(root, data)?,
        ChartKind::BaseShearVsDrift => draw_base_shear(root, data, false)?,
        ChartKind::EnergyDissipation => draw_energy(root, data, false)?,
        ChartKind::Summary => draw_summary(root, data)?,
    }
    root.present()?;
    Ok(())
}

/// Upper axis bound with 10 % headroom; `fallback` when every value is zero.
fn axis_max(values: impl IntoIterator<Item = f64>, fallback: f64) -> f64 {
    let max = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        fallback
    }
}

fn caption_size(compact: bool) -> u32 {
    if compact {
        20
    } else {
        28
    }
}

fn draw_legend<'a, DB, CT>(chart: &mut ChartContext<'a, DB, CT>) -> DrawResult
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    CT: CoordTranslate,
{
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_ida_curve<DB>(area: &DrawingArea<DB, Shift>, data: &PlotData, compact: bool) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let threshold = data.collapse_drift_pct;
    let x_max = axis_max(
        data.results
            .iter()
            .map(|r| r.peak_drift_pct)
            .chain(std::iter::once(threshold)),
        1.0,
    );
    let y_max = axis_max(data.amplitudes(), 1.0);

    let mut chart = ChartBuilder::on(area)
        .caption(
            if compact { "IDA Curve" } else { "IDA Curve - Portal Frame" },
            ("sans-serif", caption_size(compact)),
        )
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Peak Roof Drift (%)")
        .y_desc(if compact { "Amplitude (g)" } else { "Spectral Acceleration (g)" })
        .draw()?;

    let ok: Vec<(f64, f64)> = data
        .by_status(Status::Ok)
        .map(|r| (r.peak_drift_pct, r.amplitude))
        .collect();
    let collapsed: Vec<(f64, f64)> = data
        .by_status(Status::Collapse)
        .map(|r| (r.peak_drift_pct, r.amplitude))
        .collect();

    if !ok.is_empty() {
        chart
            .draw_series(LineSeries::new(ok.clone(), STEEL_BLUE.stroke_width(2)))?
            .label("No collapse")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], STEEL_BLUE.stroke_width(2)));
        chart.draw_series(
            ok.iter()
                .map(|&p| Circle::new(p, if compact { 4 } else { 6 }, STEEL_BLUE.filled())),
        )?;
    }
    if !collapsed.is_empty() {
        chart
            .draw_series(
                collapsed
                    .iter()
                    .map(|&p| Circle::new(p, if compact { 5 } else { 8 }, RED.filled())),
            )?
            .label("Collapse")
            .legend(|(x, y)| Circle::new((x + 10, y), 5, RED.filled()));
    }

    chart
        .draw_series(LineSeries::new(
            vec![(threshold, 0.0), (threshold, y_max)],
            RED.mix(0.7).stroke_width(2),
        ))?
        .label(format!("Collapse criterion ({}% drift)", threshold))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.mix(0.7).stroke_width(2)));

    if !compact {
        draw_legend(&mut chart)?;
    }
    Ok(())
}

fn draw_drift_histories<DB>(area: &DrawingArea<DB, Shift>, data: &PlotData) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let threshold = data.collapse_drift_pct;
    let t_max = axis_max(
        data.histories
            .iter()
            .flat_map(|h| h.points.iter().map(|&(t, _)| t)),
        1.0,
    ) / 1.1;
    let y_lim = axis_max(
        data.histories
            .iter()
            .flat_map(|h| h.points.iter().map(|&(_, d)| d.abs()))
            .chain(std::iter::once(threshold)),
        1.0,
    );

    let mut chart = ChartBuilder::on(area)
        .caption("Drift Time Histories - Multiple Amplitudes", ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..t_max, -y_lim..y_lim)?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Roof Drift (%)")
        .draw()?;

    for (i, history) in data.histories.iter().enumerate() {
        let collapsed = history.status == Status::Collapse;
        let color = Palette99::pick(i).to_rgba();
        let style = color.stroke_width(if collapsed { 3 } else { 2 });
        let label = if collapsed {
            format!("A = {:.1}g (collapse)", history.amplitude)
        } else {
            format!("A = {:.1}g", history.amplitude)
        };
        chart
            .draw_series(LineSeries::new(history.points.clone(), style))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    for level in [threshold, -threshold] {
        chart.draw_series(LineSeries::new(
            vec![(0.0, level), (t_max, level)],
            RED.mix(0.5).stroke_width(1),
        ))?;
    }

    draw_legend(&mut chart)?;
    Ok(())
}

fn draw_rotation_accumulation<DB>(area: &DrawingArea<DB, Shift>, data: &PlotData) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let x_max = axis_max(data.amplitudes(), 1.0);
    let y_max = axis_max(
        data.results
            .iter()
            .flat_map(|r| data.hinge_names.iter().map(move |h| r.rotation(h))),
        0.01,
    );

    let mut chart = ChartBuilder::on(area)
        .caption("Plastic Rotation Accumulation", ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Amplitude (g)")
        .y_desc("Peak Plastic Rotation (rad)")
        .draw()?;

    for (i, hinge) in data.hinge_names.iter().enumerate() {
        let color = HINGE_COLORS[i % HINGE_COLORS.len()];
        let points: Vec<(f64, f64)> = data
            .results
            .iter()
            .map(|r| (r.amplitude, r.rotation(hinge)))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
            .label(hinge.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart.draw_series(points.iter().map(|&p| Circle::new(p, 5, color.filled())))?;
    }

    draw_legend(&mut chart)?;
    Ok(())
}

fn draw_base_shear<DB>(area: &DrawingArea<DB, Shift>, data: &PlotData, compact: bool) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let threshold = data.collapse_drift_pct;
    let x_max = axis_max(
        data.results
            .iter()
            .map(|r| r.peak_drift_pct)
            .chain(std::iter::once(threshold)),
        1.0,
    );
    let y_max = axis_max(data.results.iter().map(|r| r.peak_base_shear_kn), 1.0);

    let mut chart = ChartBuilder::on(area)
        .caption(
            if compact { "Base Shear vs Drift" } else { "Base Shear vs. Drift" },
            ("sans-serif", caption_size(compact)),
        )
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc(if compact { "Peak Drift (%)" } else { "Peak Roof Drift (%)" })
        .y_desc(if compact { "Base Shear (kN)" } else { "Peak Base Shear (kN)" })
        .draw()?;

    let ok: Vec<(f64, f64)> = data
        .by_status(Status::Ok)
        .map(|r| (r.peak_drift_pct, r.peak_base_shear_kn))
        .collect();
    let line_color = if compact { FOREST_GREEN } else { STEEL_BLUE };
    if !ok.is_empty() {
        chart
            .draw_series(LineSeries::new(ok.clone(), line_color.stroke_width(2)))?
            .label("No collapse")
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], line_color.stroke_width(2))
            });
        chart.draw_series(ok.iter().map(|&p| Circle::new(p, 5, line_color.filled())))?;
    }

    // The summary panel shows the non-collapsed branch only
    if !compact {
        let collapsed: Vec<(f64, f64)> = data
            .by_status(Status::Collapse)
            .map(|r| (r.peak_drift_pct, r.peak_base_shear_kn))
            .collect();
        if !collapsed.is_empty() {
            chart
                .draw_series(collapsed.iter().map(|&p| Circle::new(p, 8, RED.filled())))?
                .label("Collapse")
                .legend(|(x, y)| Circle::new((x + 10, y), 5, RED.filled()));
        }
    }

    chart
        .draw_series(LineSeries::new(
            vec![(threshold, 0.0), (threshold, y_max)],
            RED.mix(0.5).stroke_width(1),
        ))?
        .label("Collapse limit")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.mix(0.5).stroke_width(1)));

    if !compact {
        draw_legend(&mut chart)?;
    }
    Ok(())
}

fn draw_energy<DB>(area: &DrawingArea<DB, Shift>, data: &PlotData, compact: bool) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let x_max = axis_max(data.amplitudes(), 1.0);
    let y_max = axis_max(data.results.iter().map(|r| r.energy_dissipated_knm), 1.0);

    let mut chart = ChartBuilder::on(area)
        .caption(
            if compact { "Energy Dissipation" } else { "Cumulative Energy Dissipation" },
            ("sans-serif", caption_size(compact)),
        )
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Amplitude (g)")
        .y_desc(if compact { "Energy (kN·m)" } else { "Energy Dissipation (kN·m)" })
        .draw()?;

    let points: Vec<(f64, f64)> = data
        .results
        .iter()
        .map(|r| (r.amplitude, r.energy_dissipated_knm))
        .collect();
    chart.draw_series(LineSeries::new(points.clone(), DARK_GREEN.stroke_width(2)))?;
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 5, DARK_GREEN.filled())))?;
    Ok(())
}

fn draw_peak_residual<DB>(area: &DrawingArea<DB, Shift>, data: &PlotData) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let threshold = data.collapse_drift_pct;
    let x_max = axis_max(data.amplitudes(), 1.0);
    let y_max = axis_max(
        data.results
            .iter()
            .map(|r| r.peak_drift_pct.max(r.residual_drift_pct))
            .chain(std::iter::once(threshold)),
        1.0,
    );

    let mut chart = ChartBuilder::on(area)
        .caption("Peak & Residual Drift", ("sans-serif", caption_size(true)))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Amplitude (g)")
        .y_desc("Drift (%)")
        .draw()?;

    let peak: Vec<(f64, f64)> = data
        .results
        .iter()
        .map(|r| (r.amplitude, r.peak_drift_pct))
        .collect();
    let residual: Vec<(f64, f64)> = data
        .results
        .iter()
        .map(|r| (r.amplitude, r.residual_drift_pct))
        .collect();

    chart
        .draw_series(LineSeries::new(peak.clone(), STEEL_BLUE.stroke_width(2)))?
        .label("Peak")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], STEEL_BLUE.stroke_width(2)));
    chart.draw_series(peak.iter().map(|&p| Circle::new(p, 4, STEEL_BLUE.filled())))?;

    chart
        .draw_series(LineSeries::new(residual.clone(), CORAL.stroke_width(2)))?
        .label("Residual")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], CORAL.stroke_width(2)));
    chart.draw_series(residual.iter().map(|&p| TriangleMarker::new(p, 5, CORAL.filled())))?;

    chart.draw_series(LineSeries::new(
        vec![(0.0, threshold), (x_max, threshold)],
        RED.mix(0.5).stroke_width(1),
    ))?;

    draw_legend(&mut chart)?;
    Ok(())
}

fn status_color(status: Status) -> RGBColor {
    match status {
        Status::Ok => STEEL_BLUE,
        Status::Collapse => RED,
        Status::Failed => ORANGE,
    }
}

fn draw_status_counts<DB>(area: &DrawingArea<DB, Shift>, data: &PlotData) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let counts = &data.summary.status_counts;
    let names: Vec<&str> = counts.iter().map(|(s, _)| s.as_str()).collect();
    let y_max = counts.iter().map(|&(_, c)| c).max().unwrap_or(0) + 1;

    let mut chart = ChartBuilder::on(area)
        .caption("Analysis Status", ("sans-serif", caption_size(true)))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d((0usize..counts.len()).into_segmented(), 0usize..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("Count")
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => names.get(*i).map(|n| n.to_string()).unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, &(status, count))| {
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0), (SegmentValue::Exact(i + 1), count)],
            status_color(status).filled(),
        );
        bar.set_margin(0, 0, 15, 15);
        bar
    }))?;
    Ok(())
}

/// Text block of the summary figure.
pub fn summary_lines(summary: &IdaSummary) -> Vec<String> {
    let mut lines = vec![
        "Summary Statistics".to_string(),
        "=".repeat(30),
        String::new(),
        format!("Total analyses: {}", summary.run_count),
        format!("Collapse count: {}", summary.collapse_count),
        String::new(),
    ];
    if let Some(amplitude) = summary.collapse_amplitude() {
        lines.push("Collapse amplitude:".to_string());
        lines.push(format!("  {:.1}g", amplitude));
        lines.push(String::new());
    }
    lines.push("Max drift:".to_string());
    lines.push(format!(
        "  {:.2}% at {:.1}g",
        summary.max_drift_pct, summary.max_drift_amplitude
    ));
    lines.push(String::new());
    lines.push("Max base shear:".to_string());
    lines.push(format!("  {:.1} kN", summary.max_base_shear_kn));
    lines.push(String::new());
    lines.push("Total energy:".to_string());
    lines.push(format!("  {:.1} kN·m", summary.max_energy_knm));
    lines
}

fn draw_summary_text<DB>(area: &DrawingArea<DB, Shift>, data: &PlotData) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (w, h) = area.dim_in_pixel();
    area.draw(&Rectangle::new(
        [(10, 10), (w as i32 - 10, h as i32 - 10)],
        RGBColor(245, 222, 179).mix(0.3).filled(),
    ))?;

    let style = TextStyle::from(("monospace", 16).into_font());
    for (i, line) in summary_lines(&data.summary).iter().enumerate() {
        area.draw_text(line, &style, (25, 25 + i as i32 * 20))?;
    }
    Ok(())
}

fn draw_summary<DB>(root: &DrawingArea<DB, Shift>, data: &PlotData) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let body = root.titled("IDA Validation Summary", ("sans-serif", 32))?;
    let panels = body.split_evenly((2, 3));

    draw_ida_curve(&panels[0], data, true)?;
    draw_peak_residual(&panels[1], data)?;
    draw_base_shear(&panels[2], data, true)?;
    draw_energy(&panels[3], data, true)?;
    draw_status_counts(&panels[4], data)?;
    draw_summary_text(&panels[5], data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_selection_prefers_representative_subset() {
        let available = [0.1, 0.2, 0.3, 0.4, 0.5];
        let preferred = [0.1, 0.2, 0.3, 0.5, 0.7, 1.0];
        assert_eq!(select_history_amplitudes(&available, &preferred), vec![0.1, 0.2, 0.3, 0.5]);
    }

    #[test]
    fn test_history_selection_falls_back_to_first_six() {
        let available = [1.1, 1.2, 1.3, 1.4, 1.5, 1.6, 1.7];
        let preferred = [0.1, 0.2];
        assert_eq!(
            select_history_amplitudes(&available, &preferred),
            vec![1.1, 1.2, 1.3, 1.4, 1.5, 1.6]
        );
    }

    #[test]
    fn test_axis_max_headroom_and_fallback() {
        assert!((axis_max([1.0, 2.0], 5.0) - 2.2).abs() < 1e-12);
        assert_eq!(axis_max([0.0, 0.0], 5.0), 5.0);
        assert_eq!(axis_max(Vec::<f64>::new(), 0.01), 0.01);
    }

    #[test]
    fn test_file_stems_are_unique() {
        let mut stems: Vec<&str> = ChartKind::ALL.iter().map(|k| k.file_stem()).collect();
        stems.sort();
        stems.dedup();
        assert_eq!(stems.len(), 6);
    }
}
