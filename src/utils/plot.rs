//! SVG charts for the regression fits and the GAN runs

use std::ops::Range;
use std::path::Path;

use ndarray::Array2;
use plotters::prelude::*;
use thiserror::Error;

use crate::training::TrainingMetrics;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("cannot create {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("drawing failed: {0}")]
    Drawing(String),

    #[error("nothing to plot for {0}")]
    Empty(&'static str),
}

fn drawing<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Drawing(e.to_string())
}

const SIZE: (u32, u32) = (800, 600);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 24);

fn prepare(path: &Path) -> Result<(), PlotError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| PlotError::Io {
                path: parent.display().to_string(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Min..max of the finite values with 5% padding; never empty
fn padded_range<I: IntoIterator<Item = f64>>(values: I) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    (lo - pad)..(hi + pad)
}

/// Viridis colormap, `t` clamped to [0, 1]
pub fn viridis(t: f64) -> RGBColor {
    const STOPS: [(u8, u8, u8); 9] = [
        (68, 1, 84),
        (71, 44, 122),
        (59, 81, 139),
        (44, 113, 142),
        (33, 144, 141),
        (39, 173, 129),
        (92, 200, 99),
        (170, 220, 50),
        (253, 231, 37),
    ];
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (STOPS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(STOPS.len() - 2);
    let frac = scaled - i as f64;
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (STOPS[i], STOPS[i + 1]);
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Scatter of `(x, y)` observations with a red fitted line through `(x, fitted)`
pub fn plot_fit(
    path: &Path,
    title: &str,
    labels: (&str, &str),
    x: &[f64],
    y: &[f64],
    fitted: &[f64],
) -> Result<(), PlotError> {
    if x.is_empty() {
        return Err(PlotError::Empty("fit"));
    }
    prepare(path)?;

    let mut line: Vec<(f64, f64)> = x.iter().copied().zip(fitted.iter().copied()).collect();
    line.sort_by(|a, b| a.0.total_cmp(&b.0));

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(title, CAPTION_FONT)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(
            padded_range(x.iter().copied()),
            padded_range(y.iter().chain(fitted.iter()).copied()),
        )
        .map_err(drawing)?;

    chart
        .configure_mesh()
        .x_desc(labels.0)
        .y_desc(labels.1)
        .draw()
        .map_err(drawing)?;

    chart
        .draw_series(
            x.iter()
                .zip(y.iter())
                .map(|(&xi, &yi)| Circle::new((xi, yi), 3, BLUE.mix(0.6).filled())),
        )
        .map_err(drawing)?
        .label("Data")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, BLUE.filled()));

    chart
        .draw_series(LineSeries::new(line, RED.stroke_width(2)))
        .map_err(drawing)?
        .label("Fit")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(drawing)?;

    root.present().map_err(drawing)?;
    Ok(())
}

/// 3-D scatter of `(x, y, z)` points coloured by `z` with viridis
///
/// `z` is drawn on the vertical axis.
pub fn plot_fit_3d(path: &Path, title: &str, points: &[(f64, f64, f64)]) -> Result<(), PlotError> {
    if points.is_empty() {
        return Err(PlotError::Empty("3d fit"));
    }
    prepare(path)?;

    let x_range = padded_range(points.iter().map(|p| p.0));
    let y_range = padded_range(points.iter().map(|p| p.1));
    let z_range = padded_range(points.iter().map(|p| p.2));
    let (z_lo, z_span) = (z_range.start, z_range.end - z_range.start);

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(title, CAPTION_FONT)
        .build_cartesian_3d(x_range, z_range, y_range)
        .map_err(drawing)?;

    chart.with_projection(|mut pb| {
        pb.yaw = 0.6;
        pb.pitch = 0.3;
        pb.scale = 0.85;
        pb.into_matrix()
    });

    chart.configure_axes().draw().map_err(drawing)?;

    chart
        .draw_series(points.iter().map(|&(x, y, z)| {
            let color = viridis((z - z_lo) / z_span);
            Circle::new((x, z, y), 4, color.filled())
        }))
        .map_err(drawing)?;

    root.present().map_err(drawing)?;
    Ok(())
}

/// Real and generated samples on the first two feature axes
pub fn plot_samples(
    path: &Path,
    title: &str,
    labels: (&str, &str),
    real: &Array2<f64>,
    generated: &Array2<f64>,
) -> Result<(), PlotError> {
    if real.ncols() < 2 || generated.ncols() < 2 {
        return Err(PlotError::Empty("samples"));
    }
    prepare(path)?;

    let pairs = |data: &Array2<f64>| -> Vec<(f64, f64)> { data.rows().into_iter().map(|r| (r[0], r[1])).collect() };
    let real_points = pairs(real);
    let generated_points = pairs(generated);

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(title, CAPTION_FONT)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(
            padded_range(real_points.iter().chain(generated_points.iter()).map(|p| p.0)),
            padded_range(real_points.iter().chain(generated_points.iter()).map(|p| p.1)),
        )
        .map_err(drawing)?;

    chart
        .configure_mesh()
        .x_desc(labels.0)
        .y_desc(labels.1)
        .draw()
        .map_err(drawing)?;

    chart
        .draw_series(real_points.iter().map(|&p| Circle::new(p, 2, BLUE.mix(0.4).filled())))
        .map_err(drawing)?
        .label("Real")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, BLUE.filled()));

    chart
        .draw_series(generated_points.iter().map(|&p| Circle::new(p, 3, RED.filled())))
        .map_err(drawing)?
        .label("Generated")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, RED.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(drawing)?;

    root.present().map_err(drawing)?;
    Ok(())
}

/// Per-epoch generator and discriminator (critic) losses
pub fn plot_losses(path: &Path, title: &str, metrics: &TrainingMetrics) -> Result<(), PlotError> {
    if metrics.num_epochs() == 0 {
        return Err(PlotError::Empty("losses"));
    }
    prepare(path)?;

    let series = |values: &[f64]| -> Vec<(f64, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| ((i + 1) as f64, v))
            .collect()
    };
    let gen = series(&metrics.gen_losses);
    let disc = series(&metrics.disc_losses);

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(title, CAPTION_FONT)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(
            padded_range(gen.iter().map(|p| p.0)),
            padded_range(gen.iter().chain(disc.iter()).map(|p| p.1)),
        )
        .map_err(drawing)?;

    chart
        .configure_mesh()
        .x_desc("Epoch")
        .y_desc("Loss")
        .draw()
        .map_err(drawing)?;

    chart
        .draw_series(LineSeries::new(gen, BLUE.stroke_width(2)))
        .map_err(drawing)?
        .label("Generator")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(disc, RED.stroke_width(2)))
        .map_err(drawing)?
        .label("Discriminator")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(drawing)?;

    root.present().map_err(drawing)?;
    Ok(())
}
