// Chart Rendering
//
// Confusion matrix heatmap and ROC curve, written as SVG with plotters.

use std::path::Path;

use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::metrics::Evaluation;
use crate::error::{DetectorError, Result};

fn plot_error<E: std::fmt::Display>(err: E) -> DetectorError {
    DetectorError::Plot(err.to_string())
}

/// Cell shade on a white-to-navy ramp, `t` in [0, 1]
fn blues(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let lerp = |from: u8, to: u8| (from as f64 + (to as f64 - from as f64) * t).round() as u8;
    RGBColor(lerp(247, 8), lerp(251, 48), lerp(255, 107))
}

/// Annotated 2x2 heatmap: rows are actual classes (0 on top), columns predicted
pub fn render_confusion_matrix(eval: &Evaluation, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, (500, 400)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Confusion Matrix", ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d((0u32..2u32).into_segmented(), (0u32..2u32).into_segmented())
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Predicted")
        .y_desc("Actual")
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(c) => c.to_string(),
            _ => String::new(),
        })
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(c) => (1 - (*c).min(1)).to_string(),
            _ => String::new(),
        })
        .draw()
        .map_err(plot_error)?;

    let max = eval.confusion.iter().flatten().copied().max().unwrap_or(0).max(1) as f64;

    let mut cells = Vec::with_capacity(4);
    let mut labels = Vec::with_capacity(4);
    for actual in 0..2u32 {
        for predicted in 0..2u32 {
            let count = eval.confusion[actual as usize][predicted as usize];
            let shade = count as f64 / max;
            let row = 1 - actual;

            cells.push(Rectangle::new(
                [
                    (SegmentValue::Exact(predicted), SegmentValue::Exact(row)),
                    (SegmentValue::Exact(predicted + 1), SegmentValue::Exact(row + 1)),
                ],
                blues(shade).filled(),
            ));

            let ink = if shade > 0.5 { WHITE } else { BLACK };
            let style = ("sans-serif", 24)
                .into_font()
                .color(&ink)
                .pos(Pos::new(HPos::Center, VPos::Center));
            labels.push(Text::new(
                count.to_string(),
                (SegmentValue::CenterOf(predicted), SegmentValue::CenterOf(row)),
                style,
            ));
        }
    }

    chart.draw_series(cells).map_err(plot_error)?;
    chart.draw_series(labels).map_err(plot_error)?;
    root.present().map_err(plot_error)?;
    Ok(())
}

/// ROC curve with a dashed chance diagonal and the AUC in the legend
pub fn render_roc_curve(eval: &Evaluation, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, (600, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("ROC Curve", ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(0f64..1f64, 0f64..1.05f64)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("False Positive Rate")
        .y_desc("True Positive Rate")
        .draw()
        .map_err(plot_error)?;

    let points: Vec<(f64, f64)> = eval
        .roc
        .fpr
        .iter()
        .copied()
        .zip(eval.roc.tpr.iter().copied())
        .collect();

    chart
        .draw_series(LineSeries::new(points, BLUE.stroke_width(2)))
        .map_err(plot_error)?
        .label(format!("ROC Curve (AUC = {:.2})", eval.auc))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    const DASHES: usize = 25;
    chart
        .draw_series((0..DASHES).map(|i| {
            let start = i as f64 / DASHES as f64;
            let end = (i as f64 + 0.5) / DASHES as f64;
            PathElement::new(vec![(start, start), (end, end)], &BLACK)
        }))
        .map_err(plot_error)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}
