use anyhow::{Context, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

use crate::confusion::ConfusionMatrix;

/// Render `matrix` as a heatmap PNG at `path`.
pub fn generate_confusion_plot(matrix: &ConfusionMatrix, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let n = matrix.labels.len().max(1);
    let root = BitMapBackend::new(path, (800, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Confusion Matrix", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(0f64..n as f64, 0f64..n as f64)?;

    // Rows are drawn top-down, so the y axis is flipped.
    let label_at = |v: f64, flip: bool| -> String {
        let i = v.floor() as usize;
        let i = if flip { n.saturating_sub(1 + i) } else { i };
        if (v - v.floor() - 0.5).abs() < 1e-6 {
            matrix.labels.get(i).cloned().unwrap_or_default()
        } else {
            String::new()
        }
    };

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Predicted")
        .y_desc("True")
        .x_labels(2 * n + 1)
        .y_labels(2 * n + 1)
        .x_label_formatter(&|v: &f64| label_at(*v, false))
        .y_label_formatter(&|v: &f64| label_at(*v, true))
        .draw()?;

    let max = matrix.max_count().max(1) as f64;
    let cells = matrix.counts.iter().enumerate().flat_map(|(row, counts)| {
        counts.iter().enumerate().map(move |(col, count)| (row, col, *count))
    });

    for (row, col, count) in cells {
        let x = col as f64;
        let y = (n - 1 - row) as f64;
        let shade = 1.0 - count as f64 / max;
        let fill = RGBColor(
            (30.0 + 225.0 * shade) as u8,
            (80.0 + 175.0 * shade) as u8,
            (160.0 + 95.0 * shade) as u8,
        );
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x, y), (x + 1.0, y + 1.0)],
            fill.filled(),
        )))?;

        let text_color = if shade < 0.5 { &WHITE } else { &BLACK };
        chart.draw_series(std::iter::once(Text::new(
            count.to_string(),
            (x + 0.5, y + 0.5),
            ("sans-serif", 24.0)
                .into_font()
                .color(text_color)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        )))?;
    }

    root.present()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "Saved confusion matrix plot");
    Ok(())
}
