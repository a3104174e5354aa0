//! SVG heat strip of recent signal history.

use std::path::PathBuf;

use colorgrad::Color as GradientColor;
use colorgrad::{Gradient, GradientBuilder, LinearGradient};
use plotters::prelude::*;
use plotters::style::FontTransform;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::services::signal_log::LogRow;

const CELL_WIDTH: i32 = 18;
const STRIP_HEIGHT: i32 = 60;
const MARGIN_TOP: i32 = 40;
const MARGIN_BOTTOM: i32 = 96;
const MARGIN_LEFT: i32 = 12;
const LEGEND_GAP: i32 = 16;
const LEGEND_WIDTH: i32 = 76;

/// Renders the most recent log rows as one row of colored cells: green for
/// long-side signals, red for short-side, yellow for flat, with intensity
/// scaled by normalized confidence.
pub struct HeatmapRenderer {
    path: PathBuf,
    max_ticks: usize,
    ceiling: f64,
    symbol: String,
    gradient: LinearGradient,
}

impl HeatmapRenderer {
    pub fn new(
        path: impl Into<PathBuf>,
        max_ticks: usize,
        ceiling: f64,
        symbol: impl Into<String>,
    ) -> Result<Self> {
        let gradient = GradientBuilder::new()
            .colors(&[
                GradientColor::from_rgba8(255, 0, 0, 255),
                GradientColor::from_rgba8(255, 255, 0, 255),
                GradientColor::from_rgba8(0, 128, 0, 255),
            ])
            .domain(&[-1.0, 1.0])
            .build::<LinearGradient>()
            .map_err(|e| AppError::Render(e.to_string()))?;

        Ok(Self {
            path: path.into(),
            max_ticks,
            ceiling,
            symbol: symbol.into(),
            gradient,
        })
    }

    /// Heat value in -1.0..=1.0: sign from the direction, magnitude from
    /// confidence normalized by the strategy ceiling.
    fn heat(&self, row: &LogRow) -> f64 {
        if self.ceiling <= 0.0 {
            return 0.0;
        }
        (row.direction.sign() * (row.confidence / self.ceiling)).clamp(-1.0, 1.0)
    }

    fn cell_color(&self, heat: f64) -> RGBColor {
        let [r, g, b, _] = self.gradient.at(heat as f32).to_rgba8();
        RGBColor(r, g, b)
    }

    /// Draws the heat strip for `rows` (oldest first) and overwrites the
    /// output file in place.
    pub fn render(&self, rows: &[LogRow]) -> Result<()> {
        let rows = &rows[rows.len().saturating_sub(self.max_ticks)..];
        let cells_width = (rows.len() as i32 * CELL_WIDTH).max(CELL_WIDTH * 10);
        let width = MARGIN_LEFT + cells_width + LEGEND_GAP + LEGEND_WIDTH;
        let height = MARGIN_TOP + STRIP_HEIGHT + MARGIN_BOTTOM;

        let root = SVGBackend::new(&self.path, (width as u32, height as u32)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let title = format!("{} signal heatmap (last {} ticks)", self.symbol, rows.len());
        root.draw(&Text::new(
            title,
            (MARGIN_LEFT, 14),
            ("sans-serif", 16).into_font().color(&BLACK),
        ))
        .map_err(render_err)?;

        // One cell per tick, with rotated timestamps on a thinned subset so
        // long histories stay legible.
        let label_step = (rows.len() / 16).max(1);
        for (i, row) in rows.iter().enumerate() {
            let x0 = MARGIN_LEFT + i as i32 * CELL_WIDTH;
            let color = self.cell_color(self.heat(row));
            root.draw(&Rectangle::new(
                [
                    (x0, MARGIN_TOP),
                    (x0 + CELL_WIDTH - 1, MARGIN_TOP + STRIP_HEIGHT),
                ],
                color.filled(),
            ))
            .map_err(render_err)?;

            if i % label_step == 0 {
                root.draw(&Text::new(
                    row.timestamp.clone(),
                    (x0 + CELL_WIDTH / 2 + 4, MARGIN_TOP + STRIP_HEIGHT + 8),
                    ("sans-serif", 11)
                        .into_font()
                        .transform(FontTransform::Rotate90)
                        .color(&BLACK),
                ))
                .map_err(render_err)?;
            }
        }

        // Vertical legend from +1 (top) to -1 (bottom).
        let legend_x = MARGIN_LEFT + cells_width + LEGEND_GAP;
        for step in 0..=STRIP_HEIGHT {
            let t = 1.0 - 2.0 * f64::from(step) / f64::from(STRIP_HEIGHT);
            let y = MARGIN_TOP + step;
            root.draw(&Rectangle::new(
                [(legend_x, y), (legend_x + 14, y + 1)],
                self.cell_color(t).filled(),
            ))
            .map_err(render_err)?;
        }
        let legend_labels = [
            ("LONG", MARGIN_TOP + 4),
            ("FLAT", MARGIN_TOP + STRIP_HEIGHT / 2 + 4),
            ("SHORT", MARGIN_TOP + STRIP_HEIGHT + 4),
        ];
        for (label, y) in legend_labels {
            root.draw(&Text::new(
                label,
                (legend_x + 18, y),
                ("sans-serif", 11).into_font().color(&BLACK),
            ))
            .map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
        debug!(path = %self.path.display(), ticks = rows.len(), "Rendered heatmap");
        Ok(())
    }
}

fn render_err(e: impl std::fmt::Display) -> AppError {
    AppError::Render(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;
    use tempfile::tempdir;

    fn row(timestamp: &str, direction: Direction, confidence: f64) -> LogRow {
        LogRow {
            timestamp: timestamp.to_string(),
            direction,
            confidence,
        }
    }

    #[test]
    fn test_heat_normalizes_and_clamps() {
        let dir = tempdir().unwrap();
        let renderer =
            HeatmapRenderer::new(dir.path().join("map.svg"), 50, 4.0, "BTCUSDT").unwrap();

        assert_eq!(renderer.heat(&row("t", Direction::Long, 4.0)), 1.0);
        assert_eq!(renderer.heat(&row("t", Direction::Short, 2.0)), -0.5);
        assert_eq!(renderer.heat(&row("t", Direction::Long, 10.0)), 1.0);
        assert_eq!(renderer.heat(&row("t", Direction::None, 3.0)), 0.0);
    }

    #[test]
    fn test_zero_ceiling_is_flat() {
        let dir = tempdir().unwrap();
        let renderer =
            HeatmapRenderer::new(dir.path().join("map.svg"), 50, 0.0, "BTCUSDT").unwrap();
        assert_eq!(renderer.heat(&row("t", Direction::Long, 1.0)), 0.0);
    }

    #[test]
    fn test_render_writes_svg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.svg");
        let renderer = HeatmapRenderer::new(&path, 50, 1.0, "BTCUSDT").unwrap();

        renderer
            .render(&[
                row("2024-03-01 10:00", Direction::Long, 0.9),
                row("2024-03-01 10:05", Direction::None, 0.25),
                row("2024-03-01 10:10", Direction::Short, 0.6),
            ])
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("<svg"));
        assert!(contents.contains("BTCUSDT"));
        assert!(contents.contains("last 3 ticks"));
    }

    #[test]
    fn test_render_empty_history() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.svg");
        let renderer = HeatmapRenderer::new(&path, 50, 1.0, "BTCUSDT").unwrap();

        renderer.render(&[]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_render_truncates_to_max_ticks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.svg");
        let renderer = HeatmapRenderer::new(&path, 2, 1.0, "BTCUSDT").unwrap();

        let rows: Vec<LogRow> = (0..5)
            .map(|i| row(&format!("2024-03-01 10:{:02}", i * 5), Direction::None, 0.0))
            .collect();
        renderer.render(&rows).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("last 2 ticks"));
    }
}
