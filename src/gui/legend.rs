//! Vertical color scale for the impedance table.
//!
//! Draws every one of the 256 table entries as a one-row band, index 0 at the top and the
//! open-circuit end at the bottom, with tick labels at fixed impedance steps.

use egui::{pos2, vec2, Align2, Color32, FontId, Rect, Sense, Stroke};

use crate::colormap::{ColorMapTable, TABLE_SIZE};

/// Values that get a tick label.
pub const TICKS: [u16; 8] = [2, 5, 10, 20, 50, 100, 200, 256];

/// Color legend widget
#[derive(Debug, Clone)]
pub struct Legend {
    /// Width of the gradient bar
    pub bar_width: f32,
    /// Caption above the bar
    pub title: String,
}

impl Default for Legend {
    fn default() -> Self {
        Self {
            bar_width: 24.0,
            title: "kΩ".to_string(),
        }
    }
}

impl Legend {
    /// Legend with the default bar width and caption.
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the legend, filling the available height.
    pub fn show(&self, ui: &mut egui::Ui, table: &ColorMapTable) {
        ui.vertical(|ui| {
            ui.label(egui::RichText::new(&self.title).small());

            let label_room = 36.0;
            let height = (ui.available_height() - 8.0).max(64.0);
            let (rect, _) =
                ui.allocate_exact_size(vec2(self.bar_width + label_room, height), Sense::hover());
            if !ui.is_rect_visible(rect) {
                return;
            }
            let bar = Rect::from_min_size(rect.min, vec2(self.bar_width, rect.height()));
            self.draw_gradient(ui, table, bar);
            self.draw_ticks(ui, bar);
        });
    }

    fn draw_gradient(&self, ui: &egui::Ui, table: &ColorMapTable, rect: Rect) {
        let painter = ui.painter();
        let row_height = rect.height() / TABLE_SIZE as f32;

        for (index, color) in table.colors().iter().enumerate() {
            let y_start = rect.top() + index as f32 * row_height;
            painter.rect_filled(
                Rect::from_min_max(
                    pos2(rect.left(), y_start),
                    pos2(rect.right(), y_start + row_height),
                ),
                0.0,
                color.to_color32(),
            );
        }

        painter.rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::GRAY));
    }

    fn draw_ticks(&self, ui: &egui::Ui, rect: Rect) {
        let painter = ui.painter();
        let text_color = ui.visuals().text_color();
        let font = FontId::proportional(11.0);

        for tick in TICKS {
            let y = rect.top() + tick_fraction(tick) * rect.height();
            painter.line_segment(
                [pos2(rect.right(), y), pos2(rect.right() + 4.0, y)],
                Stroke::new(1.0, Color32::GRAY),
            );
            painter.text(
                pos2(rect.right() + 6.0, y),
                Align2::LEFT_CENTER,
                tick.to_string(),
                font.clone(),
                text_color,
            );
        }
    }
}

/// Vertical position of a tick as a fraction of the bar height, measured from the top.
pub fn tick_fraction(value: u16) -> f32 {
    let scale = TABLE_SIZE as f32;
    f32::from(value).min(scale) / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_run_top_to_bottom() {
        assert_eq!(tick_fraction(256), 1.0);
        assert!((tick_fraction(2) - 2.0 / 256.0).abs() < 1e-6);
        let fractions: Vec<f32> = TICKS.iter().map(|&t| tick_fraction(t)).collect();
        assert!(fractions.windows(2).all(|w| w[0] < w[1]));
    }
}
