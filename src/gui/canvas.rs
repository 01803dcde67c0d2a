//! Electrode surface: head outline, electrodes and the in-place channel editor.
//!
//! Electrode positions live in surface-local coordinates (origin at the top-left of the
//! canvas). Everything is offset by the canvas origin when painted, and pointer positions
//! are converted back before they reach the [`ElectrodeArray`].

use std::f32::consts::TAU;

use egui::{pos2, vec2, Align2, Color32, FontId, Key, Pos2, Rect, Sense, Shape, Stroke, Vec2};
use tracing::debug;

use crate::array::{ElectrodeArray, PressOutcome};
use crate::colormap::ColorMapTable;
use crate::coordinator::CommitOutcome;
use crate::electrode::{Electrode, CIRCLE_RADIUS};
use crate::layout::{self, SurfaceGeometry, RING_UNITS};

const RING_COLOR: Color32 = Color32::from_gray(120);
const GUIDE_COLOR: Color32 = Color32::from_gray(90);
const SEGMENTS: usize = 96;

/// Pending rename started from an electrode's context menu.
#[derive(Debug, Clone)]
struct RenameDialog {
    electrode: String,
    text: String,
}

/// What happened on the canvas this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasEvent {
    /// A primary click landed on an electrode.
    Pressed(PressOutcome),
    /// The channel editor was accepted.
    Committed(CommitOutcome),
    /// The channel editor lost focus without accepting.
    EditCancelled,
    /// A label was changed from the rename window.
    Renamed,
}

/// Canvas widget state.
#[derive(Debug, Default)]
pub struct ElectrodeCanvas {
    rename: Option<RenameDialog>,
}

impl ElectrodeCanvas {
    /// Canvas with no dialog open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Paint the surface and route input. Returns the events that changed state.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        array: &mut ElectrodeArray,
        table: &ColorMapTable,
    ) -> Vec<CanvasEvent> {
        let mut events = Vec::new();
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
        let origin = rect.min.to_vec2();

        if array.geometry().size != rect.size() {
            array.resize(rect.size());
        }

        if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let outcome = array.pointer_press(pointer - origin);
                if outcome != PressOutcome::Missed {
                    events.push(CanvasEvent::Pressed(outcome));
                }
            }
        }

        if response.secondary_clicked() {
            if let Some((id, _)) = response
                .interact_pointer_pos()
                .and_then(|pointer| array.hit_test(pointer - origin))
            {
                if let Some(electrode) = array.get(id) {
                    self.rename = Some(RenameDialog {
                        electrode: electrode.name().to_string(),
                        text: electrode.label_text().to_string(),
                    });
                }
            }
        }

        if ui.is_rect_visible(rect) {
            let painter = ui.painter_at(rect);
            paint_head(&painter, origin, array.geometry());
            let text_color = ui.visuals().text_color();
            for electrode in array.electrodes() {
                paint_electrode(
                    &painter,
                    origin,
                    electrode,
                    table,
                    array.show_channel_numbers(),
                    text_color,
                );
            }
        }

        if let Some(event) = self.channel_editor(ui, array, origin) {
            events.push(event);
        }
        if self.rename_window(ui.ctx(), array) {
            events.push(CanvasEvent::Renamed);
        }
        events
    }

    /// Text field over the label of the electrode being edited.
    fn channel_editor(
        &mut self,
        ui: &mut egui::Ui,
        array: &mut ElectrodeArray,
        origin: Vec2,
    ) -> Option<CanvasEvent> {
        let id = array.editing()?;
        let label_rect = array.get(id)?.label_rect().translate(origin);
        let field = array.edit_field_mut()?;

        let response = ui.put(
            label_rect,
            egui::TextEdit::singleline(&mut field.text)
                .id(egui::Id::new(("channel_editor", id.index())))
                .desired_width(label_rect.width())
                .font(egui::TextStyle::Small),
        );
        if field.take_focus_request() {
            response.request_focus();
        }

        if response.lost_focus() {
            if ui.input(|i| i.key_pressed(Key::Enter)) {
                let outcome = array.commit_edit();
                debug!(?outcome, "Channel editor committed");
                return Some(CanvasEvent::Committed(outcome));
            }
            array.field_focus_lost();
            return Some(CanvasEvent::EditCancelled);
        }
        None
    }

    /// Returns true when a rename was applied.
    fn rename_window(&mut self, ctx: &egui::Context, array: &mut ElectrodeArray) -> bool {
        let Some(dialog) = self.rename.as_mut() else {
            return false;
        };

        let mut apply = false;
        let mut close = false;
        egui::Window::new(format!("Rename {}", dialog.electrode))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                let response = ui.text_edit_singleline(&mut dialog.text);
                if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
                    apply = true;
                }
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        apply = true;
                    }
                    if ui.button("Cancel").clicked() {
                        close = true;
                    }
                });
            });

        let renamed = apply && array.rename(&dialog.electrode, dialog.text.trim());
        if apply || close {
            self.rename = None;
        }
        renamed
    }
}

/// Outer ring, dashed guide rings, dotted crosshair and ears.
pub fn paint_head(painter: &egui::Painter, origin: Vec2, geometry: &SurfaceGeometry) {
    let center = geometry.center + origin;
    let radius = geometry.full_radius;
    if radius <= 0.0 {
        return;
    }

    painter.circle_stroke(center, radius, Stroke::new(2.0, RING_COLOR));

    let guide = Stroke::new(1.0, GUIDE_COLOR);
    for ring in 1..RING_UNITS as u8 {
        let points = circle_points(center, geometry.ring_radius(ring));
        painter.extend(Shape::dashed_line(&points, guide, 6.0, 4.0));
    }

    painter.extend(Shape::dotted_line(
        &[center - vec2(radius, 0.0), center + vec2(radius, 0.0)],
        GUIDE_COLOR,
        6.0,
        1.0,
    ));
    painter.extend(Shape::dotted_line(
        &[center - vec2(0.0, radius), center + vec2(0.0, radius)],
        GUIDE_COLOR,
        6.0,
        1.0,
    ));

    for ear in ["A1", "A2"] {
        if let Some(position) = layout::find_position(ear) {
            paint_ear(painter, center, radius, position.angle_deg);
        }
    }
}

/// Half-ellipse bulging outward from the head ring at `angle_deg`.
fn paint_ear(painter: &egui::Painter, center: Pos2, radius: f32, angle_deg: f32) {
    let angle = angle_deg.to_radians();
    let outward = vec2(angle.cos(), -angle.sin());
    let along = vec2(-outward.y, outward.x);
    let depth = radius * 0.12;
    let half_height = radius * 0.22;
    let base = center + outward * radius;

    let points: Vec<Pos2> = (0..=SEGMENTS / 2)
        .map(|i| {
            let t = i as f32 / (SEGMENTS / 2) as f32 * std::f32::consts::PI;
            base + along * (half_height * t.cos()) + outward * (depth * t.sin())
        })
        .collect();
    painter.add(Shape::line(points, Stroke::new(2.0, RING_COLOR)));
}

fn circle_points(center: Pos2, radius: f32) -> Vec<Pos2> {
    (0..=SEGMENTS)
        .map(|i| {
            let t = i as f32 / SEGMENTS as f32 * TAU;
            pos2(center.x + radius * t.cos(), center.y + radius * t.sin())
        })
        .collect()
}

/// One electrode: filled value circle with its number, caption below.
pub fn paint_electrode(
    painter: &egui::Painter,
    origin: Vec2,
    electrode: &Electrode,
    table: &ColorMapTable,
    show_channel_numbers: bool,
    text_color: Color32,
) {
    let appearance = electrode.appearance(table, show_channel_numbers);
    let circle = electrode.circle_center() + origin;

    painter.circle_filled(circle, CIRCLE_RADIUS, appearance.fill.to_color32());
    let outline = if electrode.is_editing() {
        Stroke::new(2.0, Color32::from_rgb(100, 200, 255))
    } else if electrode.is_auxiliary() {
        Stroke::new(1.5, RING_COLOR)
    } else {
        Stroke::new(1.0, Color32::from_gray(60))
    };
    painter.circle_stroke(circle, CIRCLE_RADIUS, outline);
    painter.text(
        circle,
        Align2::CENTER_CENTER,
        appearance.circle_text,
        FontId::proportional(11.0),
        Color32::BLACK,
    );

    if !electrode.is_editing() {
        let label: Rect = electrode.label_rect().translate(origin);
        painter.text(
            label.center(),
            Align2::CENTER_CENTER,
            appearance.caption,
            FontId::proportional(11.0),
            text_color,
        );
    }
}
