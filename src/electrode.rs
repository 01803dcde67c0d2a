//! A single visualized sensor position.
//!
//! An [`Electrode`] owns its display state: the operator-facing label, the amplifier
//! channel it is bound to, whether it is active, and the latest impedance value. Writes to
//! the channel and the value are clamped, never rejected.
//!
//! The edit flag is only flipped by [`EditCoordinator`](crate::coordinator::EditCoordinator),
//! which is what guarantees that at most one electrode in a set is being edited.

use egui::{pos2, vec2, Pos2, Rect, Vec2};

use crate::colormap::{ColorMapTable, MapColor};
use crate::layout::{AuxSlot, ElectrodePosition, SurfaceGeometry};

/// Footprint of one electrode on the surface, centred on its anchor.
pub const CONTROL_SIZE: Vec2 = vec2(50.0, 70.0);

/// Radius of the value circle.
pub const CIRCLE_RADIUS: f32 = 15.0;

/// Offset of the circle centre from the anchor.
const CIRCLE_OFFSET: Vec2 = vec2(0.0, -10.0);

/// Label band below the circle, relative to the anchor.
const LABEL_OFFSET: Vec2 = vec2(-25.0, 10.0);
const LABEL_SIZE: Vec2 = vec2(50.0, 20.0);

/// Fill used for inactive electrodes.
pub const INACTIVE_FILL: MapColor = MapColor::rgb(211, 211, 211);

/// Largest impedance value; rendered as "Inf".
pub const MAX_VALUE: u8 = 255;

/// Where an electrode sits on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Polar position on the head diagram.
    Cap {
        /// Angle in degrees, counter-clockwise from the right ear.
        angle_deg: f32,
        /// Distance from the vertex in ring units.
        radius: f32,
    },
    /// Auxiliary slot at fixed surface fractions.
    Aux {
        /// Horizontal position as a fraction of the surface width.
        x_fraction: f32,
        /// Vertical position as a fraction of the surface height.
        y_fraction: f32,
    },
}

impl Placement {
    fn anchor(&self, geometry: &SurfaceGeometry) -> Pos2 {
        match *self {
            Placement::Cap { angle_deg, radius } => crate::layout::place(
                angle_deg,
                radius,
                geometry.center,
                geometry.full_radius,
            ),
            Placement::Aux {
                x_fraction,
                y_fraction,
            } => pos2(geometry.size.x * x_fraction, geometry.size.y * y_fraction),
        }
    }
}

/// Stable handle to an electrode within its array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElectrodeId(pub(crate) usize);

impl ElectrodeId {
    /// Position in the owning array.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Part of an electrode hit by a pointer press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitRegion {
    /// The colored value circle.
    Circle,
    /// The label band below the circle.
    Label,
}

/// What the electrode should draw this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Appearance {
    /// Circle fill: the table color for the value, or gray when inactive.
    pub fill: MapColor,
    /// Text inside the circle.
    pub circle_text: String,
    /// Text in the label band.
    pub caption: String,
}

/// One sensor position with its live and configured state.
#[derive(Debug, Clone)]
pub struct Electrode {
    name: String,
    label_text: String,
    hardware_channel: u32,
    is_active: bool,
    value: u8,
    edit_state: bool,
    placement: Placement,
    position: Pos2,
}

impl Electrode {
    fn new(name: &str, placement: Placement) -> Self {
        Self {
            name: name.to_string(),
            label_text: name.to_string(),
            hardware_channel: 0,
            is_active: true,
            value: 0,
            edit_state: false,
            placement,
            position: Pos2::ZERO,
        }
    }

    /// Electrode on the head diagram.
    pub fn on_cap(position: &ElectrodePosition) -> Self {
        Self::new(
            position.name,
            Placement::Cap {
                angle_deg: position.angle_deg,
                radius: position.radius,
            },
        )
    }

    /// Electrode in an auxiliary slot.
    pub fn auxiliary(slot: &AuxSlot) -> Self {
        Self::new(
            slot.name,
            Placement::Aux {
                x_fraction: slot.x_fraction,
                y_fraction: slot.y_fraction,
            },
        )
    }

    /// Fixed position name, also the montage key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operator-facing label.
    pub fn label_text(&self) -> &str {
        &self.label_text
    }

    /// Replace the label.
    pub fn set_label_text(&mut self, label: impl Into<String>) {
        self.label_text = label.into();
    }

    /// Bound amplifier channel, 1-based; 0 means unassigned.
    pub fn hardware_channel(&self) -> u32 {
        self.hardware_channel
    }

    /// Bind to a channel, clamped to `0..=max_channel`. Returns the stored channel.
    pub fn set_hardware_channel(&mut self, channel: i64, max_channel: u32) -> u32 {
        self.hardware_channel = channel.clamp(0, i64::from(max_channel)) as u32;
        self.hardware_channel
    }

    /// Whether the electrode takes part in the recording.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Set the active flag.
    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    /// Flip the active flag.
    pub fn toggle_active(&mut self) {
        self.is_active = !self.is_active;
    }

    /// Latest impedance value.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Store an impedance sample, clamped to `0..=255`.
    pub fn set_value(&mut self, value: i64) {
        self.value = value.clamp(0, i64::from(MAX_VALUE)) as u8;
    }

    /// Whether this electrode's channel field is open.
    pub fn is_editing(&self) -> bool {
        self.edit_state
    }

    pub(crate) fn set_edit_state(&mut self, editing: bool) {
        self.edit_state = editing;
    }

    /// Static placement the position is computed from.
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Whether this electrode sits in an auxiliary slot rather than on the cap.
    pub fn is_auxiliary(&self) -> bool {
        matches!(self.placement, Placement::Aux { .. })
    }

    /// Anchor point on the surface (centre of the electrode footprint).
    pub fn position(&self) -> Pos2 {
        self.position
    }

    /// Recompute the anchor from the static placement.
    pub fn relayout(&mut self, geometry: &SurfaceGeometry) {
        self.position = self.placement.anchor(geometry);
    }

    /// Centre of the value circle.
    pub fn circle_center(&self) -> Pos2 {
        self.position + CIRCLE_OFFSET
    }

    /// Label band below the circle; also where the channel editor is placed.
    pub fn label_rect(&self) -> Rect {
        Rect::from_min_size(self.position + LABEL_OFFSET, LABEL_SIZE)
    }

    /// Bounding box of the whole electrode.
    pub fn footprint(&self) -> Rect {
        Rect::from_center_size(self.position, CONTROL_SIZE)
    }

    /// Which part of this electrode, if any, lies under `point`.
    pub fn hit_test(&self, point: Pos2) -> Option<HitRegion> {
        if self.label_rect().contains(point) {
            Some(HitRegion::Label)
        } else if self.circle_center().distance(point) <= CIRCLE_RADIUS {
            Some(HitRegion::Circle)
        } else {
            None
        }
    }

    /// Resolve what to draw.
    ///
    /// Inactive electrodes are gray regardless of value or edit state. While editing, both
    /// the circle and the caption show the channel number.
    pub fn appearance(&self, table: &ColorMapTable, show_channel_numbers: bool) -> Appearance {
        let fill = if self.is_active {
            table.color_for(self.value)
        } else {
            INACTIVE_FILL
        };

        let circle_text = if self.edit_state {
            self.hardware_channel.to_string()
        } else if self.value == MAX_VALUE {
            "Inf".to_string()
        } else {
            self.value.to_string()
        };

        let caption = if self.edit_state || show_channel_numbers {
            self.hardware_channel.to_string()
        } else {
            self.label_text.clone()
        };

        Appearance {
            fill,
            circle_text,
            caption,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{find_position, AUX_SLOTS};

    fn fz() -> Electrode {
        Electrode::on_cap(find_position("Fz").unwrap())
    }

    #[test]
    fn defaults_follow_position_name() {
        let e = fz();
        assert_eq!(e.name(), "Fz");
        assert_eq!(e.label_text(), "Fz");
        assert_eq!(e.hardware_channel(), 0);
        assert!(e.is_active());
        assert!(!e.is_editing());
    }

    #[test]
    fn channel_writes_are_clamped() {
        let mut e = fz();
        assert_eq!(e.set_hardware_channel(-5, 64), 0);
        assert_eq!(e.set_hardware_channel(64 + 50, 64), 64);
        assert_eq!(e.set_hardware_channel(12, 64), 12);
        // Clamping twice gives the same answer.
        assert_eq!(e.set_hardware_channel(i64::from(e.hardware_channel()), 64), 12);
    }

    #[test]
    fn value_writes_are_clamped() {
        let mut e = fz();
        e.set_value(-1);
        assert_eq!(e.value(), 0);
        e.set_value(10_000);
        assert_eq!(e.value(), 255);
        e.set_value(42);
        assert_eq!(e.value(), 42);
    }

    #[test]
    fn circle_text_shows_inf_at_max() {
        let table = ColorMapTable::generated();
        let mut e = fz();
        e.set_value(255);
        assert_eq!(e.appearance(&table, false).circle_text, "Inf");
        e.set_value(254);
        assert_eq!(e.appearance(&table, false).circle_text, "254");
    }

    #[test]
    fn inactive_is_gray_even_while_editing() {
        let table = ColorMapTable::generated();
        let mut e = fz();
        e.set_value(100);
        e.set_active(false);
        e.set_edit_state(true);
        assert_eq!(e.appearance(&table, false).fill, INACTIVE_FILL);
        e.set_active(true);
        assert_eq!(e.appearance(&table, false).fill, table.color_for(100));
    }

    #[test]
    fn caption_switches_to_channel() {
        let table = ColorMapTable::generated();
        let mut e = fz();
        e.set_label_text("Frontal");
        e.set_hardware_channel(7, 256);
        e.set_value(30);

        let normal = e.appearance(&table, false);
        assert_eq!(normal.caption, "Frontal");
        assert_eq!(normal.circle_text, "30");

        assert_eq!(e.appearance(&table, true).caption, "7");

        e.set_edit_state(true);
        let editing = e.appearance(&table, false);
        assert_eq!(editing.caption, "7");
        assert_eq!(editing.circle_text, "7");
    }

    #[test]
    fn hit_regions_do_not_overlap() {
        let mut e = fz();
        e.relayout(&SurfaceGeometry::from_size(vec2(800.0, 600.0)));
        let anchor = e.position();
        assert_eq!(e.hit_test(e.circle_center()), Some(HitRegion::Circle));
        assert_eq!(e.hit_test(anchor + vec2(0.0, 20.0)), Some(HitRegion::Label));
        assert_eq!(e.hit_test(anchor + vec2(40.0, 0.0)), None);
    }

    #[test]
    fn footprint_covers_both_hit_regions() {
        let mut e = fz();
        e.relayout(&SurfaceGeometry::from_size(vec2(800.0, 600.0)));
        let footprint = e.footprint();
        assert_eq!(footprint.size(), CONTROL_SIZE);
        assert!(footprint.contains(e.label_rect().min));
        assert!(footprint.contains(e.label_rect().max));
        assert!(footprint.contains(e.circle_center() - vec2(0.0, CIRCLE_RADIUS)));
        assert!(!fz().is_auxiliary());
    }

    #[test]
    fn auxiliary_ignores_polar_layout() {
        let mut e = Electrode::auxiliary(&AUX_SLOTS[3]);
        assert!(e.is_auxiliary());
        e.relayout(&SurfaceGeometry::from_size(vec2(1000.0, 500.0)));
        assert!(e.position().distance(pos2(900.0, 360.0)) < 1e-3);
    }
}
