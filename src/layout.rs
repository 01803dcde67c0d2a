//! Polar layout of electrode positions onto the display surface.
//!
//! Positions on the cap are described in a head-centred polar system: an angle in degrees
//! (0° = right ear, 90° = nasion, counter-clockwise positive) and a radius in ring units,
//! where 0 is the vertex (Cz) and [`RING_UNITS`] is the outermost ring. Fractional radii
//! place an electrode between rings.
//!
//! The surface geometry is recomputed from scratch on every resize and every electrode is
//! re-placed from the static table; positions are never adjusted incrementally.

use egui::{pos2, Pos2, Vec2};

/// Radius (in ring units) of the outermost ring.
pub const RING_UNITS: f32 = 5.0;

/// Fraction of the surface height used as the full head radius.
pub const FULL_RADIUS_FRACTION: f32 = 0.43;

/// Static placement of one named position on the cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElectrodePosition {
    /// Unique position name (e.g. "Fz", "TP10").
    pub name: &'static str,
    /// Angle in degrees, counter-clockwise from the right ear.
    pub angle_deg: f32,
    /// Distance from the vertex in ring units.
    pub radius: f32,
}

const fn at(name: &'static str, angle_deg: f32, radius: f32) -> ElectrodePosition {
    ElectrodePosition {
        name,
        angle_deg,
        radius,
    }
}

/// Extended 10-10 positions drawn on the head diagram.
pub const STANDARD_POSITIONS: &[ElectrodePosition] = &[
    // Midline
    at("Nz", 90.0, 5.0),
    at("FPz", 90.0, 4.0),
    at("AFz", 90.0, 3.0),
    at("Fz", 90.0, 2.0),
    at("FCz", 90.0, 1.0),
    at("Cz", 0.0, 0.0),
    at("CPz", -90.0, 1.0),
    at("Pz", -90.0, 2.0),
    at("POz", -90.0, 3.0),
    at("Oz", -90.0, 4.0),
    at("Iz", -90.0, 5.0),
    // Central line
    at("T7", 180.0, 4.0),
    at("C5", 180.0, 3.0),
    at("C3", 180.0, 2.0),
    at("C1", 180.0, 1.0),
    at("C2", 0.0, 1.0),
    at("C4", 0.0, 2.0),
    at("C6", 0.0, 3.0),
    at("T8", 0.0, 4.0),
    at("A2", 0.0, 5.0),
    at("A1", 180.0, 5.0),
    // Outer ring
    at("F9", 144.0, 5.0),
    at("FT9", 162.0, 5.0),
    at("TP9", 198.0, 5.0),
    at("P9", 216.0, 5.0),
    at("F10", 36.0, 5.0),
    at("FT10", 18.0, 5.0),
    at("TP10", -18.0, 5.0),
    at("P10", -36.0, 5.0),
    at("PO9", -126.0, 5.0),
    at("PO10", -54.0, 5.0),
    at("I1", -105.0, 5.0),
    at("I2", -75.0, 5.0),
    // Circumference (ring 4)
    at("Fp1", 108.0, 4.0),
    at("AF7", 126.0, 4.0),
    at("F7", 144.0, 4.0),
    at("FT7", 162.0, 4.0),
    at("Fp2", 72.0, 4.0),
    at("AF8", 54.0, 4.0),
    at("F8", 36.0, 4.0),
    at("FT8", 18.0, 4.0),
    at("O1", -108.0, 4.0),
    at("PO7", -126.0, 4.0),
    at("P7", -144.0, 4.0),
    at("TP7", -162.0, 4.0),
    at("O2", -72.0, 4.0),
    at("PO8", -54.0, 4.0),
    at("P8", -36.0, 4.0),
    at("TP8", -18.0, 4.0),
    // Frontal / parietal arcs
    at("AF4", 68.0, 3.2),
    at("F6", 43.0, 3.1),
    at("F4", 55.0, 2.5),
    at("F2", 70.0, 2.15),
    at("AF3", 112.0, 3.2),
    at("F5", 137.0, 3.1),
    at("F3", 125.0, 2.5),
    at("F1", 110.0, 2.15),
    at("PO4", -68.0, 3.2),
    at("P6", -43.0, 3.1),
    at("P4", -55.0, 2.45),
    at("P2", -70.0, 2.15),
    at("PO3", -112.0, 3.2),
    at("P5", -137.0, 3.1),
    at("P3", -125.0, 2.45),
    at("P1", -110.0, 2.15),
    // Fronto-central / centro-parietal
    at("FC5", 158.0, 3.05),
    at("FC3", 151.0, 2.1),
    at("FC1", 135.0, 1.35),
    at("CP5", -158.0, 3.05),
    at("CP3", -151.0, 2.1),
    at("CP1", -135.0, 1.35),
    at("FC6", 22.0, 3.05),
    at("FC4", 29.0, 2.1),
    at("FC2", 45.0, 1.35),
    at("CP6", -22.0, 3.05),
    at("CP4", -29.0, 2.1),
    at("CP2", -45.0, 1.35),
];

/// One of the auxiliary (EOG) slots placed outside the head diagram.
///
/// Auxiliary slots are positioned at fixed fractions of the surface width and height,
/// independently of the polar layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuxSlot {
    /// Slot name, also used as the electrode name.
    pub name: &'static str,
    /// Horizontal position as a fraction of the surface width.
    pub x_fraction: f32,
    /// Vertical position as a fraction of the surface height.
    pub y_fraction: f32,
}

/// The four auxiliary slots.
pub const AUX_SLOTS: [AuxSlot; 4] = [
    AuxSlot {
        name: "Left",
        x_fraction: 0.85,
        y_fraction: 0.80,
    },
    AuxSlot {
        name: "Right",
        x_fraction: 0.85,
        y_fraction: 0.72,
    },
    AuxSlot {
        name: "Top",
        x_fraction: 0.90,
        y_fraction: 0.80,
    },
    AuxSlot {
        name: "Bottom",
        x_fraction: 0.90,
        y_fraction: 0.72,
    },
];

impl AuxSlot {
    /// Anchor point of this slot on a surface of the given size.
    pub fn position(&self, size: Vec2) -> Pos2 {
        pos2(size.x * self.x_fraction, size.y * self.y_fraction)
    }
}

/// Map a polar coordinate to a point on the surface.
///
/// `x = cx + cos(θ)·r·(R/5)` and `y = cy − sin(θ)·r·(R/5)`; the vertical axis is flipped
/// because screen Y grows downward. NaN input yields a NaN point rather than a panic.
#[inline]
pub fn place(angle_deg: f32, radius_units: f32, center: Pos2, full_radius: f32) -> Pos2 {
    let radians = angle_deg.to_radians();
    let scale = radius_units * (full_radius / RING_UNITS);
    pos2(
        center.x + radians.cos() * scale,
        center.y - radians.sin() * scale,
    )
}

/// Derived geometry of the display surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    /// Surface size in points.
    pub size: Vec2,
    /// Head centre.
    pub center: Pos2,
    /// Radius of the outermost ring.
    pub full_radius: f32,
}

impl SurfaceGeometry {
    /// Compute the geometry for a surface of `size`.
    pub fn from_size(size: Vec2) -> Self {
        Self {
            size,
            center: pos2(size.x / 2.0, size.y / 2.0),
            full_radius: size.y * FULL_RADIUS_FRACTION,
        }
    }

    /// Place a static position on this surface.
    pub fn place(&self, position: &ElectrodePosition) -> Pos2 {
        place(
            position.angle_deg,
            position.radius,
            self.center,
            self.full_radius,
        )
    }

    /// Radius of ring `ring` (1..=5) in points.
    pub fn ring_radius(&self, ring: u8) -> f32 {
        self.full_radius * f32::from(ring) / RING_UNITS
    }
}

/// Look up a static position by name.
pub fn find_position(name: &str) -> Option<&'static ElectrodePosition> {
    STANDARD_POSITIONS.iter().find(|p| p.name == name)
}
