//! The live electrode set and the state it shares.
//!
//! [`ElectrodeArray`] owns every electrode for the lifetime of the view together with the
//! state that the electrodes consult but do not own: the channel ceiling, the
//! "show channel numbers" flag, and the [`EditCoordinator`]. Operator actions coming from
//! the UI shell (pointer presses, field commits, resizes) enter here.

use std::collections::HashMap;

use egui::{Pos2, Vec2};
use tracing::debug;

use crate::coordinator::{CommitOutcome, EditCoordinator, EditField};
use crate::electrode::{Electrode, ElectrodeId, HitRegion};
use crate::layout::{AuxSlot, ElectrodePosition, SurfaceGeometry, AUX_SLOTS, STANDARD_POSITIONS};
use crate::montage::{self, ApplyReport, Montage};

/// Default highest assignable hardware channel.
pub const DEFAULT_MAX_CHANNEL: u32 = 256;

/// Result of a pointer press on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// The press toggled an electrode's active flag.
    Toggled {
        /// Electrode that was pressed.
        electrode: ElectrodeId,
        /// Active flag after the toggle.
        active: bool,
    },
    /// The press opened the channel editor of an electrode.
    EditOpened(ElectrodeId),
    /// Nothing under the pointer.
    Missed,
}

/// Every electrode of the view plus the state they share.
#[derive(Debug)]
pub struct ElectrodeArray {
    electrodes: Vec<Electrode>,
    by_name: HashMap<String, ElectrodeId>,
    max_channel: u32,
    show_channel_numbers: bool,
    coordinator: EditCoordinator,
    geometry: SurfaceGeometry,
}

impl ElectrodeArray {
    /// Build an array from a position table and auxiliary slots.
    pub fn new(positions: &[ElectrodePosition], aux: &[AuxSlot], max_channel: u32) -> Self {
        let electrodes: Vec<Electrode> = positions
            .iter()
            .map(Electrode::on_cap)
            .chain(aux.iter().map(Electrode::auxiliary))
            .collect();
        let by_name = electrodes
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name().to_string(), ElectrodeId(i)))
            .collect();

        Self {
            electrodes,
            by_name,
            max_channel: max_channel.max(1),
            show_channel_numbers: false,
            coordinator: EditCoordinator::new(),
            geometry: SurfaceGeometry::from_size(Vec2::ZERO),
        }
    }

    /// The standard cap: all 10-10 positions and the four auxiliary slots.
    pub fn standard(max_channel: u32) -> Self {
        Self::new(STANDARD_POSITIONS, &AUX_SLOTS, max_channel)
    }

    /// Number of electrodes, auxiliary slots included.
    pub fn len(&self) -> usize {
        self.electrodes.len()
    }

    /// Whether the array has no electrodes.
    pub fn is_empty(&self) -> bool {
        self.electrodes.is_empty()
    }

    /// All electrodes in drawing order.
    pub fn electrodes(&self) -> &[Electrode] {
        &self.electrodes
    }

    /// Mutable electrodes, for the refresh loop.
    pub fn electrodes_mut(&mut self) -> &mut [Electrode] {
        &mut self.electrodes
    }

    /// Handle of the electrode called `name`.
    pub fn id_of(&self, name: &str) -> Option<ElectrodeId> {
        self.by_name.get(name).copied()
    }

    /// Electrode by handle.
    pub fn get(&self, id: ElectrodeId) -> Option<&Electrode> {
        self.electrodes.get(id.0)
    }

    /// Electrode by name.
    pub fn by_name(&self, name: &str) -> Option<&Electrode> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    /// Mutable electrode by name.
    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut Electrode> {
        let id = self.id_of(name)?;
        self.electrodes.get_mut(id.0)
    }

    /// Highest assignable hardware channel.
    pub fn max_channel(&self) -> u32 {
        self.max_channel
    }

    /// Change the channel ceiling (minimum 1) and re-clamp every channel to it.
    pub fn set_max_channel(&mut self, max_channel: u32) {
        self.max_channel = max_channel.max(1);
        for electrode in &mut self.electrodes {
            let channel = i64::from(electrode.hardware_channel());
            electrode.set_hardware_channel(channel, self.max_channel);
        }
    }

    /// Whether captions show channel numbers instead of labels.
    pub fn show_channel_numbers(&self) -> bool {
        self.show_channel_numbers
    }

    /// Flip the "show channel numbers" flag. Returns the new value.
    pub fn toggle_channel_numbers(&mut self) -> bool {
        self.show_channel_numbers = !self.show_channel_numbers;
        self.show_channel_numbers
    }

    /// Geometry of the last resize.
    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    /// Recompute the surface geometry and re-place every electrode from the static table.
    pub fn resize(&mut self, size: Vec2) {
        self.geometry = SurfaceGeometry::from_size(size);
        for electrode in &mut self.electrodes {
            electrode.relayout(&self.geometry);
        }
        debug!(
            width = size.x,
            height = size.y,
            full_radius = self.geometry.full_radius,
            "Electrodes re-laid out"
        );
    }

    /// Topmost electrode region under surface-local `point`. Later electrodes are drawn
    /// on top, so they win overlaps.
    pub fn hit_test(&self, point: Pos2) -> Option<(ElectrodeId, HitRegion)> {
        self.electrodes
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, e)| e.footprint().contains(point))
            .find_map(|(i, e)| e.hit_test(point).map(|region| (ElectrodeId(i), region)))
    }

    /// Route a pointer press at surface-local `point`.
    ///
    /// A press on a label opens that electrode's channel editor (closing any other). A press
    /// on a value circle toggles the electrode's active flag.
    pub fn pointer_press(&mut self, point: Pos2) -> PressOutcome {
        match self.hit_test(point) {
            Some((id, HitRegion::Label)) => {
                self.coordinator.request_edit(&mut self.electrodes, id);
                PressOutcome::EditOpened(id)
            }
            Some((id, HitRegion::Circle)) => {
                let electrode = &mut self.electrodes[id.0];
                electrode.toggle_active();
                PressOutcome::Toggled {
                    electrode: id,
                    active: electrode.is_active(),
                }
            }
            None => PressOutcome::Missed,
        }
    }

    /// Open the channel editor of `id` directly.
    pub fn request_edit(&mut self, id: ElectrodeId) {
        self.coordinator.request_edit(&mut self.electrodes, id);
    }

    /// Release the editor of `id` if it still holds it.
    pub fn release_edit(&mut self, id: ElectrodeId) -> bool {
        self.coordinator.release_edit(&mut self.electrodes, id)
    }

    /// Electrode whose channel editor is open.
    pub fn editing(&self) -> Option<ElectrodeId> {
        self.coordinator.editing()
    }

    /// Text field of the open editor.
    pub fn edit_field_mut(&mut self) -> Option<&mut EditField> {
        self.coordinator.field_mut()
    }

    /// Accept keystroke on the open field, using `text` as the new channel.
    pub fn field_commit(&mut self, text: &str) -> CommitOutcome {
        self.coordinator
            .commit_text(&mut self.electrodes, text, self.max_channel)
    }

    /// Accept keystroke on the open field, using the field's own text.
    pub fn commit_edit(&mut self) -> CommitOutcome {
        self.coordinator.commit(&mut self.electrodes, self.max_channel)
    }

    /// The open field lost focus; its text is discarded.
    pub fn field_focus_lost(&mut self) -> Option<ElectrodeId> {
        self.coordinator.focus_lost(&mut self.electrodes)
    }

    /// Set an electrode's label by name. Returns false for unknown names.
    pub fn rename(&mut self, name: &str, label: impl Into<String>) -> bool {
        match self.by_name_mut(name) {
            Some(electrode) => {
                electrode.set_label_text(label);
                true
            }
            None => false,
        }
    }

    /// Snapshot the persistent configuration.
    pub fn to_montage(&self) -> Montage {
        montage::serialize(&self.electrodes)
    }

    /// Bulk-overwrite configuration from a montage. Any open edit is cancelled first.
    pub fn apply_montage(&mut self, montage: &Montage) -> ApplyReport {
        self.coordinator.reset(&mut self.electrodes);
        montage::apply(montage, &mut self.electrodes, self.max_channel)
    }

    /// Tear-down hook for the view: clears the edit slot.
    pub fn teardown(&mut self) {
        self.coordinator.reset(&mut self.electrodes);
    }
}
