//! Single-active-editor coordination for a set of electrodes.
//!
//! Exactly one [`EditCoordinator`] exists per electrode array and it is passed around by
//! `&mut` instead of living in a static, so independent arrays (and tests) never share an
//! edit slot. The coordinator owns the transient text field of the electrode being edited;
//! the electrode only carries the `edit_state` flag the renderer looks at.
//!
//! State machine per electrode:
//!
//! ```text
//!            request_edit            commit / focus_lost / evicted
//!  Display ───────────────▶ Editing ───────────────────────────────▶ Display
//! ```

use tracing::{debug, trace};

use crate::electrode::{Electrode, ElectrodeId};

/// Text field backing an open channel edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditField {
    /// Current field contents.
    pub text: String,
    focus_pending: bool,
}

impl EditField {
    fn prefilled(channel: u32) -> Self {
        Self {
            text: channel.to_string(),
            focus_pending: true,
        }
    }

    /// Returns true once after the field is opened so the UI can grab keyboard focus.
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_pending)
    }
}

/// Outcome of committing an edit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The text parsed; the electrode now uses this (clamped) channel.
    Applied {
        /// Electrode that was edited.
        electrode: ElectrodeId,
        /// Stored channel after clamping.
        channel: u32,
    },
    /// The text did not parse; the previous channel was kept.
    Discarded {
        /// Electrode that was edited.
        electrode: ElectrodeId,
    },
    /// No edit was open.
    NoEditor,
}

#[derive(Debug)]
struct EditSlot {
    electrode: ElectrodeId,
    field: EditField,
}

/// Owner of the one edit slot shared by an electrode array.
#[derive(Debug, Default)]
pub struct EditCoordinator {
    slot: Option<EditSlot>,
}

impl EditCoordinator {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Electrode currently holding the edit slot.
    pub fn editing(&self) -> Option<ElectrodeId> {
        self.slot.as_ref().map(|slot| slot.electrode)
    }

    /// Field of the open edit, if any.
    pub fn field(&self) -> Option<&EditField> {
        self.slot.as_ref().map(|slot| &slot.field)
    }

    /// Mutable field of the open edit, for the text widget.
    pub fn field_mut(&mut self) -> Option<&mut EditField> {
        self.slot.as_mut().map(|slot| &mut slot.field)
    }

    /// Grant the edit slot to `id`.
    ///
    /// A different electrode holding the slot is forced back to display first, discarding
    /// whatever was typed into its field. The new field is pre-filled with the current
    /// channel.
    pub fn request_edit(&mut self, electrodes: &mut [Electrode], id: ElectrodeId) {
        if let Some(previous) = self.slot.take() {
            if previous.electrode != id {
                debug!(
                    evicted = electrodes[previous.electrode.0].name(),
                    "Closing previous channel editor"
                );
            }
            electrodes[previous.electrode.0].set_edit_state(false);
        }

        let electrode = &mut electrodes[id.0];
        electrode.set_edit_state(true);
        self.slot = Some(EditSlot {
            electrode: id,
            field: EditField::prefilled(electrode.hardware_channel()),
        });
        trace!(electrode = electrodes[id.0].name(), "Channel editor opened");
    }

    /// Give up the slot if, and only if, `id` holds it.
    ///
    /// Returns whether anything was released; a stale release from an electrode that was
    /// already evicted is a no-op.
    pub fn release_edit(&mut self, electrodes: &mut [Electrode], id: ElectrodeId) -> bool {
        match &self.slot {
            Some(slot) if slot.electrode == id => {
                self.slot = None;
                electrodes[id.0].set_edit_state(false);
                true
            }
            _ => false,
        }
    }

    /// Accept the field's current text.
    pub fn commit(&mut self, electrodes: &mut [Electrode], max_channel: u32) -> CommitOutcome {
        let Some(text) = self.field().map(|f| f.text.clone()) else {
            return CommitOutcome::NoEditor;
        };
        self.commit_text(electrodes, &text, max_channel)
    }

    /// Accept `text` as the new channel of the electrode being edited.
    ///
    /// Non-numeric text is silently discarded. Either way the editor closes.
    pub fn commit_text(
        &mut self,
        electrodes: &mut [Electrode],
        text: &str,
        max_channel: u32,
    ) -> CommitOutcome {
        let Some(slot) = self.slot.take() else {
            return CommitOutcome::NoEditor;
        };
        let electrode = &mut electrodes[slot.electrode.0];
        electrode.set_edit_state(false);

        match text.trim().parse::<i64>() {
            Ok(requested) => {
                let channel = electrode.set_hardware_channel(requested, max_channel);
                debug!(
                    electrode = electrode.name(),
                    requested, channel, "Hardware channel reassigned"
                );
                CommitOutcome::Applied {
                    electrode: slot.electrode,
                    channel,
                }
            }
            Err(_) => CommitOutcome::Discarded {
                electrode: slot.electrode,
            },
        }
    }

    /// The field lost focus without an accept keystroke: close it and keep the old channel.
    pub fn focus_lost(&mut self, electrodes: &mut [Electrode]) -> Option<ElectrodeId> {
        let id = self.editing()?;
        self.release_edit(electrodes, id);
        Some(id)
    }

    /// Clear the slot, e.g. when the view is torn down or a montage replaces the state.
    pub fn reset(&mut self, electrodes: &mut [Electrode]) {
        if let Some(slot) = self.slot.take() {
            if let Some(electrode) = electrodes.get_mut(slot.electrode.0) {
                electrode.set_edit_state(false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::STANDARD_POSITIONS;

    fn electrodes() -> Vec<Electrode> {
        STANDARD_POSITIONS[..4]
            .iter()
            .map(Electrode::on_cap)
            .collect()
    }

    fn editing_count(electrodes: &[Electrode]) -> usize {
        electrodes.iter().filter(|e| e.is_editing()).count()
    }

    #[test]
    fn request_opens_prefilled_field() {
        let mut set = electrodes();
        set[1].set_hardware_channel(17, 256);
        let mut coordinator = EditCoordinator::new();

        coordinator.request_edit(&mut set, ElectrodeId(1));

        assert_eq!(coordinator.editing(), Some(ElectrodeId(1)));
        assert_eq!(coordinator.field().unwrap().text, "17");
        assert!(set[1].is_editing());
    }

    #[test]
    fn second_request_evicts_first() {
        let mut set = electrodes();
        let mut coordinator = EditCoordinator::new();

        coordinator.request_edit(&mut set, ElectrodeId(0));
        coordinator.request_edit(&mut set, ElectrodeId(2));

        assert!(!set[0].is_editing());
        assert!(set[2].is_editing());
        assert_eq!(editing_count(&set), 1);
        assert_eq!(coordinator.editing(), Some(ElectrodeId(2)));
    }

    #[test]
    fn stale_release_is_ignored() {
        let mut set = electrodes();
        let mut coordinator = EditCoordinator::new();

        coordinator.request_edit(&mut set, ElectrodeId(0));
        coordinator.request_edit(&mut set, ElectrodeId(1));

        assert!(!coordinator.release_edit(&mut set, ElectrodeId(0)));
        assert_eq!(coordinator.editing(), Some(ElectrodeId(1)));
        assert!(set[1].is_editing());

        assert!(coordinator.release_edit(&mut set, ElectrodeId(1)));
        assert_eq!(editing_count(&set), 0);
    }

    #[test]
    fn commit_applies_clamped_channel() {
        let mut set = electrodes();
        let mut coordinator = EditCoordinator::new();

        coordinator.request_edit(&mut set, ElectrodeId(3));
        let outcome = coordinator.commit_text(&mut set, "500", 64);

        assert_eq!(
            outcome,
            CommitOutcome::Applied {
                electrode: ElectrodeId(3),
                channel: 64
            }
        );
        assert_eq!(set[3].hardware_channel(), 64);
        assert!(!set[3].is_editing());
        assert_eq!(coordinator.editing(), None);
    }

    #[test]
    fn commit_of_garbage_keeps_channel_and_closes() {
        let mut set = electrodes();
        set[0].set_hardware_channel(9, 64);
        let mut coordinator = EditCoordinator::new();

        coordinator.request_edit(&mut set, ElectrodeId(0));
        let outcome = coordinator.commit_text(&mut set, "abc", 64);

        assert_eq!(
            outcome,
            CommitOutcome::Discarded {
                electrode: ElectrodeId(0)
            }
        );
        assert_eq!(set[0].hardware_channel(), 9);
        assert!(!set[0].is_editing());
    }

    #[test]
    fn commit_uses_field_text() {
        let mut set = electrodes();
        let mut coordinator = EditCoordinator::new();

        coordinator.request_edit(&mut set, ElectrodeId(2));
        coordinator.field_mut().unwrap().text = " 12 ".into();
        coordinator.commit(&mut set, 64);

        assert_eq!(set[2].hardware_channel(), 12);
    }

    #[test]
    fn focus_loss_cancels() {
        let mut set = electrodes();
        let mut coordinator = EditCoordinator::new();

        coordinator.request_edit(&mut set, ElectrodeId(1));
        coordinator.field_mut().unwrap().text = "33".into();

        assert_eq!(coordinator.focus_lost(&mut set), Some(ElectrodeId(1)));
        assert_eq!(set[1].hardware_channel(), 0);
        assert_eq!(editing_count(&set), 0);
        assert_eq!(coordinator.focus_lost(&mut set), None);
    }

    #[test]
    fn commit_without_editor_is_noop() {
        let mut set = electrodes();
        let mut coordinator = EditCoordinator::new();
        assert_eq!(coordinator.commit(&mut set, 64), CommitOutcome::NoEditor);
    }

    #[test]
    fn focus_request_fires_once() {
        let mut set = electrodes();
        let mut coordinator = EditCoordinator::new();
        coordinator.request_edit(&mut set, ElectrodeId(0));

        let field = coordinator.field_mut().unwrap();
        assert!(field.take_focus_request());
        assert!(!field.take_focus_request());
    }

    #[test]
    fn reset_clears_slot() {
        let mut set = electrodes();
        let mut coordinator = EditCoordinator::new();
        coordinator.request_edit(&mut set, ElectrodeId(0));

        coordinator.reset(&mut set);

        assert_eq!(coordinator.editing(), None);
        assert_eq!(editing_count(&set), 0);
    }
}
