//! Integration tests for the single channel editor across a full electrode array.

use electrode_map::array::{ElectrodeArray, PressOutcome};
use electrode_map::coordinator::CommitOutcome;
use egui::vec2;

fn array() -> ElectrodeArray {
    let mut array = ElectrodeArray::standard(128);
    array.resize(vec2(1000.0, 800.0));
    array
}

fn editing_count(array: &ElectrodeArray) -> usize {
    array.electrodes().iter().filter(|e| e.is_editing()).count()
}

#[test]
fn test_at_most_one_editor_across_presses() {
    let mut array = array();
    let names = ["Fp1", "C3", "Pz", "O2", "Right"];

    for name in names {
        let label = array.by_name(name).unwrap().label_rect().center();
        let id = array.id_of(name).unwrap();
        assert_eq!(array.pointer_press(label), PressOutcome::EditOpened(id));
        assert_eq!(editing_count(&array), 1);
        assert!(array.by_name(name).unwrap().is_editing());
    }
}

#[test]
fn test_evicted_editor_discards_typed_text() {
    let mut array = array();
    let a = array.id_of("F3").unwrap();
    let b = array.id_of("F4").unwrap();

    array.request_edit(a);
    array.edit_field_mut().unwrap().text = "99".into();
    array.request_edit(b);

    // A stale release from the evicted electrode changes nothing.
    assert!(!array.release_edit(a));
    assert_eq!(array.editing(), Some(b));
    assert_eq!(array.by_name("F3").unwrap().hardware_channel(), 0);
    assert_eq!(array.edit_field_mut().unwrap().text, "0");
}

#[test]
fn test_commit_then_focus_loss() {
    let mut array = array();
    let id = array.id_of("Cz").unwrap();

    array.request_edit(id);
    array.edit_field_mut().unwrap().text = "300".into();
    assert_eq!(
        array.commit_edit(),
        CommitOutcome::Applied {
            electrode: id,
            channel: 128
        }
    );

    array.request_edit(id);
    array.edit_field_mut().unwrap().text = "5".into();
    assert_eq!(array.field_focus_lost(), Some(id));
    assert_eq!(array.by_name("Cz").unwrap().hardware_channel(), 128);
    assert_eq!(editing_count(&array), 0);
}

#[test]
fn test_non_numeric_commit_returns_to_display() {
    let mut array = array();
    let id = array.id_of("Oz").unwrap();
    array.by_name_mut("Oz").unwrap().set_hardware_channel(12, 128);

    array.request_edit(id);
    assert_eq!(array.field_commit("abc"), CommitOutcome::Discarded { electrode: id });

    let oz = array.by_name("Oz").unwrap();
    assert_eq!(oz.hardware_channel(), 12);
    assert!(!oz.is_editing());
}

#[test]
fn test_independent_arrays_do_not_share_editor() {
    let mut first = array();
    let mut second = array();

    first.request_edit(first.id_of("Fz").unwrap());
    second.request_edit(second.id_of("Pz").unwrap());

    assert!(first.by_name("Fz").unwrap().is_editing());
    assert!(second.by_name("Pz").unwrap().is_editing());
    assert_eq!(editing_count(&first), 1);
    assert_eq!(editing_count(&second), 1);
}

#[test]
fn test_teardown_clears_editor() {
    let mut array = array();
    array.request_edit(array.id_of("T8").unwrap());
    array.teardown();
    assert_eq!(array.editing(), None);
    assert_eq!(editing_count(&array), 0);
}
