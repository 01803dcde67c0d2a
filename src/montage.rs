//! Montage persistence: the name → configuration mapping of an electrode set.
//!
//! A montage records, for every electrode name, whether it is active, its label, and its
//! hardware channel. Live impedance values and edit state are never stored.
//!
//! ## File format
//!
//! Pretty-printed JSON, one object keyed by electrode name:
//!
//! ```json
//! {
//!   "Cz": { "IsActive": true, "LabelText": "Cz", "HardwareChannel": 1 },
//!   "Fz": { "IsActive": false, "LabelText": "Ref", "HardwareChannel": 0 }
//! }
//! ```
//!
//! Unknown fields are ignored. There is no version field: compatibility rests on ignoring
//! unknown fields and unmatched names.
//!
//! ## Loading modes
//!
//! - [`LoadMode::Strict`]: any malformed entry fails the whole load.
//! - [`LoadMode::Tolerant`]: malformed entries are skipped with a warning.
//!
//! In both modes a document that is not a JSON object at all is a hard failure.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::electrode::Electrode;
use crate::error::{MapError, MapResult};

/// Persisted configuration of one electrode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MontageEntry {
    /// Whether the electrode is active.
    pub is_active: bool,
    /// Operator-facing label.
    pub label_text: String,
    /// Signed so that out-of-range values from hand-edited files survive parsing and get
    /// clamped on apply.
    pub hardware_channel: i64,
}

/// Name-keyed montage. Sorted keys keep saved files diff-friendly.
pub type Montage = BTreeMap<String, MontageEntry>;

/// How strictly [`deserialize`] treats malformed entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Any malformed entry fails the load.
    Strict,
    /// Malformed entries are skipped with a warning.
    #[default]
    Tolerant,
}

/// Summary of an [`apply`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Entries that matched a live electrode.
    pub applied: usize,
    /// Entry names with no live electrode.
    pub unmatched: Vec<String>,
    /// Electrodes forced inactive because the stored channel exceeds `max_channel`.
    pub deactivated: Vec<String>,
}

/// Project an electrode set onto a montage.
pub fn serialize<'a>(electrodes: impl IntoIterator<Item = &'a Electrode>) -> Montage {
    electrodes
        .into_iter()
        .map(|e| {
            (
                e.name().to_string(),
                MontageEntry {
                    is_active: e.is_active(),
                    label_text: e.label_text().to_string(),
                    hardware_channel: i64::from(e.hardware_channel()),
                },
            )
        })
        .collect()
}

/// Parse a montage document.
pub fn deserialize(bytes: &[u8], mode: LoadMode) -> MapResult<Montage> {
    match mode {
        LoadMode::Strict => Ok(serde_json::from_slice::<Montage>(bytes)?),
        LoadMode::Tolerant => {
            let raw: BTreeMap<String, serde_json::Value> = serde_json::from_slice(bytes)?;
            let mut montage = Montage::new();
            for (name, value) in raw {
                match serde_json::from_value::<MontageEntry>(value) {
                    Ok(entry) => {
                        montage.insert(name, entry);
                    }
                    Err(err) => {
                        warn!(electrode = %name, error = %err, "Skipping malformed montage entry");
                    }
                }
            }
            Ok(montage)
        }
    }
}

/// Render a montage as the on-disk document.
pub fn to_json(montage: &Montage) -> MapResult<String> {
    Ok(serde_json::to_string_pretty(montage)?)
}

/// Apply a montage to a live electrode set.
///
/// For each entry whose name matches an electrode, the label and (clamped) channel are
/// written. The stored active flag is adopted unless the stored channel exceeds
/// `max_channel`, in which case the electrode is forced inactive: such montages were
/// authored for a device with more channels. Unmatched names are ignored.
pub fn apply(montage: &Montage, electrodes: &mut [Electrode], max_channel: u32) -> ApplyReport {
    let mut report = ApplyReport::default();
    let mut remaining: BTreeMap<&str, &MontageEntry> =
        montage.iter().map(|(k, v)| (k.as_str(), v)).collect();

    for electrode in electrodes.iter_mut() {
        let Some(entry) = remaining.remove(electrode.name()) else {
            continue;
        };
        electrode.set_label_text(entry.label_text.clone());
        electrode.set_hardware_channel(entry.hardware_channel, max_channel);

        let out_of_range = entry.hardware_channel > i64::from(max_channel);
        electrode.set_active(entry.is_active && !out_of_range);
        if out_of_range {
            report.deactivated.push(electrode.name().to_string());
        }
        report.applied += 1;
    }

    report.unmatched = remaining.keys().map(|k| k.to_string()).collect();
    if !report.unmatched.is_empty() {
        debug!(unmatched = ?report.unmatched, "Montage names without a live electrode");
    }
    if !report.deactivated.is_empty() {
        info!(
            deactivated = ?report.deactivated,
            max_channel, "Montage channels exceed this device; electrodes deactivated"
        );
    }
    report
}

/// Read a montage file.
pub fn load_file(path: &Path, mode: LoadMode) -> MapResult<Montage> {
    let bytes = fs::read(path).map_err(|source| MapError::MontageIo {
        path: path.to_path_buf(),
        source,
    })?;
    let montage = deserialize(&bytes, mode)?;
    info!(path = %path.display(), entries = montage.len(), "Loaded montage");
    Ok(montage)
}

/// Read the montage applied at startup.
///
/// A missing file is not an error and yields `Ok(None)`. Entries are loaded tolerantly.
pub fn load_startup(path: &Path) -> MapResult<Option<Montage>> {
    if !path.exists() {
        debug!(path = %path.display(), "No startup montage");
        return Ok(None);
    }
    load_file(path, LoadMode::Tolerant).map(Some)
}

/// Write a montage file, replacing any existing file.
pub fn save_file(montage: &Montage, path: &Path) -> MapResult<()> {
    let json = to_json(montage)?;
    fs::write(path, json).map_err(|source| MapError::MontageWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), entries = montage.len(), "Saved montage");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{find_position, AUX_SLOTS};
    use tempfile::tempdir;
    use tracing_test::traced_test;

    fn set() -> Vec<Electrode> {
        vec![
            Electrode::on_cap(find_position("Cz").unwrap()),
            Electrode::on_cap(find_position("Fz").unwrap()),
            Electrode::auxiliary(&AUX_SLOTS[0]),
        ]
    }

    fn entry(active: bool, label: &str, channel: i64) -> MontageEntry {
        MontageEntry {
            is_active: active,
            label_text: label.into(),
            hardware_channel: channel,
        }
    }

    #[test]
    fn serialize_has_one_entry_per_electrode() {
        let mut electrodes = set();
        electrodes[1].set_hardware_channel(3, 64);
        electrodes[1].set_value(99);
        let montage = serialize(&electrodes);

        assert_eq!(montage.len(), 3);
        assert_eq!(montage["Fz"], entry(true, "Fz", 3));
        assert!(montage.contains_key("Left"));
    }

    #[test]
    fn document_uses_pascal_case_fields() {
        let montage = Montage::from([("Cz".to_string(), entry(false, "Ref", 12))]);
        let json = to_json(&montage).unwrap();
        assert!(json.contains("\"IsActive\": false"));
        assert!(json.contains("\"LabelText\": \"Ref\""));
        assert!(json.contains("\"HardwareChannel\": 12"));
        assert!(!json.contains("Value"));
    }

    #[test]
    fn apply_overwrites_matching_and_ignores_rest() {
        let mut electrodes = set();
        let montage = Montage::from([
            ("Cz".to_string(), entry(false, "Vertex", 5)),
            ("Xx".to_string(), entry(true, "Ghost", 1)),
        ]);

        let report = apply(&montage, &mut electrodes, 64);

        assert_eq!(report.applied, 1);
        assert_eq!(report.unmatched, vec!["Xx".to_string()]);
        assert_eq!(electrodes[0].label_text(), "Vertex");
        assert_eq!(electrodes[0].hardware_channel(), 5);
        assert!(!electrodes[0].is_active());
        // Untouched electrode keeps defaults.
        assert_eq!(electrodes[1].label_text(), "Fz");
    }

    #[test]
    fn apply_deactivates_channels_beyond_device() {
        let mut electrodes = set();
        let montage = Montage::from([("Fz".to_string(), entry(true, "Fz", 200))]);

        let report = apply(&montage, &mut electrodes, 64);

        assert!(!electrodes[1].is_active());
        assert_eq!(electrodes[1].hardware_channel(), 64);
        assert_eq!(report.deactivated, vec!["Fz".to_string()]);
    }

    #[test]
    fn apply_clamps_negative_channel_without_deactivating() {
        let mut electrodes = set();
        let montage = Montage::from([("Fz".to_string(), entry(true, "Fz", -4))]);
        apply(&montage, &mut electrodes, 64);
        assert_eq!(electrodes[1].hardware_channel(), 0);
        assert!(electrodes[1].is_active());
    }

    #[test]
    fn round_trip_is_a_noop() {
        let mut electrodes = set();
        electrodes[0].set_hardware_channel(1, 64);
        electrodes[1].set_active(false);
        electrodes[1].set_label_text("Ground");
        electrodes[2].set_hardware_channel(64, 64);
        let before = serialize(&electrodes);

        let report = apply(&before, &mut electrodes, 64);

        assert_eq!(serialize(&electrodes), before);
        assert!(report.deactivated.is_empty());
        assert!(report.unmatched.is_empty());
    }

    #[test]
    fn strict_load_rejects_malformed_entry() {
        let doc = br#"{ "Cz": { "IsActive": true, "LabelText": "Cz", "HardwareChannel": 1 },
                        "Fz": { "IsActive": "yes" } }"#;
        assert!(matches!(
            deserialize(doc, LoadMode::Strict),
            Err(MapError::MontageFormat(_))
        ));
    }

    #[test]
    #[traced_test]
    fn tolerant_load_skips_malformed_entry() {
        let doc = br#"{ "Cz": { "IsActive": true, "LabelText": "Cz", "HardwareChannel": 1, "Value": 7 },
                        "Fz": { "IsActive": "yes" } }"#;
        let montage = deserialize(doc, LoadMode::Tolerant).unwrap();
        assert_eq!(montage.len(), 1);
        assert_eq!(montage["Cz"], entry(true, "Cz", 1));
        assert!(logs_contain("Skipping malformed montage entry"));
    }

    #[test]
    fn corrupt_document_fails_in_both_modes() {
        for mode in [LoadMode::Strict, LoadMode::Tolerant] {
            assert!(deserialize(b"[1, 2, 3]", mode).is_err());
            assert!(deserialize(b"{ truncated", mode).is_err());
        }
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("montage.json");
        let montage = serialize(&set());

        save_file(&montage, &path).unwrap();
        let loaded = load_file(&path, LoadMode::Strict).unwrap();

        assert_eq!(loaded, montage);
    }

    #[test]
    fn startup_montage_is_optional() {
        let dir = tempdir().unwrap();
        assert_eq!(load_startup(&dir.path().join("absent.json")).unwrap(), None);

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ \"Cz\": ").unwrap();
        assert!(matches!(
            load_startup(&corrupt),
            Err(MapError::MontageFormat(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_file(&dir.path().join("absent.json"), LoadMode::Tolerant).unwrap_err();
        assert!(matches!(err, MapError::MontageIo { .. }));
    }
}
