//! # Electrode Map
//!
//! Live impedance map and montage editor for EEG electrode caps. The library holds all of
//! the viewer's logic so that it can be tested headless; `main.rs` only wires it to a
//! window.
//!
//! ## Crate Structure
//!
//! - **`layout`**: The static table of 10-10 cap positions, the auxiliary slots, and the
//!   polar → surface mapping that places them.
//! - **`colormap`**: The 256-entry value → color table, generated or loaded from a file.
//! - **`electrode`**: One sensor position with its label, hardware channel, active flag and
//!   latest impedance value, plus what it should look like on screen.
//! - **`coordinator`**: The single edit slot that guarantees at most one channel editor is
//!   open at a time.
//! - **`array`**: The live electrode set and the state it shares; entry point for operator
//!   actions.
//! - **`montage`**: Saving and restoring the name → configuration mapping as JSON.
//! - **`amplifier`**: The async amplifier capability, a mock device and the background
//!   sample feed.
//! - **`refresh`**: The fixed-interval tick that maps sample buffers onto electrodes.
//! - **`notice`**: Problems surfaced to the operator.
//! - **`config`**: Figment-based settings.
//! - **`error`**: The `MapError` enum used across the crate.
//! - **`tracing_init`**: Subscriber setup.
//! - **`gui`**: The eframe application (feature `gui`).

pub mod amplifier;
pub mod array;
pub mod colormap;
pub mod config;
pub mod coordinator;
pub mod electrode;
pub mod error;
pub mod layout;
pub mod montage;
pub mod notice;
pub mod refresh;
pub mod tracing_init;

#[cfg(feature = "gui")]
pub mod gui;
