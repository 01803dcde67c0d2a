//! Native viewer built on eframe/egui.
//!
//! - [`app`]: the `eframe::App`, menus, status bar, notices, refresh scheduling
//! - [`canvas`]: head drawing, electrodes, in-place channel editor
//! - [`legend`]: the color scale next to the head

pub mod app;
pub mod canvas;
pub mod legend;

pub use app::{ElectrodeMapApp, LaunchOptions};
