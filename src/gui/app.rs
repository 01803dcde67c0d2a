//! Main application state and UI logic.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use eframe::egui;
use tracing::{info, warn};

use crate::amplifier::{
    Amplifier, FeedEvent, FeedStatus, MockAmplifier, SampleFeed, SampleSource, INIT_GUIDANCE,
};
use crate::array::ElectrodeArray;
use crate::colormap::{ColorMapSource, ColorMapTable};
use crate::config::{AmplifierDriver, Settings};
use crate::error::MapError;
use crate::montage::{self, LoadMode};
use crate::notice::{NoticeBoard, Severity};
use crate::refresh::RefreshLoop;

use super::canvas::ElectrodeCanvas;
use super::legend::Legend;

/// Storage key for the persisted "show channel numbers" toggle
const SHOW_CHANNELS_KEY: &str = "show_channel_numbers";

/// How the viewer was launched.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Loaded and validated settings
    pub settings: Settings,
    /// Montage to apply instead of the configured default
    pub montage: Option<PathBuf>,
    /// Skip the amplifier entirely
    pub no_amplifier: bool,
}

/// Main application state
pub struct ElectrodeMapApp {
    settings: Settings,
    array: ElectrodeArray,
    color_map: ColorMapTable,
    notices: NoticeBoard,

    /// Impedance refresh driver
    refresh: RefreshLoop,
    /// Live feed, `None` when running without an amplifier
    feed: Option<SampleFeed>,
    /// Stand-in source when there is no feed; always empty
    idle_source: Option<Arc<[i32]>>,

    canvas: ElectrodeCanvas,
    legend: Legend,

    /// Directory of the last montage opened or saved, for the file dialogs
    montage_dir: Option<PathBuf>,
    /// Notice history window open
    show_history: bool,

    /// Tokio runtime for the sample feed
    runtime: tokio::runtime::Runtime,
}

impl ElectrodeMapApp {
    /// Build the viewer: color table, startup montage and amplifier feed.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        options: LaunchOptions,
        runtime: tokio::runtime::Runtime,
    ) -> Self {
        let LaunchOptions {
            settings,
            montage,
            no_amplifier,
        } = options;
        let mut notices = NoticeBoard::new();

        let (color_map, color_err) =
            ColorMapTable::probe(Some(settings.resources.color_map_path.as_path()));
        if let Some(err) = color_err {
            notices.report("Color map unusable, using built-in gradient", &err);
        }

        let mut array = ElectrodeArray::standard(settings.display.max_channel);
        let show_channels = cc
            .storage
            .and_then(|storage| eframe::get_value::<bool>(storage, SHOW_CHANNELS_KEY))
            .unwrap_or(settings.display.show_channel_numbers);
        if show_channels {
            array.toggle_channel_numbers();
        }

        let mut app = Self {
            refresh: RefreshLoop::new(settings.display.refresh_interval),
            feed: None,
            idle_source: None,
            canvas: ElectrodeCanvas::new(),
            legend: Legend::new(),
            montage_dir: None,
            show_history: false,
            settings,
            array,
            color_map,
            notices,
            runtime,
        };

        app.apply_startup_montage(montage.as_deref());
        if no_amplifier {
            info!("Amplifier disabled from the command line");
        } else {
            app.start_feed();
        }
        app
    }

    fn apply_startup_montage(&mut self, explicit: Option<&Path>) {
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.settings.resources.default_montage_path.clone());

        if explicit.is_some() && !path.exists() {
            self.notices.warning(
                "Montage not found",
                format!("{} does not exist", path.display()),
            );
            return;
        }

        match montage::load_startup(&path) {
            Ok(Some(montage)) => {
                let report = self.array.apply_montage(&montage);
                info!(
                    path = %path.display(),
                    applied = report.applied,
                    "Startup montage applied"
                );
            }
            Ok(None) => {}
            Err(err) => self.notices.report("Startup montage could not be loaded", &err),
        }
    }

    fn start_feed(&mut self) {
        let amplifier: Arc<dyn Amplifier> = match self.settings.amplifier.driver {
            AmplifierDriver::None => return,
            AmplifierDriver::Mock => {
                let mock = MockAmplifier::new(self.settings.amplifier.channel_count);
                info!(channels = mock.channel_count(), "Using mock amplifier");
                match self.settings.amplifier.seed {
                    Some(seed) => Arc::new(mock.with_seed(seed)),
                    None => Arc::new(mock),
                }
            }
        };
        self.feed = Some(SampleFeed::spawn(
            self.runtime.handle(),
            amplifier,
            self.refresh.interval(),
        ));
    }

    /// Drain feed lifecycle events into notices.
    fn poll_feed(&mut self) {
        let Some(feed) = self.feed.as_mut() else {
            return;
        };
        while let Some(event) = feed.try_event() {
            match event {
                FeedEvent::Ready => self
                    .notices
                    .info("Amplifier ready", "Live impedance readings started"),
                FeedEvent::InitFailed(reason) => self.notices.report(
                    "Amplifier unavailable",
                    &MapError::Amplifier(format!("{reason}. {INIT_GUIDANCE}")),
                ),
            }
        }
    }

    fn tick_refresh(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        let source: &mut dyn SampleSource = match self.feed.as_mut() {
            Some(feed) => feed,
            None => &mut self.idle_source,
        };
        if self
            .refresh
            .poll(now, source, self.array.electrodes_mut())
            .is_some()
        {
            ctx.request_repaint();
        }
        ctx.request_repaint_after(self.refresh.until_next(now));
    }

    fn open_montage(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Montage", &["json"]);
        if let Some(dir) = &self.montage_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };
        self.montage_dir = path.parent().map(Path::to_path_buf);

        match montage::load_file(&path, LoadMode::Tolerant) {
            Ok(montage) => {
                let report = self.array.apply_montage(&montage);
                if !report.deactivated.is_empty() {
                    self.notices.warning(
                        "Some electrodes were deactivated",
                        format!(
                            "Channels above {} on: {}",
                            self.array.max_channel(),
                            report.deactivated.join(", ")
                        ),
                    );
                }
            }
            Err(err) => self.notices.report("Montage could not be opened", &err),
        }
    }

    fn save_montage(&mut self) {
        let mut dialog = rfd::FileDialog::new()
            .add_filter("Montage", &["json"])
            .set_file_name("montage.json");
        if let Some(dir) = &self.montage_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };
        self.montage_dir = path.parent().map(Path::to_path_buf);

        if let Err(err) = montage::save_file(&self.array.to_montage(), &path) {
            warn!(error = %err, "Montage save failed");
            self.notices.report("Montage could not be saved", &err);
        }
    }

    /// Render the top menu bar
    fn render_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Montage…").clicked() {
                        ui.close_menu();
                        self.open_montage();
                    }
                    if ui.button("Save Montage…").clicked() {
                        ui.close_menu();
                        self.save_montage();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    let mut show = self.array.show_channel_numbers();
                    if ui.checkbox(&mut show, "Show channel numbers").changed() {
                        self.array.toggle_channel_numbers();
                    }
                    if ui.button("Notices…").clicked() {
                        ui.close_menu();
                        self.show_history = true;
                    }
                });
            });
        });
    }

    /// Render the status bar
    fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let (text, color) = match self.feed.as_ref().map(SampleFeed::status) {
                    None => ("No amplifier".to_string(), egui::Color32::GRAY),
                    Some(FeedStatus::Starting) => {
                        ui.spinner();
                        ("Connecting…".to_string(), egui::Color32::GRAY)
                    }
                    Some(FeedStatus::Running) => {
                        ("Live".to_string(), Severity::Info.color())
                    }
                    Some(FeedStatus::Failed(_)) => {
                        ("Amplifier unavailable".to_string(), Severity::Error.color())
                    }
                    Some(FeedStatus::Stopped) => ("Stopped".to_string(), egui::Color32::GRAY),
                };
                ui.colored_label(color, text);
                ui.separator();

                let active = self
                    .array
                    .electrodes()
                    .iter()
                    .filter(|e| e.is_active())
                    .count();
                ui.label(format!("{active}/{} active", self.array.len()));
                ui.separator();

                let palette = match self.color_map.source() {
                    ColorMapSource::Generated => "Built-in gradient",
                    ColorMapSource::Loaded => "Color table loaded",
                };
                ui.label(palette);

                if let Some(notice) = self.notices.latest() {
                    ui.separator();
                    ui.colored_label(
                        notice.severity.color(),
                        format!("{} {}", notice.timestamp.format("%H:%M:%S"), notice.title),
                    )
                    .on_hover_text(notice.detail.as_str());
                    if ui.small_button(format!("{}", self.notices.len())).clicked() {
                        self.show_history = true;
                    }
                }
            });
        });
    }

    /// Every recorded notice, newest first
    fn render_history(&mut self, ctx: &egui::Context) {
        if !self.show_history {
            return;
        }
        let mut open = true;
        let mut clear = false;
        let notices = &self.notices;
        egui::Window::new("Notices")
            .open(&mut open)
            .default_width(420.0)
            .show(ctx, |ui| {
                if notices.is_empty() {
                    ui.label("No notices");
                    return;
                }
                egui::ScrollArea::vertical()
                    .max_height(320.0)
                    .show(ui, |ui| {
                        for notice in notices.notices().rev() {
                            ui.horizontal_wrapped(|ui| {
                                ui.label(notice.timestamp.format("%H:%M:%S").to_string());
                                ui.colored_label(notice.severity.color(), notice.severity.to_string());
                                ui.strong(notice.title.as_str());
                            });
                            if !notice.detail.is_empty() {
                                ui.label(egui::RichText::new(notice.detail.as_str()).small());
                            }
                            ui.separator();
                        }
                    });
                if ui.button("Clear").clicked() {
                    clear = true;
                }
            });
        if clear {
            self.notices.clear();
        }
        self.show_history = open;
    }

    /// Modal for the newest unacknowledged warning or error
    fn render_alert(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.notices.pending_alert() else {
            return;
        };
        let mut acknowledged = false;
        egui::Window::new(notice.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(notice.detail.as_str());
                if ui.button("OK").clicked() {
                    acknowledged = true;
                }
            });
        if acknowledged {
            self.notices.acknowledge();
        }
    }
}

impl eframe::App for ElectrodeMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_feed();
        self.tick_refresh(ctx);

        self.render_menu_bar(ctx);
        self.render_status_bar(ctx);
        self.render_alert(ctx);
        self.render_history(ctx);

        egui::SidePanel::right("legend")
            .resizable(false)
            .show(ctx, |ui| self.legend.show(ui, &self.color_map));

        egui::CentralPanel::default().show(ctx, |ui| {
            for event in self.canvas.show(ui, &mut self.array, &self.color_map) {
                tracing::trace!(?event, "Canvas event");
            }
        });
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, SHOW_CHANNELS_KEY, &self.array.show_channel_numbers());
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(feed) = self.feed.as_mut() {
            feed.shutdown();
        }
        self.array.teardown();
        info!("Viewer closed");
    }
}
