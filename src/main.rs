//! CLI entry point for electrode-map
//!
//! Launches the impedance viewer by default and provides two headless helpers:
//!
//! ```bash
//! electrode-map                                  # open the viewer
//! electrode-map gui --montage caps/64ch.json     # open with a specific montage
//! electrode-map check-montage caps/64ch.json     # inspect a montage file
//! electrode-map colormap --file resources/heat.map
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tracing::info;

use electrode_map::array::ElectrodeArray;
use electrode_map::colormap::ColorMapTable;
use electrode_map::config::{Settings, DEFAULT_CONFIG_PATH};
use electrode_map::montage::{self, LoadMode};
use electrode_map::tracing_init::{self, TracingConfig};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "electrode-map")]
#[command(about = "Live impedance map and montage editor for EEG caps", long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the viewer (default)
    Gui {
        /// Montage applied at startup instead of the configured default
        #[arg(long)]
        montage: Option<PathBuf>,

        /// Run without an amplifier
        #[arg(long)]
        no_amplifier: bool,
    },

    /// Load a montage file and report what it contains
    CheckMontage {
        /// Path to the montage JSON file
        path: PathBuf,

        /// Fail on any malformed entry instead of skipping it
        #[arg(long)]
        strict: bool,
    },

    /// Report which color table would be used
    Colormap {
        /// Color table file (defaults to the configured path)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(&cli.config)
        .with_context(|| format!("Failed to load settings from {}", cli.config.display()))?;
    if let Some(level) = cli.log_level {
        settings.application.log_level = level;
        settings.validate()?;
    }
    tracing_init::init(TracingConfig::from_settings(&settings)?)?;

    match cli.command.unwrap_or(Commands::Gui {
        montage: None,
        no_amplifier: false,
    }) {
        Commands::Gui {
            montage,
            no_amplifier,
        } => run_gui(settings, montage, no_amplifier).map(|()| ExitCode::SUCCESS),
        Commands::CheckMontage { path, strict } => check_montage(&settings, &path, strict),
        Commands::Colormap { file } => {
            let path = file.unwrap_or_else(|| settings.resources.color_map_path.clone());
            report_colormap(&path)
        }
    }
}

#[cfg(feature = "gui")]
fn run_gui(settings: Settings, montage: Option<PathBuf>, no_amplifier: bool) -> Result<()> {
    use electrode_map::gui::{ElectrodeMapApp, LaunchOptions};

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("sample-feed")
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    info!(name = %settings.application.name, "Starting viewer");
    let title = settings.application.name.clone();
    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([settings.display.window_width, settings.display.window_height])
            .with_min_inner_size([640.0, 480.0])
            .with_title(&title),
        ..Default::default()
    };
    let options = LaunchOptions {
        settings,
        montage,
        no_amplifier,
    };

    eframe::run_native(
        &title,
        native_options,
        Box::new(|cc| Ok(Box::new(ElectrodeMapApp::new(cc, options, runtime)))),
    )
    .map_err(|e| anyhow::anyhow!("Viewer failed: {e}"))
}

#[cfg(not(feature = "gui"))]
fn run_gui(_settings: Settings, _montage: Option<PathBuf>, _no_amplifier: bool) -> Result<()> {
    anyhow::bail!("electrode-map was built without the 'gui' feature")
}

fn check_montage(settings: &Settings, path: &Path, strict: bool) -> Result<ExitCode> {
    let mode = if strict {
        LoadMode::Strict
    } else {
        LoadMode::Tolerant
    };
    let montage = montage::load_file(path, mode)
        .with_context(|| format!("Failed to load montage {}", path.display()))?;

    println!("{} entries in {}", montage.len(), path.display());
    for (name, entry) in &montage {
        println!(
            "  {name:<8} channel {:>4}  {:<8} label {:?}",
            entry.hardware_channel,
            if entry.is_active { "active" } else { "inactive" },
            entry.label_text
        );
    }

    let mut array = ElectrodeArray::standard(settings.display.max_channel);
    let report = array.apply_montage(&montage);
    if !report.unmatched.is_empty() {
        println!("Not on the standard cap: {}", report.unmatched.join(", "));
    }
    if !report.deactivated.is_empty() {
        println!(
            "Channel above {} (would be deactivated): {}",
            settings.display.max_channel,
            report.deactivated.join(", ")
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn report_colormap(path: &Path) -> Result<ExitCode> {
    if !path.exists() {
        println!("{} not found: using the built-in green → red gradient", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    match ColorMapTable::load(path) {
        Ok((_, report)) => {
            println!("Loaded color table from {}", path.display());
            for row in &report.rejected_rows {
                println!("  row {} did not parse, left transparent", row + 1);
            }
            if report.ignored_rows > 0 {
                println!("  {} rows past 256 ignored", report.ignored_rows);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!("{err}: the viewer would fall back to the built-in gradient");
            Ok(ExitCode::FAILURE)
        }
    }
}
