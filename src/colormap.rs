//! Value → color lookup table for impedance rendering.
//!
//! The table always holds exactly 256 entries and is immutable once built. Two
//! construction policies exist and one is picked at startup by [`ColorMapTable::probe`]:
//!
//! - **Generated**: a linear green → red gradient, `(R, G, B) = (i, 255 − i, 0)`. Entry 0 is
//!   fully transparent so electrodes that report no reading do not draw a fill.
//! - **Loaded**: a text file of up to 256 rows, one `R,G,B` triple per row. Rows that do not
//!   parse as exactly three integers in `0..=255` leave their entry transparent black;
//!   rows past 256 are ignored and missing rows stay transparent black.
//!
//! Only the three-field row schema is accepted. Four-field rows are treated like any other
//! malformed row rather than being guessed at.

use std::path::Path;

use egui::Color32;
use tracing::{debug, info, warn};

use crate::error::{MapError, MapResult};

/// Number of entries in every table.
pub const TABLE_SIZE: usize = 256;

/// One table entry, stored unmultiplied so channel values survive round trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha; 0 is fully transparent.
    pub a: u8,
}

impl MapColor {
    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert to an egui color for painting.
    pub fn to_color32(self) -> Color32 {
        Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

/// Which policy produced a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMapSource {
    /// Built-in green → red gradient.
    Generated,
    /// Parsed from a color table file.
    Loaded,
}

/// Result of parsing a color table file.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    /// Rows (zero-based) that were skipped because they did not parse.
    pub rejected_rows: Vec<usize>,
    /// Rows beyond the table size that were ignored.
    pub ignored_rows: usize,
}

/// Immutable 256-entry lookup table shared read-only by every electrode.
#[derive(Debug, Clone)]
pub struct ColorMapTable {
    colors: [MapColor; TABLE_SIZE],
    source: ColorMapSource,
}

impl ColorMapTable {
    /// Build the green → red gradient.
    pub fn generated() -> Self {
        let mut colors = [MapColor::default(); TABLE_SIZE];
        for (i, color) in colors.iter_mut().enumerate() {
            let v = i as u8;
            *color = MapColor::rgb(v, 255 - v, 0);
        }
        colors[0].a = 0;
        Self {
            colors,
            source: ColorMapSource::Generated,
        }
    }

    /// Parse a table from file contents. A leading UTF-8 byte order mark is skipped.
    pub fn parse(text: &str) -> (Self, ParseReport) {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut colors = [MapColor::default(); TABLE_SIZE];
        let mut report = ParseReport::default();

        for (index, line) in text.lines().enumerate() {
            if index >= TABLE_SIZE {
                report.ignored_rows += 1;
                continue;
            }
            match parse_row(line) {
                Some(color) => colors[index] = color,
                None => report.rejected_rows.push(index),
            }
        }

        (
            Self {
                colors,
                source: ColorMapSource::Loaded,
            },
            report,
        )
    }

    /// Load a table from a file.
    ///
    /// An unreadable or empty file is an error; individual bad rows are not.
    pub fn load(path: &Path) -> MapResult<(Self, ParseReport)> {
        let text = std::fs::read_to_string(path).map_err(|source| MapError::ColorMapIo {
            path: path.to_path_buf(),
            source,
        })?;
        if text.trim_start_matches('\u{feff}').trim().is_empty() {
            return Err(MapError::ColorMapEmpty {
                path: path.to_path_buf(),
            });
        }
        let (table, report) = Self::parse(&text);
        if !report.rejected_rows.is_empty() {
            warn!(
                path = %path.display(),
                rejected = report.rejected_rows.len(),
                "Color map rows failed to parse and were left transparent"
            );
        }
        if report.ignored_rows > 0 {
            debug!(ignored = report.ignored_rows, "Color map rows past 256 ignored");
        }
        Ok((table, report))
    }

    /// Pick the construction policy by probing for an optional file.
    ///
    /// A missing file silently selects the generated gradient. A file that exists but
    /// cannot be used also falls back to the gradient; that error is handed back so the
    /// caller can report it once.
    pub fn probe(path: Option<&Path>) -> (Self, Option<MapError>) {
        let Some(path) = path.filter(|p| p.exists()) else {
            debug!("No color map file, using generated gradient");
            return (Self::generated(), None);
        };
        match Self::load(path) {
            Ok((table, _)) => {
                info!(path = %path.display(), "Loaded color map");
                (table, None)
            }
            Err(err) => {
                warn!(error = %err, "Falling back to generated color map");
                (Self::generated(), Some(err))
            }
        }
    }

    /// Color for an impedance value. `value` is already clamped to `0..=255`.
    #[inline]
    pub fn color_for(&self, value: u8) -> MapColor {
        self.colors[usize::from(value)]
    }

    /// All entries in index order.
    pub fn colors(&self) -> &[MapColor; TABLE_SIZE] {
        &self.colors
    }

    /// Policy that produced this table.
    pub fn source(&self) -> ColorMapSource {
        self.source
    }
}

impl Default for ColorMapTable {
    fn default() -> Self {
        Self::generated()
    }
}

fn parse_row(line: &str) -> Option<MapColor> {
    let mut fields = line.split(',').map(|f| f.trim().parse::<u8>());
    let r = fields.next()?.ok()?;
    let g = fields.next()?.ok()?;
    let b = fields.next()?.ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(MapColor::rgb(r, g, b))
}
