// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch configuration.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StampwerkError};
use crate::types::{ClassificationScope, RasterBackend, RgbColor};

/// Appearance of the vector label drawn on text-bearing pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStampStyle {
    /// Horizontal position as a fraction of page width, from the left edge.
    pub relative_x: f32,
    /// Vertical position as a fraction of page height, from the bottom edge.
    pub relative_y: f32,
    /// Helvetica size in points.
    pub font_size_pt: f32,
    pub color: RgbColor,
}

impl Default for VectorStampStyle {
    fn default() -> Self {
        Self {
            relative_x: 0.20,
            relative_y: 0.80,
            font_size_pt: 16.0,
            color: RgbColor::RED,
        }
    }
}

/// Appearance of the label burned into rasterized pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterStampStyle {
    /// Pixel offset from the left edge of the rendered page.
    pub x_px: u32,
    /// Pixel offset from the top edge of the rendered page.
    pub y_px: u32,
    /// Glyph height in pixels.
    pub font_size_px: f32,
    pub color: RgbColor,
    /// Rendering resolution for rasterized pages.
    pub dpi: u32,
    /// TrueType font file name searched for in the system font directories.
    pub font_name: String,
    /// Explicit TrueType font file; takes precedence over `font_name`.
    pub font_path: Option<PathBuf>,
}

impl Default for RasterStampStyle {
    fn default() -> Self {
        Self {
            x_px: 790,
            y_px: 50,
            font_size_px: 20.0,
            color: RgbColor::RED,
            dpi: 200,
            font_name: "arial.ttf".to_string(),
            font_path: None,
        }
    }
}

/// Settings for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    /// Directory scanned for `.pdf` files.
    pub input_dir: PathBuf,
    /// Merged output file. `None` means the dated default name.
    pub output_path: Option<PathBuf>,
    /// Text placed before the sequence number.
    pub prefix: String,
    /// Numbering starts at `offset + 1`.
    pub offset: u64,
    /// When set, every processed file is also written here individually.
    pub processed_dir: Option<PathBuf>,
    pub classification: ClassificationScope,
    pub raster_backend: RasterBackend,
    pub vector_style: VectorStampStyle,
    pub raster_style: RasterStampStyle,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("pdfs"),
            output_path: None,
            prefix: "Lasku".to_string(),
            offset: 0,
            processed_dir: None,
            classification: ClassificationScope::default(),
            raster_backend: RasterBackend::default(),
            vector_style: VectorStampStyle::default(),
            raster_style: RasterStampStyle::default(),
        }
    }
}

impl StampConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce a sensible stamp.
    pub fn validate(&self) -> Result<()> {
        let style = &self.vector_style;
        for (name, value) in [("relative_x", style.relative_x), ("relative_y", style.relative_y)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(StampwerkError::Config(format!(
                    "vector_style.{name} must be within 0.0..=1.0, got {value}"
                )));
            }
        }
        if style.font_size_pt <= 0.0 || self.raster_style.font_size_px <= 0.0 {
            return Err(StampwerkError::Config("font sizes must be positive".into()));
        }
        if !(36..=1200).contains(&self.raster_style.dpi) {
            return Err(StampwerkError::Config(format!(
                "raster_style.dpi must be within 36..=1200, got {}",
                self.raster_style.dpi
            )));
        }
        if self.offset.checked_add(1).is_none() {
            return Err(StampwerkError::Config(format!(
                "offset {} leaves no room for sequence numbers",
                self.offset
            )));
        }
        Ok(())
    }

    /// The merged output path, defaulting to a name carrying `date`.
    pub fn resolve_output_path(&self, date: NaiveDate) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| default_output_path(date))
    }
}

/// `yhdistetyt_laskut_YYYY-MM-DD.pdf` in the working directory.
pub fn default_output_path(date: NaiveDate) -> PathBuf {
    PathBuf::from(format!(
        "yhdistetyt_laskut_{}.pdf",
        date.format("%Y-%m-%d")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_invoice_workflow() {
        let config = StampConfig::default();
        assert_eq!(config.input_dir, PathBuf::from("pdfs"));
        assert_eq!(config.prefix, "Lasku");
        assert_eq!(config.offset, 0);
        assert_eq!(config.raster_style.dpi, 200);
        assert_eq!((config.raster_style.x_px, config.raster_style.y_px), (790, 50));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn dated_output_name() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        let config = StampConfig::default();
        assert_eq!(
            config.resolve_output_path(date),
            PathBuf::from("yhdistetyt_laskut_2026-03-07.pdf")
        );

        let explicit = StampConfig {
            output_path: Some(PathBuf::from("out/merged.pdf")),
            ..StampConfig::default()
        };
        assert_eq!(explicit.resolve_output_path(date), PathBuf::from("out/merged.pdf"));
    }

    #[test]
    fn load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stampwerk.json");
        std::fs::write(
            &path,
            r#"{ "prefix": "Invoice", "offset": 5, "raster_backend": "embedded",
                 "vector_style": { "font_size_pt": 12.0 } }"#,
        )
        .unwrap();

        let config = StampConfig::load(&path).unwrap();
        assert_eq!(config.prefix, "Invoice");
        assert_eq!(config.offset, 5);
        assert_eq!(config.raster_backend, RasterBackend::Embedded);
        assert_eq!(config.vector_style.font_size_pt, 12.0);
        // Untouched fields keep their defaults.
        assert_eq!(config.vector_style.relative_x, 0.20);
        assert_eq!(config.input_dir, PathBuf::from("pdfs"));
    }

    #[test]
    fn out_of_range_position_is_rejected() {
        let mut config = StampConfig::default();
        config.vector_style.relative_y = 1.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, StampwerkError::Config(_)));
    }

    #[test]
    fn offset_at_u64_max_is_rejected() {
        let config = StampConfig {
            offset: u64::MAX,
            ..StampConfig::default()
        };
        assert!(matches!(config.validate(), Err(StampwerkError::Config(_))));

        let config = StampConfig {
            offset: u64::MAX - 1,
            ..StampConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ prefix: ").unwrap();
        assert!(matches!(
            StampConfig::load(&path),
            Err(StampwerkError::Serialization(_))
        ));
    }
}
