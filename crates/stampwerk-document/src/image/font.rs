// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Label font — a TrueType font loaded with `ab_glyph`: the configured file,
// else a named system font, else DejaVu Sans compiled into the binary, so a
// label can always be drawn.

use std::path::{Path, PathBuf};

use ab_glyph::{FontRef, FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use stampwerk_core::RgbColor;
use stampwerk_core::config::RasterStampStyle;
use stampwerk_core::error::StampwerkError;
use tracing::{debug, info, instrument, warn};

/// DejaVu Sans (Bitstream Vera license, see `assets/DejaVu-LICENSE`).
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// How deep to descend into font directories.
const MAX_FONT_DIR_DEPTH: usize = 4;

/// Font used to draw labels onto rendered pages.
pub enum LabelFont {
    /// Loaded from a file at runtime.
    TrueType(FontVec),
    /// The DejaVu Sans copy shipped inside the binary.
    Bundled(FontRef<'static>),
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrueType(_) => f.write_str("LabelFont::TrueType"),
            Self::Bundled(_) => f.write_str("LabelFont::Bundled"),
        }
    }
}

impl LabelFont {
    // -- Loading --------------------------------------------------------------

    /// Load the font configured in `style`: the explicit font file if set,
    /// else `font_name` from the system font directories, else the bundled
    /// DejaVu Sans.
    #[instrument(skip_all, fields(font_name = %style.font_name))]
    pub fn load(style: &RasterStampStyle) -> Result<Self, StampwerkError> {
        if let Some(path) = &style.font_path {
            match Self::from_file(path) {
                Ok(font) => return Ok(font),
                Err(err) => warn!(%err, "Configured font unusable"),
            }
        }

        match find_system_font(&style.font_name) {
            Some(path) => match Self::from_file(&path) {
                Ok(font) => return Ok(font),
                Err(err) => warn!(%err, "System font unusable"),
            },
            None => debug!("Font not found in system font directories"),
        }

        warn!("{} font not found, using bundled DejaVu Sans", style.font_name);
        Self::bundled()
    }

    /// The font compiled into the binary.
    pub fn bundled() -> Result<Self, StampwerkError> {
        let font = FontRef::try_from_slice(BUNDLED_FONT)
            .map_err(|err| StampwerkError::Font(format!("bundled font is corrupt: {}", err)))?;
        Ok(Self::Bundled(font))
    }

    /// Load a TrueType/OpenType font file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StampwerkError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(data).map_err(|err| {
            StampwerkError::Font(format!("{} is not a usable font: {}", path.display(), err))
        })?;
        info!("Loaded label font {}", path.display());
        Ok(Self::TrueType(font))
    }

    pub fn is_bundled(&self) -> bool {
        matches!(self, Self::Bundled(_))
    }

    // -- Drawing --------------------------------------------------------------

    /// Draw `text` with its top-left corner at `(x, y)` pixels. Glyphs that
    /// fall outside the image are clipped.
    pub fn draw(&self, image: &mut RgbImage, text: &str, x: i32, y: i32, size_px: f32, color: RgbColor) {
        let pixel = Rgb(color.to_array());
        let scale = PxScale::from(size_px);
        match self {
            Self::TrueType(font) => draw_text_mut(image, pixel, x, y, scale, font, text),
            Self::Bundled(font) => draw_text_mut(image, pixel, x, y, scale, font, text),
        }
    }
}

/// Search the usual font directories for a file named `name`
/// (case-insensitive).
pub fn find_system_font(name: &str) -> Option<PathBuf> {
    font_directories()
        .into_iter()
        .find_map(|dir| find_in_dir(&dir, name, MAX_FONT_DIR_DEPTH))
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("/System/Library/Fonts"),
    ];
    if let Ok(home) = std::env::var("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local").join("share").join("fonts"));
        dirs.push(home.join("Library").join("Fonts"));
    }
    if let Ok(windir) = std::env::var("WINDIR") {
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }
    dirs
}

fn find_in_dir(dir: &Path, name: &str, depth: usize) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if entry.file_name().to_string_lossy().eq_ignore_ascii_case(name) {
            return Some(path);
        }
    }
    if depth == 0 {
        return None;
    }
    subdirs.sort();
    subdirs
        .iter()
        .find_map(|subdir| find_in_dir(subdir, name, depth - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pixels at least half covered by red ink.
    fn red_pixels(image: &RgbImage) -> Vec<(u32, u32)> {
        image
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] >= 200 && p.0[1] < 128 && p.0[2] < 128)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    fn white(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
    }

    #[test]
    fn missing_font_falls_back_to_bundled() {
        let style = RasterStampStyle {
            font_name: "definitely-not-installed-4f1c.ttf".into(),
            font_path: Some(PathBuf::from("/nonexistent/font.ttf")),
            ..RasterStampStyle::default()
        };
        assert!(LabelFont::load(&style).unwrap().is_bundled());
    }

    #[test]
    fn configured_font_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.ttf");
        std::fs::write(&path, BUNDLED_FONT).unwrap();
        let style = RasterStampStyle {
            font_path: Some(path),
            ..RasterStampStyle::default()
        };
        assert!(matches!(LabelFont::load(&style).unwrap(), LabelFont::TrueType(_)));
    }

    #[test]
    fn non_font_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(matches!(
            LabelFont::from_file(&path),
            Err(StampwerkError::Font(_))
        ));
    }

    #[test]
    fn finds_font_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("truetype").join("msttcorefonts");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("Arial.TTF"), b"").unwrap();
        assert_eq!(
            find_in_dir(dir.path(), "arial.ttf", MAX_FONT_DIR_DEPTH),
            Some(nested.join("Arial.TTF"))
        );
        assert_eq!(find_in_dir(dir.path(), "arial.ttf", 0), None);
    }

    #[test]
    fn bundled_font_draws_below_and_right_of_the_origin() {
        let mut image = white(300, 80);
        let font = LabelFont::bundled().unwrap();
        font.draw(&mut image, "Lasku 0001", 20, 10, 24.0, RgbColor::RED);

        let red = red_pixels(&image);
        assert!(!red.is_empty());
        assert!(red.iter().all(|&(x, y)| x >= 20 && (10..10 + 24).contains(&y)), "{red:?}");
        // The stem of 'L' sits just right of the origin.
        assert!(red.iter().any(|&(x, _)| x < 26));
    }

    #[test]
    fn accented_letters_have_their_own_glyphs() {
        let font = LabelFont::bundled().unwrap();
        let mut plain = white(60, 40);
        let mut umlaut = white(60, 40);
        font.draw(&mut plain, "a", 5, 5, 24.0, RgbColor::RED);
        font.draw(&mut umlaut, "ä", 5, 5, 24.0, RgbColor::RED);
        assert_ne!(plain, umlaut);

        let mut euro = white(60, 40);
        font.draw(&mut euro, "€", 5, 5, 24.0, RgbColor::RED);
        assert!(!red_pixels(&euro).is_empty());
    }

    #[test]
    fn drawing_clips_at_image_edge() {
        let mut image = white(30, 30);
        LabelFont::bundled()
            .unwrap()
            .draw(&mut image, "8888", 20, 10, 20.0, RgbColor::RED);
        assert!(!red_pixels(&image).is_empty());
    }
}
