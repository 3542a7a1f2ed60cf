//! Asset declarations and placeholder pixel generation.
//!
//! Scenes declare what they need by key and path; the driver owns the actual
//! file I/O and GPU upload. When a declared file is missing or undecodable
//! the driver substitutes procedurally generated pixels from this module, so
//! the project runs before any art has landed in `assets/images/`.

use std::collections::HashSet;

/// A plain image: one texture, drawn whole.
#[derive(Debug, Clone)]
pub struct ImageDecl {
    pub key: String,
    pub path: String,
}

/// A sprite strip: one texture divided into equal frames for animation.
#[derive(Debug, Clone)]
pub struct SheetDecl {
    pub key: String,
    pub path: String,
    pub frame_width: u32,
    pub frame_height: u32,
}

/// Collects asset declarations during the scene's `load` phase. Keys are
/// unique across images and sheets; both resolve to textures later.
#[derive(Debug, Default)]
pub struct AssetManifest {
    images: Vec<ImageDecl>,
    sheets: Vec<SheetDecl>,
    keys: HashSet<String>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_image(&mut self, key: &str, path: &str) -> Result<(), String> {
        self.claim_key(key)?;
        if path.is_empty() {
            return Err(format!(
                "Asset validation failed: image '{}' has empty path",
                key
            ));
        }
        self.images.push(ImageDecl {
            key: key.to_string(),
            path: path.to_string(),
        });
        Ok(())
    }

    pub fn declare_sheet(
        &mut self,
        key: &str,
        path: &str,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<(), String> {
        self.claim_key(key)?;
        if path.is_empty() {
            return Err(format!(
                "Asset validation failed: sheet '{}' has empty path",
                key
            ));
        }
        if frame_width == 0 || frame_height == 0 {
            return Err(format!(
                "Asset validation failed: sheet '{}' has zero frame size {}x{}",
                key, frame_width, frame_height
            ));
        }
        self.sheets.push(SheetDecl {
            key: key.to_string(),
            path: path.to_string(),
            frame_width,
            frame_height,
        });
        Ok(())
    }

    pub fn images(&self) -> &[ImageDecl] {
        &self.images
    }

    pub fn sheets(&self) -> &[SheetDecl] {
        &self.sheets
    }

    fn claim_key(&mut self, key: &str) -> Result<(), String> {
        if key.is_empty() {
            return Err("Asset validation failed: empty key".to_string());
        }
        if !self.keys.insert(key.to_string()) {
            return Err(format!("Asset validation failed: duplicate key '{}'", key));
        }
        Ok(())
    }
}

/// Magenta/gray checkerboard stand-in for a missing plain image.
pub fn checkerboard_rgba(width: u32, height: u32) -> Vec<u8> {
    const CELL: u32 = 8;
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            if ((x / CELL) + (y / CELL)) % 2 == 0 {
                pixels.extend_from_slice(&[255, 0, 255, 255]);
            } else {
                pixels.extend_from_slice(&[40, 40, 40, 255]);
            }
        }
    }
    pixels
}

/// Solid color band per frame, stand-in for a missing sprite strip. Bands
/// pair light/dark per color variant, so a placeholder strip still shows
/// which clip is playing and each 1-frame flip.
pub fn banded_strip_rgba(frame_width: u32, frame_height: u32, frames: u32) -> Vec<u8> {
    const BAND_COLORS: [[u8; 4]; 6] = [
        [230, 60, 60, 255],
        [160, 30, 30, 255],
        [230, 200, 60, 255],
        [160, 140, 30, 255],
        [70, 110, 230, 255],
        [40, 70, 160, 255],
    ];
    let width = frame_width * frames;
    let mut pixels = Vec::with_capacity((width * frame_height * 4) as usize);
    for _y in 0..frame_height {
        for x in 0..width {
            let frame = (x / frame_width) as usize;
            pixels.extend_from_slice(&BAND_COLORS[frame % BAND_COLORS.len()]);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_keep_order_and_fields() {
        let mut manifest = AssetManifest::new();
        manifest
            .declare_image("background", "assets/images/deep-space.jpg")
            .expect("image decl");
        manifest
            .declare_image("base", "assets/images/base.png")
            .expect("image decl");
        manifest
            .declare_sheet("aliens", "assets/images/aliens.png", 96, 96)
            .expect("sheet decl");

        assert_eq!(manifest.images().len(), 2);
        assert_eq!(manifest.images()[0].key, "background");
        assert_eq!(manifest.images()[1].path, "assets/images/base.png");
        assert_eq!(manifest.sheets().len(), 1);
        assert_eq!(manifest.sheets()[0].frame_width, 96);
    }

    #[test]
    fn duplicate_key_rejected_across_kinds() {
        let mut manifest = AssetManifest::new();
        manifest.declare_image("aliens", "a.png").expect("image decl");
        let err = manifest
            .declare_sheet("aliens", "b.png", 96, 96)
            .expect_err("duplicate key should fail");
        assert!(err.contains("duplicate key"));
    }

    #[test]
    fn zero_frame_size_rejected() {
        let mut manifest = AssetManifest::new();
        let err = manifest
            .declare_sheet("aliens", "a.png", 96, 0)
            .expect_err("zero frame size should fail");
        assert!(err.contains("zero frame size"));
    }

    #[test]
    fn empty_key_rejected() {
        let mut manifest = AssetManifest::new();
        let err = manifest
            .declare_image("", "a.png")
            .expect_err("empty key should fail");
        assert!(err.contains("empty key"));
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let pixels = checkerboard_rgba(16, 16);
        assert_eq!(pixels.len(), 16 * 16 * 4);
        // (0,0) is magenta, (8,0) one cell over is gray.
        assert_eq!(&pixels[0..4], &[255, 0, 255, 255]);
        assert_eq!(&pixels[8 * 4..8 * 4 + 4], &[40, 40, 40, 255]);
    }

    #[test]
    fn banded_strip_colors_frames() {
        let pixels = banded_strip_rgba(4, 2, 6);
        assert_eq!(pixels.len(), 4 * 6 * 2 * 4);
        let frame_color = |frame: usize| &pixels[frame * 4 * 4..frame * 4 * 4 + 4];
        assert_eq!(frame_color(0), &[230, 60, 60, 255]);
        assert_ne!(frame_color(0), frame_color(1));
        assert_ne!(frame_color(1), frame_color(2));
    }
}
