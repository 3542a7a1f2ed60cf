//! Uniform-grid spritesheet addressing.
//!
//! A sheet is a single texture divided into equal-size frames, numbered
//! left-to-right then top-to-bottom starting at 0. Animation clips store
//! frame indices; the renderer maps them to UV rectangles through this grid.

/// Frame layout of one spritesheet texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetGrid {
    pub frame_width: u32,
    pub frame_height: u32,
    pub columns: u32,
    pub rows: u32,
}

impl SheetGrid {
    /// Derive the grid from texture and frame dimensions. The texture must
    /// divide evenly into frames in both axes.
    pub fn new(
        texture_width: u32,
        texture_height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<Self, String> {
        if frame_width == 0 || frame_height == 0 {
            return Err(format!(
                "Sheet validation failed: zero frame size {}x{}",
                frame_width, frame_height
            ));
        }
        if texture_width % frame_width != 0 || texture_height % frame_height != 0 {
            return Err(format!(
                "Sheet validation failed: texture {}x{} does not divide into {}x{} frames",
                texture_width, texture_height, frame_width, frame_height
            ));
        }
        Ok(Self {
            frame_width,
            frame_height,
            columns: texture_width / frame_width,
            rows: texture_height / frame_height,
        })
    }

    pub fn frame_count(&self) -> u32 {
        self.columns * self.rows
    }

    /// UV rectangle `[u0, v0, u1, v1]` for a frame index, or `None` when the
    /// index lies outside the grid.
    pub fn frame_uv(&self, index: u32) -> Option<[f32; 4]> {
        if index >= self.frame_count() {
            return None;
        }
        let col = index % self.columns;
        let row = index / self.columns;
        Some([
            col as f32 / self.columns as f32,
            row as f32 / self.rows as f32,
            (col + 1) as f32 / self.columns as f32,
            (row + 1) as f32 / self.rows as f32,
        ])
    }
}
