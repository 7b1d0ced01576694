//! Rendering-target seam for the waterfall
//!
//! The waterfall core never talks to a graphics API directly; it issues the
//! small set of operations below against whatever surface the display layer
//! provides. The SDL2 implementation lives in `display::tiles`; tests drive
//! the core against a recording double.

use super::geometry::TileQuad;
use crate::theme::Theme;

/// Operations the waterfall needs from the rendering target
pub trait TileSurface {
    /// Destroy any existing tile textures and create fresh ones sized
    /// `bins_per_tile x lines`, with clamped linear sampling.
    fn create_tiles(&mut self, bins_per_tile: u32, lines: u32) -> Result<(), String>;

    /// Load the 256-entry index-to-color tables used to expand uploaded
    /// amplitude indices into displayed colors.
    fn load_palette(&mut self, theme: &Theme) -> Result<(), String>;

    /// Upload one tile's visible window: `bins_per_tile * lines` index
    /// bytes, row-major, newest row first.
    fn upload_tile(&mut self, tile: usize, indices: &[u8]) -> Result<(), String>;

    /// Draw one tile as a full-height textured quad.
    fn draw_tile(&mut self, tile: usize, quad: &TileQuad) -> Result<(), String>;
}
