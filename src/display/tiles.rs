//! SDL2 backing for the waterfall tiles
//!
//! Owns the two streaming textures plus the palette expansion scratch. The
//! waterfall core hands over palette-index rows; this layer expands them
//! through the active color tables into RGBA pixels and blits the tiles as
//! scaled copies. SDL textures clamp at their edges, so the sub-texel inset
//! the quad geometry carries needs no extra source cropping here.

use sdl2::pixels::PixelFormatEnum;
use sdl2::rect::Rect;
use sdl2::render::{Canvas, ScaleMode, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};

use crate::theme::{Theme, PALETTE_SIZE};
use crate::waterfall::geometry::TileQuad;
use crate::waterfall::surface::TileSurface;
use crate::waterfall::TILE_COUNT;

/// Texture storage for the two waterfall tiles.
/// Lives as long as the texture creator borrowed at construction.
pub struct TileTextures<'a> {
    creator: &'a TextureCreator<WindowContext>,
    textures: Option<[Texture<'a>; TILE_COUNT]>,
    bins_per_tile: u32,
    lines: u32,
    // RGBA bytes per palette index, in texture byte order
    palette: [[u8; 4]; PALETTE_SIZE],
    scratch: Vec<u8>,
}

impl<'a> TileTextures<'a> {
    pub fn new(creator: &'a TextureCreator<WindowContext>) -> Self {
        Self {
            creator,
            textures: None,
            bins_per_tile: 0,
            lines: 0,
            palette: [[0, 0, 0, 255]; PALETTE_SIZE],
            scratch: Vec::new(),
        }
    }
}

/// Per-frame adapter pairing the canvas with the tile textures
pub struct SdlTileSurface<'c, 'a> {
    canvas: &'c mut Canvas<Window>,
    tiles: &'c mut TileTextures<'a>,
}

impl<'c, 'a> SdlTileSurface<'c, 'a> {
    pub fn new(canvas: &'c mut Canvas<Window>, tiles: &'c mut TileTextures<'a>) -> Self {
        Self { canvas, tiles }
    }
}

fn make_texture<'a>(
    creator: &'a TextureCreator<WindowContext>,
    bins_per_tile: u32,
    lines: u32,
) -> Result<Texture<'a>, String> {
    let mut texture = creator
        .create_texture_streaming(PixelFormatEnum::RGBA8888, bins_per_tile, lines)
        .map_err(|e| e.to_string())?;
    texture.set_scale_mode(ScaleMode::Linear);
    Ok(texture)
}

impl TileSurface for SdlTileSurface<'_, '_> {
    fn create_tiles(&mut self, bins_per_tile: u32, lines: u32) -> Result<(), String> {
        // Dropping the old array releases the previous textures
        self.tiles.textures = None;

        self.tiles.textures = Some([
            make_texture(self.tiles.creator, bins_per_tile, lines)?,
            make_texture(self.tiles.creator, bins_per_tile, lines)?,
        ]);
        self.tiles.bins_per_tile = bins_per_tile;
        self.tiles.lines = lines;
        self.tiles.scratch = vec![0; (bins_per_tile * lines * 4) as usize];
        Ok(())
    }

    fn load_palette(&mut self, theme: &Theme) -> Result<(), String> {
        let (red, green, blue) = (theme.red(), theme.green(), theme.blue());
        for i in 0..PALETTE_SIZE {
            // RGBA8888 means bytes run A, B, G, R in memory
            self.tiles.palette[i] = [255, blue[i], green[i], red[i]];
        }
        Ok(())
    }

    fn upload_tile(&mut self, tile: usize, indices: &[u8]) -> Result<(), String> {
        let textures = self
            .tiles
            .textures
            .as_mut()
            .ok_or_else(|| "upload before create_tiles".to_string())?;
        let texture = textures
            .get_mut(tile)
            .ok_or_else(|| format!("no such tile: {}", tile))?;

        let expected = (self.tiles.bins_per_tile * self.tiles.lines) as usize;
        if indices.len() != expected {
            return Err(format!(
                "tile upload size mismatch: got {} indices, expected {}",
                indices.len(),
                expected
            ));
        }

        for (pixel, &index) in self.tiles.scratch.chunks_exact_mut(4).zip(indices) {
            pixel.copy_from_slice(&self.tiles.palette[index as usize]);
        }

        let pitch = (self.tiles.bins_per_tile * 4) as usize;
        texture
            .update(None, &self.tiles.scratch, pitch)
            .map_err(|e| e.to_string())
    }

    fn draw_tile(&mut self, tile: usize, quad: &TileQuad) -> Result<(), String> {
        let textures = self
            .tiles
            .textures
            .as_ref()
            .ok_or_else(|| "draw before create_tiles".to_string())?;
        let texture = textures
            .get(tile)
            .ok_or_else(|| format!("no such tile: {}", tile))?;

        let (view_w, view_h) = self.canvas.output_size()?;

        // Map NDC x extents to pixel columns; rounding keeps the seam-bias
        // overlap intact instead of opening a gap at odd widths
        let x0 = ((quad.x0 * 0.5 + 0.5) * view_w as f32).round() as i32;
        let x1 = ((quad.x1 * 0.5 + 0.5) * view_w as f32).round() as i32;
        let dst = Rect::new(x0, 0, (x1 - x0).max(1) as u32, view_h);

        self.canvas.copy(texture, None, dst)
    }
}
