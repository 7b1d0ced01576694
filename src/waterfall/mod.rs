//! Scrolling spectrogram ("waterfall") renderer
//!
//! Incoming spectrum frames are quantized to 8-bit palette indices and
//! written into two per-tile ring buffers, one row per frame, with the write
//! cursor counting down. Each ring is physically twice the visible height:
//! the upper half mirrors the lower half, refreshed one quarter at a time as
//! the cursor passes the quarter-height checkpoints. The mirror lets the
//! presenter upload the visible window as one contiguous span starting at
//! the cursor, with no modular arithmetic and no per-frame allocation.
//!
//! Ingestion is push-driven (once per arriving frame); presentation is
//! pull-driven (once per redraw) and reads whatever the rings currently
//! hold. Both run on the thread owning the rendering context.

pub mod geometry;
pub mod surface;

use crate::theme::Theme;
use geometry::tile_quads;
use std::rc::{Rc, Weak};
use surface::TileSurface;

/// Number of horizontal tiles; each renders one half of the input spectrum
pub const TILE_COUNT: usize = 2;

/// Amplitudes clamp just below 1.0 so the brightest level quantizes to 252,
/// leaving headroom below the top of the 8-bit range
pub const MAX_LEVEL: f32 = 0.99;

/// Clamp a normalized amplitude into the displayable range
#[inline]
pub fn clamp_level(v: f32) -> f32 {
    v.clamp(0.0, MAX_LEVEL)
}

/// Map a clamped amplitude to an 8-bit palette index
#[inline]
pub fn quantize(v: f32) -> u8 {
    (v * 255.0).floor() as u8
}

/// Waterfall state for one visual surface
pub struct Waterfall {
    bins_per_tile: usize,
    lines: usize,
    /// Per-tile index buffers: `lines` visible rows plus a full-height
    /// mirror region used for contiguous uploads across the wrap point
    bufs: [Vec<u8>; TILE_COUNT],
    /// Per-tile row-write offsets, counting down
    cursor: [usize; TILE_COUNT],
    /// Identity of the last-applied theme; compared by pointer, not value
    active_theme: Option<Weak<Theme>>,
    textures_ready: bool,
}

impl Waterfall {
    pub fn new() -> Self {
        Self {
            bins_per_tile: 0,
            lines: 0,
            bufs: [Vec::new(), Vec::new()],
            cursor: [0; TILE_COUNT],
            active_theme: None,
            textures_ready: false,
        }
    }

    /// (Re)configure resolution and scrollback depth, discarding any prior
    /// content. Safe to call repeatedly; each call reallocates the rings,
    /// resets the cursors and schedules texture recreation on the next draw.
    ///
    /// `fft_size` is halved internally: each tile renders one half of the
    /// spectrum. The second tile's cursor starts offset by `lines - lines/8`
    /// so the two tiles never hit a mirror-copy checkpoint on the same frame.
    pub fn setup(&mut self, fft_size: usize, lines: usize) {
        assert!(fft_size > 0, "fft_size must be positive");
        assert!(lines > 0, "lines must be positive");

        self.bins_per_tile = fft_size / 2;
        self.lines = lines;

        let size = self.bins_per_tile * lines * 2;
        for buf in &mut self.bufs {
            buf.clear();
            buf.resize(size, 0);
        }

        self.cursor = [lines, lines - lines / 8];
        self.textures_ready = false;
        self.active_theme = None;
    }

    /// Push one spectrum frame: `4 * bins_per_tile` floats in interleaved
    /// `[bin][channel]` layout, channel 1 holding the normalized magnitude.
    /// An empty frame is the defined "no new data this tick" signal and
    /// leaves all state untouched. Out-of-range magnitudes clamp silently;
    /// ingestion never fails and never allocates.
    pub fn ingest(&mut self, frame: &[f32]) {
        if frame.is_empty() {
            return;
        }

        let bins = self.bins_per_tile;
        let lines = self.lines;
        debug_assert_eq!(
            frame.len(),
            2 * bins * 2,
            "frame length must be 4 * bins_per_tile"
        );

        let quarter = lines / 4;

        for j in 0..TILE_COUNT {
            let ofs = self.cursor[j];
            let buf = &mut self.bufs[j];

            let row = &mut buf[ofs * bins..(ofs + 1) * bins];
            for (i, out) in row.iter_mut().enumerate() {
                let v = frame[(j * bins + i) * 2 + 1];
                *out = quantize(clamp_level(v));
            }

            // The cursor just finished descending through a quarter block:
            // refresh that block's mirror so uploads below this offset keep
            // reading current data across the wrap point. The cursor moves
            // one row per frame, so at most one checkpoint matches per call.
            for k in (0..4).rev() {
                if ofs == quarter * k {
                    let start = quarter * k * bins;
                    let len = quarter * bins;
                    buf.copy_within(start..start + len, (lines + quarter * k) * bins);
                }
            }

            // Ring rollover: new rows start overwriting the oldest again
            if self.cursor[j] == 0 {
                self.cursor[j] = lines;
            }
            self.cursor[j] -= 1;
        }
    }

    /// Draw the current ring state to the given surface: lazily (re)creates
    /// tile textures, reloads the palette only when the injected theme's
    /// identity changed, uploads each tile's contiguous visible window and
    /// draws the two seam-biased quads.
    pub fn present<S: TileSurface>(
        &mut self,
        surface: &mut S,
        theme: &Rc<Theme>,
        viewport_width: u32,
    ) -> Result<(), String> {
        if self.bins_per_tile == 0 || self.lines == 0 {
            return Ok(()); // nothing to draw before setup
        }

        if !self.textures_ready {
            surface.create_tiles(self.bins_per_tile as u32, self.lines as u32)?;
            self.textures_ready = true;
            // Fresh textures need the palette reapplied
            self.active_theme = None;
        }

        let theme_changed = match &self.active_theme {
            Some(active) => !std::ptr::eq(active.as_ptr(), Rc::as_ptr(theme)),
            None => true,
        };
        if theme_changed {
            surface.load_palette(theme)?;
            self.active_theme = Some(Rc::downgrade(theme));
        }

        for j in 0..TILE_COUNT {
            surface.upload_tile(j, self.window(j))?;
        }

        let quads = tile_quads(self.bins_per_tile as u32, viewport_width);
        for (j, quad) in quads.iter().enumerate() {
            surface.draw_tile(j, quad)?;
        }

        Ok(())
    }

    /// Frequency bins per tile (half the configured FFT size)
    pub fn bins_per_tile(&self) -> usize {
        self.bins_per_tile
    }

    /// Visible scrollback rows per tile
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Current row-write offset for a tile
    pub fn cursor(&self, tile: usize) -> usize {
        self.cursor[tile]
    }

    /// The contiguous visible window for a tile: `bins_per_tile * lines`
    /// index bytes starting at the current cursor row
    pub fn window(&self, tile: usize) -> &[u8] {
        let start = self.bins_per_tile * self.cursor[tile];
        &self.bufs[tile][start..start + self.bins_per_tile * self.lines]
    }
}

impl Default for Waterfall {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::geometry::TileQuad;
    use super::*;
    use crate::theme::ThemeSet;

    /// Build a frame of `4 * bins` floats with every magnitude sample set
    /// to `level` (channel 0 carries the bin position, which ingestion
    /// ignores)
    fn flat_frame(bins: usize, level: f32) -> Vec<f32> {
        let mut frame = vec![0.0; bins * 2 * 2];
        for (b, pair) in frame.chunks_exact_mut(2).enumerate() {
            pair[0] = b as f32 / (bins * 2) as f32;
            pair[1] = level;
        }
        frame
    }

    #[test]
    fn test_setup_dimensions() {
        let mut wf = Waterfall::new();
        wf.setup(2048, 512);
        assert_eq!(wf.bins_per_tile(), 1024);
        assert_eq!(wf.lines(), 512);
        // Visible ring plus the full-height mirror region
        assert_eq!(wf.bufs[0].len(), 1024 * 512 * 2);
        assert_eq!(wf.bufs[1].len(), 1024 * 512 * 2);
        assert_eq!(wf.cursor(0), 512);
        assert_eq!(wf.cursor(1), 448);
    }

    #[test]
    fn test_setup_is_repeatable() {
        let mut wf = Waterfall::new();
        wf.setup(2048, 512);
        wf.ingest(&flat_frame(1024, 0.7));
        wf.setup(256, 64);
        assert_eq!(wf.bins_per_tile(), 128);
        assert_eq!(wf.cursor(0), 64);
        assert_eq!(wf.cursor(1), 56);
        // Prior scrollback is discarded
        assert!(wf.bufs[0].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_quantize_monotonic() {
        let mut prev = 0u8;
        for i in 0..=99 {
            let v = i as f32 / 100.0 * MAX_LEVEL;
            let q = quantize(v);
            assert!(q >= prev, "quantize not monotonic at v={}", v);
            prev = q;
        }
    }

    #[test]
    fn test_clamp_idempotent() {
        for &v in &[-5.0, -0.2, 0.0, 0.3, 0.99, 1.0, 1.5, 100.0] {
            assert_eq!(
                quantize(clamp_level(v)),
                quantize(clamp_level(clamp_level(v)))
            );
        }
    }

    #[test]
    fn test_mid_level_row() {
        let mut wf = Waterfall::new();
        wf.setup(8, 16); // 4 bins per tile
        let first_row = [wf.cursor(0), wf.cursor(1)];
        wf.ingest(&flat_frame(4, 0.5));
        for j in 0..TILE_COUNT {
            let row = &wf.bufs[j][first_row[j] * 4..(first_row[j] + 1) * 4];
            assert_eq!(row, &[127, 127, 127, 127]);
        }
    }

    #[test]
    fn test_overrange_clamps_high() {
        let mut wf = Waterfall::new();
        wf.setup(8, 16);
        let row = wf.cursor(0);
        wf.ingest(&flat_frame(4, 1.5));
        assert_eq!(wf.bufs[0][row * 4], 252);
    }

    #[test]
    fn test_underrange_clamps_low() {
        let mut wf = Waterfall::new();
        wf.setup(8, 16);
        let row = wf.cursor(0);
        // Leave one written row above zero so the test would catch a
        // missing write as well
        wf.ingest(&flat_frame(4, -0.2));
        assert_eq!(&wf.bufs[0][row * 4..(row + 1) * 4], &[0, 0, 0, 0]);
        assert_eq!(wf.cursor(0), row - 1);
    }

    #[test]
    fn test_empty_frame_is_noop() {
        let mut wf = Waterfall::new();
        wf.setup(8, 16);
        wf.ingest(&flat_frame(4, 0.5));
        let cursors = wf.cursor;
        let snapshot = wf.bufs[0].clone();
        wf.ingest(&[]);
        assert_eq!(wf.cursor, cursors);
        assert_eq!(wf.bufs[0], snapshot);
    }

    #[test]
    fn test_ring_invariant() {
        let mut wf = Waterfall::new();
        wf.setup(8, 16);
        for i in 0..100 {
            wf.ingest(&flat_frame(4, (i % 10) as f32 / 10.0));
            for j in 0..TILE_COUNT {
                assert!(wf.cursor(j) <= wf.lines());
            }
        }
    }

    #[test]
    fn test_full_ring_rollover() {
        let lines = 16;
        let mut wf = Waterfall::new();
        wf.setup(8, lines);
        for _ in 0..lines {
            wf.ingest(&flat_frame(4, 0.5));
        }
        let after_one_sweep = wf.cursor(0);
        for _ in 0..lines {
            wf.ingest(&flat_frame(4, 0.5));
        }
        // One full sweep of the ring brings the cursor back to the same
        // phase: the scroll period equals the ring height
        assert_eq!(wf.cursor(0), after_one_sweep);
    }

    #[test]
    fn test_contiguous_window() {
        let lines = 16;
        let bins = 4;
        let mut wf = Waterfall::new();
        wf.setup(bins * 2, lines);
        // The window slice must be in bounds after every single ingest
        for _ in 0..(2 * lines + 5) {
            wf.ingest(&flat_frame(bins, 0.5));
            for j in 0..TILE_COUNT {
                assert_eq!(wf.window(j).len(), bins * lines);
            }
        }
        // After more than two full sweeps every byte the presenter reads
        // was produced by ingestion, including the mirrored span
        for j in 0..TILE_COUNT {
            assert!(wf.window(j).iter().all(|&b| b == 127));
        }
    }

    #[test]
    fn test_checkpoints_are_staggered() {
        let lines = 16;
        let quarter = lines / 4;
        let mut wf = Waterfall::new();
        wf.setup(8, lines);
        for _ in 0..(4 * lines) {
            // A mirror copy happens when the row about to be written sits
            // on a quarter boundary below the top of the ring
            let hits: Vec<bool> = (0..TILE_COUNT)
                .map(|j| {
                    let c = wf.cursor(j);
                    c < lines && c % quarter == 0
                })
                .collect();
            assert!(
                !(hits[0] && hits[1]),
                "both tiles hit a mirror-copy checkpoint on the same frame"
            );
            wf.ingest(&flat_frame(4, 0.5));
        }
    }

    #[test]
    fn test_mirror_matches_ring_after_sweep() {
        let lines = 16;
        let bins = 4;
        let mut wf = Waterfall::new();
        wf.setup(bins * 2, lines);
        // Level period is coprime to the sweep length so a stale mirror
        // would hold visibly different bytes
        for i in 0..(2 * lines) {
            wf.ingest(&flat_frame(bins, (i % 7) as f32 / 10.0));
        }
        // Every visible row's mirror holds the same bytes, except the row
        // about to be rewritten (its quarter refreshes at the checkpoint)
        let buf = &wf.bufs[0];
        let quarter = lines / 4;
        let cursor = wf.cursor(0);
        let stale_quarter = cursor / quarter.max(1);
        for row in 0..lines {
            if row / quarter.max(1) == stale_quarter {
                continue;
            }
            assert_eq!(
                &buf[row * bins..(row + 1) * bins],
                &buf[(lines + row) * bins..(lines + row + 1) * bins],
                "mirror out of sync at row {}",
                row
            );
        }
    }

    // ========================================================================
    // Presenter tests (recording surface double)
    // ========================================================================

    #[derive(Default)]
    struct RecordingSurface {
        creates: Vec<(u32, u32)>,
        palettes: Vec<String>,
        uploads: Vec<(usize, Vec<u8>)>,
        draws: Vec<(usize, TileQuad)>,
    }

    impl TileSurface for RecordingSurface {
        fn create_tiles(&mut self, bins_per_tile: u32, lines: u32) -> Result<(), String> {
            self.creates.push((bins_per_tile, lines));
            Ok(())
        }

        fn load_palette(&mut self, theme: &Theme) -> Result<(), String> {
            self.palettes.push(theme.name().to_string());
            Ok(())
        }

        fn upload_tile(&mut self, tile: usize, indices: &[u8]) -> Result<(), String> {
            self.uploads.push((tile, indices.to_vec()));
            Ok(())
        }

        fn draw_tile(&mut self, tile: usize, quad: &TileQuad) -> Result<(), String> {
            self.draws.push((tile, *quad));
            Ok(())
        }
    }

    #[test]
    fn test_present_creates_textures_once() {
        let themes = ThemeSet::builtin();
        let mut wf = Waterfall::new();
        wf.setup(8, 16);
        let mut surface = RecordingSurface::default();
        wf.present(&mut surface, themes.get(0), 640).unwrap();
        wf.present(&mut surface, themes.get(0), 640).unwrap();
        assert_eq!(surface.creates, vec![(4, 16)]);
    }

    #[test]
    fn test_present_reloads_palette_only_on_identity_change() {
        let themes = ThemeSet::builtin();
        let mut wf = Waterfall::new();
        wf.setup(8, 16);
        let mut surface = RecordingSurface::default();

        wf.present(&mut surface, themes.get(0), 640).unwrap();
        wf.present(&mut surface, themes.get(0), 640).unwrap();
        assert_eq!(surface.palettes.len(), 1);

        wf.present(&mut surface, themes.get(1), 640).unwrap();
        assert_eq!(surface.palettes.len(), 2);

        // Switching back is another identity change
        wf.present(&mut surface, themes.get(0), 640).unwrap();
        assert_eq!(surface.palettes.len(), 3);
    }

    #[test]
    fn test_resetup_recreates_textures_and_palette() {
        let themes = ThemeSet::builtin();
        let mut wf = Waterfall::new();
        wf.setup(8, 16);
        let mut surface = RecordingSurface::default();
        wf.present(&mut surface, themes.get(0), 640).unwrap();
        wf.setup(16, 32);
        wf.present(&mut surface, themes.get(0), 640).unwrap();
        assert_eq!(surface.creates, vec![(4, 16), (8, 32)]);
        assert_eq!(surface.palettes.len(), 2);
    }

    #[test]
    fn test_present_uploads_current_window() {
        let themes = ThemeSet::builtin();
        let bins = 4;
        let lines = 16;
        let mut wf = Waterfall::new();
        wf.setup(bins * 2, lines);
        wf.ingest(&flat_frame(bins, 0.5));
        let mut surface = RecordingSurface::default();
        wf.present(&mut surface, themes.get(0), 640).unwrap();

        assert_eq!(surface.uploads.len(), TILE_COUNT);
        for (j, (tile, bytes)) in surface.uploads.iter().enumerate() {
            assert_eq!(*tile, j);
            assert_eq!(bytes.len(), bins * lines);
            assert_eq!(bytes.as_slice(), wf.window(j));
        }
        // The freshly written row sits one row below the window top
        let (_, bytes) = &surface.uploads[0];
        assert_eq!(&bytes[bins..2 * bins], &[127, 127, 127, 127]);
    }

    #[test]
    fn test_present_draws_both_tiles() {
        let themes = ThemeSet::builtin();
        let mut wf = Waterfall::new();
        wf.setup(8, 16);
        let mut surface = RecordingSurface::default();
        wf.present(&mut surface, themes.get(0), 640).unwrap();

        assert_eq!(surface.draws.len(), TILE_COUNT);
        let (_, left) = surface.draws[0];
        let (_, right) = surface.draws[1];
        assert_eq!(left.x0, -1.0);
        assert_eq!(right.x1, 1.0);
        assert!(left.x1 > 0.0 && right.x0 < 0.0);
    }

    #[test]
    fn test_present_before_setup_is_noop() {
        let themes = ThemeSet::builtin();
        let mut wf = Waterfall::new();
        let mut surface = RecordingSurface::default();
        wf.present(&mut surface, themes.get(0), 640).unwrap();
        assert!(surface.creates.is_empty());
        assert!(surface.uploads.is_empty());
    }
}
