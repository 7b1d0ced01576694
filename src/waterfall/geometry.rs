//! Quad placement for the two waterfall tiles
//!
//! Both tiles are drawn as full-height quads in normalized device
//! coordinates: tile 0 spans [-1, 0], tile 1 spans [0, 1]. Two biases keep
//! the composition seam-free:
//!
//! - texture coordinates are inset by half a texel on every edge so linear
//!   filtering never samples across the clamped border
//! - the shared center edge is pushed half a pixel into the neighboring
//!   tile so non-integer scale factors can't open a one-pixel gap

/// One textured quad: NDC x extent plus texture coordinates.
/// `v0` is the top edge (row 0 of the uploaded window, the newest line),
/// `v1` the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileQuad {
    pub x0: f32,
    pub x1: f32,
    pub u0: f32,
    pub u1: f32,
    pub v0: f32,
    pub v1: f32,
}

impl TileQuad {
    /// Quad width in pixels at the given viewport width
    pub fn width_px(&self, viewport_width: u32) -> f32 {
        (self.x1 - self.x0) * 0.5 * viewport_width as f32
    }
}

/// Compute the two tile quads for the current texture and viewport size
pub fn tile_quads(bins_per_tile: u32, viewport_width: u32) -> [TileQuad; 2] {
    let half_texel = 0.5 / bins_per_tile.max(1) as f32;
    // One pixel spans 2/viewport in NDC, so half a pixel is 1/viewport
    let half_pixel = 1.0 / viewport_width.max(1) as f32;

    let u0 = half_texel;
    let u1 = 1.0 - half_texel;
    let v0 = half_texel;
    let v1 = 1.0 - half_texel;

    [
        TileQuad {
            x0: -1.0,
            x1: half_pixel,
            u0,
            u1,
            v0,
            v1,
        },
        TileQuad {
            x0: -half_pixel,
            x1: 1.0,
            u0,
            u1,
            v0,
            v1,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiles_cover_full_range() {
        let [left, right] = tile_quads(1024, 640);
        assert_eq!(left.x0, -1.0);
        assert_eq!(right.x1, 1.0);
        // The seam edges overlap rather than leaving a gap
        assert!(left.x1 > right.x0);
    }

    #[test]
    fn test_seam_bias_is_half_pixel() {
        let [left, right] = tile_quads(1024, 640);
        let half_pixel = 1.0 / 640.0;
        assert_eq!(left.x1, half_pixel);
        assert_eq!(right.x0, -half_pixel);
    }

    #[test]
    fn test_texel_inset() {
        let [left, _] = tile_quads(1024, 640);
        let half_texel = 0.5 / 1024.0;
        assert_eq!(left.u0, half_texel);
        assert_eq!(left.u1, 1.0 - half_texel);
        assert_eq!(left.v0, half_texel);
        assert_eq!(left.v1, 1.0 - half_texel);
        // Inset coordinates stay inside [0,1]
        assert!(left.u0 > 0.0 && left.u1 < 1.0);
    }

    #[test]
    fn test_width_px() {
        let [left, right] = tile_quads(1024, 640);
        // Each tile covers half the viewport plus the half-pixel seam bias
        assert!((left.width_px(640) - 320.5).abs() < 1e-3);
        assert!((right.width_px(640) - 320.5).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_sizes_do_not_blow_up() {
        let quads = tile_quads(0, 0);
        for q in &quads {
            assert!(q.x0.is_finite() && q.x1.is_finite());
            assert!(q.u0.is_finite() && q.v0.is_finite());
        }
    }
}
