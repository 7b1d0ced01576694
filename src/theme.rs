//! Waterfall color themes
//!
//! A theme is a 256-entry index-to-color lookup table split into red, green
//! and blue byte tables. Quantized amplitude indices are expanded through the
//! active theme's tables at texture-upload time. Themes are handed around as
//! `Rc<Theme>` so consumers can detect a theme switch with a cheap pointer
//! comparison instead of comparing table contents.

use crate::util::{hsv_to_rgb, lerp_color};
use std::rc::Rc;

/// Number of entries in each color table (one per quantized amplitude level)
pub const PALETTE_SIZE: usize = 256;

/// A named index-to-color lookup table
pub struct Theme {
    name: String,
    red: [u8; PALETTE_SIZE],
    green: [u8; PALETTE_SIZE],
    blue: [u8; PALETTE_SIZE],
}

impl Theme {
    /// Build a theme by interpolating gradient stops across the table.
    /// Stops are (position in [0,1], color) pairs and must be sorted by position.
    pub fn from_stops(name: impl Into<String>, stops: &[(f32, (u8, u8, u8))]) -> Self {
        let mut red = [0u8; PALETTE_SIZE];
        let mut green = [0u8; PALETTE_SIZE];
        let mut blue = [0u8; PALETTE_SIZE];

        for i in 0..PALETTE_SIZE {
            let t = i as f32 / (PALETTE_SIZE - 1) as f32;
            let (r, g, b) = sample_stops(stops, t);
            red[i] = r;
            green[i] = g;
            blue[i] = b;
        }

        Self {
            name: name.into(),
            red,
            green,
            blue,
        }
    }

    /// Full-hue rainbow theme (dim red through the spectrum to bright violet)
    pub fn rainbow(name: impl Into<String>) -> Self {
        let mut red = [0u8; PALETTE_SIZE];
        let mut green = [0u8; PALETTE_SIZE];
        let mut blue = [0u8; PALETTE_SIZE];

        for i in 0..PALETTE_SIZE {
            let t = i as f32 / (PALETTE_SIZE - 1) as f32;
            // Ramp value alongside hue so low levels stay dark
            let (r, g, b) = hsv_to_rgb(t * 300.0, 0.85, (0.15 + t * 0.85).min(1.0));
            red[i] = r;
            green[i] = g;
            blue[i] = b;
        }

        Self {
            name: name.into(),
            red,
            green,
            blue,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Red table, indexed by quantized amplitude
    pub fn red(&self) -> &[u8; PALETTE_SIZE] {
        &self.red
    }

    /// Green table, indexed by quantized amplitude
    pub fn green(&self) -> &[u8; PALETTE_SIZE] {
        &self.green
    }

    /// Blue table, indexed by quantized amplitude
    pub fn blue(&self) -> &[u8; PALETTE_SIZE] {
        &self.blue
    }

    /// Combined lookup for one index
    pub fn color(&self, index: u8) -> (u8, u8, u8) {
        let i = index as usize;
        (self.red[i], self.green[i], self.blue[i])
    }
}

/// Interpolate gradient stops at position t in [0,1]
fn sample_stops(stops: &[(f32, (u8, u8, u8))], t: f32) -> (u8, u8, u8) {
    match stops {
        [] => (0, 0, 0),
        [only] => only.1,
        _ => {
            let first = stops[0];
            let last = stops[stops.len() - 1];
            if t <= first.0 {
                return first.1;
            }
            if t >= last.0 {
                return last.1;
            }
            for pair in stops.windows(2) {
                let (p0, c0) = pair[0];
                let (p1, c1) = pair[1];
                if t >= p0 && t <= p1 {
                    let span = (p1 - p0).max(f32::EPSILON);
                    return lerp_color(c0, c1, (t - p0) / span);
                }
            }
            last.1
        }
    }
}

// ============================================================================
// Theme Set
// ============================================================================

/// The built-in themes, shared behind `Rc` for identity-based change detection
pub struct ThemeSet {
    themes: Vec<Rc<Theme>>,
}

impl ThemeSet {
    /// Construct the built-in theme collection
    pub fn builtin() -> Self {
        let themes = vec![
            // Classic SDR waterfall: deep blue floor rising through cyan and
            // yellow to white saturation
            Rc::new(Theme::from_stops(
                "default",
                &[
                    (0.0, (0, 0, 24)),
                    (0.25, (0, 0, 160)),
                    (0.5, (0, 200, 200)),
                    (0.75, (255, 255, 0)),
                    (1.0, (255, 255, 255)),
                ],
            )),
            Rc::new(Theme::from_stops(
                "grayscale",
                &[(0.0, (0, 0, 0)), (1.0, (255, 255, 255))],
            )),
            Rc::new(Theme::from_stops(
                "radar",
                &[
                    (0.0, (0, 12, 0)),
                    (0.6, (0, 180, 40)),
                    (1.0, (180, 255, 180)),
                ],
            )),
            // High contrast: hard ramp for weak-signal spotting
            Rc::new(Theme::from_stops(
                "sharp",
                &[
                    (0.0, (0, 0, 0)),
                    (0.45, (0, 0, 60)),
                    (0.55, (255, 80, 0)),
                    (1.0, (255, 255, 160)),
                ],
            )),
            Rc::new(Theme::rainbow("rainbow")),
        ];
        Self { themes }
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// Theme at index (wraps around)
    pub fn get(&self, index: usize) -> &Rc<Theme> {
        &self.themes[index % self.themes.len()]
    }

    /// Index of the theme with the given name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.themes.iter().position(|t| t.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_endpoints() {
        let theme = Theme::from_stops("t", &[(0.0, (0, 0, 0)), (1.0, (255, 128, 64))]);
        assert_eq!(theme.color(0), (0, 0, 0));
        assert_eq!(theme.color(255), (255, 128, 64));
    }

    #[test]
    fn test_gradient_monotonic_single_ramp() {
        let theme = Theme::from_stops("t", &[(0.0, (0, 0, 0)), (1.0, (255, 255, 255))]);
        for i in 1..PALETTE_SIZE {
            assert!(theme.red()[i] >= theme.red()[i - 1]);
        }
    }

    #[test]
    fn test_builtin_lookup() {
        let set = ThemeSet::builtin();
        assert!(set.len() >= 2);
        let idx = set.index_of("default").unwrap();
        assert_eq!(set.get(idx).name(), "default");
        assert!(set.index_of("no-such-theme").is_none());
    }

    #[test]
    fn test_identity_comparison() {
        let set = ThemeSet::builtin();
        let a = Rc::clone(set.get(0));
        let b = Rc::clone(set.get(0));
        let c = Rc::clone(set.get(1));
        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&a, &c));
    }
}
