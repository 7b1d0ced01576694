//! Simulated spectrum pipeline
//!
//! Stands in for the signal-analysis stage that would normally feed the
//! waterfall: a handful of drifting narrowband carriers over a noisy floor.
//! Frames come out in the interleaved `[bin][channel]` layout the renderer
//! consumes: channel 0 carries the normalized bin position, channel 1 the
//! normalized magnitude.

use crate::util::Rng;

/// One synthetic narrowband signal
struct Carrier {
    /// Center position across the full spectrum, 0..1
    center: f32,
    /// Gaussian half-width in spectrum fraction
    width: f32,
    /// Peak magnitude above the floor
    level: f32,
    /// Sinusoidal drift rate in Hz
    drift_rate: f32,
    /// Drift amplitude in spectrum fraction
    drift_span: f32,
    /// Phase offset so carriers don't drift in lockstep
    phase: f32,
}

/// Generates one spectrum frame per call at a fixed bin count
pub struct SpectrumSource {
    bins_per_tile: usize,
    rng: Rng,
    carriers: Vec<Carrier>,
    noise_floor: f32,
    frame: Vec<f32>,
    time: f32,
}

impl SpectrumSource {
    pub fn new(bins_per_tile: usize, seed: u64) -> Self {
        let mut rng = Rng::new(seed);

        let carrier_count = 6;
        let carriers = (0..carrier_count)
            .map(|_| Carrier {
                center: rng.range_f32(0.05, 0.95),
                width: rng.range_f32(0.002, 0.012),
                level: rng.range_f32(0.35, 0.85),
                drift_rate: rng.range_f32(0.02, 0.15),
                drift_span: rng.range_f32(0.01, 0.08),
                phase: rng.range_f32(0.0, std::f32::consts::TAU),
            })
            .collect();

        Self {
            bins_per_tile,
            rng,
            carriers,
            noise_floor: 0.08,
            frame: vec![0.0; bins_per_tile * 2 * 2],
            time: 0.0,
        }
    }

    pub fn bins_per_tile(&self) -> usize {
        self.bins_per_tile
    }

    /// Advance the simulation by `dt` seconds and produce the next frame.
    /// The returned slice is valid until the next call; length is
    /// `4 * bins_per_tile`.
    pub fn next_frame(&mut self, dt: f32) -> &[f32] {
        self.time += dt;
        let total_bins = self.bins_per_tile * 2;

        for b in 0..total_bins {
            let x = b as f32 / total_bins as f32;

            // Noisy floor, slightly raised toward the band center
            let shape = 1.0 - (x - 0.5).abs();
            let mut mag = self.noise_floor * (0.4 + 0.6 * shape) * (0.5 + self.rng.next_f32());

            for c in &self.carriers {
                let center =
                    c.center + (self.time * c.drift_rate * std::f32::consts::TAU + c.phase).sin()
                        * c.drift_span;
                let d = (x - center) / c.width;
                mag += c.level * (-d * d).exp();
            }

            self.frame[b * 2] = x;
            self.frame[b * 2 + 1] = mag.clamp(0.0, 1.0);
        }

        &self.frame
    }
}
