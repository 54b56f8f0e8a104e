use crate::foundation::{core::Point, math::Rng64};

/// First probe point on both axes.
pub const PROBE_ORIGIN: f64 = 200.0;
/// Probe step and the per-axis collision radius.
pub const PROBE_STEP: f64 = 30.0;
/// Probing stops once a candidate passes either limit.
pub const PROBE_LIMIT_X: f64 = 400.0;
/// See [`PROBE_LIMIT_X`].
pub const PROBE_LIMIT_Y: f64 = 300.0;

/// Picks default positions for parts without a saved one.
#[derive(Clone, Debug)]
pub struct Placement {
    rng: Rng64,
}

impl Placement {
    /// Seeded placement; the seed only affects the jittered fallback.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rng64::new(seed),
        }
    }

    /// Probe `(200 + k*30, 200 + k*30)` for the first point with no occupied point within 30px on
    /// both axes. When a candidate passes `x > 400` or `y > 300`, return a jittered point in
    /// `[150, 350) x [150, 250)` instead.
    pub fn next_free(&mut self, occupied: &[Point]) -> Point {
        let mut candidate = Point::new(PROBE_ORIGIN, PROBE_ORIGIN);
        let mut offset = 0.0;
        while collides(candidate, occupied) {
            offset += PROBE_STEP;
            candidate = Point::new(PROBE_ORIGIN + offset, PROBE_ORIGIN + offset);
            if candidate.x > PROBE_LIMIT_X || candidate.y > PROBE_LIMIT_Y {
                return Point::new(
                    150.0 + self.rng.next_f64_01() * 200.0,
                    150.0 + self.rng.next_f64_01() * 100.0,
                );
            }
        }
        candidate
    }
}

fn collides(candidate: Point, occupied: &[Point]) -> bool {
    occupied.iter().any(|p| {
        (p.x - candidate.x).abs() < PROBE_STEP && (p.y - candidate.y).abs() < PROBE_STEP
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compose/placement.rs"]
mod tests;
