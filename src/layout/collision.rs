//! Spiral search for the nearest free spot around an anchor point.

use std::f64::consts::FRAC_PI_4;

use crate::measure::Size;

use super::types::{LayoutOptions, PlacedTable, Placements, Point};

/// Angular positions tried on each ring of the spiral.
const SECTORS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub point: Point,
    /// The iteration cap was hit; `point` may still overlap a placed table.
    pub exhausted: bool,
    pub iterations: usize,
}

#[derive(Debug, Clone)]
pub struct CollisionResolver {
    pub(crate) gap_x: f64,
    pub(crate) gap_y: f64,
    pub(crate) max_iterations: usize,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new(&LayoutOptions::default())
    }
}

impl CollisionResolver {
    pub fn new(options: &LayoutOptions) -> Self {
        Self {
            gap_x: options.gap_x,
            gap_y: options.gap_y,
            max_iterations: options.max_spiral_iterations,
        }
    }

    /// Overlap against an already placed table, measured with that table's
    /// own extent plus the gap.
    pub fn overlaps(&self, candidate: Point, placed: &PlacedTable) -> bool {
        (candidate.x - placed.x).abs() < placed.width + self.gap_x
            && (candidate.y - placed.y).abs() < placed.height + self.gap_y
    }

    pub fn is_free(&self, candidate: Point, placements: &Placements) -> bool {
        !placements
            .iter()
            .any(|(_, placed)| self.overlaps(candidate, placed))
    }

    /// Find the first free point on an outward spiral around `base`.
    pub fn resolve(&self, base: Point, size: Size, placements: &Placements) -> Resolution {
        self.search(base, size, |candidate| self.is_free(candidate, placements))
            .unwrap_or_else(|last| Resolution {
                point: last,
                exhausted: true,
                iterations: self.max_iterations,
            })
    }

    /// Like [`resolve`](Self::resolve), but never returns a point above `floor_y`.
    pub fn resolve_below(
        &self,
        base: Point,
        size: Size,
        placements: &Placements,
        floor_y: f64,
    ) -> Resolution {
        self.search(base, size, |candidate| {
            candidate.y >= floor_y && self.is_free(candidate, placements)
        })
        .unwrap_or_else(|last| Resolution {
            point: Point::new(last.x, last.y.max(floor_y)),
            exhausted: true,
            iterations: self.max_iterations,
        })
    }

    /// Returns the accepted resolution, or the last computed candidate once
    /// the iteration cap is reached.
    fn search(
        &self,
        base: Point,
        size: Size,
        accept: impl Fn(Point) -> bool,
    ) -> Result<Resolution, Point> {
        let spiral_step = size.width.max(size.height) / 2.0;
        let mut sector = 0;
        let mut radius = 0.0;

        for iteration in 0..self.max_iterations {
            let candidate = spiral_point(base, radius, sector);
            if accept(candidate) {
                return Ok(Resolution {
                    point: candidate,
                    exhausted: false,
                    iterations: iteration + 1,
                });
            }

            sector += 1;
            if sector == SECTORS {
                sector = 0;
                radius += spiral_step;
            }
        }

        Err(spiral_point(base, radius, sector))
    }
}

fn spiral_point(base: Point, radius: f64, sector: u32) -> Point {
    let angle = sector as f64 * FRAC_PI_4;
    Point::new(base.x + radius * angle.cos(), base.y + radius * angle.sin())
}
