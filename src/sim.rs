use crate::config::{ARENA_SIZE, BLEND_FACTOR, COLOR_TOLERANCE, DOT_RADIUS, SPAWN_MARGIN};
use crate::dot::{Dot, Rgb, Vec2};
use rand::{rngs::StdRng, Rng};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Phase {
    Running,
    Converged(Rgb),
}

pub(crate) struct World {
    pub(crate) dots: Vec<Dot>,
    pub(crate) phase: Phase,
}

impl World {
    pub(crate) fn new(rng: &mut StdRng, n: usize) -> Self {
        Self {
            dots: spawn_dots(rng, n),
            phase: Phase::Running,
        }
    }

    pub(crate) fn advance_dots(&mut self) {
        for d in &mut self.dots {
            d.step(ARENA_SIZE);
        }
    }

    /// One pass over all pairs in ascending (i, j) order. Later pairs see
    /// colors already rewritten by earlier pairs in the same pass, which
    /// makes the final hue depend on the traversal order. Quadratic; this
    /// is where nearly all the frame time goes.
    pub(crate) fn blend_collisions(&mut self) {
        for i in 0..self.dots.len() {
            for j in (i + 1)..self.dots.len() {
                if self.dots[i].overlaps(&self.dots[j]) {
                    let merged = self.dots[i]
                        .color
                        .blend_toward(self.dots[j].color, BLEND_FACTOR);
                    self.dots[i].color = merged;
                    self.dots[j].color = merged;
                }
            }
        }
    }

    /// Latch into `Converged` once every dot sits within tolerance of the
    /// first dot's current color. Never re-evaluated afterwards.
    pub(crate) fn update_convergence(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        let reference = match self.dots.first() {
            Some(d) => d.color,
            None => return,
        };
        if self
            .dots
            .iter()
            .all(|d| d.color.within(reference, COLOR_TOLERANCE))
        {
            self.phase = Phase::Converged(reference);
        }
    }
}

pub(crate) fn spawn_dots(rng: &mut StdRng, n: usize) -> Vec<Dot> {
    let mut dots = Vec::with_capacity(n);
    for _ in 0..n {
        let sx = if rng.gen::<bool>() { 1.0 } else { -1.0 };
        let sy = if rng.gen::<bool>() { 1.0 } else { -1.0 };
        dots.push(Dot {
            pos: Vec2::new(
                rng.gen_range(SPAWN_MARGIN..=ARENA_SIZE - SPAWN_MARGIN),
                rng.gen_range(SPAWN_MARGIN..=ARENA_SIZE - SPAWN_MARGIN),
            ),
            vel: Vec2::new(sx * rng.gen_range(1.0..2.0), sy * rng.gen_range(1.0..2.0)),
            color: Rgb {
                r: rng.gen_range(0..=255),
                g: rng.gen_range(0..=255),
                b: rng.gen_range(0..=255),
            },
            radius: DOT_RADIUS,
        });
    }
    dots
}
