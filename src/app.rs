use crate::config::{BACKGROUND, DOT_COUNT, FRAME_RATE};
use crate::input::{drain_actions, Action};
use crate::render::{self, Renderer};
use crate::sim::{Phase, World};
use anyhow::Result;
use crossterm::terminal;
use rand::{rngs::StdRng, SeedableRng};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

pub(crate) struct App {
    out: Stdout,
    renderer: Renderer,
    world: World,
    should_quit: bool,
}

impl App {
    fn init() -> Result<Self> {
        let mut out = io::stdout();
        render::begin(&mut out)?;
        let (cols, rows) = terminal::size()?;

        let mut rng = StdRng::from_entropy();
        Ok(Self {
            out,
            renderer: Renderer::new(cols, rows),
            world: World::new(&mut rng, DOT_COUNT),
            should_quit: false,
        })
    }

    fn run(&mut self) -> Result<()> {
        let frame_budget = Duration::from_secs_f32(1.0 / FRAME_RATE as f32);
        let mut frame_ms: u64 = 0;

        while !self.should_quit {
            let frame_start = Instant::now();

            for action in drain_actions()? {
                match action {
                    Action::Quit => self.should_quit = true,
                    Action::Resize(cols, rows) => self.renderer.resize(cols, rows),
                }
            }
            if self.should_quit {
                break;
            }

            match self.world.phase {
                Phase::Running => {
                    // Dots are drawn with this frame's pre-blend colors:
                    // move, draw, then blend, then the convergence check.
                    self.renderer.clear_back(BACKGROUND);
                    self.world.advance_dots();
                    self.renderer.plot_dots(&self.world.dots);
                    self.world.blend_collisions();
                    self.world.update_convergence();
                }
                Phase::Converged(color) => {
                    // Fixed point: nothing left to simulate.
                    self.renderer.clear_back(BACKGROUND);
                    self.renderer.fill(color);
                }
            }
            self.draw_status(frame_ms);
            self.renderer.flush(&mut self.out)?;

            // Frame pacing: sleep only what's left of the budget.
            let elapsed = frame_start.elapsed();
            if elapsed < frame_budget {
                std::thread::sleep(frame_budget - elapsed);
            }
            frame_ms = frame_start.elapsed().as_millis() as u64;
        }
        Ok(())
    }

    fn draw_status(&mut self, frame_ms: u64) {
        let label = match self.world.phase {
            Phase::Running => "blending",
            Phase::Converged(_) => "converged",
        };
        let line = format!(
            "colorwar  [{}]  dots:{}  {}ms/f  q/esc quit",
            label,
            self.world.dots.len(),
            frame_ms
        );
        self.renderer.draw_status(&line);
    }
}

pub(crate) fn run() -> Result<()> {
    let mut app = App::init()?;
    let result = app.run();
    render::cleanup(&mut app.out)?;
    result
}
