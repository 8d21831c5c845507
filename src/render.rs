use std::io::{self, Stdout, Write};

use crossterm::{
    cursor, execute, queue,
    style::{Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};

use crate::config::{ARENA_SIZE, BACKGROUND};
use crate::dot::{Dot, Rgb};

const STATUS_FG: Rgb = Rgb {
    r: 60,
    g: 60,
    b: 60,
};

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Rgb,
    bg: Rgb,
}

impl Cell {
    fn blank(bg: Rgb) -> Self {
        Self { ch: ' ', fg: bg, bg }
    }
}

// Braille cell is 2x4 dots.
// Dots are numbered (1..8) with this layout:
// (0,0)=1 (0,1)=2 (0,2)=3 (0,3)=7
// (1,0)=4 (1,1)=5 (1,2)=6 (1,3)=8
fn braille_mask(dx: usize, dy: usize) -> u8 {
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0,
    }
}

/// Square arena mapped onto the braille raster (2x4 dots per cell),
/// aspect-preserving and centered.
#[derive(Clone, Copy, Debug)]
struct Viewport {
    scale: f32,
    ox: f32,
    oy: f32,
    dot_w: usize,
    dot_h: usize,
}

fn arena_viewport(cols: u16, arena_rows: u16) -> Viewport {
    let dot_w = cols as usize * 2;
    let dot_h = arena_rows as usize * 4;
    let scale = if dot_w == 0 || dot_h == 0 {
        0.0
    } else {
        (dot_w as f32 / ARENA_SIZE).min(dot_h as f32 / ARENA_SIZE)
    };
    Viewport {
        scale,
        ox: (dot_w as f32 - ARENA_SIZE * scale) * 0.5,
        oy: (dot_h as f32 - ARENA_SIZE * scale) * 0.5,
        dot_w,
        dot_h,
    }
}

impl Viewport {
    fn project(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        // World positions past a wall (reflection doesn't clamp them) fall
        // outside the arena rect and are simply not plotted.
        if !(0.0..ARENA_SIZE).contains(&x) || !(0.0..ARENA_SIZE).contains(&y) {
            return None;
        }
        let px = (x * self.scale + self.ox) as i32;
        let py = (y * self.scale + self.oy) as i32;
        if px < 0 || py < 0 || px >= self.dot_w as i32 || py >= self.dot_h as i32 {
            return None;
        }
        Some((px as usize, py as usize))
    }
}

pub(crate) struct Renderer {
    cols: u16,
    rows: u16,
    back: Vec<Cell>,
    front: Vec<Cell>,
    // per-cell scratch for one frame of dot plotting
    mask: Vec<u8>,
    sum_r: Vec<u32>,
    sum_g: Vec<u32>,
    sum_b: Vec<u32>,
    count: Vec<u32>,
    needs_full_redraw: bool,
}

impl Renderer {
    pub(crate) fn new(cols: u16, rows: u16) -> Self {
        let n = cols as usize * rows as usize;
        Self {
            cols,
            rows,
            back: vec![Cell::blank(BACKGROUND); n],
            front: vec![Cell::blank(BACKGROUND); n],
            mask: vec![0; n],
            sum_r: vec![0; n],
            sum_g: vec![0; n],
            sum_b: vec![0; n],
            count: vec![0; n],
            needs_full_redraw: true,
        }
    }

    pub(crate) fn resize(&mut self, cols: u16, rows: u16) {
        *self = Renderer::new(cols, rows);
    }

    // Bottom row is the status line; everything above is the arena canvas.
    fn arena_rows(&self) -> u16 {
        self.rows.saturating_sub(1)
    }

    pub(crate) fn clear_back(&mut self, bg: Rgb) {
        self.back.fill(Cell::blank(bg));
        self.mask.fill(0);
        self.sum_r.fill(0);
        self.sum_g.fill(0);
        self.sum_b.fill(0);
        self.count.fill(0);
    }

    fn set(&mut self, x: i32, y: i32, ch: char, fg: Rgb, bg: Rgb) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u16, y as u16);
        if x >= self.cols || y >= self.rows {
            return;
        }
        let i = y as usize * self.cols as usize + x as usize;
        self.back[i] = Cell { ch, fg, bg };
    }

    /// One braille dot per particle; a cell's foreground is the average
    /// color of the particles that landed in it this frame.
    pub(crate) fn plot_dots(&mut self, dots: &[Dot]) {
        let vp = arena_viewport(self.cols, self.arena_rows());
        if vp.dot_w == 0 || vp.dot_h == 0 {
            return;
        }
        let cols = self.cols as usize;

        for d in dots {
            let (px, py) = match vp.project(d.pos.x, d.pos.y) {
                Some(p) => p,
                None => continue,
            };
            let i = (py / 4) * cols + px / 2;
            self.mask[i] |= braille_mask(px % 2, py % 4);
            self.sum_r[i] += d.color.r as u32;
            self.sum_g[i] += d.color.g as u32;
            self.sum_b[i] += d.color.b as u32;
            self.count[i] += 1;
        }

        for cy in 0..self.arena_rows() as usize {
            for cx in 0..cols {
                let i = cy * cols + cx;
                let m = self.mask[i];
                if m == 0 {
                    continue;
                }
                // count > 0 whenever mask is set
                let n = self.count[i];
                let fg = Rgb {
                    r: (self.sum_r[i] / n) as u8,
                    g: (self.sum_g[i] / n) as u8,
                    b: (self.sum_b[i] / n) as u8,
                };
                let ch = char::from_u32(0x2800 + m as u32).unwrap_or(' ');
                self.set(cx as i32, cy as i32, ch, fg, BACKGROUND);
            }
        }
    }

    /// Solid fill of the whole arena canvas, used once the colors have
    /// merged.
    pub(crate) fn fill(&mut self, color: Rgb) {
        let cols = self.cols as usize;
        for cy in 0..self.arena_rows() as usize {
            for cx in 0..cols {
                self.back[cy * cols + cx] = Cell {
                    ch: ' ',
                    fg: color,
                    bg: color,
                };
            }
        }
    }

    pub(crate) fn draw_status(&mut self, line: &str) {
        let y = self.rows as i32 - 1;
        for (i, ch) in line.chars().enumerate() {
            self.set(i as i32, y, ch, STATUS_FG, BACKGROUND);
        }
    }

    /// Diff flush: only changed runs are rewritten, colors set lazily.
    pub(crate) fn flush(&mut self, out: &mut Stdout) -> io::Result<()> {
        queue!(out, BeginSynchronizedUpdate)?;
        if self.needs_full_redraw {
            queue!(out, Clear(ClearType::All))?;
        }

        let mut last_fg: Option<Rgb> = None;
        let mut last_bg: Option<Rgb> = None;
        let cols = self.cols as usize;
        let rows = self.rows as usize;

        for y in 0..rows {
            let mut x = 0usize;
            while x < cols {
                let i = y * cols + x;
                if !self.needs_full_redraw && self.back[i] == self.front[i] {
                    x += 1;
                    continue;
                }
                let mut x2 = x + 1;
                while x2 < cols {
                    let j = y * cols + x2;
                    if !self.needs_full_redraw && self.back[j] == self.front[j] {
                        break;
                    }
                    x2 += 1;
                }

                queue!(out, cursor::MoveTo(x as u16, y as u16))?;
                for xx in x..x2 {
                    let c = self.back[y * cols + xx];
                    if last_bg != Some(c.bg) {
                        queue!(out, SetBackgroundColor(c.bg.to_color()))?;
                        last_bg = Some(c.bg);
                    }
                    if last_fg != Some(c.fg) {
                        queue!(out, SetForegroundColor(c.fg.to_color()))?;
                        last_fg = Some(c.fg);
                    }
                    queue!(out, Print(c.ch))?;
                }
                x = x2;
            }
        }

        self.front.copy_from_slice(&self.back);
        self.needs_full_redraw = false;
        queue!(out, ResetColor, EndSynchronizedUpdate)?;
        out.flush()?;
        Ok(())
    }
}

pub(crate) fn begin(out: &mut Stdout) -> io::Result<()> {
    execute!(out, EnterAlternateScreen, cursor::Hide, DisableLineWrap)?;
    terminal::enable_raw_mode()?;
    execute!(out, Clear(ClearType::All))?;
    Ok(())
}

pub(crate) fn cleanup(out: &mut Stdout) -> io::Result<()> {
    terminal::disable_raw_mode()?;
    execute!(
        out,
        ResetColor,
        cursor::Show,
        EnableLineWrap,
        LeaveAlternateScreen
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dot::Vec2;

    #[test]
    fn braille_bits_are_distinct_and_cover_the_byte() {
        let mut all = 0u8;
        let mut seen = Vec::new();
        for dy in 0..4 {
            for dx in 0..2 {
                let m = braille_mask(dx, dy);
                assert_ne!(m, 0);
                assert!(!seen.contains(&m));
                seen.push(m);
                all |= m;
            }
        }
        assert_eq!(all, 0xFF);
        assert_eq!(braille_mask(2, 0), 0);
    }

    #[test]
    fn square_raster_maps_edge_to_edge() {
        // 100 cols x 50 arena rows = a 200x200 dot raster
        let vp = arena_viewport(100, 50);
        assert_eq!(vp.dot_w, 200);
        assert_eq!(vp.dot_h, 200);
        assert_eq!(vp.project(0.0, 0.0), Some((0, 0)));
        assert_eq!(vp.project(799.9, 799.9), Some((199, 199)));
        assert_eq!(vp.project(800.0, 400.0), None);
        assert_eq!(vp.project(-1.0, 400.0), None);
    }

    #[test]
    fn wide_raster_is_centered() {
        // 200 cols x 50 arena rows = 400x200 dots; height limits the scale
        let vp = arena_viewport(200, 50);
        assert_eq!(vp.project(0.0, 0.0), Some((100, 0)));
        assert_eq!(vp.project(400.0, 400.0), Some((200, 100)));
        assert_eq!(vp.project(799.9, 799.9), Some((299, 199)));
    }

    #[test]
    fn plot_averages_cell_color() {
        // 50 cols x 26 rows: arena raster is 100x100 dots, scale 1/8,
        // no centering offset.
        let mut r = Renderer::new(50, 26);
        r.clear_back(BACKGROUND);
        let dots = [
            Dot {
                pos: Vec2::new(400.0, 400.0),
                vel: Vec2::new(0.0, 0.0),
                color: Rgb { r: 100, g: 0, b: 0 },
                radius: 2.0,
            },
            Dot {
                pos: Vec2::new(400.0, 400.0),
                vel: Vec2::new(0.0, 0.0),
                color: Rgb { r: 200, g: 0, b: 0 },
                radius: 2.0,
            },
        ];
        r.plot_dots(&dots);

        // world (400,400) -> dot (50,50) -> cell (25,12), subdot (0,2)
        let i = 12 * 50 + 25;
        assert_eq!(r.back[i].ch, '\u{2804}');
        assert_eq!(r.back[i].fg, Rgb { r: 150, g: 0, b: 0 });
        assert_eq!(r.back[i].bg, BACKGROUND);
    }

    #[test]
    fn fill_paints_arena_rows_only() {
        let mut r = Renderer::new(8, 4);
        r.clear_back(BACKGROUND);
        let c = Rgb { r: 9, g: 8, b: 7 };
        r.fill(c);
        for cy in 0..3usize {
            for cx in 0..8usize {
                assert_eq!(r.back[cy * 8 + cx].bg, c);
            }
        }
        // status row untouched
        for cx in 0..8usize {
            assert_eq!(r.back[3 * 8 + cx].bg, BACKGROUND);
        }
    }
}
