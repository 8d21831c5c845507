use crate::dot::Rgb;

/// Side length of the square arena, in logical units.
pub(crate) const ARENA_SIZE: f32 = 800.0;

pub(crate) const DOT_COUNT: usize = 5000;
pub(crate) const DOT_RADIUS: f32 = 2.0;

/// Dots spawn at least this far from every wall.
pub(crate) const SPAWN_MARGIN: f32 = 50.0;

/// Weight given to the other dot's color on contact. Small on purpose:
/// the wash toward a single hue should take visible time.
pub(crate) const BLEND_FACTOR: f32 = 0.03;

/// Per-channel slack when deciding that every dot has reached one color.
pub(crate) const COLOR_TOLERANCE: i16 = 2;

pub(crate) const FRAME_RATE: u32 = 60;

pub(crate) const BACKGROUND: Rgb = Rgb {
    r: 255,
    g: 255,
    b: 255,
};
