//! Conversions between terminal colors and HSL for tinting.

use coolor::{Hsl, Rgb};
use ratatui::style::Color;

/// xterm's rendering of the 16 basic colors.
const BASIC_PALETTE: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (170, 0, 0),
    (0, 170, 0),
    (170, 85, 0),
    (0, 0, 170),
    (170, 0, 170),
    (0, 170, 170),
    (170, 170, 170),
    (85, 85, 85),
    (255, 85, 85),
    (85, 255, 85),
    (255, 255, 85),
    (85, 85, 255),
    (255, 85, 255),
    (85, 255, 255),
    (255, 255, 255),
];

/// Approximate RGB value of any terminal color. `Reset` and unknowns read as white.
#[must_use]
pub fn rgb_of(color: Color) -> (u8, u8, u8) {
    let basic = |i: usize| BASIC_PALETTE[i];
    match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Black => basic(0),
        Color::Red => basic(1),
        Color::Green => basic(2),
        Color::Yellow => basic(3),
        Color::Blue => basic(4),
        Color::Magenta => basic(5),
        Color::Cyan => basic(6),
        Color::Gray => basic(7),
        Color::DarkGray => basic(8),
        Color::LightRed => basic(9),
        Color::LightGreen => basic(10),
        Color::LightYellow => basic(11),
        Color::LightBlue => basic(12),
        Color::LightMagenta => basic(13),
        Color::LightCyan => basic(14),
        Color::Indexed(i) => indexed_rgb(i),
        _ => basic(15),
    }
}

fn indexed_rgb(i: u8) -> (u8, u8, u8) {
    match i {
        0..=15 => BASIC_PALETTE[usize::from(i)],
        16..=231 => {
            let cube = i - 16;
            let level = |c: u8| if c == 0 { 0 } else { c * 40 + 55 };
            (level(cube / 36), level((cube / 6) % 6), level(cube % 6))
        }
        _ => {
            let v = (i - 232) * 10 + 8;
            (v, v, v)
        }
    }
}

#[must_use]
pub fn hsl_of(color: Color) -> Hsl {
    let (r, g, b) = rgb_of(color);
    Rgb::new(r, g, b).to_hsl()
}

#[must_use]
pub fn color_of(hsl: Hsl) -> Color {
    let rgb = hsl.to_rgb();
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Same hue as `color`, with the given saturation and lightness (both `0.0..=1.0`).
#[must_use]
pub fn tint(color: Color, saturation: Option<f32>, lightness: f32) -> Color {
    let mut hsl = hsl_of(color);
    if let Some(s) = saturation {
        hsl.s = s;
    }
    hsl.l = lightness;
    color_of(hsl)
}
