use ratatui::style::Color;
use term_color_support::ColorSupport;

use crate::tsw_session::DisplayKind;

/// Sampled terminal colors used by the board, as ((R, G, B), ANSI-256 index).
/// Values follow the Windows Terminal "Campbell" scheme so the board looks the same everywhere.
const PALETTE: [(Color, (u8, u8, u8), u8); 10] = [
    (Color::Black, (12, 12, 12), 232),
    (Color::Red, (197, 15, 31), 160),
    (Color::Green, (19, 161, 14), 28),
    (Color::Blue, (0, 55, 218), 20),
    (Color::Magenta, (136, 23, 152), 90),
    (Color::Cyan, (58, 150, 221), 38),
    (Color::Gray, (204, 204, 204), 250),
    (Color::DarkGray, (118, 118, 118), 243),
    (Color::LightBlue, (59, 120, 255), 63),
    (Color::Yellow, (193, 156, 0), 178),
];

/// Extends ratatui colors with a terminal-capability aware variant
pub trait Adapt {
    fn adapted(self) -> Color;
}

impl Adapt for Color {
    fn adapted(self) -> Color {
        let support = ColorSupport::stdout();
        match PALETTE.iter().find(|(color, _, _)| *color == self) {
            Some(&(_, (r, g, b), _)) if support.has_16m => Color::Rgb(r, g, b),
            Some(&(_, _, index)) if support.has_256 => Color::Indexed(index),
            _ => self,
        }
    }
}

/// Classic minesweeper digit colors for 1..=8
pub fn number_color(n: u8) -> Color {
    match n {
        1 => Color::Blue,
        2 => Color::Green,
        3 => Color::Red,
        4 => Color::Magenta,
        5 => Color::Yellow,
        6 => Color::Cyan,
        7 => Color::Black,
        _ => Color::DarkGray,
    }
    .adapted()
}

/// Glyph and foreground for one tile
pub fn tile_glyph(kind: DisplayKind, ascii: bool) -> (String, Color) {
    match kind {
        DisplayKind::Plain => ((if ascii { "#" } else { "■" }).to_string(), Color::Gray.adapted()),
        DisplayKind::Revealed => (" ".to_string(), Color::Gray.adapted()),
        DisplayKind::Numbered(n) => (n.to_string(), number_color(n)),
        DisplayKind::Flagged => ((if ascii { "F" } else { "⚑" }).to_string(), Color::Red.adapted()),
        DisplayKind::ExposedMine => ((if ascii { "*" } else { "☼" }).to_string(), Color::Black.adapted()),
        DisplayKind::IncorrectlyFlagged => ("X".to_string(), Color::Red.adapted()),
    }
}
