//! Piano keyboard widget and its hit-testing
//!
//! Two octaves of keys drawn straight into the frame buffer. The same
//! geometry answers "which key is under this cell" for mouse events.

use std::collections::BTreeSet;

use ivory::{NoteKey, NoteName};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    Frame,
};

/// Columns per white key, including its left border.
pub const WHITE_WIDTH: u16 = 5;
/// Octaves drawn side by side.
pub const OCTAVES: u16 = 2;

const WHITE_NAMES: [NoteName; 7] = [
    NoteName::C,
    NoteName::D,
    NoteName::E,
    NoteName::F,
    NoteName::G,
    NoteName::A,
    NoteName::B,
];

/// Screen placement of the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardGeometry {
    pub area: Rect,
    pub base_octave: i32,
}

impl KeyboardGeometry {
    pub fn new(area: Rect, base_octave: i32) -> Self {
        let width = area.width.min(WHITE_WIDTH * 7 * OCTAVES + 1);
        Self {
            area: Rect { width, ..area },
            base_octave,
        }
    }

    fn white_count(&self) -> u16 {
        (7 * OCTAVES).min(self.area.width / WHITE_WIDTH)
    }

    /// Rows from the top covered by black keys.
    pub fn black_rows(&self) -> u16 {
        (self.area.height * 3 / 5).max(1)
    }

    fn white_key(&self, index: u16) -> Option<NoteKey> {
        let octave = self.base_octave + (index / 7) as i32;
        NoteKey::new(WHITE_NAMES[(index % 7) as usize], octave).ok()
    }

    /// Black key on the right edge of white key `index`, if there is one.
    fn black_after(&self, index: u16) -> Option<NoteKey> {
        if index + 1 >= self.white_count() {
            return None;
        }
        let white = self.white_key(index)?;
        let black = white.transpose(1)?;
        black.name().is_sharp().then_some(black)
    }

    /// Key under the cell at (`column`, `row`), if any.
    pub fn hit_test(&self, column: u16, row: u16) -> Option<NoteKey> {
        let area = self.area;
        if column < area.x || row < area.y {
            return None;
        }
        let x = column - area.x;
        let y = row - area.y;
        if y >= area.height {
            return None;
        }

        let index = x / WHITE_WIDTH;
        if index >= self.white_count() {
            return None;
        }

        if y < self.black_rows() {
            let offset = x % WHITE_WIDTH;
            if offset <= 1 && index > 0 {
                if let Some(black) = self.black_after(index - 1) {
                    return Some(black);
                }
            }
            if offset == WHITE_WIDTH - 1 {
                if let Some(black) = self.black_after(index) {
                    return Some(black);
                }
            }
        }

        self.white_key(index)
    }
}

pub fn render_keyboard(
    frame: &mut Frame,
    geometry: &KeyboardGeometry,
    lit: &BTreeSet<NoteKey>,
    hovered: Option<NoteKey>,
) {
    let area = geometry.area;
    let buf = frame.buffer_mut();

    for y in 0..area.height {
        for x in 0..geometry.white_count() * WHITE_WIDTH {
            let Some(key) = geometry.hit_test(area.x + x, area.y + y) else {
                continue;
            };

            let black = key.name().is_sharp();
            let base = if black { Color::Black } else { Color::White };
            let bg = if lit.contains(&key) {
                if black {
                    Color::LightMagenta
                } else {
                    Color::LightCyan
                }
            } else if hovered == Some(key) {
                Color::Gray
            } else {
                base
            };

            let border = !black && x % WHITE_WIDTH == 0;
            let symbol = if border { "│" } else { " " };
            let style = Style::default().bg(bg).fg(Color::DarkGray);

            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(symbol).set_style(style);
            }
        }
    }

    // Octave labels on the C keys
    if area.height == 0 {
        return;
    }
    let label_row = area.y + area.height - 1;
    for index in (0..geometry.white_count()).step_by(7) {
        let Some(key) = geometry.white_key(index) else {
            continue;
        };
        let label = key.to_string();
        for (i, ch) in label.chars().enumerate() {
            let x = area.x + index * WHITE_WIDTH + 1 + i as u16;
            if let Some(cell) = buf.cell_mut((x, label_row)) {
                cell.set_char(ch)
                    .set_style(Style::default().fg(Color::Black).add_modifier(Modifier::BOLD));
            }
        }
    }
}
