//! A 3x5 bitmap font covering what the debug overlay labels use: digits and
//! the anchor side letters.

pub const GLYPH_WIDTH: u32 = 3;
pub const GLYPH_HEIGHT: u32 = 5;

/// Rows top to bottom; bit 2 is the leftmost column.
pub fn glyph(c: char) -> Option<[u8; GLYPH_HEIGHT as usize]> {
    let rows = match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        _ => return None,
    };
    Some(rows)
}

/// Offsets of the lit cells of `text` at scale 1, one column of spacing
/// between glyphs. Characters without a glyph leave a gap.
pub fn lit_cells(text: &str) -> impl Iterator<Item = (u32, u32)> + '_ {
    text.chars().enumerate().flat_map(|(i, c)| {
        let origin = i as u32 * (GLYPH_WIDTH + 1);
        glyph(c)
            .into_iter()
            .flat_map(move |rows| {
                (0..GLYPH_HEIGHT).flat_map(move |row| {
                    (0..GLYPH_WIDTH).filter_map(move |col| {
                        let lit = rows[row as usize] & (0b100 >> col) != 0;
                        lit.then_some((origin + col, row))
                    })
                })
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_and_sides_have_glyphs() {
        for c in "0123456789LR".chars() {
            assert!(glyph(c).is_some(), "missing glyph for {c}");
        }
        assert!(glyph('x').is_none());
    }

    #[test]
    fn one_is_narrow_in_the_middle() {
        let cells: Vec<(u32, u32)> = lit_cells("1").collect();
        assert!(cells.contains(&(1, 0)));
        assert!(!cells.contains(&(0, 0)));
        assert_eq!(cells.iter().filter(|&&(_, row)| row == 4).count(), 3);
    }

    #[test]
    fn second_glyph_is_offset() {
        let cells: Vec<(u32, u32)> = lit_cells("L7").collect();
        // The top row of '7' starts four columns in.
        assert!(cells.contains(&(4, 0)));
        assert!(cells.contains(&(6, 4)));
        assert!(!cells.contains(&(3, 0)));
    }
}
