//! Conversion between 1-based (column, row) coordinates and A1-style cell references.

/// Largest column index in an `.xlsx` worksheet (`XFD`).
pub const MAX_COLUMNS: u32 = 16_384;
/// Largest row index in an `.xlsx` worksheet.
pub const MAX_ROWS: u32 = 1_048_576;

/// Returns `true` when (`col`, `row`) lies inside the worksheet grid.
pub fn in_bounds(col: u32, row: u32) -> bool {
    (1..=MAX_COLUMNS).contains(&col) && (1..=MAX_ROWS).contains(&row)
}

/// Column letters for a 1-based column index (`1` -> `A`, `27` -> `AA`).
pub fn column_name(col: u32) -> Option<String> {
    if !(1..=MAX_COLUMNS).contains(&col) {
        return None;
    }
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).ok()
}

/// A1 reference for 1-based coordinates, e.g. `cell_name(2, 3) == Some("B3")`.
pub fn cell_name(col: u32, row: u32) -> Option<String> {
    if !in_bounds(col, row) {
        return None;
    }
    column_name(col).map(|letters| format!("{letters}{row}"))
}

/// Parse an A1 reference (case-insensitive, optional `$` markers) into 1-based `(col, row)`.
pub fn cell_coordinates(cell: &str) -> Option<(u32, u32)> {
    let cell = cell.trim();
    let rest = cell.strip_prefix('$').unwrap_or(cell);
    let split = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    let (letters, digits) = rest.split_at(split);
    let digits = digits.strip_prefix('$').unwrap_or(digits);

    if letters.is_empty() || letters.len() > 3 || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let col = letters
        .bytes()
        .fold(0u32, |acc, b| acc * 26 + u32::from(b.to_ascii_uppercase() - b'A' + 1));
    let row: u32 = digits.parse().ok()?;
    in_bounds(col, row).then_some((col, row))
}
