//! Hex grid row formatting
//!
//! Rows are built from possibly-incomplete byte runs: bytes whose chunk has not
//! arrived yet render as `??` in the hex column and a blank in the ASCII column,
//! so the grid can paint immediately and fill in on `ChunkArrived`.

use serde::Serialize;

/// Bytes per row in the hex grid
pub const BYTES_PER_ROW: usize = 16;

/// One rendered row of the hex grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HexRow {
    pub offset: u64,
    /// Offset column, e.g. `0000001F0`
    pub offset_label: String,
    /// Space separated hex pairs with an extra gap at the midpoint
    pub hex: String,
    pub ascii: String,
    /// False while any byte of the row is still loading
    pub complete: bool,
}

/// Offset column label; widens past 4 GiB
pub fn format_offset(offset: u64) -> String {
    if offset > u32::MAX as u64 {
        format!("{:012X}", offset)
    } else {
        format!("{:08X}", offset)
    }
}

/// Format one row; `bytes` may be shorter than a full row at end of file
pub fn format_hex_row(offset: u64, bytes: &[Option<u8>]) -> HexRow {
    let mut hex = String::with_capacity(bytes.len() * 3 + 1);
    let mut ascii = String::with_capacity(bytes.len());

    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            hex.push(' ');
            if i == BYTES_PER_ROW / 2 {
                hex.push(' ');
            }
        }
        match byte {
            Some(b) => {
                hex.push_str(&format!("{:02X}", b));
                ascii.push(if (0x20..0x7F).contains(b) { *b as char } else { '.' });
            }
            None => {
                hex.push_str("??");
                ascii.push(' ');
            }
        }
    }

    HexRow {
        offset,
        offset_label: format_offset(offset),
        hex,
        ascii,
        complete: bytes.iter().all(Option::is_some),
    }
}

/// Split a byte run starting at `start` into grid rows
pub fn format_hex_rows(start: u64, bytes: &[Option<u8>]) -> Vec<HexRow> {
    bytes
        .chunks(BYTES_PER_ROW)
        .enumerate()
        .map(|(i, row)| format_hex_row(start + (i * BYTES_PER_ROW) as u64, row))
        .collect()
}
