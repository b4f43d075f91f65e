// Common utilities shared by the viewer service

pub mod hash;
pub mod hex;

pub use hash::{HashAlgorithm, RangeHash, RangeHasher};
pub use hex::{format_hex_row, format_hex_rows, format_offset, HexRow, BYTES_PER_ROW};
