//! Plain-text encodings of intensity rows and whole images.
//!
//! - [`line`]: the row codec the streaming protocol speaks, byte by byte
//! - [`pgm`]: whole-image files (`P2` plain graymap)
//!
//! Both share one layout: decimal values separated by a single space, no
//! trailing space, one row per line, preceded by `P2\n{width} {height}\n{max}\n`
//! when a header is emitted.

pub mod line;
pub mod pgm;

pub use line::{LineCodec, RowDecoder};
pub use pgm::{encode_pgm, parse_pgm, read_pgm, write_pgm};

use crate::image::Pixel;
use std::fmt::Write as _;

/// Plain-text image header.
pub fn encode_header(width: usize, height: usize, max_value: Pixel) -> String {
    format!("P2\n{} {}\n{}\n", width, height, max_value)
}

/// Append one encoded row, newline included, to `out`.
pub fn encode_row_into(row: &[Pixel], out: &mut String) {
    for (i, value) in row.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // Writing to a String cannot fail
        let _ = write!(out, "{}", value);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        assert_eq!(encode_header(90, 90, 255), "P2\n90 90\n255\n");
    }

    #[test]
    fn row_has_single_spaces_and_no_trailing_space() {
        let mut out = String::new();
        encode_row_into(&[0, 17, 255], &mut out);
        encode_row_into(&[], &mut out);
        assert_eq!(out, "0 17 255\n\n");
    }
}
