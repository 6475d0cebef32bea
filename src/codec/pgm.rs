//! Plain graymap (`P2`) files.

use super::{encode_header, encode_row_into};
use crate::error::{AppResult, KuwaharaError};
use crate::image::{GrayImage, Pixel};
use std::fs;
use std::path::Path;

const MAX_PREALLOCATED_SAMPLES: usize = 1 << 20;

/// Parse a plain graymap.
///
/// `#` starts a comment running to the end of its line. Samples may be laid
/// out with any whitespace, but there must be exactly `width * height` of
/// them and none may exceed the declared maximum.
pub fn parse_pgm(text: &str) -> AppResult<GrayImage> {
    let mut tokens = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(str::split_whitespace);

    match tokens.next() {
        Some("P2") => {}
        Some(other) => {
            return Err(KuwaharaError::Format(format!(
                "expected magic 'P2', found '{}'",
                other
            )))
        }
        None => return Err(KuwaharaError::Format("empty image file".to_string())),
    }

    let mut header = |name: &str| -> AppResult<usize> {
        let token = tokens
            .next()
            .ok_or_else(|| KuwaharaError::Format(format!("missing {}", name)))?;
        token
            .parse::<usize>()
            .map_err(|_| KuwaharaError::Format(format!("invalid {} '{}'", name, token)))
    };

    let width = header("width")?;
    let height = header("height")?;
    let max_value = header("max value")?;
    if max_value == 0 || max_value > usize::from(Pixel::MAX) {
        return Err(KuwaharaError::Format(format!(
            "max value {} outside 1..={}",
            max_value,
            Pixel::MAX
        )));
    }
    let max_value = max_value as Pixel;

    let expected = width.checked_mul(height).ok_or_else(|| {
        KuwaharaError::Format(format!("dimensions {}x{} overflow", width, height))
    })?;
    // Header values are untrusted; the sample count decides the final size.
    let mut data = Vec::with_capacity(expected.min(MAX_PREALLOCATED_SAMPLES));
    for token in tokens {
        let value = token
            .parse::<Pixel>()
            .ok()
            .filter(|&v| v <= max_value)
            .ok_or_else(|| KuwaharaError::Format(format!("invalid sample '{}'", token)))?;
        data.push(value);
    }

    if data.len() != expected {
        return Err(KuwaharaError::Format(format!(
            "expected {} samples for {}x{}, found {}",
            expected,
            width,
            height,
            data.len()
        )));
    }

    GrayImage::from_vec(width, height, max_value, data)
}

/// Encode an image as a plain graymap
pub fn encode_pgm(image: &GrayImage) -> String {
    let mut out = encode_header(image.width(), image.height(), image.max_value());
    out.reserve(image.as_slice().len() * 4);
    for row in image.rows() {
        encode_row_into(row, &mut out);
    }
    out
}

/// Read and parse a plain graymap file
pub fn read_pgm<P: AsRef<Path>>(path: P) -> AppResult<GrayImage> {
    let text = fs::read_to_string(path)?;
    parse_pgm(&text)
}

/// Write `image` to `path`, creating parent directories as needed
pub fn write_pgm<P: AsRef<Path>>(path: P, image: &GrayImage) -> AppResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, encode_pgm(image))?;
    Ok(())
}
