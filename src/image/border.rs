//! Border resolution for window samples that fall outside the image.
//!
//! Reflect-101 mirrors around the edge sample without repeating it:
//! `d c b | a b c d | c b a`. Indices still out of range after one reflection
//! (only possible when the window is wider than twice the image) are clamped.

/// Resolve `index` against a dimension of length `len`.
///
/// An index already inside `[0, len)` maps to itself.
pub fn reflect_101(index: isize, len: usize) -> usize {
    let len = len.max(1) as isize;
    let mut i = index;

    if i < 0 {
        i = -i;
    }
    if i >= len {
        i = 2 * len - i - 2;
    }

    i.clamp(0, len - 1) as usize
}
