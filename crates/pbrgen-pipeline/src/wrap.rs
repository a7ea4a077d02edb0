//! Toroidal coordinate wrapping.
//!
//! Every spatial operator in this crate treats the image as a torus:
//! indices outside `[0, width)` / `[0, height)` wrap modulo the
//! respective dimension. Wrapping uses floor-mod semantics
//! ([`i64::rem_euclid`]), so negative offsets wrap to the far edge
//! rather than truncating toward zero: `wrap(-1, 10) == 9`.

/// Wrap a possibly-negative coordinate into `[0, length)` with
/// floor-mod semantics.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const fn wrap(value: i64, length: u32) -> u32 {
    // rem_euclid result is always in [0, length), so the cast is lossless.
    value.rem_euclid(length as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_values_unchanged() {
        for v in 0..10 {
            assert_eq!(wrap(v, 10), u32::try_from(v).unwrap_or_default());
        }
    }

    #[test]
    fn positive_overflow_wraps() {
        assert_eq!(wrap(10, 10), 0);
        assert_eq!(wrap(13, 10), 3);
        assert_eq!(wrap(25, 10), 5);
    }

    #[test]
    fn negative_values_wrap_to_far_edge() {
        // Floor-mod, not truncating mod: -1 maps to length-1.
        assert_eq!(wrap(-1, 10), 9);
        assert_eq!(wrap(-10, 10), 0);
        assert_eq!(wrap(-11, 10), 9);
        assert_eq!(wrap(-23, 10), 7);
    }

    #[test]
    fn offset_by_length_is_identity() {
        for v in -20i64..20 {
            assert_eq!(wrap(v, 7), wrap(v + 7, 7));
            assert_eq!(wrap(v, 7), wrap(v - 7, 7));
        }
    }
}
