//! Small numeric helpers shared by the tracker and the runner.

/// Number of microseconds in one millisecond.
pub const MICROS_PER_MILLI: u64 = 1_000;

/// Linear re-mapping with integer truncation toward zero, the same shape as
/// the classic `map(x, in_min, in_max, out_min, out_max)` helper.
///
/// Uses 64-bit intermediates so a 12-bit input times a 50k-step span cannot
/// overflow. A degenerate input span maps everything to `out_min`.
#[inline]
pub fn map_range(x: i64, in_min: i64, in_max: i64, out_min: i64, out_max: i64) -> i64 {
    let span = in_max - in_min;
    if span == 0 {
        return out_min;
    }
    (x - in_min) * (out_max - out_min) / span + out_min
}

/// Parse the run of ASCII digits at the start of `s`.
///
/// Returns `None` when `s` does not start with a digit. Overlong runs
/// saturate at `u32::MAX` instead of wrapping.
pub fn leading_digits(s: &str) -> Option<u32> {
    let digits: &str = {
        let end = s
            .as_bytes()
            .iter()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(s.len());
        &s[..end]
    };
    if digits.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for b in digits.bytes() {
        value = value
            .saturating_mul(10)
            .saturating_add(u32::from(b - b'0'));
    }
    Some(value)
}
