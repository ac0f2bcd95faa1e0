use chain_types::{BigTarget, CompactBits};

/// The clamped linear retarget shared by the Bitcoin and DigiShield paths:
/// clamp `actual_timespan` into `[target_timespan/low_divisor,
/// target_timespan*high_multiplier]`, scale `last_bits` by the ratio, and
/// clamp the result to `pow_limit`.
///
/// DigiShield passes an already asymmetrically-smoothed `actual_timespan`
/// and a clamp of `(1, 1)` so this helper's own clamp is a no-op for it,
/// see [`crate::digishield::get_next_work_required`].
pub fn calculate_next_work_required(
    last_bits: CompactBits,
    actual_timespan: i64,
    target_timespan: i64,
    pow_limit: BigTarget,
    clamp: (i64, i64),
) -> CompactBits {
    let (low_divisor, high_multiplier) = clamp;
    let mut actual = actual_timespan;
    let floor = target_timespan / low_divisor;
    let ceil = target_timespan * high_multiplier;
    if actual < floor {
        actual = floor;
    }
    if actual > ceil {
        actual = ceil;
    }

    let last_target = last_bits.decode_value();
    let (scaled, overflow) = last_target.overflowing_mul_u64(actual as u64);
    debug_assert!(!overflow, "retarget scale overflowed 256 bits");
    let new_target = scaled.div_u64(target_timespan as u64).clamp_max(pow_limit);

    CompactBits::encode(new_target)
}
