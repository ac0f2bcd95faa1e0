use chain_types::{BigTarget, ChainView, CompactBits};

use crate::params::ConsensusParams;

const PAST_SECONDS_MIN: i64 = 864; // 0.01 day
const PAST_SECONDS_MAX: i64 = 12_096; // 0.14 day
const EVENT_HORIZON_BASE: f64 = 144.0;

/// Shared Kimoto Gravity Well walk. `monotonize_latest` and `min_actual`
/// capture the sole behavioral difference between v1 and v2 (see
/// [`crate::kgw::v1`]/[`crate::kgw::v2`]): v2 pins `latest` to be
/// non-decreasing across the walk and floors `actual` at `1` instead of `0`.
fn gravity_well_walk<V: ChainView>(
    view: &V,
    tip: V::Header,
    target_spacing: i64,
    monotonize_latest: bool,
    min_actual: i64,
) -> BigTarget {
    let past_blocks_min = (PAST_SECONDS_MIN / target_spacing).max(0) as u64;
    let past_blocks_max = (PAST_SECONDS_MAX / target_spacing).max(0) as u64;

    let mut latest = view.time(tip);
    let mut reading = tip;
    let mut mass: u64 = 0;
    let mut avg = BigTarget::ZERO;
    let mut actual: i64 = 0;
    let mut target: i64 = 0;

    let mut i: u64 = 1;
    loop {
        if past_blocks_max > 0 && i > past_blocks_max {
            break;
        }
        // Mirrors the source's `for (...; BlockReading && BlockReading->nHeight > 0; ...)`
        // guard: re-checked at the top of every iteration, so once `reading`
        // has been walked back onto genesis the loop exits before genesis's
        // own bits are folded into the average.
        if view.height(reading) == 0 {
            break;
        }
        mass = i;

        let reading_value = view.bits(reading).decode_value();
        avg = if i == 1 {
            reading_value
        } else {
            // avg' = avg + (reading - avg) / i. BigTarget has no signed
            // subtraction, so branch on which operand is larger and apply
            // the quotient in the matching direction.
            if reading_value >= avg {
                let step = reading_value.overflowing_sub(avg).0.div_u64(i);
                avg.overflowing_add(step).0
            } else {
                let step = avg.overflowing_sub(reading_value).0.div_u64(i);
                avg.overflowing_sub(step).0
            }
        };

        if monotonize_latest && latest < view.time(reading) {
            latest = view.time(reading);
        }
        actual = latest - view.time(reading);
        if actual < min_actual {
            actual = min_actual;
        }

        target = target_spacing * mass as i64;

        let ratio = if actual != 0 && target != 0 {
            target as f64 / actual as f64
        } else {
            1.0
        };

        let fast = 1.0 + 0.7084 * (mass as f64 / EVENT_HORIZON_BASE).powf(-1.228);
        let slow = 1.0 / fast;

        if mass >= past_blocks_min && (ratio <= slow || ratio >= fast) {
            break;
        }

        match view.prev(reading) {
            Some(prev) => reading = prev,
            None => break,
        }
        i += 1;
    }

    let mut new_target = avg;
    if actual != 0 && target != 0 {
        let (scaled, _) = avg.overflowing_mul_u64(actual as u64);
        new_target = scaled.div_u64(target as u64);
    }
    new_target
}

fn run<V: ChainView>(
    view: &V,
    tip: Option<V::Header>,
    target_spacing: i64,
    pow_limit: BigTarget,
    monotonize_latest: bool,
    min_actual: i64,
) -> CompactBits {
    let pow_limit_bits = CompactBits::encode(pow_limit);
    let tip = match tip {
        Some(tip) => tip,
        None => return pow_limit_bits,
    };

    let past_blocks_min = (PAST_SECONDS_MIN / target_spacing).max(0);
    let height = view.height(tip);
    if height == 0 || height < past_blocks_min {
        return pow_limit_bits;
    }

    let new_target = gravity_well_walk(view, tip, target_spacing, monotonize_latest, min_actual)
        .clamp_max(pow_limit);
    CompactBits::encode(new_target)
}

/// Kimoto Gravity Well v1: `actual` floors at `0`, `latest` is fixed at the
/// tip's time for the whole walk.
pub fn v1<V: ChainView>(
    view: &V,
    tip: Option<V::Header>,
    params: &ConsensusParams,
) -> CompactBits {
    run(
        view,
        tip,
        params.kgwv1_target_spacing,
        params.pow_limit,
        false,
        0,
    )
}

/// Kimoto Gravity Well v2: `actual` floors at `1`, and `latest` is
/// monotonized across the walk (a later ancestor with a larger timestamp
/// than anything seen so far pulls `latest` forward).
pub fn v2<V: ChainView>(
    view: &V,
    tip: Option<V::Header>,
    params: &ConsensusParams,
) -> CompactBits {
    run(
        view,
        tip,
        params.kgwv2_target_spacing,
        params.pow_limit,
        true,
        1,
    )
}
