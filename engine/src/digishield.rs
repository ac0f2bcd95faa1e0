use chain_types::{ChainView, CompactBits};

use crate::bitcoin::{last_non_min_difficulty_bits, walk_back_exact};
use crate::error::Error;
use crate::params::ConsensusParams;
use crate::retarget::calculate_next_work_required;

/// DigiShield: same boundary/min-difficulty structure as Bitcoin classic,
/// but the actual timespan is dampened and asymmetrically clamped before
/// the shared retarget math runs.
pub fn get_next_work_required<V: ChainView>(
    view: &V,
    tip: Option<V::Header>,
    candidate_time: i64,
    params: &ConsensusParams,
) -> Result<CompactBits, Error> {
    let pow_limit_bits = CompactBits::encode(params.pow_limit);

    let tip = match tip {
        Some(tip) => tip,
        None => return Ok(pow_limit_bits),
    };

    if params.no_retargeting {
        return Ok(view.bits(tip));
    }

    let interval = params.digishield_target_timespan / params.digishield_target_spacing;
    let next_height = view.height(tip) + 1;

    if next_height % interval != 0 {
        if params.allow_min_difficulty_blocks {
            if candidate_time > view.time(tip) + 2 * params.digishield_target_spacing {
                return Ok(pow_limit_bits);
            }
            return Ok(last_non_min_difficulty_bits(
                view,
                tip,
                interval,
                pow_limit_bits,
            ));
        }
        return Ok(view.bits(tip));
    }

    let depth = if next_height == interval {
        interval - 1
    } else {
        interval
    };
    let first = walk_back_exact(view, tip, depth as u64)?;

    let target = params.digishield_target_timespan;
    let mut actual = view.time(tip) - view.time(first);
    actual = target + (actual - target) / 8;
    actual = actual.max(target - target / 4);
    actual = actual.min(target + target / 2);

    Ok(calculate_next_work_required(
        view.bits(tip),
        actual,
        target,
        params.pow_limit,
        (1, 1),
    ))
}
