use chain_types::{ChainView, CompactBits};

use crate::error::Error;
use crate::params::ConsensusParams;
use crate::retarget::calculate_next_work_required;

/// Walks back exactly `depth` predecessors from `from`, returning the
/// ancestor reached. `Err(Error::ChainWalkTruncated)` if the chain runs out
/// first; on a retarget boundary that means store corruption, never a
/// legitimate short chain (genesis is handled separately by every caller).
pub(crate) fn walk_back_exact<V: ChainView>(
    view: &V,
    from: V::Header,
    depth: u64,
) -> Result<V::Header, Error> {
    let mut current = from;
    for found in 0..depth {
        match view.prev(current) {
            Some(prev) => current = prev,
            None => {
                return Err(Error::ChainWalkTruncated {
                    needed: depth,
                    found,
                })
            }
        }
    }
    Ok(current)
}

/// The "return the last non-special-min-difficulty block" fallback shared
/// by Bitcoin and DigiShield when `allow_min_difficulty_blocks` is set and
/// the candidate block doesn't qualify for an outright `pow_limit` grant.
pub(crate) fn last_non_min_difficulty_bits<V: ChainView>(
    view: &V,
    mut current: V::Header,
    interval: i64,
    pow_limit_bits: CompactBits,
) -> CompactBits {
    loop {
        let on_boundary = view.height(current) % interval == 0;
        let at_min_difficulty = view.bits(current).0 == pow_limit_bits.0;
        if on_boundary || !at_min_difficulty {
            return view.bits(current);
        }
        match view.prev(current) {
            Some(prev) => current = prev,
            None => return view.bits(current),
        }
    }
}

/// Bitcoin classic retarget: boundary-triggered recompute over a fixed
/// window, held between boundaries (with an optional testnet-style
/// min-difficulty relief valve).
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

    let interval = params.bitcoin_target_timespan / params.bitcoin_target_spacing;
    let next_height = view.height(tip) + 1;

    if next_height % interval != 0 {
        if params.allow_min_difficulty_blocks {
            if candidate_time > view.time(tip) + 2 * params.bitcoin_target_spacing {
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

    Ok(calculate_next_work_required(
        view.bits(tip),
        view.time(tip) - view.time(first),
        params.bitcoin_target_timespan,
        params.pow_limit,
        (4, 4),
    ))
}
