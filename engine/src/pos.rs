use chain_types::{ChainView, CompactBits};

use crate::params::ConsensusParams;

/// The most recent ancestor of `from` (inclusive) marked proof-of-stake,
/// or `None` if none exists before genesis.
fn last_pos_block<V: ChainView>(view: &V, from: Option<V::Header>) -> Option<V::Header> {
    let mut current = from;
    loop {
        let header = current?;
        if view.is_proof_of_stake(header) {
            return Some(header);
        }
        current = view.prev(header);
    }
}

/// PPCoin-style proof-of-stake retarget: exponential moving average toward
/// the target spacing, driven off the two most recent PoS blocks.
/// `no_retargeting` has no effect here; it only gates the PoW algorithms.
pub fn get_next_work_required<V: ChainView>(
    view: &V,
    tip: V::Header,
    params: &ConsensusParams,
) -> CompactBits {
    let pos_limit_bits = CompactBits::encode(params.pos_limit);

    if view.height(tip) < params.last_pow_block + 50 {
        log::debug!(target: "retarget", "PoS switchover window, resetting to pos_limit");
        return pos_limit_bits;
    }

    // Every block past the switchover reset window should have at least one
    // PoS ancestor; if the chain store somehow has none yet, fall back to
    // the tip itself rather than panicking.
    let last_pos = last_pos_block(view, Some(tip)).unwrap_or(tip);
    let prev_pos = last_pos_block(view, view.prev(last_pos));

    let (last_time, prev_time) = match prev_pos {
        Some(prev) => (view.time(last_pos), view.time(prev)),
        None => (view.time(last_pos), view.time(last_pos)),
    };

    let mut actual_spacing = last_time - prev_time;
    actual_spacing = actual_spacing.clamp(1, 2200);

    let interval = params.pos_target_timespan / params.pos_target_spacing;
    let spacing = params.pos_target_spacing;

    let last_target = view.bits(last_pos).decode_value();
    let numerator = (interval - 1) * spacing + 2 * actual_spacing;
    let denominator = (interval + 1) * spacing;

    let (scaled, _) = last_target.overflowing_mul_u64(numerator as u64);
    let new_target = scaled.div_u64(denominator as u64).clamp_max(params.pos_limit);

    CompactBits::encode(new_target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixtureChain;

    #[test]
    fn within_switchover_window_resets_to_pos_limit() {
        let mut params = ConsensusParams::main();
        params.last_pow_block = 100;
        let mut view = FixtureChain::new();
        let tip = view.push(110, 0, CompactBits::new(0x1d00_ffff), true);
        let out = get_next_work_required(&view, tip, &params);
        assert_eq!(out, CompactBits::encode(params.pos_limit));
    }

    #[test]
    fn on_pace_spacing_is_identity() {
        let mut params = ConsensusParams::main();
        params.last_pow_block = 0;
        params.pos_target_timespan = 40;
        params.pos_target_spacing = 40;

        let mut view = FixtureChain::new();
        view.push(200, 0, CompactBits::new(0x1d00_ffff), true);
        let tip = view.push(201, 40, CompactBits::new(0x1d00_ffff), true);

        let out = get_next_work_required(&view, tip, &params);
        assert_eq!(out, CompactBits::new(0x1d00_ffff));
    }
}
