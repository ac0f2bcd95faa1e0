use chain_types::BigTarget;

use crate::error::Error;

/// Selects one of the three hand-audited consensus parameter tables.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Network {
    Main,
    Test,
    Regtest,
}

impl Network {
    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "main" => Ok(Network::Main),
            "test" => Ok(Network::Test),
            "regtest" => Ok(Network::Regtest),
            other => Err(Error::UnknownNetwork(other.to_owned())),
        }
    }
}

/// Per-algorithm spacing, timespan, activation height, limit and toggle
/// fields. Constructed once per network and treated as immutable for the
/// life of the process; see [`crate::select_params`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusParams {
    pub pow_limit: BigTarget,
    pub pos_limit: BigTarget,

    pub bitcoin_start_height: i64,
    pub bitcoin_target_timespan: i64,
    pub bitcoin_target_spacing: i64,

    pub kgwv1_start_height: i64,
    pub kgwv1_target_timespan: i64,
    pub kgwv1_target_spacing: i64,

    pub kgwv2_start_height: i64,
    pub kgwv2_target_timespan: i64,
    pub kgwv2_target_spacing: i64,

    pub digishield_start_height: i64,
    pub digishield_target_timespan: i64,
    pub digishield_target_spacing: i64,

    pub pos_start_height: i64,
    pub pos_target_timespan: i64,
    pub pos_target_spacing: i64,
    pub last_pow_block: i64,

    pub allow_min_difficulty_blocks: bool,
    pub no_retargeting: bool,
}

impl ConsensusParams {
    /// Validates the invariants the hand-written network tables are
    /// expected to already satisfy. Only reachable via a caller-constructed
    /// value; the three built-in tables below never go through this path
    /// since they are consensus inputs, not user-supplied configuration.
    pub fn validated(self) -> Result<Self, Error> {
        let divisible = |timespan: i64, spacing: i64| spacing != 0 && timespan % spacing == 0;

        if !divisible(self.bitcoin_target_timespan, self.bitcoin_target_spacing) {
            return Err(Error::InvalidConsensusParams(
                "bitcoin_target_timespan not divisible by bitcoin_target_spacing",
            ));
        }
        if !divisible(self.kgwv1_target_timespan, self.kgwv1_target_spacing) {
            return Err(Error::InvalidConsensusParams(
                "kgwv1_target_timespan not divisible by kgwv1_target_spacing",
            ));
        }
        if !divisible(self.kgwv2_target_timespan, self.kgwv2_target_spacing) {
            return Err(Error::InvalidConsensusParams(
                "kgwv2_target_timespan not divisible by kgwv2_target_spacing",
            ));
        }
        if !divisible(self.digishield_target_timespan, self.digishield_target_spacing) {
            return Err(Error::InvalidConsensusParams(
                "digishield_target_timespan not divisible by digishield_target_spacing",
            ));
        }
        if !divisible(self.pos_target_timespan, self.pos_target_spacing) {
            return Err(Error::InvalidConsensusParams(
                "pos_target_timespan not divisible by pos_target_spacing",
            ));
        }

        let heights = [
            self.bitcoin_start_height,
            self.kgwv1_start_height,
            self.kgwv2_start_height,
            self.digishield_start_height,
            self.pos_start_height,
        ];
        if !heights.windows(2).all(|w| w[0] <= w[1]) {
            return Err(Error::InvalidConsensusParams(
                "algorithm activation heights must be non-decreasing",
            ));
        }

        if self.pow_limit.is_zero() {
            return Err(Error::InvalidConsensusParams("pow_limit must be non-zero"));
        }
        if self.pos_limit.is_zero() {
            return Err(Error::InvalidConsensusParams("pos_limit must be non-zero"));
        }

        Ok(self)
    }

    /// The hand-audited mainnet table, transcribed verbatim from
    /// `CMainParams` in the source's `chainparams.cpp`.
    #[must_use]
    pub fn main() -> Self {
        ConsensusParams {
            pow_limit: BigTarget::MAX >> 20,
            pos_limit: BigTarget::MAX >> 20,

            bitcoin_start_height: 0,
            bitcoin_target_timespan: 108 * 40,
            bitcoin_target_spacing: 40,

            kgwv1_start_height: 61_798,
            kgwv1_target_timespan: 108 * 40,
            kgwv1_target_spacing: 40,

            kgwv2_start_height: 158_000,
            kgwv2_target_timespan: 108 * 40,
            kgwv2_target_spacing: 40,

            digishield_start_height: 280_000,
            digishield_target_timespan: 40,
            digishield_target_spacing: 40,

            pos_start_height: 974_999,
            pos_target_timespan: 40,
            pos_target_spacing: 40,
            last_pow_block: 974_999,

            allow_min_difficulty_blocks: false,
            no_retargeting: false,
        }
    }

    /// Testnet (v3): `CTestNetParams` carries the same consensus ladder as
    /// mainnet, leaving `fPowAllowMinDifficultyBlocks`/`fPowNoRetargeting`
    /// at their inherited `false` defaults; only `CRegTestParams` flips
    /// either of them.
    #[must_use]
    pub fn test() -> Self {
        Self::main()
    }

    /// Regression test network (`CRegTestParams`): the literal
    /// `powLimit`/`posLimit` shift and `fPowAllowMinDifficultyBlocks`/
    /// `fPowNoRetargeting` toggles are carried over verbatim, but the
    /// activation heights are collapsed to the start of the chain so a
    /// single-node harness never has to mine past a boundary to exercise
    /// block validation.
    #[must_use]
    pub fn regtest() -> Self {
        ConsensusParams {
            pow_limit: BigTarget::MAX >> 20,
            pos_limit: BigTarget::MAX >> 20,

            bitcoin_start_height: 0,
            bitcoin_target_timespan: 108 * 40,
            bitcoin_target_spacing: 40,

            kgwv1_start_height: 0,
            kgwv1_target_timespan: 108 * 40,
            kgwv1_target_spacing: 40,

            kgwv2_start_height: 0,
            kgwv2_target_timespan: 108 * 40,
            kgwv2_target_spacing: 40,

            digishield_start_height: 0,
            digishield_target_timespan: 40,
            digishield_target_spacing: 40,

            pos_start_height: 1,
            pos_target_timespan: 40,
            pos_target_spacing: 40,
            last_pow_block: 0,

            allow_min_difficulty_blocks: true,
            no_retargeting: true,
        }
    }

    #[must_use]
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Main => Self::main(),
            Network::Test => Self::test(),
            Network::Regtest => Self::regtest(),
        }
    }
}
