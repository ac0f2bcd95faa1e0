#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("consensus params requested before select_params() was called")]
    ParamsUninitialized,

    #[error("select_params() called a second time")]
    ParamsAlreadySet,

    #[error("unknown network {0:?}, expected one of main/test/regtest")]
    UnknownNetwork(String),

    #[error("chain walk truncated: needed {needed} ancestors, found {found}")]
    ChainWalkTruncated { needed: u64, found: u64 },

    #[error("invalid consensus params: {0}")]
    InvalidConsensusParams(&'static str),
}
