//! 256-bit difficulty targets, the compact ("nBits") wire codec, and the
//! read-only chain-walking abstraction the retarget engine is built on.

mod big_target;
mod chain;
mod compact;

pub use big_target::BigTarget;
pub use chain::ChainView;
pub use compact::{CompactBits, DecodedTarget};
