//! Fixture chain store shared by the algorithm unit tests.

use chain_types::{ChainView, CompactBits};

#[derive(Copy, Clone)]
struct Block {
    height: i64,
    time: i64,
    bits: CompactBits,
    is_pos: bool,
}

/// An in-memory, append-only block list addressed by index. Stands in for
/// a real node's block index in tests: `prev()` is just "index minus one".
#[derive(Default)]
pub struct FixtureChain {
    blocks: Vec<Block>,
}

impl FixtureChain {
    pub fn new() -> Self {
        FixtureChain { blocks: Vec::new() }
    }

    /// Appends a block and returns its header handle.
    pub fn push(&mut self, height: i64, time: i64, bits: CompactBits, is_pos: bool) -> usize {
        self.blocks.push(Block {
            height,
            time,
            bits,
            is_pos,
        });
        self.blocks.len() - 1
    }

    /// Appends `count` blocks at a fixed spacing, all sharing `bits`,
    /// starting right after whatever is already in the chain.
    pub fn push_many(&mut self, count: i64, spacing: i64, bits: CompactBits) -> usize {
        let (mut height, mut time) = match self.blocks.last() {
            Some(b) => (b.height, b.time),
            None => (-1, 0),
        };
        let mut last = self.blocks.len().saturating_sub(1);
        for _ in 0..count {
            height += 1;
            time += spacing;
            last = self.push(height, time, bits, false);
        }
        last
    }
}

impl ChainView for FixtureChain {
    type Header = usize;

    fn tip(&self) -> Option<usize> {
        if self.blocks.is_empty() {
            None
        } else {
            Some(self.blocks.len() - 1)
        }
    }

    fn prev(&self, header: usize) -> Option<usize> {
        if header == 0 {
            None
        } else {
            Some(header - 1)
        }
    }

    fn height(&self, header: usize) -> i64 {
        self.blocks[header].height
    }

    fn time(&self, header: usize) -> i64 {
        self.blocks[header].time
    }

    fn bits(&self, header: usize) -> CompactBits {
        self.blocks[header].bits
    }

    fn is_proof_of_stake(&self, header: usize) -> bool {
        self.blocks[header].is_pos
    }
}
