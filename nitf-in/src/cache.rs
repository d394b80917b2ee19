//! A small least-recently-used cache for decompressed blocks.
use fnv::FnvHashMap;
use std::collections::VecDeque;

/// (plane, block row, block col) of a block instance within one segment.
pub(crate) type BlockKey = (u32, u32, u32);

/// Keeps the last N decompressed blocks of one segment. A capacity of zero
/// disables caching entirely.
#[derive(Debug)]
pub(crate) struct BlockCache {
    capacity: usize,
    order: VecDeque<BlockKey>,
    blocks: FnvHashMap<BlockKey, Vec<u8>>,
}

impl BlockCache {
    pub(crate) fn new(capacity: usize) -> Self {
        BlockCache {
            capacity,
            order: VecDeque::with_capacity(capacity),
            blocks: FnvHashMap::default(),
        }
    }

    /// Fetch a block, promoting it to most recently used.
    pub(crate) fn get(&mut self, key: BlockKey) -> Option<&Vec<u8>> {
        if !self.blocks.contains_key(&key) {
            return None;
        }
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
        }
        self.order.push_front(key);
        self.blocks.get(&key)
    }

    /// Insert a block, evicting the least recently used one at capacity.
    pub(crate) fn put(&mut self, key: BlockKey, data: Vec<u8>) {
        if self.capacity == 0 {
            return;
        }
        if self.blocks.contains_key(&key) {
            self.blocks.insert(key, data);
            return;
        }
        if self.blocks.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_back() {
                self.blocks.remove(&evicted);
            }
        }
        self.order.push_front(key);
        self.blocks.insert(key, data);
    }
}
