//! Transposition table
//!
//! - `TTEntry`: two atomics, the key stored XORed with the data word so a
//!   torn write from another thread fails the key check instead of
//!   returning mixed data
//! - `TranspositionTable`: flat array shared by all search threads
//!
//! Data word layout (low to high):
//! move(16) | value(16) | eval(16) | depth(8) | bound(2) | generation(6)

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use crate::types::{Bound, Move, Value};

const GENERATION_MASK: u8 = 0x3f;

/// Lookup result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTData {
    pub mv: Option<Move>,
    pub value: Value,
    pub eval: Value,
    pub depth: i32,
    pub bound: Bound,
}

#[derive(Default)]
struct TTEntry {
    key: AtomicU64,
    data: AtomicU64,
}

fn pack(data: &TTData, generation: u8) -> u64 {
    let mv = data.mv.map_or(0, Move::to_u16) as u64;
    let value = data.value.raw() as i16 as u16 as u64;
    let eval = data.eval.raw() as i16 as u16 as u64;
    let depth = data.depth.clamp(0, 255) as u64;
    let meta = (data.bound as u64) | (u64::from(generation & GENERATION_MASK) << 2);
    mv | value << 16 | eval << 32 | depth << 48 | meta << 56
}

fn unpack(word: u64) -> (TTData, u8) {
    let data = TTData {
        mv: Move::from_u16(word as u16),
        value: Value::new(i32::from((word >> 16) as u16 as i16)),
        eval: Value::new(i32::from((word >> 32) as u16 as i16)),
        depth: ((word >> 48) & 0xff) as i32,
        bound: Bound::from_bits((word >> 56) as u8),
    };
    (data, (word >> 58) as u8 & GENERATION_MASK)
}

/// Shared hash table
pub struct TranspositionTable {
    entries: Box<[TTEntry]>,
    generation: AtomicU8,
}

impl TranspositionTable {
    /// Create a table of `mb_size` megabytes (at least one entry)
    pub fn new(mb_size: usize) -> Self {
        let count = (mb_size * 1024 * 1024 / std::mem::size_of::<TTEntry>()).max(1);
        let entries = (0..count).map(|_| TTEntry::default()).collect();
        log::debug!("transposition table: {mb_size} MB, {count} entries");
        Self {
            entries,
            generation: AtomicU8::new(0),
        }
    }

    /// Reallocate to `mb_size` megabytes; contents are lost
    pub fn resize(&mut self, mb_size: usize) {
        let count = (mb_size * 1024 * 1024 / std::mem::size_of::<TTEntry>()).max(1);
        if count != self.entries.len() {
            *self = Self::new(mb_size);
        } else {
            self.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wipe every entry. Only call while no search is running.
    pub fn clear(&self) {
        for e in self.entries.iter() {
            e.key.store(0, Ordering::Relaxed);
            e.data.store(0, Ordering::Relaxed);
        }
        self.generation.store(0, Ordering::Relaxed);
    }

    /// Age existing entries; called at the start of every search
    pub fn new_search(&self) {
        let g = self.generation.load(Ordering::Relaxed);
        self.generation.store(g.wrapping_add(1) & GENERATION_MASK, Ordering::Relaxed);
    }

    #[inline]
    fn slot(&self, key: u64) -> &TTEntry {
        let idx = ((u128::from(key) * self.entries.len() as u128) >> 64) as usize;
        &self.entries[idx]
    }

    pub fn probe(&self, key: u64) -> Option<TTData> {
        let e = self.slot(key);
        let data = e.data.load(Ordering::Relaxed);
        let stored = e.key.load(Ordering::Relaxed);
        if data == 0 || stored ^ data != key {
            return None;
        }
        Some(unpack(data).0)
    }

    /// Store, replacing the current occupant unless it is a deeper result of
    /// this same search for a different key
    pub fn store(&self, key: u64, data: TTData) {
        let e = self.slot(key);
        let generation = self.generation.load(Ordering::Relaxed);
        let old = e.data.load(Ordering::Relaxed);
        let old_key = e.key.load(Ordering::Relaxed) ^ old;

        let mut data = data;
        if old != 0 {
            let (prev, prev_gen) = unpack(old);
            if old_key == key {
                // Keep the known best move when the new result has none
                if data.mv.is_none() {
                    data.mv = prev.mv;
                }
            } else if prev_gen == generation
                && prev.depth > data.depth + 2
                && data.bound != Bound::Exact
            {
                return;
            }
        }

        let word = pack(&data, generation);
        e.data.store(word, Ordering::Relaxed);
        e.key.store(key ^ word, Ordering::Relaxed);
    }

    /// Permille of the first 1000 entries written during the current search
    pub fn hashfull(&self) -> u32 {
        let generation = self.generation.load(Ordering::Relaxed);
        let sample = self.entries.len().min(1000);
        let used = self.entries[..sample]
            .iter()
            .filter(|e| {
                let word = e.data.load(Ordering::Relaxed);
                word != 0 && unpack(word).1 == generation
            })
            .count();
        (used * 1000 / sample.max(1)) as u32
    }
}

/// Mate scores are stored relative to the probing node, not the root
pub fn value_to_tt(v: Value, ply: i32) -> Value {
    if v.is_win() {
        v + ply
    } else if v.is_loss() {
        v - ply
    } else {
        v
    }
}

pub fn value_from_tt(v: Value, ply: i32) -> Value {
    if v.is_win() {
        v - ply
    } else if v.is_loss() {
        v + ply
    } else {
        v
    }
}
