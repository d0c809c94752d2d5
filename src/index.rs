//! Seed index: maps a read's leading seed to candidate reference positions.
//!
//! `KmerIndex` follows a binary-search-over-sorted-buckets shape (`HashMap`
//! keyed by a grouping key, values sorted for deterministic iteration),
//! specialised here to 2-bit k-mers packed into a `u64` rather than
//! genomic intervals.

use std::collections::HashMap;

use crate::genome::Genome;
use crate::types::Read;

/// One seed hit: the reference slot and coordinate a candidate neighbourhood
/// should be pulled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHit {
    pub slot: usize,
    pub seq_nr: u32,
    pub seq_offset: u32,
}

/// Collaborator the dispatcher consumes to turn a read into seed hits.
pub trait SeedIndex {
    fn nb_slots(&self) -> usize;
    fn seed_hits(&self, read: &Read) -> Vec<SeedHit>;
}

/// Packs the first `seed_len` symbols of a packed sequence into a `u64` key.
fn seed_key(symbols: &[u8], seed_len: usize) -> Option<u64> {
    if symbols.len() < seed_len {
        return None;
    }
    let mut key = 0u64;
    for i in 0..seed_len {
        let symbol = crate::codec::nt_at(symbols, i) as u64;
        key = (key << 2) | symbol;
    }
    Some(key)
}

/// In-memory seed table built by scanning every position of the reference
/// genome for its leading `seed_len`-symbol k-mer.
pub struct KmerIndex {
    seed_len: usize,
    nb_slots: usize,
    table: HashMap<u64, Vec<(u32, u32)>>,
}

impl KmerIndex {
    /// Build the index by sliding a `seed_len`-wide window over every
    /// chromosome. Each chromosome is assigned to accelerator slots by
    /// `seq_nr % nb_slots`, mirroring the original design's static
    /// reference partitioning across DPU ranks.
    pub fn build(genome: &Genome, seed_len: usize, nb_slots: usize) -> Self {
        let nb_slots = nb_slots.max(1);
        let mut table: HashMap<u64, Vec<(u32, u32)>> = HashMap::new();

        for (seq_nr, chrom) in genome.iter().enumerate() {
            if chrom.len < seed_len {
                continue;
            }
            for offset in 0..=(chrom.len - seed_len) {
                let mut key = 0u64;
                for i in 0..seed_len {
                    key = (key << 2) | (chrom.symbol_at(offset + i) as u64);
                }
                table.entry(key).or_default().push((seq_nr as u32, offset as u32));
            }
        }

        for hits in table.values_mut() {
            hits.sort_unstable();
        }

        KmerIndex { seed_len, nb_slots, table }
    }

    pub fn seed_len(&self) -> usize {
        self.seed_len
    }
}

impl SeedIndex for KmerIndex {
    fn nb_slots(&self) -> usize {
        self.nb_slots
    }

    fn seed_hits(&self, read: &Read) -> Vec<SeedHit> {
        let Some(key) = seed_key(&read.symbols, self.seed_len) else {
            return Vec::new();
        };
        match self.table.get(&key) {
            Some(hits) => hits
                .iter()
                .map(|&(seq_nr, seq_offset)| SeedHit {
                    slot: seq_nr as usize % self.nb_slots,
                    seq_nr,
                    seq_offset,
                })
                .collect(),
            None => Vec::new(),
        }
    }
}
