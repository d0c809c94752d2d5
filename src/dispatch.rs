//! Turns a batch of reads into per-slot request vectors.
//!
//! For each read, every seed hit from the [`SeedIndex`] collaborator
//! appends a [`Request`] to the vector for the slot owning that hit's
//! reference partition. A slot's cumulative candidate count is checked
//! against its input-area capacity; overflow is fatal, matching the source
//! design's dispatcher contract (`original_source/host/src/upvc_host.c`'s
//! use of `index_seed_t` to route reads to DPU ranks).

use crate::error::{Result, UpvcError};
use crate::index::SeedIndex;
use crate::types::{Read, Request};

/// Per-slot input-area capacity, in candidate neighbourhoods.
pub struct Dispatcher {
    input_area_capacity: usize,
}

impl Dispatcher {
    pub fn new(input_area_capacity: usize) -> Self {
        Dispatcher { input_area_capacity }
    }

    /// Build one request vector per slot from a batch of reads.
    ///
    /// # Errors
    /// [`UpvcError::CapacityExceeded`] if any slot's request count would
    /// exceed `input_area_capacity`.
    pub fn dispatch(&self, reads: &[Read], index: &dyn SeedIndex) -> Result<Vec<Vec<Request>>> {
        let mut slots: Vec<Vec<Request>> = (0..index.nb_slots()).map(|_| Vec::new()).collect();

        for read in reads {
            let hits = index.seed_hits(read);
            for hit in &hits {
                let slot = &mut slots[hit.slot];
                if slot.len() >= self.input_area_capacity {
                    return Err(UpvcError::CapacityExceeded(format!(
                        "slot {} input area exceeded capacity {}",
                        hit.slot, self.input_area_capacity
                    )));
                }
                slot.push(Request {
                    read_id: read.id,
                    read_symbols: read.symbols.clone(),
                    seq_nr: hit.seq_nr,
                    offset: hit.seq_offset,
                    count: 1,
                });
            }
        }

        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SeedHit;

    struct FixedIndex {
        slots: usize,
        hits_per_read: Vec<SeedHit>,
    }

    impl SeedIndex for FixedIndex {
        fn nb_slots(&self) -> usize {
            self.slots
        }
        fn seed_hits(&self, _read: &Read) -> Vec<SeedHit> {
            self.hits_per_read.clone()
        }
    }

    fn read(id: u32) -> Read {
        Read { id, symbols: vec![0u8; 4] }
    }

    #[test]
    fn each_hit_becomes_a_request_on_its_slot() {
        let index = FixedIndex {
            slots: 2,
            hits_per_read: vec![
                SeedHit { slot: 0, seq_nr: 0, seq_offset: 10 },
                SeedHit { slot: 1, seq_nr: 0, seq_offset: 20 },
            ],
        };
        let dispatcher = Dispatcher::new(100);
        let slots = dispatcher.dispatch(&[read(1)], &index).unwrap();
        assert_eq!(slots[0].len(), 1);
        assert_eq!(slots[1].len(), 1);
        assert_eq!(slots[0][0].offset, 10);
    }

    #[test]
    fn exceeding_capacity_is_an_error() {
        let index = FixedIndex {
            slots: 1,
            hits_per_read: vec![SeedHit { slot: 0, seq_nr: 0, seq_offset: 0 }],
        };
        let dispatcher = Dispatcher::new(1);
        let reads = vec![read(1), read(2)];
        let result = dispatcher.dispatch(&reads, &index);
        assert!(result.is_err());
    }

    #[test]
    fn empty_batch_yields_empty_slots() {
        let index = FixedIndex { slots: 3, hits_per_read: vec![] };
        let dispatcher = Dispatcher::new(10);
        let slots = dispatcher.dispatch(&[], &index).unwrap();
        assert_eq!(slots.len(), 3);
        assert!(slots.iter().all(|s| s.is_empty()));
    }
}
