//! Pass driver: dispatch → execute → accumulate, three rounds.
//!
//! Within one round, a read batch is split into chunks that flow through
//! the three stages on separate threads, each chunk's execute overlapping
//! the previous chunk's accumulate and the next chunk's dispatch — mirroring
//! `original_source/host/src/simu_backend.c`'s `run_dpu_simulation` /
//! `align_on_dpu_fct` four-counting-semaphore handoff
//! (`dispatch_free`, `dispatch_to_exec`, `exec_to_acc`, `acc_wait`), each
//! realized here as a depth-1 `crossbeam_channel::bounded(0)` rendezvous:
//! a send blocks until the other side is ready to receive, which is exactly
//! a counting semaphore's post/wait pair. A read's candidate hits can land
//! on different slots within the same chunk (its seed can match more than
//! one chromosome), so the accumulate stage regroups by read across all
//! slots of a chunk before picking the surviving min-score hits. Reads with
//! no surviving hit in any round are returned to the caller so the next
//! round can retry them at a shallower `delta`
//! (`original_source/host/src/upvc_host.c`'s round-over-round carryover).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::bounded;

use crate::accumulate::Accumulator;
use crate::backend::AcceleratorBackend;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::genome::Genome;
use crate::index::SeedIndex;
use crate::types::{Read, Request, ResultRecord};
use crate::variant_call;
use crate::vartree::VariantStore;

/// Reads per pipeline chunk; bounds how far dispatch can run ahead of
/// execute/accumulate and how much a single `run_pass` call covers.
const CHUNK_READS: usize = 512;

pub struct PassDriver<B: AcceleratorBackend> {
    dispatcher: Dispatcher,
    backend: B,
    genome: Arc<Genome>,
    config: Config,
}

impl<B: AcceleratorBackend + Send> PassDriver<B> {
    pub fn new(genome: Arc<Genome>, config: Config, backend: B) -> Self {
        let dispatcher = Dispatcher::new(config.max_results_per_read);
        PassDriver { dispatcher, backend, genome, config }
    }

    /// Run one round against `reads`, calling every surviving hit into
    /// `store`. Returns the reads with no surviving hit, for the next round.
    pub fn run_round(&mut self, index: &dyn SeedIndex, reads: &[Read], store: &VariantStore, round: usize) -> Result<Vec<Read>> {
        if reads.is_empty() {
            return Ok(Vec::new());
        }

        let chunks: Vec<&[Read]> = reads.chunks(CHUNK_READS.max(1)).collect();

        // dispatch_to_exec: dispatch -> execute, one chunk's per-slot requests.
        let (chunk_tx, chunk_rx) = bounded::<Vec<Vec<Request>>>(0);
        // dispatch_free: execute -> dispatch, chunk consumed, free to build next.
        let (free_tx, free_rx) = bounded::<()>(0);
        // exec_to_acc: execute -> accumulate, one chunk's raw per-slot results.
        let (result_tx, result_rx) = bounded::<Vec<Vec<ResultRecord>>>(0);
        // acc_wait: accumulate -> caller, final read-id set once every chunk lands.
        let (done_tx, done_rx) = bounded::<HashSet<u32>>(0);

        let backend = &mut self.backend;
        let config = &self.config;
        let genome = &self.genome;
        let dispatcher = &self.dispatcher;

        let mut dispatch_err = None;
        let exec_result: Result<HashSet<u32>> = thread::scope(|scope| {
            let execute_handle = scope.spawn(move || -> Result<()> {
                for requests in chunk_rx {
                    backend.init(requests.len())?;
                    for (slot, slot_requests) in requests.iter().enumerate() {
                        backend.load_scratch(slot, slot_requests)?;
                    }
                    free_tx.send(()).ok();
                    backend.set_round(round);
                    backend.run_pass()?;
                    let raw = backend.wait_pass()?;
                    backend.free()?;
                    if result_tx.send(raw).is_err() {
                        break;
                    }
                }
                Ok(())
            });

            let accumulate_handle = scope.spawn(move || {
                let mut mapped_ids: HashSet<u32> = HashSet::new();
                let reads_by_id: HashMap<u32, &Read> = reads.iter().map(|r| (r.id, r)).collect();

                for raw in result_rx {
                    let mut by_read: HashMap<u32, Vec<(u32, u32, i32)>> = HashMap::new();
                    for slot_records in &raw {
                        for record in slot_records {
                            if record.is_sentinel() {
                                continue;
                            }
                            by_read.entry(record.num).or_default().push((record.seq_nr, record.seed_nr, record.score as i32));
                        }
                    }

                    let mut acc = Accumulator::new(config.max_score);
                    for (read_id, candidates) in by_read {
                        acc.accumulate_request(read_id, candidates);
                    }
                    acc.finish();

                    for hit in acc.results() {
                        if hit.is_sentinel() {
                            continue;
                        }
                        mapped_ids.insert(hit.num);
                        if let Some(&read) = reads_by_id.get(&hit.num) {
                            variant_call::call_variants(genome, store, read, config.read_len.as_usize(), hit);
                        }
                    }
                }

                done_tx.send(mapped_ids.clone()).ok();
                mapped_ids
            });

            for chunk in chunks.iter().copied() {
                match dispatcher.dispatch(chunk, index) {
                    Ok(slots) => {
                        if chunk_tx.send(slots).is_err() {
                            break;
                        }
                        // Wait for execute to start on this chunk before
                        // building the next one (dispatch_free handoff).
                        free_rx.recv().ok();
                    }
                    Err(e) => {
                        dispatch_err = Some(e);
                        break;
                    }
                }
            }
            drop(chunk_tx);

            execute_handle.join().expect("execute stage panicked")?;
            let mapped_from_accumulate = accumulate_handle.join().expect("accumulate stage panicked");
            Ok(done_rx.recv().unwrap_or(mapped_from_accumulate))
        });

        if let Some(e) = dispatch_err {
            return Err(e);
        }
        let mapped_ids = exec_result?;

        Ok(reads.iter().filter(|r| !mapped_ids.contains(&r.id)).cloned().collect())
    }
}
