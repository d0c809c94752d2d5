//! Mutex-protected sink that collects every worker's [`Dout`] into one
//! sentinel-terminated result stream per accelerator slot.
//!
//! Ported from the source design's `result_pool_t`: a single critical
//! section drains a worker's spilled pages and then its local cache into a
//! shared buffer, capped one short of its capacity so the very last slot is
//! always free for the terminating sentinel. The sentinel write never
//! advances the cursor, so the next `write` call overwrites it in place.

use std::sync::Mutex;

use crate::dout::Dout;
use crate::types::ResultRecord;

struct ResultPoolInner {
    wridx: usize,
    records: Vec<ResultRecord>,
}

/// Shared result sink for one accelerator slot.
pub struct ResultPool {
    inner: Mutex<ResultPoolInner>,
    capacity: usize,
}

/// Per-worker counters a caller accumulates across its `write` calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskletStats {
    pub nb_pages_written: usize,
    pub nb_results_written: usize,
    pub nb_results_dropped: usize,
}

impl ResultPool {
    pub fn new(capacity: usize) -> Self {
        ResultPool {
            inner: Mutex::new(ResultPoolInner {
                wridx: 0,
                records: vec![ResultRecord::SENTINEL; capacity],
            }),
            capacity,
        }
    }

    /// Drain `dout`'s spilled pages and local cache into the pool, then
    /// unconditionally (re)write the sentinel at the current cursor without
    /// advancing it.
    ///
    /// Fills the pool up to `capacity - 1` records; once full, further
    /// records from this call are dropped (counted in `stats`), matching the
    /// source design's `WARNING! too many results in DPU!` non-fatal
    /// overflow path — the pass driver is expected to size `capacity`
    /// generously enough that this never triggers in practice.
    pub fn write(&self, dout: &Dout, stats: &mut TaskletStats) {
        let mut inner = self.inner.lock().unwrap();

        for pageno in 0..dout.nb_page_out() {
            let page = dout.spilled_page(pageno);
            let mut page_written = false;
            for record in page {
                if inner.wridx >= self.capacity - 1 {
                    stats.nb_results_dropped += 1;
                    continue;
                }
                inner.records[inner.wridx] = *record;
                inner.wridx += 1;
                stats.nb_results_written += 1;
                page_written = true;
            }
            if page_written {
                stats.nb_pages_written += 1;
            }
        }

        for record in dout.cached() {
            if inner.wridx >= self.capacity - 1 {
                stats.nb_results_dropped += 1;
                continue;
            }
            inner.records[inner.wridx] = *record;
            inner.wridx += 1;
            stats.nb_results_written += 1;
        }

        let wridx = inner.wridx;
        inner.records[wridx] = ResultRecord::SENTINEL;
    }

    /// Snapshot of the records written so far, sentinel included.
    pub fn snapshot(&self) -> Vec<ResultRecord> {
        let inner = self.inner.lock().unwrap();
        inner.records[..=inner.wridx].to_vec()
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.wridx = 0;
        inner.records.iter_mut().for_each(|r| *r = ResultRecord::SENTINEL);
    }
}
