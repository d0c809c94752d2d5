//! Per-worker bounded output buffer with overflow into a private spill area.
//!
//! Ported from the source design's `dout_t`: a small local cache is filled
//! first; once it's full, the cache is copied wholesale into the next page
//! of the worker's private spill area and the cache restarts from empty.
//! [`ResultPool::write`](crate::result_pool::ResultPool::write) later reads
//! back both the spilled pages and the final partial cache.

use crate::error::{Result, UpvcError};
use crate::types::ResultRecord;

/// Results held in the local cache before a page is spilled.
pub const MAX_LOCAL_RESULTS_PER_READ: usize = 8;
/// Total results a worker may produce for one read, cache + spill combined.
pub const MAX_RESULTS_PER_READ: usize = 256;

/// Per-worker output buffer.
pub struct Dout {
    worker_id: usize,
    cache: [ResultRecord; MAX_LOCAL_RESULTS_PER_READ],
    nb_cached_out: usize,
    nb_page_out: usize,
    nb_results: usize,
    /// Stand-in for the worker's private MRAM swap region.
    spill: Vec<ResultRecord>,
}

impl Dout {
    pub fn init(worker_id: usize) -> Self {
        let mut dout = Dout {
            worker_id,
            cache: [ResultRecord::SENTINEL; MAX_LOCAL_RESULTS_PER_READ],
            nb_cached_out: 0,
            nb_page_out: 0,
            nb_results: 0,
            spill: Vec::with_capacity(MAX_RESULTS_PER_READ),
        };
        dout.clear();
        dout
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    pub fn clear(&mut self) {
        self.nb_cached_out = 0;
        self.nb_page_out = 0;
        self.nb_results = 0;
        self.spill.clear();
    }

    pub fn nb_results(&self) -> usize {
        self.nb_results
    }

    pub fn nb_page_out(&self) -> usize {
        self.nb_page_out
    }

    pub fn nb_cached_out(&self) -> usize {
        self.nb_cached_out
    }

    /// Cached records not yet spilled, for [`ResultPool::write`] to drain.
    pub fn cached(&self) -> &[ResultRecord] {
        &self.cache[..self.nb_cached_out]
    }

    /// Spilled pages, `MAX_LOCAL_RESULTS_PER_READ` records each, for
    /// [`ResultPool::write`] to drain ahead of the cache.
    pub fn spilled_page(&self, pageno: usize) -> &[ResultRecord] {
        let start = pageno * MAX_LOCAL_RESULTS_PER_READ;
        &self.spill[start..start + MAX_LOCAL_RESULTS_PER_READ]
    }

    /// Append one result, spilling the cache to the private swap area first
    /// if it's full.
    ///
    /// # Errors
    /// [`UpvcError::CapacityExceeded`] if the spill area itself would
    /// overflow `MAX_RESULTS_PER_READ`; this should never happen in
    /// practice and signals a dispatcher or filter bug upstream.
    pub fn add(&mut self, num: u32, score: u32, seed_nr: u32, seq_nr: u32) -> Result<()> {
        if self.nb_cached_out == MAX_LOCAL_RESULTS_PER_READ {
            if (self.nb_page_out + 1) * MAX_LOCAL_RESULTS_PER_READ > MAX_RESULTS_PER_READ {
                return Err(UpvcError::CapacityExceeded(format!(
                    "worker {}: too many swapped pages for one read",
                    self.worker_id
                )));
            }
            self.spill.extend_from_slice(&self.cache);
            self.nb_cached_out = 0;
            self.nb_page_out += 1;
        }

        self.cache[self.nb_cached_out] = ResultRecord {
            num,
            score,
            seed_nr,
            seq_nr,
        };
        self.nb_cached_out += 1;
        self.nb_results += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_dout_has_no_results() {
        let dout = Dout::init(0);
        assert_eq!(dout.nb_results(), 0);
        assert_eq!(dout.nb_page_out(), 0);
    }

    #[test]
    fn cache_fills_before_spilling() {
        let mut dout = Dout::init(0);
        for i in 0..MAX_LOCAL_RESULTS_PER_READ {
            dout.add(i as u32, 0, 0, 0).unwrap();
        }
        assert_eq!(dout.nb_page_out(), 0);
        assert_eq!(dout.nb_cached_out(), MAX_LOCAL_RESULTS_PER_READ);
    }

    #[test]
    fn exceeding_cache_spills_a_page_and_resets_cache() {
        let mut dout = Dout::init(0);
        for i in 0..MAX_LOCAL_RESULTS_PER_READ + 1 {
            dout.add(i as u32, 0, 0, 0).unwrap();
        }
        assert_eq!(dout.nb_page_out(), 1);
        assert_eq!(dout.nb_cached_out(), 1);
        assert_eq!(dout.nb_results(), MAX_LOCAL_RESULTS_PER_READ + 1);

        let page = dout.spilled_page(0);
        assert_eq!(page.len(), MAX_LOCAL_RESULTS_PER_READ);
        assert_eq!(page[0].num, 0);
    }

    #[test]
    fn clear_resets_all_counters() {
        let mut dout = Dout::init(0);
        dout.add(1, 2, 3, 4).unwrap();
        dout.clear();
        assert_eq!(dout.nb_results(), 0);
        assert_eq!(dout.nb_cached_out(), 0);
        assert!(dout.cached().is_empty());
    }

    #[test]
    fn overflowing_spill_area_is_a_capacity_error() {
        let mut dout = Dout::init(0);
        // One page beyond MAX_RESULTS_PER_READ / MAX_LOCAL_RESULTS_PER_READ
        // still succeeds (the spill area allows exactly that many pages);
        // the page after that must be rejected.
        let total_pages = MAX_RESULTS_PER_READ / MAX_LOCAL_RESULTS_PER_READ;
        for _ in 0..(total_pages + 1) * MAX_LOCAL_RESULTS_PER_READ {
            dout.add(0, 0, 0, 0).unwrap();
        }
        let err = dout.add(0, 0, 0, 0);
        assert!(err.is_err());
    }
}
