//! Per-accelerator post-pass: keeps only minimum-score hits per request.
//!
//! Ported from the source design's accumulation pass: each worker's
//! [`Dout`](crate::dout::Dout) is scanned per-request, and only the hits
//! tied for the current minimum score survive. A strictly better score
//! discards everything collected so far for that request by rewinding a
//! local write pointer, rather than filtering after the fact.

use crate::types::ResultRecord;

/// Tracks the running minimum for one request's candidates and emits the
/// surviving hits into `out`.
pub struct Accumulator {
    max_score: i32,
    out: Vec<ResultRecord>,
}

impl Accumulator {
    pub fn new(max_score: i32) -> Self {
        Accumulator {
            max_score,
            out: Vec::new(),
        }
    }

    pub fn results(&self) -> &[ResultRecord] {
        &self.out
    }

    pub fn into_results(self) -> Vec<ResultRecord> {
        self.out
    }

    /// Feed one read's raw candidate hits (`(seq_nr, offset, score)`, in
    /// evaluation order) and append the surviving min-score hits to the
    /// accumulator's output. `offset` is carried through into the surviving
    /// record's `seed_nr` field, the reference position the hit came from.
    pub fn accumulate_request(&mut self, read_id: u32, candidates: impl IntoIterator<Item = (u32, u32, i32)>) {
        let write_start = self.out.len();
        let mut min = self.max_score;

        for (seq_nr, offset, score) in candidates {
            if score > min {
                continue;
            }
            if score < min {
                self.out.truncate(write_start);
                min = score;
            }
            self.out.push(ResultRecord {
                num: read_id,
                score: score as u32,
                seed_nr: offset,
                seq_nr,
            });
        }
    }

    /// Append the terminating sentinel; call once all requests for this
    /// worker have been accumulated.
    pub fn finish(&mut self) {
        self.out.push(ResultRecord::SENTINEL);
    }
}
