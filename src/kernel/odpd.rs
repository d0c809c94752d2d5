//! Banded affine-gap dynamic-programming aligner (Gotoh recurrence).
//!
//! Three matrices `D` (match/mismatch), `P` (gap in s2), `Q` (gap in s1) are
//! computed over a band of half-width `diagonal` around the main diagonal
//! of an `(m+1) x (m+1)` matrix. Only two rows of each matrix are ever live
//! (`cur`/`prev` alternation), and cells outside the band stay at
//! [`PQD_INIT_VAL`]. After each row the running minimum across the band is
//! compared against `max_score`; once it exceeds the bound the function
//! returns early, mirroring [`super::nodp::no_dp`]'s early exit.

use crate::codec::SymbolView;

/// Sentinel for cells outside the band (large but representable in `i32`
/// arithmetic without overflow risk for realistic read lengths).
pub const PQD_INIT_VAL: i32 = 999;

/// Ceiling on neighbourhood length `M` supported by the fixed-size row
/// buffers. Matches the largest realistic `(read_len - seed_len) / 4`
/// for the read lengths this crate supports (120, 150).
const MAX_ODPD_WIDTH: usize = 160;

/// One row of the three matrices, indexed by absolute column `0..=m`.
#[derive(Clone, Copy)]
struct Row {
    d: [i32; MAX_ODPD_WIDTH + 1],
    p: [i32; MAX_ODPD_WIDTH + 1],
    q: [i32; MAX_ODPD_WIDTH + 1],
}

impl Row {
    fn filled() -> Self {
        Row {
            d: [PQD_INIT_VAL; MAX_ODPD_WIDTH + 1],
            p: [PQD_INIT_VAL; MAX_ODPD_WIDTH + 1],
            q: [PQD_INIT_VAL; MAX_ODPD_WIDTH + 1],
        }
    }
}

/// Minimum edit cost between `s1` and `s2` within a band of half-width
/// `diagonal = nb_diag / 2 + 1` around the main diagonal of an
/// `(m+1) x (m+1)` matrix, where `m` is the shared symbol length.
///
/// Returns early with the row's running minimum once it exceeds
/// `max_score`; the caller must discard such a result rather than treat it
/// as an exact distance.
#[allow(clippy::too_many_arguments)]
pub fn odpd(
    s1: &SymbolView,
    s2: &SymbolView,
    max_score: i32,
    m: usize,
    nb_diag: usize,
    cost_sub: i32,
    cost_gapo: i32,
    cost_gape: i32,
) -> i32 {
    assert!(m <= MAX_ODPD_WIDTH, "neighbourhood length exceeds ODPD row capacity");
    let diagonal = nb_diag / 2 + 1;

    // Row 0: D[0][j] = j * cost_sub within the band, PQD_INIT_VAL outside.
    // Valid columns for row i are i - diagonal < j < i + diagonal, so row 0's
    // upper bound is diagonal - 1, strictly excluding diagonal itself.
    let row0_hi = diagonal.saturating_sub(1).min(m);
    let mut prev = Row::filled();
    for j in 0..=row0_hi {
        prev.d[j] = j as i32 * cost_sub;
    }

    if m == 0 {
        return 0;
    }

    let mut min_score = prev.d[0..=row0_hi].iter().copied().min().unwrap_or(PQD_INIT_VAL);

    for i in 1..=m {
        let mut cur = Row::filled();
        let col_lo = (i + 1).saturating_sub(diagonal);
        let col_hi = (i + diagonal).saturating_sub(1).min(m);

        if col_lo == 0 {
            cur.d[0] = i as i32 * cost_sub;
        }

        let mut row_min = PQD_INIT_VAL;
        for j in col_lo.max(1)..=col_hi {
            let p = (cur.d[j - 1] + cost_gapo).min(cur.p[j - 1] + cost_gape);
            let q = (prev.d[j] + cost_gapo).min(prev.q[j] + cost_gape);

            let mut d = prev.d[j - 1];
            if s1.at(i - 1) != s2.at(j - 1) {
                d += cost_sub;
            }
            let d = d.min(p).min(q);

            cur.p[j] = p;
            cur.q[j] = q;
            cur.d[j] = d;
            row_min = row_min.min(d);
        }
        if col_lo == 0 {
            row_min = row_min.min(cur.d[0]);
        }

        min_score = row_min;
        if min_score > max_score {
            return min_score;
        }

        prev = cur;
    }

    prev.d[(m + 1).saturating_sub(diagonal)..=m]
        .iter()
        .copied()
        .min()
        .unwrap_or(min_score)
}
