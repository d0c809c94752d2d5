//! Translates one surviving alignment hit into variant calls against the
//! reference, recording per-base coverage along the way.
//!
//! A winning [`ResultRecord`] only carries a score, not an alignment trace,
//! so this walks the read's full length against the reference window it
//! aligned to and calls a substitution wherever the two symbols disagree.
//! Reads resolved through the ODPD fallback (an INDEL signal from NoDP) are
//! walked the same way: without the DP traceback, the exact gap position
//! isn't recoverable here, so a run of disagreement downstream of the true
//! indel shows up as consecutive substitution calls rather than one indel
//! allele. A full traceback-based indel caller is out of scope for this
//! crate (see DESIGN.md).

use crate::codec;
use crate::genome::{symbol_to_nt, Genome};
use crate::types::{Read, ResultRecord};
use crate::vartree::VariantStore;

/// `hit.seed_nr` is the reference offset the read's first symbol aligned to
/// (the seed hit position the read was dispatched against); `hit.seq_nr`
/// names the chromosome.
pub fn call_variants(genome: &Genome, store: &VariantStore, read: &Read, read_len: usize, hit: &ResultRecord) {
    let seq_nr = hit.seq_nr as usize;
    let Some(chrom) = genome.chromosome(seq_nr) else { return };

    let offset = hit.seed_nr as usize;
    let read_symbols = codec::unpack(&read.symbols, read_len);

    for (i, &read_symbol) in read_symbols.iter().enumerate() {
        let pos = offset + i;
        if pos >= chrom.len {
            break;
        }
        chrom.record_coverage(pos);

        let ref_symbol = chrom.symbol_at(pos);
        if ref_symbol != read_symbol {
            let reference = (symbol_to_nt(ref_symbol) as char).to_string();
            let alt = (symbol_to_nt(read_symbol) as char).to_string();
            store.insert(seq_nr, pos as u64, &reference, &alt, hit.score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn genome_with(seq: &str) -> Genome {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ">chr1").unwrap();
        writeln!(file, "{seq}").unwrap();
        Genome::from_fasta(file.path()).unwrap()
    }

    #[test]
    fn perfect_match_records_coverage_without_variants() {
        let genome = genome_with("ACGTACGT");
        let store = VariantStore::new(1);
        let read_symbols = codec::pack(&[0, 1, 2, 3]); // "ACGT"
        let read = Read { id: 1, symbols: read_symbols };
        let hit = ResultRecord { num: 1, score: 0, seed_nr: 0, seq_nr: 0 };

        call_variants(&genome, &store, &read, 4, &hit);

        assert!(store.positions(0).is_empty());
        assert_eq!(genome.chromosome(0).unwrap().coverage_at(0), 1);
    }

    #[test]
    fn single_mismatch_calls_one_substitution() {
        let genome = genome_with("ACGTACGT");
        let store = VariantStore::new(1);
        // "AGGT" mismatches at index 1 (ref C, read G).
        let read_symbols = codec::pack(&[0, 3, 2, 3]);
        let read = Read { id: 1, symbols: read_symbols };
        let hit = ResultRecord { num: 1, score: 10, seed_nr: 0, seq_nr: 0 };

        call_variants(&genome, &store, &read, 4, &hit);

        let variants = store.variants_at(0, 1);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].reference, "C");
        assert_eq!(variants[0].alt, "G");
    }

    #[test]
    fn out_of_range_offset_is_a_no_op() {
        let genome = genome_with("ACGT");
        let store = VariantStore::new(1);
        let read_symbols = codec::pack(&[0, 1, 2, 3]);
        let read = Read { id: 1, symbols: read_symbols };
        let hit = ResultRecord { num: 1, score: 0, seed_nr: 100, seq_nr: 0 };

        call_variants(&genome, &store, &read, 4, &hit);
        assert!(store.positions(0).is_empty());
    }
}
