//! End-to-end: synthetic reference + reads through `UpvcContext`, asserting
//! VCF output and that duplicate reads at the same variant are deduplicated
//! into one row rather than two.

use std::io::Write;

use tempfile::{NamedTempFile, TempDir};

use upvc_core::codec;
use upvc_core::config::{Config, ReadLen};
use upvc_core::context::UpvcContext;
use upvc_core::genome::Genome;
use upvc_core::types::Read;

/// Chaotic (non-periodic) bit mixing so an 8bp seed doesn't coincidentally
/// recur elsewhere in the reference, which would otherwise tie-match at
/// multiple offsets and produce spurious duplicate calls.
fn aperiodic_sequence(len: usize) -> String {
    (0..len)
        .map(|i| match (i ^ (i >> 3) ^ (i >> 5) ^ (i >> 7)) & 3 {
            0 => 'A',
            1 => 'C',
            2 => 'G',
            _ => 'T',
        })
        .collect()
}

fn genome_with(seq: &str) -> Genome {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, ">chr1").unwrap();
    writeln!(file, "{seq}").unwrap();
    Genome::from_fasta(file.path()).unwrap()
}

#[test]
fn a_batch_of_identical_mismatched_reads_dedups_to_one_variant_row() {
    let ref_seq = aperiodic_sequence(240);
    let genome = genome_with(&ref_seq);

    let scratch = TempDir::new().unwrap();
    let mut config = Config::default_for_read_len(ReadLen::Bp120);
    config.seed_len = 8;
    config.no_filter = true;
    config.input_prefix = scratch.path().join("upvc").to_str().unwrap().to_string();
    let read_len = config.read_len.as_usize();

    let mut ctx = UpvcContext::new(genome, config);

    let chrom_symbols: Vec<u8> = (0..ctx.genome().chromosome(0).unwrap().len).map(|i| ctx.genome().chromosome(0).unwrap().symbol_at(i)).collect();
    let mut read_symbols = chrom_symbols[0..read_len].to_vec();
    read_symbols[40] ^= 1; // one mismatch, shared by every read below

    // Ten reads, same mismatch, same position: should merge into one row
    // with depth 10, not ten separate rows.
    let reads: Vec<Read> = (0..10).map(|id| Read { id, symbols: codec::pack(&read_symbols) }).collect();

    let unmapped = ctx.run(reads).unwrap();
    assert!(unmapped.is_empty(), "every read should find its seed match");

    let mut out = Vec::new();
    let emitted = ctx.write_vcf(&mut out, "ref.fasta", "20260101").unwrap();
    assert_eq!(emitted, 1, "identical mismatches at the same position must dedup to one VCF row");

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("DEPTH=10"));
}

#[test]
fn reads_with_no_seed_match_stay_unmapped_after_all_rounds() {
    let genome = genome_with(&"A".repeat(200));

    let scratch = TempDir::new().unwrap();
    let mut config = Config::default_for_read_len(ReadLen::Bp120);
    config.seed_len = 8;
    config.input_prefix = scratch.path().join("upvc").to_str().unwrap().to_string();
    let read_len = config.read_len.as_usize();

    let mut ctx = UpvcContext::new(genome, config);
    let read_symbols = codec::pack(&vec![3u8; read_len]); // all "T", absent from the reference
    let reads = vec![Read { id: 0, symbols: read_symbols }];

    let unmapped = ctx.run(reads).unwrap();
    assert_eq!(unmapped.len(), 1);

    let mut out = Vec::new();
    let emitted = ctx.write_vcf(&mut out, "ref.fasta", "20260101").unwrap();
    assert_eq!(emitted, 0);
}
