//! Top-level run context: owns the state that must outlive every round and
//! pass — the variant store and the reference's coverage track — per the
//! source design's note that cyclic/global state collapses to one
//! explicitly-owned context created at startup and torn down after VCF
//! emission.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use std::time::Instant;

use crate::backend::simulated::SimulatedBackend;
use crate::codec;
use crate::config::Config;
use crate::error::Result;
use crate::genome::{symbol_to_nt, Genome};
use crate::index::KmerIndex;
use crate::pass::PassDriver;
use crate::types::Read;
use crate::vartree::VariantStore;
use crate::vcf::VcfWriter;

/// Number of seed-and-retry rounds; `delta` widens each round per
/// `Config::delta_for_round`.
const NB_ROUNDS: usize = 3;

/// Write one round's unmapped reads as two FASTA files, split by which
/// mate they came from (`reads.rs` numbers each pair `mate1, rc1, mate2,
/// rc2`, so `id % 4 < 2` is mate1's pair), matching the
/// `<prefix>_<round>_PE{1,2}.fasta` naming the source design retries from
/// in the next round.
fn write_unmapped_fasta(prefix: &str, round: usize, reads: &[Read], read_len: usize) -> Result<()> {
    let mut pe1 = BufWriter::new(File::create(format!("{prefix}_{round}_PE1.fasta"))?);
    let mut pe2 = BufWriter::new(File::create(format!("{prefix}_{round}_PE2.fasta"))?);

    for read in reads {
        let writer = if read.id % 4 < 2 { &mut pe1 } else { &mut pe2 };
        let symbols = codec::unpack(&read.symbols, read_len);
        let bases: String = symbols.iter().map(|&s| symbol_to_nt(s) as char).collect();
        writeln!(writer, ">{}", read.id)?;
        writeln!(writer, "{bases}")?;
    }

    pe1.flush()?;
    pe2.flush()?;
    Ok(())
}

/// Append one round's timing row to `<prefix>_<round>_time.csv`.
fn write_round_timing(prefix: &str, round: usize, nb_in: usize, nb_unmapped: usize, elapsed_ms: u128) -> Result<()> {
    let mut file = BufWriter::new(File::create(format!("{prefix}_{round}_time.csv"))?);
    writeln!(file, "round,nb_reads_in,nb_mapped,nb_unmapped,elapsed_ms")?;
    writeln!(file, "{round},{nb_in},{},{nb_unmapped},{elapsed_ms}", nb_in - nb_unmapped)?;
    file.flush()?;
    Ok(())
}

pub struct UpvcContext {
    genome: Arc<Genome>,
    config: Config,
    store: VariantStore,
    index: KmerIndex,
}

impl UpvcContext {
    pub fn new(genome: Genome, config: Config) -> Self {
        let genome = Arc::new(genome);
        let index = KmerIndex::build(&genome, config.seed_len, config.nb_dpu);
        let store = VariantStore::new(genome.len());
        UpvcContext { genome, config, store, index }
    }

    /// Run all rounds against the initial read batch, returning the reads
    /// still unmapped after the last round.
    pub fn run(&mut self, reads: Vec<Read>) -> Result<Vec<Read>> {
        let mut pending = reads;

        for round in 0..NB_ROUNDS {
            if pending.is_empty() {
                break;
            }
            let nb_in = pending.len();
            let started = Instant::now();

            let backend = SimulatedBackend::new(Arc::clone(&self.genome), self.config.clone());
            let mut driver = PassDriver::new(Arc::clone(&self.genome), self.config.clone(), backend);
            pending = driver.run_round(&self.index, &pending, &self.store, round)?;

            write_unmapped_fasta(&self.config.input_prefix, round, &pending, self.config.read_len.as_usize())?;
            write_round_timing(&self.config.input_prefix, round, nb_in, pending.len(), started.elapsed().as_millis())?;
        }

        Ok(pending)
    }

    /// Emit the accumulated variant store as a VCF to `output`.
    pub fn write_vcf<W: Write>(&self, output: W, reference_name: &str, file_date: &str) -> Result<usize> {
        let mut writer = VcfWriter::new(output);
        writer.write_header(reference_name, file_date)?;
        let emitted = writer.write_body_rows(&self.store, &self.genome, self.config.read_len, self.config.no_filter)?;
        writer.flush()?;
        Ok(emitted)
    }

    pub fn store(&self) -> &VariantStore {
        &self.store
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::config::ReadLen;
    use std::io::Write as _;
    use tempfile::{NamedTempFile, TempDir};

    fn genome_with(seq: &str) -> Genome {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ">chr1").unwrap();
        writeln!(file, "{seq}").unwrap();
        Genome::from_fasta(file.path()).unwrap()
    }

    /// Keeps each test's round output (unmapped FASTA, timing CSV) inside
    /// its own scratch directory instead of littering the crate root.
    fn scratch_prefix(dir: &TempDir) -> String {
        dir.path().join("upvc").to_str().unwrap().to_string()
    }

    #[test]
    fn running_with_no_reads_leaves_the_store_empty() {
        let genome = genome_with(&"ACGT".repeat(40));
        let scratch = TempDir::new().unwrap();
        let mut config = Config::default_for_read_len(ReadLen::Bp120);
        config.seed_len = 8;
        config.input_prefix = scratch_prefix(&scratch);
        let mut ctx = UpvcContext::new(genome, config);

        let unmapped = ctx.run(Vec::new()).unwrap();
        assert!(unmapped.is_empty());

        let mut out = Vec::new();
        let emitted = ctx.write_vcf(&mut out, "ref.fasta", "20260101").unwrap();
        assert_eq!(emitted, 0);
    }

    /// Chaotic (non-periodic) bit mixing, so an 8bp seed window doesn't
    /// coincidentally recur elsewhere in a 120bp stretch the way a simple
    /// repeating motif like "ACGT" would — the test below needs the read's
    /// seed to match at exactly one reference position.
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

    #[test]
    fn a_mapped_read_with_one_mismatch_produces_a_vcf_row_after_enough_depth() {
        let ref_seq = aperiodic_sequence(240);
        let genome = genome_with(&ref_seq);
        let scratch = TempDir::new().unwrap();
        let mut config = Config::default_for_read_len(ReadLen::Bp120);
        config.seed_len = 8;
        config.no_filter = true; // bypass empirical thresholds to keep this test focused on wiring
        config.input_prefix = scratch_prefix(&scratch);
        let read_len = config.read_len.as_usize();

        let mut ctx = UpvcContext::new(genome, config.clone());
        let chrom_symbols: Vec<u8> = (0..ctx.genome().chromosome(0).unwrap().len).map(|i| ctx.genome().chromosome(0).unwrap().symbol_at(i)).collect();
        let mut read_symbols = chrom_symbols[0..read_len].to_vec();
        read_symbols[20] ^= 1; // flip one base to a mismatch, staying in 0..=3

        let reads = vec![Read { id: 0, symbols: codec::pack(&read_symbols) }];
        let unmapped = ctx.run(reads).unwrap();
        assert!(unmapped.is_empty());

        let mut out = Vec::new();
        let emitted = ctx.write_vcf(&mut out, "ref.fasta", "20260101").unwrap();
        assert_eq!(emitted, 1);
    }
}
