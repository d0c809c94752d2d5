//! Variant emitter: empirical filters and VCF output.
//!
//! Ported from the source design's `print_variant_tree`/`create_vcf`:
//! homopolymer suppression first, then (unless [`crate::config::no_filter`]
//! is set) a depth/score/percentage lookup table keyed by variant class and
//! clamped depth, both tables carried over verbatim for `SIZE_READ` 120 and
//! 150. Writing uses a buffered writer plus `itoa` for integer formatting,
//! avoiding a `format!`/`write!` allocation per field.

use std::io::{BufWriter, Write};

use crate::config::ReadLen;
use crate::error::Result;
use crate::genome::Genome;
use crate::vartree::VariantStore;

/// One (percentage, score) threshold pair keyed by clamped depth.
#[derive(Clone, Copy)]
struct DepthFilter {
    percentage: u32,
    score: u32,
}

#[rustfmt::skip]
const SUB_FILTER_120: [DepthFilter; 21] = build_sub_filter_120();
#[rustfmt::skip]
const INDEL_FILTER_120: [DepthFilter; 12] = build_indel_filter_120();
#[rustfmt::skip]
const SUB_FILTER_150: [DepthFilter; 21] = build_sub_filter_150();
#[rustfmt::skip]
const INDEL_FILTER_150: [DepthFilter; 12] = build_indel_filter_150();

const fn df(percentage: u32, score: u32) -> DepthFilter {
    DepthFilter { percentage, score }
}

const fn build_sub_filter_120() -> [DepthFilter; 21] {
    let mut table = [df(0, 0); 21];
    table[3] = df(15, 16);
    table[4] = df(17, 17);
    table[5] = df(18, 18);
    table[6] = df(20, 18);
    table[7] = df(21, 20);
    table[8] = df(22, 21);
    table[9] = df(22, 21);
    table[10] = df(24, 21);
    table[11] = df(24, 21);
    table[12] = df(28, 21);
    table[13] = df(29, 22);
    table[14] = df(29, 23);
    table[15] = df(32, 24);
    table[16] = df(32, 25);
    table[17] = df(35, 25);
    table[18] = df(35, 25);
    table[19] = df(35, 25);
    table[20] = df(40, 25);
    table
}

const fn build_indel_filter_120() -> [DepthFilter; 12] {
    let mut table = [df(0, 0); 12];
    table[2] = df(10, 16);
    table[3] = df(12, 21);
    table[4] = df(13, 21);
    table[5] = df(14, 22);
    table[6] = df(14, 22);
    table[7] = df(1, 23);
    table[8] = df(1, 25);
    table[9] = df(1, 25);
    table[10] = df(1, 30);
    table[11] = df(1, 40);
    table
}

const fn build_sub_filter_150() -> [DepthFilter; 21] {
    let mut table = [df(0, 0); 21];
    table[3] = df(15, 16);
    table[4] = df(17, 20);
    table[5] = df(18, 20);
    table[6] = df(20, 21);
    table[7] = df(21, 21);
    table[8] = df(22, 21);
    table[9] = df(24, 22);
    table[10] = df(25, 23);
    table[11] = df(27, 23);
    table[12] = df(27, 25);
    table[13] = df(29, 25);
    table[14] = df(30, 27);
    table[15] = df(31, 27);
    table[16] = df(34, 27);
    table[17] = df(34, 27);
    table[18] = df(34, 29);
    table[19] = df(35, 29);
    table[20] = df(40, 29);
    table
}

const fn build_indel_filter_150() -> [DepthFilter; 12] {
    let mut table = [df(0, 0); 12];
    table[2] = df(9, 21);
    table[3] = df(12, 22);
    table[4] = df(12, 22);
    table[5] = df(13, 24);
    table[6] = df(15, 25);
    table[7] = df(17, 25);
    table[8] = df(18, 25);
    table[9] = df(2, 26);
    table[10] = df(1, 27);
    table[11] = df(1, 40);
    table
}

fn sub_filter(read_len: ReadLen) -> &'static [DepthFilter] {
    match read_len {
        ReadLen::Bp120 => &SUB_FILTER_120,
        ReadLen::Bp150 => &SUB_FILTER_150,
    }
}

fn indel_filter(read_len: ReadLen) -> &'static [DepthFilter] {
    match read_len {
        ReadLen::Bp120 => &INDEL_FILTER_120,
        ReadLen::Bp150 => &INDEL_FILTER_150,
    }
}

/// True if the `offset` preceding bases (inclusive of `genome_pos - offset`)
/// are all identical, i.e. the variant sits inside a homopolymer run.
fn is_homopolymer(chrom_symbols: &[u8], genome_pos: usize, offset: usize) -> bool {
    if genome_pos < offset {
        return false;
    }
    let start = genome_pos - offset;
    (0..offset.saturating_sub(1)).all(|i| chrom_symbols[start + i] == chrom_symbols[start + i + 1])
}

/// Decides whether one variant at a given position passes the empirical
/// filters, and if so, returns the per-read score to report.
fn passes_filters(
    reference: &str,
    alt: &str,
    depth: u32,
    score_sum: u64,
    coverage: u32,
    read_len: ReadLen,
    no_filter: bool,
) -> Option<u32> {
    let score = (score_sum / depth.max(1) as u64) as u32;
    let percentage = if coverage == 0 { 100 } else { depth * 100 / coverage };

    if no_filter {
        return Some(score);
    }

    if reference.len() == alt.len() {
        if depth < 3 {
            return None;
        }
        let clamped = depth.min(20) as usize;
        let filter = sub_filter(read_len)[clamped];
        if score <= filter.score && percentage >= filter.percentage {
            Some(score)
        } else {
            None
        }
    } else {
        if depth < 2 {
            return None;
        }
        let clamped = depth.min(11) as usize;
        let filter = indel_filter(read_len)[clamped];
        if score <= filter.score && percentage >= filter.percentage {
            Some(score)
        } else {
            None
        }
    }
}

/// Streaming VCF writer: a minimal header plus filtered body rows.
pub struct VcfWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
}

impl<W: Write> VcfWriter<W> {
    pub fn new(output: W) -> Self {
        VcfWriter {
            writer: BufWriter::new(output),
            itoa_buf: itoa::Buffer::new(),
        }
    }

    pub fn write_header(&mut self, reference_name: &str, file_date: &str) -> Result<()> {
        writeln!(self.writer, "##fileformat=VCFv4.3")?;
        writeln!(self.writer, "##source=upvc-rs {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(self.writer, "##fileDate={file_date}")?;
        writeln!(self.writer, "##reference={reference_name}")?;
        writeln!(self.writer, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO")?;
        Ok(())
    }

    /// Apply homopolymer suppression and the empirical filters to every
    /// variant in `store`, writing the survivors as VCF body rows in
    /// ascending chromosome/position order. Returns the number emitted.
    pub fn write_body_rows(&mut self, store: &VariantStore, genome: &Genome, read_len: ReadLen, no_filter: bool) -> Result<usize> {
        let mut emitted = 0usize;

        for seq_nr in 0..store.nb_chromosomes() {
            let Some(chrom) = genome.chromosome(seq_nr) else { continue };
            let chrom_symbols: Vec<u8> = (0..chrom.len).map(|i| chrom.symbol_at(i)).collect();

            for pos in store.positions(seq_nr) {
                let coverage = chrom.coverage_at(pos as usize);
                for variant in store.variants_at(seq_nr, pos) {
                    if variant.reference.len() > variant.alt.len()
                        && coverage_percentage(variant.depth, coverage) <= 25
                        && is_homopolymer(&chrom_symbols, pos as usize, 12)
                    {
                        continue;
                    }

                    let Some(score) = passes_filters(
                        &variant.reference,
                        &variant.alt,
                        variant.depth,
                        variant.score_sum,
                        coverage,
                        read_len,
                        no_filter,
                    ) else {
                        continue;
                    };

                    self.writer.write_all(chrom.name.as_bytes())?;
                    self.writer.write_all(b"\t")?;
                    self.writer.write_all(self.itoa_buf.format(pos).as_bytes())?;
                    self.writer.write_all(b"\t.\t")?;
                    self.writer.write_all(variant.reference.as_bytes())?;
                    self.writer.write_all(b"\t")?;
                    self.writer.write_all(variant.alt.as_bytes())?;
                    self.writer.write_all(b"\t.\t.\tDEPTH=")?;
                    self.writer.write_all(self.itoa_buf.format(variant.depth).as_bytes())?;
                    self.writer.write_all(b";COV=")?;
                    self.writer.write_all(self.itoa_buf.format(coverage).as_bytes())?;
                    self.writer.write_all(b";SCORE=")?;
                    self.writer.write_all(self.itoa_buf.format(score).as_bytes())?;
                    self.writer.write_all(b"\n")?;
                    emitted += 1;
                }
            }
        }

        Ok(emitted)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn coverage_percentage(depth: u32, coverage: u32) -> u32 {
    if coverage == 0 {
        100
    } else {
        depth * 100 / coverage
    }
}
