//! Reference genome loader and per-base coverage tracking.
//!
//! Parses a reference FASTA into one packed 2-bit symbol buffer per
//! chromosome, preserving file order the same way the source design keeps
//! chromosomes in input order for VCF emission. Coverage is tracked
//! separately, one relaxed atomic counter per base, matching §5's note that
//! coverage increments need no ordering guarantee beyond atomicity.

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use memchr::memchr;
use memmap2::Mmap;

use crate::codec;
use crate::error::{Result, UpvcError};

// A<->T and C<->G must each be 2 apart so `codec::reverse_complement`'s
// `v XOR 2` rule gives the correct complementary base (matches the
// source design's `get_seq_fast_AQ`/`invnt` pairing, not alphabetical order).
fn nt_to_symbol(byte: u8) -> Option<u8> {
    match byte.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'T' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

/// Inverse of [`nt_to_symbol`], for rendering symbols back to nucleotide
/// letters in VCF REF/ALT columns.
pub fn symbol_to_nt(symbol: u8) -> u8 {
    match symbol & 3 {
        0 => b'A',
        1 => b'C',
        2 => b'T',
        3 => b'G',
        _ => unreachable!(),
    }
}

/// One chromosome's packed sequence and a per-base coverage track.
pub struct Chromosome {
    pub name: String,
    pub len: usize,
    pub packed: Vec<u8>,
    pub coverage: Vec<AtomicU32>,
}

impl Chromosome {
    pub fn symbol_at(&self, pos: usize) -> u8 {
        codec::nt_at(&self.packed, pos)
    }

    pub fn record_coverage(&self, pos: usize) {
        if let Some(counter) = self.coverage.get(pos) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn coverage_at(&self, pos: usize) -> u32 {
        self.coverage.get(pos).map(|c| c.load(Ordering::Relaxed)).unwrap_or(0)
    }
}

/// Reference genome: packed chromosome sequences in file order, plus a
/// lookup from chromosome name to index for fast coordinate resolution.
#[derive(Default)]
pub struct Genome {
    chromosomes: Vec<Chromosome>,
}

impl Genome {
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        // Safe as long as nothing truncates/rewrites the file while mapped;
        // reference FASTAs are read-only inputs for the lifetime of a run.
        let mmap = unsafe { Mmap::map(&file)? };
        let mut chromosomes = Vec::new();

        let mut current_name: Option<String> = None;
        let mut current_symbols: Vec<u8> = Vec::new();

        let mut rest: &[u8] = &mmap;
        let mut line_no = 0usize;
        while !rest.is_empty() {
            line_no += 1;
            let (line, next) = match memchr(b'\n', rest) {
                Some(i) => (&rest[..i], &rest[i + 1..]),
                None => (rest, &rest[rest.len()..]),
            };
            rest = next;
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix(b">") {
                if let Some(finished_name) = current_name.take() {
                    chromosomes.push(Self::finish_chromosome(finished_name, &current_symbols));
                    current_symbols.clear();
                }
                let name_end = header.iter().position(|&b| b == b' ' || b == b'\t').unwrap_or(header.len());
                current_name = Some(String::from_utf8_lossy(&header[..name_end]).into_owned());
                continue;
            }

            if current_name.is_none() {
                return Err(UpvcError::Parse {
                    line: line_no,
                    message: "sequence data before any '>' header".to_string(),
                });
            }

            for &byte in line {
                match nt_to_symbol(byte) {
                    Some(symbol) => current_symbols.push(symbol),
                    None => current_symbols.push(0), // ambiguous base folded to 'A', matching NoDP's 4-symbol alphabet
                }
            }
        }

        if let Some(finished_name) = current_name {
            chromosomes.push(Self::finish_chromosome(finished_name, &current_symbols));
        }

        Ok(Genome { chromosomes })
    }

    fn finish_chromosome(name: String, symbols: &[u8]) -> Chromosome {
        let len = symbols.len();
        let packed = codec::pack(symbols);
        let coverage = (0..len).map(|_| AtomicU32::new(0)).collect();
        Chromosome { name, len, packed, coverage }
    }

    pub fn chromosome(&self, seq_nr: usize) -> Option<&Chromosome> {
        self.chromosomes.get(seq_nr)
    }

    pub fn chromosome_by_name(&self, name: &str) -> Option<(usize, &Chromosome)> {
        self.chromosomes.iter().enumerate().find(|(_, c)| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chromosome> {
        self.chromosomes.iter()
    }
}
