//! Paired-read loader: FASTQ for round 0, FASTA for later rounds.
//!
//! Ported from the source design's `get_seq_fast_AQ`/`get_reads`: each pair
//! of records (one from each mate file) produces four logical reads —
//! mate1 forward, mate1 reverse-complement, mate2 forward, mate2
//! reverse-complement — padded or truncated to `read_len`. A leading
//! `>>N` comment trims the first `N` symbols the same way the original
//! honors an offset encoded in the comment line.

use std::io::BufRead;

use crate::codec;
use crate::error::{Result, UpvcError};
use crate::types::Read;

fn symbol_for_fastq_byte(byte: u8) -> u8 {
    match byte.to_ascii_uppercase() {
        b'A' => 0,
        b'C' => 1,
        b'T' => 2,
        b'G' => 3,
        _ => 0,
    }
}

/// Parse a leading `>>N` prefix from a comment line into its offset, `0`
/// if absent.
fn parse_offset(comment: &str) -> usize {
    comment
        .strip_prefix(">>")
        .and_then(|rest| rest.trim().parse::<usize>().ok())
        .unwrap_or(0)
}

/// One mate's (comment, sequence) record, however it was framed on disk.
struct MateRecord {
    offset: usize,
    sequence: String,
}

fn read_record<R: BufRead>(reader: &mut R, line_no: &mut usize) -> Result<Option<MateRecord>> {
    let mut comment = String::new();
    if reader.read_line(&mut comment)? == 0 {
        return Ok(None);
    }
    *line_no += 1;

    let mut sequence = String::new();
    if reader.read_line(&mut sequence)? == 0 {
        return Err(UpvcError::Parse {
            line: *line_no,
            message: "missing sequence line after comment".to_string(),
        });
    }
    *line_no += 1;

    let is_fastq = comment.starts_with('@');
    if is_fastq {
        // '+' separator and quality line, unused by this crate.
        let mut plus = String::new();
        reader.read_line(&mut plus)?;
        let mut quality = String::new();
        reader.read_line(&mut quality)?;
        *line_no += 2;
    }

    let offset = parse_offset(&comment);
    Ok(Some(MateRecord {
        offset,
        sequence: sequence.trim_end().to_string(),
    }))
}

/// Build the forward and reverse-complement logical reads for one mate,
/// padded/truncated to exactly `read_len` symbols.
fn mate_to_reads(record: &MateRecord, read_len: usize, base_id: u32) -> (Read, Read) {
    let usable = read_len.saturating_sub(record.offset);
    let mut symbols = vec![0u8; read_len];
    for (i, byte) in record.sequence.bytes().take(usable).enumerate() {
        symbols[i] = symbol_for_fastq_byte(byte);
    }
    let packed = codec::pack(&symbols);
    let rc = codec::reverse_complement(&packed, read_len);

    (
        Read { id: base_id, symbols: packed },
        Read { id: base_id + 1, symbols: rc },
    )
}

/// Pulls up to `max_reads` read-pairs (4 logical reads each) from the two
/// mate streams. Returns an empty vector once either stream is exhausted,
/// matching the original's "pair unavailable ends the batch" rule.
pub fn load_pairs<R1: BufRead, R2: BufRead>(mate1: &mut R1, mate2: &mut R2, read_len: usize, max_pairs: usize) -> Result<Vec<Read>> {
    let mut reads = Vec::with_capacity(max_pairs.saturating_mul(4).min(1 << 20));
    let mut line_no_1 = 0usize;
    let mut line_no_2 = 0usize;
    let mut next_id = 0u32;

    for _ in 0..max_pairs {
        let Some(rec1) = read_record(mate1, &mut line_no_1)? else { break };
        let Some(rec2) = read_record(mate2, &mut line_no_2)? else { break };

        let (fwd1, rc1) = mate_to_reads(&rec1, read_len, next_id);
        next_id += 2;
        let (fwd2, rc2) = mate_to_reads(&rec2, read_len, next_id);
        next_id += 2;

        reads.push(fwd1);
        reads.push(rc1);
        reads.push(fwd2);
        reads.push(rc2);
    }

    Ok(reads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn fastq_pair_yields_four_logical_reads() {
        let mate1 = "@r1\nACGTACGT\n+\nIIIIIIII\n";
        let mate2 = "@r1\nTTTTCCCC\n+\nIIIIIIII\n";
        let mut c1 = Cursor::new(mate1);
        let mut c2 = Cursor::new(mate2);

        let reads = load_pairs(&mut c1, &mut c2, 8, 10).unwrap();
        assert_eq!(reads.len(), 4);
    }

    #[test]
    fn fasta_pair_is_also_accepted() {
        let mate1 = ">r1\nACGTACGT\n";
        let mate2 = ">r1\nACGTACGT\n";
        let mut c1 = Cursor::new(mate1);
        let mut c2 = Cursor::new(mate2);

        let reads = load_pairs(&mut c1, &mut c2, 8, 10).unwrap();
        assert_eq!(reads.len(), 4);
    }

    #[test]
    fn offset_comment_trims_leading_symbols() {
        assert_eq!(parse_offset(">>4 round 1\n"), 4);
        assert_eq!(parse_offset(">plain\n"), 0);
    }

    #[test]
    fn exhausted_stream_ends_the_batch_early() {
        let mate1 = "@r1\nACGTACGT\n+\nIIIIIIII\n@r2\nACGTACGT\n+\nIIIIIIII\n";
        let mate2 = "@r1\nACGTACGT\n+\nIIIIIIII\n"; // only one record
        let mut c1 = Cursor::new(mate1);
        let mut c2 = Cursor::new(mate2);

        let reads = load_pairs(&mut c1, &mut c2, 8, 10).unwrap();
        assert_eq!(reads.len(), 4); // exactly one pair worth
    }

    #[test]
    fn forward_and_reverse_complement_are_consistent() {
        let mate1 = ">r1\nACGT\n";
        let mate2 = ">r1\nACGT\n";
        let mut c1 = Cursor::new(mate1);
        let mut c2 = Cursor::new(mate2);

        let reads = load_pairs(&mut c1, &mut c2, 4, 10).unwrap();
        let fwd_symbols = codec::unpack(&reads[0].symbols, 4);
        let rc_symbols = codec::unpack(&reads[1].symbols, 4);
        let expected_rc: Vec<u8> = fwd_symbols.iter().rev().map(|&s| s ^ 2).collect();
        assert_eq!(rc_symbols, expected_rc);
    }
}
