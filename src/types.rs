//! Shared data model for reads, candidates, requests, and result records.

/// One logical read (original orientation, mate, or reverse-complement),
/// packed 2-bit symbols.
#[derive(Debug, Clone)]
pub struct Read {
    pub id: u32,
    pub symbols: Vec<u8>,
}

/// One unit of work dispatched to a slot: a read plus the offset/count of
/// candidate neighbourhoods it should be compared against.
#[derive(Debug, Clone)]
pub struct Request {
    pub read_id: u32,
    pub read_symbols: Vec<u8>,
    pub seq_nr: u32,
    pub offset: u32,
    pub count: u32,
}

/// A single alignment result, `#[repr(C)]` to match the wire layout the
/// source design streams off each accelerator slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ResultRecord {
    pub num: u32,
    pub score: u32,
    pub seed_nr: u32,
    pub seq_nr: u32,
}

impl ResultRecord {
    /// Marks the end of a result stream; `num == score == u32::MAX`.
    pub const SENTINEL: ResultRecord = ResultRecord {
        num: u32::MAX,
        score: u32::MAX,
        seed_nr: 0,
        seq_nr: 0,
    };

    pub fn is_sentinel(&self) -> bool {
        self.num == u32::MAX && self.score == u32::MAX
    }

    pub fn to_bytes(&self) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[0..4].copy_from_slice(&self.num.to_le_bytes());
        buf[4..8].copy_from_slice(&self.score.to_le_bytes());
        buf[8..12].copy_from_slice(&self.seed_nr.to_le_bytes());
        buf[12..16].copy_from_slice(&self.seq_nr.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; 16]) -> Self {
        ResultRecord {
            num: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            score: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            seed_nr: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            seq_nr: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_round_trips_through_bytes() {
        let bytes = ResultRecord::SENTINEL.to_bytes();
        let back = ResultRecord::from_bytes(&bytes);
        assert!(back.is_sentinel());
    }

    #[test]
    fn ordinary_record_round_trips() {
        let record = ResultRecord {
            num: 7,
            score: 12,
            seed_nr: 3,
            seq_nr: 99,
        };
        let back = ResultRecord::from_bytes(&record.to_bytes());
        assert_eq!(record, back);
    }

    #[test]
    fn repr_c_size_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<ResultRecord>(), 16);
    }
}
