//! # Packed GUID
//!
//! ```text
//! 0      1                         (BYTE)
//! +------+---------- ... ---------+
//! | mask |  non-zero bytes of id  |
//! +------+---------- ... ---------+
//! ```
//!
//! Bit `i` of `mask` is set iff little-endian byte `i` of the id is non-zero.
//! The non-zero bytes follow in ascending `i`, so the encoding takes
//! `1 + popcount(mask)` bytes (1 to 9).

use crate::error::Result;

use super::{GrowPolicy, StoreRdr, StoreWtr};

pub const MAX_PACKED_GUID_LEN: usize = 9;

#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
pub struct PackedGuid {
    n: u64,
}

impl PackedGuid {
    pub fn from_u64(n: u64) -> Self {
        PackedGuid { n }
    }

    pub fn to_u64(&self) -> u64 {
        self.n
    }

    pub fn mask(&self) -> u8 {
        let mut mask = 0;
        for (i, byte) in self.n.to_le_bytes().iter().enumerate() {
            if *byte != 0 {
                mask |= 1 << i;
            }
        }
        mask
    }

    #[inline]
    pub fn packed_len(&self) -> usize {
        packed_len_from_mask(self.mask())
    }

    /// Writes the packed form into `out` and returns its length.
    pub fn encode(&self, out: &mut [u8; MAX_PACKED_GUID_LEN]) -> usize {
        out[0] = self.mask();
        let mut len = 1;
        for byte in self.n.to_le_bytes() {
            if byte != 0 {
                out[len] = byte;
                len += 1;
            }
        }
        len
    }

    /// `packed` must hold exactly `packed_len_from_mask(packed[0])` bytes.
    pub(crate) fn decode(packed: &[u8]) -> Self {
        let mask = packed[0];
        assert_eq!(packed.len(), packed_len_from_mask(mask));
        let mut bytes = [0; 8];
        let mut data = packed[1..].iter();
        for (i, byte) in bytes.iter_mut().enumerate() {
            if mask & (1 << i) != 0 {
                if let Some(b) = data.next() {
                    *byte = *b;
                }
            }
        }
        PackedGuid {
            n: u64::from_le_bytes(bytes),
        }
    }

    pub fn append_to<G: GrowPolicy>(&self, wtr: &mut StoreWtr<G>) -> Result<()> {
        wtr.put_packed_guid(self.n)
    }

    pub fn from_rdr(rdr: &mut StoreRdr) -> Result<Self> {
        rdr.get_packed_guid().map(PackedGuid::from_u64)
    }
}

#[inline]
pub fn packed_len_from_mask(mask: u8) -> usize {
    1 + mask.count_ones() as usize
}
