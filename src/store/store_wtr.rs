use std::ffi::CStr;

use tracing::{trace, warn};

use crate::error::{Error, Result};

use super::{GrowPolicy, PackedGuid, RoundedGrowth, Scalar, StoreRdr, MAX_PACKED_GUID_LEN};

/// Write half of a sequential byte store.
///
/// Bytes are appended at `len()`. The allocation is lazy: nothing is allocated
/// until the first write, and every growth goes through the [`GrowPolicy`].
/// A refused growth drops the write and latches the writer into a failed state
/// in which every later put is a no-op.
#[derive(Debug)]
pub struct StoreWtr<G = RoundedGrowth> {
    // `buf.len()` is the allocated capacity
    buf: Vec<u8>,
    size: usize,
    failed: bool,
    grow: G,
}

pub struct StoreWtrBuilder<G = RoundedGrowth> {
    pub capacity: usize,
    pub grow: G,
}

impl<G: GrowPolicy> StoreWtrBuilder<G> {
    pub fn build(self) -> Result<StoreWtr<G>> {
        let mut this = StoreWtr::with_grow(self.grow);
        this.fetch_write(self.capacity)?;
        this.check_rep();
        Ok(this)
    }
}

/// Storage handed out by [`StoreWtr::detach`].
#[derive(Debug, PartialEq, Eq)]
pub struct Detached {
    /// The whole allocation; only `..size` holds written data.
    pub bytes: Vec<u8>,
    pub size: usize,
}

impl Detached {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.bytes[..self.size]
    }

    pub fn into_vec(mut self) -> Vec<u8> {
        self.bytes.truncate(self.size);
        self.bytes
    }
}

impl StoreWtr {
    pub fn new() -> Self {
        Self::with_grow(RoundedGrowth::default())
    }
}

impl Default for StoreWtr {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GrowPolicy> StoreWtr<G> {
    #[inline]
    fn check_rep(&self) {
        assert!(self.size <= self.buf.len());
    }

    pub fn with_grow(grow: G) -> Self {
        Self::from_parts(Vec::new(), grow)
    }

    /// Reuses `buf` as the allocation, discarding its contents.
    pub(crate) fn from_parts(buf: Vec<u8>, grow: G) -> Self {
        let this = Self {
            buf,
            size: 0,
            failed: false,
            grow,
        };
        this.check_rep();
        this
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.size]
    }

    /// True once a write has been dropped.
    #[inline]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    #[inline]
    pub fn is_read(&self) -> bool {
        false
    }

    #[inline]
    pub fn grow_policy(&self) -> &G {
        &self.grow
    }

    /// Makes sure the allocation covers `required` bytes.
    fn fetch_write(&mut self, required: usize) -> Result<()> {
        let capacity = self.buf.len();
        if required <= capacity {
            return Ok(());
        }
        match self.grow.grow(capacity, required) {
            Some(new_capacity) if new_capacity >= required => {
                trace!(capacity, new_capacity, "growing store");
                self.buf.resize(new_capacity, 0);
                Ok(())
            }
            _ => {
                warn!(capacity, required, "store growth refused");
                Err(Error::GrowFailed { required, capacity })
            }
        }
    }

    /// Reserves `len` bytes at the write position, lets `fill` write them,
    /// then advances past them.
    fn put_with(&mut self, len: usize, fill: impl FnOnce(&mut [u8])) -> Result<()> {
        if self.failed {
            return Err(Error::Poisoned);
        }
        let required = self.size.checked_add(len).ok_or(Error::GrowFailed {
            required: usize::MAX,
            capacity: self.buf.len(),
        });
        if let Err(e) = required.and_then(|required| self.fetch_write(required)) {
            self.failed = true;
            return Err(e);
        }
        let end = self.size + len;
        fill(&mut self.buf[self.size..end]);
        self.size = end;
        self.check_rep();
        Ok(())
    }

    pub fn put<T: Scalar>(&mut self, value: T) -> Result<()> {
        self.put_with(T::SIZE, |dst| value.write_to(dst))
    }

    pub fn put_array<T: Scalar>(&mut self, values: &[T]) -> Result<()> {
        if values.is_empty() {
            return if self.failed {
                Err(Error::Poisoned)
            } else {
                Ok(())
            };
        }
        // an overflowing length is refused by the grow policy, which latches
        let len = values.len().checked_mul(T::SIZE).unwrap_or(usize::MAX);
        self.put_with(len, |dst| {
            for (chunk, value) in dst.chunks_exact_mut(T::SIZE).zip(values.iter().copied()) {
                value.write_to(chunk);
            }
        })
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return self.put_array::<u8>(&[]);
        }
        self.put_with(bytes.len(), |dst| dst.copy_from_slice(bytes))
    }

    /// Writes `s` followed by a terminating 0.
    pub fn put_str(&mut self, s: &str) -> Result<()> {
        if s.as_bytes().contains(&0) {
            return Err(Error::InteriorNul);
        }
        let bytes = s.as_bytes();
        self.put_with(bytes.len() + 1, |dst| {
            let (text, nul) = dst.split_at_mut(bytes.len());
            text.copy_from_slice(bytes);
            nul[0] = 0;
        })
    }

    pub fn put_cstr(&mut self, s: &CStr) -> Result<()> {
        self.put_bytes(s.to_bytes_with_nul())
    }

    /// Writes `guid` as a mask byte followed by its non-zero bytes.
    pub fn put_packed_guid(&mut self, guid: u64) -> Result<()> {
        let mut packed = [0; MAX_PACKED_GUID_LEN];
        let len = PackedGuid::from_u64(guid).encode(&mut packed);
        self.put_bytes(&packed[..len])
    }

    /// Overwrites an already written value at `pos` without moving the write
    /// position.
    pub fn set<T: Scalar>(&mut self, pos: usize, value: T) -> Result<()> {
        match pos.checked_add(T::SIZE) {
            Some(end) if end <= self.size => {
                value.write_to(&mut self.buf[pos..end]);
                Ok(())
            }
            _ => Err(Error::OutOfRange {
                pos,
                len: T::SIZE,
                size: self.size,
            }),
        }
    }

    /// Ends the write phase; the returned reader starts at offset 0.
    pub fn finalize(self) -> StoreRdr<'static> {
        StoreRdr::from_owned(self.buf, self.size)
    }

    /// Forgets all written data but keeps the allocation.
    pub fn reset(&mut self) {
        self.size = 0;
        self.failed = false;
        self.check_rep();
    }

    /// Hands the allocation to the caller and leaves the writer empty.
    pub fn detach(&mut self) -> Detached {
        let bytes = std::mem::take(&mut self.buf);
        let size = self.size;
        self.reset();
        Detached { bytes, size }
    }
}

#[cfg(test)]
mod tests {
    use crate::store::CappedGrowth;

    use super::*;

    #[test]
    fn lazy_allocation() {
        let wtr = StoreWtr::new();
        assert_eq!(wtr.capacity(), 0);
        assert_eq!(wtr.len(), 0);
        assert!(!wtr.is_read());
    }

    #[test]
    fn growth_rounds_to_granule() {
        let mut wtr = StoreWtr::new();
        wtr.put(1u32).unwrap();
        assert_eq!(wtr.capacity(), 256);
        wtr.put_bytes(&[7; 300]).unwrap();
        assert_eq!(wtr.len(), 304);
        assert_eq!(wtr.capacity(), 512);
    }

    #[test]
    fn growth_keeps_written_bytes() {
        let mut wtr = StoreWtr::new();
        for i in 0..5000u32 {
            wtr.put(i as u8).unwrap();
        }
        assert_eq!(wtr.len(), 5000);
        assert_eq!(wtr.capacity() % 256, 0);
        for (i, byte) in wtr.data().iter().enumerate() {
            assert_eq!(*byte, i as u8);
        }
    }

    #[test]
    fn builder_preallocates() {
        let wtr = StoreWtrBuilder {
            capacity: 10,
            grow: RoundedGrowth::default(),
        }
        .build()
        .unwrap();
        assert_eq!(wtr.capacity(), 256);
        assert!(wtr.is_empty());

        let err = StoreWtrBuilder {
            capacity: 1000,
            grow: CappedGrowth::new(512),
        }
        .build()
        .unwrap_err();
        assert_eq!(
            err,
            Error::GrowFailed {
                required: 1000,
                capacity: 0
            }
        );
    }

    #[test]
    fn refused_growth_latches() {
        let mut wtr = StoreWtr::with_grow(CappedGrowth::new(4));
        wtr.put(0x01020304u32).unwrap();
        assert_eq!(wtr.capacity(), 4);
        let err = wtr.put(5u8).unwrap_err();
        assert_eq!(
            err,
            Error::GrowFailed {
                required: 5,
                capacity: 4
            }
        );
        assert!(wtr.is_failed());
        assert_eq!(wtr.len(), 4);
        assert_eq!(wtr.put_array::<u8>(&[]), Err(Error::Poisoned));
        assert_eq!(wtr.put(0u8), Err(Error::Poisoned));
        assert_eq!(wtr.data(), &[4, 3, 2, 1]);

        wtr.reset();
        assert!(!wtr.is_failed());
        wtr.put(9u8).unwrap();
        assert_eq!(wtr.data(), &[9]);
    }

    #[test]
    fn refused_array_latches() {
        let mut wtr = StoreWtr::with_grow(CappedGrowth::new(8));
        wtr.put(1u16).unwrap();
        let err = wtr.put_array(&[0u32; 4]).unwrap_err();
        assert_eq!(
            err,
            Error::GrowFailed {
                required: 18,
                capacity: 8
            }
        );
        assert!(wtr.is_failed());
        assert_eq!(wtr.len(), 2);
        assert_eq!(wtr.put_array(&[1u8]), Err(Error::Poisoned));
    }

    #[test]
    fn empty_array_is_noop() {
        let mut wtr = StoreWtr::new();
        wtr.put_array::<u32>(&[]).unwrap();
        assert_eq!(wtr.capacity(), 0);
        assert!(wtr.is_empty());
    }

    #[test]
    fn put_str_appends_nul() {
        let mut wtr = StoreWtr::new();
        wtr.put_str("hi").unwrap();
        wtr.put_cstr(CStr::from_bytes_with_nul(b"yo\0").unwrap())
            .unwrap();
        assert_eq!(wtr.data(), b"hi\0yo\0");
        assert_eq!(wtr.put_str("a\0b"), Err(Error::InteriorNul));
        assert!(!wtr.is_failed());
        assert_eq!(wtr.len(), 6);
    }

    #[test]
    fn packed_guid_bytes() {
        let mut wtr = StoreWtr::new();
        wtr.put_packed_guid(0x0000000000000001).unwrap();
        assert_eq!(wtr.data(), &[0x01, 0x01]);

        let mut wtr = StoreWtr::new();
        wtr.put_packed_guid(0x0100000000000002).unwrap();
        assert_eq!(wtr.data(), &[0b1000_0001, 0x02, 0x01]);

        let mut wtr = StoreWtr::new();
        wtr.put_packed_guid(0).unwrap();
        assert_eq!(wtr.data(), &[0]);
    }

    #[test]
    fn set_patches_in_place() {
        let mut wtr = StoreWtr::new();
        wtr.put(0u16).unwrap();
        wtr.put_bytes(b"abc").unwrap();
        let body_len = (wtr.len() - 2) as u16;
        wtr.set(0, body_len).unwrap();
        assert_eq!(wtr.data(), &[3, 0, b'a', b'b', b'c']);
        assert_eq!(wtr.len(), 5);
        assert_eq!(
            wtr.set(4, 0u16),
            Err(Error::OutOfRange {
                pos: 4,
                len: 2,
                size: 5
            })
        );
        assert!(wtr.set(usize::MAX, 0u8).is_err());
    }

    #[test]
    fn detach_transfers_storage() {
        let mut wtr = StoreWtr::new();
        wtr.put(0xAABBCCDDu32).unwrap();
        let detached = wtr.detach();
        assert_eq!(detached.size, 4);
        assert_eq!(detached.capacity(), 256);
        assert_eq!(detached.data(), &[0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(wtr.len(), 0);
        assert_eq!(wtr.capacity(), 0);
        drop(wtr);
        assert_eq!(detached.into_vec(), vec![0xDD, 0xCC, 0xBB, 0xAA]);
    }

    #[test]
    fn reset_keeps_allocation() {
        let mut wtr = StoreWtr::new();
        wtr.put(1u64).unwrap();
        wtr.reset();
        assert!(wtr.is_empty());
        assert_eq!(wtr.capacity(), 256);
    }
}
