use std::{borrow::Cow, ops::Range};

use tracing::debug;

use crate::error::{Error, Result};

use super::{packed_len_from_mask, GrowPolicy, PackedGuid, RoundedGrowth, Scalar, StoreWtr};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Cursor {
    At(usize),
    Failed,
}

/// Read half of a sequential byte store.
///
/// Obtained from [`StoreWtr::finalize`], or built directly over received bytes
/// with [`StoreRdr::from_slice`]. A borrowed reader never owns or reallocates
/// its bytes.
///
/// The first read that runs past the written extent poisons the cursor. From
/// then on every read fails with [`Error::Poisoned`] and leaves its output
/// alone, so a caller may issue a whole sequence of reads and check
/// [`StoreRdr::is_failed`] once at the end.
#[derive(Debug, Clone)]
pub struct StoreRdr<'a> {
    buf: Cow<'a, [u8]>,
    size: usize,
    cursor: Cursor,
}

impl<'a> StoreRdr<'a> {
    #[inline]
    fn check_rep(&self) {
        assert!(self.size <= self.buf.len());
        if let Cursor::At(pos) = self.cursor {
            assert!(pos <= self.size);
        }
    }

    /// A read-only view over memory the caller keeps ownership of.
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let this = StoreRdr {
            size: buf.len(),
            buf: Cow::Borrowed(buf),
            cursor: Cursor::At(0),
        };
        this.check_rep();
        this
    }

    /// An owned reader over bytes received from elsewhere.
    pub fn from_vec(buf: Vec<u8>) -> StoreRdr<'static> {
        let size = buf.len();
        StoreRdr::from_owned(buf, size)
    }

    pub(crate) fn from_owned(buf: Vec<u8>, size: usize) -> StoreRdr<'static> {
        let this = StoreRdr {
            buf: Cow::Owned(buf),
            size,
            cursor: Cursor::At(0),
        };
        this.check_rep();
        this
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.size]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Allocated bytes, or `None` for a view over borrowed memory.
    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        match &self.buf {
            Cow::Owned(buf) => Some(buf.len()),
            Cow::Borrowed(_) => None,
        }
    }

    #[inline]
    pub fn is_read(&self) -> bool {
        true
    }

    #[inline]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        self.cursor == Cursor::Failed
    }

    #[inline]
    pub fn position(&self) -> Option<usize> {
        match self.cursor {
            Cursor::At(pos) => Some(pos),
            Cursor::Failed => None,
        }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        match self.cursor {
            Cursor::At(pos) => self.size - pos,
            Cursor::Failed => 0,
        }
    }

    fn poison(&mut self) {
        debug!(cursor = ?self.cursor, size = self.size, "store cursor poisoned");
        self.cursor = Cursor::Failed;
    }

    /// Checks that `len` bytes can be read at the cursor without moving it.
    fn fetch_read(&mut self, len: usize) -> Result<Range<usize>> {
        let pos = match self.cursor {
            Cursor::At(pos) => pos,
            Cursor::Failed => return Err(Error::Poisoned),
        };
        match pos.checked_add(len) {
            Some(end) if end <= self.size => Ok(pos..end),
            _ => {
                self.poison();
                Err(Error::Underrun {
                    pos,
                    want: len,
                    len: self.size,
                })
            }
        }
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        let range = self.fetch_read(len)?;
        self.cursor = Cursor::At(range.end);
        self.check_rep();
        Ok(&self.buf[range])
    }

    pub fn get<T: Scalar>(&mut self) -> Result<T> {
        let src = self.take(T::SIZE)?;
        Ok(T::read_from(src))
    }

    /// Fills `out` only if all of it can be read.
    pub fn get_array<T: Scalar>(&mut self, out: &mut [T]) -> Result<()> {
        if self.is_failed() {
            return Err(Error::Poisoned);
        }
        if out.is_empty() {
            return Ok(());
        }
        let len = out.len().checked_mul(T::SIZE).unwrap_or(usize::MAX);
        let src = self.take(len)?;
        for (chunk, value) in src.chunks_exact(T::SIZE).zip(out.iter_mut()) {
            *value = T::read_from(chunk);
        }
        Ok(())
    }

    pub fn get_bytes(&mut self, out: &mut [u8]) -> Result<()> {
        if self.is_failed() {
            return Err(Error::Poisoned);
        }
        if out.is_empty() {
            return Ok(());
        }
        let src = self.take(out.len())?;
        out.copy_from_slice(src);
        Ok(())
    }

    /// Borrows the next `len` bytes in place.
    pub fn get_in_situ(&mut self, len: usize) -> Result<&[u8]> {
        self.take(len)
    }

    /// Copies a 0-terminated string into `out`, terminator included, and
    /// returns its length without the terminator.
    ///
    /// If no terminator is found before the data or `out` runs out, `out`
    /// is left holding an empty string and the cursor is poisoned.
    pub fn get_string_into(&mut self, out: &mut [u8]) -> Result<usize> {
        let pos = match self.cursor {
            Cursor::At(pos) => pos,
            Cursor::Failed => {
                if let Some(first) = out.first_mut() {
                    *first = 0;
                }
                return Err(Error::Poisoned);
            }
        };
        if out.is_empty() {
            return Ok(0);
        }
        let src = &self.buf[pos..self.size];
        match src.iter().take(out.len()).position(|b| *b == 0) {
            Some(len) => {
                out[..=len].copy_from_slice(&src[..=len]);
                self.cursor = Cursor::At(pos + len + 1);
                self.check_rep();
                Ok(len)
            }
            None => {
                out[0] = 0;
                self.poison();
                Err(Error::Unterminated { pos })
            }
        }
    }

    /// Reads a 0-terminated string of at most `max_chars - 1` bytes.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn get_string(&mut self, max_chars: usize) -> Result<String> {
        let mut out = vec![0; max_chars];
        let len = self.get_string_into(&mut out)?;
        Ok(String::from_utf8_lossy(&out[..len]).into_owned())
    }

    /// Reads a packed GUID. The mask byte and every data byte it announces
    /// must be present before anything is consumed.
    pub fn get_packed_guid(&mut self) -> Result<u64> {
        let range = self.fetch_read(1)?;
        let mask = self.buf[range.start];
        let packed = self.take(packed_len_from_mask(mask))?;
        Ok(PackedGuid::decode(packed).to_u64())
    }

    /// Drops the data and returns to write mode. An owned reader hands its
    /// allocation to the writer; a borrowed one leaves the writer owning
    /// nothing.
    pub fn reset(self) -> StoreWtr {
        self.reset_with(RoundedGrowth::default())
    }

    pub fn reset_with<G: GrowPolicy>(self, grow: G) -> StoreWtr<G> {
        match self.buf {
            Cow::Owned(buf) => StoreWtr::from_parts(buf, grow),
            Cow::Borrowed(_) => StoreWtr::with_grow(grow),
        }
    }

    /// Gives up the bytes, trimmed to the written extent.
    pub fn detach(self) -> Cow<'a, [u8]> {
        match self.buf {
            Cow::Owned(mut buf) => {
                buf.truncate(self.size);
                Cow::Owned(buf)
            }
            Cow::Borrowed(buf) => Cow::Borrowed(&buf[..self.size]),
        }
    }
}
