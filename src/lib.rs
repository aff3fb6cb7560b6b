//! # seqbuf
//!
//! Sequential byte store used to build and pick apart game network packets.
//!
//! A [`StoreWtr`] appends little-endian scalars, arrays, 0-terminated strings
//! and packed GUIDs into a lazily allocated, growable buffer. Finalizing it
//! yields a [`StoreRdr`] that reads the same values back in order. A reader can
//! also be laid directly over received bytes without copying them.
//!
//! Reads latch failure: once one runs past the written data, every later read
//! on the same reader fails too, so a decoder can check once at the end.
//!
//! ```
//! use seqbuf::StoreWtr;
//!
//! let mut wtr = StoreWtr::new();
//! wtr.put(0xAABBCCDDu32).unwrap();
//! wtr.put_packed_guid(0x0100000000000002).unwrap();
//!
//! let mut rdr = wtr.finalize();
//! assert_eq!(rdr.get::<u32>(), Ok(0xAABBCCDD));
//! assert_eq!(rdr.get_packed_guid(), Ok(0x0100000000000002));
//! assert!(rdr.get::<u8>().is_err());
//! ```

pub mod error;
pub mod store;

pub use error::{Error, Result};
pub use store::{
    CappedGrowth, Cursor, Detached, GrowPolicy, PackedGuid, RoundedGrowth, Scalar, StoreRdr,
    StoreWtr, StoreWtrBuilder, MAX_PACKED_GUID_LEN,
};
