use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("read of {want} bytes at {pos} runs past the written extent of {len} bytes")]
    Underrun { pos: usize, want: usize, len: usize },

    #[error("store already failed")]
    Poisoned,

    #[error("string starting at {pos} is not terminated")]
    Unterminated { pos: usize },

    #[error("cannot grow store from {capacity} to {required} bytes")]
    GrowFailed { required: usize, capacity: usize },

    #[error("patch of {len} bytes at {pos} is outside the written extent of {size} bytes")]
    OutOfRange { pos: usize, len: usize, size: usize },

    #[error("string contains an interior nul byte")]
    InteriorNul,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error came from reading past the end of the data
    pub fn is_underrun(&self) -> bool {
        matches!(self, Error::Underrun { .. } | Error::Unterminated { .. })
    }
}
