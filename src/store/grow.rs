pub const DEFAULT_GRANULE: usize = 256;

/// Decides how large the allocation of a [`StoreWtr`](super::StoreWtr) becomes
/// when a write does not fit.
pub trait GrowPolicy {
    /// Returns the new capacity for a store holding `capacity` bytes that must
    /// hold at least `required` bytes, or `None` if the growth is refused.
    ///
    /// A returned capacity smaller than `required` is treated as a refusal.
    fn grow(&self, capacity: usize, required: usize) -> Option<usize>;
}

/// Rounds every request up to a multiple of `granule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundedGrowth {
    granule: usize,
}

impl RoundedGrowth {
    pub fn new(granule: usize) -> Self {
        assert!(granule > 0);
        Self { granule }
    }

    #[inline]
    pub fn granule(&self) -> usize {
        self.granule
    }
}

impl Default for RoundedGrowth {
    fn default() -> Self {
        Self::new(DEFAULT_GRANULE)
    }
}

impl GrowPolicy for RoundedGrowth {
    fn grow(&self, _capacity: usize, required: usize) -> Option<usize> {
        required
            .checked_add(self.granule - 1)
            .map(|n| n / self.granule * self.granule)
    }
}

/// Wraps another policy and refuses any capacity above `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CappedGrowth<G = RoundedGrowth> {
    pub limit: usize,
    pub inner: G,
}

impl CappedGrowth {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            inner: RoundedGrowth::default(),
        }
    }
}

impl<G: GrowPolicy> GrowPolicy for CappedGrowth<G> {
    fn grow(&self, capacity: usize, required: usize) -> Option<usize> {
        if required > self.limit {
            return None;
        }
        let new_capacity = self.inner.grow(capacity, required)?;
        Some(usize::min(new_capacity, self.limit))
    }
}
