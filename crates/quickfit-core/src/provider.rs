//! Bulk memory providers.
//!
//! The allocator asks a provider for one raw region per fresh block and never
//! gives it back except when a release cannot be classified. Providers are a
//! trait so tests can substitute a bounded budget and hit the out-of-memory
//! path deterministically.

use crate::error::ProviderError;

/// A raw region handed out by a [`BulkProvider`].
///
/// Contents are whatever the provider left there. The allocator neither
/// zeroes fresh regions nor scrubs reused ones.
#[derive(Debug, PartialEq, Eq)]
pub struct RawRegion {
    bytes: Box<[u8]>,
}

impl RawRegion {
    #[must_use]
    pub fn new(bytes: Box<[u8]>) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

/// Source of raw memory for fresh blocks.
pub trait BulkProvider {
    /// Acquires a region of exactly `byte_len` bytes.
    fn acquire_raw(&mut self, byte_len: usize) -> Result<RawRegion, ProviderError>;

    /// Takes back a region previously returned by [`Self::acquire_raw`].
    fn release_raw(&mut self, region: RawRegion);
}

impl<P: BulkProvider + ?Sized> BulkProvider for &mut P {
    fn acquire_raw(&mut self, byte_len: usize) -> Result<RawRegion, ProviderError> {
        (**self).acquire_raw(byte_len)
    }

    fn release_raw(&mut self, region: RawRegion) {
        (**self).release_raw(region);
    }
}

/// Provider backed by the global Rust allocator.
///
/// Reservation failures are reported as [`ProviderError::SystemRefused`]
/// rather than aborting the process.
#[derive(Debug, Default, Clone)]
pub struct SystemProvider {
    bytes_outstanding: usize,
}

impl SystemProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes acquired and not yet released.
    #[must_use]
    pub fn bytes_outstanding(&self) -> usize {
        self.bytes_outstanding
    }
}

impl BulkProvider for SystemProvider {
    fn acquire_raw(&mut self, byte_len: usize) -> Result<RawRegion, ProviderError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(byte_len)
            .map_err(|_| ProviderError::SystemRefused {
                requested: byte_len,
            })?;
        bytes.resize(byte_len, 0);
        self.bytes_outstanding = self.bytes_outstanding.saturating_add(byte_len);
        Ok(RawRegion::new(bytes.into_boxed_slice()))
    }

    fn release_raw(&mut self, region: RawRegion) {
        self.bytes_outstanding = self.bytes_outstanding.saturating_sub(region.len());
    }
}

/// Provider that serves at most `budget` bytes in total.
#[derive(Debug, Clone)]
pub struct BoundedProvider {
    inner: SystemProvider,
    budget: usize,
    used: usize,
    acquisitions: usize,
    /// Byte written over every fresh region.
    fill: u8,
}

impl BoundedProvider {
    #[must_use]
    pub fn new(budget: usize) -> Self {
        Self {
            inner: SystemProvider::new(),
            budget,
            used: 0,
            acquisitions: 0,
            fill: 0,
        }
    }

    /// Fill fresh regions with `fill` instead of zero.
    #[must_use]
    pub fn with_fill(mut self, fill: u8) -> Self {
        self.fill = fill;
        self
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.budget - self.used
    }

    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Number of successful `acquire_raw` calls.
    #[must_use]
    pub fn acquisitions(&self) -> usize {
        self.acquisitions
    }
}

impl BulkProvider for BoundedProvider {
    fn acquire_raw(&mut self, byte_len: usize) -> Result<RawRegion, ProviderError> {
        let remaining = self.remaining();
        if byte_len > remaining {
            return Err(ProviderError::Exhausted {
                requested: byte_len,
                remaining,
            });
        }
        let mut region = self.inner.acquire_raw(byte_len)?;
        region.as_mut_slice().fill(self.fill);
        self.used += byte_len;
        self.acquisitions += 1;
        Ok(region)
    }

    fn release_raw(&mut self, region: RawRegion) {
        self.used = self.used.saturating_sub(region.len());
        self.inner.release_raw(region);
    }
}
