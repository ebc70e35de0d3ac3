//! Non-volatile storage abstraction.
//!
//! Models an EEPROM-style byte region: writes go to a staging buffer and only
//! become durable after [`NvStorage::commit`]. There is no journal; a commit
//! interrupted by power loss may leave a partial image behind, which the
//! signature check in [`crate::store`] may or may not catch.

/// Fixed-size non-volatile byte region.
pub trait NvStorage {
    /// Error type for storage operations.
    type Error: core::fmt::Debug;

    /// Read the start of the region into `buf`.
    ///
    /// Returns the number of bytes actually read. Bytes past that count are
    /// left untouched by the implementation; callers zero-fill beforehand.
    /// A region that was never written reads as zero bytes. A region longer
    /// than `buf` reads as its first `buf.len()` bytes.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Stage `data` for writing at the start of the region.
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Make staged data durable.
    fn commit(&mut self) -> Result<(), Self::Error>;
}
