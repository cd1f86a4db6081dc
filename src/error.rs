//! The error taxonomy for the [storage adapter](crate::storage).
//!
//! Storage errors originate below this layer and are propagated verbatim.
//! Misuse (an empty range, an overflowing address) is caught before any raw
//! I/O happens and rejected explicitly — see §7 and §9 of SPEC_FULL.md for
//! why this crate does not follow spec.md's alternative of silently treating
//! these as no-ops or delegating them to the raw store.

use thiserror::Error;

/// Error returned by [`EncryptedStorage`](crate::storage::EncryptedStorage)
/// operations.
#[derive(Debug, Error)]
pub enum StorageError<E> {
    /// The underlying [`RawStore`](crate::storage::RawStore) failed. Carried
    /// unchanged; this layer does not retry or reinterpret it.
    #[error("raw store error: {0}")]
    Raw(#[from] E),

    /// `encrypted_read`/`encrypted_write` was called with a zero-length
    /// buffer.
    #[error("empty read/write range")]
    EmptyRange,

    /// `address + length - 1` does not fit in a `u32`.
    #[error("address range overflows the 32-bit address space")]
    AddressOverflow,
}
