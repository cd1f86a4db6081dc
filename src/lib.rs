//! Encrypted random-access block storage for a hardware wallet's
//! non-volatile storage.
//!
//! The storage adapter ([`storage::EncryptedStorage`]) translates
//! byte-granular reads and writes into 16-byte blocks, each independently
//! encrypted under [XEX](xex) so that no plaintext or ciphertext pattern
//! repeats across addresses. [XEX](xex) itself is built from a
//! [block cipher primitive](primitive) and [GF(2^128) doubling](gf); the
//! master key the whole stack runs under is [`keystate::KeyState`].

#[cfg(test)]
mod test;

pub mod error;
pub mod gf;
pub mod keystate;
pub mod primitive;
pub mod storage;
mod util;
pub mod xex;

pub use {
    error::StorageError,
    keystate::KeyState,
    primitive::{Aes128, BlockCipher, BlockDecrypt, BlockEncrypt},
    storage::{EncryptedStorage, MemoryStore, RawStore},
};
