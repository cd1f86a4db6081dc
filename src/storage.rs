//! The encrypted storage adapter: translates byte-granular application reads
//! and writes into aligned 16-byte block operations against a raw store,
//! XEX-encrypting or decrypting every block it touches.
//!
//! This is the read-modify-write (RMW) translation described in spec.md
//! §4.3. It is uniform by design — even a write that fully overwrites an
//! interior block still goes through a raw-read/decrypt/overlay/encrypt/
//! raw-write cycle — because a special-cased full-block path would be a
//! second code path to get right, for a storage layer small enough that the
//! extra raw reads don't matter.

use {
    crate::{error::StorageError, keystate::KeyState, primitive::BlockCipher, util, xex},
    thiserror::Error,
};

/// The raw, block-addressed, ciphertext-only non-volatile store this adapter
/// sits on top of. The production implementation — the actual flash/EEPROM
/// driver — is an external collaborator (spec.md §6); this crate only ships
/// [`MemoryStore`] as a test double.
pub trait RawStore {
    type Err;

    /// Read `buf.len()` bytes starting at `address` into `buf`.
    fn raw_read(&mut self, buf: &mut [u8], address: u32) -> Result<(), Self::Err>;

    /// Write `buf` to `address`.
    fn raw_write(&mut self, buf: &[u8], address: u32) -> Result<(), Self::Err>;

    /// Flush any buffering the store does internally. Not called by this
    /// adapter — spec.md §6 notes it's invoked by external collaborators,
    /// not the core — but part of the interface every `RawStore` must offer.
    fn raw_flush(&mut self) -> Result<(), Self::Err>;
}

/// Fixed `seq` used for every block touched by the adapter. A unique `n` per
/// block (the block's own address) already makes every tweak mask unique, so
/// a constant nonzero `seq` both avoids the `seq == 0` weakness and keeps the
/// per-block doubling cost constant. See spec.md §4.3/§9.
const BLOCK_SEQ: u64 = 1;

/// Translates byte-granular reads and writes into XEX-encrypted 16-byte
/// block operations against a `RawStore`.
pub struct EncryptedStorage<S, C = crate::primitive::Aes128> {
    store: S,
    cipher: C,
    keys: KeyState,
}

impl<S: RawStore, C: BlockCipher<Block = [u8; 16], Key = [u8; 16]> + Default>
    EncryptedStorage<S, C>
{
    /// Build an adapter over `store` with the default-constructed block
    /// cipher primitive and no key installed.
    pub fn new(store: S) -> Self {
        Self {
            store,
            cipher: C::default(),
            keys: KeyState::default(),
        }
    }
}

impl<S: RawStore, C: BlockCipher<Block = [u8; 16], Key = [u8; 16]>> EncryptedStorage<S, C> {
    /// Install a new 256-bit master key (`key[0..16]` = encrypt key,
    /// `key[16..32]` = tweak key).
    pub fn set_key(&mut self, key: &[u8; 32]) {
        self.keys.set(key);
    }

    /// Read back the installed master key.
    pub fn get_key(&self, out: &mut [u8; 32]) {
        self.keys.get(out);
    }

    /// Zeroize the installed master key.
    pub fn clear_key(&mut self) {
        self.keys.clear();
    }

    /// Whether a (nonzero) key is currently installed.
    pub fn is_key_nonzero(&self) -> bool {
        self.keys.is_nonzero()
    }

    #[cfg(test)]
    pub(crate) fn raw_store(&self) -> &S {
        &self.store
    }

    /// Decrypt and return the `buf.len()` bytes starting at `address`.
    pub fn encrypted_read(
        &mut self,
        buf: &mut [u8],
        address: u32,
    ) -> Result<(), StorageError<S::Err>> {
        let range = BlockRange::new(address, buf.len())?;
        let (encrypt_key, tweak_key) = self.keys.halves();

        let mut written = 0;
        let mut offset = range.first_offset;
        for block_start in range.block_starts() {
            let mut ciphertext = [0u8; 16];
            self.store.raw_read(&mut ciphertext, block_start)?;
            let plaintext = xex::decrypt(
                &self.cipher,
                &ciphertext,
                &tweak_n(block_start),
                BLOCK_SEQ,
                tweak_key,
                encrypt_key,
            );

            written += copy_overlay(&plaintext[offset..], &mut buf[written..]);
            offset = 0;
        }
        Ok(())
    }

    /// Encrypt `data` and write it starting at `address`, read-modifying the
    /// blocks it partially overlaps.
    pub fn encrypted_write(
        &mut self,
        data: &[u8],
        address: u32,
    ) -> Result<(), StorageError<S::Err>> {
        let range = BlockRange::new(address, data.len())?;
        let (encrypt_key, tweak_key) = self.keys.halves();

        let mut consumed = 0;
        let mut offset = range.first_offset;
        for block_start in range.block_starts() {
            let mut ciphertext = [0u8; 16];
            self.store.raw_read(&mut ciphertext, block_start)?;
            let mut plaintext = xex::decrypt(
                &self.cipher,
                &ciphertext,
                &tweak_n(block_start),
                BLOCK_SEQ,
                tweak_key,
                encrypt_key,
            );

            consumed += copy_overlay(&data[consumed..], &mut plaintext[offset..]);
            offset = 0;

            let ciphertext = xex::encrypt(
                &self.cipher,
                &plaintext,
                &tweak_n(block_start),
                BLOCK_SEQ,
                tweak_key,
                encrypt_key,
            );
            self.store.raw_write(&ciphertext, block_start)?;
        }
        Ok(())
    }
}

/// Copy as many bytes as fit from `src` into `dst`, returning the count
/// copied. Used on both sides of the RMW overlay: `src` shorter than `dst`
/// means the scratch block isn't fully consumed yet (more blocks follow),
/// `dst` shorter than `src` means the scratch block is full (this is the
/// last block).
fn copy_overlay(src: &[u8], dst: &mut [u8]) -> usize {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
    n
}

/// Build the 16-byte tweak value `n` for the block starting at `address`:
/// the address written little-endian into the low 4 bytes, the rest zero.
fn tweak_n(address: u32) -> [u8; 16] {
    let mut n = [0u8; 16];
    util::write_u32_le(&mut n, address);
    n
}

/// The block-aligned iteration plan for one `encrypted_read`/
/// `encrypted_write` call: which block addresses to touch, and how far into
/// the first block's scratch buffer the caller's range actually starts.
struct BlockRange {
    first_block: u32,
    last_block: u32,
    first_offset: usize,
}

impl BlockRange {
    fn new<E>(address: u32, length: usize) -> Result<Self, StorageError<E>> {
        if length == 0 {
            return Err(StorageError::EmptyRange);
        }
        let last_byte = u64::from(address)
            .checked_add(length as u64 - 1)
            .ok_or(StorageError::AddressOverflow)?;
        if last_byte > u32::MAX as u64 {
            return Err(StorageError::AddressOverflow);
        }
        Ok(Self {
            first_block: address & !0xF,
            last_block: (last_byte as u32) & !0xF,
            first_offset: (address & 0xF) as usize,
        })
    }

    fn block_starts(&self) -> impl Iterator<Item = u32> {
        (self.first_block..=self.last_block).step_by(16)
    }
}

/// An in-memory [`RawStore`], used for tests and as the crate's only
/// non-production implementation of the raw-store interface. An address
/// range that runs past the end of the backing buffer is rejected with
/// [`MemoryStoreError::OutOfBounds`] rather than delegated silently — per
/// spec.md §4.3/§7, a `RawStore` is expected to detect and surface this
/// itself, not crash its caller.
pub struct MemoryStore {
    bytes: Vec<u8>,
}

impl MemoryStore {
    /// Create a store backed by `size` zero bytes of (ciphertext) storage.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0u8; size],
        }
    }

    #[cfg(test)]
    pub(crate) fn raw_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn checked_range(
        &self,
        address: u32,
        len: usize,
    ) -> Result<std::ops::Range<usize>, MemoryStoreError> {
        let start = address as usize;
        let end = start.checked_add(len).filter(|&end| end <= self.bytes.len());
        end.map(|end| start..end).ok_or(MemoryStoreError::OutOfBounds {
            start: address,
            end: u64::from(address) + len as u64,
            capacity: self.bytes.len(),
        })
    }
}

/// [`MemoryStore`]'s only failure mode: the requested range doesn't fit in
/// the backing buffer.
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("address range [{start}, {end}) exceeds the {capacity}-byte store")]
    OutOfBounds { start: u32, end: u64, capacity: usize },
}

impl RawStore for MemoryStore {
    type Err = MemoryStoreError;

    fn raw_read(&mut self, buf: &mut [u8], address: u32) -> Result<(), Self::Err> {
        let range = self.checked_range(address, buf.len())?;
        buf.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn raw_write(&mut self, buf: &[u8], address: u32) -> Result<(), Self::Err> {
        let range = self.checked_range(address, buf.len())?;
        self.bytes[range].copy_from_slice(buf);
        Ok(())
    }

    fn raw_flush(&mut self) -> Result<(), Self::Err> {
        Ok(())
    }
}
