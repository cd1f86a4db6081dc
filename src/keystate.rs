//! The master key state: two independent 128-bit keys, supplied and
//! retrieved as one 256-bit blob, zeroized on clear.
//!
//! spec.md frames this as process-wide global state read by testing whether
//! any byte is nonzero. This crate carries the same data model and lifecycle
//! but as an explicit value owned by
//! [`EncryptedStorage`](crate::storage::EncryptedStorage) rather than a
//! module-global — the redesign spec.md's own Design Notes offer as
//! equally valid, and the one that needs no unsafe global mutable state on a
//! multi-threaded host.

use {
    subtle::{Choice, ConstantTimeEq},
    zeroize::{Zeroize, ZeroizeOnDrop},
};

/// The two independent 128-bit keys used by [XEX](crate::xex): `encrypt_key`
/// for the data pass, `tweak_key` for masking the tweak. Initializes to all
/// zeros, which [`is_nonzero`](KeyState::is_nonzero) treats as "no key
/// installed."
///
/// `ZeroizeOnDrop` covers the case [`clear`](KeyState::clear) doesn't: a
/// `KeyState` going out of scope without an explicit clear call, e.g. on an
/// early return. [`clear`](KeyState::clear) itself still does its own
/// two-phase overwrite rather than delegating to `Zeroize::zeroize`, since
/// that only overwrites once.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyState {
    encrypt_key: [u8; 16],
    tweak_key: [u8; 16],
}

impl Default for KeyState {
    fn default() -> Self {
        Self {
            encrypt_key: [0; 16],
            tweak_key: [0; 16],
        }
    }
}

impl KeyState {
    /// Install a new key. `key[0..16]` becomes `encrypt_key`, `key[16..32]`
    /// becomes `tweak_key`.
    pub fn set(&mut self, key: &[u8; 32]) {
        self.encrypt_key.copy_from_slice(&key[0..16]);
        self.tweak_key.copy_from_slice(&key[16..32]);
    }

    /// Read back the installed key, inverse of [`set`](KeyState::set).
    pub fn get(&self, out: &mut [u8; 32]) {
        out[0..16].copy_from_slice(&self.encrypt_key);
        out[16..32].copy_from_slice(&self.tweak_key);
    }

    /// The two key halves XEX actually consumes.
    pub(crate) fn halves(&self) -> ([u8; 16], [u8; 16]) {
        (self.encrypt_key, self.tweak_key)
    }

    /// Whether any byte of either key is nonzero, i.e. whether a key is
    /// installed. Constant-time: every byte of both keys is OR-accumulated
    /// before the single resulting comparison, so the number of nonzero
    /// bytes and their position are not observable through timing.
    pub fn is_nonzero(&self) -> bool {
        let zero = [0u8; 16];
        let encrypt_is_zero: Choice = self.encrypt_key.ct_eq(&zero);
        let tweak_is_zero: Choice = self.tweak_key.ct_eq(&zero);
        let both_zero = encrypt_is_zero & tweak_is_zero;
        !bool::from(both_zero)
    }

    /// Overwrite both keys with `0xFF`, then with `0x00`. The intermediate
    /// nonzero pass is deliberate — it defeats storage layers that might
    /// otherwise elide a zero-write, and the two writes are issued through
    /// [`core::ptr::write_volatile`] so the optimizer cannot fuse or drop
    /// either of them.
    pub fn clear(&mut self) {
        Self::overwrite(&mut self.encrypt_key, 0xFF);
        Self::overwrite(&mut self.tweak_key, 0xFF);
        Self::overwrite(&mut self.encrypt_key, 0x00);
        Self::overwrite(&mut self.tweak_key, 0x00);
    }

    fn overwrite(key: &mut [u8; 16], value: u8) {
        for byte in key.iter_mut() {
            // SAFETY: `byte` is a valid, aligned, writable `u8` reference for
            // the duration of this call.
            unsafe { core::ptr::write_volatile(byte as *mut u8, value) };
        }
    }
}
