//! Tests for [`EncryptedStorage`](crate::storage::EncryptedStorage).

use {
    crate::{
        error::StorageError,
        storage::{EncryptedStorage, MemoryStore},
    },
    rand::{rngs::StdRng, Rng, SeedableRng},
};

const STORE_SIZE: usize = 4096;

fn new_storage() -> EncryptedStorage<MemoryStore> {
    let mut storage = EncryptedStorage::new(MemoryStore::new(STORE_SIZE));
    storage.set_key(&[0x42; 32]);
    storage
}

#[test]
fn write_then_read_round_trips_within_one_block() {
    let mut storage = new_storage();
    let data = [1, 2, 3, 4, 5, 6, 7, 8];
    storage.encrypted_write(&data, 4).unwrap();

    let mut out = [0u8; 8];
    storage.encrypted_read(&mut out, 4).unwrap();
    assert_eq!(out, data);
}

#[test]
fn write_then_read_round_trips_across_block_boundaries() {
    let mut storage = new_storage();
    let data: Vec<u8> = (0..100u8).collect();
    storage.encrypted_write(&data, 10).unwrap();

    let mut out = vec![0u8; 100];
    storage.encrypted_read(&mut out, 10).unwrap();
    assert_eq!(out, data);
}

#[test]
fn a_narrower_write_does_not_disturb_neighboring_bytes_in_the_same_block() {
    let mut storage = new_storage();
    storage.encrypted_write(&[0xAA; 16], 0).unwrap();

    storage.encrypted_write(&[0xBB, 0xBB], 6).unwrap();

    let mut out = [0u8; 16];
    storage.encrypted_read(&mut out, 0).unwrap();
    let mut expected = [0xAAu8; 16];
    expected[6] = 0xBB;
    expected[7] = 0xBB;
    assert_eq!(out, expected);
}

#[test]
fn empty_range_is_rejected() {
    let mut storage = new_storage();
    let err = storage.encrypted_write(&[], 0).unwrap_err();
    assert!(matches!(err, StorageError::EmptyRange));

    let err = storage.encrypted_read(&mut [], 0).unwrap_err();
    assert!(matches!(err, StorageError::EmptyRange));
}

#[test]
fn address_overflow_is_rejected() {
    let mut storage = new_storage();
    let err = storage.encrypted_write(&[1, 2, 3], u32::MAX - 1).unwrap_err();
    assert!(matches!(err, StorageError::AddressOverflow));
}

#[test]
fn a_range_past_the_end_of_the_backing_store_is_a_raw_error() {
    let mut storage = new_storage();
    let err = storage
        .encrypted_write(&[1; 16], STORE_SIZE as u32)
        .unwrap_err();
    assert!(matches!(err, StorageError::Raw(_)));
}

#[test]
fn ciphertext_at_rest_does_not_equal_the_plaintext() {
    let mut storage = new_storage();
    let data = [0x11u8; 32];
    storage.encrypted_write(&data, 0).unwrap();

    assert_ne!(&storage.raw_store().raw_bytes()[0..32], &data[..]);
}

#[test]
fn the_same_plaintext_under_different_keys_produces_different_ciphertext() {
    let data = [0x55u8; 16];

    let mut a = EncryptedStorage::new(MemoryStore::new(STORE_SIZE));
    a.set_key(&[0x01; 32]);
    a.encrypted_write(&data, 0).unwrap();

    let mut b = EncryptedStorage::new(MemoryStore::new(STORE_SIZE));
    b.set_key(&[0x02; 32]);
    b.encrypted_write(&data, 0).unwrap();

    assert_ne!(a.raw_store().raw_bytes()[0..16], b.raw_store().raw_bytes()[0..16]);
}

#[test]
fn the_same_plaintext_at_different_addresses_produces_different_ciphertext() {
    let data = [0x77u8; 16];
    let mut storage = new_storage();
    storage.encrypted_write(&data, 0).unwrap();
    storage.encrypted_write(&data, 16).unwrap();

    assert_ne!(
        storage.raw_store().raw_bytes()[0..16],
        storage.raw_store().raw_bytes()[16..32]
    );
}

#[test]
fn tweak_key_change_then_encrypt_key_change_then_restore() {
    let original_key = [0x42u8; 32];
    let mut tweak_only_key = [0u8; 32];
    tweak_only_key[16] = 0x01;
    let mut encrypt_only_key = [0u8; 32];
    encrypt_only_key[0] = 0x01;

    let mut storage = EncryptedStorage::new(MemoryStore::new(STORE_SIZE));
    storage.set_key(&original_key);

    let mut mirror = vec![0u8; 1024];
    let mut rng = StdRng::seed_from_u64(0x5E4A_0001);
    for chunk in mirror.chunks_mut(128) {
        rng.fill(chunk);
    }
    for (i, chunk) in mirror.chunks(128).enumerate() {
        storage.encrypted_write(chunk, (i * 128) as u32).unwrap();
    }

    // S4: tweak-key-only change. Every 128-byte read now differs from the
    // original plaintext in at least one byte.
    storage.set_key(&tweak_only_key);
    for (i, original) in mirror.chunks(128).enumerate() {
        let mut out = vec![0u8; 128];
        storage.encrypted_read(&mut out, (i * 128) as u32).unwrap();
        assert_ne!(&out, original);
    }

    // S5: encrypt-key-only change, from the still-wrong tweak-only key.
    storage.set_key(&encrypt_only_key);
    for (i, original) in mirror.chunks(128).enumerate() {
        let mut out = vec![0u8; 128];
        storage.encrypted_read(&mut out, (i * 128) as u32).unwrap();
        assert_ne!(&out, original);
    }

    // S6: restoring the original key recovers the original plaintext.
    storage.set_key(&original_key);
    for (i, original) in mirror.chunks(128).enumerate() {
        let mut out = vec![0u8; 128];
        storage.encrypted_read(&mut out, (i * 128) as u32).unwrap();
        assert_eq!(&out, original);
    }
}

#[test]
fn one_hundred_thousand_random_operations_match_a_plaintext_mirror() {
    let mut rng = StdRng::seed_from_u64(0xE2F7_A51C_0000_0001);
    let mut storage = new_storage();
    let mut mirror = vec![0u8; STORE_SIZE];

    // Fill the whole range once so every subsequent read overlaps a
    // previously written region.
    storage.encrypted_write(&mirror, 0).unwrap();

    for _ in 0..100_000 {
        let len = rng.gen_range(1..=64);
        let max_addr = STORE_SIZE - len;
        let address = rng.gen_range(0..=max_addr) as u32;

        if rng.gen_bool(0.5) {
            let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            storage.encrypted_write(&data, address).unwrap();
            mirror[address as usize..address as usize + len].copy_from_slice(&data);
        } else {
            let mut out = vec![0u8; len];
            storage.encrypted_read(&mut out, address).unwrap();
            assert_eq!(
                out,
                mirror[address as usize..address as usize + len],
                "mismatch at address {address} length {len}"
            );
        }
    }
}
