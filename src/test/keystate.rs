//! Tests for [`KeyState`](crate::keystate::KeyState).

use crate::keystate::KeyState;

#[test]
fn default_state_is_zero_and_reports_no_key() {
    let state = KeyState::default();
    assert!(!state.is_nonzero());

    let mut out = [0u8; 32];
    state.get(&mut out);
    assert_eq!(out, [0u8; 32]);
}

#[test]
fn set_then_get_round_trips() {
    let mut state = KeyState::default();
    let mut key = [0u8; 32];
    for (i, b) in key.iter_mut().enumerate() {
        *b = i as u8;
    }
    state.set(&key);

    let mut out = [0u8; 32];
    state.get(&mut out);
    assert_eq!(out, key);
    assert!(state.is_nonzero());
}

#[test]
fn a_single_nonzero_byte_in_either_half_is_nonzero() {
    let mut encrypt_only = KeyState::default();
    let mut key = [0u8; 32];
    key[0] = 1;
    encrypt_only.set(&key);
    assert!(encrypt_only.is_nonzero());

    let mut tweak_only = KeyState::default();
    let mut key = [0u8; 32];
    key[31] = 1;
    tweak_only.set(&key);
    assert!(tweak_only.is_nonzero());
}

#[test]
fn clear_zeroes_the_key_and_is_idempotent() {
    let mut state = KeyState::default();
    state.set(&[0xAB; 32]);
    assert!(state.is_nonzero());

    state.clear();
    assert!(!state.is_nonzero());
    let mut out = [0u8; 32];
    state.get(&mut out);
    assert_eq!(out, [0u8; 32]);

    state.clear();
    assert!(!state.is_nonzero());
}
