//! Store-style push key generation.
//!
//! A push key is 20 characters: 8 encoding the current time in
//! milliseconds, then 12 random, drawn from a 64-character alphabet
//! that sorts in ASCII order. Keys generated in later milliseconds
//! therefore sort after earlier ones; within the same millisecond,
//! uniqueness rests on 72 bits of randomness.

use chrono::Utc;
use rand::Rng;

/// Alphabet in ASCII order so key order tracks creation order.
const PUSH_ALPHABET: &[u8; 64] =
    b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Generates a fresh 20-character push key.
pub fn push_key() -> String {
    let mut millis = Utc::now().timestamp_millis() as u64;

    let mut encoded = [0u8; 20];
    for slot in encoded[..8].iter_mut().rev() {
        *slot = PUSH_ALPHABET[(millis % 64) as usize];
        millis /= 64;
    }

    let mut rng = rand::rng();
    for slot in encoded[8..].iter_mut() {
        *slot = PUSH_ALPHABET[rng.random_range(0..64)];
    }

    encoded.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_key_length_and_alphabet() {
        let key = push_key();
        assert_eq!(key.len(), 20);
        assert!(key.bytes().all(|b| PUSH_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<String> = (0..100).map(|_| push_key()).collect();
        assert_eq!(keys.len(), 100);
    }

    #[test]
    fn test_keys_sort_by_creation_time() {
        let first = push_key();
        thread::sleep(Duration::from_millis(2));
        let second = push_key();
        assert!(first < second);
    }
}
