//! Short record identifiers
//!
//! Ids are 8 lowercase base-36 characters derived from a SHA-256 digest of
//! a seed (usually the record's title or name), a random salt and an
//! attempt counter. The first character is always a letter, so an id can
//! be written after `table:` without escaping.

use sha2::{Digest, Sha256};

const ID_LEN: usize = 8;
const MAX_ATTEMPTS: u32 = 16;
const ALPHABET: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Produces candidate ids for one new record
///
/// Callers check each candidate for a collision and ask for the next one
/// until a free id turns up, or the attempts run out.
#[derive(Debug)]
pub struct IdGenerator {
    seed: String,
    salt: u64,
    attempt: u32,
}

impl IdGenerator {
    pub fn new(seed: &str) -> Self {
        Self {
            seed: seed.to_string(),
            salt: rand::random(),
            attempt: 0,
        }
    }

    /// Next candidate, or `None` once the attempts are used up.
    pub fn next_id(&mut self) -> Option<String> {
        if self.attempt >= MAX_ATTEMPTS {
            return None;
        }

        let mut hasher = Sha256::new();
        hasher.update(self.seed.as_bytes());
        hasher.update(self.salt.to_le_bytes());
        hasher.update(self.attempt.to_le_bytes());
        let digest = hasher.finalize();
        self.attempt += 1;

        let id = digest
            .iter()
            .take(ID_LEN)
            .enumerate()
            .map(|(i, byte)| {
                let index = if i == 0 {
                    *byte as usize % 26
                } else {
                    *byte as usize % ALPHABET.len()
                };
                ALPHABET[index] as char
            })
            .collect();
        Some(id)
    }
}
