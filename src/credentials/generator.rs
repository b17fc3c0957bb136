use rand::distributions::{Distribution, Uniform};
use rand::rngs::OsRng;

pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

/// ASCII letters, digits and the 32 ASCII punctuation characters.
pub const PASSWORD_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz\
ABCDEFGHIJKLMNOPQRSTUVWXYZ\
0123456789\
!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Draw `length` characters uniformly from [`PASSWORD_ALPHABET`] using the OS RNG.
///
/// `Uniform` over an index range rejection-samples, so every character is
/// equally likely.
pub fn generate_password(length: usize) -> String {
    let index = Uniform::from(0..PASSWORD_ALPHABET.len());
    index
        .sample_iter(OsRng)
        .take(length)
        .map(|i| PASSWORD_ALPHABET[i] as char)
        .collect()
}

/// Generate `count` passwords, redrawing until no two are equal.
/// Zero-length passwords cannot be distinct and are returned as-is.
pub fn generate_distinct(count: usize, length: usize) -> Vec<String> {
    if length == 0 {
        return vec![String::new(); count];
    }
    let mut out: Vec<String> = Vec::with_capacity(count);
    while out.len() < count {
        let candidate = generate_password(length);
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn alphabet_matches_letters_digits_punctuation() {
        assert_eq!(PASSWORD_ALPHABET.len(), 26 + 26 + 10 + 32);
        let unique: HashSet<u8> = PASSWORD_ALPHABET.iter().copied().collect();
        assert_eq!(unique.len(), PASSWORD_ALPHABET.len());
        assert!(
            PASSWORD_ALPHABET
                .iter()
                .all(|b| b.is_ascii_alphanumeric() || b.is_ascii_punctuation())
        );
    }

    #[test]
    fn generated_password_has_requested_length_and_alphabet() {
        for length in [8, 16, 64] {
            let pw = generate_password(length);
            assert_eq!(pw.chars().count(), length);
            assert!(pw.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn zero_length_yields_empty_string() {
        assert!(generate_password(0).is_empty());
    }

    #[test]
    fn consecutive_calls_differ() {
        let a = generate_password(DEFAULT_PASSWORD_LENGTH);
        let b = generate_password(DEFAULT_PASSWORD_LENGTH);
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_batch_has_no_repeats() {
        let batch = generate_distinct(3, DEFAULT_PASSWORD_LENGTH);
        let unique: HashSet<&String> = batch.iter().collect();
        assert_eq!(batch.len(), 3);
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn output_covers_more_than_one_character_class() {
        // 512 draws from 94 symbols; missing a whole class is vanishingly unlikely.
        let pw = generate_password(512);
        assert!(pw.chars().any(|c| c.is_ascii_alphabetic()));
        assert!(pw.chars().any(|c| c.is_ascii_digit()));
        assert!(pw.chars().any(|c| c.is_ascii_punctuation()));
    }
}
