//! Randomness for pairing codes and secret keys
//!
//! A single [`RandomSource`] is shared by the whole process. Production uses
//! the operating system CSPRNG through `ring`; tests inject scripted sources.

use crate::error::RegistryError;
use ring::rand::{SecureRandom, SystemRandom};

/// Smallest pairing code.
pub const CODE_MIN: u32 = 100_000;
/// Largest pairing code.
pub const CODE_MAX: u32 = 999_999;
/// Number of random bytes behind a secret key.
pub const SECRET_KEY_BYTES: usize = 32;

const CODE_SPAN: u64 = (CODE_MAX - CODE_MIN + 1) as u64;
// Largest multiple of CODE_SPAN representable in a u32; draws above it are rejected.
const CODE_ZONE: u64 = (1u64 << 32) - ((1u64 << 32) % CODE_SPAN);

/// A cryptographically sound byte source.
pub trait RandomSource: Send + Sync {
    /// Fill `dest` with random bytes
    fn fill(&self, dest: &mut [u8]) -> Result<(), RegistryError>;
}

/// [`RandomSource`] backed by `ring::rand::SystemRandom`.
#[derive(Debug)]
pub struct SystemRandomSource {
    rng: SystemRandom,
}

impl SystemRandomSource {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for SystemRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandomSource {
    fn fill(&self, dest: &mut [u8]) -> Result<(), RegistryError> {
        self.rng.fill(dest).map_err(|_| RegistryError::Random)
    }
}

/// Draw a pairing code uniformly from `100000..=999999`.
pub fn pairing_code(rng: &dyn RandomSource) -> Result<String, RegistryError> {
    loop {
        let mut buf = [0u8; 4];
        rng.fill(&mut buf)?;
        let draw = u64::from(u32::from_be_bytes(buf));
        if draw < CODE_ZONE {
            let code = CODE_MIN as u64 + draw % CODE_SPAN;
            return Ok(code.to_string());
        }
    }
}

/// Generate a hex-encoded secret key.
pub fn secret_key(rng: &dyn RandomSource) -> Result<String, RegistryError> {
    let mut key = [0u8; SECRET_KEY_BYTES];
    rng.fill(&mut key)?;
    Ok(hex::encode(key))
}

/// Whether `code` has the shape of a pairing code.
pub fn is_pairing_code(code: &str) -> bool {
    code.len() == 6
        && code.bytes().all(|b| b.is_ascii_digit())
        && code.parse::<u32>().is_ok_and(|n| (CODE_MIN..=CODE_MAX).contains(&n))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Yields scripted 4-byte draws, then counter bytes for everything else.
    pub struct ScriptedRandom {
        draws: Mutex<VecDeque<u32>>,
        counter: Mutex<u8>,
    }

    impl ScriptedRandom {
        pub fn new(draws: impl IntoIterator<Item = u32>) -> Self {
            Self {
                draws: Mutex::new(draws.into_iter().collect()),
                counter: Mutex::new(0),
            }
        }

        /// A source whose pairing codes are exactly `codes`, in order.
        pub fn codes(codes: &[u32]) -> Self {
            Self::new(codes.iter().map(|c| c - CODE_MIN))
        }
    }

    impl RandomSource for ScriptedRandom {
        fn fill(&self, dest: &mut [u8]) -> Result<(), RegistryError> {
            if dest.len() == 4 {
                if let Some(draw) = self.draws.lock().unwrap().pop_front() {
                    dest.copy_from_slice(&draw.to_be_bytes());
                    return Ok(());
                }
            }
            let mut counter = self.counter.lock().unwrap();
            for byte in dest.iter_mut() {
                *counter = counter.wrapping_add(1);
                *byte = *counter;
            }
            Ok(())
        }
    }

    /// A source that always fails.
    pub struct FailingRandom;

    impl RandomSource for FailingRandom {
        fn fill(&self, _dest: &mut [u8]) -> Result<(), RegistryError> {
            Err(RegistryError::Random)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FailingRandom, ScriptedRandom};
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scripted_codes_map_to_the_same_code() {
        let rng = ScriptedRandom::codes(&[100_000, 999_999, 424_242]);
        assert_eq!(pairing_code(&rng).unwrap(), "100000");
        assert_eq!(pairing_code(&rng).unwrap(), "999999");
        assert_eq!(pairing_code(&rng).unwrap(), "424242");
    }

    #[test]
    fn test_draws_above_the_zone_are_rejected() {
        let rng = ScriptedRandom::new([u32::MAX, 5]);
        assert_eq!(pairing_code(&rng).unwrap(), "100005");
    }

    #[test]
    fn test_secret_key_is_hex_of_full_length() {
        let key = secret_key(&SystemRandomSource::new()).unwrap();
        assert_eq!(key.len(), SECRET_KEY_BYTES * 2);
        assert!(key.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_ne!(key, secret_key(&SystemRandomSource::new()).unwrap());
    }

    #[test]
    fn test_failing_source_propagates() {
        assert!(matches!(pairing_code(&FailingRandom), Err(RegistryError::Random)));
        assert!(matches!(secret_key(&FailingRandom), Err(RegistryError::Random)));
    }

    #[test]
    fn test_is_pairing_code() {
        assert!(is_pairing_code("123456"));
        assert!(!is_pairing_code("012345"));
        assert!(!is_pairing_code("12345"));
        assert!(!is_pairing_code("12345a"));
        assert!(!is_pairing_code("+12345"));
    }

    proptest! {
        #[test]
        fn prop_any_accepted_draw_is_a_valid_code(draw in 0u32..(CODE_ZONE as u32)) {
            let rng = ScriptedRandom::new([draw]);
            let code = pairing_code(&rng).unwrap();
            prop_assert!(is_pairing_code(&code));
        }

        #[test]
        fn prop_system_codes_are_valid(_seed in any::<u8>()) {
            let code = pairing_code(&SystemRandomSource::new()).unwrap();
            prop_assert!(is_pairing_code(&code));
        }
    }
}
