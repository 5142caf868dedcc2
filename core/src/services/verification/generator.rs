//! Verification code generation

use rand::{rngs::OsRng, RngCore};

use crate::domain::entities::verification_record::CODE_LENGTH;
use crate::errors::{VerificationError, VerificationResult};

/// Bytes at or above this value are discarded so that `byte % 10` is uniform
const REJECTION_THRESHOLD: u8 = 250;

/// Produces fixed-width numeric verification codes
pub trait CodeGenerator: Send + Sync {
    /// Generate a new `CODE_LENGTH`-digit code
    fn generate(&self) -> VerificationResult<String>;
}

/// Code generator drawing from the operating system CSPRNG
///
/// If the OS random source fails the generator reports
/// `EntropyUnavailable`; it never falls back to a weaker source.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRngCodeGenerator;

impl CodeGenerator for OsRngCodeGenerator {
    fn generate(&self) -> VerificationResult<String> {
        generate_digits(&mut OsRng)
    }
}

/// Draw `CODE_LENGTH` uniformly distributed decimal digits from `rng`
fn generate_digits<R: RngCore>(rng: &mut R) -> VerificationResult<String> {
    let mut code = String::with_capacity(CODE_LENGTH);
    let mut buf = [0u8; 16];

    while code.len() < CODE_LENGTH {
        rng.try_fill_bytes(&mut buf)
            .map_err(|e| VerificationError::EntropyUnavailable {
                reason: e.to_string(),
            })?;

        for byte in buf.iter().copied().filter(|b| *b < REJECTION_THRESHOLD) {
            code.push(char::from(b'0' + byte % 10));
            if code.len() == CODE_LENGTH {
                break;
            }
        }
    }

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Replays a fixed byte script, cycling when exhausted
    struct ScriptedRng {
        script: Vec<u8>,
        pos: usize,
    }

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            let mut bytes = [0u8; 4];
            self.fill_bytes(&mut bytes);
            u32::from_le_bytes(bytes)
        }

        fn next_u64(&mut self) -> u64 {
            let mut bytes = [0u8; 8];
            self.fill_bytes(&mut bytes);
            u64::from_le_bytes(bytes)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for slot in dest.iter_mut() {
                *slot = self.script[self.pos % self.script.len()];
                self.pos += 1;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            unreachable!("generator must use try_fill_bytes")
        }

        fn next_u64(&mut self) -> u64 {
            unreachable!("generator must use try_fill_bytes")
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            unreachable!("generator must use try_fill_bytes")
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy source offline"))
        }
    }

    #[test]
    fn test_generated_code_format() {
        let generator = OsRngCodeGenerator;
        for _ in 0..100 {
            let code = generator.generate().unwrap();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_codes_vary() {
        let generator = OsRngCodeGenerator;
        let codes: HashSet<String> = (0..100).map(|_| generator.generate().unwrap()).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_leading_zeros_are_kept() {
        let mut rng = ScriptedRng {
            script: vec![0, 10, 20, 30, 40, 5],
            pos: 0,
        };
        assert_eq!(generate_digits(&mut rng).unwrap(), "000005");
    }

    #[test]
    fn test_biased_bytes_are_rejected() {
        let mut rng = ScriptedRng {
            script: vec![255, 251, 0, 9, 10, 249, 123, 7, 42],
            pos: 0,
        };
        assert_eq!(generate_digits(&mut rng).unwrap(), "090937");
    }

    #[test]
    fn test_entropy_failure_is_reported() {
        match generate_digits(&mut BrokenRng) {
            Err(VerificationError::EntropyUnavailable { reason }) => {
                assert!(reason.contains("entropy source offline"));
            }
            other => panic!("expected EntropyUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_digit_distribution_is_roughly_uniform() {
        let generator = OsRngCodeGenerator;
        let mut counts = [0usize; 10];
        for _ in 0..2000 {
            for c in generator.generate().unwrap().chars() {
                counts[c.to_digit(10).unwrap() as usize] += 1;
            }
        }
        // 12_000 digits, 1_200 expected per bucket
        assert!(counts.iter().all(|&n| n > 900 && n < 1500), "{:?}", counts);
    }
}
