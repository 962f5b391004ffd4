//! Random bit and basis generation.
//!
//! Each bit is drawn independently and uniformly. The generator does not
//! promise cryptographic strength: callers that need it must pass a CSPRNG
//! to [`generate_with_rng`].

use rand::Rng;

use crate::bitstring::Bitstring;
use crate::error::{ProtocolError, ProtocolResult};

/// Generate `length` uniform random bits using the thread-local RNG.
pub fn generate(length: usize) -> ProtocolResult<Bitstring> {
    generate_with_rng(length, &mut rand::thread_rng())
}

/// Generate `length` uniform random bits from `rng`.
///
/// Seeding `rng` makes the output reproducible:
/// ```rust
/// use rand::SeedableRng;
/// let mut rng = rand::rngs::StdRng::seed_from_u64(42);
/// let bits = qkd_protocol::generate_with_rng(16, &mut rng).unwrap();
/// assert_eq!(bits.len(), 16);
/// ```
pub fn generate_with_rng<R: Rng + ?Sized>(length: usize, rng: &mut R) -> ProtocolResult<Bitstring> {
    if length == 0 {
        return Err(ProtocolError::InvalidLength(0));
    }
    Ok((0..length).map(|_| rng.r#gen::<bool>()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_length() {
        for len in [1, 7, 550] {
            assert_eq!(generate(len).unwrap().len(), len);
        }
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(generate(0), Err(ProtocolError::InvalidLength(0))));
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = generate_with_rng(64, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = generate_with_rng(64, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_roughly_balanced() {
        let bits = generate_with_rng(10_000, &mut StdRng::seed_from_u64(1)).unwrap();
        let ones = bits.iter().filter(|&b| b).count();
        assert!((4700..5300).contains(&ones), "ones = {ones}");
    }
}
