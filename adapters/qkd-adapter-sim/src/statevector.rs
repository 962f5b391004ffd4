//! Single-qubit statevector.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::FRAC_1_SQRT_2;

use qkd_channel::{Basis, PreparedState};

/// A single-qubit state α|0⟩ + β|1⟩.
#[derive(Debug, Clone)]
pub struct Qubit {
    amplitudes: [Complex64; 2],
}

impl Qubit {
    /// Create a qubit initialized to |0⟩.
    pub fn new() -> Self {
        Self {
            amplitudes: [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
        }
    }

    /// Build one of the four BB84 states from |0⟩.
    ///
    /// |1⟩ = X|0⟩, |+⟩ = H|0⟩, |−⟩ = HX|0⟩.
    pub fn prepared(state: PreparedState) -> Self {
        let mut qubit = Self::new();
        if state.bit() {
            qubit.apply_x();
        }
        if state.basis() == Basis::Diagonal {
            qubit.apply_h();
        }
        qubit
    }

    /// Pauli-X.
    pub fn apply_x(&mut self) {
        self.amplitudes.swap(0, 1);
    }

    /// Hadamard.
    pub fn apply_h(&mut self) {
        let [a, b] = self.amplitudes;
        self.amplitudes = [(a + b) * FRAC_1_SQRT_2, (a - b) * FRAC_1_SQRT_2];
    }

    /// Probability of reading `1` in the computational basis.
    pub fn probability_one(&self) -> f64 {
        self.amplitudes[1].norm_sqr()
    }

    /// Measure in `basis`, collapsing the state.
    ///
    /// A diagonal measurement rotates with H, reads the computational basis
    /// and rotates back, so the post-measurement state is |+⟩ or |−⟩.
    pub fn measure<R: Rng>(&mut self, basis: Basis, rng: &mut R) -> bool {
        if basis == Basis::Diagonal {
            self.apply_h();
        }

        let p1 = self.probability_one();
        let u: f64 = rng.r#gen();
        let outcome = u < p1;

        self.amplitudes = if outcome {
            [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)]
        } else {
            [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)]
        };

        if basis == Basis::Diagonal {
            self.apply_h();
        }
        outcome
    }
}

impl Default for Qubit {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_initial_state() {
        let q = Qubit::new();
        assert!(q.probability_one().abs() < EPS);
    }

    #[test]
    fn test_x_gate() {
        let mut q = Qubit::new();
        q.apply_x();
        assert!((q.probability_one() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_h_gate_superposition() {
        let mut q = Qubit::new();
        q.apply_h();
        assert!((q.probability_one() - 0.5).abs() < EPS);
        // H·H = I
        q.apply_h();
        assert!(q.probability_one().abs() < EPS);
    }

    #[test]
    fn test_prepared_states_are_deterministic_in_own_basis() {
        let mut rng = StdRng::seed_from_u64(11);
        for state in [
            PreparedState::Zero,
            PreparedState::One,
            PreparedState::Plus,
            PreparedState::Minus,
        ] {
            for _ in 0..20 {
                let mut q = Qubit::prepared(state);
                assert_eq!(q.measure(state.basis(), &mut rng), state.bit());
            }
        }
    }

    #[test]
    fn test_opposite_basis_is_unbiased() {
        let mut q = Qubit::prepared(PreparedState::Plus);
        assert!((q.probability_one() - 0.5).abs() < EPS);

        let mut rng = StdRng::seed_from_u64(3);
        let ones = (0..2000)
            .filter(|_| Qubit::prepared(PreparedState::One).measure(Basis::Diagonal, &mut rng))
            .count();
        assert!((800..1200).contains(&ones), "ones = {ones}");

        // Collapse: a second measurement in the same basis repeats the first.
        let first = q.measure(Basis::Rectilinear, &mut rng);
        let second = q.measure(Basis::Rectilinear, &mut rng);
        assert_eq!(first, second);
    }
}
