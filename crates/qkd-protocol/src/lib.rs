//! `qkd-protocol`: BB84-style key agreement.
//!
//! The classical half of quantum key distribution, run against any
//! [`qkd_channel::QuantumChannel`]:
//!
//! - **Generation** of random data bits and basis choices
//! - **Encoding** of (bit, basis) pairs into BB84 states and transmission
//! - **Measurement** in the receiver's bases
//! - **Sifting**: basis reconciliation and key projection
//! - **Security check** on a disclosed sample, with bounded retries
//! - **One-time pad** encryption with the resulting key
//!
//! # Quick start
//!
//! ```rust
//! use qkd_protocol::{Bitstring, decrypt, encrypt, project, reconcile};
//!
//! let sender_bases: Bitstring = "0101".parse().unwrap();
//! let receiver_bases: Bitstring = "0011".parse().unwrap();
//! let indices = reconcile(&sender_bases, &receiver_bases).unwrap();
//! assert_eq!(indices, vec![0, 3]);
//!
//! let data: Bitstring = "1010".parse().unwrap();
//! assert_eq!(project(&data, &indices).unwrap().to_string(), "10");
//!
//! let key = Bitstring::zeros(16);
//! let cipher = encrypt("Hi", &key).unwrap();
//! assert_eq!(decrypt(&cipher, &key).unwrap(), "Hi");
//! ```

pub mod bitstring;
pub mod check;
pub mod cipher;
pub mod config;
pub mod encoder;
pub mod error;
pub mod generator;
pub mod key;
pub mod measurement;
pub mod round;
pub mod sifting;

pub use bitstring::Bitstring;
pub use check::{DEFAULT_THRESHOLD, agreement, check};
pub use cipher::{OneTimePad, bits_to_message, decrypt, encrypt, message_to_bits};
pub use config::ProtocolConfig;
pub use encoder::{encode, transmit};
pub use error::{ProtocolError, ProtocolResult};
pub use generator::{generate, generate_with_rng};
pub use key::SecureKey;
pub use measurement::measure;
pub use round::{AgreedKey, AttemptOutcome, AttemptReport, KeyAgreement, RoundPhase};
pub use sifting::{project, reconcile};
