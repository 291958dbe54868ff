//! The Pairing Service: mediates the two-actor handshake that links two
//! identities into a couple, using a short-lived human-shareable code as
//! the out-of-band channel.
//!
//! The store handle is an explicit constructor dependency and every
//! operation takes the acting identity as an argument, so the whole flow
//! runs unchanged against [`duet_store::MemoryStore`] in tests.

pub mod domain;
pub mod error;
pub mod service;
pub mod watch;

pub use error::PairingError;
pub use service::{PairingService, Redemption};
pub use watch::CoupleWatch;
