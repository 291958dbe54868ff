//! The Identity Provider boundary: sign-in (password or federated
//! credential), sign-out, current-identity lookup, and identity-change
//! subscriptions.
//!
//! [`FirebaseAuth`] consumes the hosted provider's public REST API;
//! [`testing::StaticIdentity`] is a fixed-identity stand-in for tests.

pub mod error;
pub mod firebase;
pub mod provider;
pub mod testing;

pub use error::AuthError;
pub use firebase::{FirebaseAuth, FirebaseAuthConfig};
pub use provider::{AuthUser, IdentityProvider};
