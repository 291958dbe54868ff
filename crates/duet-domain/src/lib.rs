//! Domain types shared across the duet workspace: identity newtypes, the
//! composite couple key, and the persisted document shapes.

pub mod couple;
pub mod id;
pub mod profile;

pub use couple::Couple;
pub use id::{CoupleId, UserId};
pub use profile::UserProfile;
