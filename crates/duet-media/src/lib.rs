//! The media host boundary: signed image upload and deletion against the
//! Cloudinary REST API.

pub mod cloudinary;
pub mod error;
pub mod signature;

pub use cloudinary::{CloudinaryConfig, MediaClient};
pub use error::MediaError;
pub use signature::sign_request;
