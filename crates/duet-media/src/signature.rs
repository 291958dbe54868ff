//! Media host request signing.

use sha1::{Digest, Sha1};

/// Sign an upload/destroy request the way the media host verifies it:
/// lowercase-hex `SHA1` over `public_id={id}&timestamp={ts}` with the shared
/// secret appended.
pub fn sign_request(public_id: &str, timestamp: i64, api_secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("public_id={public_id}&timestamp={timestamp}"));
    hasher.update(api_secret);
    hex::encode(hasher.finalize())
}
