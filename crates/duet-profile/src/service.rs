//! Profile reads and edits over the `users` collection.

use tracing::{info, warn};

use duet_domain::{CoupleId, UserId, UserProfile};
use duet_media::MediaClient;
use duet_store::{Document, DocumentStore, Fields, StoreError, Value};

use crate::error::ProfileError;

const USERS: &str = "users";
const AVATAR_FOLDER: &str = "avatars";

/// The fields a user may edit from the profile screen. Everything else on
/// [`UserProfile`] is system-managed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDraft {
    pub display_name: String,
    pub bio: String,
    pub location: String,
    pub relationship_status: String,
}

pub struct ProfileService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> ProfileService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Seed the profile document right after account creation. A profile
    /// that already exists is left untouched.
    pub async fn initialize(
        &self,
        requester: Option<&UserId>,
        email: &str,
        display_name: &str,
    ) -> Result<(), ProfileError> {
        let requester = require_signed_in(requester)?;
        let fields = Fields::from([
            ("displayName".to_owned(), Value::text(display_name)),
            ("email".to_owned(), Value::text(email)),
            ("photoURL".to_owned(), Value::text("")),
            ("bio".to_owned(), Value::text("")),
            ("location".to_owned(), Value::text("")),
            ("relationshipStatus".to_owned(), Value::text("")),
            ("updatedAt".to_owned(), Value::ServerTimestamp),
        ]);
        match self.store.create(USERS, requester.as_str(), fields).await {
            Ok(_) => {
                info!(uid = %requester, "profile initialized");
                Ok(())
            }
            Err(StoreError::AlreadyExists) => Ok(()),
            Err(err) => Err(ProfileError::Store(err)),
        }
    }

    /// Fetch the requester's profile, or `None` when it was never created.
    pub async fn load(
        &self,
        requester: Option<&UserId>,
    ) -> Result<Option<UserProfile>, ProfileError> {
        let requester = require_signed_in(requester)?;
        let doc = self
            .store
            .get(USERS, requester.as_str())
            .await
            .map_err(ProfileError::Store)?;
        Ok(doc.as_ref().map(profile_from_doc))
    }

    /// Persist the editable fields, merging into whatever else the document
    /// holds. `updatedAt` is stamped by the store.
    pub async fn save(
        &self,
        requester: Option<&UserId>,
        draft: &ProfileDraft,
    ) -> Result<(), ProfileError> {
        let requester = require_signed_in(requester)?;
        let fields = Fields::from([
            ("displayName".to_owned(), Value::text(draft.display_name.trim())),
            ("bio".to_owned(), Value::text(draft.bio.trim())),
            ("location".to_owned(), Value::text(draft.location.trim())),
            (
                "relationshipStatus".to_owned(),
                Value::text(draft.relationship_status.trim()),
            ),
            ("updatedAt".to_owned(), Value::ServerTimestamp),
        ]);
        self.store
            .set_merge(USERS, requester.as_str(), fields)
            .await
            .map_err(ProfileError::Store)?;
        info!(uid = %requester, "profile saved");
        Ok(())
    }

    /// Upload a new avatar and point the profile at its hosted URL. The
    /// previous hosted image, if any, is removed best-effort.
    pub async fn set_photo(
        &self,
        requester: Option<&UserId>,
        media: &MediaClient,
        bytes: Vec<u8>,
        extension: &str,
    ) -> Result<String, ProfileError> {
        let requester = require_signed_in(requester)?;
        let url = media
            .upload(bytes, requester.as_str(), Some(AVATAR_FOLDER), extension)
            .await
            .map_err(ProfileError::PhotoUpload)?;
        self.apply_photo_url(requester, &url).await?;
        Ok(url)
    }

    /// Clear the avatar reference and drop the hosted image.
    pub async fn remove_photo(
        &self,
        requester: Option<&UserId>,
        media: &MediaClient,
    ) -> Result<(), ProfileError> {
        let requester = require_signed_in(requester)?;
        let public_id = format!("{AVATAR_FOLDER}/{requester}");
        if let Err(err) = media.destroy(&public_id).await {
            warn!(uid = %requester, error = %err, "failed to remove hosted avatar");
        }
        self.apply_photo_url(requester, "").await
    }

    async fn apply_photo_url(&self, requester: &UserId, url: &str) -> Result<(), ProfileError> {
        let fields = Fields::from([
            ("photoURL".to_owned(), Value::text(url)),
            ("updatedAt".to_owned(), Value::ServerTimestamp),
        ]);
        self.store
            .set_merge(USERS, requester.as_str(), fields)
            .await
            .map_err(ProfileError::Store)
    }
}

fn require_signed_in(requester: Option<&UserId>) -> Result<&UserId, ProfileError> {
    match requester {
        Some(uid) if !uid.is_empty() => Ok(uid),
        _ => Err(ProfileError::Unauthenticated),
    }
}

/// Tolerant mapping from the wire document; absent fields become defaults.
fn profile_from_doc(doc: &Document) -> UserProfile {
    UserProfile {
        display_name: doc.text("displayName").unwrap_or_default().to_owned(),
        email: doc.text("email").unwrap_or_default().to_owned(),
        photo_url: doc.text("photoURL").unwrap_or_default().to_owned(),
        bio: doc.text("bio").unwrap_or_default().to_owned(),
        location: doc.text("location").unwrap_or_default().to_owned(),
        relationship_status: doc
            .text("relationshipStatus")
            .unwrap_or_default()
            .to_owned(),
        couple_id: doc.text("coupleId").map(CoupleId::from_raw),
        updated_at: doc.timestamp("updatedAt"),
    }
}

#[cfg(test)]
mod tests {
    use duet_store::MemoryStore;

    use super::*;

    fn svc(store: &MemoryStore) -> ProfileService<MemoryStore> {
        ProfileService::new(store.clone())
    }

    fn uid(s: &str) -> UserId {
        UserId::from(s)
    }

    #[tokio::test]
    async fn load_requires_a_signed_in_user() {
        let store = MemoryStore::new();
        assert!(matches!(
            svc(&store).load(None).await,
            Err(ProfileError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn load_returns_none_for_a_missing_profile() {
        let store = MemoryStore::new();
        let loaded = svc(&store).load(Some(&uid("u1"))).await.unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let store = MemoryStore::new();
        let service = svc(&store);
        let user = uid("u1");

        service
            .initialize(Some(&user), "u1@example.com", "Uma")
            .await
            .unwrap();
        service
            .save(
                Some(&user),
                &ProfileDraft {
                    display_name: "Uma Q".to_owned(),
                    ..ProfileDraft::default()
                },
            )
            .await
            .unwrap();
        // A repeat signup must not clobber the edited profile.
        service
            .initialize(Some(&user), "u1@example.com", "Uma")
            .await
            .unwrap();

        let profile = service.load(Some(&user)).await.unwrap().unwrap();
        assert_eq!(profile.display_name, "Uma Q");
        assert_eq!(profile.email, "u1@example.com");
    }

    #[tokio::test]
    async fn save_trims_and_merges_editable_fields() {
        let store = MemoryStore::new();
        let service = svc(&store);
        let user = uid("u1");
        service
            .initialize(Some(&user), "u1@example.com", "Uma")
            .await
            .unwrap();

        service
            .save(
                Some(&user),
                &ProfileDraft {
                    display_name: "  Uma  ".to_owned(),
                    bio: "hi".to_owned(),
                    location: "Lisbon".to_owned(),
                    relationship_status: "engaged".to_owned(),
                },
            )
            .await
            .unwrap();

        let profile = service.load(Some(&user)).await.unwrap().unwrap();
        assert_eq!(profile.display_name, "Uma");
        assert_eq!(profile.bio, "hi");
        assert_eq!(profile.location, "Lisbon");
        assert_eq!(profile.relationship_status, "engaged");
        assert_eq!(profile.email, "u1@example.com", "merge keeps system fields");
        assert!(profile.updated_at.is_some());
    }

    #[tokio::test]
    async fn photo_url_merge_keeps_the_rest_of_the_profile() {
        let store = MemoryStore::new();
        let service = svc(&store);
        let user = uid("u1");
        service
            .initialize(Some(&user), "u1@example.com", "Uma")
            .await
            .unwrap();

        service
            .apply_photo_url(&user, "https://cdn.example/avatars/u1.jpg")
            .await
            .unwrap();

        let profile = service.load(Some(&user)).await.unwrap().unwrap();
        assert_eq!(profile.photo_url, "https://cdn.example/avatars/u1.jpg");
        assert_eq!(profile.display_name, "Uma");
    }
}
