//! The pairing workflow: code generation, redemption, and the own-couple
//! subscription.

use chrono::Utc;
use tracing::{debug, info, warn};

use duet_domain::{Couple, CoupleId, UserId};
use duet_store::{DocumentStore, Fields, Query, StoreError, Value};

use crate::domain::types::{
    CONNECTION_CODES, COUPLES, ConnectionCode, MAX_MINT_ATTEMPTS, USERS, code_ttl, couple_from_doc,
    mint_code, new_code_fields, new_couple_fields, normalize_code,
};
use crate::error::PairingError;
use crate::watch::CoupleWatch;

/// Outcome of a successful redemption, suitable for immediate UI
/// confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct Redemption {
    pub couple_id: CoupleId,
    pub couple: Couple,
}

pub struct PairingService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> PairingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Mint a new connection code for `requester` and persist it, garbage
    /// collecting every stale code first. Returns the code string for
    /// out-of-band sharing.
    pub async fn generate_code(&self, requester: Option<&UserId>) -> Result<String, PairingError> {
        let requester = require_signed_in(requester)?;
        self.sweep_stale_codes().await;

        for attempt in 0..MAX_MINT_ATTEMPTS {
            let code = mint_code();
            match self
                .store
                .create(CONNECTION_CODES, &code, new_code_fields(&code, requester))
                .await
            {
                Ok(_) => {
                    info!(requester = %requester, code, "connection code generated");
                    return Ok(code);
                }
                // A live code already owns this key; mint another.
                Err(StoreError::AlreadyExists) => {
                    debug!(code, attempt, "code collision, re-minting");
                }
                Err(err) => return Err(PairingError::GenerationFailed(err)),
            }
        }
        Err(PairingError::GenerationFailed(StoreError::AlreadyExists))
    }

    /// Redeem a shared code, linking `requester` with the code's creator.
    ///
    /// The gates run strictly in order and the first failure aborts. The
    /// couple write itself is an atomic create-if-absent, so two racing
    /// redemptions that resolve to the same couple key can never both
    /// succeed.
    pub async fn redeem_code(
        &self,
        requester: Option<&UserId>,
        raw_code: &str,
    ) -> Result<Redemption, PairingError> {
        let requester = require_signed_in(requester)?;

        let code = normalize_code(raw_code);
        if code.is_empty() {
            return Err(PairingError::InvalidCode);
        }
        let doc = self
            .store
            .get(CONNECTION_CODES, &code)
            .await
            .map_err(PairingError::StoreUnavailable)?
            .ok_or(PairingError::InvalidCode)?;
        let record = ConnectionCode::from_doc(&doc);

        let Some(created_at) = record.created_at else {
            self.discard_code(&code).await;
            return Err(PairingError::CorruptCode);
        };
        let Some(creator) = record.created_by else {
            self.discard_code(&code).await;
            return Err(PairingError::CorruptCode);
        };
        if Utc::now() > created_at + code_ttl() {
            self.discard_code(&code).await;
            return Err(PairingError::CodeExpired);
        }
        if &creator == requester {
            return Err(PairingError::SelfConnection);
        }

        let couple_id = CoupleId::from_pair(&creator, requester);

        // Advisory pre-read so the common already-paired case fails before
        // building a document; the conditional create below is the real
        // arbiter under concurrency.
        if self
            .store
            .get(COUPLES, couple_id.as_str())
            .await
            .map_err(PairingError::StoreUnavailable)?
            .is_some()
        {
            return Err(PairingError::AlreadyConnected);
        }

        let stored = match self
            .store
            .create(
                COUPLES,
                couple_id.as_str(),
                new_couple_fields(&creator, requester, &code),
            )
            .await
        {
            Ok(doc) => doc,
            Err(StoreError::AlreadyExists) => return Err(PairingError::AlreadyConnected),
            Err(err) => return Err(PairingError::RedemptionFailed(err)),
        };

        // Mark the code redeemed.
        self.store
            .update(
                CONNECTION_CODES,
                &code,
                Fields::from([("coupleId".to_owned(), Value::text(couple_id.as_str()))]),
            )
            .await
            .map_err(PairingError::RedemptionFailed)?;

        // Best-effort profile back-references. The couple document is the
        // source of truth; a failed patch is logged and repaired later.
        for uid in [&creator, requester] {
            let patch = Fields::from([("coupleId".to_owned(), Value::text(couple_id.as_str()))]);
            if let Err(err) = self.store.update(USERS, uid.as_str(), patch).await {
                warn!(uid = %uid, error = %err, "failed to set couple back-reference");
            }
        }

        let couple = couple_from_doc(&stored).map_err(PairingError::RedemptionFailed)?;
        info!(couple_id = %couple_id, "couple linked");
        Ok(Redemption { couple_id, couple })
    }

    /// Subscribe to "the requester's current couple, or none": two parallel
    /// equality subscriptions (creator side and redeemer side) merged
    /// first-match-wins. Teardown is explicit via [`CoupleWatch::stop`].
    pub async fn watch_own_couple(
        &self,
        requester: Option<&UserId>,
    ) -> Result<CoupleWatch, PairingError> {
        let requester = require_signed_in(requester)?;
        let side_a = self
            .store
            .watch(&Query::collection(COUPLES).where_eq("userA", Value::text(requester.as_str())))
            .await
            .map_err(PairingError::StoreUnavailable)?;
        let side_b = self
            .store
            .watch(&Query::collection(COUPLES).where_eq("userB", Value::text(requester.as_str())))
            .await
            .map_err(PairingError::StoreUnavailable)?;
        Ok(CoupleWatch::merge(side_a, side_b))
    }

    /// Best-effort garbage collection: delete every code older than the
    /// validity window. Partial completion is fine; the next call
    /// self-heals.
    async fn sweep_stale_codes(&self) {
        let codes = match self.store.query(&Query::collection(CONNECTION_CODES)).await {
            Ok(docs) => docs,
            Err(err) => {
                warn!(error = %err, "stale-code sweep query failed");
                return;
            }
        };
        let now = Utc::now();
        for doc in codes {
            let stale = match doc.timestamp("createdAt") {
                Some(created_at) => created_at + code_ttl() < now,
                // No resolvable timestamp: the code can never be redeemed.
                None => true,
            };
            if stale {
                if let Err(err) = self.store.delete(CONNECTION_CODES, &doc.id).await {
                    warn!(code = %doc.id, error = %err, "failed to delete stale code");
                }
            }
        }
    }

    /// Remove a code found expired or corrupt during redemption.
    async fn discard_code(&self, code: &str) {
        if let Err(err) = self.store.delete(CONNECTION_CODES, code).await {
            warn!(code, error = %err, "failed to delete unusable code");
        }
    }
}

fn require_signed_in(requester: Option<&UserId>) -> Result<&UserId, PairingError> {
    match requester {
        Some(uid) if !uid.is_empty() => Ok(uid),
        _ => Err(PairingError::Unauthenticated),
    }
}
