use std::sync::Arc;

use tracing::{debug, warn};

use storage::repository::{StorageError, UserRepository};
use trainer_core::analytics::{AnalyticsSummary, Scope, summarize};
use trainer_core::model::{ProgressDraft, ProgressHistory, UserId};
use trainer_core::time::Clock;

use crate::error::{AuthError, ProgressServiceError};
use crate::token::TokenClaims;

//
// ─── PROGRESS UPDATE ───────────────────────────────────────────────────────────
//

/// Result of a progress submission: the updated history and its summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub history: ProgressHistory,
    pub summary: AnalyticsSummary,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Progress submission and analytics over an injected user repository.
pub struct ProgressService {
    users: Arc<dyn UserRepository>,
    clock: Clock,
}

fn store_failure(err: StorageError) -> ProgressServiceError {
    warn!(error = %err, "durable store failure");
    ProgressServiceError::Storage(err)
}

impl ProgressService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, clock: Clock) -> Self {
        Self { users, clock }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Append a progress entry to a user's history and return the updated
    /// history with freshly derived analytics.
    ///
    /// The draft is validated before any lookup, so a rejected submission
    /// leaves the store untouched. The history swap is a single repository
    /// write: a submission either fully appends-and-trims or has no effect.
    /// `recorded_at` is stamped from the service clock, keeping history
    /// order equal to insertion order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Validation` for out-of-range input,
    /// `UserNotFound` for unknown users, `Storage` on store failure.
    pub async fn submit(
        &self,
        user_id: UserId,
        draft: ProgressDraft,
    ) -> Result<ProgressUpdate, ProgressServiceError> {
        let entry = draft.validate(self.clock.now())?;

        let mut user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(store_failure)?
            .ok_or(ProgressServiceError::UserNotFound)?
            .into_user()
            .map_err(store_failure)?;

        let evicted = user.record_progress(entry);
        if evicted > 0 {
            debug!(user_id = %user_id, evicted, "trimmed history to cap");
        }

        self.users
            .replace_history(user_id, user.history())
            .await
            .map_err(|err| match err {
                StorageError::NotFound => ProgressServiceError::UserNotFound,
                other => store_failure(other),
            })?;

        let summary = summarize(user.history().entries(), Scope::All, self.clock.now());
        Ok(ProgressUpdate {
            history: user.history().clone(),
            summary,
        })
    }

    /// Derive analytics for a user, gated on the token subject.
    ///
    /// The subject check runs before the lookup: a mismatched token learns
    /// nothing about the requested user, not even whether it exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` when the token subject differs from
    /// `user_id`, `UserNotFound` for unknown users, `Storage` on store
    /// failure.
    pub async fn analytics_for(
        &self,
        claims: &TokenClaims,
        user_id: UserId,
        scope: Scope,
    ) -> Result<AnalyticsSummary, ProgressServiceError> {
        if claims.user_id != user_id {
            return Err(ProgressServiceError::Auth(AuthError::Forbidden));
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(store_failure)?
            .ok_or(ProgressServiceError::UserNotFound)?
            .into_user()
            .map_err(store_failure)?;

        Ok(summarize(user.history().entries(), scope, self.clock.now()))
    }
}
