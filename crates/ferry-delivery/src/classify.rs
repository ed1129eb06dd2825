//! Outcome classification of HTTP statuses.
//!
//! The retryable set is pipeline-wide policy and is checked first. 429 is
//! kept out of that set and reported as throttled so backoff can be tuned
//! separately. Everything else aborts.

use std::{collections::BTreeSet, sync::LazyLock};

use ferry_core::{AuthErrorCategory, OutcomeCategory};
use serde::{Deserialize, Serialize};

/// HTTP 429 Too Many Requests.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Set of HTTP statuses the pipeline treats as transient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetryableStatuses(BTreeSet<u16>);

impl RetryableStatuses {
    /// Builds a set from explicit statuses. 429 is never admitted.
    pub fn new(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self(statuses.into_iter().filter(|status| *status != TOO_MANY_REQUESTS).collect())
    }

    /// Whether `status` is in the set.
    pub fn contains(&self, status: u16) -> bool {
        self.0.contains(&status)
    }

    /// Iterates the statuses in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }
}

impl Default for RetryableStatuses {
    /// Request timeout plus every server error.
    fn default() -> Self {
        Self::new(std::iter::once(408).chain(500..=599))
    }
}

/// Assigns an [`OutcomeCategory`] to any HTTP status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeClassifier {
    retryable: RetryableStatuses,
}

impl OutcomeClassifier {
    /// Creates a classifier over the given retryable set.
    pub fn new(retryable: RetryableStatuses) -> Self {
        Self { retryable }
    }

    /// Classifies a status. Total and pure: never `Success`, never fails.
    pub fn classify(&self, status: u16) -> OutcomeCategory {
        if self.retryable.contains(status) {
            return OutcomeCategory::Retryable;
        }
        match status {
            TOO_MANY_REQUESTS => OutcomeCategory::Throttled,
            _ => OutcomeCategory::Abortable,
        }
    }

    /// The retryable set in use.
    pub fn retryable(&self) -> &RetryableStatuses {
        &self.retryable
    }
}

static DEFAULT_CLASSIFIER: LazyLock<OutcomeClassifier> = LazyLock::new(OutcomeClassifier::default);

/// Classifies a status against the default retryable set.
pub fn classify(status: u16) -> OutcomeCategory {
    DEFAULT_CLASSIFIER.classify(status)
}

/// Maps a Google-style OAuth error status to an auth sub-category.
///
/// Permission failures disable the destination; authentication failures
/// trigger a token refresh. Anything else is not an auth failure.
pub fn oauth_error_category(code: &str) -> AuthErrorCategory {
    match code {
        "PERMISSION_DENIED" => AuthErrorCategory::DisableDestination,
        "UNAUTHENTICATED" => AuthErrorCategory::RefreshToken,
        _ => AuthErrorCategory::None,
    }
}
