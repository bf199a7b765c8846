//! Cart mode and synchronization status enums.

use serde::{Deserialize, Serialize};

/// Which backing store the cart service was initialized against.
///
/// The mode is determined by the presence of an authenticated user
/// identifier at initialization time, never by the store's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartMode {
    /// Unauthenticated session; cart persisted locally.
    Guest,
    /// Signed-in user; cart persisted via the remote service.
    Authenticated,
}

impl CartMode {
    /// Short label used in user-facing cart messages.
    #[must_use]
    pub const fn cart_label(self) -> &'static str {
        match self {
            Self::Guest => "local cart",
            Self::Authenticated => "cart",
        }
    }
}

/// Lifecycle of the most recent service initialization attempt.
///
/// This tracks initialization (including guest-to-authenticated migration),
/// not individual mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Guest mode; nothing to synchronize.
    Idle,
    /// Authenticated initialization in flight.
    Syncing,
    /// Authenticated initialization succeeded.
    Synced,
    /// Authenticated initialization failed; cart state is best-effort.
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&CartMode::Guest).expect("serialize"),
            "\"guest\""
        );
        assert_eq!(
            serde_json::to_string(&CartMode::Authenticated).expect("serialize"),
            "\"authenticated\""
        );
    }

    #[test]
    fn test_sync_status_serde_lowercase() {
        for (status, json) in [
            (SyncStatus::Idle, "\"idle\""),
            (SyncStatus::Syncing, "\"syncing\""),
            (SyncStatus::Synced, "\"synced\""),
            (SyncStatus::Error, "\"error\""),
        ] {
            assert_eq!(serde_json::to_string(&status).expect("serialize"), json);
        }
    }

    #[test]
    fn test_cart_labels() {
        assert_eq!(CartMode::Guest.cart_label(), "local cart");
        assert_eq!(CartMode::Authenticated.cart_label(), "cart");
    }
}
