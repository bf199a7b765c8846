//! Authentication surface: token cookies and untrusted claim decoding.
//!
//! Token issuance and verification live elsewhere; this module only reads
//! identity hints out of bearer tokens for display and cart association.

pub mod token;

use serde::{Deserialize, Serialize};

use tangelo_core::UserId;

/// In-process authentication-state-changed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuthEvent {
    /// A user completed sign-in; carries the (unverified) decoded identity.
    SignedIn {
        user_id: UserId,
        email: Option<String>,
    },
    /// The user signed out.
    SignedOut,
}
