//! Authentication and session lifecycle.
//!
//! Credential storage, bearer-token issuance, server-side revocation, the
//! OTP password-reset state machine, and the per-request authentication
//! check. The session store keeps only SHA-256 digests of issued tokens;
//! passwords, OTP codes, and exchange tokens are argon2 hashes. Changing a
//! password invalidates every outstanding session through an issued-at
//! comparison instead of session enumeration.

pub(crate) mod credentials;
pub(crate) mod otp;
mod password;
pub(crate) mod principal;
pub(crate) mod session;
mod state;
mod storage;
pub(crate) mod token;
pub(crate) mod types;
mod utils;

pub use state::{AuthConfig, AuthState};
pub(crate) use principal::{require_auth, Principal};
