//! Bookswap: a peer-to-peer book exchange directory.
//!
//! Users register, authenticate with bearer tokens backed by server-side
//! session records, and list/search books owned by others. Password resets go
//! through an email OTP flow; changing a password invalidates every
//! outstanding session via an issued-at comparison rather than session
//! enumeration.

pub mod api;
pub mod cli;
