/// AI analysis routes.
pub(crate) mod ai;

/// Authentication-related routes.
pub(crate) mod auth;

/// Ledger anchoring verification and token minting routes.
pub(crate) mod blockchain;

/// Portfolio dashboard routes.
pub(crate) mod dashboard;

/// Patent management routes.
pub(crate) mod patents;
