/// Ledger anchoring tasks.
pub(crate) mod anchor;

/// AI analysis tasks.
pub(crate) mod analysis;

/// Task selection, retries and the worker loop.
pub(crate) mod worker;
