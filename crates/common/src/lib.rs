pub mod config;
pub mod hash;

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "ai")]
pub mod ai;

#[cfg(feature = "ledger")]
pub mod ledger;
