//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations. Each
//! command handler persists through the ports first and publishes its event
//! only after the write succeeded.

pub mod decision;
pub mod team;

#[cfg(test)]
pub(crate) mod test_support;
