//! Decision Copilot - Core decision records for organisations
//!
//! Decisions move through a guided workflow (identify, stakeholders, method,
//! choose, publish), relate to each other through blocking and supersession
//! edges kept acyclic, and can be tagged with teams from an organisation's
//! team hierarchy.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;
pub mod telemetry;
