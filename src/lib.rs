//! Fleet auditor for the ArNS name-resolution gateway network.
//!
//! For one epoch the observer resolves a set of names against every gateway
//! in the fleet and against a trusted reference gateway, verifies each
//! gateway's operator identity, and aggregates the comparisons into a
//! deterministic audit report. Signing and anchoring the report happen
//! outside this crate.
//!
//! Applications typically depend on [`config::ObserverConfig`] to bootstrap
//! a run, [`report::ReportBuilder`] to produce reports, and the
//! [`interfaces`] traits to supply epoch heights, name lists, and gateway
//! hosts.

pub mod assessment;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod ownership;
pub mod report;
pub mod resolver;
pub mod types;
