//! Chat Layout
//!
//! Incremental layout state engine for variable-height, sectioned,
//! bottom-anchored scrolling lists such as chat transcripts.
//!
//! The engine keeps two snapshots of the layout while a batch update is in
//! flight, tracks element identity across the batch, and computes the
//! scroll compensation that keeps the anchored edge visually stationary.
//! It does no rendering: hosts feed it sizes and structural changes and
//! read frames back.

pub mod config;
pub mod logging;
pub mod model;
pub mod state;

// Scripted replay used by the binary
pub mod integration;
