//! Ratchet Core
//!
//! Core types for the Ratchet job execution engine.
//!
//! This crate contains:
//! - Domain types: the job record and its status state machine
//! - DTOs: enqueue options and query filters exchanged with storage adapters
//!
//! Note: Dispatch and persistence logic live in the engine crate; this crate
//! performs no I/O.

pub mod domain;
pub mod dto;
