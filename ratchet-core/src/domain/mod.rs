//! Core domain types
//!
//! This module contains the domain structures shared by the engine and by
//! storage adapters. These types represent the fundamental business entities
//! and carry no persistence or scheduling logic of their own.

pub mod job;
