//! SupportDesk Core - Shared domain types.
//!
//! This crate provides the types used across all SupportDesk components:
//! - `web` - Ticket creation, listing and detail views (axum server)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation - no I/O, no
//! database access, no HTTP. Everything here can be unit tested without a
//! runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, status/category/role enums and the
//!   ticket draft validator

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
