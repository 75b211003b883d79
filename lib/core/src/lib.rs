//! Core domain types and utilities for roofclaim.
//!
//! This crate provides the foundational types, error handling, and table
//! names shared by the access layer, the hosted backend client and the web
//! application.

pub mod error;
pub mod id;
pub mod table;

pub use error::Result;
pub use id::{ContactId, InvoiceId, JobId, ParseIdError, UserId};
