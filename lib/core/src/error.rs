//! Report-based results shared by the roofclaim crates.
//!
//! Domain errors live next to the code that raises them. Operations that
//! hand a failure across a crate boundary wrap it in a [`rootcause::Report`]
//! so callers can attach their own context.

use rootcause::Report;

/// Result whose error is a [`Report`] over the context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
