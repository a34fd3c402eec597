//! Built-in chain stages.
//!
//! - [`auth`]: credential extraction, token verification, session and
//!   account-status checks
//! - [`role`]: role accept/reject checks
//! - [`pagination`]: `page`/`limit` parsing
//! - [`multipart`]: streaming multipart/form-data parsing with per-file
//!   validation
//! - [`params`]: numeric path parameters
//!
//! The route compiler inserts the first four automatically from a route's
//! descriptor; [`params`] stages are declared explicitly as handlers.

pub mod auth;
pub mod multipart;
pub mod pagination;
pub mod params;
pub mod role;
