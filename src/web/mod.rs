//! Web API for the worklens dashboard
//!
//! Serves report listings, filter choices and rendered reports as JSON.

mod server;

pub use server::*;
