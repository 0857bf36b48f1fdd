//! Session domain module.
//!
//! Identity lifecycle of the client: login, registration, rehydration from the
//! persistent store on startup, and logout.
//!
//! # Module Structure
//!
//! - `manager`: the session manager

mod manager;

pub use manager::SessionManager;
