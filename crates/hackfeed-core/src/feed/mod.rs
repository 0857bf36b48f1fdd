//! Feed domain module.
//!
//! # Module Structure
//!
//! - `engine`: master story list, projections, submission and deletion
//! - `hostname`: hostname derivation shared by every display path

mod engine;
mod hostname;

pub use engine::FeedEngine;
pub use hostname::hostname_of;
