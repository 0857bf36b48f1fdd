//! Favorites domain module.
//!
//! # Module Structure
//!
//! - `engine`: the favorites set engine (initialize, toggle, membership)

mod engine;

pub use engine::FavoritesEngine;
