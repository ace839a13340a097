//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Typed mapping for joined profile shapes

mod database;
mod joined;
mod models;

pub use database::Database;
pub use joined::{is_online, Joined, ProfileCard};
pub use models::*;
