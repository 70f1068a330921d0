//! # ORC Common Library
//!
//! Shared code for the ORC console crates including:
//! - API entity models (notes, groups, profiles, edges, invitations)
//! - v1/v2 content normalization
//! - Venue and role configuration
//! - Configuration loading (CLI → ENV → TOML → defaults)
//! - Console event bus
//! - Logging bootstrap

pub mod config;
pub mod content;
pub mod error;
pub mod events;
pub mod logging;
pub mod model;
pub mod venue;

pub use content::{ApiVersion, Content};
pub use error::{Error, Result};
pub use venue::{RatingName, RoleConfig, RoleKind, VenueConfig};
