//! REST API access
//!
//! `ApiClient` is the seam between the pipeline and the external API:
//! - `HttpApiClient`: reqwest implementation used against a live API
//! - `InMemoryApi`: serves a fixed fixture, used by tests and offline runs
//!
//! `get_all` follows offset/limit paging on top of either.

pub mod client;
pub mod http;
pub mod memory;

pub use client::{get_all, query, take_array, ApiClient, ApiError, QueryParams, DEFAULT_PAGE_LIMIT};
pub use http::{ApiOptions, HttpApiClient};
pub use memory::{ApiFixture, InMemoryApi};
