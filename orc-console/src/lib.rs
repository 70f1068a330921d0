//! orc-console library interface
//!
//! Conference console data pipeline: fetch a venue's submissions, groups,
//! invitations, bids and profiles, resolve anonymous identities, join replies
//! to papers, aggregate per-paper rows and per-member progress, and present
//! them as filterable, sortable, paginated tables.

pub mod aggregator;
pub mod api;
pub mod console;
pub mod error;
pub mod fetcher;
pub mod identity;
pub mod joiner;
pub mod notify;
pub mod pipeline;
pub mod progress;
pub mod table;

pub use crate::aggregator::{PaperRow, RatingStats, StatValue};
pub use crate::console::{Console, ConsoleState, LoadOutcome, LoadedConsole};
pub use crate::error::{ConsoleError, Result};
pub use crate::fetcher::{ResourceFetcher, VenueSnapshot};
pub use crate::notify::{EventBusNotifier, Notifier, TracingNotifier};
pub use crate::pipeline::{build_console_data, ConsoleData};
