//! Table presentation
//!
//! Paged, filterable, sortable view over aggregated paper rows:
//! - `pagination`: fixed page size, page clamping
//! - `sort`: stable column sort, missing values last
//! - `filter`: basic title/number match or `+`-prefixed structured query
//! - `export`: ordered column list over the full filtered set
//! - `selection`: selected paper ids and bulk-message drafts
//! - `view`: table state tying the above together

pub mod export;
pub mod filter;
pub mod pagination;
pub mod selection;
pub mod sort;
pub mod view;

pub use export::{ExportColumn, ExportTable};
pub use filter::{FilterError, PropertyAllowList, RowFilter};
pub use pagination::{calculate_pagination, Pagination, PAGE_SIZE};
pub use selection::{MessageDraft, MessageTarget, Recipient, Selection};
pub use sort::{SortColumn, SortDirection};
pub use view::{EmptyReason, TablePage, TableView};
