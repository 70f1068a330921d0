//! Table view state
//!
//! Holds the filter, sort, page and selection for one paper table. Changing
//! the filter or the sort returns to page 1; the selection is kept.

use crate::aggregator::PaperRow;
use crate::table::export::{ExportColumn, ExportTable};
use crate::table::filter::{FilterError, PropertyAllowList, RowFilter};
use crate::table::pagination::{calculate_pagination, Pagination};
use crate::table::selection::{MessageDraft, MessageTarget, Selection};
use crate::table::sort::{sort_rows, SortColumn, SortDirection};
use orc_common::VenueConfig;
use serde::Serialize;

/// Why a page has no rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    NoPapersSubmitted,
    NoMatchingPapers,
}

impl EmptyReason {
    pub fn message(self) -> &'static str {
        match self {
            EmptyReason::NoPapersSubmitted => "No papers have been submitted",
            EmptyReason::NoMatchingPapers => "No papers matching search criteria",
        }
    }
}

/// One rendered page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage<'r> {
    pub rows: Vec<&'r PaperRow>,
    pub pagination: Pagination,
    pub total_rows: usize,
    pub matching_rows: usize,
    pub sort: String,
    pub direction: SortDirection,
    pub empty: Option<EmptyReason>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct TableView {
    properties: PropertyAllowList,
    filter_text: String,
    filter: RowFilter,
    sort: SortColumn,
    direction: SortDirection,
    default_direction: SortDirection,
    page: usize,
    pub selection: Selection,
}

impl TableView {
    /// View with the venue's default sort
    pub fn new(venue: &VenueConfig) -> Self {
        let sort = match venue.default_sort.as_deref() {
            Some(name) => name.parse().unwrap_or_else(|e| {
                tracing::warn!(default_sort = %name, error = %e, "Ignoring configured default sort");
                SortColumn::default()
            }),
            None => SortColumn::default(),
        };
        let direction = if venue.default_sort_desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };

        Self {
            properties: PropertyAllowList::for_venue(venue),
            filter_text: String::new(),
            filter: RowFilter::All,
            sort,
            direction,
            default_direction: direction,
            page: 1,
            selection: Selection::default(),
        }
    }

    pub fn properties(&self) -> &PropertyAllowList {
        &self.properties
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    /// Replace the filter; on a parse error the previous filter stays
    pub fn set_filter(&mut self, text: &str) -> Result<(), FilterError> {
        self.filter = RowFilter::parse(text, &self.properties)?;
        self.filter_text = text.to_string();
        self.page = 1;
        Ok(())
    }

    pub fn set_sort(&mut self, column: SortColumn, direction: SortDirection) {
        self.sort = column;
        self.direction = direction;
        self.page = 1;
    }

    /// Same column flips direction; a new column starts in the venue's
    /// default direction
    pub fn toggle_sort(&mut self, column: SortColumn) {
        if self.sort == column {
            self.direction = self.direction.reversed();
        } else {
            self.sort = column;
            self.direction = self.default_direction;
        }
        self.page = 1;
    }

    pub fn sort(&self) -> (&SortColumn, SortDirection) {
        (&self.sort, self.direction)
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Filtered and sorted rows, every page
    pub fn visible<'r>(&self, rows: &'r [PaperRow]) -> Vec<&'r PaperRow> {
        let mut visible = self.filter.apply(rows);
        sort_rows(&mut visible, &self.sort, self.direction);
        visible
    }

    pub fn render<'r>(&self, rows: &'r [PaperRow]) -> TablePage<'r> {
        let visible = self.visible(rows);
        let pagination = calculate_pagination(visible.len(), self.page);
        let empty = if rows.is_empty() {
            Some(EmptyReason::NoPapersSubmitted)
        } else if visible.is_empty() {
            Some(EmptyReason::NoMatchingPapers)
        } else {
            None
        };

        TablePage {
            rows: pagination.slice(&visible).to_vec(),
            pagination,
            total_rows: rows.len(),
            matching_rows: visible.len(),
            sort: self.sort.to_string(),
            direction: self.direction,
            empty,
            empty_message: empty.map(EmptyReason::message),
        }
    }

    /// Export the full filtered, sorted set regardless of page
    pub fn export(&self, rows: &[PaperRow], columns: &[ExportColumn]) -> ExportTable {
        ExportTable::build(self.visible(rows), columns)
    }

    /// Draft a message to members of the selected, loaded papers
    pub fn message_draft(
        &self,
        rows: &[PaperRow],
        target: MessageTarget,
        subject: &str,
        body: &str,
    ) -> MessageDraft {
        let selected = self.selection.rows(rows);
        MessageDraft::new(subject, body, target, &selected)
    }
}
