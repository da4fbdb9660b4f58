use std::sync::atomic::{AtomicU64, Ordering};

use crate::business_logic::screener::{
    CompanySource, FilterCriteria, ScreenerTable, SortField, SortSpec,
};
use crate::models::company::CompanyRecord;

/// Monotonic request ids for search round trips.
#[derive(Debug, Default)]
pub struct SearchSequencer {
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchTicket(u64);

impl SearchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket that supersedes every earlier one.
    pub fn issue(&self) -> SearchTicket {
        SearchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: SearchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// One interactive screener session: the loaded rows plus the user's criteria
/// and sort. Clients that keep a table open across several searches hold one
/// of these so a slow earlier search cannot replace a newer one. The HTTP
/// handlers are stateless and build a fresh `ScreenerTable` per request.
#[derive(Debug, Default)]
pub struct ScreenerView {
    sequencer: SearchSequencer,
    source: Option<CompanySource>,
    rows: Vec<CompanyRecord>,
    pub criteria: FilterCriteria,
    pub sort: SortSpec,
}

impl ScreenerView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new search query and returns the ticket its response must carry.
    pub fn begin_search(&mut self, query: &str) -> SearchTicket {
        self.source = Some(CompanySource::Search(query.to_string()));
        self.sequencer.issue()
    }

    /// Applies search rows only when `ticket` is still the newest search.
    /// Returns whether the rows were applied.
    pub fn apply_search(&mut self, ticket: SearchTicket, rows: Vec<CompanyRecord>) -> bool {
        if !self.sequencer.is_latest(ticket) {
            tracing::debug!(
                "dropping stale search response {:?} ({} rows)",
                ticket,
                rows.len()
            );
            return false;
        }
        self.rows = rows;
        true
    }

    /// Replaces rows from a non-search load and invalidates searches in flight.
    pub fn load(&mut self, source: CompanySource, rows: Vec<CompanyRecord>) {
        self.sequencer.issue();
        self.source = Some(source);
        self.rows = rows;
    }

    pub fn select_sort(&mut self, field: SortField) {
        self.sort = self.sort.select(field);
    }

    pub fn source(&self) -> Option<&CompanySource> {
        self.source.as_ref()
    }

    pub fn table(&self) -> ScreenerTable {
        ScreenerTable::build(self.rows.clone(), &self.criteria, self.sort)
    }
}
