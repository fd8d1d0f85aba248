//! An in-process spreadsheet for tests and local runs.
//!
//! Behaves like the real service where the workflow cares: tabs keep their
//! listing order, rows are ragged, and reading or appending to an unknown tab is
//! rejected. On top of that it can fail on demand and can make rows appear in a
//! tab after it has been read a given number of times, which is how the external
//! marking process is simulated.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::cell::{Cell, Row};
use crate::error::GatewayError;
use crate::gateway::{SheetGateway, TabInfo};

#[derive(Debug)]
struct MemoryTab {
    info: TabInfo,
    rows: Vec<Row>,
    reads: usize,
    failing_reads: usize,
    /// Rows appended just before the read with this (1-based) number is served.
    scheduled: Vec<(usize, Vec<Row>)>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tabs: Vec<MemoryTab>,
    list_calls: usize,
    append_calls: usize,
    fail_listing: bool,
    fail_appends: bool,
}

impl MemoryState {
    fn tab_mut(&mut self, title: &str) -> Option<&mut MemoryTab> {
        self.tabs.iter_mut().find(|tab| tab.info.title == title)
    }

    fn tab(&self, title: &str) -> Option<&MemoryTab> {
        self.tabs.iter().find(|tab| tab.info.title == title)
    }
}

/// Shared handle: clones see and modify the same spreadsheet.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_tab(self, title: &str, rows: Vec<Row>) -> Self {
        self.add_tab(title, rows);
        self
    }

    /// Adds a tab at the end of the listing, replacing the rows of an existing tab with that title.
    pub fn add_tab(&self, title: &str, rows: Vec<Row>) {
        let mut state = self.state();
        if let Some(tab) = state.tab_mut(title) {
            tab.rows = rows;
            return;
        }
        let index = state.tabs.len() as i64;
        state.tabs.push(MemoryTab {
            info: TabInfo {
                title: title.to_string(),
                sheet_id: 1000 + index,
                index,
            },
            rows,
            reads: 0,
            failing_reads: 0,
            scheduled: Vec::new(),
        });
    }

    /// Current rows of `title`, or `None` if there is no such tab.
    pub fn rows(&self, title: &str) -> Option<Vec<Row>> {
        self.state().tab(title).map(|tab| tab.rows.clone())
    }

    /// Number of range reads served (or failed) for `title`.
    pub fn reads(&self, title: &str) -> usize {
        self.state().tab(title).map_or(0, |tab| tab.reads)
    }

    pub fn list_calls(&self) -> usize {
        self.state().list_calls
    }

    pub fn append_calls(&self) -> usize {
        self.state().append_calls
    }

    /// Total gateway calls of any kind.
    pub fn total_calls(&self) -> usize {
        let state = self.state();
        state.list_calls + state.append_calls + state.tabs.iter().map(|tab| tab.reads).sum::<usize>()
    }

    /// The next `count` reads of `title` fail with [`GatewayError::Rejected`].
    pub fn fail_next_reads(&self, title: &str, count: usize) {
        if let Some(tab) = self.state().tab_mut(title) {
            tab.failing_reads = count;
        }
    }

    pub fn fail_appends(&self, fail: bool) {
        self.state().fail_appends = fail;
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state().fail_listing = fail;
    }

    /// Appends `rows` to `title` right before its `read`-th read (counting from 1) is served.
    pub fn append_before_read(&self, title: &str, read: usize, rows: Vec<Row>) {
        if let Some(tab) = self.state().tab_mut(title) {
            tab.scheduled.push((read, rows));
        }
    }
}

fn trim_trailing_blanks(mut row: Row) -> Row {
    while row.last().is_some_and(Cell::is_blank) {
        row.pop();
    }
    row
}

#[async_trait]
impl SheetGateway for MemoryGateway {
    async fn list_tabs(&self) -> Result<Vec<TabInfo>, GatewayError> {
        let mut state = self.state();
        state.list_calls += 1;
        if state.fail_listing {
            return Err(GatewayError::Rejected(String::from("listing unavailable")));
        }
        Ok(state.tabs.iter().map(|tab| tab.info.clone()).collect())
    }

    async fn read_range(&self, tab: &str, _columns: &str) -> Result<Vec<Row>, GatewayError> {
        let mut state = self.state();
        let Some(tab) = state.tab_mut(tab) else {
            return Err(GatewayError::Rejected(format!(
                "Unable to parse range: '{tab}'"
            )));
        };
        tab.reads += 1;
        let read = tab.reads;
        let (due, later): (Vec<_>, Vec<_>) = tab
            .scheduled
            .drain(..)
            .partition(|(at, _)| *at <= read);
        tab.scheduled = later;
        for (_, rows) in due {
            tab.rows.extend(rows);
        }
        if tab.failing_reads > 0 {
            tab.failing_reads -= 1;
            return Err(GatewayError::Rejected(format!(
                "read of '{}' failed",
                tab.info.title
            )));
        }
        Ok(tab.rows.iter().cloned().map(trim_trailing_blanks).collect())
    }

    async fn append_rows(
        &self,
        tab: &str,
        _columns: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.append_calls += 1;
        if state.fail_appends {
            return Err(GatewayError::Rejected(String::from("append refused")));
        }
        let Some(tab) = state.tab_mut(tab) else {
            return Err(GatewayError::Rejected(format!(
                "Unable to parse range: '{tab}'"
            )));
        };
        tab.rows
            .extend(rows.into_iter().map(|row| row.into_iter().map(Cell::from).collect()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scheduled_rows_appear_on_the_requested_read() {
        let gateway = MemoryGateway::new().with_tab("PCP Output", vec![vec!["EvidenceId".into()]]);
        gateway.append_before_read("PCP Output", 2, vec![vec!["15009".into()]]);

        assert_eq!(gateway.read_range("PCP Output", "A:Z").await.unwrap().len(), 1);
        assert_eq!(gateway.read_range("PCP Output", "A:Z").await.unwrap().len(), 2);
        assert_eq!(gateway.reads("PCP Output"), 2);
    }

    #[tokio::test]
    async fn unknown_tabs_are_rejected() {
        let gateway = MemoryGateway::new();
        assert!(matches!(
            gateway.read_range("Nope", "A:Z").await,
            Err(GatewayError::Rejected(_))
        ));
        assert!(gateway
            .append_rows("Nope", "A:I", vec![vec![String::from("x")]])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn trailing_blank_cells_are_not_returned() {
        let gateway = MemoryGateway::new().with_tab("T", vec![]);
        gateway
            .append_rows("T", "A:I", vec![vec![String::from("a"), String::new(), String::new()]])
            .await
            .unwrap();
        assert_eq!(gateway.read_range("T", "A:Z").await.unwrap(), vec![vec![Cell::from("a")]]);
    }
}
