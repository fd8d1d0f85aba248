//! The spreadsheet as seen by the rest of the crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cell::Row;
use crate::error::GatewayError;

/// Columns read whenever a whole tab is scanned.
pub const FULL_RANGE: &str = "A:Z";

/// Properties of one tab, in the order the service lists them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub title: String,
    pub sheet_id: i64,
    pub index: i64,
}

/// Access to a single spreadsheet document.
///
/// Implementations perform no retries and no business logic: any transport or
/// service failure comes back as a [`GatewayError`].
#[async_trait]
pub trait SheetGateway: Send + Sync {
    async fn list_tabs(&self) -> Result<Vec<TabInfo>, GatewayError>;

    /// Reads `columns` (e.g. `"A:Z"`) of `tab`. Rows are ragged and an empty tab yields no rows.
    async fn read_range(&self, tab: &str, columns: &str) -> Result<Vec<Row>, GatewayError>;

    /// Inserts `rows` after the last row of `columns` in `tab`, stored as raw values.
    async fn append_rows(
        &self,
        tab: &str,
        columns: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<(), GatewayError>;
}

/// A1 notation for `columns` of `tab`, e.g. `'Level 5 LO'!A:Z`.
pub fn a1_range(tab: &str, columns: &str) -> String {
    format!("'{}'!{columns}", tab.replace('\'', "''"))
}

/// Output tabs are filled by the external marking process and never hold student rows.
pub fn is_output_tab(title: &str) -> bool {
    title.to_lowercase().contains("output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_tab_titles() {
        assert_eq!(a1_range("PCP Output", "A:Z"), "'PCP Output'!A:Z");
        assert_eq!(a1_range("Coach's tab", "A:I"), "'Coach''s tab'!A:I");
    }

    #[test]
    fn output_detection_ignores_case() {
        assert!(is_output_tab("PCP Output"));
        assert!(is_output_tab("OUTPUT archive"));
        assert!(!is_output_tab("PCP processing sheet"));
    }
}
