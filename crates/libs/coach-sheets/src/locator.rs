//! Finding a student's row across the spreadsheet's tabs.
//!
//! Student rows live in whichever tabs the staff keep them in, with no fixed
//! layout. The scan therefore looks for the email in any of the first six cells
//! and for the identifier in the first two, skipping output tabs and a header
//! row when one is recognised.

use serde::Serialize;
use tracing::{debug, warn};

use crate::cell::{Row, cell_at};
use crate::gateway::{FULL_RANGE, SheetGateway, TabInfo, is_output_tab};
use crate::prelude::*;

const EMAIL_COLUMNS: usize = 6;
const ID_COLUMNS: usize = 2;
const GROUP_COLUMN: usize = 4;
const HEADER_WORDS: [&str; 5] = ["email", "student email", "id", "student id", "name"];
/// How many searched tab titles a "student not found" error lists.
const LISTED_TABS: usize = 5;

/// Who to look for. At least one of the two must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentQuery {
    pub email: Option<String>,
    pub id: Option<String>,
}

impl StudentQuery {
    /// Blank values count as absent.
    pub fn new(email: Option<&str>, id: Option<&str>) -> Self {
        let clean = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(String::from)
        };
        Self {
            email: clean(email),
            id: clean(id),
        }
    }

    pub fn by_email(email: &str) -> Self {
        Self::new(Some(email), None)
    }

    pub fn by_id(id: &str) -> Self {
        Self::new(None, Some(id))
    }

    pub fn validate(&self) -> Result<()> {
        if self.email.is_none() && self.id.is_none() {
            return Err(Error::Validation(String::from(
                "Either student_email or student_id is required",
            )));
        }
        Ok(())
    }

    fn search_email(&self) -> Option<String> {
        self.email.as_deref().map(|email| email.trim().to_lowercase())
    }

    fn search_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim)
    }

    /// Whether `row` belongs to the queried student.
    pub fn matches(&self, row: &[crate::cell::Cell]) -> bool {
        if let Some(email) = self.search_email() {
            let hit = row
                .iter()
                .take(EMAIL_COLUMNS)
                .any(|cell| cell.to_string().trim().to_lowercase() == email);
            if hit {
                return true;
            }
        }
        if let Some(id) = self.search_id() {
            return row
                .iter()
                .take(ID_COLUMNS)
                .any(|cell| cell.to_string().trim() == id);
        }
        false
    }
}

/// `true` when one of the first six cells is a known column title.
pub fn is_header_row(row: &[crate::cell::Cell]) -> bool {
    row.iter().take(EMAIL_COLUMNS).any(|cell| {
        cell.as_text()
            .is_some_and(|text| HEADER_WORDS.contains(&text.to_lowercase().as_str()))
    })
}

/// The matched row and where it was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub tab_title: String,
    pub row_index: usize,
    pub row: Row,
    /// Group code read from the fifth column.
    pub group: String,
}

impl StudentRecord {
    /// First column of the matched row, string-coerced.
    pub fn student_id(&self) -> String {
        cell_at(&self.row, 0).map(ToString::to_string).unwrap_or_default()
    }

    /// Second column of the matched row, string-coerced.
    pub fn student_email(&self) -> String {
        cell_at(&self.row, 1).map(ToString::to_string).unwrap_or_default()
    }
}

/// Result of a scan, with the tab listing it used so callers need not list again.
#[derive(Debug, Clone)]
pub struct StudentLocation {
    pub record: StudentRecord,
    pub tabs: Vec<TabInfo>,
}

/// Scans tabs in listing order and stops at the first matching row.
///
/// Tabs whose title contains "output" are never read. A tab that cannot be read
/// is skipped with a warning rather than failing the lookup.
pub async fn locate_student(
    gateway: &dyn SheetGateway,
    query: &StudentQuery,
) -> Result<StudentLocation> {
    query.validate()?;

    let tabs = gateway.list_tabs().await?;
    let searched: Vec<&TabInfo> = tabs.iter().filter(|tab| !is_output_tab(&tab.title)).collect();

    let mut found = None;
    'tabs: for tab in &searched {
        let rows = match gateway.read_range(&tab.title, FULL_RANGE).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!("Skipping tab '{}' during student lookup: {err}", tab.title);
                continue;
            }
        };
        if rows.len() < 2 {
            debug!("Skipping tab '{}': no data rows", tab.title);
            continue;
        }

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() < 2 {
                continue;
            }
            if index == 0 && is_header_row(&row) {
                continue;
            }
            if query.matches(&row) {
                debug!("Student found in tab '{}' row {index}", tab.title);
                found = Some((tab.title.clone(), index, row));
                break 'tabs;
            }
        }
    }

    let Some((tab_title, row_index, row)) = found else {
        let titles: Vec<&str> = searched
            .iter()
            .take(LISTED_TABS)
            .map(|tab| tab.title.as_str())
            .collect();
        return Err(Error::NotFound(format!(
            "Student not found in any sheet. Searched for email='{}' or id='{}'. Sheets searched: {}...",
            query.email.as_deref().unwrap_or_default(),
            query.id.as_deref().unwrap_or_default(),
            titles.join(", ")
        )));
    };

    let group = cell_at(&row, GROUP_COLUMN)
        .map(ToString::to_string)
        .filter(|group| !group.trim().is_empty())
        .ok_or_else(|| Error::NotFound(String::from("Group not found for student")))?;

    Ok(StudentLocation {
        record: StudentRecord {
            tab_title,
            row_index,
            row,
            group,
        },
        tabs,
    })
}
