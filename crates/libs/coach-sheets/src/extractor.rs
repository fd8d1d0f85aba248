//! Reading a student's component and evidence cells from their group tab.

use serde_json::Value;

use crate::cell::{Cell, Row, cell_at};
use crate::gateway::{FULL_RANGE, SheetGateway};
use crate::prelude::*;

const DEFAULT_COMPONENT_COLUMN: usize = 3;
const DEFAULT_EVIDENCE_COLUMN: usize = 4;

/// Where the component and evidence cells sit in a target tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentColumns {
    pub component: usize,
    pub evidence: usize,
    /// First row that may hold student data.
    pub start_row: usize,
}

impl Default for ComponentColumns {
    fn default() -> Self {
        Self {
            component: DEFAULT_COMPONENT_COLUMN,
            evidence: DEFAULT_EVIDENCE_COLUMN,
            start_row: 0,
        }
    }
}

/// Inspects the first row for "component" and "evidence" titles.
///
/// When several titles match, the right-most one wins. Row 0 is only treated
/// as a header when the cell at the component column mentions "component".
pub fn detect_columns(rows: &[Row]) -> ComponentColumns {
    let mut columns = ComponentColumns::default();
    let Some(header) = rows.first() else {
        return columns;
    };

    let last_titled = |needle: &str| {
        header
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.text_contains(needle))
            .map(|(index, _)| index)
            .last()
    };
    if let Some(index) = last_titled("component") {
        columns.component = index;
    }
    if let Some(index) = last_titled("evidence") {
        columns.evidence = index;
    }
    if cell_at(header, columns.component).is_some_and(|cell| cell.text_contains("component")) {
        columns.start_row = 1;
    }
    columns
}

/// The student's row on the target tab.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRecord {
    /// The component cell, decoded when it holds JSON text.
    pub components: Value,
    /// The component cell as stored.
    pub raw_component: Value,
    /// The evidence cell as stored, `Null` when the row stops before it.
    pub evidence: Value,
}

/// Decodes JSON text, handing back anything else unchanged.
pub fn decode_component_cell(cell: &Cell) -> Value {
    match cell {
        Cell::Text(text) => serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone())),
        other => other.to_json(),
    }
}

fn row_belongs_to(row: &[Cell], email: &str, id: &str) -> bool {
    let email = email.trim().to_lowercase();
    if !email.is_empty() {
        let hit = cell_at(row, 1)
            .and_then(Cell::as_text)
            .is_some_and(|text| text.trim().to_lowercase() == email);
        if hit {
            return true;
        }
    }
    let id = id.trim();
    !id.is_empty() && cell_at(row, 0).is_some_and(|cell| cell.to_string().trim() == id)
}

/// Picks the student's row out of an already read target tab.
pub fn extract_components(
    target_sheet: &str,
    rows: &[Row],
    student_email: &str,
    student_id: &str,
) -> Result<ComponentRecord> {
    if rows.is_empty() {
        return Err(Error::NotFound(format!("No data in target sheet: {target_sheet}")));
    }
    let columns = detect_columns(rows);

    let row = rows
        .iter()
        .skip(columns.start_row)
        .filter(|row| row.len() >= 2)
        .find(|row| row_belongs_to(row, student_email, student_id));

    let component = row
        .and_then(|row| cell_at(row, columns.component))
        .filter(|cell| !cell.is_blank())
        .ok_or_else(|| {
            Error::NotFound(String::from(
                "Component data not found for student in target sheet",
            ))
        })?;
    let evidence = row
        .and_then(|row| cell_at(row, columns.evidence))
        .map_or(Value::Null, Cell::to_json);

    Ok(ComponentRecord {
        components: decode_component_cell(component),
        raw_component: component.to_json(),
        evidence,
    })
}

/// Reads `target_sheet` and extracts the student's component record.
pub async fn read_components(
    gateway: &dyn SheetGateway,
    target_sheet: &str,
    student_email: &str,
    student_id: &str,
) -> Result<ComponentRecord> {
    let rows = gateway.read_range(target_sheet, FULL_RANGE).await?;
    extract_components(target_sheet, &rows, student_email, student_id)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::memory::MemoryGateway;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|cell| Cell::from(*cell)).collect()
    }

    #[test]
    fn defaults_without_titles() {
        let rows = vec![row(&["1", "a@x.com", "A", "Portfolio", "link"])];
        assert_eq!(detect_columns(&rows), ComponentColumns::default());
        assert_eq!(detect_columns(&[]), ComponentColumns::default());
    }

    #[test]
    fn last_matching_title_wins() {
        let rows = vec![row(&[
            "ID",
            "Email",
            "Component Notes",
            "Evidence",
            "Components",
            "Evidence Link",
        ])];
        let columns = detect_columns(&rows);
        assert_eq!(columns.component, 4);
        assert_eq!(columns.evidence, 5);
        assert_eq!(columns.start_row, 1);
        assert_eq!(detect_columns(&rows), columns);
    }

    #[test]
    fn evidence_title_alone_keeps_data_from_row_zero() {
        let rows = vec![row(&["1", "a@x.com", "A", "Portfolio", "Evidence Pack"])];
        let columns = detect_columns(&rows);
        assert_eq!(columns.component, 3);
        assert_eq!(columns.evidence, 4);
        assert_eq!(columns.start_row, 0);
    }

    #[test]
    fn decodes_json_component_cells() {
        let rows = vec![
            row(&["ID", "Email", "Name", "Components", "Evidence"]),
            row(&[
                "1001",
                "jane@x.com",
                "Jane",
                r#"[{"componentId":19129,"componentName":"Managing Portfolios"}]"#,
                "https://evidence/1",
            ]),
        ];
        let record = extract_components("PCP", &rows, "JANE@x.com ", "").unwrap();
        assert_eq!(
            record.components,
            json!([{"componentId": 19129, "componentName": "Managing Portfolios"}])
        );
        assert!(record.raw_component.is_string());
        assert_eq!(record.evidence, json!("https://evidence/1"));
    }

    #[test]
    fn keeps_plain_text_components() {
        let rows = vec![
            row(&["ID", "Email", "Name", "Components"]),
            row(&["1001", "jane@x.com", "Jane", "Managing Portfolios"]),
        ];
        let record = extract_components("PCP", &rows, "", "1001").unwrap();
        assert_eq!(record.components, json!("Managing Portfolios"));
        assert_eq!(record.evidence, Value::Null);
    }

    #[test]
    fn missing_student_or_cell_is_not_found() {
        let rows = vec![
            row(&["ID", "Email", "Name", "Components"]),
            row(&["1001", "jane@x.com", "Jane"]),
        ];
        let miss = extract_components("PCP", &rows, "sam@x.com", "1002").unwrap_err();
        assert!(matches!(miss, Error::NotFound(_)));
        let short = extract_components("PCP", &rows, "jane@x.com", "").unwrap_err();
        assert!(matches!(short, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_target_tab_is_not_found() {
        let gateway = MemoryGateway::new().with_tab("PCP", Vec::new());
        let err = read_components(&gateway, "PCP", "jane@x.com", "1001")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(message) if message == "No data in target sheet: PCP"));
    }
}
