//! Marking requests brokered through the spreadsheet.
//!
//! A request is one row appended to the group's processing tab. An external
//! process grades it and writes a row, keyed by evidence id, to the group's
//! output tab. [`MarkingBroker::submit_and_await`] appends the request and then
//! polls the output tab for a bounded time. Running out of attempts is a normal
//! outcome ([`MarkingOutcome::Pending`]), not an error.
//!
//! Submissions are not deduplicated: sending the same evidence id twice appends
//! two request rows and both polls may pick up the same result row.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::cell::Row;
use crate::gateway::{FULL_RANGE, SheetGateway};
use crate::prelude::*;

/// Columns written to a processing tab.
pub const PROCESSING_RANGE: &str = "A:I";
pub const UNKNOWN_COMPONENT: &str = "Unknown Component";
const EVIDENCE_ID_HEADERS: [&str; 3] = ["evidenceid", "evidence_id", "evidence id"];

/// Tab receiving marking requests for `group`.
pub fn processing_tab(group: &str) -> String {
    format!("{group} processing sheet")
}

/// Tab the external process writes results to for `group`.
pub fn output_tab(group: &str) -> String {
    format!("{group} Output")
}

/// JSON truthiness: null, false, zero and empty values count as missing.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
    }
}

/// String coercion for values written to or compared against cells.
fn as_cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// A marking request as posted by a coach.
///
/// Identifiers arrive as strings or numbers depending on the client, so every
/// field keeps its JSON shape until it is written out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkingSubmission {
    #[serde(default)]
    pub student_id: Option<Value>,
    #[serde(default)]
    pub student_email: Option<Value>,
    #[serde(default)]
    pub student_name: Option<Value>,
    #[serde(default)]
    pub group: Option<Value>,
    #[serde(default)]
    pub evidence_id: Option<Value>,
    #[serde(default)]
    pub evidence_name: Option<Value>,
    #[serde(default)]
    pub evidence_url: Option<Value>,
    #[serde(default)]
    pub evidence_status: Option<Value>,
    #[serde(default)]
    pub evidence_created_date: Option<Value>,
    #[serde(default)]
    pub component_id: Option<Value>,
    /// A list of `{componentId, componentName}` objects, or that list JSON-encoded.
    #[serde(default)]
    pub components: Option<Value>,
}

impl MarkingSubmission {
    pub fn validate(&self) -> Result<()> {
        let required = [
            &self.student_id,
            &self.group,
            &self.evidence_id,
            &self.component_id,
        ];
        if required.iter().all(|field| is_present(field.as_ref())) {
            return Ok(());
        }
        Err(Error::Validation(String::from(
            "Missing required fields: student_id, group, evidence_id, component_id",
        )))
    }

    pub fn group(&self) -> String {
        as_cell_text(self.group.as_ref())
    }

    pub fn evidence_key(&self) -> String {
        as_cell_text(self.evidence_id.as_ref())
    }

    /// Name of the submitted component, looked up in `components`.
    ///
    /// Entries may spell their keys `componentId`/`ComponentId` and
    /// `componentName`/`ComponentName`. Ids are compared as strings. Anything
    /// unexpected yields [`UNKNOWN_COMPONENT`].
    pub fn component_name(&self) -> String {
        let decoded;
        let entries = match &self.components {
            Some(Value::Array(entries)) => entries,
            Some(Value::String(text)) => {
                decoded = serde_json::from_str::<Vec<Value>>(text).unwrap_or_default();
                &decoded
            }
            _ => return String::from(UNKNOWN_COMPONENT),
        };

        let wanted = as_cell_text(self.component_id.as_ref());
        let either = |entry: &Map<String, Value>, first: &str, second: &str| {
            entry
                .get(first)
                .filter(|value| is_present(Some(*value)))
                .or_else(|| entry.get(second))
                .cloned()
        };
        entries
            .iter()
            .filter_map(Value::as_object)
            .find_map(|entry| {
                let id = either(entry, "componentId", "ComponentId");
                let name = either(entry, "componentName", "ComponentName");
                (is_present(id.as_ref())
                    && as_cell_text(id.as_ref()) == wanted
                    && is_present(name.as_ref()))
                .then(|| as_cell_text(name.as_ref()))
            })
            .unwrap_or_else(|| String::from(UNKNOWN_COMPONENT))
    }
}

/// The request row read positionally by the external marking process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingRow {
    pub student_id: String,
    pub student_name: String,
    pub component_id: String,
    pub component_name: String,
    pub evidence_id: String,
    pub evidence_name: String,
    pub evidence_url: String,
    pub evidence_status: String,
    pub evidence_created_date: String,
}

impl ProcessingRow {
    /// Flattens a submission. The student name falls back to the email.
    pub fn from_submission(submission: &MarkingSubmission) -> Self {
        let student_name = if submission.student_name.is_some() {
            submission.student_name.as_ref()
        } else {
            submission.student_email.as_ref()
        };
        Self {
            student_id: as_cell_text(submission.student_id.as_ref()),
            student_name: as_cell_text(student_name),
            component_id: as_cell_text(submission.component_id.as_ref()),
            component_name: submission.component_name(),
            evidence_id: submission.evidence_key(),
            evidence_name: as_cell_text(submission.evidence_name.as_ref()),
            evidence_url: as_cell_text(submission.evidence_url.as_ref()),
            evidence_status: as_cell_text(submission.evidence_status.as_ref()),
            evidence_created_date: as_cell_text(submission.evidence_created_date.as_ref()),
        }
    }

    pub fn into_cells(self) -> Vec<String> {
        vec![
            self.student_id,
            self.student_name,
            self.component_id,
            self.component_name,
            self.evidence_id,
            self.evidence_name,
            self.evidence_url,
            self.evidence_status,
            self.evidence_created_date,
        ]
    }
}

/// How long to wait for a result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    /// Slept before every read, the first one included.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 20,
            interval: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MarkingOutcome {
    /// The output row, keyed by the output tab's header titles.
    Matched { result: Map<String, Value> },
    /// Submitted, but no result showed up in time.
    Pending {
        processing_sheet: String,
        output_sheet: String,
        evidence_id: Value,
    },
}

/// Finds the result row for `evidence_key` in an output tab snapshot.
///
/// Row 0 holds the titles. Cells past the end of the header are dropped and
/// titles past the end of the row are left out.
pub fn match_output_row(rows: &[Row], evidence_key: &str) -> Option<Map<String, Value>> {
    let (header, data) = rows.split_first()?;
    let column = header.iter().position(|title| {
        EVIDENCE_ID_HEADERS.contains(&title.to_string().to_lowercase().as_str())
    })?;
    let row = data.iter().find(|row| {
        row.get(column)
            .is_some_and(|cell| cell.to_string() == evidence_key)
    })?;
    Some(
        header
            .iter()
            .zip(row)
            .map(|(title, cell)| (title.to_string(), cell.to_json()))
            .collect(),
    )
}

pub struct MarkingBroker {
    gateway: Arc<dyn SheetGateway>,
    policy: PollPolicy,
}

impl MarkingBroker {
    pub fn new(gateway: Arc<dyn SheetGateway>, policy: PollPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Appends the request row, then polls the output tab.
    ///
    /// The append is never retried and its failure is fatal. A failed read of
    /// the output tab is ignored unless it happens on the last attempt.
    pub async fn submit_and_await(&self, submission: &MarkingSubmission) -> Result<MarkingOutcome> {
        submission.validate()?;

        let group = submission.group();
        let processing_sheet = processing_tab(&group);
        let output_sheet = output_tab(&group);
        let evidence_key = submission.evidence_key();

        let row = ProcessingRow::from_submission(submission);
        info!(
            "Submitting evidence {evidence_key} ({}) to '{processing_sheet}'",
            row.component_name
        );
        self.gateway
            .append_rows(&processing_sheet, PROCESSING_RANGE, vec![row.into_cells()])
            .await
            .map_err(Error::Upstream)?;

        for attempt in 1..=self.policy.attempts {
            tokio::time::sleep(self.policy.interval).await;

            match self.gateway.read_range(&output_sheet, FULL_RANGE).await {
                Ok(rows) => {
                    if let Some(result) = match_output_row(&rows, &evidence_key) {
                        info!("Evidence {evidence_key} marked after {attempt} poll(s)");
                        return Ok(MarkingOutcome::Matched { result });
                    }
                    debug!("Evidence {evidence_key}: no result on poll {attempt}");
                }
                Err(err) if attempt < self.policy.attempts => {
                    warn!("Evidence {evidence_key}: poll {attempt} failed: {err}");
                }
                Err(err) => {
                    warn!("Evidence {evidence_key}: last poll failed: {err}");
                    return Err(Error::Upstream(err));
                }
            }
        }

        info!(
            "Evidence {evidence_key} still pending after {} poll(s)",
            self.policy.attempts
        );
        Ok(MarkingOutcome::Pending {
            processing_sheet,
            output_sheet,
            evidence_id: submission.evidence_id.clone().unwrap_or(Value::Null),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::time::Instant;

    use super::*;
    use crate::cell::Cell;
    use crate::memory::MemoryGateway;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|cell| Cell::from(*cell)).collect()
    }

    fn submission() -> MarkingSubmission {
        serde_json::from_value(json!({
            "student_id": "1001",
            "student_email": "jane@x.com",
            "group": "PCP",
            "evidence_id": 15009,
            "evidence_name": "Portfolio review",
            "evidence_url": "https://evidence/15009",
            "evidence_status": "PendingAssessment",
            "evidence_created_date": "2025-11-16T15:46:14.556909Z",
            "component_id": 19129,
            "components": [{"componentId": 19129, "componentName": "Managing Portfolios"}]
        }))
        .unwrap()
    }

    fn sheets() -> MemoryGateway {
        MemoryGateway::new()
            .with_tab("PCP processing sheet", Vec::new())
            .with_tab("PCP Output", vec![row(&["EvidenceId", "Grade", "Feedback"])])
    }

    fn assert_elapsed(started: Instant, secs: u64) {
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(secs), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(secs + 1), "{elapsed:?}");
    }

    fn broker(gateway: &MemoryGateway) -> MarkingBroker {
        MarkingBroker::new(Arc::new(gateway.clone()), PollPolicy::default())
    }

    #[test]
    fn processing_row_carries_resolved_component_name() {
        let cells = ProcessingRow::from_submission(&submission()).into_cells();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], "1001");
        assert_eq!(cells[1], "jane@x.com");
        assert_eq!(cells[2], "19129");
        assert_eq!(cells[3], "Managing Portfolios");
        assert_eq!(cells[4], "15009");
        assert_eq!(cells[8], "2025-11-16T15:46:14.556909Z");
    }

    #[test]
    fn component_name_accepts_encoded_lists_and_alternate_keys() {
        let mut sub = submission();
        sub.components = Some(json!(
            r#"[{"ComponentId":"1","ComponentName":"Other"},{"ComponentId":"19129","ComponentName":"Ethics"}]"#
        ));
        assert_eq!(sub.component_name(), "Ethics");

        sub.components = Some(json!("not json"));
        assert_eq!(sub.component_name(), UNKNOWN_COMPONENT);

        sub.components = Some(json!([{"componentId": 1, "componentName": "Other"}, 7]));
        assert_eq!(sub.component_name(), UNKNOWN_COMPONENT);

        sub.components = None;
        assert_eq!(sub.component_name(), UNKNOWN_COMPONENT);
    }

    #[test]
    fn component_ids_match_across_number_and_string() {
        let mut sub = submission();
        sub.components = Some(json!([{"componentId": "19129", "componentName": "Managing Portfolios"}]));
        assert_eq!(sub.component_name(), "Managing Portfolios");

        sub.component_id = Some(json!("19129"));
        sub.components = Some(json!([{"componentId": 19129, "componentName": "Managing Portfolios"}]));
        assert_eq!(sub.component_name(), "Managing Portfolios");

        sub.component_id = Some(json!("191290"));
        assert_eq!(sub.component_name(), UNKNOWN_COMPONENT);
    }

    #[test]
    fn missing_optional_fields_are_blank() {
        let sub: MarkingSubmission = serde_json::from_value(json!({
            "student_id": 1001, "group": "A", "evidence_id": "e1", "component_id": "c1"
        }))
        .unwrap();
        let cells = ProcessingRow::from_submission(&sub).into_cells();
        assert_eq!(cells[0], "1001");
        assert_eq!(cells[1], "");
        assert_eq!(cells[3], UNKNOWN_COMPONENT);
        assert_eq!(cells[5], "");
    }

    #[test]
    fn output_header_spellings_are_case_insensitive() {
        let rows = vec![
            row(&["Student", "EVIDENCE ID", "Grade"]),
            row(&["Jane", "15008", "Fail"]),
            vec![Cell::from("Jane"), Cell::from(15009), Cell::from("Pass")],
        ];
        let result = match_output_row(&rows, "15009").unwrap();
        assert_eq!(result["Grade"], json!("Pass"));
        assert_eq!(result["EVIDENCE ID"], json!(15009));
        assert!(match_output_row(&rows[..1], "15009").is_none());
        assert!(match_output_row(&[row(&["Id", "Grade"])], "15009").is_none());
    }

    #[test]
    fn short_result_rows_drop_missing_titles() {
        let rows = vec![
            row(&["EvidenceId", "Grade", "Feedback"]),
            row(&["15009", "Pass"]),
        ];
        let result = match_output_row(&rows, "15009").unwrap();
        assert_eq!(result.len(), 2);
        assert!(!result.contains_key("Feedback"));
    }

    #[tokio::test]
    async fn invalid_submission_makes_no_calls() {
        let gateway = sheets();
        let mut sub = submission();
        sub.component_id = Some(json!(""));
        let err = broker(&gateway).submit_and_await(&sub).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(gateway.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn matched_result_stops_polling() {
        let gateway = sheets();
        gateway.append_before_read("PCP Output", 3, vec![row(&["15009", "Pass", "Good work"])]);
        let started = Instant::now();

        let outcome = broker(&gateway).submit_and_await(&submission()).await.unwrap();

        let MarkingOutcome::Matched { result } = outcome else {
            panic!("expected a matched outcome");
        };
        assert_eq!(
            Value::Object(result),
            json!({"EvidenceId": "15009", "Grade": "Pass", "Feedback": "Good work"})
        );
        assert_eq!(gateway.reads("PCP Output"), 3);
        assert_elapsed(started, 9);

        let appended = gateway.rows("PCP processing sheet").unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0][3], Cell::from("Managing Portfolios"));
    }

    #[tokio::test(start_paused = true)]
    async fn first_read_waits_one_interval() {
        let gateway = sheets();
        gateway.add_tab(
            "PCP Output",
            vec![row(&["EvidenceId", "Grade"]), row(&["15009", "Pass"])],
        );
        let started = Instant::now();
        let outcome = broker(&gateway).submit_and_await(&submission()).await.unwrap();
        assert!(matches!(outcome, MarkingOutcome::Matched { .. }));
        assert_elapsed(started, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_polling_is_pending() {
        let gateway = sheets();
        let started = Instant::now();

        let outcome = broker(&gateway).submit_and_await(&submission()).await.unwrap();

        assert_eq!(
            outcome,
            MarkingOutcome::Pending {
                processing_sheet: String::from("PCP processing sheet"),
                output_sheet: String::from("PCP Output"),
                evidence_id: json!(15009),
            }
        );
        assert_eq!(gateway.reads("PCP Output"), 20);
        assert_elapsed(started, 60);
    }

    #[tokio::test(start_paused = true)]
    async fn read_failures_before_the_last_attempt_are_ignored() {
        let gateway = sheets();
        gateway.fail_next_reads("PCP Output", 19);
        gateway.append_before_read("PCP Output", 20, vec![row(&["15009", "Pass", "Good work"])]);

        let outcome = broker(&gateway).submit_and_await(&submission()).await.unwrap();
        assert!(matches!(outcome, MarkingOutcome::Matched { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn last_attempt_failure_is_upstream() {
        let gateway = sheets();
        gateway.fail_next_reads("PCP Output", 20);
        let err = broker(&gateway).submit_and_await(&submission()).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        assert_eq!(gateway.reads("PCP Output"), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn append_failure_is_upstream_without_polling() {
        let gateway = sheets();
        gateway.fail_appends(true);
        let err = broker(&gateway).submit_and_await(&submission()).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        assert_eq!(gateway.reads("PCP Output"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn outcome_serializes_with_status_tag() {
        let gateway = sheets();
        let policy = PollPolicy {
            attempts: 2,
            interval: Duration::from_millis(10),
        };
        let outcome = MarkingBroker::new(Arc::new(gateway.clone()), policy)
            .submit_and_await(&submission())
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "status": "pending",
                "processing_sheet": "PCP processing sheet",
                "output_sheet": "PCP Output",
                "evidence_id": 15009
            })
        );
        assert_eq!(gateway.reads("PCP Output"), 2);
    }
}
