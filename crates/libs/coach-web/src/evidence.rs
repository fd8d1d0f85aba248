//! Response shapes of the student lookup and evidence marking endpoints.

use coach_sheets::{
    broker::{MarkingOutcome, MarkingSubmission},
    desk::{EvidenceDesk, StudentComponents},
    locator::StudentQuery,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::prelude::*;

pub const MARKED_MESSAGE: &str = "Evidence marked successfully";
pub const PENDING_MESSAGE: &str =
    "Evidence submitted but marking result not ready yet. Please check later.";

/// Query string of the student lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentComponentsParams {
    #[serde(default)]
    pub student_email: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
}

impl From<&StudentComponentsParams> for StudentQuery {
    fn from(params: &StudentComponentsParams) -> Self {
        StudentQuery::new(params.student_email.as_deref(), params.student_id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub data: Value,
}

impl Envelope {
    pub fn student_components(found: StudentComponents) -> Result<Self> {
        Ok(Self {
            success: true,
            message: None,
            data: serde_json::to_value(found)?,
        })
    }

    pub fn marking(outcome: MarkingOutcome) -> Self {
        match outcome {
            MarkingOutcome::Matched { result } => Self {
                success: true,
                message: Some(MARKED_MESSAGE),
                data: Value::Object(result),
            },
            MarkingOutcome::Pending {
                processing_sheet,
                output_sheet,
                evidence_id,
            } => Self {
                success: false,
                message: Some(PENDING_MESSAGE),
                data: json!({
                    "submitted": true,
                    "processing_sheet": processing_sheet,
                    "output_sheet": output_sheet,
                    "evidence_id": evidence_id,
                }),
            },
        }
    }
}

pub async fn student_components(
    desk: &EvidenceDesk,
    params: &StudentComponentsParams,
) -> Result<Envelope> {
    let found = desk.student_components(&StudentQuery::from(params)).await?;
    Envelope::student_components(found)
}

/// Blocks until the result row shows up or the poll policy runs out.
pub async fn mark_evidence(desk: &EvidenceDesk, submission: &MarkingSubmission) -> Result<Envelope> {
    Ok(Envelope::marking(desk.mark_evidence(submission).await?))
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;

    #[test]
    fn matched_outcome_is_a_success() {
        let mut result = Map::new();
        result.insert(String::from("EvidenceId"), json!("15009"));
        result.insert(String::from("Grade"), json!("Pass"));
        let body = serde_json::to_value(Envelope::marking(MarkingOutcome::Matched { result })).unwrap();
        assert_eq!(
            body,
            json!({
                "success": true,
                "message": MARKED_MESSAGE,
                "data": {"EvidenceId": "15009", "Grade": "Pass"}
            })
        );
    }

    #[test]
    fn pending_outcome_reports_where_it_went() {
        let body = serde_json::to_value(Envelope::marking(MarkingOutcome::Pending {
            processing_sheet: String::from("PCP processing sheet"),
            output_sheet: String::from("PCP Output"),
            evidence_id: json!(15009),
        }))
        .unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], PENDING_MESSAGE);
        assert_eq!(
            body["data"],
            json!({
                "submitted": true,
                "processing_sheet": "PCP processing sheet",
                "output_sheet": "PCP Output",
                "evidence_id": 15009
            })
        );
    }

    #[test]
    fn blank_params_make_an_empty_query() {
        let params = StudentComponentsParams {
            student_email: Some(String::from(" ")),
            student_id: None,
        };
        assert!(StudentQuery::from(&params).validate().is_err());
    }
}
