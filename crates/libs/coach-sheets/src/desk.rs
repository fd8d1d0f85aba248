//! The two operations exposed to the web layer.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::broker::{MarkingBroker, MarkingOutcome, MarkingSubmission, PollPolicy};
use crate::extractor::read_components;
use crate::gateway::SheetGateway;
use crate::group::GroupMapping;
use crate::locator::{StudentQuery, locate_student};
use crate::prelude::*;

/// What a coach sees for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentComponents {
    pub student_id: String,
    pub student_email: String,
    pub group: String,
    pub target_sheet: String,
    pub components: Value,
    pub evidence: Value,
    pub raw_component_name: Value,
}

/// Cheap to clone; clones share the gateway and the group table.
#[derive(Clone)]
pub struct EvidenceDesk {
    gateway: Arc<dyn SheetGateway>,
    groups: Arc<GroupMapping>,
    poll: PollPolicy,
}

impl EvidenceDesk {
    pub fn new(gateway: Arc<dyn SheetGateway>, groups: GroupMapping) -> Self {
        Self {
            gateway,
            groups: Arc::new(groups),
            poll: PollPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn groups(&self) -> &GroupMapping {
        &self.groups
    }

    /// Locates the student, resolves their group tab and reads their components.
    pub async fn student_components(&self, query: &StudentQuery) -> Result<StudentComponents> {
        let location = locate_student(self.gateway.as_ref(), query).await?;
        let record = location.record;
        let target_sheet = self.groups.resolve(&record.group, &location.tabs)?;

        let student_email = record.student_email();
        let student_id = record.student_id();
        let found =
            read_components(self.gateway.as_ref(), &target_sheet, &student_email, &student_id)
                .await?;
        info!(
            "Components for student {student_id} read from '{target_sheet}' (group {})",
            record.group
        );

        Ok(StudentComponents {
            student_id,
            student_email,
            group: record.group,
            target_sheet,
            components: found.components,
            evidence: found.evidence,
            raw_component_name: found.raw_component,
        })
    }

    pub async fn mark_evidence(&self, submission: &MarkingSubmission) -> Result<MarkingOutcome> {
        MarkingBroker::new(self.gateway.clone(), self.poll)
            .submit_and_await(submission)
            .await
    }
}
