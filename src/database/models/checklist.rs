use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use uuid::Uuid;

use crate::database::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistTemplate {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub items: Vec<ChecklistItem>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChecklistTemplate {
    pub fn new(
        tenant_id: Uuid,
        created_by: Uuid,
        name: String,
        description: Option<String>,
        department: Option<String>,
        items: Vec<ChecklistItem>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            description,
            department,
            items,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Labels of required items with no matching response.
    pub fn missing_required<'a>(&'a self, responses: &[ChecklistResponse]) -> Vec<&'a str> {
        self.items
            .iter()
            .filter(|item| item.required)
            .filter(|item| !responses.iter().any(|r| r.label == item.label))
            .map(|item| item.label.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub items: Option<Vec<ChecklistItem>>,
}

impl Entity for ChecklistTemplate {
    const KIND: &'static str = "checklist_template";
    type Patch = TemplatePatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Option<Uuid> {
        Some(self.tenant_id)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn apply(&mut self, patch: TemplatePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(department) = patch.department {
            self.department = Some(department);
        }
        if let Some(items) = patch.items {
            self.items = items;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistResponse {
    pub label: String,
    pub passed: bool,
    pub value: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Complete,
    Flagged,
}

impl SubmissionStatus {
    /// Flagged as soon as one response failed.
    pub fn from_responses(responses: &[ChecklistResponse]) -> Self {
        if responses.iter().any(|r| !r.passed) {
            SubmissionStatus::Flagged
        } else {
            SubmissionStatus::Complete
        }
    }
}

/// A filled-in checklist. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistSubmission {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub template_id: Uuid,
    pub submitted_by: Uuid,
    pub submitted_by_username: String,
    pub responses: Vec<ChecklistResponse>,
    pub notes: Option<String>,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
}

impl ChecklistSubmission {
    pub fn new(
        template: &ChecklistTemplate,
        submitted_by: Uuid,
        submitted_by_username: String,
        responses: Vec<ChecklistResponse>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: template.tenant_id,
            template_id: template.id,
            submitted_by,
            submitted_by_username,
            status: SubmissionStatus::from_responses(&responses),
            responses,
            notes,
            created_at: Utc::now(),
        }
    }
}

impl Entity for ChecklistSubmission {
    const KIND: &'static str = "checklist_submission";
    type Patch = Infallible;

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Option<Uuid> {
        Some(self.tenant_id)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn apply(&mut self, patch: Infallible) {
        match patch {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(label: &str, passed: bool) -> ChecklistResponse {
        ChecklistResponse {
            label: label.to_string(),
            passed,
            value: None,
            note: None,
        }
    }

    #[test]
    fn one_failed_response_flags_the_submission() {
        assert_eq!(
            SubmissionStatus::from_responses(&[response("guards", true), response("oil", false)]),
            SubmissionStatus::Flagged
        );
        assert_eq!(
            SubmissionStatus::from_responses(&[response("guards", true)]),
            SubmissionStatus::Complete
        );
        assert_eq!(SubmissionStatus::from_responses(&[]), SubmissionStatus::Complete);
    }

    #[test]
    fn reports_missing_required_items() {
        let template = ChecklistTemplate::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Line start-up".into(),
            None,
            None,
            vec![
                ChecklistItem { label: "guards".into(), required: true },
                ChecklistItem { label: "oil".into(), required: true },
                ChecklistItem { label: "radio".into(), required: false },
            ],
        );
        assert_eq!(template.missing_required(&[response("guards", false)]), vec!["oil"]);
        assert!(template
            .missing_required(&[response("guards", true), response("oil", true)])
            .is_empty());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_value(SubmissionStatus::Flagged).unwrap(), "flagged");
    }
}
