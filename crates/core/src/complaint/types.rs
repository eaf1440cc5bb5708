//! Complaint types and data structures.

use chrono::{DateTime, Utc};
use grievance_shared::types::ComplaintId;
use serde::{Deserialize, Deserializer, Serialize};

use super::error::ValidationError;

/// A file stored alongside a complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Original file name.
    pub name: String,
    /// MIME type of the file.
    #[serde(rename = "type")]
    pub content_type: String,
    /// File size in bytes.
    pub size: u64,
    /// Public download location.
    pub url: String,
    /// Storage key, needed to delete the object later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Attachment {
    /// Whether the attachment is an image.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Complaint domain model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    /// Backend-assigned identifier.
    pub id: ComplaintId,
    /// Name of the resident who filed the complaint.
    pub student_name: String,
    /// Floor of the affected flat.
    pub floor_number: i32,
    /// Flat label, e.g. `3B`.
    pub flat_number: String,
    /// Category tag chosen in the form.
    pub issue_type: String,
    /// Free-text details.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// Creation instant.
    pub timestamp: DateTime<Utc>,
    /// Whether the complaint has been handled.
    #[serde(default)]
    pub resolved: bool,
    /// Uploaded files.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Complaint {
    /// Builds a stored complaint from a validated submission.
    #[must_use]
    pub fn from_new(id: ComplaintId, timestamp: DateTime<Utc>, new: NewComplaint) -> Self {
        Self {
            id,
            student_name: new.student_name,
            floor_number: new.floor_number,
            flat_number: new.flat_number,
            issue_type: new.issue_type,
            description: new.description,
            timestamp,
            resolved: new.resolved,
            attachments: new.attachments,
        }
    }

    /// Applies a partial update in place.
    pub fn apply(&mut self, patch: &ComplaintPatch) {
        if let Some(resolved) = patch.resolved {
            self.resolved = resolved;
        }
    }

    /// Storage keys of every persisted attachment.
    #[must_use]
    pub fn attachment_paths(&self) -> Vec<String> {
        self.attachments
            .iter()
            .filter_map(|a| a.path.clone())
            .collect()
    }
}

/// A validated complaint that has not been stored yet.
///
/// Serializes to the document shape minus the backend-owned `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComplaint {
    /// Trimmed resident name.
    pub student_name: String,
    /// Floor number.
    pub floor_number: i32,
    /// Trimmed flat label.
    pub flat_number: String,
    /// Category tag.
    pub issue_type: String,
    /// Trimmed description, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Always false on creation.
    pub resolved: bool,
    /// Files that uploaded successfully.
    pub attachments: Vec<Attachment>,
}

impl NewComplaint {
    /// Replaces the attachment list.
    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Partial update of a complaint. Only `resolved` is ever patched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComplaintPatch {
    /// New resolved flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<bool>,
}

impl ComplaintPatch {
    /// Patch that sets the resolved flag.
    #[must_use]
    pub fn resolved(resolved: bool) -> Self {
        Self {
            resolved: Some(resolved),
        }
    }
}

/// Raw form input as typed by the resident.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintForm {
    /// Resident name.
    pub student_name: String,
    /// Floor number as entered.
    pub floor_number: String,
    /// Flat label.
    pub flat_number: String,
    /// Category tag.
    pub issue_type: String,
    /// Optional details.
    pub description: String,
}

impl ComplaintForm {
    /// Checks required fields and produces a trimmed submission.
    ///
    /// # Errors
    ///
    /// Returns the first missing or malformed field.
    pub fn validate(&self) -> Result<NewComplaint, ValidationError> {
        let student_name = required("studentName", &self.student_name)?;
        let floor = required("floorNumber", &self.floor_number)?;
        let floor_number = floor
            .parse::<i32>()
            .map_err(|_| ValidationError::invalid_floor(&floor))?;
        let flat_number = required("flatNumber", &self.flat_number)?;
        let issue_type = required("issueType", &self.issue_type)?;

        let description = self.description.trim();
        let description = (!description.is_empty()).then(|| description.to_string());

        Ok(NewComplaint {
            student_name,
            floor_number,
            flat_number,
            issue_type,
            description,
            resolved: false,
            attachments: Vec::new(),
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::missing(field));
    }
    Ok(trimmed.to_string())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Sorts complaints newest first. Stable, so equal timestamps keep their order.
pub fn sort_newest_first(complaints: &mut [Complaint]) {
    complaints.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn asha_form() -> ComplaintForm {
        ComplaintForm {
            student_name: "  Asha ".to_string(),
            floor_number: "3".to_string(),
            flat_number: " 3B".to_string(),
            issue_type: "plumbing".to_string(),
            description: "leak ".to_string(),
        }
    }

    #[test]
    fn test_validate_trims_fields() {
        let new = asha_form().validate().expect("valid form");
        assert_eq!(new.student_name, "Asha");
        assert_eq!(new.floor_number, 3);
        assert_eq!(new.flat_number, "3B");
        assert_eq!(new.description.as_deref(), Some("leak"));
        assert!(!new.resolved);
        assert!(new.attachments.is_empty());
    }

    #[test]
    fn test_blank_description_is_absent() {
        let mut form = asha_form();
        form.description = "   ".to_string();
        assert_eq!(form.validate().expect("valid form").description, None);
    }

    #[test]
    fn test_ground_floor_is_valid() {
        let mut form = asha_form();
        form.floor_number = "0".to_string();
        assert_eq!(form.validate().expect("valid form").floor_number, 0);
    }

    #[rstest]
    #[case::name("student_name", "studentName")]
    #[case::floor("floor_number", "floorNumber")]
    #[case::flat("flat_number", "flatNumber")]
    #[case::issue("issue_type", "issueType")]
    fn test_missing_required_field(#[case] blank: &str, #[case] expected: &'static str) {
        let mut form = asha_form();
        match blank {
            "student_name" => form.student_name = " ".to_string(),
            "floor_number" => form.floor_number = String::new(),
            "flat_number" => form.flat_number = String::new(),
            _ => form.issue_type = String::new(),
        }
        assert_eq!(form.validate(), Err(ValidationError::missing(expected)));
    }

    #[test]
    fn test_non_numeric_floor_rejected() {
        let mut form = asha_form();
        form.floor_number = "third".to_string();
        assert!(matches!(
            form.validate(),
            Err(ValidationError::InvalidFloor { .. })
        ));
    }

    #[test]
    fn test_patch_only_touches_resolved() {
        let new = asha_form().validate().expect("valid form");
        let mut complaint = Complaint::from_new(ComplaintId::from("1"), Utc::now(), new);
        let before = complaint.clone();

        complaint.apply(&ComplaintPatch::resolved(true));
        assert!(complaint.resolved);
        complaint.apply(&ComplaintPatch::default());
        assert!(complaint.resolved);
        assert_eq!(complaint.student_name, before.student_name);
        assert_eq!(complaint.timestamp, before.timestamp);
    }

    #[test]
    fn test_document_shape_roundtrip() {
        let json = serde_json::json!({
            "id": "abc",
            "studentName": "Asha",
            "floorNumber": 3,
            "flatNumber": "3B",
            "issueType": "plumbing",
            "description": "",
            "timestamp": "2026-10-18T09:30:00Z",
            "resolved": false,
            "attachments": [
                {"name": "tap.jpg", "type": "image/jpeg", "size": 2048, "url": "memory:///complaints/tap.jpg"}
            ]
        });

        let complaint: Complaint = serde_json::from_value(json).expect("decodes");
        assert_eq!(complaint.description, None);
        assert_eq!(complaint.attachments[0].path, None);
        assert!(complaint.attachments[0].is_image());
        assert!(complaint.attachment_paths().is_empty());
    }

    #[test]
    fn test_new_complaint_serializes_without_backend_fields() {
        let new = asha_form().validate().expect("valid form");
        let value = serde_json::to_value(&new).expect("serializes");
        assert_eq!(value["studentName"], "Asha");
        assert!(value.get("id").is_none());
        assert!(value.get("timestamp").is_none());
    }
}
