//! Part application entity - A request for a new part to be catalogued.
//!
//! The identifier is immutable once assigned. Status only ever moves
//! pending→approved or pending→rejected, and `part_code` is set if and only
//! if the application is approved. Applications are never deleted.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Urgency of a part application
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Lifecycle state of a part application
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Stored part application record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartApplication {
    /// Identifier - store push key or sequential "APPnnnn" code
    pub id: String,
    /// Requester name
    #[serde(default)]
    pub requester: String,
    /// Requesting department
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub priority: Priority,
    /// Free-text technical specifications
    #[serde(default)]
    pub specifications: String,
    /// Proposed supplier
    #[serde(default)]
    pub supplier: String,
    /// Proposed standard price
    #[serde(default)]
    pub standard_price: f64,
    /// Business justification, optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    /// Free-text notes, optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Submission timestamp
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub status: ApplicationStatus,
    /// Download URL of the attached photo, set once the upload completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Assigned catalogue code - present exactly when status is approved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_code: Option<String>,
    /// Approval timestamp, stamped by the approve transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

impl PartApplication {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}

/// Photo attached to a draft application before upload
#[derive(Clone, Debug)]
pub struct ImageAttachment {
    pub bytes: Bytes,
    /// MIME content type, e.g. "image/png"
    pub content_type: String,
}

impl ImageAttachment {
    #[must_use]
    pub fn new(bytes: Bytes, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// Blob-key file extension for this attachment's content type.
    /// Unknown types fall back to "png", the catalogue's canonical format.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        extension_for(&self.content_type)
    }
}

/// Maps a MIME content type onto the extension used in blob keys.
#[must_use]
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// Maps a blob-key extension back onto a MIME content type.
#[must_use]
pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "image/png",
    }
}

/// User-supplied fields of a new application, validated by
/// [`crate::core::application::submit`] before any remote call.
#[derive(Clone, Debug, Default)]
pub struct ApplicationDraft {
    pub requester: String,
    pub department: String,
    pub priority: Priority,
    pub specifications: String,
    pub supplier: String,
    pub standard_price: f64,
    pub justification: Option<String>,
    pub notes: Option<String>,
    pub image: Option<ImageAttachment>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_status_round_trips_as_lowercase() {
        let json = serde_json::to_string(&ApplicationStatus::Approved).unwrap();
        assert_eq!(json, r#""approved""#);

        let status: ApplicationStatus = serde_json::from_str(r#""rejected""#).unwrap();
        assert_eq!(status, ApplicationStatus::Rejected);
    }

    #[test]
    fn test_priority_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("medium".parse::<Priority>().unwrap(), Priority::Medium);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_application_deserializes_legacy_row() {
        // Rows written by older clients carry only a subset of fields.
        let app: PartApplication = serde_json::from_str(
            r#"{"id": "APP0007", "requester": "M. Rossi", "status": "pending"}"#,
        )
        .unwrap();

        assert_eq!(app.id, "APP0007");
        assert!(app.is_pending());
        assert!(app.part_code.is_none());
        assert!(app.image_url.is_none());
        assert_eq!(app.priority, Priority::Medium);
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("application/octet-stream"), "png");
        assert_eq!(content_type_for("jpg"), "image/jpeg");
        assert_eq!(content_type_for("png"), "image/png");
    }
}
