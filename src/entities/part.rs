//! Part entity - A catalogue entry keyed by its material code.
//!
//! The effective record a caller sees is the base-dataset row overlaid
//! field-by-field by the admin-override row with the same code; the merge
//! itself lives in [`crate::core::parts`]. Parts are never hard-deleted,
//! only hidden via the `visible` flag.

use serde::{Deserialize, Serialize};

/// Catalogue part record
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Material code - primary key within the parts collections.
    /// Populated from the store key when the stored row omits it.
    #[serde(default)]
    pub material_code: String,
    /// English description of the part
    #[serde(default)]
    pub description: String,
    /// Supplier name
    #[serde(default)]
    pub supplier: String,
    /// Standard price
    #[serde(default)]
    pub price: f64,
    /// Whether the part is shown in the catalogue. Obsolete or withdrawn
    /// parts stay in the dataset with this flag cleared.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Free-text notes
    #[serde(default)]
    pub notes: String,
    /// Whether the part has been marked obsolete
    #[serde(default)]
    pub obsolete: bool,
    /// Replacement material code, when an obsolete part has a successor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced_by: Option<String>,
}

const fn default_visible() -> bool {
    true
}

impl Part {
    /// Case-insensitive substring match over the three searchable fields:
    /// material code, description, and supplier.
    #[must_use]
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.material_code.to_lowercase().contains(needle_lower)
            || self.description.to_lowercase().contains(needle_lower)
            || self.supplier.to_lowercase().contains(needle_lower)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_part_deserializes_with_defaults() {
        let part: Part = serde_json::from_str(r#"{"description": "Bearing"}"#).unwrap();
        assert_eq!(part.description, "Bearing");
        assert_eq!(part.material_code, "");
        assert_eq!(part.price, 0.0);
        assert!(part.visible);
        assert!(!part.obsolete);
        assert!(part.replaced_by.is_none());
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let part = Part {
            material_code: "MAT-001".to_string(),
            description: "Hex Bolt M8".to_string(),
            supplier: "Acme Fasteners".to_string(),
            ..Default::default()
        };

        assert!(part.matches("mat-001"));
        assert!(part.matches("bolt"));
        assert!(part.matches("acme"));
        assert!(!part.matches("washer"));
    }
}
