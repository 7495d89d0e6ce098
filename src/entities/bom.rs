//! BoM component entity - A row in a bill of materials for one model/year.
//!
//! Components are owned exclusively by their parent model collection and have
//! no independent lifecycle. Projection from the stored subtree (and the
//! defaulting of missing fields) lives in [`crate::core::bom`].

use serde::{Deserialize, Serialize};

/// One component row within a model's bill of materials
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomComponent {
    /// Component material code - the row's key within its parent model
    #[serde(default)]
    pub material_code: String,
    /// Description, empty when the stored row omits it
    #[serde(default)]
    pub description: String,
    /// Standard price, zero when the stored row omits it
    #[serde(default)]
    pub standard_price: f64,
    /// Supplier name, empty when the stored row omits it
    #[serde(default)]
    pub supplier: String,
}
