//! Bill-of-materials reads.
//!
//! BoM data is read-only here: one subtree per model/year, each child a
//! component row. The stored rows are uneven - older imports omit fields or
//! contain stray scalar children - so projection defaults missing fields and
//! silently skips anything that is not a structured record.

use serde_json::Value;
use tracing::warn;

use crate::entities::BomComponent;
use crate::store::{DocumentStore, paths};

/// Lists the model keys that have a bill of materials. Empty when the
/// collection is absent or unreachable.
pub async fn list_models(docs: &dyn DocumentStore) -> Vec<String> {
    match docs.get_tree(paths::BOM).await {
        Ok(Some(Value::Object(tree))) => tree.keys().cloned().collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            warn!("BoM model list read failed: {e}");
            Vec::new()
        }
    }
}

/// Reads the component rows for one model. Children that are not structured
/// records are skipped without raising an error.
pub async fn get_components(docs: &dyn DocumentStore, model_key: &str) -> Vec<BomComponent> {
    let path = format!("{}/{model_key}", paths::BOM);
    let tree = match docs.get_tree(&path).await {
        Ok(Some(Value::Object(tree))) => tree,
        Ok(_) => return Vec::new(),
        Err(e) => {
            warn!("BoM read for {model_key} failed: {e}");
            return Vec::new();
        }
    };

    tree.into_iter()
        .filter_map(|(code, row)| project_component(&code, &row))
        .collect()
}

fn project_component(code: &str, row: &Value) -> Option<BomComponent> {
    let fields = row.as_object()?;

    Some(BomComponent {
        material_code: code.to_string(),
        description: fields
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        standard_price: fields
            .get("standardPrice")
            .and_then(Value::as_f64)
            .unwrap_or_default(),
        supplier: fields
            .get("supplier")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}
