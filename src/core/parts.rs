//! Parts catalogue business logic.
//!
//! The catalogue a caller sees is the base dataset overlaid by the admin
//! override collection. Merging is a pure function over two immutable
//! mappings; no shared mutable state is involved. Read operations fail soft:
//! a remote fault is logged and degrades to an empty result, so a flaky
//! backend renders as an empty catalogue rather than an error page.

use serde_json::{Map, Value};
use tracing::warn;

use crate::entities::Part;
use crate::errors::Result;
use crate::store::{DocumentStore, paths};

/// Shallow field-by-field merge of one record: every field present in
/// `overlay` replaces the identically-named base field, fields absent from
/// `overlay` keep their base values. Non-object overlays win wholesale.
#[must_use]
pub fn merge_record(base: &Value, overlay: &Value) -> Value {
    match (base.as_object(), overlay.as_object()) {
        (Some(base_fields), Some(overlay_fields)) => {
            let mut merged = base_fields.clone();
            for (field, value) in overlay_fields {
                merged.insert(field.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => overlay.clone(),
    }
}

/// Merges the base dataset with the admin overrides, override precedence
/// per field. Keys only present in the overrides are appended.
#[must_use]
pub fn merge_catalogues(
    base: &Map<String, Value>,
    overrides: &Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = base.clone();
    for (code, overlay) in overrides {
        let record = match merged.get(code) {
            Some(existing) => merge_record(existing, overlay),
            None => overlay.clone(),
        };
        merged.insert(code.clone(), record);
    }
    merged
}

fn as_map(tree: Option<Value>) -> Map<String, Value> {
    match tree {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Projects a stored row into a [`Part`], keying it by `code` when the row
/// itself omits the material code. Malformed rows degrade to defaults.
#[must_use]
pub fn to_part(code: &str, value: Value) -> Part {
    let mut part: Part = serde_json::from_value(value).unwrap_or_default();
    if part.material_code.is_empty() {
        part.material_code = code.to_string();
    }
    part
}

/// Reads the base dataset and the admin overrides concurrently and returns
/// the merged mapping. Any remote fault yields an empty mapping.
pub async fn fetch_all(docs: &dyn DocumentStore) -> Map<String, Value> {
    let (base, overrides) = tokio::join!(
        docs.get_tree(paths::BASE_PARTS),
        docs.get_tree(paths::PART_OVERRIDES)
    );

    match (base, overrides) {
        (Ok(base), Ok(overrides)) => merge_catalogues(&as_map(base), &as_map(overrides)),
        (Err(e), _) | (_, Err(e)) => {
            warn!("parts fetch failed, returning empty catalogue: {e}");
            Map::new()
        }
    }
}

/// Searches the catalogue.
///
/// An empty term returns the first `limit` entries of the *base* dataset,
/// bypassing admin overrides - a long-standing inconsistency of the stored
/// data contract that callers rely on, left as-is. A non-empty term filters
/// the merged catalogue by case-insensitive substring over material code,
/// description, and supplier, stopping at `limit` matches. Result order is
/// the source mapping's iteration order, not relevance.
pub async fn search(docs: &dyn DocumentStore, term: &str, limit: usize) -> Vec<Part> {
    let needle = term.trim().to_lowercase();

    if needle.is_empty() {
        let base = match docs.get_tree(paths::BASE_PARTS).await {
            Ok(tree) => as_map(tree),
            Err(e) => {
                warn!("base dataset read failed: {e}");
                return Vec::new();
            }
        };
        return base
            .into_iter()
            .take(limit)
            .map(|(code, value)| to_part(&code, value))
            .collect();
    }

    let merged = fetch_all(docs).await;
    let mut matches = Vec::new();
    for (code, value) in merged {
        let part = to_part(&code, value);
        if part.matches(&needle) {
            matches.push(part);
            if matches.len() >= limit {
                break;
            }
        }
    }
    matches
}

/// Pages through the override collection in key order.
///
/// The remote range API only supports an inclusive start key, so when a
/// cursor is supplied one extra row is requested and the boundary row is
/// dropped if it matches the cursor. A short page is legal and does not by
/// itself mean end-of-data.
pub async fn paginate(docs: &dyn DocumentStore, limit: usize, cursor: Option<&str>) -> Vec<Part> {
    let fetch = limit + usize::from(cursor.is_some());

    let rows = match docs.query_from(paths::PART_OVERRIDES, cursor, fetch).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("parts page read failed: {e}");
            return Vec::new();
        }
    };

    let mut rows = rows.into_iter();
    let mut page: Vec<Part> = Vec::with_capacity(limit);
    if let Some((first_key, first_value)) = rows.next() {
        // Drop the inclusive boundary row when it repeats the cursor.
        if cursor != Some(first_key.as_str()) {
            page.push(to_part(&first_key, first_value));
        }
    }
    for (key, value) in rows {
        if page.len() >= limit {
            break;
        }
        page.push(to_part(&key, value));
    }
    page.truncate(limit);
    page
}

/// Fetches one part by material code, merged across both collections.
/// Returns `None` when the code is absent from both, or on a remote fault.
pub async fn get_by_key(docs: &dyn DocumentStore, material_code: &str) -> Option<Part> {
    let (base, overlay) = tokio::join!(
        docs.get(paths::BASE_PARTS, material_code),
        docs.get(paths::PART_OVERRIDES, material_code)
    );

    let (base, overlay) = match (base, overlay) {
        (Ok(base), Ok(overlay)) => (base, overlay),
        (Err(e), _) | (_, Err(e)) => {
            warn!("part lookup for {material_code} failed: {e}");
            return None;
        }
    };

    match (base, overlay) {
        (Some(base), Some(overlay)) => {
            Some(to_part(material_code, merge_record(&base, &overlay)))
        }
        (Some(record), None) | (None, Some(record)) => Some(to_part(material_code, record)),
        (None, None) => None,
    }
}

/// Writes an admin override: reads the current override row, shallow-merges
/// `patch` over it, and writes the result back. The read and the write are
/// two separate remote calls with no transaction between them - a concurrent
/// writer's fields can be overwritten (last write wins).
pub async fn update_part_data(
    docs: &dyn DocumentStore,
    material_code: &str,
    patch: Map<String, Value>,
) -> Result<Part> {
    let existing = docs
        .get(paths::PART_OVERRIDES, material_code)
        .await?
        .unwrap_or_else(|| Value::Object(Map::new()));

    let merged = merge_record(&existing, &Value::Object(patch));
    docs.put(paths::PART_OVERRIDES, material_code, merged.clone())
        .await?;

    Ok(to_part(material_code, merged))
}
