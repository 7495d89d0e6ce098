//! Application workflow business logic.
//!
//! A part application moves pending→approved or pending→rejected and never
//! back. Approval is two-phase: phase 1 writes the authoritative record and
//! must succeed for the call to return Ok; phase 2 re-homes the attached
//! image under the assigned part code and is awaited but swallowed - its
//! failure is logged and never reaches the caller, so approval correctness
//! does not depend on image bookkeeping.

use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;

use crate::config::IdStrategy;
use crate::core::rehome;
use crate::entities::{ApplicationDraft, ApplicationStatus, ImageAttachment, PartApplication};
use crate::errors::{Error, Result};
use crate::store::{BlobStore, DocumentStore, paths};

/// Checks the draft's required fields and returns its image attachment.
/// The first missing field names the validation error; nothing has touched
/// a remote store when this fails.
fn validate_draft(draft: &ApplicationDraft) -> Result<&ImageAttachment> {
    for (field, value) in [
        ("requester", &draft.requester),
        ("department", &draft.department),
        ("specifications", &draft.specifications),
        ("supplier", &draft.supplier),
    ] {
        if value.trim().is_empty() {
            return Err(Error::missing(field));
        }
    }

    draft.image.as_ref().ok_or_else(|| Error::missing("image"))
}

async fn next_identifier(docs: &dyn DocumentStore, strategy: IdStrategy) -> Result<String> {
    match strategy {
        // The placeholder row is replaced by the full record straight after
        // the image upload resolves.
        IdStrategy::PushKey => {
            docs.push(paths::APPLICATIONS, json!({ "status": "pending" }))
                .await
        }
        // count+1, zero-padded. Not safe under concurrent submitters - two
        // near-simultaneous submits can compute the same next number.
        IdStrategy::Sequential => {
            let count = match docs.get_tree(paths::APPLICATIONS).await? {
                Some(Value::Object(tree)) => tree.len(),
                _ => 0,
            };
            Ok(format!("APP{:04}", count + 1))
        }
    }
}

/// Removes the placeholder row a failed push-key submit left behind.
/// Best effort: the submit is already failing, so a delete fault only warns.
async fn discard_placeholder(docs: &dyn DocumentStore, strategy: IdStrategy, id: &str) {
    if strategy != IdStrategy::PushKey {
        return;
    }
    if let Err(e) = docs.delete(paths::APPLICATIONS, id).await {
        warn!("placeholder cleanup for {id} failed: {e}");
    }
}

fn to_application(key: &str, mut value: Value) -> Option<PartApplication> {
    // Legacy rows may omit their own identifier; the store key is canonical.
    if let Some(fields) = value.as_object_mut() {
        fields
            .entry("id")
            .or_insert_with(|| Value::String(key.to_string()));
    }
    serde_json::from_value(value).ok()
}

/// Submits a new part application.
///
/// Validates the draft, generates an identifier per `strategy`, uploads the
/// attached photo keyed by that identifier, and stores the pending record.
/// Returns the identifier.
///
/// # Errors
/// `Error::Validation` before any remote call when a required field or the
/// image is missing; remote faults from the upload or the record write are
/// propagated so the caller can surface them. A push-key placeholder row
/// created before such a fault is removed so no phantom pending record
/// survives the failed submit.
pub async fn submit(
    docs: &dyn DocumentStore,
    blobs: &dyn BlobStore,
    strategy: IdStrategy,
    draft: &ApplicationDraft,
) -> Result<String> {
    let image = validate_draft(draft)?;
    let id = next_identifier(docs, strategy).await?;

    let blob_key = format!("{id}.{}", image.extension());
    let image_url = match blobs
        .upload(&blob_key, image.bytes.clone(), &image.content_type)
        .await
    {
        Ok(url) => url,
        Err(e) => {
            discard_placeholder(docs, strategy, &id).await;
            return Err(e);
        }
    };

    let record = PartApplication {
        id: id.clone(),
        requester: draft.requester.trim().to_string(),
        department: draft.department.trim().to_string(),
        priority: draft.priority,
        specifications: draft.specifications.trim().to_string(),
        supplier: draft.supplier.trim().to_string(),
        standard_price: draft.standard_price,
        justification: draft.justification.clone(),
        notes: draft.notes.clone(),
        submitted_at: Utc::now(),
        status: ApplicationStatus::Pending,
        image_url: Some(image_url),
        part_code: None,
        approved_at: None,
    };

    if let Err(e) = docs
        .put(paths::APPLICATIONS, &id, serde_json::to_value(&record)?)
        .await
    {
        discard_placeholder(docs, strategy, &id).await;
        return Err(e);
    }

    Ok(id)
}

/// Lists all applications, newest first.
///
/// Store iteration order tracks creation order for push keys and sequential
/// codes alike, so reversing it is the newest-first heuristic. A remote
/// fault degrades to an empty list.
pub async fn list(docs: &dyn DocumentStore) -> Vec<PartApplication> {
    let tree = match docs.get_tree(paths::APPLICATIONS).await {
        Ok(Some(Value::Object(tree))) => tree,
        Ok(_) => return Vec::new(),
        Err(e) => {
            warn!("application list read failed: {e}");
            return Vec::new();
        }
    };

    let mut applications: Vec<PartApplication> = tree
        .into_iter()
        .filter_map(|(key, value)| to_application(&key, value))
        .collect();
    applications.reverse();
    applications
}

/// Fetches one application by identifier. `None` when absent or on a
/// remote fault.
pub async fn get(docs: &dyn DocumentStore, id: &str) -> Option<PartApplication> {
    match docs.get(paths::APPLICATIONS, id).await {
        Ok(Some(value)) => to_application(id, value),
        Ok(None) => None,
        Err(e) => {
            warn!("application lookup for {id} failed: {e}");
            None
        }
    }
}

async fn load_pending(docs: &dyn DocumentStore, id: &str) -> Result<PartApplication> {
    let value = docs
        .get(paths::APPLICATIONS, id)
        .await?
        .ok_or_else(|| Error::NotFound { id: id.to_string() })?;

    let application = to_application(id, value).ok_or_else(|| {
        Error::remote(format!("application {id} is not a readable record"))
    })?;

    if !application.is_pending() {
        return Err(Error::InvalidTransition {
            id: id.to_string(),
            status: application.status.to_string(),
        });
    }

    Ok(application)
}

/// Approves a pending application, assigning it `part_code`.
///
/// Phase 1 (authoritative): status=approved, part code, approval timestamp,
/// written back to the store - failure here fails the call. Phase 2
/// (bookkeeping): the attached image is re-homed under the part code;
/// failure there is logged and swallowed, so the returned record may still
/// carry the identifier-keyed image URL.
pub async fn approve(
    docs: &dyn DocumentStore,
    blobs: &dyn BlobStore,
    id: &str,
    part_code: &str,
) -> Result<PartApplication> {
    let part_code = part_code.trim();
    if part_code.is_empty() {
        return Err(Error::missing("partCode"));
    }

    let mut application = load_pending(docs, id).await?;
    application.status = ApplicationStatus::Approved;
    application.part_code = Some(part_code.to_string());
    application.approved_at = Some(Utc::now());

    docs.put(
        paths::APPLICATIONS,
        id,
        serde_json::to_value(&application)?,
    )
    .await?;

    match rehome::rehome_image(docs, blobs, &application, part_code).await {
        Ok(new_url) => application.image_url = Some(new_url),
        Err(e) => warn!("image re-homing for {id} failed: {e}"),
    }

    Ok(application)
}

/// Rejects a pending application. Terminal, no side effects beyond the
/// record write.
pub async fn reject(docs: &dyn DocumentStore, id: &str) -> Result<PartApplication> {
    let mut application = load_pending(docs, id).await?;
    application.status = ApplicationStatus::Rejected;

    docs.put(
        paths::APPLICATIONS,
        id,
        serde_json::to_value(&application)?,
    )
    .await?;

    Ok(application)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::store::{MemoryBlobStore, MemoryDocumentStore};
    use crate::test_utils::{FailingBlobStore, sample_draft, tiny_png};
    use bytes::Bytes;

    #[tokio::test]
    async fn test_submit_rejects_missing_fields() {
        let docs = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();

        let mut draft = sample_draft();
        draft.requester = "  ".to_string();
        let err = submit(&docs, &blobs, IdStrategy::PushKey, &draft)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field } if field == "requester"));

        let mut draft = sample_draft();
        draft.image = None;
        let err = submit(&docs, &blobs, IdStrategy::PushKey, &draft)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field } if field == "image"));

        // Nothing was written on either failure.
        assert!(list(&docs).await.is_empty());
    }

    #[tokio::test]
    async fn test_submit_stores_pending_record_and_image() -> Result<()> {
        let docs = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();

        let id = submit(&docs, &blobs, IdStrategy::PushKey, &sample_draft()).await?;

        let stored = get(&docs, &id).await.unwrap();
        assert!(stored.is_pending());
        assert!(stored.part_code.is_none());
        assert!(stored.approved_at.is_none());
        assert!(blobs.contains(&format!("{id}.png")));
        assert_eq!(
            stored.image_url.as_deref(),
            Some(format!("memory://blobs/{id}.png?alt=media").as_str())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_no_record() {
        let docs = MemoryDocumentStore::new();

        // The push-key placeholder lands before the upload; a failing blob
        // store must not leave it behind as a phantom pending application.
        let err = submit(&docs, &FailingBlobStore, IdStrategy::PushKey, &sample_draft())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Remote { .. }));
        assert!(list(&docs).await.is_empty());
    }

    #[tokio::test]
    async fn test_sequential_identifiers_are_zero_padded() -> Result<()> {
        let docs = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();

        let first = submit(&docs, &blobs, IdStrategy::Sequential, &sample_draft()).await?;
        let second = submit(&docs, &blobs, IdStrategy::Sequential, &sample_draft()).await?;
        assert_eq!(first, "APP0001");
        assert_eq!(second, "APP0002");
        Ok(())
    }

    #[tokio::test]
    async fn test_list_is_newest_first() -> Result<()> {
        let docs = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();

        let first = submit(&docs, &blobs, IdStrategy::PushKey, &sample_draft()).await?;
        let second = submit(&docs, &blobs, IdStrategy::PushKey, &sample_draft()).await?;

        let applications = list(&docs).await;
        assert_eq!(applications.len(), 2);
        assert_eq!(applications[0].id, second);
        assert_eq!(applications[1].id, first);
        Ok(())
    }

    #[tokio::test]
    async fn test_approve_requires_part_code() -> Result<()> {
        let docs = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let id = submit(&docs, &blobs, IdStrategy::PushKey, &sample_draft()).await?;

        let err = approve(&docs, &blobs, &id, "   ").await.unwrap_err();
        assert!(matches!(err, Error::Validation { ref field } if field == "partCode"));

        // The record is untouched.
        assert!(get(&docs, &id).await.unwrap().is_pending());
        Ok(())
    }

    #[tokio::test]
    async fn test_approve_transitions_and_rehomes() -> Result<()> {
        let docs = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let id = submit(&docs, &blobs, IdStrategy::PushKey, &sample_draft()).await?;
        let original = blobs.bytes_at(&format!("{id}.png")).unwrap();

        let approved = approve(&docs, &blobs, &id, "PC-100").await?;
        assert_eq!(approved.status, ApplicationStatus::Approved);
        assert_eq!(approved.part_code.as_deref(), Some("PC-100"));
        assert!(approved.approved_at.is_some());

        // The blob moved to the part-code key, byte for byte.
        assert_eq!(blobs.bytes_at("PC-100.png").unwrap(), original);
        assert!(!blobs.contains(&format!("{id}.png")));

        // The stored record points at the new key.
        let stored = get(&docs, &id).await.unwrap();
        assert_eq!(
            stored.image_url.as_deref(),
            Some("memory://blobs/PC-100.png?alt=media")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_approve_survives_faulty_blob_store() -> Result<()> {
        let docs = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let id = submit(&docs, &blobs, IdStrategy::PushKey, &sample_draft()).await?;

        // Re-homing is handed a blob store that fails every call.
        let approved = approve(&docs, &FailingBlobStore, &id, "PC-100").await?;
        assert_eq!(approved.status, ApplicationStatus::Approved);
        assert_eq!(approved.part_code.as_deref(), Some("PC-100"));

        let stored = get(&docs, &id).await.unwrap();
        assert_eq!(stored.status, ApplicationStatus::Approved);
        Ok(())
    }

    #[tokio::test]
    async fn test_terminal_states_reject_transitions() -> Result<()> {
        let docs = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let id = submit(&docs, &blobs, IdStrategy::PushKey, &sample_draft()).await?;

        approve(&docs, &blobs, &id, "PC-100").await?;
        let err = approve(&docs, &blobs, &id, "PC-200").await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));

        let err = reject(&docs, &id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));

        let err = approve(&docs, &blobs, "missing", "PC-1").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_reject_is_terminal() -> Result<()> {
        let docs = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let id = submit(&docs, &blobs, IdStrategy::PushKey, &sample_draft()).await?;

        let rejected = reject(&docs, &id).await?;
        assert_eq!(rejected.status, ApplicationStatus::Rejected);
        assert!(rejected.part_code.is_none());

        // The original image stays where it was.
        assert!(blobs.contains(&format!("{id}.png")));
        Ok(())
    }

    #[tokio::test]
    async fn test_jpeg_attachment_keys_use_jpg_extension() -> Result<()> {
        let docs = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();

        let mut draft = sample_draft();
        draft.image = Some(crate::entities::ImageAttachment::new(
            Bytes::from(tiny_png()),
            "image/jpeg",
        ));
        let id = submit(&docs, &blobs, IdStrategy::PushKey, &draft).await?;
        assert!(blobs.contains(&format!("{id}.jpg")));
        Ok(())
    }
}
