//! Image re-homing - moving an application's photo to its part-code key.
//!
//! The blob store has no rename primitive, so "moving" a blob is copy,
//! repoint, delete. The direct path copies bytes verbatim from the stored
//! download URL. When that fetch fails, the fallback path resolves the
//! image through the public URL chain, decodes it, and re-encodes to PNG -
//! visually equivalent but not guaranteed byte-identical (re-encoding can
//! change compression artifacts). The source blob is deleted only after the
//! destination upload succeeds, and a delete failure is swallowed.
//!
//! Callers treat the whole operation as best-effort: `approve` logs any
//! error returned here and carries on.

use bytes::Bytes;
use std::io::Cursor;
use tracing::{debug, warn};

use crate::entities::{PartApplication, content_type_for};
use crate::errors::{Error, Result};
use crate::store::{BlobStore, DocumentStore, paths};

/// Extension fallback chain for images stored without a recorded URL,
/// tried in order.
pub const FALLBACK_EXTENSIONS: [&str; 3] = ["png", "jpg", "webp"];

/// Extension embedded in a download URL's object key, "png" when the URL
/// carries none.
#[must_use]
pub fn url_extension(url: &str) -> &str {
    let key = url.split('?').next().unwrap_or(url);
    match key.rsplit_once('.') {
        Some((_, ext)) if !ext.contains('/') => ext,
        _ => "png",
    }
}

/// Copies the application's image under `part_code` and repoints the stored
/// record at the new download URL. Returns that URL.
///
/// # Errors
/// Any step can fail with a remote fault; callers are expected to log and
/// swallow it (approval must not depend on this bookkeeping).
pub async fn rehome_image(
    docs: &dyn DocumentStore,
    blobs: &dyn BlobStore,
    application: &PartApplication,
    part_code: &str,
) -> Result<String> {
    let source_url = match &application.image_url {
        Some(url) => url.clone(),
        None => {
            blobs
                .download_url(&format!("{}.png", application.id))
                .await?
        }
    };
    let mut source_ext = url_extension(&source_url).to_string();

    // Direct path: byte-for-byte copy of the source blob.
    let (bytes, ext) = match blobs.fetch(&source_url).await {
        Ok(bytes) => (bytes, source_ext.clone()),
        Err(e) => {
            debug!("direct image copy for {} failed ({e}), re-encoding", application.id);
            let (png, found_ext) = reencode_via_fallback(blobs, &application.id).await?;
            // The stale blob lives under the extension that resolved, which
            // need not match the one the stored URL suggested.
            source_ext = found_ext.to_string();
            (png, "png".to_string())
        }
    };

    let destination_key = format!("{part_code}.{ext}");
    let new_url = blobs
        .upload(&destination_key, bytes, content_type_for(&ext))
        .await?;

    // Source cleanup only after the destination exists. Failure here leaves
    // a stale blob behind, nothing worse.
    let source_key = format!("{}.{source_ext}", application.id);
    if let Err(e) = blobs.delete(&source_key).await {
        warn!("stale blob {source_key} not deleted: {e}");
    }

    let mut updated = application.clone();
    updated.image_url = Some(new_url.clone());
    docs.put(
        paths::APPLICATIONS,
        &application.id,
        serde_json::to_value(&updated)?,
    )
    .await?;

    Ok(new_url)
}

/// Fallback path: resolve the image through the public URL chain, decode,
/// and re-encode to PNG. Pixel-equivalent to the source, not byte-identical.
/// Also reports the extension the blob was found under so the caller can
/// delete the right source key.
async fn reencode_via_fallback(blobs: &dyn BlobStore, id: &str) -> Result<(Bytes, &'static str)> {
    let (bytes, found_ext) = fetch_via_fallback(blobs, id).await?;

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| Error::remote(format!("image for {id} does not decode: {e}")))?;

    let mut encoded = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut encoded), image::ImageOutputFormat::Png)
        .map_err(|e| Error::remote(format!("image for {id} does not re-encode: {e}")))?;

    Ok((Bytes::from(encoded), found_ext))
}

/// Tries each extension in [`FALLBACK_EXTENSIONS`] against the public URL
/// shape and returns the first blob that fetches, together with the
/// extension it was found under.
async fn fetch_via_fallback(blobs: &dyn BlobStore, id: &str) -> Result<(Bytes, &'static str)> {
    for ext in FALLBACK_EXTENSIONS {
        let url = blobs.download_url(&format!("{id}.{ext}")).await?;
        match blobs.fetch(&url).await {
            Ok(bytes) => return Ok((bytes, ext)),
            Err(_) => continue,
        }
    }
    Err(Error::remote(format!("no image blob found for {id}")))
}
