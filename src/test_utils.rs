//! Shared test utilities for `PartDesk`.
//!
//! Helpers for seeding in-memory stores and building sample records with
//! sensible defaults, plus a blob store that fails on purpose for the
//! best-effort / fault-injection tests.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde_json::json;
use std::io::Cursor;

use crate::entities::{
    ApplicationDraft, ApplicationStatus, ImageAttachment, PartApplication, Priority,
};
use crate::errors::{Error, Result};
use crate::store::{BlobStore, MemoryDocumentStore, paths};

/// A real 2x2 PNG, generated in memory so image-decode paths exercise actual
/// codec work rather than magic-byte stubs.
pub fn tiny_png() -> Vec<u8> {
    let pixels = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 40, 40]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(pixels)
        .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
        .expect("encoding a 2x2 PNG cannot fail");
    buf
}

/// A draft that passes validation: all required fields set, PNG attached.
pub fn sample_draft() -> ApplicationDraft {
    ApplicationDraft {
        requester: "M. Rossi".to_string(),
        department: "Maintenance".to_string(),
        priority: Priority::Medium,
        specifications: "M8 hex bolt, zinc plated, DIN 933".to_string(),
        supplier: "Acme Fasteners".to_string(),
        standard_price: 0.4,
        justification: Some("Current stock is obsolete".to_string()),
        notes: None,
        image: Some(ImageAttachment::new(Bytes::from(tiny_png()), "image/png")),
    }
}

/// A stored application record with the given identifier.
pub fn sample_application(id: &str) -> PartApplication {
    PartApplication {
        id: id.to_string(),
        requester: "M. Rossi".to_string(),
        department: "Maintenance".to_string(),
        priority: Priority::High,
        specifications: "M8 hex bolt, zinc plated, DIN 933".to_string(),
        supplier: "Acme Fasteners".to_string(),
        standard_price: 0.4,
        justification: None,
        notes: None,
        submitted_at: Utc::now(),
        status: ApplicationStatus::Pending,
        image_url: None,
        part_code: None,
        approved_at: None,
    }
}

/// A document store seeded with a small parts catalogue:
/// three base rows, two overridden rows, and one override-only row.
pub fn seeded_parts_store() -> MemoryDocumentStore {
    let docs = MemoryDocumentStore::new();

    docs.seed(
        paths::BASE_PARTS,
        "MAT-001",
        json!({"description": "Hex Bolt M8", "supplier": "Acme Fasteners", "price": 0.25}),
    );
    docs.seed(
        paths::BASE_PARTS,
        "MAT-002",
        json!({"description": "Hex Nut M8", "supplier": "Acme Fasteners", "price": 0.10}),
    );
    docs.seed(
        paths::BASE_PARTS,
        "MAT-003",
        json!({"description": "Washer 8mm", "supplier": "Bolteria", "price": 0.05}),
    );

    docs.seed(paths::PART_OVERRIDES, "MAT-001", json!({"price": 0.40}));
    docs.seed(
        paths::PART_OVERRIDES,
        "MAT-002",
        json!({"notes": "superseded next quarter"}),
    );
    docs.seed(
        paths::PART_OVERRIDES,
        "MAT-OVR",
        json!({"description": "Override-only part", "supplier": "Acme Fasteners"}),
    );

    docs
}

/// A blob store that fails every call - injected to prove that approval
/// does not depend on image bookkeeping.
pub struct FailingBlobStore;

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn upload(&self, _key: &str, _bytes: Bytes, _content_type: &str) -> Result<String> {
        Err(Error::remote("blob store down"))
    }

    async fn download_url(&self, _key: &str) -> Result<String> {
        Err(Error::remote("blob store down"))
    }

    async fn fetch(&self, _url: &str) -> Result<Bytes> {
        Err(Error::remote("blob store down"))
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Err(Error::remote("blob store down"))
    }
}
