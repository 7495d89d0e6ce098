//! Entity module - Plain data records mirroring the remote document store.
//! These structs are the wire schema: field names (camelCase) must match the
//! JSON stored in the hosted collections. Each record is lenient on input
//! (defaulted fields) because the store contains rows written by several
//! generations of clients.

pub mod application;
pub mod bom;
pub mod part;

pub use application::{
    ApplicationDraft, ApplicationStatus, ImageAttachment, PartApplication, Priority,
    content_type_for, extension_for,
};
pub use bom::BomComponent;
pub use part::Part;
