//! Core business logic - framework-agnostic catalogue, BoM, workflow, and
//! rendering operations. All functions are async where they touch a store and
//! return structured data the caller layer (CLI, future HTTP surface) formats.

/// Application workflow - submit, list, approve, reject
pub mod application;
/// Bill-of-materials reads and row projection
pub mod bom;
/// Parts catalogue reads, search, pagination, and override writes
pub mod parts;
/// PDF application-form rendering
pub mod render;
/// Image re-homing on approval
pub mod rehome;
