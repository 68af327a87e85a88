//! Pipeline stages for one extraction request.
//!
//! Each submodule implements exactly one step. Keeping stages separate makes
//! each independently testable and lets us swap the extraction engine without
//! touching staging or export.
//!
//! ## Data Flow
//!
//! ```text
//! staging ──▶ invoke ──▶ export
//! (upload)    (engine)   (JSON)
//! ```
//!
//! 1. [`staging`]: check the upload at the boundary and write it to a
//!    request-scoped directory that is removed on drop
//! 2. [`invoke`] : call the extraction engine once and validate its output
//!    into [`crate::schema::ExtractionResult`]
//! 3. [`export`] : serialise the result into the downloadable artifact

pub mod export;
pub mod invoke;
pub mod staging;
