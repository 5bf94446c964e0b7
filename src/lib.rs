//! # fitcrop
//!
//! Deterministic image renditions for named collections. Each original is
//! turned upright, then either fit-and-cropped to an exact size or capped on
//! one axis, and re-encoded in its own format.
//!
//! # Architecture
//!
//! ```text
//! request → collection templates → disk store ─┬─ hit  → stored bytes
//!                                              └─ miss → pipeline → store → bytes
//! ```
//!
//! The pipeline never touches the filesystem. It takes a blob, a request and a
//! [`imaging::Codec`], and returns a blob. Everything pixel-related goes
//! through the codec, so the geometry and lifecycle rules are tested against a
//! mock while the real codec is tested separately.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Planning arithmetic, orientation, the codec seam, and the fit/cap pipeline |
//! | [`config`] | `fitcrop.toml` loading, merging with stock defaults, and validation |
//! | [`collection`] | JSON collection file: per-collection path templates |
//! | [`store`] | Reads renditions and originals from disk, writes new renditions |
//! | [`service`] | Ties the above together for one request |
//!
//! # Design Decisions
//!
//! ## Integer Planning
//!
//! All resize and crop geometry is computed with integer floor arithmetic in
//! [`imaging::plan_fit`] and [`imaging::plan_cap`]. The same source and target
//! always give the same plan, independent of float rounding.
//!
//! ## One Live Image
//!
//! Codec transforms consume their input and return the output. A pipeline
//! run therefore holds at most one decoded image, and every error path drops
//! it on the way out.
//!
//! ## Format Preserving
//!
//! Renditions are written in the original's format. Quality only applies to
//! lossy JPEG output.

pub mod collection;
pub mod config;
pub mod imaging;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
