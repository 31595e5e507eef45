//! Core subsystems of the EisenKan task manager: an embedded version-control
//! utility over a content-addressed store, a thread-safe TTL/LRU cache, and
//! a stateless spatial layout engine for Kanban boards. The three cores are
//! independent at runtime and communicate only through their public
//! contracts.
pub mod cache;
pub mod layout;
pub mod logging;
pub mod versioning;
