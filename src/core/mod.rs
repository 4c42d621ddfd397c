//! Core business logic - framework-agnostic scheduling, review, and item operations.
//!
//! The scheduling pieces (`schedule`, `progress`, `review`, `item`, `stats`)
//! work against the store traits in [`crate::store`]. Folder, question and
//! achievement listing are plain `SeaORM` queries.

/// Achievement records and listing
pub mod achievement;
/// Folder management with derived item counts
pub mod folder;
/// Item lifecycle: create, update, archive, delete
pub mod item;
/// Due-set resolution and per-item review progress
pub mod progress;
/// Custom reflection questions
pub mod question;
/// Review completion and the complete-then-archive flow
pub mod review;
/// Interval labels and schedule expansion
pub mod schedule;
/// Per-user dashboard statistics
pub mod stats;
