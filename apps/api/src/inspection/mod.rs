// Inspection diff engine and its read-side plumbing.
// `diff` and `summary` are pure; all database access goes through `repository`.

pub mod diff;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod summary;
