// Pagination: page geometry, protected-block break planning, surface slicing.
// Slicing decodes and re-encodes PNGs; run it inside tokio::task::spawn_blocking.

pub mod geometry;
pub mod handlers;
pub mod page_break;
pub mod slicer;
