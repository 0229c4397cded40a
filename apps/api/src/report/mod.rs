// Report export: content projection, pagination orchestration, HTTP surface.
// Rendering and PDF writing are external; see `assembler::{ReportRenderer, DocumentWriter}`.

pub mod assembler;
pub mod content;
pub mod handlers;
