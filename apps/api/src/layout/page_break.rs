//! Page Break Planner — cuts a continuously rendered surface into printable pages.
//!
//! # Algorithm
//! Greedy, forward-only, one page at a time. Each break depends only on where the
//! previous page ended and the first protected block straddling the ideal page end:
//! - break before the block if the page keeps at least `MIN_FILL_RATIO` of its height
//! - else break after the block if the page still fits
//! - else fall back to the nearest earlier block end that keeps the fill, or the
//!   ideal end (the block is split)
//!
//! A block taller than one page can never be kept whole. The planner splits it
//! rather than looping, and logs the split.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Minimum fraction of `max_page_height` a page must hold before a block may pull
/// the break above the page limit.
pub const MIN_FILL_RATIO: f64 = 0.3;

/// Upper bound on pages a caller may request a plan for.
pub const MAX_PAGES: usize = 500;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// A region of the rendered surface that must not be cut by a page boundary.
///
/// Offsets are in surface units (pixels), `top` inclusive, `bottom` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectedBlock {
    pub top: f64,
    pub bottom: f64,
}

impl ProtectedBlock {
    pub fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// True if `offset` lies strictly inside the block.
    pub fn straddles(&self, offset: f64) -> bool {
        self.top < offset && offset < self.bottom
    }
}

/// Cursor-relative feasibility limits for the page currently being planned.
struct PageWindow {
    cursor: f64,
    max_page_height: f64,
    min_fill: f64,
}

impl PageWindow {
    fn ideal_end(&self) -> f64 {
        self.cursor + self.max_page_height
    }

    /// Breaking at `offset` leaves enough content on the current page.
    fn fills(&self, offset: f64) -> bool {
        offset - self.cursor >= self.min_fill
    }

    /// Breaking at `offset` keeps the current page within the physical page height.
    fn fits(&self, offset: f64) -> bool {
        offset > self.cursor && offset - self.cursor <= self.max_page_height
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Plans page boundaries over a surface of `content_height`.
///
/// Returns `[0, c1, ..., content_height]`, strictly increasing, with no page taller
/// than `max_page_height`. Total: never fails and always terminates.
///
/// Degenerate inputs: a non-positive (or non-finite) `content_height` yields `[0]`;
/// a non-positive (or non-finite) `max_page_height` yields a single page.
pub fn plan_breaks(
    content_height: f64,
    max_page_height: f64,
    protected_blocks: &[ProtectedBlock],
) -> Vec<f64> {
    if !content_height.is_finite() || content_height <= 0.0 {
        return vec![0.0];
    }
    if !max_page_height.is_finite() || max_page_height <= 0.0 {
        warn!(
            max_page_height,
            "Page break planner: unusable page height, emitting a single page"
        );
        return vec![0.0, content_height];
    }

    let blocks = sorted_blocks(protected_blocks);
    let mut breaks = vec![0.0];
    let mut cursor = 0.0_f64;

    while cursor < content_height {
        let window = PageWindow {
            cursor,
            max_page_height,
            min_fill: MIN_FILL_RATIO * max_page_height,
        };
        let ideal_end = window.ideal_end();
        if ideal_end >= content_height {
            break;
        }

        let mut candidate = resolve_straddle(&blocks, &window).unwrap_or(ideal_end);
        candidate = candidate.min(ideal_end);
        candidate = safety_sweep(&blocks, &window, candidate);

        breaks.push(candidate);
        cursor = candidate;
    }

    breaks.push(content_height);
    breaks
}

/// True when `content_height` would need more than `MAX_PAGES` pages of
/// `max_page_height`. Degenerate inputs are left to `plan_breaks`.
pub fn exceeds_page_limit(content_height: f64, max_page_height: f64) -> bool {
    if !content_height.is_finite() || !max_page_height.is_finite() {
        return false;
    }
    if content_height <= 0.0 || max_page_height <= 0.0 {
        return false;
    }
    (content_height / max_page_height).ceil() > MAX_PAGES as f64
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

/// Valid blocks sorted by `top` (stable, so equal tops keep input order).
fn sorted_blocks(blocks: &[ProtectedBlock]) -> Vec<ProtectedBlock> {
    let mut sorted: Vec<ProtectedBlock> = blocks
        .iter()
        .copied()
        .filter(|b| b.top.is_finite() && b.bottom.is_finite() && b.bottom > b.top)
        .collect();
    sorted.sort_by(|a, b| a.top.total_cmp(&b.top));
    sorted
}

/// Resolves the first block straddling the ideal page end, if any.
///
/// Returns `None` when no block straddles, so the caller keeps the ideal end.
fn resolve_straddle(blocks: &[ProtectedBlock], window: &PageWindow) -> Option<f64> {
    let ideal_end = window.ideal_end();
    let idx = blocks.iter().position(|b| b.straddles(ideal_end))?;
    let block = blocks[idx];

    if window.fills(block.top) {
        return Some(block.top);
    }
    if window.fits(block.bottom) {
        return Some(block.bottom);
    }

    // The block cannot sit on this page and breaking before it underfills the page:
    // look back for the nearest earlier block end that still fills the page.
    let fallback = blocks[..idx]
        .iter()
        .rev()
        .find(|b| b.bottom <= ideal_end && window.fills(b.bottom))
        .map(|b| b.bottom);

    if fallback.is_none() {
        warn!(
            cursor = window.cursor,
            break_at = ideal_end,
            block_top = block.top,
            block_bottom = block.bottom,
            "Page break planner: no split-free break fits the page, splitting block"
        );
    }

    Some(fallback.unwrap_or(ideal_end))
}

/// Final check that the chosen break does not sit inside a block.
///
/// Nudges to the closer block edge (then the farther one) when feasible; otherwise
/// keeps the candidate as an emergency split.
fn safety_sweep(blocks: &[ProtectedBlock], window: &PageWindow, candidate: f64) -> f64 {
    let Some(block) = blocks.iter().find(|b| b.straddles(candidate)) else {
        return candidate;
    };

    let top_ok = window.fills(block.top);
    let bottom_ok = window.fits(block.bottom);
    let top_closer = candidate - block.top <= block.bottom - candidate;

    let nudged = match (top_closer, top_ok, bottom_ok) {
        (true, true, _) => Some(block.top),
        (true, false, true) => Some(block.bottom),
        (false, _, true) => Some(block.bottom),
        (false, true, false) => Some(block.top),
        _ => None,
    };

    match nudged {
        Some(offset) => offset,
        None => {
            warn!(
                cursor = window.cursor,
                break_at = candidate,
                block_top = block.top,
                block_bottom = block.bottom,
                "Page break planner: emergency fallback, block split across pages"
            );
            candidate
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
