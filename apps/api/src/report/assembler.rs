//! Report Assembler — diff → content → render → plan breaks → slice → document.
//!
//! # Failure semantics
//! Any render, slice or write failure aborts the whole assembly with one
//! `ReportError`. Pages are only handed to the document writer once every page has
//! been sliced, so a partial document is never produced.
//!
//! # spawn_blocking pattern
//! PNG decode/crop/encode is CPU-bound; it runs via `tokio::task::spawn_blocking`
//! on owned data so the async executor stays responsive.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::inspection::diff::compare_inspections;
use crate::inspection::models::{Inspection, Property};
use crate::inspection::summary::{summarize, InspectionSummary};
use crate::layout::geometry::PageGeometry;
use crate::layout::page_break::{exceeds_page_limit, plan_breaks, ProtectedBlock, MAX_PAGES};
use crate::layout::slicer::{slice_surface, PageImage, SliceError};
use crate::report::content::{build_report_content, ReportContent, SectionConfig};

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// The single user-facing failure of a report assembly.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("The report could not be rendered: {0}")]
    Render(String),

    #[error("The rendered report is unusable: {0}")]
    InvalidSurface(String),

    #[error("The report could not be split into pages: {0}")]
    Slice(#[from] SliceError),

    #[error("The report document could not be written: {0}")]
    Document(String),

    #[error("Report generation was interrupted: {0}")]
    Interrupted(String),
}

// ────────────────────────────────────────────────────────────────────────────
// External seams
// ────────────────────────────────────────────────────────────────────────────

/// A rasterized report plus the bounds of its top-level sections.
#[derive(Debug, Clone)]
pub struct RenderedSurface {
    pub png: Bytes,
    pub width: u32,
    pub height: u32,
    pub blocks: Vec<ProtectedBlock>,
}

/// Renders structured report content to a single tall surface.
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn render(&self, content: &ReportContent) -> Result<RenderedSurface, ReportError>;
}

/// Emits the final document from ordered page images.
#[async_trait]
pub trait DocumentWriter: Send + Sync {
    async fn write(&self, pages: &[PageImage], geometry: &PageGeometry)
        -> Result<Bytes, ReportError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

/// A finished, paginated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedDocument {
    #[serde(skip)]
    pub document: Bytes,
    pub page_count: usize,
    /// Break offsets in surface pixels, `[0, ..., surface_height]`.
    pub breaks: Vec<f64>,
    pub summary: InspectionSummary,
    pub geometry: PageGeometry,
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Builds the comparison report for one property's entry/exit inspection pair.
///
/// `config` only projects what is shown; matching always runs over all rooms.
/// Deterministic given a deterministic renderer and writer.
pub async fn assemble_report(
    renderer: &dyn ReportRenderer,
    writer: &dyn DocumentWriter,
    geometry: &PageGeometry,
    property: &Property,
    entry: &Inspection,
    exit: &Inspection,
    config: &SectionConfig,
) -> Result<PagedDocument, ReportError> {
    let rooms = compare_inspections(&entry.detections, &exit.detections);
    let content = build_report_content(
        property,
        entry.performed_at,
        exit.performed_at,
        &rooms,
        config,
    );
    let summary = content.summary.unwrap_or_else(|| summarize(&content.rooms));

    let surface = renderer.render(&content).await?;

    if surface.height == 0 {
        return Err(ReportError::InvalidSurface(
            "the rendered surface is empty".to_string(),
        ));
    }
    let scale = geometry.scale_for(surface.width).ok_or_else(|| {
        ReportError::InvalidSurface(format!(
            "a {}px wide surface cannot be placed on a {}x{}mm page with {}mm margins",
            surface.width, geometry.width_mm, geometry.height_mm, geometry.margin_mm
        ))
    })?;

    // Whole pixel rows keep every sliced band within the usable page height.
    let max_page_height = scale.page_height_px(geometry).floor();
    let content_height = surface.height as f64;
    if max_page_height < 1.0 {
        return Err(ReportError::InvalidSurface(format!(
            "a {}px wide surface is too narrow to fill a page",
            surface.width
        )));
    }
    if exceeds_page_limit(content_height, max_page_height) {
        return Err(ReportError::InvalidSurface(format!(
            "a {}px tall surface would need more than {MAX_PAGES} pages",
            surface.height
        )));
    }

    let blocks: Vec<ProtectedBlock> = surface
        .blocks
        .iter()
        .map(|b| ProtectedBlock::new(b.top.max(0.0), b.bottom.min(content_height)))
        .collect();
    let breaks = plan_breaks(content_height, max_page_height, &blocks);
    debug!(
        surface_height = surface.height,
        max_page_height,
        sections = content.section_count(),
        blocks = blocks.len(),
        oversized_blocks = blocks
            .iter()
            .filter(|b| b.height() > max_page_height)
            .count(),
        ?breaks,
        "Planned report page breaks"
    );

    let pages = {
        let breaks = breaks.clone();
        let geometry = *geometry;
        tokio::task::spawn_blocking(move || {
            slice_surface(
                &surface.png,
                surface.width,
                surface.height,
                &breaks,
                scale,
                &geometry,
            )
        })
        .await
        .map_err(|e| ReportError::Interrupted(format!("page slicing task failed: {e}")))??
    };

    let document = writer.write(&pages, geometry).await?;

    info!(
        property_id = %property.id,
        entry_id = %entry.id,
        exit_id = %exit.id,
        rooms = content.rooms.len(),
        pages = pages.len(),
        "Assembled inspection report"
    );

    Ok(PagedDocument {
        document,
        page_count: pages.len(),
        breaks,
        summary,
        geometry: *geometry,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspection::models::{Condition, Detection, InspectionKind};
    use crate::layout::slicer::tests::make_png;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Renders a blank surface of fixed size with fixed section blocks.
    struct FakeRenderer {
        width: u32,
        height: u32,
        blocks: Vec<ProtectedBlock>,
        seen: Mutex<Vec<ReportContent>>,
    }

    impl FakeRenderer {
        fn new(width: u32, height: u32, blocks: Vec<ProtectedBlock>) -> Self {
            Self {
                width,
                height,
                blocks,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ReportRenderer for FakeRenderer {
        async fn render(&self, content: &ReportContent) -> Result<RenderedSurface, ReportError> {
            self.seen.lock().unwrap().push(content.clone());
            Ok(RenderedSurface {
                png: Bytes::from(make_png(self.width, self.height)),
                width: self.width,
                height: self.height,
                blocks: self.blocks.clone(),
            })
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl ReportRenderer for FailingRenderer {
        async fn render(&self, _content: &ReportContent) -> Result<RenderedSurface, ReportError> {
            Err(ReportError::Render("offscreen surface unavailable".to_string()))
        }
    }

    /// Declares a taller surface than the PNG it returns.
    struct LyingRenderer;

    #[async_trait]
    impl ReportRenderer for LyingRenderer {
        async fn render(&self, _content: &ReportContent) -> Result<RenderedSurface, ReportError> {
            Ok(RenderedSurface {
                png: Bytes::from(make_png(190, 100)),
                width: 190,
                height: 900,
                blocks: vec![],
            })
        }
    }

    /// Declares a surface far taller than any report could be.
    struct RunawayRenderer;

    #[async_trait]
    impl ReportRenderer for RunawayRenderer {
        async fn render(&self, _content: &ReportContent) -> Result<RenderedSurface, ReportError> {
            Ok(RenderedSurface {
                png: Bytes::from(make_png(190, 10)),
                width: 190,
                height: u32::MAX,
                blocks: vec![],
            })
        }
    }

    #[derive(Default)]
    struct FakeWriter {
        calls: AtomicUsize,
        page_heights: Mutex<Vec<u32>>,
        page_heights_mm: Mutex<Vec<f64>>,
    }

    #[async_trait]
    impl DocumentWriter for FakeWriter {
        async fn write(
            &self,
            pages: &[PageImage],
            _geometry: &PageGeometry,
        ) -> Result<Bytes, ReportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.page_heights.lock().unwrap() = pages.iter().map(|p| p.height_px).collect();
            *self.page_heights_mm.lock().unwrap() = pages.iter().map(|p| p.height_mm).collect();
            Ok(Bytes::from(format!("%PDF pages={}", pages.len())))
        }
    }

    fn make_detection(room: &str, item: &str, condition: &str) -> Detection {
        Detection {
            item: item.to_string(),
            condition: Condition::from(condition),
            room: room.to_string(),
            source_photo_url: None,
        }
    }

    fn make_inspection(kind: InspectionKind, detections: Vec<Detection>) -> Inspection {
        Inspection {
            id: Uuid::new_v4(),
            kind,
            performed_at: None,
            detections,
        }
    }

    fn make_inputs() -> (Property, Inspection, Inspection) {
        let property = Property {
            id: Uuid::new_v4(),
            name: "Casa 7".to_string(),
            address: None,
        };
        let entry = make_inspection(
            InspectionKind::Entry,
            vec![
                make_detection("Sala", "Sofá", "used"),
                make_detection("Quarto", "Cama", "new"),
            ],
        );
        let exit = make_inspection(
            InspectionKind::Exit,
            vec![
                make_detection("Sala", "Sofá", "damaged"),
                make_detection("Quarto", "Cama", "not_found"),
            ],
        );
        (property, entry, exit)
    }

    /// 190px wide surface on default A4: 1px == 1mm, 277px usable page height.
    fn geometry() -> PageGeometry {
        PageGeometry::default()
    }

    #[tokio::test]
    async fn test_assembles_pages_at_planned_breaks() {
        let (property, entry, exit) = make_inputs();
        let renderer = FakeRenderer::new(190, 1000, vec![]);
        let writer = FakeWriter::default();

        let doc = assemble_report(
            &renderer,
            &writer,
            &geometry(),
            &property,
            &entry,
            &exit,
            &SectionConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(doc.breaks, vec![0.0, 277.0, 554.0, 831.0, 1000.0]);
        assert_eq!(doc.page_count, 4);
        assert_eq!(*writer.page_heights.lock().unwrap(), vec![277, 277, 277, 169]);
        assert_eq!(doc.document, Bytes::from("%PDF pages=4"));
        assert_eq!(doc.summary.changed, 1);
        assert_eq!(doc.summary.missing, 1);
        assert_eq!(doc.summary.critical_issues, 1);
    }

    #[tokio::test]
    async fn test_protected_blocks_move_breaks() {
        let (property, entry, exit) = make_inputs();
        let renderer = FakeRenderer::new(190, 600, vec![ProtectedBlock::new(200.0, 350.0)]);
        let writer = FakeWriter::default();

        let doc = assemble_report(
            &renderer,
            &writer,
            &geometry(),
            &property,
            &entry,
            &exit,
            &SectionConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(doc.breaks, vec![0.0, 200.0, 477.0, 600.0]);
    }

    #[tokio::test]
    async fn test_pages_stay_within_usable_height_on_uneven_scale() {
        let (property, entry, exit) = make_inputs();
        // 1000px over 190mm: 1457.89px of usable height, floored to 1457.
        let renderer = FakeRenderer::new(1000, 3000, vec![]);
        let writer = FakeWriter::default();

        let doc = assemble_report(
            &renderer,
            &writer,
            &geometry(),
            &property,
            &entry,
            &exit,
            &SectionConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(doc.breaks, vec![0.0, 1457.0, 2914.0, 3000.0]);
        assert_eq!(*writer.page_heights.lock().unwrap(), vec![1457, 1457, 86]);
        let usable = geometry().usable_height_mm();
        assert!(writer
            .page_heights_mm
            .lock()
            .unwrap()
            .iter()
            .all(|&h| h <= usable));
    }

    #[tokio::test]
    async fn test_fractional_blocks_do_not_push_pages_past_usable_height() {
        let (property, entry, exit) = make_inputs();
        let renderer = FakeRenderer::new(1000, 3000, vec![ProtectedBlock::new(1400.4, 1600.6)]);
        let writer = FakeWriter::default();

        let doc = assemble_report(
            &renderer,
            &writer,
            &geometry(),
            &property,
            &entry,
            &exit,
            &SectionConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(doc.breaks[1], 1400.4);
        assert!(writer
            .page_heights
            .lock()
            .unwrap()
            .iter()
            .all(|&h| h <= 1457));
    }

    #[tokio::test]
    async fn test_runaway_surface_height_is_rejected_before_planning() {
        let (property, entry, exit) = make_inputs();
        let writer = FakeWriter::default();

        let err = assemble_report(
            &RunawayRenderer,
            &writer,
            &geometry(),
            &property,
            &entry,
            &exit,
            &SectionConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReportError::InvalidSurface(_)));
        assert_eq!(writer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_section_config_reaches_renderer() {
        let (property, entry, exit) = make_inputs();
        let renderer = FakeRenderer::new(190, 300, vec![]);
        let writer = FakeWriter::default();
        let config = SectionConfig {
            missing: false,
            summary: false,
            ..Default::default()
        };

        let doc = assemble_report(
            &renderer, &writer, &geometry(), &property, &entry, &exit, &config,
        )
        .await
        .unwrap();

        let seen = renderer.seen.lock().unwrap();
        assert_eq!(seen[0].rooms.len(), 1);
        assert!(seen[0].summary.is_none());
        // Summary still reflects what was shown.
        assert_eq!(doc.summary.missing, 0);
        assert_eq!(doc.summary.changed, 1);
    }

    #[tokio::test]
    async fn test_render_failure_writes_nothing() {
        let (property, entry, exit) = make_inputs();
        let writer = FakeWriter::default();

        let err = assemble_report(
            &FailingRenderer,
            &writer,
            &geometry(),
            &property,
            &entry,
            &exit,
            &SectionConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReportError::Render(_)));
        assert_eq!(writer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_slice_failure_writes_nothing() {
        let (property, entry, exit) = make_inputs();
        let writer = FakeWriter::default();

        let err = assemble_report(
            &LyingRenderer,
            &writer,
            &geometry(),
            &property,
            &entry,
            &exit,
            &SectionConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReportError::Slice(_)));
        assert_eq!(writer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_geometry_is_rejected() {
        let (property, entry, exit) = make_inputs();
        let renderer = FakeRenderer::new(190, 300, vec![]);
        let writer = FakeWriter::default();
        let geometry = PageGeometry {
            width_mm: 20.0,
            height_mm: 297.0,
            margin_mm: 10.0,
        };

        let err = assemble_report(
            &renderer,
            &writer,
            &geometry,
            &property,
            &entry,
            &exit,
            &SectionConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReportError::InvalidSurface(_)));
    }

    #[tokio::test]
    async fn test_reassembly_is_identical() {
        let (property, entry, exit) = make_inputs();
        let renderer = FakeRenderer::new(190, 1500, vec![ProtectedBlock::new(500.0, 620.0)]);
        let writer = FakeWriter::default();
        let config = SectionConfig::default();

        let first = assemble_report(
            &renderer, &writer, &geometry(), &property, &entry, &exit, &config,
        )
        .await
        .unwrap();
        let second = assemble_report(
            &renderer, &writer, &geometry(), &property, &entry, &exit, &config,
        )
        .await
        .unwrap();

        assert_eq!(first.breaks, second.breaks);
        assert_eq!(first.page_count, second.page_count);
        assert_eq!(first.document, second.document);
    }
}
