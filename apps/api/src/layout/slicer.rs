//! Surface slicing — cuts the rendered PNG surface at planned break offsets.
//!
//! CPU-bound (PNG decode + re-encode per page); callers run it inside
//! `tokio::task::spawn_blocking`.

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use thiserror::Error;

use crate::layout::geometry::{PageGeometry, SurfaceScale};

#[derive(Debug, Error)]
pub enum SliceError {
    #[error("surface could not be decoded: {0}")]
    Decode(#[source] image::ImageError),

    #[error("surface is {actual_width}x{actual_height}px but was declared as {declared_width}x{declared_height}px")]
    DimensionMismatch {
        declared_width: u32,
        declared_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("page {page} could not be encoded: {source}")]
    Encode {
        page: usize,
        #[source]
        source: image::ImageError,
    },
}

/// One printable page: a PNG band of the surface and where it sits on the page.
#[derive(Debug, Clone, Serialize)]
pub struct PageImage {
    #[serde(skip)]
    pub png: Bytes,
    pub width_px: u32,
    pub height_px: u32,
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// Decodes `png` and crops one page per consecutive pair of `breaks`.
///
/// Breaks are rounded to whole pixel rows; bands that round to zero height are skipped.
pub fn slice_surface(
    png: &[u8],
    declared_width: u32,
    declared_height: u32,
    breaks: &[f64],
    scale: SurfaceScale,
    geometry: &PageGeometry,
) -> Result<Vec<PageImage>, SliceError> {
    let surface = image::load_from_memory_with_format(png, ImageFormat::Png)
        .map_err(SliceError::Decode)?;

    if surface.width() != declared_width || surface.height() != declared_height {
        return Err(SliceError::DimensionMismatch {
            declared_width,
            declared_height,
            actual_width: surface.width(),
            actual_height: surface.height(),
        });
    }

    let rows = pixel_rows(breaks, surface.height());
    let mut pages = Vec::with_capacity(rows.len());

    for (page, (y0, y1)) in rows.into_iter().enumerate() {
        let band = surface.crop_imm(0, y0, surface.width(), y1 - y0);
        let png = encode_png(&band).map_err(|source| SliceError::Encode { page, source })?;

        pages.push(PageImage {
            png,
            width_px: band.width(),
            height_px: band.height(),
            x_mm: geometry.margin_mm,
            y_mm: geometry.margin_mm,
            width_mm: geometry.usable_width_mm(),
            height_mm: scale.px_to_mm(band.height() as f64),
        });
    }

    Ok(pages)
}

/// Converts break offsets into `[y0, y1)` pixel row ranges within `height`.
pub(crate) fn pixel_rows(breaks: &[f64], height: u32) -> Vec<(u32, u32)> {
    let to_row = |offset: f64| (offset.round().max(0.0) as u32).min(height);

    breaks
        .windows(2)
        .map(|pair| (to_row(pair[0]), to_row(pair[1])))
        .filter(|(y0, y1)| y1 > y0)
        .collect()
}

fn encode_png(image: &DynamicImage) -> Result<Bytes, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(Bytes::from(buf.into_inner()))
}
