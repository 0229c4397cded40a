//! Physical page geometry and the conversion between surface pixels and millimetres.
//!
//! The rendered surface is scaled so its full width maps onto the usable page width.
//! That single ratio converts the usable page height into surface pixels for the
//! break planner, and each pixel slice back into millimetres for placement.

use serde::{Deserialize, Serialize};

/// Physical output page. All lengths in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    /// Applied on all four sides.
    pub margin_mm: f64,
}

impl Default for PageGeometry {
    /// A4 portrait with 10mm margins.
    fn default() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 10.0,
        }
    }
}

impl PageGeometry {
    pub fn usable_width_mm(&self) -> f64 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn usable_height_mm(&self) -> f64 {
        self.height_mm - 2.0 * self.margin_mm
    }

    /// Both usable dimensions are positive and finite.
    pub fn is_valid(&self) -> bool {
        let w = self.usable_width_mm();
        let h = self.usable_height_mm();
        w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0
    }

    /// Scale for a surface `surface_width_px` wide, or `None` when either side is unusable.
    pub fn scale_for(&self, surface_width_px: u32) -> Option<SurfaceScale> {
        if !self.is_valid() || surface_width_px == 0 {
            return None;
        }
        Some(SurfaceScale {
            px_per_mm: surface_width_px as f64 / self.usable_width_mm(),
        })
    }
}

/// Ratio between surface pixels and page millimetres for one rendered surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceScale {
    pub px_per_mm: f64,
}

impl SurfaceScale {
    /// The usable page content height expressed in surface pixels.
    pub fn page_height_px(&self, geometry: &PageGeometry) -> f64 {
        geometry.usable_height_mm() * self.px_per_mm
    }

    pub fn px_to_mm(&self, px: f64) -> f64 {
        px / self.px_per_mm
    }
}
