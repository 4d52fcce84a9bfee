//! Format catalog
//!
//! Static table mapping a paper format and document kind to physical page
//! geometry. Receipt formats have a fixed width and an open-ended height.

use crate::constants::*;
use crate::types::{DocumentKind, PaperFormat};

/// Page geometry for one render, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub format: PaperFormat,
    pub width: f32,
    /// Fixed height for sheets; the minimum height for receipts
    pub height: f32,
    pub margin: f32,
    pub is_thermal: bool,
}

impl PageGeometry {
    /// Look up the geometry for a format and document kind
    pub fn for_document(format: PaperFormat, kind: DocumentKind) -> Self {
        let (width, height) = match format {
            PaperFormat::A4 => (A4_WIDTH_PT, A4_HEIGHT_PT),
            PaperFormat::A5 => (A5_WIDTH_PT, A5_HEIGHT_PT),
            PaperFormat::Thermal => (THERMAL_WIDTH_PT, THERMAL_MIN_HEIGHT_PT),
            PaperFormat::Thermal2 => (THERMAL_2_WIDTH_PT, THERMAL_MIN_HEIGHT_PT),
        };

        Self {
            format,
            width,
            height,
            margin: default_margin(format, kind),
            is_thermal: format.is_thermal(),
        }
    }

    /// Look up geometry from a raw format key (unknown keys resolve to A4)
    pub fn from_key(key: &str, kind: DocumentKind) -> Self {
        Self::for_document(PaperFormat::from_key(key), kind)
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Lowest y (top-down) that content may reach on a fixed-height page
    pub fn bottom_limit(&self) -> f32 {
        self.height - self.margin
    }

    /// Receipts never break pages; the page grows instead
    pub fn is_continuous(&self) -> bool {
        self.is_thermal
    }

    /// Proportional size factor for compact formats
    pub fn scale(&self) -> f32 {
        match self.format {
            PaperFormat::A4 => 1.0,
            PaperFormat::A5 => A5_SCALE,
            PaperFormat::Thermal => THERMAL_SCALE,
            PaperFormat::Thermal2 => THERMAL_2_SCALE,
        }
    }
}

/// Margins differ slightly per document kind
fn default_margin(format: PaperFormat, kind: DocumentKind) -> f32 {
    match (format, kind) {
        (PaperFormat::A4, DocumentKind::JobSheet) => 30.0,
        (PaperFormat::A4, DocumentKind::Invoice | DocumentKind::Estimate) => 40.0,
        (PaperFormat::A5, DocumentKind::JobSheet) => 20.0,
        (PaperFormat::A5, DocumentKind::Invoice | DocumentKind::Estimate) => 25.0,
        (PaperFormat::Thermal, _) => 10.0,
        (PaperFormat::Thermal2, _) => 8.0,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_invoice_geometry() {
        let page = PageGeometry::for_document(PaperFormat::A4, DocumentKind::Invoice);
        assert_eq!(page.width, A4_WIDTH_PT);
        assert_eq!(page.height, A4_HEIGHT_PT);
        assert_eq!(page.margin, 40.0);
        assert!(!page.is_thermal);
        assert!((page.bottom_limit() - 801.89).abs() < 0.01);
    }

    #[test]
    fn test_margins_differ_by_kind() {
        let sheet = PageGeometry::for_document(PaperFormat::A4, DocumentKind::JobSheet);
        let invoice = PageGeometry::for_document(PaperFormat::A4, DocumentKind::Invoice);
        assert!(sheet.margin < invoice.margin);
    }

    #[test]
    fn test_thermal_widths() {
        let three = PageGeometry::for_document(PaperFormat::Thermal, DocumentKind::Invoice);
        let two = PageGeometry::for_document(PaperFormat::Thermal2, DocumentKind::Invoice);
        assert_eq!(three.width, 216.0);
        assert_eq!(two.width, 144.0);
        assert!(three.is_thermal && two.is_thermal);
        assert!(three.is_continuous());
    }

    #[test]
    fn test_unknown_key_falls_back_to_a4() {
        let page = PageGeometry::from_key("legal", DocumentKind::Estimate);
        assert_eq!(page.format, PaperFormat::A4);
        assert_eq!(page.width, A4_WIDTH_PT);
    }
}
