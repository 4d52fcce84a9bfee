//! Shared constants for document rendering
//!
//! This module centralizes the geometry and magic numbers used by the
//! format catalog, the canvas and the layout routines.

// =============================================================================
// Page Dimensions
// =============================================================================

/// A4 page size in points
pub const A4_WIDTH_PT: f32 = 595.28;
pub const A4_HEIGHT_PT: f32 = 841.89;

/// A5 page size in points
pub const A5_WIDTH_PT: f32 = 419.53;
pub const A5_HEIGHT_PT: f32 = 595.28;

/// 3-inch receipt roll width
pub const THERMAL_WIDTH_PT: f32 = 216.0;

/// 2-inch receipt roll width
pub const THERMAL_2_WIDTH_PT: f32 = 144.0;

/// Receipts grow to fit their content but are never shorter than this
pub const THERMAL_MIN_HEIGHT_PT: f32 = 360.0;

// =============================================================================
// Typography
// =============================================================================

/// Distance from the top of a text line to its baseline, as a fraction of
/// the font size
pub const TEXT_BASELINE_RATIO: f32 = 0.78;

/// Line advance as a fraction of the font size
pub const LINE_HEIGHT_RATIO: f32 = 1.3;

/// Scale factor applied to every size on A5 pages
pub const A5_SCALE: f32 = 0.8;

/// Scale factor applied to every size on 3-inch receipts
pub const THERMAL_SCALE: f32 = 0.75;

/// Scale factor applied to every size on 2-inch receipts
pub const THERMAL_2_SCALE: f32 = 0.62;

/// WinAnsi code point re-mapped to the rupee glyph in embedded fonts
pub const RUPEE_CODE: u8 = 0x80;

// =============================================================================
// Assets
// =============================================================================

/// Largest logo file accepted by the asset resolver
pub const MAX_LOGO_BYTES: u64 = 10 * 1024 * 1024;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];

// =============================================================================
// Watermark
// =============================================================================

pub const WATERMARK_TEXT: &str = "REPEAT SERVICE";

pub const WATERMARK_OPACITY: f32 = 0.12;

pub const WATERMARK_ANGLE_DEG: f32 = 45.0;

/// Watermark font size as a fraction of the page width
pub const WATERMARK_SIZE_RATIO: f32 = 0.11;

// =============================================================================
// Marks
// =============================================================================

/// Line width for the combined-copy cut line (points)
pub const CUT_LINE_WIDTH: f32 = 0.5;

/// Dash pattern for the cut line: 4pt dash, 3pt gap
pub const CUT_LINE_DASH: (f32, f32) = (4.0, 3.0);

/// Size of the scissors symbol (points)
pub const SCISSORS_SIZE: f32 = 8.0;

/// Control point factor for approximating circles with Bezier curves.
/// 4 * (sqrt(2) - 1) / 3
pub const BEZIER_CIRCLE_FACTOR: f32 = 0.552_284_8;

// =============================================================================
// Sheet Layout
// =============================================================================

/// Height of one row in paginated item tables (before compact scaling)
pub const TABLE_ROW_HEIGHT: f32 = 20.0;

/// Height of an item table's column header row
pub const TABLE_HEADER_HEIGHT: f32 = 22.0;

/// Height of the "Continued" header at the top of overflow pages
pub const CONTINUATION_HEADER_HEIGHT: f32 = 24.0;

/// Invoice sheet: company header block
pub const INVOICE_HEADER_HEIGHT: f32 = 90.0;

/// Invoice sheet: identification bar and the gap below it
pub const INVOICE_ID_BAR_HEIGHT: f32 = 28.0;
pub const INVOICE_ID_BAR_GAP: f32 = 10.0;

/// Invoice sheet: bill-to / branch panels and the gap below them
pub const INVOICE_PARTY_HEIGHT: f32 = 100.0;
pub const INVOICE_PARTY_GAP: f32 = 12.0;

/// Invoice sheet: service summary strip and the gap below it
pub const INVOICE_SERVICE_HEIGHT: f32 = 24.0;
pub const INVOICE_SERVICE_GAP: f32 = 10.0;

/// Invoice sheet: totals block (totals, words, status stamp)
pub const INVOICE_TOTALS_HEIGHT: f32 = 190.0;

/// Sheet signature footer (terms strip and signature lines)
pub const SIGNATURE_FOOTER_HEIGHT: f32 = 70.0;

/// Job sheet: rows drawn per item table in each half of a combined copy
pub const COMBINED_COPY_MAX_ROWS: usize = 4;
