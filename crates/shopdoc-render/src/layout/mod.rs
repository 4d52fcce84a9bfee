//! Document layout
//!
//! Every routine takes a [`LayoutContext`] and returns the context after the
//! section it drew. Sections run top to bottom and never move back up. Only
//! item tables may break to a new page, through the [`Paginator`].
//!
//! Which routine draws a document is decided by an exhaustive match on the
//! format class and copy type in the `layout_*` entry points below.

mod common;
mod estimate;
mod invoice;
mod jobsheet;
mod table;
mod thermal;

pub use table::{Column, Table};

use crate::canvas::{Canvas, Color, TextStyle};
use crate::constants::{CONTINUATION_HEADER_HEIGHT, WATERMARK_TEXT};
use crate::format::PageGeometry;
use crate::records::{EstimateRecord, InvoiceRecord, JobSheetRecord};
use crate::types::{EstimateCopy, InvoiceCopy, JobSheetCopy, PaperFormat};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::path::PathBuf;

// =============================================================================
// Context
// =============================================================================

/// Drawing cursor threaded through every section routine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutContext {
    pub x: f32,
    /// Top-down distance from the page's top edge
    pub y: f32,
    pub page_index: usize,
}

impl LayoutContext {
    /// Cursor at the top-left margin of the first page
    pub fn start(geometry: &PageGeometry) -> Self {
        Self {
            x: geometry.margin,
            y: geometry.margin,
            page_index: 0,
        }
    }

    pub fn advance(self, dy: f32) -> Self {
        Self {
            y: self.y + dy,
            ..self
        }
    }

    pub fn at(self, y: f32) -> Self {
        Self { y, ..self }
    }
}

/// Per-render inputs that are not part of the record
#[derive(Debug, Clone)]
pub struct LayoutEnv {
    /// Validated logo, already resolved
    pub logo: Option<PathBuf>,
    /// Offset dates are printed in
    pub offset: FixedOffset,
}

impl Default for LayoutEnv {
    fn default() -> Self {
        Self {
            logo: None,
            offset: Utc.fix(),
        }
    }
}

impl LayoutEnv {
    /// `dd/mm/YYYY` in the display offset, `-` when absent
    pub fn date(&self, value: Option<DateTime<Utc>>) -> String {
        value
            .map(|d| d.with_timezone(&self.offset).format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Text sizes for a format, scaled down on compact formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub scale: f32,
}

impl Style {
    pub fn for_geometry(geometry: &PageGeometry) -> Self {
        Self {
            scale: geometry.scale(),
        }
    }

    /// Scale a base (A4) measurement
    pub fn s(&self, value: f32) -> f32 {
        value * self.scale
    }

    pub fn title(&self) -> TextStyle {
        TextStyle::bold(self.s(18.0)).color(Color::ACCENT)
    }

    pub fn company(&self) -> TextStyle {
        TextStyle::bold(self.s(15.0))
    }

    pub fn heading(&self) -> TextStyle {
        TextStyle::bold(self.s(10.0)).color(Color::ACCENT)
    }

    pub fn body(&self) -> TextStyle {
        TextStyle::regular(self.s(9.0))
    }

    pub fn strong(&self) -> TextStyle {
        TextStyle::bold(self.s(9.0))
    }

    pub fn label(&self) -> TextStyle {
        TextStyle::bold(self.s(8.0)).color(Color::DARK_GREY)
    }

    pub fn small(&self) -> TextStyle {
        TextStyle::regular(self.s(7.5)).color(Color::DARK_GREY)
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Whether `needed` points starting at `current_y` would cross the bottom
/// margin
pub fn needs_break(current_y: f32, needed: f32, page_height: f32, margin: f32) -> bool {
    current_y + needed > page_height - margin
}

/// Cursor after making room: the top margin and `true` when a new page is
/// required, otherwise the unchanged cursor and `false`
pub fn ensure_room(current_y: f32, needed: f32, page_height: f32, margin: f32) -> (f32, bool) {
    if needs_break(current_y, needed, page_height, margin) {
        (margin, true)
    } else {
        (current_y, false)
    }
}

/// Starts overflow pages with a continuation header
#[derive(Debug, Clone)]
pub struct Paginator {
    document_number: String,
    style: Style,
}

impl Paginator {
    pub fn new(document_number: &str, style: Style) -> Self {
        Self {
            document_number: document_number.to_string(),
            style,
        }
    }

    pub fn continuation_title(&self) -> String {
        format!("{} - Continued", self.document_number)
    }

    /// Break to a new page when `needed` points do not fit below the cursor.
    /// On a break the continuation header is drawn and, when given, the
    /// table's column header is repeated. Continuous pages never break.
    pub fn ensure_room(
        &self,
        canvas: &mut Canvas,
        ctx: LayoutContext,
        needed: f32,
        table: Option<&Table>,
    ) -> (LayoutContext, bool) {
        let geometry = *canvas.geometry();
        if geometry.is_continuous() {
            return (ctx, false);
        }

        let (y, broke) = ensure_room(ctx.y, needed, geometry.height, geometry.margin);
        if !broke {
            return (ctx, false);
        }

        let page_index = canvas.new_page();
        log::debug!(
            "{}: page {} starts at overflow",
            self.document_number,
            page_index + 1
        );

        let title = self.continuation_title();
        canvas.text(geometry.margin, y, &title, self.style.heading());
        let rule_y = y + self.style.s(CONTINUATION_HEADER_HEIGHT) - self.style.s(6.0);
        canvas.rule(geometry.margin, geometry.width - geometry.margin, rule_y);

        let mut next = LayoutContext {
            x: geometry.margin,
            y: y + self.style.s(CONTINUATION_HEADER_HEIGHT),
            page_index,
        };
        if let Some(table) = table {
            next = table.draw_header(canvas, next);
        }
        (next, true)
    }

    /// Draw table rows, breaking pages between rows as needed
    pub fn rows(
        &self,
        canvas: &mut Canvas,
        mut ctx: LayoutContext,
        table: &Table,
        rows: impl IntoIterator<Item = Vec<String>>,
    ) -> LayoutContext {
        for row in rows {
            let (room, _) = self.ensure_room(canvas, ctx, table.row_height(), Some(table));
            ctx = table.draw_row(canvas, room, &row);
        }
        ctx
    }

    /// Draw a table header, first making room for it plus one row
    pub fn table_start(&self, canvas: &mut Canvas, ctx: LayoutContext, table: &Table) -> LayoutContext {
        let needed = table.header_height() + table.row_height();
        let (room, _) = self.ensure_room(canvas, ctx, needed, None);
        table.draw_header(canvas, room)
    }
}

// =============================================================================
// Dispatch
// =============================================================================

pub fn layout_job_sheet(
    canvas: &mut Canvas,
    record: &JobSheetRecord,
    copy: JobSheetCopy,
    env: &LayoutEnv,
) {
    if record.service.is_repeat_service {
        canvas.set_watermark(WATERMARK_TEXT);
    }

    match (canvas.geometry().format, copy) {
        (PaperFormat::A4 | PaperFormat::A5, JobSheetCopy::Customer) => {
            jobsheet::customer_sheet(canvas, record, env);
        }
        (PaperFormat::A4 | PaperFormat::A5, JobSheetCopy::Office) => {
            jobsheet::office_sheet(canvas, record, env);
        }
        (PaperFormat::A4 | PaperFormat::A5, JobSheetCopy::Both) => {
            jobsheet::combined_sheet(canvas, record, env);
        }
        (PaperFormat::Thermal | PaperFormat::Thermal2, copy) => {
            thermal::job_sheet_receipt(canvas, record, copy, env);
        }
    }
}

pub fn layout_invoice(canvas: &mut Canvas, record: &InvoiceRecord, copy: InvoiceCopy, env: &LayoutEnv) {
    match canvas.geometry().format {
        PaperFormat::A4 | PaperFormat::A5 => invoice::invoice_sheet(canvas, record, copy, env),
        PaperFormat::Thermal | PaperFormat::Thermal2 => {
            thermal::invoice_receipt(canvas, record, copy, env);
        }
    }
}

pub fn layout_estimate(
    canvas: &mut Canvas,
    record: &EstimateRecord,
    copy: EstimateCopy,
    env: &LayoutEnv,
) {
    match (canvas.geometry().format, copy) {
        (PaperFormat::A4 | PaperFormat::A5, EstimateCopy::Standard) => {
            estimate::estimate_sheet(canvas, record, env);
        }
        (PaperFormat::Thermal | PaperFormat::Thermal2, EstimateCopy::Standard) => {
            thermal::estimate_receipt(canvas, record, env);
        }
    }
}

/// Top of a text line box so the text sits vertically centered in a band
pub(crate) fn centered_in_band(band_y: f32, band_height: f32, style: TextStyle) -> f32 {
    band_y + band_height / 2.0 - style.size * 0.43
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typography::Typography;
    use crate::types::DocumentKind;
    use chrono::TimeZone;

    #[test]
    fn test_needs_break_at_bottom_margin() {
        assert!(!needs_break(776.0, 20.0, 841.89, 40.0));
        assert!(needs_break(796.0, 20.0, 841.89, 40.0));
    }

    #[test]
    fn test_ensure_room_resets_to_margin() {
        assert_eq!(ensure_room(796.0, 20.0, 841.89, 40.0), (40.0, true));
        assert_eq!(ensure_room(300.0, 20.0, 841.89, 40.0), (300.0, false));
    }

    #[test]
    fn test_invoice_rows_overflow_at_twenty_fourth_item() {
        // First row at 336, 20pt rows, bottom limit 801.89
        let first_overflow = (0..)
            .find(|i| needs_break(336.0 + 20.0 * *i as f32, 20.0, 841.89, 40.0))
            .map(|i| i + 1);
        assert_eq!(first_overflow, Some(24));
    }

    #[test]
    fn test_paginator_never_breaks_receipts() {
        let geometry = PageGeometry::for_document(PaperFormat::Thermal, DocumentKind::Invoice);
        let mut canvas = Canvas::new(geometry, Typography::standard());
        let paginator = Paginator::new("INV-1", Style::for_geometry(&geometry));
        let ctx = LayoutContext::start(&geometry).at(5000.0);

        let (after, broke) = paginator.ensure_room(&mut canvas, ctx, 20.0, None);
        assert!(!broke);
        assert_eq!(after, ctx);
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn test_paginator_draws_continuation_header() {
        let geometry = PageGeometry::for_document(PaperFormat::A4, DocumentKind::Invoice);
        let mut canvas = Canvas::new(geometry, Typography::standard());
        let style = Style::for_geometry(&geometry);
        let paginator = Paginator::new("INV-7", style);
        let ctx = LayoutContext::start(&geometry).at(796.0);

        let (after, broke) = paginator.ensure_room(&mut canvas, ctx, 20.0, None);
        assert!(broke);
        assert_eq!(after.page_index, 1);
        assert_eq!(after.y, 40.0 + CONTINUATION_HEADER_HEIGHT);
        assert_eq!(canvas.page_texts(1), vec!["INV-7 - Continued"]);
    }

    #[test]
    fn test_dates_print_in_display_offset() {
        let env = LayoutEnv {
            logo: None,
            offset: FixedOffset::east_opt(330 * 60).unwrap(),
        };
        // 20:00 UTC is already the next day at +05:30
        let late = Utc.with_ymd_and_hms(2024, 3, 9, 20, 0, 0).unwrap();
        assert_eq!(env.date(Some(late)), "10/03/2024");
        assert_eq!(env.date(None), "-");
    }

    #[test]
    fn test_watermark_only_for_repeat_service() {
        let geometry = PageGeometry::for_document(PaperFormat::A5, DocumentKind::JobSheet);
        let mut record = JobSheetRecord::default();

        let mut canvas = Canvas::new(geometry, Typography::standard());
        layout_job_sheet(&mut canvas, &record, JobSheetCopy::Customer, &LayoutEnv::default());
        assert!(!canvas.has_watermark());

        record.service.is_repeat_service = true;
        let mut canvas = Canvas::new(geometry, Typography::standard());
        layout_job_sheet(&mut canvas, &record, JobSheetCopy::Both, &LayoutEnv::default());
        assert!(canvas.has_watermark());
    }
}
