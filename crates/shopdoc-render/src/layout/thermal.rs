//! Receipt layouts for 3-inch and 2-inch thermal rolls
//!
//! A single continuous column. The page never breaks; it grows to fit.

use super::common::{HeaderContent, contact_lines, money, quantity};
use super::estimate::{estimate_totals, valid_until};
use super::{LayoutContext, LayoutEnv, Style};
use crate::canvas::{Canvas, Color, TextStyle};
use crate::money::number_to_words;
use crate::records::{Branch, Company, EstimateRecord, InvoiceRecord, JobSheetRecord};
use crate::types::{DocumentKind, InvoiceCopy, JobSheetCopy};

/// Receipt text sizes, larger than the sheet sizes before scaling
#[derive(Debug, Clone, Copy)]
struct ReceiptStyle {
    style: Style,
    width: f32,
}

impl ReceiptStyle {
    fn new(canvas: &Canvas) -> Self {
        let geometry = canvas.geometry();
        Self {
            style: Style::for_geometry(geometry),
            width: geometry.content_width(),
        }
    }

    fn title(&self) -> TextStyle {
        TextStyle::bold(self.style.s(13.0))
    }

    fn company(&self) -> TextStyle {
        TextStyle::bold(self.style.s(12.0))
    }

    fn body(&self) -> TextStyle {
        TextStyle::regular(self.style.s(10.0))
    }

    fn strong(&self) -> TextStyle {
        TextStyle::bold(self.style.s(10.0))
    }

    fn small(&self) -> TextStyle {
        TextStyle::regular(self.style.s(8.5)).color(Color::DARK_GREY)
    }

    fn gap(&self) -> f32 {
        self.style.s(5.0)
    }
}

// =============================================================================
// Receipt Primitives
// =============================================================================

/// Wrapped, centered lines
fn centered(canvas: &mut Canvas, ctx: LayoutContext, r: &ReceiptStyle, text: &str, style: TextStyle) -> LayoutContext {
    let middle = ctx.x + r.width / 2.0;
    let mut ctx = ctx;
    for line in canvas.wrap(text, style, r.width) {
        canvas.text(middle, ctx.y, &line, style.centered());
        ctx = ctx.advance(style.line_height());
    }
    ctx
}

/// Wrapped, left-aligned lines
fn left(canvas: &mut Canvas, ctx: LayoutContext, r: &ReceiptStyle, text: &str, style: TextStyle) -> LayoutContext {
    let end = canvas.paragraph(ctx.x, ctx.y, r.width, text, style);
    ctx.at(end)
}

/// Label on the left, value on the right of the same line
fn pair(canvas: &mut Canvas, ctx: LayoutContext, r: &ReceiptStyle, label: &str, value: &str, style: TextStyle) -> LayoutContext {
    let value_width = canvas.text_width(value, style).min(r.width * 0.6);
    canvas.text_fitted(ctx.x, ctx.y, r.width - value_width - r.style.s(4.0), label, style);
    canvas.text_fitted(ctx.x + r.width - value_width, ctx.y, value_width, value, style);
    ctx.advance(style.line_height())
}

fn separator(canvas: &mut Canvas, ctx: LayoutContext, r: &ReceiptStyle) -> LayoutContext {
    let y = ctx.y + r.gap() / 2.0;
    canvas.line((ctx.x, y), (ctx.x + r.width, y), 0.5, Color::DARK_GREY);
    ctx.advance(r.gap())
}

/// Centered logo, company and contact lines, then the document title
fn header(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    r: &ReceiptStyle,
    env: &LayoutEnv,
    content: &HeaderContent<'_>,
) -> LayoutContext {
    let mut ctx = ctx;
    if content.show_logo {
        if let Some(path) = env.logo.as_deref() {
            let (max_width, max_height) = (r.width * 0.5, r.style.s(48.0));
            if let Some((width, _)) = canvas.image_size(path, max_width, max_height) {
                let x = ctx.x + (r.width - width) / 2.0;
                if let Some((_, height)) = canvas.image(path, x, ctx.y, max_width, max_height) {
                    ctx = ctx.advance(height + r.gap());
                }
            }
        }
    }

    ctx = centered(canvas, ctx, r, &content.company.name, r.company());
    if content.show_contact {
        for line in contact_lines(content.company, content.branch) {
            ctx = centered(canvas, ctx, r, &line, r.small());
        }
    }
    ctx = separator(canvas, ctx, r);

    ctx = centered(canvas, ctx, r, content.title, r.title());
    if let Some(subtitle) = content.subtitle {
        ctx = centered(canvas, ctx, r, subtitle, r.small());
    }
    separator(canvas, ctx, r)
}

fn receipt_header<'a>(
    company: &'a Company,
    branch: &'a Branch,
    kind: DocumentKind,
    subtitle: &'a str,
) -> HeaderContent<'a> {
    HeaderContent {
        company,
        branch,
        title: kind.title(),
        subtitle: Some(subtitle),
        show_logo: true,
        show_contact: true,
        height: None,
    }
}

/// Item name on its own line, then `qty x rate` and the amount
fn item(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    r: &ReceiptStyle,
    name: &str,
    qty: f64,
    rate: f64,
    amount: f64,
) -> LayoutContext {
    let ctx = left(canvas, ctx, r, name, r.body());
    let detail = format!("  {} x {}", quantity(qty), money(rate));
    pair(canvas, ctx, r, &detail, &money(amount), r.small())
}

fn signature_line(canvas: &mut Canvas, ctx: LayoutContext, r: &ReceiptStyle, label: &str) -> LayoutContext {
    let line_y = ctx.y + r.style.s(22.0);
    canvas.line((ctx.x, line_y), (ctx.x + r.width * 0.7, line_y), 0.5, Color::DARK_GREY);
    canvas.text(ctx.x, line_y + r.style.s(2.0), label, r.small());
    ctx.at(line_y + r.style.s(2.0) + r.small().line_height())
}

// =============================================================================
// Job Sheet
// =============================================================================

pub(super) fn job_sheet_receipt(canvas: &mut Canvas, record: &JobSheetRecord, copy: JobSheetCopy, env: &LayoutEnv) {
    let r = ReceiptStyle::new(canvas);
    let start = LayoutContext::start(canvas.geometry());

    match copy {
        JobSheetCopy::Customer => {
            job_copy(canvas, start, &r, record, env, false);
        }
        JobSheetCopy::Office => {
            job_copy(canvas, start, &r, record, env, true);
        }
        JobSheetCopy::Both => {
            let ctx = job_copy(canvas, start, &r, record, env, false);
            let cut_y = ctx.y + r.style.s(10.0);
            canvas.cut_line(cut_y);
            job_copy(canvas, ctx.at(cut_y + r.style.s(12.0)), &r, record, env, true);
        }
    }
}

fn job_copy(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    r: &ReceiptStyle,
    record: &JobSheetRecord,
    env: &LayoutEnv,
    office: bool,
) -> LayoutContext {
    let template = &record.template;
    let service = &record.service;

    let subtitle = if office { "OFFICE COPY" } else { "CUSTOMER COPY" };
    let content = HeaderContent {
        show_logo: template.show_logo && !office,
        show_contact: template.show_contact && !office,
        ..receipt_header(&record.company, &record.branch, DocumentKind::JobSheet, subtitle)
    };
    let mut ctx = header(canvas, ctx, r, env, &content);

    ctx = pair(canvas, ctx, r, "Job Sheet", &record.job_sheet_number, r.strong());
    ctx = pair(canvas, ctx, r, "Ticket", record.ticket_number(), r.body());
    ctx = pair(canvas, ctx, r, "Date", &env.date(service.created_at), r.body());
    if service.expected_delivery.is_some() {
        ctx = pair(canvas, ctx, r, "Expected", &env.date(service.expected_delivery), r.body());
    }
    if service.is_warranty {
        ctx = centered(canvas, ctx, r, "** WARRANTY REPAIR **", r.strong());
    }
    ctx = separator(canvas, ctx, r);

    ctx = left(canvas, ctx, r, &record.customer.name, r.strong());
    if let Some(phone) = &record.customer.phone {
        ctx = left(canvas, ctx, r, phone, r.body());
    }
    ctx = left(canvas, ctx, r, &format!("Device: {}", service.device_model), r.body());
    if let Some(imei) = &service.device_imei {
        ctx = left(canvas, ctx, r, &format!("IMEI: {imei}"), r.body());
    }
    if office {
        if let Some(password) = &service.device_password {
            ctx = left(canvas, ctx, r, &format!("Password: {password}"), r.body());
        }
        if let Some(pattern) = &service.device_pattern {
            ctx = left(canvas, ctx, r, &format!("Pattern: {pattern}"), r.body());
        }
        if let Some(technician) = &record.technician {
            ctx = left(canvas, ctx, r, &format!("Technician: {}", technician.name), r.body());
        }
    }
    ctx = left(canvas, ctx, r, &format!("Issue: {}", service.issue), r.body());
    if !record.accessories.is_empty() {
        ctx = left(canvas, ctx, r, &format!("Accessories: {}", record.accessories.join(", ")), r.small());
    }
    if !record.damage_conditions.is_empty() {
        ctx = left(canvas, ctx, r, &format!("Condition: {}", record.damage_conditions.join(", ")), r.small());
    }

    if !record.tagged_parts.is_empty() {
        ctx = separator(canvas, ctx, r);
        for part in &record.tagged_parts {
            ctx = item(canvas, ctx, r, &part.name, part.quantity, part.unit_price, part.amount);
        }
    }
    if !record.extra_spare_parts.is_empty() {
        ctx = separator(canvas, ctx, r);
        for part in &record.extra_spare_parts {
            let name = format!("{} ({})", part.name, part.approval_state.label());
            ctx = item(canvas, ctx, r, &name, part.quantity, part.unit_price, part.amount);
        }
    }

    ctx = separator(canvas, ctx, r);
    ctx = pair(canvas, ctx, r, "Estimated", &money(service.estimated_cost), r.body());
    if service.discount > 0.0 {
        ctx = pair(canvas, ctx, r, "Discount", &money(-service.discount), r.body());
    }
    ctx = pair(canvas, ctx, r, "Advance", &money(service.advance_payment), r.body());
    ctx = pair(canvas, ctx, r, "Balance Due", &money(record.balance_due()), r.strong());

    if !office {
        if let Some(terms) = template.terms.as_deref().filter(|t| !t.trim().is_empty()) {
            ctx = separator(canvas, ctx, r);
            ctx = left(canvas, ctx, r, terms, r.small());
        }
    }
    if office || template.show_signatures {
        ctx = signature_line(canvas, ctx, r, if office { "Technician" } else { "Customer Signature" });
    }

    let footer = template
        .footer_text
        .as_deref()
        .filter(|t| !t.trim().is_empty() && !office)
        .unwrap_or("Thank you!");
    centered(canvas, ctx.advance(r.gap()), r, footer, r.small())
}

// =============================================================================
// Invoice
// =============================================================================

pub(super) fn invoice_receipt(canvas: &mut Canvas, record: &InvoiceRecord, copy: InvoiceCopy, env: &LayoutEnv) {
    let r = ReceiptStyle::new(canvas);
    let mut ctx = LayoutContext::start(canvas.geometry());

    let content = receipt_header(&record.company, &record.branch, DocumentKind::Invoice, copy.banner());
    ctx = header(canvas, ctx, &r, env, &content);

    ctx = pair(canvas, ctx, &r, "Invoice", &record.invoice_number, r.strong());
    ctx = pair(canvas, ctx, &r, "Date", &env.date(record.invoice_date), r.body());
    if let Some(ticket) = &record.service.ticket_number {
        ctx = pair(canvas, ctx, &r, "Ticket", ticket, r.body());
    }
    ctx = left(canvas, ctx, &r, &record.customer.name, r.strong());
    if let Some(phone) = &record.customer.phone {
        ctx = left(canvas, ctx, &r, phone, r.body());
    }
    ctx = separator(canvas, ctx, &r);

    for part in &record.parts {
        ctx = item(canvas, ctx, &r, &part.name, part.quantity, part.unit_price, part.amount);
    }
    if record.service.labour_cost > 0.0 {
        let labour = record.service.labour_cost;
        ctx = item(canvas, ctx, &r, "Service / labour charges", 1.0, labour, labour);
    }
    ctx = separator(canvas, ctx, &r);

    // Receipts print the record's own tax rates
    let taxable = record.taxable_amount();
    ctx = pair(canvas, ctx, &r, "Subtotal", &money(record.subtotal), r.body());
    if record.discount > 0.0 {
        ctx = pair(canvas, ctx, &r, "Discount", &money(-record.discount), r.body());
    }
    let taxes = [("CGST", record.cgst_rate), ("SGST", record.sgst_rate)];
    for (name, rate) in taxes {
        if rate > 0.0 {
            let label = format!("{name} @ {}%", quantity(rate));
            ctx = pair(canvas, ctx, &r, &label, &money(taxable * rate / 100.0), r.body());
        }
    }
    ctx = pair(canvas, ctx, &r, "Grand Total", &money(record.total_amount), r.strong());
    ctx = pair(canvas, ctx, &r, "Paid", &money(record.paid_amount), r.body());
    ctx = pair(canvas, ctx, &r, "Balance", &money(record.balance_amount), r.body());
    ctx = centered(canvas, ctx.advance(r.gap()), &r, record.payment_status.label(), r.strong());
    ctx = left(canvas, ctx, &r, &number_to_words(record.total_amount), r.small());

    if let Some(notes) = record.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        ctx = separator(canvas, ctx, &r);
        ctx = left(canvas, ctx, &r, notes, r.small());
    }
    centered(canvas, ctx.advance(r.gap()), &r, "Thank you for your business", r.small());
}

// =============================================================================
// Estimate
// =============================================================================

pub(super) fn estimate_receipt(canvas: &mut Canvas, record: &EstimateRecord, env: &LayoutEnv) {
    let r = ReceiptStyle::new(canvas);
    let mut ctx = LayoutContext::start(canvas.geometry());

    let content = receipt_header(&record.company, &record.branch, DocumentKind::Estimate, "NOT A TAX INVOICE");
    ctx = header(canvas, ctx, &r, env, &content);

    ctx = pair(canvas, ctx, &r, "Estimate", &record.estimate_number, r.strong());
    ctx = pair(canvas, ctx, &r, "Date", &env.date(record.estimate_date), r.body());
    ctx = pair(canvas, ctx, &r, "Valid Until", &env.date(valid_until(record)), r.body());
    ctx = left(canvas, ctx, &r, &record.customer.name, r.strong());
    if let Some(service) = &record.service {
        ctx = left(canvas, ctx, &r, &format!("Ticket: {}", service.ticket_number), r.body());
    }
    ctx = separator(canvas, ctx, &r);

    for entry in &record.items {
        ctx = item(canvas, ctx, &r, &entry.description, entry.quantity, entry.unit_price, entry.amount);
    }
    ctx = separator(canvas, ctx, &r);

    for line in estimate_totals(record) {
        let style = if line.emphasis { r.strong() } else { r.body() };
        ctx = pair(canvas, ctx, &r, &line.label, &line.value, style);
    }
    ctx = left(canvas, ctx.advance(r.gap()), &r, &number_to_words(record.total_amount), r.small());

    if let Some(notes) = record.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        ctx = separator(canvas, ctx, &r);
        ctx = left(canvas, ctx, &r, notes, r.small());
    }
    centered(canvas, ctx.advance(r.gap()), &r, "Prices valid until the date above", r.small());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PageGeometry;
    use crate::records::InvoicePart;
    use crate::typography::Typography;
    use crate::types::PaperFormat;

    fn receipt(format: PaperFormat, kind: DocumentKind) -> Canvas {
        Canvas::new(PageGeometry::for_document(format, kind), Typography::standard())
    }

    #[test]
    fn test_invoice_receipt_uses_record_rates() {
        let record = InvoiceRecord {
            invoice_number: "INV-3".into(),
            subtotal: 1000.0,
            cgst_rate: 14.0,
            sgst_rate: 14.0,
            total_amount: 1280.0,
            parts: vec![InvoicePart {
                name: "Battery".into(),
                quantity: 1.0,
                unit_price: 1000.0,
                amount: 1000.0,
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut canvas = receipt(PaperFormat::Thermal, DocumentKind::Invoice);
        invoice_receipt(&mut canvas, &record, InvoiceCopy::Original, &LayoutEnv::default());

        let texts = canvas.page_texts(0);
        assert!(texts.contains(&"CGST @ 14%"));
        assert!(!texts.iter().any(|t| t.contains("9%")));
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn test_both_copies_on_one_receipt() {
        let mut record = JobSheetRecord {
            job_sheet_number: "JS-1".into(),
            ..Default::default()
        };
        record.service.device_password = Some("0000".into());
        let mut canvas = receipt(PaperFormat::Thermal2, DocumentKind::JobSheet);
        job_sheet_receipt(&mut canvas, &record, JobSheetCopy::Both, &LayoutEnv::default());

        let texts = canvas.page_texts(0);
        assert!(texts.contains(&"CUSTOMER COPY"));
        assert!(texts.contains(&"OFFICE COPY"));
        assert_eq!(texts.iter().filter(|t| t.contains("0000")).count(), 1);
        assert!(canvas.pages()[0].iter().any(|op| matches!(op, crate::canvas::DrawOp::CutLine { .. })));
    }

    #[test]
    fn test_long_receipt_grows_page() {
        let record = EstimateRecord {
            estimate_number: "EST-1".into(),
            items: (0..60)
                .map(|i| crate::records::LineItem {
                    description: format!("Item {i}"),
                    quantity: 1.0,
                    unit_price: 10.0,
                    amount: 10.0,
                })
                .collect(),
            ..Default::default()
        };
        let mut canvas = receipt(PaperFormat::Thermal, DocumentKind::Estimate);
        estimate_receipt(&mut canvas, &record, &LayoutEnv::default());
        assert_eq!(canvas.page_count(), 1);
        assert!(canvas.page_height() > crate::constants::THERMAL_MIN_HEIGHT_PT);
    }
}
