//! Tax invoice sheet for A4 and A5
//!
//! The blocks above the parts table have fixed heights, so the first part
//! row always starts at the same offset (y = 336 on A4). Parts and payments
//! paginate; the totals block is drawn once, on the last page.

use super::common::*;
use super::{Column, LayoutContext, LayoutEnv, Paginator, Style, Table, centered_in_band};
use crate::canvas::{Canvas, Color};
use crate::constants::*;
use crate::records::{InvoicePart, InvoiceRecord, Payment};
use crate::types::{DocumentKind, InvoiceCopy};

/// Sheet invoices always show the intra-state split at these rates
const SHEET_CGST_PERCENT: f64 = 9.0;
const SHEET_SGST_PERCENT: f64 = 9.0;

const PART_COLUMNS: [Column; 6] = [
    Column::center("#", 0.5),
    Column::left("Description", 4.5),
    Column::left("HSN/SAC", 1.5),
    Column::right("Qty", 1.0),
    Column::right("Rate", 1.8),
    Column::right("Amount", 2.0),
];

const PAYMENT_COLUMNS: [Column; 4] = [
    Column::left("Date", 1.5),
    Column::left("Method", 1.5),
    Column::left("Reference", 2.5),
    Column::right("Amount", 1.5),
];

pub(super) fn invoice_sheet(
    canvas: &mut Canvas,
    record: &InvoiceRecord,
    copy: InvoiceCopy,
    env: &LayoutEnv,
) {
    let geometry = *canvas.geometry();
    let style = Style::for_geometry(&geometry);
    let paginator = Paginator::new(&record.invoice_number, style);
    let width = geometry.content_width();

    let mut ctx = LayoutContext::start(&geometry);
    ctx = company_header(
        canvas,
        ctx,
        &style,
        env,
        &HeaderContent {
            company: &record.company,
            branch: &record.branch,
            title: DocumentKind::Invoice.title(),
            subtitle: None,
            show_logo: true,
            show_contact: true,
            height: Some(style.s(INVOICE_HEADER_HEIGHT)),
        },
    );

    let mut fields = vec![
        ("Invoice No", record.invoice_number.clone()),
        ("Date", env.date(record.invoice_date)),
    ];
    if let Some(ticket) = record.service.ticket_number.as_deref().filter(|t| !t.is_empty()) {
        fields.push(("Ticket", ticket.to_string()));
    }
    ctx = id_bar(
        canvas,
        ctx,
        &style,
        &fields,
        Some(copy.banner()),
        style.s(INVOICE_ID_BAR_HEIGHT),
    )
    .advance(style.s(INVOICE_ID_BAR_GAP));

    ctx = panels(
        canvas,
        ctx,
        &style,
        &[
            Panel::customer("Bill To", &record.customer),
            Panel::branch("Service Centre", &record.branch),
        ],
        Some(style.s(INVOICE_PARTY_HEIGHT)),
    )
    .advance(style.s(INVOICE_PARTY_GAP));

    ctx = service_strip(canvas, ctx, &style, record).advance(style.s(INVOICE_SERVICE_GAP));

    // Item sections
    let table = Table::new(ctx.x, width, &PART_COLUMNS, &style);
    ctx = table.draw_header(canvas, ctx);
    if record.parts.is_empty() && record.service.labour_cost <= 0.0 {
        ctx = table.draw_note_row(canvas, ctx, "No billable items");
    }
    let mut rows: Vec<Vec<String>> = record
        .parts
        .iter()
        .enumerate()
        .map(|(i, part)| part_row(i, part))
        .collect();
    if record.service.labour_cost > 0.0 {
        rows.push(vec![
            (rows.len() + 1).to_string(),
            "Service / labour charges".to_string(),
            "-".to_string(),
            "1".to_string(),
            money(record.service.labour_cost),
            money(record.service.labour_cost),
        ]);
    }
    ctx = paginator.rows(canvas, ctx, &table, rows).advance(style.s(10.0));

    if !record.payments.is_empty() {
        let payments = Table::new(ctx.x, width, &PAYMENT_COLUMNS, &style);
        let rows = record.payments.iter().map(|p| payment_row(p, env)).collect();
        ctx = titled_table(canvas, ctx, &style, &paginator, "Payment History", &payments, rows);
    }

    let notes = record.notes.as_deref().filter(|n| !n.trim().is_empty());
    let mut reserve = style.s(INVOICE_TOTALS_HEIGHT + SIGNATURE_FOOTER_HEIGHT);
    if let Some(notes) = notes {
        reserve += text_section_height(canvas, &style, notes);
    }
    let (room, _) = paginator.ensure_room(canvas, ctx, reserve, None);

    ctx = totals_block(canvas, room, &style, record);
    if let Some(notes) = notes {
        ctx = text_section(canvas, ctx, &style, "Notes", notes);
    }

    let signatory = format!("For {}", record.company.name);
    let signatory = if record.company.name.trim().is_empty() {
        "Authorised Signatory"
    } else {
        signatory.as_str()
    };
    signatures(canvas, ctx, &style, &["Customer Signature", signatory]);
}

/// Ticket, device and issue on one outlined band
fn service_strip(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    record: &InvoiceRecord,
) -> LayoutContext {
    let width = canvas.geometry().content_width();
    let height = style.s(INVOICE_SERVICE_HEIGHT);
    canvas.rect(ctx.x, ctx.y, width, height, None, Some(Color::RULE));

    let service = &record.service;
    let mut parts = Vec::new();
    if let Some(device) = service.device_model.as_deref().filter(|d| !d.is_empty()) {
        parts.push(format!("Device: {device}"));
    }
    if let Some(issue) = service.issue.as_deref().filter(|i| !i.is_empty()) {
        parts.push(format!("Issue: {issue}"));
    }
    if parts.is_empty() {
        parts.push("Repair service".to_string());
    }

    let text = style.body();
    let padding = style.s(6.0);
    canvas.text_fitted(
        ctx.x + padding,
        centered_in_band(ctx.y, height, text),
        width - 2.0 * padding,
        &parts.join("   |   "),
        text,
    );
    ctx.advance(height)
}

/// Payment-status stamp and amount in words on the left, totals on the right
fn totals_block(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    record: &InvoiceRecord,
) -> LayoutContext {
    let geometry = *canvas.geometry();
    let column = geometry.content_width() * 0.45;
    let left_width = geometry.content_width() - column - style.s(16.0);

    let right_column = LayoutContext {
        x: geometry.width - geometry.margin - column,
        ..ctx
    };
    let after_totals = totals(canvas, right_column, style, column, &sheet_totals(record));

    status_stamp(canvas, ctx.x, ctx.y, style, record.payment_status);
    let words = amount_in_words(
        canvas,
        ctx.advance(style.s(40.0)),
        style,
        left_width,
        record.total_amount,
    );

    ctx.at(after_totals.y.max(words.y) + style.s(12.0))
}

/// Totals as printed on sheets. Tax shows a fixed CGST/SGST split of the
/// taxable amount, independent of the record's own rates.
fn sheet_totals(record: &InvoiceRecord) -> Vec<TotalLine> {
    let taxable = record.taxable_amount();
    let cgst = taxable * SHEET_CGST_PERCENT / 100.0;
    let sgst = taxable * SHEET_SGST_PERCENT / 100.0;

    let mut lines = vec![TotalLine::new("Subtotal", money(record.subtotal))];
    if record.discount > 0.0 {
        lines.push(TotalLine::new("Discount", money(-record.discount)));
    }
    lines.push(TotalLine::new("Taxable Amount", money(taxable)));
    lines.push(TotalLine::new(format!("CGST @ {SHEET_CGST_PERCENT:.0}%"), money(cgst)));
    lines.push(TotalLine::new(format!("SGST @ {SHEET_SGST_PERCENT:.0}%"), money(sgst)));
    lines.push(TotalLine::emphasized("Grand Total", money(record.total_amount)));
    lines.push(TotalLine::new("Amount Paid", money(record.paid_amount)));
    lines.push(TotalLine::new("Balance Due", money(record.balance_amount)));
    lines
}

fn part_row(index: usize, part: &InvoicePart) -> Vec<String> {
    vec![
        (index + 1).to_string(),
        part.name.clone(),
        part.hsn_code.clone().unwrap_or_else(|| "-".to_string()),
        quantity(part.quantity),
        money(part.unit_price),
        money(part.amount),
    ]
}

fn payment_row(payment: &Payment, env: &LayoutEnv) -> Vec<String> {
    vec![
        env.date(payment.date),
        payment.method.clone(),
        payment.reference.clone().unwrap_or_else(|| "-".to_string()),
        money(payment.amount),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_geometry_places_first_row() {
        let first_row = 40.0
            + INVOICE_HEADER_HEIGHT
            + INVOICE_ID_BAR_HEIGHT
            + INVOICE_ID_BAR_GAP
            + INVOICE_PARTY_HEIGHT
            + INVOICE_PARTY_GAP
            + INVOICE_SERVICE_HEIGHT
            + INVOICE_SERVICE_GAP
            + TABLE_HEADER_HEIGHT;
        assert_eq!(first_row, 336.0);
    }

    #[test]
    fn test_sheet_totals_use_fixed_split() {
        let record = InvoiceRecord {
            subtotal: 1000.0,
            discount: 100.0,
            cgst_rate: 14.0,
            sgst_rate: 14.0,
            total_amount: 1062.0,
            ..Default::default()
        };
        let lines = sheet_totals(&record);
        let cgst = lines.iter().find(|l| l.label == "CGST @ 9%").unwrap();
        assert_eq!(cgst.value, "\u{20B9}81.00");
        let grand: Vec<_> = lines.iter().filter(|l| l.emphasis).collect();
        assert_eq!(grand.len(), 1);
        assert_eq!(grand[0].value, "\u{20B9}1,062.00");
    }
}
