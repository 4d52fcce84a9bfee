//! Estimate sheet for A4 and A5

use super::common::*;
use super::{Column, LayoutContext, LayoutEnv, Paginator, Style, Table};
use crate::canvas::Canvas;
use crate::constants::SIGNATURE_FOOTER_HEIGHT;
use crate::records::{EstimateRecord, LineItem};
use crate::types::DocumentKind;
use chrono::{DateTime, Duration, Utc};

const ITEM_COLUMNS: [Column; 5] = [
    Column::center("#", 0.5),
    Column::left("Description", 5.0),
    Column::right("Qty", 1.0),
    Column::right("Rate", 1.8),
    Column::right("Amount", 2.0),
];

pub(super) fn estimate_sheet(canvas: &mut Canvas, record: &EstimateRecord, env: &LayoutEnv) {
    let geometry = *canvas.geometry();
    let style = Style::for_geometry(&geometry);
    let paginator = Paginator::new(&record.estimate_number, style);
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
            title: DocumentKind::Estimate.title(),
            subtitle: None,
            show_logo: true,
            show_contact: true,
            height: None,
        },
    );

    ctx = id_bar(
        canvas,
        ctx,
        &style,
        &[
            ("Estimate No", record.estimate_number.clone()),
            ("Date", env.date(record.estimate_date)),
            ("Valid Until", env.date(valid_until(record))),
        ],
        None,
        style.s(26.0),
    )
    .advance(style.s(8.0));

    let mut service = Panel::branch("Service Centre", &record.branch);
    if let Some(reference) = &record.service {
        service = service.line("Ticket", reference.ticket_number.clone());
        if let Some(device) = &reference.device_model {
            service = service.line("Device", device.clone());
        }
    }
    ctx = panels(
        canvas,
        ctx,
        &style,
        &[Panel::customer("Estimate For", &record.customer), service],
        None,
    )
    .advance(style.s(12.0));

    let table = Table::new(ctx.x, width, &ITEM_COLUMNS, &style);
    let rows: Vec<Vec<String>> = record
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| item_row(i, item))
        .collect();
    if rows.is_empty() {
        ctx = table.draw_header(canvas, ctx);
        ctx = table.draw_note_row(canvas, ctx, "No items").advance(style.s(10.0));
    } else {
        ctx = titled_table(canvas, ctx, &style, &paginator, "Estimated Work", &table, rows);
    }

    let lines = estimate_totals(record);
    let notes = record.notes.as_deref().filter(|n| !n.trim().is_empty());
    let words_height = style.s(40.0);
    let mut reserve = totals_height(&style, &lines) + words_height + style.s(SIGNATURE_FOOTER_HEIGHT);
    if let Some(notes) = notes {
        reserve += text_section_height(canvas, &style, notes);
    }
    let (room, _) = paginator.ensure_room(canvas, ctx, reserve, None);

    let column = width * 0.45;
    let right_column = LayoutContext {
        x: geometry.width - geometry.margin - column,
        ..room
    };
    let after_totals = totals(canvas, right_column, &style, column, &lines);
    let words = amount_in_words(canvas, room, &style, width - column - style.s(16.0), record.total_amount);
    ctx = room.at(after_totals.y.max(words.y) + style.s(12.0));

    if let Some(notes) = notes {
        ctx = text_section(canvas, ctx, &style, "Notes", notes);
    }

    signatures(canvas, ctx, &style, &["Customer Acceptance", "Authorised Signatory"]);
}

/// Explicit expiry, or the estimate date plus the validity window. A window
/// that runs past the representable calendar gives no expiry.
pub(super) fn valid_until(record: &EstimateRecord) -> Option<DateTime<Utc>> {
    record.valid_until.or_else(|| {
        let days = Duration::try_days(i64::from(record.validity_days?))?;
        record.estimate_date?.checked_add_signed(days)
    })
}

/// Recorded tax is shown as equal CGST and SGST halves
pub(super) fn estimate_totals(record: &EstimateRecord) -> Vec<TotalLine> {
    let mut lines = vec![TotalLine::new("Subtotal", money(record.subtotal))];
    if record.tax_amount > 0.0 {
        let half = record.tax_amount / 2.0;
        lines.push(TotalLine::new("CGST", money(half)));
        lines.push(TotalLine::new("SGST", money(record.tax_amount - half)));
    }
    lines.push(TotalLine::emphasized("Estimated Total", money(record.total_amount)));
    lines
}

fn item_row(index: usize, item: &LineItem) -> Vec<String> {
    vec![
        (index + 1).to_string(),
        item.description.clone(),
        quantity(item.quantity),
        money(item.unit_price),
        money(item.amount),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_valid_until_from_validity_days() {
        let record = EstimateRecord {
            estimate_date: Some(Utc.with_ymd_and_hms(2024, 1, 30, 6, 0, 0).unwrap()),
            validity_days: Some(7),
            ..Default::default()
        };
        assert_eq!(
            valid_until(&record),
            Some(Utc.with_ymd_and_hms(2024, 2, 6, 6, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_explicit_expiry_wins() {
        let explicit = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let record = EstimateRecord {
            estimate_date: Some(Utc.with_ymd_and_hms(2024, 1, 30, 6, 0, 0).unwrap()),
            validity_days: Some(7),
            valid_until: Some(explicit),
            ..Default::default()
        };
        assert_eq!(valid_until(&record), Some(explicit));
    }

    #[test]
    fn test_tax_line_only_when_taxed() {
        let record = EstimateRecord {
            subtotal: 500.0,
            total_amount: 500.0,
            ..Default::default()
        };
        assert_eq!(estimate_totals(&record).len(), 2);
    }

    #[test]
    fn test_tax_split_into_cgst_and_sgst() {
        let record = EstimateRecord {
            subtotal: 1000.0,
            tax_amount: 180.0,
            total_amount: 1180.0,
            ..Default::default()
        };
        let lines = estimate_totals(&record);
        let labels: Vec<&str> = lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["Subtotal", "CGST", "SGST", "Estimated Total"]);
        assert_eq!(lines[1].value, "\u{20B9}90.00");
        assert_eq!(lines[2].value, "\u{20B9}90.00");
    }

    #[test]
    fn test_oversized_validity_window_has_no_expiry() {
        let record = EstimateRecord {
            estimate_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            validity_days: Some(u32::MAX),
            ..Default::default()
        };
        assert_eq!(valid_until(&record), None);
    }
}
