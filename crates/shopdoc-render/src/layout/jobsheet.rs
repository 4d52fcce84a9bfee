//! Job sheet layouts for A4 and A5

use super::common::*;
use super::{Column, LayoutContext, LayoutEnv, Paginator, Style, Table};
use crate::canvas::{Canvas, Color};
use crate::constants::{COMBINED_COPY_MAX_ROWS, SIGNATURE_FOOTER_HEIGHT};
use crate::records::{ApprovalState, ExtraSparePart, JobSheetRecord, StaffMember, TaggedPart};
use crate::types::DocumentKind;

const DEFAULT_TERMS: &str = "The shop is not responsible for loss of data; please back up your device \
before handing it over. Estimates may change once the device has been diagnosed. Devices not \
collected within 30 days of completion may be disposed of.";

const TAGGED_PART_COLUMNS: [Column; 6] = [
    Column::center("#", 0.5),
    Column::left("Part", 4.0),
    Column::left("Part No.", 2.0),
    Column::right("Qty", 1.0),
    Column::right("Rate", 1.8),
    Column::right("Amount", 2.0),
];

const EXTRA_PART_COLUMNS: [Column; 6] = [
    Column::center("#", 0.5),
    Column::left("Part", 4.0),
    Column::right("Qty", 1.0),
    Column::right("Amount", 2.0),
    Column::center("Approval", 1.6),
    Column::left("Method", 1.6),
];

/// Who a copy is printed for. Office copies carry the device credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audience {
    Customer,
    Office,
}

// =============================================================================
// Single Copies
// =============================================================================

pub(super) fn customer_sheet(canvas: &mut Canvas, record: &JobSheetRecord, env: &LayoutEnv) {
    let geometry = *canvas.geometry();
    let style = Style::for_geometry(&geometry);
    let paginator = Paginator::new(&record.job_sheet_number, style);
    let template = &record.template;

    let mut ctx = LayoutContext::start(&geometry);
    ctx = company_header(
        canvas,
        ctx,
        &style,
        env,
        &HeaderContent {
            company: &record.company,
            branch: &record.branch,
            title: DocumentKind::JobSheet.title(),
            subtitle: Some("CUSTOMER COPY"),
            show_logo: template.show_logo,
            show_contact: template.show_contact,
            height: None,
        },
    );
    ctx = body(canvas, ctx, &style, &paginator, record, env, Audience::Customer);

    let terms = template
        .terms
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_TERMS);
    let footer = template.footer_text.as_deref().filter(|t| !t.trim().is_empty());
    let lines = cost_lines(record);

    let mut reserve = totals_height(&style, &lines) + style.s(10.0);
    reserve += text_section_height(canvas, &style, terms);
    if template.show_signatures {
        reserve += style.s(SIGNATURE_FOOTER_HEIGHT);
    }
    let (room, _) = paginator.ensure_room(canvas, ctx, reserve, None);

    ctx = cost_summary(canvas, room, &style, record, env, &lines);
    ctx = text_section(canvas, ctx, &style, "Terms & Conditions", terms);
    if template.show_signatures {
        ctx = signatures(
            canvas,
            ctx,
            &style,
            &["Customer Signature", "Authorised Signatory"],
        );
    }
    if let Some(footer) = footer {
        footer_note(canvas, ctx.advance(style.s(8.0)), &style, footer);
    }
}

pub(super) fn office_sheet(canvas: &mut Canvas, record: &JobSheetRecord, env: &LayoutEnv) {
    let geometry = *canvas.geometry();
    let style = Style::for_geometry(&geometry);
    let paginator = Paginator::new(&record.job_sheet_number, style);

    let mut ctx = LayoutContext::start(&geometry);
    ctx = office_header(
        canvas,
        ctx,
        &style,
        "JOB SHEET - OFFICE COPY",
        &record.job_sheet_number,
        &record.branch.name,
    );
    ctx = body(canvas, ctx, &style, &paginator, record, env, Audience::Office);

    let lines = cost_lines(record);
    let reserve = totals_height(&style, &lines) + style.s(10.0) + style.s(SIGNATURE_FOOTER_HEIGHT);
    let (room, _) = paginator.ensure_room(canvas, ctx, reserve, None);

    ctx = cost_summary(canvas, room, &style, record, env, &lines);
    // Office copies always carry signature lines
    signatures(
        canvas,
        ctx.advance(style.s(8.0)),
        &style,
        &["Technician", "Received By", "Customer Signature"],
    );
}

/// Identification, panels, conditions and item tables shared by both
/// single-copy sheets
fn body(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    paginator: &Paginator,
    record: &JobSheetRecord,
    env: &LayoutEnv,
    audience: Audience,
) -> LayoutContext {
    let mut ctx = id_bar(
        canvas,
        ctx,
        style,
        &identification(record, env),
        None,
        style.s(26.0),
    )
    .advance(style.s(8.0));

    if record.service.is_warranty {
        ctx = warranty_badge(canvas, ctx, style);
    }

    let mut party = vec![
        Panel::customer("Customer", &record.customer),
        device_panel(record, audience),
    ];
    if audience == Audience::Office {
        party.push(staff_panel(record));
    }
    ctx = panels(canvas, ctx, style, &party, None).advance(style.s(10.0));

    ctx = text_section(canvas, ctx, style, "Reported Issue", &record.service.issue);
    if let Some(diagnosis) = record
        .service
        .diagnosis
        .as_deref()
        .filter(|d| !d.trim().is_empty())
    {
        ctx = text_section(canvas, ctx, style, "Diagnosis", diagnosis);
    }

    let conditions = [
        Panel::list("Accessories", &record.accessories),
        Panel::list("Damage Conditions", &record.damage_conditions),
        Panel::list("Reported Faults", &record.faults),
    ];
    ctx = panels(canvas, ctx, style, &conditions, None).advance(style.s(10.0));

    item_sections(canvas, ctx, style, paginator, record)
}

fn item_sections(
    canvas: &mut Canvas,
    mut ctx: LayoutContext,
    style: &Style,
    paginator: &Paginator,
    record: &JobSheetRecord,
) -> LayoutContext {
    let width = canvas.geometry().content_width();

    if !record.tagged_parts.is_empty() {
        let table = Table::new(ctx.x, width, &TAGGED_PART_COLUMNS, style);
        let rows = record
            .tagged_parts
            .iter()
            .enumerate()
            .map(|(i, part)| tagged_part_row(i, part))
            .collect();
        ctx = titled_table(canvas, ctx, style, paginator, "Parts Included In Estimate", &table, rows);
    }

    if !record.extra_spare_parts.is_empty() {
        let table = Table::new(ctx.x, width, &EXTRA_PART_COLUMNS, style);
        let rows = record
            .extra_spare_parts
            .iter()
            .enumerate()
            .map(|(i, part)| extra_part_row(i, part))
            .collect();
        ctx = titled_table(canvas, ctx, style, paginator, "Additional Parts", &table, rows);
    }

    ctx
}

/// Cost lines on the right, delivery and intake details on the left
fn cost_summary(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    record: &JobSheetRecord,
    env: &LayoutEnv,
    lines: &[TotalLine],
) -> LayoutContext {
    let geometry = *canvas.geometry();
    let column = geometry.content_width() * 0.45;
    let right_column = LayoutContext {
        x: geometry.width - geometry.margin - column,
        ..ctx
    };
    let after_totals = totals(canvas, right_column, style, column, lines);

    let mut y = ctx.y;
    let details = [
        ("Expected Delivery", env.date(record.service.expected_delivery)),
        (
            "Received By",
            record
                .created_by
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];
    for (label, value) in details {
        let caption = format!("{label}:");
        canvas.text(ctx.x, y, &caption, style.label());
        let offset = canvas.text_width(&caption, style.label()) + style.s(4.0);
        canvas.text(ctx.x + offset, y, &value, style.body());
        y += style.body().line_height();
    }

    ctx.at(after_totals.y.max(y) + style.s(10.0))
}

// =============================================================================
// Combined Copy
// =============================================================================

/// Customer half, cut line, office half on one page
pub(super) fn combined_sheet(canvas: &mut Canvas, record: &JobSheetRecord, env: &LayoutEnv) {
    let geometry = *canvas.geometry();
    let style = Style::for_geometry(&geometry);
    let middle = geometry.height / 2.0;
    let gap = style.s(10.0);

    let top = LayoutContext::start(&geometry);
    half_copy(canvas, top, &style, record, env, Audience::Customer, middle - gap);

    canvas.cut_line(middle);

    let lower = top.at(middle + gap);
    half_copy(
        canvas,
        lower,
        &style,
        record,
        env,
        Audience::Office,
        geometry.bottom_limit(),
    );
}

fn half_copy(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    record: &JobSheetRecord,
    env: &LayoutEnv,
    audience: Audience,
    bottom: f32,
) -> LayoutContext {
    let geometry = *canvas.geometry();
    let width = geometry.content_width();

    let mut ctx = match audience {
        Audience::Customer => compact_header(canvas, ctx, style, record, env),
        Audience::Office => office_header(
            canvas,
            ctx,
            style,
            "JOB SHEET - OFFICE COPY",
            &record.job_sheet_number,
            &record.branch.name,
        ),
    };

    ctx = id_bar(canvas, ctx, style, &identification(record, env), None, style.s(22.0))
        .advance(style.s(6.0));

    let mut device = device_panel(record, audience);
    if audience == Audience::Office {
        if let Some(technician) = &record.technician {
            device = device.line("Technician", technician.name.clone());
        }
    }
    let party = [
        Panel::customer("Customer", &record.customer),
        device,
    ];
    ctx = panels(canvas, ctx, style, &party, Some(style.s(74.0))).advance(style.s(6.0));

    let summary = [
        ("Issue", record.service.issue.clone()),
        ("Accessories", joined(&record.accessories)),
        ("Condition", joined(&record.damage_conditions)),
    ];
    for (label, value) in summary {
        let caption = format!("{label}:");
        canvas.text(ctx.x, ctx.y, &caption, style.label());
        let offset = canvas.text_width(&caption, style.label()) + style.s(4.0);
        canvas.text_fitted(ctx.x + offset, ctx.y, width - offset, &value, style.body());
        ctx = ctx.advance(style.body().line_height());
    }
    ctx = ctx.advance(style.s(4.0));

    let labels: &[&str] = match audience {
        Audience::Customer if record.template.show_signatures => {
            &["Customer Signature", "Authorised Signatory"]
        }
        Audience::Customer => &[],
        Audience::Office => &["Technician", "Received By"],
    };
    let signature_height = if labels.is_empty() { 0.0 } else { signatures_height(style) };
    let note_height = if record.extra_spare_parts.is_empty() {
        0.0
    } else {
        style.small().line_height()
    };
    let tail = note_height + style.strong().line_height() + signature_height;

    if !record.tagged_parts.is_empty() {
        let table = Table::with_heights(
            ctx.x,
            width,
            &TAGGED_PART_COLUMNS,
            style,
            style.s(16.0),
            style.s(15.0),
        );
        let room = bottom - tail - ctx.y - table.header_height() - style.s(4.0);
        let fits = (room / table.row_height()).floor().max(0.0) as usize;
        let shown = combined_rows_shown(record.tagged_parts.len(), fits);
        let hidden = record.tagged_parts.len() - shown;

        if fits > 0 {
            ctx = table.draw_header(canvas, ctx);
            for (i, part) in record.tagged_parts.iter().take(shown).enumerate() {
                ctx = table.draw_row(canvas, ctx, &tagged_part_row(i, part));
            }
            if hidden > 0 {
                ctx = table.draw_note_row(canvas, ctx, &format!("+{hidden} more"));
            }
            ctx = ctx.advance(style.s(4.0));
        }
    }

    if !record.extra_spare_parts.is_empty() {
        let pending = record
            .extra_spare_parts
            .iter()
            .filter(|p| p.approval_state == ApprovalState::Pending)
            .count();
        let note = format!(
            "Additional parts: {} ({} awaiting approval)",
            record.extra_spare_parts.len(),
            pending
        );
        canvas.text(ctx.x, ctx.y, &note, style.small());
        ctx = ctx.advance(style.small().line_height());
    }

    let costs = format!(
        "Estimate: {}    Advance: {}    Balance: {}",
        money(record.service.estimated_cost),
        money(record.service.advance_payment),
        money(record.balance_due())
    );
    canvas.text(ctx.x, ctx.y, &costs, style.strong());
    ctx = ctx.advance(style.strong().line_height());

    let signature_top = (bottom - signatures_height(style)).max(ctx.y);
    signatures(canvas, ctx.at(signature_top), style, labels)
}

/// Part rows a half copy prints when `fits` rows are free. A "+N more" row
/// takes one of them whenever parts are left out.
fn combined_rows_shown(total: usize, fits: usize) -> usize {
    let capped = total.min(COMBINED_COPY_MAX_ROWS);
    if capped == total && total <= fits {
        total
    } else {
        capped.min(fits.saturating_sub(1))
    }
}

/// Company name and copy title on one band, with a single contact line
fn compact_header(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    record: &JobSheetRecord,
    env: &LayoutEnv,
) -> LayoutContext {
    let geometry = *canvas.geometry();
    let right = geometry.width - geometry.margin;
    let height = style.s(34.0);
    let template = &record.template;

    let mut text_x = ctx.x;
    if template.show_logo {
        if let Some(path) = env.logo.as_deref() {
            if let Some((width, _)) = canvas.image(path, ctx.x, ctx.y, style.s(60.0), height - style.s(4.0)) {
                text_x += width + style.s(8.0);
            }
        }
    }

    let title = style.heading().right();
    canvas.text(right, ctx.y, "JOB SHEET - CUSTOMER COPY", title);
    let title_width = canvas.text_width("JOB SHEET - CUSTOMER COPY", title);
    let name_width = right - title_width - style.s(10.0) - text_x;
    canvas.text_fitted(text_x, ctx.y, name_width, &record.company.name, style.strong());

    if template.show_contact {
        if let Some(line) = contact_lines(&record.company, &record.branch).into_iter().next() {
            let y = ctx.y + style.strong().line_height();
            canvas.text_fitted(text_x, y, right - text_x, &line, style.small());
        }
    }

    let rule_y = ctx.y + height - style.s(4.0);
    canvas.line((ctx.x, rule_y), (right, rule_y), style.s(1.0), Color::ACCENT);
    ctx.advance(height + style.s(4.0))
}

// =============================================================================
// Shared Pieces
// =============================================================================

fn identification(record: &JobSheetRecord, env: &LayoutEnv) -> Vec<(&'static str, String)> {
    vec![
        ("Job Sheet", record.job_sheet_number.clone()),
        ("Ticket", record.ticket_number().to_string()),
        ("Date", env.date(record.service.created_at)),
    ]
}

fn device_name(record: &JobSheetRecord) -> String {
    match &record.customer_device {
        Some(device) if !device.model.trim().is_empty() => {
            format!("{} {}", device.brand.trim(), device.model.trim())
                .trim()
                .to_string()
        }
        _ => record.service.device_model.clone(),
    }
}

/// Device details. Only office copies show the unlock password or pattern.
fn device_panel(record: &JobSheetRecord, audience: Audience) -> Panel {
    let device = record.customer_device.as_ref();
    let imei = record
        .service
        .device_imei
        .clone()
        .or_else(|| device.and_then(|d| d.imei.clone()));

    let mut panel = Panel::new("Device")
        .with_lead()
        .line("", device_name(record))
        .optional("IMEI", &imei)
        .optional("Serial", &device.and_then(|d| d.serial_number.clone()))
        .optional("Color", &device.and_then(|d| d.color.clone()))
        .line("Status", record.service.status.clone());

    if audience == Audience::Office {
        panel = panel
            .optional("Password", &record.service.device_password)
            .optional("Pattern", &record.service.device_pattern);
    }
    panel
}

fn staff_panel(record: &JobSheetRecord) -> Panel {
    let name = |member: &Option<StaffMember>| {
        member
            .as_ref()
            .map(|m| m.name.clone())
            .unwrap_or_else(|| "Unassigned".to_string())
    };
    Panel::new("Staff")
        .line("Technician", name(&record.technician))
        .line("Created By", name(&record.created_by))
        .line("Warranty", if record.service.is_warranty { "Yes" } else { "No" })
        .line("Repeat", if record.service.is_repeat_service { "Yes" } else { "No" })
}

fn cost_lines(record: &JobSheetRecord) -> Vec<TotalLine> {
    let service = &record.service;
    let mut lines = vec![TotalLine::new("Estimated Cost", money(service.estimated_cost))];
    if service.labour_cost > 0.0 {
        lines.push(TotalLine::new("Labour", money(service.labour_cost)));
    }
    if service.discount > 0.0 {
        lines.push(TotalLine::new("Discount", money(-service.discount)));
    }
    lines.push(TotalLine::new("Advance Paid", money(service.advance_payment)));
    lines.push(TotalLine::emphasized("Balance Due", money(record.balance_due())));
    lines
}

fn tagged_part_row(index: usize, part: &TaggedPart) -> Vec<String> {
    vec![
        (index + 1).to_string(),
        part.name.clone(),
        part.part_number.clone().unwrap_or_else(|| "-".to_string()),
        quantity(part.quantity),
        money(part.unit_price),
        money(part.amount),
    ]
}

fn extra_part_row(index: usize, part: &ExtraSparePart) -> Vec<String> {
    vec![
        (index + 1).to_string(),
        part.name.clone(),
        quantity(part.quantity),
        money(part.amount),
        part.approval_state.label().to_string(),
        part.approval_method
            .map(|m| m.label().to_string())
            .unwrap_or_else(|| "-".to_string()),
    ]
}

fn joined(items: &[String]) -> String {
    let items: Vec<&str> = items
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DrawOp;
    use crate::format::PageGeometry;
    use crate::records::CustomerDevice;
    use crate::typography::Typography;
    use crate::types::PaperFormat;

    fn record() -> JobSheetRecord {
        let mut record = JobSheetRecord {
            job_sheet_number: "JS-100".into(),
            ..Default::default()
        };
        record.service.ticket_number = "T-9".into();
        record.service.device_model = "Pixel 7".into();
        record.service.device_password = Some("4321".into());
        record.service.device_pattern = Some("L-shape".into());
        record.service.issue = "Screen cracked".into();
        record.tagged_parts = (0..6)
            .map(|i| TaggedPart {
                name: format!("Part {i}"),
                quantity: 1.0,
                unit_price: 100.0,
                amount: 100.0,
                ..Default::default()
            })
            .collect();
        record
    }

    fn canvas() -> Canvas {
        Canvas::new(
            PageGeometry::for_document(PaperFormat::A4, DocumentKind::JobSheet),
            Typography::standard(),
        )
    }

    fn all_text(canvas: &Canvas) -> String {
        (0..canvas.page_count())
            .flat_map(|i| canvas.page_texts(i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_customer_copy_masks_credentials() {
        let mut canvas = canvas();
        customer_sheet(&mut canvas, &record(), &LayoutEnv::default());
        let text = all_text(&canvas);
        assert!(!text.contains("4321"));
        assert!(!text.contains("L-shape"));
        assert!(text.contains("Screen cracked"));
    }

    #[test]
    fn test_office_copy_shows_credentials() {
        let mut canvas = canvas();
        office_sheet(&mut canvas, &record(), &LayoutEnv::default());
        let text = all_text(&canvas);
        assert!(text.contains("4321"));
        assert!(text.contains("L-shape"));
    }

    #[test]
    fn test_combined_copy_caps_rows() {
        let mut canvas = canvas();
        combined_sheet(&mut canvas, &record(), &LayoutEnv::default());
        assert_eq!(canvas.page_count(), 1);

        let texts = canvas.page_texts(0);
        assert!(texts.contains(&"+2 more"));
        assert!(texts.contains(&"Part 3"));
        assert!(!texts.contains(&"Part 4"));
        // the office half still prints the credentials, the customer half not
        assert_eq!(texts.iter().filter(|t| **t == "4321").count(), 1);
    }

    /// Lowest point an op reaches, top-down
    fn op_bottom(op: &DrawOp) -> f32 {
        match op {
            DrawOp::Text { y, style, .. } => y + style.line_height(),
            DrawOp::Line { from, to, .. } => from.1.max(to.1),
            DrawOp::Rect { y, height, .. } | DrawOp::Image { y, height, .. } => y + height,
            DrawOp::CutLine { y, .. } => *y,
        }
    }

    #[test]
    fn test_combined_copy_stays_inside_margins() {
        let mut record = record();
        record.extra_spare_parts = vec![ExtraSparePart {
            name: "Battery".into(),
            quantity: 1.0,
            amount: 900.0,
            ..Default::default()
        }];

        for format in [PaperFormat::A4, PaperFormat::A5] {
            let geometry = PageGeometry::for_document(format, DocumentKind::JobSheet);
            let mut canvas = Canvas::new(geometry, Typography::standard());
            combined_sheet(&mut canvas, &record, &LayoutEnv::default());
            assert_eq!(canvas.page_count(), 1);

            let ops = &canvas.pages()[0];
            let cut = ops
                .iter()
                .position(|op| matches!(op, DrawOp::CutLine { .. }))
                .unwrap();
            let middle = geometry.height / 2.0;
            for op in &ops[..cut] {
                assert!(op_bottom(op) <= middle + 0.01, "{format}: {op:?} crosses the cut line");
            }
            for op in &ops[cut..] {
                assert!(
                    op_bottom(op) <= geometry.bottom_limit() + 0.01,
                    "{format}: {op:?} runs past the bottom margin"
                );
            }

            let texts = canvas.page_texts(0);
            assert_eq!(texts.iter().filter(|t| t.starts_with("Additional parts")).count(), 2);
            assert!(texts.iter().any(|t| t.starts_with("Estimate: ")));
        }
    }

    #[test]
    fn test_combined_rows_leave_room_for_more_note() {
        assert_eq!(combined_rows_shown(3, 10), 3);
        assert_eq!(combined_rows_shown(6, 10), 4);
        assert_eq!(combined_rows_shown(6, 4), 3);
        assert_eq!(combined_rows_shown(4, 3), 2);
        assert_eq!(combined_rows_shown(2, 0), 0);
    }

    #[test]
    fn test_device_name_prefers_registered_device() {
        let mut record = record();
        assert_eq!(device_name(&record), "Pixel 7");
        record.customer_device = Some(CustomerDevice {
            brand: "Google".into(),
            model: "Pixel 7 Pro".into(),
            ..Default::default()
        });
        assert_eq!(device_name(&record), "Google Pixel 7 Pro");
    }
}
