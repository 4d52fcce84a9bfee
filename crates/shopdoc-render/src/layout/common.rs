//! Sections shared by the sheet layouts

use super::{LayoutContext, LayoutEnv, Paginator, Style, Table, centered_in_band};
use crate::canvas::{Canvas, Color, TextStyle};
use crate::money::{format_currency, number_to_words};
use crate::records::{Branch, Company, Customer, PaymentStatus};

/// Currency with paise, as printed in every table and total
pub(crate) fn money(amount: f64) -> String {
    format_currency(amount, true)
}

/// Quantities print without decimals when whole
pub(crate) fn quantity(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Header
// =============================================================================

pub(crate) struct HeaderContent<'a> {
    pub company: &'a Company,
    pub branch: &'a Branch,
    pub title: &'a str,
    pub subtitle: Option<&'a str>,
    pub show_logo: bool,
    pub show_contact: bool,
    /// Fixed block height; sized to the content when `None`
    pub height: Option<f32>,
}

/// Address and contact lines, preferring the branch's own details
pub(crate) fn contact_lines(company: &Company, branch: &Branch) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(address) = present(&branch.address).or(present(&company.address)) {
        lines.push(address.to_string());
    }

    let phone = present(&branch.phone).or(present(&company.phone));
    let email = present(&branch.email).or(present(&company.email));
    match (phone, email) {
        (Some(phone), Some(email)) => lines.push(format!("Phone: {phone} | Email: {email}")),
        (Some(phone), None) => lines.push(format!("Phone: {phone}")),
        (None, Some(email)) => lines.push(format!("Email: {email}")),
        (None, None) => {}
    }

    if let Some(website) = present(&company.website) {
        lines.push(website.to_string());
    }
    if let Some(gstin) = present(&branch.gstin).or(present(&company.gstin)) {
        lines.push(format!("GSTIN: {gstin}"));
    }

    lines
}

/// Logo, company name and contact block on the left, document title on the
/// right, closed by an accent rule
pub(crate) fn company_header(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    env: &LayoutEnv,
    content: &HeaderContent<'_>,
) -> LayoutContext {
    let geometry = *canvas.geometry();
    let right = geometry.width - geometry.margin;
    let limit = content.height.map(|h| ctx.y + h - style.s(8.0));

    let mut text_x = ctx.x;
    let mut logo_bottom = ctx.y;
    if content.show_logo {
        if let Some(path) = env.logo.as_deref() {
            let size = style.s(56.0);
            if let Some((width, height)) = canvas.image(path, ctx.x, ctx.y, size, size) {
                text_x = ctx.x + width + style.s(10.0);
                logo_bottom = ctx.y + height;
            }
        }
    }

    let title_style = style.title().right();
    canvas.text(right, ctx.y, content.title, title_style);
    let mut title_width = canvas.text_width(content.title, title_style);
    let mut right_y = ctx.y + title_style.line_height();
    if let Some(subtitle) = content.subtitle {
        let subtitle_style = style.label().right();
        canvas.text(right, right_y, subtitle, subtitle_style);
        title_width = title_width.max(canvas.text_width(subtitle, subtitle_style));
        right_y += subtitle_style.line_height();
    }

    let block_width = (right - title_width - style.s(12.0) - text_x).max(style.s(60.0));
    let mut y = ctx.y;
    canvas.text_fitted(text_x, y, block_width, &content.company.name, style.company());
    y += style.company().line_height();

    if content.show_contact {
        let small = style.small();
        for line in contact_lines(content.company, content.branch) {
            if limit.is_some_and(|limit| y + small.line_height() > limit) {
                break;
            }
            canvas.text_fitted(text_x, y, block_width, &line, small);
            y += small.line_height();
        }
    }

    let height = content
        .height
        .unwrap_or_else(|| y.max(logo_bottom).max(right_y) - ctx.y + style.s(10.0));
    let rule_y = ctx.y + height - style.s(5.0);
    canvas.line((ctx.x, rule_y), (right, rule_y), style.s(1.2), Color::ACCENT);
    ctx.advance(height)
}

/// Single-band header used by internal copies: no logo or contact block
pub(crate) fn office_header(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    title: &str,
    number: &str,
    branch_name: &str,
) -> LayoutContext {
    let geometry = *canvas.geometry();
    let right = geometry.width - geometry.margin;
    let height = style.s(34.0);

    canvas.rect(ctx.x, ctx.y, right - ctx.x, height, Some(Color::DARK_GREY), None);
    let heading = style.heading().color(Color::WHITE);
    let top = centered_in_band(ctx.y, height, heading);
    canvas.text(ctx.x + style.s(8.0), top, title, heading);
    canvas.text(
        right - style.s(8.0),
        top,
        number,
        style.strong().color(Color::WHITE).right(),
    );
    if !branch_name.is_empty() {
        canvas.text(
            (ctx.x + right) / 2.0,
            top,
            branch_name,
            style.body().color(Color::WHITE).centered(),
        );
    }

    ctx.advance(height + style.s(8.0))
}

// =============================================================================
// Identification Bar And Badges
// =============================================================================

/// Shaded band of `label: value` pairs with an optional right-aligned banner
pub(crate) fn id_bar(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    fields: &[(&str, String)],
    banner: Option<&str>,
    height: f32,
) -> LayoutContext {
    let geometry = *canvas.geometry();
    let right = geometry.width - geometry.margin;
    canvas.rect(ctx.x, ctx.y, right - ctx.x, height, Some(Color::SHADE), None);

    let padding = style.s(8.0);
    let label = style.label();
    let value = style.strong();
    let top = centered_in_band(ctx.y, height, value);

    let mut available = right - ctx.x - 2.0 * padding;
    if let Some(banner) = banner {
        let banner_style = style.label().color(Color::ACCENT).right();
        canvas.text(right - padding, top, banner, banner_style);
        available -= canvas.text_width(banner, banner_style) + padding;
    }

    if fields.is_empty() {
        return ctx.advance(height);
    }

    let slot = available / fields.len() as f32;
    for (index, (name, text)) in fields.iter().enumerate() {
        let x = ctx.x + padding + slot * index as f32;
        let caption = format!("{name}:");
        canvas.text(x, top, &caption, label);
        let caption_width = canvas.text_width(&caption, label) + style.s(3.0);
        canvas.text_fitted(x + caption_width, top, slot - caption_width - style.s(4.0), text, value);
    }

    ctx.advance(height)
}

pub(crate) fn warranty_badge(canvas: &mut Canvas, ctx: LayoutContext, style: &Style) -> LayoutContext {
    let height = style.s(20.0);
    let label = "WARRANTY REPAIR";
    let text = style.strong().color(Color::SUCCESS);
    let width = canvas.text_width(label, text) + style.s(20.0);

    canvas.rect(ctx.x, ctx.y, width, height, None, Some(Color::SUCCESS));
    canvas.text(
        ctx.x + width / 2.0,
        centered_in_band(ctx.y, height, text),
        label,
        text.centered(),
    );
    ctx.advance(height + style.s(8.0))
}

/// Outlined payment-status stamp with its top-left corner at (x, y)
pub(crate) fn status_stamp(canvas: &mut Canvas, x: f32, y: f32, style: &Style, status: PaymentStatus) {
    let color = match status {
        PaymentStatus::Paid => Color::SUCCESS,
        PaymentStatus::Partial => Color::WARNING,
        PaymentStatus::Unpaid => Color::DANGER,
    };
    let text = TextStyle::bold(style.s(13.0)).color(color);
    let width = canvas.text_width(status.label(), text) + style.s(24.0);
    let height = style.s(28.0);

    canvas.rect(x, y, width, height, None, Some(color));
    canvas.text(
        x + width / 2.0,
        centered_in_band(y, height, text),
        status.label(),
        text.centered(),
    );
}

// =============================================================================
// Panels
// =============================================================================

/// Titled box of `label: value` lines. An empty label prints the value alone.
#[derive(Debug, Clone, Default)]
pub(crate) struct Panel {
    pub title: String,
    pub lines: Vec<(&'static str, String)>,
    /// Print the first line in bold
    pub lead: bool,
}

impl Panel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
            lead: false,
        }
    }

    pub fn with_lead(mut self) -> Self {
        self.lead = true;
        self
    }

    pub fn line(mut self, label: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.lines.push((label, value));
        }
        self
    }

    pub fn optional(self, label: &'static str, value: &Option<String>) -> Self {
        match present(value) {
            Some(value) => {
                let value = value.to_string();
                self.line(label, value)
            }
            None => self,
        }
    }

    /// Bulleted list, or a single `None` entry when empty
    pub fn list(title: impl Into<String>, items: &[String]) -> Self {
        let mut panel = Self::new(title);
        for item in items.iter().filter(|i| !i.trim().is_empty()) {
            panel.lines.push(("", format!("\u{2022} {}", item.trim())));
        }
        if panel.lines.is_empty() {
            panel.lines.push(("", "None".to_string()));
        }
        panel
    }

    pub fn customer(title: &str, customer: &Customer) -> Self {
        Self::new(title)
            .with_lead()
            .line("", customer.name.clone())
            .optional("Phone", &customer.phone)
            .optional("Alt. Phone", &customer.alternate_phone)
            .optional("Email", &customer.email)
            .optional("Address", &customer.address)
            .optional("GSTIN", &customer.gstin)
    }

    pub fn branch(title: &str, branch: &Branch) -> Self {
        Self::new(title)
            .with_lead()
            .line("", branch.name.clone())
            .optional("Address", &branch.address)
            .optional("Phone", &branch.phone)
            .optional("GSTIN", &branch.gstin)
    }
}

/// Side-by-side panels. With a fixed height, lines that do not fit are
/// dropped.
pub(crate) fn panels(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    panels: &[Panel],
    height: Option<f32>,
) -> LayoutContext {
    if panels.is_empty() {
        return ctx;
    }

    let geometry = *canvas.geometry();
    let gutter = style.s(10.0);
    let padding = style.s(6.0);
    let width = (geometry.content_width() - gutter * (panels.len() - 1) as f32) / panels.len() as f32;
    let heading = style.heading();
    let body = style.body();
    let label = style.label();
    let title_height = heading.line_height() + style.s(4.0);

    let content_height = panels
        .iter()
        .map(|p| p.lines.len() as f32 * body.line_height())
        .fold(0.0, f32::max);
    let box_height = height.unwrap_or(title_height + content_height + 2.0 * padding);

    for (index, panel) in panels.iter().enumerate() {
        let x = ctx.x + index as f32 * (width + gutter);
        canvas.rect(x, ctx.y, width, box_height, None, Some(Color::RULE));
        canvas.text_fitted(x + padding, ctx.y + padding, width - 2.0 * padding, &panel.title, heading);

        let mut y = ctx.y + padding + title_height;
        let bottom = ctx.y + box_height - padding;
        for (line_index, (caption, value)) in panel.lines.iter().enumerate() {
            if y + body.line_height() > bottom {
                break;
            }
            let mut value_x = x + padding;
            let mut value_style = body;
            if panel.lead && line_index == 0 {
                value_style = style.strong();
            }
            if !caption.is_empty() {
                let caption = format!("{caption}:");
                canvas.text(value_x, y, &caption, label);
                value_x += canvas.text_width(&caption, label) + style.s(4.0);
            }
            let room = x + width - padding - value_x;
            canvas.text_fitted(value_x, y, room, value, value_style);
            y += body.line_height();
        }
    }

    ctx.advance(box_height)
}

/// Heading followed by a wrapped paragraph
pub(crate) fn text_section(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    title: &str,
    text: &str,
) -> LayoutContext {
    let width = canvas.geometry().content_width();
    canvas.text(ctx.x, ctx.y, title, style.heading());
    let y = ctx.y + style.heading().line_height();
    let end = canvas.paragraph(ctx.x, y, width, text, style.body());
    ctx.at(end + style.s(6.0))
}

/// Height `text_section` uses for the same text
pub(crate) fn text_section_height(canvas: &Canvas, style: &Style, text: &str) -> f32 {
    let width = canvas.geometry().content_width();
    style.heading().line_height() + canvas.paragraph_height(width, text, style.body()) + style.s(6.0)
}

/// Section heading followed by a paginated table. Room for the heading, the
/// column header and one row is made first so the heading never sits alone
/// at the bottom of a page.
pub(crate) fn titled_table(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    paginator: &Paginator,
    title: &str,
    table: &Table,
    rows: Vec<Vec<String>>,
) -> LayoutContext {
    let heading = style.heading();
    let needed = heading.line_height() + table.header_height() + table.row_height();
    let (ctx, _) = paginator.ensure_room(canvas, ctx, needed, None);

    canvas.text(ctx.x, ctx.y, title, heading);
    let ctx = table.draw_header(canvas, ctx.advance(heading.line_height()));
    paginator.rows(canvas, ctx, table, rows).advance(style.s(10.0))
}

// =============================================================================
// Totals And Footer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TotalLine {
    pub label: String,
    pub value: String,
    pub emphasis: bool,
}

impl TotalLine {
    pub fn new(label: impl Into<String>, value: String) -> Self {
        Self {
            label: label.into(),
            value,
            emphasis: false,
        }
    }

    pub fn emphasized(label: impl Into<String>, value: String) -> Self {
        Self {
            emphasis: true,
            ..Self::new(label, value)
        }
    }
}

/// Height `totals` uses for the same lines
pub(crate) fn totals_height(style: &Style, lines: &[TotalLine]) -> f32 {
    lines
        .iter()
        .map(|line| style.s(if line.emphasis { 22.0 } else { 16.0 }))
        .sum()
}

/// Label/value rows in a column of the given width. Emphasized rows are
/// shaded and bold.
pub(crate) fn totals(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    width: f32,
    lines: &[TotalLine],
) -> LayoutContext {
    let padding = style.s(6.0);
    let mut y = ctx.y;

    for line in lines {
        let (row_height, text) = if line.emphasis {
            (style.s(22.0), TextStyle::bold(style.s(10.5)))
        } else {
            (style.s(16.0), style.body())
        };
        if line.emphasis {
            canvas.rect(ctx.x, y, width, row_height, Some(Color::SHADE), None);
        }
        let top = centered_in_band(y, row_height, text);
        canvas.text(ctx.x + padding, top, &line.label, text);
        canvas.text(ctx.x + width - padding, top, &line.value, text.right());
        y += row_height;
    }

    ctx.at(y)
}

/// "Amount in words" caption and the spelled-out amount
pub(crate) fn amount_in_words(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    width: f32,
    amount: f64,
) -> LayoutContext {
    let caption = "Amount in words:";
    canvas.text(ctx.x, ctx.y, caption, style.label());
    let y = ctx.y + style.label().line_height();
    let end = canvas.paragraph(ctx.x, y, width, &number_to_words(amount), style.strong());
    ctx.at(end + style.s(4.0))
}

/// Height `signatures` uses
pub(crate) fn signatures_height(style: &Style) -> f32 {
    style.s(35.0) + style.small().line_height()
}

/// Signature lines spread evenly across the content width
pub(crate) fn signatures(
    canvas: &mut Canvas,
    ctx: LayoutContext,
    style: &Style,
    labels: &[&str],
) -> LayoutContext {
    if labels.is_empty() {
        return ctx;
    }

    let geometry = *canvas.geometry();
    let gap = style.s(30.0);
    let slot = (geometry.content_width() - gap * (labels.len() - 1) as f32) / labels.len() as f32;
    let line_y = ctx.y + style.s(32.0);

    for (index, label) in labels.iter().enumerate() {
        let x = ctx.x + index as f32 * (slot + gap);
        canvas.line((x, line_y), (x + slot, line_y), 0.6, Color::DARK_GREY);
        canvas.text(x + slot / 2.0, line_y + style.s(3.0), label, style.small().centered());
    }

    ctx.at(line_y + style.s(3.0) + style.small().line_height())
}

/// Small centered line, used for footer text
pub(crate) fn footer_note(canvas: &mut Canvas, ctx: LayoutContext, style: &Style, text: &str) -> LayoutContext {
    let geometry = *canvas.geometry();
    let small = style.small().centered();
    canvas.text(geometry.width / 2.0, ctx.y, text, small);
    ctx.advance(small.line_height())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_formatting() {
        assert_eq!(quantity(2.0), "2");
        assert_eq!(quantity(1.5), "1.50");
    }

    #[test]
    fn test_contact_lines_prefer_branch() {
        let company = Company {
            name: "Acme".into(),
            address: Some("HQ Road".into()),
            phone: Some("111".into()),
            gstin: Some("GST-CO".into()),
            ..Default::default()
        };
        let branch = Branch {
            address: Some("Branch Street".into()),
            ..Default::default()
        };
        assert_eq!(
            contact_lines(&company, &branch),
            vec!["Branch Street", "Phone: 111", "GSTIN: GST-CO"]
        );
    }

    #[test]
    fn test_list_panel_marks_empty() {
        let panel = Panel::list("Accessories", &[]);
        assert_eq!(panel.lines, vec![("", "None".to_string())]);
        let panel = Panel::list("Accessories", &["Charger".to_string(), " ".to_string()]);
        assert_eq!(panel.lines.len(), 1);
    }
}
