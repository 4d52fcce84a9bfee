//! Drawing surface
//!
//! Layout code draws with a top-down y axis (0 at the top edge of the page).
//! Calls are recorded per page as [`DrawOp`]s and serialized to PDF operators
//! only when the document is finished, so a continuous receipt page can take
//! its final height from what was drawn on it.

mod image;
mod marks;

pub use image::RasterImage;

use crate::constants::*;
use crate::format::PageGeometry;
use crate::typography::{FontRole, Typography};
use crate::types::Result;
use lopdf::{Dictionary, Document, Object, Stream};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// =============================================================================
// Styles
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const DARK_GREY: Color = Color::rgb(0.25, 0.25, 0.25);
    pub const GREY: Color = Color::rgb(0.5, 0.5, 0.5);
    pub const RULE: Color = Color::rgb(0.75, 0.75, 0.75);
    pub const SHADE: Color = Color::rgb(0.93, 0.93, 0.93);
    pub const ACCENT: Color = Color::rgb(0.12, 0.29, 0.55);
    pub const DANGER: Color = Color::rgb(0.75, 0.1, 0.1);
    pub const SUCCESS: Color = Color::rgb(0.1, 0.5, 0.2);
    pub const WARNING: Color = Color::rgb(0.8, 0.5, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    fn fill_op(self) -> String {
        format!("{:.3} {:.3} {:.3} rg", self.r, self.g, self.b)
    }

    fn stroke_op(self) -> String {
        format!("{:.3} {:.3} {:.3} RG", self.r, self.g, self.b)
    }
}

/// Horizontal anchor of a text draw: the left edge, the center, or the
/// right edge sits at the given x
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub role: FontRole,
    pub color: Color,
    pub align: Align,
}

impl TextStyle {
    pub fn regular(size: f32) -> Self {
        Self {
            size,
            role: FontRole::Regular,
            color: Color::BLACK,
            align: Align::Left,
        }
    }

    pub fn bold(size: f32) -> Self {
        Self {
            role: FontRole::Bold,
            ..Self::regular(size)
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn centered(self) -> Self {
        self.align(Align::Center)
    }

    pub fn right(self) -> Self {
        self.align(Align::Right)
    }

    /// Vertical advance of one line of this style
    pub fn line_height(&self) -> f32 {
        self.size * LINE_HEIGHT_RATIO
    }
}

// =============================================================================
// Display List
// =============================================================================

/// One recorded drawing call, in top-down page coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `x` is the left edge after alignment, `y` the top of the line box
    Text {
        x: f32,
        y: f32,
        style: TextStyle,
        text: String,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Color,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Color>,
        stroke: Option<Color>,
    },
    Image {
        index: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    CutLine {
        y: f32,
        x_start: f32,
        x_end: f32,
    },
}

/// A multi-page document under construction
#[derive(Debug)]
pub struct Canvas {
    geometry: PageGeometry,
    typography: Typography,
    pages: Vec<Vec<DrawOp>>,
    images: Vec<RasterImage>,
    image_slots: HashMap<PathBuf, Option<usize>>,
    watermark: Option<String>,
    /// Lowest point drawn so far, across all pages
    extent: f32,
}

impl Canvas {
    pub fn new(geometry: PageGeometry, typography: Typography) -> Self {
        Self {
            geometry,
            typography,
            pages: vec![Vec::new()],
            images: Vec::new(),
            image_slots: HashMap::new(),
            watermark: None,
            extent: 0.0,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn typography(&self) -> &Typography {
        &self.typography
    }

    /// Start a new page and return its index
    pub fn new_page(&mut self) -> usize {
        self.pages.push(Vec::new());
        self.pages.len() - 1
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Vec<DrawOp>] {
        &self.pages
    }

    /// Text drawn on a page, in drawing order
    pub fn page_texts(&self, index: usize) -> Vec<&str> {
        self.pages
            .get(index)
            .map(|ops| {
                ops.iter()
                    .filter_map(|op| match op {
                        DrawOp::Text { text, .. } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Draw a label across every page beneath all other content
    pub fn set_watermark(&mut self, text: impl Into<String>) {
        self.watermark = Some(text.into());
    }

    pub fn has_watermark(&self) -> bool {
        self.watermark.is_some()
    }

    fn push(&mut self, op: DrawOp, bottom: f32) {
        self.extent = self.extent.max(bottom);
        if let Some(page) = self.pages.last_mut() {
            page.push(op);
        }
    }

    // =========================================================================
    // Text
    // =========================================================================

    pub fn text_width(&self, text: &str, style: TextStyle) -> f32 {
        self.typography.measure(style.role, text, style.size)
    }

    /// Draw a single line of text with its line box top at `y`
    pub fn text(&mut self, x: f32, y: f32, text: &str, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        let left = match style.align {
            Align::Left => x,
            Align::Center => x - self.text_width(text, style) / 2.0,
            Align::Right => x - self.text_width(text, style),
        };
        self.push(
            DrawOp::Text {
                x: left,
                y,
                style,
                text: text.to_string(),
            },
            y + style.line_height(),
        );
    }

    /// Draw text truncated with an ellipsis to fit `max_width`
    pub fn text_fitted(&mut self, x: f32, y: f32, max_width: f32, text: &str, style: TextStyle) {
        let fitted = self.fit(text, style, max_width);
        self.text(x, y, &fitted, style);
    }

    /// Draw wrapped text and return the y just below the last line
    pub fn paragraph(&mut self, x: f32, y: f32, width: f32, text: &str, style: TextStyle) -> f32 {
        let mut cursor = y;
        for line in self.wrap(text, style, width) {
            self.text(x, cursor, &line, style);
            cursor += style.line_height();
        }
        cursor
    }

    /// Height `paragraph` would use for the same arguments
    pub fn paragraph_height(&self, width: f32, text: &str, style: TextStyle) -> f32 {
        self.wrap(text, style, width).len() as f32 * style.line_height()
    }

    /// Greedy word wrap; words wider than a line are split by character
    pub fn wrap(&self, text: &str, style: TextStyle, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();

        for paragraph in text.lines() {
            let mut current = String::new();
            for word in paragraph.split_whitespace() {
                let candidate = if current.is_empty() {
                    word.to_string()
                } else {
                    format!("{current} {word}")
                };

                if self.text_width(&candidate, style) <= max_width {
                    current = candidate;
                    continue;
                }

                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }

                if self.text_width(word, style) <= max_width {
                    current = word.to_string();
                } else {
                    for ch in word.chars() {
                        let mut extended = current.clone();
                        extended.push(ch);
                        if !current.is_empty() && self.text_width(&extended, style) > max_width {
                            lines.push(std::mem::take(&mut current));
                            current.push(ch);
                        } else {
                            current = extended;
                        }
                    }
                }
            }
            if !current.is_empty() {
                lines.push(current);
            }
        }

        lines
    }

    /// Truncate text with `...` so it fits `max_width`
    pub fn fit(&self, text: &str, style: TextStyle, max_width: f32) -> String {
        if self.text_width(text, style) <= max_width {
            return text.to_string();
        }

        let mut fitted: String = text.to_string();
        while !fitted.is_empty() {
            fitted.pop();
            let candidate = format!("{}...", fitted.trim_end());
            if self.text_width(&candidate, style) <= max_width {
                return candidate;
            }
        }
        String::new()
    }

    // =========================================================================
    // Shapes
    // =========================================================================

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Color) {
        self.push(
            DrawOp::Line {
                from,
                to,
                width,
                color,
            },
            from.1.max(to.1),
        );
    }

    /// Horizontal rule across `[x1, x2]` at `y`
    pub fn rule(&mut self, x1: f32, x2: f32, y: f32) {
        self.line((x1, y), (x2, y), 0.5, Color::RULE);
    }

    pub fn rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Color>,
        stroke: Option<Color>,
    ) {
        self.push(
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
            },
            y + height,
        );
    }

    /// Dashed cut line with a scissors mark across the full content width
    pub fn cut_line(&mut self, y: f32) {
        let x_start = self.geometry.margin / 2.0;
        let x_end = self.geometry.width - self.geometry.margin / 2.0;
        self.push(DrawOp::CutLine { y, x_start, x_end }, y);
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// Draw an image scaled to fit the box, keeping its aspect ratio.
    ///
    /// Returns the drawn size, or `None` when the image could not be decoded;
    /// the failure is logged and the region left empty.
    pub fn image(
        &mut self,
        path: &Path,
        x: f32,
        y: f32,
        max_width: f32,
        max_height: f32,
    ) -> Option<(f32, f32)> {
        let index = self.load_image(path)?;
        let (width, height) = fit_box(self.images[index].aspect_ratio(), max_width, max_height);

        self.push(
            DrawOp::Image {
                index,
                x,
                y,
                width,
                height,
            },
            y + height,
        );
        Some((width, height))
    }

    /// Size [`Canvas::image`] would draw at, without drawing
    pub fn image_size(&mut self, path: &Path, max_width: f32, max_height: f32) -> Option<(f32, f32)> {
        let index = self.load_image(path)?;
        Some(fit_box(self.images[index].aspect_ratio(), max_width, max_height))
    }

    fn load_image(&mut self, path: &Path) -> Option<usize> {
        if let Some(slot) = self.image_slots.get(path) {
            return *slot;
        }

        let slot = match RasterImage::open(path) {
            Ok(image) => {
                self.images.push(image);
                Some(self.images.len() - 1)
            }
            Err(e) => {
                log::warn!("Skipping image {}: {}", path.display(), e);
                None
            }
        };
        self.image_slots.insert(path.to_path_buf(), slot);
        slot
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Height of every page in the finished document
    pub fn page_height(&self) -> f32 {
        if self.geometry.is_continuous() {
            (self.extent + self.geometry.margin).max(self.geometry.height)
        } else {
            self.geometry.height
        }
    }

    /// Serialize to PDF bytes. The output carries no timestamps, so the same
    /// drawing calls always produce the same bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_height = self.page_height();

        let fonts = self.typography.register(&mut doc)?;
        let mut xobjects = Dictionary::new();
        for (index, image) in self.images.iter().enumerate() {
            let image_id = image.embed(&mut doc)?;
            xobjects.set(image_name(index), Object::Reference(image_id));
        }

        let resources_id = doc.add_object(Dictionary::from_iter(vec![
            ("Font", Object::Dictionary(fonts)),
            ("ExtGState", Object::Dictionary(opacity_states())),
            ("XObject", Object::Dictionary(xobjects)),
        ]));

        let mut page_refs = Vec::with_capacity(self.pages.len());
        for ops in &self.pages {
            let mut content = String::new();
            if let Some(text) = &self.watermark {
                content.push_str(&self.watermark_ops(text, page_height));
            }
            for op in ops {
                content.push_str(&self.render_op(op, page_height));
            }

            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
            let page_id = doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(self.geometry.width),
                        Object::Real(page_height),
                    ]),
                ),
                ("Contents", Object::Reference(content_id)),
                ("Resources", Object::Reference(resources_id)),
            ]));
            page_refs.push(Object::Reference(page_id));
        }

        let count = page_refs.len() as i64;
        let pages_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(page_refs)),
            ("Count", Object::Integer(count)),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    fn render_op(&self, op: &DrawOp, page_height: f32) -> String {
        match op {
            DrawOp::Text { x, y, style, text } => {
                let baseline = page_height - (y + style.size * TEXT_BASELINE_RATIO);
                format!(
                    "BT /{} {:.2} Tf {} {:.2} {:.2} Td ({}) Tj ET\n",
                    style.role.resource_name(),
                    style.size,
                    style.color.fill_op(),
                    x,
                    baseline,
                    escape_string(&self.typography.encode(text))
                )
            }
            DrawOp::Line {
                from,
                to,
                width,
                color,
            } => format!(
                "q {:.2} w {} {:.2} {:.2} m {:.2} {:.2} l S Q\n",
                width,
                color.stroke_op(),
                from.0,
                page_height - from.1,
                to.0,
                page_height - to.1
            ),
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
            } => {
                let paint = match (fill, stroke) {
                    (Some(_), Some(_)) => "B",
                    (Some(_), None) => "f",
                    (None, Some(_)) => "S",
                    (None, None) => return String::new(),
                };
                let mut ops = String::from("q 0.5 w ");
                if let Some(fill) = fill {
                    ops.push_str(&fill.fill_op());
                    ops.push(' ');
                }
                if let Some(stroke) = stroke {
                    ops.push_str(&stroke.stroke_op());
                    ops.push(' ');
                }
                ops.push_str(&format!(
                    "{:.2} {:.2} {:.2} {:.2} re {} Q\n",
                    x,
                    page_height - y - height,
                    width,
                    height,
                    paint
                ));
                ops
            }
            DrawOp::Image {
                index,
                x,
                y,
                width,
                height,
            } => format!(
                "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /{} Do Q\n",
                width,
                height,
                x,
                page_height - y - height,
                image_name(*index)
            ),
            DrawOp::CutLine { y, x_start, x_end } => {
                marks::cut_line(*x_start, *x_end, page_height - y)
            }
        }
    }

    /// Rotated translucent label centered on the page; opacity is restored
    /// before the state is popped
    fn watermark_ops(&self, text: &str, page_height: f32) -> String {
        let size = self.geometry.width * WATERMARK_SIZE_RATIO;
        let text_width = self.typography.measure(FontRole::Bold, text, size);
        let cap_height = size * 0.7;

        let angle = WATERMARK_ANGLE_DEG.to_radians();
        let (sin, cos) = angle.sin_cos();
        let (cx, cy) = (self.geometry.width / 2.0, page_height / 2.0);
        let origin_x = cx - cos * text_width / 2.0 + sin * cap_height / 2.0;
        let origin_y = cy - sin * text_width / 2.0 - cos * cap_height / 2.0;

        format!(
            "q /GW gs {} BT /{} {:.2} Tf {:.4} {:.4} {:.4} {:.4} {:.2} {:.2} Tm ({}) Tj ET /GN gs Q\n",
            Color::DANGER.fill_op(),
            FontRole::Bold.resource_name(),
            size,
            cos,
            sin,
            -sin,
            cos,
            origin_x,
            origin_y,
            escape_string(&self.typography.encode(text))
        )
    }
}

fn image_name(index: usize) -> String {
    format!("Im{index}")
}

/// Largest size with the given aspect ratio inside the box
fn fit_box(ratio: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    let (width, height) = (max_width, max_width / ratio);
    if height > max_height {
        (max_height * ratio, max_height)
    } else {
        (width, height)
    }
}

/// `GW` for the watermark, `GN` to return to full opacity
fn opacity_states() -> Dictionary {
    let state = |alpha: f32| {
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"ExtGState".to_vec())),
            ("ca", Object::Real(alpha)),
            ("CA", Object::Real(alpha)),
        ]))
    };
    Dictionary::from_iter(vec![("GW", state(WATERMARK_OPACITY)), ("GN", state(1.0))])
}

/// Escape encoded bytes for a PDF literal string. Bytes outside printable
/// ASCII are written as octal escapes so content streams stay ASCII.
fn escape_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &byte in bytes {
        match byte {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(char::from(byte));
            }
            32..=126 => out.push(char::from(byte)),
            _ => out.push_str(&format!("\\{byte:03o}")),
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
