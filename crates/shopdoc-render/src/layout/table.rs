//! Fixed-row item tables

use super::{LayoutContext, Style, centered_in_band};
use crate::canvas::{Align, Canvas, Color, TextStyle};
use crate::constants::{TABLE_HEADER_HEIGHT, TABLE_ROW_HEIGHT};

/// Column definition; widths are relative weights of the table width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub title: &'static str,
    pub weight: f32,
    pub align: Align,
}

impl Column {
    pub const fn left(title: &'static str, weight: f32) -> Self {
        Self {
            title,
            weight,
            align: Align::Left,
        }
    }

    pub const fn right(title: &'static str, weight: f32) -> Self {
        Self {
            title,
            weight,
            align: Align::Right,
        }
    }

    pub const fn center(title: &'static str, weight: f32) -> Self {
        Self {
            title,
            weight,
            align: Align::Center,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    x: f32,
    width: f32,
    align: Align,
    title: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    x: f32,
    width: f32,
    cells: Vec<Cell>,
    padding: f32,
    header_height: f32,
    row_height: f32,
    header_text: TextStyle,
    row_text: TextStyle,
}

impl Table {
    pub fn new(x: f32, width: f32, columns: &[Column], style: &Style) -> Self {
        Self::with_heights(
            x,
            width,
            columns,
            style,
            style.s(TABLE_HEADER_HEIGHT),
            style.s(TABLE_ROW_HEIGHT),
        )
    }

    pub fn with_heights(
        x: f32,
        width: f32,
        columns: &[Column],
        style: &Style,
        header_height: f32,
        row_height: f32,
    ) -> Self {
        let total_weight: f32 = columns.iter().map(|c| c.weight).sum::<f32>().max(f32::EPSILON);
        let mut cursor = x;
        let cells = columns
            .iter()
            .map(|column| {
                let cell_width = width * column.weight / total_weight;
                let cell = Cell {
                    x: cursor,
                    width: cell_width,
                    align: column.align,
                    title: column.title,
                };
                cursor += cell_width;
                cell
            })
            .collect();

        Self {
            x,
            width,
            cells,
            padding: style.s(4.0),
            header_height,
            row_height,
            header_text: TextStyle::bold(style.s(8.0)).color(Color::WHITE),
            row_text: TextStyle::regular(style.s(8.5)),
        }
    }

    pub fn header_height(&self) -> f32 {
        self.header_height
    }

    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    pub fn draw_header(&self, canvas: &mut Canvas, ctx: LayoutContext) -> LayoutContext {
        canvas.rect(
            self.x,
            ctx.y,
            self.width,
            self.header_height,
            Some(Color::ACCENT),
            None,
        );
        let titles: Vec<String> = self.cells.iter().map(|c| c.title.to_string()).collect();
        self.draw_cells(canvas, ctx.y, self.header_height, &titles, self.header_text);
        ctx.advance(self.header_height)
    }

    pub fn draw_row(&self, canvas: &mut Canvas, ctx: LayoutContext, values: &[String]) -> LayoutContext {
        self.draw_cells(canvas, ctx.y, self.row_height, values, self.row_text);
        canvas.rule(self.x, self.x + self.width, ctx.y + self.row_height);
        ctx.advance(self.row_height)
    }

    /// A row whose single value spans every column
    pub fn draw_note_row(&self, canvas: &mut Canvas, ctx: LayoutContext, note: &str) -> LayoutContext {
        let style = self.row_text.color(Color::GREY);
        let top = centered_in_band(ctx.y, self.row_height, style);
        canvas.text_fitted(
            self.x + self.padding,
            top,
            self.width - 2.0 * self.padding,
            note,
            style,
        );
        canvas.rule(self.x, self.x + self.width, ctx.y + self.row_height);
        ctx.advance(self.row_height)
    }

    fn draw_cells(&self, canvas: &mut Canvas, y: f32, height: f32, values: &[String], style: TextStyle) {
        let top = centered_in_band(y, height, style);
        for (cell, value) in self.cells.iter().zip(values) {
            let inner = (cell.width - 2.0 * self.padding).max(0.0);
            let fitted = canvas.fit(value, style, inner);
            let anchor = match cell.align {
                Align::Left => cell.x + self.padding,
                Align::Center => cell.x + cell.width / 2.0,
                Align::Right => cell.x + cell.width - self.padding,
            };
            canvas.text(anchor, top, &fitted, style.align(cell.align));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PageGeometry;
    use crate::types::{DocumentKind, PaperFormat};
    use crate::typography::Typography;

    #[test]
    fn test_column_weights_fill_width() {
        let geometry = PageGeometry::for_document(PaperFormat::A4, DocumentKind::Invoice);
        let style = Style::for_geometry(&geometry);
        let table = Table::new(
            40.0,
            500.0,
            &[Column::left("A", 1.0), Column::right("B", 3.0)],
            &style,
        );
        assert_eq!(table.cells[0].width, 125.0);
        assert_eq!(table.cells[1].x, 165.0);
        assert_eq!(table.cells[1].width, 375.0);
    }

    #[test]
    fn test_rows_advance_by_row_height() {
        let geometry = PageGeometry::for_document(PaperFormat::A4, DocumentKind::Invoice);
        let style = Style::for_geometry(&geometry);
        let mut canvas = Canvas::new(geometry, Typography::standard());
        let table = Table::new(40.0, 500.0, &[Column::left("Item", 1.0)], &style);

        let ctx = LayoutContext::start(&geometry);
        let after_header = table.draw_header(&mut canvas, ctx);
        let after_row = table.draw_row(&mut canvas, after_header, &["Screen".to_string()]);
        assert_eq!(after_header.y, 40.0 + TABLE_HEADER_HEIGHT);
        assert_eq!(after_row.y, 40.0 + TABLE_HEADER_HEIGHT + TABLE_ROW_HEIGHT);
        assert_eq!(canvas.page_texts(0), vec!["Item", "Screen"]);
    }
}
