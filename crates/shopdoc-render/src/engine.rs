//! Render entry points
//!
//! [`Renderer`] turns a request into PDF bytes on the calling thread.
//! [`RenderEngine`] runs the renderer on a blocking thread and hands the
//! result to the [`OutputWriter`].

use crate::asset::{AssetResolver, ResolutionObserver, SearchRoots};
use crate::canvas::Canvas;
use crate::config::EngineConfig;
use crate::format::PageGeometry;
use crate::layout::{LayoutEnv, layout_estimate, layout_invoice, layout_job_sheet};
use crate::output::{Clock, DocumentLocator, DocumentSink, FileNameHint, OutputWriter};
use crate::records::{Company, EstimateRecord, InvoiceRecord, JobSheetRecord};
use crate::types::*;
use crate::typography::Typography;
use chrono::FixedOffset;
use std::sync::Arc;

// =============================================================================
// Requests
// =============================================================================

/// One document to render
#[derive(Debug, Clone)]
pub enum DocumentRequest {
    JobSheet {
        record: Box<JobSheetRecord>,
        format: PaperFormat,
        copy: JobSheetCopy,
    },
    Invoice {
        record: Box<InvoiceRecord>,
        format: PaperFormat,
        /// Falls back to the record's own copy type, then the original
        copy: Option<InvoiceCopy>,
    },
    Estimate {
        record: Box<EstimateRecord>,
        format: PaperFormat,
    },
}

impl DocumentRequest {
    pub fn job_sheet(record: JobSheetRecord, format: PaperFormat, copy: JobSheetCopy) -> Self {
        Self::JobSheet {
            record: Box::new(record),
            format,
            copy,
        }
    }

    pub fn invoice(record: InvoiceRecord, format: PaperFormat, copy: Option<InvoiceCopy>) -> Self {
        Self::Invoice {
            record: Box::new(record),
            format,
            copy,
        }
    }

    pub fn estimate(record: EstimateRecord, format: PaperFormat) -> Self {
        Self::Estimate {
            record: Box::new(record),
            format,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::JobSheet { .. } => DocumentKind::JobSheet,
            Self::Invoice { .. } => DocumentKind::Invoice,
            Self::Estimate { .. } => DocumentKind::Estimate,
        }
    }

    pub fn format(&self) -> PaperFormat {
        match self {
            Self::JobSheet { format, .. }
            | Self::Invoice { format, .. }
            | Self::Estimate { format, .. } => *format,
        }
    }

    pub fn number(&self) -> &str {
        match self {
            Self::JobSheet { record, .. } => &record.job_sheet_number,
            Self::Invoice { record, .. } => &record.invoice_number,
            Self::Estimate { record, .. } => &record.estimate_number,
        }
    }

    /// Copy segment of the file name
    pub fn copy_label(&self) -> &'static str {
        match self {
            Self::JobSheet { copy, .. } => copy.label(),
            Self::Invoice { record, copy, .. } => invoice_copy(record, *copy).label(),
            Self::Estimate { .. } => EstimateCopy::Standard.label(),
        }
    }

    fn company(&self) -> &Company {
        match self {
            Self::JobSheet { record, .. } => &record.company,
            Self::Invoice { record, .. } => &record.company,
            Self::Estimate { record, .. } => &record.company,
        }
    }
}

fn invoice_copy(record: &InvoiceRecord, copy: Option<InvoiceCopy>) -> InvoiceCopy {
    copy.or(record.copy_type).unwrap_or_default()
}

/// A finished document, not yet stored
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub kind: DocumentKind,
    pub number: String,
    pub format: PaperFormat,
    pub copy_label: &'static str,
    pub page_count: usize,
    pub bytes: Vec<u8>,
}

/// A stored document and where to fetch it
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub locator: DocumentLocator,
    pub page_count: usize,
    pub byte_len: usize,
}

// =============================================================================
// Renderer
// =============================================================================

/// Synchronous renderer holding the process-wide typography and asset setup
#[derive(Debug, Clone)]
pub struct Renderer {
    typography: Typography,
    resolver: AssetResolver,
    offset: FixedOffset,
}

impl Renderer {
    /// Probe fonts and set up the logo search from the configuration
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let offset = config.display_offset().ok_or_else(|| {
            RenderError::Config(format!(
                "Display offset of {} minutes is out of range",
                config.display_offset_minutes
            ))
        })?;

        Ok(Self {
            typography: Typography::from_config(config),
            resolver: AssetResolver::new(SearchRoots::from_config(config)),
            offset,
        })
    }

    pub fn with_typography(mut self, typography: Typography) -> Self {
        self.typography = typography;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ResolutionObserver>) -> Self {
        self.resolver = self.resolver.with_observer(observer);
        self
    }

    pub fn typography(&self) -> &Typography {
        &self.typography
    }

    pub fn resolver(&self) -> &AssetResolver {
        &self.resolver
    }

    /// Lay out and serialize one document
    pub fn render(&self, request: &DocumentRequest) -> Result<RenderedPdf> {
        let kind = request.kind();
        let format = request.format();
        let geometry = PageGeometry::for_document(format, kind);
        let mut canvas = Canvas::new(geometry, self.typography.clone());

        let env = LayoutEnv {
            logo: self.resolver.resolve(request.company().logo.as_deref()),
            offset: self.offset,
        };

        match request {
            DocumentRequest::JobSheet { record, copy, .. } => {
                layout_job_sheet(&mut canvas, record, *copy, &env);
            }
            DocumentRequest::Invoice { record, copy, .. } => {
                layout_invoice(&mut canvas, record, invoice_copy(record, *copy), &env);
            }
            DocumentRequest::Estimate { record, .. } => {
                layout_estimate(&mut canvas, record, EstimateCopy::Standard, &env);
            }
        }

        let page_count = canvas.page_count();
        let bytes = canvas.finish()?;
        log::debug!(
            "Rendered {} {} ({}, {}): {} page(s), {} bytes",
            kind.file_prefix(),
            request.number(),
            format,
            request.copy_label(),
            page_count,
            bytes.len()
        );

        Ok(RenderedPdf {
            kind,
            number: request.number().to_string(),
            format,
            copy_label: request.copy_label(),
            page_count,
            bytes,
        })
    }
}

// =============================================================================
// Async Engine
// =============================================================================

/// Renders off the async executor and stores the result
#[derive(Debug, Clone)]
pub struct RenderEngine {
    renderer: Arc<Renderer>,
    writer: OutputWriter,
}

impl RenderEngine {
    /// Filesystem output at the configured storage root, system clock
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Ok(Self::from_parts(Renderer::new(config)?, OutputWriter::from_config(config)))
    }

    pub fn from_parts(renderer: Renderer, writer: OutputWriter) -> Self {
        Self {
            renderer: Arc::new(renderer),
            writer,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DocumentSink>) -> Self {
        self.writer = self.writer.with_sink(sink);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.writer = self.writer.with_clock(clock);
        self
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Create the output directories
    pub async fn prepare(&self) {
        self.writer.prepare().await;
    }

    /// Render without storing
    pub async fn render(&self, request: DocumentRequest) -> Result<RenderedPdf> {
        let renderer = Arc::clone(&self.renderer);
        tokio::task::spawn_blocking(move || renderer.render(&request)).await?
    }

    /// Render and store, returning the locator
    pub async fn generate(&self, request: DocumentRequest) -> Result<GeneratedDocument> {
        let RenderedPdf {
            kind,
            number,
            format,
            copy_label,
            page_count,
            bytes,
        } = self.render(request).await?;
        let byte_len = bytes.len();
        let hint = FileNameHint {
            kind,
            number: &number,
            format,
            copy_label,
        };
        let locator = self.writer.write(&hint, bytes).await?;

        Ok(GeneratedDocument {
            locator,
            page_count,
            byte_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_copy_falls_back_to_record() {
        let record = InvoiceRecord {
            copy_type: Some(InvoiceCopy::Duplicate),
            ..Default::default()
        };
        let request = DocumentRequest::invoice(record.clone(), PaperFormat::A4, None);
        assert_eq!(request.copy_label(), "DUPLICATE");

        let request = DocumentRequest::invoice(record, PaperFormat::A4, Some(InvoiceCopy::Customer));
        assert_eq!(request.copy_label(), "CUSTOMER");

        let request = DocumentRequest::invoice(InvoiceRecord::default(), PaperFormat::A4, None);
        assert_eq!(request.copy_label(), "ORIGINAL");
    }

    #[test]
    fn test_request_accessors() {
        let record = EstimateRecord {
            estimate_number: "EST-9".into(),
            ..Default::default()
        };
        let request = DocumentRequest::estimate(record, PaperFormat::Thermal);
        assert_eq!(request.kind(), DocumentKind::Estimate);
        assert_eq!(request.number(), "EST-9");
        assert_eq!(request.format(), PaperFormat::Thermal);
        assert_eq!(request.copy_label(), "STANDARD");
    }
}
