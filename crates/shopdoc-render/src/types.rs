use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Font error: {0}")]
    Font(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// The three business documents the engine knows how to lay out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    JobSheet,
    Invoice,
    Estimate,
}

impl DocumentKind {
    /// Leading segment of generated file names
    pub fn file_prefix(self) -> &'static str {
        match self {
            DocumentKind::JobSheet => "jobsheet",
            DocumentKind::Invoice => "invoice",
            DocumentKind::Estimate => "estimate",
        }
    }

    /// Storage directory under `uploads/`
    pub fn category(self) -> &'static str {
        match self {
            DocumentKind::JobSheet => "jobsheets",
            DocumentKind::Invoice => "invoices",
            DocumentKind::Estimate => "estimates",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DocumentKind::JobSheet => "JOB SHEET",
            DocumentKind::Invoice => "TAX INVOICE",
            DocumentKind::Estimate => "ESTIMATE",
        }
    }
}

/// Physical paper formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaperFormat {
    #[default]
    #[serde(rename = "a4")]
    A4,
    #[serde(rename = "a5")]
    A5,
    /// 3-inch receipt roll
    #[serde(rename = "thermal")]
    Thermal,
    /// 2-inch receipt roll
    #[serde(rename = "thermal-2")]
    Thermal2,
}

impl PaperFormat {
    pub const ALL: [PaperFormat; 4] = [
        PaperFormat::A4,
        PaperFormat::A5,
        PaperFormat::Thermal,
        PaperFormat::Thermal2,
    ];

    /// Parse a format key. Unknown keys fall back to A4 so a document can
    /// always be produced.
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "a4" => PaperFormat::A4,
            "a5" => PaperFormat::A5,
            "thermal" => PaperFormat::Thermal,
            "thermal-2" | "thermal2" => PaperFormat::Thermal2,
            other => {
                log::warn!("Unknown paper format '{other}', using A4");
                PaperFormat::A4
            }
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            PaperFormat::A4 => "a4",
            PaperFormat::A5 => "a5",
            PaperFormat::Thermal => "thermal",
            PaperFormat::Thermal2 => "thermal-2",
        }
    }

    /// Upper-case segment used in file names
    pub fn label(self) -> &'static str {
        match self {
            PaperFormat::A4 => "A4",
            PaperFormat::A5 => "A5",
            PaperFormat::Thermal => "THERMAL",
            PaperFormat::Thermal2 => "THERMAL-2",
        }
    }

    pub fn is_thermal(self) -> bool {
        matches!(self, PaperFormat::Thermal | PaperFormat::Thermal2)
    }

    /// A5 and receipt formats draw with proportionally reduced sizes
    pub fn is_compact(self) -> bool {
        !matches!(self, PaperFormat::A4)
    }
}

impl fmt::Display for PaperFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Audience variants of a job sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSheetCopy {
    #[default]
    Customer,
    Office,
    /// Customer and office copies on one sheet, separated by a cut line
    Both,
}

impl JobSheetCopy {
    pub const ALL: [JobSheetCopy; 3] =
        [JobSheetCopy::Customer, JobSheetCopy::Office, JobSheetCopy::Both];

    /// Parse a copy key, defaulting to the customer copy
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "customer" => JobSheetCopy::Customer,
            "office" => JobSheetCopy::Office,
            "both" => JobSheetCopy::Both,
            other => {
                log::warn!("Unknown job sheet copy type '{other}', using customer copy");
                JobSheetCopy::Customer
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobSheetCopy::Customer => "CUSTOMER",
            JobSheetCopy::Office => "OFFICE",
            JobSheetCopy::Both => "BOTH",
        }
    }
}

/// Audience variants of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceCopy {
    #[default]
    Original,
    Duplicate,
    Customer,
}

impl InvoiceCopy {
    pub const ALL: [InvoiceCopy; 3] = [
        InvoiceCopy::Original,
        InvoiceCopy::Duplicate,
        InvoiceCopy::Customer,
    ];

    /// Parse a copy key, defaulting to the original
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "original" => InvoiceCopy::Original,
            "duplicate" => InvoiceCopy::Duplicate,
            "customer" => InvoiceCopy::Customer,
            other => {
                log::warn!("Unknown invoice copy type '{other}', using original");
                InvoiceCopy::Original
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InvoiceCopy::Original => "ORIGINAL",
            InvoiceCopy::Duplicate => "DUPLICATE",
            InvoiceCopy::Customer => "CUSTOMER",
        }
    }

    /// Banner printed in the identification bar
    pub fn banner(self) -> &'static str {
        match self {
            InvoiceCopy::Original => "ORIGINAL FOR RECIPIENT",
            InvoiceCopy::Duplicate => "DUPLICATE COPY",
            InvoiceCopy::Customer => "CUSTOMER COPY",
        }
    }
}

/// Estimates have a single audience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateCopy {
    #[default]
    Standard,
}

impl EstimateCopy {
    pub fn label(self) -> &'static str {
        match self {
            EstimateCopy::Standard => "STANDARD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_keys_fall_back_to_a4() {
        assert_eq!(PaperFormat::from_key("Thermal-2"), PaperFormat::Thermal2);
        assert_eq!(PaperFormat::from_key(" a5 "), PaperFormat::A5);
        assert_eq!(PaperFormat::from_key("letter"), PaperFormat::A4);
        for format in PaperFormat::ALL {
            assert_eq!(PaperFormat::from_key(format.key()), format);
        }
    }

    #[test]
    fn test_copy_keys_fall_back_to_defaults() {
        assert_eq!(JobSheetCopy::from_key("BOTH"), JobSheetCopy::Both);
        assert_eq!(JobSheetCopy::from_key("archive"), JobSheetCopy::Customer);
        assert_eq!(InvoiceCopy::from_key("duplicate"), InvoiceCopy::Duplicate);
        assert_eq!(InvoiceCopy::from_key(""), InvoiceCopy::Original);
    }

    #[test]
    fn test_format_serde_keys() {
        let json = serde_json::to_string(&PaperFormat::Thermal2).unwrap();
        assert_eq!(json, "\"thermal-2\"");
        let parsed: InvoiceCopy = serde_json::from_str("\"customer\"").unwrap();
        assert_eq!(parsed, InvoiceCopy::Customer);
    }

    #[test]
    fn test_kind_storage_names() {
        assert_eq!(DocumentKind::JobSheet.category(), "jobsheets");
        assert_eq!(DocumentKind::Estimate.file_prefix(), "estimate");
        assert!(PaperFormat::Thermal.is_thermal());
        assert!(!PaperFormat::A5.is_thermal());
    }
}
