pub mod asset;
pub mod canvas;
mod config;
pub mod constants;
mod engine;
mod format;
pub mod layout;
pub mod money;
pub mod output;
mod records;
mod stream;
mod types;
pub mod typography;

pub use asset::{AssetResolver, RecordingObserver, ResolutionObserver, SearchRoots};
pub use config::EngineConfig;
pub use engine::{DocumentRequest, GeneratedDocument, RenderEngine, RenderedPdf, Renderer};
pub use format::PageGeometry;
pub use money::{format_currency, number_to_words};
pub use output::{DocumentLocator, DocumentSink, FileSystemSink, MemorySink, OutputWriter};
pub use records::*;
pub use types::*;
pub use typography::Typography;
