use crate::types::*;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables that mark a serverless deployment with a read-only
/// application directory
const EPHEMERAL_MARKERS: [&str; 3] = ["VERCEL", "AWS_LAMBDA_FUNCTION_NAME", "NETLIFY"];

/// Process-wide engine configuration, supplied once at start-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    // Output
    pub storage_root: PathBuf,
    pub is_ephemeral_environment: bool,
    pub base_url: String,

    // Assets
    pub fonts_directory: PathBuf,
    pub regular_font_file: String,
    pub bold_font_file: String,
    pub logos_directory: PathBuf,
    pub public_directory: PathBuf,
    pub app_root: PathBuf,
    pub default_logo: Option<PathBuf>,

    // Presentation
    /// Offset from UTC used when printing dates, in minutes
    pub display_offset_minutes: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("public"),
            is_ephemeral_environment: false,
            base_url: "http://localhost:5000".to_string(),
            fonts_directory: PathBuf::from("assets/fonts"),
            regular_font_file: "NotoSans-Regular.ttf".to_string(),
            bold_font_file: "NotoSans-Bold.ttf".to_string(),
            logos_directory: PathBuf::from("public/uploads/logos"),
            public_directory: PathBuf::from("public"),
            app_root: PathBuf::from("."),
            default_logo: None,
            display_offset_minutes: 330,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let config: Self = serde_json::from_slice(&bytes)
            .map_err(|e| RenderError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| RenderError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Defaults overridden by `SHOPDOC_*` process environment variables
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Apply `SHOPDOC_*` overrides read through `lookup`
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("SHOPDOC_STORAGE_ROOT") {
            self.storage_root = PathBuf::from(v);
        }
        if let Some(v) = non_empty("SHOPDOC_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = non_empty("SHOPDOC_FONTS_DIR") {
            self.fonts_directory = PathBuf::from(v);
        }
        if let Some(v) = non_empty("SHOPDOC_LOGOS_DIR") {
            self.logos_directory = PathBuf::from(v);
        }
        if let Some(v) = non_empty("SHOPDOC_PUBLIC_DIR") {
            self.public_directory = PathBuf::from(v);
        }
        if let Some(v) = non_empty("SHOPDOC_APP_ROOT") {
            self.app_root = PathBuf::from(v);
        }
        if let Some(v) = non_empty("SHOPDOC_DEFAULT_LOGO") {
            self.default_logo = Some(PathBuf::from(v));
        }
        if let Some(v) = non_empty("SHOPDOC_DISPLAY_OFFSET_MINUTES") {
            match v.trim().parse() {
                Ok(minutes) => self.display_offset_minutes = minutes,
                Err(_) => log::warn!("Ignoring invalid SHOPDOC_DISPLAY_OFFSET_MINUTES '{v}'"),
            }
        }

        match non_empty("SHOPDOC_EPHEMERAL") {
            Some(v) => self.is_ephemeral_environment = matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            ),
            None => {
                if EPHEMERAL_MARKERS.iter().any(|key| non_empty(key).is_some()) {
                    self.is_ephemeral_environment = true;
                }
            }
        }

        self
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(RenderError::Config("Base URL must not be empty".to_string()));
        }

        if self.regular_font_file.is_empty() || self.bold_font_file.is_empty() {
            return Err(RenderError::Config(
                "Font file names must not be empty".to_string(),
            ));
        }

        if self.display_offset().is_none() {
            return Err(RenderError::Config(format!(
                "Display offset of {} minutes is out of range",
                self.display_offset_minutes
            )));
        }

        Ok(())
    }

    /// Root that `uploads/` lives under. Ephemeral deployments write to the
    /// system temp directory because the application tree is read-only.
    pub fn resolved_storage_root(&self) -> PathBuf {
        if self.is_ephemeral_environment {
            std::env::temp_dir().join("shopdoc")
        } else {
            self.storage_root.clone()
        }
    }

    pub fn default_logo_path(&self) -> PathBuf {
        self.default_logo
            .clone()
            .unwrap_or_else(|| self.logos_directory.join("default-logo.png"))
    }

    pub fn regular_font_path(&self) -> PathBuf {
        self.fonts_directory.join(&self.regular_font_file)
    }

    pub fn bold_font_path(&self) -> PathBuf {
        self.fonts_directory.join(&self.bold_font_file)
    }

    pub fn display_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.display_offset_minutes.checked_mul(60)?)
    }
}
