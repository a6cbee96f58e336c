//! Output renderers for dirbundle.
//!
//! Each renderer is a [`BundleSink`] writing to any [`Write`]r:
//!
//! - [`TextRenderer`]: indented listing and `// File:` sections
//! - [`JsonRenderer`]: one JSON object with `structure` and `contents`

mod json;
mod text;

use std::io::Write;

use dirbundle_core::BundleSink;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use json::{JsonRenderer, write_escaped};
pub use text::{TextRenderer, size_kb};

/// Available output formats.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text/plain",
            OutputFormat::Json => "application/json",
        }
    }
}

/// Presentation options shared by the renderers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Prefix listed files with their size in KB (text output).
    #[serde(default)]
    pub show_size: bool,
}

/// Build the renderer for `format` writing to `out`.
pub fn renderer_for<'w, W>(format: OutputFormat, out: W, options: RenderOptions) -> Box<dyn BundleSink + 'w>
where
    W: Write + 'w,
{
    match format {
        OutputFormat::Text => Box::new(TextRenderer::new(out, options)),
        OutputFormat::Json => Box::new(JsonRenderer::new(out)),
    }
}
