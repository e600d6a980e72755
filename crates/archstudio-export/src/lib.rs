//! Text projections of an archstudio diagram.
//!
//! Every renderer is a pure function of the diagram's current contents, so
//! calling one twice on an unchanged diagram yields identical output.

use std::path::Path;

use anyhow::{Context, Result};
use archstudio_core::Diagram;

pub mod json;
pub mod mermaid;
pub mod plantuml;
pub mod svg;

pub use json::{DiagramDump, ExportOptions};
pub use svg::SvgOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Mermaid,
    PlantUml,
    Json,
    Svg,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Mermaid,
        ExportFormat::PlantUml,
        ExportFormat::Json,
        ExportFormat::Svg,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Mermaid => "mermaid",
            ExportFormat::PlantUml => "plantuml",
            ExportFormat::Json => "json",
            ExportFormat::Svg => "svg",
        }
    }

    /// Conventional file extension
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Mermaid => "mmd",
            ExportFormat::PlantUml => "puml",
            ExportFormat::Json => "json",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ExportFormat::Mermaid => ExportFormat::PlantUml,
            ExportFormat::PlantUml => ExportFormat::Json,
            ExportFormat::Json => ExportFormat::Svg,
            ExportFormat::Svg => ExportFormat::Mermaid,
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s) || f.extension().eq_ignore_ascii_case(s))
            .with_context(|| format!("Unknown export format: {s}"))
    }
}

/// Render `diagram` in the requested format
pub fn export(format: ExportFormat, diagram: &Diagram, options: ExportOptions) -> Result<String> {
    let text = match format {
        ExportFormat::Mermaid => mermaid::render(diagram.elements(), diagram.connections()),
        ExportFormat::PlantUml => plantuml::render(diagram.elements(), diagram.connections()),
        ExportFormat::Json => json::render(&diagram.snapshot(), options)?,
        ExportFormat::Svg => svg::render(diagram, SvgOptions::default()),
    };
    tracing::info!(format = %format, bytes = text.len(), "exported diagram");
    Ok(text)
}

/// Render and write to `path`
pub fn save(path: &Path, format: ExportFormat, diagram: &Diagram, options: ExportOptions) -> Result<()> {
    let text = export(format, diagram, options)?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
