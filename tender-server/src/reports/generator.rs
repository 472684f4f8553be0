//! Report generation
//!
//! Renders a statutory template for one tender and writes the result to
//! the outputs directory. LaTeX source is always produced; PDF goes
//! through `pdflatex`, DOCX and HTML through `pandoc`. Missing or
//! failing external tools surface as one terminal error carrying the
//! tool's stderr.

use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tender_common::config::DataPaths;
use tender_common::db::Tender;
use tender_common::ranking::RankedBid;
use tender_common::{Error, Result};
use tokio::process::Command;
use tracing::info;

use super::{template, DocumentType, OutputFormat};

/// A generated document on disk
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedReport {
    pub document: DocumentType,
    pub format: OutputFormat,
    pub filename: String,
    pub path: PathBuf,
}

/// NIT numbers contain '/' which cannot appear in a filename
fn sanitize_for_filename(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '-' })
        .collect()
}

pub async fn generate(
    paths: &DataPaths,
    document: DocumentType,
    format: OutputFormat,
    tender: &Tender,
    bids: &[RankedBid],
) -> Result<GeneratedReport> {
    let template_path = paths.templates_dir().join(document.template_file());
    let template_source = tokio::fs::read_to_string(&template_path)
        .await
        .map_err(|e| {
            Error::Template(format!(
                "template {} not readable: {}",
                template_path.display(),
                e
            ))
        })?;

    let vars = template::build_context(tender, bids);
    let rendered = template::render(&template_source, &vars)?;

    let outputs_dir = paths.outputs_dir();
    tokio::fs::create_dir_all(&outputs_dir).await?;

    let stem = format!(
        "{}_{}_{}",
        document.as_str(),
        sanitize_for_filename(&tender.nit_number),
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let tex_path = outputs_dir.join(format!("{}.tex", stem));
    tokio::fs::write(&tex_path, &rendered).await?;
    info!("Rendered {} for tender {} -> {}", document.as_str(), tender.id, tex_path.display());

    let final_path = match format {
        OutputFormat::Tex => tex_path.clone(),
        OutputFormat::Pdf => run_pdflatex(&outputs_dir, &tex_path).await?,
        OutputFormat::Docx | OutputFormat::Html => {
            run_pandoc(&outputs_dir, &tex_path, format.extension()).await?
        }
    };

    let filename = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}.{}", stem, format.extension()));

    Ok(GeneratedReport {
        document,
        format,
        filename,
        path: final_path,
    })
}

async fn run_pdflatex(outputs_dir: &Path, tex_path: &Path) -> Result<PathBuf> {
    let output = Command::new("pdflatex")
        .arg("-interaction=nonstopmode")
        .arg("-halt-on-error")
        .arg("-output-directory")
        .arg(outputs_dir)
        .arg(tex_path)
        .output()
        .await
        .map_err(|e| Error::ExternalTool(format!("failed to run pdflatex: {}", e)))?;

    if !output.status.success() {
        return Err(Error::ExternalTool(format!(
            "pdflatex failed: {}",
            tool_diagnostics(&output.stdout, &output.stderr)
        )));
    }

    let pdf_path = tex_path.with_extension("pdf");
    if !pdf_path.exists() {
        return Err(Error::ExternalTool(
            "pdflatex reported success but produced no PDF".to_string(),
        ));
    }
    Ok(pdf_path)
}

async fn run_pandoc(outputs_dir: &Path, tex_path: &Path, extension: &str) -> Result<PathBuf> {
    let out_path = tex_path.with_extension(extension);
    let output = Command::new("pandoc")
        .arg(tex_path)
        .arg("-o")
        .arg(&out_path)
        .current_dir(outputs_dir)
        .output()
        .await
        .map_err(|e| Error::ExternalTool(format!("failed to run pandoc: {}", e)))?;

    if !output.status.success() {
        return Err(Error::ExternalTool(format!(
            "pandoc failed: {}",
            tool_diagnostics(&output.stdout, &output.stderr)
        )));
    }
    Ok(out_path)
}

/// Last part of the tool output, which is where LaTeX puts the error
fn tool_diagnostics(stdout: &[u8], stderr: &[u8]) -> String {
    let text = if stderr.is_empty() { stdout } else { stderr };
    let text = String::from_utf8_lossy(text);
    let trimmed = text.trim();
    if trimmed.len() > 500 {
        format!("...{}", &trimmed[trimmed.len() - 500..])
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_never_contain_path_separators() {
        assert_eq!(sanitize_for_filename("27/2024-25"), "27-2024-25");
        assert_eq!(sanitize_for_filename("NIT-27/2024"), "NIT-27-2024");
        assert!(!sanitize_for_filename("a/b\\c:d").contains('/'));
    }
}
