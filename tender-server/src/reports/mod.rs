//! Statutory document generation
//!
//! Tender paperwork is produced from LaTeX templates stored in the
//! templates directory. The flow is: build a substitution context from
//! the tender and its ranked bids, render the template, write the .tex
//! into the outputs directory and, when asked, hand it to pdflatex or
//! pandoc for conversion.

pub mod defaults;
pub mod generator;
pub mod template;

pub use defaults::ensure_default_templates;
pub use generator::{generate, GeneratedReport};

use serde::{Deserialize, Serialize};
use tender_common::{Error, Result};

/// Statutory document kinds, one template file each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    ComparativeStatement,
    LetterOfAcceptance,
    ScrutinySheet,
    WorkOrder,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::ComparativeStatement => "comparative_statement",
            DocumentType::LetterOfAcceptance => "letter_of_acceptance",
            DocumentType::ScrutinySheet => "scrutiny_sheet",
            DocumentType::WorkOrder => "work_order",
        }
    }

    pub fn template_file(&self) -> String {
        format!("{}.tex", self.as_str())
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "comparative_statement" => Ok(DocumentType::ComparativeStatement),
            "letter_of_acceptance" => Ok(DocumentType::LetterOfAcceptance),
            "scrutiny_sheet" => Ok(DocumentType::ScrutinySheet),
            "work_order" => Ok(DocumentType::WorkOrder),
            other => Err(Error::InvalidInput(format!(
                "unknown document type: {}",
                other
            ))),
        }
    }
}

/// Requested output format for a generated document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Tex,
    Pdf,
    Docx,
    Html,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Tex
    }
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Tex => "tex",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
            OutputFormat::Html => "html",
        }
    }
}
