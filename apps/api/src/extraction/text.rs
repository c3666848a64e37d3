//! Text Extractor: turns an uploaded PDF or DOCX into plain text.
//!
//! Every failure surfaces as an `ExtractionError`. The underlying parsers can
//! panic on hostile files, so both are run under `catch_unwind`.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::extraction::ExtractionError;

const PDF_SIGNATURE: &[u8] = b"%PDF-";
/// Readers tolerate leading garbage before the PDF header, up to this offset.
const PDF_SIGNATURE_WINDOW: usize = 1024;
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

const PDF_MIME: &str = "application/pdf";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolves the format from a file name's extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            _ => Err(ExtractionError::UnsupportedFormat(filename.to_string())),
        }
    }

    pub fn from_mime(mime: &str) -> Result<Self, ExtractionError> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence {
            PDF_MIME => Ok(DocumentFormat::Pdf),
            DOCX_MIME => Ok(DocumentFormat::Docx),
            other => Err(ExtractionError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => PDF_MIME,
            DocumentFormat::Docx => DOCX_MIME,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }

    /// Checks the byte signature against the declared format.
    fn matches_signature(&self, bytes: &[u8]) -> bool {
        match self {
            DocumentFormat::Pdf => {
                let window = &bytes[..bytes.len().min(PDF_SIGNATURE_WINDOW)];
                window
                    .windows(PDF_SIGNATURE.len())
                    .any(|w| w == PDF_SIGNATURE)
            }
            DocumentFormat::Docx => bytes.starts_with(ZIP_SIGNATURE),
        }
    }
}

/// Extracts plain text from a document buffer of the declared format.
///
/// Fails with `CorruptDocument` when the bytes do not parse as the declared
/// format and with `EmptyDocument` when nothing but whitespace comes out.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractionError> {
    if bytes.is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }
    if !format.matches_signature(bytes) {
        return Err(ExtractionError::CorruptDocument(format!(
            "content is not a valid {} file",
            format.extension()
        )));
    }

    let text = match format {
        DocumentFormat::Pdf => guarded("pdf", || extract_pdf(bytes))?,
        DocumentFormat::Docx => guarded("docx", || extract_docx(bytes))?,
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }
    Ok(text.to_string())
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::CorruptDocument(format!("pdf parse failed: {e}")))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| ExtractionError::CorruptDocument(format!("docx parse failed: {e}")))?;

    let mut text = String::new();
    for child in &docx.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(paragraph) => push_paragraph(&mut text, paragraph),
            docx_rs::DocumentChild::Table(table) => push_table(&mut text, table),
            _ => {}
        }
    }
    Ok(text)
}

fn push_paragraph(text: &mut String, paragraph: &docx_rs::Paragraph) {
    push_runs(text, &paragraph.children);
    text.push('\n');
}

/// Run text, including runs nested in hyperlinks.
fn push_runs(text: &mut String, children: &[docx_rs::ParagraphChild]) {
    for child in children {
        match child {
            docx_rs::ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    if let docx_rs::RunChild::Text(t) = run_child {
                        text.push_str(&t.text);
                    }
                }
            }
            docx_rs::ParagraphChild::Hyperlink(link) => push_runs(text, &link.children),
            _ => {}
        }
    }
}

/// Every cell paragraph becomes its own line, row by row. Nested tables are
/// walked in place.
fn push_table(text: &mut String, table: &docx_rs::Table) {
    for docx_rs::TableChild::TableRow(row) in &table.rows {
        for docx_rs::TableRowChild::TableCell(cell) in &row.cells {
            for content in &cell.children {
                match content {
                    docx_rs::TableCellContent::Paragraph(paragraph) => {
                        push_paragraph(text, paragraph)
                    }
                    docx_rs::TableCellContent::Table(nested) => push_table(text, nested),
                    _ => {}
                }
            }
        }
    }
}

/// Runs a parser, converting a panic into `CorruptDocument`.
fn guarded<F>(kind: &str, parse: F) -> Result<String, ExtractionError>
where
    F: FnOnce() -> Result<String, ExtractionError>,
{
    panic::catch_unwind(AssertUnwindSafe(parse)).unwrap_or_else(|_| {
        Err(ExtractionError::CorruptDocument(format!(
            "{kind} parser aborted on malformed input"
        )))
    })
}
