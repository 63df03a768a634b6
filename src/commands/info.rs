use crate::naming::format_size;
use crate::pdf::{document::PdfInfo, PdfDocument};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: String,
    pub size_bytes: u64,
    #[serde(flatten)]
    pub info: PdfInfo,
}

pub fn report<P: AsRef<Path>>(path: P) -> Result<FileReport> {
    let path = path.as_ref();
    let size_bytes = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat file: {}", path.display()))?
        .len();
    let doc = PdfDocument::open(path)?;

    Ok(FileReport {
        path: path.display().to_string(),
        size_bytes,
        info: doc.get_info(),
    })
}

pub fn run<P: AsRef<Path>>(path: P, json: bool) -> Result<()> {
    let report = report(&path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let info = &report.info;
    println!("File: {}", report.path);
    println!("Size: {}", format_size(report.size_bytes));
    println!("Pages: {}", info.page_count);

    if let Some(title) = &info.title {
        println!("Title: {}", title);
    }
    if let Some(author) = &info.author {
        println!("Author: {}", author);
    }
    if let Some(subject) = &info.subject {
        println!("Subject: {}", subject);
    }
    if let Some(keywords) = &info.keywords {
        println!("Keywords: {}", keywords);
    }
    if let Some(creator) = &info.creator {
        println!("Creator: {}", creator);
    }
    if let Some(producer) = &info.producer {
        println!("Producer: {}", producer);
    }
    if let Some(creation_date) = &info.creation_date {
        println!("Created: {}", format_pdf_date(creation_date));
    }
    if let Some(mod_date) = &info.mod_date {
        println!("Modified: {}", format_pdf_date(mod_date));
    }

    Ok(())
}

/// "D:20240131120000Z" becomes "2024-01-31 12:00:00"; anything else is returned as-is.
fn format_pdf_date(date: &str) -> String {
    let Some(d) = date.strip_prefix("D:") else {
        return date.to_string();
    };
    if d.len() < 8 || !d.is_char_boundary(8) || !d[..8].bytes().all(|b| b.is_ascii_digit()) {
        return date.to_string();
    }

    let time = match d.get(8..14) {
        Some(t) if t.bytes().all(|b| b.is_ascii_digit()) => {
            format!(" {}:{}:{}", &t[0..2], &t[2..4], &t[4..6])
        }
        _ => String::new(),
    };
    format!("{}-{}-{}{}", &d[0..4], &d[4..6], &d[6..8], time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::tree::test_support::sample_pdf;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_pdf_date() {
        assert_eq!(format_pdf_date("D:20240131120503+01'00"), "2024-01-31 12:05:03");
        assert_eq!(format_pdf_date("D:20240131"), "2024-01-31");
        assert_eq!(format_pdf_date("yesterday"), "yesterday");
        assert_eq!(format_pdf_date("D:2024"), "D:2024");
    }

    #[test]
    fn test_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        let bytes = sample_pdf(2, "I");
        std::fs::write(&path, &bytes).unwrap();

        let report = report(&path).unwrap();
        assert_eq!(report.info.page_count, 2);
        assert_eq!(report.size_bytes, bytes.len() as u64);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["page_count"], 2);
    }
}
