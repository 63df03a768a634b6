//! Output file names and human-readable sizes.

use regex::Regex;
use std::sync::OnceLock;

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid regex"))
}

/// Display name without a trailing ".pdf" (any case).
pub fn pdf_stem(name: &str) -> &str {
    let len = name.len();
    if len >= 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".pdf") {
        &name[..len - 4]
    } else {
        name
    }
}

/// Turn user-supplied text into a safe file name ending in ".pdf".
pub fn output_file_name(base: &str, fallback: &str) -> String {
    let base = pdf_stem(base.trim());
    let base = if base.is_empty() { fallback } else { base };
    format!("{}.pdf", unsafe_chars().replace_all(base, "_"))
}

/// "0 Bytes", "512 Bytes", "1.5 KB", "2 MB": base 1024, at most two decimals.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
