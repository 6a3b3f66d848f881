use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1252;

use crate::error::{Result, XlDiffError};

/// Longest sheet name Excel accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

pub fn read_text_best_effort(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| XlDiffError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(err) => {
            let (res, _, _) = WINDOWS_1252.decode(err.as_bytes());
            res.into_owned()
        }
    };
    match content.strip_prefix('\u{feff}') {
        Some(stripped) => Ok(stripped.to_string()),
        None => Ok(content),
    }
}

/// Spreadsheet-style letters for a 1-based column index: 1 -> A, 27 -> AA.
pub fn column_letter(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Replace characters Excel rejects in sheet names and cut to the length limit.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    let cleaned: String = cleaned.chars().take(MAX_SHEET_NAME_LEN).collect();
    if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

/// Pick a sheet name not already in `taken` (case-insensitive, like Excel) by
/// appending " (n)", then record it.
pub fn avoid_collision(name: &str, taken: &mut HashSet<String>) -> String {
    let base = sanitize_sheet_name(name);
    if taken.insert(base.to_lowercase()) {
        return base;
    }

    let mut n = 1;
    loop {
        let suffix = format!(" ({n})");
        let room = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
        let stem: String = base.chars().take(room).collect();
        let candidate = format!("{stem}{suffix}");
        if taken.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}

/// Boolean flags in batch files: y/yes/t/true/on/1 and n/no/f/false/off/0.
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Some(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// `report.xlsx` -> `report_summary.xlsx`, next to the input.
pub fn summary_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let ext = input
        .extension()
        .and_then(|s| s.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_summary{ext}"))
}
