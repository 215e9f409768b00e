//! Spreadsheet format sniffing.
//!
//! Candidate uploads are checked against an ordered list of formats; the
//! first one whose checks pass wins. When none match, every format's reason
//! is reported so the caller can say why the file was refused.

use std::fmt;

use thiserror::Error;

/// Spreadsheet container formats the dashboards can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkbookFormat {
    /// Office Open XML workbook (`.xlsx`).
    Xlsx,
    /// Legacy BIFF workbook in an OLE compound file (`.xls`).
    Xls,
    /// Delimited text.
    Csv,
}

const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const OLE_MIN_LEN: usize = 512;
const CSV_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];
const CSV_SAMPLE_LINES: usize = 20;

impl WorkbookFormat {
    /// Default probing order.
    pub fn all() -> &'static [WorkbookFormat] {
        &[WorkbookFormat::Xlsx, WorkbookFormat::Xls, WorkbookFormat::Csv]
    }

    pub fn extension(self) -> &'static str {
        match self {
            WorkbookFormat::Xlsx => "xlsx",
            WorkbookFormat::Xls => "xls",
            WorkbookFormat::Csv => "csv",
        }
    }

    /// `Ok(())` when `bytes` look like this format, otherwise the reason not.
    pub fn check(self, bytes: &[u8]) -> Result<(), String> {
        match self {
            WorkbookFormat::Xlsx => check_xlsx(bytes),
            WorkbookFormat::Xls => check_xls(bytes),
            WorkbookFormat::Csv => check_csv(bytes),
        }
    }
}

impl fmt::Display for WorkbookFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// No format accepted the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a readable spreadsheet: {}", render_attempts(.attempts))]
pub struct SniffError {
    pub attempts: Vec<(WorkbookFormat, String)>,
}

fn render_attempts(attempts: &[(WorkbookFormat, String)]) -> String {
    attempts
        .iter()
        .map(|(format, reason)| format!("{format}: {reason}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Probe `bytes` with [`WorkbookFormat::all`].
pub fn sniff(bytes: &[u8]) -> Result<WorkbookFormat, SniffError> {
    sniff_with(bytes, WorkbookFormat::all())
}

/// Probe `bytes` with `order`, returning the first format that accepts it.
pub fn sniff_with(bytes: &[u8], order: &[WorkbookFormat]) -> Result<WorkbookFormat, SniffError> {
    let mut attempts = Vec::with_capacity(order.len());
    for format in order {
        match format.check(bytes) {
            Ok(()) => return Ok(*format),
            Err(reason) => attempts.push((*format, reason)),
        }
    }
    Err(SniffError { attempts })
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn check_xlsx(bytes: &[u8]) -> Result<(), String> {
    if !bytes.starts_with(ZIP_LOCAL_HEADER) {
        return Err("missing ZIP signature".to_owned());
    }
    if !contains(bytes, b"[Content_Types].xml") {
        return Err("ZIP archive without [Content_Types].xml".to_owned());
    }
    if !contains(bytes, b"xl/") {
        return Err("OOXML package without an xl/ workbook part".to_owned());
    }
    Ok(())
}

fn check_xls(bytes: &[u8]) -> Result<(), String> {
    if !bytes.starts_with(OLE_MAGIC) {
        return Err("missing OLE compound document signature".to_owned());
    }
    if bytes.len() < OLE_MIN_LEN {
        return Err(format!("truncated compound document ({} bytes)", bytes.len()));
    }
    Ok(())
}

fn check_csv(bytes: &[u8]) -> Result<(), String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err("empty input".to_owned());
    }
    if bytes.contains(&0) {
        return Err("contains NUL bytes".to_owned());
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|e| format!("not valid UTF-8 at byte {}", e.valid_up_to()))?;

    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(CSV_SAMPLE_LINES)
        .collect();
    let Some(first_line) = lines.first() else {
        return Err("empty input".to_owned());
    };

    let consistent = CSV_DELIMITERS.iter().any(|&d| {
        let count = |line: &str| line.bytes().filter(|b| *b == d).count();
        let first = count(*first_line);
        first > 0 && lines.iter().all(|line| count(line) == first)
    });
    if !consistent {
        return Err("no delimiter with a consistent column count".to_owned());
    }
    Ok(())
}
