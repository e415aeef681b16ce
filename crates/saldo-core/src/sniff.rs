//! Encoding, header row and delimiter detection for delimited statements
//!
//! Bank exports frequently carry a preamble (account holder, period,
//! balance) above the real header, use `;` or tabs instead of commas, and
//! are not always UTF-8. This module finds:
//! - the text encoding, from an ordered list of candidates
//! - the header row, by counting known column keywords
//! - the field delimiter used on that row

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Keywords expected in a statement header (matched case-insensitively)
const HEADER_KEYWORDS: &[&str] = &[
    "data",
    "date",
    "dt",
    "release_date",
    "lançamento",
    "valor",
    "value",
    "amount",
    "net_amount",
];

/// Delimiters considered, in tie-break order
const DELIMITERS: [u8; 3] = [b';', b',', b'\t'];

/// Lines scanned for a keyword header
const HEADER_SCAN_LINES: usize = 50;

/// Lines scanned for a fallback header
const FALLBACK_SCAN_LINES: usize = 10;

/// Minimum number of distinct keywords on a header line
const MIN_HEADER_KEYWORDS: usize = 2;

/// Supported text encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Windows1252,
}

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
            Self::Windows1252 => "windows-1252",
        }
    }

    /// Strict decode; None when the bytes are not valid in this encoding
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                std::str::from_utf8(bytes).ok().map(str::to_string)
            }
            // Every byte maps to the code point of the same value
            Self::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            Self::Windows1252 => encoding_rs::WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
        }
    }

    /// Default candidate order
    pub fn defaults() -> Vec<TextEncoding> {
        vec![Self::Utf8, Self::Latin1, Self::Windows1252]
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Self::Latin1),
            "windows-1252" | "cp1252" => Ok(Self::Windows1252),
            _ => Err(format!("Unknown encoding: {}", s)),
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decode with the first candidate that accepts the bytes
pub fn decode(bytes: &[u8], candidates: &[TextEncoding]) -> Result<(String, TextEncoding)> {
    for encoding in candidates {
        if let Some(text) = encoding.decode(bytes) {
            debug!("Decoded statement as {}", encoding);
            return Ok((text, *encoding));
        }
    }
    let tried: Vec<&str> = candidates.iter().map(TextEncoding::as_str).collect();
    Err(Error::DecodeFailure(tried.join(", ")))
}

/// Result of sniffing a delimited statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SniffedText {
    pub text: String,
    pub encoding: TextEncoding,
    pub delimiter: u8,
    /// Zero-based line index of the header row
    pub header_row: usize,
}

impl SniffedText {
    /// Text from the header row onwards
    pub fn table_text(&self) -> &str {
        let mut offset = 0;
        for line in self.text.split_inclusive('\n').take(self.header_row) {
            offset += line.len();
        }
        &self.text[offset..]
    }
}

/// Decode and locate header row and delimiter
pub fn sniff(bytes: &[u8], encodings: &[TextEncoding]) -> Result<SniffedText> {
    let (text, encoding) = decode(bytes, encodings)?;
    let (header_row, delimiter) = find_header(&text)?;
    debug!(
        "Header at line {} with delimiter {:?}",
        header_row, delimiter as char
    );
    Ok(SniffedText {
        text,
        encoding,
        delimiter,
        header_row,
    })
}

/// Locate the header line and its delimiter
pub fn find_header(text: &str) -> Result<(usize, u8)> {
    for (index, line) in text.lines().enumerate().take(HEADER_SCAN_LINES) {
        if line.trim().is_empty() {
            continue;
        }
        if keyword_hits(line) < MIN_HEADER_KEYWORDS {
            continue;
        }
        if let Some(delimiter) = dominant_delimiter(line) {
            return Ok((index, delimiter));
        }
    }

    for (index, line) in text.lines().enumerate().take(FALLBACK_SCAN_LINES) {
        if line.trim().is_empty() {
            continue;
        }
        let semicolons = line.split(';').count();
        let commas = line.split(',').count();
        let delimiter = if semicolons > commas { b';' } else { b',' };
        debug!("No keyword header found, using first non-empty line");
        return Ok((index, delimiter));
    }

    Err(Error::UnparseableFormat(
        "no header row or delimiter found".into(),
    ))
}

fn keyword_hits(line: &str) -> usize {
    let lower = line.to_lowercase();
    HEADER_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .count()
}

/// Most frequent delimiter on the line; None when none occurs
fn dominant_delimiter(line: &str) -> Option<u8> {
    let mut best: Option<(u8, usize)> = None;
    for delimiter in DELIMITERS {
        let count = line.bytes().filter(|b| *b == delimiter).count();
        if count > 0 && best.map_or(true, |(_, n)| count > n) {
            best = Some((delimiter, count));
        }
    }
    best.map(|(delimiter, _)| delimiter)
}
