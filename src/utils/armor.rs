//! PEM-style armor: `-----BEGIN <LABEL>-----`, base64 body, `-----END <LABEL>-----`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Body line width used by OpenSSH signatures.
pub const LINE_WIDTH: usize = 70;

#[derive(Debug, Error)]
pub enum ArmorError {
    #[error("missing `-----BEGIN {0}-----` line")]
    MissingBegin(String),
    #[error("missing `-----END {0}-----` line")]
    MissingEnd(String),
    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),
}

pub fn armor(label: &str, bytes: &[u8]) -> String {
    let body = STANDARD.encode(bytes);
    let mut out = format!("-----BEGIN {label}-----\n");
    for start in (0..body.len()).step_by(LINE_WIDTH) {
        out.push_str(&body[start..body.len().min(start + LINE_WIDTH)]);
        out.push('\n');
    }
    out.push_str(&format!("-----END {label}-----\n"));
    out
}

/// Decode the first armored block with `label`. Text around the block and
/// whitespace inside it are ignored.
pub fn dearmor(label: &str, text: &str) -> Result<Vec<u8>, ArmorError> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");
    let mut lines = text.lines().map(str::trim);
    if !lines.any(|l| l == begin) {
        return Err(ArmorError::MissingBegin(label.to_string()));
    }
    let mut body = String::new();
    for line in lines {
        if line == end {
            return Ok(STANDARD.decode(body)?);
        }
        body.extend(line.chars().filter(|c| !c.is_whitespace()));
    }
    Err(ArmorError::MissingEnd(label.to_string()))
}
