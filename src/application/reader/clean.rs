//! Pre-parse cleaning of raw gateway replies.
//!
//! The gateway sometimes answers failures with HTTP 200 and an HTML or JSON
//! body, and embeds references to control characters that no XML parser
//! accepts. Everything here runs before parsing.

use tracing::debug;

use crate::error::{ErrorKind, GatewayError};

const BOM: char = '\u{feff}';

/// How far into the body an `<html` tag still marks an error page.
const HTML_SNIFF_CHARS: usize = 200;

/// Strip encoding noise and reject bodies that are not gateway data.
///
/// Removes byte-order marks, null bytes, raw control characters and
/// references to XML-illegal characters, then trims. Rejects empty bodies,
/// HTML error pages and JSON error bodies. Does not require XML, so it also
/// serves plain-text reports.
pub fn sanitize(raw: &str) -> Result<String, GatewayError> {
    let trimmed = raw.trim().trim_start_matches(BOM).trim();

    let mut cleaned = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        if ch == BOM || is_illegal_control(u32::from(ch)) {
            continue;
        }
        cleaned.push(ch);
    }
    if cleaned.len() != trimmed.len() {
        debug!(
            removed = trimmed.len() - cleaned.len(),
            "Removed null bytes or control characters"
        );
    }
    let cleaned = strip_illegal_char_refs(&cleaned).trim().to_string();

    if cleaned.is_empty() {
        return Err(GatewayError::new(
            ErrorKind::EmptyContent,
            "Empty response received from gateway",
        ));
    }

    let head: String = cleaned
        .chars()
        .take(HTML_SNIFF_CHARS)
        .collect::<String>()
        .to_lowercase();
    if head.starts_with("<!doctype html") || head.contains("<html") {
        return Err(GatewayError::new(
            ErrorKind::HtmlResponse,
            "Received HTML response instead of XML, the gateway may be returning an error page",
        )
        .with_content(&cleaned));
    }

    if cleaned.starts_with('{') || cleaned.starts_with('[') {
        return Err(
            GatewayError::new(ErrorKind::JsonResponse, "Received JSON response instead of XML")
                .with_content(&cleaned),
        );
    }

    Ok(cleaned)
}

/// [`sanitize`] plus the requirement that the body opens an XML element.
pub fn clean(raw: &str) -> Result<String, GatewayError> {
    let cleaned = sanitize(raw)?;
    if !cleaned.starts_with('<') {
        return Err(GatewayError::new(
            ErrorKind::InvalidXmlStart,
            "Cleaned response does not start with '<'",
        )
        .with_content(&cleaned));
    }
    Ok(cleaned)
}

/// Characters XML 1.0 forbids outright (tab, newline and carriage return are allowed).
fn is_illegal_control(code: u32) -> bool {
    code < 0x20 && !matches!(code, 0x09 | 0x0A | 0x0D)
}

/// Drop `&#N;` and `&#xH;` references that point at illegal characters.
fn strip_illegal_char_refs(input: &str) -> std::borrow::Cow<'_, str> {
    if !input.contains("&#") {
        return std::borrow::Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find("&#") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        match parse_char_ref(candidate) {
            Some((code, len)) if is_illegal_control(code) => {
                rest = &candidate[len..];
            }
            _ => {
                out.push_str("&#");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    std::borrow::Cow::Owned(out)
}

/// Parse a character reference at the start of `s`, returning its code
/// point and byte length.
fn parse_char_ref(s: &str) -> Option<(u32, usize)> {
    let body = s.strip_prefix("&#")?;
    let end = body.find(';')?;
    let digits = &body[..end];
    let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    Some((code, 2 + end + 1))
}
