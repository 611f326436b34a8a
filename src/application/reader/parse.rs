//! XML parsing into the owned element tree.

use tracing::{debug, warn};

use super::clean::clean;
use crate::domain::XmlElement;
use crate::error::{truncate_chars, ErrorKind, GatewayError};

/// Parse already-cleaned XML.
pub fn parse_xml(content: &str) -> Result<XmlElement, GatewayError> {
    let document = roxmltree::Document::parse(content).map_err(|err| {
        GatewayError::new(
            ErrorKind::ParseError,
            format!("XML parsing failed, malformed structure: {err}"),
        )
        .with_content(content)
        .with_cause(&err)
    })?;
    let root = convert(document.root_element());
    debug!(root = %root.name, "Parsed XML response");
    Ok(root)
}

/// Clean then parse a raw reply, raising on any failure.
pub fn parse(raw: &str) -> Result<XmlElement, GatewayError> {
    parse_xml(&clean(raw)?)
}

/// Clean then parse a raw reply; failures are logged and yield `None`.
#[must_use]
pub fn try_parse(raw: &str) -> Option<XmlElement> {
    match parse(raw) {
        Ok(root) => Some(root),
        Err(err) => {
            warn!(
                kind = %err.kind,
                error = %err.message,
                content = truncate_chars(raw, 500),
                "Could not parse gateway response"
            );
            None
        }
    }
}

fn convert(node: roxmltree::Node<'_, '_>) -> XmlElement {
    let mut text = String::new();
    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(convert(child));
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }
    let text = text.trim();

    XmlElement {
        name: node.tag_name().name().to_string(),
        attributes: node
            .attributes()
            .map(|attr| (attr.name().to_string(), attr.value().to_string()))
            .collect(),
        text: (!text.is_empty()).then(|| text.to_string()),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_elements_attributes_and_text() {
        let root = parse_xml(
            r#"<ENVELOPE><BODY><LEDGER NAME="Cash &amp; Bank"><PARENT> Cash-in-hand </PARENT></LEDGER></BODY></ENVELOPE>"#,
        )
        .expect("parse");

        assert_eq!(root.name, "ENVELOPE");
        let ledger = root.find("LEDGER").expect("ledger");
        assert_eq!(ledger.attribute("NAME"), Some("Cash & Bank"));
        assert_eq!(root.text_of("PARENT"), Some("Cash-in-hand"));
        assert_eq!(ledger.text, None);
    }

    #[test]
    fn bad_input_raises_parse_error_with_snippet() {
        let err = parse("<bad").expect_err("malformed");
        assert_eq!(err.kind, ErrorKind::ParseError);
        assert_eq!(err.snippet.as_deref(), Some("<bad"));
        assert!(err.cause.is_some());
    }

    #[test]
    fn non_throwing_mode_returns_none() {
        assert!(try_parse("<bad").is_none());
        assert!(try_parse("").is_none());
        assert!(try_parse("<A/>").is_some());
    }

    #[test]
    fn cleaning_runs_before_parsing() {
        let root = parse("\u{feff}  <A>x&#4;y</A>\n").expect("parse");
        assert_eq!(root.text.as_deref(), Some("xy"));
    }
}
