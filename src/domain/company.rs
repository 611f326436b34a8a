//! Company metadata reported by the gateway.

use serde::Serialize;

use super::xml::XmlElement;

/// Metadata of the company currently open in the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompanyInfo {
    pub name: String,
    pub guid: Option<String>,
    /// First day of the financial year, `YYYYMMDD`.
    pub financial_year_from: Option<String>,
    /// Last day of the financial year, `YYYYMMDD`.
    pub financial_year_to: Option<String>,
    pub books_from: Option<String>,
    pub base_currency: Option<String>,
}

impl CompanyInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Extract company metadata from a parsed export reply.
    ///
    /// Looks under a company-typed `TALLYMESSAGE` first, then a `COMPANY`
    /// element, then the whole document. Returns `None` when no company
    /// name can be found.
    #[must_use]
    pub fn from_xml(root: &XmlElement) -> Option<Self> {
        let scope = company_scope(root);

        let name = scope
            .text_of("NAME")
            .or_else(|| scope.find("COMPANY").and_then(|el| el.attribute("NAME")))
            .map(str::trim)
            .filter(|name| !name.is_empty())?;

        let text = |tags: &[&str]| {
            tags.iter()
                .find_map(|tag| scope.text_of(tag))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Some(Self {
            name: name.to_string(),
            guid: text(&["GUID", "REMOTEID"]),
            financial_year_from: text(&["STARTINGFROM"]),
            financial_year_to: text(&["ENDINGAT"]),
            books_from: text(&["BOOKSFROM"]),
            base_currency: text(&["BASECURRENCY", "BASECURRENCYSYMBOL"]),
        })
    }
}

/// The subtree that holds company data.
pub(crate) fn company_scope(root: &XmlElement) -> &XmlElement {
    root.find_all("TALLYMESSAGE")
        .find(|el| {
            el.attribute("VCHTYPE")
                .is_some_and(|kind| kind.eq_ignore_ascii_case("company"))
        })
        .or_else(|| root.find("COMPANY"))
        .unwrap_or(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company_reply() -> XmlElement {
        XmlElement::new("ENVELOPE").with_child(
            XmlElement::new("BODY").with_child(
                XmlElement::new("TALLYMESSAGE")
                    .with_attribute("VCHTYPE", "Company")
                    .with_child(XmlElement::new("NAME").with_text(" Acme Traders "))
                    .with_child(XmlElement::new("GUID").with_text("12345-abcde"))
                    .with_child(XmlElement::new("STARTINGFROM").with_text("20240401"))
                    .with_child(XmlElement::new("ENDINGAT").with_text("20250331"))
                    .with_child(XmlElement::new("BASECURRENCY").with_text("Indian Rupees")),
            ),
        )
    }

    #[test]
    fn extracts_company_fields() {
        let info = CompanyInfo::from_xml(&company_reply()).expect("company info");
        assert_eq!(info.name, "Acme Traders");
        assert_eq!(info.guid.as_deref(), Some("12345-abcde"));
        assert_eq!(info.financial_year_from.as_deref(), Some("20240401"));
        assert_eq!(info.financial_year_to.as_deref(), Some("20250331"));
        assert_eq!(info.base_currency.as_deref(), Some("Indian Rupees"));
        assert_eq!(info.books_from, None);
    }

    #[test]
    fn falls_back_to_company_name_attribute() {
        let root = XmlElement::new("ENVELOPE")
            .with_child(XmlElement::new("COMPANY").with_attribute("NAME", "Beta Ltd"));
        let info = CompanyInfo::from_xml(&root).expect("company info");
        assert_eq!(info.name, "Beta Ltd");
    }

    #[test]
    fn missing_name_yields_none() {
        let root = XmlElement::new("ENVELOPE").with_child(XmlElement::new("GUID").with_text("x"));
        assert!(CompanyInfo::from_xml(&root).is_none());
    }
}
