//! Request envelopes understood by the gateway.

use std::fmt::Write as _;

use crate::domain::{DataType, RequestParams};
use crate::error::{ErrorKind, GatewayError};

/// Optional parameter selecting the company to read from.
pub const COMPANY_PARAM: &str = "company";

/// Escape a value for use as XML text.
#[must_use]
pub fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Check that every parameter the data type needs is present and non-blank.
pub fn check_params(data_type: DataType, params: &RequestParams) -> Result<(), GatewayError> {
    let missing: Vec<&str> = data_type
        .required_params()
        .iter()
        .filter(|(name, _)| params.get(name).map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::new(
            ErrorKind::InvalidRequest,
            format!(
                "Missing required parameters for {data_type}: {}",
                missing.join(", ")
            ),
        ))
    }
}

/// Build the Export Data envelope for a data type.
pub fn export_envelope(data_type: DataType, params: &RequestParams) -> Result<String, GatewayError> {
    check_params(data_type, params)?;

    let mut statics = String::new();
    for (name, variable) in data_type.required_params() {
        let value = params.get(name).unwrap_or_default();
        let _ = writeln!(
            statics,
            "          <{variable}>{}</{variable}>",
            xml_escape(value.trim())
        );
    }
    if let Some(company) = params.get(COMPANY_PARAM).filter(|c| !c.trim().is_empty()) {
        let _ = writeln!(
            statics,
            "          <SVCURRENTCOMPANY>{}</SVCURRENTCOMPANY>",
            xml_escape(company.trim())
        );
    }

    Ok(format!(
        "<ENVELOPE>
  <HEADER>
    <TALLYREQUEST>Export Data</TALLYREQUEST>
  </HEADER>
  <BODY>
    <EXPORTDATA>
      <REQUESTDESC>
        <REPORTNAME>{report}</REPORTNAME>
        <STATICVARIABLES>
{statics}          <SVEXPORTFORMAT>{format}</SVEXPORTFORMAT>
        </STATICVARIABLES>
      </REQUESTDESC>
    </EXPORTDATA>
  </BODY>
</ENVELOPE>",
        report = xml_escape(data_type.report_name()),
        format = data_type.export_format().system_name(),
    ))
}

/// Wrap voucher XML in the Import Data envelope.
#[must_use]
pub fn import_envelope(voucher_xml: &str) -> String {
    format!(
        "<ENVELOPE>
  <HEADER>
    <TALLYREQUEST>Import Data</TALLYREQUEST>
  </HEADER>
  <BODY>
    <IMPORTDATA>
      <REQUESTDESC>
        <REPORTNAME>Vouchers</REPORTNAME>
      </REQUESTDESC>
      <REQUESTDATA>
        <TALLYMESSAGE xmlns:UDF=\"TallyUDF\">
{}
        </TALLYMESSAGE>
      </REQUESTDATA>
    </IMPORTDATA>
  </BODY>
</ENVELOPE>",
        voucher_xml.trim()
    )
}
