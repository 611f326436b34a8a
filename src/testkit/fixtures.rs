//! Captured gateway replies and voucher samples.

/// Root page of a running gateway.
pub const PROBE_OK: &str = "<RESPONSE>TallyPrime Server is Running</RESPONSE>";

/// Something else listening on the port.
pub const PROBE_OTHER_SERVICE: &str = "<html><body>It works!</body></html>";

pub const COMPANY_INFO: &str = r#"<ENVELOPE>
 <HEADER><VERSION>1</VERSION><STATUS>1</STATUS></HEADER>
 <BODY>
  <DATA>
   <TALLYMESSAGE VCHTYPE="Company">
    <NAME>Acme Traders</NAME>
    <GUID>c1a2b3d4-0001</GUID>
    <STARTINGFROM>20240401</STARTINGFROM>
    <BOOKSFROM>20240401</BOOKSFROM>
    <ENDINGAT>20250331</ENDINGAT>
    <BASECURRENCYSYMBOL>INR</BASECURRENCYSYMBOL>
   </TALLYMESSAGE>
  </DATA>
 </BODY>
</ENVELOPE>"#;

pub const LEDGER_LIST: &str = "\u{feff}<ENVELOPE>
 <BODY>
  <DATA>
   <TALLYMESSAGE>
    <LEDGER NAME=\"Cash\"><PARENT>Cash-in-Hand</PARENT></LEDGER>
   </TALLYMESSAGE>
   <TALLYMESSAGE>
    <LEDGER NAME=\"Sales &amp; Services\"><PARENT>Sales Accounts</PARENT></LEDGER>
   </TALLYMESSAGE>
  </DATA>
 </BODY>
</ENVELOPE>";

/// Plain-text "List of Accounts" export.
pub const LIST_OF_ACCOUNTS: &str = "List of Accounts\r
Page 1\r
------------------------------\r
Cash                 1500.00\r
HDFC Bank            25000.50\r
Sundry Debtors\r
Cash\r
42\r
Total                26500.50\r
";

pub const HTML_ERROR: &str =
    "<!DOCTYPE html><html><head><title>500</title></head><body>Internal error</body></html>";

pub const JSON_ERROR: &str = r#"{"error":"company not loaded"}"#;

pub const LINE_ERROR: &str =
    "<ENVELOPE><BODY><DATA><LINEERROR>Could not find Report 'Foo'</LINEERROR></DATA></BODY></ENVELOPE>";

pub const EMPTY_ENVELOPE: &str = "<ENVELOPE></ENVELOPE>";

/// Import reply: one voucher created.
pub const IMPORT_CREATED: &str = "<RESPONSE><CREATED>1</CREATED><ALTERED>0</ALTERED>\
<DELETED>0</DELETED><LASTVCHID>4521</LASTVCHID><LASTMID>0</LASTMID><COMBINED>0</COMBINED>\
<IGNORED>0</IGNORED><ERRORS>0</ERRORS><CANCELLED>0</CANCELLED></RESPONSE>";

/// Import reply: unknown ledger.
pub const IMPORT_MISSING_LEDGER: &str = "<RESPONSE><CREATED>0</CREATED><ALTERED>0</ALTERED>\
<DELETED>0</DELETED><LASTVCHID>0</LASTVCHID><IGNORED>0</IGNORED><ERRORS>1</ERRORS>\
<CANCELLED>0</CANCELLED><LINEERROR>Could not find Ledger 'Shop Rent'</LINEERROR></RESPONSE>";

/// Balanced two-line payment.
pub const VOUCHER_BALANCED: &str = r#"<VOUCHER VCHTYPE="Payment" ACTION="Create">
 <DATE>20240415</DATE>
 <VOUCHERTYPENAME>Payment</VOUCHERTYPENAME>
 <VOUCHERNUMBER>17</VOUCHERNUMBER>
 <ALLLEDGERENTRIES.LIST>
  <LEDGERNAME>Shop Rent</LEDGERNAME>
  <ISDEEMEDPOSITIVE>Yes</ISDEEMEDPOSITIVE>
  <AMOUNT>-1500.00</AMOUNT>
 </ALLLEDGERENTRIES.LIST>
 <ALLLEDGERENTRIES.LIST>
  <LEDGERNAME>Cash</LEDGERNAME>
  <ISDEEMEDPOSITIVE>No</ISDEEMEDPOSITIVE>
  <AMOUNT>1500.00</AMOUNT>
 </ALLLEDGERENTRIES.LIST>
</VOUCHER>"#;

/// Debit and credit differ by 0.50.
pub const VOUCHER_UNBALANCED: &str = r#"<VOUCHER VCHTYPE="Payment" ACTION="Create">
 <DATE>20240415</DATE>
 <VOUCHERNUMBER>18</VOUCHERNUMBER>
 <ALLLEDGERENTRIES.LIST>
  <LEDGERNAME>Shop Rent</LEDGERNAME>
  <ISDEEMEDPOSITIVE>Yes</ISDEEMEDPOSITIVE>
  <AMOUNT>-1500.50</AMOUNT>
 </ALLLEDGERENTRIES.LIST>
 <ALLLEDGERENTRIES.LIST>
  <LEDGERNAME>Cash</LEDGERNAME>
  <ISDEEMEDPOSITIVE>No</ISDEEMEDPOSITIVE>
  <AMOUNT>1500.00</AMOUNT>
 </ALLLEDGERENTRIES.LIST>
</VOUCHER>"#;
