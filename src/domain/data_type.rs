//! Logical categories of requestable data and their request parameters.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Export format requested from the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xml,
    /// Plain-text report; parsed with the tabular line heuristic.
    Ascii,
}

impl ExportFormat {
    #[must_use]
    pub fn system_name(self) -> &'static str {
        match self {
            Self::Xml => "$$SysName:XML",
            Self::Ascii => "$$SysName:ASCII",
        }
    }
}

/// A logical category of gateway data, each with its own request template
/// and validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    CompanyInfo,
    LedgerList,
    LedgerDetails,
    VoucherList,
    VoucherDetails,
    BalanceSheet,
    ProfitLoss,
    DayBook,
    StockSummary,
    LedgerNames,
    GroupNames,
}

impl DataType {
    pub const ALL: [DataType; 11] = [
        Self::CompanyInfo,
        Self::LedgerList,
        Self::LedgerDetails,
        Self::VoucherList,
        Self::VoucherDetails,
        Self::BalanceSheet,
        Self::ProfitLoss,
        Self::DayBook,
        Self::StockSummary,
        Self::LedgerNames,
        Self::GroupNames,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompanyInfo => "company_info",
            Self::LedgerList => "ledger_list",
            Self::LedgerDetails => "ledger_details",
            Self::VoucherList => "voucher_list",
            Self::VoucherDetails => "voucher_details",
            Self::BalanceSheet => "balance_sheet",
            Self::ProfitLoss => "profit_loss",
            Self::DayBook => "day_book",
            Self::StockSummary => "stock_summary",
            Self::LedgerNames => "ledger_names",
            Self::GroupNames => "group_names",
        }
    }

    /// Parse the snake_case name used in logs and on the command line.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dt| dt.as_str() == name)
    }

    /// Gateway report requested for this data type.
    #[must_use]
    pub fn report_name(self) -> &'static str {
        match self {
            Self::CompanyInfo => "Company Info",
            Self::LedgerList => "List of Accounts",
            Self::LedgerDetails => "Ledger",
            Self::VoucherList => "All Vouchers",
            Self::VoucherDetails => "Voucher Register",
            Self::BalanceSheet => "Balance Sheet",
            Self::ProfitLoss => "Profit & Loss",
            Self::DayBook => "Day Book",
            Self::StockSummary => "Stock Summary",
            Self::LedgerNames => "List of Accounts",
            Self::GroupNames => "List of Groups",
        }
    }

    #[must_use]
    pub fn export_format(self) -> ExportFormat {
        match self {
            Self::LedgerNames | Self::GroupNames => ExportFormat::Ascii,
            _ => ExportFormat::Xml,
        }
    }

    /// Parameters that must be supplied, paired with the static variable
    /// each one fills in the request envelope.
    #[must_use]
    pub fn required_params(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::LedgerDetails => &[("ledger_name", "LEDGERNAME")],
            Self::VoucherList | Self::DayBook => {
                &[("from_date", "SVFROMDATE"), ("to_date", "SVTODATE")]
            }
            Self::VoucherDetails => &[
                ("voucher_number", "VOUCHERNUMBER"),
                ("voucher_type", "VOUCHERTYPE"),
            ],
            _ => &[],
        }
    }

    /// How long a validated reply stays fresh in the cache.
    #[must_use]
    pub fn ttl(self) -> Option<Duration> {
        let secs = match self {
            Self::CompanyInfo => 600,
            Self::LedgerList => 300,
            Self::LedgerDetails => 180,
            Self::BalanceSheet => 60,
            Self::VoucherList => 30,
            Self::VoucherDetails => 60,
            Self::DayBook => 30,
            _ => return None,
        };
        Some(Duration::from_secs(secs))
    }

    /// Error code raised when a reply lacks this type's required content.
    #[must_use]
    pub fn missing_data_code(self) -> &'static str {
        match self {
            Self::CompanyInfo => "MISSING_COMPANY_DATA",
            Self::LedgerList | Self::LedgerDetails | Self::LedgerNames => "MISSING_LEDGER_DATA",
            Self::VoucherList | Self::VoucherDetails => "MISSING_VOUCHER_DATA",
            Self::BalanceSheet => "MISSING_BALANCE_SHEET_DATA",
            Self::ProfitLoss => "MISSING_PROFIT_LOSS_DATA",
            Self::DayBook => "MISSING_DAY_BOOK_DATA",
            Self::StockSummary => "MISSING_STOCK_DATA",
            Self::GroupNames => "MISSING_GROUP_DATA",
        }
    }

    /// Human-readable operation name, e.g. "Ledger Details".
    #[must_use]
    pub fn operation_name(self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request parameters. Ordered by key, so two maps with the same entries
/// always produce the same canonical form regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RequestParams(BTreeMap<String, String>);

impl RequestParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `k1=v1&k2=v2` with keys in sorted order.
    #[must_use]
    pub fn canonical(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
