//! Gateway-agnostic value types.

mod company;
mod connection;
mod data_type;
mod posting;
mod response;
mod task;
mod xml;

pub use company::CompanyInfo;
pub(crate) use company::company_scope;
pub use connection::{ConnectionStats, ConnectionStatus, StatsSnapshot};
pub use data_type::{DataType, ExportFormat, RequestParams};
pub use posting::{PostingErrorKind, PostingResult, VoucherValidation};
pub use response::{CachedResponse, FailureKind, GatewayResponse, Payload};
pub use task::{TaskId, TaskPriority, TaskProgress, TaskResult, TaskSnapshot, TaskStatus};
pub use xml::{Descendants, XmlElement};
