pub mod binary;
pub mod commands;
pub mod reports;
pub mod result;

pub use binary::BinaryPayload;
pub use commands::{Command, ProcessingConfiguration};
pub use reports::{OrderBookSnapshot, ReportQuery, TotalCurrencyBalanceReportResult};
pub use result::{CommandResult, ResultCode};
