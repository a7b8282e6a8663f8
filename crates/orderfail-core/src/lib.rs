//! Reporting core for failed ride-hailing orders.
//!
//! Two CSV sources (orders and the offers made against them) flow through a
//! fixed pipeline — load, inner join, enrich, aggregate — producing four
//! tables: the failure-reason distribution, the hourly failure distribution,
//! the hourly mean time to cancellation split by driver assignment, and the
//! hourly mean ETA. Rendering the tables is the caller's concern.

pub mod aggregate;
pub mod config;
pub mod enrich;
pub mod error;
pub mod frame;
pub mod join;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod report;

pub use config::{IntegrityMode, OutlierPolicy, ReportConfig};
pub use error::{PipelineError, Result, SourceError};
pub use model::{DriverAssignment, EnrichedOrder, OrderStatus};
pub use pipeline::run_report;
pub use report::{
    CancellationLatencyRow, FailureBreakdownRow, FailureReport, HourlyEtaRow, HourlyFailureRow,
};

#[cfg(test)]
mod tests;
