//! Statement monitoring.
//!
//! [`InstrumentedExecutor`] wraps any executor and reports every statement
//! to a [`QueryMonitor`]: timing, slow-query detection and an optional
//! timeout. Monitors shipped here count statements ([`StatsMonitor`]) or
//! emit them through `tracing` ([`TracingMonitor`]).
//!
//! ```ignore
//! use quarry::monitor::{CompositeMonitor, InstrumentedExecutor, MonitorConfig, StatsMonitor, TracingMonitor};
//!
//! let stats = Arc::new(StatsMonitor::new());
//! let db = InstrumentedExecutor::new(client)
//!     .with_config(
//!         MonitorConfig::new()
//!             .with_slow_query_threshold(Duration::from_millis(250))
//!             .enable_monitoring(),
//!     )
//!     .with_monitor(CompositeMonitor::new().add(TracingMonitor::new()).add_arc(stats.clone()));
//! ```

mod config;
mod instrumented;
mod monitors;
mod types;


pub use config::MonitorConfig;
pub use instrumented::InstrumentedExecutor;
pub use monitors::{CompositeMonitor, NoopMonitor, QueryStats, StatsMonitor, TracingMonitor};
pub use types::{QueryContext, QueryMonitor, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
