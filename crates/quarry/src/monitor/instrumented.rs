use super::config::MonitorConfig;
use super::monitors::NoopMonitor;
use super::types::{QueryContext, QueryMonitor, QueryResult};
use crate::binding::Binding;
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::grammar::Grammar;
use crate::row::Row;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wraps an [`Executor`] with timing, timeouts and monitor callbacks.
///
/// ```ignore
/// let stats = Arc::new(StatsMonitor::new());
/// let db = InstrumentedExecutor::new(SqliteExecutor::open_in_memory()?)
///     .with_config(MonitorConfig::new().with_query_timeout(Duration::from_secs(5)).enable_monitoring())
///     .with_monitor_arc(stats.clone());
/// ```
pub struct InstrumentedExecutor<E> {
    inner: E,
    monitor: Arc<dyn QueryMonitor>,
    config: MonitorConfig,
}

impl<E: Executor> InstrumentedExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            monitor: Arc::new(NoopMonitor),
            config: MonitorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.config.query_timeout = Some(timeout);
        self
    }

    pub fn enable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = true;
        self
    }

    pub fn disable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = false;
        self
    }

    pub fn is_monitoring_enabled(&self) -> bool {
        self.config.monitoring_enabled
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }

    fn report_result(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        if !self.config.monitoring_enabled {
            return;
        }

        self.monitor.on_query_complete(ctx, duration, result);

        if let Some(threshold) = self.config.slow_query_threshold {
            if duration > threshold {
                self.monitor.on_slow_query(ctx, duration);
            }
        }
    }

    async fn with_timeout<T, F>(&self, future: F) -> OrmResult<T>
    where
        F: Future<Output = OrmResult<T>> + Send,
    {
        match self.config.query_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, future).await {
                Ok(result) => result,
                Err(_) => Err(OrmError::Timeout(timeout)),
            },
            None => future.await,
        }
    }

    async fn run<T, F, R>(
        &self,
        sql: &str,
        bindings: &[Binding],
        tag: Option<&str>,
        run: R,
        summarize: fn(&T) -> QueryResult,
    ) -> OrmResult<T>
    where
        R: FnOnce() -> F,
        F: Future<Output = OrmResult<T>> + Send,
    {
        let mut ctx = QueryContext::new(sql, bindings.len());
        if let Some(tag) = tag {
            ctx.tag = Some(tag.to_string());
        }

        if self.config.monitoring_enabled {
            self.monitor.on_query_start(&ctx);
        }

        let start = Instant::now();
        let result = self.with_timeout(run()).await;
        let duration = start.elapsed();

        let query_result = match &result {
            Ok(value) => summarize(value),
            Err(OrmError::Timeout(d)) => QueryResult::Error(format!("timeout after {d:?}")),
            Err(e) => QueryResult::error(e.to_string()),
        };

        self.report_result(&ctx, duration, &query_result);
        result
    }
}

fn rows_result(rows: &[Row]) -> QueryResult {
    QueryResult::Rows(rows.len())
}

fn affected_result(n: &u64) -> QueryResult {
    QueryResult::Affected(*n)
}

#[async_trait::async_trait]
impl<E: Executor> Executor for InstrumentedExecutor<E> {
    fn grammar(&self) -> &dyn Grammar {
        self.inner.grammar()
    }

    async fn query(&self, sql: &str, bindings: &[Binding]) -> OrmResult<Vec<Row>> {
        let run = || self.inner.query(sql, bindings);
        self.run(sql, bindings, None, run, |rows: &Vec<Row>| rows_result(rows))
            .await
    }

    async fn execute(&self, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        let run = || self.inner.execute(sql, bindings);
        self.run(sql, bindings, None, run, affected_result).await
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        bindings: &[Binding],
    ) -> OrmResult<Vec<Row>> {
        let run = || self.inner.query_tagged(tag, sql, bindings);
        self.run(sql, bindings, Some(tag), run, |rows: &Vec<Row>| {
            rows_result(rows)
        })
        .await
    }

    async fn execute_tagged(&self, tag: &str, sql: &str, bindings: &[Binding]) -> OrmResult<u64> {
        let run = || self.inner.execute_tagged(tag, sql, bindings);
        self.run(sql, bindings, Some(tag), run, affected_result).await
    }
}
