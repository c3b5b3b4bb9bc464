use std::fmt;
use std::time::Duration;

/// Kind of statement, detected from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// DDL and anything else
    Other,
}

impl QueryType {
    /// Classify a statement. `WITH` is classified by the statement that
    /// follows the last top-level parenthesis.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = sql.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        match leading_keyword(trimmed).as_deref() {
            Some("SELECT") => QueryType::Select,
            Some("INSERT") => QueryType::Insert,
            Some("UPDATE") => QueryType::Update,
            Some("DELETE") => QueryType::Delete,
            Some("WITH") => Self::after_ctes(trimmed),
            _ => QueryType::Other,
        }
    }

    fn after_ctes(sql: &str) -> Self {
        let mut depth = 0_i32;
        let mut tail = 0;
        for (idx, ch) in sql.char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        tail = idx + 1;
                    }
                }
                _ => {}
            }
        }
        if tail == 0 {
            return QueryType::Select;
        }
        match Self::from_sql(&sql[tail..]) {
            QueryType::Other => QueryType::Select,
            kind => kind,
        }
    }
}

fn leading_keyword(sql: &str) -> Option<String> {
    let word: String = sql
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    (!word.is_empty()).then(|| word.to_ascii_uppercase())
}

/// What a monitor knows about a statement.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub sql: String,
    pub binding_count: usize,
    pub query_type: QueryType,
    /// Caller-supplied label, e.g. the relation an eager load belongs to.
    pub tag: Option<String>,
}

impl QueryContext {
    pub fn new(sql: &str, binding_count: usize) -> Self {
        Self {
            sql: sql.to_string(),
            binding_count,
            query_type: QueryType::from_sql(sql),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

const MAX_ERROR_LEN: usize = 512;

/// Outcome of a statement as reported to monitors.
#[derive(Debug, Clone)]
pub enum QueryResult {
    Rows(usize),
    Affected(u64),
    /// Error message, truncated to 512 bytes.
    Error(String),
}

impl QueryResult {
    pub fn error(msg: String) -> Self {
        if msg.len() <= MAX_ERROR_LEN {
            return Self::Error(msg);
        }
        Self::Error(format!("{}...", super::truncate_sql_bytes(&msg, MAX_ERROR_LEN)))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Receives statement lifecycle events from an instrumented executor.
pub trait QueryMonitor: Send + Sync {
    fn on_query_start(&self, _ctx: &QueryContext) {}

    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult);

    /// Called after `on_query_complete` when the statement exceeded the
    /// configured slow-query threshold.
    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {}
}
