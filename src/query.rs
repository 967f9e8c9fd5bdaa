use std::fmt;

use crate::{MetricsError, Result};

/// A `name="value"` selector applied to the queried metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFilter {
    pub name: String,
    pub value: String,
}

impl LabelFilter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An immutable range query: `function(metric{filters}[range])` sent to `host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    host: String,
    function: String,
    metric: String,
    filters: Vec<LabelFilter>,
    range: String,
}

impl Query {
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn filters(&self) -> &[LabelFilter] {
        &self.filters
    }

    pub fn range(&self) -> &str {
        &self.range
    }

    /// The PromQL expression, e.g. `max_over_time(m{a="b"}[1d])`.
    pub fn expression(&self) -> String {
        let mut selector = self.metric.clone();
        if !self.filters.is_empty() {
            let filters: Vec<String> = self
                .filters
                .iter()
                .map(|f| format!("{}=\"{}\"", f.name, escape(&f.value)))
                .collect();
            selector.push('{');
            selector.push_str(&filters.join(","));
            selector.push('}');
        }
        if !self.range.is_empty() {
            selector = format!("{}[{}]", selector, self.range);
        }
        if self.function.is_empty() {
            selector
        } else {
            format!("{}({})", self.function, selector)
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.expression(), self.host)
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    host: String,
    function: String,
    metric: String,
    filters: Vec<LabelFilter>,
    range: String,
}

impl QueryBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    pub fn metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = metric.into();
        self
    }

    pub fn filter(mut self, filter: LabelFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters<I>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = LabelFilter>,
    {
        self.filters.extend(filters);
        self
    }

    pub fn range(mut self, range: impl Into<String>) -> Self {
        self.range = range.into();
        self
    }

    pub fn build(self) -> Result<Query> {
        if self.host.trim().is_empty() {
            return Err(MetricsError::InvalidQuery("host must not be empty".to_string()));
        }
        if self.metric.trim().is_empty() {
            return Err(MetricsError::InvalidQuery("metric must not be empty".to_string()));
        }
        Ok(Query {
            host: self.host,
            function: self.function,
            metric: self.metric,
            filters: self.filters,
            range: self.range,
        })
    }
}

/// Shorthand for building a query from its parts.
pub fn build(
    host: &str,
    function: &str,
    metric: &str,
    filters: &[LabelFilter],
    range: &str,
) -> Result<Query> {
    Query::builder()
        .host(host)
        .function(function)
        .metric(metric)
        .filters(filters.iter().cloned())
        .range(range)
        .build()
}
