use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{MetricsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Success,
    Error,
}

/// Top-level body of a backend query response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    pub status: QueryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResultData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultData {
    #[serde(default)]
    pub result_type: String,
    #[serde(default)]
    pub result: Vec<Series>,
}

impl ResultEnvelope {
    pub fn success(series: Vec<Series>) -> Self {
        Self {
            status: QueryStatus::Success,
            error_type: None,
            error: None,
            data: Some(ResultData {
                result_type: "vector".to_string(),
                result: series,
            }),
        }
    }

    pub fn failure(error_type: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: QueryStatus::Error,
            error_type: Some(error_type.into()),
            error: Some(error.into()),
            data: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn series(&self) -> &[Series] {
        self.data.as_ref().map(|d| d.result.as_slice()).unwrap_or(&[])
    }

    /// An error envelope without an error message is not a valid response.
    pub fn validate(&self) -> Result<()> {
        if self.is_error() && self.error.is_none() {
            return Err(MetricsError::Transport(
                "malformed response body: error status without error message".to_string(),
            ));
        }
        Ok(())
    }
}

/// One series of an instant vector: its labels and a `[timestamp, "value"]` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    pub value: Sample,
}

impl Series {
    pub fn new<I, K, V>(labels: I, timestamp: f64, value: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            metric: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            value: Sample(timestamp, value.into()),
        }
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.metric.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample(pub f64, pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Counter,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScalarValue {
    Counter(i64),
    Timestamp(DateTime<Utc>),
}

impl ScalarValue {
    /// Parses a raw sample into the requested type. Timestamps are epoch milliseconds.
    pub fn parse(raw: &str, value_type: ValueType) -> Result<Self> {
        let raw = raw.trim();
        match value_type {
            ValueType::Counter => parse_integral(raw).map(ScalarValue::Counter),
            ValueType::Timestamp => {
                let millis = parse_integral(raw)?;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .map(ScalarValue::Timestamp)
                    .ok_or_else(|| {
                        MetricsError::ValueParse(format!("timestamp out of range: {}", raw))
                    })
            }
        }
    }

    pub fn as_counter(&self) -> Option<i64> {
        match self {
            ScalarValue::Counter(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            ScalarValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

/// 2^63. `i64::MAX as f64` rounds up to this value, so it is not a usable bound.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn parse_integral(raw: &str) -> Result<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(v);
    }
    let v: f64 = raw
        .parse()
        .map_err(|_| MetricsError::ValueParse(format!("not a number: {:?}", raw)))?;
    if !v.is_finite() || v.fract() != 0.0 || v >= I64_BOUND || v < -I64_BOUND {
        return Err(MetricsError::ValueParse(format!(
            "not an integral value: {:?}",
            raw
        )));
    }
    Ok(v as i64)
}

/// Grouping-label value to scalar for one metric lookup.
pub type LabelValueMap = HashMap<String, ScalarValue>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationMetricsSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_processed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: i64,
    #[serde(default)]
    pub errors: i64,
}
