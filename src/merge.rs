use crate::{
    models::{LabelValueMap, ScalarValue},
    MetricsError, Result,
};

/// An associative, commutative binary operator over scalar values.
///
/// Reduction order over a map is unspecified, so implementations must give
/// the same result for any order of operands.
pub trait MergeOperator: Send + Sync {
    fn name(&self) -> &'static str;

    fn combine(&self, left: ScalarValue, right: ScalarValue) -> Result<ScalarValue>;
}

/// Integer sum of counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumCounters;

impl MergeOperator for SumCounters {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn combine(&self, left: ScalarValue, right: ScalarValue) -> Result<ScalarValue> {
        match (left, right) {
            (ScalarValue::Counter(a), ScalarValue::Counter(b)) => {
                a.checked_add(b).map(ScalarValue::Counter).ok_or_else(|| {
                    MetricsError::TypeMismatch(format!("counter overflow: {} + {}", a, b))
                })
            }
            (a, b) => Err(MetricsError::TypeMismatch(format!(
                "sum expects counters, got {:?} and {:?}",
                a, b
            ))),
        }
    }
}

/// Latest of two timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxTimestamps;

impl MergeOperator for MaxTimestamps {
    fn name(&self) -> &'static str {
        "max"
    }

    fn combine(&self, left: ScalarValue, right: ScalarValue) -> Result<ScalarValue> {
        match (left, right) {
            (ScalarValue::Timestamp(a), ScalarValue::Timestamp(b)) => {
                Ok(ScalarValue::Timestamp(a.max(b)))
            }
            (a, b) => Err(MetricsError::TypeMismatch(format!(
                "max expects timestamps, got {:?} and {:?}",
                a, b
            ))),
        }
    }
}

/// Folds every value of `map` with `operator`. `None` when the map is absent or empty.
pub fn merge_across_keys(
    map: Option<&LabelValueMap>,
    operator: &dyn MergeOperator,
) -> Result<Option<ScalarValue>> {
    let mut values = match map {
        Some(map) => map.values().copied(),
        None => return Ok(None),
    };
    let first = match values.next() {
        Some(first) => first,
        None => return Ok(None),
    };
    values
        .try_fold(first, |acc, value| operator.combine(acc, value))
        .map(Some)
}
