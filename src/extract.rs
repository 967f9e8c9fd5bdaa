use std::collections::hash_map::Entry;

use tracing::{debug, warn};

use crate::{
    merge::MergeOperator,
    models::{LabelValueMap, ResultEnvelope, ScalarValue, ValueType},
    MetricsError, Result,
};

/// Groups the series of `envelope` by `grouping_label`, parsing each sample as
/// `value_type` and folding duplicates with `merge`.
///
/// Returns `Ok(None)` when no series carries the grouping label, so callers
/// can tell "no data yet" apart from a failed query. Series lacking the
/// grouping label are skipped. A sample that does not parse fails the whole
/// extraction.
pub fn extract(
    envelope: &ResultEnvelope,
    grouping_label: &str,
    value_type: ValueType,
    merge: &dyn MergeOperator,
) -> Result<Option<LabelValueMap>> {
    if envelope.is_error() {
        let err = MetricsError::BackendQuery {
            error_type: envelope.error_type.clone().unwrap_or_default(),
            message: envelope.error.clone().unwrap_or_default(),
        };
        warn!("{}", err);
        return Err(err);
    }

    let series = envelope.series();
    if series.is_empty() {
        return Ok(None);
    }

    let mut values = LabelValueMap::new();
    for s in series {
        let key = match s.label(grouping_label) {
            Some(key) => key,
            None => {
                debug!("Skipping series without label {}: {:?}", grouping_label, s.metric);
                continue;
            }
        };
        let value = ScalarValue::parse(&s.value.1, value_type)?;
        match values.entry(key.to_string()) {
            Entry::Occupied(mut existing) => {
                let merged = merge.combine(*existing.get(), value)?;
                existing.insert(merged);
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }

    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(values))
}
