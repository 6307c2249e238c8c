//! Change event decoding
//!
//! Batches reach the dispatcher as already-parsed JSON values; this module
//! turns them into typed [`ChangeEvent`]s.

use contracts::ChangeEvent;
use metrics::counter;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{IngestionError, Result};

/// Decode one JSON value
pub fn decode_change_event(value: &Value) -> std::result::Result<ChangeEvent, serde_json::Error> {
    ChangeEvent::deserialize(value)
}

/// Decode raw message bytes
pub fn decode_change_event_slice(bytes: &[u8]) -> Result<ChangeEvent> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decode a whole batch
///
/// The first malformed entry fails the batch.
pub fn decode_batch(values: &[Value]) -> Result<Vec<ChangeEvent>> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            decode_change_event(value).map_err(|e| {
                counter!("streams_sink_decode_failures_total").increment(1);
                IngestionError::Decode {
                    index,
                    message: e.to_string(),
                }
            })
        })
        .collect()
}
