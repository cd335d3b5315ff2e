use std::sync::Mutex;

use moneydesk_core::{AggregateId, ExpectedVersion};

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
use crate::store::KeyValueStore;

/// Event store persisting each stream as one JSON array under
/// `{namespace}/{aggregate_type}/{aggregate_id}`.
#[derive(Debug)]
pub struct KeyValueEventStore<K> {
    kv: K,
    namespace: String,
    // Serializes the read-check-write of `append`.
    append_lock: Mutex<()>,
}

impl<K> KeyValueEventStore<K> {
    pub fn new(kv: K, namespace: impl Into<String>) -> Self {
        Self {
            kv,
            namespace: namespace.into(),
            append_lock: Mutex::new(()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn into_inner(self) -> K {
        self.kv
    }

    fn stream_prefix(&self, aggregate_type: &str) -> String {
        format!("{}/{}/", self.namespace, aggregate_type)
    }

    fn stream_key(&self, aggregate_type: &str, aggregate_id: AggregateId) -> String {
        format!("{}{}", self.stream_prefix(aggregate_type), aggregate_id)
    }

    fn current_version(stream: &[StoredEvent]) -> u64 {
        stream.last().map(|e| e.sequence_number).unwrap_or(0)
    }
}

impl<K: KeyValueStore> KeyValueEventStore<K> {
    fn read_stream(&self, key: &str) -> Result<Vec<StoredEvent>, EventStoreError> {
        match self.kv.get(key)? {
            None => Ok(vec![]),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| EventStoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

impl<K: KeyValueStore> EventStore for KeyValueEventStore<K> {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        if events.is_empty() {
            return Ok(vec![]);
        }

        // All events must target the same stream.
        let aggregate_id = events[0].aggregate_id;
        let aggregate_type = events[0].aggregate_type.clone();

        for (idx, e) in events.iter().enumerate() {
            if e.aggregate_id != aggregate_id {
                return Err(EventStoreError::InvalidAppend(format!(
                    "batch contains multiple aggregate_ids (index {idx})"
                )));
            }
            if e.aggregate_type != aggregate_type {
                return Err(EventStoreError::AggregateTypeMismatch(format!(
                    "batch contains multiple aggregate_types (index {idx})"
                )));
            }
        }

        let key = self.stream_key(&aggregate_type, aggregate_id);

        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| EventStoreError::InvalidAppend("lock poisoned".to_string()))?;

        let mut stream = self.read_stream(&key)?;
        let current = Self::current_version(&stream);

        if !expected_version.matches(current) {
            return Err(EventStoreError::Concurrency(format!(
                "expected {expected_version:?}, found {current}"
            )));
        }

        let mut next = current + 1;
        let mut committed = Vec::with_capacity(events.len());
        for e in events {
            committed.push(StoredEvent {
                event_id: e.event_id,
                aggregate_id: e.aggregate_id,
                aggregate_type: e.aggregate_type,
                sequence_number: next,
                event_type: e.event_type,
                event_version: e.event_version,
                occurred_at: e.occurred_at,
                payload: e.payload,
            });
            next += 1;
        }
        stream.extend(committed.iter().cloned());

        let raw = serde_json::to_string(&stream)
            .map_err(|e| EventStoreError::InvalidAppend(format!("stream serialization failed: {e}")))?;
        self.kv.set(&key, raw)?;

        Ok(committed)
    }

    fn load_stream(
        &self,
        aggregate_type: &str,
        aggregate_id: AggregateId,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let key = self.stream_key(aggregate_type, aggregate_id);
        let mut stream = self.read_stream(&key)?;
        stream.sort_by_key(|e| e.sequence_number);
        Ok(stream)
    }

    fn list_streams(&self, aggregate_type: &str) -> Result<Vec<AggregateId>, EventStoreError> {
        let prefix = self.stream_prefix(aggregate_type);
        self.kv
            .keys_with_prefix(&prefix)?
            .into_iter()
            .map(|key| {
                key[prefix.len()..]
                    .parse::<AggregateId>()
                    .map_err(|e| EventStoreError::Corrupt {
                        key: key.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect()
    }

    fn delete_stream(
        &self,
        aggregate_type: &str,
        aggregate_id: AggregateId,
    ) -> Result<bool, EventStoreError> {
        let key = self.stream_key(aggregate_type, aggregate_id);
        Ok(self.kv.remove(&key)?)
    }
}
