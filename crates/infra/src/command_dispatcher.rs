//! Command execution pipeline for the event-sourced aggregates.
//!
//! ```text
//! Command
//!   ↓
//! 1. Load the aggregate's stream
//!   ↓
//! 2. Rehydrate (apply history in sequence order)
//!   ↓
//! 3. Handle the command (pure decision, produces events)
//!   ↓
//! 4. Append with an exact expected version
//!   ↓
//! 5. Apply the new events and hand back the updated aggregate
//! ```
//!
//! Domain failures, store failures and decoding failures are folded into
//! [`DispatchError`] so services expose a single error type.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use moneydesk_core::{Aggregate, AggregateId, DomainError, ExpectedVersion};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Optimistic concurrency failure (stale stream version).
    #[error("concurrency conflict: {0}")]
    Concurrency(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// The command does not fit the aggregate's current state.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found")]
    NotFound,
    /// Historical payload could not be decoded into the aggregate event type.
    #[error("failed to decode stored event: {0}")]
    Deserialize(String),
    #[error(transparent)]
    Store(EventStoreError),
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(msg),
            other => DispatchError::Store(other),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
            DomainError::InvariantViolation(msg) => DispatchError::InvariantViolation(msg),
            DomainError::Conflict(msg) => DispatchError::Conflict(msg),
            DomainError::NotFound => DispatchError::NotFound,
        }
    }
}

/// Reusable command execution engine over any [`EventStore`].
#[derive(Debug)]
pub struct CommandDispatcher<S> {
    store: S,
}

impl<S> CommandDispatcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: EventStore> CommandDispatcher<S> {
    /// Run `command` against the aggregate identified by `aggregate_id`.
    ///
    /// `make_aggregate` builds the empty instance history is replayed onto.
    /// Returns the aggregate with the new events applied; a command that
    /// decides no events returns the rehydrated state unchanged.
    pub fn dispatch<A>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        command: A::Command,
        make_aggregate: impl FnOnce(AggregateId) -> A,
    ) -> Result<A, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: moneydesk_events::Event + Serialize + DeserializeOwned,
    {
        let history = self.store.load_stream(aggregate_type, aggregate_id)?;
        validate_loaded_stream(aggregate_id, &history)?;
        let expected = ExpectedVersion::Exact(stream_version(&history));

        let mut aggregate = make_aggregate(aggregate_id);
        apply_history(&mut aggregate, &history)?;

        let decided = aggregate.handle(&command)?;
        if decided.is_empty() {
            return Ok(aggregate);
        }

        let uncommitted = decided
            .iter()
            .map(|ev| UncommittedEvent::from_typed(aggregate_id, aggregate_type, Uuid::now_v7(), ev))
            .collect::<Result<Vec<_>, _>>()?;

        self.store.append(uncommitted, expected)?;

        for ev in &decided {
            aggregate.apply(ev);
        }
        Ok(aggregate)
    }

    /// Rehydrate an aggregate without running a command.
    ///
    /// `None` when the stream is empty.
    pub fn load<A>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        make_aggregate: impl FnOnce(AggregateId) -> A,
    ) -> Result<Option<A>, DispatchError>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let history = self.store.load_stream(aggregate_type, aggregate_id)?;
        if history.is_empty() {
            return Ok(None);
        }
        validate_loaded_stream(aggregate_id, &history)?;

        let mut aggregate = make_aggregate(aggregate_id);
        apply_history(&mut aggregate, &history)?;
        Ok(Some(aggregate))
    }

    /// Rehydrate every aggregate of a type.
    pub fn load_all<A>(
        &self,
        aggregate_type: &str,
        make_aggregate: impl Fn(AggregateId) -> A,
    ) -> Result<Vec<A>, DispatchError>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let mut out = Vec::new();
        for id in self.store.list_streams(aggregate_type)? {
            if let Some(aggregate) = self.load(id, aggregate_type, &make_aggregate)? {
                out.push(aggregate);
            }
        }
        Ok(out)
    }

    /// Remove an aggregate's history. `NotFound` if there was none.
    pub fn delete(&self, aggregate_id: AggregateId, aggregate_type: &str) -> Result<(), DispatchError> {
        if self.store.delete_stream(aggregate_type, aggregate_id)? {
            Ok(())
        } else {
            Err(DispatchError::NotFound)
        }
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(
    aggregate_id: AggregateId,
    stream: &[StoredEvent],
) -> Result<(), DispatchError> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            ))));
        }
        if e.sequence_number <= last {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }
    Ok(())
}
