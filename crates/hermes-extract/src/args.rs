//! Positional handler arguments.

use hermes_core::{DispatchError, DispatchResult, Request, ResponseHandle, ScopedLogger};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// One resolved argument.
#[derive(Debug, Clone)]
pub enum Arg {
    /// An extracted (and possibly cast) value.
    Value(Value),
    /// The handler's scoped logger.
    Logger(ScopedLogger),
    /// The request.
    Request(Arc<Request>),
    /// The shared response handle.
    Response(ResponseHandle),
}

/// The positional arguments of one handler invocation.
///
/// Slot `i` holds the argument for parameter `i`, or nothing when the
/// parameter had no binding or its source was absent.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    slots: Vec<Option<Arg>>,
}

impl Arguments {
    /// Wraps resolved slots.
    #[must_use]
    pub fn new(slots: Vec<Option<Arg>>) -> Self {
        Self { slots }
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the argument at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Returns true if slot `index` is unset.
    #[must_use]
    pub fn is_unset(&self, index: usize) -> bool {
        self.get(index).is_none()
    }

    /// Returns the raw JSON value at `index`.
    #[must_use]
    pub fn raw(&self, index: usize) -> Option<&Value> {
        match self.get(index) {
            Some(Arg::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// Deserializes the value at `index`.
    ///
    /// An unset slot deserializes from `null`, so `Option<T>` parameters
    /// read as `None`.
    pub fn value<T: DeserializeOwned>(&self, index: usize) -> DispatchResult<T> {
        let raw = self.raw(index).cloned().unwrap_or(Value::Null);
        serde_json::from_value(raw).map_err(|e| {
            DispatchError::extraction(format!("argument #{index} has an unexpected shape: {e}"))
        })
    }

    /// Returns the logger at `index`.
    #[must_use]
    pub fn logger(&self, index: usize) -> Option<&ScopedLogger> {
        match self.get(index) {
            Some(Arg::Logger(log)) => Some(log),
            _ => None,
        }
    }

    /// Returns the request at `index`.
    #[must_use]
    pub fn request(&self, index: usize) -> Option<&Arc<Request>> {
        match self.get(index) {
            Some(Arg::Request(req)) => Some(req),
            _ => None,
        }
    }

    /// Returns the response handle at `index`.
    #[must_use]
    pub fn response(&self, index: usize) -> Option<&ResponseHandle> {
        match self.get(index) {
            Some(Arg::Response(res)) => Some(res),
            _ => None,
        }
    }

    /// Iterates over the slots in position order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&Arg>> {
        self.slots.iter().map(Option::as_ref)
    }
}
