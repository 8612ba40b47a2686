//! Action types flowing through the dispatch chain.
//!
//! The middleware sees four kinds of actions:
//!
//! - [`LifecycleAction`]: the declarative "fetch this resource" instruction
//!   carrying a three-phase type tuple. Only these enter the fetch pipeline.
//! - [`PhaseAction`]: what the middleware emits downstream for each lifecycle
//!   phase (pending, success, failure).
//! - [`PlainAction`]: any ordinary action. Forwarded unchanged.
//! - [`Thunk`]: a function-valued action. Forwarded unchanged, never invoked
//!   or inspected by the middleware.
//!
//! # Passthrough fields
//!
//! A lifecycle action may carry arbitrary fields beyond the recognized
//! control fields. These land in [`LifecycleAction::extra`] and are echoed
//! verbatim onto every emitted [`PhaseAction`]. The control fields that are
//! stripped (never echoed) are exactly [`CONTROL_FIELDS`]: this is an
//! explicit allow-list, not an implicit structural spread.

use crate::payload::LifecyclePayload;
use crate::request::RequestDescriptor;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Control fields recognized on a raw lifecycle action object.
///
/// When a lifecycle action is assembled from a raw JSON object, these keys
/// are consumed by the middleware itself; every other key is a passthrough
/// field copied onto each emitted phase action.
pub const CONTROL_FIELDS: [&str; 4] = ["types", "request", "cache_path", "mapper"];

/// Maps a raw transport response's data into the value stored as `data`.
///
/// The mapper receives the transport result's `data` field and its output
/// replaces it entirely. A mapper error degrades to a failure-phase dispatch
/// rather than propagating up the dispatch chain.
pub type ResponseMapper = Arc<dyn Fn(Value) -> Result<Value, TransformError> + Send + Sync>;

/// Error raised by a [`ResponseMapper`] while reshaping a response.
///
/// The display string becomes the `error` field of the failure payload.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransformError(pub String);

impl TransformError {
    /// Create a transform error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors that can occur when assembling an action from a raw value
#[derive(Debug, Error)]
pub enum ActionParseError {
    /// The `types` field was present but not a three-element string array
    #[error("`types` must be a three-element array of phase names")]
    MalformedTypes,

    /// The action value was not a JSON object
    #[error("Action must be a JSON object")]
    NotAnObject,
}

/// The three-element phase-name tuple of a lifecycle action.
///
/// Identifies the action types emitted for the pending, success, and failure
/// phases of a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTypes {
    /// Action type dispatched before the transport call begins
    pub pending: String,
    /// Action type dispatched when the transport call resolves
    pub success: String,
    /// Action type dispatched when the transport call rejects
    pub failure: String,
}

impl PhaseTypes {
    /// Create a phase tuple from the three phase names
    pub fn new(
        pending: impl Into<String>,
        success: impl Into<String>,
        failure: impl Into<String>,
    ) -> Self {
        Self {
            pending: pending.into(),
            success: success.into(),
            failure: failure.into(),
        }
    }

    /// Parse a phase tuple from a raw `types` value
    ///
    /// # Errors
    ///
    /// Returns [`ActionParseError::MalformedTypes`] unless the value is a
    /// three-element array of strings.
    pub fn from_value(value: &Value) -> Result<Self, ActionParseError> {
        let items = value
            .as_array()
            .filter(|a| a.len() == 3)
            .ok_or(ActionParseError::MalformedTypes)?;

        let mut names = items.iter().map(Value::as_str);
        match (names.next().flatten(), names.next().flatten(), names.next().flatten()) {
            (Some(pending), Some(success), Some(failure)) => {
                Ok(Self::new(pending, success, failure))
            }
            _ => Err(ActionParseError::MalformedTypes),
        }
    }
}

/// A declarative fetch instruction.
///
/// Carries the phase tuple, the request descriptor, an optional cache lookup
/// path into the store snapshot, an optional response mapper, and zero or
/// more passthrough fields echoed on every emitted phase action.
#[derive(Clone)]
pub struct LifecycleAction {
    /// The pending/success/failure phase names
    pub types: PhaseTypes,
    /// What to fetch and how
    pub request: RequestDescriptor,
    /// Dotted key path to a previously stored result in the snapshot
    pub cache_path: Option<String>,
    /// Optional reshaping of the transport result before it becomes `data`
    pub mapper: Option<ResponseMapper>,
    /// Passthrough fields, copied verbatim onto each emitted phase action
    pub extra: Map<String, Value>,
}

impl LifecycleAction {
    /// Create a lifecycle action for the given phases and request
    #[must_use]
    pub fn new(types: PhaseTypes, request: RequestDescriptor) -> Self {
        Self {
            types,
            request,
            cache_path: None,
            mapper: None,
            extra: Map::new(),
        }
    }

    /// Set the cache lookup path (enables the cache gate and TTL stamping)
    #[must_use]
    pub fn with_cache_path(mut self, path: impl Into<String>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Set the response mapper
    #[must_use]
    pub fn with_mapper<F>(mut self, mapper: F) -> Self
    where
        F: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    /// Attach a passthrough field echoed on every emitted phase action
    #[must_use]
    pub fn with_extra_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Assemble a lifecycle action from a raw JSON object.
    ///
    /// The [`CONTROL_FIELDS`] allow-list is consumed; every remaining field
    /// becomes a passthrough field. Raw objects cannot carry a mapper
    /// (functions do not serialize); a `mapper` key is stripped and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ActionParseError::NotAnObject`] for non-objects and
    /// [`ActionParseError::MalformedTypes`] when `types` is not a
    /// three-element string array.
    pub fn from_value(value: Value) -> Result<Self, ActionParseError> {
        let Value::Object(mut fields) = value else {
            return Err(ActionParseError::NotAnObject);
        };

        let types = fields
            .remove("types")
            .ok_or(ActionParseError::MalformedTypes)
            .and_then(|t| PhaseTypes::from_value(&t))?;

        let request = fields
            .remove("request")
            .map_or_else(RequestDescriptor::default, RequestDescriptor::from_value);

        let cache_path = fields
            .remove("cache_path")
            .and_then(|p| p.as_str().map(String::from));

        // A serialized mapper is meaningless; strip it so it can never leak
        // into the passthrough fields or the transport call.
        fields.remove("mapper");

        Ok(Self {
            types,
            request,
            cache_path,
            mapper: None,
            extra: fields,
        })
    }
}

// Manual Debug implementation since ResponseMapper doesn't implement Debug
impl fmt::Debug for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleAction")
            .field("types", &self.types)
            .field("request", &self.request)
            .field("cache_path", &self.cache_path)
            .field("mapper", &self.mapper.as_ref().map(|_| "<fn>"))
            .field("extra", &self.extra)
            .finish()
    }
}

impl PartialEq for LifecycleAction {
    fn eq(&self, other: &Self) -> bool {
        let mappers_match = match (&self.mapper, &other.mapper) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };

        self.types == other.types
            && self.request == other.request
            && self.cache_path == other.cache_path
            && self.extra == other.extra
            && mappers_match
    }
}

/// An emitted lifecycle phase action.
///
/// Exactly what the middleware hands to the downstream continuation for the
/// pending, success, and failure phases: the phase name, the lifecycle
/// payload, and the passthrough fields from the originating action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseAction {
    /// The phase name (one element of the originating phase tuple)
    #[serde(rename = "type")]
    pub kind: String,
    /// The lifecycle payload for this phase
    pub payload: LifecyclePayload,
    /// Passthrough fields echoed from the originating lifecycle action
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PhaseAction {
    /// Create a phase action with the given passthrough fields
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        payload: LifecyclePayload,
        extra: Map<String, Value>,
    ) -> Self {
        Self {
            kind: kind.into(),
            payload,
            extra,
        }
    }
}

/// An ordinary action with no lifecycle semantics
#[derive(Debug, Clone, PartialEq)]
pub struct PlainAction {
    /// The action type
    pub kind: String,
    /// Any remaining fields of the action
    pub fields: Map<String, Value>,
}

impl PlainAction {
    /// Create a plain action with the given type and no extra fields
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// Attach a field to the action
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

/// A function-valued (thunk) action.
///
/// The middleware forwards thunks unchanged and never invokes them; invoking
/// is the job of whatever thunk support sits further down the chain.
#[derive(Clone)]
pub struct Thunk(Arc<dyn Fn() -> Action + Send + Sync>);

impl Thunk {
    /// Wrap a function as a thunk action
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Action + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the wrapped function
    ///
    /// Provided for downstream thunk support; the middleware itself never
    /// calls this.
    #[must_use]
    pub fn invoke(&self) -> Action {
        (self.0)()
    }

    /// Whether two thunks wrap the same function
    #[must_use]
    pub fn same_fn(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thunk(<fn>)")
    }
}

impl PartialEq for Thunk {
    fn eq(&self, other: &Self) -> bool {
        self.same_fn(other)
    }
}

/// Everything that can travel through the dispatch chain
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A declarative fetch instruction; enters the lifecycle pipeline
    Lifecycle(LifecycleAction),
    /// An emitted lifecycle phase action
    Phase(PhaseAction),
    /// An ordinary action; forwarded unchanged
    Plain(PlainAction),
    /// A function-valued action; forwarded unchanged, never invoked here
    Thunk(Thunk),
}

impl Action {
    /// Classify a raw JSON value as an action.
    ///
    /// An object carrying a `types` field is a lifecycle action; anything
    /// else is a plain action whose `type` field (if any) becomes its kind.
    ///
    /// # Errors
    ///
    /// Returns [`ActionParseError`] when a `types` field is present but
    /// malformed, or when the value is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, ActionParseError> {
        match value {
            Value::Object(fields) if fields.contains_key("types") => {
                LifecycleAction::from_value(Value::Object(fields)).map(Self::Lifecycle)
            }
            Value::Object(mut fields) => {
                let kind = fields
                    .remove("type")
                    .and_then(|t| t.as_str().map(String::from))
                    .unwrap_or_default();
                Ok(Self::Plain(PlainAction { kind, fields }))
            }
            _ => Err(ActionParseError::NotAnObject),
        }
    }

    /// The action type, when the action has one
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Lifecycle(_) | Self::Thunk(_) => None,
            Self::Phase(phase) => Some(&phase.kind),
            Self::Plain(plain) => Some(&plain.kind),
        }
    }

    /// The emitted phase action, when this is one
    #[must_use]
    pub const fn as_phase(&self) -> Option<&PhaseAction> {
        match self {
            Self::Phase(phase) => Some(phase),
            _ => None,
        }
    }
}
