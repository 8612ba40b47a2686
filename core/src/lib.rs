//! # Netcache Core
//!
//! Core types for the netcache dispatch-interception layer.
//!
//! This crate defines the vocabulary shared between the middleware and the
//! applications that host it:
//!
//! - **Action**: everything that can travel through the dispatch chain
//!   (lifecycle actions, emitted phase actions, plain actions, thunks)
//! - **Lifecycle payloads**: the `pending` / `success` / `failure` shapes the
//!   middleware emits and the cache entries it reads back from the store
//! - **Request descriptors**: the declarative "fetch this resource"
//!   instruction carried by a lifecycle action
//! - **Environment**: injected dependencies via traits (`Clock`, `Transport`)
//! - **Key paths**: dotted-path lookup into a state snapshot
//!
//! ## Architecture Principles
//!
//! - The middleware never owns or mutates store state; it only reads
//!   snapshots and emits actions
//! - All external dependencies (time, network) are injected behind traits
//! - Payload shapes are plain serde values so any reducer can apply them
//!
//! ## Example
//!
//! ```
//! use netcache_core::action::{LifecycleAction, PhaseTypes};
//! use netcache_core::request::RequestDescriptor;
//!
//! let action = LifecycleAction::new(
//!     PhaseTypes::new("USER_REQUEST", "USER_SUCCESS", "USER_FAILURE"),
//!     RequestDescriptor::get("https://api.com/user"),
//! )
//! .with_cache_path("session.user");
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod action;
pub mod environment;
pub mod path;
pub mod payload;
pub mod request;

pub use action::{
    Action, LifecycleAction, PhaseAction, PhaseTypes, PlainAction, ResponseMapper, Thunk,
    TransformError,
};
pub use environment::{Clock, SystemClock, Transport, TransportError, TransportResponse};
pub use payload::{CacheEntry, LifecyclePayload};
pub use request::{RequestDescriptor, TransportRequest};
