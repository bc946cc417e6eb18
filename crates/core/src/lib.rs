//! Krait core types (Milestone 0)
//!
//! Everything in this crate is pure: resource descriptors and URL rules,
//! request construction, patch negotiation, watch-line decoding and the
//! error taxonomy. No IO, no async, no locks.

#![forbid(unsafe_code)]

pub mod error;
pub mod kinds;
pub mod meta;
pub mod params;
pub mod patch;
pub mod request;
pub mod resource;
pub mod response;
pub mod watch;

pub use error::{ApiError, ApiErrorKind, Error, ErrorBody, Result};
pub use meta::{
    DeleteResult, ListMeta, ObjectList, ObjectMeta, OwnerReference, PartialObjectMetadata, Scale,
    ScaleSpec, ScaleStatus, Status, StatusDetails,
};
pub use params::{
    DeleteOptions, FieldValidation, GetOptions, ListOptions, LogOptions, PatchOptions, PostOptions,
    Preconditions, PropagationPolicy, VersionMatch, WatchOptions,
};
pub use patch::{Patch, PatchOperation};
pub use request::{Method, Request, RequestBuilder};
pub use resource::{Loggable, Resource, ResourceDescriptor, Scalable, Scope};
pub use response::Response;
pub use watch::{Bookmark, EventType, WatchEvent};
