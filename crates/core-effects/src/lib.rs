//! Effect vocabulary shared by the scheduler and the renderer.
//!
//! This crate owns the static catalog of effect kinds (`EffectRegistry`), the
//! shape of a live effect (`EffectInstance`), and the typed outcomes of a
//! submission (`Rejection`). It holds no mutable engine state, which keeps the
//! scheduler -> renderer dependency strictly one-way: both depend on this
//! crate, neither depends on the other.
//!
//! Lifecycle of an instance:
//! - `Queued`: accepted, waiting for the next tick boundary.
//! - `Active`: visible to the renderer.
//! - `Expired` / `Cancelled`: terminal. Ids are never reused.
//! - Rejected requests never receive an id; the `Rejection` is the outcome.

pub mod error;
pub mod instance;
pub mod kind;
pub mod registry;
pub mod request;

pub use error::{EffectError, Rejection};
pub use instance::{
    CancelReason, CooldownKey, EffectDuration, EffectInstance, InstanceId, InstanceState, Origin,
    Target, Ticket,
};
pub use kind::{Applicability, Category, EffectKind, ExclusivityGroup};
pub use registry::{DurationRange, EffectKindDescriptor, EffectRegistry};
pub use request::EffectRequest;
