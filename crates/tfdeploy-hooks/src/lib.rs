//! tfdeploy lifecycle hooks
//!
//! Phase-based execution of user- and vendor-defined checks around a
//! terraform run.
//!
//! # Overview
//!
//! Hooks model heterogeneous, often slow, external tools: security scanners,
//! linters, cost estimators, notification scripts. The system runs them at
//! five fixed points around terraform execution and enforces two safety
//! properties:
//!
//! 1. A misbehaving check can never silently swallow a failure: every
//!    outcome is classified as success, failure, timeout, or skip.
//! 2. An advisory check can never block deployment by accident: blocking is
//!    a per-hook decision (`fail-on-error`, defaulting to blocking for
//!    safety).
//!
//! # Components
//!
//! - [`HookPhase`]: the five fixed execution points.
//! - [`HookContext`]: immutable deployment facts, serialized to the
//!   `TF_BD_*` environment contract consumed by hook subprocesses.
//! - [`HookRunner`]: runs all hooks for one phase, handling condition
//!   filtering, timeout enforcement, and blocking semantics. Phase
//!   sequencing belongs to the caller.
//! - [`builtin`]: curated adapters (terraform validate, trivy, tflint) that
//!   share one structured-output contract.
//!
//! # Execution model
//!
//! Everything is strictly sequential: one hook at a time, in definition
//! order, within one phase; one phase at a time, driven by the caller. The
//! only suspension point is a subprocess wait, bounded by the per-hook
//! timeout. There is no mid-phase cancellation; a timeout is local to one
//! hook.

pub mod builtin;
pub mod context;
pub mod phase;
pub mod result;
pub mod runner;

pub use builtin::{
    BuiltinHook, BuiltinKind, Finding, HookOutput, TerraformValidate, TflintCheck, TrivyScan,
};
pub use context::HookContext;
pub use phase::HookPhase;
pub use result::{HookResult, TIMEOUT_EXIT_CODE};
pub use runner::HookRunner;
