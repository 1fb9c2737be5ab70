//! GitHub PR lifecycle management
//!
//! Deployment statuses, trigger-comment reactions, result comments, and
//! environment lock cleanup, all via the `gh` CLI. API failures here are
//! logged and swallowed so notification problems never fail a deployment.

mod lifecycle;

pub use lifecycle::LifecycleManager;
