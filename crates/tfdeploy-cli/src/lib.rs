//! tfdeploy command-line interface
//!
//! ChatOps for Terraform deployments driven by pull-request comments. The
//! comment-trigger step runs upstream in the workflow; this binary consumes
//! its outputs (flags plus `TF_BD_*` environment) and owns everything from
//! configuration resolution to the terraform subprocess.

pub mod actions;
pub mod commands;
pub mod output;
pub mod pipeline;
