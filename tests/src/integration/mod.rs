//! # Integration Scenarios

pub mod call_path;
pub mod harness;
pub mod observers;
pub mod queue_flows;
pub mod subscription_flows;
