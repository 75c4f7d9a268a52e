//! Host-facing tool contract, dispatch and the stdio bridge.

pub mod contract;
pub mod dispatch;
pub mod stdio;
