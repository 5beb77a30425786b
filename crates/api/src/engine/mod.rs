//! Generation workflow engine: fire-and-forget dispatch and the
//! poll-driven status reconciler.

pub mod dispatch;
pub mod reconcile;
