//! Pump threads: the background workers moving packets between the
//! transport and the handoff queue, one per direction.
//!
//! Both pumps run a cancellable loop on a dedicated thread and share the
//! same teardown discipline: whatever makes the loop exit, the ingest pump
//! closes its queue so a blocked consumer observes EOF instead of hanging,
//! and the egress pump exits once its queue is closed and drained or
//! cancellation is requested.

mod egress;
mod ingest;

pub use egress::EgressPump;
pub use ingest::IngestPump;
