//! Bridge core: contact directory, routing and orchestration.
//!
//! ## Module Structure
//!
//! - `directory`: Immutable id <-> name lookups (`ContactDirectory`)
//! - `router`: Per-message routing rules (`MessageRouter`)
//! - `recovery`: Failure containment for inbound handlers
//! - `events`: Event sinks handed to the network clients
//! - `orchestrator`: Startup, shutdown and the run loop (`Bridge`)

pub mod directory;
pub mod events;
pub mod orchestrator;
pub mod recovery;
pub mod router;

pub use directory::ContactDirectory;
pub use orchestrator::Bridge;
pub use router::{MessageRouter, RouterSettings};
