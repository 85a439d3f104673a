//! Background pollers
//!
//! Each poller is an independent task that re-collects one part of the
//! dashboard on a fixed interval, so requests are served from a warm cache.
//!
//! ```text
//!   PollerHandle ──commands──▶ PollerActor ──tick──▶ Dashboard
//!                                   │                  ├─ check_websites(force)
//!                                   │                  └─ refresh_all()
//!                                   └── PollNow / UpdateInterval / Shutdown
//! ```

pub mod messages;
pub mod poller;

pub use messages::{PollJob, PollerCommand};
pub use poller::{PollerActor, PollerHandle};
