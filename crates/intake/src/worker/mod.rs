pub mod poller;

pub use poller::{Poller, PollerStatus, StartOutcome};
