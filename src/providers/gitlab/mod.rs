mod client;
#[cfg(test)]
pub(crate) mod fixtures;
mod poller;
mod types;

pub use client::GitLabClient;
pub use poller::{
    stop_signal, PollObserver, PollOutcome, Poller, StopHandle, StopSignal, TerminalStatus,
    DEFAULT_POLL_INTERVAL,
};
pub use types::{Pipeline, TriggerRequest, User};
