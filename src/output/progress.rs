use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::trace;

use crate::providers::gitlab::{Pipeline, PollObserver, TerminalStatus};

use super::styling::{bright, bright_red, bright_yellow, for_terminal_status};

/// Spinner shown while waiting for a pipeline to finish
pub struct PollProgress {
    pb: ProgressBar,
    polls: usize,
}

impl PollProgress {
    pub fn start(pipeline_id: u64, interval: Duration) -> Self {
        eprintln!("{}  {}", bright("⏳"), bright("Waiting").underlined());
        let pb = create_spinner(
            bright_yellow(format!(
                "Checking pipeline {pipeline_id} every {}s",
                interval.as_secs()
            ))
            .to_string(),
        );
        Self { pb, polls: 0 }
    }

    pub fn finish(self, status: TerminalStatus) {
        let mark = if status.is_success() { "✓" } else { "✗" };
        let message = for_terminal_status(status, format!("Pipeline {status} {mark}"));
        self.pb.finish_with_message(message.to_string());
        eprintln!();
    }

    pub fn abandon(self, reason: &str) {
        self.pb
            .abandon_with_message(bright_red(format!("Stopped waiting: {reason}")).to_string());
        eprintln!();
    }
}

impl PollObserver for PollProgress {
    fn on_snapshot(&mut self, pipeline: &Pipeline) {
        self.polls += 1;
        self.pb.set_message(
            bright_yellow(format!(
                "Pipeline {} is {} (check #{})",
                pipeline.id, pipeline.status, self.polls
            ))
            .to_string(),
        );
    }

    fn on_wait(&mut self, delay: Duration) {
        self.pb.tick();
        trace!("next status check in {delay:?}");
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner} {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
