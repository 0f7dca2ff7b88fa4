mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::PollProgress;
pub use styling::{dim, magenta_bold};
pub use summary::{print_outcome, print_triggered};

/// Prints the banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🚀 gitlab-trigger"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("GitLab Pipeline Trigger")
    );
}
