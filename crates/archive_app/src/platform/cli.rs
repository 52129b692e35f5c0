use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "archive_viewer")]
#[command(about = "Browse and administer a message archive server", long_about = None)]
pub(crate) struct Cli {
    /// Location to open, e.g. `site_id=2&query=cat`. Overrides the saved session.
    pub location: Option<String>,
}
