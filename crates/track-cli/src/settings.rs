use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Track CLI - Trim, clean up and split the tracks of a GPX file
pub struct Settings {
    /// GPX file to load
    #[clap(short, long, value_name = "FILE")]
    pub gpx_file: PathBuf,

    /// Drop every point before this timestamp (RFC 3339, as stored in the file)
    #[clap(long, value_name = "TIMESTAMP")]
    pub trim_before: Option<String>,

    /// Drop every point after this timestamp
    #[clap(long, value_name = "TIMESTAMP")]
    pub trim_after: Option<String>,

    /// Remove the point at this timestamp (repeatable)
    #[clap(short, long, value_name = "TIMESTAMP")]
    pub remove: Vec<String>,

    /// Split the track after the point at this timestamp (repeatable)
    #[clap(short, long, value_name = "TIMESTAMP")]
    pub split_at: Vec<String>,

    /// Recompute elevation-derived values after editing
    #[clap(long, default_value = "false")]
    pub elevation: bool,
}
