use clap::Parser;
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Download artifacts into a local content-addressed cache",
    long_about = "Fetches a URL into a local store, reusing the cached object when it already\n\
                  matches the expected digest. The artifact can then be exposed at another\n\
                  path through a symlink, hard link or copy."
)]
pub struct CliArgs {
    /// URL of the artifact to fetch
    #[arg(
        required_unless_present = "platform",
        help = "URL of the artifact to download"
    )]
    pub url: Option<String>,

    /// Parent directory of the download store
    #[arg(
        long,
        help = "Directory holding the store (default: the per-user application data directory)"
    )]
    pub store_root: Option<PathBuf>,

    /// Store directory name
    #[arg(
        long,
        help = "Name of the store directory under the store root (default: $FILESTREAM_GLOBAL_STORE or \"filestream\")"
    )]
    pub store_name: Option<String>,

    /// Object naming schema
    #[arg(
        long,
        default_value = "sharded",
        value_parser = ["direct", "sharded"],
        help = "How objects are named inside the store"
    )]
    pub schema: String,

    /// Digest algorithm for sharding and validation
    #[arg(
        short,
        long,
        default_value = "sha256",
        help = "Digest algorithm used for sharded names and --hash (md5, sha1, sha256, sha512)"
    )]
    pub algorithm: String,

    /// Expected digest of the artifact
    #[arg(
        long,
        help = "Expected hex digest; a cached object is reused only when it matches"
    )]
    pub hash: Option<String>,

    /// Materialization target
    #[arg(
        short,
        long,
        help = "Expose the downloaded artifact at this path (symlink, hard link or copy)"
    )]
    pub output: Option<PathBuf>,

    /// Network timeout in seconds
    #[arg(
        long,
        default_value = "15",
        help = "Connect and read timeout in seconds (0 disables)"
    )]
    pub timeout: u64,

    /// Custom HTTP headers for download requests
    #[arg(
        long = "header",
        short = 'H',
        help = "Add custom HTTP header to requests (can be used multiple times). Format: 'Name: Value'",
        value_name = "HEADER"
    )]
    pub headers: Vec<String>,

    /// Show a progress bar
    #[arg(
        short = 'P',
        long = "progress",
        default_value = "false",
        help = "Show a progress bar while downloading"
    )]
    pub show_progress: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,

    /// Print platform information
    #[arg(
        long,
        help = "Print the detected operating system, architecture and storage root, then exit"
    )]
    pub platform: bool,
}
