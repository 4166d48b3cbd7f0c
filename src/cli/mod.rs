pub mod healthcheck;
pub mod once;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Evicts least recently touched cache entries when disk space runs low"
)]
pub struct Args {
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub healthcheck: bool,
    /// Run a single pass on every root and exit
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub once: bool,
    #[arg(long)]
    pub check_bind: Option<String>,
    /// Cache root, a trailing `*` matches every sibling directory with that prefix [env: DATA_DIR]
    #[arg(long)]
    pub data_dir: Option<String>,
    /// Start cleaning when free space is at or below this value [env: CLEANER_KEEP_FREE]
    #[arg(long)]
    pub keep_free: Option<String>,
    /// Stop cleaning once free space exceeds this value [env: CLEANER_FREE]
    #[arg(long)]
    pub free: Option<String>,
    /// Seconds between passes [env: CLEANER_INTERVAL_SECS]
    #[arg(long)]
    pub interval_secs: Option<u64>,
}
