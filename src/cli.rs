use clap::Parser;
use std::path::PathBuf;

/// List StatusCake tests with their tags, website name and URI.
#[derive(Parser, Debug)]
#[command(name = "statuscake-tests", version, about)]
pub struct Cli {
    /// Account username, sent as the `Username` header
    #[arg(long, env = "STATUSCAKE_USERNAME", value_name = "NAME")]
    pub username: Option<String>,

    /// API key, sent as the `API` header
    #[arg(
        long,
        env = "STATUSCAKE_APIKEY",
        value_name = "KEY",
        hide_env_values = true
    )]
    pub apikey: Option<String>,

    /// Root of the StatusCake API
    #[arg(long, env = "STATUSCAKE_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds (no timeout when unset)
    #[arg(long, env = "STATUSCAKE_TIMEOUT_SECS", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum number of detail requests in flight; output order is unaffected
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub concurrency: usize,

    /// Path to a TOML config file
    #[arg(long, env = "STATUSCAKE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}
