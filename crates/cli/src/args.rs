use std::path::PathBuf;

use clap::Parser;
use schwab::LOOPBACK_PORT;

/// Obtain a Schwab OAuth access/refresh token pair and store it in a .env file
#[derive(Parser, Debug, Clone)]
#[command(name = "schwab-token")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the .env file. Relative paths resolve against the project root
    /// this binary was built from, or the working directory once that is gone
    #[arg(long = "env", value_name = "PATH", default_value = ".env")]
    pub env: PathBuf,

    /// Redirect URI registered in the Schwab app; takes precedence over every other choice
    #[arg(long, value_name = "URI")]
    pub redirect_uri: Option<String>,

    /// Authorization code (or the whole redirect URL) copied from the browser
    #[arg(long)]
    pub code: Option<String>,

    /// Use the developer portal callback page and paste the code by hand
    #[arg(long)]
    pub manual: bool,

    /// Port of the local callback listener
    #[arg(long, default_value_t = LOOPBACK_PORT)]
    pub port: u16,

    /// Stop waiting for the browser redirect after this many seconds (default: wait forever)
    #[arg(long, value_name = "SECS")]
    pub callback_timeout: Option<u64>,

    /// Print the authorization link instead of launching a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
