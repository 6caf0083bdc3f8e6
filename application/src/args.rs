//! Command line [`Args`].

use clap::Parser;

/// REST API server of the car dealership: sales, rentals, contracts and
/// payments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the TOML [`Config`] file, which may be absent.
    ///
    /// [`Config`]: crate::Config
    #[arg(short, long, env = "CONF_PATH", default_value = "config.toml")]
    pub config: String,
}

impl Args {
    /// Parses [`Args`] of the current process.
    ///
    /// # Errors
    ///
    /// If unknown or malformed arguments are provided, or help or version is
    /// requested.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}
