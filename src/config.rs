//! Command-line configuration.

use crate::infrastructure::{DEFAULT_BASE_URL, FileSlot};
use clap::Parser;
use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;

/// Name of the slot holding the saved addresses.
pub const DEFAULT_SLOT: &str = "userAddress";

#[derive(Debug, Parser)]
#[command(name = "cepbook", version, about = "Terminal address book with CEP lookup")]
pub struct Args {
    /// Directory holding the saved addresses [default: the platform data directory]
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Name of the slot the addresses are stored under
    #[arg(long, value_name = "KEY", default_value = DEFAULT_SLOT)]
    pub slot: String,

    /// Base URL of the ViaCEP service
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub lookup_url: String,

    /// Seconds to wait for a CEP lookup
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub lookup_timeout: u64,

    /// Log file [default: cepbook.log in the data directory]
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// View to open first: "/", "/formUser" or "/formUser/<id>"
    #[arg(long, value_name = "PATH", default_value = "/")]
    pub route: String,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub slot: String,
    pub lookup_url: String,
    pub lookup_timeout: Duration,
    pub log_file: PathBuf,
    pub initial_route: String,
}

impl Settings {
    pub fn from_args(args: Args) -> Self {
        let data_dir = args.data_dir.unwrap_or_else(default_data_dir);
        let log_file = args
            .log_file
            .unwrap_or_else(|| data_dir.join("cepbook.log"));
        Self {
            data_dir,
            slot: args.slot,
            lookup_url: args.lookup_url,
            lookup_timeout: Duration::from_secs(args.lookup_timeout),
            log_file,
            initial_route: args.route,
        }
    }

    pub fn slot(&self) -> FileSlot {
        FileSlot::new(&self.data_dir, &self.slot)
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("br", "cepbook", "cepbook")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
