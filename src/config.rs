//! Command-line and environment configuration.
//!
use std::time::Duration;

use clap::Parser;

use crate::error::{Result, simple_error};
use crate::list::DEFAULT_PAGE_SIZE;
use crate::remote::DEFAULT_USERS_URL;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "account-users",
    version,
    about = "Browse, search and select account users in the terminal"
)]
pub struct Cli {
    /// URL of the JSON document holding `{ "users": [...] }`
    #[arg(long, env = "ACCOUNT_USERS_URL", default_value = DEFAULT_USERS_URL)]
    pub url: String,

    /// Rows per page
    #[arg(long, env = "ACCOUNT_USERS_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Quiet period in milliseconds before a search is applied
    #[arg(long, default_value_t = 1000)]
    pub debounce_ms: u64,

    /// Theme file (created with defaults if missing)
    #[arg(long, default_value = "theme.conf")]
    pub theme: String,

    /// Keybindings file (created with defaults if missing)
    #[arg(long, default_value = "keybinds.conf")]
    pub keybinds: String,

    /// Log file; the terminal itself is taken by the UI
    #[arg(long, env = "ACCOUNT_USERS_LOG", default_value = "account-users.log")]
    pub log_file: String,
}

/// Validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub url: String,
    pub page_size: usize,
    pub debounce: Duration,
    pub theme_path: String,
    pub keybinds_path: String,
}

impl Cli {
    pub fn into_settings(self) -> Result<Settings> {
        if self.page_size == 0 {
            return Err(simple_error("--page-size must be at least 1"));
        }
        if self.url.trim().is_empty() {
            return Err(simple_error("--url must not be empty"));
        }
        Ok(Settings {
            url: self.url,
            page_size: self.page_size,
            debounce: Duration::from_millis(self.debounce_ms),
            theme_path: self.theme,
            keybinds_path: self.keybinds,
        })
    }
}
