//! Command-line configuration.

use anyhow::{Context, Result, bail};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::persistence::{DEFAULT_SAVE_INTERVAL, SavePolicy};
use crate::remote::DEFAULT_RPC_TIMEOUT;
use crate::storage::StoreOptions;

/// Environment variable consulted when `--pass` is not given.
pub const PASSWORD_ENV: &str = "SHORTLINK_PASS";

pub const USAGE: &str = "Usage: shortlink [--http <addr:port>] [--file <path>] [--master <addr:port>] \
[--host <name>] [--pass <secret>] [--policy snapshot|log] [--save-interval <secs>] \
[--rpc-timeout <ms>]";

/// Settings the public handlers need.
#[derive(Debug, Clone)]
pub struct Site {
    /// Host name printed in front of issued keys.
    pub host: String,
    /// Shared write secret, compared for equality.
    pub password: String,
}

impl Site {
    pub fn short_link(&self, key: &str) -> String {
        format!("http://{}/{}", self.host, key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Snapshot,
    Log,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    /// Data file; `None` disables persistence.
    pub data_file: Option<PathBuf>,
    /// Authoritative node to proxy; `None` makes this node authoritative.
    pub master: Option<String>,
    pub site: Site,
    pub policy: PolicyKind,
    pub save_interval: Duration,
    pub rpc_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_file: Some(PathBuf::from("store.json")),
            master: None,
            site: Site {
                host: "localhost:8080".to_string(),
                password: String::new(),
            },
            policy: PolicyKind::Snapshot,
            save_interval: DEFAULT_SAVE_INTERVAL,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
        }
    }
}

impl Config {
    /// Parses flags (without the program name). `password_env` is the value of
    /// `SHORTLINK_PASS`, used only when `--pass` is absent.
    pub fn from_args<I>(args: I, password_env: Option<String>) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut password = None;
        let mut args = args.into_iter();

        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .with_context(|| format!("{} requires a value", flag))
            };
            match flag.as_str() {
                "--http" => {
                    config.listen_addr = value()?.parse().context("invalid --http address")?;
                }
                "--file" => {
                    let file = value()?;
                    config.data_file = (!file.is_empty()).then(|| PathBuf::from(file));
                }
                "--master" => config.master = Some(value()?),
                "--host" => config.site.host = value()?,
                "--pass" => password = Some(value()?),
                "--policy" => {
                    config.policy = match value()?.as_str() {
                        "snapshot" => PolicyKind::Snapshot,
                        "log" => PolicyKind::Log,
                        other => bail!("unknown --policy {:?}, expected snapshot or log", other),
                    };
                }
                "--save-interval" => {
                    let secs: u64 = value()?.parse().context("invalid --save-interval")?;
                    config.save_interval = Duration::from_secs(secs);
                }
                "--rpc-timeout" => {
                    let ms: u64 = value()?.parse().context("invalid --rpc-timeout")?;
                    config.rpc_timeout = Duration::from_millis(ms);
                }
                other => bail!("unknown flag {:?}\n{}", other, USAGE),
            }
        }

        config.site.password = password.or(password_env).unwrap_or_default();
        Ok(config)
    }

    pub fn is_proxy(&self) -> bool {
        self.master.is_some()
    }

    pub fn store_options(&self) -> StoreOptions {
        let policy = match self.policy {
            PolicyKind::Snapshot => SavePolicy::Snapshot {
                debounce: self.save_interval,
            },
            PolicyKind::Log => SavePolicy::AppendLog {
                flush_interval: self.save_interval,
            },
        };
        StoreOptions {
            path: self.data_file.clone(),
            policy,
        }
    }
}
