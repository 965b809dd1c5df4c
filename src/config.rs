use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{SharedArgs, SyncArgs};
use crate::download::AssetLayout;
use crate::retry::RetryConfig;
use crate::sync::SyncSettings;
use crate::types::{AssetFailurePolicy, Locale};

/// Per-request timeout for every provider and image request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings common to every command.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub assets_dir: PathBuf,
    pub local_details: Option<PathBuf>,
    pub public_prefix: String,
    pub limit: Option<usize>,
    pub asset_timeout: Duration,
    pub max_retries: u32,
    pub workers: u16,
    pub locale: Locale,
    pub failure_policy: AssetFailurePolicy,
    pub no_progress_bar: bool,
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Config {
    /// Build a config from the shared flags plus, for `sync`, its own flags.
    /// Commands without sync flags get the sync defaults.
    pub fn from_cli(shared: &SharedArgs, sync: Option<&SyncArgs>) -> anyhow::Result<Self> {
        let defaults = SyncSettings::default();
        let mut config = Self {
            db_path: expand_tilde(&shared.db),
            assets_dir: expand_tilde(&shared.assets_dir),
            local_details: None,
            public_prefix: crate::download::DEFAULT_PUBLIC_PREFIX.to_string(),
            limit: None,
            asset_timeout: defaults.asset_timeout,
            max_retries: RetryConfig::default().max_retries,
            workers: defaults.workers as u16,
            locale: shared.locale,
            failure_policy: defaults.failure_policy,
            no_progress_bar: false,
        };

        if let Some(args) = sync {
            if args.asset_timeout_secs == 0 {
                anyhow::bail!("--asset-timeout-secs must be greater than zero");
            }
            if !args.public_prefix.starts_with('/') && !args.public_prefix.contains("://") {
                anyhow::bail!(
                    "--public-prefix must be an absolute path or URL, got '{}'",
                    args.public_prefix
                );
            }
            config.local_details = args.local_details.as_deref().map(expand_tilde);
            config.public_prefix = args.public_prefix.clone();
            config.limit = args.limit;
            config.asset_timeout = Duration::from_secs(args.asset_timeout_secs);
            config.max_retries = args.max_retries;
            config.workers = args.workers;
            config.failure_policy = args.asset_failure_policy;
            config.no_progress_bar = args.no_progress_bar;
        }
        Ok(config)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            ..RetryConfig::default()
        }
    }

    pub fn layout(&self) -> AssetLayout {
        AssetLayout::new(
            self.assets_dir.clone(),
            &self.public_prefix,
            self.locale.as_str(),
        )
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            locale: self.locale.as_str().to_string(),
            workers: usize::from(self.workers),
            asset_timeout: self.asset_timeout,
            failure_policy: self.failure_policy,
            limit: self.limit,
            no_progress_bar: self.no_progress_bar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;

    fn parse(args: &[&str]) -> Config {
        let cli = Cli::try_parse_from(args).unwrap();
        let sync = match &cli.command {
            Command::Sync(args) => Some(args),
            _ => None,
        };
        Config::from_cli(&cli.shared, sync).unwrap()
    }

    #[test]
    fn test_expand_tilde_with_home() {
        let result = expand_tilde("~/Documents");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(result, home.join("Documents"));
        }
    }

    #[test]
    fn test_expand_tilde_no_prefix() {
        assert_eq!(
            expand_tilde("/absolute/path"),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(
            expand_tilde("relative/path"),
            PathBuf::from("relative/path")
        );
    }

    #[test]
    fn test_sync_flags_flow_into_settings() {
        let cfg = parse(&[
            "champsync",
            "sync",
            "--limit",
            "3",
            "--workers",
            "4",
            "--asset-timeout-secs",
            "60",
            "--asset-failure-policy",
            "mark-incomplete",
            "--locale",
            "fr_FR",
        ]);
        let settings = cfg.sync_settings();
        assert_eq!(settings.limit, Some(3));
        assert_eq!(settings.workers, 4);
        assert_eq!(settings.asset_timeout, Duration::from_secs(60));
        assert_eq!(settings.failure_policy, AssetFailurePolicy::MarkIncomplete);
        assert_eq!(settings.locale, "fr_FR");
    }

    #[test]
    fn test_non_sync_commands_get_defaults() {
        let cfg = parse(&["champsync", "refresh", "5", "--assets-dir", "/srv/assets"]);
        assert_eq!(cfg.assets_dir, PathBuf::from("/srv/assets"));
        assert_eq!(cfg.workers, 10);
        assert_eq!(cfg.max_retries, 2);
        assert_eq!(
            cfg.layout().icon_url("Ahri"),
            "/data/images/lol/en_US/champions/Ahri/icon/icon.png"
        );
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let cli = Cli::try_parse_from(["champsync", "sync", "--asset-timeout-secs", "0"]).unwrap();
        let Command::Sync(args) = &cli.command else {
            panic!("expected sync");
        };
        assert!(Config::from_cli(&cli.shared, Some(args)).is_err());
    }

    #[test]
    fn test_rejects_relative_public_prefix() {
        let cli = Cli::try_parse_from(["champsync", "sync", "--public-prefix", "images"]).unwrap();
        let Command::Sync(args) = &cli.command else {
            panic!("expected sync");
        };
        assert!(Config::from_cli(&cli.shared, Some(args)).is_err());
    }
}
