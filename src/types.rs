use serde::{Deserialize, Serialize};

/// Catalog locale; selects the provider data language and the asset subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize, Deserialize)]
pub enum Locale {
    #[value(name = "fr_FR")]
    FrFr,
    #[value(name = "en_US")]
    EnUs,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::FrFr => "fr_FR",
            Locale::EnUs => "en_US",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// What a failed image download means for the champion's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AssetFailurePolicy {
    /// Log and carry on; only a stage-level error blocks `READY`.
    #[default]
    Continue,
    /// Any failed image leaves the champion `INCOMPLETE`.
    #[value(name = "mark-incomplete")]
    MarkIncomplete,
}
