use crate::tool_id::ReleaseChannel;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // Release builds are tagged
    if let Some(tag) = option_env!("OKDTOOLS_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("OKDTOOLS_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("OKDTOOLS_GIT_BRANCH").unwrap_or("unknown");

    // Built once at startup
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "okdtools")]
#[command(about = "Install and remove versioned OpenShift / OKD command-line tools")]
#[command(version = get_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Result document format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Arguments shared by `install` and `remove`.
#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    /// Executable to manage (openshift-install, okd-install, oc)
    pub tool: String,

    /// Release version (e.g. '4.9.10' or '4.9.0-0.okd-2021-11-28-035710')
    #[arg(value_name = "VERSION")]
    pub release: String,

    /// Directory where executables are installed [default: $HOME/bin]
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Manage the unversioned symlink (e.g. oc -> oc-4.9.10)
    #[arg(short, long)]
    pub symlink: bool,

    /// Leave the unversioned symlink alone even when the config enables it
    #[arg(long, conflicts_with = "symlink")]
    pub no_symlink: bool,

    /// Release channel for 'oc'; inferred from the version when omitted
    #[arg(long, value_enum)]
    pub channel: Option<ReleaseChannel>,

    /// Report what would change without changing anything
    #[arg(long)]
    pub check: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ensure a versioned executable is installed
    #[command(
        after_help = "Examples:\n  okdtools install openshift-install 4.9.10 --symlink\n  okdtools install okd-install 4.9.0-0.okd-2021-11-28-035710 --dir /usr/local/bin"
    )]
    Install(ToolArgs),

    /// Ensure a versioned executable (and its symlink with --symlink) is removed
    Remove(ToolArgs),

    /// Reconcile every tool listed in a YAML manifest
    Apply {
        /// Path to the manifest
        manifest: PathBuf,

        /// Report what would change without changing anything
        #[arg(long)]
        check: bool,
    },

    /// Print the download URL of a release archive
    Url {
        tool: String,
        #[arg(value_name = "VERSION")]
        release: String,
        #[arg(long, value_enum)]
        channel: Option<ReleaseChannel>,
    },

    /// List installed versions in the executable directory
    List {
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Manage okdtools configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show the current version
    Version,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a configuration setting
    Get {
        /// Key to get (if omitted, shows all settings)
        key: Option<String>,
    },
    /// Set a configuration setting
    Set {
        /// Key and value (e.g., 'executable-dir=/usr/local/bin' or 'symlink true')
        #[arg(trailing_var_arg = true, required = true)]
        args: Vec<String>,
    },
    /// Reset a configuration setting to its default
    Unset {
        /// Key to unset (e.g., 'scratch-dir')
        key: String,
    },
    /// Show the effective configuration
    Show,
}
