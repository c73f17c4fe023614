use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use rustdoc_implementors::site::{LoadOrder, TraitPath};

const INTROSPECTION_HEADING: &str = "Introspection";

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(long, env = "RUSTDOC_INDEX_COLOR", value_enum, default_value_t = Color::Auto)]
    pub color: Color,
    /// Expose the full error chain when reporting diagnostics.
    #[clap(long, env = "RUSTDOC_INDEX_DEBUG")]
    pub debug: bool,
    #[clap(
        long,
        env = "RUSTDOC_INDEX_LOG",
        help_heading = Some(INTROSPECTION_HEADING),
        hide_short_help = true,
        long_help = "Emit internal logs to the console.\nSet `RUSTDOC_INDEX_LOG=true` to enable this option using an environment variable."
    )]
    pub log: bool,
    #[clap(
        long,
        env = "RUSTDOC_INDEX_LOG_FILTER",
        help_heading = Some(INTROSPECTION_HEADING),
        hide_short_help = true,
        long_help = "Control which logs are emitted if `--log` is enabled.\nIf no filter is specified, it defaults to `info,rustdoc_implementors=debug`."
    )]
    pub log_filter: Option<String>,
    /// An explicit configuration file. By default, `rustdoc-index.yml` is looked up in the doc root.
    #[clap(long, global = true)]
    pub config: Option<Utf8PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

/// Whether to use colors in the output.
#[derive(Copy, Clone, Debug, clap::ValueEnum)]
pub enum Color {
    /// Use colors if the output stream supports them.
    Auto,
    Always,
    Never,
}

/// When the data loader runs, relative to the initialization of the page.
#[derive(Copy, Clone, Debug, clap::ValueEnum)]
pub enum Order {
    /// The page is ready before its data loader runs.
    ControllerFirst,
    /// The data loader runs first. Its batch is parked until the page is ready.
    LoaderFirst,
}

impl From<Order> for LoadOrder {
    fn from(value: Order) -> Self {
        match value {
            Order::ControllerFirst => LoadOrder::ControllerFirst,
            Order::LoaderFirst => LoadOrder::LoaderFirst,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Open the page of a trait and list the implementors it knows about.
    Implementors {
        /// The rustdoc output directory (e.g. `target/doc`).
        #[arg(index = 1)]
        root: Utf8PathBuf,
        /// The path of the trait, e.g. `core::fmt::Display`.
        #[arg(index = 2)]
        trait_path: TraitPath,
        #[clap(long, value_enum, default_value_t = Order::ControllerFirst)]
        order: Order,
        /// Print the registry as JSON.
        #[clap(long)]
        json: bool,
    },
    /// List the sidebar entries of a crate.
    Sidebar {
        /// The rustdoc output directory (e.g. `target/doc`).
        #[arg(index = 1)]
        root: Utf8PathBuf,
        /// The name of the crate, as it appears in the doc root.
        #[arg(index = 2)]
        crate_name: String,
        /// Print the sidebar entries as JSON.
        #[clap(long)]
        json: bool,
    },
    /// Decode every index file in the doc root.
    ///
    /// Fails if a file can't be decoded or if re-encoding it wouldn't
    /// reproduce it byte-for-byte.
    Check {
        /// The rustdoc output directory (e.g. `target/doc`).
        #[arg(index = 1)]
        root: Utf8PathBuf,
    },
    /// Rewrite every data loader in the doc root in canonical form.
    ///
    /// Files that are already canonical are left untouched.
    Normalize {
        /// The rustdoc output directory (e.g. `target/doc`).
        #[arg(index = 1)]
        root: Utf8PathBuf,
    },
}
