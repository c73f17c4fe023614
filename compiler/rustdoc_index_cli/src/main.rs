use std::fmt::{Display, Formatter};
use std::process::ExitCode;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Parser;
use owo_colors::OwoColorize;
use rustdoc_implementors::config::{ConfigLoader, SiteConfig};
use rustdoc_implementors::site::{DocSite, LoadOrder, TraitPath};
use rustdoc_implementors::{literal, sidebar};
use supports_color::Stream;
use tracing_log_error::log_error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::command::{Cli, Color, Command};

mod command;

fn main() -> Result<ExitCode, miette::Error> {
    let cli = Cli::parse();
    init_miette_hook(&cli);
    if cli.log {
        init_telemetry(cli.log_filter.clone(), cli.color)?;
    }

    let config_file = cli.config.clone();
    match cli.command {
        Command::Implementors {
            root,
            trait_path,
            order,
            json,
        } => load_site(root, config_file).and_then(|site| {
            implementors(&site, &trait_path, order.into(), json, cli.color)
        }),
        Command::Sidebar {
            root,
            crate_name,
            json,
        } => load_site(root, config_file)
            .and_then(|site| sidebar_entries(&site, &crate_name, json, cli.color)),
        Command::Check { root } => load_site(root, config_file).and_then(|site| check(&site)),
        Command::Normalize { root } => {
            load_site(root, config_file).and_then(|site| normalize(&site))
        }
    }
    .map_err(anyhow2miette)
}

fn load_site(
    root: Utf8PathBuf,
    config_file: Option<Utf8PathBuf>,
) -> Result<DocSite, anyhow::Error> {
    let mut loader = ConfigLoader::new().root(root.as_std_path());
    if let Some(file) = config_file {
        loader = loader.file(file);
    }
    let config: SiteConfig = loader.load()?;
    Ok(DocSite::new(root, config))
}

#[tracing::instrument("List implementors", skip(site, color))]
fn implementors(
    site: &DocSite,
    trait_path: &TraitPath,
    order: LoadOrder,
    json: bool,
    color: Color,
) -> Result<ExitCode, anyhow::Error> {
    let page = site.open_page(trait_path, order)?;
    let registry = page.registry();
    if json {
        let output = serde_json::to_string_pretty(registry)
            .context("Failed to serialize the implementors registry")?;
        println!("{output}");
        return Ok(ExitCode::SUCCESS);
    }

    let colored = use_color_on_stdout(color);
    for (subject, records) in registry.iter() {
        if colored {
            println!("{}", subject.bold().green());
        } else {
            println!("{subject}");
        }
        for record in records {
            let marker = if record.is_synthetic() { " (synthetic)" } else { "" };
            println!("    {}{marker}", record.text());
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tracing::instrument("List sidebar entries", skip(site, color))]
fn sidebar_entries(
    site: &DocSite,
    crate_name: &str,
    json: bool,
    color: Color,
) -> Result<ExitCode, anyhow::Error> {
    let items = site.load_sidebar(crate_name)?;
    if json {
        let output = serde_json::to_string_pretty(&items)
            .context("Failed to serialize the sidebar entries")?;
        println!("{output}");
        return Ok(ExitCode::SUCCESS);
    }

    let colored = use_color_on_stdout(color);
    for (kind, entries) in items.iter() {
        if colored {
            println!("{}", kind.bold().cyan());
        } else {
            println!("{kind}");
        }
        for entry in entries {
            if entry.summary.is_empty() {
                println!("    {}", entry.name);
            } else {
                println!("    {}: {}", entry.name, entry.summary);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tracing::instrument("Check doc root", skip_all, fields(root = %site.root()))]
fn check(site: &DocSite) -> Result<ExitCode, anyhow::Error> {
    let mut n_problems = 0usize;
    let mut n_files = 0usize;

    for file in site.discover_data_loaders()? {
        n_files += 1;
        let outcome = fs_err::read_to_string(&file.path)
            .map_err(anyhow::Error::from)
            .and_then(|source| {
                let batch = literal::parse(&source)?;
                Ok(literal::emit(&batch) == source)
            });
        n_problems += report(&file.path, outcome);
    }
    for file in site.discover_sidebars()? {
        n_files += 1;
        let outcome = fs_err::read_to_string(&file.path)
            .map_err(anyhow::Error::from)
            .and_then(|source| {
                let items = sidebar::parse(&source)?;
                Ok(sidebar::emit(&items) == source)
            });
        n_problems += report(&file.path, outcome);
    }

    if n_problems > 0 {
        eprintln!("{n_problems} of {n_files} index files have problems");
        return Ok(ExitCode::FAILURE);
    }
    eprintln!("{n_files} index files checked");
    Ok(ExitCode::SUCCESS)
}

/// Returns the number of problems found for a file: `0` or `1`.
fn report(path: &camino::Utf8Path, outcome: Result<bool, anyhow::Error>) -> usize {
    match outcome {
        Ok(true) => 0,
        Ok(false) => {
            tracing::warn!(file = %path, "The file is not in canonical form");
            eprintln!("{path}: not in canonical form, run `rustdoc-index normalize` to fix it");
            1
        }
        Err(e) => {
            log_error!(*e, file = %path, "Failed to decode an index file");
            eprintln!("{path}: {e:#}");
            1
        }
    }
}

#[tracing::instrument("Normalize doc root", skip_all, fields(root = %site.root()))]
fn normalize(site: &DocSite) -> Result<ExitCode, anyhow::Error> {
    let mut n_written = 0usize;
    for file in site.discover_data_loaders()? {
        let batch = site.load_data_loader(&file.trait_path)?.into_batch();
        if site.write_data_loader(&file.trait_path, &batch)? {
            n_written += 1;
            eprintln!("Rewrote {}", file.path);
        }
    }
    eprintln!("{n_written} data loaders rewritten");
    Ok(ExitCode::SUCCESS)
}

fn init_telemetry(log_filter: Option<String>, color: Color) -> Result<(), miette::Error> {
    let filter = log_filter.unwrap_or_else(|| "info,rustdoc_implementors=debug".to_owned());
    let filter_layer = EnvFilter::try_new(&filter)
        .map_err(|e| miette::miette!("Invalid log filter `{filter}`: {e}"))?;
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_color_on_stderr(color))
        .with_file(false)
        .with_target(false)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_timer(tracing_subscriber::fmt::time::uptime());
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
    Ok(())
}

fn init_miette_hook(cli: &Cli) {
    let is_debug = cli.debug;
    let color = cli.color;
    let _ = miette::set_hook(Box::new(move |_| {
        let mut handler = miette::MietteHandlerOpts::new();
        if !is_debug {
            handler = handler.without_cause_chain();
        }
        match color {
            Color::Auto => {}
            Color::Always => {
                handler = handler.color(true);
            }
            Color::Never => {
                handler = handler.color(false);
            }
        }
        Box::new(handler.build())
    }));
}

/// Route an [`anyhow::Error`] through the `miette` report handler.
fn anyhow2miette(err: anyhow::Error) -> miette::Error {
    miette::Error::from(CommandError(err))
}

#[derive(Debug, miette::Diagnostic)]
struct CommandError(anyhow::Error);

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.chain().nth(1)
    }
}

fn use_color_on_stdout(color_profile: Color) -> bool {
    match color_profile {
        Color::Auto => supports_color::on(Stream::Stdout).is_some(),
        Color::Always => true,
        Color::Never => false,
    }
}

fn use_color_on_stderr(color_profile: Color) -> bool {
    match color_profile {
        Color::Auto => supports_color::on(Stream::Stderr).is_some(),
        Color::Always => true,
        Color::Never => false,
    }
}
