// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use snipsync::{
    config::{Config, FileRemoteSettings},
    path::{default_config_file, default_snippet_file},
    snippet::Snippet,
    store::SnippetStore,
    sync::Reconciler,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use inquire::{validator::ValueRequiredValidator, Text};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
    process::exit,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "snipsync [options] <snipsync-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => default_config_file()?,
        };

        match self.command {
            Command::Init(opts) => run_init(&config_path, opts),
            Command::List(opts) => run_list(&load_config(&config_path)?, opts),
            Command::New(opts) => run_new(&load_config(&config_path)?, opts),
            Command::Sync => run_sync(&load_config(&config_path)?),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Write new configuration file.
    #[command(override_usage = "snipsync init [options]")]
    Init(InitOptions),

    /// Show all snippets.
    #[command(override_usage = "snipsync list [options]")]
    List(ListOptions),

    /// Add new snippet to primary snippet file.
    #[command(override_usage = "snipsync new [options] [<command>]")]
    New(NewOptions),

    /// Sync primary snippet file with remote backend.
    #[command(override_usage = "snipsync sync [options]")]
    Sync,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InitOptions {
    /// Path to primary snippet file.
    #[arg(short, long, value_name = "path")]
    pub snippet_file: Option<PathBuf>,

    /// Directory to scan for additional snippet files.
    #[arg(short = 'd', long = "snippet-dir", value_name = "path")]
    pub snippet_dirs: Vec<PathBuf>,

    /// Path of remote copy used by the file backend.
    #[arg(short, long, value_name = "path")]
    pub remote: Option<PathBuf>,

    /// Overwrite existing configuration file.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ListOptions {
    /// Only show snippets carrying any of these tags.
    #[arg(short, long = "tag", value_name = "tag")]
    pub tags: Vec<String>,

    /// Show one snippet per line.
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct NewOptions {
    /// Command to save. Prompted for if missing.
    #[arg(value_name = "command")]
    pub command: Option<String>,

    /// Brief description of command. Prompted for if missing.
    #[arg(short, long, value_name = "summary")]
    pub description: Option<String>,

    /// Tags of snippet. Prompted for if missing.
    #[arg(short, long = "tag", value_name = "tag")]
    pub tags: Vec<String>,

    /// Expected output of command.
    #[arg(short, long, value_name = "output")]
    pub output: Option<String>,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn load_config(path: &Path) -> Result<Config> {
    let data = read_to_string(path).with_context(|| {
        format!(
            "failed to read configuration file {:?}\nPlease run 'snipsync init' first",
            path.display()
        )
    })?;

    data.parse::<Config>()
        .with_context(|| format!("failed to parse configuration file {:?}", path.display()))
}

fn run_init(config_path: &Path, opts: InitOptions) -> Result<()> {
    if config_path.exists() && !opts.force {
        bail!(
            "configuration file {:?} already exists, use --force to overwrite it",
            config_path.display()
        );
    }

    let mut config = Config::default();
    config.general.snippet_file = match opts.snippet_file {
        Some(path) => path,
        None => default_snippet_file()?,
    };
    config.general.snippet_dirs = opts.snippet_dirs;
    config.file = opts.remote.map(|path| FileRemoteSettings { path });

    if let Some(parent) = config_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        mkdirp::mkdirp(parent)
            .with_context(|| format!("failed to create {:?}", parent.display()))?;
    }
    write(config_path, config.to_string())
        .with_context(|| format!("failed to write {:?}", config_path.display()))?;
    info!("wrote configuration to {:?}", config_path.display());

    // INVARIANT: Primary snippet file must exist for loading to succeed.
    let store = SnippetStore::from_settings(&config.general);
    let snippet_file = store.snippet_file();
    if !snippet_file.exists() {
        if let Some(parent) = snippet_file.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            mkdirp::mkdirp(parent)
                .with_context(|| format!("failed to create {:?}", parent.display()))?;
        }
        write(snippet_file, "")
            .with_context(|| format!("failed to create {:?}", snippet_file.display()))?;
        info!("created empty snippet file {:?}", snippet_file.display());
    }

    Ok(())
}

fn run_list(config: &Config, opts: ListOptions) -> Result<()> {
    let store = SnippetStore::from_settings(&config.general);
    let mut snippets = store.load(true)?;
    if !opts.tags.is_empty() {
        snippets = snippets.filter_by_tags(opts.tags.as_slice());
    }

    for snippet in &snippets {
        if opts.oneline {
            println!("{}", oneline(snippet));
        } else {
            println!("{}", detailed(snippet));
        }
    }

    Ok(())
}

fn run_new(config: &Config, opts: NewOptions) -> Result<()> {
    let command = match opts.command {
        Some(command) => command,
        None => Text::new("Command>")
            .with_validator(ValueRequiredValidator::default())
            .prompt()?,
    };
    if command.trim().is_empty() {
        bail!("command cannot be empty");
    }

    let description = match opts.description {
        Some(description) => description,
        None => Text::new("Description>").prompt()?,
    };

    let tags: Vec<String> = if opts.tags.is_empty() {
        Text::new("Tag>")
            .with_help_message("separate tags with spaces")
            .prompt()?
            .split_whitespace()
            .map(str::to_owned)
            .collect()
    } else {
        opts.tags
    };

    let snippet = Snippet::new(command)
        .with_description(description)
        .with_tags(tags)
        .with_output(opts.output.unwrap_or_default());

    let store = SnippetStore::from_settings(&config.general);
    let mut snippets = store.load_unordered(true)?;
    snippets.push(snippet);
    store.save(&snippets)?;

    if config.general.auto_sync {
        run_sync(config)?;
    }

    Ok(())
}

fn run_sync(config: &Config) -> Result<()> {
    let store = SnippetStore::from_settings(&config.general);
    Reconciler::from_config(&store, config)?.auto_sync()?;

    Ok(())
}

fn oneline(snippet: &Snippet) -> String {
    let command = snippet.command.replace('\n', " ");
    let mut line = format!("[{}]: {command}", snippet.description);
    if !snippet.tags.is_empty() {
        line.push_str(&format!(" #{}", snippet.tags.join(" #")));
    }

    line
}

fn detailed(snippet: &Snippet) -> String {
    let mut out = String::new();
    out.push_str(&format!("    Description: {}\n", snippet.description));
    out.push_str(&format!("        Command: {}\n", snippet.command));
    if !snippet.tags.is_empty() {
        out.push_str(&format!("            Tag: {}\n", snippet.tags.join(" ")));
    }
    if !snippet.output.is_empty() {
        out.push_str(&format!("         Output: {}\n", snippet.output));
    }
    out.push_str(&"-".repeat(30));

    out
}
