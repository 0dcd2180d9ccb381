// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use bulkgrid_app::{AppState, SchemaId};
use bulkgrid_store::{Client, InMemoryStore, RecordStore};
use bulkgrid_testkit::ContentFaker;
use config::Config;
use runtime::StoreRuntime;
use std::env;
use std::path::PathBuf;
use tracing::info;

const DEMO_SEED: u64 = 42;
const DEMO_ARTICLES: usize = 120;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    match cli.action {
        Action::Help => {
            print_help();
            Ok(())
        }
        Action::PrintConfigPath => {
            println!("{}", cli.config_path.display());
            Ok(())
        }
        Action::PrintExampleConfig => {
            print!("{}", Config::example_config(&cli.config_path));
            Ok(())
        }
        Action::Check | Action::Launch => start(&cli),
    }
}

fn start(cli: &CliOptions) -> Result<()> {
    let config = Config::load(&cli.config_path).with_context(|| {
        format!(
            "cannot use {}; `bulkgrid --print-example-config` prints a working template",
            cli.config_path.display()
        )
    })?;
    logging::init(config.log_level(), &config.log_path()?)?;

    let initial_schema = cli
        .schema
        .clone()
        .map(SchemaId::from)
        .or_else(|| config.initial_schema());
    let check_only = cli.action == Action::Check;

    if cli.demo {
        let content = ContentFaker::new(DEMO_SEED).demo_content(DEMO_ARTICLES);
        info!(
            schemas = content.schemas.len(),
            records = content.records.len(),
            "seeded demo store"
        );
        let store = InMemoryStore::new(content.schemas, content.records);
        if check_only {
            return Ok(());
        }
        return launch(store, &config, initial_schema);
    }

    let token = config.token()?;
    let client = Client::new(
        config.base_url(),
        config.space_id()?,
        config.environment(),
        &token,
        config.timeout()?,
    )
    .with_context(|| {
        format!(
            "[store] in {} does not describe a reachable space; fix base_url, space_id or environment",
            cli.config_path.display()
        )
    })?;
    if check_only {
        client.ping().context("check store connection")?;
        info!(
            base_url = client.base_url(),
            space = client.space_id(),
            environment = client.environment(),
            "store reachable"
        );
        return Ok(());
    }

    launch(client, &config, initial_schema)
}

fn launch<S: RecordStore>(
    store: S,
    config: &Config,
    initial_schema: Option<SchemaId>,
) -> Result<()> {
    let mut state = AppState::new(config.locale());
    let mut runtime = StoreRuntime::new(store, config.page_size())
        .with_hidden_prefixes(config.hide_schema_prefixes())
        .with_initial_schema(initial_schema);
    bulkgrid_tui::run_app(&mut state, &mut runtime)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Launch,
    Check,
    Help,
    PrintConfigPath,
    PrintExampleConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    action: Action,
    config_path: PathBuf,
    demo: bool,
    schema: Option<String>,
}

impl CliOptions {
    fn set_action(&mut self, action: Action) -> Result<()> {
        if self.action != Action::Launch && self.action != action {
            bail!("{action:?} and {:?} cannot be combined; pick one", self.action);
        }
        self.action = action;
        Ok(())
    }
}

fn parse_cli_args<I, S>(args: I, config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cli = CliOptions {
        action: Action::Launch,
        config_path,
        demo: false,
        schema: None,
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_ref() {
            "--config" => {
                let path = args.next().ok_or_else(|| {
                    anyhow!("--config needs a path, e.g. --config ./bulkgrid.toml")
                })?;
                cli.config_path = PathBuf::from(path.as_ref());
            }
            "--schema" => {
                let id = args.next().ok_or_else(|| {
                    anyhow!("--schema needs a schema id, e.g. --schema article")
                })?;
                cli.schema = Some(id.as_ref().to_owned());
            }
            "--demo" => cli.demo = true,
            "--check" => cli.set_action(Action::Check)?,
            "--print-config-path" => cli.set_action(Action::PrintConfigPath)?,
            "--print-example-config" => cli.set_action(Action::PrintExampleConfig)?,
            "--help" | "-h" => cli.set_action(Action::Help)?,
            other => bail!("unrecognized argument {other:?}; see `bulkgrid --help`"),
        }
    }

    Ok(cli)
}

fn print_help() {
    print!(
        "\
bulkgrid: spreadsheet-style bulk editing for CMS records

usage: bulkgrid [--config <path>] [--schema <id>] [--demo] [--check]

  --config <path>          Read settings from this file
  --schema <id>            Open this schema first
  --demo                   Edit generated content held in memory
  --check                  Validate settings and store access, then exit
  --print-config-path      Print where the config file is read from
  --print-example-config   Print a config template
  -h, --help               Show this help
"
    );
}
