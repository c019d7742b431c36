//! `svcsync` command-line entry point

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use svcsync_core::{find_project_root, FormatterKind, Orchestrator, SyncConfig, VERSION};

fn cli() -> Command {
    Command::new("svcsync")
        .version(VERSION)
        .about("Sync Go service implementations with their proto contracts")
        .arg(
            Arg::new("proto")
                .action(ArgAction::Append)
                .value_name("PROTO")
                .help("Sync only this proto file (relative to the current directory)"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("PROTO")
                .help("Sync only this proto file, same as the positional argument"),
        )
        .arg(
            Arg::new("mask")
                .long("mask")
                .value_name("BOOL")
                .value_parser(value_parser!(bool))
                .help("Match implementation files by embedded Unimplemented<Name>Server type [default: true]"),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Project root (default: nearest directory holding go.mod)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (default: <root>/svcsync.toml when present)"),
        )
        .arg(
            Arg::new("formatter")
                .long("formatter")
                .value_parser(["gofmt", "layout"])
                .help("Formatter applied to every written file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v debug, -vv trace)"),
        )
}

fn init_tracing(verbosity: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .init();
}

fn proto_name(matches: &ArgMatches) -> anyhow::Result<Option<String>> {
    let positional: Vec<&String> = matches
        .get_many::<String>("proto")
        .map(|values| values.collect())
        .unwrap_or_default();
    if positional.len() > 1 {
        bail!("precondition violated: multiple proto-names given");
    }
    let named = matches.get_one::<String>("name");
    match (positional.first(), named) {
        (Some(_), Some(_)) => bail!("precondition violated: duplicate proto-name"),
        (Some(name), None) => Ok(Some((*name).clone())),
        (None, named) => Ok(named.cloned()),
    }
}

fn load_config(matches: &ArgMatches, root: &Path) -> anyhow::Result<SyncConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::discover(root)?,
    };
    if let Some(mask) = matches.get_one::<bool>("mask") {
        config = config.with_mask_mode(*mask);
    }
    if let Some(name) = matches.get_one::<String>("formatter") {
        config = config.with_formatter(name.parse::<FormatterKind>()?);
    }
    Ok(config)
}

fn definition_path(root: &Path, middle: &Path, name: &str) -> PathBuf {
    let file = if Path::new(name).extension().is_some_and(|ext| ext == "proto") {
        name.to_string()
    } else {
        format!("{name}.proto")
    };
    root.join(middle).join(file)
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let name = proto_name(matches)?;
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let (root, middle) = match matches.get_one::<PathBuf>("root") {
        Some(root) => {
            let root = if root.is_absolute() { root.clone() } else { cwd.join(root) };
            let middle = cwd.strip_prefix(&root).map(Path::to_path_buf).unwrap_or_default();
            (root, middle)
        }
        None => find_project_root(&cwd)?,
    };

    let config = load_config(matches, &root)
        .with_context(|| format!("failed to load configuration for {}", root.display()))?;
    let orchestrator = Orchestrator::new(&root, config);

    let report = match name {
        Some(name) => {
            let definition = definition_path(&root, &middle, &name);
            orchestrator
                .sync_once(&definition)
                .with_context(|| format!("failed to sync {}", definition.display()))?
        }
        None => orchestrator
            .sync_all()
            .with_context(|| format!("failed to sync services in {}", root.display()))?,
    };

    println!("{report}");
    Ok(())
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
