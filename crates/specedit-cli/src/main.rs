use anyhow::{Context, Result};
use clap::Parser;
use specedit_config::Config;
use specedit_engine::{
    Cmd, ExternalStrategy, SpecDocument, StrategyKind, StrategyRegistry, StrategyRequest, io,
};
use specedit_syntax::SpecFile;
use std::io::{IsTerminal, Write};
use std::process::ExitCode;

mod args;

use args::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    let config = args
        .config
        .as_ref()
        .map_or_else(Config::load, Config::load_from_path);

    let default_level = match (&config, args.verbose) {
        (_, true) => "debug",
        (Ok(Some(config)), false) => config.log_level.as_deref().unwrap_or("warn"),
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = config
        .context("failed to load configuration")
        .and_then(|config| run(&args, config.unwrap_or_default()));
    match result {
        Ok(output) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(output.as_bytes()).and_then(|_| stdout.flush()) {
                eprintln!("Error: failed to write output: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn registry(config: &Config) -> StrategyRegistry {
    use specedit_config::StrategyKind as ConfigKind;

    let mut registry = StrategyRegistry::with_builtins();
    let kinds = [
        (ConfigKind::Editor, StrategyKind::Editor),
        (ConfigKind::Renderer, StrategyKind::Renderer),
        (ConfigKind::ModelWriter, StrategyKind::ModelWriter),
    ];
    for (configured, kind) in kinds {
        for (name, strategy) in config.strategies_of(configured) {
            log::debug!("registering {kind} {name} from config");
            registry.register_external(
                ExternalStrategy::new(name, &strategy.command).with_args(strategy.args.clone()),
                kind,
            );
        }
    }
    registry
}

/// Side-channel text: the given file, else piped standard input.
fn side_channel(args: &Args) -> Result<String> {
    match &args.side_channel {
        Some(path) => Ok(io::read_spec(path)?),
        None if !std::io::stdin().is_terminal() => Ok(io::read_all(std::io::stdin().lock())?),
        None => Ok(String::new()),
    }
}

/// Run the requested operations and return what should be printed.
fn run(args: &Args, config: Config) -> Result<String> {
    let mut doc = SpecDocument::open(&args.file)?;
    log::info!("parsed {}", args.file.display());

    let needs_side_channel = args.sections_add
        || args.editor().is_some()
        || args.renderer().is_some()
        || args.model_writer().is_some();
    let side_channel = if needs_side_channel {
        side_channel(args).context("failed to read side channel")?
    } else {
        String::new()
    };

    let mut request = StrategyRequest::new().with_side_channel(side_channel);
    for (key, value) in args.params() {
        request = request.with_param(key, value);
    }
    let registry = registry(&config);

    if args.sections_add {
        let overlay = SpecFile::parse(&request.side_channel).context("failed to parse side channel")?;
        doc.apply(Cmd::MergeSections { overlay })?;
    }
    if let Some(name) = args.editor() {
        registry.editor(name)?.edit(&mut doc, &request)?;
    }
    if let Some(name) = args.model_writer() {
        registry.model_writer(name)?.write(&mut doc, &request)?;
    }
    if let Some(name) = args.renderer() {
        return Ok(registry.renderer(name)?.render(&doc, &request)?);
    }

    if args.dump_tree {
        Ok(format!("{:#?}", doc.file().syntax()))
    } else {
        Ok(doc.text())
    }
}
