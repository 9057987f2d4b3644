use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pandu_core::{
    download_all, load_reference, BatchReport, GenerationQueue, PromptList, QueueEvent,
    StudioConfig, StudioError, StudioSession, UiAspectRatio, ASPECT_RATIO_CHOICES,
};
use pandu_gemini::{GeminiClient, GeminiConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;

mod logging;
mod output;

const CUSTOM_RATIO_NOTE: &str =
    "Note: Custom ratios are approximated to 1:1 for AI generation in this version.";

/// Process outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Every attempted prompt produced an image
    Success,
    /// Some prompts failed
    PartialFailure,
    /// Authorization abort, missing key, or unusable input
    Fatal,
}

impl Exit {
    fn for_report(report: &BatchReport) -> Self {
        if report.aborted.is_some() {
            Self::Fatal
        } else if report.failed > 0 {
            Self::PartialFailure
        } else {
            Self::Success
        }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Success => ExitCode::SUCCESS,
            Exit::PartialFailure => ExitCode::from(1),
            Exit::Fatal => ExitCode::from(2),
        }
    }
}

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file (default: ./pandu.toml if present)");

    Command::new("pandu")
        .version(pandu_core::VERSION)
        .about("Studio Pandu - consistent AI character creator")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging (overridden by RUST_LOG)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("generate")
                .about("Generate one image per prompt featuring the reference characters")
                .arg(
                    Arg::new("character")
                        .long("character")
                        .value_name("[NAME=]PATH")
                        .action(ArgAction::Append)
                        .help("Character reference image (up to 4)"),
                )
                .arg(
                    Arg::new("prompt")
                        .long("prompt")
                        .short('p')
                        .action(ArgAction::Append)
                        .help("Scene description (repeatable)"),
                )
                .arg(
                    Arg::new("prompts-file")
                        .long("prompts-file")
                        .value_parser(value_parser!(PathBuf))
                        .help("File with one prompt per line"),
                )
                .arg(
                    Arg::new("aspect-ratio")
                        .long("aspect-ratio")
                        .short('a')
                        .help("16:9, 9:16, 1:1, 4:3, 3:4 or Custom"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Output directory for downloaded images"),
                )
                .arg(
                    Arg::new("no-download")
                        .long("no-download")
                        .action(ArgAction::SetTrue)
                        .help("Do not write images to disk"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print results and report as JSON"),
                )
                .arg(config_arg.clone()),
        )
        .subcommand(Command::new("ratios").about("List aspect ratio choices"))
        .subcommand(
            Command::new("check-key")
                .about("Check that an API key is configured")
                .arg(config_arg),
        )
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("verbose"), matches.get_flag("log-json"));

    let outcome = match matches.subcommand() {
        Some(("generate", args)) => generate(args).await,
        Some(("ratios", _)) => {
            output::print_ratios(&ASPECT_RATIO_CHOICES, CUSTOM_RATIO_NOTE);
            Ok(Exit::Success)
        }
        Some(("check-key", args)) => check_key(args),
        _ => Ok(Exit::Fatal),
    };

    match outcome {
        Ok(exit) => exit.into(),
        Err(e) => {
            if user_error(&e).is_none() {
                tracing::error!(error = %e, "command failed");
            }
            eprintln!("{}", failure_message(&e));
            Exit::Fatal.into()
        }
    }
}

/// Input problems the user can fix, as opposed to environment failures
fn user_error(err: &anyhow::Error) -> Option<&StudioError> {
    err.downcast_ref::<StudioError>()
        .filter(|e| e.is_user_error())
}

fn failure_message(err: &anyhow::Error) -> String {
    match user_error(err) {
        Some(user) => user.to_string(),
        None => format!("error: {err:#}"),
    }
}

fn load_config(args: &ArgMatches) -> anyhow::Result<StudioConfig> {
    let path = args.get_one::<PathBuf>("config").map(PathBuf::as_path);
    StudioConfig::load(path).context("loading configuration")
}

fn check_key(args: &ArgMatches) -> anyhow::Result<Exit> {
    let config = load_config(args)?;
    Ok(key_status(&config, |key| std::env::var(key).ok()))
}

fn key_status<F>(config: &StudioConfig, lookup: F) -> Exit
where
    F: Fn(&str) -> Option<String>,
{
    if config.resolve_api_key_with(lookup).is_some() {
        println!("API key configured (model: {})", config.api.model);
        Exit::Success
    } else {
        println!("{}", output::missing_key_message(config));
        Exit::Fatal
    }
}

async fn generate(args: &ArgMatches) -> anyhow::Result<Exit> {
    let mut config = load_config(args)?;
    if let Some(out) = args.get_one::<PathBuf>("out") {
        config = config.with_output_dir(out.clone());
    }

    if config.resolve_api_key().is_none() {
        eprintln!("{}", output::missing_key_message(&config));
        return Ok(Exit::Fatal);
    }

    let aspect_ratio = match args.get_one::<String>("aspect-ratio") {
        Some(text) => text.parse::<UiAspectRatio>()?,
        None => config.default_aspect_ratio,
    };
    if aspect_ratio.is_approximated() {
        eprintln!("{CUSTOM_RATIO_NOTE}");
    }

    let mut session = StudioSession::new().with_aspect_ratio(aspect_ratio);
    for spec in args.get_many::<String>("character").into_iter().flatten() {
        let (name, path) = parse_character(spec);
        let reference = load_reference(&path)
            .await
            .with_context(|| format!("loading character reference {}", path.display()))?;
        let slot = session.roster.attach_next(name, reference)?;
        tracing::info!(slot = %slot, path = %path.display(), "character loaded");
    }

    session.prompts = collect_prompts(args).await?;

    let client = GeminiClient::new(GeminiConfig::from_studio(&config))?;
    let (tx, rx) = mpsc::unbounded_channel();
    let queue = GenerationQueue::new(Arc::new(client)).with_events(tx);
    let json = args.get_flag("json");
    tracing::info!(
        backend = queue.generator_name(),
        prompts = session.prompts.valid_prompts().len(),
        aspect_ratio = %aspect_ratio,
        "starting batch"
    );

    let progress = tokio::spawn(render_progress(rx, session.prompts.valid_prompts(), json));
    let report = session.generate_all(&queue).await;
    drop(queue);
    progress.await.context("progress reporter panicked")?;
    let report = report?;

    let saved = if !args.get_flag("no-download") && report.succeeded > 0 {
        let written = download_all(session.results(), &config.output_dir).await;
        if !json {
            output::print_downloads(&written);
        }
        written
    } else {
        Vec::new()
    };

    if json {
        output::print_json(session.results(), &report, &saved, &config.output_dir)?;
    } else {
        output::print_summary(&session, &report);
    }

    Ok(Exit::for_report(&report))
}

/// Split `NAME=PATH`; a bare path keeps the slot's default name
fn parse_character(spec: &str) -> (Option<String>, PathBuf) {
    match spec.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.is_empty() => {
            (Some(name.trim().to_string()), PathBuf::from(path))
        }
        _ => (None, PathBuf::from(spec)),
    }
}

async fn collect_prompts(args: &ArgMatches) -> anyhow::Result<PromptList> {
    let mut prompts: Vec<String> = args
        .get_many::<String>("prompt")
        .into_iter()
        .flatten()
        .cloned()
        .collect();

    if let Some(file) = args.get_one::<PathBuf>("prompts-file") {
        prompts.extend(read_prompts_file(file).await?);
    }

    if prompts.iter().all(|p| p.trim().is_empty()) {
        return Err(StudioError::NoPrompts.into());
    }
    Ok(PromptList::from_prompts(prompts)?)
}

async fn read_prompts_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading prompts from {}", path.display()))?;
    Ok(prompt_lines(&text))
}

fn prompt_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

async fn render_progress(
    mut rx: mpsc::UnboundedReceiver<QueueEvent>,
    prompts: Vec<String>,
    quiet: bool,
) {
    while let Some(event) = rx.recv().await {
        if !quiet {
            output::print_event(&event, &prompts);
        }
    }
}
