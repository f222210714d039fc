mod script;

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use chrono::Utc;
use serde::Deserialize;

use triage_core::config::TriageConfig;
use triage_core::fixture::load_collection;
use triage_core::persistence::PreferenceStore;
use triage_core::persistence::Preferences;
use triage_core::reducer::TriageEvent;
use triage_core::resolution::resolve_effective_action;
use triage_core::resolution::FallbackTable;
use triage_core::state::Category;
use triage_core::state::LogLevel;
use triage_core::state::TriageState;
use triage_core::window::project;
use triage_exec::collaborators::SimulatedCollaborators;
use triage_exec::dispatch::Session;

use crate::script::describe_event;
use crate::script::parse_script;
use crate::script::replay;

const APP_DIR: &str = "swipe-triage";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_help();
        return Ok(());
    };

    match command.as_str() {
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("triage {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "inspect" => {
            let opts = parse_options(args.collect::<Vec<_>>(), 1)?;
            inspect(opts)
        }
        "replay" => {
            let opts = parse_options(args.collect::<Vec<_>>(), 2)?;
            replay_script(opts)
        }
        _ => {
            print_help();
            Err(format!("unknown command: {command}").into())
        }
    }
}

#[derive(Debug, Default)]
struct Options {
    positional: Vec<PathBuf>,
    config: Option<PathBuf>,
    prefs: Option<PathBuf>,
    no_prefs: bool,
    category: Option<Category>,
    verbose: bool,
}

fn parse_options(args: Vec<String>, positional: usize) -> Result<Options, Box<dyn std::error::Error>> {
    let mut opts = Options::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            flag @ ("--config" | "--prefs" | "--category") => {
                let Some(value) = args.get(i + 1) else {
                    return Err(format!("{flag} requires a value").into());
                };
                match flag {
                    "--config" => opts.config = Some(PathBuf::from(value)),
                    "--prefs" => opts.prefs = Some(PathBuf::from(value)),
                    _ => opts.category = Some(parse_category(value)?),
                }
                i += 2;
            }
            "--no-prefs" => {
                opts.no_prefs = true;
                i += 1;
            }
            "--verbose" | "-v" => {
                opts.verbose = true;
                i += 1;
            }
            other if other.starts_with('-') => {
                return Err(format!("unsupported argument: {other}").into());
            }
            other => {
                opts.positional.push(PathBuf::from(other));
                i += 1;
            }
        }
    }
    if opts.positional.len() != positional {
        return Err(format!(
            "expected {positional} path argument(s), got {}",
            opts.positional.len()
        )
        .into());
    }
    Ok(opts)
}

fn parse_category(value: &str) -> Result<Category, Box<dyn std::error::Error>> {
    match value {
        "primary" => Ok(Category::Primary),
        "promotional" => Ok(Category::Promotional),
        other => Err(format!("unknown category: {other}").into()),
    }
}

/// `config.toml`: the core tunables plus host-side file locations.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CliConfig {
    #[serde(flatten)]
    triage: TriageConfig,
    fallback_table: Option<PathBuf>,
    preferences: Option<PathBuf>,
}

fn load_config(explicit: Option<&Path>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml")) {
            Some(path) if path.exists() => path,
            _ => return Ok(CliConfig::default()),
        },
    };
    let raw = fs::read_to_string(&path)
        .map_err(|err| format!("read config {}: {err}", path.display()))?;
    let config: CliConfig =
        toml::from_str(&raw).map_err(|err| format!("parse config {}: {err}", path.display()))?;
    Ok(config)
}

fn build_state(opts: &Options, config: &CliConfig) -> Result<TriageState, Box<dyn std::error::Error>> {
    let category = opts.category.unwrap_or(Category::Primary);
    let collection = load_collection(&opts.positional[0], category)?;
    let mut state = TriageState::new(config.triage.clone(), collection);
    if let Some(path) = config.fallback_table.as_deref() {
        let text = fs::read_to_string(path)
            .map_err(|err| format!("read fallback table {}: {err}", path.display()))?;
        let table = FallbackTable::from_yaml(&text).map_err(|err| err.to_string())?;
        state = state.with_fallback_table(table);
    }
    Ok(state)
}

fn open_store(opts: &Options, config: &CliConfig) -> Result<Option<PreferenceStore>, Box<dyn std::error::Error>> {
    if opts.no_prefs {
        return Ok(None);
    }
    let path = opts
        .prefs
        .clone()
        .or_else(|| config.preferences.clone())
        .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR).join("preferences.jsonl")));
    match path {
        Some(path) => Ok(Some(PreferenceStore::open(path)?)),
        None => Ok(None),
    }
}

fn inspect(opts: Options) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(opts.config.as_deref())?;
    let mut state = build_state(&opts, &config)?;
    if let Some(store) = open_store(&opts, &config)? {
        let Preferences {
            overrides,
            has_seen_first_card_hint,
        } = store.preferences()?;
        state = state.with_preferences(overrides, has_seen_first_card_hint);
    }

    for category in Category::ALL {
        println!(
            "{}: {} unseen",
            category.label(),
            state.collection.unseen_count(category)
        );
    }
    print_window(&state);
    Ok(())
}

fn replay_script(opts: Options) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(opts.config.as_deref())?;
    let script_path = &opts.positional[1];
    let text = fs::read_to_string(script_path)
        .map_err(|err| format!("read script {}: {err}", script_path.display()))?;
    let script = parse_script(&text)?;

    let mut state = build_state(&opts, &config)?;
    let store = open_store(&opts, &config)?;
    let prefs_path = store.as_ref().map(|store| store.path().to_path_buf());
    if let Some(store) = store.as_ref() {
        let prefs = store.preferences()?;
        state = state.with_preferences(prefs.overrides, prefs.has_seen_first_card_hint);
    }

    let mut session = Session::new(state, SimulatedCollaborators::new(script.collaborators.clone()));
    if let Some(store) = store {
        session = session.with_store(store);
    }

    let start = script.start.unwrap_or_else(Utc::now);
    let reports = replay(&mut session, &script.steps, start);
    for report in &reports {
        println!(
            "[{}] {} @ {}",
            report.index,
            report.label,
            report.at.format("%H:%M:%S")
        );
        for event in &report.events {
            if opts.verbose || !matches!(event, TriageEvent::DragProgressed { .. }) {
                println!("    {}", describe_event(event));
            }
        }
    }

    let state = session.state();
    println!();
    print_window(state);
    if let Some(path) = prefs_path {
        println!("preferences: {}", path.display());
    }
    let executed = session.collaborators().executed();
    if !executed.is_empty() {
        println!("executed:");
        for request in executed {
            println!("  {} on {}", request.action.action_id, request.card_id);
        }
    }
    let feedback = session.collaborators().feedback();
    if !feedback.is_empty() {
        println!("classification feedback:");
        for item in feedback {
            println!("  {}: {} -> {}", item.card_id, item.from.label(), item.to.label());
        }
    }

    let floor = if opts.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let mut logs = state.logs.at_least(floor).peekable();
    if logs.peek().is_some() {
        println!("logs:");
        for entry in logs {
            println!(
                "  [{}] {}{}: {}",
                entry.level.label(),
                entry.source.label(),
                entry
                    .context
                    .as_deref()
                    .map(|context| format!(" ({context})"))
                    .unwrap_or_default(),
                entry.message
            );
        }
    }
    Ok(())
}

fn print_window(state: &TriageState) {
    let filtered = state.collection.filtered();
    println!(
        "stack [{}] {} card(s){}",
        state.active_category().label(),
        filtered.len(),
        if state.exhausted { ", all caught up" } else { "" }
    );
    if state.should_show_first_card_hint() {
        println!("  (first-card hint pending)");
    }
    for projected in project(&filtered, state.cursor, state.config.stack.lookahead) {
        let depth = projected.depth();
        if depth.hidden {
            println!("  +{} {} (hidden)", projected.stack_offset, projected.card.id);
            continue;
        }
        let action = resolve_effective_action(projected.card, &state.overrides, &state.fallback_table);
        println!(
            "  +{} {} [{}] scale {:.2} opacity {:.2} -> {} ({})",
            projected.stack_offset,
            projected.card.id,
            projected.card.priority.label(),
            depth.scale,
            depth.opacity,
            action.label,
            action.source.label()
        );
    }
}

fn print_help() {
    println!("triage {}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  triage inspect INBOX [--category primary|promotional]");
    println!("  triage replay INBOX SCRIPT [--category primary|promotional] [--verbose]");
    println!("  triage --help");
    println!("  triage --version");
    println!("Options:");
    println!("  --config PATH   config.toml (default: <config dir>/{APP_DIR}/config.toml)");
    println!("  --prefs PATH    preference log (default: <data dir>/{APP_DIR}/preferences.jsonl)");
    println!("  --no-prefs      do not read or write preferences");
}
