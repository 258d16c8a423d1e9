// Keymodes CLI
// Loads mode definitions and traces how typed keys are dispatched

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use keymodes_core::config::Config;
use keymodes_core::{
    parse_key_sequence, BindingTarget, Combo, DispatchResult, Dispatcher, Host, KeyLookup,
    KeySequence, Keymap,
};

/// Modal key binding tracer
#[derive(Parser, Debug)]
#[command(name = "keymodes")]
#[command(version)]
#[command(about = "Trace modal key bindings defined in a TOML file", long_about = None)]
struct Args {
    /// TOML mode definition file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Keys to feed, e.g. "F2 4 j ESC ESC ESC" (reads stdin lines when absent)
    #[arg(short, long, value_name = "KEYS")]
    keys: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate config and exit
    #[arg(long)]
    check_config: bool,

    /// List defined modes and their bindings
    #[arg(long)]
    list_modes: bool,
}

/// Host side of the trace: a pending-input queue and the `[global]` keymap
struct TraceHost {
    queue: VecDeque<Combo>,
    global: Keymap,
    global_pending: KeySequence,
}

impl TraceHost {
    fn new(global: Keymap) -> Self {
        Self {
            queue: VecDeque::new(),
            global,
            global_pending: KeySequence::new(),
        }
    }
}

impl Host for TraceHost {
    fn push_pending_events(&mut self, events: &KeySequence) {
        for combo in events.iter().rev() {
            self.queue.push_front(combo.clone());
        }
    }

    fn preserve_prefix_state(&mut self) {
        log::trace!("prefix argument kept for the next command");
    }

    fn global_keymap(&self) -> &Keymap {
        &self.global
    }

    fn status_label_changed(&mut self, label: Option<&str>) {
        println!("  [status: {}]", label.unwrap_or("-"));
    }
}

/// Commands the config refers to that the tracer stands in for
fn referenced_commands(config: &Config) -> Vec<String> {
    let mode_names: Vec<&str> = config.modes.iter().map(|m| m.name.as_str()).collect();
    let mut names: Vec<String> = Vec::new();
    let mut add = |name: &str| {
        if !mode_names.contains(&name) && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };

    for command in config.global_commands() {
        add(command);
    }
    for mode in &config.modes {
        for hook in mode.on_enable.iter().chain(mode.on_disable.iter()) {
            add(hook);
        }
        for bind in &mode.bind {
            if let Some(command) = &bind.command {
                add(command);
            }
            if let Some(to) = &bind.to {
                if parse_key_sequence(to).is_err() {
                    add(to);
                }
            }
            for command in bind.run.iter().flatten() {
                add(command);
            }
        }
    }
    names
}

fn build_dispatcher(config: &Config) -> anyhow::Result<Dispatcher> {
    let mut dispatcher = Dispatcher::new();
    for name in referenced_commands(config) {
        if dispatcher.commands().contains(&name) {
            continue;
        }
        dispatcher.commands_mut().define_fn(name, |invocation| {
            println!(
                "  run {} (prefix {})",
                invocation.name(),
                invocation.prefix_arg()
            );
            Ok(())
        })?;
    }
    for definition in config.to_definitions()? {
        let name = definition.name.clone();
        dispatcher
            .define_mode(definition)
            .with_context(|| format!("defining mode '{}'", name))?;
    }
    Ok(dispatcher)
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    if let Some(path) = &args.config {
        return Config::from_toml_path(path)
            .with_context(|| format!("loading {}", path.display()));
    }
    match Config::default_path() {
        Some(path) if path.exists() => {
            log::info!("Using {}", path.display());
            Config::from_toml_path(&path).with_context(|| format!("loading {}", path.display()))
        }
        _ => {
            log::warn!("No config file found, starting with no modes");
            Ok(Config::default())
        }
    }
}

fn list_modes(dispatcher: &Dispatcher) {
    for mode in dispatcher.modes().iter() {
        println!("{} [{}]", mode.name(), mode.label());
        for (keys, target) in mode.table().private().iter() {
            // Sentinel-marked halves of translate pairs are internal
            if matches!(target, BindingTarget::Keys(_)) {
                continue;
            }
            println!("  {:<16} {}", keys.to_string(), target);
        }
    }
}

/// Run one key through the dispatcher, falling back to the global keymap
fn feed(dispatcher: &mut Dispatcher, host: &mut TraceHost, combo: Combo) -> anyhow::Result<()> {
    let label = combo.to_string();
    let result = dispatcher.process_key(host, combo)?;
    match result {
        DispatchResult::Unhandled(keys) => {
            for combo in keys.iter() {
                host.global_pending.push(combo.clone());
            }
            let pending = host.global_pending.clone();
            let command = match host.global.lookup(&pending) {
                KeyLookup::Prefix => {
                    println!("{:<12} global prefix", label);
                    return Ok(());
                }
                KeyLookup::Bound(target) => target.command_name().map(String::from),
                KeyLookup::Unbound => None,
            };
            host.global_pending = KeySequence::new();
            match command {
                Some(command) => {
                    println!("{:<12} global -> {}", label, command);
                    let outcome = dispatcher.run_command(host, &command)?;
                    log::debug!("{:?}", outcome);
                }
                None => {
                    println!("{:<12} self-insert {}", label, pending);
                    dispatcher.reset_prefix_arg();
                }
            }
        }
        other => println!("{:<12} {:?}", label, other),
    }
    Ok(())
}

fn trace(dispatcher: &mut Dispatcher, host: &mut TraceHost, desc: &str) -> anyhow::Result<()> {
    let keys = parse_key_sequence(desc).with_context(|| format!("parsing keys '{}'", desc))?;
    host.queue.extend(keys.iter().cloned());
    while let Some(combo) = host.queue.pop_front() {
        if let Err(e) = feed(dispatcher, host, combo) {
            eprintln!("error: {:#}", e);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if args.verbose {
        "debug"
    } else {
        "warn"
    }))
    .init();

    let config = load_config(&args)?;
    let mut dispatcher = build_dispatcher(&config)?;

    if args.check_config {
        println!(
            "Configuration is valid: {} modes, {} global bindings",
            dispatcher.modes().len(),
            config.global.len()
        );
        return Ok(());
    }

    if args.list_modes {
        list_modes(&dispatcher);
        return Ok(());
    }

    let mut host = TraceHost::new(config.global_keymap());
    if let Some(keys) = &args.keys {
        return trace(&mut dispatcher, &mut host, keys);
    }

    if dispatcher.modes().is_empty() && config.global.is_empty() {
        bail!("nothing to trace: no modes or global bindings defined");
    }
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Err(e) = trace(&mut dispatcher, &mut host, &line) {
            eprintln!("error: {:#}", e);
        }
    }
    Ok(())
}
