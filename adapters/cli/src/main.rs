#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Stream Siege session headlessly from a script.

mod config;
mod script;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use stream_siege_core::{Command, Event, GameMode};
use stream_siege_system_chat_commands::Locale;
use stream_siege_system_simulation::Simulation;
use stream_siege_world::query;
use tracing_subscriber::EnvFilter;

use crate::{
    config::CliConfig,
    script::{Script, ScriptAction},
};

const DEMO_SCRIPT: &str = include_str!("../scripts/demo.txt");

/// Headless Stream Siege session driven by a timed chat script.
#[derive(Debug, Parser)]
#[command(name = "stream-siege", version, about)]
struct Args {
    /// TOML file overriding simulation tunables.
    #[arg(long, value_name = "TOML")]
    config: Option<PathBuf>,
    /// Script of timed chat lines and platform events; a built-in demo runs when omitted.
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,
    /// Simulated seconds to run before stopping.
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,
    /// Frames per simulated second, overriding the config file.
    #[arg(long)]
    fps: Option<u32>,
    /// Directory holding the per-mode saves; persistence is off when omitted.
    #[arg(long, value_name = "DIR")]
    save_dir: Option<PathBuf>,
    /// Platform the session runs for.
    #[arg(long, value_enum, default_value_t = ModeArg::Offline)]
    mode: ModeArg,
    /// Chat keyword language, overriding the config file.
    #[arg(long)]
    locale: Option<Locale>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Youtube,
    Tiktok,
    Offline,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Youtube => Self::YouTube,
            ModeArg::Tiktok => Self::TikTok,
            ModeArg::Offline => Self::Offline,
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = CliConfig::load(args.config.as_deref())?;
    let source = match &args.script {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?,
        None => DEMO_SCRIPT.to_owned(),
    };
    let mut script = Script::parse(&source)?;
    let fps = args.fps.unwrap_or(config.fps);
    anyhow::ensure!(fps > 0, "--fps must be positive");
    let limit = Duration::try_from_secs_f32(args.seconds)
        .context("--seconds must be a non-negative number")?;
    let frame = Duration::from_secs(1) / fps;

    let mut simulation = Simulation::new(
        config.simulation,
        args.locale.unwrap_or(config.locale),
        args.save_dir,
    );
    println!("{}", query::welcome_banner(simulation.world()));
    tracing::info!(entries = script.len(), fps, seconds = args.seconds, "session starting");

    if !config.terrain.is_empty() {
        simulation.apply(Command::ConfigureTerrain {
            blocked: config.terrain,
        });
    }
    simulation.apply(Command::SelectMode {
        mode: args.mode.into(),
    });

    let mut now = Duration::ZERO;
    while now < limit && !simulation.is_finished() {
        for entry in script.due(now) {
            match &entry.action {
                ScriptAction::Chat { viewer, name, text } => {
                    simulation.chat(viewer.clone(), name, text);
                }
                ScriptAction::Command(command) => simulation.apply(command.clone()),
            }
        }
        let events = simulation.update(frame);
        now += frame;
        report(now, &events);
    }

    summarize(&simulation);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn report(now: Duration, events: &[Event]) {
    let at = now.as_secs_f32();
    for event in events {
        match event {
            Event::PhaseChanged { phase } => println!("[{at:>7.2}s] phase -> {phase:?}"),
            Event::WaveStarted { wave, spawn_boss } => {
                let boss = if *spawn_boss { " (boss)" } else { "" };
                println!("[{at:>7.2}s] wave {} begins{boss}", wave + 1);
            }
            Event::WaveCleared { wave, bonus_xp } => {
                println!("[{at:>7.2}s] wave {} cleared, +{bonus_xp} xp", wave + 1);
            }
            Event::CastleDestroyed { team } => println!("[{at:>7.2}s] {team:?} castle destroyed"),
            Event::UltimateCast { viewer, kind, .. } => {
                println!("[{at:>7.2}s] {} casts {kind:?}", viewer.as_str());
            }
            Event::MatchEnded { result } => {
                println!(
                    "[{at:>7.2}s] match over: {} points, rank {:?}",
                    result.score, result.rank
                );
            }
            _ => {}
        }
    }
}

fn summarize(simulation: &Simulation) {
    let world = simulation.world();
    println!(
        "phase {:?} | wave {} | kills {} | gold {} | economy score {}",
        query::phase(world),
        query::wave_index(world) + 1,
        query::total_kills(world),
        query::gold(world),
        query::economy_score(world),
    );
    for line in query::kill_log(world) {
        println!("  {line}");
    }
}
