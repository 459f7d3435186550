//! Tank Arena headless runner
//!
//! Plays one match at full speed with no presentation layer and prints the
//! final snapshot as JSON. Human tanks receive no input.

use std::process;

use tank_arena::Settings;
use tank_arena::sim::{GameMode, MatchPhase, MatchState, TickInput, tick};

struct Args {
    mode: GameMode,
    seed: Option<u64>,
    settings: Option<String>,
    ticks: Option<u64>,
}

fn usage() -> ! {
    eprintln!("usage: tank-arena [--mode pvp|pvc|demo] [--seed N] [--settings PATH] [--ticks N]");
    process::exit(2);
}

fn parse_args(args: &[String]) -> Args {
    let mut parsed = Args {
        mode: GameMode::Demo,
        seed: None,
        settings: None,
        ticks: None,
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let Some(value) = iter.next() else {
            usage();
        };
        match arg.as_str() {
            "--mode" => parsed.mode = GameMode::from_str(value).unwrap_or_else(|| usage()),
            "--seed" => parsed.seed = Some(value.parse().unwrap_or_else(|_| usage())),
            "--settings" => parsed.settings = Some(value.clone()),
            "--ticks" => parsed.ticks = Some(value.parse().unwrap_or_else(|_| usage())),
            _ => usage(),
        }
    }
    parsed
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&args);

    let mut settings = match &args.settings {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    if args.seed.is_some() {
        settings.match_config.seed = args.seed;
    }
    let tick_rate = u64::from(settings.match_config.tick_rate);

    let mut state = match MatchState::new(settings) {
        Ok(state) => state,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };
    if let Err(e) = state.start(args.mode) {
        log::error!("Failed to start match: {}", e);
        process::exit(1);
    }
    log::info!("Tank Arena (headless) running {:?} with seed {}", args.mode, state.seed);

    let input = TickInput::default();
    let limit = args.ticks.unwrap_or(u64::MAX);
    let mut last = state.snapshot(Vec::new());
    while state.phase == MatchPhase::Playing && state.time_ticks < limit {
        last = tick(&mut state, &input);
        if state.time_ticks % tick_rate == 0 {
            let score: Vec<(u32, u32, u32)> = last.tanks.iter().map(|t| (t.kills, t.deaths, t.suicides)).collect();
            log::info!("t={}s remaining={}s score={:?}", state.time_ticks / tick_rate, last.remaining_secs, score);
        }
    }

    let summary = serde_json::json!({
        "mode": state.mode,
        "seed": state.seed,
        "winner": state.winner(),
        "snapshot": last,
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            log::error!("Failed to serialize summary: {}", e);
            process::exit(1);
        }
    }
}
