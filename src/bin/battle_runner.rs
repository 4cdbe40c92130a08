//! Headless Battle Runner
//!
//! Plays seeded battles AI vs AI and prints the outcome reports.

use aethermoor_tactics::battle::ai::{load_personality, AiController, AiPersonality, UnitPolicy};
use aethermoor_tactics::battle::{Battle, BattleGenerator, BattleReport, CombatUnit};
use aethermoor_tactics::core::{BattleOptions, CombatConfig, Element, Side};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;

/// Headless Battle Runner - AI vs AI tactical battles
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run seeded AI vs AI battles and output their reports")]
struct Args {
    /// Random seed; run i uses seed + i
    #[arg(long)]
    seed: Option<u64>,

    /// Number of enemies to spawn
    #[arg(long, default_value_t = 4)]
    enemies: usize,

    /// Scatter forests, hills and obstacles across the field
    #[arg(long)]
    terrain: bool,

    /// Player-side AI personality (loaded from data/ai_personalities/)
    #[arg(long, default_value = "default")]
    player: String,

    /// Enemy-side AI personality (loaded from data/ai_personalities/)
    #[arg(long, default_value = "default")]
    enemy: String,

    /// Round limit per battle
    #[arg(long, default_value_t = 30)]
    rounds: u32,

    /// Number of independent battles
    #[arg(long, default_value_t = 1)]
    runs: u64,

    /// Combat tunables TOML (defaults when omitted)
    #[arg(long)]
    config: Option<String>,

    /// Re-sort the turn order at every round end
    #[arg(long)]
    recompute_turn_order: bool,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print each battle's event log to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct RunOutput {
    seed: u64,
    player_personality: String,
    enemy_personality: String,
    report: BattleReport,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let player_personality = personality_or_default(&args.player);
    let enemy_personality = personality_or_default(&args.enemy);

    let config = match &args.config {
        Some(path) => match CombatConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load combat config '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => CombatConfig::default(),
    };
    let options = BattleOptions {
        recompute_turn_order_each_round: args.recompute_turn_order,
        ..BattleOptions::default()
    };
    let generator = BattleGenerator::new(options, config);

    let controller = build_controller(&player_personality, &enemy_personality);

    let outcomes: Vec<(RunOutput, Battle)> = (0..args.runs)
        .into_par_iter()
        .filter_map(|i| {
            let run_seed = seed.wrapping_add(i);
            let mut battle = match generator.generate_random_battle(
                player_party(),
                args.enemies,
                args.terrain,
                run_seed,
            ) {
                Ok(battle) => battle,
                Err(e) => {
                    tracing::error!(seed = run_seed, error = %e, "battle generation failed");
                    return None;
                }
            };
            let report = controller.auto_resolve(&mut battle, args.rounds);
            let output = RunOutput {
                seed: run_seed,
                player_personality: player_personality.name.clone(),
                enemy_personality: enemy_personality.name.clone(),
                report,
            };
            Some((output, battle))
        })
        .collect();

    if args.verbose {
        for (output, battle) in &outcomes {
            eprintln!("=== Battle seed {} ===", output.seed);
            for event in &battle.event_log().events {
                eprintln!("  [{}] {}", event.round, event.description);
            }
            eprintln!();
        }
    }

    let outputs: Vec<RunOutput> = outcomes.into_iter().map(|(output, _)| output).collect();

    match args.format.as_str() {
        "text" => print_text(&outputs),
        "json" => print_json(&outputs),
        _ => {
            eprintln!("Unknown format '{}', defaulting to json", args.format);
            print_json(&outputs);
        }
    }
}

fn personality_or_default(name: &str) -> AiPersonality {
    load_personality(name).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load personality '{}': {}", name, e);
        eprintln!("Using default personality");
        AiPersonality::default()
    })
}

/// Enemies use the default policy; each party member gets an override
fn build_controller(player: &AiPersonality, enemy: &AiPersonality) -> AiController {
    let mut controller = AiController::new(UnitPolicy::from_personality(enemy));
    let player_policy = UnitPolicy::from_personality(player);
    for unit in player_party() {
        controller.set_policy(unit.id, player_policy.clone());
    }
    controller
}

/// Four-member party, all under AI control for headless play
fn player_party() -> Vec<CombatUnit> {
    vec![
        CombatUnit::new("knight", "Knight", Side::Player)
            .with_hp(140)
            .with_stats(16, 14, 9)
            .with_movement(3, 1)
            .ai_controlled(),
        CombatUnit::new("ranger", "Ranger", Side::Player)
            .with_hp(95)
            .with_stats(14, 9, 13)
            .with_movement(4, 2)
            .with_element(Element::Air)
            .ai_controlled(),
        CombatUnit::new("mage", "Mage", Side::Player)
            .with_hp(80)
            .with_stats(8, 7, 11)
            .with_magic(20, 14)
            .with_element(Element::Fire)
            .ai_controlled(),
        CombatUnit::new("cleric", "Cleric", Side::Player)
            .with_hp(90)
            .with_stats(9, 10, 10)
            .with_magic(12, 18)
            .with_element(Element::Life)
            .ai_controlled(),
    ]
}

fn print_json(outputs: &[RunOutput]) {
    match serde_json::to_string_pretty(outputs) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize results: {}", e),
    }
}

fn print_text(outputs: &[RunOutput]) {
    for output in outputs {
        let report = &output.report;
        println!("Battle Result");
        println!("=============");
        println!("Outcome: {:?}", report.result);
        println!("Rounds: {}", report.rounds);
        println!("Survivors:");
        for unit in &report.survivors {
            println!("  {} ({:?}) {}/{} HP", unit.name, unit.side, unit.current_hp, unit.max_hp);
        }
        println!("Fallen:");
        for unit in &report.fallen {
            println!("  {} ({:?})", unit.name, unit.side);
        }
        println!();
        println!("Personalities: {} vs {}", output.player_personality, output.enemy_personality);
        println!("Seed: {}", output.seed);
        println!();
    }
}
