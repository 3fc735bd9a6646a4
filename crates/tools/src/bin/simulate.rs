use anyhow::{Result, ensure};
use clap::Parser;
use huehunt_service::{
    AggregateStats, MemoryGameService, MissResponse, SolveResponse, StatsRepository, UserId,
};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use serde::Serialize;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 100)]
    games: u32,
    /// Percent chance each click hits the odd tile
    #[arg(short, long, default_value_t = 80)]
    accuracy: u32,
}

#[derive(Serialize)]
struct Summary {
    games: u32,
    wins: u32,
    losses: u32,
    total_levels_completed: u32,
    aggregate: AggregateStats,
}

enum GameEnd {
    Won { levels: u32 },
    Lost { levels: u32 },
}

fn play_game(
    service: &mut MemoryGameService,
    rng: &mut ChaCha8Rng,
    accuracy: u32,
    user: UserId,
) -> Result<GameEnd> {
    let started = service.start_game(Some(user));
    let mut row = 0;

    loop {
        let hit = (rng.next_u64() % 100) < u64::from(accuracy);
        if hit {
            match service.solve_row(started.session_id, row)? {
                SolveResponse::RowSolved { .. } => row += 1,
                SolveResponse::NextLevel(advance) => {
                    ensure!(advance.strikes_used == 0, "strikes must reset between levels");
                    row = 0;
                }
                SolveResponse::GameWon(stats) => {
                    ensure!(stats.won, "a won game must report won");
                    return Ok(GameEnd::Won { levels: stats.level_stats.len() as u32 });
                }
            }
        } else {
            match service.miss_row(started.session_id)? {
                MissResponse::Strike { strikes_used, strikes_remaining } => {
                    ensure!(
                        strikes_used + strikes_remaining == 3,
                        "strike accounting must add up"
                    );
                }
                MissResponse::GameOver(stats) => {
                    ensure!(!stats.won, "a lost game must not report won");
                    let levels = stats.level_stats.len().saturating_sub(1) as u32;
                    return Ok(GameEnd::Lost { levels });
                }
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    ensure!(args.accuracy <= 100, "accuracy is a percentage");

    println!(
        "Simulating {} campaigns at {}% accuracy on seed {}...",
        args.games, args.accuracy, args.seed
    );
    let mut service = MemoryGameService::in_memory();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let user = UserId(1);

    let mut wins = 0;
    let mut losses = 0;
    let mut total_levels_completed = 0;
    for _ in 0..args.games {
        match play_game(&mut service, &mut rng, args.accuracy, user)? {
            GameEnd::Won { levels } => {
                wins += 1;
                total_levels_completed += levels;
            }
            GameEnd::Lost { levels } => {
                losses += 1;
                total_levels_completed += levels;
            }
        }
    }

    let aggregate = service.repository().aggregate_for_user(user)?;
    ensure!(aggregate.overall.total_games == args.games, "every game must be recorded");
    ensure!(aggregate.overall.games_won == wins, "recorded wins must match observed wins");

    let summary = Summary { games: args.games, wins, losses, total_levels_completed, aggregate };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
