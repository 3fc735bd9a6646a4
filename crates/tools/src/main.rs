use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use huehunt_core::{CurveProfile, LevelGenerator};
use huehunt_service::{FileRepository, StatsRepository, UserId};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the difficulty curve table for a profile
    Curve {
        #[arg(short, long, value_enum, default_value = "classic")]
        profile: ProfileArg,
        #[arg(short, long, default_value_t = 10)]
        levels: u32,
    },
    /// Generate one level and print its JSON payload
    Level {
        #[arg(short, long, value_enum, default_value = "classic")]
        profile: ProfileArg,
        #[arg(short, long, default_value_t = 1)]
        level: u32,
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
    },
    /// Aggregate a user's games from a stats log
    Stats {
        #[arg(short, long)]
        user: u64,
        /// Stats log path; defaults to the platform data directory
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    Classic,
    Endless,
}

impl ProfileArg {
    fn profile(self) -> CurveProfile {
        match self {
            Self::Classic => CurveProfile::classic(),
            Self::Endless => CurveProfile::endless(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    match args.command {
        Command::Curve { profile, levels } => print_curve(profile.profile(), levels),
        Command::Level { profile, level, seed } => print_level(profile.profile(), level, seed),
        Command::Stats { user, path } => print_stats(UserId(user), path),
    }
}

fn print_curve(profile: CurveProfile, levels: u32) -> Result<()> {
    if levels == 0 {
        bail!("the curve needs at least one level");
    }
    println!("{:>5}  {:>4}  {:>5}  {:>6}", "level", "rows", "tiles", "budget");
    for level in 1..=levels {
        println!(
            "{level:>5}  {:>4}  {:>5}  {:>6}",
            profile.rows_for(level),
            profile.tiles_per_row_for(level),
            profile.difference_budget_for(level),
        );
    }
    Ok(())
}

fn print_level(profile: CurveProfile, level: u32, seed: u64) -> Result<()> {
    let mut generator = LevelGenerator::from_seed(profile, seed);
    let spec = generator
        .generate(level)
        .with_context(|| format!("level {level} is outside the curve"))?;
    println!("{}", serde_json::to_string_pretty(&spec)?);
    println!("fingerprint: {:016x}", spec.fingerprint());
    Ok(())
}

fn print_stats(user: UserId, path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => FileRepository::default_path()
            .context("no usable data directory on this platform")?,
    };
    let repository = FileRepository::open(&path)
        .with_context(|| format!("failed to open stats log {}", path.display()))?;
    let stats = repository.aggregate_for_user(user)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
