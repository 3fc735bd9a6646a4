use std::time::Duration;

use huehunt_core::{
    ChaChaSource, CurveProfile, EndlessOutcome, EndlessSession, GameSession, MissOutcome,
    SessionPhase, SolveOutcome,
};

fn clear_level(session: &mut GameSession<ChaChaSource>) -> SolveOutcome {
    let rows = session.current_spec().rows;
    let mut last = None;
    for row in 0..rows {
        last = Some(
            session
                .solve_row(row, Duration::from_secs(12))
                .expect("row solves"),
        );
    }
    last.expect("levels have rows")
}

#[test]
fn perfect_campaigns_win_across_seeds() {
    let seeds = [3_u64, 17, 255, 4096, 88_001, 999_983];
    for seed in seeds {
        let profile = CurveProfile::classic();
        let mut session = GameSession::from_seed(seed, profile);
        let mut advances = 0;

        let summary = 'game: loop {
            let level = session.level().expect("session is live");
            let spec = session.current_spec();
            assert_eq!(
                spec.rows,
                profile.rows_for(level),
                "rows for seed {seed} level {level}"
            );
            assert_eq!(spec.tiles_per_row, profile.tiles_per_row_for(level));

            match clear_level(&mut session) {
                SolveOutcome::Advanced { .. } => advances += 1,
                SolveOutcome::Won(summary) => break 'game summary,
                SolveOutcome::RowSolved { .. } => unreachable!("helper clears whole levels"),
            }
        };

        assert_eq!(advances, 9, "seed {seed}");
        assert!(summary.won);
        assert_eq!(summary.levels_completed, 10);
        let levels: Vec<u32> = summary.level_stats.iter().map(|stat| stat.level).collect();
        assert_eq!(levels, (1..=10).collect::<Vec<u32>>());
        assert!(summary.level_stats.iter().all(|stat| !stat.failed));
        assert_eq!(session.phase(), SessionPhase::Won);
    }
}

#[test]
fn always_missing_loses_on_the_first_level() {
    for seed in [1_u64, 2, 3] {
        let mut session = GameSession::from_seed(seed, CurveProfile::classic());
        assert!(matches!(
            session.miss_row(Duration::from_secs(5)),
            Ok(MissOutcome::Strike { strikes_used: 1 })
        ));
        assert!(matches!(
            session.miss_row(Duration::from_secs(9)),
            Ok(MissOutcome::Strike { strikes_used: 2 })
        ));

        let outcome = session
            .miss_row(Duration::from_secs(14))
            .expect("miss resolves");
        let MissOutcome::GameOver(summary) = outcome else {
            panic!("seed {seed}: expected a game over");
        };
        assert!(!summary.won);
        assert_eq!(summary.levels_completed, 0);
        assert_eq!(summary.level_stats.len(), 1);
        assert!(summary.level_stats[0].failed);
        assert_eq!(session.phase(), SessionPhase::Lost);
    }
}

#[test]
fn mixed_runs_keep_history_consistent() {
    for seed in [10_u64, 20, 30, 40] {
        let mut session = GameSession::from_seed(seed, CurveProfile::classic());
        for _ in 0..3 {
            session
                .miss_row(Duration::from_secs(2))
                .expect("miss resolves");
            session
                .miss_row(Duration::from_secs(4))
                .expect("miss resolves");
            assert!(matches!(
                clear_level(&mut session),
                SolveOutcome::Advanced { .. }
            ));
        }
        assert_eq!(session.level(), Some(4));

        for _ in 0..2 {
            session
                .miss_row(Duration::from_secs(3))
                .expect("miss resolves");
        }
        let outcome = session
            .miss_row(Duration::from_secs(6))
            .expect("miss resolves");
        let MissOutcome::GameOver(summary) = outcome else {
            panic!("seed {seed}: expected the run to end");
        };

        assert_eq!(summary.levels_completed, 3);
        assert_eq!(summary.level_stats.len(), 4);
        for (index, stat) in summary.level_stats.iter().enumerate() {
            assert_eq!(stat.level, index as u32 + 1);
            if index < 3 {
                assert_eq!(stat.strikes, 2, "seed {seed} level {}", stat.level);
                assert!(!stat.failed);
            } else {
                assert_eq!(stat.strikes, 3);
                assert!(stat.failed);
            }
        }
        let smallest = summary.smallest_difference.expect("four levels were seen");
        assert!(smallest >= 1, "seed {seed}: smallest {smallest}");
    }
}

#[test]
fn endless_runs_preserve_band_invariants() {
    for seed in [7_u64, 70, 700] {
        let mut session = EndlessSession::from_seed(seed);
        for _ in 0..25 {
            let spec = session.current_spec();
            assert_eq!(spec.rows, 7);
            assert_eq!(spec.tiles_per_row, 11);
            assert!(matches!(session.effective_level(), 8 | 9));

            let round = session.round();
            for row in 0..7 {
                let target = session.current_spec().color_data[row].odd_tile_index;
                let outcome = session.click_tile(row, target).expect("click resolves");
                if row == 6 {
                    assert_eq!(outcome, EndlessOutcome::RoundCleared { round });
                }
            }
        }
        assert_eq!(session.rounds_completed(), 25);
    }
}
