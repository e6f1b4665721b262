use rand::{rngs::SmallRng, SeedableRng};

use super::fixtures::{Corridor, ScriptedPolicy};
use crate::env::{BoardStyle, Environment, EpisodeRunner, RicochetConfig, RicochetEnv};
use crate::error::TrainError;

fn open_board(style: BoardStyle) -> RicochetEnv {
    RicochetEnv::new(RicochetConfig {
        grid_size: 5,
        robots: 2,
        walls: 0,
        style,
        seed: Some(17),
        ..RicochetConfig::default()
    })
    .unwrap()
}

#[test]
fn test_ricochet_dimensions() {
    let env = open_board(BoardStyle::Fixed);
    assert_eq!(env.legal_action_count(), 8);
    assert_eq!(env.state_size(), 5 * 25);
    assert_eq!(env.describe_action(0), "robot 0 north");
    assert_eq!(env.describe_action(7), "robot 1 west");
}

#[test]
fn test_ricochet_rejects_bad_config() {
    let tiny = RicochetConfig {
        grid_size: 1,
        ..RicochetConfig::default()
    };
    assert!(matches!(RicochetEnv::new(tiny), Err(TrainError::Configuration { .. })));

    let crowded = RicochetConfig {
        grid_size: 2,
        robots: 4,
        ..RicochetConfig::default()
    };
    assert!(RicochetEnv::new(crowded).is_err());
}

#[test]
fn test_reset_encoding() {
    let mut env = open_board(BoardStyle::Fixed);
    let state = env.reset().unwrap();

    assert_eq!(state.len(), env.state_size());
    // One cell per robot plane plus the target; no walls on an open board
    assert_eq!(state.sum(), 3.0);
    assert!(!env.legal_actions().is_empty());
}

#[test]
fn test_robots_slide_until_blocked() {
    let mut env = open_board(BoardStyle::Fixed);
    env.set_robots(vec![(0, 0), (0, 4)]).unwrap();

    assert_eq!(env.legal_actions(), vec![1, 2, 6, 7]);

    let (_, reward, done) = env.step(1).unwrap();
    // Robot 0 stops next to robot 1
    assert_eq!(env.robots()[0], (0, 3));
    assert_eq!(done, env.target() == Some((0, 3)));
    assert_eq!(reward, if done { 9.0 } else { -1.0 });

    // Robot 1 is now boxed in towards the west
    assert!(!env.legal_actions().contains(&7));
    assert!(matches!(env.step(7), Err(TrainError::InvalidAction { action: 7, .. })));
    assert_eq!(env.robots()[1], (0, 4));
}

#[test]
fn test_illegal_moves_are_errors() {
    let mut env = open_board(BoardStyle::Fixed);
    env.set_robots(vec![(0, 0), (0, 4)]).unwrap();

    assert!(matches!(env.step(0), Err(TrainError::InvalidAction { action: 0, .. })));
    assert!(matches!(env.step(8), Err(TrainError::InvalidAction { action: 8, .. })));
    assert_eq!(env.robots(), &[(0, 0), (0, 4)]);
}

#[test]
fn test_fixed_board_keeps_target() {
    let mut env = open_board(BoardStyle::Fixed);
    let target = env.target();
    for _ in 0..10 {
        env.reset().unwrap();
        assert_eq!(env.target(), target);
        assert!(!env.robots().contains(&target.unwrap()));
    }
}

fn crowded(seed: Option<u64>, walls: usize) -> RicochetConfig {
    RicochetConfig {
        grid_size: 2,
        robots: 3,
        walls,
        seed,
        ..RicochetConfig::default()
    }
}

#[test]
fn test_explicit_board() {
    let mut env = RicochetEnv::with_board(crowded(Some(1), 0), (1, 1), &[], &[]).unwrap();
    assert_eq!(env.target(), Some((1, 1)));
    assert!(!env.legal_actions().is_empty());

    env.reset().unwrap();
    assert_eq!(env.target(), Some((1, 1)));
    assert!(RicochetEnv::with_board(crowded(None, 0), (2, 0), &[], &[]).is_err());
}

#[test]
fn test_boxed_in_board_is_an_error() {
    // Both open neighbours of the target are walled off; the robots fill every other cell
    let wedged = RicochetEnv::with_board(crowded(Some(1), 0), (1, 1), &[(1, 0)], &[(0, 1)]);
    assert!(matches!(wedged, Err(TrainError::Training(_))));
}

#[test]
fn test_crowded_boards_terminate() {
    for seed in 0..32 {
        match RicochetEnv::new(crowded(Some(seed), 6)) {
            Ok(env) => assert!(!env.legal_actions().is_empty()),
            Err(err) => assert!(matches!(err, TrainError::Training(_)), "seed {}: {}", seed, err),
        }
    }
}

#[test]
fn test_walls_are_encoded() {
    let mut env = RicochetEnv::new(RicochetConfig {
        walls: 6,
        seed: Some(3),
        ..RicochetConfig::default()
    })
    .unwrap();
    let state = env.reset().unwrap();
    let walls = state.sum() - 3.0;
    assert!(walls >= 1.0 && walls <= 6.0);
}

#[test]
fn test_run_learns_every_interval() {
    let mut env = Corridor::new(4);
    let mut policy = ScriptedPolicy::new(0);

    let outcome = EpisodeRunner::new(20, 1).run(&mut env, &mut policy).unwrap();
    assert_eq!(outcome.steps, 3);
    assert_eq!(outcome.reward, 8.0);
    assert_eq!(policy.observed, 3);
    assert_eq!(policy.learn_calls, 3);

    let mut policy = ScriptedPolicy::new(0);
    EpisodeRunner::new(20, 2).run(&mut env, &mut policy).unwrap();
    assert_eq!(policy.learn_calls, 1);
}

#[test]
fn test_run_stops_at_max_steps() {
    let mut env = Corridor::new(4);
    // Walks back and forth between the first two cells
    let mut policy = ScriptedPolicy::new(1);

    let outcome = EpisodeRunner::new(5, 1).run(&mut env, &mut policy).unwrap();
    assert_eq!(outcome.steps, 5);
    assert_eq!(outcome.reward, -5.0);
}

#[test]
fn test_play_game_does_not_learn() {
    let mut env = Corridor::new(4);
    let mut policy = ScriptedPolicy::new(0);
    let mut rng = SmallRng::seed_from_u64(0);

    let playout = EpisodeRunner::new(20, 1).play_game(&mut env, &mut policy, 0.0, &mut rng).unwrap();
    assert!(playout.solved);
    assert_eq!(playout.actions, vec![0, 0, 0]);
    assert_eq!(playout.steps, 3);
    assert_eq!(policy.observed, 0);
    assert_eq!(policy.learn_calls, 0);
}

#[test]
fn test_play_game_unsolved() {
    let mut env = Corridor::new(4);
    let mut policy = ScriptedPolicy::new(1);
    let mut rng = SmallRng::seed_from_u64(0);

    let playout = EpisodeRunner::new(6, 1).play_game(&mut env, &mut policy, 0.0, &mut rng).unwrap();
    assert!(!playout.solved);
    assert_eq!(playout.actions.len(), 6);
}
