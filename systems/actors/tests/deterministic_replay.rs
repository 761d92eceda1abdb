use std::{sync::Arc, time::Duration};

use crypt_crawler_core::{ActorState, InputButtons, InputSnapshot, Message, MessageBus, PlayerDef};
use crypt_crawler_system_actors::{ActorFactory, TrashTuning};
use crypt_crawler_system_populator::{Populator, PopulatorConfig};
use crypt_crawler_system_wall_solver::{TileSet, WallSolver};
use crypt_crawler_world::{ArmatureAnimations, ClipSource, LevelLayout, Scene, SceneConfig};
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const CRYPT: &str = "\
################
#......#########
#......#.......#
#..............#
#......#.......#
####.###########
####.....#######
####.....#######
################";

#[derive(Clone, Debug, PartialEq)]
struct Snapshot {
    player: Vec3,
    actors: Vec<(Vec3, f32, ActorState)>,
    lights: usize,
    blood: usize,
}

fn clip(name: &str, keyframes: &[u32]) -> ClipSource {
    ClipSource {
        name: name.to_owned(),
        keyframes: keyframes.to_vec(),
    }
}

fn scripted_input(tick: u32) -> InputSnapshot {
    match tick % 40 {
        0..=9 => InputSnapshot::new(1, 0, InputButtons::NONE),
        10..=14 => InputSnapshot::new(0, 1, InputButtons::ATTACK),
        15..=24 => InputSnapshot::new(-1, 1, InputButtons::NONE),
        25..=29 => InputSnapshot::new(0, 0, InputButtons::ATTACK),
        _ => InputSnapshot::new(0, -1, InputButtons::NONE),
    }
}

fn replay(seed: u64) -> Vec<Snapshot> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let tiles = TileSet::classify(&["floor", "wall_a", "wall_b", "corner", "walltorch"])
        .expect("tile set");
    let layout = LevelLayout::from_ascii(5, CRYPT).expect("layout");
    let mut level = WallSolver::new(tiles.clone())
        .solve(&layout, &mut rng)
        .expect("solve");

    let mut bus = MessageBus::new();
    let populator = Populator::new(PopulatorConfig {
        enemy_target: 12,
        ..PopulatorConfig::default()
    })
    .expect("populator");
    let (graph, report) = populator
        .populate(&mut level, &tiles, &mut rng, &mut bus)
        .expect("populate");
    assert!(report.enemies > 0);

    let player_clips = Arc::new(ArmatureAnimations::from_sources(&[
        clip("Idle", &[1, 11, 21]),
        clip("Run", &[1, 9, 17]),
        clip("Attack", &[1, 6, 11]),
    ]));
    let crab_clips = Arc::new(ArmatureAnimations::from_sources(&[
        clip("Idle", &[1, 11, 21]),
        clip("Walk", &[1, 9, 17]),
        clip("Attack", &[1, 6, 11]),
        clip("Death", &[1, 11]),
    ]));
    let factory =
        ActorFactory::with_default_types(TrashTuning::default(), crab_clips).expect("factory");
    let mut scene =
        Scene::new(level, graph, SceneConfig::default(), player_clips).expect("scene");

    bus.post(Message::PlayerAdded(PlayerDef::default()));
    let delivered = bus.dispatch();
    let added = scene
        .apply_messages(&delivered, &factory)
        .expect("apply messages");
    assert_eq!(added, report.enemies + 1);

    let dt = Duration::from_millis(50);
    let mut blood = 0;
    let mut snapshots = Vec::new();
    for tick in 0..200u32 {
        scene.update(dt * tick, dt, scripted_input(tick), &mut bus);
        blood += bus
            .dispatch()
            .iter()
            .filter(|message| matches!(message, Message::ParticleSystemAdded(_)))
            .count();
        let player = scene.local_player().expect("player").position;
        let _ = scene.prioritize_shadow_lights(player, 4);

        if tick % 20 == 0 {
            snapshots.push(Snapshot {
                player,
                actors: scene
                    .actors()
                    .iter()
                    .map(|actor| {
                        let body = actor.body();
                        (body.position, body.angle, body.state)
                    })
                    .collect(),
                lights: scene.nearest_lights(player, 4).len(),
                blood,
            });
        }
    }
    snapshots
}

#[test]
fn seeded_runs_replay_identically() {
    let first = replay(2024);
    let second = replay(2024);
    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.len(), 10);
}
