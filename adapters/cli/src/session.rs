use std::{cell::Cell, fs, path::Path, rc::Rc, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use crypt_crawler_core::{InputState, Message, MessageBus, MessageKind, ParticleKind, PlayerDef};
use crypt_crawler_system_actors::{ActorFactory, TrashTuning};
use crypt_crawler_system_populator::{PopulationReport, Populator, PopulatorConfig};
use crypt_crawler_system_wall_solver::{TileSet, WallSolver};
use crypt_crawler_world::{ArmatureAnimations, ClipSource, LevelLayout, Scene, SceneConfig};
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::{debug, info};

const ARROW_LEFT: u32 = 37;
const ARROW_UP: u32 = 38;
const ARROW_RIGHT: u32 = 39;
const ARROW_DOWN: u32 = 40;
const SPACE: u32 = 32;

/// Map used when no level file is supplied.
pub(crate) const BUILTIN_MAP: &str = "\
####################
#......#############
#......#...........#
#..................#
#......#...........#
###.####.....#######
###.####.....#.....#
#.......#....#.....#
#..................#
#.......#....#.....#
####################";

/// Everything a session reads from the optional TOML file.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct CrawlerConfig {
    /// Submesh names of the tile mesh, in mesh order.
    pub(crate) tiles: Vec<String>,
    /// Tuning of the population pass.
    pub(crate) populator: PopulatorConfig,
    /// Tuning of every aggressive trash enemy.
    pub(crate) trash: TrashTuning,
    /// Scene and player tuning.
    pub(crate) scene: SceneConfig,
    /// Clips of the player armature.
    pub(crate) player_clips: Vec<ClipSource>,
    /// Clips of the crab armature.
    pub(crate) crab_clips: Vec<ClipSource>,
    /// Number of lights that cast shadows each frame.
    pub(crate) max_shadows: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        let clip = |name: &str, keyframes: &[u32]| ClipSource {
            name: name.to_owned(),
            keyframes: keyframes.to_vec(),
        };
        Self {
            tiles: ["floor0", "wall0", "wall1", "wall2", "corner0", "walltorch0"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            populator: PopulatorConfig::default(),
            trash: TrashTuning::default(),
            scene: SceneConfig::default(),
            player_clips: vec![
                clip("Idle", &[1, 21, 41]),
                clip("Run", &[1, 9, 17, 25]),
                clip("Attack", &[1, 6, 11, 16]),
            ],
            crab_clips: vec![
                clip("Idle", &[1, 11, 21]),
                clip("Walk", &[1, 7, 13]),
                clip("Attack", &[1, 8, 15]),
                clip("Death", &[1, 12, 24]),
            ],
            max_shadows: 4,
        }
    }
}

impl CrawlerConfig {
    /// Reads a configuration file, falling back to defaults for missing keys.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
    }
}

/// Reads a level layout from JSON, or parses the built-in map.
pub(crate) fn load_layout(path: Option<&Path>) -> Result<LevelLayout> {
    let Some(path) = path else {
        return LevelLayout::from_ascii(5, BUILTIN_MAP).context("built-in map is malformed");
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read level {}", path.display()))?;
    let layout: LevelLayout = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse level {}", path.display()))?;
    layout
        .validate()
        .with_context(|| format!("level {} is malformed", path.display()))?;
    Ok(layout)
}

/// Outcome of a headless run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Summary {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) population: PopulationReport,
    pub(crate) ticks: u32,
    pub(crate) live_actors: usize,
    pub(crate) remaining_actors: usize,
    pub(crate) player_position: Vec3,
    pub(crate) player_travel: f32,
    pub(crate) torch_flames: usize,
    pub(crate) blood_splatters: usize,
    pub(crate) shadow_lights: usize,
}

/// Loaded level, scene and collaborators of one headless run.
pub(crate) struct Session {
    scene: Scene,
    factory: ActorFactory,
    bus: MessageBus,
    input: InputState,
    population: PopulationReport,
    max_shadows: usize,
    torch_flames: Rc<Cell<usize>>,
    blood_splatters: Rc<Cell<usize>>,
}

impl Session {
    /// Solves and populates the layout, then spawns the announced actors and the player.
    pub(crate) fn start(layout: &LevelLayout, config: CrawlerConfig, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let tiles = TileSet::classify(config.tiles.as_slice()).context("tile mesh is unusable")?;
        let mut level = WallSolver::new(tiles.clone())
            .solve(layout, &mut rng)
            .context("wall solve failed")?;

        let mut bus = MessageBus::new();
        let torch_flames = Rc::new(Cell::new(0));
        let blood_splatters = Rc::new(Cell::new(0));
        let (torches, blood) = (Rc::clone(&torch_flames), Rc::clone(&blood_splatters));
        bus.subscribe(MessageKind::ParticleSystemAdded, move |message| {
            if let Message::ParticleSystemAdded(spawn) = message {
                debug!(
                    particle = spawn.kind.name(),
                    one_shot = spawn.kind.is_one_shot(),
                    "particle_system_requested"
                );
                let counter = match spawn.kind {
                    ParticleKind::TorchFire => &torches,
                    ParticleKind::Blood => &blood,
                };
                counter.set(counter.get() + 1);
            }
        });

        let populator = Populator::new(config.populator).context("populator config is invalid")?;
        let (graph, population) = populator
            .populate(&mut level, &tiles, &mut rng, &mut bus)
            .context("level population failed")?;

        let factory = ActorFactory::with_default_types(
            config.trash,
            Arc::new(ArmatureAnimations::from_sources(&config.crab_clips)),
        )?;
        factory.validate([populator.config().enemy_kind.as_str()])?;

        let mut scene = Scene::new(
            level,
            graph,
            config.scene,
            Arc::new(ArmatureAnimations::from_sources(&config.player_clips)),
        )
        .context("scene rejected its configuration")?;

        bus.post(Message::PlayerAdded(PlayerDef {
            nickname: "crawler".into(),
            ..PlayerDef::default()
        }));
        let delivered = bus.dispatch();
        let added = scene.apply_messages(&delivered, &factory)?;
        info!(added, seed, "session_started");

        Ok(Self {
            scene,
            factory,
            bus,
            input: InputState::new(),
            population,
            max_shadows: config.max_shadows,
            torch_flames,
            blood_splatters,
        })
    }

    /// Runs `ticks` fixed-length ticks of scripted input.
    pub(crate) fn run(&mut self, ticks: u32, tick: Duration) -> Result<Summary> {
        let start = self.player_position();
        for index in 0..ticks {
            drive(index, &mut self.input);
            self.scene
                .update(tick * index, tick, self.input.snapshot(), &mut self.bus);
            let delivered = self.bus.dispatch();
            let added = self.scene.apply_messages(&delivered, &self.factory)?;
            if added > 0 {
                debug!(tick = index, added, "late_spawns_applied");
            }
            let _ = self
                .scene
                .prioritize_shadow_lights(self.player_position(), self.max_shadows);
        }

        let position = self.player_position();
        let shadow_lights = self
            .scene
            .level()
            .lights()
            .iter()
            .filter(|light| light.shadow_index.is_some())
            .count();
        Ok(Summary {
            width: self.scene.level().width(),
            height: self.scene.level().height(),
            population: self.population,
            ticks,
            live_actors: self.scene.live_actor_count(),
            remaining_actors: self.scene.actors().len(),
            player_position: position,
            player_travel: (position - start).length(),
            torch_flames: self.torch_flames.get(),
            blood_splatters: self.blood_splatters.get(),
            shadow_lights,
        })
    }

    /// Interleaved `[tile, orientation]` export of the solved grid.
    pub(crate) fn export_tiles(&self) -> Vec<i8> {
        self.scene.level().to_interleaved()
    }

    fn player_position(&self) -> Vec3 {
        self.scene
            .local_player()
            .map_or(Vec3::ZERO, |player| player.position)
    }
}

/// Scripted keyboard: walks a square and swings every few seconds.
fn drive(tick: u32, input: &mut InputState) {
    const LEG: u32 = 90;
    const WALK: [u32; 4] = [ARROW_RIGHT, ARROW_DOWN, ARROW_LEFT, ARROW_UP];

    let leg = (tick / LEG) as usize % WALK.len();
    for (index, key) in WALK.iter().enumerate() {
        if index == leg {
            input.key_down(*key);
        } else {
            input.key_up(*key);
        }
    }
    if tick % 45 == 0 {
        input.key_down(SPACE);
    } else {
        input.key_up(SPACE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_session_runs_deterministically() {
        let layout = load_layout(None).expect("layout");
        let run = || {
            let mut session =
                Session::start(&layout, CrawlerConfig::default(), 17).expect("session");
            session.run(240, Duration::from_millis(16)).expect("run")
        };
        let first = run();
        assert_eq!(first, run());
        assert_eq!(first.torch_flames, first.population.torches);
        assert!(first.population.enemies > 0);
        assert!(first.player_travel > 0.0);
        assert!(first.shadow_lights <= 4);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: CrawlerConfig = toml::from_str(
            "max_shadows = 2\n[populator]\nenemy_target = 3\n[scene.player]\nrun_speed = 120.0\n",
        )
        .expect("config");
        assert_eq!(config.max_shadows, 2);
        assert_eq!(config.populator.enemy_target, 3);
        assert_eq!(config.populator.enemy_attempts, 800);
        assert_eq!(config.scene.player.run_speed, 120.0);
        assert_eq!(config.tiles.len(), 6);
    }

    #[test]
    fn script_walks_one_direction_at_a_time() {
        let mut input = InputState::new();
        drive(0, &mut input);
        let snapshot = input.snapshot();
        assert_eq!((snapshot.axis_h, snapshot.axis_v), (1, 0));
        assert!(snapshot.buttons.contains(crypt_crawler_core::InputButtons::ATTACK));

        drive(95, &mut input);
        let snapshot = input.snapshot();
        assert_eq!((snapshot.axis_h, snapshot.axis_v), (0, 1));
        assert!(!snapshot.buttons.contains(crypt_crawler_core::InputButtons::ATTACK));
    }
}
