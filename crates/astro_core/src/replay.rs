//! Replay system for recording and re-running games.
//!
//! A replay stores the seed, the rule set, the roster and, for every round,
//! the raw command payloads each player sent. Since the world draws all of
//! its randomness from the seed, re-feeding those payloads reproduces the
//! game exactly, malformed input included.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::PlayerId;
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::simulation::PlayerBatch;
use crate::world::World;

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// One player's payload for one round, exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedBatch {
    /// Sending player.
    pub player: PlayerId,
    /// Raw JSON text.
    pub raw: String,
}

/// Everything the host fed into one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRound {
    /// Players marked dead before the round resolved.
    pub deaths: Vec<PlayerId>,
    /// Payloads in the order they were received.
    pub batches: Vec<RecordedBatch>,
}

impl RecordedRound {
    /// Re-apply this round to `world`.
    fn apply(&self, world: &mut World) -> Result<()> {
        for player in &self.deaths {
            world.mark_player_dead(*player)?;
        }
        let batches: Vec<PlayerBatch> = self
            .batches
            .iter()
            .map(|b| PlayerBatch::from_json(b.player, &b.raw).0)
            .collect();
        world.play_round(&batches);
        Ok(())
    }
}

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Seed the world was generated from.
    pub seed: u64,
    /// Rule set in effect.
    pub config: GameConfig,
    /// Player names in join order.
    pub roster: Vec<String>,
    /// Recorded rounds, in order.
    pub rounds: Vec<RecordedRound>,
    /// Round counter when the game ended.
    pub final_round: u32,
    /// State hash when the game ended.
    pub final_hash: u64,
}

impl Replay {
    /// Start recording a game.
    #[must_use]
    pub fn new(seed: u64, config: GameConfig, roster: Vec<String>) -> Self {
        Self {
            version: REPLAY_VERSION,
            seed,
            config,
            roster,
            rounds: Vec::new(),
            final_round: 0,
            final_hash: 0,
        }
    }

    /// Append a round.
    pub fn record_round(&mut self, round: RecordedRound) {
        self.rounds.push(round);
    }

    /// Stamp the end-of-game state.
    pub fn finalize(&mut self, world: &World) {
        self.final_round = world.round();
        self.final_hash = world.state_hash();
    }

    /// Save the replay to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::Serialization(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path, bytes).map_err(|source| GameError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), rounds = self.rounds.len(), "Replay saved");
        Ok(())
    }

    /// Load a replay from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| GameError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::Serialization(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "Replay version mismatch: expected {}, got {}",
                REPLAY_VERSION, replay.version
            )));
        }
        Ok(replay)
    }

    /// Number of recorded rounds.
    #[must_use]
    pub fn duration(&self) -> usize {
        self.rounds.len()
    }

    /// Rebuild the world as it was after the first `rounds` recorded rounds.
    pub fn reconstruct_until(&self, rounds: usize) -> Result<World> {
        let mut world = World::with_roster(self.config.clone(), self.seed, &self.roster)?;
        for round in self.rounds.iter().take(rounds) {
            round.apply(&mut world)?;
        }
        Ok(world)
    }

    /// Rebuild the final world.
    pub fn reconstruct(&self) -> Result<World> {
        self.reconstruct_until(self.rounds.len())
    }

    /// Re-run the game and check it ends in the recorded state.
    pub fn verify(&self) -> Result<World> {
        let world = self.reconstruct()?;
        let actual = world.state_hash();
        if world.round() != self.final_round || actual != self.final_hash {
            return Err(GameError::DesyncDetected {
                round: world.round(),
                expected: self.final_hash,
                actual,
            });
        }
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> GameConfig {
        GameConfig {
            radius: 300.0,
            asteroid_count: 30,
            wormhole_pairs: 2,
            ..Default::default()
        }
    }

    fn roster() -> Vec<String> {
        vec!["north".to_string(), "south".to_string()]
    }

    /// Play a short scripted game and record it.
    fn record_game() -> (Replay, World) {
        let config = small_config();
        let mut world = World::with_roster(config.clone(), 1234, &roster()).unwrap();
        let mut replay = Replay::new(1234, config, roster());

        let scripts = [
            r#"[{"type":0,"data":{"type":2}},{"type":0,"data":{"type":5}}]"#,
            r#"[{"type":1,"data":{"ship_id":2,"vector":{"x":3.0,"y":4.0}}}]"#,
            r#"not even json"#,
            r#"[{"type":1,"data":{"ship_id":3,"vector":{"x":-2.0,"y":0.5}}},{"type":9}]"#,
        ];
        for raw in scripts {
            let recorded = RecordedRound {
                deaths: Vec::new(),
                batches: vec![
                    RecordedBatch {
                        player: PlayerId(0),
                        raw: raw.to_string(),
                    },
                    RecordedBatch {
                        player: PlayerId(1),
                        raw: r#"[{"type":0,"data":{"type":1}}]"#.to_string(),
                    },
                ],
            };
            recorded.apply(&mut world).unwrap();
            replay.record_round(recorded);
        }
        replay.finalize(&world);
        (replay, world)
    }

    #[test]
    fn test_replay_create() {
        let replay = Replay::new(7, small_config(), roster());
        assert_eq!(replay.version, REPLAY_VERSION);
        assert_eq!(replay.seed, 7);
        assert!(replay.rounds.is_empty());
    }

    #[test]
    fn test_replay_reproduces_game() {
        let (replay, world) = record_game();
        assert_eq!(replay.duration(), 4);
        let rebuilt = replay.verify().unwrap();
        assert_eq!(rebuilt.state_hash(), world.state_hash());
        assert_eq!(rebuilt.round(), 4);
    }

    #[test]
    fn test_tampered_replay_desyncs() {
        let (mut replay, _) = record_game();
        replay.rounds[1].batches[0].raw = "[]".to_string();
        assert!(matches!(
            replay.verify(),
            Err(GameError::DesyncDetected { .. })
        ));
    }

    #[test]
    fn test_reconstruct_partial() {
        let (replay, _) = record_game();
        let start = replay.reconstruct_until(0).unwrap();
        assert_eq!(start.round(), 0);
        assert_eq!(start.players().len(), 2);
        assert_eq!(replay.reconstruct_until(2).unwrap().round(), 2);
    }

    #[test]
    fn test_replay_records_deaths() {
        let config = small_config();
        let mut world = World::with_roster(config.clone(), 5, &roster()).unwrap();
        let mut replay = Replay::new(5, config, roster());

        let recorded = RecordedRound {
            deaths: vec![PlayerId(1)],
            batches: Vec::new(),
        };
        recorded.apply(&mut world).unwrap();
        replay.record_round(recorded);
        replay.finalize(&world);

        let rebuilt = replay.verify().unwrap();
        assert!(!rebuilt.player(PlayerId(1)).unwrap().alive);
    }

    #[test]
    fn test_replay_save_load() {
        let (replay, _) = record_game();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.replay");

        replay.save(&path).unwrap();
        let loaded = Replay::load(&path).unwrap();
        assert_eq!(loaded, replay);
        assert!(loaded.verify().is_ok());
    }

    #[test]
    fn test_replay_version_checked() {
        let (mut replay, _) = record_game();
        replay.version = REPLAY_VERSION + 1;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.replay");
        replay.save(&path).unwrap();
        assert!(matches!(
            Replay::load(&path),
            Err(GameError::InvalidState(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Replay::load("/nonexistent/path/replay.bin"),
            Err(GameError::Io { .. })
        ));
    }
}
