//! The hosting loop: collect batches over a [`Transport`], resolve rounds,
//! publish state and report the result.
//!
//! Players are polled one at a time in join order. Each alive player gets
//! the start-of-round state, then their batch is read. A failed send or
//! read marks the player dead for the rest of the game; their ships and
//! asteroids stay in the world. Once every alive player has answered, the
//! round is resolved in one go.

use astro_core::config::GameConfig;
use astro_core::components::PlayerId;
use astro_core::replay::{RecordedBatch, RecordedRound, Replay};
use astro_core::simulation::{PlayerBatch, RoundReport};
use astro_core::snapshot::{ObserverSnapshot, PlayerSnapshot};
use astro_core::world::World;
use tracing::{debug, info, warn};

use crate::error::{Result, RunnerError};
use crate::transport::Transport;

/// How to set up a hosted game.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerOptions {
    /// Rule set.
    pub config: GameConfig,
    /// World seed.
    pub seed: u64,
    /// Overrides `config.max_rounds` when set.
    pub rounds: Option<u32>,
    /// Keep a replay of everything the players sent.
    pub record_replay: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            config: GameConfig::default(),
            seed: 0,
            rounds: None,
            record_replay: true,
        }
    }
}

/// Outcome of a finished game.
#[derive(Debug, Clone)]
pub struct GameSummary {
    /// Rounds resolved.
    pub rounds: u32,
    /// `(name, score)` in join order.
    pub scores: Vec<(String, i64)>,
    /// World hash at the end.
    pub final_hash: u64,
    /// Recorded game, when recording was on.
    pub replay: Option<Replay>,
}

impl GameSummary {
    /// Name and score of the top player. Ties go to the earliest joiner.
    pub fn winner(&self) -> Option<(&str, i64)> {
        let mut best: Option<(&str, i64)> = None;
        for (name, score) in &self.scores {
            if best.map_or(true, |(_, top)| *score > top) {
                best = Some((name.as_str(), *score));
            }
        }
        best
    }
}

/// Hosts one game over a transport.
pub struct GameRunner<T> {
    transport: T,
    world: World,
    replay: Option<Replay>,
}

impl<T: Transport> GameRunner<T> {
    /// Read the roster and build the world.
    pub fn new(mut transport: T, options: RunnerOptions) -> Result<Self> {
        let roster = transport.read_roster()?;
        if roster.is_empty() {
            return Err(RunnerError::EmptyRoster);
        }

        let mut config = options.config;
        if let Some(rounds) = options.rounds {
            config.max_rounds = rounds;
        }
        let world = World::with_roster(config.clone(), options.seed, &roster)?;
        let replay = options
            .record_replay
            .then(|| Replay::new(options.seed, config, roster.clone()));

        transport.log(&format!("game ready for {} players", roster.len()));
        info!(
            players = roster.len(),
            seed = options.seed,
            rounds = world.config().max_rounds,
            "Game ready"
        );

        Ok(Self {
            transport,
            world,
            replay,
        })
    }

    /// Current world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Play one round: poll every alive player, resolve, publish.
    pub fn play_round(&mut self) -> RoundReport {
        let label = format!("round {}", self.world.round());
        let mut recorded = RecordedRound::default();
        let mut batches = Vec::new();

        for index in 0..self.world.players().len() {
            let id = PlayerId(index);
            let Some(player) = self.world.player(id) else {
                continue;
            };
            if !player.alive {
                continue;
            }
            let name = player.name.clone();

            let snapshot = PlayerSnapshot::capture(&self.world, id);
            if !self.transport.send_to_player(&name, &label, &snapshot).is_ok() {
                self.transport
                    .log(&format!("unexpected result of to_player for {name}"));
                self.drop_player(id, &mut recorded);
                continue;
            }

            let (status, raw) = self.transport.read_from_player(&name);
            if !status.is_ok() {
                self.transport
                    .log(&format!("unexpected result of read_player for {name}"));
                self.drop_player(id, &mut recorded);
                continue;
            }

            let (batch, parse_error) = PlayerBatch::from_json(id, &raw);
            match parse_error {
                Some(err) => self
                    .transport
                    .log(&format!("invalid JSON from player {name}: {err}")),
                None => self
                    .transport
                    .log(&format!("executing turns for {name}")),
            }
            recorded.batches.push(RecordedBatch { player: id, raw });
            batches.push(batch);
        }

        let report = self.world.play_round(&batches);
        for outcome in report.rejected() {
            let name = self
                .world
                .player(outcome.player)
                .map_or("?", |p| p.name.as_str());
            let reason = outcome.error.as_deref().unwrap_or_default();
            let message = format!(
                "{name}: command {} (type {}) rejected: {reason}",
                outcome.index, outcome.kind
            );
            self.transport.log(&message);
        }

        let observer = ObserverSnapshot::capture(&self.world);
        if !self.transport.send_to_observer(&observer).is_ok() {
            warn!(round = report.round, "Observer did not acknowledge state");
        }

        if let Some(replay) = &mut self.replay {
            replay.record_round(recorded);
        }
        debug!(
            round = report.round,
            commands = report.outcomes.len(),
            rejected = report.rejected().count(),
            destroyed = report.destroyed.len(),
            "Round hosted"
        );
        report
    }

    /// Play until the round limit and report the scores.
    pub fn run(mut self) -> GameSummary {
        while self.world.should_continue() {
            self.play_round();
        }
        self.finish()
    }

    /// Report scores and close out the replay.
    pub fn finish(mut self) -> GameSummary {
        let scores = self.world.scores();
        if !self.transport.report_scores(&scores).is_ok() {
            warn!("Host did not acknowledge scores");
        }
        if let Some(replay) = &mut self.replay {
            replay.finalize(&self.world);
        }

        let summary = GameSummary {
            rounds: self.world.round(),
            scores,
            final_hash: self.world.state_hash(),
            replay: self.replay,
        };
        info!(
            rounds = summary.rounds,
            hash = %format!("{:016x}", summary.final_hash),
            winner = ?summary.winner(),
            "Game over"
        );
        summary
    }

    fn drop_player(&mut self, id: PlayerId, recorded: &mut RecordedRound) {
        if let Err(err) = self.world.mark_player_dead(id) {
            warn!(player = %id, error = %err, "Could not mark player dead");
            return;
        }
        recorded.deaths.push(id);
    }
}
