//! Hosting tests for astro_runner.
//!
//! A scripted in-memory transport stands in for the player processes so
//! whole games can be played and inspected.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::Cursor;

use astro_core::prelude::*;
use astro_runner::{
    GameRunner, JsonLinesTransport, Reply, RunnerError, RunnerOptions, Status, Transport,
};
use astro_test_utils::fixtures::{batch_json, small_config};

/// Transport that plays back canned player output and records everything
/// the runner sends.
#[derive(Default)]
struct ScriptedTransport {
    roster: Vec<String>,
    /// Queued payloads per player; an empty queue answers `[]`.
    payloads: HashMap<String, VecDeque<String>>,
    /// Players whose next read fails.
    unresponsive: HashSet<String>,
    sent: Vec<(String, String)>,
    reads: Vec<String>,
    observer_frames: usize,
    logs: Vec<String>,
    scores: Option<Vec<(String, i64)>>,
}

impl ScriptedTransport {
    fn new(roster: &[&str]) -> Self {
        Self {
            roster: roster.iter().map(|name| (*name).to_string()).collect(),
            ..Self::default()
        }
    }

    fn queue(&mut self, player: &str, raw: impl Into<String>) {
        self.payloads
            .entry(player.to_string())
            .or_default()
            .push_back(raw.into());
    }

    fn logged(&self, needle: &str) -> bool {
        self.logs.iter().any(|line| line.contains(needle))
    }
}

impl Transport for ScriptedTransport {
    fn read_roster(&mut self) -> astro_runner::Result<Vec<String>> {
        Ok(self.roster.clone())
    }

    fn send_to_player(&mut self, name: &str, round_label: &str, state: &PlayerSnapshot) -> Status {
        assert_eq!(state.map.players[state.player_id.0].name, name);
        self.sent.push((name.to_string(), round_label.to_string()));
        Status::Ok
    }

    fn read_from_player(&mut self, name: &str) -> (Status, String) {
        self.reads.push(name.to_string());
        if self.unresponsive.contains(name) {
            return (Status::Failed, String::new());
        }
        let raw = self
            .payloads
            .get_mut(name)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| "[]".to_string());
        (Status::Ok, raw)
    }

    fn send_to_observer(&mut self, _state: &ObserverSnapshot) -> Status {
        self.observer_frames += 1;
        Status::Ok
    }

    fn log(&mut self, message: &str) {
        self.logs.push(message.to_string());
    }

    fn report_scores(&mut self, scores: &[(String, i64)]) -> Status {
        self.scores = Some(scores.to_vec());
        Status::Ok
    }
}

fn options(rounds: u32) -> RunnerOptions {
    RunnerOptions {
        config: small_config(),
        seed: 2024,
        rounds: Some(rounds),
        record_replay: true,
    }
}

fn buy(class: i64) -> Command {
    Command::Buy(BuyCommand { class })
}

// =============================================================================
// Game loop
// =============================================================================

mod game_loop {
    use super::*;

    #[test]
    fn test_full_game_reports_scores() {
        let mut transport = ScriptedTransport::new(&["alice", "bob"]);
        transport.queue("alice", batch_json(&[buy(2), buy(5)]));

        let summary = GameRunner::new(&mut transport, options(4)).unwrap().run();

        assert_eq!(summary.rounds, 4);
        assert_eq!(summary.scores.len(), 2);
        assert_eq!(transport.scores.as_deref(), Some(&summary.scores[..]));
        assert_eq!(transport.observer_frames, 4);
        assert!(transport.logged("game ready for 2 players"));
        assert!(transport.logged("executing turns for alice"));

        let labels: Vec<&str> = transport
            .sent
            .iter()
            .filter(|(name, _)| name == "alice")
            .map(|(_, label)| label.as_str())
            .collect();
        assert_eq!(labels, vec!["round 0", "round 1", "round 2", "round 3"]);
    }

    #[test]
    fn test_purchases_land_in_world() {
        let mut transport = ScriptedTransport::new(&["alice", "bob"]);
        transport.queue("alice", batch_json(&[buy(2), buy(5)]));

        let mut runner = GameRunner::new(&mut transport, options(10)).unwrap();
        let report = runner.play_round();
        assert!(report.outcomes.iter().all(CommandOutcome::is_ok));

        let world = runner.world();
        let owned = world
            .ships()
            .iter()
            .filter(|(_, ship)| ship.owner == PlayerId(0))
            .count();
        assert_eq!(owned, 3);
        assert_eq!(world.player(PlayerId(0)).unwrap().rock, 800);
    }

    #[test]
    fn test_empty_roster_is_rejected() {
        let transport = ScriptedTransport::new(&[]);
        assert!(matches!(
            GameRunner::new(transport, options(1)),
            Err(RunnerError::EmptyRoster)
        ));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let transport = ScriptedTransport::new(&["same", "same"]);
        assert!(matches!(
            GameRunner::new(transport, options(1)),
            Err(RunnerError::Game(_))
        ));
    }
}

// =============================================================================
// Misbehaving players
// =============================================================================

mod faults {
    use super::*;

    #[test]
    fn test_unresponsive_player_is_dropped() {
        let mut transport = ScriptedTransport::new(&["alice", "bob"]);
        transport.unresponsive.insert("bob".to_string());

        let mut runner = GameRunner::new(&mut transport, options(3)).unwrap();
        runner.play_round();
        let world = runner.world();
        assert!(!world.player(PlayerId(1)).unwrap().alive);
        // Their mothership stays in play.
        assert!(world.ship(world.player(PlayerId(1)).unwrap().mothership).is_some());

        let summary = runner.run();
        assert_eq!(summary.rounds, 3);
        let bob_reads = transport.reads.iter().filter(|n| *n == "bob").count();
        assert_eq!(bob_reads, 1);
        assert!(transport.logged("unexpected result of read_player for bob"));
    }

    #[test]
    fn test_invalid_json_is_logged_and_skipped() {
        let mut transport = ScriptedTransport::new(&["alice"]);
        transport.queue("alice", "{not json");
        transport.queue("alice", batch_json(&[buy(1)]));

        let mut runner = GameRunner::new(&mut transport, options(5)).unwrap();
        let first = runner.play_round();
        assert!(first.outcomes.is_empty());
        let second = runner.play_round();
        assert_eq!(second.outcomes.len(), 1);
        assert!(second.outcomes[0].is_ok());
        assert!(runner.world().player(PlayerId(0)).unwrap().alive);

        runner.finish();
        assert!(transport.logged("invalid JSON from player alice"));
    }

    #[test]
    fn test_rejections_are_forwarded_to_log() {
        let mut transport = ScriptedTransport::new(&["alice"]);
        transport.queue("alice", r#"[{"type":0,"data":{"type":0}},{"type":42,"data":{}}]"#);

        let mut runner = GameRunner::new(&mut transport, options(2)).unwrap();
        let report = runner.play_round();
        assert_eq!(report.rejected().count(), 2);
        runner.finish();

        assert!(transport.logged("alice: command 0 (type 0) rejected"));
        assert!(transport.logged("alice: command 1 (type 42) rejected"));
    }
}

// =============================================================================
// Replays
// =============================================================================

mod replays {
    use super::*;

    fn hosted_game() -> astro_runner::GameSummary {
        let mut transport = ScriptedTransport::new(&["alice", "bob"]);
        transport.queue("alice", batch_json(&[buy(2), buy(5)]));
        transport.queue(
            "alice",
            r#"[{"type":1,"data":{"ship_id":2,"vector":{"x":4.0,"y":-3.0}}}]"#,
        );
        transport.unresponsive.insert("bob".to_string());
        GameRunner::new(&mut transport, options(6)).unwrap().run()
    }

    #[test]
    fn test_recorded_game_verifies() {
        let summary = hosted_game();
        let replay = summary.replay.expect("recording was on");
        assert_eq!(replay.duration(), 6);
        assert_eq!(replay.rounds[0].deaths, vec![PlayerId(1)]);

        let world = replay.verify().unwrap();
        assert_eq!(world.state_hash(), summary.final_hash);
        assert_eq!(world.scores(), summary.scores);
    }

    #[test]
    fn test_replay_file_round_trip() {
        let summary = hosted_game();
        let replay = summary.replay.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosted.replay");

        replay.save(&path).unwrap();
        let loaded = Replay::load(&path).unwrap();
        assert_eq!(loaded.verify().unwrap().state_hash(), summary.final_hash);
    }

    #[test]
    fn test_recording_can_be_disabled() {
        let transport = ScriptedTransport::new(&["alice"]);
        let opts = RunnerOptions {
            record_replay: false,
            ..options(2)
        };
        let summary = GameRunner::new(transport, opts).unwrap().run();
        assert!(summary.replay.is_none());
    }
}

// =============================================================================
// JSON-lines transport
// =============================================================================

mod json_lines {
    use super::*;

    fn reply_lines(replies: &[Reply]) -> Vec<u8> {
        replies
            .iter()
            .map(|r| serde_json::to_string(r).unwrap() + "\n")
            .collect::<String>()
            .into_bytes()
    }

    #[test]
    fn test_stdio_style_session() {
        // Roster, then per round: to_player ack, batch, observer ack. Then scores.
        let replies = reply_lines(&[
            Reply::with_roster(["solo"]),
            Reply::ok(),
            Reply::with_payload(batch_json(&[buy(3)])),
            Reply::ok(),
            Reply::ok(),
            Reply::with_payload("[]"),
            Reply::ok(),
            Reply::ok(),
        ]);
        let transport = JsonLinesTransport::new(Cursor::new(replies), Vec::new());
        let runner = GameRunner::new(transport, options(2)).unwrap();
        let summary = runner.run();
        assert_eq!(summary.rounds, 2);
        assert_eq!(summary.scores.len(), 1);
        assert_eq!(summary.scores[0].0, "solo");
    }

    #[test]
    fn test_requests_are_tagged_lines() {
        let replies = reply_lines(&[
            Reply::with_roster(["solo"]),
            Reply::ok(),
            Reply::with_payload("[]"),
            Reply::ok(),
            Reply::ok(),
        ]);
        let mut out = Vec::new();
        {
            let transport = JsonLinesTransport::new(Cursor::new(replies), &mut out);
            GameRunner::new(transport, options(1)).unwrap().run();
        }

        let kinds: Vec<String> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["kind"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                "read_roster",
                "log",
                "to_player",
                "read_player",
                "log",
                "to_observer",
                "scores"
            ]
        );
    }

    #[test]
    fn test_host_hangup_kills_players() {
        let replies = reply_lines(&[Reply::with_roster(["solo"])]);
        let transport = JsonLinesTransport::new(Cursor::new(replies), Vec::new());
        let mut runner = GameRunner::new(transport, options(3)).unwrap();
        runner.play_round();
        assert!(!runner.world().player(PlayerId(0)).unwrap().alive);
    }
}
