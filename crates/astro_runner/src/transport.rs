//! The boundary between the game and whoever hosts the players.
//!
//! [`GameRunner`](crate::game_runner::GameRunner) only talks to the outside
//! world through [`Transport`]. Every call that can fail reports a
//! [`Status`]; the runner decides what a failure means (for players, death).

use std::io::{BufRead, Write};

use astro_core::snapshot::{ObserverSnapshot, PlayerSnapshot};

use crate::error::{Result, RunnerError};
use crate::protocol::{Reply, Request};

/// Outcome of a transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The other side acknowledged.
    Ok,
    /// Timeout, refusal or broken stream.
    Failed,
}

impl Status {
    /// Whether the call succeeded.
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<bool> for Status {
    fn from(ok: bool) -> Self {
        if ok {
            Self::Ok
        } else {
            Self::Failed
        }
    }
}

/// Channel to the players, the observer stream and the host log.
pub trait Transport {
    /// Player names in join order.
    fn read_roster(&mut self) -> Result<Vec<String>>;

    /// Send one player the state for the coming round.
    fn send_to_player(&mut self, name: &str, round_label: &str, state: &PlayerSnapshot) -> Status;

    /// Collect a player's raw command batch.
    fn read_from_player(&mut self, name: &str) -> (Status, String);

    /// Publish the state to spectators.
    fn send_to_observer(&mut self, state: &ObserverSnapshot) -> Status;

    /// Forward a diagnostic line to the host.
    fn log(&mut self, message: &str);

    /// Report final standings.
    fn report_scores(&mut self, scores: &[(String, i64)]) -> Status;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn read_roster(&mut self) -> Result<Vec<String>> {
        (**self).read_roster()
    }

    fn send_to_player(&mut self, name: &str, round_label: &str, state: &PlayerSnapshot) -> Status {
        (**self).send_to_player(name, round_label, state)
    }

    fn read_from_player(&mut self, name: &str) -> (Status, String) {
        (**self).read_from_player(name)
    }

    fn send_to_observer(&mut self, state: &ObserverSnapshot) -> Status {
        (**self).send_to_observer(state)
    }

    fn log(&mut self, message: &str) {
        (**self).log(message);
    }

    fn report_scores(&mut self, scores: &[(String, i64)]) -> Status {
        (**self).report_scores(scores)
    }
}

/// [`Transport`] speaking the JSON-lines protocol over any reader/writer
/// pair, typically stdin and stdout.
pub struct JsonLinesTransport<R, W> {
    reader: R,
    writer: W,
    line: String,
}

impl<R: BufRead, W: Write> JsonLinesTransport<R, W> {
    /// Wrap a reply stream and a request stream.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line: String::new(),
        }
    }

    /// Give back the underlying streams.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn write_request(&mut self, request: &Request<'_>) -> Result<()> {
        let line = request.to_json_line()?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_reply(&mut self) -> Result<Reply> {
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Err(RunnerError::Protocol("host closed the stream".to_string()));
        }
        Ok(Reply::from_json(self.line.trim_end())?)
    }

    /// Send a request and wait for its reply.
    ///
    /// Requests the host never answers are acknowledged locally.
    fn exchange(&mut self, request: &Request<'_>) -> Result<Reply> {
        self.write_request(request)?;
        if !request.expects_reply() {
            return Ok(Reply::ok());
        }
        self.read_reply()
    }

    /// Exchange where any failure collapses into a failed reply.
    fn exchange_or_fail(&mut self, request: &Request<'_>) -> Reply {
        match self.exchange(request) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(request = request.name(), error = %err, "Transport exchange failed");
                Reply::failed()
            }
        }
    }
}

impl<R: BufRead, W: Write> Transport for JsonLinesTransport<R, W> {
    fn read_roster(&mut self) -> Result<Vec<String>> {
        let reply = self.exchange(&Request::ReadRoster)?;
        if !reply.ok {
            return Err(RunnerError::Protocol("host refused read_roster".to_string()));
        }
        Ok(reply.roster)
    }

    fn send_to_player(&mut self, name: &str, round_label: &str, state: &PlayerSnapshot) -> Status {
        let request = Request::ToPlayer {
            name,
            round: round_label,
            state,
        };
        self.exchange_or_fail(&request).ok.into()
    }

    fn read_from_player(&mut self, name: &str) -> (Status, String) {
        let reply = self.exchange_or_fail(&Request::ReadPlayer { name });
        (reply.ok.into(), reply.payload_text())
    }

    fn send_to_observer(&mut self, state: &ObserverSnapshot) -> Status {
        self.exchange_or_fail(&Request::ToObserver { state }).ok.into()
    }

    fn log(&mut self, message: &str) {
        if let Err(err) = self.exchange(&Request::Log { message }) {
            tracing::warn!(error = %err, "Failed to forward log line");
        }
    }

    fn report_scores(&mut self, scores: &[(String, i64)]) -> Status {
        let scores = scores
            .iter()
            .map(|(name, score)| (name.as_str(), *score))
            .collect();
        self.exchange_or_fail(&Request::Scores { scores }).ok.into()
    }
}
