//! The room actor.
//!
//! Each room runs as a single task draining a message queue, so every
//! mutation of room state is serialized and the gameplay code stays free of
//! locks. Timers are tasks that post back into the same queue; an epoch
//! counter bumps on every re-arm so a stale timer message is recognized and
//! dropped instead of advancing a phase it no longer owns.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use indexmap::IndexMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    content::ContentLibrary,
    dto::{
        room::{ActiveRound, RoomSnapshot},
        ws::{ClientMessage, PlayerRole, ServerMessage},
    },
    error::ServiceError,
    game::{
        GameConfig, ModeSelection, TeamPair, TeamSide,
        dispute::Dispute,
        modes::{DeadlineOutcome, ModeAction, ModeData, ResolveTrigger, RevealedAnswer},
        round::{ModeBag, Round, RoundRecord},
        scoring::Scoreboard,
    },
    state::{
        phase::{PhaseEvent, RoomPhase, compute_transition},
        player::{Connection, Outbound, Player},
    },
};

/// Reply to a successful room bind.
#[derive(Debug, Clone)]
pub struct Welcome {
    /// Identity assigned (or restored) to the caller.
    pub player_id: Uuid,
    /// Token to present on `room:rejoin`.
    pub session_token: Uuid,
    /// Room code.
    pub code: String,
}

/// Messages accepted by a room actor.
#[derive(Debug)]
pub enum RoomMessage {
    /// A socket wants a fresh seat in this room.
    Join {
        /// Trimmed display name.
        name: String,
        /// Outbound half of the socket.
        out: Outbound,
        /// Where to send the result.
        reply: oneshot::Sender<Result<Welcome, ServiceError>>,
    },
    /// A socket wants to reclaim a seat within the reconnect grace.
    Rejoin {
        /// Token issued at the original join.
        session_token: Uuid,
        /// Outbound half of the new socket.
        out: Outbound,
        /// Where to send the result.
        reply: oneshot::Sender<Result<Welcome, ServiceError>>,
    },
    /// A bound client sent a message.
    Client {
        /// Sending player.
        player: Uuid,
        /// Parsed message.
        message: ClientMessage,
    },
    /// A bound client's socket dropped.
    Disconnected {
        /// Affected player.
        player: Uuid,
    },
    /// A timer task fired.
    Timer(TimerEvent),
    /// The registry is reaping this room.
    Shutdown,
}

/// Timer task payloads.
#[derive(Debug, Clone, Copy)]
pub enum TimerEvent {
    /// Once-a-second countdown pulse for the armed window.
    Tick {
        /// Epoch the tick belongs to.
        epoch: u64,
    },
    /// The armed window elapsed.
    Deadline {
        /// Epoch the deadline belongs to.
        epoch: u64,
    },
    /// A disconnected player's reconnect grace ran out.
    GraceExpired {
        /// Affected player.
        player: Uuid,
    },
}

/// Cheap clonable address of a room actor, held by the registry and by
/// every socket bound to the room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    /// Room code.
    pub code: String,
    tx: mpsc::UnboundedSender<RoomMessage>,
    connected: Arc<AtomicUsize>,
    empty_since: Arc<Mutex<Option<Instant>>>,
}

impl RoomHandle {
    /// Post a message to the actor. Returns false when the room is gone.
    pub fn send(&self, message: RoomMessage) -> bool {
        self.tx.send(message).is_ok()
    }

    /// Live sockets currently bound to the room.
    pub fn connected(&self) -> usize {
        self.connected.load(Ordering::Relaxed)
    }

    /// How long the room has had no live socket, if it is empty.
    pub fn idle_for(&self) -> Option<Duration> {
        self.empty_since
            .lock()
            .ok()
            .and_then(|guard| guard.map(|since| since.elapsed()))
    }
}

/// Match-scoped state, built on `game:start` and kept through `Ended` so
/// the final board stays visible.
struct MatchState {
    board: Scoreboard,
    bag: ModeBag,
    round: Option<Round>,
    rounds_played: u32,
    history: Vec<RoundRecord>,
    dispute: Option<Dispute>,
    /// One dispute per round result.
    dispute_spent: bool,
}

impl MatchState {
    fn new(config: &GameConfig) -> Self {
        Self {
            board: Scoreboard::new(),
            bag: ModeBag::new(config),
            round: None,
            rounds_played: 0,
            history: Vec::new(),
            dispute: None,
            dispute_spent: false,
        }
    }
}

/// A single room and everything in it. Owned by its actor task.
pub struct Room {
    code: String,
    config: Arc<AppConfig>,
    content: Arc<dyn ContentLibrary>,
    tx: mpsc::UnboundedSender<RoomMessage>,
    players: IndexMap<Uuid, Player>,
    host: Uuid,
    phase: RoomPhase,
    game_config: GameConfig,
    game: Option<MatchState>,
    timer_epoch: u64,
    deadline: Option<Instant>,
    window: Option<Duration>,
    connected: Arc<AtomicUsize>,
    empty_since: Arc<Mutex<Option<Instant>>>,
}

impl Room {
    /// Build a room and the handle addressing it. The caller decides when
    /// to start the actor loop with [`Room::run`].
    pub fn new(
        code: String,
        config: Arc<AppConfig>,
        content: Arc<dyn ContentLibrary>,
    ) -> (Self, RoomHandle, mpsc::UnboundedReceiver<RoomMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicUsize::new(0));
        let empty_since = Arc::new(Mutex::new(Some(Instant::now())));
        let handle = RoomHandle {
            code: code.clone(),
            tx: tx.clone(),
            connected: connected.clone(),
            empty_since: empty_since.clone(),
        };
        let room = Self {
            code,
            game_config: config.default_game.clone(),
            config,
            content,
            tx,
            players: IndexMap::new(),
            host: Uuid::nil(),
            phase: RoomPhase::Lobby,
            game: None,
            timer_epoch: 0,
            deadline: None,
            window: None,
            connected,
            empty_since,
        };
        (room, handle, rx)
    }

    /// Build a room and immediately run its actor on a fresh task.
    pub fn spawn(
        code: String,
        config: Arc<AppConfig>,
        content: Arc<dyn ContentLibrary>,
    ) -> RoomHandle {
        let (room, handle, rx) = Self::new(code, config, content);
        tokio::spawn(room.run(rx));
        handle
    }

    /// Actor loop: drain the queue until shutdown.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<RoomMessage>) {
        info!(code = %self.code, "room opened");
        while let Some(message) = rx.recv().await {
            if matches!(message, RoomMessage::Shutdown) {
                break;
            }
            self.handle(message);
        }
        info!(code = %self.code, "room closed");
    }

    /// Dispatch one queue message.
    pub fn handle(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join { name, out, reply } => {
                let _ = reply.send(self.handle_join(name, out));
            }
            RoomMessage::Rejoin {
                session_token,
                out,
                reply,
            } => {
                let _ = reply.send(self.handle_rejoin(session_token, out));
            }
            RoomMessage::Client { player, message } => {
                if let Err(err) = self.handle_client(player, message) {
                    self.send_to(player, err.to_message());
                }
            }
            RoomMessage::Disconnected { player } => self.handle_disconnect(player),
            RoomMessage::Timer(event) => self.handle_timer(event),
            RoomMessage::Shutdown => {}
        }
    }

    // ----- membership -----

    fn handle_join(&mut self, name: String, out: Outbound) -> Result<Welcome, ServiceError> {
        if self.players.len() >= self.config.max_players {
            return Err(ServiceError::RoomFull);
        }
        // Lobby joins get seated on the smaller side; mid-match arrivals
        // spectate until the next match.
        let team = match self.phase {
            RoomPhase::Lobby | RoomPhase::Ended => Some(self.smaller_team()),
            _ => None,
        };
        let player = Player::new(name.trim().to_string(), team, out);
        let welcome = Welcome {
            player_id: player.id,
            session_token: player.session_token,
            code: self.code.clone(),
        };
        if self.host.is_nil() {
            self.host = player.id;
        }
        player.send(ServerMessage::Welcome {
            code: welcome.code.clone(),
            player_id: welcome.player_id,
            session_token: welcome.session_token,
        });
        self.players.insert(player.id, player);
        self.refresh_presence();
        self.broadcast_snapshot();
        Ok(welcome)
    }

    fn handle_rejoin(&mut self, session_token: Uuid, out: Outbound) -> Result<Welcome, ServiceError> {
        let player = self
            .players
            .values_mut()
            .find(|p| p.session_token == session_token)
            .ok_or(ServiceError::UnknownSession)?;
        if player.is_connected() {
            return Err(ServiceError::SeatTaken);
        }
        player.connection = Connection::Online(out);
        let welcome = Welcome {
            player_id: player.id,
            session_token: player.session_token,
            code: self.code.clone(),
        };
        let name = player.name.clone();
        player.send(ServerMessage::Welcome {
            code: welcome.code.clone(),
            player_id: welcome.player_id,
            session_token: welcome.session_token,
        });
        info!(code = %self.code, player = %welcome.player_id, "seat reclaimed");
        self.refresh_presence();
        self.broadcast(ServerMessage::Notice {
            message: format!("{name} reconnected"),
        });
        self.broadcast_snapshot();
        Ok(welcome)
    }

    fn handle_disconnect(&mut self, player_id: Uuid) {
        let Some(player) = self.players.get_mut(&player_id) else {
            return;
        };
        if !player.is_connected() {
            return;
        }
        player.connection = Connection::Offline {
            since: Instant::now(),
        };
        let grace = self.config.reconnect_grace;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let _ = tx.send(RoomMessage::Timer(TimerEvent::GraceExpired {
                player: player_id,
            }));
        });
        debug!(code = %self.code, player = %player_id, "socket dropped, grace armed");
        self.refresh_presence();
        self.broadcast_snapshot();
    }

    fn handle_grace_expired(&mut self, player_id: Uuid) {
        let expired = self.players.get(&player_id).is_some_and(|p| {
            matches!(
                p.connection,
                Connection::Offline { since } if since.elapsed() >= self.config.reconnect_grace
            )
        });
        if expired {
            self.remove_player(player_id, "left (connection lost)");
        }
    }

    fn remove_player(&mut self, player_id: Uuid, why: &str) {
        let Some(player) = self.players.shift_remove(&player_id) else {
            return;
        };
        info!(code = %self.code, player = %player_id, "player removed");
        self.broadcast(ServerMessage::Notice {
            message: format!("{} {why}", player.name),
        });
        if self.host == player_id {
            if let Some(next) = self.players.keys().next().copied() {
                self.host = next;
                let name = self
                    .players
                    .get(&next)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                self.broadcast(ServerMessage::Notice {
                    message: format!("{name} is the new host"),
                });
            } else {
                // Empty room: the next joiner becomes host.
                self.host = Uuid::nil();
            }
        }
        // A team losing its last seat mid-match forfeits.
        if let Some(team) = player.team {
            let mid_match = !matches!(self.phase, RoomPhase::Lobby | RoomPhase::Ended);
            let vacated = !self.players.values().any(|p| p.team == Some(team));
            if mid_match && vacated {
                self.finish_match(Some(team.opponent()));
            }
        }
        self.refresh_presence();
        self.broadcast_snapshot();
    }

    /// Side with fewer seated players; ties go to A.
    fn smaller_team(&self) -> TeamSide {
        let mut seated = TeamPair::splat(0usize);
        for player in self.players.values() {
            if let Some(team) = player.team {
                *seated.get_mut(team) += 1;
            }
        }
        if seated.b < seated.a {
            TeamSide::B
        } else {
            TeamSide::A
        }
    }

    fn refresh_presence(&self) {
        let live = self.players.values().filter(|p| p.is_connected()).count();
        self.connected.store(live, Ordering::Relaxed);
        if let Ok(mut guard) = self.empty_since.lock() {
            *guard = if live == 0 { Some(Instant::now()) } else { None };
        }
    }

    // ----- client messages -----

    fn handle_client(
        &mut self,
        player_id: Uuid,
        message: ClientMessage,
    ) -> Result<(), ServiceError> {
        match message {
            // Binding messages are handled before the socket reaches us.
            ClientMessage::CreateRoom(_) | ClientMessage::JoinRoom(_) | ClientMessage::Rejoin(_) => {
                Ok(())
            }
            ClientMessage::LeaveRoom => {
                self.remove_player(player_id, "left the room");
                Ok(())
            }
            ClientMessage::MovePlayer { player, team, role } => {
                self.require_host(player_id)?;
                self.require_phase(&[RoomPhase::Lobby, RoomPhase::Ended])?;
                let target = self
                    .players
                    .get_mut(&player)
                    .ok_or(ServiceError::PlayerNotFound)?;
                target.team = team;
                target.ready = false;
                if role == Some(PlayerRole::Host) && player != self.host {
                    let name = target.name.clone();
                    self.host = player;
                    self.broadcast(ServerMessage::Notice {
                        message: format!("{name} is now the host"),
                    });
                }
                self.broadcast_snapshot();
                Ok(())
            }
            ClientMessage::SetReady { ready } => {
                self.require_phase(&[RoomPhase::Lobby, RoomPhase::Ended])?;
                let player = self
                    .players
                    .get_mut(&player_id)
                    .ok_or(ServiceError::PlayerNotFound)?;
                player.ready = ready;
                self.broadcast_snapshot();
                Ok(())
            }
            ClientMessage::UpdateConfig { config } => {
                self.require_host(player_id)?;
                self.require_phase(&[RoomPhase::Lobby, RoomPhase::Ended])?;
                self.game_config.apply(config);
                self.broadcast_snapshot();
                Ok(())
            }
            ClientMessage::StartGame => {
                self.require_host(player_id)?;
                self.require_phase(&[RoomPhase::Lobby, RoomPhase::Ended])?;
                self.start_match()
            }
            ClientMessage::SelectMode { mode } => {
                self.require_host(player_id)?;
                self.require_phase(&[RoomPhase::ModeSelect])?;
                if self.game_config.mode_selection != ModeSelection::HostPick {
                    return Err(ServiceError::BadPhase(self.phase.name()));
                }
                let game = self.game.as_mut().ok_or(ServiceError::BadPhase("lobby"))?;
                if !game.bag.take(mode) {
                    return Err(ServiceError::BadPhase(self.phase.name()));
                }
                self.start_round(mode);
                Ok(())
            }
            ClientMessage::SkipRound => {
                self.require_host(player_id)?;
                self.require_phase(&[RoomPhase::Active])?;
                self.resolve_round(ResolveTrigger::Skipped);
                Ok(())
            }
            ClientMessage::SubmitAnswer { text } => {
                self.handle_action(player_id, ModeAction::Answer(text))
            }
            ClientMessage::SubmitBet { amount } => {
                self.handle_action(player_id, ModeAction::Bet(amount))
            }
            ClientMessage::SubmitMytho { value } => {
                self.handle_action(player_id, ModeAction::Vote(value))
            }
            ClientMessage::Buzz => self.handle_action(player_id, ModeAction::Buzz),
            ClientMessage::RequestDispute { result_id } => {
                self.open_dispute(player_id, result_id)
            }
            ClientMessage::VoteDispute { accept } => self.vote_dispute(player_id, accept),
            ClientMessage::Typing { text } => {
                let Some(team) = self.players.get(&player_id).and_then(|p| p.team) else {
                    return Ok(());
                };
                let typing = ServerMessage::Typing {
                    player: player_id,
                    text,
                };
                for player in self.players.values() {
                    if player.id != player_id && player.team == Some(team) {
                        player.send(typing.clone());
                    }
                }
                Ok(())
            }
        }
    }

    fn require_host(&self, player_id: Uuid) -> Result<(), ServiceError> {
        if self.host == player_id {
            Ok(())
        } else {
            Err(ServiceError::NotHost)
        }
    }

    fn require_phase(&self, allowed: &[RoomPhase]) -> Result<(), ServiceError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(ServiceError::BadPhase(self.phase.name()))
        }
    }

    fn transition(&mut self, event: PhaseEvent) {
        match compute_transition(self.phase, event) {
            Some(next) => {
                debug!(code = %self.code, from = self.phase.name(), to = next.name(), "phase change");
                self.phase = next;
            }
            None => {
                warn!(code = %self.code, phase = self.phase.name(), ?event, "invalid transition ignored");
            }
        }
    }

    // ----- match flow -----

    fn start_match(&mut self) -> Result<(), ServiceError> {
        let mut seated = TeamPair::splat(0usize);
        let mut unready = false;
        for player in self.players.values() {
            if let Some(team) = player.team {
                *seated.get_mut(team) += 1;
                if player.is_connected() && !player.ready {
                    unready = true;
                }
            }
        }
        if seated.a == 0 || seated.b == 0 || unready {
            return Err(ServiceError::TeamsNotReady);
        }

        self.game = Some(MatchState::new(&self.game_config));
        self.transition(PhaseEvent::StartRequested);
        let teams = TeamPair::new(self.team_names(TeamSide::A), self.team_names(TeamSide::B));
        self.broadcast(ServerMessage::VsIntro {
            teams,
            config: self.game_config.clone(),
        });
        self.broadcast_snapshot();
        self.arm_deadline(self.config.timers.vs_intro);
        Ok(())
    }

    fn team_names(&self, side: TeamSide) -> Vec<String> {
        self.players
            .values()
            .filter(|p| p.team == Some(side))
            .map(|p| p.name.clone())
            .collect()
    }

    fn open_mode_select(&mut self) {
        self.transition(PhaseEvent::IntroFinished);
        let host_pick = self.game_config.mode_selection == ModeSelection::HostPick;
        let options = match &self.game {
            Some(game) => game.bag.options(),
            None => return,
        };
        self.broadcast(ServerMessage::ModeRoulette { options, host_pick });
        self.broadcast_snapshot();
        self.arm_deadline(self.config.timers.mode_select);
    }

    fn start_round(&mut self, mode: crate::game::GameMode) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        game.rounds_played += 1;
        game.dispute_spent = false;
        let round = Round::new(
            game.rounds_played,
            mode,
            self.content.as_ref(),
            &self.game_config,
        );
        let window = round.data.initial_window(&self.config.timers);
        let view = round.data.public_view();
        let number = round.number;
        game.round = Some(round);

        self.transition(PhaseEvent::ModeChosen);
        self.broadcast(ServerMessage::ModeSelected { mode });
        self.broadcast(ServerMessage::RoundStarted {
            number,
            view,
            deadline_ms: window.as_millis() as u64,
        });
        self.broadcast_snapshot();
        self.arm_deadline(window);
    }

    fn handle_action(&mut self, player_id: Uuid, action: ModeAction) -> Result<(), ServiceError> {
        self.require_phase(&[RoomPhase::Active])?;
        let player = self
            .players
            .get(&player_id)
            .ok_or(ServiceError::PlayerNotFound)?;
        let team = player.team.ok_or(ServiceError::NotSeated)?;

        let mut team_connected = TeamPair::splat(0usize);
        for p in self.players.values() {
            if let (Some(side), true) = (p.team, p.is_connected()) {
                *team_connected.get_mut(side) += 1;
            }
        }

        let ctx = crate::game::modes::SubmitCtx {
            player: player_id,
            team,
            policy: &self.config.match_policy,
            timers: &self.config.timers,
            team_connected,
        };
        let game = self.game.as_mut().ok_or(ServiceError::BadPhase("lobby"))?;
        let round = game
            .round
            .as_mut()
            .ok_or(ServiceError::BadPhase("mode_select"))?;

        let accepted = round.data.submit(&ctx, action)?;
        let complete = round.data.is_complete();
        for event in accepted.events {
            self.broadcast(ServerMessage::Mode(event));
        }
        if let Some(window) = accepted.window {
            self.arm_deadline(window);
        }
        if complete {
            self.resolve_round(ResolveTrigger::Natural);
        }
        Ok(())
    }

    fn resolve_round(&mut self, trigger: ResolveTrigger) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let Some(round) = game.round.take() else {
            return;
        };
        let result = round.data.resolve(trigger);

        // Mytho gets its epilogue before the score movement.
        if let ModeData::Mytho(data) = &round.data {
            if let RevealedAnswer::Truth(truth) = result.reveal {
                let verdicts = data.verdicts();
                self.broadcast(ServerMessage::MythoResult { verdicts, truth });
            }
        }

        let game = match self.game.as_mut() {
            Some(game) => game,
            None => return,
        };
        let board_before = game.board.clone();
        let settlement = game.board.apply(&result, &self.config.damage);
        let ended = ServerMessage::RoundEnded {
            result_id: result.id,
            mode: result.mode,
            winner: result.winner,
            reveal: result.reveal.clone(),
            settlement: settlement.clone(),
        };
        game.history.push(RoundRecord {
            number: round.number,
            result,
            settlement,
            board_before,
        });

        self.broadcast(ended);
        self.transition(PhaseEvent::RoundResolved);
        self.broadcast_snapshot();
        self.arm_deadline(self.config.timers.result);
    }

    /// Leave the result phase: knockout or an empty bag ends the match,
    /// otherwise the next selection window opens.
    fn advance_after_result(&mut self) {
        let (knockout, exhausted) = match &self.game {
            Some(game) => (game.board.knockout(), game.bag.is_empty()),
            None => return,
        };
        if let Some(loser) = knockout {
            self.finish_match(Some(loser.opponent()));
        } else if exhausted {
            let winner = self.game.as_ref().and_then(|g| g.board.leader());
            self.finish_match(winner);
        } else {
            // Re-enter selection without replaying the intro.
            self.transition(PhaseEvent::NextRound);
            let host_pick = self.game_config.mode_selection == ModeSelection::HostPick;
            if let Some(game) = &self.game {
                let options = game.bag.options();
                self.broadcast(ServerMessage::ModeRoulette { options, host_pick });
            }
            self.broadcast_snapshot();
            self.arm_deadline(self.config.timers.mode_select);
        }
    }

    fn finish_match(&mut self, winner: Option<TeamSide>) {
        let hp = match &self.game {
            Some(game) => game.board.hp,
            None => return,
        };
        self.clear_deadline();
        if compute_transition(self.phase, PhaseEvent::MatchOver).is_some() {
            self.transition(PhaseEvent::MatchOver);
        } else {
            // Forfeits end the match from any phase.
            self.phase = RoomPhase::Ended;
        }
        for player in self.players.values_mut() {
            player.ready = false;
        }
        self.broadcast(ServerMessage::GameEnded { winner, hp });
        self.broadcast_snapshot();
        info!(code = %self.code, ?winner, "match ended");
    }

    // ----- disputes -----

    fn open_dispute(&mut self, player_id: Uuid, result_id: Uuid) -> Result<(), ServiceError> {
        self.require_phase(&[RoomPhase::Result])?;
        let player = self
            .players
            .get(&player_id)
            .ok_or(ServiceError::PlayerNotFound)?;
        let team = player.team.ok_or(ServiceError::NotSeated)?;
        let voters = self.players.values().filter(|p| p.is_connected()).count();

        let game = self.game.as_mut().ok_or(ServiceError::NothingToDispute)?;
        let record = game.history.last().ok_or(ServiceError::NothingToDispute)?;
        if record.result.id != result_id || game.dispute_spent {
            return Err(ServiceError::NothingToDispute);
        }
        // Any seated player may challenge; an accepted correction always
        // hands the round to a side the result went against.
        let beneficiary = if record.result.losers.contains(&team) {
            team
        } else if let Some(winner) = record.result.winner {
            winner.opponent()
        } else {
            team
        };
        game.dispute = Some(Dispute::new(result_id, player_id, beneficiary, voters));
        game.dispute_spent = true;

        self.transition(PhaseEvent::DisputeOpened);
        self.broadcast(ServerMessage::DisputeStarted {
            result_id,
            challenger: player_id,
            challenger_team: beneficiary,
            deadline_ms: self.config.timers.dispute.as_millis() as u64,
        });
        self.broadcast_snapshot();
        self.arm_deadline(self.config.timers.dispute);
        Ok(())
    }

    fn vote_dispute(&mut self, player_id: Uuid, accept: bool) -> Result<(), ServiceError> {
        self.require_phase(&[RoomPhase::Dispute])?;
        if !self.players.contains_key(&player_id) {
            return Err(ServiceError::PlayerNotFound);
        }
        let game = self.game.as_mut().ok_or(ServiceError::NothingToDispute)?;
        let dispute = game
            .dispute
            .as_mut()
            .ok_or(ServiceError::NothingToDispute)?;
        dispute.vote(player_id, accept)?;
        if dispute.all_voted() {
            self.settle_dispute();
        }
        Ok(())
    }

    fn settle_dispute(&mut self) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let Some(dispute) = game.dispute.take() else {
            return;
        };
        let verdict = dispute.verdict();
        let settlement = if verdict.accepted {
            match game.history.pop() {
                Some(record) => {
                    // Rewind to the pre-round board and re-apply the
                    // corrected result.
                    game.board = record.board_before.clone();
                    let corrected = dispute.corrected_result(&record.result);
                    let board_before = game.board.clone();
                    let settlement = game.board.apply(&corrected, &self.config.damage);
                    game.history.push(RoundRecord {
                        number: record.number,
                        result: corrected,
                        settlement: settlement.clone(),
                        board_before,
                    });
                    Some(settlement)
                }
                None => None,
            }
        } else {
            None
        };
        self.broadcast(ServerMessage::DisputeResolved {
            verdict,
            settlement,
        });
        self.transition(PhaseEvent::DisputeSettled);
        self.broadcast_snapshot();
        self.arm_deadline(self.config.timers.result);
    }

    // ----- timers -----

    fn arm_deadline(&mut self, window: Duration) {
        self.timer_epoch += 1;
        let epoch = self.timer_epoch;
        self.deadline = Some(Instant::now() + window);
        self.window = Some(window);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let tick = Duration::from_secs(1);
            let mut remaining = window;
            while remaining > tick {
                tokio::time::sleep(tick).await;
                remaining -= tick;
                if tx
                    .send(RoomMessage::Timer(TimerEvent::Tick { epoch }))
                    .is_err()
                {
                    return;
                }
            }
            tokio::time::sleep(remaining).await;
            let _ = tx.send(RoomMessage::Timer(TimerEvent::Deadline { epoch }));
        });
    }

    fn clear_deadline(&mut self) {
        self.timer_epoch += 1;
        self.deadline = None;
        self.window = None;
    }

    fn remaining_ms(&self) -> Option<u64> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()).as_millis() as u64)
    }

    fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::GraceExpired { player } => self.handle_grace_expired(player),
            TimerEvent::Tick { epoch } => {
                if epoch != self.timer_epoch {
                    return;
                }
                let Some(remaining_ms) = self.remaining_ms() else {
                    return;
                };
                self.broadcast(ServerMessage::TimerTick { remaining_ms });
                // Pixel rounds also publish how much of the picture is out.
                if self.phase == RoomPhase::Active {
                    let is_reveal = self
                        .game
                        .as_ref()
                        .and_then(|g| g.round.as_ref())
                        .is_some_and(|r| matches!(r.data, ModeData::PixelReveal(_)));
                    if let (true, Some(window)) = (is_reveal, self.window) {
                        let total = window.as_millis() as f32;
                        let revealed = if total > 0.0 {
                            (1.0 - remaining_ms as f32 / total).clamp(0.0, 1.0)
                        } else {
                            1.0
                        };
                        self.broadcast(ServerMessage::PixelBlurUpdate { revealed });
                    }
                }
            }
            TimerEvent::Deadline { epoch } => {
                if epoch != self.timer_epoch {
                    return;
                }
                self.handle_deadline();
            }
        }
    }

    fn handle_deadline(&mut self) {
        match self.phase {
            RoomPhase::VsIntro => self.open_mode_select(),
            RoomPhase::ModeSelect => {
                // Host never picked (or selection is random): roll the bag.
                let mode = self.game.as_mut().and_then(|g| g.bag.draw_random());
                if let Some(mode) = mode {
                    self.start_round(mode);
                }
            }
            RoomPhase::Active => {
                let outcome = match self.game.as_mut().and_then(|g| g.round.as_mut()) {
                    Some(round) => round.data.on_deadline(&self.config.timers),
                    None => return,
                };
                match outcome {
                    DeadlineOutcome::Complete => self.resolve_round(ResolveTrigger::Timeout),
                    DeadlineOutcome::Extended { events, window } => {
                        for event in events {
                            self.broadcast(ServerMessage::Mode(event));
                        }
                        self.broadcast_snapshot();
                        self.arm_deadline(window);
                    }
                }
            }
            RoomPhase::Result => self.advance_after_result(),
            RoomPhase::Dispute => self.settle_dispute(),
            RoomPhase::Lobby | RoomPhase::Ended => {}
        }
    }

    // ----- broadcasting -----

    fn send_to(&self, player_id: Uuid, message: ServerMessage) {
        if let Some(player) = self.players.get(&player_id) {
            player.send(message);
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        for player in self.players.values() {
            player.send(message.clone());
        }
    }

    fn broadcast_snapshot(&self) {
        let snapshot = self.snapshot();
        self.broadcast(ServerMessage::Snapshot { snapshot });
    }

    /// Client-safe state of the whole room.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            phase: self.phase,
            host: self.host,
            players: self
                .players
                .values()
                .map(|p| p.summary(self.host))
                .collect(),
            config: self.game_config.clone(),
            board: self.game.as_ref().map(|g| g.board.clone()),
            round: self.game.as_ref().and_then(|g| {
                g.round.as_ref().map(|r| ActiveRound {
                    number: r.number,
                    view: r.data.public_view(),
                })
            }),
            deadline_ms: self.remaining_ms(),
        }
    }
}
