//! Game lifecycle: start, countdown, vote to end, bankruptcy check, leave,
//! reset and the final standings.

use serde::Serialize;

use super::ai::{BotParams, ThresholdBot};
use super::board::initial_squares;
use super::game::Game;
use super::state::GameState;
use super::types::*;
use crate::engine::models::*;

/// One row of the final standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    /// 1-based; rank 1 is the winner.
    pub rank: usize,
    pub player_id: PlayerId,
    pub name: String,
    pub money: Money,
    pub property_value: Money,
    pub total_wealth: Money,
    pub is_bankrupt: bool,
}

/// Players ordered by total wealth, richest first; equal wealth keeps seat
/// order. After a bankruptcy ending only solvent players are ranked.
pub fn rankings(state: &GameState) -> Vec<Standing> {
    let solvent_only = state.game_phase == GamePhase::GameOver
        && state.end_reason == Some(EndReason::Bankruptcy);
    let mut standings: Vec<Standing> = state
        .players
        .iter()
        .filter(|p| !solvent_only || p.is_active())
        .map(|p| {
            let property_value = state.property_value(p.id);
            Standing {
                rank: 0,
                player_id: p.id,
                name: p.name.clone(),
                money: p.money,
                property_value,
                total_wealth: p.money + property_value,
                is_bankrupt: p.is_bankrupt,
            }
        })
        .collect();
    standings.sort_by(|a, b| b.total_wealth.cmp(&a.total_wealth));
    for (i, s) in standings.iter_mut().enumerate() {
        s.rank = i + 1;
    }
    standings
}

impl Game {
    pub(crate) fn cmd_start_game(
        &mut self,
        players: &[PlayerSetup],
        start_money: Money,
        duration: GameDuration,
    ) -> Result<(), Rejection> {
        if self.state.game_phase != GamePhase::Setup {
            return Err(Rejection::NotInSetup);
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players.len()) {
            return Err(Rejection::InvalidSetup(format!(
                "{} players, expected {MIN_PLAYERS}-{MAX_PLAYERS}",
                players.len()
            )));
        }
        if start_money <= 0 {
            return Err(Rejection::InvalidSetup("start money must be positive".into()));
        }
        if duration == GameDuration::Minutes(0) {
            return Err(Rejection::InvalidSetup("duration must be positive".into()));
        }

        let seats: Vec<Player> = players
            .iter()
            .enumerate()
            .map(|(i, setup)| Player {
                id: i as PlayerId + 1,
                name: setup.name.clone(),
                color: setup.color.clone(),
                controller: if setup.is_ai {
                    Controller::Ai
                } else {
                    Controller::Human
                },
                money: start_money,
                position: 0,
                is_bankrupt: false,
                in_jail: false,
                jail_turns: 0,
            })
            .collect();

        self.bots.clear();
        for (setup, seat) in players.iter().zip(&seats) {
            if !setup.is_ai {
                continue;
            }
            let params = match &setup.profile {
                Some(name) => self.profiles.get(name).copied().unwrap_or_else(|| {
                    tracing::warn!(player = seat.id, profile = %name, "unknown bot profile, using defaults");
                    BotParams::default()
                }),
                None => BotParams::default(),
            };
            let label = setup.profile.clone().unwrap_or_else(|| "threshold".into());
            self.bots
                .insert(seat.id, Box::new(ThresholdBot::named(label, params)));
        }

        let first = seats[0].name.clone();
        self.state = GameState {
            players: seats,
            current_player_index: 0,
            squares: initial_squares(),
            dice_value: None,
            game_phase: GamePhase::Playing,
            logs: Vec::new(),
            pending_decision: None,
            game_duration: duration,
            time_left: duration.seconds(),
            votes_to_end: Vec::new(),
            activity: Activity::Idle,
            end_reason: None,
            turn: 0,
        };
        self.upgrade_tried = false;
        self.clock.clear();
        self.next_tick_at = self
            .state
            .time_left
            .map(|_| self.clock.now() + self.timing.tick_ms);

        self.log(
            format!("The game has started! {first} rolls first."),
            LogKind::Event,
        );
        let n = self.state.players.len();
        self.events.push(GameEvent::GameStarted { players: n });
        self.events.push(GameEvent::TurnStarted { player: 1 });
        tracing::info!(
            players = n,
            bots = self.bots.len(),
            start_money,
            duration = i64::from(duration),
            seed = self.seed(),
            "game started"
        );
        Ok(())
    }

    pub(crate) fn cmd_vote(&mut self, player_id: PlayerId) -> Result<(), Rejection> {
        self.require_playing()?;
        let player = self
            .state
            .player(player_id)
            .ok_or(Rejection::UnknownPlayer(player_id))?;
        if player.is_ai() {
            return Err(Rejection::NotHuman(player_id));
        }
        let name = player.name.clone();

        let withdrawn = match self.state.votes_to_end.iter().position(|v| *v == player_id) {
            Some(i) => {
                self.state.votes_to_end.remove(i);
                true
            }
            None => {
                self.state.votes_to_end.push(player_id);
                false
            }
        };
        let votes = self.state.votes_to_end.len();
        let humans = self.state.human_count();
        let text = if withdrawn {
            format!("{name} withdrew the vote to end the game ({votes}/{humans}).")
        } else {
            format!("{name} voted to end the game ({votes}/{humans}).")
        };
        self.log(text, LogKind::Event);
        self.events.push(GameEvent::VoteChanged {
            player: player_id,
            votes,
            humans,
        });

        if votes * 2 > humans {
            self.finish(EndReason::VoteToEnd);
        }
        Ok(())
    }

    pub(crate) fn cmd_leave(&mut self) -> Result<(), Rejection> {
        self.require_playing()?;
        self.finish(EndReason::Abandoned);
        Ok(())
    }

    pub(crate) fn cmd_reset(&mut self) -> Result<(), Rejection> {
        if self.state.game_phase != GamePhase::GameOver {
            return Err(Rejection::NotFinished);
        }
        self.state.game_phase = GamePhase::Setup;
        self.state.logs.clear();
        self.state.pending_decision = None;
        self.state.votes_to_end.clear();
        self.state.dice_value = None;
        self.state.end_reason = None;
        self.state.activity = Activity::Idle;
        self.bots.clear();
        Ok(())
    }

    /// One second of countdown.
    pub(crate) fn fire_tick(&mut self, at: u64) {
        self.clock.set_now(at);
        self.next_tick_at = None;
        if self.state.game_phase != GamePhase::Playing {
            return;
        }
        let Some(left) = self.state.time_left else {
            return;
        };
        let left = left.saturating_sub(1);
        self.state.time_left = Some(left);
        self.events.push(GameEvent::TimerTick { time_left: left });
        if left == 0 {
            self.finish(EndReason::TimeUp);
        } else {
            self.next_tick_at = Some(at + self.timing.tick_ms);
        }
    }

    /// Runs when a BANKRUPT decision is dismissed or its display delay ends.
    pub(crate) fn bankruptcy_check(&mut self, player: PlayerId) {
        if self.state.game_phase != GamePhase::Playing {
            return;
        }
        if self.state.active_count() <= 1 {
            self.finish(EndReason::Bankruptcy);
            return;
        }
        if matches!(
            self.state.pending_decision,
            Some(Decision::Bankrupt { player_id, .. }) if player_id == player
        ) {
            self.state.pending_decision = None;
            let name = self.player_name(player);
            self.log(
                format!("{name} is out. The game continues."),
                LogKind::Info,
            );
        }
    }

    /// Move to GAME_OVER and drop every pending scheduled entry.
    pub(crate) fn finish(&mut self, reason: EndReason) {
        if self.state.game_phase == GamePhase::GameOver {
            return;
        }
        self.state.game_phase = GamePhase::GameOver;
        self.state.end_reason = Some(reason);
        self.state.pending_decision = None;
        self.state.activity = Activity::Idle;
        self.clock.clear();
        self.next_tick_at = None;

        let text = match reason {
            EndReason::Bankruptcy => "Only one player is left standing. Game over!",
            EndReason::TimeUp => "Time is up! Game over.",
            EndReason::VoteToEnd => "The majority voted to end the game.",
            EndReason::Abandoned => "The game was abandoned. See the results.",
        };
        self.log(text, LogKind::Event);
        let winner = rankings(&self.state).into_iter().next();
        if let Some(w) = &winner {
            self.log(
                format!("{} wins with a total wealth of {}!", w.name, w.total_wealth),
                LogKind::Success,
            );
        }
        self.events.push(GameEvent::GameOver { reason });
        tracing::info!(
            ?reason,
            winner = winner.as_ref().map(|w| w.player_id),
            turns = self.state.turn,
            now_ms = self.clock.now(),
            "game over"
        );
    }
}
