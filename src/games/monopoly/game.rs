//! The game engine: owns the state, its virtual clock, the dice/card RNG and
//! the bots bound to AI seats.
//!
//! Every mutation runs through [`Game::apply`] (external commands) or through
//! an entry popped off the scheduler (animation steps, display delays, bot
//! moves). Nothing else writes to the state, so a game is fully determined by
//! its seed, timing and the timestamped command sequence.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::ai::BotParams;
use super::landing::{ChargeReason, Effect, Resolution};
use super::lifecycle::{rankings, Standing};
use super::state::{GameState, Payment};
use super::types::*;
use crate::engine::bot_strategy::{BotMove, BotStrategy};
use crate::engine::config::Timing;
use crate::engine::models::*;
use crate::engine::replay::{ReplayEntry, ReplayLog};
use crate::engine::scheduler::Scheduler;

/// Delayed work of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scheduled {
    /// End of the roll animation; faces are drawn now unless loaded.
    RollSettled { loaded: Option<[u8; 2]> },
    /// Move `player` one square; `remaining` counts this step.
    Step {
        player: PlayerId,
        remaining: u32,
        dice_sum: u32,
    },
    Land { player: PlayerId, dice_sum: u32 },
    /// End of the bankruptcy display for `player`.
    BankruptcyCheck { player: PlayerId },
    BotStep,
}

pub struct Game {
    pub(crate) state: GameState,
    pub(crate) rng: StdRng,
    pub(crate) clock: Scheduler<Scheduled>,
    pub(crate) timing: Timing,
    pub(crate) profiles: BTreeMap<String, BotParams>,
    pub(crate) bots: HashMap<PlayerId, Box<dyn BotStrategy>>,
    /// Fire time of the next countdown tick while a timed game runs.
    pub(crate) next_tick_at: Option<u64>,
    /// Set once the current player's end-of-turn bot upgrade happened.
    pub(crate) upgrade_tried: bool,
    pub(crate) events: Vec<GameEvent>,
    /// Countdown ticks plus scheduled entries fired so far.
    fired: u64,
    journal: Vec<ReplayEntry>,
    seed: u64,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("seed", &self.seed)
            .field("now_ms", &self.clock.now())
            .field("phase", &self.state.game_phase)
            .field("turn", &self.state.turn)
            .field("bots", &self.bots.len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl Game {
    pub fn new(seed: u64) -> Self {
        Self::with_timing(seed, Timing::default())
    }

    pub fn with_timing(seed: u64, mut timing: Timing) -> Self {
        timing.tick_ms = timing.tick_ms.max(1);
        Self {
            state: GameState::new(),
            rng: StdRng::seed_from_u64(seed),
            clock: Scheduler::new(),
            timing,
            profiles: BTreeMap::new(),
            bots: HashMap::new(),
            next_tick_at: None,
            upgrade_tried: false,
            events: Vec::new(),
            fired: 0,
            journal: Vec::new(),
            seed,
        }
    }

    /// A game seeded from OS entropy.
    pub fn from_entropy(timing: Timing) -> Self {
        Self::with_timing(rand::random(), timing)
    }

    /// Named bot thresholds, looked up by `PlayerSetup::profile` when a game
    /// starts.
    pub fn with_profiles(mut self, profiles: BTreeMap<String, BotParams>) -> Self {
        self.profiles = profiles;
        self
    }

    // ------------------------------------------------------------------ //
    //  Read side
    // ------------------------------------------------------------------ //

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn journal(&self) -> &[ReplayEntry] {
        &self.journal
    }

    pub fn rankings(&self) -> Vec<Standing> {
        rankings(&self.state)
    }

    pub fn is_over(&self) -> bool {
        self.state.game_phase == GamePhase::GameOver
    }

    /// True when the game is running and nothing will happen until some
    /// external command arrives.
    pub fn is_waiting_on_human(&self) -> bool {
        self.state.game_phase == GamePhase::Playing && self.clock.is_empty()
    }

    /// Everything needed to reproduce this game from scratch.
    pub fn replay_log(&self) -> ReplayLog {
        ReplayLog {
            seed: self.seed,
            timing: self.timing,
            profiles: self.profiles.clone(),
            entries: self.journal.clone(),
            end_ms: self.clock.now(),
            end_fired: self.fired,
        }
    }

    // ------------------------------------------------------------------ //
    //  Commands
    // ------------------------------------------------------------------ //

    /// Apply one command. Accepted commands are journaled for replay.
    pub fn apply(&mut self, command: Command) -> Outcome {
        let (at_ms, fired) = (self.clock.now(), self.fired);
        let result = match &command {
            Command::StartGame {
                players,
                start_money,
                duration,
            } => self.cmd_start_game(players, *start_money, *duration),
            Command::RollDice => self.cmd_roll(None),
            Command::RollLoaded { dice } => self.cmd_roll(Some(*dice)),
            Command::EndTurn => self.cmd_end_turn(),
            Command::ConfirmBuy => self.cmd_confirm_buy(),
            Command::UpgradeProperty => self.cmd_upgrade_property(),
            Command::DismissDecision => self.cmd_dismiss(),
            Command::VoteToEnd { player_id } => self.cmd_vote(*player_id),
            Command::LeaveGame => self.cmd_leave(),
            Command::ResetToSetup => self.cmd_reset(),
        };
        match result {
            Ok(()) => {
                self.journal.push(ReplayEntry { at_ms, fired, command });
                self.schedule_bot();
                Outcome::Applied(self.take_events())
            }
            Err(rejection) => {
                tracing::debug!(?command, %rejection, "command ignored");
                Outcome::Ignored(rejection)
            }
        }
    }

    pub fn start_game(
        &mut self,
        players: Vec<PlayerSetup>,
        start_money: Money,
        duration: GameDuration,
    ) -> Outcome {
        self.apply(Command::StartGame {
            players,
            start_money,
            duration,
        })
    }

    pub fn roll_dice(&mut self) -> Outcome {
        self.apply(Command::RollDice)
    }

    /// Roll with predetermined faces. Same gating as [`Game::roll_dice`].
    pub fn roll_dice_with(&mut self, d1: u8, d2: u8) -> Outcome {
        self.apply(Command::RollLoaded { dice: [d1, d2] })
    }

    pub fn end_turn(&mut self) -> Outcome {
        self.apply(Command::EndTurn)
    }

    pub fn confirm_buy(&mut self) -> Outcome {
        self.apply(Command::ConfirmBuy)
    }

    pub fn upgrade_property(&mut self) -> Outcome {
        self.apply(Command::UpgradeProperty)
    }

    pub fn dismiss_decision(&mut self) -> Outcome {
        self.apply(Command::DismissDecision)
    }

    pub fn vote_to_end(&mut self, player_id: PlayerId) -> Outcome {
        self.apply(Command::VoteToEnd { player_id })
    }

    pub fn leave_game(&mut self) -> Outcome {
        self.apply(Command::LeaveGame)
    }

    pub fn reset_to_setup(&mut self) -> Outcome {
        self.apply(Command::ResetToSetup)
    }

    /// Drive `player` with a custom strategy instead of the default bot.
    /// Takes effect at the next bot step; not captured by replay logs.
    pub fn bind_bot(&mut self, player: PlayerId, bot: Box<dyn BotStrategy>) {
        self.bots.insert(player, bot);
        self.schedule_bot();
    }

    pub fn unbind_bot(&mut self, player: PlayerId) -> Option<Box<dyn BotStrategy>> {
        self.bots.remove(&player)
    }

    // ------------------------------------------------------------------ //
    //  Clock
    // ------------------------------------------------------------------ //

    /// Run everything due within the next `ms` milliseconds and return the
    /// events produced since the last call.
    pub fn advance(&mut self, ms: u64) -> Vec<GameEvent> {
        let until = self.clock.now().saturating_add(ms);
        self.run_until(until);
        self.clock.set_now(until);
        self.take_events()
    }

    pub fn advance_to(&mut self, at_ms: u64) -> Vec<GameEvent> {
        let ms = at_ms.saturating_sub(self.clock.now());
        self.advance(ms)
    }

    /// Jump from one scheduled entry to the next until nothing is pending:
    /// the game is over or waits on a human. An all-AI game without a time
    /// limit may never settle; bound it with [`Game::settle_while`].
    pub fn settle(&mut self) -> Vec<GameEvent> {
        self.settle_while(|_| true)
    }

    /// Like [`Game::settle`], checking `keep_going` before every fired item.
    /// With zero delays a whole game happens at one instant, so this is the
    /// way to bound games run with [`Timing::instant`].
    pub fn settle_while(&mut self, mut keep_going: impl FnMut(&GameState) -> bool) -> Vec<GameEvent> {
        while keep_going(&self.state) {
            let Some(next) = self.clock.next_due() else {
                break;
            };
            self.fire_next(next);
        }
        self.take_events()
    }

    /// Fire whatever is up to `fired` items in, then move the clock to
    /// `at_ms`. Replays use this to land on the exact point a command was
    /// applied at, even when several items share one instant.
    pub(crate) fn catch_up(&mut self, fired: u64, at_ms: u64) {
        while self.fired < fired && self.fire_next(u64::MAX) {}
        self.clock.set_now(at_ms);
    }

    fn run_until(&mut self, until: u64) {
        while self.fire_next(until) {}
    }

    /// Fire the earliest tick or entry due at or before `until`.
    fn fire_next(&mut self, until: u64) -> bool {
        let entry_at = self.clock.next_due().filter(|&t| t <= until);
        let tick_at = self.next_tick_at.filter(|&t| t <= until);
        match (tick_at, entry_at) {
            // The countdown wins ties.
            (Some(tick), Some(entry)) if tick <= entry => self.fire_tick(tick),
            (Some(tick), None) => self.fire_tick(tick),
            (_, Some(_)) => match self.clock.pop_due(until) {
                Some(item) => self.fire(item),
                None => return false,
            },
            (None, None) => return false,
        }
        self.fired += 1;
        true
    }

    fn fire(&mut self, item: Scheduled) {
        match item {
            Scheduled::RollSettled { loaded } => self.settle_roll(loaded),
            Scheduled::Step {
                player,
                remaining,
                dice_sum,
            } => self.step(player, remaining, dice_sum),
            Scheduled::Land { player, dice_sum } => self.land(player, dice_sum),
            Scheduled::BankruptcyCheck { player } => self.bankruptcy_check(player),
            Scheduled::BotStep => self.bot_step(),
        }
        self.schedule_bot();
    }

    pub(crate) fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------ //
    //  Bots
    // ------------------------------------------------------------------ //

    fn next_bot_move(&self) -> Option<BotMove> {
        let player = self.state.current_player()?.id;
        self.bots
            .get(&player)?
            .choose_move(&self.state, player, self.upgrade_tried)
    }

    /// Queue a bot step if the current seat is automated and has something
    /// to do. The move itself is chosen again when the step fires.
    pub(crate) fn schedule_bot(&mut self) {
        if self.state.game_phase != GamePhase::Playing
            || self.clock.any(|e| *e == Scheduled::BotStep)
        {
            return;
        }
        let Some(mv) = self.next_bot_move() else {
            return;
        };
        let delay = match mv {
            BotMove::Roll => self.timing.bot_roll_ms,
            m if m.is_decision() => self.timing.bot_decision_ms,
            _ => self.timing.bot_end_turn_ms,
        };
        self.clock.schedule(delay, Scheduled::BotStep);
    }

    fn bot_step(&mut self) {
        let Some(mv) = self.next_bot_move() else {
            return;
        };
        let player = self.state.current_player().map(|p| p.id).unwrap_or_default();
        tracing::debug!(player, ?mv, "bot move");
        let result = match mv {
            BotMove::Roll => self.cmd_roll(None),
            BotMove::Buy => self.cmd_confirm_buy(),
            BotMove::Decline | BotMove::Acknowledge | BotMove::ContinueAfterBankruptcy => {
                self.cmd_dismiss()
            }
            BotMove::Upgrade(square) => {
                self.upgrade_tried = true;
                self.upgrade_square(square)
            }
            BotMove::EndTurn => self.cmd_end_turn(),
        };
        if let Err(rejection) = result {
            tracing::warn!(player, ?mv, %rejection, "bot move rejected");
            if mv == BotMove::Buy {
                // Leave no decision open behind a failed purchase.
                if let Err(rejection) = self.cmd_dismiss() {
                    tracing::warn!(player, %rejection, "bot dismiss rejected");
                }
            }
        }
    }

    // ------------------------------------------------------------------ //
    //  Shared mutation helpers
    // ------------------------------------------------------------------ //

    pub(crate) fn log(&mut self, text: impl Into<String>, kind: LogKind) {
        let now = self.clock.now();
        self.state.push_log(text, kind, now);
    }

    pub(crate) fn require_playing(&self) -> Result<(), Rejection> {
        if self.state.game_phase == GamePhase::Playing {
            Ok(())
        } else {
            Err(Rejection::NotPlaying)
        }
    }

    pub(crate) fn player_name(&self, id: PlayerId) -> String {
        self.state
            .player(id)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    pub(crate) fn apply_resolution(&mut self, res: Resolution) {
        for effect in res.effects {
            self.apply_effect(effect);
        }
        if let Some((text, kind)) = res.log {
            self.log(text, kind);
        }
        if let Some(decision) = res.decision {
            self.state.pending_decision = Some(decision);
        }
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Charge {
                payer,
                amount,
                beneficiary,
                reason,
            } => {
                let Some(idx) = self.state.player_index(payer) else {
                    return;
                };
                match self.state.charge(idx, amount, beneficiary) {
                    Payment::Paid => match (reason, beneficiary) {
                        (ChargeReason::Rent { square }, Some(owner)) => {
                            tracing::debug!(player = payer, owner, square, amount, "rent paid");
                            self.events.push(GameEvent::RentPaid {
                                payer,
                                owner,
                                square,
                                amount,
                            });
                        }
                        (ChargeReason::Tax, _) => {
                            self.events.push(GameEvent::TaxPaid {
                                player: payer,
                                amount,
                            });
                        }
                        _ => {}
                    },
                    Payment::Bankrupt { forfeited } => {
                        self.on_bankrupt(payer, beneficiary, forfeited);
                    }
                }
            }
            Effect::Credit { player, amount } => {
                if let Some(idx) = self.state.player_index(player) {
                    self.state.credit(idx, amount);
                }
            }
            Effect::Transfer { from, to, amount } => {
                if let (Some(f), Some(t)) = (self.state.player_index(from), self.state.player_index(to)) {
                    self.state.transfer(f, t, amount);
                }
            }
            Effect::MoveTo {
                player,
                position,
                salary,
            } => {
                let Some(idx) = self.state.player_index(player) else {
                    return;
                };
                self.state.players[idx].position = position;
                self.events.push(GameEvent::Stepped { player, position });
                if salary > 0 {
                    self.pay_salary(idx, salary);
                }
            }
            Effect::SendToJail { player } => {
                if let Some(idx) = self.state.player_index(player) {
                    self.state.send_to_jail(idx);
                    tracing::debug!(player, "sent to jail");
                    self.events.push(GameEvent::SentToJail { player });
                }
            }
        }
    }

    pub(crate) fn pay_salary(&mut self, idx: usize, salary: Money) {
        self.state.credit(idx, salary);
        let (player, name) = {
            let p = &self.state.players[idx];
            (p.id, p.name.clone())
        };
        self.events.push(GameEvent::PassedStart { player, salary });
        self.log(
            format!("{name} passed Start and collected {salary}."),
            LogKind::Success,
        );
    }

    /// Bookkeeping after a strict payment bankrupted `player`. The caller has
    /// already raised the BANKRUPT decision.
    pub(crate) fn on_bankrupt(
        &mut self,
        player: PlayerId,
        beneficiary: Option<PlayerId>,
        forfeited: Money,
    ) {
        tracing::info!(player, ?beneficiary, forfeited, "player bankrupt");
        self.events.push(GameEvent::Bankrupted {
            player,
            beneficiary,
        });
        self.clock.schedule(
            self.timing.bankruptcy_display_ms,
            Scheduled::BankruptcyCheck { player },
        );
    }
}
