//! Real-time session: one game driven on its own tokio task.
//!
//! Every input goes through a single mpsc queue, so state transitions are
//! serialized no matter how many producers hold a handle. A periodic
//! interval advances the virtual clock by the wall time elapsed since the
//! session started. Readers get snapshots through a watch channel and cue
//! events through a broadcast channel.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::engine::models::{Command, GameEvent, Outcome};
use crate::games::monopoly::{Game, GameState};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is closed")]
    Closed,
    #[error("session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

enum Request {
    Command {
        command: Command,
        reply: oneshot::Sender<Outcome>,
    },
    Shutdown,
}

pub struct Session {
    requests: mpsc::Sender<Request>,
    snapshots: watch::Receiver<GameState>,
    events: broadcast::Sender<GameEvent>,
    task: JoinHandle<Game>,
}

impl Session {
    /// Spawn the session task. `period` is how often the clock advances.
    pub fn spawn(game: Game, period: Duration) -> Self {
        let (requests, rx) = mpsc::channel(64);
        let (snap_tx, snapshots) = watch::channel(game.state().clone());
        let (events, _) = broadcast::channel(256);
        let task = tokio::spawn(run(game, rx, snap_tx, events.clone(), period));
        Self {
            requests,
            snapshots,
            events,
            task,
        }
    }

    /// Queue a command and wait for its outcome.
    pub async fn send(&self, command: Command) -> Result<Outcome, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Request::Command { command, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub fn snapshot(&self) -> GameState {
        self.snapshots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<GameState> {
        self.snapshots.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Stop the task and hand back the game. Pending scheduled entries stay
    /// inside the returned game and never fire on their own.
    pub async fn shutdown(self) -> Result<Game, SessionError> {
        // The task also stops when every sender is gone.
        let _ = self.requests.send(Request::Shutdown).await;
        drop(self.requests);
        Ok(self.task.await?)
    }
}

async fn run(
    mut game: Game,
    mut rx: mpsc::Receiver<Request>,
    snapshots: watch::Sender<GameState>,
    events: broadcast::Sender<GameEvent>,
    period: Duration,
) -> Game {
    let started = Instant::now();
    let base_ms = game.now_ms();
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::debug!(period_ms = period.as_millis() as u64, "session started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let target = base_ms + started.elapsed().as_millis() as u64;
                let produced = game.advance_to(target);
                publish(&game, produced, &snapshots, &events);
            }
            request = rx.recv() => match request {
                Some(Request::Command { command, reply }) => {
                    let outcome = game.apply(command);
                    publish(&game, outcome.events().to_vec(), &snapshots, &events);
                    let _ = reply.send(outcome);
                }
                Some(Request::Shutdown) | None => break,
            },
        }
    }
    tracing::debug!(now_ms = game.now_ms(), "session stopped");
    game
}

fn publish(
    game: &Game,
    produced: Vec<GameEvent>,
    snapshots: &watch::Sender<GameState>,
    events: &broadcast::Sender<GameEvent>,
) {
    if produced.is_empty() {
        return;
    }
    for event in produced {
        // No subscribers is fine.
        let _ = events.send(event);
    }
    snapshots.send_replace(game.state().clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::Timing;
    use crate::engine::models::{GameDuration, PlayerSetup};
    use crate::games::monopoly::types::GamePhase;

    fn start_command(ai: bool) -> Command {
        Command::StartGame {
            players: vec![
                PlayerSetup {
                    is_ai: ai,
                    ..PlayerSetup::human("A", "#f00")
                },
                PlayerSetup::ai("B", "#0f0"),
            ],
            start_money: 1500,
            duration: GameDuration::Minutes(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn commands_are_applied_in_order() {
        let session = Session::spawn(Game::new(5), Duration::from_millis(50));
        let out = session.send(start_command(false)).await.unwrap();
        assert!(out.is_applied());
        assert!(session.send(Command::RollDice).await.unwrap().is_applied());
        let second = session.send(Command::RollDice).await.unwrap();
        assert!(!second.is_applied());
        assert_eq!(session.snapshot().game_phase, GamePhase::Playing);
        let game = session.shutdown().await.unwrap();
        assert_eq!(game.journal().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clock_follows_wall_time() {
        let session = Session::spawn(Game::with_timing(5, Timing::default()), Duration::from_millis(100));
        let mut events = session.subscribe();
        session.send(start_command(true)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(session.snapshot().game_phase, GamePhase::GameOver);
        let mut ticks = 0;
        loop {
            match events.try_recv() {
                Ok(GameEvent::TimerTick { .. }) => ticks += 1,
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => break,
            }
        }
        assert!(ticks > 0);
        let game = session.shutdown().await.unwrap();
        assert!(game.now_ms() >= 60_000);
    }

    #[tokio::test]
    async fn dropping_handle_stops_task() {
        let session = Session::spawn(Game::new(5), Duration::from_millis(10));
        let Session { requests, task, .. } = session;
        drop(requests);
        let game = task.await.unwrap();
        assert_eq!(game.state().game_phase, GamePhase::Setup);
    }
}
