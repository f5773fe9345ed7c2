/// GameSession: the play-session state machine.
///
/// ## States
///
/// ```text
///   Idle ──start()──▶ Playing ──ReachedGoal──▶ Won  ─┐
///                        ▲    ──Collided────▶ Lost ─┤
///                        └──── timer or reset() ◀───┘
/// ```
///
/// Every other (state, trigger) pair is a no-op. `stop()` is the teardown
/// path back to Idle from anywhere.
///
/// ## Frame order (`tick`)
///   1. Advance the simulated clock
///   2. Fire due deferred resets (stale rounds are dropped)
///   3. Playing only: snapshot input, step the player, apply the outcome
///   4. Step the particle burst, if any
///   5. Camera follows the player (always)
///
/// ## Deferred resets
///
/// Winning or losing schedules a one-shot `{ round, due }` entry. The round
/// counter goes up on every reset and on `stop()`, so an entry scheduled by
/// an earlier round finds a different round when it fires and is ignored.
/// Entries are never removed early.
///
/// ## Input
///
/// The tracker only exists between `start()` and `stop()` (or drop). Key
/// events that arrive without one are dropped. In Won/Lost the tracker keeps
/// its flags but nobody reads them.

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{GameConfig, MovementConfig, ParticleConfig};
use crate::domain::entity::{InputState, Player};
use crate::domain::math::Vec3;

use super::camera::{CameraPose, CameraRig};
use super::event::{GameEvent, ResetReason};
use super::input::{InputTracker, KeyBindings};
use super::level::MazeLayout;
use super::particles::ParticleBurst;
use super::player::{self, Outcome};
use super::view::{FrameView, SceneLayout};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    Idle,
    Playing,
    Won,
    Lost,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoundResult {
    Won,
    Lost,
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundResult::Won => f.write_str("Won"),
            RoundResult::Lost => f.write_str("Lost"),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "Idle",
            SessionState::Playing => "Playing",
            SessionState::Won => "Won",
            SessionState::Lost => "Lost",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug)]
struct DeferredReset {
    round: u64,
    due: f64,
}

pub struct GameSession {
    // ── Layout (immutable) ──
    layout: MazeLayout,

    // ── Tuning ──
    movement: MovementConfig,
    particle_cfg: ParticleConfig,
    reset_delay: f64,
    bindings: KeyBindings,

    // ── Round state ──
    state: SessionState,
    result: Option<RoundResult>,
    round: u64,
    player: Player,
    burst: Option<ParticleBurst>,

    // ── Per-frame collaborators ──
    camera: CameraRig,
    input: Option<InputTracker>,

    // ── Timing ──
    clock: f64,
    pending: Vec<DeferredReset>,

    rng: StdRng,
    outbox: Vec<GameEvent>,
}

// ── Construction ──

impl GameSession {
    pub fn new(layout: MazeLayout, config: &GameConfig) -> Self {
        let rng = match config.particles.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let start = layout.start;
        let bindings = KeyBindings::from_config(&config.keys);
        if bindings.is_empty() {
            log::warn!("no movement keys bound; the player cannot move");
        } else {
            log::debug!("{} movement keys bound", bindings.len());
        }
        GameSession {
            movement: config.movement.clone(),
            particle_cfg: config.particles.clone(),
            reset_delay: f64::from(config.session.reset_delay_secs),
            bindings,
            state: SessionState::Idle,
            result: None,
            round: 0,
            player: Player::new(start),
            burst: None,
            camera: CameraRig::new(&config.camera, start),
            input: None,
            clock: 0.0,
            pending: Vec::new(),
            rng,
            outbox: Vec::new(),
            layout,
        }
    }
}

// ── Commands ──

impl GameSession {
    /// Idle → Playing. Attaches the input tracker. No-op elsewhere.
    pub fn start(&mut self) -> bool {
        if self.state != SessionState::Idle {
            log::trace!("start ignored in {}", self.state);
            return false;
        }
        self.input = Some(InputTracker::new(self.bindings.clone()));
        self.state = SessionState::Playing;
        log::debug!("round {}: Idle -> Playing", self.round);
        self.outbox.push(GameEvent::Started);
        true
    }

    /// Won/Lost → Playing right away. No-op elsewhere.
    pub fn reset(&mut self) -> bool {
        if !self.round_over() {
            log::trace!("reset ignored in {}", self.state);
            return false;
        }
        self.begin_next_round(ResetReason::Command);
        true
    }

    /// Tear down from any state back to Idle and release the input tracker.
    /// Returns false if there was nothing to tear down.
    pub fn stop(&mut self) -> bool {
        if self.state == SessionState::Idle && self.input.is_none() {
            return false;
        }
        let from = self.state;
        self.input = None;
        self.round += 1;
        self.state = SessionState::Idle;
        self.result = None;
        self.burst = None;
        self.player.respawn(self.layout.start);
        log::info!("session stopped from {from}, input released");
        self.outbox.push(GameEvent::Stopped);
        true
    }

    pub fn key_down(&mut self, key: &str) {
        match self.input.as_mut() {
            Some(t) => {
                t.key_down(key);
            }
            None => log::trace!("key {key:?} down with no input attached"),
        }
    }

    pub fn key_up(&mut self, key: &str) {
        match self.input.as_mut() {
            Some(t) => {
                t.key_up(key);
            }
            None => log::trace!("key {key:?} up with no input attached"),
        }
    }
}

// ── Frame step ──

impl GameSession {
    /// Advance one display frame of `dt` seconds. Returns the events raised
    /// since the previous call, commands included.
    pub fn tick(&mut self, dt: f32) -> Vec<GameEvent> {
        self.clock += f64::from(dt.max(0.0));
        self.fire_due_resets();

        if self.state == SessionState::Playing {
            self.step_player();
        }

        if let Some(burst) = self.burst.as_mut() {
            burst.step();
        }

        self.camera.follow(self.player.position());

        std::mem::take(&mut self.outbox)
    }

    fn step_player(&mut self) {
        let input = self.input_snapshot();
        let outcome = player::step(
            &mut self.player,
            input,
            &self.layout.walls,
            &self.layout.goal,
            &self.movement,
        );
        match outcome {
            Outcome::None => {}
            Outcome::ReachedGoal => {
                let at = self.layout.goal.position;
                self.finish_round(RoundResult::Won, at);
                self.outbox.push(GameEvent::GoalReached { at });
            }
            Outcome::Collided => {
                let at = self.player.position();
                self.finish_round(RoundResult::Lost, at);
                self.outbox.push(GameEvent::Collided { at });
            }
        }
    }

    fn finish_round(&mut self, result: RoundResult, burst_at: Vec3) {
        self.state = match result {
            RoundResult::Won => SessionState::Won,
            RoundResult::Lost => SessionState::Lost,
        };
        self.result = Some(result);
        // Directions held at the end of a round don't carry into the next.
        if let Some(t) = self.input.as_mut() {
            t.release_all();
        }
        self.burst = Some(ParticleBurst::spawn(burst_at, &self.particle_cfg, &mut self.rng));
        let due = self.clock + self.reset_delay;
        self.pending.push(DeferredReset { round: self.round, due });
        log::debug!("round {}: Playing -> {}, auto-reset at t={:.2}", self.round, self.state, due);
    }

    fn fire_due_resets(&mut self) {
        let now = self.clock;
        let (due, waiting): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|d| d.due <= now);
        self.pending = waiting;

        for entry in due {
            if entry.round == self.round && self.round_over() {
                self.begin_next_round(ResetReason::Timer);
            } else {
                log::info!("stale auto-reset from round {} ignored (now round {})", entry.round, self.round);
                self.outbox.push(GameEvent::StaleResetIgnored { scheduled_for: entry.round });
            }
        }
    }

    fn begin_next_round(&mut self, reason: ResetReason) {
        let from = self.state;
        self.round += 1;
        self.player.respawn(self.layout.start);
        self.burst = None;
        self.result = None;
        self.state = SessionState::Playing;
        log::debug!("round {}: {from} -> Playing ({reason:?})", self.round);
        self.outbox.push(GameEvent::RoundReset { round: self.round, reason });
    }

    fn round_over(&self) -> bool {
        matches!(self.state, SessionState::Won | SessionState::Lost)
    }
}

// ── Queries ──

impl GameSession {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn result(&self) -> Option<RoundResult> {
        self.result
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> CameraPose {
        self.camera.pose()
    }

    pub fn burst(&self) -> Option<&ParticleBurst> {
        self.burst.as_ref()
    }

    pub fn input_attached(&self) -> bool {
        self.input.is_some()
    }

    /// Current intent, or all-released when no tracker is attached.
    pub fn input_snapshot(&self) -> InputState {
        self.input.as_ref().map(InputTracker::snapshot).unwrap_or_default()
    }

    pub fn maze_name(&self) -> &str {
        &self.layout.name
    }

    pub fn layout(&self) -> SceneLayout<'_> {
        SceneLayout {
            walls: &self.layout.walls,
            goal: self.layout.goal,
            start: self.layout.start,
            player_extent: self.movement.player_extent,
        }
    }

    pub fn frame(&self) -> FrameView<'_> {
        FrameView {
            player: self.player.position(),
            camera: self.camera.pose(),
            particles: self.burst.as_ref().map(ParticleBurst::points).unwrap_or(&[]),
            state: self.state,
            result: self.result,
            round: self.round,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Goal, Wall};
    use crate::domain::math::vec3;
    use crate::sim::level;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn config() -> GameConfig {
        let mut c = GameConfig::default();
        c.particles.seed = Some(7);
        c
    }

    /// Open floor with one wall 2 units right of the start and the goal
    /// 2 units left of it.
    fn arena() -> MazeLayout {
        MazeLayout {
            name: "arena".into(),
            walls: vec![Wall::new(vec3(2.0, 0.0, 0.0), vec3(1.0, 1.0, 4.0))],
            goal: Goal::new(vec3(-2.0, 0.5, 0.0), 1.0),
            start: vec3(0.0, 0.5, 0.0),
        }
    }

    fn session() -> GameSession {
        GameSession::new(arena(), &config())
    }

    fn run(s: &mut GameSession, frames: usize) -> Vec<GameEvent> {
        (0..frames).flat_map(|_| s.tick(DT)).collect()
    }

    fn lose(s: &mut GameSession) {
        s.key_down("ArrowRight");
        for _ in 0..60 {
            s.tick(DT);
            if s.state() == SessionState::Lost {
                break;
            }
        }
        s.key_up("ArrowRight");
        assert_eq!(s.state(), SessionState::Lost);
    }

    fn win(s: &mut GameSession) {
        s.key_down("ArrowLeft");
        for _ in 0..60 {
            s.tick(DT);
            if s.state() == SessionState::Won {
                break;
            }
        }
        s.key_up("ArrowLeft");
        assert_eq!(s.state(), SessionState::Won);
    }

    #[test]
    fn new_session_is_idle_and_detached() {
        let s = session();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(!s.input_attached());
        assert!(s.result().is_none());
        assert_eq!(s.player().position(), vec3(0.0, 0.5, 0.0));
    }

    #[test]
    fn tick_while_idle_does_not_move_player() {
        let mut s = session();
        s.key_down("ArrowRight"); // dropped: no tracker yet
        let events = run(&mut s, 30);
        assert!(events.is_empty());
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.player().position(), vec3(0.0, 0.5, 0.0));
    }

    #[test]
    fn start_attaches_input_and_plays() {
        let mut s = session();
        assert!(s.start());
        assert!(s.input_attached());
        assert_eq!(s.state(), SessionState::Playing);
        assert_eq!(s.tick(DT), vec![GameEvent::Started]);

        s.key_down("d");
        s.tick(DT);
        assert_relative_eq!(s.player().position().x, 0.15);
    }

    #[test]
    fn collision_loses_and_schedules_reset() {
        let mut s = session();
        s.start();
        lose(&mut s);
        assert_eq!(s.result(), Some(RoundResult::Lost));
        assert_eq!(s.frame().banner().as_deref(), Some("Lost"));

        // Burst sits where the player stopped, not where it would have gone.
        let burst = s.burst().expect("burst spawned");
        assert_eq!(burst.origin(), s.player().position());
        assert!(s.player().position().x + 0.5 < 1.5);
    }

    #[test]
    fn goal_wins_with_burst_at_goal() {
        let mut s = session();
        s.start();
        win(&mut s);
        assert_eq!(s.result(), Some(RoundResult::Won));
        assert_eq!(s.burst().map(ParticleBurst::origin), Some(vec3(-2.0, 0.5, 0.0)));
        assert_eq!(s.frame().particles.len(), 100);
    }

    #[test]
    fn input_is_ignored_after_round_ends() {
        let mut s = session();
        s.start();
        lose(&mut s);
        let at = s.player().position();
        s.key_down("ArrowLeft");
        run(&mut s, 10);
        assert_eq!(s.player().position(), at);
    }

    #[test]
    fn keys_held_through_round_end_are_released() {
        let mut s = session();
        s.start();
        s.key_down("ArrowRight");
        for _ in 0..60 {
            s.tick(DT);
            if s.state() == SessionState::Lost {
                break;
            }
        }
        assert_eq!(s.state(), SessionState::Lost);
        assert!(!s.input_snapshot().any());

        // No key_up was sent, yet the next round starts still.
        assert!(s.reset());
        run(&mut s, 5);
        assert_eq!(s.player().position(), vec3(0.0, 0.5, 0.0));
    }

    #[test]
    fn auto_reset_after_delay() {
        let mut s = session();
        s.start();
        lose(&mut s);
        let round = s.round();

        // 2 s at 60 fps is 120 frames; stay in Lost until then.
        let events = run(&mut s, 110);
        assert_eq!(s.state(), SessionState::Lost);
        assert!(events.is_empty());

        let events = run(&mut s, 15);
        assert_eq!(s.state(), SessionState::Playing);
        assert_eq!(
            events,
            vec![GameEvent::RoundReset { round: round + 1, reason: ResetReason::Timer }]
        );
        assert_eq!(s.player().position(), vec3(0.0, 0.5, 0.0));
        assert!(s.burst().is_none());
        assert!(s.result().is_none());
    }

    #[test]
    fn explicit_reset_makes_pending_timer_stale() {
        let mut s = session();
        s.start();
        win(&mut s);
        assert!(s.reset());
        assert_eq!(s.state(), SessionState::Playing);
        assert!(s.burst().is_none());

        // The old timer still fires, but for an old round.
        let events = run(&mut s, 130);
        assert_eq!(s.state(), SessionState::Playing);
        assert!(events.contains(&GameEvent::StaleResetIgnored { scheduled_for: 0 }));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::RoundReset { reason: ResetReason::Timer, .. })));
    }

    #[test]
    fn stale_timer_does_not_cut_a_newer_round_short() {
        let mut s = session();
        s.start();
        win(&mut s); // schedules reset for round 0 at ~t0 + 2s
        s.reset(); // round 1
        run(&mut s, 30);
        lose(&mut s); // round 1 ends, its reset is due later than round 0's

        // Let round 0's timer come due; round 1 must still be showing Lost.
        let mut saw_stale = false;
        for _ in 0..200 {
            let events = s.tick(DT);
            if events.contains(&GameEvent::StaleResetIgnored { scheduled_for: 0 }) {
                saw_stale = true;
                assert_eq!(s.state(), SessionState::Lost);
            }
            if s.state() == SessionState::Playing {
                break;
            }
        }
        assert!(saw_stale);
        assert_eq!(s.state(), SessionState::Playing);
        assert_eq!(s.round(), 2);
    }

    #[test]
    fn closure_of_transitions() {
        let mut s = session();

        // Idle: only start leaves
        assert!(!s.reset());
        assert_eq!(s.state(), SessionState::Idle);

        // Playing: commands do nothing
        assert!(s.start());
        assert!(!s.start());
        assert!(!s.reset());
        run(&mut s, 50);
        assert_eq!(s.state(), SessionState::Playing);

        // Lost: start does nothing, reset returns to Playing
        lose(&mut s);
        assert!(!s.start());
        assert_eq!(s.state(), SessionState::Lost);
        assert!(s.reset());
        assert_eq!(s.state(), SessionState::Playing);

        // Won: same
        win(&mut s);
        assert!(!s.start());
        assert_eq!(s.state(), SessionState::Won);
        assert!(s.reset());
        assert_eq!(s.state(), SessionState::Playing);
    }

    #[test]
    fn stop_releases_input_and_idles() {
        let mut s = session();
        s.start();
        s.key_down("ArrowRight");
        s.tick(DT);
        assert!(s.stop());
        assert!(!s.input_attached());
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.player().position(), vec3(0.0, 0.5, 0.0));
        assert!(!s.stop());

        // Fresh tracker on restart: the old held key is gone.
        s.start();
        assert!(!s.input_snapshot().any());
    }

    #[test]
    fn stop_mid_round_makes_timer_stale() {
        let mut s = session();
        s.start();
        lose(&mut s);
        s.stop();
        let events = run(&mut s, 150);
        assert_eq!(s.state(), SessionState::Idle);
        assert!(events.iter().any(|e| matches!(e, GameEvent::StaleResetIgnored { .. })));
    }

    #[test]
    fn camera_trails_player() {
        let mut s = session();
        s.start();
        s.key_down("ArrowLeft");
        s.tick(DT);
        let cam = s.camera();
        assert_relative_eq!(cam.look_at, s.player().position());
        // moved toward the new desired x, but only 10% of the way
        assert!(cam.position.x < 0.0 && cam.position.x > -0.15);
        assert!(cam.focus.x > s.player().position().x);
    }

    #[test]
    fn particles_rise_while_round_is_over() {
        let mut s = session();
        s.start();
        win(&mut s);
        let before: f32 = s.frame().particles.iter().map(|p| p.y).sum();
        s.tick(DT);
        let after: f32 = s.frame().particles.iter().map(|p| p.y).sum();
        assert!(after != before);
    }

    #[test]
    fn layout_view_exposes_static_scene() {
        let s = GameSession::new(level::builtin(&Default::default()), &config());
        let layout = s.layout();
        assert_eq!(layout.walls.len(), 7);
        assert_eq!(layout.goal.position, vec3(21.0, 0.5, 0.0));
        assert_eq!(layout.start, vec3(-3.0, 0.5, 0.0));
        assert_eq!(s.maze_name(), "corridor");
    }

    #[test]
    fn builtin_corridor_walk_right_collides() {
        let mut s = GameSession::new(level::builtin(&Default::default()), &config());
        s.start();
        s.key_down("ArrowRight");
        let events = run(&mut s, 21);
        assert_eq!(s.state(), SessionState::Lost);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Collided { .. })));
        assert!(s.player().position().x < -1.0);
    }
}
