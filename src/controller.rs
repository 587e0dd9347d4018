//! Session controller
//!
//! Owns the session, the spawner and the live projectiles, and keeps them in
//! step: frame deltas drive projectiles (in creation order) and the spawn
//! countdown, resolutions feed the session, and the session's events decide
//! whether spawning runs.
//!
//! Event reactions:
//! - `NewGame`: stop spawning, cancel every live projectile, go active
//! - `ScoreUpdate` (not over): go active and make sure the spawner runs
//! - `ScoreUpdate` (over) / `GameOver`: stop spawning, cancel everything

use std::rc::Rc;

use glam::DVec2;

use crate::audio::{AudioSink, SoundEffect};
use crate::clock::{FrameClock, FrameTick, TickInbox};
use crate::consts::MAX_LIVE_PROJECTILES;
use crate::platform::Storage;
use crate::render::RenderSink;
use crate::session::{GameEvent, GameSession, Subscription};
use crate::sim::{
    Field, Projectile, ProjectileConfig, ProjectileId, Resolution, SpawnContext, Spawner,
    TapOutcome,
};
use crate::tuning::Tuning;

/// Glue between the session, the spawner and the live projectile set
pub struct SessionController {
    session: GameSession,
    spawner: Spawner,
    /// Creation order
    live: Vec<Projectile>,
    renderer: Box<dyn RenderSink>,
    audio: Rc<dyn AudioSink>,
    clock: FrameClock,
    field: Field,
    tuning: Tuning,
    active: bool,
    next_id: ProjectileId,
    /// Seconds of simulated wall time (drives audio throttling)
    now: f64,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("session", &self.session)
            .field("live", &self.live.len())
            .field("spawning", &self.spawner.is_running())
            .field("field", &self.field)
            .field("active", &self.active)
            .finish()
    }
}

impl SessionController {
    /// Controller with an OS-seeded spawner
    pub fn new(
        storage: Box<dyn Storage>,
        renderer: Box<dyn RenderSink>,
        audio: Rc<dyn AudioSink>,
        tuning: Tuning,
    ) -> Self {
        let tuning = tuning.sanitize();
        let spawner = Spawner::from_entropy(&tuning.spawn);
        Self::with_spawner(storage, renderer, audio, tuning, spawner)
    }

    /// Controller with a deterministic spawner
    pub fn with_seed(
        storage: Box<dyn Storage>,
        renderer: Box<dyn RenderSink>,
        audio: Rc<dyn AudioSink>,
        tuning: Tuning,
        seed: u64,
    ) -> Self {
        let tuning = tuning.sanitize();
        let spawner = Spawner::new(seed, &tuning.spawn);
        Self::with_spawner(storage, renderer, audio, tuning, spawner)
    }

    pub fn with_spawner(
        storage: Box<dyn Storage>,
        renderer: Box<dyn RenderSink>,
        audio: Rc<dyn AudioSink>,
        tuning: Tuning,
        spawner: Spawner,
    ) -> Self {
        let tuning = tuning.sanitize();
        let session = GameSession::new(storage, Rc::clone(&audio), &tuning.session);
        Self {
            session,
            spawner,
            live: Vec::with_capacity(MAX_LIVE_PROJECTILES),
            renderer,
            audio,
            clock: FrameClock::new(),
            field: Field::default(),
            tuning,
            active: false,
            next_id: 0,
            now: 0.0,
        }
    }

    // === Session operations ===

    /// Reset and begin a fresh game
    pub fn start_new_game(&mut self) {
        let events = self.session.start_new_game();
        self.react(&events);
    }

    /// Record that the player is actually playing
    pub fn mark_started(&mut self) {
        let events = self.session.mark_started();
        self.react(&events);
    }

    /// End the game now (app-level stop)
    pub fn force_game_over(&mut self) {
        let events = self.session.force_game_over();
        self.react(&events);
    }

    /// The app is going to the background: a game in progress ends
    pub fn suspend(&mut self) {
        let details = self.session.details();
        if details.game_started && !details.game_over && details.lives > 0 {
            log::info!("Suspended mid-game, ending it");
            self.force_game_over();
        }
        self.clock.reset();
    }

    /// Attach an event handler to the session's bus
    pub fn subscribe<F>(&mut self, handler: F) -> Subscription
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.session.subscribe(handler)
    }

    // === Frame driving ===

    /// Playfield resized
    pub fn set_field(&mut self, field: Field) {
        if !field.is_usable() {
            log::debug!("Field {:?} too small, spawns will be skipped", field);
        }
        self.field = field;
    }

    /// Display refresh (control thread)
    pub fn on_frame(&mut self, tick: FrameTick) {
        let dt = self.clock.delta(tick);
        self.step(dt);
    }

    /// Apply every tick queued from other threads; returns how many ran
    pub fn pump(&mut self, inbox: &TickInbox) -> usize {
        let ticks = inbox.drain();
        for tick in &ticks {
            self.on_frame(*tick);
        }
        ticks.len()
    }

    /// Advance everything by `dt` seconds
    pub fn step(&mut self, dt: f64) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.now += dt;
        self.audio.set_clock(self.now);

        let mut index = 0;
        while index < self.live.len() {
            let outcome = self.live[index].step(dt);
            let id = self.live[index].id();

            if outcome.removed {
                self.live.remove(index);
                self.renderer.remove(id);
            } else {
                self.renderer.pose(id, self.live[index].pose());
                index += 1;
            }

            // A miss may end the game, which clears the live set
            let events = match outcome.resolved {
                Some(Resolution::Hit) => self.session.hit(),
                Some(Resolution::Miss) => self.session.miss(),
                Some(Resolution::Cancel) | None => Vec::new(),
            };
            self.react(&events);
        }

        let context = SpawnContext {
            combo: self.session.details().combo,
            field: self.field,
            live: self.live.len(),
            active: self.active,
        };
        if let Some(config) = self.spawner.advance(dt, &context) {
            self.launch(config);
        }
    }

    /// Throw a projectile now. Refused while inactive or at capacity.
    pub fn launch(&mut self, config: ProjectileConfig) -> Option<ProjectileId> {
        if !self.active {
            log::debug!("Launch refused: session inactive");
            return None;
        }
        if self.live.len() >= MAX_LIVE_PROJECTILES {
            log::debug!("Launch refused: {} projectiles live", self.live.len());
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;

        let mut projectile = Projectile::new(id, config, &self.tuning.flight);
        projectile.deploy();
        self.renderer.deploy(id, projectile.config());
        self.renderer.pose(id, projectile.pose());
        self.live.push(projectile);
        Some(id)
    }

    // === Player input ===

    /// Tap a specific projectile
    pub fn tap(&mut self, id: ProjectileId) -> TapOutcome {
        let Some(index) = self.index_of(id) else {
            return TapOutcome::Ignored;
        };

        let outcome = self.live[index].tap();
        match outcome {
            TapOutcome::Ignored => {}
            TapOutcome::Cracked { stage } => {
                log::debug!("Projectile {} cracked ({})", id, stage);
                self.audio.play(SoundEffect::GlassBreak);
            }
            TapOutcome::Broken => {
                self.audio.play(SoundEffect::GlassBreak);
                self.finish_hit(index);
            }
        }
        outcome
    }

    /// Tap at a field point: hits the newest flying projectile under it
    pub fn tap_at(&mut self, point: DVec2) -> TapOutcome {
        let target = self
            .live
            .iter()
            .rev()
            .find(|p| p.is_flying() && p.contains(point))
            .map(Projectile::id);

        match target {
            Some(id) => self.tap(id),
            None => {
                self.audio.play(SoundEffect::Tap);
                TapOutcome::Ignored
            }
        }
    }

    /// Break a projectile outright; true if it was flying
    pub fn shatter(&mut self, id: ProjectileId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if !self.live[index].is_flying() {
            return false;
        }

        self.live[index].shatter();
        self.audio.play(SoundEffect::GlassBreak);
        self.finish_hit(index);
        true
    }

    // === Accessors ===

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.live
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_spawning(&self) -> bool {
        self.spawner.is_running()
    }

    // === Internals ===

    fn index_of(&self, id: ProjectileId) -> Option<usize> {
        self.live.iter().position(|p| p.id() == id)
    }

    /// Drop a broken projectile and score it
    fn finish_hit(&mut self, index: usize) {
        let projectile = self.live.remove(index);
        self.renderer.remove(projectile.id());
        let events = self.session.hit();
        self.react(&events);
    }

    fn react(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::NewGame => self.reset(),
                GameEvent::ScoreUpdate(details) if details.game_over => self.teardown(),
                GameEvent::ScoreUpdate(details) => {
                    self.active = true;
                    self.spawner.start(details.combo);
                }
                GameEvent::GameOver(details) => {
                    self.teardown();
                    self.audio.play(SoundEffect::GameOver);
                    if details.is_high_score {
                        self.audio.play(SoundEffect::HighScore);
                    }
                }
            }
        }
    }

    fn reset(&mut self) {
        self.active = true;
        self.spawner.stop();
        self.clear_live();
    }

    fn teardown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.spawner.stop();
        self.clear_live();
    }

    /// Cancel every live projectile; cancellations never reach the session
    fn clear_live(&mut self) {
        for mut projectile in self.live.drain(..) {
            projectile.cancel();
            self.renderer.remove(projectile.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingAudio;
    use crate::clock::tick_channel;
    use crate::platform::MemoryStorage;
    use crate::render::RecordingRenderer;
    use crate::tuning::{FlightTuning, SpawnTuning};
    use std::thread;

    const FRAME: f64 = 1.0 / 60.0;

    struct Harness {
        controller: SessionController,
        renderer: RecordingRenderer,
        audio: Rc<RecordingAudio>,
        storage: MemoryStorage,
    }

    fn harness(tuning: Tuning) -> Harness {
        let renderer = RecordingRenderer::new();
        let audio = Rc::new(RecordingAudio::new());
        let storage = MemoryStorage::new();
        let sink: Rc<dyn AudioSink> = audio.clone();
        let mut controller = SessionController::with_seed(
            Box::new(storage.clone()),
            Box::new(renderer.clone()),
            sink,
            tuning,
            42,
        );
        controller.set_field(Field::new(400.0, 800.0));
        Harness {
            controller,
            renderer,
            audio,
            storage,
        }
    }

    /// Frequent, slow throws that never resolve within a few seconds
    fn crowded_tuning() -> Tuning {
        Tuning {
            spawn: SpawnTuning {
                base_delay: 0.1,
                min_base_delay: 0.05,
                delay_jitter: 0.0,
                min_delay: 0.05,
                base_duration: 20.0,
                min_base_duration: 20.0,
                duration_jitter: 0.0,
                min_duration: 20.0,
                ..SpawnTuning::default()
            },
            ..Tuning::default()
        }
    }

    fn throw_at(x: f64) -> ProjectileConfig {
        ProjectileConfig {
            size: DVec2::splat(100.0),
            start: DVec2::new(x, 900.0),
            control: DVec2::new(x, 200.0),
            end: DVec2::new(x, 860.0),
            duration: 1.5,
            spin: 0.0,
            gravity: 0.0,
            symbol: "star".to_string(),
        }
    }

    fn run(controller: &mut SessionController, seconds: f64) {
        let frames = (seconds / FRAME).ceil() as usize;
        for _ in 0..frames {
            controller.step(FRAME);
            assert!(controller.live_count() <= MAX_LIVE_PROJECTILES);
        }
    }

    #[test]
    fn test_new_game_starts_spawning() {
        let mut h = harness(Tuning::default());
        assert!(!h.controller.is_active());
        assert!(!h.controller.is_spawning());

        h.controller.start_new_game();
        assert!(h.controller.is_active());
        assert!(h.controller.is_spawning());

        run(&mut h.controller, 2.0);
        assert!(!h.renderer.deployed().is_empty());
    }

    #[test]
    fn test_live_set_is_capped() {
        let mut h = harness(crowded_tuning());
        h.controller.start_new_game();

        run(&mut h.controller, 5.0);
        assert_eq!(h.controller.live_count(), MAX_LIVE_PROJECTILES);
        assert_eq!(h.renderer.deployed().len(), MAX_LIVE_PROJECTILES);
        assert_eq!(h.controller.session().details().lives, 3);

        assert!(h.controller.launch(throw_at(200.0)).is_none());
    }

    #[test]
    fn test_unusable_field_never_spawns() {
        let mut h = harness(crowded_tuning());
        h.controller.set_field(Field::new(1.0, 800.0));
        h.controller.start_new_game();

        run(&mut h.controller, 2.0);
        assert_eq!(h.controller.live_count(), 0);
        assert!(h.controller.is_spawning());
    }

    #[test]
    fn test_unattended_game_ends_by_misses() {
        let mut h = harness(Tuning::default());
        h.controller.start_new_game();

        run(&mut h.controller, 30.0);
        let details = h.controller.session().details().clone();
        assert!(details.game_over);
        assert_eq!(details.lives, 0);
        assert_eq!(details.score, 0);
        assert!(!details.is_high_score);

        assert!(!h.controller.is_active());
        assert!(!h.controller.is_spawning());
        assert_eq!(h.controller.live_count(), 0);
        assert_eq!(h.audio.count(SoundEffect::LowBattery), 3);
        assert_eq!(h.audio.count(SoundEffect::GameOver), 1);

        // Every deployed projectile was removed exactly once
        let mut deployed = h.renderer.deployed();
        let mut removed = h.renderer.removed();
        deployed.sort_unstable();
        removed.sort_unstable();
        assert_eq!(deployed, removed);

        // Nothing more is thrown after game over
        run(&mut h.controller, 5.0);
        assert_eq!(h.renderer.deployed().len(), deployed.len());
    }

    #[test]
    fn test_tap_cracks_then_breaks() {
        let mut h = harness(Tuning::default());
        h.controller.start_new_game();
        let id = h.controller.launch(throw_at(200.0)).unwrap();
        let point = h.controller.projectiles()[0].position();

        let stages = FlightTuning::default().crack_stages;
        for stage in 1..stages {
            assert_eq!(h.controller.tap_at(point), TapOutcome::Cracked { stage });
        }
        assert_eq!(h.controller.tap_at(point), TapOutcome::Broken);

        let details = h.controller.session().details();
        assert_eq!((details.score, details.combo, details.max_combo), (1, 1, 1));
        assert_eq!(h.controller.live_count(), 0);
        assert_eq!(h.renderer.removed(), vec![id]);
        assert_eq!(h.audio.count(SoundEffect::GlassBreak), stages as usize);
    }

    #[test]
    fn test_tap_on_empty_space() {
        let mut h = harness(Tuning::default());
        h.controller.start_new_game();
        h.controller.launch(throw_at(100.0)).unwrap();

        assert_eq!(h.controller.tap_at(DVec2::new(350.0, 100.0)), TapOutcome::Ignored);
        assert_eq!(h.audio.count(SoundEffect::Tap), 1);
        assert_eq!(h.controller.projectiles()[0].cracks(), 0);
    }

    #[test]
    fn test_tap_targets_newest_overlap() {
        let mut h = harness(Tuning::default());
        h.controller.start_new_game();
        let older = h.controller.launch(throw_at(200.0)).unwrap();
        let newer = h.controller.launch(throw_at(210.0)).unwrap();

        h.controller.tap_at(DVec2::new(205.0, 900.0));
        let cracks = |id| {
            h.controller
                .projectiles()
                .iter()
                .find(|p| p.id() == id)
                .map(|p| p.cracks())
        };
        assert_eq!(cracks(older), Some(0));
        assert_eq!(cracks(newer), Some(1));
    }

    #[test]
    fn test_shatter_scores_once() {
        let mut h = harness(Tuning::default());
        h.controller.start_new_game();
        let id = h.controller.launch(throw_at(200.0)).unwrap();

        assert!(h.controller.shatter(id));
        assert!(!h.controller.shatter(id));
        assert_eq!(h.controller.session().details().score, 1);
    }

    #[test]
    fn test_new_game_cancels_without_scoring() {
        let mut h = harness(Tuning::default());
        h.controller.start_new_game();
        let a = h.controller.launch(throw_at(100.0)).unwrap();
        let b = h.controller.launch(throw_at(300.0)).unwrap();

        h.controller.start_new_game();
        assert_eq!(h.controller.live_count(), 0);
        assert_eq!(h.renderer.removed(), vec![a, b]);

        let details = h.controller.session().details();
        assert_eq!((details.score, details.lives), (0, 3));
        assert_eq!(h.audio.count(SoundEffect::LowBattery), 0);
        assert!(h.controller.is_spawning());
    }

    #[test]
    fn test_force_game_over_tears_down_once() {
        let mut h = harness(Tuning::default());
        h.controller.start_new_game();
        h.controller.launch(throw_at(200.0)).unwrap();
        let id = h.controller.projectiles()[0].id();
        h.controller.shatter(id);
        h.controller.launch(throw_at(200.0)).unwrap();

        h.controller.force_game_over();
        h.controller.force_game_over();

        assert_eq!(h.controller.live_count(), 0);
        assert!(!h.controller.is_spawning());
        assert_eq!(h.audio.count(SoundEffect::GameOver), 1);
        // 1 beats the empty record
        assert_eq!(h.audio.count(SoundEffect::HighScore), 1);
        assert!(h.controller.launch(throw_at(200.0)).is_none());

        let stored = crate::HighScoreRecord::load(&h.storage);
        assert_eq!(stored.score(), 1);
    }

    #[test]
    fn test_suspend_ends_started_game_only() {
        let mut h = harness(Tuning::default());
        h.controller.start_new_game();
        h.controller.suspend();
        assert!(!h.controller.session().is_over());

        h.controller.mark_started();
        h.controller.suspend();
        assert!(h.controller.session().is_over());
    }

    #[test]
    fn test_subscribers_see_controller_driven_events() {
        use std::cell::RefCell;

        let mut h = harness(Tuning::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        h.controller.subscribe(move |event| {
            log.borrow_mut().push(matches!(event, GameEvent::GameOver(_)));
        });

        h.controller.start_new_game();
        h.controller.force_game_over();
        // NewGame, ScoreUpdate, ScoreUpdate(over), GameOver
        assert_eq!(*seen.borrow(), vec![false, false, false, true]);
    }

    #[test]
    fn test_pump_applies_remote_ticks() {
        let mut h = harness(Tuning::default());
        h.controller.start_new_game();
        h.controller.launch(throw_at(200.0)).unwrap();

        let (sender, inbox) = tick_channel();
        let handle = thread::spawn(move || {
            for i in 0..3 {
                sender.send(FrameTick::new(i as f64 * FRAME, FRAME));
            }
        });
        handle.join().unwrap();

        assert_eq!(h.controller.pump(&inbox), 3);
        assert_eq!(h.controller.pump(&inbox), 0);

        let elapsed = h.controller.projectiles()[0].elapsed();
        assert!((elapsed - 3.0 * FRAME).abs() < 1e-9);
    }
}
