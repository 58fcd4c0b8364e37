//! Tick-driven scheduler.
//!
//! A short fixed tick re-reads the configuration and decides whether a full
//! cycle is due. The slow interval only gates expensive work; enabling,
//! disabling or changing the interval takes effect on the next tick.
//!
//! State is `Idle` or `Running`. `last_cycle_start` is recorded before a
//! cycle starts, and the running flag is owned by a [`RunningGuard`] that the
//! cycle task holds, so the state returns to `Idle` however the cycle ends.

use crate::config::{ConfigSource, WatchConfig};
use crate::orchestrator::Orchestrator;
use crate::remote::RemoteSpec;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub const TICK_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(15);
/// Pause after the tick loop itself crashes, before ticking resumes.
pub const CRASH_COOLDOWN: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Tokio's clock; follows paused time in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// ---------------------------------------------------------------------------
// Scheduler state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickDecision {
    Disabled,
    InvalidConfig(String),
    NotDue { remaining: Duration },
    /// Due, but the previous cycle is still running.
    Busy,
    Start(RemoteSpec),
}

/// Holds the scheduler in `Running`; dropping it returns to `Idle`.
#[derive(Debug)]
pub struct RunningGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    last_cycle_start: Option<Instant>,
    running: Arc<AtomicBool>,
    last_warning: Option<String>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn last_cycle_start(&self) -> Option<Instant> {
        self.last_cycle_start
    }

    /// Decide what this tick should do. Does not change any state.
    pub fn evaluate(&self, now: Instant, config: &WatchConfig) -> TickDecision {
        if !config.plugin_enabled {
            return TickDecision::Disabled;
        }
        if let Some(last) = self.last_cycle_start {
            let elapsed = now.saturating_duration_since(last);
            let interval = config.check_interval();
            if elapsed < interval {
                return TickDecision::NotDue {
                    remaining: interval - elapsed,
                };
            }
        }
        if self.is_running() {
            return TickDecision::Busy;
        }
        match config.remote() {
            Ok(remote) => TickDecision::Start(remote),
            Err(e) => TickDecision::InvalidConfig(e.to_string()),
        }
    }

    /// Transition to `Running` and record the cycle start. Returns `None`
    /// if a cycle is already in flight.
    pub fn start(&mut self, now: Instant) -> Option<RunningGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.last_cycle_start = Some(now);
        Some(RunningGuard {
            running: self.running.clone(),
        })
    }

    /// Log a configuration problem, once per distinct message.
    fn warn_once(&mut self, message: String) {
        if self.last_warning.as_deref() != Some(message.as_str()) {
            warn!("skipping update check: {message}");
            self.last_warning = Some(message);
        }
    }
}

// ---------------------------------------------------------------------------
// Tick loop
// ---------------------------------------------------------------------------

/// Drives a [`Scheduler`] against a config source and an orchestrator.
pub struct Watcher {
    scheduler: Scheduler,
    orchestrator: Arc<Orchestrator>,
    config: Arc<dyn ConfigSource>,
    clock: Arc<dyn Clock>,
    in_flight: Option<JoinHandle<()>>,
}

impl Watcher {
    pub fn new(orchestrator: Arc<Orchestrator>, config: Arc<dyn ConfigSource>) -> Self {
        Self {
            scheduler: Scheduler::new(),
            orchestrator,
            config,
            clock: Arc::new(TokioClock),
            in_flight: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Handle one tick. Returns the decision that was taken.
    pub fn tick(&mut self) -> TickDecision {
        let config = match self.config.load() {
            Ok(c) => c,
            Err(e) => {
                let message = e.to_string();
                self.scheduler.warn_once(message.clone());
                return TickDecision::InvalidConfig(message);
            }
        };

        let now = self.clock.now();
        let decision = self.scheduler.evaluate(now, &config);
        match &decision {
            TickDecision::InvalidConfig(message) => {
                self.scheduler.warn_once(message.clone());
            }
            TickDecision::Busy => debug!("previous cycle still running"),
            TickDecision::Start(remote) => {
                self.scheduler.last_warning = None;
                if let Some(guard) = self.scheduler.start(now) {
                    self.in_flight = Some(spawn_cycle(
                        self.orchestrator.clone(),
                        remote.clone(),
                        config,
                        guard,
                    ));
                }
            }
            TickDecision::Disabled | TickDecision::NotDue { .. } => {}
        }
        decision
    }

    /// Tick until `shutdown` flips to true or its sender goes away.
    pub async fn run_ticks(&mut self, shutdown: &mut watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.abandon_in_flight();
                        return;
                    }
                }
            }
        }
    }

    /// Run the tick loop under supervision until shutdown.
    ///
    /// A panic inside the loop is logged, followed by [`CRASH_COOLDOWN`],
    /// after which ticking resumes with the scheduler state intact.
    pub async fn supervise(mut self, startup_delay: Duration, mut shutdown: watch::Receiver<bool>) {
        if wait_or_shutdown(startup_delay, &mut shutdown).await {
            return;
        }
        info!(
            tick_secs = TICK_INTERVAL.as_secs(),
            "watcher started"
        );
        loop {
            let outcome = AssertUnwindSafe(self.run_ticks(&mut shutdown))
                .catch_unwind()
                .await;
            match outcome {
                Ok(()) => break,
                Err(panic) => {
                    error!(
                        cooldown_secs = CRASH_COOLDOWN.as_secs(),
                        "tick loop crashed: {}; resuming after cooldown",
                        panic_message(panic.as_ref())
                    );
                    if wait_or_shutdown(CRASH_COOLDOWN, &mut shutdown).await {
                        break;
                    }
                }
            }
        }
        self.abandon_in_flight();
        info!("watcher stopped");
    }

    /// Best-effort abort of a running cycle. The cursor is not written, so
    /// the next start retries the same revision.
    fn abandon_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            if !handle.is_finished() {
                warn!("abandoning in-flight update cycle");
                handle.abort();
            }
        }
    }
}

/// Run one cycle as its own task. Never lets a panic escape unlogged.
fn spawn_cycle(
    orchestrator: Arc<Orchestrator>,
    remote: RemoteSpec,
    config: WatchConfig,
    guard: RunningGuard,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let _guard = guard;
        let cycle = AssertUnwindSafe(orchestrator.run_cycle(&remote, &config)).catch_unwind();
        match cycle.await {
            Ok(run) => debug!(run = %run.id, outcome = ?run.outcome, "cycle finished"),
            Err(panic) => error!("update cycle panicked: {}", panic_message(panic.as_ref())),
        }
    })
}

/// Sleep for `delay`. Returns true if shutdown was requested meanwhile.
async fn wait_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::MemoryCursorStore;
    use crate::error::{ProbeError, Result, WatchError};
    use crate::pipeline::CollaboratorRegistry;
    use crate::probe::RevisionProber;
    use crate::testing::{FakeCollaborator, FakeProber, RecordingNotifier};
    use futures::future::BoxFuture;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn config(minutes: u32) -> WatchConfig {
        WatchConfig {
            check_interval_minutes: minutes,
            repo_url: "https://example.com/owner/gamedata".into(),
            ..WatchConfig::default()
        }
    }

    /// Counts probes and records the largest number running at once.
    #[derive(Default)]
    struct SlowProber {
        delay: Duration,
        starts: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl SlowProber {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        fn starts(&self) -> usize {
            self.starts.load(Ordering::SeqCst)
        }
    }

    impl RevisionProber for SlowProber {
        fn probe<'a>(&'a self, _remote: &'a RemoteSpec) -> BoxFuture<'a, std::result::Result<String, ProbeError>> {
            async move {
                self.starts.fetch_add(1, Ordering::SeqCst);
                let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_active.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(self.delay).await;
                self.active.fetch_sub(1, Ordering::SeqCst);
                Ok("abc123".to_string())
            }
            .boxed()
        }
    }

    /// Editable config; can panic on the first load.
    #[derive(Default)]
    struct SharedConfig {
        config: Mutex<WatchConfig>,
        panic_first: AtomicBool,
        loads: AtomicUsize,
    }

    impl SharedConfig {
        fn new(config: WatchConfig) -> Self {
            Self {
                config: Mutex::new(config),
                ..Self::default()
            }
        }

        fn set(&self, config: WatchConfig) {
            *self.config.lock().unwrap() = config;
        }
    }

    impl ConfigSource for SharedConfig {
        fn load(&self) -> Result<WatchConfig> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.panic_first.swap(false, Ordering::SeqCst) {
                panic!("config source exploded");
            }
            Ok(self.config.lock().unwrap().clone())
        }
    }

    fn watcher(prober: Arc<dyn RevisionProber>, source: Arc<SharedConfig>) -> Watcher {
        watcher_with(prober, Arc::new(FakeCollaborator::default()), source)
    }

    fn watcher_with(
        prober: Arc<dyn RevisionProber>,
        collaborator: Arc<FakeCollaborator>,
        source: Arc<SharedConfig>,
    ) -> Watcher {
        let orchestrator = Orchestrator::new(
            "/nonexistent",
            Arc::new(MemoryCursorStore::new(Some("abc123"))),
            prober,
            CollaboratorRegistry::new().with("git-mirror", collaborator),
            Arc::new(RecordingNotifier::default()),
        );
        Watcher::new(Arc::new(orchestrator), source)
    }

    // -- pure decisions ------------------------------------------------------

    #[test]
    fn first_tick_starts_immediately() {
        let s = Scheduler::new();
        assert!(matches!(
            s.evaluate(Instant::now(), &config(30)),
            TickDecision::Start(_)
        ));
    }

    #[test]
    fn disabled_never_starts() {
        let s = Scheduler::new();
        let cfg = WatchConfig {
            plugin_enabled: false,
            ..config(30)
        };
        assert_eq!(s.evaluate(Instant::now(), &cfg), TickDecision::Disabled);
    }

    #[test]
    fn interval_gates_the_next_start() {
        let mut s = Scheduler::new();
        let t0 = Instant::now();
        drop(s.start(t0).unwrap());

        let early = s.evaluate(t0 + Duration::from_secs(29 * 60), &config(30));
        assert_eq!(
            early,
            TickDecision::NotDue {
                remaining: Duration::from_secs(60)
            }
        );
        assert!(matches!(
            s.evaluate(t0 + Duration::from_secs(30 * 60), &config(30)),
            TickDecision::Start(_)
        ));
    }

    #[test]
    fn shortened_interval_applies_on_next_evaluation() {
        let mut s = Scheduler::new();
        let t0 = Instant::now();
        drop(s.start(t0).unwrap());
        let later = t0 + Duration::from_secs(5 * 60);
        assert!(matches!(s.evaluate(later, &config(30)), TickDecision::NotDue { .. }));
        assert!(matches!(s.evaluate(later, &config(5)), TickDecision::Start(_)));
    }

    #[test]
    fn zero_interval_is_treated_as_one_minute() {
        let mut s = Scheduler::new();
        let t0 = Instant::now();
        drop(s.start(t0).unwrap());
        assert!(matches!(
            s.evaluate(t0 + Duration::from_secs(30), &config(0)),
            TickDecision::NotDue { .. }
        ));
        assert!(matches!(
            s.evaluate(t0 + Duration::from_secs(60), &config(0)),
            TickDecision::Start(_)
        ));
    }

    #[test]
    fn running_cycle_makes_due_tick_busy() {
        let mut s = Scheduler::new();
        let t0 = Instant::now();
        let guard = s.start(t0).unwrap();
        let due = t0 + Duration::from_secs(31 * 60);

        assert!(s.is_running());
        assert_eq!(s.evaluate(due, &config(30)), TickDecision::Busy);
        assert!(s.start(due).is_none());
        assert_eq!(s.last_cycle_start(), Some(t0));

        drop(guard);
        assert!(!s.is_running());
        assert!(matches!(s.evaluate(due, &config(30)), TickDecision::Start(_)));
    }

    #[test]
    fn invalid_repo_url_is_reported_without_state_change() {
        let s = Scheduler::new();
        let cfg = WatchConfig {
            repo_url: String::new(),
            ..config(30)
        };
        assert!(matches!(
            s.evaluate(Instant::now(), &cfg),
            TickDecision::InvalidConfig(_)
        ));
        assert_eq!(s.last_cycle_start(), None);
        assert!(!s.is_running());
    }

    #[tokio::test]
    async fn guard_returns_to_idle_when_cycle_panics() {
        let mut s = Scheduler::new();
        let guard = s.start(Instant::now()).unwrap();
        let joined = tokio::spawn(async move {
            let _guard = guard;
            panic!("cycle blew up");
        })
        .await;
        assert!(joined.unwrap_err().is_panic());
        assert!(!s.is_running());
    }

    // -- tick loop -----------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn invalid_config_does_not_record_a_start() {
        let prober = Arc::new(SlowProber::new(Duration::ZERO));
        let source = Arc::new(SharedConfig::new(WatchConfig {
            repo_url: "not a url".into(),
            ..config(30)
        }));
        let mut w = watcher(prober.clone(), source.clone());

        assert!(matches!(w.tick(), TickDecision::InvalidConfig(_)));
        assert_eq!(w.scheduler().last_cycle_start(), None);

        // Fixing the URL starts a cycle on the very next tick.
        source.set(config(30));
        assert!(matches!(w.tick(), TickDecision::Start(_)));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(prober.starts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_config_file_is_skipped() {
        struct Missing;
        impl ConfigSource for Missing {
            fn load(&self) -> Result<WatchConfig> {
                Err(WatchError::NotInitialized)
            }
        }
        let prober = Arc::new(SlowProber::new(Duration::ZERO));
        let mut w = watcher(prober.clone(), Arc::new(SharedConfig::default()));
        w.config = Arc::new(Missing);
        assert!(matches!(w.tick(), TickDecision::InvalidConfig(_)));
        assert_eq!(prober.starts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cycles_start_once_per_interval() {
        let prober = Arc::new(SlowProber::new(Duration::ZERO));
        let source = Arc::new(SharedConfig::new(config(1)));
        let w = watcher(prober.clone(), source);
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(w.supervise(Duration::ZERO, rx));

        // Starts at 0s, 60s and 120s.
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(prober.starts(), 3);

        tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cycles_never_overlap() {
        // Each cycle outlasts the one-minute interval.
        let prober = Arc::new(SlowProber::new(Duration::from_secs(155)));
        let source = Arc::new(SharedConfig::new(config(1)));
        let w = watcher(prober.clone(), source);
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(w.supervise(Duration::ZERO, rx));

        tokio::time::sleep(Duration::from_secs(9 * 60)).await;
        assert_eq!(prober.max_active.load(Ordering::SeqCst), 1);
        assert!(prober.starts() >= 3, "starts: {}", prober.starts());

        tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_git_is_retried_only_after_the_interval() {
        let prober = Arc::new(
            FakeProber::returning(Err(ProbeError::ToolUnavailable))
                .with_delay(Duration::from_secs(1)),
        );
        let w = watcher(prober.clone(), Arc::new(SharedConfig::new(config(1))));
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(w.supervise(Duration::ZERO, rx));

        // The failed cycle ends at 1s; ticks at 10s..50s must not retry.
        tokio::time::sleep(Duration::from_secs(55)).await;
        assert_eq!(prober.calls(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(prober.calls(), 2);

        tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_holds_off_the_next_cycle() {
        // The cursor holds abc123, so the new head triggers an update whose
        // fetch outlasts the one-minute interval.
        let prober = Arc::new(FakeProber::returning(Ok("def456")));
        let collaborator =
            Arc::new(FakeCollaborator::default().with_fetch_delay(Duration::from_secs(90)));
        let w = watcher_with(
            prober.clone(),
            collaborator.clone(),
            Arc::new(SharedConfig::new(config(1))),
        );
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(w.supervise(Duration::ZERO, rx));

        tokio::time::sleep(Duration::from_secs(85)).await;
        assert_eq!(prober.calls(), 1);
        assert!(collaborator.calls().is_empty());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(collaborator.calls(), vec!["fetch", "initialize", "publish"]);
        assert_eq!(prober.calls(), 2);

        tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_watcher_keeps_ticking_without_work() {
        let prober = Arc::new(SlowProber::new(Duration::ZERO));
        let source = Arc::new(SharedConfig::new(WatchConfig {
            plugin_enabled: false,
            ..config(1)
        }));
        let w = watcher(prober.clone(), source.clone());
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(w.supervise(Duration::ZERO, rx));

        tokio::time::sleep(Duration::from_secs(5 * 60)).await;
        assert_eq!(prober.starts(), 0);
        assert!(source.loads.load(Ordering::SeqCst) >= 30);

        // Re-enabling is noticed within a tick.
        source.set(config(1));
        tokio::time::sleep(TICK_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(prober.starts(), 1);

        tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn startup_delay_postpones_first_tick() {
        let prober = Arc::new(SlowProber::new(Duration::ZERO));
        let w = watcher(prober.clone(), Arc::new(SharedConfig::new(config(30))));
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(w.supervise(DEFAULT_STARTUP_DELAY, rx));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(prober.starts(), 0);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(prober.starts(), 1);

        tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn crashed_loop_resumes_after_cooldown() {
        let prober = Arc::new(SlowProber::new(Duration::ZERO));
        let source = Arc::new(SharedConfig::new(config(30)));
        source.panic_first.store(true, Ordering::SeqCst);
        let w = watcher(prober.clone(), source);
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(w.supervise(Duration::ZERO, rx));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(prober.starts(), 0);

        tokio::time::sleep(CRASH_COOLDOWN).await;
        assert_eq!(prober.starts(), 1);

        tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_startup_delay_returns_promptly() {
        let prober = Arc::new(SlowProber::new(Duration::ZERO));
        let w = watcher(prober.clone(), Arc::new(SharedConfig::new(config(30))));
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(w.supervise(Duration::from_secs(3600), rx));

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("supervisor stopped")
            .unwrap();
        assert_eq!(prober.starts(), 0);
    }

    #[tokio::test]
    async fn injected_clock_drives_interval_decisions() {
        struct ManualClock(Mutex<Instant>);
        impl Clock for ManualClock {
            fn now(&self) -> Instant {
                *self.0.lock().unwrap()
            }
        }

        let t0 = Instant::now();
        let clock = Arc::new(ManualClock(Mutex::new(t0)));
        let prober = Arc::new(SlowProber::new(Duration::ZERO));
        let mut w = watcher(prober, Arc::new(SharedConfig::new(config(30))))
            .with_clock(clock.clone());

        assert!(matches!(w.tick(), TickDecision::Start(_)));
        assert_eq!(w.scheduler().last_cycle_start(), Some(t0));

        *clock.0.lock().unwrap() = t0 + Duration::from_secs(10 * 60);
        assert_eq!(
            w.tick(),
            TickDecision::NotDue {
                remaining: Duration::from_secs(20 * 60)
            }
        );
    }

    #[test]
    fn panic_message_handles_common_payloads() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(s.as_ref()), "owned");
        let s: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(s.as_ref()), "unknown panic");
    }
}
