//! Test doubles shared by the unit tests of this crate.

use crate::config::PipelineConfig;
use crate::error::{ProbeError, Step};
use crate::notify::Notifier;
use crate::pipeline::{Collaborator, StepCall, StepContext};
use crate::probe::RevisionProber;
use crate::remote::RemoteSpec;
use futures::future::{BoxFuture, FutureExt};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn context(revision: &str, fresh: bool) -> StepContext {
    StepContext {
        remote: remote(),
        revision: revision.to_string(),
        fresh,
        checkout_dir: PathBuf::from("/nonexistent/checkout"),
        settings: PipelineConfig::default(),
    }
}

pub fn remote() -> RemoteSpec {
    RemoteSpec {
        url: "https://example.com/owner/gamedata.git".into(),
        branch: None,
    }
}

// ---------------------------------------------------------------------------
// FakeProber
// ---------------------------------------------------------------------------

/// Replays queued probe results; repeats the last one when the queue drains.
#[derive(Default)]
pub struct FakeProber {
    results: Mutex<VecDeque<Result<String, ProbeError>>>,
    last: Mutex<Option<Result<String, ProbeError>>>,
    calls: Mutex<usize>,
    delay: Option<Duration>,
}

impl FakeProber {
    pub fn returning(result: Result<&str, ProbeError>) -> Self {
        let prober = Self::default();
        prober.push(result);
        prober
    }

    pub fn push(&self, result: Result<&str, ProbeError>) {
        self.results
            .lock()
            .unwrap()
            .push_back(result.map(str::to_string));
    }

    /// Make each probe take `delay` (tokio time).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn next_result(&self) -> Result<String, ProbeError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.results.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(r) = next {
            *last = Some(r);
        }
        last.clone()
            .unwrap_or_else(|| Err(ProbeError::NetworkOrAuth("no result queued".into())))
    }
}

impl RevisionProber for FakeProber {
    fn probe<'a>(&'a self, _remote: &'a RemoteSpec) -> BoxFuture<'a, Result<String, ProbeError>> {
        async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.next_result()
        }
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// FakeCollaborator
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeCollaborator {
    calls: Arc<Mutex<Vec<&'static str>>>,
    fail_at: Option<Step>,
    panic_at: Option<Step>,
    async_fetch: bool,
    fetch_delay: Option<Duration>,
}

impl FakeCollaborator {
    pub fn failing_at(step: Step) -> Self {
        Self {
            fail_at: Some(step),
            ..Self::default()
        }
    }

    pub fn panicking_at(step: Step) -> Self {
        Self {
            panic_at: Some(step),
            ..Self::default()
        }
    }

    /// Implement fetch as a future instead of a blocking closure.
    pub fn async_fetch(mut self) -> Self {
        self.async_fetch = true;
        self
    }

    /// Make fetch (async) take `delay` of tokio time.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.async_fetch = true;
        self.fetch_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn outcome(
        calls: &Mutex<Vec<&'static str>>,
        step: Step,
        fail_at: Option<Step>,
        panic_at: Option<Step>,
    ) -> anyhow::Result<()> {
        calls.lock().unwrap().push(step.as_str());
        if panic_at == Some(step) {
            panic!("injected {step} panic");
        }
        if fail_at == Some(step) {
            anyhow::bail!("injected {step} failure");
        }
        Ok(())
    }
}

impl Collaborator for FakeCollaborator {
    fn fetch(&self, _ctx: &StepContext) -> StepCall {
        let calls = self.calls.clone();
        let (fail_at, panic_at) = (self.fail_at, self.panic_at);
        if self.async_fetch {
            let delay = self.fetch_delay;
            StepCall::future(async move {
                if let Some(d) = delay {
                    tokio::time::sleep(d).await;
                }
                Self::outcome(&calls, Step::Fetch, fail_at, panic_at)
            })
        } else {
            StepCall::blocking(move || Self::outcome(&calls, Step::Fetch, fail_at, panic_at))
        }
    }

    fn initialize(&self, _ctx: &StepContext) -> StepCall {
        let calls = self.calls.clone();
        let (fail_at, panic_at) = (self.fail_at, self.panic_at);
        StepCall::blocking(move || Self::outcome(&calls, Step::Initialize, fail_at, panic_at))
    }

    fn publish(&self, _ctx: &StepContext) -> anyhow::Result<()> {
        Self::outcome(&self.calls, Step::Publish, self.fail_at, self.panic_at)
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
