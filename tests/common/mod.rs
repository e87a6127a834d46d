//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use async_trait::async_trait;

use snippets_bot::application::errors::ModuleError;
use snippets_bot::application::services::Host;
use snippets_bot::infrastructure::adapters::MemoryAdapter;
use snippets_bot::infrastructure::config::Config;
use snippets_bot::modules::{DoneSignal, Module, ModuleInfo, Phase};

static INIT: Once = Once::new();

pub fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn memory_host(config: Config) -> (Arc<MemoryAdapter>, Arc<Host>) {
    let adapter = Arc::new(MemoryAdapter::new());
    let host = Host::new(adapter.clone(), config);
    (adapter, host)
}

/// Poll `cond` until it holds or `timeout` passes
pub async fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Module that records each lifecycle call as `<id>:<phase>`
pub struct RecordingModule {
    id: String,
    log: EventLog,
    fail_in: Option<Phase>,
    stop_delay: Duration,
    hang_on_stop: bool,
    panic_after_stop: bool,
    run_forever: bool,
}

impl RecordingModule {
    pub fn new(id: &str, log: &EventLog) -> Self {
        Self {
            id: id.to_string(),
            log: Arc::clone(log),
            fail_in: None,
            stop_delay: Duration::ZERO,
            hang_on_stop: false,
            panic_after_stop: false,
            run_forever: false,
        }
    }

    pub fn failing_in(mut self, phase: Phase) -> Self {
        self.fail_in = Some(phase);
        self
    }

    pub fn stop_delay(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }

    pub fn hang_on_stop(mut self) -> Self {
        self.hang_on_stop = true;
        self
    }

    /// Signal completion, then panic
    pub fn panic_after_stop(mut self) -> Self {
        self.panic_after_stop = true;
        self
    }

    pub fn run_forever(mut self) -> Self {
        self.run_forever = true;
        self
    }

    fn record(&self, phase: Phase) -> Result<(), ModuleError> {
        self.log.lock().unwrap().push(format!("{}:{}", self.id, phase));
        if self.fail_in == Some(phase) {
            return Err(ModuleError::Config(format!("{} refused {}", self.id, phase)));
        }
        Ok(())
    }
}

#[async_trait]
impl Module for RecordingModule {
    fn info(&self) -> ModuleInfo {
        ModuleInfo::new(self.id.clone(), "records lifecycle calls")
    }

    async fn init(&self, _config: &Config) -> Result<(), ModuleError> {
        self.record(Phase::Init)
    }

    async fn post_init(&self, _config: &Config) -> Result<(), ModuleError> {
        self.record(Phase::PostInit)
    }

    fn serve(&self, _host: &Host) -> Result<(), ModuleError> {
        self.record(Phase::Serve)
    }

    async fn start(&self, _host: Arc<Host>) {
        let _ = self.record(Phase::Start);
        if self.run_forever {
            std::future::pending::<()>().await;
        }
    }

    async fn stop(&self, _host: Arc<Host>, done: DoneSignal) {
        tokio::time::sleep(self.stop_delay).await;
        if self.hang_on_stop {
            let _held = done;
            std::future::pending::<()>().await
        } else {
            let _ = self.record(Phase::Stop);
            done.done();
            if self.panic_after_stop {
                panic!("{} failed after stopping", self.id);
            }
        }
    }
}
