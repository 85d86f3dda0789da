//! Process-local counters exposed on `/metrics`.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use sentinel_core::Mode;
use sentinel_llm::{FaultClass, TurnObserver};

#[derive(Debug, Default)]
struct ModeCounters {
    sql: AtomicU64,
    email: AtomicU64,
    wiki: AtomicU64,
    chat: AtomicU64,
}

impl ModeCounters {
    fn get(&self, mode: Mode) -> &AtomicU64 {
        match mode {
            Mode::Sql => &self.sql,
            Mode::Email => &self.email,
            Mode::Wiki => &self.wiki,
            Mode::Chat => &self.chat,
        }
    }
}

#[derive(Debug)]
pub struct Metrics {
    started_at: DateTime<Utc>,
    chat_requests: ModeCounters,
    prompts_blocked: AtomicU64,
    statements_checked: AtomicU64,
    statements_rejected: AtomicU64,
    faults_unreachable: AtomicU64,
    faults_timeout: AtomicU64,
    faults_other: AtomicU64,
    fragments_streamed: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequestCounts {
    pub sql: u64,
    pub email: u64,
    pub wiki: u64,
    pub chat: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendFaultCounts {
    pub unreachable: u64,
    pub timeout: u64,
    pub other: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub started_at: DateTime<Utc>,
    pub chat_requests: ChatRequestCounts,
    pub prompts_blocked: u64,
    pub statements_checked: u64,
    pub statements_rejected: u64,
    pub backend_faults: BackendFaultCounts,
    pub fragments_streamed: u64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            chat_requests: ModeCounters::default(),
            prompts_blocked: AtomicU64::new(0),
            statements_checked: AtomicU64::new(0),
            statements_rejected: AtomicU64::new(0),
            faults_unreachable: AtomicU64::new(0),
            faults_timeout: AtomicU64::new(0),
            faults_other: AtomicU64::new(0),
            fragments_streamed: AtomicU64::new(0),
        }
    }

    pub fn record_chat_request(&self, mode: Mode) {
        self.chat_requests.get(mode).fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prompt_blocked(&self) {
        self.prompts_blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_statement(&self, allowed: bool) {
        self.statements_checked.fetch_add(1, Ordering::Relaxed);
        if !allowed {
            self.statements_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            started_at: self.started_at,
            chat_requests: ChatRequestCounts {
                sql: load(&self.chat_requests.sql),
                email: load(&self.chat_requests.email),
                wiki: load(&self.chat_requests.wiki),
                chat: load(&self.chat_requests.chat),
            },
            prompts_blocked: load(&self.prompts_blocked),
            statements_checked: load(&self.statements_checked),
            statements_rejected: load(&self.statements_rejected),
            backend_faults: BackendFaultCounts {
                unreachable: load(&self.faults_unreachable),
                timeout: load(&self.faults_timeout),
                other: load(&self.faults_other),
            },
            fragments_streamed: load(&self.fragments_streamed),
        }
    }
}

impl TurnObserver for Metrics {
    fn fragment_streamed(&self) {
        self.fragments_streamed.fetch_add(1, Ordering::Relaxed);
    }

    fn backend_fault(&self, class: FaultClass) {
        let counter = match class {
            FaultClass::Unreachable => &self.faults_unreachable,
            FaultClass::Timeout => &self.faults_timeout,
            FaultClass::Other => &self.faults_other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
