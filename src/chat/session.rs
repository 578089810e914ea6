//! Drives a chat session. Validates input, hands queries to the
//! transport and merges replies back into the transcript in the
//! order the queries were submitted.
//!
//! Transport calls run on spawned tasks but never touch the store
//! directly. Each task reports `(sequence, outcome)` over a channel
//! and the controller, owned by a single task, is the only thing
//! that appends to the transcript. That keeps every append relative
//! to the current state of the store and lets later replies wait
//! for earlier ones.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::models::{ChatReply, Message};
use super::store::ConversationStore;
use super::transport::{Transport, TransportError};
use crate::core::AppConfig;

/// Lifecycle of a single submission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangeState {
    Created,
    InFlight,
    Resolved,
    Failed,
    Appended,
}

#[derive(Debug)]
struct Exchange {
    state: ExchangeState,
    handle: Option<JoinHandle<()>>,
    // Bot message waiting for lower numbered exchanges to be appended
    reply: Option<Message>,
}

type Resolution = (u64, Result<ChatReply, TransportError>);

// Aborting the exchange task also cancels the transport call it owns
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct SessionController {
    id: Uuid,
    store: ConversationStore,
    transport: Arc<dyn Transport>,
    error_message: String,
    next_seq: u64,
    last_appended: u64,
    // Ordered by sequence number. Appended exchanges are removed so
    // the first entry is always the next one due.
    exchanges: BTreeMap<u64, Exchange>,
    tx: mpsc::UnboundedSender<Resolution>,
    rx: mpsc::UnboundedReceiver<Resolution>,
    alive: Arc<AtomicBool>,
}

impl SessionController {
    pub fn new(transport: Arc<dyn Transport>, config: &AppConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, "Chat session created");

        Self {
            id,
            store: ConversationStore::new(&config.greeting),
            transport,
            error_message: config.error_message.clone(),
            next_seq: 1,
            last_appended: 0,
            exchanges: BTreeMap::new(),
            tx,
            rx,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &[Message] {
        self.store.snapshot_transcript()
    }

    pub fn pending_input(&self) -> &str {
        self.store.read_pending_input()
    }

    pub fn set_pending_input(&mut self, text: &str) {
        self.store.set_pending_input(text);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Number of exchanges whose bot reply hasn't been appended yet
    pub fn outstanding(&self) -> usize {
        self.exchanges.len()
    }

    /// Returns `None` for sequence numbers that were never issued or
    /// were discarded by `teardown`.
    pub fn exchange_state(&self, seq: u64) -> Option<ExchangeState> {
        if let Some(exchange) = self.exchanges.get(&seq) {
            return Some(exchange.state);
        }
        if seq >= 1 && seq <= self.last_appended {
            return Some(ExchangeState::Appended);
        }
        None
    }

    /// Submit the pending input. Blank input is silently ignored and
    /// returns `None`, as does any submission after `teardown`.
    /// Otherwise the input is cleared, the user turn is appended and
    /// the query is sent in the background. Returns the exchange's
    /// sequence number.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&mut self) -> Option<u64> {
        if !self.is_alive() {
            return None;
        }

        let query = self.store.read_pending_input().trim().to_string();
        if query.is_empty() {
            return None;
        }

        self.store.clear_pending_input();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.store.append(Message::user(&query));

        let mut exchange = Exchange {
            state: ExchangeState::Created,
            handle: None,
            reply: None,
        };
        tracing::debug!(session = %self.id, seq, state = ?exchange.state, "Exchange started");

        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        let alive = Arc::clone(&self.alive);
        let handle = tokio::spawn(async move {
            // Runs on its own task so a panicking transport still
            // resolves the exchange, as a `Task` error
            let mut call = AbortOnDrop(tokio::spawn(async move { transport.send(&query).await }));
            let result = match (&mut call.0).await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => return,
                Err(e) => Err(TransportError::Task(e.to_string())),
            };
            if alive.load(Ordering::SeqCst) {
                // Only fails if the controller is gone, nothing to do
                let _ = tx.send((seq, result));
            }
        });

        exchange.handle = Some(handle);
        exchange.state = ExchangeState::InFlight;
        tracing::debug!(session = %self.id, seq, state = ?exchange.state, "Exchange sent");
        self.exchanges.insert(seq, exchange);

        Some(seq)
    }

    /// Wait for the next outstanding exchange to resolve and merge it
    /// into the transcript. Returns how many bot messages were
    /// appended, which is zero when the reply has to wait for an
    /// earlier exchange. Returns `None` if nothing is outstanding or
    /// the session was torn down.
    pub async fn next_resolution(&mut self) -> Option<usize> {
        if !self.is_alive() || self.exchanges.is_empty() {
            return None;
        }
        let (seq, result) = self.rx.recv().await?;
        Some(self.resolve(seq, result))
    }

    /// Merge every exchange that has already resolved without
    /// waiting. Returns how many bot messages were appended.
    pub fn apply_ready(&mut self) -> usize {
        let mut appended = 0;
        while let Ok((seq, result)) = self.rx.try_recv() {
            appended += self.resolve(seq, result);
        }
        appended
    }

    /// Called when the surface hosting the session goes away.
    /// Outstanding exchanges are cancelled and any reply that still
    /// arrives is dropped without touching the transcript.
    pub fn teardown(&mut self) {
        if !self.alive.swap(false, Ordering::SeqCst) {
            return;
        }
        for exchange in self.exchanges.values_mut() {
            if let Some(handle) = exchange.handle.take() {
                handle.abort();
            }
        }
        tracing::debug!(
            session = %self.id,
            discarded = self.exchanges.len(),
            "Chat session torn down"
        );
        self.exchanges.clear();
    }

    fn resolve(&mut self, seq: u64, result: Result<ChatReply, TransportError>) -> usize {
        if !self.is_alive() {
            return 0;
        }
        let Some(exchange) = self.exchanges.get_mut(&seq) else {
            tracing::warn!(session = %self.id, seq, "Resolution for unknown exchange");
            return 0;
        };

        let reply = match result {
            Ok(reply) => {
                exchange.state = ExchangeState::Resolved;
                Message::bot(&reply.response)
            }
            Err(e) => {
                tracing::error!(session = %self.id, seq, "Chat request failed: {}", e);
                exchange.state = ExchangeState::Failed;
                Message::bot(&self.error_message)
            }
        };
        tracing::debug!(session = %self.id, seq, state = ?exchange.state, "Exchange resolved");
        exchange.reply = Some(reply);
        exchange.handle = None;

        self.flush()
    }

    // Append replies in sequence order, stopping at the first
    // exchange that is still in flight
    fn flush(&mut self) -> usize {
        let mut appended = 0;
        while let Some(entry) = self.exchanges.first_entry() {
            if entry.get().reply.is_none() {
                break;
            }
            let (seq, exchange) = entry.remove_entry();
            if let Some(reply) = exchange.reply {
                self.store.append(reply);
            }
            self.last_appended = seq;
            appended += 1;
            tracing::debug!(session = %self.id, seq, state = ?ExchangeState::Appended, "Exchange appended");
        }
        appended
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}
