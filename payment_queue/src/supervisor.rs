//! Broker connection lifecycle.
//!
//! Each side of the queue (the publisher in the API server, the consumer in the worker) owns its own
//! [`ConnectionSupervisor`], and with it its own connection and channel. Nothing is shared across that boundary.
//!
//! When the broker reports an error on the connection, the supervisor's closed signal fires. The stale handles are
//! never used again: the next call to [`ConnectionSupervisor::channel`] discards them and connects afresh.
use std::{cmp::min, time::Duration};

use lapin::{
    options::{BasicQosOptions, ConfirmSelectOptions, QueueDeclareOptions},
    types::FieldTable,
    Channel,
    Connection,
    ConnectionProperties,
};
use log::*;
use tokio::sync::watch;

use crate::{
    config::{BROKER_TIMEOUT, QUEUE_NAME},
    errors::QueueError,
};

//--------------------------------------   ReconnectPolicy   ----------------------------------------------------------
/// Bounded, linearly increasing backoff. The delay after attempt `n` is `n × step`, capped at `cap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    step: Duration,
    cap: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, step: Duration::from_secs(5), cap: Duration::from_secs(30) }
    }
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, step: Duration, cap: Duration) -> Self {
        Self { max_attempts, step, cap }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The delay to wait after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        min(self.step.saturating_mul(attempt), self.cap)
    }
}

//--------------------------------------   SupervisorState   ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Disconnected,
    Connecting,
    Ready,
}

struct Link {
    connection: Connection,
    channel: Channel,
    closed: watch::Receiver<bool>,
}

impl Link {
    fn is_healthy(&self) -> bool {
        !*self.closed.borrow() && self.connection.status().connected() && self.channel.status().connected()
    }
}

enum LinkState {
    Disconnected,
    Connecting,
    Ready(Link),
}

//--------------------------------------  ConnectionSupervisor  -------------------------------------------------------
pub struct ConnectionSupervisor {
    url: String,
    role: &'static str,
    prefetch: Option<u16>,
    confirms: bool,
    policy: ReconnectPolicy,
    link: LinkState,
}

impl ConnectionSupervisor {
    /// A new, disconnected supervisor. `role` only appears in log messages.
    pub fn new(url: &str, role: &'static str) -> Self {
        Self {
            url: url.to_string(),
            role,
            prefetch: None,
            confirms: false,
            policy: ReconnectPolicy::default(),
            link: LinkState::Disconnected,
        }
    }

    /// Limit the number of unacknowledged deliveries on the channel.
    pub fn with_prefetch(mut self, prefetch: u16) -> Self {
        self.prefetch = Some(prefetch);
        self
    }

    /// Put the channel in confirm mode, so that every publish is acknowledged by the broker.
    pub fn with_confirms(mut self) -> Self {
        self.confirms = true;
        self
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn state(&self) -> SupervisorState {
        match self.link {
            LinkState::Disconnected => SupervisorState::Disconnected,
            LinkState::Connecting => SupervisorState::Connecting,
            LinkState::Ready(_) => SupervisorState::Ready,
        }
    }

    /// True if a connection is open and the broker has not reported a problem with it.
    pub fn is_healthy(&self) -> bool {
        matches!(&self.link, LinkState::Ready(link) if link.is_healthy())
    }

    /// A receiver that flips to `true` when the broker reports an error on the current connection.
    pub fn closed_signal(&self) -> Option<watch::Receiver<bool>> {
        match &self.link {
            LinkState::Ready(link) => Some(link.closed.clone()),
            _ => None,
        }
    }

    /// Makes a single attempt to open a connection and channel, and declares the durable webhook queue.
    /// Any existing connection is discarded first.
    pub async fn connect(&mut self) -> Result<(), QueueError> {
        self.invalidate();
        self.link = LinkState::Connecting;
        let opened = tokio::time::timeout(BROKER_TIMEOUT, self.open_link())
            .await
            .unwrap_or_else(|_| Err(QueueError::Timeout(BROKER_TIMEOUT)));
        match opened {
            Ok(link) => {
                info!("🔌️ [{}] Connected to the message broker", self.role);
                self.link = LinkState::Ready(link);
                Ok(())
            },
            Err(e) => {
                self.link = LinkState::Disconnected;
                Err(e)
            },
        }
    }

    /// Calls [`Self::connect`] until it succeeds, waiting between attempts as dictated by the reconnect policy.
    /// Returns [`QueueError::RetriesExhausted`] once the attempt budget is spent.
    pub async fn connect_with_retry(&mut self) -> Result<(), QueueError> {
        let max = self.policy.max_attempts();
        for attempt in 1..=max {
            info!("🔌️ [{}] Connecting to the message broker (attempt {attempt}/{max})", self.role);
            match self.connect().await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < max => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "🔌️ [{}] Connection attempt {attempt}/{max} failed. {e}. Retrying in {}ms",
                        self.role,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                },
                Err(e) => {
                    error!("🔌️ [{}] Connection attempt {attempt}/{max} failed. {e}. Giving up.", self.role);
                },
            }
        }
        Err(QueueError::RetriesExhausted(max))
    }

    /// Returns the current channel, connecting first if there is no healthy connection.
    pub async fn channel(&mut self) -> Result<Channel, QueueError> {
        if !self.is_healthy() {
            self.connect().await?;
        }
        match &self.link {
            LinkState::Ready(link) => Ok(link.channel.clone()),
            _ => Err(QueueError::NotConnected),
        }
    }

    /// Forgets the current connection without trying to close it. The next operation will reconnect.
    pub fn invalidate(&mut self) {
        if matches!(self.link, LinkState::Ready(_)) {
            debug!("🔌️ [{}] Discarding broker connection", self.role);
        }
        self.link = LinkState::Disconnected;
    }

    /// Closes the channel and connection cleanly, if they are open.
    pub async fn close(&mut self) {
        if let LinkState::Ready(link) = std::mem::replace(&mut self.link, LinkState::Disconnected) {
            if let Err(e) = link.channel.close(200, "Closing".into()).await {
                debug!("🔌️ [{}] Error closing channel. {e}", self.role);
            }
            if let Err(e) = link.connection.close(200, "Closing".into()).await {
                debug!("🔌️ [{}] Error closing connection. {e}", self.role);
            }
            info!("🔌️ [{}] Broker connection closed", self.role);
        }
    }

    async fn open_link(&self) -> Result<Link, QueueError> {
        let connection = Connection::connect(&self.url, ConnectionProperties::default()).await?;
        let (tx, closed) = watch::channel(false);
        let role = self.role;
        connection.on_error(move |e| {
            error!("🔌️ [{role}] Broker connection error. {e}");
            let _ = tx.send(true);
        });
        let channel = connection.create_channel().await?;
        if self.confirms {
            channel.confirm_select(ConfirmSelectOptions::default()).await?;
        }
        if let Some(prefetch) = self.prefetch {
            channel.basic_qos(prefetch, BasicQosOptions::default()).await?;
        }
        channel
            .queue_declare(QUEUE_NAME, QueueDeclareOptions { durable: true, ..Default::default() }, FieldTable::default())
            .await?;
        debug!("🔌️ [{}] Declared durable queue {QUEUE_NAME}", self.role);
        Ok(Link { connection, channel, closed })
    }
}
