use crate::domain::order::OrderId;
use crate::domain::ports::{OutcomeHandlerRef, StatusSourceRef};
use crate::domain::status::PollOutcome;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

/// Delay between two status checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(5000);

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Polling,
    Finished(PollOutcome),
}

/// The repeating status check of one order.
///
/// The session owns its polling task: cancelling or dropping the session
/// aborts the task together with every status fetch still in flight, so no
/// outcome is reported after that point. The first status fetch happens one
/// interval after the start.
pub struct PollSession {
    order_id: OrderId,
    task: JoinHandle<()>,
    state: watch::Receiver<SessionState>,
}

impl PollSession {
    /// Spawns the polling task on the current tokio runtime.
    pub fn start(
        order_id: OrderId,
        source: StatusSourceRef,
        handler: OutcomeHandlerRef,
        interval: Duration,
    ) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        let (state_tx, state) = watch::channel(SessionState::Polling);
        let task = tokio::spawn(poll_until_terminal(
            order_id.clone(),
            source,
            handler,
            interval,
            state_tx,
        ));
        info!(order_id = %order_id, ?interval, "Poll session started");

        Self {
            order_id,
            task,
            state,
        }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// `true` until a terminal status was handled or the session was cancelled.
    pub fn is_active(&self) -> bool {
        self.outcome().is_none() && !self.task.is_finished() && self.state.has_changed().is_ok()
    }

    pub fn outcome(&self) -> Option<PollOutcome> {
        match &*self.state.borrow() {
            SessionState::Finished(outcome) => Some(outcome.clone()),
            SessionState::Polling => None,
        }
    }

    pub fn cancel(&self) {
        if !self.task.is_finished() {
            self.task.abort();
            info!(order_id = %self.order_id, "Poll session cancelled");
        }
    }

    /// Waits for the session to end.
    ///
    /// Returns `None` if the session was cancelled before reaching a terminal status.
    pub async fn wait(&mut self) -> Option<PollOutcome> {
        let state = self
            .state
            .wait_for(|state| matches!(state, SessionState::Finished(_)))
            .await
            .ok()?;
        match &*state {
            SessionState::Finished(outcome) => Some(outcome.clone()),
            SessionState::Polling => None,
        }
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[instrument(name = "poll_session", skip_all, fields(order_id = %order_id))]
async fn poll_until_terminal(
    order_id: OrderId,
    source: StatusSourceRef,
    handler: OutcomeHandlerRef,
    interval: Duration,
    state_tx: watch::Sender<SessionState>,
) {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Fetches are not deduplicated: a slow reply may still be pending when the
    // next tick fires.
    let mut in_flight = JoinSet::new();

    let outcome = loop {
        tokio::select! {
            _ = ticker.tick() => {
                debug!(in_flight = in_flight.len(), "Fetching transaction status");
                let source = Arc::clone(&source);
                let order_id = order_id.clone();
                in_flight.spawn(async move { source.fetch_status(&order_id).await });
            }
            Some(joined) = in_flight.join_next() => {
                match joined {
                    Ok(Ok(status)) => match status.outcome() {
                        Some(outcome) => break outcome,
                        None => debug!("Payment still pending"),
                    },
                    Ok(Err(e)) => warn!(error = %e, "Status fetch failed, skipping tick"),
                    Err(e) => warn!(error = %e, "Status fetch task failed, skipping tick"),
                }
            }
        }
    };

    // Replies that arrive after the terminal one are discarded.
    in_flight.abort_all();

    info!(status = outcome.status_label(), "Terminal transaction status received");
    if let Err(e) = handler.on_outcome(&order_id, outcome.clone()).await {
        error!(error = %e, "Failed to handle poll outcome");
    }
    state_tx.send_replace(SessionState::Finished(outcome));
}

/// Runs at most one poll session at a time for a flow.
///
/// Starting a session cancels the previous one, so two timers never poll
/// side by side.
pub struct StatusPoller {
    source: StatusSourceRef,
    handler: OutcomeHandlerRef,
    interval: Duration,
    current: Option<PollSession>,
}

impl StatusPoller {
    pub fn new(source: StatusSourceRef, handler: OutcomeHandlerRef) -> Self {
        Self {
            source,
            handler,
            interval: POLL_INTERVAL,
            current: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn start(&mut self, order_id: OrderId) -> &mut PollSession {
        self.cancel();
        self.current.insert(PollSession::start(
            order_id,
            Arc::clone(&self.source),
            Arc::clone(&self.handler),
            self.interval,
        ))
    }

    pub fn cancel(&mut self) {
        if let Some(session) = self.current.take() {
            session.cancel();
        }
    }

    pub fn current(&self) -> Option<&PollSession> {
        self.current.as_ref()
    }

    /// Waits for the running session, if any, to end.
    pub async fn wait(&mut self) -> Option<PollOutcome> {
        match self.current.as_mut() {
            Some(session) => session.wait().await,
            None => None,
        }
    }
}
