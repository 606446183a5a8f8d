//! Periodic reconciliation of the exposed frame from the stream source.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::state::RelayState;
use crate::source::ConsumeOutcome;

/// Run the refresh scheduler until shutdown.
pub(crate) async fn run(state: Arc<RelayState>, period: Duration, shutdown: CancellationToken) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!("Refresh scheduler started ({:?} per tick)", period);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => tick(&state),
        }
    }

    debug!("Refresh scheduler stopped");
}

/// One refresh tick.
///
/// Consume the source under its mutex, install the blank frame outside the
/// mutex when the producer went offline, then fan out. While the producer
/// is online and idle nothing is pushed (clients would only see duplicate
/// frames); while it is offline the blank frame keeps flowing so clients
/// see "no signal" rather than a stalled connection.
pub(crate) fn tick(state: &RelayState) {
    let outcome = {
        let mut exposed = state.exposed().write();
        state.source().try_consume(&mut exposed)
    };

    match outcome {
        ConsumeOutcome::Fresh => {}
        ConsumeOutcome::Offline => state.exposed().write().set_blank(),
        ConsumeOutcome::Unchanged => {
            if state.exposed().read().online() {
                return;
            }
        }
    }

    let exposed = state.exposed().read();
    state.registry().lock().fan_out(&exposed);
}
