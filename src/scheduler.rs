// ABOUTME: In-process hourly ticker running the butler's scheduled tasks
// ABOUTME: Wakes shortly after the top of every hour and runs whatever is due then

use chrono::{DateTime, Duration as ChronoDuration, DurationRound, Utc};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::butler::Butler;

const HOUR: StdDuration = StdDuration::from_secs(3600);

/// Slack after the hour so the tick never lands in the previous hour bucket
const GRACE: StdDuration = StdDuration::from_secs(5);

/// Time left until the next top of the hour, plus a small grace period.
pub fn until_next_hour(now: DateTime<Utc>) -> StdDuration {
    let hour = ChronoDuration::hours(1);
    let next = now
        .duration_trunc(hour)
        .map(|start| start + hour)
        .unwrap_or(now + hour);
    (next - now).to_std().unwrap_or(HOUR) + GRACE
}

/// Start the background ticker. Runs forever; spawn it.
pub async fn start_ticker(butler: Arc<Butler>) {
    let first = until_next_hour(Utc::now());
    tracing::info!(
        first_tick_in_secs = first.as_secs(),
        tasks = butler.scheduler().tasks().len(),
        "Starting hourly scheduler ticker"
    );

    let mut ticker = interval_at(Instant::now() + first, HOUR);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let runs = butler.run_scheduled_tasks(Utc::now()).await;
        if !runs.is_empty() {
            tracing::info!(count = runs.len(), "Scheduled tasks executed");
        }
    }
}
