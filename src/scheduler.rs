use crate::engine::StreakEngine;
use chrono::{DateTime, Local, NaiveTime};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::error;

// Runs the rollover once at startup to catch a missed midnight, then
// again at each local midnight.
pub fn spawn_daily_rollover(engine: Arc<StreakEngine>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(err) = engine.daily_rollover().await {
                error!("daily rollover failed: {err}");
            }
            tokio::time::sleep(until_next_midnight(Local::now())).await;
        }
    })
}

fn until_next_midnight(now: DateTime<Local>) -> Duration {
    let next_midnight = now.date_naive().succ_opt().and_then(|date| {
        date.and_time(NaiveTime::MIN)
            .and_local_timezone(Local)
            .earliest()
    });
    match next_midnight {
        Some(at) => (at - now).to_std().unwrap_or(Duration::from_secs(1)),
        None => Duration::from_secs(24 * 60 * 60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_lands_within_a_day() {
        let pause = until_next_midnight(Local::now());
        assert!(pause > Duration::ZERO);
        assert!(pause <= Duration::from_secs(25 * 60 * 60));
    }
}
