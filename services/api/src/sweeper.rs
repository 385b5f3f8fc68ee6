//! Background status sweeper
//!
//! Event statuses are time-driven: UPCOMING becomes ONGOING at start_time,
//! ONGOING becomes ENDED at end_time. Nothing on the request path performs
//! these transitions, so a background task sweeps them periodically.

use std::time::Duration;

use tracing::{error, info};

use crate::repositories::EventRepository;

/// How often the sweeper runs
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn the sweeper task; it runs for the life of the process
pub fn spawn(event_repository: EventRepository) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);

        loop {
            interval.tick().await;

            match event_repository.sweep_statuses().await {
                Ok((0, 0)) => {}
                Ok((started, ended)) => {
                    info!(started, ended, "swept event statuses");
                }
                Err(e) => error!(error = %e, "status sweep failed"),
            }
        }
    })
}
