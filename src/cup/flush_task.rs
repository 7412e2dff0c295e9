use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, instrument};

use super::service::CupService;

/// Starts a background task that fires the service's tick on a timer, for
/// host bindings that don't forward a timer event of their own.
///
/// The service throttles itself, so a driver ticking faster than the
/// configured flush interval is harmless.
#[instrument(skip(service))]
pub async fn start_flush_task(service: Arc<CupService>, period: Duration) {
    info!(
        period_secs = period.as_secs(),
        "Starting cup flush background task"
    );

    let mut tick_interval = interval(period);

    loop {
        tick_interval.tick().await;

        if let Err(e) = service.handle_tick(chrono::Utc::now()).await {
            error!(error = %e, "Cup flush tick failed");
        }
    }
}
