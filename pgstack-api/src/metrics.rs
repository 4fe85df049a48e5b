use std::{sync::Mutex, time::Duration};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::trace;

/// Interval at which the recorder's upkeep runs to bound memory growth.
const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

// install_recorder registers a global recorder and fails on any later call,
// but the test suites build many applications inside one process. A mutex
// over an Option lets the fallible initialization run exactly once and hand
// out clones of the handle afterwards (OnceLock::get_or_try_init would fit
// better but is unstable).
static PROMETHEUS_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Installs the Prometheus recorder, or returns the already installed handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let mut prometheus_handle = PROMETHEUS_HANDLE.lock().unwrap();

    if let Some(handle) = &*prometheus_handle {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    *prometheus_handle = Some(handle.clone());

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(UPKEEP_INTERVAL).await;
            trace!("running metrics upkeep");
            upkeep_handle.run_upkeep();
        }
    });

    Ok(handle)
}
