//! Periodic element-check polling on a tokio runtime
//!
//! Hosts that cannot push element changes spawn a poller per UI. Every tick asks the host
//! about each declared element check and writes the answers into the model. The task
//! stops once the UI has ended or was destroyed.

use crate::host::HostBridge;
use crate::runtime::Runtime;
use crate::scope::UiHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

pub fn spawn_element_poller<H>(
    runtime: Arc<Mutex<Runtime<H>>>,
    handle: UiHandle,
    period: Duration,
) -> JoinHandle<()>
where
    H: HostBridge + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;
            let mut runtime = runtime.lock().await;
            if runtime.is_ended(handle) {
                debug!(%handle, "UI ended, element poller stopping");
                break;
            }
            if let Err(error) = runtime.poll_element_checks(handle) {
                warn!(%handle, %error, "Element poller stopping");
                break;
            }
        }
    })
}
