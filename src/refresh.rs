//! Periodic refresh of the prediction view.
//!
//! The refresh loop belongs to a mounted [`PredictionSession`] and stops
//! when the session is unmounted or dropped. Each tick starts its own load,
//! so a slow or failed fetch never holds back the next tick.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::{
    api::DashboardApiClient,
    model::RangePreset,
    prediction::{PredictionView, ViewError},
    sequence::{LoadOutcome, LoadTicket},
    traits::Notifier,
};

pub const DEFAULT_PREDICTION_REFRESH: Duration = Duration::from_secs(300);

/// Handle to a running periodic task. Cancelling or dropping it stops the
/// loop; loads that already started run to completion.
pub struct RefreshHandle {
    cancel: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct PeriodicRefresh;

impl PeriodicRefresh {
    /// Run `task` every `period`, starting one period from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, Fut>(period: Duration, mut task: F) -> RefreshHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        // tokio panics on a zero period
        let period = period.max(Duration::from_millis(1));
        let (cancel, mut cancelled) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        tracing::debug!("Periodic refresh tick");
                        tokio::spawn(task());
                    }
                    changed = cancelled.changed() => {
                        if changed.is_err() || *cancelled.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Periodic refresh stopped");
        });

        RefreshHandle { cancel, join }
    }
}

// ==================== Prediction Session ====================

/// A mounted prediction view: shared view state, its data source and the
/// refresh loop that keeps it current.
pub struct PredictionSession {
    view: Arc<Mutex<PredictionView>>,
    api: DashboardApiClient,
    notifier: Arc<dyn Notifier>,
    updates: Arc<watch::Sender<u64>>,
    refresh: Option<RefreshHandle>,
}

async fn complete_load(
    view: &Mutex<PredictionView>,
    api: &DashboardApiClient,
    notifier: &dyn Notifier,
    updates: &watch::Sender<u64>,
    ticket: LoadTicket,
    preset: RangePreset,
) -> LoadOutcome {
    // The lock is not held across the fetch so loads can overlap
    let result = api.fetch_predictions(&preset).await;
    let outcome = view.lock().await.finish(ticket, result, notifier);
    updates.send_modify(|n| *n += 1);
    outcome
}

async fn reload(
    view: Arc<Mutex<PredictionView>>,
    api: DashboardApiClient,
    notifier: Arc<dyn Notifier>,
    updates: Arc<watch::Sender<u64>>,
) -> LoadOutcome {
    let (ticket, preset) = view.lock().await.begin_load();
    complete_load(&view, &api, notifier.as_ref(), &updates, ticket, preset).await
}

impl PredictionSession {
    /// Load the active preset once, then refresh it every `period` until
    /// unmounted.
    pub async fn mount(
        view: PredictionView,
        api: DashboardApiClient,
        notifier: Arc<dyn Notifier>,
        period: Duration,
    ) -> Self {
        let (updates, _) = watch::channel(0);
        let mut session = Self {
            view: Arc::new(Mutex::new(view)),
            api,
            notifier,
            updates: Arc::new(updates),
            refresh: None,
        };

        session.refresh_now().await;

        let (view, api, notifier, updates) = (
            session.view.clone(),
            session.api.clone(),
            session.notifier.clone(),
            session.updates.clone(),
        );
        session.refresh = Some(PeriodicRefresh::spawn(period, move || {
            let fut = reload(view.clone(), api.clone(), notifier.clone(), updates.clone());
            async move {
                fut.await;
            }
        }));
        tracing::info!("Prediction view mounted, refreshing every {:?}", period);

        session
    }

    pub fn view(&self) -> Arc<Mutex<PredictionView>> {
        self.view.clone()
    }

    /// Receiver bumped after every completed load, applied or not.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    pub async fn refresh_now(&self) -> LoadOutcome {
        reload(
            self.view.clone(),
            self.api.clone(),
            self.notifier.clone(),
            self.updates.clone(),
        )
        .await
    }

    /// Make `name` the active preset and load it immediately.
    pub async fn switch_preset(&self, name: &str) -> Result<LoadOutcome, ViewError> {
        let (ticket, preset) = self.view.lock().await.select_preset(name)?;
        Ok(complete_load(
            &self.view,
            &self.api,
            self.notifier.as_ref(),
            &self.updates,
            ticket,
            preset,
        )
        .await)
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.as_ref().is_some_and(|r| !r.is_finished())
    }

    /// Stop the refresh loop.
    pub fn unmount(&mut self) {
        if let Some(handle) = self.refresh.take() {
            handle.cancel();
            tracing::info!("Prediction view unmounted");
        }
    }
}

impl Drop for PredictionSession {
    fn drop(&mut self) {
        self.unmount();
    }
}
