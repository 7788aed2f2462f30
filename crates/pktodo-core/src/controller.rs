use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::cache::TaskCache;
use crate::config::Config;
use crate::gateway::RemoteStore;
use crate::mutations::{Completion, Draft, Outcome, Rejection, Request};
use crate::tabs::Tab;
use crate::view::{FormTracker, FormVisibility, Gate, PinGate, UnlockResult};

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub pin: String,
    pub form_threshold: f64,
    pub form_hysteresis: f64,
    pub keep_draft_on_failure: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ControllerSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            pin: cfg.gate.pin.clone(),
            form_threshold: cfg.view.form_threshold,
            form_hysteresis: cfg.view.form_hysteresis,
            keep_draft_on_failure: cfg.form.keep_draft_on_failure,
        }
    }
}

/// Everything a screen needs to draw. Only the [`Controller`] changes it.
#[derive(Debug, Clone)]
pub struct AppState {
    gate: PinGate,
    active_tab: Tab,
    cache: TaskCache,
    draft: Draft,
    form: FormTracker,
}

impl AppState {
    fn new(settings: &ControllerSettings) -> Self {
        Self {
            gate: PinGate::new(settings.pin.clone()),
            active_tab: Tab::DEFAULT,
            cache: TaskCache::default(),
            draft: Draft::default(),
            form: FormTracker::new(settings.form_threshold, settings.form_hysteresis),
        }
    }

    pub fn gate(&self) -> Gate {
        self.gate.state()
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn cache(&self) -> &TaskCache {
        &self.cache
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn form_visibility(&self) -> FormVisibility {
        self.form.visibility()
    }

    pub fn scroll_offset(&self) -> f64 {
        self.form.offset()
    }

    pub fn pending_count(&self) -> usize {
        self.cache.pending_count()
    }

    pub fn is_overdue(&self, id: i64, now: DateTime<Utc>) -> bool {
        self.cache.get(id).is_some_and(|record| record.is_overdue(now))
    }
}

/// Owns the state and the store handle; every transition goes through here.
#[derive(Debug)]
pub struct Controller<S> {
    store: S,
    state: AppState,
    keep_draft_on_failure: bool,
}

impl<S: RemoteStore> Controller<S> {
    pub fn new(store: S, settings: ControllerSettings) -> Self {
        Self {
            state: AppState::new(&settings),
            store,
            keep_draft_on_failure: settings.keep_draft_on_failure,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Form inputs are free-form until submitted.
    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.state.draft
    }

    /// Opening the gate lands on the default tab with a fresh fetch.
    #[instrument(skip(self, pin))]
    pub async fn unlock(&mut self, pin: &str) -> UnlockResult {
        let result = self.state.gate.try_unlock(pin);
        if result == UnlockResult::Opened {
            self.select_tab(Tab::DEFAULT).await;
        }
        result
    }

    /// Switches the view, scrolls to the top, shows the form and refetches.
    /// A failed fetch keeps the previous records on screen.
    #[instrument(skip_all, fields(tab = %tab))]
    pub async fn select_tab(&mut self, tab: Tab) -> Outcome {
        if !self.state.gate.is_unlocked() {
            return Outcome::Rejected(Rejection::Locked);
        }

        self.state.active_tab = tab;
        self.state.form.reset();

        match self.store.list(&tab.query()).await {
            Ok(records) => {
                info!(count = records.len(), "fetched tab");
                self.state.cache.replace(records);
                Outcome::Applied
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "fetch failed; keeping stale records");
                Outcome::RemoteFailed
            }
        }
    }

    pub async fn go_home(&mut self) -> Outcome {
        self.select_tab(Tab::Home).await
    }

    pub async fn refresh(&mut self) -> Outcome {
        self.select_tab(self.state.active_tab).await
    }

    pub fn on_scroll(&mut self, offset: f64) -> FormVisibility {
        self.state.form.on_scroll(offset)
    }

    pub fn begin_create(&self) -> Result<Request, Rejection> {
        self.ensure_unlocked()?;
        Request::create(&self.state.draft)
    }

    pub fn begin_toggle(&self, id: i64) -> Result<Request, Rejection> {
        self.ensure_unlocked()?;
        Request::toggle(&self.state.cache, id)
    }

    pub fn begin_delete(&self, id: i64) -> Result<Request, Rejection> {
        self.ensure_unlocked()?;
        Request::delete(&self.state.cache, id)
    }

    /// Settles a completed request against the current state.
    pub fn apply(&mut self, completion: Completion) -> Outcome {
        let is_create = matches!(completion, Completion::Created(_));
        let outcome = completion.apply_to(&mut self.state.cache);

        // A failed insert still clears the form unless configured otherwise.
        if is_create && (outcome.is_applied() || !self.keep_draft_on_failure) {
            self.state.draft.clear();
        }
        outcome
    }

    pub async fn create(&mut self) -> Outcome {
        self.run(self.begin_create()).await
    }

    pub async fn toggle(&mut self, id: i64) -> Outcome {
        self.run(self.begin_toggle(id)).await
    }

    pub async fn delete(&mut self, id: i64) -> Outcome {
        self.run(self.begin_delete(id)).await
    }

    async fn run(&mut self, request: Result<Request, Rejection>) -> Outcome {
        let request = match request {
            Ok(request) => request,
            Err(rejection) => return Outcome::Rejected(rejection),
        };
        let completion = request.send(&self.store).await;
        self.apply(completion)
    }

    fn ensure_unlocked(&self) -> Result<(), Rejection> {
        if self.state.gate.is_unlocked() {
            Ok(())
        } else {
            Err(Rejection::Locked)
        }
    }
}
