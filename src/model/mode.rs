use chrono::{DateTime, Local, TimeDelta};

use crate::panel::Panel;

/// One independent visual behaviour that can own the panel.
///
/// Construction is the one-time setup; no panel exists yet at that point.
/// Every hook that draws receives the panel as a borrow for the duration of
/// the call, so a mode cannot hold on to it after `deactivate`.
pub trait Mode {
    /// Unique registry name, also the command verb that selects the mode.
    fn name(&self) -> &'static str;

    /// How often `background_job` should run; `None` disables it.
    fn poll_interval(&self) -> Option<TimeDelta> {
        None
    }

    /// Foregrounded: allocate off-screen buffers and reset timers.
    fn activate(&mut self, _panel: &mut dyn Panel, _now: DateTime<Local>) {}

    /// Leaving the foreground: drop anything tied to the panel. The panel
    /// itself is cleared by the caller afterwards.
    fn deactivate(&mut self) {}

    /// Mode-specific verbs. The return value only reports whether the verb
    /// was recognised; unknown verbs are accepted as no-ops.
    fn handle_command(&mut self, _panel: &mut dyn Panel, _args: &[String]) -> bool {
        true
    }

    /// Called every idle tick while foregrounded. Must self-gate and return
    /// quickly.
    fn iterate(&mut self, _panel: &mut dyn Panel, _now: DateTime<Local>) {}

    /// Slow-path work; failures are logged by the mode, never returned.
    fn background_job(&mut self, _now: DateTime<Local>) {}
}

/// Tracks when a mode's background job last ran.
#[derive(Debug, Clone, Default)]
pub struct BackgroundPoll {
    interval: Option<TimeDelta>,
    last: Option<DateTime<Local>>,
}

impl BackgroundPoll {
    pub fn new(interval: Option<TimeDelta>) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// True (and records `now`) on the first call and whenever the interval
    /// has fully elapsed since the last firing.
    pub fn due(&mut self, now: DateTime<Local>) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };

        let fire = match self.last {
            None => true,
            Some(last) => now - last >= interval,
        };
        if fire {
            self.last = Some(now);
        }
        fire
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<DateTime<Local>> {
        self.last
    }
}

/// A registered mode plus the scheduler's bookkeeping for it.
pub struct ModeSlot {
    pub mode: Box<dyn Mode>,
    poll: BackgroundPoll,
}

impl ModeSlot {
    pub fn new(mode: Box<dyn Mode>) -> Self {
        let poll = BackgroundPoll::new(mode.poll_interval());
        Self { mode, poll }
    }

    pub fn name(&self) -> &'static str {
        self.mode.name()
    }

    pub fn activate(&mut self, panel: &mut dyn Panel, now: DateTime<Local>) {
        tracing::info!(mode = self.name(), "activating mode");
        self.mode.activate(panel, now);
    }

    pub fn deactivate(&mut self, panel: &mut dyn Panel) {
        tracing::info!(mode = self.name(), "deactivating mode");
        self.mode.deactivate();
        if let Err(err) = panel.clear() {
            tracing::warn!(mode = self.name(), "failed to clear panel: {err}");
        }
    }

    pub fn background_poll(&mut self, now: DateTime<Local>) {
        if self.poll.due(now) {
            tracing::debug!(mode = self.name(), "running background job");
            self.mode.background_job(now);
        }
    }
}
