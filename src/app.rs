use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::model::clock::Clock;
use crate::model::registry::ModeRegistry;
use crate::msg::{Args, Command, Direction, Msg};
use crate::panel::Panel;
use crate::queue::{CommandSource, TransportError};

/// Loop timing knobs.
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    /// Idle sleep between ticks while the queue is empty.
    pub tick_interval: Duration,
    /// Pause before reconnecting after a transport failure.
    pub retry_cooldown: Duration,
}

/// The scheduler: owns the registry, the panel and the command source, and
/// decides which mode is in the foreground.
///
/// Mode state lives here rather than in the loop, so restarting the loop
/// after a transport failure keeps the active mode and its timers.
pub struct App<Q> {
    registry: ModeRegistry,
    current: Option<usize>,
    panel: Box<dyn Panel>,
    queue: Q,
    clock: Box<dyn Clock>,
    settings: LoopSettings,
}

impl<Q: CommandSource> App<Q> {
    pub fn new(
        registry: ModeRegistry,
        panel: Box<dyn Panel>,
        queue: Q,
        clock: Box<dyn Clock>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            registry,
            current: None,
            panel,
            queue,
            clock,
            settings,
        }
    }

    #[cfg(test)]
    pub fn current_mode_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_mode_name(&self) -> Option<&'static str> {
        self.current
            .and_then(|idx| self.registry.get(idx))
            .map(|slot| slot.name())
    }

    #[cfg(test)]
    pub fn queue_mut(&mut self) -> &mut Q {
        &mut self.queue
    }

    // ── Mode switching ───────────────────────────────────────────

    /// Deactivate whatever is foregrounded, then foreground `index` and,
    /// if given, hand it `args` straight away.
    pub fn switch_mode(&mut self, index: Option<usize>, args: Option<&[String]>) {
        if let Some(idx) = index {
            if idx >= self.registry.len() {
                tracing::warn!("ignoring switch to unknown mode index {idx}");
                return;
            }
        }

        if let Some(old) = self.current.take() {
            if let Some(slot) = self.registry.get_mut(old) {
                slot.deactivate(self.panel.as_mut());
            }
        }

        self.current = index;
        let Some(idx) = index else {
            tracing::info!("no mode active");
            return;
        };

        let now = self.clock.now();
        if let Some(slot) = self.registry.get_mut(idx) {
            slot.activate(self.panel.as_mut(), now);
            if let Some(args) = args {
                slot.mode.handle_command(self.panel.as_mut(), args);
            }
        }
    }

    /// Step to the neighbouring mode, wrapping. From no mode, forward starts
    /// at the first and backward at the last.
    pub fn cycle_mode(&mut self, direction: Direction) {
        if self.registry.is_empty() {
            return;
        }
        let count = self.registry.len();

        let next = match self.current {
            None => match direction {
                Direction::Forward => 0,
                Direction::Backward => count - 1,
            },
            Some(idx) => (idx as isize + direction.step()).rem_euclid(count as isize) as usize,
        };
        self.switch_mode(Some(next), None);
    }

    // ── Commands ─────────────────────────────────────────────────

    pub fn resolve(&self, command: Command) -> Msg {
        let Command { verb, args } = command;
        match verb.as_str() {
            "next_mode" => return Msg::CycleMode(Direction::Forward),
            "prev_mode" => return Msg::CycleMode(Direction::Backward),
            "off" | "clear" => return Msg::SwitchOff,
            _ => {}
        }

        if let Some(active) = self.current_mode_name() {
            if verb == active || verb == "mode" {
                return Msg::CommandActive(args);
            }
        }

        match self.registry.index_of(&verb) {
            Some(index) => Msg::SwitchTo { index, args },
            None => Msg::Unknown(verb),
        }
    }

    pub fn update(&mut self, msg: Msg) {
        match msg {
            Msg::CycleMode(direction) => self.cycle_mode(direction),
            Msg::SwitchOff => {
                if self.current.is_some() {
                    self.switch_mode(None, None);
                }
            }
            Msg::CommandActive(args) => self.command_active(&args),
            Msg::SwitchTo { index, args } => self.switch_mode(Some(index), Some(args.as_slice())),
            Msg::Unknown(verb) => tracing::warn!("unknown command {verb:?}"),
        }
    }

    /// Parse, route and fully handle one command line.
    pub fn dispatch(&mut self, line: &str) {
        let Some(command) = Command::parse(line) else {
            tracing::debug!("ignoring blank command");
            return;
        };
        tracing::info!(verb = %command.verb, args = ?command.args, "got command");
        let msg = self.resolve(command);
        self.update(msg);
    }

    fn command_active(&mut self, args: &Args) {
        let Some(slot) = self.current.and_then(|idx| self.registry.get_mut(idx)) else {
            return;
        };
        if !slot.mode.handle_command(self.panel.as_mut(), args) {
            tracing::debug!(mode = slot.name(), "command not handled");
        }
    }

    // ── Loop ─────────────────────────────────────────────────────

    /// One idle pass: refresh the foreground mode, then give every mode a
    /// chance to run its background job.
    pub fn tick(&mut self) {
        let now = self.clock.now();

        if let Some(slot) = self.current.and_then(|idx| self.registry.get_mut(idx)) {
            slot.mode.iterate(self.panel.as_mut(), now);
        }

        for slot in self.registry.iter_mut() {
            slot.background_poll(now);
        }
    }

    /// Either tick and sleep (queue empty) or handle exactly one command.
    pub fn step(&mut self) -> Result<(), TransportError> {
        if self.queue.is_empty()? {
            self.tick();
            thread::sleep(self.settings.tick_interval);
            return Ok(());
        }

        let line = self.queue.pop()?;
        self.dispatch(&line);
        Ok(())
    }

    fn main_loop(&mut self, keep_going: &mut impl FnMut() -> bool) -> Result<(), TransportError> {
        while keep_going() {
            self.step()?;
        }
        Ok(())
    }

    /// Run the loop, restarting it after a cooldown whenever the command
    /// source fails, until `keep_going` says stop.
    pub fn supervise(&mut self, mut keep_going: impl FnMut() -> bool) {
        loop {
            match self.main_loop(&mut keep_going) {
                Ok(()) => return,
                Err(err) => {
                    tracing::error!("command queue error: {err}");
                    tracing::info!(
                        "retrying in {:.1}s",
                        self.settings.retry_cooldown.as_secs_f32()
                    );
                    thread::sleep(self.settings.retry_cooldown);
                }
            }
        }
    }

    /// Serve commands until `stop` is set.
    pub fn run(&mut self, stop: &AtomicBool) {
        tracing::info!(modes = ?self.registry.names(), "service loop starting");
        self.supervise(|| !stop.load(Ordering::Relaxed));
        tracing::info!("service loop stopped");
    }
}
