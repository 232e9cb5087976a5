//! Mock hardware for host-side tests and simulators.
//!
//! [`MockGpio`] scripts pin levels and dispatches interrupt handlers
//! according to each pin's edge policy; [`MockTimerService`] runs a manual
//! virtual clock whose [`advance`](MockTimerService::advance) executes due
//! expiry callbacks sequentially, honoring re-arms within the advanced span.
//! Together they let debounce timelines run deterministically without
//! hardware.
//!
//! Both types are cheap `Clone` handles over shared state, so a test can
//! keep one handle while the module owns another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use core::time::Duration;

use embedded_hal::digital::PinState;

use crate::config::{EdgePolicy, Pin, PullMode};
use crate::interface::{
    ButtonGpio, InterruptHandler, OneShotTimer, PinDirection, TimerCallback, TimerService,
};

/// Error produced by [`MockGpio`], only through injected failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockGpioError;

/// Error produced by [`MockTimerService`] and [`MockTimer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockTimerError;

type SharedHandler = Arc<Mutex<InterruptHandler>>;

#[derive(Default)]
struct PinRecord {
    /// Electrical level; true is high. Survives a pin reset, since the line
    /// itself is external to the chip.
    high: bool,
    direction: Option<PinDirection>,
    pull: Option<PullMode>,
    edge_policy: EdgePolicy,
    handler: Option<SharedHandler>,
}

struct GpioState {
    pins: HashMap<u8, PinRecord>,
    max_pin: u8,
    interrupt_service: bool,
    fail_next: bool,
}

/// GPIO driver over scripted pin levels.
#[derive(Clone)]
pub struct MockGpio {
    state: Arc<Mutex<GpioState>>,
}

impl MockGpio {
    /// A fake chip exposing pins 0..=48.
    pub fn new() -> Self {
        Self::with_max_pin(48)
    }

    /// A fake chip whose highest pin number is `max_pin`.
    pub fn with_max_pin(max_pin: u8) -> Self {
        Self {
            state: Arc::new(Mutex::new(GpioState {
                pins: HashMap::new(),
                max_pin,
                interrupt_service: false,
                fail_next: false,
            })),
        }
    }

    /// Make the next driver call fail with [`MockGpioError`].
    pub fn fail_next_call(&self) {
        self.lock().fail_next = true;
    }

    /// Drive the electrical level of a pin. When the transition matches the
    /// pin's edge policy and the interrupt service is installed, the pin's
    /// handler runs before this returns, like a hardware interrupt would.
    pub fn drive_level(&self, pin: Pin, level: PinState) {
        let fired = {
            let mut state = self.lock();
            let service = state.interrupt_service;
            let record = state.pins.entry(pin.number()).or_default();
            let was_high = record.high;
            let is_high = level == PinState::High;
            record.high = is_high;

            let triggers = match record.edge_policy {
                EdgePolicy::Disabled => false,
                EdgePolicy::Rising => is_high,
                EdgePolicy::Falling => !is_high,
                EdgePolicy::Any => true,
            };

            if service && was_high != is_high && triggers {
                record.handler.clone()
            } else {
                None
            }
        };

        // The handler reads levels and arms timers itself, so it must run
        // with the driver lock released.
        if let Some(handler) = fired {
            if let Ok(mut handler) = handler.lock() {
                handler();
            }
        }
    }

    /// Current scripted level of a pin.
    pub fn level(&self, pin: Pin) -> PinState {
        if self.lock().pins.get(&pin.number()).is_some_and(|r| r.high) {
            PinState::High
        } else {
            PinState::Low
        }
    }

    /// Edge policy currently programmed on a pin.
    pub fn edge_policy(&self, pin: Pin) -> EdgePolicy {
        self.lock()
            .pins
            .get(&pin.number())
            .map(|record| record.edge_policy)
            .unwrap_or_default()
    }

    /// Pull mode currently programmed on a pin, if any.
    pub fn pull_mode(&self, pin: Pin) -> Option<PullMode> {
        self.lock()
            .pins
            .get(&pin.number())
            .and_then(|record| record.pull)
    }

    /// Whether the interrupt-dispatch service has been installed.
    pub fn interrupt_service_installed(&self) -> bool {
        self.lock().interrupt_service
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GpioState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn guarded(&self) -> Result<std::sync::MutexGuard<'_, GpioState>, MockGpioError> {
        let mut state = self.lock();
        if state.fail_next {
            state.fail_next = false;
            return Err(MockGpioError);
        }
        Ok(state)
    }
}

impl Default for MockGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonGpio for MockGpio {
    type Error = MockGpioError;

    fn is_valid_pin(&self, pin: Pin) -> bool {
        pin.number() <= self.lock().max_pin
    }

    fn reset(&self, pin: Pin) -> Result<(), Self::Error> {
        let mut state = self.guarded()?;
        let record = state.pins.entry(pin.number()).or_default();
        record.direction = None;
        record.pull = None;
        record.edge_policy = EdgePolicy::Disabled;
        Ok(())
    }

    fn set_direction(&self, pin: Pin, direction: PinDirection) -> Result<(), Self::Error> {
        let mut state = self.guarded()?;
        state.pins.entry(pin.number()).or_default().direction = Some(direction);
        Ok(())
    }

    fn set_pull_mode(&self, pin: Pin, mode: PullMode) -> Result<(), Self::Error> {
        let mut state = self.guarded()?;
        state.pins.entry(pin.number()).or_default().pull = Some(mode);
        Ok(())
    }

    fn set_edge_policy(&self, pin: Pin, policy: EdgePolicy) -> Result<(), Self::Error> {
        let mut state = self.guarded()?;
        state.pins.entry(pin.number()).or_default().edge_policy = policy;
        Ok(())
    }

    fn read_level(&self, pin: Pin) -> Result<PinState, Self::Error> {
        let mut state = self.guarded()?;
        let record = state.pins.entry(pin.number()).or_default();
        Ok(if record.high {
            PinState::High
        } else {
            PinState::Low
        })
    }

    fn install_interrupt_service(&self) -> Result<(), Self::Error> {
        let mut state = self.guarded()?;
        state.interrupt_service = true;
        Ok(())
    }

    fn install_interrupt(&self, pin: Pin, handler: InterruptHandler) -> Result<(), Self::Error> {
        let mut state = self.guarded()?;
        state.pins.entry(pin.number()).or_default().handler =
            Some(Arc::new(Mutex::new(handler)));
        Ok(())
    }
}

struct TimerSlot {
    window: Duration,
    deadline: Option<Duration>,
    callback: Arc<Mutex<TimerCallback>>,
}

struct TimerBank {
    now: Duration,
    timers: Vec<TimerSlot>,
    fail_next_create: bool,
}

/// One-shot timer service over a manually advanced virtual clock.
#[derive(Clone)]
pub struct MockTimerService {
    bank: Arc<Mutex<TimerBank>>,
}

impl MockTimerService {
    pub fn new() -> Self {
        Self {
            bank: Arc::new(Mutex::new(TimerBank {
                now: Duration::ZERO,
                timers: Vec::new(),
                fail_next_create: false,
            })),
        }
    }

    /// Make the next [`create_one_shot`](TimerService::create_one_shot)
    /// fail with [`MockTimerError`].
    pub fn fail_next_create(&self) {
        self.lock().fail_next_create = true;
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of timers created so far.
    pub fn created_timers(&self) -> usize {
        self.lock().timers.len()
    }

    /// Number of timers currently armed.
    pub fn active_timers(&self) -> usize {
        self.lock()
            .timers
            .iter()
            .filter(|timer| timer.deadline.is_some())
            .count()
    }

    /// Advance the virtual clock by `span`, running due expiry callbacks in
    /// deadline order, one at a time. A callback that re-arms its timer
    /// inside the advanced span fires again within the same call.
    pub fn advance(&self, span: Duration) {
        let target = self.lock().now + span;

        loop {
            let due = {
                let mut bank = self.lock();
                let next = bank
                    .timers
                    .iter()
                    .enumerate()
                    .filter_map(|(index, timer)| timer.deadline.map(|at| (index, at)))
                    .filter(|&(_, at)| at <= target)
                    .min_by_key(|&(_, at)| at);
                match next {
                    Some((index, at)) => {
                        bank.now = at;
                        bank.timers[index].deadline = None;
                        Some(Arc::clone(&bank.timers[index].callback))
                    }
                    None => {
                        bank.now = target;
                        None
                    }
                }
            };

            // Callbacks arm timers and read pins, so the bank lock must be
            // released while they run.
            match due {
                Some(callback) => {
                    if let Ok(mut callback) = callback.lock() {
                        callback();
                    }
                }
                None => break,
            }
        }
    }

    /// [`advance`](MockTimerService::advance) in milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TimerBank> {
        self.bank.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockTimerService {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService for MockTimerService {
    type Timer = MockTimer;
    type Error = MockTimerError;

    fn create_one_shot(
        &self,
        window: Duration,
        callback: TimerCallback,
    ) -> Result<Self::Timer, Self::Error> {
        let mut bank = self.lock();
        if bank.fail_next_create {
            bank.fail_next_create = false;
            return Err(MockTimerError);
        }
        bank.timers.push(TimerSlot {
            window,
            deadline: None,
            callback: Arc::new(Mutex::new(callback)),
        });
        Ok(MockTimer {
            bank: Arc::clone(&self.bank),
            index: bank.timers.len() - 1,
        })
    }
}

/// Handle to one timer of a [`MockTimerService`].
pub struct MockTimer {
    bank: Arc<Mutex<TimerBank>>,
    index: usize,
}

impl OneShotTimer for MockTimer {
    type Error = MockTimerError;

    fn start(&self) -> Result<(), Self::Error> {
        let mut bank = self.bank.lock().unwrap_or_else(PoisonError::into_inner);
        let now = bank.now;
        let slot = bank.timers.get_mut(self.index).ok_or(MockTimerError)?;
        slot.deadline = Some(now + slot.window);
        Ok(())
    }

    fn is_active(&self) -> bool {
        let bank = self.bank.lock().unwrap_or_else(PoisonError::into_inner);
        bank.timers
            .get(self.index)
            .is_some_and(|slot| slot.deadline.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn edges_respect_policy_and_service_install() {
        let gpio = MockGpio::new();
        let pin = Pin::new(3);
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        gpio.set_edge_policy(pin, EdgePolicy::Rising).unwrap();
        gpio.install_interrupt(
            pin,
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

        // Without the dispatch service nothing fires.
        gpio.drive_level(pin, PinState::High);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        gpio.install_interrupt_service().unwrap();
        gpio.drive_level(pin, PinState::Low);
        gpio.drive_level(pin, PinState::High);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Falling transitions do not match a rising policy, and repeating
        // the current level is not a transition at all.
        gpio.drive_level(pin, PinState::Low);
        gpio.drive_level(pin, PinState::Low);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn advance_runs_rearm_cascades_in_order() {
        let timers = MockTimerService::new();
        let fired = Arc::new(AtomicUsize::new(0));

        // The callback needs its own timer handle to re-arm, so the handle
        // slot is filled right after creation.
        let handle: Arc<Mutex<Option<MockTimer>>> = Arc::new(Mutex::new(None));
        let counter = Arc::clone(&fired);
        let shared = Arc::clone(&handle);
        let timer = timers
            .create_one_shot(
                Duration::from_millis(10),
                Box::new(move || {
                    let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if count < 3 {
                        if let Some(timer) = shared.lock().unwrap().as_ref() {
                            timer.start().unwrap();
                        }
                    }
                }),
            )
            .unwrap();
        timer.start().unwrap();
        *handle.lock().unwrap() = Some(timer);

        timers.advance_ms(35);
        assert_eq!(fired.load(Ordering::SeqCst), 3);
        assert_eq!(timers.now(), Duration::from_millis(35));
        assert_eq!(timers.active_timers(), 0);
    }

    #[test]
    fn injected_failures_hit_exactly_one_call() {
        let gpio = MockGpio::new();
        gpio.fail_next_call();
        assert_eq!(gpio.reset(Pin::new(1)), Err(MockGpioError));
        assert_eq!(gpio.reset(Pin::new(1)), Ok(()));
    }
}
