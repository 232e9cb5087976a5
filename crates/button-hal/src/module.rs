//! Module lifecycle: initialization, button registration, and accessors.

use std::sync::{Arc, OnceLock, Weak};

use crate::config::{ButtonConfig, ButtonId, ButtonState, EdgePolicy};
use crate::debounce;
use crate::error::ButtonError;
use crate::interface::{ButtonGpio, PinDirection, PressCallback, TimerService};
use crate::registry::{self, ButtonSlot, DebouncePhase, Registry};

/// Owner of the button registry and its hardware collaborators.
///
/// One `ButtonModule` value is the process-wide button subsystem: it holds
/// the descriptor table, the per-button runtime state, and the GPIO and
/// timer collaborators, and it installs the interrupt and timer handlers
/// that drive the debounce state machine. Construct it once and share it.
///
/// Construction is cheap and touches no hardware; [`initialize`] brings the
/// module up and every other operation fails with
/// [`ButtonError::ModuleNotInitialized`] until it has succeeded.
///
/// [`initialize`]: ButtonModule::initialize
pub struct ButtonModule<G, T>
where
    T: TimerService,
{
    inner: Arc<Inner<G, T>>,
}

struct Inner<G, T>
where
    T: TimerService,
{
    gpio: G,
    timers: T,
    declared: Vec<ButtonConfig>,
    registry: OnceLock<Registry<T::Timer>>,
    on_press: OnceLock<PressCallback>,
}

impl<G, T> ButtonModule<G, T>
where
    G: ButtonGpio + Send + Sync + 'static,
    T: TimerService + Send + Sync + 'static,
    T::Timer: 'static,
{
    /// Create the module around its collaborators and the declared
    /// descriptor table. No validation or hardware access happens here.
    pub fn new(gpio: G, timers: T, descriptors: impl Into<Vec<ButtonConfig>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                gpio,
                timers,
                declared: descriptors.into(),
                registry: OnceLock::new(),
                on_press: OnceLock::new(),
            }),
        }
    }

    /// Number of declared buttons.
    pub fn button_count(&self) -> usize {
        self.inner.declared.len()
    }

    /// Whether [`initialize`](ButtonModule::initialize) has completed.
    pub fn is_initialized(&self) -> bool {
        self.inner.registry.get().is_some()
    }

    /// Register the function invoked on each accepted press edge.
    ///
    /// The callback runs synchronously in interrupt context while further
    /// interrupts are held off, so it must return quickly and must not
    /// block. It can be registered once; later
    /// calls keep the first callback. While no callback is registered an
    /// accepted press only updates state and counters.
    pub fn set_press_callback(&self, callback: impl Fn(ButtonId) + Send + Sync + 'static) {
        let _ = self.inner.on_press.set(Box::new(callback));
    }

    /// Bring the module up. Idempotent; once it has succeeded, further
    /// calls return `Ok` without doing anything.
    ///
    /// The first call validates the whole descriptor table
    /// ([`ButtonError::InvalidConfiguration`]), creates each button's
    /// debounce timer, and installs the process-wide interrupt-dispatch
    /// service (collaborator failures surface as
    /// [`ButtonError::InitializationFailed`]). Nothing is published unless
    /// every step succeeds, so a failed call leaves the module fully
    /// uninitialized and retryable.
    pub fn initialize(&self) -> Result<(), ButtonError> {
        if self.inner.registry.get().is_some() {
            return Ok(());
        }

        let ordered = registry::validate_descriptors(&self.inner.gpio, &self.inner.declared)?;

        let mut slots = Vec::with_capacity(ordered.len());
        for descriptor in ordered {
            let timer = self.create_debounce_timer(&descriptor)?;
            slots.push(ButtonSlot::new(descriptor, timer));
        }

        self.inner.gpio.install_interrupt_service().map_err(|err| {
            log::error!("interrupt dispatch service install failed: {err:?}");
            ButtonError::InitializationFailed
        })?;

        let _ = self.inner.registry.set(Registry::new(slots));
        log::info!(
            "button module initialized, {} buttons declared",
            self.button_count()
        );
        Ok(())
    }

    /// Wire a declared button to the hardware: pin reset, input direction,
    /// pull mode, edge policy, and the edge-detector interrupt handler, in
    /// that order. Any collaborator failure surfaces as
    /// [`ButtonError::InitializationFailed`] and leaves the button
    /// unregistered.
    pub fn register_button(&self, id: ButtonId) -> Result<(), ButtonError> {
        let slot = self.lookup(id)?;
        if slot.state.is_initialized() {
            return Err(ButtonError::ButtonAlreadyInitialized);
        }

        let gpio = &self.inner.gpio;
        let pin = slot.descriptor.pin;

        gpio.reset(pin)
            .map_err(|err| setup_failed(id, "pin reset", &err))?;
        gpio.set_direction(pin, PinDirection::Input)
            .map_err(|err| setup_failed(id, "direction setup", &err))?;
        gpio.set_pull_mode(pin, slot.descriptor.pull_mode)
            .map_err(|err| setup_failed(id, "pull mode setup", &err))?;
        gpio.set_edge_policy(pin, slot.descriptor.edge_policy)
            .map_err(|err| setup_failed(id, "edge policy setup", &err))?;

        let weak = Arc::downgrade(&self.inner);
        let index = id.index();
        gpio.install_interrupt(pin, Box::new(move || dispatch_edge(&weak, index)))
            .map_err(|err| setup_failed(id, "interrupt install", &err))?;

        slot.state.set_phase(DebouncePhase::Quiescent);
        slot.state.set_initialized(true);
        log::debug!("{id} registered on {pin}");
        Ok(())
    }

    /// Unwire a registered button: reset the pin and mask its interrupt.
    /// The button can be registered again afterwards.
    ///
    /// A debounce window armed before de-registration is not canceled: its
    /// expiry still runs against the (now reset) line, re-arming until the
    /// line reads released and then settling the slot. The press counter is
    /// kept across de-registration.
    pub fn deregister_button(&self, id: ButtonId) -> Result<(), ButtonError> {
        let slot = self.lookup(id)?;
        if !slot.state.is_initialized() {
            return Err(ButtonError::ButtonNotInitialized);
        }

        let gpio = &self.inner.gpio;
        let pin = slot.descriptor.pin;

        gpio.reset(pin)
            .map_err(|err| teardown_failed(id, "pin reset", &err))?;
        gpio.set_edge_policy(pin, EdgePolicy::Disabled)
            .map_err(|err| teardown_failed(id, "interrupt masking", &err))?;

        slot.state.set_initialized(false);
        log::debug!("{id} deregistered");
        Ok(())
    }

    /// Last committed logical level of a registered button. Pure accessor.
    pub fn read_state(&self, id: ButtonId) -> Result<ButtonState, ButtonError> {
        let slot = self.lookup(id)?;
        if !slot.state.is_initialized() {
            return Err(ButtonError::ButtonNotInitialized);
        }
        Ok(slot.state.level())
    }

    /// Number of accepted presses of a button. Pure accessor; usable as
    /// soon as the module is initialized, whether or not the button has
    /// been registered yet.
    pub fn press_count(&self, id: ButtonId) -> Result<u64, ButtonError> {
        Ok(self.lookup(id)?.state.press_count())
    }

    fn lookup(&self, id: ButtonId) -> Result<&ButtonSlot<T::Timer>, ButtonError> {
        let registry = self
            .inner
            .registry
            .get()
            .ok_or(ButtonError::ModuleNotInitialized)?;
        registry.get(id).ok_or(ButtonError::ButtonDoesNotExist)
    }

    fn create_debounce_timer(&self, descriptor: &ButtonConfig) -> Result<T::Timer, ButtonError> {
        let weak = Arc::downgrade(&self.inner);
        let index = descriptor.id.index();
        self.inner
            .timers
            .create_one_shot(
                descriptor.debounce_window,
                Box::new(move || dispatch_expiry(&weak, index)),
            )
            .map_err(|err| {
                log::error!("debounce timer creation for {} failed: {err:?}", descriptor.id);
                ButtonError::InitializationFailed
            })
    }
}

// The handlers hold a weak back-reference so the module and its installed
// closures form no cycle; a dispatch arriving after the module was dropped
// (or, for timers, before the registry is published) is a no-op.

fn dispatch_edge<G, T>(inner: &Weak<Inner<G, T>>, index: usize)
where
    G: ButtonGpio,
    T: TimerService,
{
    let Some(inner) = inner.upgrade() else { return };
    let Some(slot) = inner
        .registry
        .get()
        .and_then(|registry| registry.get(ButtonId::new(index)))
    else {
        return;
    };
    debounce::on_edge(&inner.gpio, slot, inner.on_press.get());
}

fn dispatch_expiry<G, T>(inner: &Weak<Inner<G, T>>, index: usize)
where
    G: ButtonGpio,
    T: TimerService,
{
    let Some(inner) = inner.upgrade() else { return };
    let Some(slot) = inner
        .registry
        .get()
        .and_then(|registry| registry.get(ButtonId::new(index)))
    else {
        return;
    };
    debounce::on_debounce_expiry(&inner.gpio, slot);
}

fn setup_failed<E: core::fmt::Debug>(id: ButtonId, stage: &str, err: &E) -> ButtonError {
    log::error!("{id}: {stage} failed: {err:?}");
    ButtonError::InitializationFailed
}

fn teardown_failed<E: core::fmt::Debug>(id: ButtonId, stage: &str, err: &E) -> ButtonError {
    log::error!("{id}: {stage} failed: {err:?}");
    ButtonError::DeinitializationFailed
}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::config::{Pin, PullMode};
    use crate::mock::{MockGpio, MockTimerService};

    const LONE: ButtonId = ButtonId::new(0);

    fn lone_descriptor() -> Vec<ButtonConfig> {
        vec![ButtonConfig::new(
            LONE,
            Pin::new(9),
            PullMode::PullDown,
            EdgePolicy::Rising,
            Duration::from_millis(50),
        )]
    }

    #[test]
    fn initialize_is_idempotent() {
        let timers = MockTimerService::new();
        let module = ButtonModule::new(MockGpio::new(), timers.clone(), lone_descriptor());

        module.initialize().unwrap();
        module.initialize().unwrap();

        assert_eq!(timers.created_timers(), 1);
        assert!(module.is_initialized());
    }

    #[test]
    fn failed_initialize_leaves_module_down_and_retryable() {
        let timers = MockTimerService::new();
        let module = ButtonModule::new(MockGpio::new(), timers.clone(), lone_descriptor());

        timers.fail_next_create();
        assert_eq!(module.initialize(), Err(ButtonError::InitializationFailed));
        assert!(!module.is_initialized());
        assert_eq!(
            module.press_count(LONE),
            Err(ButtonError::ModuleNotInitialized)
        );

        module.initialize().unwrap();
        assert!(module.is_initialized());
    }

    #[test]
    fn press_callback_is_set_once() {
        let gpio = MockGpio::new();
        let module = ButtonModule::new(gpio.clone(), MockTimerService::new(), lone_descriptor());

        let hits = Arc::new(AtomicUsize::new(0));
        let first = Arc::clone(&hits);
        module.set_press_callback(move |_| {
            first.fetch_add(1, Ordering::SeqCst);
        });
        // A second registration is a no-op and must not replace the first.
        module.set_press_callback(|_| panic!("replaced callback must never run"));

        module.initialize().unwrap();
        module.register_button(LONE).unwrap();
        gpio.drive_level(Pin::new(9), embedded_hal::digital::PinState::High);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
