//! Button registry: descriptor slots, runtime state, and table validation.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::config::{ButtonConfig, ButtonId, ButtonState};
use crate::error::ButtonError;
use crate::interface::ButtonGpio;

/// Debounce phase of one button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DebouncePhase {
    /// No debounce window active; the next edge is accepted as a press.
    Quiescent,
    /// A debounce window is running; edges on the pin are ignored until the
    /// settle check resolves it.
    Debouncing,
}

/// Mutable per-button state.
///
/// Every field is an atomic cell because the edge detector (interrupt
/// context) and the settle checker (timer context) both read and write here;
/// see the context split documented in [`crate::debounce`].
pub(crate) struct RuntimeState {
    /// Set by registration, cleared by de-registration.
    initialized: AtomicBool,
    /// Last committed logical level. True means pressed.
    pressed: AtomicBool,
    /// Debounce phase flag. True means quiescent.
    settled: AtomicBool,
    /// Total accepted press edges since module construction.
    presses: AtomicU64,
}

impl RuntimeState {
    fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            pressed: AtomicBool::new(false),
            settled: AtomicBool::new(false),
            presses: AtomicU64::new(0),
        }
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub(crate) fn set_initialized(&self, on: bool) {
        self.initialized.store(on, Ordering::Release);
    }

    pub(crate) fn phase(&self) -> DebouncePhase {
        if self.settled.load(Ordering::Acquire) {
            DebouncePhase::Quiescent
        } else {
            DebouncePhase::Debouncing
        }
    }

    pub(crate) fn set_phase(&self, phase: DebouncePhase) {
        self.settled
            .store(phase == DebouncePhase::Quiescent, Ordering::Release);
    }

    pub(crate) fn level(&self) -> ButtonState {
        if self.pressed.load(Ordering::Acquire) {
            ButtonState::Pressed
        } else {
            ButtonState::NotPressed
        }
    }

    pub(crate) fn set_level(&self, level: ButtonState) {
        self.pressed
            .store(level == ButtonState::Pressed, Ordering::Release);
    }

    pub(crate) fn press_count(&self) -> u64 {
        self.presses.load(Ordering::Acquire)
    }

    pub(crate) fn record_press(&self) {
        self.presses.fetch_add(1, Ordering::AcqRel);
    }
}

/// One registry entry: the immutable descriptor plus the button's runtime
/// state and debounce timer.
pub(crate) struct ButtonSlot<Tm> {
    pub(crate) descriptor: ButtonConfig,
    pub(crate) state: RuntimeState,
    pub(crate) timer: Tm,
}

impl<Tm> ButtonSlot<Tm> {
    pub(crate) fn new(descriptor: ButtonConfig, timer: Tm) -> Self {
        Self {
            descriptor,
            state: RuntimeState::new(),
            timer,
        }
    }
}

/// Fixed table mapping [`ButtonId`] to its slot. Table position equals id,
/// so lookup is a bounds check.
pub(crate) struct Registry<Tm> {
    slots: Box<[ButtonSlot<Tm>]>,
}

impl<Tm> Registry<Tm> {
    pub(crate) fn new(slots: Vec<ButtonSlot<Tm>>) -> Self {
        Self {
            slots: slots.into_boxed_slice(),
        }
    }

    pub(crate) fn get(&self, id: ButtonId) -> Option<&ButtonSlot<Tm>> {
        self.slots.get(id.index())
    }
}

/// Validate the declared descriptor table and return it re-indexed so that
/// table position equals identifier.
///
/// All-or-nothing: any invalid entry rejects the whole table, before any
/// hardware has been touched. An id outside `0..N` (for `N` declared
/// descriptors), a duplicate id, or a pin the hardware does not have all
/// fail with [`ButtonError::InvalidConfiguration`].
pub(crate) fn validate_descriptors<G: ButtonGpio>(
    gpio: &G,
    declared: &[ButtonConfig],
) -> Result<Vec<ButtonConfig>, ButtonError> {
    let count = declared.len();
    let mut ordered: Vec<Option<ButtonConfig>> = vec![None; count];

    for descriptor in declared {
        let index = descriptor.id.index();
        if index >= count {
            log::error!(
                "{} is outside the declared set of {count} buttons",
                descriptor.id
            );
            return Err(ButtonError::InvalidConfiguration);
        }
        if ordered[index].is_some() {
            log::error!("{} is declared twice", descriptor.id);
            return Err(ButtonError::InvalidConfiguration);
        }
        if !gpio.is_valid_pin(descriptor.pin) {
            log::error!("{} is wired to nonexistent {}", descriptor.id, descriptor.pin);
            return Err(ButtonError::InvalidConfiguration);
        }
        ordered[index] = Some(*descriptor);
    }

    // N unique ids below N fill every slot, so the flatten drops nothing.
    Ok(ordered.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;
    use crate::config::{EdgePolicy, Pin, PullMode};
    use crate::mock::MockGpio;

    fn descriptor(id: usize, pin: u8) -> ButtonConfig {
        ButtonConfig::new(
            ButtonId::new(id),
            Pin::new(pin),
            PullMode::PullDown,
            EdgePolicy::Rising,
            Duration::from_millis(50),
        )
    }

    #[test]
    fn table_is_reindexed_by_id() {
        let gpio = MockGpio::new();
        let declared = [descriptor(2, 12), descriptor(0, 10), descriptor(1, 11)];

        let ordered = validate_descriptors(&gpio, &declared).unwrap();

        let ids: Vec<usize> = ordered.iter().map(|d| d.id.index()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(ordered[2].pin, Pin::new(12));
    }

    #[test]
    fn duplicate_id_rejects_whole_table() {
        let gpio = MockGpio::new();
        let declared = [descriptor(0, 10), descriptor(0, 11)];

        assert_eq!(
            validate_descriptors(&gpio, &declared),
            Err(ButtonError::InvalidConfiguration)
        );
    }

    #[test]
    fn id_outside_declared_range_is_rejected() {
        let gpio = MockGpio::new();
        let declared = [descriptor(0, 10), descriptor(5, 11)];

        assert_eq!(
            validate_descriptors(&gpio, &declared),
            Err(ButtonError::InvalidConfiguration)
        );
    }

    #[test]
    fn nonexistent_pin_is_rejected() {
        let gpio = MockGpio::with_max_pin(15);
        let declared = [descriptor(0, 40)];

        assert_eq!(
            validate_descriptors(&gpio, &declared),
            Err(ButtonError::InvalidConfiguration)
        );
    }

    #[test]
    fn runtime_state_starts_unregistered_and_unsettled() {
        let state = RuntimeState::new();

        assert!(!state.is_initialized());
        assert_eq!(state.phase(), DebouncePhase::Debouncing);
        assert_eq!(state.level(), ButtonState::NotPressed);
        assert_eq!(state.press_count(), 0);
    }
}
