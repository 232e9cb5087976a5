//! Button descriptor types and static configuration records.

use core::fmt;
use core::time::Duration;

use embedded_hal::digital::PinState;

/// Identifier of a logical button.
///
/// Identifiers are dense: an application declaring `N` buttons uses the ids
/// `0..N`, and the registry stores slots so that table position equals id.
/// Operations on any id outside that range fail with
/// [`ButtonDoesNotExist`](crate::ButtonError::ButtonDoesNotExist).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ButtonId(usize);

impl ButtonId {
    /// Create a button identifier.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of this button in the descriptor table.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "button {}", self.0)
    }
}

/// Hardware pin number a button input is wired to.
///
/// Legality of a number is judged by the GPIO collaborator
/// ([`ButtonGpio::is_valid_pin`](crate::ButtonGpio::is_valid_pin)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pin(u8);

impl Pin {
    /// Wrap a raw pin number.
    pub const fn new(number: u8) -> Self {
        Self(number)
    }

    /// The raw pin number.
    pub const fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// Pull resistor policy of a button pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PullMode {
    /// Internal pull-up only.
    PullUp,
    /// Internal pull-down only.
    PullDown,
    /// Both internal resistors enabled.
    PullUpDown,
    /// No internal resistor; the line floats unless driven externally.
    Floating,
}

/// Which raw transitions of a pin trigger its interrupt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgePolicy {
    /// Interrupts disabled for the pin.
    #[default]
    Disabled,
    /// Trigger on low-to-high transitions.
    Rising,
    /// Trigger on high-to-low transitions.
    Falling,
    /// Trigger on every transition.
    Any,
}

/// Logical state of a button as last committed by the debounce machinery.
///
/// Buttons are wired active high: a high line level reads as pressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ButtonState {
    /// The line reads released.
    #[default]
    NotPressed,
    /// The line reads pressed.
    Pressed,
}

impl From<PinState> for ButtonState {
    fn from(level: PinState) -> Self {
        match level {
            PinState::High => ButtonState::Pressed,
            PinState::Low => ButtonState::NotPressed,
        }
    }
}

/// Immutable descriptor of one button, fixed at declaration time.
///
/// Descriptors are plain records so the application can declare its button
/// set as a `static` table:
///
/// ```
/// use button_hal::{ButtonConfig, ButtonId, EdgePolicy, Pin, PullMode};
/// use core::time::Duration;
///
/// const CONFIRM: ButtonId = ButtonId::new(0);
///
/// static BUTTONS: [ButtonConfig; 1] = [ButtonConfig::new(
///     CONFIRM,
///     Pin::new(9),
///     PullMode::PullDown,
///     EdgePolicy::Rising,
///     Duration::from_millis(50),
/// )];
/// # let _ = &BUTTONS;
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonConfig {
    /// Identifier the rest of the firmware uses for this button.
    pub id: ButtonId,
    /// Pin the button is wired to.
    pub pin: Pin,
    /// Pull resistor policy applied at registration.
    pub pull_mode: PullMode,
    /// Transition(s) that fire the edge detector.
    pub edge_policy: EdgePolicy,
    /// Length of one debounce window.
    pub debounce_window: Duration,
}

impl ButtonConfig {
    /// Describe a button.
    pub const fn new(
        id: ButtonId,
        pin: Pin,
        pull_mode: PullMode,
        edge_policy: EdgePolicy,
        debounce_window: Duration,
    ) -> Self {
        Self {
            id,
            pin,
            pull_mode,
            edge_policy,
            debounce_window,
        }
    }
}
