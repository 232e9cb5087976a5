//! Hardware collaborator contracts.
//!
//! The button module never programs registers itself: pin configuration,
//! interrupt dispatch, and debounce timers all go through the traits below.
//! On target these are implemented over the platform GPIO and timer
//! services; on the host the [`mock`](crate::mock) module implements them
//! over scripted levels and a virtual clock.

use core::fmt::Debug;
use core::time::Duration;

use embedded_hal::digital::PinState;

use crate::config::{ButtonId, EdgePolicy, Pin, PullMode};

/// Direction of a GPIO pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinDirection {
    /// High-impedance input.
    Input,
    /// Driven output.
    Output,
}

/// Handler installed on a pin's interrupt line, invoked on every raw edge
/// matching the pin's [`EdgePolicy`].
///
/// Runs in interrupt context: it must not block and must return quickly.
pub type InterruptHandler = Box<dyn FnMut() + Send + 'static>;

/// Callback attached to a one-shot timer at creation time, invoked by the
/// timer service's worker when the timer expires.
pub type TimerCallback = Box<dyn FnMut() + Send + 'static>;

/// Function invoked synchronously from interrupt context on each accepted
/// press edge.
pub type PressCallback = Box<dyn Fn(ButtonId) + Send + Sync + 'static>;

/// GPIO driver contract.
///
/// All methods take `&self`: one driver instance is shared between the
/// module and the interrupt closures it installs, so implementations must
/// be internally synchronized (or free of mutable state).
pub trait ButtonGpio {
    /// Error produced by the driver.
    type Error: Debug;

    /// Whether `pin` names a pin this hardware actually has.
    fn is_valid_pin(&self, pin: Pin) -> bool;

    /// Return a pin to its power-on configuration.
    fn reset(&self, pin: Pin) -> Result<(), Self::Error>;

    /// Configure a pin as input or output.
    fn set_direction(&self, pin: Pin, direction: PinDirection) -> Result<(), Self::Error>;

    /// Configure a pin's pull resistors.
    fn set_pull_mode(&self, pin: Pin, mode: PullMode) -> Result<(), Self::Error>;

    /// Select which transitions of a pin raise its interrupt.
    /// [`EdgePolicy::Disabled`] masks the interrupt entirely.
    fn set_edge_policy(&self, pin: Pin, policy: EdgePolicy) -> Result<(), Self::Error>;

    /// Sample the current electrical level of a pin.
    fn read_level(&self, pin: Pin) -> Result<PinState, Self::Error>;

    /// Install the process-wide interrupt-dispatch service.
    ///
    /// The service is a singleton; installing it again must be a no-op
    /// returning success.
    fn install_interrupt_service(&self) -> Result<(), Self::Error>;

    /// Attach `handler` to a pin's interrupt, replacing any previous
    /// handler for that pin.
    fn install_interrupt(&self, pin: Pin, handler: InterruptHandler) -> Result<(), Self::Error>;
}

/// Factory for one-shot timers.
pub trait TimerService {
    /// Timer handle type produced by this service.
    type Timer: OneShotTimer;
    /// Error produced by the service.
    type Error: Debug;

    /// Create a one-shot timer that runs `callback` once `window` elapses
    /// after each [`start`](OneShotTimer::start). The timer is created
    /// unarmed.
    fn create_one_shot(
        &self,
        window: Duration,
        callback: TimerCallback,
    ) -> Result<Self::Timer, Self::Error>;
}

/// A created one-shot timer.
///
/// Expiry callbacks run on the timer service's worker, sequentially with
/// respect to each other but concurrently with interrupts.
pub trait OneShotTimer: Send + Sync {
    /// Error produced by the timer.
    type Error: Debug;

    /// Arm the timer for one window from now, re-arming if it was already
    /// armed. Callable from interrupt context.
    fn start(&self) -> Result<(), Self::Error>;

    /// Whether the timer is armed and its expiry callback has not run yet.
    fn is_active(&self) -> bool;
}
