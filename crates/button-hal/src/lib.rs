//! De-bounced board button support.
//!
//! Mechanical switches do not produce one clean edge per press: the contacts
//! flap for milliseconds, and an edge-triggered input sees a burst of
//! transitions. This crate turns those bursts into single logical press
//! events with per-button press counts. An edge detector accepts the leading
//! edge in interrupt context, and a timer-driven settle check keeps
//! re-arming the debounce window until the line has read released for one
//! full window, so arbitrarily long bounce trains still count as one press.
//!
//! Hardware access goes exclusively through the [`ButtonGpio`] and
//! [`TimerService`] contracts; [`mock`] implements them over scripted levels
//! and a virtual clock for host-side tests and simulators.
//!
//! ```
//! use button_hal::mock::{MockGpio, MockTimerService};
//! use button_hal::{ButtonConfig, ButtonId, ButtonModule, EdgePolicy, Pin, PullMode};
//! use core::time::Duration;
//! use embedded_hal::digital::PinState;
//!
//! const CONFIRM: ButtonId = ButtonId::new(0);
//! const CONFIRM_PIN: Pin = Pin::new(9);
//!
//! let gpio = MockGpio::new();
//! let timers = MockTimerService::new();
//! let module = ButtonModule::new(
//!     gpio.clone(),
//!     timers.clone(),
//!     [ButtonConfig::new(
//!         CONFIRM,
//!         CONFIRM_PIN,
//!         PullMode::PullDown,
//!         EdgePolicy::Rising,
//!         Duration::from_millis(50),
//!     )],
//! );
//!
//! module.initialize()?;
//! module.register_button(CONFIRM)?;
//!
//! gpio.drive_level(CONFIRM_PIN, PinState::High); // press
//! gpio.drive_level(CONFIRM_PIN, PinState::Low);  // release
//! timers.advance_ms(50);                         // window settles
//!
//! assert_eq!(module.press_count(CONFIRM)?, 1);
//! # Ok::<(), button_hal::ButtonError>(())
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::unreachable,
        clippy::unwrap_used
    )
)]

pub mod config;
pub mod error;
pub mod interface;
pub mod mock;

mod debounce;
mod module;
mod registry;

pub use config::{ButtonConfig, ButtonId, ButtonState, EdgePolicy, Pin, PullMode};
pub use error::ButtonError;
pub use interface::{
    ButtonGpio, InterruptHandler, OneShotTimer, PinDirection, PressCallback, TimerCallback,
    TimerService,
};
pub use module::ButtonModule;
