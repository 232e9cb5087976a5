//! Debounce state machine: the edge detector and the settle checker.
//!
//! Two execution contexts touch a button's runtime state:
//!
//! - **Interrupt context** runs [`on_edge`] on every raw transition of the
//!   pin. It reads the phase flag and the timer handle, and on an accepted
//!   edge writes the phase flag, the level, and the press counter, then arms
//!   the timer.
//! - **Timer context** (the timer service's worker) runs
//!   [`on_debounce_expiry`] when a window elapses. It either re-arms the
//!   timer or writes the level and the phase flag.
//!
//! The phase flag is the sole arbiter of which context acts next: while a
//! window is armed the edge detector drops every edge, so only the settle
//! checker mutates state, and once the flag is quiescent the settle checker's
//! timer is no longer armed, so only a future interrupt mutates state. That
//! gives each button a single writer at a time without any lock. The two
//! cross-context fields are the phase flag (an atomic cell) and the timer
//! handle (armed through `&self` only). Buttons share no state with each
//! other.
//!
//! Neither handler blocks, allocates, or logs.

use crate::config::ButtonState;
use crate::interface::{ButtonGpio, OneShotTimer, PressCallback};
use crate::registry::{ButtonSlot, DebouncePhase};

/// Edge detector, invoked from interrupt context on every raw transition of
/// a registered pin.
///
/// Accepts the edge only when the previous window fully settled; then it
/// commits the sampled level, bumps the press counter, notifies `on_press`,
/// and arms the debounce window. Every other edge is dropped, which is the
/// debounce suppression itself.
pub(crate) fn on_edge<G, Tm>(gpio: &G, slot: &ButtonSlot<Tm>, on_press: Option<&PressCallback>)
where
    G: ButtonGpio,
    Tm: OneShotTimer,
{
    // Both the timer and the phase flag must agree that the previous window
    // fully settled before a new press is accepted.
    if slot.timer.is_active() || slot.state.phase() == DebouncePhase::Debouncing {
        return;
    }

    slot.state.set_phase(DebouncePhase::Debouncing);

    if let Ok(level) = gpio.read_level(slot.descriptor.pin) {
        slot.state.set_level(ButtonState::from(level));
    }

    slot.state.record_press();
    if let Some(callback) = on_press {
        callback(slot.descriptor.id);
    }

    // If arming fails the slot stays in its debounce phase; a pending expiry
    // is the only thing that can resolve it.
    let _ = slot.timer.start();
}

/// Settle checker, invoked on the timer service's worker when a button's
/// debounce window elapses.
///
/// Re-samples the pin: a still-pressed level means the contact is bouncing
/// (or held), so the same window is armed again. A released level commits
/// the release and returns the button to quiescent, ready for the next
/// press.
pub(crate) fn on_debounce_expiry<G, Tm>(gpio: &G, slot: &ButtonSlot<Tm>)
where
    G: ButtonGpio,
    Tm: OneShotTimer,
{
    match gpio.read_level(slot.descriptor.pin).map(ButtonState::from) {
        Ok(ButtonState::Pressed) => {
            let _ = slot.timer.start();
        }
        Ok(ButtonState::NotPressed) => {
            slot.state.set_level(ButtonState::NotPressed);
            slot.state.set_phase(DebouncePhase::Quiescent);
        }
        // An unreadable line settles the slot rather than wedging it in the
        // debounce phase forever.
        Err(_) => {
            slot.state.set_phase(DebouncePhase::Quiescent);
        }
    }
}
