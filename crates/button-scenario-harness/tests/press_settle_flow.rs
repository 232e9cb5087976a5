use core::time::Duration;

use button_hal::{ButtonConfig, ButtonId, ButtonState, EdgePolicy, Pin, PullMode};
use button_scenario_harness::ScenarioHarness;

const NAV: ButtonId = ButtonId::new(0);
const NAV_PIN: Pin = Pin::new(4);

fn nav_only() -> Vec<ButtonConfig> {
    vec![ButtonConfig::new(
        NAV,
        NAV_PIN,
        PullMode::PullDown,
        EdgePolicy::Rising,
        Duration::from_millis(50),
    )]
}

#[test]
fn bouncing_press_counts_once() {
    let harness = ScenarioHarness::new(nav_only());
    harness.bring_up();

    // Leading edge at t=0; bounce edges at 5, 12, and 30 ms; the line then
    // rests low until the window expires at t=50.
    harness.drive_high(NAV_PIN);
    harness.advance_ms(5);
    harness.bounce(NAV_PIN);
    harness.advance_ms(7);
    harness.bounce(NAV_PIN);
    harness.advance_ms(18);
    harness.bounce(NAV_PIN);
    harness.drive_low(NAV_PIN);

    assert_eq!(harness.module().press_count(NAV).unwrap(), 1);
    assert_eq!(harness.recorded_presses(), vec![NAV]);

    harness.advance_ms(20);

    assert_eq!(harness.module().press_count(NAV).unwrap(), 1);
    assert_eq!(
        harness.module().read_state(NAV).unwrap(),
        ButtonState::NotPressed
    );

    // A clean second press at t=60 is accepted as a new press.
    harness.advance_ms(10);
    harness.drive_high(NAV_PIN);

    assert_eq!(harness.module().press_count(NAV).unwrap(), 2);
    assert_eq!(
        harness.module().read_state(NAV).unwrap(),
        ButtonState::Pressed
    );
    assert_eq!(harness.recorded_presses(), vec![NAV, NAV]);
}

#[test]
fn held_button_keeps_deferring_release() {
    let harness = ScenarioHarness::new(nav_only());
    harness.bring_up();

    harness.drive_high(NAV_PIN);
    assert_eq!(harness.module().press_count(NAV).unwrap(), 1);

    // Each expiry still reads the line pressed, so the window re-arms and
    // the press is never double counted.
    harness.advance_ms(50);
    harness.bounce(NAV_PIN);
    harness.advance_ms(50);

    assert_eq!(harness.module().press_count(NAV).unwrap(), 1);
    assert_eq!(
        harness.module().read_state(NAV).unwrap(),
        ButtonState::Pressed
    );
    assert_eq!(harness.timers().active_timers(), 1);

    // Release; one more full window settles the button.
    harness.drive_low(NAV_PIN);
    harness.advance_ms(50);

    assert_eq!(
        harness.module().read_state(NAV).unwrap(),
        ButtonState::NotPressed
    );
    assert_eq!(harness.timers().active_timers(), 0);

    harness.drive_high(NAV_PIN);
    assert_eq!(harness.module().press_count(NAV).unwrap(), 2);
}

#[test]
fn buttons_debounce_independently() {
    const MENU: ButtonId = ButtonId::new(1);
    const MENU_PIN: Pin = Pin::new(5);

    let harness = ScenarioHarness::new(vec![
        ButtonConfig::new(
            NAV,
            NAV_PIN,
            PullMode::PullDown,
            EdgePolicy::Rising,
            Duration::from_millis(50),
        ),
        ButtonConfig::new(
            MENU,
            MENU_PIN,
            PullMode::PullDown,
            EdgePolicy::Rising,
            Duration::from_millis(30),
        ),
    ]);
    harness.bring_up();

    harness.drive_high(NAV_PIN);
    harness.advance_ms(10);
    harness.drive_high(MENU_PIN);
    harness.drive_low(NAV_PIN);
    harness.drive_low(MENU_PIN);

    // t=40: the menu window (armed at t=10) has expired, the nav window
    // (armed at t=0 for 50 ms) has not.
    harness.advance_ms(30);
    assert_eq!(
        harness.module().read_state(MENU).unwrap(),
        ButtonState::NotPressed
    );
    assert_eq!(
        harness.module().read_state(NAV).unwrap(),
        ButtonState::Pressed
    );

    harness.advance_ms(10);
    assert_eq!(
        harness.module().read_state(NAV).unwrap(),
        ButtonState::NotPressed
    );

    harness.drive_high(NAV_PIN);
    assert_eq!(harness.module().press_count(NAV).unwrap(), 2);
    assert_eq!(harness.module().press_count(MENU).unwrap(), 1);
    assert_eq!(harness.recorded_presses(), vec![NAV, MENU, NAV]);
}
