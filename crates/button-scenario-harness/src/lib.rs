//! Host-side scenario harness for scripted button timelines.

use std::sync::{Arc, Mutex, PoisonError};

use button_hal::mock::{MockGpio, MockTimerService};
use button_hal::{ButtonConfig, ButtonId, ButtonModule, Pin};
use embedded_hal::digital::PinState;

/// Couples a button module with mock hardware and a press recorder.
pub struct ScenarioHarness {
    gpio: MockGpio,
    timers: MockTimerService,
    module: ButtonModule<MockGpio, MockTimerService>,
    presses: Arc<Mutex<Vec<ButtonId>>>,
}

impl ScenarioHarness {
    /// Build a harness around the given descriptor table. The module is
    /// created but not initialized, so scenarios can drive the whole
    /// lifecycle themselves.
    pub fn new(descriptors: impl Into<Vec<ButtonConfig>>) -> Self {
        let gpio = MockGpio::new();
        let timers = MockTimerService::new();
        let module = ButtonModule::new(gpio.clone(), timers.clone(), descriptors);

        let presses = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&presses);
        module.set_press_callback(move |id| {
            if let Ok(mut seen) = recorder.lock() {
                seen.push(id);
            }
        });

        Self {
            gpio,
            timers,
            module,
            presses,
        }
    }

    /// Initialize the module and register every declared button.
    pub fn bring_up(&self) {
        self.module
            .initialize()
            .expect("module initialization should succeed");
        for index in 0..self.module.button_count() {
            self.module
                .register_button(ButtonId::new(index))
                .expect("button registration should succeed");
        }
    }

    /// The module under test.
    pub fn module(&self) -> &ButtonModule<MockGpio, MockTimerService> {
        &self.module
    }

    /// The scripted GPIO driver.
    pub fn gpio(&self) -> &MockGpio {
        &self.gpio
    }

    /// The virtual-clock timer service.
    pub fn timers(&self) -> &MockTimerService {
        &self.timers
    }

    /// Drive the line high; a press edge under a rising policy.
    pub fn drive_high(&self, pin: Pin) {
        self.gpio.drive_level(pin, PinState::High);
    }

    /// Drive the line low.
    pub fn drive_low(&self, pin: Pin) {
        self.gpio.drive_level(pin, PinState::Low);
    }

    /// One contact bounce: the line drops and immediately rises again.
    pub fn bounce(&self, pin: Pin) {
        self.drive_low(pin);
        self.drive_high(pin);
    }

    /// Advance the virtual clock.
    pub fn advance_ms(&self, ms: u64) {
        self.timers.advance_ms(ms);
    }

    /// Presses reported through the module callback, in arrival order.
    pub fn recorded_presses(&self) -> Vec<ButtonId> {
        self.presses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
