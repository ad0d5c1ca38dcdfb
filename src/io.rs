/*
 * The I/O module for the door controller.
 *
 * This is the only part of the program that is device-specific. It wires the
 * DESPI-M02 (STM32F103VE) pins and peripherals to the traits the coordinators
 * use: buttons, the status output and the buzzer. The status text goes out on
 * USART1, the indicator is a common-cathode RGB LED and the buzzer hangs off a
 * PWM channel.
 *
 * The reset button is special. Its EXTI line is programmed by hand so that the
 * firmware owns the interrupt handler, see `arm_reset_line`.
 */

use embassy_stm32::{
    Peripherals, bind_interrupts,
    gpio::{Input, Level, Output, OutputType, Pull, Speed},
    interrupt::{self, InterruptExt, Priority},
    mode::Async,
    pac,
    peripherals,
    time::hz,
    timer::{
        low_level::CountingMode,
        simple_pwm::{PwmPin, SimplePwm},
    },
    usart::{self, Config, Uart},
};
use embassy_time::{Duration, Timer};
use enum_ordinalize::Ordinalize;
use occupancy_gate::{
    Button, StatusDevice, Tone,
    status::{Channel, Levels},
};

bind_interrupts!(struct Irqs {
    USART1 => usart::InterruptHandler<peripherals::USART1>;
});

// PE11 is EXTI line 11, served by the EXTI15_10 vector.
const RESET_LINE: usize = 11;
const RESET_PORT: u8 = 4; // port E

/// Must be above the priority of the executor that runs the reset task.
pub const RESET_LINE_PRIORITY: Priority = Priority::P5;

pub struct Board {
    pub entry: ActiveLowButton,
    pub exit: ActiveLowButton,
    pub status: SerialStatus,
    pub buzzer: Buzzer,
    pub reset: ResetLine,
}

pub struct ActiveLowButton {
    input: Input<'static>,
}

impl Button for ActiveLowButton {
    fn is_asserted(&mut self) -> bool {
        self.input.is_low()
    }
}

pub struct SerialStatus {
    usart: Uart<'static, Async>,
    rgb: [Output<'static>; Channel::VARIANT_COUNT],
}

impl StatusDevice for SerialStatus {
    type Error = usart::Error;

    async fn show(&mut self, message: &str, line: &str) -> Result<(), usart::Error> {
        self.usart.write(message.as_bytes()).await?;
        self.usart.write(b"\r\n").await?;
        self.usart.write(line.as_bytes()).await?;
        self.usart.write(b"\r\n\r\n").await
    }

    fn indicate(&mut self, levels: Levels) {
        for (led, on) in self.rgb.iter_mut().zip(levels) {
            light(led, on);
        }
    }
}

// Deal with active-high or active-low, so that the rest of the code can just
// use easy to understand `true` for on logic.
fn light(led: &mut Output, on: bool) {
    led.set_level(if on { Level::High } else { Level::Low });
}

pub struct Buzzer {
    pwm: SimplePwm<'static, peripherals::TIM3>,
}

impl Tone for Buzzer {
    async fn beep(&mut self, duration: Duration, frequency_hz: u32) {
        self.pwm.set_frequency(hz(frequency_hz));
        let mut channel = self.pwm.ch1();
        channel.set_duty_cycle_percent(50);
        channel.enable();

        Timer::after(duration).await;

        self.pwm.ch1().disable();
    }
}

impl Board {
    pub fn new(peripherals: Peripherals) -> Self {
        let usart = defmt::unwrap!(Uart::new(
            peripherals.USART1,
            peripherals.PA10,
            peripherals.PA9,
            Irqs,
            peripherals.DMA1_CH4,
            peripherals.DMA1_CH5,
            Config::default(), // 115200 baud
        ));

        // indexed by `Channel`: red, green, blue
        let rgb = [
            Output::new(peripherals.PB10, Level::Low, Speed::Low),
            Output::new(peripherals.PB14, Level::Low, Speed::Low),
            Output::new(peripherals.PB12, Level::Low, Speed::Low),
        ];

        let pwm = SimplePwm::new(
            peripherals.TIM3,
            Some(PwmPin::new_ch1(peripherals.PA6, OutputType::PushPull)),
            None,
            None,
            None,
            hz(occupancy_gate::config::ALERT_FREQUENCY_HZ),
            CountingMode::EdgeAlignedUp,
        );

        Board {
            entry: ActiveLowButton {
                input: Input::new(peripherals.PE2, Pull::Up),
            },
            exit: ActiveLowButton {
                input: Input::new(peripherals.PE3, Pull::Up),
            },
            status: SerialStatus { usart, rgb },
            buzzer: Buzzer { pwm },
            reset: ResetLine {
                input: Input::new(peripherals.PE11, Pull::Up),
            },
        }
    }
}

pub struct ResetLine {
    input: Input<'static>,
}

impl ResetLine {
    /*
     * Route a falling edge on the reset button to the EXTI15_10 interrupt.
     * Call this only once the reset task is running. The input has to stay
     * configured for the lifetime of the firmware, so it is never dropped.
     */
    pub fn arm(self) {
        core::mem::forget(self.input);

        pac::RCC.apb2enr().modify(|w| w.set_afioen(true));
        pac::AFIO
            .exticr(RESET_LINE / 4)
            .modify(|w| w.set_exti(RESET_LINE % 4, RESET_PORT));
        pac::EXTI.rtsr(0).modify(|w| w.set_line(RESET_LINE, false));
        pac::EXTI.ftsr(0).modify(|w| w.set_line(RESET_LINE, true));
        pac::EXTI.pr(0).write(|w| w.set_line(RESET_LINE, true));
        pac::EXTI.imr(0).modify(|w| w.set_line(RESET_LINE, true));

        interrupt::EXTI15_10.set_priority(RESET_LINE_PRIORITY);
        // SAFETY: the handler only touches the EXTI pending register and the
        // reset signal, both of which are interrupt-safe.
        unsafe { interrupt::EXTI15_10.enable() };
    }
}

/// Acknowledge a reset edge. Returns `true` when the reset line caused the
/// interrupt. Called from the EXTI15_10 handler only.
pub fn take_reset_edge() -> bool {
    let pending = pac::EXTI.pr(0).read().line(RESET_LINE);
    if pending {
        pac::EXTI.pr(0).write(|w| w.set_line(RESET_LINE, true));
    }
    pending
}
