#![no_std]
#![no_main]

// https://github.com/embassy-rs/embassy/blob/main/examples/stm32f4/src/bin/multiprio.rs

use defmt::{info, unwrap};
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use panic_halt as _;

use occupancy_gate::{Annunciator, CapacityPool, Gate, ResetSignal, StatusPresenter, gate};

mod io;

type DoorGate = Gate<'static, io::SerialStatus, io::Buzzer>;

static POOL: CapacityPool = CapacityPool::new();
static RESET: ResetSignal = ResetSignal::new();

// Runs the reset task above the thread-mode tasks, but below the reset line.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();
const EXECUTOR_HIGH_PRIORITY: Priority = Priority::P6;

#[interrupt]
unsafe fn UART5() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

// Interrupt context: acknowledge the edge and post the reset, nothing more.
#[interrupt]
fn EXTI15_10() {
    if io::take_reset_edge() {
        RESET.trigger();
    }
}

#[embassy_executor::task]
async fn entry_task(button: io::ActiveLowButton, gate: &'static DoorGate) -> ! {
    gate::run_entry(button, gate).await
}

#[embassy_executor::task]
async fn exit_task(button: io::ActiveLowButton, gate: &'static DoorGate) -> ! {
    gate::run_exit(button, gate).await
}

#[embassy_executor::task]
async fn reset_task(gate: &'static DoorGate) -> ! {
    gate::run_reset(&RESET, gate).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let board = io::Board::new(embassy_stm32::init(Default::default()));

    let status: &'static StatusPresenter<io::SerialStatus> = unwrap!(cortex_m::singleton!(
        : StatusPresenter<io::SerialStatus> = StatusPresenter::new(board.status)
    ));
    let alert: &'static Annunciator<io::Buzzer> = unwrap!(cortex_m::singleton!(
        : Annunciator<io::Buzzer> = Annunciator::new(board.buzzer)
    ));
    let gate: &'static DoorGate =
        unwrap!(cortex_m::singleton!(: DoorGate = Gate::new(&POOL, status, alert)));

    gate.announce_ready().await;

    interrupt::UART5.set_priority(EXECUTOR_HIGH_PRIORITY);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::UART5);
    unwrap!(high_spawner.spawn(reset_task(gate)));
    board.reset.arm();

    unwrap!(spawner.spawn(entry_task(board.entry, gate)));
    unwrap!(spawner.spawn(exit_task(board.exit, gate)));

    info!("entry, exit and reset tasks running");
}
