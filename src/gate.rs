/*
 * The three control loops guarding the room: entry, exit and reset.
 *
 * Entry and exit poll their buttons and move one token at a time through the
 * capacity pool. Reset sleeps on the reset signal and clears the pool in one
 * go. All three report through the shared status presenter, and entry and
 * reset share the buzzer.
 *
 * None of the loops ever return.
 */

pub mod capacity;
pub mod reset;

use embassy_time::{Duration, Timer};

use crate::alert::{Annunciator, Chime, Tone};
use crate::config::{POLL_INTERVAL, SETTLE_INTERVAL};
use crate::status::{
    CAPACITY_FULL, ENTRY_AUTHORIZED, EXIT_AUTHORIZED, READY, SYSTEM_RESET, StatusDevice,
    StatusPresenter,
};
use capacity::CapacityPool;
use reset::ResetSignal;

/// A push button. Implementations deal with active-low wiring, so the
/// coordinators can just use `true` for pressed.
pub trait Button {
    fn is_asserted(&mut self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonPhase {
    Idle,
    Asserted,
    Settling,
}

impl ButtonPhase {
    /*
     * Determine the next phase from the current one and a fresh sample.
     */
    pub fn next(&self, asserted: bool) -> ButtonPhase {
        match (self, asserted) {
            (ButtonPhase::Idle, false) => ButtonPhase::Idle,
            (ButtonPhase::Idle, true) => ButtonPhase::Asserted,
            (ButtonPhase::Asserted, _) => ButtonPhase::Settling,
            (ButtonPhase::Settling, _) => ButtonPhase::Idle,
        }
    }

    /// How long to wait in this phase before sampling again. The coordinator
    /// acts in `Asserted` and moves on without waiting.
    pub fn dwell(&self) -> Option<Duration> {
        match self {
            ButtonPhase::Idle => Some(POLL_INTERVAL),
            ButtonPhase::Asserted => None,
            ButtonPhase::Settling => Some(SETTLE_INTERVAL),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Admission {
    Admitted(usize),
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Departure {
    Departed(usize),
    AlreadyEmpty,
}

/// Everything the coordinators share.
pub struct Gate<'a, D, T> {
    pool: &'a CapacityPool,
    status: &'a StatusPresenter<D>,
    alert: &'a Annunciator<T>,
}

impl<'a, D: StatusDevice, T: Tone> Gate<'a, D, T> {
    pub const fn new(
        pool: &'a CapacityPool,
        status: &'a StatusPresenter<D>,
        alert: &'a Annunciator<T>,
    ) -> Self {
        Gate {
            pool,
            status,
            alert,
        }
    }

    pub async fn announce_ready(&self) {
        info!("ready, {} places", self.pool.capacity());
        self.status
            .render(READY, self.pool.outstanding_count())
            .await;
    }

    /*
     * Each transition below happens while holding the status output, so the
     * display always ends up showing the latest count. Without this, a reset
     * landing between an admission and its render would be overwritten by the
     * stale admission.
     */

    /// One press of the entry button.
    pub async fn admit(&self) -> Admission {
        let mut output = self.status.claim().await;
        match self.pool.admit() {
            Some(count) => {
                info!("admitted, {} inside", count);
                output.render(ENTRY_AUTHORIZED, count).await;
                Admission::Admitted(count)
            }
            None => {
                info!("rejected, room is full");
                output
                    .render(CAPACITY_FULL, self.pool.outstanding_count())
                    .await;
                drop(output);
                self.alert.sound(Chime::Rejected).await;
                Admission::Rejected
            }
        }
    }

    /// One press of the exit button. Leaving an empty room does nothing.
    pub async fn depart(&self) -> Departure {
        let mut output = self.status.claim().await;
        match self.pool.depart() {
            Some(count) => {
                info!("departed, {} inside", count);
                output.render(EXIT_AUTHORIZED, count).await;
                Departure::Departed(count)
            }
            None => {
                debug!("exit pressed while empty, ignored");
                Departure::AlreadyEmpty
            }
        }
    }

    /// Clear the room regardless of the count. Returns the number of tokens
    /// that were released.
    pub async fn reset(&self) -> usize {
        let mut output = self.status.claim().await;
        let drained = self.pool.drain();
        info!("reset, released {} places", drained);
        output
            .render(SYSTEM_RESET, self.pool.outstanding_count())
            .await;
        drop(output);
        self.alert.sound(Chime::Reset).await;
        drained
    }
}

/*
 * Poll `button` and run `action` once per recognised press. Sampling pauses
 * for the settle interval after every press, so one push counts once. Holding
 * the button down repeats the action after each settle interval.
 */
async fn run_button<B, F>(mut button: B, mut action: impl FnMut() -> F) -> !
where
    B: Button,
    F: Future,
{
    let mut phase = ButtonPhase::Idle;
    loop {
        if phase == ButtonPhase::Asserted {
            action().await;
        }
        if let Some(dwell) = phase.dwell() {
            Timer::after(dwell).await;
        }
        let asserted = phase == ButtonPhase::Idle && button.is_asserted();
        phase = phase.next(asserted);
    }
}

pub async fn run_entry<B: Button, D: StatusDevice, T: Tone>(
    button: B,
    gate: &Gate<'_, D, T>,
) -> ! {
    run_button(button, move || gate.admit()).await
}

pub async fn run_exit<B: Button, D: StatusDevice, T: Tone>(
    button: B,
    gate: &Gate<'_, D, T>,
) -> ! {
    run_button(button, move || gate.depart()).await
}

/*
 * Wait for reset requests and clear the room for each. Requests arriving
 * during a reset or the settle interval after it are contact bounce of the
 * same press and are dropped.
 */
pub async fn run_reset<D: StatusDevice, T: Tone>(signal: &ResetSignal, gate: &Gate<'_, D, T>) -> ! {
    loop {
        signal.wait().await;
        gate.reset().await;

        Timer::after(SETTLE_INTERVAL).await;
        if signal.is_pending() {
            debug!("reset bounced, ignored");
            signal.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CAPACITY;
    use crate::status::{Occupancy, count_line};
    use crate::testing::{Beep, RecordingDisplay, RecordingTone, ScriptedButton};
    use embassy_futures::block_on;
    use embassy_futures::join::join3;
    use embassy_futures::select::{Either, select};

    struct Room {
        pool: CapacityPool,
        status: StatusPresenter<RecordingDisplay>,
        alert: Annunciator<RecordingTone>,
    }

    impl Room {
        fn new() -> Self {
            Room::with_display(RecordingDisplay::default())
        }

        fn with_display(display: RecordingDisplay) -> Self {
            Room {
                pool: CapacityPool::new(),
                status: StatusPresenter::new(display),
                alert: Annunciator::new(RecordingTone::default()),
            }
        }

        fn with_occupancy(count: usize) -> Self {
            let room = Room::new();
            for _ in 0..count {
                assert!(room.pool.try_acquire());
            }
            room
        }

        fn gate(&self) -> Gate<'_, RecordingDisplay, RecordingTone> {
            Gate::new(&self.pool, &self.status, &self.alert)
        }

        fn display(&self) -> RecordingDisplay {
            block_on(self.status.with_device(|display| display.clone()))
        }

        fn beeps(&self) -> Vec<Beep> {
            block_on(self.alert.with_tone(|tone| tone.beeps.clone()))
        }
    }

    #[test]
    fn phases_follow_a_press() {
        let idle = ButtonPhase::Idle;
        assert_eq!(idle.next(false), ButtonPhase::Idle);
        assert_eq!(idle.next(true), ButtonPhase::Asserted);
        assert_eq!(ButtonPhase::Asserted.next(true), ButtonPhase::Settling);
        assert_eq!(ButtonPhase::Settling.next(true), ButtonPhase::Idle);

        assert_eq!(ButtonPhase::Idle.dwell(), Some(POLL_INTERVAL));
        assert_eq!(ButtonPhase::Asserted.dwell(), None);
        assert_eq!(ButtonPhase::Settling.dwell(), Some(SETTLE_INTERVAL));
    }

    #[test]
    fn ready_shows_an_empty_room() {
        let room = Room::new();
        block_on(room.gate().announce_ready());

        let display = room.display();
        assert_eq!(display.messages(), vec![READY]);
        assert_eq!(display.levels, Some(Occupancy::Empty.levels()));
    }

    #[test]
    fn filling_the_room_then_rejecting() {
        let room = Room::new();
        let gate = room.gate();

        for expected in 1..=CAPACITY {
            assert_eq!(block_on(gate.admit()), Admission::Admitted(expected));
        }
        assert_eq!(room.display().levels, Some(Occupancy::Full.levels()));
        assert!(room.beeps().is_empty());

        assert_eq!(block_on(gate.admit()), Admission::Rejected);
        assert_eq!(room.pool.outstanding_count(), CAPACITY);

        let display = room.display();
        let last = display.frames.last().unwrap();
        assert_eq!(last.message, CAPACITY_FULL);
        assert_eq!(last.line, "Users: 8");
        assert_eq!(display.levels, Some(Occupancy::Full.levels()));
        assert_eq!(room.beeps().len(), 1);
    }

    #[test]
    fn leaving_a_full_room_turns_the_indicator_yellow() {
        let room = Room::with_occupancy(CAPACITY);
        assert_eq!(block_on(room.gate().depart()), Departure::Departed(7));

        let display = room.display();
        assert_eq!(display.messages(), vec![EXIT_AUTHORIZED]);
        assert_eq!(display.levels, Some([true, true, false]));
    }

    #[test]
    fn reset_clears_the_room_and_chimes_twice() {
        let room = Room::with_occupancy(5);
        assert_eq!(block_on(room.gate().reset()), 5);
        assert_eq!(room.pool.outstanding_count(), 0);

        let display = room.display();
        assert_eq!(display.messages(), vec![SYSTEM_RESET]);
        assert_eq!(display.frames[0].line, "Users: 0");
        assert_eq!(display.levels, Some([false, false, true]));
        assert_eq!(room.beeps().len(), 2);
    }

    #[test]
    fn reset_works_from_empty_and_full() {
        for count in [0, CAPACITY] {
            let room = Room::with_occupancy(count);
            assert_eq!(block_on(room.gate().reset()), count);
            assert_eq!(room.pool.outstanding_count(), 0);
        }
    }

    #[test]
    fn leaving_an_empty_room_is_silent() {
        let room = Room::new();
        assert_eq!(block_on(room.gate().depart()), Departure::AlreadyEmpty);

        let display = room.display();
        assert!(display.frames.is_empty());
        assert_eq!(display.levels, None);
        assert!(room.beeps().is_empty());
        assert_eq!(room.pool.outstanding_count(), 0);
    }

    #[test]
    fn two_triggers_before_wakeup_reset_once() {
        let room = Room::with_occupancy(3);
        let gate = room.gate();
        let signal = ResetSignal::new();

        signal.trigger();
        signal.trigger();

        let outcome = block_on(select(run_reset(&signal, &gate), async {
            for _ in 0..50 {
                Timer::after_millis(20).await;
            }
        }));
        assert!(matches!(outcome, Either::Second(())));

        let display = room.display();
        assert_eq!(display.messages(), vec![SYSTEM_RESET]);
        assert_eq!(room.beeps().len(), 2);
        assert!(!signal.is_pending());
    }

    #[test]
    fn bounce_during_reset_is_ignored() {
        let room = Room::with_occupancy(4);
        let gate = room.gate();
        let signal = ResetSignal::new();

        signal.trigger();
        let outcome = block_on(select(run_reset(&signal, &gate), async {
            Timer::after_millis(5).await;
            signal.trigger();
            Timer::after_millis(995).await;
        }));
        assert!(matches!(outcome, Either::Second(())));

        assert_eq!(room.display().messages(), vec![SYSTEM_RESET]);
        assert_eq!(room.beeps().len(), 2);
        assert!(!signal.is_pending());
    }

    #[test]
    fn press_after_settling_resets_again() {
        let room = Room::with_occupancy(4);
        let gate = room.gate();
        let signal = ResetSignal::new();

        signal.trigger();
        let outcome = block_on(select(run_reset(&signal, &gate), async {
            Timer::after(RESET_CYCLE + SETTLE_INTERVAL).await;
            assert!(room.pool.try_acquire());
            signal.trigger();
            Timer::after(RESET_CYCLE + SETTLE_INTERVAL).await;
        }));
        assert!(matches!(outcome, Either::Second(())));

        assert_eq!(room.display().messages(), vec![SYSTEM_RESET, SYSTEM_RESET]);
        assert_eq!(room.beeps().len(), 4);
        assert_eq!(room.pool.outstanding_count(), 0);
    }

    // render plus the two-pulse chime, with margin
    const RESET_CYCLE: Duration = Duration::from_millis(300);

    #[test]
    fn display_ends_on_the_latest_count() {
        let room = Room::with_display(RecordingDisplay::slow());
        for _ in 0..4 {
            assert!(room.pool.try_acquire());
        }
        let gate = room.gate();

        block_on(join3(gate.admit(), gate.reset(), gate.admit()));

        let count = room.pool.outstanding_count();
        let display = room.display();
        assert_eq!(display.frames.len(), 3);
        assert_eq!(display.frames.last().unwrap().line, count_line(count).as_str());
        assert_eq!(display.levels, Some(Occupancy::classify(count).levels()));
    }

    #[test]
    fn one_press_admits_once() {
        let room = Room::new();
        let gate = room.gate();
        let button = ScriptedButton::new(&[false, true, false, false]);

        let outcome = block_on(select(run_entry(button, &gate), async {
            Timer::after(POLL_INTERVAL * 6 + SETTLE_INTERVAL).await;
        }));
        assert!(matches!(outcome, Either::Second(())));

        assert_eq!(room.pool.outstanding_count(), 1);
        assert_eq!(room.display().messages(), vec![ENTRY_AUTHORIZED]);
    }

    #[test]
    fn holding_entry_down_repeats_after_settling() {
        let room = Room::new();
        let gate = room.gate();
        let button = ScriptedButton::new(&[true, true]);

        let outcome = block_on(select(run_entry(button, &gate), async {
            Timer::after(POLL_INTERVAL * 2 + SETTLE_INTERVAL * 2).await;
        }));
        assert!(matches!(outcome, Either::Second(())));

        assert_eq!(room.pool.outstanding_count(), 2);
    }

    #[test]
    fn exit_loop_releases_one_place_per_press() {
        let room = Room::with_occupancy(2);
        let gate = room.gate();
        let button = ScriptedButton::new(&[true]);

        let outcome = block_on(select(run_exit(button, &gate), async {
            Timer::after(POLL_INTERVAL * 4 + SETTLE_INTERVAL).await;
        }));
        assert!(matches!(outcome, Either::Second(())));

        assert_eq!(room.pool.outstanding_count(), 1);
        assert_eq!(room.display().messages(), vec![EXIT_AUTHORIZED]);
    }
}
