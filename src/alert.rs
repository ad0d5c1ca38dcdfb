/*
 * The buzzer. Entry rejections and reset confirmations both use it, so it is
 * shared through a mutex and a chime always plays to the end before the next
 * one starts.
 */

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};
use embassy_time::{Duration, Timer};

use crate::config::{ALERT_FREQUENCY_HZ, PULSE_GAP, REJECT_PULSE, RESET_PULSE};

/// A tone generator. `beep` returns once the tone has sounded for `duration`.
#[allow(async_fn_in_trait)]
pub trait Tone {
    async fn beep(&mut self, duration: Duration, frequency_hz: u32);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Chime {
    /// Somebody pressed entry while the room is full.
    Rejected,
    /// The count was cleared.
    Reset,
}

impl Chime {
    pub fn pulses(&self) -> usize {
        match self {
            Chime::Rejected => 1,
            Chime::Reset => 2,
        }
    }

    pub fn pulse_duration(&self) -> Duration {
        match self {
            Chime::Rejected => REJECT_PULSE,
            Chime::Reset => RESET_PULSE,
        }
    }

    pub fn frequency_hz(&self) -> u32 {
        ALERT_FREQUENCY_HZ
    }
}

pub struct Annunciator<T> {
    tone: Mutex<CriticalSectionRawMutex, T>,
}

impl<T: Tone> Annunciator<T> {
    pub const fn new(tone: T) -> Self {
        Annunciator {
            tone: Mutex::new(tone),
        }
    }

    pub async fn sound(&self, chime: Chime) {
        let mut tone = self.tone.lock().await;
        for pulse in 0..chime.pulses() {
            if pulse > 0 {
                Timer::after(PULSE_GAP).await;
            }
            tone.beep(chime.pulse_duration(), chime.frequency_hz()).await;
        }
    }

    /// Run `f` with exclusive access to the tone generator.
    pub async fn with_tone<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut tone = self.tone.lock().await;
        f(&mut *tone)
    }
}
