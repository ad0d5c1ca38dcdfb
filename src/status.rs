/*
 * The status output: a text display plus the tri-colour indicator, shared by
 * the entry, exit and reset coordinators.
 *
 * The device sits inside an async mutex. Holding the guard is holding the
 * output; one render at a time writes the message, the count line and the
 * indicator, so concurrent updates can never interleave on the display. The
 * guard is dropped on every path out of `render`, failures included.
 */

pub mod indicator;

use core::fmt::Write;

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    mutex::{Mutex, MutexGuard},
};
use heapless::String;

use crate::config::STATUS_LINE_CAPACITY;
use crate::error::StatusError;
pub use indicator::{Channel, Levels, Occupancy};

pub const READY: &str = "System ready";
pub const ENTRY_AUTHORIZED: &str = "Entry authorized";
pub const CAPACITY_FULL: &str = "Capacity full!";
pub const EXIT_AUTHORIZED: &str = "Exit authorized";
pub const SYSTEM_RESET: &str = "System reset";

pub type StatusLine = String<STATUS_LINE_CAPACITY>;

/// The physical status output: something that shows two lines of text and
/// drives three indicator channels.
#[allow(async_fn_in_trait)]
pub trait StatusDevice {
    type Error;

    async fn show(&mut self, message: &str, line: &str) -> Result<(), Self::Error>;

    fn indicate(&mut self, levels: Levels);
}

pub struct StatusPresenter<D> {
    output: Mutex<CriticalSectionRawMutex, D>,
}

/// Exclusive hold on the output device. Dropping it frees the output.
pub struct StatusOutput<'a, D> {
    device: MutexGuard<'a, CriticalSectionRawMutex, D>,
}

// "Users: " plus the widest usize.
const _: () = assert!(STATUS_LINE_CAPACITY >= "Users: ".len() + 20);

/// The count line as it appears below the message.
pub fn count_line(count: usize) -> StatusLine {
    let mut line = StatusLine::new();
    // cannot overflow, see the assertion above
    let _ = write!(line, "Users: {}", count);
    line
}

impl<D: StatusDevice> StatusPresenter<D> {
    pub const fn new(device: D) -> Self {
        StatusPresenter {
            output: Mutex::new(device),
        }
    }

    /// Wait until no other task is rendering and hold the output. A state
    /// change made while holding it reaches the display before any change
    /// made after it.
    pub async fn claim(&self) -> StatusOutput<'_, D> {
        StatusOutput {
            device: self.output.lock().await,
        }
    }

    /// Show `message` and `count`, and set the indicator for `count`. Waits
    /// for the output if another task is rendering. Failures are logged, the
    /// caller carries on either way.
    pub async fn render(&self, message: &str, count: usize) {
        self.claim().await.render(message, count).await
    }

    pub async fn try_render(
        &self,
        message: &str,
        count: usize,
    ) -> Result<(), StatusError<D::Error>> {
        self.claim().await.try_render(message, count).await
    }

    /// Run `f` with exclusive access to the output device.
    pub async fn with_device<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        let mut output = self.output.lock().await;
        f(&mut *output)
    }
}

impl<D: StatusDevice> StatusOutput<'_, D> {
    pub async fn render(&mut self, message: &str, count: usize) {
        if self.try_render(message, count).await.is_err() {
            warn!("status update '{}' for count {} was not shown", message, count);
        }
    }

    pub async fn try_render(
        &mut self,
        message: &str,
        count: usize,
    ) -> Result<(), StatusError<D::Error>> {
        self.device.indicate(Occupancy::classify(count).levels());
        self.device
            .show(message, &count_line(count))
            .await
            .map_err(StatusError::Device)
    }
}
