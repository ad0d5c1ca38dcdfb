#![cfg_attr(not(test), no_std)]

/*
 * Access control for a room with a fixed number of places.
 *
 * Everything in this library is independent of the board it runs on. The
 * firmware binary owns the pins and peripherals and hands them to the
 * coordinators through the small traits in `gate` and `status`. That split
 * keeps all coordination logic testable on the host.
 */

#[macro_use]
mod fmt;

pub mod alert;
pub mod config;
pub mod error;
pub mod gate;
pub mod status;

#[cfg(test)]
mod testing;

pub use alert::{Annunciator, Chime, Tone};
pub use error::StatusError;
pub use gate::capacity::CapacityPool;
pub use gate::reset::ResetSignal;
pub use gate::{Button, ButtonPhase, Gate};
pub use status::{Occupancy, StatusDevice, StatusPresenter};
