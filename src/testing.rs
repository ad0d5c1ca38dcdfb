// Test doubles for the peripherals the coordinators talk to.

use std::collections::VecDeque;

use embassy_futures::yield_now;
use embassy_time::Duration;

use crate::alert::Tone;
use crate::gate::Button;
use crate::status::{Levels, StatusDevice};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub message: String,
    pub line: String,
}

impl Frame {
    pub fn new(message: &str, line: &str) -> Self {
        Frame {
            message: message.into(),
            line: line.into(),
        }
    }
}

/// Remembers every frame and the last indicator levels. A slow display yields
/// after each character it writes to the transcript, giving other tasks every
/// chance to interleave.
#[derive(Clone, Debug, Default)]
pub struct RecordingDisplay {
    pub frames: Vec<Frame>,
    pub levels: Option<Levels>,
    pub transcript: String,
    failing: bool,
    slow: bool,
}

impl RecordingDisplay {
    pub fn failing() -> Self {
        RecordingDisplay {
            failing: true,
            ..Default::default()
        }
    }

    pub fn slow() -> Self {
        RecordingDisplay {
            slow: true,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<&str> {
        self.frames.iter().map(|frame| frame.message.as_str()).collect()
    }
}

impl StatusDevice for RecordingDisplay {
    type Error = ();

    async fn show(&mut self, message: &str, line: &str) -> Result<(), ()> {
        if self.failing {
            return Err(());
        }

        for c in message.chars().chain(Some('|')).chain(line.chars()).chain(Some('\n')) {
            self.transcript.push(c);
            if self.slow {
                yield_now().await;
            }
        }
        self.frames.push(Frame::new(message, line));
        Ok(())
    }

    fn indicate(&mut self, levels: Levels) {
        self.levels = Some(levels);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Beep {
    pub duration: Duration,
    pub frequency_hz: u32,
}

#[derive(Clone, Debug, Default)]
pub struct RecordingTone {
    pub beeps: Vec<Beep>,
}

impl Tone for RecordingTone {
    async fn beep(&mut self, duration: Duration, frequency_hz: u32) {
        self.beeps.push(Beep {
            duration,
            frequency_hz,
        });
    }
}

/// Plays back a fixed sequence of samples, then reads released forever.
#[derive(Debug, Default)]
pub struct ScriptedButton {
    samples: VecDeque<bool>,
}

impl ScriptedButton {
    pub fn new(samples: &[bool]) -> Self {
        ScriptedButton {
            samples: samples.iter().copied().collect(),
        }
    }
}

impl Button for ScriptedButton {
    fn is_asserted(&mut self) -> bool {
        self.samples.pop_front().unwrap_or(false)
    }
}
