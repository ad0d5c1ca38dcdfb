/*
 * The tri-colour indicator. Its state is derived from the occupancy count and
 * nothing else.
 */

use enum_ordinalize::Ordinalize;

use crate::config::CAPACITY;

#[derive(Ordinalize, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

/// Levels for the indicator, indexed by `Channel::ordinal()`. `true` is lit.
pub type Levels = [bool; Channel::VARIANT_COUNT];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Occupancy {
    Empty,
    Normal,
    NearFull,
    Full,
}

impl Occupancy {
    pub fn classify(count: usize) -> Self {
        match count {
            0 => Occupancy::Empty,
            count if count >= CAPACITY => Occupancy::Full,
            count if count == CAPACITY - 1 => Occupancy::NearFull,
            _ => Occupancy::Normal,
        }
    }

    pub fn red(&self) -> bool {
        match self {
            Occupancy::Full | Occupancy::NearFull => true,
            Occupancy::Empty | Occupancy::Normal => false,
        }
    }

    pub fn green(&self) -> bool {
        match self {
            Occupancy::Normal | Occupancy::NearFull => true,
            Occupancy::Empty | Occupancy::Full => false,
        }
    }

    pub fn blue(&self) -> bool {
        match self {
            Occupancy::Empty => true,
            Occupancy::Normal | Occupancy::NearFull | Occupancy::Full => false,
        }
    }

    pub fn levels(&self) -> Levels {
        let mut levels = [false; Channel::VARIANT_COUNT];
        levels[Channel::Red.ordinal()] = self.red();
        levels[Channel::Green.ordinal()] = self.green();
        levels[Channel::Blue.ordinal()] = self.blue();
        levels
    }
}
