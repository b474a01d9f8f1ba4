use serde::Deserialize;
use strum_macros::IntoStaticStr;

/// Raw value reported in place of a reading when the state could not be
/// obtained.
pub const UNKNOWN_STATE: i64 = -1;

/// Payload of a `GetMdState` reply.
#[derive(Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub struct MotionStateValue {
    pub state: i64,
}

/// Motion detection state for one poll tick.
///
/// `Unknown` means no reading was obtained. It is neither motion nor the
/// absence of motion, and must never be folded into either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum MotionState {
    /// Device reported `0`.
    NoMotion,
    /// Device reported a nonzero value, kept as is.
    Motion(i64),
    /// Transport, status or parse failure.
    Unknown,
}

impl MotionState {
    /// Classify a value the device reported. Only an exact `0` is
    /// no motion.
    pub fn from_reported(state: i64) -> Self {
        if state == 0 {
            MotionState::NoMotion
        } else {
            MotionState::Motion(state)
        }
    }

    /// Integer form, `-1` for `Unknown`.
    pub fn raw(&self) -> i64 {
        match self {
            MotionState::NoMotion => 0,
            MotionState::Motion(state) => *state,
            MotionState::Unknown => UNKNOWN_STATE,
        }
    }

    /// Line written to the log for a tick with this state.
    pub fn message(&self) -> &'static str {
        match self {
            MotionState::NoMotion => "No motion detected.",
            MotionState::Motion(_) => "Motion detected!",
            MotionState::Unknown => "Motion state unknown.",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, MotionState::Unknown)
    }
}
