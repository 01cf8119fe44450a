//! Button-driven counter for the static frame variant.
//!
//! Each post carries the previous count and the pressed button; the reply is
//! the next count and the caption to render.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameButton {
    Tap,
    Reset,
    Link,
}

impl FrameButton {
    /// Buttons are numbered from 1 as they are laid out: Tap, Reset, Link.
    /// Anything unrecognised behaves like Reset.
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => FrameButton::Tap,
            3 => FrameButton::Link,
            _ => FrameButton::Reset,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FrameButton::Tap => "Tap!",
            FrameButton::Reset => "Reset",
            FrameButton::Link => "Play the full game",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameState {
    pub count: u32,
}

impl FrameState {
    pub fn new(count: u32) -> Self {
        Self { count }
    }

    /// Link leaves the frame, so the count it carries is kept
    pub fn apply(self, button: FrameButton) -> Self {
        match button {
            FrameButton::Tap => Self {
                count: self.count.saturating_add(1),
            },
            FrameButton::Reset => Self::default(),
            FrameButton::Link => self,
        }
    }

    pub fn caption(&self) -> &'static str {
        if self.count == 0 {
            "Start tapping!"
        } else {
            "Great job! Keep going!"
        }
    }
}

/// Everything a renderer needs for the next frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReply {
    pub state: FrameState,
    pub caption: &'static str,
    pub buttons: Vec<&'static str>,
}

pub fn respond(previous: FrameState, button_index: u8) -> FrameReply {
    let state = previous.apply(FrameButton::from_index(button_index));
    FrameReply {
        state,
        caption: state.caption(),
        buttons: [FrameButton::Tap, FrameButton::Reset, FrameButton::Link]
            .iter()
            .map(|b| b.label())
            .collect(),
    }
}
