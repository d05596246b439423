//! Hover tooltip behavior as a pure state machine
//!
//! The front end feeds pointer events and periodic ticks into
//! [`Tooltip::update`] and renders the returned [`TooltipChange`]. No timers
//! are owned here; deadlines are compared against the `now` passed in.

use std::time::{Duration, Instant};

/// Delay between pointer enter and the popup
pub const SHOW_DELAY: Duration = Duration::from_millis(500);
/// A visible popup hides itself after this long
pub const AUTO_HIDE: Duration = Duration::from_secs(5);
/// Popup offset from the last pointer position
pub const POINTER_OFFSET: (i32, i32) = (10, 10);
/// Popup offset from the widget origin when the pointer position is unknown
pub const WIDGET_OFFSET: (i32, i32) = (20, 20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipEvent {
    /// Pointer entered the widget whose top-left corner is `origin`
    Enter { origin: (i32, i32) },
    /// Pointer moved to screen coordinates
    Motion { x: i32, y: i32 },
    Leave,
    Click,
    /// Time passed; fire any due deadline
    Tick,
}

/// What the front end has to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipChange {
    Shown { x: i32, y: i32 },
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Pending { show_at: Instant },
    Visible { hide_at: Instant },
}

#[derive(Debug, Clone)]
pub struct Tooltip {
    text: String,
    state: State,
    origin: (i32, i32),
    pointer: Option<(i32, i32)>,
}

impl Tooltip {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            state: State::Idle,
            origin: (0, 0),
            pointer: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        matches!(self.state, State::Visible { .. })
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, State::Pending { .. })
    }

    /// Feed one event; returns the visible change, if any
    pub fn update(&mut self, event: TooltipEvent, now: Instant) -> Option<TooltipChange> {
        match event {
            TooltipEvent::Enter { origin } => {
                self.origin = origin;
                self.pointer = None;
                if !self.is_visible() {
                    self.state = State::Pending {
                        show_at: now + SHOW_DELAY,
                    };
                }
                None
            },
            TooltipEvent::Motion { x, y } => {
                self.pointer = Some((x, y));
                None
            },
            TooltipEvent::Leave | TooltipEvent::Click => self.hide(),
            TooltipEvent::Tick => self.tick(now),
        }
    }

    fn tick(&mut self, now: Instant) -> Option<TooltipChange> {
        match self.state {
            State::Pending { show_at } if now >= show_at => {
                if self.text.is_empty() {
                    self.state = State::Idle;
                    return None;
                }
                let (x, y) = self.popup_position();
                self.state = State::Visible {
                    hide_at: now + AUTO_HIDE,
                };
                Some(TooltipChange::Shown { x, y })
            },
            State::Visible { hide_at } if now >= hide_at => self.hide(),
            _ => None,
        }
    }

    fn hide(&mut self) -> Option<TooltipChange> {
        let was_visible = self.is_visible();
        self.state = State::Idle;
        was_visible.then_some(TooltipChange::Hidden)
    }

    fn popup_position(&self) -> (i32, i32) {
        match self.pointer {
            Some((x, y)) => (x + POINTER_OFFSET.0, y + POINTER_OFFSET.1),
            None => (self.origin.0 + WIDGET_OFFSET.0, self.origin.1 + WIDGET_OFFSET.1),
        }
    }
}
