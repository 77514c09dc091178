//! Link hit regions and pointer interaction.
//!
//! Measurement records one rectangle per contiguous run of a link on a line.
//! The tracker hit-tests those rectangles and runs a small state machine per
//! frame that turns pointer samples into enter, leave, press, release and
//! click events.

use std::collections::HashMap;

use crate::geometry::{Point, Rect, Vector};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MouseButtons: u8 {
        const LEFT = 1;
        const RIGHT = 2;
        const MIDDLE = 4;
    }
}

/// One pointer sample, in the coordinate space of the measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
    pub position: Point,
    /// Buttons currently held.
    pub buttons: MouseButtons,
}

impl Pointer {
    pub fn new(position: Point, buttons: MouseButtons) -> Self {
        Self { position, buttons }
    }

    pub fn translated(&self, by: Vector) -> Self {
        Self {
            position: self.position + by,
            buttons: self.buttons,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkState {
    #[default]
    Clear,
    /// Pointer over the link with no button held.
    Hovered,
    /// Pressed on the link and still over it.
    Active,
    /// Pressed on the link and dragged off it.
    ActiveNotHovered,
}

/// Interaction events. Each carries the index of the record that opened the
/// link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    Enter(usize),
    Leave(usize),
    Down(usize),
    Up(usize),
    /// Pressed and released on the same link.
    Click(usize),
}

impl LinkEvent {
    pub fn record_index(&self) -> usize {
        match *self {
            Self::Enter(i) | Self::Leave(i) | Self::Down(i) | Self::Up(i) | Self::Click(i) => i,
        }
    }
}

/// Rectangle covered by one run of a link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkBoundary {
    pub record_index: usize,
    pub rect: Rect,
}

#[derive(Debug, Default)]
pub struct LinkTracker {
    boundaries: Vec<LinkBoundary>,
    /// Links currently held down, with the buttons that pressed them.
    pressed: HashMap<usize, MouseButtons, fxhash::FxBuildHasher>,
    interacted: Option<usize>,
    state: LinkState,
    previous_buttons: MouseButtons,
}

impl LinkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, boundary: LinkBoundary) {
        self.boundaries.push(boundary);
    }

    pub fn boundaries(&self) -> &[LinkBoundary] {
        &self.boundaries
    }

    /// Drops the rectangles but keeps the interaction state, so a link
    /// stays hovered across a re-measure.
    pub fn clear_boundaries(&mut self) {
        self.boundaries.clear();
    }

    pub fn translate(&mut self, by: Vector) {
        for boundary in &mut self.boundaries {
            boundary.rect = boundary.rect.translate(by);
        }
    }

    /// First rectangle, in accumulation order, containing `point`.
    pub fn hit_test(&self, point: Point) -> Option<&LinkBoundary> {
        self.boundaries.iter().find(|b| b.rect.contains(point))
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Record index of the link being hovered or pressed.
    pub fn interacted(&self) -> Option<usize> {
        self.interacted
    }

    /// Advances the state machine by one pointer sample.
    ///
    /// Returns `true` while a link is hovered or pressed.
    pub fn handle_pointer(
        &mut self,
        pointer: &Pointer,
        on_event: &mut dyn FnMut(LinkEvent),
    ) -> bool {
        let hit = self.hit_test(pointer.position).map(|b| b.record_index);
        let newly_pressed = pointer.buttons - self.previous_buttons;
        self.previous_buttons = pointer.buttons;

        match (self.state, self.interacted) {
            (LinkState::Hovered, Some(link)) => {
                if hit != Some(link) {
                    on_event(LinkEvent::Leave(link));
                    self.clear();
                    self.try_enter(hit, pointer.buttons, on_event);
                } else if !newly_pressed.is_empty() {
                    self.pressed.insert(link, newly_pressed);
                    self.state = LinkState::Active;
                    on_event(LinkEvent::Down(link));
                }
            }
            (LinkState::Active | LinkState::ActiveNotHovered, Some(link)) => {
                let pressed_with = self.pressed.get(&link).copied().unwrap_or_default();
                if !pointer.buttons.intersects(pressed_with) {
                    self.pressed.remove(&link);
                    on_event(LinkEvent::Up(link));
                    if self.state == LinkState::Active && hit == Some(link) {
                        on_event(LinkEvent::Click(link));
                        self.state = LinkState::Hovered;
                    } else {
                        on_event(LinkEvent::Leave(link));
                        self.clear();
                        self.try_enter(hit, pointer.buttons, on_event);
                    }
                } else if hit == Some(link) {
                    self.state = LinkState::Active;
                } else {
                    self.state = LinkState::ActiveNotHovered;
                }
            }
            _ => {
                self.clear();
                self.try_enter(hit, pointer.buttons, on_event);
            }
        }

        self.state != LinkState::Clear
    }

    fn try_enter(
        &mut self,
        hit: Option<usize>,
        buttons: MouseButtons,
        on_event: &mut dyn FnMut(LinkEvent),
    ) {
        if let Some(link) = hit
            && buttons.is_empty()
        {
            self.interacted = Some(link);
            self.state = LinkState::Hovered;
            on_event(LinkEvent::Enter(link));
        }
    }

    fn clear(&mut self) {
        self.interacted = None;
        self.state = LinkState::Clear;
    }

    /// Forgets rectangles and interaction state.
    pub fn reset(&mut self) {
        self.boundaries.clear();
        self.pressed.clear();
        self.interacted = None;
        self.state = LinkState::Clear;
        self.previous_buttons = MouseButtons::empty();
    }

    pub fn is_reset(&self) -> bool {
        self.boundaries.is_empty()
            && self.pressed.is_empty()
            && self.interacted.is_none()
            && self.state == LinkState::Clear
    }
}
