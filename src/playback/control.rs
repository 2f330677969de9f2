//! Horizontal seek slider driven by pointer press/move/release.

type Callback = Box<dyn FnMut(f64)>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerPhase {
    Press,
    Move,
    Release,
}

/// A pointer event in screen coordinates, independent of the input device.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub x: f64,
}

impl PointerEvent {
    pub fn press(x: f64) -> Self {
        Self { phase: PointerPhase::Press, x }
    }

    pub fn moved(x: f64) -> Self {
        Self { phase: PointerPhase::Move, x }
    }

    pub fn release(x: f64) -> Self {
        Self { phase: PointerPhase::Release, x }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum DragState {
    Idle,
    Dragging,
}

/// A 0-100 position slider.
///
/// `on_start` fires once per press before the first recompute, `on_change`
/// fires on every value update (pointer or `set_value`), and `on_end` fires
/// once per release that closes a press.
pub struct PositionControl {
    value: f64,
    state: DragState,
    left: f64,
    width: f64,
    on_start: Option<Callback>,
    on_change: Option<Callback>,
    on_end: Option<Callback>,
}

impl Default for PositionControl {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionControl {
    pub fn new() -> Self {
        Self {
            value: 0.0,
            state: DragState::Idle,
            left: 0.0,
            width: 0.0,
            on_start: None,
            on_change: None,
            on_end: None,
        }
    }

    pub fn on_start(&mut self, f: impl FnMut(f64) + 'static) {
        self.on_start = Some(Box::new(f));
    }

    pub fn on_change(&mut self, f: impl FnMut(f64) + 'static) {
        self.on_change = Some(Box::new(f));
    }

    pub fn on_end(&mut self, f: impl FnMut(f64) + 'static) {
        self.on_end = Some(Box::new(f));
    }

    /// Update the track geometry used to map pointer x to a value.
    pub fn set_bounds(&mut self, left: f64, width: f64) {
        self.left = left;
        self.width = width;
    }

    /// True when `x` falls on the slider track.
    pub fn contains(&self, x: f64) -> bool {
        self.width > 0.0 && x >= self.left && x < self.left + self.width
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_dragging(&self) -> bool {
        self.state == DragState::Dragging
    }

    /// Programmatic update. Never starts or ends a drag.
    pub fn set_value(&mut self, percent: f64) {
        self.value = clamp_percent(percent);
        self.emit_change();
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event.phase {
            PointerPhase::Press => self.press(event.x),
            PointerPhase::Move => self.move_to(event.x),
            PointerPhase::Release => self.release(),
        }
    }

    fn press(&mut self, x: f64) {
        self.state = DragState::Dragging;
        if let Some(f) = self.on_start.as_mut() {
            f(self.value);
        }
        self.update_from_pointer(x);
    }

    fn move_to(&mut self, x: f64) {
        if self.state == DragState::Dragging {
            self.update_from_pointer(x);
        }
    }

    fn release(&mut self) {
        if self.state != DragState::Dragging {
            return;
        }
        self.state = DragState::Idle;
        if let Some(f) = self.on_end.as_mut() {
            f(self.value);
        }
    }

    fn update_from_pointer(&mut self, x: f64) {
        if self.width.is_nan() || self.width <= 0.0 {
            return;
        }
        self.value = clamp_percent((x - self.left) / self.width * 100.0);
        self.emit_change();
    }

    fn emit_change(&mut self) {
        if let Some(f) = self.on_change.as_mut() {
            f(self.value);
        }
    }
}

fn clamp_percent(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) }
}
