//! Input abstraction layer.
//!
//! Normalizes host pointer, wheel and keyboard events into one
//! [`InputEvent`] enum consumed by interactions. Pointer events carry the
//! host-resolved target element (the DOM-style `event.target`), or `None`
//! when the pointer is outside the rendered document.

use ig_core::ElementId;
use std::cell::Cell;

/// Keyboard modifier snapshot attached to every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    /// Platform command modifier: ⌘ on macOS, Ctrl elsewhere.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        button: PointerButton,
        target: Option<ElementId>,
        modifiers: Modifiers,
    },
    PointerMove {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    PointerUp {
        x: f64,
        y: f64,
        target: Option<ElementId>,
        modifiers: Modifiers,
    },
    /// Single click, delivered after pointer-up.
    Click {
        target: Option<ElementId>,
        modifiers: Modifiers,
    },
    DoubleClick {
        target: Option<ElementId>,
        modifiers: Modifiers,
    },
    Wheel {
        x: f64,
        y: f64,
        /// Positive scrolls down / zooms out.
        delta_y: f64,
        modifiers: Modifiers,
    },
    KeyDown {
        key: String,
        modifiers: Modifiers,
    },
    KeyUp {
        key: String,
        modifiers: Modifiers,
    },
    /// Text typed into an active inline editor.
    TextInput { text: String },
    /// The event stream ended without a qualifying completion
    /// (pointer cancel, focus loss, teardown).
    Cancel,
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64, target: Option<ElementId>) -> Self {
        Self::PointerDown {
            x,
            y,
            button: PointerButton::Primary,
            target,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f64, y: f64, target: Option<ElementId>) -> Self {
        Self::PointerUp {
            x,
            y,
            target,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn click(target: Option<ElementId>) -> Self {
        Self::Click {
            target,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        Self::KeyDown {
            key: key.to_string(),
            modifiers,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::Wheel { x, y, .. } => Some((*x, *y)),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> Option<Modifiers> {
        match self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. }
            | Self::Click { modifiers, .. }
            | Self::DoubleClick { modifiers, .. }
            | Self::Wheel { modifiers, .. }
            | Self::KeyDown { modifiers, .. }
            | Self::KeyUp { modifiers, .. } => Some(*modifiers),
            Self::TextInput { .. } | Self::Cancel => None,
        }
    }
}

/// Live modifier-key state, owned by the coordinator.
///
/// Updated from every dispatched event so interactions can ask "is Shift
/// held right now" without listening to the keyboard themselves.
#[derive(Debug, Default)]
pub struct ModifierState {
    shift: Cell<bool>,
    ctrl: Cell<bool>,
    alt: Cell<bool>,
    meta: Cell<bool>,
}

impl ModifierState {
    pub fn observe(&self, event: &InputEvent) {
        if let Some(m) = event.modifiers() {
            self.set(m);
        }
        // Key events for a modifier itself report the state before the change.
        match event {
            InputEvent::KeyDown { key, .. } => self.set_key(key, true),
            InputEvent::KeyUp { key, .. } => self.set_key(key, false),
            InputEvent::Cancel => self.reset(),
            _ => {}
        }
    }

    fn set(&self, m: Modifiers) {
        self.shift.set(m.shift);
        self.ctrl.set(m.ctrl);
        self.alt.set(m.alt);
        self.meta.set(m.meta);
    }

    fn set_key(&self, key: &str, down: bool) {
        match key {
            "Shift" => self.shift.set(down),
            "Control" => self.ctrl.set(down),
            "Alt" => self.alt.set(down),
            "Meta" => self.meta.set(down),
            _ => {}
        }
    }

    pub fn current(&self) -> Modifiers {
        Modifiers {
            shift: self.shift.get(),
            ctrl: self.ctrl.get(),
            alt: self.alt.get(),
            meta: self.meta.get(),
        }
    }

    pub fn shift(&self) -> bool {
        self.shift.get()
    }

    pub fn reset(&self) {
        self.set(Modifiers::NONE);
    }
}
