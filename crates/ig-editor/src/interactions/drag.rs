use super::{Handled, Interaction};
use crate::commands::{Command, UpdateElement};
use crate::coordinator::{Exclusive, ExclusiveToken, InteractionId, SelectMode};
use crate::editor::EditorContext;
use crate::error::EditError;
use crate::input::{InputEvent, PointerButton};
use crate::snap::snap_offset;
use async_trait::async_trait;
use ig_core::hit::resolve_editable;
use ig_core::{Attrs, ElementId, Point, Rect};
use kurbo::Vec2;
use serde_json::json;

/// One element moved by the gesture.
struct Moved {
    id: ElementId,
    /// `x`/`y` exactly as they were (absent keys read as null).
    original: Attrs,
    origin: Point,
}

struct DragSession {
    grabbed: ElementId,
    start: Point,
    /// Shift was held at press: the grabbed element joins the selection.
    additive: bool,
    /// Bounds of the grabbed element at drag start; snapping runs on it.
    anchor: Rect,
    siblings: Vec<Rect>,
    /// Empty until the pointer first moves.
    moved: Vec<Moved>,
    offset: Vec2,
    _token: ExclusiveToken,
}

/// Move the selection by dragging one of its elements.
///
/// The first movement selects the grabbed element if it is not selected
/// yet (Shift at press adds), so a press without movement leaves selection
/// to click-select, and the click that trails a moving release is not a
/// selection click. The elements follow the pointer live, snapping on the
/// grabbed element's edges; release submits one batch of `UpdateElement`
/// commands when the position changed.
pub struct Drag {
    id: InteractionId,
    session: Option<DragSession>,
}

impl Drag {
    pub fn new() -> Self {
        Self {
            id: InteractionId::new("drag"),
            session: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    fn begin(&mut self, x: f64, y: f64, target: Option<ElementId>, cx: &EditorContext) -> Handled {
        let state = &cx.state;
        let Some(grabbed) = target.and_then(|t| state.with_tree(|tree| resolve_editable(tree, t)))
        else {
            return Handled::Ignored;
        };
        let Some(anchor) = state.with_tree(|tree| tree.bounds(grabbed)) else {
            return Handled::Ignored;
        };
        let token = match cx.coordinator.acquire(self.id) {
            Exclusive::Ran(token) => token,
            Exclusive::Inactive | Exclusive::Busy(_) => return Handled::Ignored,
        };
        log::trace!("drag armed on {grabbed}");
        self.session = Some(DragSession {
            grabbed,
            start: Point::new(x, y),
            additive: cx.coordinator.modifiers().shift(),
            anchor,
            siblings: Vec::new(),
            moved: Vec::new(),
            offset: Vec2::ZERO,
            _token: token,
        });
        Handled::Consumed
    }

    /// Select the grabbed element if needed and snapshot what moves.
    fn start_moving(session: &mut DragSession, cx: &EditorContext) {
        let state = &cx.state;
        let coordinator = &cx.coordinator;
        let grabbed = session.grabbed;
        if !coordinator.is_selected(grabbed) {
            let mode = if session.additive {
                SelectMode::Add
            } else {
                SelectMode::Replace
            };
            coordinator.select(&[grabbed], mode);
        }

        let keys = ["x".to_string(), "y".to_string()];
        let moved: Vec<Moved> = coordinator
            .selection()
            .into_iter()
            .filter_map(|id| {
                let el = state.element(id)?;
                el.bounds()?;
                Some(Moved {
                    id,
                    original: el.read_props(keys.iter()),
                    origin: Point::new(
                        el.attr_f64("x").unwrap_or(0.0),
                        el.attr_f64("y").unwrap_or(0.0),
                    ),
                })
            })
            .collect();
        session.siblings = state.with_tree(|tree| {
            tree.siblings(grabbed)
                .into_iter()
                .filter(|s| !moved.iter().any(|m| m.id == *s) && !tree.is_transient(*s))
                .filter_map(|s| tree.bounds(s))
                .collect()
        });
        log::debug!("drag started on {grabbed} ({} element(s))", moved.len());
        session.moved = moved;
    }

    fn track(&mut self, x: f64, y: f64, cx: &EditorContext) -> Result<(), EditError> {
        let Some(session) = &mut self.session else {
            return Ok(());
        };
        let raw = Point::new(x, y) - session.start;
        if session.moved.is_empty() {
            if raw == Vec2::ZERO {
                return Ok(());
            }
            Self::start_moving(session, cx);
        }
        let snap = snap_offset(
            session.anchor + raw,
            &session.siblings,
            cx.config.snap_threshold,
        );
        session.offset = raw + snap;
        for m in &session.moved {
            cx.state
                .write_element_props(m.id, &position(m.origin + session.offset))?;
        }
        Ok(())
    }

    async fn finish(&mut self, cx: &EditorContext) -> Result<(), EditError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        if session.moved.is_empty() || session.offset == Vec2::ZERO {
            log::debug!("drag ended without moving");
            return Ok(());
        }
        let commands: Result<Vec<Box<dyn Command>>, EditError> = session
            .moved
            .iter()
            .map(|m| {
                UpdateElement::with_original(
                    &cx.state,
                    m.id,
                    m.original.clone(),
                    position(m.origin + session.offset),
                )
                .map(|c| Box::new(c) as Box<dyn Command>)
            })
            .collect();
        let commands = match commands {
            Ok(commands) => commands,
            Err(e) => {
                // Nothing was applied, so the live move can be reverted.
                restore(&session, cx);
                return Err(e);
            }
        };
        log::debug!("drag ended, offset {:?}", session.offset);
        cx.history.execute_batch(commands).await
    }

    fn cancel(&mut self, cx: &EditorContext) {
        if let Some(session) = self.session.take() {
            log::debug!("drag cancelled");
            restore(&session, cx);
        }
    }
}

impl Default for Drag {
    fn default() -> Self {
        Self::new()
    }
}

fn position(p: Point) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert("x".into(), json!(p.x));
    attrs.insert("y".into(), json!(p.y));
    attrs
}

fn restore(session: &DragSession, cx: &EditorContext) {
    for m in &session.moved {
        if let Err(e) = cx.state.write_element_props(m.id, &m.original) {
            log::warn!("could not restore {}: {e}", m.id);
        }
    }
}

#[async_trait(?Send)]
impl Interaction for Drag {
    fn id(&self) -> InteractionId {
        self.id
    }

    async fn handle(
        &mut self,
        event: &InputEvent,
        cx: &EditorContext,
    ) -> Result<Handled, EditError> {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button: PointerButton::Primary,
                target,
                ..
            } if self.session.is_none() => Ok(self.begin(*x, *y, *target, cx)),
            InputEvent::PointerMove { x, y, .. } if self.session.is_some() => {
                self.track(*x, *y, cx)?;
                Ok(Handled::Consumed)
            }
            InputEvent::PointerUp { x, y, .. } if self.session.is_some() => {
                self.track(*x, *y, cx)?;
                // A moved element is not also clicked.
                if self.session.as_ref().is_some_and(|s| !s.moved.is_empty()) {
                    cx.coordinator.end_gesture();
                }
                self.finish(cx).await?;
                Ok(Handled::Consumed)
            }
            InputEvent::Cancel if self.session.is_some() => {
                self.cancel(cx);
                Ok(Handled::Consumed)
            }
            _ => Ok(Handled::Ignored),
        }
    }

    fn destroy(&mut self, cx: &EditorContext) {
        self.cancel(cx);
    }
}
