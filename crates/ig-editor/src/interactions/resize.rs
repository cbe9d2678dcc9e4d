use super::{Handled, Interaction, moves_overlay};
use crate::commands::{Command, UpdateElement};
use crate::coordinator::{Exclusive, ExclusiveToken, InteractionCoordinator, InteractionId};
use crate::editor::EditorContext;
use crate::error::EditError;
use crate::events::SubscriptionId;
use crate::input::{InputEvent, PointerButton};
use crate::state::StateManager;
use async_trait::async_trait;
use ig_core::{Attrs, Element, ElementId, ElementKind, ElementRole, HandlePos, Point, Rect};
use kurbo::Vec2;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

const GEOMETRY_KEYS: [&str; 4] = ["x", "y", "width", "height"];

struct ResizeSession {
    element: ElementId,
    handle: HandlePos,
    start: Point,
    start_rect: Rect,
    rect: Rect,
    original: Attrs,
    _token: ExclusiveToken,
}

/// Overlay handle ids, in [`HandlePos::ALL`] order.
type Handles = Rc<RefCell<Vec<(HandlePos, ElementId)>>>;

/// Resize handles around a single selected element.
///
/// Handles follow the selection on every event and after selection,
/// element and history changes. Dragging one moves the matching edge (or
/// both edges for a corner), never below the configured minimum size;
/// release submits one `UpdateElement` with the new geometry.
pub struct Resize {
    id: InteractionId,
    handles: Handles,
    session: Option<ResizeSession>,
    subscription: Option<SubscriptionId>,
}

impl Resize {
    pub fn new() -> Self {
        Self {
            id: InteractionId::new("resize"),
            handles: Rc::default(),
            session: None,
            subscription: None,
        }
    }

    /// Overlay handle ids, in [`HandlePos::ALL`] order.
    pub fn handles(&self) -> Vec<(HandlePos, ElementId)> {
        self.handles.borrow().clone()
    }

    fn begin(
        &mut self,
        x: f64,
        y: f64,
        target: Option<ElementId>,
        cx: &EditorContext,
    ) -> Result<Handled, EditError> {
        let Some(handle) = target.and_then(|t| {
            self.handles
                .borrow()
                .iter()
                .find(|(_, id)| *id == t)
                .map(|(pos, _)| *pos)
        }) else {
            return Ok(Handled::Ignored);
        };
        let selection = cx.coordinator.selection();
        let [element] = selection.as_slice() else {
            return Ok(Handled::Ignored);
        };
        let Some(start_rect) = cx.state.with_tree(|tree| tree.bounds(*element)) else {
            return Ok(Handled::Ignored);
        };
        let token = match cx.coordinator.acquire(self.id) {
            Exclusive::Ran(token) => token,
            Exclusive::Inactive | Exclusive::Busy(_) => return Ok(Handled::Ignored),
        };
        let keys: Vec<String> = GEOMETRY_KEYS.iter().map(|k| k.to_string()).collect();
        let original = cx.state.element_props(*element, &keys)?;
        log::debug!("resize of {element} started from {handle:?}");
        self.session = Some(ResizeSession {
            element: *element,
            handle,
            start: Point::new(x, y),
            start_rect,
            rect: start_rect,
            original,
            _token: token,
        });
        Ok(Handled::Consumed)
    }

    fn track(&mut self, x: f64, y: f64, cx: &EditorContext) -> Result<(), EditError> {
        let Some(session) = &mut self.session else {
            return Ok(());
        };
        let min = cx.config.min_size.max(1.0);
        session.rect = resized(
            session.start_rect,
            session.handle,
            Point::new(x, y) - session.start,
            min,
        );
        cx.state
            .write_element_props(session.element, &geometry(session.rect))?;
        let rect = session.rect;
        place_handles(&self.handles, rect, cx.config.handle_size, &cx.state, &cx.coordinator)
    }

    async fn finish(&mut self, cx: &EditorContext) -> Result<(), EditError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        if session.rect == session.start_rect {
            log::debug!("resize ended without change");
            return Ok(());
        }
        let command = match UpdateElement::with_original(
            &cx.state,
            session.element,
            session.original.clone(),
            geometry(session.rect),
        ) {
            Ok(command) => command,
            Err(e) => {
                self.restore(&session, cx);
                return Err(e);
            }
        };
        log::debug!("resize of {} ended at {:?}", session.element, session.rect);
        let commands: Vec<Box<dyn Command>> = vec![Box::new(command)];
        cx.history.execute_batch(commands).await
    }

    fn restore(&mut self, session: &ResizeSession, cx: &EditorContext) {
        if let Err(e) = cx.state.write_element_props(session.element, &session.original) {
            log::warn!("could not restore {}: {e}", session.element);
        }
        let (size, start) = (cx.config.handle_size, session.start_rect);
        if let Err(e) = place_handles(&self.handles, start, size, &cx.state, &cx.coordinator) {
            log::warn!("could not restore handles: {e}");
        }
    }

    fn cancel(&mut self, cx: &EditorContext) {
        if let Some(session) = self.session.take() {
            log::debug!("resize cancelled");
            self.restore(&session, cx);
        }
    }
}

impl Default for Resize {
    fn default() -> Self {
        Self::new()
    }
}

fn sync_handles(
    handles: &RefCell<Vec<(HandlePos, ElementId)>>,
    size: f64,
    state: &StateManager,
    coordinator: &InteractionCoordinator,
) -> Result<(), EditError> {
    let selection = coordinator.selection();
    let bounds = match selection.as_slice() {
        [only] => state.with_tree(|tree| tree.bounds(*only)),
        _ => None,
    };
    match bounds {
        Some(rect) => place_handles(handles, rect, size, state, coordinator),
        None => {
            clear_handles(handles, coordinator);
            Ok(())
        }
    }
}

fn place_handles(
    handles: &RefCell<Vec<(HandlePos, ElementId)>>,
    rect: Rect,
    size: f64,
    state: &StateManager,
    coordinator: &InteractionCoordinator,
) -> Result<(), EditError> {
    // The overlay may have been torn down underneath us.
    if handles
        .borrow()
        .iter()
        .any(|(_, id)| state.element(*id).is_none())
    {
        handles.borrow_mut().clear();
    }
    if handles.borrow().is_empty() {
        for pos in HandlePos::ALL {
            let r = handle_rect(rect, pos, size);
            let handle = Element::new(
                coordinator.fresh_transient_id("handle")?,
                ElementRole::Handle(pos),
                ElementKind::Shape,
            )
            .with_rect(r.x0, r.y0, r.width(), r.height());
            let id = coordinator.append_transient_element(handle)?;
            handles.borrow_mut().push((pos, id));
        }
        return Ok(());
    }
    for (pos, id) in handles.borrow().iter() {
        coordinator.update_transient_element(*id, &geometry(handle_rect(rect, *pos, size)));
    }
    Ok(())
}

fn clear_handles(
    handles: &RefCell<Vec<(HandlePos, ElementId)>>,
    coordinator: &InteractionCoordinator,
) {
    let ids: Vec<ElementId> = handles.borrow_mut().drain(..).map(|(_, id)| id).collect();
    for id in ids {
        coordinator.remove_transient_element(id);
    }
}

/// Square handle of side `size` centered on the edge or corner `pos`.
fn handle_rect(rect: Rect, pos: HandlePos, size: f64) -> Rect {
    let cx = match pos.x_edge() {
        -1 => rect.x0,
        1 => rect.x1,
        _ => rect.center().x,
    };
    let cy = match pos.y_edge() {
        -1 => rect.y0,
        1 => rect.y1,
        _ => rect.center().y,
    };
    Rect::from_center_size((cx, cy), (size, size))
}

/// Move the edges selected by `pos` by `delta`, keeping each side ≥ `min`.
fn resized(start: Rect, pos: HandlePos, delta: Vec2, min: f64) -> Rect {
    let mut r = start;
    match pos.x_edge() {
        -1 => r.x0 = (r.x0 + delta.x).min(r.x1 - min),
        1 => r.x1 = (r.x1 + delta.x).max(r.x0 + min),
        _ => {}
    }
    match pos.y_edge() {
        -1 => r.y0 = (r.y0 + delta.y).min(r.y1 - min),
        1 => r.y1 = (r.y1 + delta.y).max(r.y0 + min),
        _ => {}
    }
    r
}

fn geometry(rect: Rect) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert("x".into(), json!(rect.x0));
    attrs.insert("y".into(), json!(rect.y0));
    attrs.insert("width".into(), json!(rect.width()));
    attrs.insert("height".into(), json!(rect.height()));
    attrs
}

#[async_trait(?Send)]
impl Interaction for Resize {
    fn id(&self) -> InteractionId {
        self.id
    }

    async fn handle(
        &mut self,
        event: &InputEvent,
        cx: &EditorContext,
    ) -> Result<Handled, EditError> {
        if self.session.is_none() {
            if let InputEvent::PointerDown {
                x,
                y,
                button: PointerButton::Primary,
                target,
                ..
            } = event
            {
                let handled = self.begin(*x, *y, *target, cx)?;
                if handled != Handled::Ignored {
                    return Ok(handled);
                }
            }
            sync_handles(&self.handles, cx.config.handle_size, &cx.state, &cx.coordinator)?;
            return Ok(Handled::Ignored);
        }

        match event {
            InputEvent::PointerMove { x, y, .. } => {
                self.track(*x, *y, cx)?;
                Ok(Handled::Consumed)
            }
            InputEvent::PointerUp { x, y, .. } => {
                cx.coordinator.end_gesture();
                self.track(*x, *y, cx)?;
                self.finish(cx).await?;
                Ok(Handled::Consumed)
            }
            InputEvent::Cancel => {
                self.cancel(cx);
                Ok(Handled::Consumed)
            }
            _ => Ok(Handled::Ignored),
        }
    }

    fn attach(&mut self, cx: &EditorContext) {
        let handles = self.handles.clone();
        let size = cx.config.handle_size;
        let state = Rc::downgrade(&cx.state);
        let coordinator = Rc::downgrade(&cx.coordinator);
        let subscription = cx.events.subscribe_all(move |event| {
            if !moves_overlay(event) {
                return;
            }
            let (Some(state), Some(coordinator)) = (state.upgrade(), coordinator.upgrade()) else {
                return;
            };
            if !coordinator.is_active() {
                return;
            }
            if let Err(e) = sync_handles(&handles, size, &state, &coordinator) {
                log::warn!("handle sync after {} failed: {e}", event.name());
            }
        });
        self.subscription = Some(subscription);
    }

    fn destroy(&mut self, cx: &EditorContext) {
        if let Some(subscription) = self.subscription.take() {
            cx.events.unsubscribe(subscription);
        }
        self.cancel(cx);
        clear_handles(&self.handles, &cx.coordinator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_moves_both_edges() {
        let r = resized(
            Rect::new(0.0, 0.0, 100.0, 50.0),
            HandlePos::SE,
            Vec2::new(10.0, 5.0),
            1.0,
        );
        assert_eq!(r, Rect::new(0.0, 0.0, 110.0, 55.0));
    }

    #[test]
    fn edge_moves_one_side_only() {
        let r = resized(
            Rect::new(0.0, 0.0, 100.0, 50.0),
            HandlePos::W,
            Vec2::new(20.0, 30.0),
            1.0,
        );
        assert_eq!(r, Rect::new(20.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn clamp_keeps_minimum_size() {
        let r = resized(
            Rect::new(0.0, 0.0, 100.0, 50.0),
            HandlePos::NW,
            Vec2::new(500.0, 500.0),
            1.0,
        );
        assert_eq!(r.width(), 1.0);
        assert_eq!(r.height(), 1.0);
        assert_eq!((r.x1, r.y1), (100.0, 50.0));
    }

    #[test]
    fn handle_sits_on_edge_midpoint() {
        let r = handle_rect(Rect::new(0.0, 0.0, 100.0, 50.0), HandlePos::E, 8.0);
        assert_eq!(r, Rect::new(96.0, 21.0, 104.0, 29.0));
    }
}
