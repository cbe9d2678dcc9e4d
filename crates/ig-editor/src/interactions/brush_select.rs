use super::{Handled, Interaction};
use crate::coordinator::{Exclusive, ExclusiveToken, InteractionId, SelectMode};
use crate::editor::EditorContext;
use crate::error::EditError;
use crate::input::{InputEvent, PointerButton};
use async_trait::async_trait;
use ig_core::hit::hit_test_rect;
use ig_core::{Element, ElementId, ElementKind, ElementRole, Point, Rect};
use serde_json::json;

/// Below this extent on both axes a press-release is a click. A brush
/// flat on one axis still selects what its line crosses.
const MIN_BRUSH: f64 = 1.0;

struct BrushSession {
    start: Point,
    brush: ElementId,
    _token: ExclusiveToken,
}

/// Rubber-band selection from empty document space.
///
/// The brush rectangle lives in the transient overlay. Release selects
/// every editable element it touches (`Replace`, or `Add` with Shift).
pub struct BrushSelect {
    id: InteractionId,
    session: Option<BrushSession>,
}

impl BrushSelect {
    pub fn new() -> Self {
        Self {
            id: InteractionId::new("brush-select"),
            session: None,
        }
    }

    fn begin(
        &mut self,
        x: f64,
        y: f64,
        target: Option<ElementId>,
        cx: &EditorContext,
    ) -> Result<Handled, EditError> {
        // Only presses on bare document space start a brush.
        if target != Some(cx.state.document()) {
            return Ok(Handled::Ignored);
        }
        let token = match cx.coordinator.acquire(self.id) {
            Exclusive::Ran(token) => token,
            Exclusive::Inactive | Exclusive::Busy(_) => return Ok(Handled::Ignored),
        };
        let brush = Element::new(
            cx.coordinator.fresh_transient_id("brush")?,
            ElementRole::Brush,
            ElementKind::Shape,
        )
        .with_rect(x, y, 0.0, 0.0);
        let brush = cx.coordinator.append_transient_element(brush)?;
        log::debug!("brush started at ({x}, {y})");
        self.session = Some(BrushSession {
            start: Point::new(x, y),
            brush,
            _token: token,
        });
        Ok(Handled::Consumed)
    }

    fn resize_brush(&self, x: f64, y: f64, cx: &EditorContext) -> Option<Rect> {
        let session = self.session.as_ref()?;
        let rect = Rect::from_points(session.start, Point::new(x, y));
        let mut props = ig_core::Attrs::new();
        props.insert("x".into(), json!(rect.x0));
        props.insert("y".into(), json!(rect.y0));
        props.insert("width".into(), json!(rect.width()));
        props.insert("height".into(), json!(rect.height()));
        cx.coordinator.update_transient_element(session.brush, &props);
        Some(rect)
    }

    fn finish(&mut self, x: f64, y: f64, cx: &EditorContext) {
        let Some(rect) = self.resize_brush(x, y, cx) else {
            return;
        };
        self.end(cx);
        if rect.width() < MIN_BRUSH && rect.height() < MIN_BRUSH {
            // A plain click; click-select handles it.
            return;
        }
        cx.coordinator.end_gesture();
        let hits = cx.state.with_tree(|tree| hit_test_rect(tree, rect));
        let mode = if cx.coordinator.modifiers().shift() {
            SelectMode::Add
        } else {
            SelectMode::Replace
        };
        log::debug!("brush selected {} element(s)", hits.len());
        cx.coordinator.select(&hits, mode);
    }

    fn end(&mut self, cx: &EditorContext) {
        if let Some(session) = self.session.take() {
            cx.coordinator.remove_transient_element(session.brush);
        }
    }
}

impl Default for BrushSelect {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Interaction for BrushSelect {
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
            } if self.session.is_none() => self.begin(*x, *y, *target, cx),
            InputEvent::PointerMove { x, y, .. } if self.session.is_some() => {
                self.resize_brush(*x, *y, cx);
                Ok(Handled::Consumed)
            }
            InputEvent::PointerUp { x, y, .. } if self.session.is_some() => {
                self.finish(*x, *y, cx);
                Ok(Handled::Consumed)
            }
            InputEvent::Cancel if self.session.is_some() => {
                log::debug!("brush cancelled");
                self.end(cx);
                Ok(Handled::Consumed)
            }
            _ => Ok(Handled::Ignored),
        }
    }

    fn destroy(&mut self, cx: &EditorContext) {
        self.end(cx);
    }
}
