use super::{Handled, Interaction};
use crate::coordinator::{Exclusive, InteractionId};
use crate::editor::EditorContext;
use crate::error::EditError;
use crate::input::InputEvent;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use async_trait::async_trait;
use ig_core::{Attrs, ElementId, Point, Rect};
use serde_json::{Value, json};

const VIEW_BOX: &str = "viewBox";

/// Mod + wheel zooms the document around the pointer by rewriting the
/// root's `viewBox`. Mod+= / Mod+- zoom around the center, Mod+0 resets.
/// View changes are not document edits and never reach the history.
pub struct ZoomWheel {
    id: InteractionId,
    zoom: f64,
}

impl ZoomWheel {
    pub fn new() -> Self {
        Self {
            id: InteractionId::new("zoom-wheel"),
            zoom: 1.0,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Scale to `zoom` (clamped), keeping `anchor` at the same spot on
    /// screen. `None` anchors on the current view's center.
    fn zoom_to(
        &mut self,
        zoom: f64,
        anchor: Option<Point>,
        cx: &EditorContext,
    ) -> Result<(), EditError> {
        if !zoom.is_finite() {
            log::warn!("zoom ignored: {zoom} is not finite");
            return Ok(());
        }
        let document = cx.state.document();
        let Some((base, current)) = view_boxes(document, cx) else {
            log::warn!("zoom ignored: document has no size");
            return Ok(());
        };
        let zoom = zoom.clamp(cx.config.min_zoom, cx.config.max_zoom);
        let anchor = anchor.unwrap_or_else(|| current.center());
        let (w, h) = (base.width() / zoom, base.height() / zoom);
        let rel_x = (anchor.x - current.x0) / current.width();
        let rel_y = (anchor.y - current.y0) / current.height();
        let next = Rect::from_origin_size((anchor.x - rel_x * w, anchor.y - rel_y * h), (w, h));

        let mut props = Attrs::new();
        props.insert(
            VIEW_BOX.into(),
            json!(format!("{} {} {} {}", next.x0, next.y0, w, h)),
        );
        cx.state.write_element_props(document, &props)?;
        log::debug!("zoom {:.2} -> {zoom:.2}", self.zoom);
        self.zoom = zoom;
        Ok(())
    }

    async fn gated(
        &mut self,
        zoom: f64,
        anchor: Option<Point>,
        cx: &EditorContext,
    ) -> Result<Handled, EditError> {
        let id = self.id;
        match cx
            .coordinator
            .execute_exclusive(id, || async move { self.zoom_to(zoom, anchor, cx) })
            .await
        {
            Exclusive::Ran(result) => result.map(|()| Handled::PreventDefault),
            Exclusive::Inactive | Exclusive::Busy(_) => Ok(Handled::Ignored),
        }
    }
}

impl Default for ZoomWheel {
    fn default() -> Self {
        Self::new()
    }
}

/// The unzoomed view (document geometry) and the current `viewBox`.
fn view_boxes(document: ElementId, cx: &EditorContext) -> Option<(Rect, Rect)> {
    let el = cx.state.element(document)?;
    let options = cx.state.options();
    let base = el.bounds().or_else(|| {
        Some(Rect::new(0.0, 0.0, options.width()?, options.height()?))
    })?;
    if base.area() <= 0.0 {
        return None;
    }
    let current = el
        .attrs
        .get(VIEW_BOX)
        .and_then(Value::as_str)
        .and_then(parse_view_box)
        .unwrap_or(base);
    Some((base, current))
}

fn parse_view_box(s: &str) -> Option<Rect> {
    let v: Vec<f64> = s
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match v.as_slice() {
        [x, y, w, h] if *w > 0.0 && *h > 0.0 => Some(Rect::new(*x, *y, x + w, y + h)),
        _ => None,
    }
}

#[async_trait(?Send)]
impl Interaction for ZoomWheel {
    fn id(&self) -> InteractionId {
        self.id
    }

    async fn handle(
        &mut self,
        event: &InputEvent,
        cx: &EditorContext,
    ) -> Result<Handled, EditError> {
        match event {
            InputEvent::Wheel {
                x,
                y,
                delta_y,
                modifiers,
            } if modifiers.command() && *delta_y != 0.0 => {
                let step = cx.config.zoom_step;
                let factor = if *delta_y > 0.0 { 1.0 - step } else { 1.0 + step };
                let zoom = self.zoom * factor;
                self.gated(zoom, Some(Point::new(*x, *y)), cx).await
            }
            InputEvent::KeyDown { key, modifiers } => {
                let step = cx.config.zoom_step;
                let zoom = match ShortcutMap::resolve(key, *modifiers) {
                    Some(ShortcutAction::ZoomIn) => self.zoom * (1.0 + step),
                    Some(ShortcutAction::ZoomOut) => self.zoom * (1.0 - step),
                    Some(ShortcutAction::ZoomReset) => 1.0,
                    _ => return Ok(Handled::Ignored),
                };
                self.gated(zoom, None, cx).await
            }
            _ => Ok(Handled::Ignored),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_space_and_comma_separated_view_boxes() {
        assert_eq!(
            parse_view_box("0 0 400 300"),
            Some(Rect::new(0.0, 0.0, 400.0, 300.0))
        );
        assert_eq!(
            parse_view_box("10,20, 30 40"),
            Some(Rect::new(10.0, 20.0, 40.0, 60.0))
        );
        assert_eq!(parse_view_box("0 0 0 10"), None);
        assert_eq!(parse_view_box("a b c d"), None);
    }
}
