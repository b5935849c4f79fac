//! Drag-to-select overlay: `Idle → Armed → Dragging → Finalizing`.

use crate::geometry::{Point, Rect};

use super::page::{ElementId, MouseButton, Page, PointerEvent, PointerEventKind};
use super::state::{SelectionFlags, SelectionPhase, SessionState};

pub const SELECTION_OVERLAY_ID: &str = "snapask-selection-overlay";
pub const SELECTION_RECT_ID: &str = "snapask-selection-rect";

const OVERLAY_LISTENERS: [PointerEventKind; 3] = [
    PointerEventKind::MouseDown,
    PointerEventKind::MouseMove,
    PointerEventKind::MouseUp,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalizedSelection {
    pub rect: Rect,
    pub flags: SelectionFlags,
}

/// Shows a fresh overlay, removing any stale overlay or drag rectangle first.
pub fn arm(page: &Page, state: &mut SessionState, flags: SelectionFlags) -> ElementId {
    while let Some(stale) = page.get_by_dom_id(SELECTION_OVERLAY_ID) {
        page.remove(stale);
    }
    while let Some(stale) = page.get_by_dom_id(SELECTION_RECT_ID) {
        page.remove(stale);
    }

    let overlay = page.create_element(
        Some(SELECTION_OVERLAY_ID),
        &[
            ("position", "fixed"),
            ("top", "0"),
            ("left", "0"),
            ("width", "100vw"),
            ("height", "100vh"),
            ("background", "rgba(0, 0, 0, 0.2)"),
            ("cursor", "crosshair"),
            ("z-index", "999999"),
        ],
    );
    for kind in OVERLAY_LISTENERS {
        page.add_listener(overlay, kind);
    }
    page.watch_removal(overlay);

    state.arm(flags, overlay);
    overlay
}

/// Feeds one pointer event to the overlay. Returns the finalized selection on
/// primary-button release after a drag.
pub fn handle_pointer(
    page: &Page,
    state: &mut SessionState,
    event: PointerEvent,
) -> Option<FinalizedSelection> {
    let overlay = state.overlay?;
    if !page.contains(overlay) {
        abandon(page, state);
        return None;
    }
    if !page.has_listener(overlay, event.kind) {
        return None;
    }

    match event.kind {
        PointerEventKind::MouseDown => {
            if event.button == MouseButton::Primary && state.phase == SelectionPhase::Armed {
                begin_drag(page, state, Point::new(event.x, event.y));
            }
            None
        }
        PointerEventKind::MouseMove => {
            if state.phase == SelectionPhase::Dragging {
                update_drag(page, state, Point::new(event.x, event.y));
            }
            None
        }
        PointerEventKind::MouseUp => {
            if event.button != MouseButton::Primary || state.phase != SelectionPhase::Dragging {
                return None;
            }
            update_drag(page, state, Point::new(event.x, event.y));
            finalize(page, state, overlay)
        }
    }
}

/// The overlay went away outside the normal flow: drop the half-drawn
/// rectangle and forget the selection.
fn abandon(page: &Page, state: &mut SessionState) {
    while let Some(rect) = page.get_by_dom_id(SELECTION_RECT_ID) {
        page.remove(rect);
    }
    state.reset();
}

fn begin_drag(page: &Page, state: &mut SessionState, start: Point) {
    let left = format!("{}px", start.x);
    let top = format!("{}px", start.y);
    let rect = page.create_element(
        Some(SELECTION_RECT_ID),
        &[
            ("position", "fixed"),
            ("border", "2px dashed #000"),
            ("background-color", "rgba(255, 255, 255, 0.3)"),
            ("left", &left),
            ("top", &top),
            ("width", "0px"),
            ("height", "0px"),
            ("z-index", "1000000"),
            ("pointer-events", "none"),
        ],
    );
    state.begin_drag(start, rect);
}

fn update_drag(page: &Page, state: &SessionState, current: Point) {
    let (Some(start), Some(rect_el)) = (state.start, state.selection_rect) else {
        return;
    };
    let rect = Rect::from_corners(start, current);
    page.set_style(rect_el, "left", format!("{}px", rect.x));
    page.set_style(rect_el, "top", format!("{}px", rect.y));
    page.set_style(rect_el, "width", format!("{}px", rect.width));
    page.set_style(rect_el, "height", format!("{}px", rect.height));
}

fn finalize(
    page: &Page,
    state: &mut SessionState,
    overlay: ElementId,
) -> Option<FinalizedSelection> {
    // The tint must be gone before the screenshot is taken.
    page.remove(overlay);

    let rect_el = state.selection_rect?;
    let rect = page.bounding_rect(rect_el);
    page.remove(rect_el);
    state.finish_drag();

    rect.map(|rect| FinalizedSelection {
        rect,
        flags: state.flags,
    })
}
