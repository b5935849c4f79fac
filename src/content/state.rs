use serde::{Deserialize, Serialize};

use crate::geometry::Point;

use super::page::ElementId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SelectionPhase {
    #[default]
    Idle,
    Armed,
    Dragging,
    Finalizing,
}

/// Flags delivered with the start-selection command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SelectionFlags {
    pub open_screenshot: bool,
    pub open_ocr_text: bool,
    pub stealth_mode: bool,
}

/// Page-scoped state of the selection workflow. Lives as long as the page and
/// is never persisted.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: SelectionPhase,
    pub flags: SelectionFlags,
    pub start: Option<Point>,
    /// Drag rectangle element, owned here while a drag is active.
    pub selection_rect: Option<ElementId>,
    pub overlay: Option<ElementId>,
    pub ocr_ready: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, flags: SelectionFlags, overlay: ElementId) {
        self.phase = SelectionPhase::Armed;
        self.flags = flags;
        self.start = None;
        self.selection_rect = None;
        self.overlay = Some(overlay);
    }

    pub fn begin_drag(&mut self, start: Point, rect: ElementId) {
        self.phase = SelectionPhase::Dragging;
        self.start = Some(start);
        self.selection_rect = Some(rect);
    }

    pub fn finish_drag(&mut self) {
        self.phase = SelectionPhase::Finalizing;
        self.overlay = None;
        self.selection_rect = None;
    }

    /// Back to idle once a finalized selection's pipeline has settled.
    pub fn settle(&mut self) {
        if self.phase == SelectionPhase::Finalizing {
            self.phase = SelectionPhase::Idle;
            self.start = None;
        }
    }

    /// Forgets any selection in progress, keeping flags and readiness.
    pub fn reset(&mut self) {
        self.phase = SelectionPhase::Idle;
        self.start = None;
        self.selection_rect = None;
        self.overlay = None;
    }
}
