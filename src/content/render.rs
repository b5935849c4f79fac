use crate::config::RenderTiming;

use super::page::{ElementId, Page};

pub const RESPONSE_OVERLAY_ID: &str = "snapask-response-overlay";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Shown(ElementId),
    /// A response overlay was already on screen.
    Skipped,
}

/// Shows relayed answers. At most one response overlay exists at a time.
#[derive(Clone)]
pub struct ResponseRenderer {
    page: Page,
    timing: RenderTiming,
}

impl ResponseRenderer {
    pub fn new(page: Page, timing: RenderTiming) -> Self {
        Self { page, timing }
    }

    /// Must be called from within a tokio runtime; stealth dismissal runs on
    /// its own task.
    pub fn render(&self, answer: &str, stealth_mode: bool) -> RenderOutcome {
        if self.page.get_by_dom_id(RESPONSE_OVERLAY_ID).is_some() {
            return RenderOutcome::Skipped;
        }

        let overlay = if stealth_mode {
            self.show_stealth(answer)
        } else {
            self.show_panel(answer)
        };
        RenderOutcome::Shown(overlay)
    }

    fn show_stealth(&self, answer: &str) -> ElementId {
        let overlay = self.page.create_element(
            Some(RESPONSE_OVERLAY_ID),
            &[
                ("position", "fixed"),
                ("bottom", "10px"),
                ("right", "50px"),
                ("width", "200px"),
                ("background-color", "rgba(255, 255, 255, 0.8)"),
                ("padding", "5px"),
                ("border-radius", "4px"),
                ("box-shadow", "0 0 5px rgba(0,0,0,0.2)"),
                ("opacity", "0.7"),
                ("transition", "opacity 0.3s ease"),
                ("z-index", "1000001"),
                ("pointer-events", "none"),
                ("font-size", "12px"),
            ],
        );
        self.page.set_text_content(overlay, answer);

        let page = self.page.clone();
        let timing = self.timing;
        tokio::spawn(async move {
            tokio::time::sleep(timing.stealth_display).await;
            page.set_style(overlay, "opacity", "0");
            tokio::time::sleep(timing.stealth_fade).await;
            page.remove(overlay);
        });

        overlay
    }

    fn show_panel(&self, answer: &str) -> ElementId {
        let overlay = self.page.create_element(
            Some(RESPONSE_OVERLAY_ID),
            &[
                ("position", "fixed"),
                ("bottom", "10px"),
                ("right", "50px"),
                ("width", "300px"),
                ("background-color", "white"),
                ("padding", "10px"),
                ("border-radius", "8px"),
                ("box-shadow", "0 0 10px rgba(0,0,0,0.3)"),
                ("z-index", "1000001"),
                ("cursor", "pointer"),
                ("font-size", "14px"),
            ],
        );
        self.page.set_text_content(overlay, answer);
        self.page.set_dismiss_on_click(overlay, true);
        overlay
    }
}
