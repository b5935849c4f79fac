use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::geometry::Point;
use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "snapask",
    version,
    about = "Select a region of a captured frame, OCR it and ask the relay for an answer"
)]
pub struct Cli {
    /// PNG standing in for the visible tab
    #[arg(long)]
    pub frame: PathBuf,
    /// Drag start in page pixels, as `x,y`
    #[arg(long, value_parser = parse_point)]
    pub from: Point,
    /// Drag end in page pixels, as `x,y`
    #[arg(long, value_parser = parse_point)]
    pub to: Point,
    /// Device pixel ratio of the frame
    #[arg(long)]
    pub dpr: Option<f64>,
    /// Relay base URL (overrides SNAPASK_RELAY_URL)
    #[arg(long)]
    pub relay_url: Option<String>,
    /// Settings file (overrides SNAPASK_SETTINGS)
    #[arg(long)]
    pub settings: Option<PathBuf>,
    /// Persist this model as the selected one
    #[arg(long)]
    pub model: Option<String>,
    /// Persist stealth mode on
    #[arg(long, action = ArgAction::SetTrue, overrides_with = "no_stealth")]
    pub stealth: bool,
    /// Persist stealth mode off
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_stealth: bool,
    /// Persist "open screenshot" on
    #[arg(long, action = ArgAction::SetTrue, overrides_with = "no_open_screenshot")]
    pub open_screenshot: bool,
    /// Persist "open screenshot" off
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_open_screenshot: bool,
    /// Persist "open OCR text" on
    #[arg(long, action = ArgAction::SetTrue, overrides_with = "no_open_ocr_text")]
    pub open_ocr_text: bool,
    /// Persist "open OCR text" off
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_open_ocr_text: bool,
    /// Where opened views are written (default: <tmp>/snapask)
    #[arg(long)]
    pub view_dir: Option<PathBuf>,
}

/// Settings changes requested on the command line. `None` leaves the
/// persisted value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub model: Option<String>,
    pub stealth_mode: Option<bool>,
    pub open_screenshot: Option<bool>,
    pub open_ocr_text: Option<bool>,
}

impl SettingsOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, settings: &mut Settings) {
        if let Some(model) = self.model {
            settings.selected_model = model;
        }
        if let Some(stealth) = self.stealth_mode {
            settings.stealth_mode = stealth;
        }
        if let Some(open) = self.open_screenshot {
            settings.open_screenshot = open;
        }
        if let Some(open) = self.open_ocr_text {
            settings.open_ocr_text = open;
        }
    }
}

impl Cli {
    pub fn settings_overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            model: self.model.clone(),
            stealth_mode: toggle(self.stealth, self.no_stealth),
            open_screenshot: toggle(self.open_screenshot, self.no_open_screenshot),
            open_ocr_text: toggle(self.open_ocr_text, self.no_open_ocr_text),
        }
    }
}

fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn parse_point(raw: &str) -> Result<Point, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got `{raw}`"))?;
    let x = x
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("bad x in `{raw}`: {err}"))?;
    let y = y
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("bad y in `{raw}`: {err}"))?;
    Ok(Point::new(x, y))
}
