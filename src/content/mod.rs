pub mod crop;
pub mod ocr;
pub mod overlay;
pub mod page;
pub mod pipeline;
pub mod render;
pub mod script;
pub mod state;
pub mod view;

pub use ocr::{OcrAdapter, OcrEngine, TesseractCli};
pub use page::{ElementId, MouseButton, Page, PointerEvent};
pub use pipeline::{PipelineHandles, SelectionTask};
pub use render::{RenderOutcome, ResponseRenderer};
pub use script::{run_content, ContentChannels, ContentScript};
pub use state::{SelectionFlags, SelectionPhase, SessionState};
pub use view::{DirectoryViewer, Viewer};
