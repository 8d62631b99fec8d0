pub mod glyph;
pub mod history;
pub mod input;
pub mod model;
pub mod preview;
pub mod render;
pub mod save;
pub mod script;
pub mod service;
pub mod settings;
pub mod settings_store;
pub mod surface;

pub use history::HistoryStore;
pub use input::{InputCommand, InputController, InputEvent, InputMode, ToolSelection};
pub use model::{Color, Drawable, MarkerStroke, Point, StickerPlacement};
pub use preview::Preview;
pub use render::RgbaSurface;
pub use service::Sketchpad;
pub use settings::SketchSettings;
pub use surface::{RecordingSurface, Surface, SurfaceOp};
