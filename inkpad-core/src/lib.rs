pub mod color;
pub mod commands;
pub mod component;
pub mod config;
pub mod editor;
pub mod events;
pub mod history;
pub mod id;
pub mod loader;
pub mod path;
pub mod renderer;
pub mod rendering_cache;
pub mod scene;
pub mod sync;
pub mod transform;
pub mod util;
pub mod viewport;

pub use editor::Editor;
pub use id::InkID;
