//! # Editor
//!
//! One open document: the scene, its history, the rendering cache in front of it, and optionally a log of
//! commands for collaborators. Nothing here is global, so any number of editors can coexist.
//!
//! All modification goes through [`Editor::dispatch`], [`Editor::undo`] and [`Editor::redo`], each of which
//! forwards the resulting damage to the cache before returning.

use crate::{
    commands::{Command, CommandConsumer, CommandError, DoUndo},
    config::EditorConfig,
    history::History,
    loader::{ChunkedLoad, ComponentProducer, LoadMode},
    renderer::{Renderer, SvgRenderer, TextOnlyRenderer},
    rendering_cache::RenderingCache,
    scene::Scene,
    sync::{CommandLog, SyncError},
    viewport::Viewport,
};

pub struct Editor {
    config: EditorConfig,
    scene: Scene,
    history: History,
    cache: RenderingCache,
    sync: Option<CommandLog>,
}
impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
impl Editor {
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self {
            scene: Scene::new(config.spatial_cell_size),
            history: History::new(),
            cache: RenderingCache::new(config.cache.clone()),
            sync: None,
            config,
        }
    }
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }
    /// Mutable access to the history, e.g. to subscribe to its events.
    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }
    #[must_use]
    pub fn cache(&self) -> &RenderingCache {
        &self.cache
    }
    /// Start recording every change into a [`CommandLog`].
    pub fn enable_sync(&mut self) {
        self.sync.get_or_insert_with(CommandLog::new);
    }
    #[must_use]
    pub fn sync_log(&self) -> Option<&CommandLog> {
        self.sync.as_ref()
    }
    /// Apply a command and make it undoable.
    pub fn dispatch(&mut self, command: Command) -> Result<(), CommandError> {
        let shared = self.sync.is_some().then(|| command.clone());
        let result = self.history.push(&mut self.scene, command);
        self.flush_damage();
        result?;
        if let Some(command) = shared {
            self.share(&command);
        }
        Ok(())
    }
    /// Apply a command that is not undoable, such as one received from a collaborator.
    /// It is not shared back to the log.
    pub fn apply_without_history(&mut self, command: &Command) -> Result<(), CommandError> {
        let result = self.scene.apply(DoUndo::Do(command));
        self.flush_damage();
        result
    }
    /// Revert the last command. `Ok(false)` if there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool, CommandError> {
        let undone = self.history.undo(&mut self.scene);
        self.flush_damage();
        if undone? {
            if let Some(inverse) = self.history.peek_redo().map(Command::invert) {
                self.share(&inverse);
            }
            return Ok(true);
        }
        Ok(false)
    }
    /// Reapply the last undone command. `Ok(false)` if there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool, CommandError> {
        let redone = self.history.redo(&mut self.scene);
        self.flush_damage();
        if redone? {
            if let Some(command) = self.history.peek_undo().cloned() {
                self.share(&command);
            }
            return Ok(true);
        }
        Ok(false)
    }
    /// Start loading components in chunks of the configured size. Drive it with [`ChunkedLoad::step`].
    #[must_use]
    pub fn begin_load<P: ComponentProducer>(&self, producer: P, mode: LoadMode) -> ChunkedLoad<P> {
        ChunkedLoad::new(producer, mode, self.config.load_chunk_size)
    }
    /// Draw the visible part of the scene through the rendering cache.
    pub fn render(&mut self, renderer: &mut dyn Renderer, viewport: &Viewport) {
        self.scene.render_with_cache(renderer, &mut self.cache, viewport);
    }
    /// Draw the visible part of the scene directly.
    pub fn render_uncached(&self, renderer: &mut dyn Renderer, viewport: &Viewport) {
        self.scene.render(renderer, viewport);
    }
    /// The import/export region as a standalone SVG document, in canvas units.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let region = self.scene.import_export_rect();
        let mut svg = SvgRenderer::new();
        svg.push_clip(region);
        self.scene.render_region(&mut svg, &region);
        svg.pop_clip();
        svg.finish(region)
    }
    /// A description of the visible content for screen readers.
    #[must_use]
    pub fn describe(&self, viewport: &Viewport) -> String {
        let mut text = TextOnlyRenderer::new();
        self.scene.render(&mut text, viewport);
        text.description()
    }
    fn flush_damage(&mut self) {
        for damage in self.scene.take_damage() {
            self.cache.invalidate(&damage);
        }
    }
    fn share(&mut self, command: &Command) {
        let Some(log) = self.sync.as_mut() else {
            return;
        };
        match command
            .serialize()
            .map_err(SyncError::from)
            .and_then(|serialized| log.push_checked(serialized))
        {
            Ok(id) => log::trace!("shared {} as #{id}", command.kind()),
            Err(e) => log::warn!("failed to share {}: {e}", command.kind()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Editor;
    use crate::{
        color::Color,
        commands::{Command, CommandError},
        component::{Component, ComponentKind, ImageData},
        path::Path,
        renderer::{RasterRenderer, RenderingStyle, TextStyle},
        transform::Matrix,
        util::Rect,
        viewport::Viewport,
    };

    fn dot(x: f32, y: f32) -> Component {
        Component::stroke(
            Path::from_rect(&Rect::new(x, y, 4.0, 4.0)),
            RenderingStyle::filled(Color::BLACK),
        )
    }

    #[test]
    fn dispatch_undo_redo() {
        let mut editor = Editor::default();
        let command = editor.scene().add_component(dot(1.0, 1.0));
        editor.dispatch(command).unwrap();
        assert_eq!(editor.scene().len(), 1);
        assert!(editor.undo().unwrap());
        assert!(editor.scene().is_empty());
        assert!(editor.redo().unwrap());
        assert_eq!(editor.scene().len(), 1);
        assert!(!editor.redo().unwrap());
        // Damage was handed to the cache
        assert!(!editor.scene().has_damage());
    }
    #[test]
    fn failed_dispatch_changes_nothing() {
        let mut editor = Editor::default();
        let component = dot(1.0, 1.0);
        let command = editor.scene().add_component(component.clone());
        editor.dispatch(command.clone()).unwrap();
        assert_eq!(editor.dispatch(command), Err(CommandError::MismatchedState));
        assert_eq!(editor.history().undo_stack_size(), 1);
        assert_eq!(editor.scene().len(), 1);
    }
    #[test]
    fn sync_log_mirrors_changes() {
        let mut editor = Editor::default();
        editor.enable_sync();
        let command = editor.scene().add_component(dot(1.0, 1.0));
        editor.dispatch(command).unwrap();
        editor.undo().unwrap();

        // Replaying the log elsewhere gives the same scene
        let mut replica = Editor::default();
        let log = editor.sync_log().unwrap();
        let kinds: Vec<String> = log.commands_since(0).map(|r| r.data.kind.clone()).collect();
        assert_eq!(kinds, ["add", "erase"]);
        for record in log.commands_since(0) {
            let command = Command::deserialize(&record.data).unwrap();
            replica.apply_without_history(&command).unwrap();
        }
        assert!(replica.scene().is_empty());
        assert_eq!(replica.history().undo_stack_size(), 0);
    }
    #[test]
    fn oversized_commands_are_not_shared() {
        let mut editor = Editor::default();
        editor.enable_sync();
        // Base64 of 4 MiB of pixels is well over the sync limit.
        let pixels = image::RgbaImage::new(1024, 1024);
        let photo = Component::new(
            ComponentKind::Image(ImageData::new(pixels, "photo")),
            Matrix::IDENTITY,
        );
        let command = editor.scene().add_component(photo);
        editor.dispatch(command).unwrap();
        assert_eq!(editor.scene().len(), 1);
        assert!(editor.sync_log().unwrap().is_empty());

        let command = editor.scene().add_component(dot(1.0, 1.0));
        editor.dispatch(command).unwrap();
        assert_eq!(editor.sync_log().unwrap().len(), 1);
    }
    #[test]
    fn render_after_transform() {
        let mut editor = Editor::default();
        let component = dot(10.0, 10.0);
        let id = component.id();
        let command = editor.scene().add_component(component);
        editor.dispatch(command).unwrap();
        let view = Viewport::new([64, 64]);
        let mut before = RasterRenderer::try_new(64, 64).unwrap();
        editor.render(&mut before, &view);
        assert_eq!(before.pixel(13, 11), Some([0, 0, 0, 255]));

        let by = Matrix::translation(30.0, 0.0);
        let command = editor.scene().transform_components(&[id], &by, false);
        editor.dispatch(command).unwrap();
        let mut after = RasterRenderer::try_new(64, 64).unwrap();
        editor.render(&mut after, &view);
        assert_eq!(after.pixel(13, 11), Some([0, 0, 0, 0]));
        assert_eq!(after.pixel(43, 11), Some([0, 0, 0, 255]));
    }
    #[test]
    fn svg_and_description() {
        let mut editor = Editor::default();
        let text = Component::text("hello", TextStyle::default(), Matrix::translation(20.0, 40.0));
        let command = editor.scene().add_components([dot(1.0, 1.0), text]);
        editor.dispatch(command).unwrap();
        let svg = editor.to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("hello"));
        assert!(svg.contains("viewBox=\"0 0 500 500\""));
        let description = editor.describe(&Viewport::new([100, 100]));
        assert!(description.contains("\"hello\""), "{description}");
    }
}
