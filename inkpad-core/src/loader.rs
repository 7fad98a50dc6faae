//! # Loader
//!
//! Bringing many components into an editor without stalling the caller. A [`ComponentProducer`] (an SVG
//! parser, a file reader, a test fixture...) hands out components one at a time, and a [`ChunkedLoad`]
//! moves them into the editor a chunk per [`ChunkedLoad::step`], so a frame loop can draw in between.

use crate::{
    commands::{unite_commands, CommandError},
    component::Component,
    editor::Editor,
    util::Rect,
};
use std::ops::ControlFlow;

/// A source of components. Producers never touch the scene themselves.
pub trait ComponentProducer {
    /// The next component, or None when exhausted.
    fn next_component(&mut self) -> Option<Component>;
    /// How many components will be produced in total, if known.
    fn size_hint_total(&self) -> Option<usize> {
        None
    }
    /// The region the source document considers its bounds, applied once loading completes.
    fn import_export_rect(&self) -> Option<Rect> {
        None
    }
}

/// Produce components from any iterator.
pub struct IterProducer<I> {
    iter: I,
    total: Option<usize>,
    rect: Option<Rect>,
}
impl<I: Iterator<Item = Component>> IterProducer<I> {
    pub fn new(components: impl IntoIterator<IntoIter = I>) -> Self {
        let iter = components.into_iter();
        let total = match iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        };
        Self {
            iter,
            total,
            rect: None,
        }
    }
    #[must_use]
    pub fn with_import_export_rect(self, rect: Rect) -> Self {
        Self {
            rect: Some(rect),
            ..self
        }
    }
}
impl<I: Iterator<Item = Component>> ComponentProducer for IterProducer<I> {
    fn next_component(&mut self) -> Option<Component> {
        self.iter.next()
    }
    fn size_hint_total(&self) -> Option<usize> {
        self.total
    }
    fn import_export_rect(&self) -> Option<Rect> {
        self.rect
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadMode {
    /// Each chunk becomes its own undo step, visible as soon as it's added.
    Incremental,
    /// Nothing is added until the producer is exhausted, then everything is added as one undo step,
    /// together with the producer's export rect.
    Atomic,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    /// More to come - call `step` again.
    Yielded {
        processed: usize,
        total: Option<usize>,
    },
    /// Everything was loaded. `dropped` counts degenerate components that were skipped.
    Done { processed: usize, dropped: usize },
    /// The progress callback asked to stop. In incremental mode, chunks already added remain.
    Aborted { processed: usize },
}

type ProgressCallback = Box<dyn FnMut(usize, Option<usize>) -> ControlFlow<()>>;

pub struct ChunkedLoad<P> {
    producer: P,
    mode: LoadMode,
    chunk_size: usize,
    processed: usize,
    dropped: usize,
    /// Gathered components, in atomic mode.
    pending: Vec<Component>,
    progress: Option<ProgressCallback>,
    finished: Option<LoadStatus>,
}
impl<P: ComponentProducer> ChunkedLoad<P> {
    /// Load in chunks of `chunk_size` components, minimum one.
    pub fn new(producer: P, mode: LoadMode, chunk_size: usize) -> Self {
        Self {
            producer,
            mode,
            chunk_size: chunk_size.max(1),
            processed: 0,
            dropped: 0,
            pending: Vec::new(),
            progress: None,
            finished: None,
        }
    }
    /// Called with `(processed, total)` after every chunk. Returning `Break` aborts the load.
    #[must_use]
    pub fn on_progress(
        self,
        progress: impl FnMut(usize, Option<usize>) -> ControlFlow<()> + 'static,
    ) -> Self {
        Self {
            progress: Some(Box::new(progress)),
            ..self
        }
    }
    /// Move up to one chunk of components into the editor.
    ///
    /// Errors if the editor rejects a chunk, in which case that chunk is lost but the load may continue.
    pub fn step(&mut self, editor: &mut Editor) -> Result<LoadStatus, CommandError> {
        if let Some(status) = self.finished {
            return Ok(status);
        }
        let mut chunk = Vec::with_capacity(self.chunk_size);
        let mut exhausted = false;
        while chunk.len() < self.chunk_size {
            let Some(component) = self.producer.next_component() else {
                exhausted = true;
                break;
            };
            self.processed += 1;
            let bbox = component.bbox();
            if !bbox.is_finite() || bbox.has_zero_area() {
                log::warn!("dropping degenerate {} with bounds {bbox:?}", component.description());
                self.dropped += 1;
                continue;
            }
            chunk.push(component);
        }

        match self.mode {
            LoadMode::Incremental if !chunk.is_empty() => {
                let command = editor.scene().load_components(chunk);
                editor.dispatch(command)?;
            }
            LoadMode::Incremental => (),
            LoadMode::Atomic => self.pending.append(&mut chunk),
        }

        let total = self.producer.size_hint_total();
        if let Some(progress) = self.progress.as_mut() {
            if progress(self.processed, total).is_break() {
                log::info!("load aborted after {} components", self.processed);
                self.pending.clear();
                return Ok(self.finish(LoadStatus::Aborted {
                    processed: self.processed,
                }));
            }
        }
        if !exhausted {
            return Ok(LoadStatus::Yielded {
                processed: self.processed,
                total,
            });
        }

        let mut commands = Vec::with_capacity(2);
        if !self.pending.is_empty() {
            commands.push(
                editor
                    .scene()
                    .load_components(std::mem::take(&mut self.pending)),
            );
        }
        if let Some(rect) = self.producer.import_export_rect() {
            commands.push(editor.scene().set_import_export_rect(rect));
        }
        match self.mode {
            LoadMode::Atomic if !commands.is_empty() => editor.dispatch(unite_commands(commands))?,
            _ => {
                for command in commands {
                    editor.dispatch(command)?;
                }
            }
        }
        log::debug!(
            "loaded {} components, dropped {}",
            self.processed - self.dropped,
            self.dropped
        );
        Ok(self.finish(LoadStatus::Done {
            processed: self.processed,
            dropped: self.dropped,
        }))
    }
    /// Step until finished.
    pub fn run(&mut self, editor: &mut Editor) -> Result<LoadStatus, CommandError> {
        loop {
            match self.step(editor)? {
                LoadStatus::Yielded { .. } => continue,
                status => return Ok(status),
            }
        }
    }
    fn finish(&mut self, status: LoadStatus) -> LoadStatus {
        self.finished = Some(status);
        status
    }
}
