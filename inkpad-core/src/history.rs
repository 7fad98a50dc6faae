//! # History
//!
//! Linear undo and redo stacks over [`Command`]s. Pushing a new command discards anything that was undone.
//!
//! The history does not own what it modifies - every operation takes the target to apply commands to,
//! which keeps the history usable for any [`CommandConsumer`]. Failed applications are logged and leave
//! both the target and the stacks untouched.

use crate::{
    commands::{Command, CommandConsumer, CommandError, DoUndo},
    events::EventDispatcher,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::AsRefStr)]
pub enum HistoryAction {
    Done,
    Undone,
    Redone,
}

/// Fired after every successful change to the history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEvent {
    pub action: HistoryAction,
    /// Description of the command acted on, for announcing to the user.
    pub description: String,
    pub undo_size: usize,
    pub redo_size: usize,
}

#[derive(Default)]
pub struct History {
    undo: Vec<Command>,
    redo: Vec<Command>,
    events: EventDispatcher<HistoryEvent>,
}
impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn undo_stack_size(&self) -> usize {
        self.undo.len()
    }
    #[must_use]
    pub fn redo_stack_size(&self) -> usize {
        self.redo.len()
    }
    /// The command that `undo` would revert.
    #[must_use]
    pub fn peek_undo(&self) -> Option<&Command> {
        self.undo.last()
    }
    /// The command that `redo` would reapply.
    #[must_use]
    pub fn peek_redo(&self) -> Option<&Command> {
        self.redo.last()
    }
    pub fn events(&mut self) -> &mut EventDispatcher<HistoryEvent> {
        &mut self.events
    }
    /// Forget everything, without touching the target.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
    fn notify(&mut self, action: HistoryAction, description: String) {
        let event = HistoryEvent {
            action,
            description,
            undo_size: self.undo.len(),
            redo_size: self.redo.len(),
        };
        self.events.dispatch(&event);
    }
    /// Apply a new command and make it the most recent undo step.
    pub fn push<T>(&mut self, target: &mut T, command: Command) -> Result<(), CommandError>
    where
        T: CommandConsumer<Command>,
    {
        // Would only clutter the undo stack.
        if command.is_empty() {
            log::debug!("ignoring empty {}", command.kind());
            return Err(CommandError::NoOp);
        }
        if let Err(e) = target.apply(DoUndo::Do(&command)) {
            log::error!("failed to apply {}: {e}", command.kind());
            return Err(e);
        }
        self.redo.clear();
        let description = command.description();
        self.undo.push(command);
        self.notify(HistoryAction::Done, description);
        Ok(())
    }
    /// Revert the most recent command. `Ok(false)` if there was nothing to undo.
    pub fn undo<T>(&mut self, target: &mut T) -> Result<bool, CommandError>
    where
        T: CommandConsumer<Command>,
    {
        let Some(command) = self.undo.pop() else {
            return Ok(false);
        };
        if let Err(e) = target.apply(DoUndo::Undo(&command)) {
            log::error!("failed to undo {}: {e}", command.kind());
            self.undo.push(command);
            return Err(e);
        }
        let description = command.description();
        self.redo.push(command);
        self.notify(HistoryAction::Undone, description);
        Ok(true)
    }
    /// Reapply the most recently undone command. `Ok(false)` if there was nothing to redo.
    pub fn redo<T>(&mut self, target: &mut T) -> Result<bool, CommandError>
    where
        T: CommandConsumer<Command>,
    {
        let Some(command) = self.redo.pop() else {
            return Ok(false);
        };
        if let Err(e) = target.apply(DoUndo::Do(&command)) {
            log::error!("failed to redo {}: {e}", command.kind());
            self.redo.push(command);
            return Err(e);
        }
        let description = command.description();
        self.undo.push(command);
        self.notify(HistoryAction::Redone, description);
        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::{History, HistoryAction, HistoryEvent};
    use crate::{
        commands::{Command, CommandError},
        scene::Scene,
        util::Rect,
    };
    use std::{cell::RefCell, rc::Rc};

    fn resize(scene: &Scene, size: f32) -> Command {
        scene.set_import_export_rect(Rect::new(0.0, 0.0, size, size))
    }

    #[test]
    fn three_dispatches_two_undos() {
        let mut scene = Scene::default();
        let mut history = History::new();
        for size in [1.0, 2.0, 3.0] {
            let command = resize(&scene, size);
            history.push(&mut scene, command).unwrap();
        }
        assert!(history.undo(&mut scene).unwrap());
        assert!(history.undo(&mut scene).unwrap());
        assert_eq!(history.undo_stack_size(), 1);
        assert_eq!(history.redo_stack_size(), 2);
        assert_eq!(scene.import_export_rect(), Rect::new(0.0, 0.0, 1.0, 1.0));

        // New work discards the redo stack
        let command = resize(&scene, 10.0);
        history.push(&mut scene, command).unwrap();
        assert_eq!(history.redo_stack_size(), 0);
        assert!(!history.redo(&mut scene).unwrap());
    }
    #[test]
    fn empty_undo_is_noop() {
        let mut scene = Scene::default();
        let mut history = History::new();
        assert!(!history.undo(&mut scene).unwrap());
        assert!(!history.redo(&mut scene).unwrap());
    }
    #[test]
    fn failed_push_keeps_stacks() {
        let mut scene = Scene::default();
        let mut history = History::new();
        let stale = resize(&scene, 5.0);
        let first = resize(&scene, 7.0);
        history.push(&mut scene, first).unwrap();
        // Built against the old rect
        assert_eq!(
            history.push(&mut scene, stale),
            Err(CommandError::MismatchedState)
        );
        assert_eq!(history.undo_stack_size(), 1);
        assert_eq!(scene.import_export_rect(), Rect::new(0.0, 0.0, 7.0, 7.0));
    }
    #[test]
    fn empty_push_is_rejected() {
        let mut scene = Scene::default();
        let mut history = History::new();
        let nothing = scene.remove_components(&[crate::component::ComponentID::default()]);
        assert_eq!(history.push(&mut scene, nothing), Err(CommandError::NoOp));
        assert_eq!(history.undo_stack_size(), 0);
    }
    #[test]
    fn events_report_sizes() {
        let mut scene = Scene::default();
        let mut history = History::new();
        let seen: Rc<RefCell<Vec<HistoryEvent>>> = Rc::default();
        let subscription = {
            let seen = seen.clone();
            history
                .events()
                .subscribe(move |event| seen.borrow_mut().push(event.clone()))
        };
        let command = resize(&scene, 2.0);
        history.push(&mut scene, command).unwrap();
        history.undo(&mut scene).unwrap();
        history.redo(&mut scene).unwrap();
        assert!(history.events().unsubscribe(subscription));
        history.undo(&mut scene).unwrap();

        let seen = seen.borrow();
        let actions: Vec<_> = seen.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            [HistoryAction::Done, HistoryAction::Undone, HistoryAction::Redone]
        );
        assert_eq!((seen[1].undo_size, seen[1].redo_size), (0, 1));
        assert_eq!(seen[0].description, "Resized export area");
    }
}
