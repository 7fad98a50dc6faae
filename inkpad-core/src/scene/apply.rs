use super::Scene;
use crate::{
    commands::{Command, CommandConsumer, CommandError, DoUndo, TransformEntry},
    component::{Component, ComponentID},
};

impl Scene {
    /// Insert clones of all the components, or none of them.
    fn insert_all(&mut self, components: &[Component]) -> Result<(), CommandError> {
        let mut seen = hashbrown::HashSet::new();
        for component in components {
            if self.contains(component.id()) || !seen.insert(component.id()) {
                return Err(CommandError::MismatchedState);
            }
        }
        for component in components {
            self.insert(component.clone());
        }
        Ok(())
    }
    /// Remove all the components, or none of them. Each must exactly match what's in the scene.
    fn remove_all(&mut self, components: &[Component]) -> Result<(), CommandError> {
        let mut seen = hashbrown::HashSet::new();
        for component in components {
            let current = self
                .get(component.id())
                .ok_or(CommandError::UnknownResource)?;
            if current != component || !seen.insert(component.id()) {
                return Err(CommandError::MismatchedState);
            }
        }
        for component in components {
            self.remove(component.id());
        }
        Ok(())
    }
    /// Replace a component with a modified version of itself.
    fn replace(&mut self, component: Component) {
        self.remove(component.id());
        self.insert(component);
    }
    fn transform_all(&mut self, entries: &[TransformEntry], undo: bool) -> Result<(), CommandError> {
        let mut seen = hashbrown::HashSet::new();
        let mut updated = Vec::with_capacity(entries.len());
        for entry in entries {
            let (from, from_z, to, to_z) = if undo {
                (entry.to, entry.to_z, entry.from, entry.from_z)
            } else {
                (entry.from, entry.from_z, entry.to, entry.to_z)
            };
            let current = self.get(entry.target).ok_or(CommandError::UnknownResource)?;
            if *current.transform() != from
                || current.z_index() != from_z
                || !seen.insert(entry.target)
            {
                return Err(CommandError::MismatchedState);
            }
            let mut component = current.clone();
            component.set_transform(to);
            component.set_z_index(to_z);
            updated.push(component);
        }
        for component in updated {
            self.replace(component);
        }
        Ok(())
    }
    fn set_z(&mut self, target: ComponentID, from: i64, to: i64) -> Result<(), CommandError> {
        let current = self.get(target).ok_or(CommandError::UnknownResource)?;
        if current.z_index() != from {
            return Err(CommandError::MismatchedState);
        }
        let component = current.clone().with_z_index(to);
        self.replace(component);
        Ok(())
    }
    fn set_style(
        &mut self,
        target: ComponentID,
        from: &crate::component::ComponentStyle,
        to: &crate::component::ComponentStyle,
    ) -> Result<(), CommandError> {
        let current = self.get(target).ok_or(CommandError::UnknownResource)?;
        if current.style().as_ref() != Some(from) {
            return Err(CommandError::MismatchedState);
        }
        let mut component = current.clone();
        // Fails before any change if `to` is for another kind.
        component.set_style(to)?;
        self.replace(component);
        Ok(())
    }
    fn set_export_rect(
        &mut self,
        from: crate::util::Rect,
        to: crate::util::Rect,
    ) -> Result<(), CommandError> {
        if self.import_export_rect != from {
            return Err(CommandError::MismatchedState);
        }
        self.import_export_rect = to;
        Ok(())
    }
    /// Apply each command in turn. On failure, the ones already applied are reverted.
    fn apply_sequence<'c>(
        &mut self,
        commands: impl Iterator<Item = DoUndo<'c, Command>>,
    ) -> Result<(), CommandError> {
        let mut applied: Vec<DoUndo<'c, Command>> = Vec::new();
        for command in commands {
            if let Err(e) = self.apply(command) {
                for done in applied.into_iter().rev() {
                    if let Err(rollback) = self.apply(done.reversed()) {
                        // Each command was just applied successfully, so this shouldn't be possible.
                        log::error!("failed to roll back partially applied scope: {rollback}");
                    }
                }
                return Err(e);
            }
            applied.push(command);
        }
        Ok(())
    }
}

impl CommandConsumer<Command> for Scene {
    fn apply(&mut self, command: DoUndo<'_, Command>) -> Result<(), CommandError> {
        log::trace!(
            "{} {:?}",
            if matches!(command, DoUndo::Do(_)) { "do" } else { "undo" },
            command.inner().kind()
        );
        match command {
            DoUndo::Do(Command::Add(component)) => self.insert_all(std::slice::from_ref(&**component)),
            DoUndo::Undo(Command::Add(component)) => {
                self.remove_all(std::slice::from_ref(&**component))
            }
            DoUndo::Do(Command::Erase { components }) => self.remove_all(components),
            DoUndo::Undo(Command::Erase { components }) => self.insert_all(components),
            DoUndo::Do(Command::Transform { entries }) => self.transform_all(entries, false),
            DoUndo::Undo(Command::Transform { entries }) => self.transform_all(entries, true),
            DoUndo::Do(Command::SetZIndex { target, from, to }) => self.set_z(*target, *from, *to),
            DoUndo::Undo(Command::SetZIndex { target, from, to }) => {
                self.set_z(*target, *to, *from)
            }
            DoUndo::Do(Command::Restyle { target, from, to }) => self.set_style(*target, from, to),
            DoUndo::Undo(Command::Restyle { target, from, to }) => {
                self.set_style(*target, to, from)
            }
            DoUndo::Do(Command::SetImportExportRect { from, to }) => {
                self.set_export_rect(*from, *to)
            }
            DoUndo::Undo(Command::SetImportExportRect { from, to }) => {
                self.set_export_rect(*to, *from)
            }
            DoUndo::Do(Command::Scope(_, commands)) => {
                self.apply_sequence(commands.iter().map(DoUndo::Do))
            }
            DoUndo::Undo(Command::Scope(_, commands)) => {
                self.apply_sequence(commands.iter().rev().map(DoUndo::Undo))
            }
        }
    }
}
