//! # Commands
//!
//! Commands are the way the scene is modified. Every change - adding, erasing, moving, restyling - is described
//! by a command holding the exact before and after state, so that it can be undone exactly. Commands are
//! built by the [`Scene`](crate::scene::Scene) (which knows the current state) and applied through
//! [`CommandConsumer`], usually by way of the [`History`](crate::history::History).

pub mod serialize;

use crate::{
    component::{Component, ComponentID, ComponentStyle},
    transform::Matrix,
    util::Rect,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("command constructed for a state that does not match the current state")]
    MismatchedState,
    #[error("resource referenced by the command is not found")]
    UnknownResource,
    #[error("command makes no changes")]
    NoOp,
}
pub trait CommandConsumer<C> {
    /// Apply a single command. If this generates an error,
    /// the state of `self` should *not* be observably changed.
    fn apply(&mut self, command: DoUndo<'_, C>) -> Result<(), CommandError>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    /// Commands are grouped because they were individual parts in part of a single, larger operation.
    Atoms,
    /// Copies of existing components.
    Duplicate,
    /// Components brought in by a loader.
    Load,
}

/// One component's part of a [`Command::Transform`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformEntry {
    pub target: ComponentID,
    pub from: Matrix,
    pub to: Matrix,
    pub from_z: i64,
    pub to_z: i64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "parameters", rename_all = "snake_case")]
pub enum Command {
    /// Insert a component. Undo removes it again.
    Add(Box<Component>),
    /// Remove components, remembering them whole.
    Erase { components: Vec<Component> },
    /// Replace transforms (and possibly z-indices) of many components at once.
    Transform { entries: Vec<TransformEntry> },
    SetZIndex {
        target: ComponentID,
        from: i64,
        to: i64,
    },
    Restyle {
        target: ComponentID,
        from: ComponentStyle,
        to: ComponentStyle,
    },
    /// Resize the region of the canvas that is exported.
    SetImportExportRect { from: Rect, to: Rect },
    /// Bundle many commands into one big group. Can be nested many times.
    /// Grouped commands are treated as a single command, as far as the user can tell.
    Scope(ScopeType, Box<[Command]>),
}

/// The name of a command variant, as used on the wire.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::AsRefStr,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum CommandKind {
    Add,
    Erase,
    Transform,
    SetZIndex,
    Restyle,
    SetImportExportRect,
    Scope,
}

impl Command {
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Add(_) => CommandKind::Add,
            Self::Erase { .. } => CommandKind::Erase,
            Self::Transform { .. } => CommandKind::Transform,
            Self::SetZIndex { .. } => CommandKind::SetZIndex,
            Self::Restyle { .. } => CommandKind::Restyle,
            Self::SetImportExportRect { .. } => CommandKind::SetImportExportRect,
            Self::Scope(..) => CommandKind::Scope,
        }
    }
    /// True for an erase or transform with no targets, or a scope of only such commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Erase { components } => components.is_empty(),
            Self::Transform { entries } => entries.is_empty(),
            Self::Scope(_, commands) => commands.iter().all(Self::is_empty),
            _ => false,
        }
    }
    /// Every component this command touches, in first-mention order, without repeats.
    #[must_use]
    pub fn target_ids(&self) -> Vec<ComponentID> {
        let mut ids = Vec::new();
        self.collect_targets(&mut ids);
        let mut seen = hashbrown::HashSet::new();
        ids.retain(|id| seen.insert(*id));
        ids
    }
    fn collect_targets(&self, into: &mut Vec<ComponentID>) {
        match self {
            Self::Add(component) => into.push(component.id()),
            Self::Erase { components } => into.extend(components.iter().map(Component::id)),
            Self::Transform { entries } => into.extend(entries.iter().map(|entry| entry.target)),
            Self::SetZIndex { target, .. } | Self::Restyle { target, .. } => into.push(*target),
            Self::SetImportExportRect { .. } => (),
            Self::Scope(_, commands) => {
                for command in commands.iter() {
                    command.collect_targets(into);
                }
            }
        }
    }
    /// Human readable summary, suitable for an accessibility announcement.
    #[must_use]
    pub fn description(&self) -> String {
        fn count(n: usize) -> String {
            if n == 1 {
                "1 component".to_owned()
            } else {
                format!("{n} components")
            }
        }
        match self {
            Self::Add(component) => format!("Added {}", component.description()),
            Self::Erase { components } => match components.as_slice() {
                [one] => format!("Erased {}", one.description()),
                many => format!("Erased {}", count(many.len())),
            },
            Self::Transform { entries } => format!("Transformed {}", count(entries.len())),
            Self::SetZIndex { .. } => "Changed paint order".to_owned(),
            Self::Restyle { .. } => "Changed style".to_owned(),
            Self::SetImportExportRect { .. } => "Resized export area".to_owned(),
            Self::Scope(ScopeType::Duplicate, commands) => {
                format!("Duplicated {}", count(commands.len()))
            }
            Self::Scope(ScopeType::Load, commands) => {
                format!("Loaded {}", count(commands.len()))
            }
            Self::Scope(ScopeType::Atoms, commands) => match &commands[..] {
                [one] => one.description(),
                many => many
                    .iter()
                    .map(Self::description)
                    .collect::<Vec<_>>()
                    .join(", "),
            },
        }
    }
    /// A command whose application is exactly this command's undo.
    #[must_use]
    pub fn invert(&self) -> Command {
        match self {
            Self::Add(component) => Self::Erase {
                components: vec![(**component).clone()],
            },
            Self::Erase { components } => match components.as_slice() {
                [one] => Self::Add(Box::new(one.clone())),
                many => Self::Scope(
                    ScopeType::Atoms,
                    many.iter()
                        .map(|component| Self::Add(Box::new(component.clone())))
                        .collect(),
                ),
            },
            Self::Transform { entries } => Self::Transform {
                entries: entries
                    .iter()
                    .map(|entry| TransformEntry {
                        target: entry.target,
                        from: entry.to,
                        to: entry.from,
                        from_z: entry.to_z,
                        to_z: entry.from_z,
                    })
                    .collect(),
            },
            Self::SetZIndex { target, from, to } => Self::SetZIndex {
                target: *target,
                from: *to,
                to: *from,
            },
            Self::Restyle { target, from, to } => Self::Restyle {
                target: *target,
                from: to.clone(),
                to: from.clone(),
            },
            Self::SetImportExportRect { from, to } => Self::SetImportExportRect {
                from: *to,
                to: *from,
            },
            Self::Scope(ty, commands) => {
                Self::Scope(*ty, commands.iter().rev().map(Self::invert).collect())
            }
        }
    }
}

/// Combine commands into one that applies them all in order, and undoes them in reverse.
/// A single command is returned as-is.
///
/// Adds that were built against the same state share a z-index. Each such add is raised above
/// the adds before it, so later adds still paint on top.
#[must_use]
pub fn unite_commands(mut commands: Vec<Command>) -> Command {
    restack_adds(&mut commands);
    if commands.len() == 1 {
        if let Some(only) = commands.pop() {
            return only;
        }
    }
    Command::Scope(ScopeType::Atoms, commands.into_boxed_slice())
}

fn restack_adds(commands: &mut [Command]) {
    let mut top: Option<i64> = None;
    for command in commands {
        let Command::Add(component) = command else {
            continue;
        };
        if let Some(top) = top.filter(|top| component.z_index() <= *top) {
            component.set_z_index(top.saturating_add(1));
        }
        top = Some(component.z_index());
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum DoUndo<'c, T> {
    Do(&'c T),
    Undo(&'c T),
}
impl<'c, T> Clone for DoUndo<'c, T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'c, T> Copy for DoUndo<'c, T> {}
impl<'c, T> DoUndo<'c, T> {
    /// The same command, in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        match *self {
            Self::Do(c) => Self::Undo(c),
            Self::Undo(c) => Self::Do(c),
        }
    }
    #[must_use]
    pub fn inner(&self) -> &'c T {
        match *self {
            Self::Do(c) | Self::Undo(c) => c,
        }
    }
}
