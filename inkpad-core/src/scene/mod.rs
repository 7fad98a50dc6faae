//! # Scene
//!
//! The store of every component in an editor: keyed by ID, ordered by `(z_index, id)`, and indexed
//! spatially. Backgrounds live in a separate ordered partition that always paints first.
//!
//! The scene is never mutated directly by clients. Methods like [`Scene::add_component`] *build* a
//! [`Command`] describing the change against the current state, which is then applied through
//! [`CommandConsumer`](crate::commands::CommandConsumer) (see `apply.rs`).
//!
//! Every change records damaged canvas regions, drained by [`Scene::take_damage`] so that caches can
//! invalidate what they hold. A scene that is never drained keeps at most [`MAX_DAMAGE_RECTS`] regions,
//! merging them into one when that is exceeded.

mod apply;
pub mod spatial;

use crate::{
    commands::{unite_commands, Command, CommandError, ScopeType, TransformEntry},
    component::{Component, ComponentID, ComponentStyle},
    rendering_cache::RenderingCache,
    renderer::Renderer,
    transform::Matrix,
    util::Rect,
    viewport::Viewport,
};
use std::collections::BTreeSet;

/// Default import/export region, in canvas units.
pub const DEFAULT_IMPORT_EXPORT_RECT: Rect = Rect {
    x: 0.0,
    y: 0.0,
    w: 500.0,
    h: 500.0,
};

pub struct Scene {
    components: hashbrown::HashMap<ComponentID, Component>,
    /// Paint order of non-background components.
    foreground: BTreeSet<(i64, ComponentID)>,
    /// Paint order of backgrounds, all of which paint before any of `foreground`.
    background: BTreeSet<(i64, ComponentID)>,
    index: spatial::SpatialIndex,
    import_export_rect: Rect,
    damage: Vec<Rect>,
}
/// Beyond this many undrained regions, the damage list collapses into their union.
pub const MAX_DAMAGE_RECTS: usize = 256;

impl Default for Scene {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_SPATIAL_CELL_SIZE)
    }
}

// Public methods for access by the client
impl Scene {
    #[must_use]
    pub fn new(spatial_cell_size: f32) -> Self {
        Self {
            components: hashbrown::HashMap::new(),
            foreground: BTreeSet::new(),
            background: BTreeSet::new(),
            index: spatial::SpatialIndex::new(spatial_cell_size),
            import_export_rect: DEFAULT_IMPORT_EXPORT_RECT,
            damage: Vec::new(),
        }
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
    #[must_use]
    pub fn get(&self, id: ComponentID) -> Option<&Component> {
        self.components.get(&id)
    }
    #[must_use]
    pub fn contains(&self, id: ComponentID) -> bool {
        self.components.contains_key(&id)
    }
    #[must_use]
    pub fn import_export_rect(&self) -> Rect {
        self.import_export_rect
    }
    /// The z-index a newly added component receives: one above everything, or 0 in an empty scene.
    #[must_use]
    pub fn next_z_index(&self) -> i64 {
        self.foreground
            .last()
            .into_iter()
            .chain(self.background.last())
            .map(|(z, _)| *z)
            .max()
            .map_or(0, |z| z.saturating_add(1))
    }
    /// All components in paint order: backgrounds, then everything else by ascending `(z_index, id)`.
    pub fn get_all_components(&self) -> impl Iterator<Item = &Component> + '_ {
        self.background
            .iter()
            .chain(self.foreground.iter())
            .filter_map(|(_, id)| self.components.get(id))
    }
    /// Background components in paint order.
    pub fn get_background_components(&self) -> impl Iterator<Item = &Component> + '_ {
        self.background
            .iter()
            .filter_map(|(_, id)| self.components.get(id))
    }
    /// Non-background components whose bounding box touches `region`. Each appears once, in no
    /// particular order.
    #[must_use]
    pub fn get_elements_intersecting_region(&self, region: &Rect) -> Vec<&Component> {
        self.query(region, false)
    }
    /// Non-background components whose painted geometry touches `region`, such as for selection.
    /// A subset of [`Self::get_elements_intersecting_region`].
    #[must_use]
    pub fn get_elements_hit_by_region(&self, region: &Rect) -> Vec<&Component> {
        let mut found = self.query(region, false);
        found.retain(|component| component.intersects(region));
        found
    }
    /// Like [`Self::get_elements_intersecting_region`], including backgrounds.
    #[must_use]
    pub fn get_elements_intersecting_region_with_background(
        &self,
        region: &Rect,
    ) -> Vec<&Component> {
        self.query(region, true)
    }
    fn query(&self, region: &Rect, with_background: bool) -> Vec<&Component> {
        self.index
            .query(region)
            .into_iter()
            .filter_map(|id| self.components.get(&id))
            .filter(|component| with_background || !component.is_background())
            .filter(|component| component.bbox().intersects(region))
            .collect()
    }
    /// Components whose bounds touch `region`, in paint order.
    fn paint_order_in(&self, region: &Rect) -> Vec<&Component> {
        let mut found: Vec<&Component> = self
            .index
            .query(region)
            .into_iter()
            .filter_map(|id| self.components.get(&id))
            .filter(|component| component.bbox().intersects(region))
            .collect();
        found.sort_unstable_by_key(|c| (!c.is_background(), c.z_index(), c.id()));
        found
    }
    /// Draw everything touching `region` in paint order.
    /// The renderer's transform must already be set, and clipping is left to the caller.
    pub fn render_region(&self, renderer: &mut dyn Renderer, region: &Rect) {
        for component in self.paint_order_in(region) {
            component.render(renderer, *region);
        }
    }
    /// Draw the visible part of the scene directly, without any caching.
    pub fn render(&self, renderer: &mut dyn Renderer, viewport: &Viewport) {
        renderer.set_transform(viewport.canvas_to_screen);
        self.render_region(renderer, &viewport.visible_rect());
    }
    /// Draw the visible part of the scene, reusing cached rasters where possible.
    pub fn render_with_cache(
        &mut self,
        renderer: &mut dyn Renderer,
        cache: &mut RenderingCache,
        viewport: &Viewport,
    ) {
        cache.render(self, renderer, viewport);
    }
    /// Estimated cost of drawing everything touching `region` live.
    #[must_use]
    pub fn render_cost(&self, region: &Rect) -> u64 {
        self.paint_order_in(region)
            .iter()
            .map(|c| c.render_cost())
            .sum()
    }
    /// Take every damaged region recorded since the last call.
    pub fn take_damage(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.damage)
    }
    #[must_use]
    pub fn has_damage(&self) -> bool {
        !self.damage.is_empty()
    }
}

// Command builders. These do not modify the scene.
impl Scene {
    /// Insert a component above everything else.
    ///
    /// The z-index is taken from the scene as it is now. To add several components at once, use
    /// [`Self::add_components`], or group the adds with [`unite_commands`] so they stay in order.
    #[must_use]
    pub fn add_component(&self, component: Component) -> Command {
        let z = self.next_z_index();
        Command::Add(Box::new(component.with_z_index(z)))
    }
    /// Insert many components above everything else, keeping their relative order.
    #[must_use]
    pub fn add_components(&self, components: impl IntoIterator<Item = Component>) -> Command {
        unite_commands(self.stacked_adds(components))
    }
    /// Like [`Self::add_components`], grouped as a single load.
    #[must_use]
    pub fn load_components(&self, components: impl IntoIterator<Item = Component>) -> Command {
        Command::Scope(ScopeType::Load, self.stacked_adds(components).into_boxed_slice())
    }
    fn stacked_adds(&self, components: impl IntoIterator<Item = Component>) -> Vec<Command> {
        let base = self.next_z_index();
        components
            .into_iter()
            .zip(0i64..)
            .map(|(component, offset)| {
                Command::Add(Box::new(component.with_z_index(base.saturating_add(offset))))
            })
            .collect()
    }
    /// Remove components. Unknown and repeated ids are skipped.
    #[must_use]
    pub fn remove_components(&self, ids: &[ComponentID]) -> Command {
        Command::Erase {
            components: self.existing(ids).into_iter().cloned().collect(),
        }
    }
    /// Apply `by` after each component's current transform. With `reorder_to_top`, the
    /// components are also raised above everything else, keeping their relative order.
    #[must_use]
    pub fn transform_components(
        &self,
        ids: &[ComponentID],
        by: &Matrix,
        reorder_to_top: bool,
    ) -> Command {
        let mut targets = self.existing(ids);
        targets.sort_unstable_by_key(|c| (c.z_index(), c.id()));
        let base = self.next_z_index();
        let entries = targets
            .into_iter()
            .zip(0i64..)
            .map(|(component, offset)| TransformEntry {
                target: component.id(),
                from: *component.transform(),
                to: component.transform().then(by),
                from_z: component.z_index(),
                to_z: if reorder_to_top {
                    base.saturating_add(offset)
                } else {
                    component.z_index()
                },
            })
            .collect();
        Command::Transform { entries }
    }
    pub fn set_z_index(&self, id: ComponentID, z_index: i64) -> Result<Command, CommandError> {
        let component = self.get(id).ok_or(CommandError::UnknownResource)?;
        Ok(Command::SetZIndex {
            target: id,
            from: component.z_index(),
            to: z_index,
        })
    }
    pub fn restyle(&self, id: ComponentID, style: ComponentStyle) -> Result<Command, CommandError> {
        let component = self.get(id).ok_or(CommandError::UnknownResource)?;
        let from = component.style().ok_or(CommandError::MismatchedState)?;
        Ok(Command::Restyle {
            target: id,
            from,
            to: style,
        })
    }
    #[must_use]
    pub fn set_import_export_rect(&self, rect: Rect) -> Command {
        Command::SetImportExportRect {
            from: self.import_export_rect,
            to: rect,
        }
    }
    /// Copies of the components with fresh ids, placed above everything else.
    #[must_use]
    pub fn duplicate_components(&self, ids: &[ComponentID]) -> Command {
        let mut originals = self.existing(ids);
        originals.sort_unstable_by_key(|c| (c.z_index(), c.id()));
        let base = self.next_z_index();
        let adds = originals
            .into_iter()
            .zip(0i64..)
            .map(|(original, offset)| {
                Command::Add(Box::new(
                    original.duplicate().with_z_index(base.saturating_add(offset)),
                ))
            })
            .collect();
        Command::Scope(ScopeType::Duplicate, adds)
    }
    /// Look up each id once, skipping unknowns.
    fn existing(&self, ids: &[ComponentID]) -> Vec<&Component> {
        let mut seen = hashbrown::HashSet::new();
        ids.iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.components.get(id))
            .collect()
    }
}

// Private methods for modification by the command applier.
// Callers check preconditions first, so these never fail halfway.
impl Scene {
    fn order_set(&mut self, background: bool) -> &mut BTreeSet<(i64, ComponentID)> {
        if background {
            &mut self.background
        } else {
            &mut self.foreground
        }
    }
    fn record_damage(&mut self, rect: Rect) {
        if self.damage.len() >= MAX_DAMAGE_RECTS {
            let merged = self
                .damage
                .drain(..)
                .fold(rect, |all, damaged| all.union(&damaged));
            self.damage.push(merged);
        } else {
            self.damage.push(rect);
        }
    }
    fn insert(&mut self, component: Component) {
        let id = component.id();
        let background = component.is_background();
        self.record_damage(component.bbox());
        self.index.insert(id, component.loose_bbox());
        self.order_set(background).insert((component.z_index(), id));
        self.components.insert(id, component);
    }
    fn remove(&mut self, id: ComponentID) -> Option<Component> {
        let component = self.components.remove(&id)?;
        self.record_damage(component.bbox());
        self.index.remove(id);
        self.order_set(component.is_background())
            .remove(&(component.z_index(), id));
        Some(component)
    }
}

#[cfg(test)]
mod test;
