//! # Components
//!
//! The drawable nodes of a scene. A component is a kind-specific payload ([`ComponentKind`]) placed on the
//! canvas by an affine transform, with a paint order given by its z-index.
//!
//! Components know nothing of the scene that holds them - the scene refers to them by [`ComponentID`].
//! Bounding boxes are cached and recomputed whenever the geometry changes, which is only possible through
//! methods here so the cache can't go stale.

pub mod background;
mod hit;
pub mod image;
pub mod stroke;
pub mod text;

pub use background::{Background, Grid};
pub use image::ImageData;
pub use stroke::Stroke;
pub use text::TextRun;

use crate::{
    color::Color,
    commands::CommandError,
    renderer::{Renderer, RenderingStyle, TextStyle},
    transform::Matrix,
    util::Rect,
};

pub type ComponentID = crate::InkID<Component>;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, strum::AsRefStr)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComponentKind {
    Stroke(Stroke),
    Text(TextRun),
    Image(ImageData),
    Background(Background),
}

/// The restylable part of a component. Images have none.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentStyle {
    Stroke(RenderingStyle),
    Text(TextStyle),
    Background { color: Color, grid: Option<Grid> },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "ComponentData", into = "ComponentData")]
pub struct Component {
    id: ComponentID,
    z_index: i64,
    selectable: bool,
    transform: Matrix,
    kind: ComponentKind,
    /// Exact canvas-space bounds, derived from the fields above.
    bbox: Rect,
    /// Cheap superset of `bbox`, derived from the fields above.
    loose_bbox: Rect,
}
/// Everything that isn't derived, for serialization.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
struct ComponentData {
    id: ComponentID,
    #[serde(default)]
    z_index: i64,
    #[serde(default = "selectable_default")]
    selectable: bool,
    #[serde(default)]
    transform: Matrix,
    kind: ComponentKind,
}
fn selectable_default() -> bool {
    true
}
impl From<ComponentData> for Component {
    fn from(data: ComponentData) -> Self {
        let mut this = Self {
            id: data.id,
            z_index: data.z_index,
            selectable: data.selectable,
            transform: data.transform,
            kind: data.kind,
            bbox: Rect::EMPTY,
            loose_bbox: Rect::EMPTY,
        };
        this.recompute_bounds();
        this
    }
}
impl From<Component> for ComponentData {
    fn from(value: Component) -> Self {
        Self {
            id: value.id,
            z_index: value.z_index,
            selectable: value.selectable,
            transform: value.transform,
            kind: value.kind,
        }
    }
}

impl Component {
    /// A new component with a fresh ID. The z-index is assigned when it's added to a scene.
    #[must_use]
    pub fn new(kind: ComponentKind, transform: Matrix) -> Self {
        let selectable = !matches!(kind, ComponentKind::Background(_));
        ComponentData {
            id: ComponentID::default(),
            z_index: 0,
            selectable,
            transform,
            kind,
        }
        .into()
    }
    #[must_use]
    pub fn stroke(path: crate::path::Path, style: RenderingStyle) -> Self {
        Self::new(ComponentKind::Stroke(Stroke { path, style }), Matrix::IDENTITY)
    }
    #[must_use]
    pub fn text(text: impl Into<String>, style: TextStyle, transform: Matrix) -> Self {
        Self::new(
            ComponentKind::Text(TextRun {
                text: text.into(),
                style,
            }),
            transform,
        )
    }
    #[must_use]
    pub fn background(rect: Rect, color: Color, grid: Option<Grid>) -> Self {
        Self::new(
            ComponentKind::Background(Background { rect, color, grid }),
            Matrix::IDENTITY,
        )
    }
    /// A copy with a fresh ID.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            id: ComponentID::default(),
            ..self.clone()
        }
    }
    #[must_use]
    pub fn id(&self) -> ComponentID {
        self.id
    }
    #[must_use]
    pub fn z_index(&self) -> i64 {
        self.z_index
    }
    #[must_use]
    pub fn with_z_index(mut self, z_index: i64) -> Self {
        self.z_index = z_index;
        self
    }
    pub(crate) fn set_z_index(&mut self, z_index: i64) {
        self.z_index = z_index;
    }
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        self.selectable
    }
    #[must_use]
    pub fn is_background(&self) -> bool {
        matches!(self.kind, ComponentKind::Background(_))
    }
    #[must_use]
    pub fn transform(&self) -> &Matrix {
        &self.transform
    }
    pub(crate) fn set_transform(&mut self, transform: Matrix) {
        self.transform = transform;
        self.recompute_bounds();
    }
    #[must_use]
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }
    /// Exact canvas-space bounds, including line widths.
    #[must_use]
    pub fn bbox(&self) -> Rect {
        self.bbox
    }
    /// Canvas-space bounds that always contain [`Self::bbox`], but may be larger.
    #[must_use]
    pub fn loose_bbox(&self) -> Rect {
        self.loose_bbox
    }
    #[must_use]
    pub fn style(&self) -> Option<ComponentStyle> {
        match &self.kind {
            ComponentKind::Stroke(stroke) => Some(ComponentStyle::Stroke(stroke.style)),
            ComponentKind::Text(text) => Some(ComponentStyle::Text(text.style.clone())),
            ComponentKind::Background(bg) => Some(ComponentStyle::Background {
                color: bg.color,
                grid: bg.grid,
            }),
            ComponentKind::Image(_) => None,
        }
    }
    /// Replace the style. Fails without change if the style is for another kind of component.
    pub(crate) fn set_style(&mut self, style: &ComponentStyle) -> Result<(), CommandError> {
        match (&mut self.kind, style) {
            (ComponentKind::Stroke(stroke), ComponentStyle::Stroke(style)) => stroke.style = *style,
            (ComponentKind::Text(text), ComponentStyle::Text(style)) => text.style = style.clone(),
            (ComponentKind::Background(bg), ComponentStyle::Background { color, grid }) => {
                bg.color = *color;
                bg.grid = *grid;
            }
            _ => return Err(CommandError::MismatchedState),
        }
        self.recompute_bounds();
        Ok(())
    }
    fn recompute_bounds(&mut self) {
        let t = &self.transform;
        let (bbox, loose) = match &self.kind {
            ComponentKind::Stroke(stroke) => (stroke.bounding_box(t), stroke.loose_bounding_box(t)),
            ComponentKind::Text(text) => {
                let bbox = text.bounding_box(t);
                (bbox, bbox)
            }
            ComponentKind::Image(image) => {
                let bbox = image.bounding_box(t);
                (bbox, bbox)
            }
            ComponentKind::Background(bg) => {
                let bbox = bg.bounding_box(t);
                (bbox, bbox)
            }
        };
        self.bbox = bbox;
        // Float error in the tight solve could otherwise put it just outside.
        self.loose_bbox = loose.union(&bbox);
    }
    /// Exact test of whether any painted part of this component touches `rect`.
    #[must_use]
    pub fn intersects(&self, rect: &Rect) -> bool {
        if !self.bbox.intersects(rect) {
            return false;
        }
        let t = &self.transform;
        match &self.kind {
            ComponentKind::Stroke(stroke) => stroke.intersects(t, rect),
            ComponentKind::Text(text) => text.intersects(t, rect),
            ComponentKind::Image(image) => image.intersects(t, rect),
            ComponentKind::Background(bg) => bg.intersects(t, rect),
        }
    }
    /// Draw, given the renderer's currently visible canvas rect.
    pub fn render(&self, renderer: &mut dyn Renderer, visible: Rect) {
        if !self.bbox.intersects(&visible) {
            return;
        }
        let t = &self.transform;
        match &self.kind {
            ComponentKind::Stroke(stroke) => stroke.render(renderer, t),
            ComponentKind::Text(text) => text.render(renderer, t),
            ComponentKind::Image(image) => image.render(renderer, t),
            ComponentKind::Background(bg) => bg.render(renderer, t),
        }
    }
    /// Relative estimate of the work needed to draw this live.
    #[must_use]
    pub fn render_cost(&self) -> u64 {
        match &self.kind {
            ComponentKind::Stroke(stroke) => stroke.render_cost(),
            ComponentKind::Text(text) => text.render_cost(),
            ComponentKind::Image(image) => image.render_cost(),
            ComponentKind::Background(bg) => bg.render_cost(),
        }
    }
    /// Short human readable summary, for announcements.
    #[must_use]
    pub fn description(&self) -> String {
        match &self.kind {
            ComponentKind::Stroke(_) => "stroke".to_owned(),
            ComponentKind::Text(text) => format!("text \"{}\"", text.text),
            ComponentKind::Image(image) if image.alt.is_empty() => "image".to_owned(),
            ComponentKind::Image(image) => format!("image ({})", image.alt),
            ComponentKind::Background(_) => "background".to_owned(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::Path;

    fn line(from: [f32; 2], to: [f32; 2], width: f32) -> Component {
        Component::stroke(
            Path::new(from).line_to(to),
            RenderingStyle::stroked(Color::BLACK, width),
        )
    }

    #[test]
    fn stroke_bounds_include_width() {
        let c = line([0.0, 0.0], [10.0, 0.0], 2.0);
        assert_eq!(c.bbox(), Rect::new(-1.0, -1.0, 12.0, 2.0));
        assert!(c.loose_bbox().contains_rect(&c.bbox()));
    }
    #[test]
    fn transform_updates_bounds() {
        let mut c = line([0.0, 0.0], [10.0, 0.0], 2.0);
        c.set_transform(Matrix::scaling(2.0).then(&Matrix::translation(100.0, 0.0)));
        // Line width scales too
        assert_eq!(c.bbox(), Rect::new(98.0, -2.0, 24.0, 4.0));
    }
    #[test]
    fn exact_test_rejects_bbox_corner() {
        // Diagonal line: the bbox covers the corner, the line doesn't.
        let c = line([0.0, 0.0], [100.0, 100.0], 1.0);
        assert!(c.bbox().intersects(&Rect::new(90.0, 0.0, 5.0, 5.0)));
        assert!(!c.intersects(&Rect::new(90.0, 0.0, 5.0, 5.0)));
        assert!(c.intersects(&Rect::new(45.0, 45.0, 5.0, 5.0)));
    }
    #[test]
    fn filled_interior_hits() {
        let square = Component::stroke(
            Path::from_rect(&Rect::new(0.0, 0.0, 100.0, 100.0)),
            RenderingStyle::filled(Color::BLACK),
        );
        assert!(square.intersects(&Rect::new(40.0, 40.0, 1.0, 1.0)));
        let outline = Component::stroke(
            Path::from_rect(&Rect::new(0.0, 0.0, 100.0, 100.0)),
            RenderingStyle::stroked(Color::BLACK, 1.0),
        );
        assert!(!outline.intersects(&Rect::new(40.0, 40.0, 1.0, 1.0)));
    }
    #[test]
    fn restyle_wrong_kind_fails() {
        let mut c = line([0.0, 0.0], [1.0, 1.0], 1.0);
        let before = c.clone();
        assert!(c
            .set_style(&ComponentStyle::Text(TextStyle::default()))
            .is_err());
        assert_eq!(c, before);
        c.set_style(&ComponentStyle::Stroke(RenderingStyle::stroked(Color::WHITE, 9.0)))
            .unwrap();
        assert!(c.bbox().w > before.bbox().w);
    }
    #[test]
    fn serde_recomputes_bounds() {
        let c = Component::text("hello", TextStyle::default(), Matrix::translation(5.0, 20.0));
        let json = serde_json::to_string(&c).unwrap();
        assert!(!json.contains("bbox"));
        let back: Component = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
        assert_eq!(back.bbox(), c.bbox());
    }
}
