//! # Command serialization
//!
//! The wire form of a command, shared with collaborators and written to logs:
//! `{"kind": "...", "target_ids": [...], "parameters": {...}}`. `parameters` carries everything needed to
//! both apply and unapply the command, so a receiver needs no prior knowledge of the sender's scene.

use super::{Command, CommandKind};
use crate::component::ComponentID;

#[derive(thiserror::Error, Debug)]
pub enum SerializeError {
    #[error("malformed command: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown command kind {0:?}")]
    UnknownKind(String),
    #[error("target ids do not match the command's parameters")]
    TargetMismatch,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SerializedCommand {
    pub kind: String,
    #[serde(default)]
    pub target_ids: Vec<ComponentID>,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl Command {
    pub fn serialize(&self) -> Result<SerializedCommand, SerializeError> {
        let mut tagged = serde_json::to_value(self)?;
        let parameters = tagged
            .get_mut("parameters")
            .map(serde_json::Value::take)
            .unwrap_or_default();
        Ok(SerializedCommand {
            kind: self.kind().to_string(),
            target_ids: self.target_ids(),
            parameters,
        })
    }
    pub fn deserialize(serialized: &SerializedCommand) -> Result<Self, SerializeError> {
        // Check the kind first, for a better error than serde's "unknown variant".
        let _: CommandKind = serialized
            .kind
            .parse()
            .map_err(|_| SerializeError::UnknownKind(serialized.kind.clone()))?;
        let tagged = serde_json::json!({
            "kind": serialized.kind,
            "parameters": serialized.parameters,
        });
        let command: Command = serde_json::from_value(tagged)?;
        if command.target_ids() != serialized.target_ids {
            return Err(SerializeError::TargetMismatch);
        }
        Ok(command)
    }
    /// Serialize straight to a single line of JSON.
    pub fn to_json(&self) -> Result<String, SerializeError> {
        Ok(serde_json::to_string(&self.serialize()?)?)
    }
    pub fn from_json(json: &str) -> Result<Self, SerializeError> {
        let serialized: SerializedCommand = serde_json::from_str(json)?;
        Self::deserialize(&serialized)
    }
}

#[cfg(test)]
mod test {
    use super::{SerializeError, SerializedCommand};
    use crate::{
        color::Color,
        commands::{Command, ScopeType, TransformEntry},
        component::{Component, ImageData},
        path::Path,
        renderer::RenderingStyle,
        transform::Matrix,
    };

    #[test]
    fn add_carries_component() {
        let component = Component::stroke(
            Path::new([0.0, 0.0]).quad_to([5.0, 5.0], [10.0, 0.0]),
            RenderingStyle::stroked(Color::BLACK, 2.0),
        );
        let command = Command::Add(Box::new(component.clone()));
        let serialized = command.serialize().unwrap();
        assert_eq!(serialized.kind, "add");
        assert_eq!(serialized.target_ids, vec![component.id()]);
        assert_eq!(
            serialized.parameters["id"],
            serde_json::Value::String(component.id().uuid().to_string())
        );
        assert_eq!(Command::deserialize(&serialized).unwrap(), command);
    }
    #[test]
    fn image_pixels_survive() {
        let mut pixels = image::RgbaImage::new(2, 2);
        pixels.put_pixel(0, 1, image::Rgba([1, 2, 3, 4]));
        let component = Component::new(
            crate::component::ComponentKind::Image(ImageData::new(pixels, "tiny")),
            Matrix::translation(3.0, 3.0),
        );
        let erase = Command::Erase {
            components: vec![component],
        };
        let json = erase.to_json().unwrap();
        assert_eq!(Command::from_json(&json).unwrap(), erase);
    }
    #[test]
    fn nested_scope() {
        let a = Component::stroke(
            Path::new([0.0, 0.0]).line_to([1.0, 1.0]),
            RenderingStyle::filled(Color::WHITE),
        );
        let id = a.id();
        let command = Command::Scope(
            ScopeType::Duplicate,
            Box::new([
                Command::Add(Box::new(a)),
                Command::Transform {
                    entries: vec![TransformEntry {
                        target: id,
                        from: Matrix::IDENTITY,
                        to: Matrix::rotation(0.25),
                        from_z: 0,
                        to_z: 0,
                    }],
                },
            ]),
        );
        let json = command.to_json().unwrap();
        assert_eq!(Command::from_json(&json).unwrap(), command);
    }
    #[test]
    fn rejects_bad_input() {
        let unknown = SerializedCommand {
            kind: "teleport".to_owned(),
            target_ids: vec![],
            parameters: serde_json::Value::Null,
        };
        assert!(matches!(
            Command::deserialize(&unknown),
            Err(SerializeError::UnknownKind(kind)) if kind == "teleport"
        ));

        let malformed = SerializedCommand {
            kind: "set_z_index".to_owned(),
            target_ids: vec![],
            parameters: serde_json::json!({"target": "nope"}),
        };
        assert!(matches!(
            Command::deserialize(&malformed),
            Err(SerializeError::Json(_))
        ));

        let command = Command::SetZIndex {
            target: crate::component::ComponentID::default(),
            from: 0,
            to: 1,
        };
        let mut serialized = command.serialize().unwrap();
        serialized.target_ids.clear();
        assert!(matches!(
            Command::deserialize(&serialized),
            Err(SerializeError::TargetMismatch)
        ));
    }
}
