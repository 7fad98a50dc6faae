//! # IDs
//! For many purposes, a unique ID is needed. This is implemented in this module via the `InkID<T>` type,
//! which generates unique IDs namespaced by the type T.
//!
//! IDs are random (UUID v4) rather than counted, so that two editors replaying each other's commands
//! never hand out the same ID, and so that no process-wide allocator state is needed.
//! To get a fresh ID, simply use `InkID<YourNamespaceTy>`'s `Default` impl.

/// ID that is unique across editors and executions.
/// IDs with different types may share a value but should not be considered equal.
pub struct InkID<T: std::any::Any> {
    id: uuid::Uuid,
    // Namespace marker. `fn() -> T` so that the ID is Send + Sync regardless of T.
    _phantom: std::marker::PhantomData<fn() -> T>,
}
impl<T: std::any::Any> Clone for InkID<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: std::any::Any> Copy for InkID<T> {}
impl<T: std::any::Any> std::cmp::PartialEq<InkID<T>> for InkID<T> {
    fn eq(&self, other: &InkID<T>) -> bool {
        // Namespace already checked at compile time - Self::T == Other::T of course!
        self.id == other.id
    }
}
impl<T: std::any::Any> std::cmp::Eq for InkID<T> {}
impl<T: std::any::Any> std::cmp::PartialOrd for InkID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
/// The order is arbitrary but total and stable, usable as a tie-breaker.
impl<T: std::any::Any> std::cmp::Ord for InkID<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}
impl<T: std::any::Any> std::hash::Hash for InkID<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: std::any::Any> InkID<T> {
    /// Wrap an existing UUID, e.g. one received from another editor.
    #[must_use]
    pub fn from_uuid(id: uuid::Uuid) -> Self {
        Self {
            id,
            _phantom: std::marker::PhantomData,
        }
    }
    #[must_use]
    pub fn uuid(&self) -> uuid::Uuid {
        self.id
    }
}
impl<T: std::any::Any> Default for InkID<T> {
    fn default() -> Self {
        Self::from_uuid(uuid::Uuid::new_v4())
    }
}
impl<T: std::any::Any> std::str::FromStr for InkID<T> {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self::from_uuid)
    }
}
impl<T: std::any::Any> std::fmt::Display for InkID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // rsplit always yields at least one element, even for empty strings.
        let name = std::any::type_name::<T>()
            .rsplit("::")
            .next()
            .unwrap_or_default();
        write!(f, "{name}#{}", self.id.simple())
    }
}
impl<T: std::any::Any> std::fmt::Debug for InkID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <InkID<T> as std::fmt::Display>::fmt(self, f)
    }
}
// Serialized as the bare UUID - the namespace is implied by where the ID appears.
impl<T: std::any::Any> serde::Serialize for InkID<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.id.serialize(serializer)
    }
}
impl<'de, T: std::any::Any> serde::Deserialize<'de> for InkID<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        uuid::Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}
