use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::reflect::{FieldDescriptor, Kind, Primitive, Reflect, ScalarCodec, TypeInfo};
use crate::value::DynValue;
use log::{debug, warn};
use parking_lot::RwLock;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Registered type: identifier, kind, cached field layout and zero value factory.
pub struct TypeDescriptor {
    identifier: String,
    kind: Kind,
    type_id: TypeId,
    type_name: &'static str,
    primitive: Option<Primitive>,
    fields: Vec<FieldDescriptor>,
    codec: Option<ScalarCodec>,
    zero: fn() -> Box<dyn DynValue>,
}

impl TypeDescriptor {
    fn new<T: Reflect>(identifier: String, info: TypeInfo) -> Self {
        TypeDescriptor {
            identifier,
            kind: info.kind,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            primitive: info.primitive,
            fields: info.fields,
            codec: info.codec,
            zero: zero::<T>,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust name of the bound type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Underlying primitive of primitive and aliased-primitive kinds.
    pub fn primitive(&self) -> Option<Primitive> {
        self.primitive
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Fresh zero instance for decode-time population.
    pub fn zero_value(&self) -> Box<dyn DynValue> {
        (self.zero)()
    }

    pub(crate) fn codec(&self) -> Option<ScalarCodec> {
        self.codec
    }
}

impl Debug for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("identifier", &self.identifier)
            .field("kind", &self.kind)
            .field("type_name", &self.type_name)
            .field("primitive", &self.primitive)
            .field("fields", &self.fields)
            .finish()
    }
}

fn zero<T: Reflect>() -> Box<dyn DynValue> {
    Box::new(T::default())
}

#[derive(Default)]
struct Tables {
    /// identifier -> descriptor
    by_id: HashMap<String, Arc<TypeDescriptor>>,
    /// runtime type -> identifier
    by_type: HashMap<TypeId, String>,
}

/// Table of types that may travel inside envelopes.
///
/// Meant to be filled during initialization and read afterwards, but registration stays legal at
/// any time. Re-binding an identifier to a different type overwrites the previous binding
/// (last write wins); envelopes already encoded are not affected.
pub struct Registry {
    tables: RwLock<Tables>,
}

impl Registry {
    /// Registry with the builtin `string`, `bool`, `int` and `float` identifiers.
    pub fn new() -> Self {
        let registry = Registry::empty();
        registry.register::<String>();
        registry.register::<bool>();
        registry.register::<i64>();
        registry.register::<f64>();
        registry
    }

    /// Registry without builtins.
    pub fn empty() -> Self {
        Registry {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Registers `T` under the identifier from its [`TypeInfo`].
    pub fn register<T: Reflect>(&self) -> String {
        let info = T::type_info();
        let identifier = info.name.clone();
        self.insert::<T>(identifier, info)
    }

    /// Registers the runtime type of `sample`.
    pub fn register_value<T: Reflect>(&self, _sample: &T) -> String {
        self.register::<T>()
    }

    /// Registers `T` under an explicit identifier.
    ///
    /// Identifiers previously bound to `T` keep decoding, new envelopes use this one.
    pub fn register_as<T: Reflect>(&self, identifier: impl Into<String>) -> String {
        self.insert::<T>(identifier.into(), T::type_info())
    }

    fn insert<T: Reflect>(&self, identifier: String, info: TypeInfo) -> String {
        let type_id = TypeId::of::<T>();
        let mut guard = self.tables.write();
        let tables = &mut *guard;
        if let Some(existing) = tables.by_id.get(&identifier) {
            if existing.type_id == type_id {
                // same binding again, the identifier used for new envelopes stays as is
                tables
                    .by_type
                    .entry(type_id)
                    .or_insert_with(|| identifier.clone());
                debug!("{} already registered as \"{identifier}\"", type_name::<T>());
                return identifier;
            }
            warn!(
                "identifier \"{identifier}\" rebound from {} to {}",
                existing.type_name,
                type_name::<T>()
            );
            let displaced = existing.type_id;
            if tables.by_type.get(&displaced) == Some(&identifier) {
                tables.by_type.remove(&displaced);
            }
        }
        debug!(
            "register {} as \"{identifier}\" ({})",
            type_name::<T>(),
            info.kind
        );
        let descriptor = TypeDescriptor::new::<T>(identifier.clone(), info);
        tables.by_id.insert(identifier.clone(), Arc::new(descriptor));
        tables.by_type.insert(type_id, identifier.clone());
        identifier
    }

    /// Identifier for the runtime type of `value`.
    ///
    /// The most specific registration wins. An unregistered aliased primitive falls back to the
    /// builtin identifier of its underlying primitive.
    pub fn identifier_for<T: Reflect>(&self, _value: &T) -> Option<String> {
        self.resolve::<T>().map(|d| d.identifier.clone())
    }

    pub(crate) fn resolve<T: Reflect>(&self) -> Option<Arc<TypeDescriptor>> {
        {
            let tables = self.tables.read();
            let exact = tables
                .by_type
                .get(&TypeId::of::<T>())
                .and_then(|identifier| tables.by_id.get(identifier));
            if let Some(descriptor) = exact {
                return Some(descriptor.clone());
            }
        }
        let info = T::type_info();
        if info.kind != Kind::AliasedPrimitive {
            return None;
        }
        let builtin = info.primitive?.builtin_identifier();
        self.descriptor_for(builtin)
    }

    pub fn descriptor_for(&self, identifier: &str) -> Option<Arc<TypeDescriptor>> {
        self.tables.read().by_id.get(identifier).cloned()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.tables.read().by_id.contains_key(identifier)
    }

    /// All identifiers, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = self.tables.read().by_id.keys().cloned().collect();
        identifiers.sort();
        identifiers
    }

    /// All descriptors, sorted by identifier.
    pub fn descriptors(&self) -> Vec<Arc<TypeDescriptor>> {
        let mut descriptors: Vec<_> = self.tables.read().by_id.values().cloned().collect();
        descriptors.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        descriptors
    }

    pub fn len(&self) -> usize {
        self.tables.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn encoder(&self) -> Encoder<'_> {
        Encoder::new(self)
    }

    pub fn decoder(&self) -> Decoder<'_> {
        Decoder::new(self)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("identifiers", &self.identifiers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::consts::{BOOL_ID, FLOAT_ID, INT_ID, STRING_ID};
    use crate::{Kind, Reflect};

    #[derive(Clone, Debug, Default, PartialEq, Reflect)]
    struct Id(i32);

    #[derive(Clone, Debug, Default, PartialEq, Reflect)]
    #[anybox(name = "point")]
    struct Point {
        x: i64,
        y: i64,
    }

    #[derive(Clone, Debug, Default, PartialEq, Reflect)]
    #[anybox(name = "point")]
    struct OtherPoint {
        x: f64,
    }

    #[test]
    fn builtins() {
        let registry = Registry::new();
        assert_eq!(registry.identifiers(), vec![BOOL_ID, FLOAT_ID, INT_ID, STRING_ID]);
        assert_eq!(registry.identifier_for(&String::new()).as_deref(), Some(STRING_ID));
        assert_eq!(registry.identifier_for(&1i64).as_deref(), Some(INT_ID));
        let descriptor = registry.descriptor_for(FLOAT_ID).unwrap();
        assert_eq!(descriptor.kind(), Kind::Primitive);
        assert!(Registry::empty().is_empty());
    }

    #[test]
    fn register_is_idempotent() {
        let registry = Registry::new();
        let first = registry.register::<Point>();
        let second = registry.register_value(&Point { x: 1, y: 2 });
        assert_eq!(first, "point");
        assert_eq!(first, second);
        assert_eq!(registry.len(), 5);
        let descriptor = registry.descriptor_for("point").unwrap();
        assert_eq!(descriptor.kind(), Kind::Struct);
        let names: Vec<_> = descriptor.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn overwrite_last_wins() {
        let registry = Registry::new();
        registry.register::<Point>();
        registry.register::<OtherPoint>();
        let descriptor = registry.descriptor_for("point").unwrap();
        assert!(descriptor.type_name().ends_with("OtherPoint"));
        assert_eq!(registry.identifier_for(&OtherPoint::default()).as_deref(), Some("point"));
        // The displaced type has no identifier anymore.
        assert_eq!(registry.identifier_for(&Point::default()), None);
    }

    #[test]
    fn alias_prefers_specific_registration() {
        let registry = Registry::new();
        assert_eq!(registry.identifier_for(&Id(3)).as_deref(), Some(INT_ID));
        let id = registry.register::<Id>();
        assert_eq!(registry.identifier_for(&Id(3)), Some(id.clone()));
        assert_eq!(
            registry.descriptor_for(&id).map(|d| d.kind()),
            Some(Kind::AliasedPrimitive)
        );
    }

    #[test]
    fn register_as_keeps_previous_identifier() {
        let registry = Registry::new();
        let old = registry.register::<Point>();
        registry.register_as::<Point>("geo.Point");
        assert_eq!(registry.identifier_for(&Point::default()).as_deref(), Some("geo.Point"));
        assert!(registry.contains(&old));
    }

    #[test]
    fn repeated_registration_keeps_current_identifier() {
        let registry = Registry::new();
        registry.register::<Point>();
        registry.register_as::<Point>("geo.Point");
        registry.register_as::<Point>("map.Point");
        registry.register_as::<Point>("geo.Point");
        registry.register::<Point>();
        assert_eq!(registry.identifier_for(&Point::default()).as_deref(), Some("map.Point"));
        assert!(registry.contains("point"));
        assert!(registry.contains("geo.Point"));
    }
}
