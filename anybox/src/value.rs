use dyn_clone::DynClone;
use std::any::Any as StdAny;
use std::fmt::Debug;

/// Object-safe view of a value stored inside an [`Any`](crate::Any) envelope.
///
/// Implemented for every `'static` type that is `Clone + PartialEq + Debug + Send + Sync`.
pub trait DynValue: StdAny + Send + Sync + Debug + DynClone {
    fn as_any(&self) -> &dyn StdAny;
    fn as_any_mut(&mut self) -> &mut dyn StdAny;
    fn into_any(self: Box<Self>) -> Box<dyn StdAny>;
    /// Deep equality, false when the concrete types differ.
    fn dyn_eq(&self, other: &dyn DynValue) -> bool;
    fn type_name(&self) -> &'static str;
}

impl<T> DynValue for T
where
    T: StdAny + Send + Sync + Debug + Clone + PartialEq,
{
    fn as_any(&self) -> &dyn StdAny {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn StdAny {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn StdAny> {
        self
    }

    fn dyn_eq(&self, other: &dyn DynValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

dyn_clone::clone_trait_object!(DynValue);
