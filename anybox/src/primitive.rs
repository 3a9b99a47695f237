use crate::consts::{BOOL_ID, FLOAT_ID, INT_ID, STRING_ID};
use crate::reflect::{Primitive, PrimitiveRepr, Reflect, TypeInfo};
use crate::value::DynValue;

macro_rules! int_repr {
    ($($ty:ty),*) => {
        $(
            impl PrimitiveRepr for $ty {
                const PRIMITIVE: Primitive = Primitive::Int;

                fn widen(&self) -> Box<dyn DynValue> {
                    Box::new(i64::from(*self))
                }
            }
        )*
    };
}

macro_rules! float_repr {
    ($($ty:ty),*) => {
        $(
            impl PrimitiveRepr for $ty {
                const PRIMITIVE: Primitive = Primitive::Float;

                fn widen(&self) -> Box<dyn DynValue> {
                    Box::new(f64::from(*self))
                }
            }
        )*
    };
}

// u64, usize and i128 have no lossless path into the builtin `int`.
int_repr!(i8, i16, i32, i64, u8, u16, u32);
float_repr!(f32, f64);

impl PrimitiveRepr for String {
    const PRIMITIVE: Primitive = Primitive::Text;

    fn widen(&self) -> Box<dyn DynValue> {
        Box::new(self.clone())
    }
}

impl PrimitiveRepr for bool {
    const PRIMITIVE: Primitive = Primitive::Bool;

    fn widen(&self) -> Box<dyn DynValue> {
        Box::new(*self)
    }
}

impl Reflect for String {
    fn type_info() -> TypeInfo {
        TypeInfo::primitive::<Self>(STRING_ID)
    }
}

impl Reflect for bool {
    fn type_info() -> TypeInfo {
        TypeInfo::primitive::<Self>(BOOL_ID)
    }
}

impl Reflect for i64 {
    fn type_info() -> TypeInfo {
        TypeInfo::primitive::<Self>(INT_ID)
    }
}

impl Reflect for f64 {
    fn type_info() -> TypeInfo {
        TypeInfo::primitive::<Self>(FLOAT_ID)
    }
}
