/// Default name of the envelope field carrying the type identifier.
pub const TYPE_KEY: &str = "@t";
/// Default name of the envelope field carrying the payload.
pub const VALUE_KEY: &str = "@v";

pub const STRING_ID: &str = "string";
pub const BOOL_ID: &str = "bool";
pub const INT_ID: &str = "int";
pub const FLOAT_ID: &str = "float";
