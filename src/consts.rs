use crate::dtype::DataType;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reserved field names:
///     data    the raw values of the array
///     name    the display name of the array
///
pub const DATA_FIELD: &str = "data";
pub const NAME_FIELD: &str = "name";

/// Element type of constructor-allocated buffers when neither the caller nor the
/// data field declares one.
pub const DEFAULT_DTYPE: DataType = DataType::F64;
