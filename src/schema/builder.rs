//! Schema compilation and the process-wide schema cache.
//!
//! [`schema_of`] is the only way a record type becomes usable: it classifies every declared field,
//! resolves nested record types, validates the result and stores it by [`TypeId`] and
//! [`SchemaKind`]. The cache is filled lazily and never invalidated. Failed compilations are not stored, so every call on an
//! invalid record type reports the error again.
use std::{
    any::{TypeId, type_name},
    cell::RefCell,
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{
    record::{FieldDecl, Record},
    schema::{
        FieldModel, Schema, SchemaError, SchemaKind,
        annotation::{ArraySource, classify},
        validate,
    },
};

type SchemaCache = Mutex<HashMap<(TypeId, SchemaKind), Arc<Schema>>>;

fn cache() -> &'static SchemaCache {
    static CACHE: OnceLock<SchemaCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

thread_local! {
    static IN_PROGRESS: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

/// Marks a record type as being compiled on this thread for as long as it lives.
struct BuildGuard {
    type_id: TypeId,
}

impl BuildGuard {
    fn enter(type_id: TypeId, type_name: &'static str) -> Result<Self, SchemaError> {
        IN_PROGRESS.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&type_id) {
                return Err(SchemaError::RecursiveRecord { type_name });
            }
            stack.push(type_id);
            Ok(Self { type_id })
        })
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        IN_PROGRESS.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(idx) = stack.iter().rposition(|id| *id == self.type_id) {
                stack.remove(idx);
            }
        });
    }
}

/// The compiled data-array schema of `R`, building and caching it on first use.
pub fn schema_of<R: Record>() -> Result<Arc<Schema>, SchemaError> {
    compiled::<R>(SchemaKind::DataArray)
}

/// The compiled dataset schema of `R`, building and caching it on first use.
pub fn dataset_schema_of<R: Record>() -> Result<Arc<Schema>, SchemaError> {
    compiled::<R>(SchemaKind::Dataset)
}

fn compiled<R: Record>(kind: SchemaKind) -> Result<Arc<Schema>, SchemaError> {
    let key = (TypeId::of::<R>(), kind);
    if let Some(schema) = cache().lock().get(&key) {
        trace!(record = schema.type_name, ?kind, "schema cache hit");
        return Ok(Arc::clone(schema));
    }

    let built = {
        let _guard = BuildGuard::enter(key.0, type_name::<R>())?;
        compile(kind, type_name::<R>(), R::declare())?
    };

    let schema = Arc::clone(cache().lock().entry(key).or_insert_with(|| Arc::new(built)));
    debug!(
        record = schema.type_name,
        ?kind,
        fields = schema.len(),
        coordinates = schema.coordinates().count(),
        "compiled record schema"
    );
    Ok(schema)
}

/// Classify and validate a list of field declarations without touching the cache.
pub fn build_schema(type_name: &'static str, decls: Vec<FieldDecl>) -> Result<Schema, SchemaError> {
    compile(SchemaKind::DataArray, type_name, decls)
}

/// [`build_schema`] for a dataset record.
pub fn build_dataset_schema(
    type_name: &'static str,
    decls: Vec<FieldDecl>,
) -> Result<Schema, SchemaError> {
    compile(SchemaKind::Dataset, type_name, decls)
}

fn compile(
    kind: SchemaKind,
    type_name: &'static str,
    decls: Vec<FieldDecl>,
) -> Result<Schema, SchemaError> {
    let declared = decls.len();
    let mut fields = Vec::with_capacity(declared);

    for decl in decls {
        let classification = classify(&decl.name, &decl.annotation);
        let (array, origin, nested) = match classification.source {
            None => (None, None, None),
            Some(ArraySource::Declared(spec)) => (Some(spec), None, None),
            Some(ArraySource::Nested(nested)) => {
                let schema = (nested.schema)().map_err(|err| match err {
                    SchemaError::RecursiveRecord { .. } => err,
                    other => SchemaError::Nested {
                        field: decl.name.clone(),
                        source: Box::new(other),
                    },
                })?;
                (schema.data().array.clone(), Some(nested.type_name), Some(schema))
            }
        };

        fields.push(FieldModel {
            name: decl.name,
            role: classification.role,
            array,
            default: decl.default,
            doc: classification.doc,
            origin,
            nested,
        });
    }

    let data_index = validate::check(kind, declared, &fields)?;
    Ok(Schema::new(type_name, kind, fields, data_index))
}

/// Whether `R` compiles into a valid data-array schema.
pub fn is_data_array_record<R: Record>() -> bool {
    schema_of::<R>().is_ok()
}

/// Whether `R` compiles into a valid dataset schema.
pub fn is_dataset_record<R: Record>() -> bool {
    dataset_schema_of::<R>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dtype::DataType,
        record::{Fields, RecordError, Value},
        schema::{Annotation, Role},
    };

    struct Plain;

    impl Record for Plain {
        fn declare() -> Vec<FieldDecl> {
            vec![
                FieldDecl::new("data", Annotation::array(["x"], DataType::F64)),
                FieldDecl::new("x", Annotation::array(["x"], DataType::I64)),
                FieldDecl::new("units", Annotation::of::<String>()).with_default("m"),
            ]
        }

        fn field(&self, _name: &str) -> Option<Value> {
            None
        }

        fn from_fields(_fields: Fields) -> Result<Self, RecordError> {
            Ok(Plain)
        }
    }

    struct NoData;

    impl Record for NoData {
        fn declare() -> Vec<FieldDecl> {
            vec![FieldDecl::new("x", Annotation::array(["x"], None))]
        }

        fn field(&self, _name: &str) -> Option<Value> {
            None
        }

        fn from_fields(_fields: Fields) -> Result<Self, RecordError> {
            Ok(NoData)
        }
    }

    struct Looped;

    impl Record for Looped {
        fn declare() -> Vec<FieldDecl> {
            vec![
                FieldDecl::new("data", Annotation::array(["x"], None)),
                FieldDecl::new("x", Annotation::array_of::<Looped>()),
            ]
        }

        fn field(&self, _name: &str) -> Option<Value> {
            None
        }

        fn from_fields(_fields: Fields) -> Result<Self, RecordError> {
            Ok(Looped)
        }
    }

    #[test]
    fn compiles_fields_in_declaration_order() {
        let schema = schema_of::<Plain>().unwrap();
        let roles: Vec<_> = schema.fields().iter().map(|f| f.role).collect();
        assert_eq!(roles, vec![Role::Data, Role::Coordinate, Role::Attribute]);
        assert_eq!(schema.data().name, "data");
        assert!(!schema.field("units").unwrap().is_required());
        assert!(schema.field("x").unwrap().is_required());
    }

    #[test]
    fn cached_schema_is_shared() {
        let first = schema_of::<Plain>().unwrap();
        let second = schema_of::<Plain>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn failures_are_reported_every_time() {
        for _ in 0..2 {
            let err = schema_of::<NoData>().unwrap_err();
            assert!(matches!(err, SchemaError::DataFieldCount { count: 0, .. }));
        }
        let key = (TypeId::of::<NoData>(), SchemaKind::DataArray);
        assert!(!cache().lock().contains_key(&key));
        assert!(!is_data_array_record::<NoData>());
        assert!(is_data_array_record::<Plain>());
    }

    #[test]
    fn self_nesting_is_rejected() {
        let err = schema_of::<Looped>().unwrap_err();
        assert!(matches!(err, SchemaError::RecursiveRecord { .. }));
        // the guard is released after a failed build
        IN_PROGRESS.with(|stack| assert!(stack.borrow().is_empty()));
    }

    #[test]
    fn kinds_are_cached_separately() {
        let array = schema_of::<Plain>().unwrap();
        let dataset = dataset_schema_of::<Plain>().unwrap();
        assert_eq!(array.kind, SchemaKind::DataArray);
        assert_eq!(dataset.kind, SchemaKind::Dataset);
        assert!(!Arc::ptr_eq(&array, &dataset));
        assert_eq!(array.fields(), dataset.fields());

        assert!(matches!(
            dataset_schema_of::<NoData>(),
            Err(SchemaError::NoDataVariables)
        ));
        assert!(!is_dataset_record::<NoData>());
    }

    #[test]
    fn build_schema_does_not_cache() {
        let schema = build_schema("Plain", Plain::declare()).unwrap();
        assert_eq!(schema.type_name, "Plain");
        assert_eq!(schema.len(), 3);
    }
}
