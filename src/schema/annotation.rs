//! Field annotations and the role classifier.
//!
//! An [`Annotation`] is the declared type of a record field. [`classify`] turns a field name and
//! its annotation into a [`Role`] plus, for data and coordinate fields, the source of the
//! field's dimensions and dtype.
//!
//! ## Rules
//! Applied in order after unwrapping qualifiers, first match wins:
//! 1. the field is named `data` or wrapped in the data-variable marker: [`Role::Data`]
//! 2. the field is named `name`: [`Role::Name`]
//! 3. the annotation is a generic construct other than the array marker: [`Role::Attribute`]
//! 4. the annotation is not array-like: [`Role::Attribute`]
//! 5. otherwise: [`Role::Coordinate`]
//!
//! Classification never fails. Whether the resulting set of roles makes a valid record type is
//! decided by [`crate::schema::validate`].
use std::{any::TypeId, fmt, sync::Arc};

use compact_str::CompactString;

use crate::{
    consts::{DATA_FIELD, NAME_FIELD},
    dtype::DataType,
    record::Record,
    schema::{ArraySpec, Dims, Role, Schema, SchemaError, builder::schema_of},
};

/// Declared type of a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// The array marker; `None` when unparameterised.
    Array(Option<ArraySpec>),
    /// Array marker whose dims and dtype come from another record type's data field.
    ArrayOf(NestedRecord),
    /// Data-variable marker; the wrapped annotation gives dims and dtype.
    DataVar(Box<Annotation>),
    /// A construct carrying type arguments, e.g. `Vec<f64>`.
    Generic {
        origin: CompactString,
        args: Vec<Annotation>,
    },
    /// A named type. `array_like` types hold array values without declaring dims.
    Type {
        name: CompactString,
        array_like: bool,
    },
    /// Qualifier wrapping another annotation with metadata.
    Annotated {
        inner: Box<Annotation>,
        meta: FieldMeta,
    },
}

/// Metadata carried by a qualifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldMeta {
    pub doc: Option<String>,
    pub dims: Option<Dims>,
    pub dtype: Option<DataType>,
}

impl FieldMeta {
    /// Fill the unset entries of `self` from `inner`.
    fn merge(mut self, inner: &FieldMeta) -> Self {
        if self.doc.is_none() {
            self.doc = inner.doc.clone();
        }
        if self.dims.is_none() {
            self.dims = inner.dims.clone();
        }
        if self.dtype.is_none() {
            self.dtype = inner.dtype;
        }
        self
    }
}

/// Reference to a record type used by [`Annotation::ArrayOf`].
#[derive(Clone)]
pub struct NestedRecord {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub schema: fn() -> Result<Arc<Schema>, SchemaError>,
}

impl NestedRecord {
    pub fn of<R: Record>() -> Self {
        Self {
            type_id: TypeId::of::<R>(),
            type_name: std::any::type_name::<R>(),
            schema: schema_of::<R>,
        }
    }
}

impl PartialEq for NestedRecord {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl fmt::Debug for NestedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NestedRecord").field(&self.type_name).finish()
    }
}

impl Annotation {
    /// Array marker parameterised with dims and an optional dtype.
    pub fn array<I>(dims: I, dtype: impl Into<Option<DataType>>) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CompactString>,
    {
        Annotation::Array(Some(ArraySpec {
            dims: dims.into_iter().map(Into::into).collect(),
            dtype: dtype.into(),
        }))
    }

    /// Array marker for a 0-dimensional array.
    pub fn zero_dim(dtype: impl Into<Option<DataType>>) -> Self {
        Annotation::Array(Some(ArraySpec {
            dims: Dims::new(),
            dtype: dtype.into(),
        }))
    }

    /// Unparameterised array marker.
    pub fn untyped_array() -> Self {
        Annotation::Array(None)
    }

    /// Array marker taking dims and dtype from `R`'s data field.
    pub fn array_of<R: Record>() -> Self {
        Annotation::ArrayOf(NestedRecord::of::<R>())
    }

    /// Mark `inner` as a data field whatever the field is called.
    pub fn data_var(inner: Annotation) -> Self {
        Annotation::DataVar(Box::new(inner))
    }

    /// Plain, non-array Rust type.
    pub fn of<T: ?Sized>() -> Self {
        Annotation::Type {
            name: std::any::type_name::<T>().into(),
            array_like: false,
        }
    }

    /// A named type whose values are arrays.
    pub fn array_like(name: impl Into<CompactString>) -> Self {
        Annotation::Type {
            name: name.into(),
            array_like: true,
        }
    }

    pub fn generic(origin: impl Into<CompactString>, args: Vec<Annotation>) -> Self {
        Annotation::Generic {
            origin: origin.into(),
            args,
        }
    }

    /// Wrap in a qualifier carrying `meta`.
    pub fn annotated(self, meta: FieldMeta) -> Self {
        Annotation::Annotated {
            inner: Box::new(self),
            meta,
        }
    }

    /// Wrap in a qualifier carrying a doc string.
    pub fn doc(self, doc: impl Into<String>) -> Self {
        self.annotated(FieldMeta {
            doc: Some(doc.into()),
            ..FieldMeta::default()
        })
    }

    /// Strip qualifiers recursively, collecting their metadata (outermost wins).
    pub fn unannotate(&self) -> (&Annotation, FieldMeta) {
        let mut hint = self;
        let mut meta = FieldMeta::default();
        while let Annotation::Annotated { inner, meta: carried } = hint {
            meta = meta.merge(carried);
            hint = &**inner;
        }
        (hint, meta)
    }

    /// Whether values of this (unwrapped) annotation are arrays.
    pub fn is_array_like(&self) -> bool {
        match self {
            Annotation::Array(_) | Annotation::ArrayOf(_) | Annotation::DataVar(_) => true,
            Annotation::Type { array_like, .. } => *array_like,
            Annotation::Generic { .. } => false,
            Annotation::Annotated { inner, .. } => inner.is_array_like(),
        }
    }
}

/// Where a data or coordinate field gets its dims and dtype from.
#[derive(Debug, Clone, PartialEq)]
pub enum ArraySource {
    Declared(ArraySpec),
    Nested(NestedRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub role: Role,
    /// Set for [`Role::Data`] and [`Role::Coordinate`].
    pub source: Option<ArraySource>,
    pub doc: Option<String>,
}

pub fn classify(name: &str, annotation: &Annotation) -> Classification {
    let (hint, mut meta) = annotation.unannotate();
    let marked = matches!(hint, Annotation::DataVar(_));
    let hint = match hint {
        Annotation::DataVar(inner) => {
            let (inner, inner_meta) = inner.unannotate();
            meta = meta.merge(&inner_meta);
            inner
        }
        other => other,
    };

    let role = if marked || name == DATA_FIELD {
        Role::Data
    } else if name == NAME_FIELD {
        Role::Name
    } else if matches!(hint, Annotation::Generic { args, .. } if !args.is_empty()) {
        Role::Attribute
    } else if !hint.is_array_like() {
        Role::Attribute
    } else {
        Role::Coordinate
    };

    let source = match role {
        Role::Data | Role::Coordinate => Some(array_source(hint, &meta)),
        Role::Attribute | Role::Name => None,
    };

    Classification {
        role,
        source,
        doc: meta.doc,
    }
}

fn array_source(hint: &Annotation, meta: &FieldMeta) -> ArraySource {
    match hint {
        Annotation::ArrayOf(nested) => ArraySource::Nested(nested.clone()),
        Annotation::Array(Some(spec)) => ArraySource::Declared(spec.clone()),
        _ => ArraySource::Declared(ArraySpec {
            dims: meta.dims.clone().unwrap_or_default(),
            dtype: meta.dtype,
        }),
    }
}
