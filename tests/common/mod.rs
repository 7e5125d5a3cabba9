#![allow(dead_code)]

use labeled_records::{
    Annotation, DataType, FieldDecl, Fields, NdArray, Record, RecordError, Value,
};

/// `{data: (x, y) f64, mask: (x,) i64, scale: f64 = 1.0, name}`
#[derive(Debug, Clone)]
pub struct Image {
    pub data: NdArray,
    pub mask: Value,
    pub scale: f64,
    pub name: String,
}

impl Record for Image {
    fn declare() -> Vec<FieldDecl> {
        vec![
            FieldDecl::new("data", Annotation::array(["x", "y"], DataType::F64)),
            FieldDecl::new("mask", Annotation::array(["x"], DataType::I64)),
            FieldDecl::new("scale", Annotation::of::<f64>()).with_default(1.0),
            FieldDecl::new("name", Annotation::of::<String>()),
        ]
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "data" => Some(self.data.clone().into()),
            "mask" => Some(self.mask.clone()),
            "scale" => Some(self.scale.into()),
            "name" => Some(self.name.clone().into()),
            _ => None,
        }
    }

    fn from_fields(mut fields: Fields) -> Result<Self, RecordError> {
        Ok(Image {
            data: fields.take("data")?,
            mask: fields
                .remove("mask")
                .ok_or(RecordError::MissingField { field: "mask".into() })?,
            scale: fields.take("scale")?,
            name: fields.take("name")?,
        })
    }
}

// Declares a record type whose instances are never built; only the schema matters.
macro_rules! schema_only {
    ($name:ident, [$($decl:expr),* $(,)?]) => {
        pub struct $name;

        impl Record for $name {
            fn declare() -> Vec<FieldDecl> {
                vec![$($decl),*]
            }

            fn field(&self, _name: &str) -> Option<Value> {
                None
            }

            fn from_fields(_fields: Fields) -> Result<Self, RecordError> {
                Ok($name)
            }
        }
    };
}

schema_only!(XAxis, [
    FieldDecl::new("data", Annotation::array(["x"], DataType::I32)),
    FieldDecl::new("long_name", Annotation::of::<String>()).with_default("x axis"),
]);

schema_only!(YAxis, [
    FieldDecl::new("data", Annotation::array(["y"], DataType::F32)),
]);

// A grid whose coordinates take their dims and dtype from [`XAxis`] and [`YAxis`].
schema_only!(Grid, [
    FieldDecl::new("data", Annotation::array(["x", "y"], DataType::F64)),
    FieldDecl::new("x", Annotation::array_of::<XAxis>()),
    FieldDecl::new("y", Annotation::array_of::<YAxis>().doc("northing")),
]);

schema_only!(TwoData, [
    FieldDecl::new("data", Annotation::array(["x"], None)),
    FieldDecl::new("data", Annotation::array(["x"], None)),
]);

schema_only!(NoData, [
    FieldDecl::new("x", Annotation::array(["x"], None)),
    FieldDecl::new("units", Annotation::of::<String>()),
]);

schema_only!(StrayCoordinate, [
    FieldDecl::new("data", Annotation::array(["x", "y"], None)),
    FieldDecl::new("z", Annotation::array(["x", "z"], None)),
]);

schema_only!(NestsInvalid, [
    FieldDecl::new("data", Annotation::array(["x"], None)),
    FieldDecl::new("x", Annotation::array_of::<NoData>()),
]);

schema_only!(Ping, [
    FieldDecl::new("data", Annotation::array(["x"], None)),
    FieldDecl::new("x", Annotation::array_of::<Pong>()),
]);

schema_only!(Pong, [
    FieldDecl::new("data", Annotation::array(["x"], None)),
    FieldDecl::new("x", Annotation::array_of::<Ping>()),
]);

/// `{data: (y,) f64, name = "latitude", units = "deg"}`
#[derive(Debug, Clone)]
pub struct Lat {
    pub data: NdArray,
    pub name: String,
}

impl Record for Lat {
    fn declare() -> Vec<FieldDecl> {
        vec![
            FieldDecl::new("data", Annotation::array(["y"], DataType::F64)),
            FieldDecl::new("name", Annotation::of::<String>()).with_default("latitude"),
            FieldDecl::new("units", Annotation::of::<String>()).with_default("deg"),
        ]
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "data" => Some(self.data.clone().into()),
            "name" => Some(self.name.clone().into()),
            _ => None,
        }
    }

    fn from_fields(mut fields: Fields) -> Result<Self, RecordError> {
        Ok(Lat {
            data: fields.take("data")?,
            name: fields.take("name")?,
        })
    }
}

/// `{data: (x, y) f64, x: XAxis, lat: Lat}`
#[derive(Debug, Clone)]
pub struct Map {
    pub data: NdArray,
    pub x: Value,
    pub lat: Value,
}

impl Record for Map {
    fn declare() -> Vec<FieldDecl> {
        vec![
            FieldDecl::new("data", Annotation::array(["x", "y"], DataType::F64)),
            FieldDecl::new("x", Annotation::array_of::<XAxis>()),
            FieldDecl::new("lat", Annotation::array_of::<Lat>()),
        ]
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "data" => Some(self.data.clone().into()),
            "x" => Some(self.x.clone()),
            "lat" => Some(self.lat.clone()),
            _ => None,
        }
    }

    fn from_fields(mut fields: Fields) -> Result<Self, RecordError> {
        Ok(Map {
            data: fields.take("data")?,
            x: fields
                .remove("x")
                .ok_or(RecordError::MissingField { field: "x".into() })?,
            lat: fields
                .remove("lat")
                .ok_or(RecordError::MissingField { field: "lat".into() })?,
        })
    }
}

pub fn image_fields(data: impl Into<Value>, mask: impl Into<Value>) -> Fields {
    Fields::new()
        .with("data", data)
        .with("mask", mask)
        .with("scale", 2.0)
        .with("name", "t")
}
