use std::net::IpAddr;

use chrono::{DateTime, Utc};

use crate::Cell;

/// Frame name shared by every query response.
pub const FRAME_NAME: &str = "response";

/// Column-major values of one frame field.
///
/// Typed variants store one optional entry per row; the JSON decode path
/// always fills `Some` since that wire has no null representation. `Untyped`
/// is the catch-all for columns the decoder has no typed holder for.
#[derive(Clone, Debug, PartialEq)]
pub enum SeriesValues {
    Int16(Vec<Option<i16>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
    DateTime(Vec<Option<DateTime<Utc>>>),
    Str(Vec<Option<String>>),
    Binary(Vec<Option<Vec<u8>>>),
    Ip(Vec<Option<IpAddr>>),
    Untyped(Vec<Cell>),
}

impl SeriesValues {
    /// Number of rows in the series.
    pub fn len(&self) -> usize {
        match self {
            SeriesValues::Int16(values) => values.len(),
            SeriesValues::Int32(values) => values.len(),
            SeriesValues::Int64(values) => values.len(),
            SeriesValues::Float32(values) => values.len(),
            SeriesValues::Float64(values) => values.len(),
            SeriesValues::DateTime(values) => values.len(),
            SeriesValues::Str(values) => values.len(),
            SeriesValues::Binary(values) => values.len(),
            SeriesValues::Ip(values) => values.len(),
            SeriesValues::Untyped(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One named column of a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub values: SeriesValues,
}

/// Columnar result container, one per executed query.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Frame {
    /// Row count shared by the frame's fields.
    pub fn row_count(&self) -> usize {
        self.fields.first().map_or(0, |field| field.values.len())
    }
}

/// Assembles one frame from column names and their decoded series.
///
/// Pure transform: field order follows manifest order, nothing is reordered
/// or filtered. Zero-length series and heterogeneous concrete types across
/// columns are both valid.
pub fn build_frame<I, N>(names: I, series: Vec<SeriesValues>) -> Frame
where
    I: IntoIterator<Item = N>,
    N: Into<String>,
{
    let fields = names
        .into_iter()
        .zip(series)
        .map(|(name, values)| Field {
            name: name.into(),
            values,
        })
        .collect();

    Frame {
        name: FRAME_NAME.to_owned(),
        fields,
    }
}
