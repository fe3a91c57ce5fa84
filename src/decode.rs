use std::net::IpAddr;

use chrono::{DateTime, Utc};

use crate::{
    channel::RowCursor,
    frame::SeriesValues,
    types::{Col, TypeTag},
    value::Cell,
    wire::ResultData,
    BridgeError, Result,
};

/// Materializes one column series per manifest entry from a row cursor.
///
/// The cursor delivers concretely-typed cells; storage is keyed by the
/// observed cell kind, not the declared tag. An unmapped declared type
/// aborts the whole query before any row is read.
pub fn decode_cursor_rows(cols: &[Col], cursor: &mut dyn RowCursor) -> Result<Vec<SeriesValues>> {
    let tags = cols
        .iter()
        .map(|col| TypeTag::resolve(&col.decltype))
        .collect::<Result<Vec<_>>>()?;

    let mut columns: Vec<Vec<Cell>> = (0..cols.len()).map(|_| Vec::new()).collect();
    while let Some(row) = cursor.fetch()? {
        if row.len() != cols.len() {
            return Err(BridgeError::Decode(format!(
                "row arity {} does not match {} declared columns",
                row.len(),
                cols.len()
            )));
        }
        for (column, cell) in columns.iter_mut().zip(row) {
            column.push(cell);
        }
    }

    Ok(columns
        .into_iter()
        .zip(tags)
        .map(|(cells, declared)| materialize_column(cells, declared))
        .collect())
}

/// Keys storage by the first observed non-null cell kind. The declared tag
/// only breaks the tie when the column holds no observable cell. Columns of
/// unsupported or mixed kinds fall through to the untyped catch-all instead
/// of aborting the frame.
fn materialize_column(cells: Vec<Cell>, declared: TypeTag) -> SeriesValues {
    if cells.is_empty() {
        // Zero rows normalize to an empty float64 series.
        return SeriesValues::Float64(Vec::new());
    }

    let observed = cells.iter().find(|cell| !matches!(cell, Cell::Null));
    let series = match observed {
        Some(Cell::Int16(_)) => collect(&cells, |cell| match cell {
            Cell::Int16(v) => Some(*v),
            _ => None,
        })
        .map(SeriesValues::Int16),
        Some(Cell::Int32(_)) => collect(&cells, |cell| match cell {
            Cell::Int32(v) => Some(*v),
            _ => None,
        })
        .map(SeriesValues::Int32),
        Some(Cell::Int64(_)) => collect(&cells, |cell| match cell {
            Cell::Int64(v) => Some(*v),
            _ => None,
        })
        .map(SeriesValues::Int64),
        Some(Cell::Float32(_)) => collect(&cells, |cell| match cell {
            Cell::Float32(v) => Some(*v),
            _ => None,
        })
        .map(SeriesValues::Float32),
        Some(Cell::Float64(_)) => collect(&cells, |cell| match cell {
            Cell::Float64(v) => Some(*v),
            _ => None,
        })
        .map(SeriesValues::Float64),
        Some(Cell::DateTime(_)) => collect(&cells, |cell| match cell {
            Cell::DateTime(v) => Some(*v),
            _ => None,
        })
        .map(SeriesValues::DateTime),
        Some(Cell::Str(_)) => collect(&cells, |cell| match cell {
            Cell::Str(v) => Some(v.clone()),
            _ => None,
        })
        .map(SeriesValues::Str),
        Some(Cell::Binary(_)) => collect(&cells, |cell| match cell {
            Cell::Binary(v) => Some(v.clone()),
            _ => None,
        })
        .map(SeriesValues::Binary),
        Some(Cell::Ip(_)) => collect(&cells, |cell| match cell {
            Cell::Ip(v) => Some(*v),
            _ => None,
        })
        .map(SeriesValues::Ip),
        Some(Cell::Unsupported { .. }) | Some(Cell::Null) => None,
        None => Some(null_series(declared, cells.len())),
    };

    series.unwrap_or_else(|| {
        tracing::debug!(
            observed = cells[0].kind(),
            rows = cells.len(),
            "column kept as untyped passthrough"
        );
        SeriesValues::Untyped(cells)
    })
}

fn collect<T>(cells: &[Cell], read: impl Fn(&Cell) -> Option<T>) -> Option<Vec<Option<T>>> {
    let mut out = Vec::with_capacity(cells.len());
    for cell in cells {
        match cell {
            Cell::Null => out.push(None),
            other => out.push(Some(read(other)?)),
        }
    }
    Some(out)
}

fn null_series(declared: TypeTag, len: usize) -> SeriesValues {
    match declared {
        TypeTag::Int16 => SeriesValues::Int16(vec![None; len]),
        TypeTag::Int32 => SeriesValues::Int32(vec![None; len]),
        TypeTag::Int64 => SeriesValues::Int64(vec![None; len]),
        TypeTag::Float32 => SeriesValues::Float32(vec![None; len]),
        TypeTag::Float64 => SeriesValues::Float64(vec![None; len]),
        TypeTag::DateTime => SeriesValues::DateTime(vec![None; len]),
        TypeTag::Str => SeriesValues::Str(vec![None; len]),
        TypeTag::Binary => SeriesValues::Binary(vec![None; len]),
        TypeTag::Ipv4 | TypeTag::Ipv6 => SeriesValues::Ip(vec![None; len]),
    }
}

/// Coerces the HTTP result payload into one series per declared column.
///
/// Cells arrive as generic JSON scalars: every numeric type is a float64,
/// text and IPs are strings, binary is an array of byte values.
pub fn decode_json_rows(data: &ResultData) -> Result<Vec<SeriesValues>> {
    let mut series = Vec::with_capacity(data.columns.len());
    for (index, name) in data.columns.iter().enumerate() {
        let decltype = data
            .types
            .get(index)
            .map(String::as_str)
            .unwrap_or_default();
        series.push(coerce_column(name, decltype, index, &data.rows)?);
    }
    Ok(series)
}

fn coerce_column(
    name: &str,
    decltype: &str,
    index: usize,
    rows: &[Vec<serde_json::Value>],
) -> Result<SeriesValues> {
    if rows.is_empty() {
        return Ok(SeriesValues::Float64(Vec::new()));
    }

    let mut cells = Vec::with_capacity(rows.len());
    for row in rows {
        cells.push(row.get(index).ok_or_else(|| {
            BridgeError::Decode(format!("row is missing cell {index} for column '{name}'"))
        })?);
    }

    // An unmapped declared tag falls through to the untyped passthrough, as
    // does `ipv4`, which has no coercion branch on this wire.
    let series = match TypeTag::parse(decltype) {
        Some(TypeTag::Int16) => SeriesValues::Int16(coerce_all(
            name,
            &cells,
            |v| v.as_f64().map(|f| f as i16),
            "number",
        )?),
        Some(TypeTag::Int32) => SeriesValues::Int32(coerce_all(
            name,
            &cells,
            |v| v.as_f64().map(|f| f as i32),
            "number",
        )?),
        Some(TypeTag::Int64) => SeriesValues::Int64(coerce_all(
            name,
            &cells,
            |v| v.as_f64().map(|f| f as i64),
            "number",
        )?),
        Some(TypeTag::Float32) => SeriesValues::Float32(coerce_all(
            name,
            &cells,
            |v| v.as_f64().map(|f| f as f32),
            "number",
        )?),
        Some(TypeTag::Float64) => {
            SeriesValues::Float64(coerce_all(name, &cells, |v| v.as_f64(), "number")?)
        }
        Some(TypeTag::DateTime) => SeriesValues::DateTime(coerce_all(
            name,
            &cells,
            |v| v.as_f64().and_then(epoch_instant),
            "epoch nanoseconds",
        )?),
        Some(TypeTag::Str) => SeriesValues::Str(coerce_all(
            name,
            &cells,
            |v| v.as_str().map(str::to_owned),
            "string",
        )?),
        Some(TypeTag::Ipv6) => SeriesValues::Ip(coerce_all(
            name,
            &cells,
            |v| v.as_str().and_then(|s| s.parse::<IpAddr>().ok()),
            "ip string",
        )?),
        Some(TypeTag::Binary) => SeriesValues::Binary(coerce_all(
            name,
            &cells,
            |v| v.as_array().and_then(|a| bytes_from_array(a)),
            "byte array",
        )?),
        Some(TypeTag::Ipv4) | None => SeriesValues::Untyped(
            cells
                .iter()
                .map(|value| passthrough_cell(decltype, value))
                .collect(),
        ),
    };
    Ok(series)
}

fn coerce_all<T>(
    column: &str,
    cells: &[&serde_json::Value],
    read: impl Fn(&serde_json::Value) -> Option<T>,
    expected: &str,
) -> Result<Vec<Option<T>>> {
    let mut out = Vec::with_capacity(cells.len());
    for &value in cells {
        match read(value) {
            Some(coerced) => out.push(Some(coerced)),
            None => {
                return Err(BridgeError::Coercion {
                    column: column.to_owned(),
                    detail: format!("expected {expected}, got {value}"),
                })
            }
        }
    }
    Ok(out)
}

// The wire carries nanoseconds since the epoch; whole seconds only, the
// sub-second remainder is dropped.
fn epoch_instant(nanos: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp((nanos as i64) / 1_000_000_000, 0)
}

fn bytes_from_array(values: &[serde_json::Value]) -> Option<Vec<u8>> {
    values
        .iter()
        .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect()
}

fn passthrough_cell(tag: &str, value: &serde_json::Value) -> Cell {
    if value.is_null() {
        Cell::Null
    } else {
        Cell::unsupported(tag, value.to_string().into_bytes())
    }
}
