//! Dashboard-style query text generation.
//!
//! Builds the SQL the bridge executes for time-series panels: an aggregated
//! value over a time bucket, a nanosecond time-range predicate, optional
//! filters, and a row limit.

/// Aggregate functions the dashboard query shape supports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Aggregate {
    /// Raw values, no grouping.
    None,
    Sum,
    Count,
    Min,
    Max,
    #[default]
    Avg,
    Sumsq,
    /// Earliest value in the bucket; takes the time field as first argument.
    First,
    /// Latest value in the bucket; takes the time field as first argument.
    Last,
}

impl Aggregate {
    fn sql_name(self) -> &'static str {
        match self {
            Aggregate::None => "",
            Aggregate::Sum => "sum",
            Aggregate::Count => "count",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Avg => "avg",
            Aggregate::Sumsq => "sumsq",
            Aggregate::First => "first",
            Aggregate::Last => "last",
        }
    }
}

/// One WHERE-clause predicate appended after the time range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    /// `AND {key} {op} {value}`; `quote` wraps the value in single quotes.
    Comparison {
        key: String,
        op: String,
        value: String,
        quote: bool,
    },
    /// `AND {key} in ('a','b',..)`; values are trimmed and quoted unless
    /// already quoted.
    InList { key: String, values: Vec<String> },
    /// `AND {condition}` passed through verbatim.
    Raw(String),
}

impl Filter {
    pub fn comparison(
        key: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<String>,
        quote: bool,
    ) -> Self {
        Self::Comparison {
            key: key.into(),
            op: op.into(),
            value: value.into(),
            quote,
        }
    }

    pub fn in_list<I, V>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self::InList {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn raw(condition: impl Into<String>) -> Self {
        Self::Raw(condition.into())
    }

    fn to_sql(&self) -> String {
        match self {
            Filter::Comparison {
                key,
                op,
                value,
                quote,
            } => {
                if *quote {
                    format!(" AND {key} {op} '{value}'")
                } else {
                    format!(" AND {key} {op} {value}")
                }
            }
            Filter::InList { key, values } => {
                let list = values
                    .iter()
                    .map(|value| {
                        let trimmed = value.trim();
                        if trimmed.starts_with('\'') {
                            trimmed.to_owned()
                        } else {
                            format!("'{trimmed}'")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                format!(" AND {key} in ({list})")
            }
            Filter::Raw(condition) => format!(" AND {condition}"),
        }
    }
}

/// Millisecond interval rendered as `"{n} {unit}"` in the units the server
/// accepts, rounding up to the next whole unit.
pub fn interval_expr(interval_ms: u64) -> String {
    let (n, unit) = interval_parts(interval_ms);
    format!("{n} {unit}")
}

fn interval_parts(interval_ms: u64) -> (u64, &'static str) {
    const SEC: u64 = 1000;
    const MIN: u64 = 60 * SEC;
    const HOUR: u64 = 60 * MIN;
    const DAY: u64 = 24 * HOUR;

    if interval_ms < SEC {
        (interval_ms, "msec")
    } else if interval_ms < MIN {
        (interval_ms.div_ceil(SEC), "sec")
    } else if interval_ms < HOUR {
        (interval_ms.div_ceil(MIN), "min")
    } else if interval_ms < DAY {
        (interval_ms.div_ceil(HOUR), "hour")
    } else {
        (interval_ms.div_ceil(DAY), "day")
    }
}

/// Builds the SQL text for one dashboard panel query.
///
/// The time bucket uses `ROLLUP` when a rollup table is available, falling
/// back to `DATE_TRUNC`; sub-second intervals always use `DATE_TRUNC` since
/// rollup tables do not go below one second.
#[derive(Clone, Debug)]
pub struct QueryBuilder {
    table: String,
    time_field: String,
    value_field: String,
    aggregate: Aggregate,
    filters: Vec<Filter>,
    rollup: bool,
    title: Option<String>,
    range_ns: (i64, i64),
    interval_ms: u64,
    max_data_points: u64,
}

impl QueryBuilder {
    pub fn new(
        table: impl Into<String>,
        time_field: impl Into<String>,
        value_field: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            time_field: time_field.into(),
            value_field: value_field.into(),
            aggregate: Aggregate::default(),
            filters: Vec::new(),
            rollup: true,
            title: None,
            range_ns: (0, 0),
            interval_ms: 1000,
            max_data_points: 0,
        }
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = aggregate;
        self
    }

    pub fn rollup(mut self, rollup: bool) -> Self {
        self.rollup = rollup;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Series title; rendered as the quoted alias of the value column.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Query window as nanoseconds since the epoch.
    pub fn time_range_ns(mut self, from: i64, to: i64) -> Self {
        self.range_ns = (from, to);
        self
    }

    pub fn interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Caps the row limit at twice this value; zero keeps the default limit.
    pub fn max_data_points(mut self, max_data_points: u64) -> Self {
        self.max_data_points = max_data_points;
        self
    }

    pub fn build(&self) -> String {
        let grouped = self.aggregate != Aggregate::None;
        let (n, unit) = interval_parts(self.interval_ms);
        let use_rollup = grouped && self.rollup && unit != "msec";

        let time_expr = if !grouped {
            format!("{} AS TIME", self.time_field)
        } else if use_rollup {
            format!("{} ROLLUP {n} {unit} AS TIME", self.time_field)
        } else {
            format!("DATE_TRUNC('{unit}', {}, {n}) AS TIME", self.time_field)
        };

        let alias = match &self.title {
            Some(title) => format!("'{title}'"),
            None => "VALUE".to_owned(),
        };
        let select_expr = match self.aggregate {
            Aggregate::None => format!("{} AS {alias}", self.value_field),
            Aggregate::First | Aggregate::Last => format!(
                "{}({}, {}) AS {alias}",
                self.aggregate.sql_name(),
                self.time_field,
                self.value_field
            ),
            _ => format!(
                "{}({}) AS {alias}",
                self.aggregate.sql_name(),
                self.value_field
            ),
        };

        let mut sql = format!(
            "SELECT {time_expr}, {select_expr} FROM {} WHERE {} BETWEEN FROM_TIMESTAMP({}) AND FROM_TIMESTAMP({})",
            self.table, self.time_field, self.range_ns.0, self.range_ns.1
        );
        for filter in &self.filters {
            sql.push_str(&filter.to_sql());
        }
        if grouped {
            sql.push_str(" GROUP BY TIME");
        }
        sql.push_str(" ORDER BY TIME");

        let limit = if !grouped || self.max_data_points == 0 {
            5000
        } else {
            self.max_data_points * 2
        };
        sql.push_str(&format!(" LIMIT {limit}"));
        sql
    }
}
