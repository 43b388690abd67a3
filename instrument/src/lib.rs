//! Records simulation `tracing` events into column tables.
//!
//! Each event target becomes a table and each event a row. Columns appear the
//! first time a field is seen and are padded with zero values so every column
//! in a table stays the length of its row count.
//!
//! # Usage
//!
//! ```ignore
//! // In simulation code:
//! tracing::info!(target: "tick", tick, employment_total, unemployment_rate);
//!
//! // In a test:
//! tracing::subscriber::with_default(instrument::DataFrameSubscriber, || model.run(50));
//! let recorder = instrument::drain();
//! let rates = recorder.tick_table().and_then(|t| t.f64_column("unemployment_rate"));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

/// Target carrying one row per simulation tick.
pub const TICK_TABLE: &str = "tick";
/// Target carrying one row per firm per tick.
pub const HIRING_TABLE: &str = "hiring";

// === Cells and columns ===

/// A single recorded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Str(String),
}

/// A column of typed values.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedColumn {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl TypedColumn {
    /// Empty column of `value`'s type, pre-filled with `rows` zero values.
    fn zeroed_like(value: &CellValue, rows: usize) -> Self {
        match value {
            CellValue::U64(_) => TypedColumn::U64(vec![0; rows]),
            CellValue::I64(_) => TypedColumn::I64(vec![0; rows]),
            CellValue::F64(_) => TypedColumn::F64(vec![0.0; rows]),
            CellValue::Bool(_) => TypedColumn::Bool(vec![false; rows]),
            CellValue::Str(_) => TypedColumn::Str(vec![String::new(); rows]),
        }
    }

    /// Append a value of the column's type. Mismatched values are dropped and
    /// the row is padded later.
    fn push(&mut self, value: CellValue) {
        match (self, value) {
            (TypedColumn::U64(v), CellValue::U64(x)) => v.push(x),
            (TypedColumn::I64(v), CellValue::I64(x)) => v.push(x),
            (TypedColumn::F64(v), CellValue::F64(x)) => v.push(x),
            (TypedColumn::Bool(v), CellValue::Bool(x)) => v.push(x),
            (TypedColumn::Str(v), CellValue::Str(x)) => v.push(x),
            _ => {}
        }
    }

    fn pad_to(&mut self, rows: usize) {
        let missing = rows.saturating_sub(self.len());
        if missing == 0 {
            return;
        }
        match self {
            TypedColumn::U64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TypedColumn::I64(v) => v.extend(std::iter::repeat_n(0, missing)),
            TypedColumn::F64(v) => v.extend(std::iter::repeat_n(0.0, missing)),
            TypedColumn::Bool(v) => v.extend(std::iter::repeat_n(false, missing)),
            TypedColumn::Str(v) => v.extend(std::iter::repeat_n(String::new(), missing)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TypedColumn::U64(v) => v.len(),
            TypedColumn::I64(v) => v.len(),
            TypedColumn::F64(v) => v.len(),
            TypedColumn::Bool(v) => v.len(),
            TypedColumn::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// === Tables ===

/// A table with dynamically-typed columns.
#[derive(Debug, Clone, Default)]
pub struct DynamicTable {
    pub columns: HashMap<String, TypedColumn>,
    pub row_count: usize,
}

impl DynamicTable {
    /// Set a field on the row currently being built (index `row_count`).
    pub fn push_cell(&mut self, name: &str, value: CellValue) {
        let rows = self.row_count;
        self.columns
            .entry(name.to_string())
            .or_insert_with(|| TypedColumn::zeroed_like(&value, rows))
            .push(value);
    }

    /// Close the current row, padding columns that got no value.
    pub fn finish_row(&mut self) {
        self.row_count += 1;
        self.pad_columns_to_row_count();
    }

    fn pad_columns_to_row_count(&mut self) {
        let rows = self.row_count;
        for col in self.columns.values_mut() {
            col.pad_to(rows);
        }
    }

    pub fn u64_column(&self, name: &str) -> Option<&[u64]> {
        match self.columns.get(name)? {
            TypedColumn::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn f64_column(&self, name: &str) -> Option<&[f64]> {
        match self.columns.get(name)? {
            TypedColumn::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn bool_column(&self, name: &str) -> Option<&[bool]> {
        match self.columns.get(name)? {
            TypedColumn::Bool(v) => Some(v),
            _ => None,
        }
    }
}

/// Collection of tables, keyed by tracing target.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub tables: HashMap<String, DynamicTable>,
}

impl Recorder {
    pub fn table(&self, target: &str) -> Option<&DynamicTable> {
        self.tables.get(target)
    }

    pub fn tick_table(&self) -> Option<&DynamicTable> {
        self.table(TICK_TABLE)
    }

    pub fn hiring_table(&self) -> Option<&DynamicTable> {
        self.table(HIRING_TABLE)
    }
}

thread_local! {
    static RECORDER: RefCell<Recorder> = RefCell::default();
}

// === Subscriber ===

struct RowVisitor<'a> {
    table: &'a mut DynamicTable,
}

impl Visit for RowVisitor<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.table.push_cell(field.name(), CellValue::U64(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.table.push_cell(field.name(), CellValue::I64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.table.push_cell(field.name(), CellValue::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.table.push_cell(field.name(), CellValue::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.table
            .push_cell(field.name(), CellValue::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.table
            .push_cell(field.name(), CellValue::Str(format!("{:?}", value)));
    }
}

/// Tracing subscriber that collects info-level events into the thread-local
/// recorder. Spans are ignored.
pub struct DataFrameSubscriber;

impl Subscriber for DataFrameSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= tracing::Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let target = event.metadata().target().to_string();

        RECORDER.with(|r| {
            let mut recorder = r.borrow_mut();
            let table = recorder.tables.entry(target).or_default();
            event.record(&mut RowVisitor { table: &mut *table });
            table.finish_row();
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Install the DataFrameSubscriber as the global default.
/// Later calls are ignored once a global subscriber exists.
pub fn install_subscriber() {
    let _ = tracing::subscriber::set_global_default(DataFrameSubscriber);
}

/// Take everything recorded on this thread so far.
pub fn drain() -> Recorder {
    RECORDER.with(|r| std::mem::take(&mut *r.borrow_mut()))
}

/// Discard everything recorded on this thread so far.
pub fn clear() {
    RECORDER.with(|r| *r.borrow_mut() = Recorder::default());
}

/// Run `f` with the recorder as the scoped subscriber and return its result
/// together with the tables it produced. Anything recorded earlier on this
/// thread is discarded first.
pub fn record<T>(f: impl FnOnce() -> T) -> (T, Recorder) {
    clear();
    let out = tracing::subscriber::with_default(DataFrameSubscriber, f);
    (out, drain())
}

// === Polars Integration ===

use polars::prelude::*;

impl DynamicTable {
    /// Convert this table to a polars DataFrame.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut names: Vec<&String> = self.columns.keys().collect();
        names.sort();

        let columns = names
            .into_iter()
            .map(|name| match &self.columns[name] {
                TypedColumn::U64(v) => Column::new(name.into(), v),
                TypedColumn::I64(v) => Column::new(name.into(), v),
                TypedColumn::F64(v) => Column::new(name.into(), v),
                TypedColumn::Bool(v) => Column::new(name.into(), v),
                TypedColumn::Str(v) => Column::new(name.into(), v),
            })
            .collect();

        DataFrame::new(columns)
    }
}

impl Recorder {
    /// Convert all tables to polars DataFrames, skipping any that fail.
    pub fn to_dataframes(&self) -> HashMap<String, DataFrame> {
        self.tables
            .iter()
            .filter_map(|(name, table)| table.to_dataframe().ok().map(|df| (name.clone(), df)))
            .collect()
    }
}

/// Drain all recorded data and convert to polars DataFrames.
pub fn drain_to_dataframes() -> HashMap<String, DataFrame> {
    drain().to_dataframes()
}

/// Run-level summary of a tick table: tick count, mean unemployment rate,
/// mean I1 and I2, and how many ticks had an unbounded I3.
pub fn summarize_ticks(ticks: &DataFrame) -> PolarsResult<DataFrame> {
    ticks
        .clone()
        .lazy()
        .select([
            len().alias("ticks"),
            col("unemployment_rate").mean().alias("mean_unemployment_rate"),
            col("i1").mean().alias("mean_i1"),
            col("i2").mean().alias("mean_i2"),
            col("i3_unbounded")
                .cast(DataType::UInt64)
                .sum()
                .alias("unbounded_ticks"),
        ])
        .collect()
}

/// Save all DataFrames as parquet files in the given directory.
/// Each table becomes `{dir}/{name}.parquet`.
pub fn save_parquet(dfs: &mut HashMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| PolarsError::IO {
        error: e.into(),
        msg: None,
    })?;
    for (name, df) in dfs.iter_mut() {
        let path = dir.join(format!("{}.parquet", name));
        let file = std::fs::File::create(&path).map_err(|e| PolarsError::IO {
            error: e.into(),
            msg: None,
        })?;
        ParquetWriter::new(file).finish(df)?;
    }
    Ok(())
}

/// Replace non-alphanumeric chars with `_` and truncate for use in directory names.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(60)
        .collect()
}

/// Directory name for one run: `{scenario}_seed{seed}`.
pub fn run_name(scenario: &str, seed: u64) -> String {
    format!("{}_seed{}", sanitize(scenario), seed)
}

/// RAII guard that clears recorded data on creation and saves it to parquet
/// on drop.
///
/// A run is identified by scenario and seed, so rerunning the same seed
/// overwrites its previous output.
///
/// ```ignore
/// let mut rec = instrument::ScopedRecorder::new("data", "spain_2024", 42);
/// model.run(100);
/// let dfs = rec.get();
/// // rec drops -> writes data/spain_2024_seed42/{tick,hiring}.parquet + _ready
/// ```
pub struct ScopedRecorder {
    run_dir: PathBuf,
    run_name: String,
    dfs: Option<HashMap<String, DataFrame>>,
}

impl ScopedRecorder {
    /// Writes to `{parent}/{scenario}_seed{seed}/`. Installs the global
    /// subscriber if none is set yet.
    pub fn new(parent: impl Into<PathBuf>, scenario: &str, seed: u64) -> Self {
        let run_name = run_name(scenario, seed);
        let run_dir = parent.into().join(&run_name);
        clear();
        install_subscriber();
        Self {
            run_dir,
            run_name,
            dfs: None,
        }
    }

    /// Drain recorded data once and return the cached DataFrames.
    pub fn get(&mut self) -> &HashMap<String, DataFrame> {
        self.dfs.get_or_insert_with(drain_to_dataframes)
    }

    /// Summary of the tick table, if one was recorded.
    pub fn tick_summary(&mut self) -> Option<PolarsResult<DataFrame>> {
        self.get().get(TICK_TABLE).map(summarize_ticks)
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }
}

impl Drop for ScopedRecorder {
    fn drop(&mut self) {
        let mut dfs = self.dfs.take().unwrap_or_else(drain_to_dataframes);
        if dfs.is_empty() {
            return;
        }
        if let Err(e) = save_parquet(&mut dfs, &self.run_dir) {
            eprintln!("ScopedRecorder({}): failed to write parquet: {}", self.run_name, e);
            return;
        }
        // Sentinel so watchers know every parquet file is complete
        let sentinel = self.run_dir.join("_ready");
        if let Err(e) = std::fs::File::create(&sentinel) {
            eprintln!("ScopedRecorder({}): failed to write _ready sentinel: {}", self.run_name, e);
        }
    }
}
