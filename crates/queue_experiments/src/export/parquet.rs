use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::metrics::EpisodeResult;

pub(crate) fn export_to_parquet_impl(
    results: &[EpisodeResult],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = build_record_batch(results)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

fn build_record_batch(results: &[EpisodeResult]) -> Result<RecordBatch, arrow::error::ArrowError> {
    let schema = Arc::new(parquet_schema());
    let arrays = build_arrays(results);

    RecordBatch::try_new(schema, arrays)
}

fn parquet_schema() -> Schema {
    let counts = [
        "events_processed",
        "arrivals",
        "arrivals_blocked",
        "ticks",
        "completions",
        "self_transitions",
        "actions_executed",
        "actions_skipped",
    ];
    let values = [
        "total_cost",
        "discounted_cost",
        "average_cost",
        "blocking_rate",
        "mean_waiting_classes",
        "mean_busy_servers",
    ];
    Schema::new(
        counts
            .iter()
            .map(|name| Field::new(*name, DataType::UInt64, false))
            .chain(values.iter().map(|name| Field::new(*name, DataType::Float64, false)))
            .collect::<Vec<_>>(),
    )
}

fn build_arrays(results: &[EpisodeResult]) -> Vec<ArrayRef> {
    let count = |f: fn(&EpisodeResult) -> u64| -> ArrayRef {
        Arc::new(UInt64Array::from(results.iter().map(f).collect::<Vec<_>>()))
    };
    let value = |f: fn(&EpisodeResult) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(results.iter().map(f).collect::<Vec<_>>()))
    };

    vec![
        count(|r| r.events_processed),
        count(|r| r.arrivals),
        count(|r| r.arrivals_blocked),
        count(|r| r.ticks),
        count(|r| r.completions),
        count(|r| r.self_transitions),
        count(|r| r.actions_executed),
        count(|r| r.actions_skipped),
        value(|r| r.total_cost),
        value(|r| r.discounted_cost),
        value(|r| r.average_cost),
        value(|r| r.blocking_rate),
        value(|r| r.mean_waiting_classes),
        value(|r| r.mean_busy_servers),
    ]
}
