use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt32Array, UInt64Array, UInt8Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::telemetry::EpisodeTelemetry;

/// Writes the captured step trace, one row per processed event.
///
/// `event_kind` uses [`EventKind::code`](crate::event::EventKind::code); `job_class` is
/// null for ticks and self-transitions.
pub fn write_step_trace_parquet<P: AsRef<Path>>(
    path: P,
    telemetry: &EpisodeTelemetry,
) -> Result<(), Box<dyn Error>> {
    let len = telemetry.trace.len();
    let mut step = Vec::with_capacity(len);
    let mut event_kind = Vec::with_capacity(len);
    let mut job_class = Vec::with_capacity(len);
    let mut cost = Vec::with_capacity(len);
    let mut discounted_cost = Vec::with_capacity(len);
    let mut waiting_classes = Vec::with_capacity(len);
    let mut busy_servers = Vec::with_capacity(len);
    let mut actions_executed = Vec::with_capacity(len);

    for record in &telemetry.trace {
        step.push(record.step);
        event_kind.push(record.event.code());
        job_class.push(record.job_class.map(|n| n as u64));
        cost.push(record.cost);
        discounted_cost.push(record.discounted_cost);
        waiting_classes.push(record.waiting_classes);
        busy_servers.push(record.busy_servers);
        actions_executed.push(record.actions_executed);
    }

    let schema = Schema::new(vec![
        Field::new("step", DataType::UInt64, false),
        Field::new("event_kind", DataType::UInt8, false),
        Field::new("job_class", DataType::UInt64, true),
        Field::new("cost", DataType::Float64, false),
        Field::new("discounted_cost", DataType::Float64, false),
        Field::new("waiting_classes", DataType::UInt32, false),
        Field::new("busy_servers", DataType::UInt32, false),
        Field::new("actions_executed", DataType::UInt32, false),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(step)),
        Arc::new(UInt8Array::from(event_kind)),
        Arc::new(UInt64Array::from(job_class)),
        Arc::new(Float64Array::from(cost)),
        Arc::new(Float64Array::from(discounted_cost)),
        Arc::new(UInt32Array::from(waiting_classes)),
        Arc::new(UInt32Array::from(busy_servers)),
        Arc::new(UInt32Array::from(actions_executed)),
    ];

    write_record_batch(path, schema, arrays)
}

fn write_record_batch<P: AsRef<Path>>(
    path: P,
    schema: Schema,
    arrays: Vec<ArrayRef>,
) -> Result<(), Box<dyn Error>> {
    let schema = Arc::new(schema);
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
