use std::path::Path;

use prettytable::{Cell, Row, Table};

use crate::error::CommandError;
use crate::results::{WorkerRecord, WorkerResultFile};
use crate::terminal::message::{Message, StdOut};

pub fn run(result_path: &Path) -> Result<(), CommandError> {
    let results =
        WorkerResultFile::load(result_path).map_err(|e| CommandError::Worker(e.to_string()))?;

    if results.is_empty() {
        StdOut::info(&format!("{} has no workers in it.", result_path.display()));
        return Ok(());
    }

    println!("{}", format_records(&results));
    StdOut::info(&format!("{} workers", results.len()));
    Ok(())
}

fn format_records(results: &WorkerResultFile) -> Table {
    let mut table = Table::new();
    let table_head = Row::new(vec![
        Cell::new("Name"),
        Cell::new("Type"),
        Cell::new("URL"),
        Cell::new("Created"),
    ]);
    table.add_row(table_head);

    for record in results {
        let row = Row::new(vec![
            Cell::new(&record.name),
            Cell::new(record.worker_type.as_str()),
            Cell::new(&record.url),
            Cell::new(&created(record)),
        ]);
        table.add_row(row);
    }
    table
}

fn created(record: &WorkerRecord) -> String {
    match record.created_at_utc() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => record.created_at.to_string(),
    }
}
