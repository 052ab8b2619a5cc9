//! Human-readable summaries of finished operations

use forcebridge_core::FileOutcome;
use forcebridge_task::{CacheStatus, ExecutionOutcome, ExecutionReport, ParsedResult};

pub fn print_report(report: &ExecutionReport) {
    match &report.outcome {
        ExecutionOutcome::Succeeded { items } => {
            print_table(items);
            println!("{} succeeded", report.command);
        }
        ExecutionOutcome::PartiallySucceeded { items } => {
            print_table(items);
            println!("{} partially succeeded", report.command);
        }
        ExecutionOutcome::Failed { exit_code, parsed } => {
            if let Some(ParsedResult::Error { items, .. }) = parsed {
                print_table(items);
            }
            if !report.stderr.trim().is_empty() {
                eprintln!("{}", report.stderr.trim_end());
            }
            println!("{} failed (exit code {exit_code})", report.command);
        }
        ExecutionOutcome::Cancelled => println!("{} was cancelled", report.command),
        ExecutionOutcome::SpawnFailed { message } => {
            println!("{} could not be started: {message}", report.command)
        }
    }

    if let CacheStatus::Failed { message } = &report.cache {
        eprintln!("warning: conflict cache was not updated: {message}");
    }
}

fn print_table(items: &[FileOutcome]) {
    if items.is_empty() {
        return;
    }
    let rows: Vec<[String; 4]> = items.iter().map(row).collect();
    let headers = ["STATE", "FULL NAME", "TYPE", "PROJECT PATH"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    println!("{}", format_row(&headers.map(str::to_string), &widths));
    println!("{}", format_row(&widths.map(|w| "─".repeat(w)), &widths));
    for row in &rows {
        println!("{}", format_row(row, &widths));
    }
}

fn row(item: &FileOutcome) -> [String; 4] {
    let state = match (&item.error, &item.state) {
        (Some(error), _) => match (item.line_number, item.column_number) {
            (Some(line), Some(column)) => format!("Error ({line}:{column}) {error}"),
            (Some(line), None) => format!("Error ({line}) {error}"),
            _ => format!("Error {error}"),
        },
        (None, Some(state)) => state.clone(),
        (None, None) => String::new(),
    };
    [
        state,
        item.full_name.clone().unwrap_or_default(),
        item.metadata_type.clone(),
        item.file_path.clone(),
    ]
}

fn format_row(cells: &[String; 4], widths: &[usize; 4]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_rows_include_position() {
        let item = FileOutcome::new("classes/Foo.cls", "ApexClass", "Foo").with_error(
            "Unexpected token",
            Some(4),
            Some(2),
        );
        let [state, name, kind, path] = row(&item);
        assert_eq!(state, "Error (4:2) Unexpected token");
        assert_eq!(name, "Foo");
        assert_eq!(kind, "ApexClass");
        assert_eq!(path, "classes/Foo.cls");
    }

    #[test]
    fn rows_are_padded_to_column_width() {
        let cells = ["a".to_string(), "bb".to_string(), "c".to_string(), "d".to_string()];
        assert_eq!(format_row(&cells, &[3, 3, 3, 1]), "a    bb   c    d");
    }
}
