use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use tabsync_cli::pipeline::ImportSummary;
use tabsync_model::{Issue, IssueKind, IssueTally};

pub fn print_import_summary(summary: &ImportSummary) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Id"),
        header_cell("Records"),
        header_cell("Inconsistent"),
        header_cell("Batches"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for entry in &summary.route.tables {
        table.add_row(vec![
            Cell::new(&entry.table),
            dim_cell(entry.table_id),
            Cell::new(entry.records),
            count_cell(entry.inconsistent, Color::Yellow),
            Cell::new(entry.batches),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(summary.rows_inserted).add_attribute(Attribute::Bold),
        count_cell(summary.route.inconsistent(), Color::Yellow),
        Cell::new(summary.route.batches()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    for name in &summary.route.skipped {
        println!("Skipped entry: {name}");
    }
}

/// Prints each distinct issue with its count, in first-seen order.
pub fn print_issue_table(tally: &IssueTally) {
    if tally.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Kind"),
        header_cell("Table"),
        header_cell("Field"),
        header_cell("Record"),
        header_cell("Detail"),
        header_cell("Count"),
    ]);
    apply_issue_table_style(&mut table);
    for index in 1..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 5, CellAlignment::Right);
    for (issue, count) in tally.iter() {
        table.add_row(vec![
            kind_cell(issue.kind),
            optional_cell(issue.table_id),
            optional_cell(issue.field_id),
            optional_cell(issue.record_index),
            Cell::new(detail(issue)),
            Cell::new(count).add_attribute(Attribute::Bold),
        ]);
    }
    println!("{table}");
    let totals: Vec<String> = tally
        .by_kind()
        .into_iter()
        .map(|(kind, count)| format!("{kind}: {count}"))
        .collect();
    println!("Issues: {}", totals.join(", "));
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(100);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn detail(issue: &Issue) -> String {
    match issue.kind {
        IssueKind::InconsistentRecord => issue
            .field_count
            .map(|count| format!("{count} fields"))
            .unwrap_or_default(),
        IssueKind::InvalidFieldValue => issue
            .field_value
            .as_deref()
            .map(|value| format!("{value:?}"))
            .unwrap_or_default(),
        IssueKind::BatchRecords => issue
            .record_count
            .map(|count| format!("{count} records"))
            .unwrap_or_default(),
    }
}

fn kind_cell(kind: IssueKind) -> Cell {
    let color = match kind {
        IssueKind::InconsistentRecord | IssueKind::InvalidFieldValue => Color::Yellow,
        IssueKind::BatchRecords => Color::Green,
    };
    Cell::new(kind.as_str()).fg(color)
}

fn optional_cell<T: ToString>(value: Option<T>) -> Cell {
    match value {
        Some(value) => Cell::new(value.to_string()),
        None => dim_cell("-"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
