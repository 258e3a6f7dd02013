//! Output formatting for CLI

use csv_table_importer::{ImportPlan, ImportReport};

/// Format a committed run
pub fn format_report(report: &ImportReport, target: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n✅ Imported {} file(s) into {}:\n",
        report.files_processed(),
        target
    ));
    for table in &report.tables {
        output.push_str(&format!(
            "  - {} ({} column(s), {} row(s)) from {}\n",
            table.table,
            table.columns,
            table.rows,
            table.path.display()
        ));
    }

    output.push('\n');
    output.push_str(&format!("  Rows inserted: {}\n", report.rows_inserted()));
    output.push_str(&format!("  Duration: {}\n", report.duration_string()));
    output.push_str(&format!("  Run: {}\n", report.run_id));

    output
}

/// Format a dry-run plan
pub fn format_plan(plan: &ImportPlan) -> String {
    let mut output = String::new();

    output.push_str(&format!("\nPlanned {} table(s):\n", plan.tables.len()));
    for (idx, table) in plan.tables.iter().enumerate() {
        output.push_str(&format!("\nTable {}: {}\n", idx + 1, table.table));
        output.push_str(&format!("  Source: {}\n", table.path.display()));
        match &table.statement {
            Ok(ddl) => output.push_str(&format!("  {};\n", ddl.to_sql())),
            Err(e) => output.push_str(&format!("  ⚠️  {}\n", e)),
        }
    }

    let problems = plan.problems().count();
    if problems == 0 {
        output.push_str("\n✅ All tables can be created.\n");
    } else {
        output.push_str(&format!("\n⚠️  {} table(s) cannot be created.\n", problems));
    }

    output
}
