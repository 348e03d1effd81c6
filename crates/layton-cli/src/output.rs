use layton_core::LaytonError;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print `{"success": true, "data": ..., "next_steps": [...]}`.
pub fn print_success<T: Serialize>(data: &T, next_steps: &[String]) -> anyhow::Result<()> {
    let mut envelope = serde_json::json!({ "success": true, "data": data });
    if !next_steps.is_empty() {
        envelope["next_steps"] = serde_json::json!(next_steps);
    }
    print_json(&envelope)
}

/// Failure envelope for `--json` mode. Errors that did not originate in the
/// core library are reported as `ERROR` with no remediation.
pub fn failure_envelope(err: &anyhow::Error) -> serde_json::Value {
    let (code, next_steps) = match layton_error(err) {
        Some(e) => (e.code(), e.next_steps()),
        None => ("ERROR", Vec::new()),
    };
    serde_json::json!({
        "success": false,
        "error": { "code": code, "message": format!("{err:#}") },
        "next_steps": next_steps,
    })
}

/// The library error anywhere in `err`'s chain.
pub fn layton_error(err: &anyhow::Error) -> Option<&LaytonError> {
    err.chain().find_map(|cause| cause.downcast_ref::<LaytonError>())
}

pub fn print_next_steps(next_steps: &[String]) {
    if next_steps.is_empty() {
        return;
    }
    println!();
    println!("Next:");
    for step in next_steps {
        println!("  - {step}");
    }
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    // Calculate column widths
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").trim_end());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}
