//! Run reports: loggable lines, JSON inventory and HTML error report

use crate::error::Result;
use crate::record::Inventory;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Write one `<marker>\t<origin>` line per unclassified, errored or skipped record
pub fn write_loggables<W: Write>(inventory: &Inventory, out: &mut W) -> std::io::Result<()> {
    for record in inventory.loggable() {
        writeln!(out, "{}\t{}", record.status, record.origin.display())?;
    }
    Ok(())
}

/// Write the inventory as a tab-indented JSON array
pub fn write_inventory(inventory: &Inventory, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    inventory.serialize(&mut serializer)?;
    writer.flush()?;

    info!(path = %path.display(), records = inventory.len(), "Wrote inventory");
    Ok(())
}

/// Write an HTML page listing every record that needs attention
pub fn write_error_report(inventory: &Inventory, output_dir: &Path, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, render_error_report(inventory, output_dir))?;

    info!(path = %path.display(), "Wrote error report");
    Ok(())
}

/// Render the error report page
pub fn render_error_report(inventory: &Inventory, output_dir: &Path) -> String {
    let mut rows = String::new();
    for record in inventory.loggable() {
        let origin = escape_html(&record.origin.to_string_lossy());
        rows.push_str(&format!(
            "      <tr class=\"flag-{flag}\"><td>{flag}</td><td><a href=\"file://{origin}\">{origin}</a></td><td>{ext}</td><td>{size}</td></tr>\n",
            flag = escape_html(&record.status.to_string()),
            origin = origin,
            ext = escape_html(&record.extension),
            size = record.size,
        ));
    }

    let count = inventory.loggable().count();
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Files needing attention</title>
    <style>
      body {{ font-family: sans-serif; }}
      table {{ border-collapse: collapse; }}
      td, th {{ padding: 2px 8px; text-align: left; }}
      .flag-X {{ color: #b00; }}
      .flag-\. {{ color: #a60; }}
      .flag-\? {{ color: #666; }}
    </style>
  </head>
  <body>
    <h1>Files needing attention</h1>
    <p>Output directory: <code>{out_dir}</code></p>
    <p>{count} of {total} files were not linked. X = error, . = skipped (no timestamp), ? = unclassified.</p>
    <table>
      <tr><th>Flag</th><th>Origin</th><th>Ext</th><th>Size</th></tr>
{rows}    </table>
  </body>
</html>
"#,
        out_dir = escape_html(&output_dir.to_string_lossy()),
        count = count,
        total = inventory.len(),
        rows = rows,
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
