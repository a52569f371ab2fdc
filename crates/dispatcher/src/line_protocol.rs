//! Line protocol rendering
//!
//! `measurement,tag=v field=1i,other="s" 1700000000000000000`

use std::fmt::Write as _;

use contracts::{Batch, FieldValue, Point};

/// Render one point as a single line (no trailing newline)
pub fn render_point(point: &Point) -> String {
    let mut line = String::with_capacity(64);

    escape_into(&point.measurement, &[',', ' '], &mut line);

    for (key, value) in &point.tags {
        line.push(',');
        escape_into(key, &[',', '=', ' '], &mut line);
        line.push('=');
        escape_into(value, &[',', '=', ' '], &mut line);
    }

    line.push(' ');
    for (idx, (key, value)) in point.fields.iter().enumerate() {
        if idx > 0 {
            line.push(',');
        }
        escape_into(key, &[',', '=', ' '], &mut line);
        line.push('=');
        write_field_value(value, &mut line);
    }

    let _ = write!(line, " {}", point.timestamp_ns);
    line
}

/// Render all points, newline terminated
pub fn render_batch(batch: &Batch) -> String {
    let mut body = String::new();
    for point in &batch.points {
        body.push_str(&render_point(point));
        body.push('\n');
    }
    body
}

fn write_field_value(value: &FieldValue, out: &mut String) {
    match value {
        FieldValue::Integer(i) => {
            let _ = write!(out, "{i}i");
        }
        FieldValue::Float(f) => {
            let _ = write!(out, "{f}");
        }
        FieldValue::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        FieldValue::String(s) => {
            out.push('"');
            escape_into(s, &['"', '\\'], out);
            out.push('"');
        }
    }
}

fn escape_into(raw: &str, special: &[char], out: &mut String) {
    for c in raw.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
