use serde_json::Value;
use std::io;

use super::result_of;

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Projections become one row per year; anything else is written as
/// field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match result_of(value) {
        Value::Object(map) => {
            if let Some(Value::Array(years)) = map.get("trajectories") {
                write_aligned(&mut wtr, years);
            } else if let Some(Value::Array(rows)) = map.get("trajectory") {
                write_rows(&mut wtr, rows);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        }
        other => {
            let _ = wtr.write_record([&format_csv_value(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows(wtr: &mut StdoutWriter<'_>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for row in rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(*h).map(format_csv_value).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&record);
    }
}

/// Year column plus one net-value column per compared product.
fn write_aligned(wtr: &mut StdoutWriter<'_>, years: &[Value]) {
    let products: Vec<String> = years
        .first()
        .and_then(|y| y.get("net_values"))
        .and_then(Value::as_object)
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();

    let mut header = vec!["year".to_string()];
    header.extend(products.iter().cloned());
    let _ = wtr.write_record(&header);

    for year in years {
        let mut record = vec![year.get("year").map(format_csv_value).unwrap_or_default()];
        for product in &products {
            record.push(
                year.get("net_values")
                    .and_then(|m| m.get(product))
                    .map(format_csv_value)
                    .unwrap_or_default(),
            );
        }
        let _ = wtr.write_record(&record);
    }
}

/// Decimal strings are written unrounded.
fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
