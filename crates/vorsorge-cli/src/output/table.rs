use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, result_of};

const TRAJECTORY_COLUMNS: [(&str, &str); 7] = [
    ("year", "Year"),
    ("contributions", "Contributions"),
    ("gross_value", "Gross value"),
    ("state_subsidies", "Subsidies"),
    ("tax_savings", "Tax savings"),
    ("tax_due", "Tax"),
    ("net_value", "Net value"),
];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    let result = result_of(value);

    match result {
        Value::Object(map) if map.contains_key("ranking") => print_comparison(map),
        Value::Object(map) if map.contains_key("trajectory") => print_outcome(map),
        Value::Object(map) => print_fields(map, &[]),
        _ => println!("{}", format_scalar(result)),
    }

    let Value::Object(envelope) = value else {
        return;
    };

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_fields(map: &Map<String, Value>, skip: &[&str]) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if skip.contains(&key.as_str()) {
            continue;
        }
        builder.push_record([key.as_str(), &format_scalar(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_outcome(outcome: &Map<String, Value>) {
    print_fields(outcome, &["trajectory", "costs", "warnings"]);

    if let Some(Value::Object(costs)) = outcome.get("costs") {
        println!("\nCosts:");
        print_fields(costs, &[]);
    }

    if let Some(Value::Array(rows)) = outcome.get("trajectory") {
        let mut builder = Builder::default();
        builder.push_record(TRAJECTORY_COLUMNS.iter().map(|(_, title)| *title));
        for row in rows {
            builder.push_record(
                TRAJECTORY_COLUMNS
                    .iter()
                    .map(|(key, _)| row.get(*key).map(format_scalar).unwrap_or_default()),
            );
        }
        println!("\nTrajectory:");
        println!("{}", Table::from(builder));
    }
}

fn print_comparison(result: &Map<String, Value>) {
    if let Some(Value::Array(ranking)) = result.get("ranking") {
        let mut builder = Builder::default();
        builder.push_record([
            "Rank",
            "Product",
            "Net value",
            "Gross value",
            "Contributions",
            "Benefits",
            "Shortfall",
        ]);
        for entry in ranking {
            let field = |pointer: &str| entry.pointer(pointer).map(format_scalar).unwrap_or_default();
            builder.push_record([
                field("/rank"),
                field("/product"),
                field("/outcome/net_final_value"),
                field("/outcome/gross_final_value"),
                field("/outcome/total_contributions"),
                field("/outcome/total_benefits"),
                field("/shortfall_to_leader"),
            ]);
        }
        println!("{}", Table::from(builder));
    }

    if let Some(Value::Array(years)) = result.get("trajectories") {
        let products: Vec<String> = years
            .first()
            .and_then(|y| y.get("net_values"))
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        let mut builder = Builder::default();
        builder.push_record(std::iter::once("year".to_string()).chain(products.iter().cloned()));
        for year in years {
            let mut row = vec![year.get("year").map(format_scalar).unwrap_or_default()];
            for product in &products {
                row.push(
                    year.get("net_values")
                        .and_then(|m| m.get(product))
                        .map(format_scalar)
                        .unwrap_or_default(),
                );
            }
            builder.push_record(row);
        }
        println!("\nNet value by year:");
        println!("{}", Table::from(builder));
    }

    if let Some(Value::Object(rec)) = result.get("recommendation") {
        let tag = rec.get("tag").map(format_scalar).unwrap_or_default();
        let summary = rec.get("summary").map(format_scalar).unwrap_or_default();
        println!("\nRecommendation ({}): {}", tag, summary);
    }
}
