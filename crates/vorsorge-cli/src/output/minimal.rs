use serde_json::Value;

use super::{format_scalar, result_of};

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority, then falls
/// back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    let priority_pointers = [
        "/recommendation/leader",
        "/net_final_value",
        "/marginal_rate",
    ];

    for pointer in &priority_pointers {
        if let Some(val) = result.pointer(pointer) {
            if !val.is_null() {
                println!("{}", format_scalar(val));
                return;
            }
        }
    }

    if let Value::Object(map) = result {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result));
}
