//! `persdb timestamp` - decode an epoch value printed elsewhere in the tool
//! (a header's `i` field, a log line) back into its parts (§6).
//!
//! Three input shapes are accepted: a 10-digit value (Unix seconds), a
//! 13-digit value (Unix milliseconds), and the legacy two-word form
//! `low,high` — a 64-bit millisecond instant split across two 32-bit words,
//! high-order word first, as produced by systems that never adopted a native
//! 64-bit counter.
use crate::error::CliError;

pub fn run(value: &str) -> Result<(), CliError> {
    let millis = parse(value)?;
    let seconds = millis / 1000;
    println!(
        "{}",
        serde_json::json!({
            "input": value,
            "millis": millis,
            "seconds": seconds,
        })
    );
    Ok(())
}

fn parse(value: &str) -> Result<i64, CliError> {
    if let Some((low, high)) = value.split_once(',') {
        let low: u32 = low.trim().parse().map_err(|_| usage(value))?;
        let high: u32 = high.trim().parse().map_err(|_| usage(value))?;
        let combined = (u64::from(high) << 32) | u64::from(low);
        return i64::try_from(combined).map_err(|_| usage(value));
    }

    let digits = value.trim();
    if !digits.chars().all(|c| c.is_ascii_digit()) || digits.is_empty() {
        return Err(usage(value));
    }
    let n: i64 = digits.parse().map_err(|_| usage(value))?;
    match digits.len() {
        10 => Ok(n * 1000),
        13 => Ok(n),
        _ => Err(usage(value)),
    }
}

fn usage(value: &str) -> CliError {
    CliError::Usage {
        reason: format!("not a 10/13-digit epoch value or a `low,high` pair: {value:?}"),
    }
}
