use anyhow::Result;
use std::io::{self as stdio, BufRead, Write};

/// Read one trimmed line from stdin. `None` at end of input.
fn read_line() -> Result<Option<String>> {
    let mut input = String::new();
    let read = stdio::stdin().read_line(&mut input)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// Ask for a value, returning `default` when the answer is empty.
pub fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) if !d.is_empty() => print!("{} [{}]: ", label, d),
        _ => print!("{}: ", label),
    }
    stdio::stdout().flush()?;

    let answer = read_line()?.unwrap_or_default();
    if answer.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(answer)
    }
}

pub fn confirm(question: &str, default: bool) -> Result<bool> {
    let hint = if default { "Y/n" } else { "y/N" };
    print!("{} [{}]: ", question, hint);
    stdio::stdout().flush()?;

    let answer = read_line()?.unwrap_or_default().to_lowercase();
    Ok(match answer.as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    })
}

/// Collect pasted text until two consecutive empty lines or end of input.
pub fn read_multiline() -> Result<String> {
    let stdin = stdio::stdin();
    let mut lines = Vec::new();
    let mut empty_run = 0;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.is_empty() {
            empty_run += 1;
            if empty_run >= 2 {
                break;
            }
        } else {
            empty_run = 0;
        }
        lines.push(line);
    }

    Ok(lines.join("\n").trim().to_string())
}
