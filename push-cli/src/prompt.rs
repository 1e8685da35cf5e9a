//! Interactive terminal prompts.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Ask for a line of input. Returns it trimmed.
pub fn prompt_line(label: &str) -> Result<String> {
    let stdin = std::io::stdin();
    read_line(&mut stdin.lock(), &mut std::io::stderr(), label)
}

/// Ask for a value, keeping `current` when the answer is blank.
pub fn prompt_with_default(label: &str, current: &str) -> Result<String> {
    let label = if current.is_empty() {
        label.to_string()
    } else {
        format!("{label} [{}]", mask(current))
    };
    let answer = prompt_line(&label)?;
    Ok(if answer.is_empty() {
        current.to_string()
    } else {
        answer
    })
}

/// Ask for a secret without echo.
pub fn prompt_secret(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{label}: ")).context("Failed to read password")
}

/// Show the first and last characters of a secret.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.is_empty() {
        return "(not set)".to_string();
    }
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

fn read_line(input: &mut impl BufRead, output: &mut impl Write, label: &str) -> Result<String> {
    write!(output, "{label}: ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read input")?;
    Ok(line.trim().to_string())
}
