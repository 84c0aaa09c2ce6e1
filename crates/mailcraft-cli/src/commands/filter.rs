//! JSON filter command implementation

use std::io::Read;

use anyhow::{Context, Result};
use serde_json::Value;

use mailcraft_core::catalog::ROOT_LABEL;
use mailcraft_core::{filter_json, highlight_paths, FilterMatch};

pub fn cmd_filter(source: &str, term: &str, search: bool) -> Result<()> {
    let input = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))?
    };

    println!("{}", run_filter(&input, term, search)?);
    Ok(())
}

/// Filter (or search) a JSON document and render the result
///
/// Filter mode prints the pruned document, or `{"noMatches": true}` when
/// nothing matches. Search mode prints one highlighted path per line.
pub fn run_filter(input: &str, term: &str, search: bool) -> Result<String> {
    let value: Value = serde_json::from_str(input).context("Input is not valid JSON")?;

    if search {
        return Ok(highlight_paths(&value, term, ROOT_LABEL).join("\n"));
    }

    let output = match filter_json(&value, term) {
        FilterMatch::Found(filtered) => serde_json::to_string_pretty(&*filtered)?,
        FilterMatch::NotFound => {
            serde_json::to_string_pretty(&serde_json::json!({ "noMatches": true }))?
        }
    };
    Ok(output)
}
