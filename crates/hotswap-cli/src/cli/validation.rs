//! Value parsers for flags that clap cannot check on its own.

use std::collections::BTreeSet;

/// Parse the `--debounce` value in milliseconds.
///
/// Zero is rejected: the loop would act on every single event.
pub fn parse_debounce(s: &str) -> Result<u64, String> {
    let ms: u64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Debounce must be a number of milliseconds: '{}'", s))?;
    if ms == 0 {
        return Err("Debounce must be greater than 0".to_string());
    }
    Ok(ms)
}

/// Parse an `--extensions` list into bare extensions.
///
/// Leading dots are dropped, so `go,.tmpl` and `go,tmpl` are the same set.
pub fn parse_extensions(s: &str) -> Result<BTreeSet<String>, String> {
    let extensions: BTreeSet<String> = s
        .split(',')
        .map(|ext| ext.trim().trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .map(str::to_string)
        .collect();

    if extensions.is_empty() {
        return Err("At least one rebuild extension is required".to_string());
    }
    Ok(extensions)
}
