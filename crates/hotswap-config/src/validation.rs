//! Validation of user-supplied configuration values.

use crate::error::{ConfigError, Result};

/// Parse a `--tags` value into individual build tags.
///
/// Tags are separated either by commas or by spaces, never both. Empty
/// entries are dropped and duplicates keep their first position.
///
/// # Example
///
/// ```
/// use hotswap_config::parse_build_tags;
///
/// assert_eq!(parse_build_tags("a,b,a").unwrap(), vec!["a", "b"]);
/// assert_eq!(parse_build_tags("a b").unwrap(), vec!["a", "b"]);
/// assert!(parse_build_tags("a, b").is_err());
/// ```
pub fn parse_build_tags(tags: &str) -> Result<Vec<String>> {
    let tags = tags.trim();
    if tags.is_empty() {
        return Ok(Vec::new());
    }

    let has_comma = tags.contains(',');
    let has_space = tags.contains(' ');
    if has_comma && has_space {
        return Err(ConfigError::InvalidTags(
            "cannot use both space and comma separated values with `--tags`".to_string(),
        ));
    }

    let separator = if has_comma { ',' } else { ' ' };
    let mut parsed: Vec<String> = Vec::new();
    for tag in tags.split(separator).map(str::trim) {
        if !tag.is_empty() && !parsed.iter().any(|t| t == tag) {
            parsed.push(tag.to_string());
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_tags() {
        assert!(parse_build_tags("").unwrap().is_empty());
        assert!(parse_build_tags("   ").unwrap().is_empty());
    }

    #[test]
    fn single_tag() {
        assert_eq!(parse_build_tags("webkit2_41").unwrap(), vec!["webkit2_41"]);
    }

    #[test]
    fn comma_separated_drops_empty_entries() {
        assert_eq!(parse_build_tags("a,,b,").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn mixed_separators_are_rejected() {
        let err = parse_build_tags("a,b c").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTags(_)));
        assert!(err.to_string().contains("both space and comma"));
    }
}
