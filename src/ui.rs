use colored::Colorize;
use similar::{ChangeTag, TextDiff};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Lines that differ between two texts, prefixed with `-`/`+`
pub fn diff_lines(old: &str, new: &str) -> Vec<(ChangeTag, String)> {
    TextDiff::from_lines(old, new)
        .iter_all_changes()
        .filter(|change| change.tag() != ChangeTag::Equal)
        .map(|change| {
            let sign = if change.tag() == ChangeTag::Delete { '-' } else { '+' };
            (change.tag(), format!("{sign} {}", change.value().trim_end()))
        })
        .collect()
}

/// Print a colored line diff
pub fn diff(old: &str, new: &str) {
    let lines = diff_lines(old, new);
    if lines.is_empty() {
        println!("    {}", "(no differences)".dimmed());
        return;
    }
    for (tag, line) in lines {
        match tag {
            ChangeTag::Delete => println!("    {}", line.red()),
            ChangeTag::Insert => println!("    {}", line.green()),
            ChangeTag::Equal => {}
        }
    }
}

/// Pad `text` to `width` columns
pub fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_lines_only_changes() {
        let old = "{\n  \"a\": 1,\n  \"b\": 2\n}\n";
        let new = "{\n  \"a\": 1,\n  \"b\": 3\n}\n";
        let lines = diff_lines(old, new);
        assert_eq!(
            lines,
            vec![
                (ChangeTag::Delete, "-   \"b\": 2".to_string()),
                (ChangeTag::Insert, "+   \"b\": 3".to_string()),
            ]
        );
    }

    #[test]
    fn test_diff_lines_identical() {
        assert!(diff_lines("same\n", "same\n").is_empty());
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("abcdef", 4), "abcdef");
    }
}
