const INDENT: &str = "    ";
const DEDENT_KEYWORDS: [&str; 4] = ["except", "elif", "else", "finally"];

/// Re-indents by block structure: a trailing `:` opens a level and the
/// `except`/`elif`/`else`/`finally` keywords close one before themselves.
/// Comments are flattened to column zero and blank lines kept as-is.
pub fn format_code(code: &str) -> String {
    let mut level = 0usize;
    let mut lines = Vec::new();

    for line in code.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            lines.push(String::new());
            continue;
        }
        if trimmed.starts_with('#') {
            lines.push(trimmed.to_string());
            continue;
        }

        if DEDENT_KEYWORDS.iter().any(|kw| trimmed.starts_with(kw)) {
            level = level.saturating_sub(1);
        }

        lines.push(format!("{}{}", INDENT.repeat(level), trimmed));

        if trimmed.ends_with(':') {
            level += 1;
        }
    }

    lines.join("\n")
}

/// `None` when there is nothing to replace.
pub fn replace_all(code: &str, needle: &str, replacement: &str) -> Option<String> {
    if needle.is_empty() || !code.contains(needle) {
        return None;
    }
    Some(code.replace(needle, replacement))
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/format.rs"]
mod tests;
