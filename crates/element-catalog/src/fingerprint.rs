/// Text fingerprint of an element's rendered text.
///
/// Lines are whitespace-collapsed and trimmed, empty lines dropped, and when more than
/// two remain only the first and last are kept.
pub fn text_fingerprint(inner_text: &str) -> String {
    let lines: Vec<String> = inner_text
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect();
    match lines.len() {
        0 => String::new(),
        1 | 2 => lines.join("\n"),
        n => format!("{}\n{}", lines[0], lines[n - 1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_and_bounds_lines() {
        assert_eq!(text_fingerprint("  Hello \t  world  "), "Hello world");
        assert_eq!(text_fingerprint("\n\nfirst\n  \nsecond\n"), "first\nsecond");
        assert_eq!(text_fingerprint("a\nb\nc\nd"), "a\nd");
        assert_eq!(text_fingerprint(" \n\t "), "");
    }
}
