/// Indent every non-empty line of `code` with `indent`, trimming existing leading whitespace
pub fn indent_code(code: &str, indent: &str) -> String {
    code.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", indent, line.trim_start())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shift a block by whole tab levels, keeping its relative indentation
pub fn reindent(code: &str, from_depth: usize, to_depth: usize) -> String {
    let mut out = String::with_capacity(code.len());
    for line in code.split_inclusive('\n') {
        let body = line.trim_end_matches('\n');
        if body.trim().is_empty() {
            out.push_str(&line[body.len()..]);
            continue;
        }
        let leading_tabs = body.chars().take_while(|c| *c == '\t').count();
        let kept = leading_tabs.saturating_sub(from_depth);
        out.push_str(&"\t".repeat(to_depth + kept));
        out.push_str(&body[leading_tabs..]);
        out.push_str(&line[body.len()..]);
    }
    out
}

/// Byte offset of the start of the line containing `offset`
pub fn line_start(text: &str, offset: usize) -> usize {
    let offset = offset.min(text.len());
    text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Byte offset just past the newline ending the line containing `offset` (or the end of text)
pub fn line_end(text: &str, offset: usize) -> usize {
    let offset = offset.min(text.len());
    text[offset..]
        .find('\n')
        .map(|i| offset + i + 1)
        .unwrap_or(text.len())
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Extend a whole-line range by one adjacent blank line, preferring the one above
pub fn with_adjacent_blank_line(text: &str, range: std::ops::Range<usize>) -> std::ops::Range<usize> {
    if range.start > 0 {
        let prev_start = line_start(text, range.start - 1);
        if is_blank(&text[prev_start..range.start]) {
            return prev_start..range.end;
        }
    }
    if range.end < text.len() {
        let next_end = line_end(text, range.end);
        if is_blank(&text[range.end..next_end]) {
            return range.start..next_end;
        }
    }
    range
}

/// Extend a whole-line range by the blank line above it, if there is one
pub fn with_blank_line_above(text: &str, range: std::ops::Range<usize>) -> std::ops::Range<usize> {
    if range.start > 0 {
        let prev_start = line_start(text, range.start - 1);
        if is_blank(&text[prev_start..range.start]) {
            return prev_start..range.end;
        }
    }
    range
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_code() {
        let code = "line1\nline2\nline3";
        assert_eq!(indent_code(code, "    "), "    line1\n    line2\n    line3");

        let code = "line1\n\nline2";
        assert_eq!(indent_code(code, "\t"), "\tline1\n\n\tline2");
    }

    #[test]
    fn test_reindent_keeps_relative_depth() {
        let code = "\t\tBox struct {\n\t\t\tGroupBox\n\t\t}\n";
        assert_eq!(reindent(code, 2, 1), "\tBox struct {\n\t\tGroupBox\n\t}\n");
        assert_eq!(reindent(code, 2, 3), "\t\t\tBox struct {\n\t\t\t\tGroupBox\n\t\t\t}\n");
    }

    #[test]
    fn test_line_bounds() {
        let text = "ab\ncd\nef";
        assert_eq!(line_start(text, 4), 3);
        assert_eq!(line_end(text, 4), 6);
        assert_eq!(line_end(text, 7), 8);
        assert_eq!(line_start(text, 0), 0);
    }

    #[test]
    fn test_adjacent_blank_line() {
        let text = "a\n\nfunc x\n\nb\n";
        // "func x\n" spans 3..10
        assert_eq!(with_adjacent_blank_line(text, 3..10), 2..10);
        let text = "a\nfunc x\n\nb\n";
        assert_eq!(with_adjacent_blank_line(text, 2..9), 2..10);
        assert_eq!(with_blank_line_above(text, 2..9), 2..9);
    }
}
