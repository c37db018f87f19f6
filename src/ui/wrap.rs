//! Display-width aware wrapping shared by the transcript and the prompt.

use unicode_width::UnicodeWidthChar;

pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

pub fn text_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

pub fn clamp_to_char_boundary_left(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Hard-wraps `text` into rows no wider than `width` columns. Explicit
/// newlines always start a new row; carriage returns are dropped.
pub fn wrap_rows(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut used = 0;

    for ch in text.chars() {
        match ch {
            '\r' => {}
            '\n' => {
                rows.push(std::mem::take(&mut row));
                used = 0;
            }
            _ => {
                let w = char_width(ch);
                if used > 0 && used + w > width {
                    rows.push(std::mem::take(&mut row));
                    used = 0;
                }
                row.push(ch);
                used += w;
            }
        }
    }
    rows.push(row);
    rows
}

/// Row and column of the cursor in the output of [`wrap_rows`]. A cursor
/// sitting exactly at the right edge moves to the start of the next row.
pub fn cursor_position(text: &str, cursor: usize, width: usize) -> (usize, usize) {
    let width = width.max(1);
    let cursor = clamp_to_char_boundary_left(text, cursor);
    let (mut row, mut col) = (0, 0);

    for ch in text[..cursor].chars() {
        match ch {
            '\r' => {}
            '\n' => {
                row += 1;
                col = 0;
            }
            _ => {
                let w = char_width(ch);
                if col > 0 && col + w > width {
                    row += 1;
                    col = 0;
                }
                col += w;
            }
        }
    }
    if col >= width {
        (row + 1, 0)
    } else {
        (row, col)
    }
}

/// Cuts `text` to `width` columns, ending in `...` when something was lost.
pub fn truncate_with_ellipsis(text: &str, width: usize) -> String {
    if text_width(text) <= width {
        return text.to_string();
    }
    let budget = if width >= 4 { width - 3 } else { width };
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = char_width(ch);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    if width >= 4 {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_width_and_newlines() {
        assert_eq!(wrap_rows("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_rows("ab\r\ncd\n", 10), vec!["ab", "cd", ""]);
        assert_eq!(wrap_rows("", 10), vec![""]);
    }

    #[test]
    fn wide_characters_count_double() {
        assert_eq!(text_width("日本"), 4);
        assert_eq!(wrap_rows("日本語", 4), vec!["日本", "語"]);
    }

    #[test]
    fn cursor_tracks_wrapping() {
        assert_eq!(cursor_position("abcdef", 2, 4), (0, 2));
        assert_eq!(cursor_position("abcdef", 4, 4), (1, 0));
        assert_eq!(cursor_position("ab\ncd", 5, 10), (1, 2));
        assert_eq!(cursor_position("é", 1, 10), (0, 0));
    }

    #[test]
    fn truncation_marks_lost_text() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("a long status line", 10), "a long ...");
        assert_eq!(truncate_with_ellipsis("abcdef", 3), "abc");
    }
}
