//! Output clipping for command results.
//!
//! A job that runs `journalctl` every second would otherwise flood the
//! daemon's log. Clipping keeps the head and the tail of the output and
//! replaces the middle with a marker naming how much was dropped.

use std::borrow::Cow;

/// Clip `output` to roughly `max_chars` characters, omitting the middle.
///
/// Output that already fits is borrowed unchanged. Cuts always land on
/// character boundaries. `max_chars == 0` disables clipping.
pub fn clip(output: &str, max_chars: usize) -> Cow<'_, str> {
    if max_chars == 0 || output.len() <= max_chars {
        return Cow::Borrowed(output);
    }

    let total = output.chars().count();
    if total <= max_chars {
        return Cow::Borrowed(output);
    }

    let keep_head = max_chars / 2;
    let keep_tail = max_chars - keep_head;
    let omitted = total - keep_head - keep_tail;

    let head_end = byte_offset(output, keep_head);
    let tail_start = byte_offset(output, total - keep_tail);

    Cow::Owned(format!(
        "{}\n... [{omitted} chars omitted] ...\n{}",
        &output[..head_end],
        &output[tail_start..]
    ))
}

/// Byte index of the `n`th character (or the end of the string).
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_output_is_borrowed() {
        let out = clip("hi\n", 100);
        assert!(matches!(out, Cow::Borrowed("hi\n")));
    }

    #[test]
    fn zero_limit_disables_clipping() {
        let s = "x".repeat(10_000);
        assert_eq!(clip(&s, 0).len(), 10_000);
    }

    #[test]
    fn keeps_head_and_tail() {
        let input = format!("{}{}{}", "A".repeat(50), "B".repeat(100), "C".repeat(50));
        let out = clip(&input, 20);
        assert!(out.starts_with("AAAAAAAAAA\n"));
        assert!(out.ends_with("\nCCCCCCCCCC"));
        assert!(out.contains("[180 chars omitted]"));
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundaries() {
        let s = "€".repeat(300);
        let out = clip(&s, 10);
        assert!(out.contains("[290 chars omitted]"));
        assert!(out.starts_with("€€€€€\n"));
    }

    #[test]
    fn many_bytes_but_few_chars_is_untouched() {
        // 8 chars, 24 bytes.
        let s = "€".repeat(8);
        assert_eq!(clip(&s, 10), s);
    }
}
