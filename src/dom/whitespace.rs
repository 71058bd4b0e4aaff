//! Combining whitespace requirements

/// Return the strongest of the whitespace strings.
///
/// More newlines win, then more spaces, so `"\n"` beats `" "` and `" "`
/// beats `""`. Of equally strong strings the first is returned. Returns an
/// empty string if there are no strings at all.
///
/// ```
/// use textdom::dom::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace(["\n", " "]), "\n");
/// assert_eq!(collapse_whitespace([" ", ""]), " ");
/// ```
pub fn collapse_whitespace<'a>(whitespace: impl IntoIterator<Item = &'a str>) -> String {
    let mut best: Option<(&str, (usize, usize))> = None;
    for s in whitespace {
        let key = strength(s);
        if best.map_or(true, |(_, k)| key > k) {
            best = Some((s, key));
        }
    }
    best.map(|(s, _)| s.to_string()).unwrap_or_default()
}

fn strength(s: &str) -> (usize, usize) {
    s.chars().fold((0, 0), |(nl, sp), c| match c {
        '\n' => (nl + 1, sp),
        ' ' => (nl, sp + 1),
        _ => (nl, sp),
    })
}

/// Concatenate `(before, text, after)` fragments.
///
/// The whitespace around empty fragments is collapsed into the surrounding
/// whitespace. Returns the whitespace before the first text, the combined
/// text, and the whitespace after the last text.
pub fn combine_text<B, T, A>(fragments: impl IntoIterator<Item = (B, T, A)>) -> (String, String, String)
where
    B: AsRef<str>,
    T: AsRef<str>,
    A: AsRef<str>,
{
    let mut first: Option<String> = None;
    let mut text = String::new();
    let mut whitespace: Vec<String> = Vec::new();
    for (before, t, after) in fragments {
        whitespace.push(before.as_ref().to_string());
        let t = t.as_ref();
        if !t.is_empty() {
            let space = collapse_whitespace(whitespace.iter().map(String::as_str));
            if first.is_none() {
                first = Some(space);
            } else {
                text.push_str(&space);
            }
            text.push_str(t);
            whitespace.clear();
        }
        whitespace.push(after.as_ref().to_string());
    }
    let after = collapse_whitespace(whitespace.iter().map(String::as_str));
    (first.unwrap_or_default(), text, after)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_prefers_newlines() {
        assert_eq!(collapse_whitespace(["\n", " "]), "\n");
        assert_eq!(collapse_whitespace([" ", "\n\n", "\n"]), "\n\n");
        assert_eq!(collapse_whitespace(["", " "]), " ");
        assert_eq!(collapse_whitespace(["  ", "\n"]), "\n");
        assert_eq!(collapse_whitespace(Vec::<&str>::new()), "");
    }

    #[test]
    fn test_collapse_order_independent() {
        let inputs = [" ", "\n ", "", "\n"];
        let mut reversed = inputs;
        reversed.reverse();
        assert_eq!(collapse_whitespace(inputs), collapse_whitespace(reversed));
        assert_eq!(collapse_whitespace(inputs), "\n ");
    }

    #[test]
    fn test_combine_text() {
        let fragments = [
            ("\n", "{", " "),
            ("", "", "\n"),
            (" ", "c", ""),
            ("", "}", " "),
        ];
        let (before, text, after) = combine_text(fragments);
        assert_eq!(before, "\n");
        assert_eq!(text, "{\nc}");
        assert_eq!(after, " ");
    }

    #[test]
    fn test_combine_empty() {
        let (before, text, after) = combine_text([(" ", "", "\n")]);
        assert_eq!((before.as_str(), text.as_str(), after.as_str()), ("", "", "\n"));
    }
}
