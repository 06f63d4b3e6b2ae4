// Minimal markup slicing for scraped statistics pages.
//
// These helpers work on flat sibling structures (table rows, list items, repeated
// cards). They do not understand nesting of the same tag.

/// Split `html` at every occurrence of `marker`, returning each piece starting at
/// the marker and running up to the next one (or the end of input).
pub fn segments<'a>(html: &'a str, marker: &str) -> Vec<&'a str> {
    let starts: Vec<usize> = html.match_indices(marker).map(|(i, _)| i).collect();
    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(html.len());
            &html[start..end]
        })
        .collect()
}

/// Content between the end of the tag containing `open_pat` and the next `close_pat`
pub fn slice_between<'a>(s: &'a str, open_pat: &str, close_pat: &str) -> Option<&'a str> {
    let o = s.find(open_pat)?;
    let after = s[o..].find('>')? + o + 1;
    let close = s[after..].find(close_pat)?;
    Some(&s[after..after + close])
}

/// Inner content of every `<tag ...>...</tag>` element in `s`
pub fn tag_blocks<'a>(s: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut blocks = Vec::new();
    let mut from = 0;

    while let Some(rel) = s[from..].find(&open) {
        let start = from + rel;
        let after_name = start + open.len();
        let boundary = s[after_name..].chars().next();
        if !matches!(boundary, Some(c) if c == '>' || c.is_whitespace()) {
            from = after_name;
            continue;
        }

        let Some(open_end) = s[start..].find('>').map(|i| i + start + 1) else {
            break;
        };
        let Some(close_rel) = s[open_end..].find(&close) else {
            break;
        };

        blocks.push(&s[open_end..open_end + close_rel]);
        from = open_end + close_rel + close.len();
    }

    blocks
}

/// First value of attribute `name` found in `s`
pub fn attr(s: &str, name: &str) -> Option<String> {
    let mut rest = s;
    while let Some(i) = rest.find(name) {
        rest = &rest[i + name.len()..];
        let value = rest
            .trim_start()
            .strip_prefix('=')
            .map(str::trim_start)
            .and_then(|v| v.strip_prefix('"'));
        if let Some(value) = value {
            return value.find('"').map(|end| value[..end].to_string());
        }
    }
    None
}

/// Drop all tags and collapse whitespace
pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();

    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_blocks_skips_longer_tag_names() {
        let html =
            r#"<table><track></track><tr class="a"><td>1</td></tr><tr><td>2</td></tr></table>"#;
        let rows = tag_blocks(html, "tr");
        assert_eq!(rows, vec!["<td>1</td>", "<td>2</td>"]);
    }

    #[test]
    fn test_segments_and_attr() {
        let html = r#"<div data-key="ahri">A</div><div data-key="zed">Z</div>"#;
        let parts = segments(html, "<div data-key=");
        assert_eq!(parts.len(), 2);
        assert_eq!(attr(parts[1], "data-key").as_deref(), Some("zed"));
    }

    #[test]
    fn test_attr_skips_bare_mentions_and_allows_spacing() {
        let html = r#"<img alt="src" src = "//cdn/item/3089.png">"#;
        assert_eq!(attr(html, "src").as_deref(), Some("//cdn/item/3089.png"));
        assert_eq!(attr(html, "href"), None);
        assert_eq!(attr(r#"<a href="unterminated>"#, "href"), None);
    }

    #[test]
    fn test_strip_tags_collapses_whitespace() {
        assert_eq!(strip_tags("<em>1,234</em>\n  <span>x</span>"), "1,234 x");
    }

    #[test]
    fn test_slice_between() {
        let html = r#"<div class="side"><tbody><tr></tr></tbody></div>"#;
        assert_eq!(slice_between(html, "<tbody", "</tbody>"), Some("<tr></tr>"));
    }
}
