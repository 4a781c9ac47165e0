/*
 * Waypoint messages are written as a small subset of HTML: plain text, <br> line
 * breaks, <a href='...'> links and the common character entities. Everything else
 * that looks like a tag is dropped and only its text is kept.
 */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub link: Option<String>,
}

impl Span {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            link: None,
        }
    }
}

fn decode_entities(text: &str) -> String {
    const ENTITIES: [(&str, &str); 7] = [
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&apos;", "'"),
        ("&nbsp;", " "),
        ("&amp;", "&"),
    ];

    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        rest = &rest[start..];
        match ENTITIES
            .iter()
            .find(|(entity, _)| rest.starts_with(entity))
        {
            Some((entity, replacement)) => {
                decoded.push_str(replacement);
                rest = &rest[entity.len()..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }
    decoded.push_str(rest);
    decoded
}

// value of href='...' or href="..." inside an opening tag
fn href(tag: &str) -> Option<String> {
    let start = tag.find("href=")? + "href=".len();
    let value = &tag[start..];
    let quote = value.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let end = value[1..].find(quote)?;
    Some(decode_entities(&value[1..1 + end]))
}

enum Tag {
    OpenLink(Option<String>),
    CloseLink,
    LineBreak,
    Other,
}

fn classify(tag: &str) -> Tag {
    let tag = tag.trim();
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    match (tag.starts_with('/'), name.as_str()) {
        (false, "a") => Tag::OpenLink(href(tag)),
        (true, "a") => Tag::CloseLink,
        (_, "br") => Tag::LineBreak,
        _ => Tag::Other,
    }
}

/// Splits marked up text into runs of visible text, each either plain or part of
/// one link. Neighbouring runs never share the same link.
pub fn parse_markup(source: &str) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    let mut link: Option<String> = None;

    let mut push = |text: &str, link: &Option<String>| {
        if text.is_empty() {
            return;
        }
        match spans.last_mut() {
            Some(last) if last.link == *link => last.text.push_str(text),
            _ => spans.push(Span {
                text: text.to_string(),
                link: link.clone(),
            }),
        }
    };

    let mut rest = source;
    while let Some(open) = rest.find('<') {
        let close = match rest[open..].find('>') {
            Some(close) => open + close,
            // a lone '<' is just text
            None => break,
        };

        push(&decode_entities(&rest[..open]), &link);
        match classify(&rest[open + 1..close]) {
            Tag::OpenLink(target) => link = target,
            Tag::CloseLink => link = None,
            Tag::LineBreak => push("\n", &link),
            Tag::Other => {}
        }
        rest = &rest[close + 1..];
    }
    push(&decode_entities(rest), &link);

    spans
}

/// Link targets are not visible in the text itself, so any target that the link
/// text does not already spell out is appended after it in parentheses.
pub fn with_link_targets(spans: Vec<Span>) -> Vec<Span> {
    let mut shown = Vec::with_capacity(spans.len());
    for span in spans {
        let target = span.link.as_deref().map(|target| {
            target
                .strip_prefix("mailto:")
                .unwrap_or(target)
                .to_string()
        });
        let spelled_out = target
            .as_deref()
            .map_or(true, |target| span.text.trim() == target);

        match (spelled_out, target) {
            (false, Some(target)) => {
                let link = span.link.clone();
                shown.push(span);
                shown.push(Span::plain(" ("));
                shown.push(Span { text: target, link });
                shown.push(Span::plain(")"));
            }
            _ => shown.push(span),
        }
    }
    shown
}

pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(|span| span.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(text: &str, target: &str) -> Span {
        Span {
            text: text.to_string(),
            link: Some(target.to_string()),
        }
    }

    #[test]
    fn test_plain_text_is_one_span() {
        assert_eq!(parse_markup("Hello, I am Dan"), vec![Span::plain("Hello, I am Dan")]);
    }

    #[test]
    fn test_link_is_split_out() {
        let spans = parse_markup("Email me at <a href='mailto:dan9m@ya.ru'>dan9m@ya.ru</a>");

        assert_eq!(
            spans,
            vec![
                Span::plain("Email me at "),
                link("dan9m@ya.ru", "mailto:dan9m@ya.ru"),
            ]
        );
        assert_eq!(plain_text(&spans), "Email me at dan9m@ya.ru");
    }

    #[test]
    fn test_double_quoted_href_and_trailing_text() {
        let spans = parse_markup(r#"See <a href="https://example.com/a?b=1&amp;c=2">here</a> now"#);

        assert_eq!(
            spans,
            vec![
                Span::plain("See "),
                link("here", "https://example.com/a?b=1&c=2"),
                Span::plain(" now"),
            ]
        );
    }

    #[test]
    fn test_unknown_tags_are_dropped_and_entities_decoded() {
        let spans = parse_markup("<b>Fast</b> &amp; <i>loud</i><br/>5 &lt; 6 &copy;");
        assert_eq!(spans, vec![Span::plain("Fast & loud\n5 < 6 &copy;")]);
    }

    #[test]
    fn test_unclosed_bracket_is_text() {
        assert_eq!(parse_markup("a < b"), vec![Span::plain("a < b")]);
    }

    #[test]
    fn test_hidden_targets_are_shown() {
        let spans = with_link_targets(parse_markup(
            "<a href='mailto:dan9m@ya.ru'>dan9m@ya.ru</a> or <a href='https://ya.ru'>my site</a>",
        ));

        assert_eq!(
            plain_text(&spans),
            "dan9m@ya.ru or my site (https://ya.ru)"
        );
        assert_eq!(spans[2], link("my site", "https://ya.ru"));
        assert_eq!(spans[4], link("https://ya.ru", "https://ya.ru"));
    }
}
