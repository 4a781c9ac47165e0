use glam::Vec2;

use super::markup::Span;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedChar {
    pub character: char,
    /// Pen position in pixels: x from the left edge, y the top of the line.
    pub pen: Vec2,
    pub link: bool,
}

#[derive(Debug, Default)]
pub struct TextLayout {
    pub chars: Vec<PlacedChar>,
    pub size: Vec2,
}

struct Breaker<F> {
    advance: F,
    max_width: f32,
    line_height: f32,
    pen: Vec2,
    layout: TextLayout,
}

impl<F: FnMut(char) -> f32> Breaker<F> {
    fn new_line(&mut self) {
        self.pen = Vec2::new(0.0, self.pen.y + self.line_height);
    }

    fn place(&mut self, character: char, link: bool) {
        let advance = (self.advance)(character);
        // a single word wider than a whole line is broken anywhere
        if self.pen.x > 0.0 && self.pen.x + advance > self.max_width {
            self.new_line();
        }
        self.layout.chars.push(PlacedChar {
            character,
            pen: self.pen,
            link,
        });
        self.pen.x += advance;
        self.layout.size.x = self.layout.size.x.max(self.pen.x);
    }

    fn word(&mut self, word: &[(char, bool)]) {
        let width: f32 = word.iter().map(|(c, _)| (self.advance)(*c)).sum();
        if self.pen.x > 0.0 && self.pen.x + width > self.max_width {
            self.new_line();
        }
        for (character, link) in word {
            self.place(*character, *link);
        }
    }

    fn space(&mut self, character: char) {
        // spaces that would start a wrapped line are swallowed
        let advance = (self.advance)(character);
        if self.pen.x > 0.0 && self.pen.x + advance <= self.max_width {
            self.pen.x += advance;
        }
    }
}

/// Lays text out left to right in lines of at most `max_width` pixels, wrapping
/// between words. `advance` gives the horizontal advance of one character.
pub fn layout_spans(
    spans: &[Span],
    max_width: f32,
    line_height: f32,
    advance: impl FnMut(char) -> f32,
) -> TextLayout {
    let mut breaker = Breaker {
        advance,
        max_width,
        line_height,
        pen: Vec2::ZERO,
        layout: TextLayout::default(),
    };

    let mut word = Vec::new();
    let chars = spans
        .iter()
        .flat_map(|span| span.text.chars().map(move |c| (c, span.link.is_some())));
    for (character, link) in chars {
        if !character.is_whitespace() {
            word.push((character, link));
            continue;
        }

        breaker.word(&word);
        word.clear();
        if character == '\n' {
            breaker.new_line();
        } else {
            breaker.space(character);
        }
    }
    breaker.word(&word);

    let mut layout = breaker.layout;
    if !spans.iter().all(|span| span.text.is_empty()) {
        layout.size.y = breaker.pen.y + line_height;
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Vec<Span> {
        vec![Span {
            text: text.to_string(),
            link: None,
        }]
    }

    fn lines(layout: &TextLayout) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        let mut last_y = None;
        for placed in layout.chars.iter() {
            if last_y != Some(placed.pen.y) {
                lines.push(String::new());
                last_y = Some(placed.pen.y);
            }
            if let Some(line) = lines.last_mut() {
                line.push(placed.character);
            }
        }
        lines
    }

    // every character is 10px wide
    fn fixed(_: char) -> f32 {
        10.0
    }

    #[test]
    fn test_short_text_stays_on_one_line() {
        let layout = layout_spans(&plain("Hello Dan"), 200.0, 24.0, fixed);

        assert_eq!(lines(&layout), vec!["HelloDan"]);
        assert_eq!(layout.chars[5].pen, Vec2::new(60.0, 0.0));
        assert_eq!(layout.size, Vec2::new(90.0, 24.0));
    }

    #[test]
    fn test_wraps_between_words() {
        let layout = layout_spans(&plain("one two three"), 75.0, 20.0, fixed);

        assert_eq!(lines(&layout), vec!["onetwo", "three"]);
        let three = layout.chars[6];
        assert_eq!(three.pen, Vec2::new(0.0, 20.0));
        assert_eq!(layout.size, Vec2::new(70.0, 40.0));
    }

    #[test]
    fn test_overlong_word_breaks_anywhere() {
        let layout = layout_spans(&plain("abcdefgh"), 35.0, 10.0, fixed);
        assert_eq!(lines(&layout), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_line_breaks_are_kept() {
        let layout = layout_spans(&plain("a\nb"), 500.0, 10.0, fixed);

        assert_eq!(lines(&layout), vec!["a", "b"]);
        assert_eq!(layout.size.y, 20.0);
    }

    #[test]
    fn test_link_flag_follows_the_span() {
        let spans = vec![
            Span {
                text: "at ".to_string(),
                link: None,
            },
            Span {
                text: "me".to_string(),
                link: Some("mailto:me".to_string()),
            },
        ];
        let layout = layout_spans(&spans, 500.0, 10.0, fixed);

        let flags: Vec<bool> = layout.chars.iter().map(|placed| placed.link).collect();
        assert_eq!(flags, vec![false, false, true, true]);
    }

    #[test]
    fn test_empty_text_has_no_size() {
        let layout = layout_spans(&[], 500.0, 10.0, fixed);

        assert!(layout.chars.is_empty());
        assert_eq!(layout.size, Vec2::ZERO);
    }
}
