//! Visible-text helpers
//!
//! Script and style contents are never part of visible text, so code cannot
//! leak into names or descriptions.

use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose contents are never visible text
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that do not break a line of text
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "em", "i", "label", "mark", "small", "span", "strong", "sub", "sup",
    "u",
];

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
                if !INLINE_TAGS.contains(&name) {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Visible text of an element, whitespace collapsed to single spaces
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of a whole document, one line per block element
pub fn visible_lines(document: &Html) -> String {
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of the first selector whose first match has visible text
pub fn first_text(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        document
            .select(selector)
            .next()
            .map(visible_text)
            .filter(|text| !text.is_empty())
    })
}

/// Capitalizes the first letter of every alphabetic run, lowercasing the rest
///
/// ```
/// use furnish_scout::extract::title_case;
///
/// assert_eq!(title_case("VELVET sofa 3-seater"), "Velvet Sofa 3-Seater");
/// ```
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_alphabetic = false;

    for c in input.chars() {
        if c.is_alphabetic() {
            if previous_alphabetic {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_alphabetic = true;
        } else {
            out.push(c);
            previous_alphabetic = false;
        }
    }

    out
}

/// Returns at most `max_chars` characters of `text`
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
