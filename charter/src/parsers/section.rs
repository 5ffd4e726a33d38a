//! Line-level markdown tokenizer shared by all parsers.
//!
//! Every parser works the same way: find a heading, then take the lines after
//! it up to some boundary heading. [`MarkdownLines`] classifies each line once
//! (heading level, fenced code) so that "extract until boundary" is a single
//! operation with a caller-supplied predicate.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+(.*)$").expect("valid bullet regex"));

static CHECKBOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[ xX]\]\s*").expect("valid checkbox regex"));

/// An ATX heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading<'a> {
    /// 1..=6
    pub level: usize,
    /// Heading text with the marker and surrounding whitespace removed
    pub text: &'a str,
}

/// One classified source line.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    pub text: &'a str,
    /// Set for heading lines outside fenced code
    pub heading: Option<Heading<'a>>,
    /// Inside (or delimiting) a fenced code block
    pub in_code: bool,
}

/// A document split into classified lines.
#[derive(Debug, Clone)]
pub struct MarkdownLines<'a> {
    lines: Vec<Line<'a>>,
}

impl<'a> MarkdownLines<'a> {
    pub fn new(content: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut fence: Option<&'static str> = None;

        for text in content.lines() {
            let trimmed = text.trim_start();
            let marker = if trimmed.starts_with("```") {
                Some("```")
            } else if trimmed.starts_with("~~~") {
                Some("~~~")
            } else {
                None
            };

            let in_code = match (fence, marker) {
                (None, Some(m)) => {
                    fence = Some(m);
                    true
                }
                (Some(open), Some(m)) if open == m => {
                    fence = None;
                    true
                }
                (Some(_), _) => true,
                (None, None) => false,
            };

            lines.push(Line {
                text,
                heading: (!in_code).then(|| parse_heading(text)).flatten(),
                in_code,
            });
        }

        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Line<'a>> {
        self.lines.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Line<'a>> {
        self.lines.iter()
    }

    /// Headings with their line indices, in document order.
    pub fn headings(&self) -> impl Iterator<Item = (usize, Heading<'a>)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| line.heading.map(|h| (i, h)))
    }

    /// Text of the first heading at `level`.
    pub fn first_heading(&self, level: usize) -> Option<&'a str> {
        self.headings()
            .find(|(_, h)| h.level == level)
            .map(|(_, h)| h.text)
    }

    /// Line range after `heading_index` up to the first heading accepted by
    /// `is_boundary`, or end of document.
    pub fn body_until<F>(&self, heading_index: usize, is_boundary: F) -> Range<usize>
    where
        F: Fn(&Heading<'a>) -> bool,
    {
        let start = (heading_index + 1).min(self.lines.len());
        let end = self.lines[start..]
            .iter()
            .position(|line| line.heading.as_ref().is_some_and(&is_boundary))
            .map_or(self.lines.len(), |offset| start + offset);
        start..end
    }

    /// Lines in `range`.
    pub fn slice(&self, range: Range<usize>) -> &[Line<'a>] {
        &self.lines[range]
    }

    /// Joined text of `range`, trimmed, with trailing `---` separators removed.
    pub fn text(&self, range: Range<usize>) -> String {
        let mut body: Vec<&str> = self.lines[range].iter().map(|l| l.text).collect();
        while let Some(last) = body.last() {
            let last = last.trim();
            if last.is_empty() || last == "---" {
                body.pop();
            } else {
                break;
            }
        }
        body.join("\n").trim().to_string()
    }

    /// Body ranges of every level 2/3 heading whose text matches one of
    /// `titles` (case-insensitive, trailing colon ignored). Each body ends at
    /// the next heading of the same or a higher level.
    pub fn sections(&self, titles: &[&str]) -> Vec<Range<usize>> {
        self.headings()
            .filter(|(_, h)| matches!(h.level, 2 | 3))
            .filter(|(_, h)| {
                let text = h.text.trim_end_matches(':').trim();
                titles.iter().any(|t| t.eq_ignore_ascii_case(text))
            })
            .map(|(i, h)| self.body_until(i, |next| next.level <= h.level))
            .collect()
    }

    /// Bullet items in `range`, markers and checkboxes stripped, empty items skipped.
    pub fn bullets(&self, range: Range<usize>) -> Vec<String> {
        self.lines[range]
            .iter()
            .filter(|l| !l.in_code)
            .filter_map(|l| bullet_text(l.text))
            .map(|item| strip_checkbox(item).to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// Level boundary used for constitution rule bodies.
pub fn is_level_2_or_3(heading: &Heading<'_>) -> bool {
    matches!(heading.level, 2 | 3)
}

/// Text after a list marker (`-`, `*`, `+`, `1.`, `1)`), if the line is a list item.
pub fn bullet_text(line: &str) -> Option<&str> {
    BULLET
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Item text without a leading `[ ]` / `[x]` task marker.
pub fn strip_checkbox(item: &str) -> &str {
    CHECKBOX
        .find(item)
        .map_or(item, |m| &item[m.end()..])
        .trim()
}

fn parse_heading(line: &str) -> Option<Heading<'_>> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some(Heading {
        level: hashes,
        text: rest.trim().trim_end_matches('#').trim_end(),
    })
}
