//! Terminal colour codes to inline-styled HTML.
//!
//! Text is always HTML-escaped. SGR sequences become `<span style=..>`
//! wrappers; every other escape sequence is removed. One converter is kept per
//! stream, so a colour set on one line still applies to the next.

use std::fmt::Write;

const PALETTE: [&str; 16] = [
    "0,0,0",
    "187,0,0",
    "0,187,0",
    "187,187,0",
    "0,0,187",
    "187,0,187",
    "0,187,187",
    "255,255,255",
    "85,85,85",
    "255,85,85",
    "0,255,0",
    "255,255,85",
    "85,85,255",
    "255,85,255",
    "85,255,255",
    "255,255,255",
];

const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

const ESC: char = '\u{1b}';
const BEL: char = '\u{07}';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Style {
    bold: bool,
    italic: bool,
    underline: bool,
    fg: Option<String>,
    bg: Option<String>,
}

impl Style {
    fn is_plain(&self) -> bool {
        *self == Style::default()
    }

    fn css(&self) -> String {
        let mut css = String::new();
        if let Some(fg) = &self.fg {
            let _ = write!(css, "color:rgb({});", fg);
        }
        if let Some(bg) = &self.bg {
            let _ = write!(css, "background-color:rgb({});", bg);
        }
        if self.bold {
            css.push_str("font-weight:bold;");
        }
        if self.italic {
            css.push_str("font-style:italic;");
        }
        if self.underline {
            css.push_str("text-decoration:underline;");
        }
        css
    }

    fn apply_sgr(&mut self, params: &str) {
        let codes: Vec<u32> = if params.is_empty() {
            vec![0]
        } else {
            params
                .split(';')
                .map(|p| p.parse().unwrap_or(0))
                .collect()
        };

        let mut i = 0;
        while i < codes.len() {
            match codes[i] {
                0 => *self = Style::default(),
                1 => self.bold = true,
                3 => self.italic = true,
                4 => self.underline = true,
                22 => self.bold = false,
                23 => self.italic = false,
                24 => self.underline = false,
                c @ 30..=37 => self.fg = Some(PALETTE[(c - 30) as usize].to_string()),
                39 => self.fg = None,
                c @ 40..=47 => self.bg = Some(PALETTE[(c - 40) as usize].to_string()),
                49 => self.bg = None,
                c @ 90..=97 => self.fg = Some(PALETTE[(c - 90 + 8) as usize].to_string()),
                c @ 100..=107 => self.bg = Some(PALETTE[(c - 100 + 8) as usize].to_string()),
                c @ (38 | 48) => {
                    let (colour, used) = extended_colour(&codes[i + 1..]);
                    i += used;
                    if c == 38 {
                        self.fg = colour;
                    } else {
                        self.bg = colour;
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }
}

/// `5;n` (256 colours) or `2;r;g;b`. Returns the colour and the number of
/// parameters consumed.
fn extended_colour(rest: &[u32]) -> (Option<String>, usize) {
    match rest {
        [5, n, ..] => (colour_256(*n), 2),
        [2, r, g, b, ..] => (
            Some(format!("{},{},{}", r.min(&255), g.min(&255), b.min(&255))),
            4,
        ),
        [] => (None, 0),
        _ => (None, 1),
    }
}

fn colour_256(n: u32) -> Option<String> {
    match n {
        0..=15 => Some(PALETTE[n as usize].to_string()),
        16..=231 => {
            let n = n - 16;
            let (r, g, b) = (n / 36, (n / 6) % 6, n % 6);
            Some(format!(
                "{},{},{}",
                CUBE_LEVELS[r as usize], CUBE_LEVELS[g as usize], CUBE_LEVELS[b as usize]
            ))
        }
        232..=255 => {
            let level = 8 + (n - 232) * 10;
            Some(format!("{0},{0},{0}", level))
        }
        _ => None,
    }
}

pub fn escape_html(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
}

#[derive(Debug, Default)]
pub struct AnsiConverter {
    style: Style,
}

impl AnsiConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one line. Spans never stay open past the end of the line.
    pub fn to_html(&mut self, line: &str) -> String {
        let mut out = String::new();
        let mut text = String::new();
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            if c != ESC {
                text.push(c);
                continue;
            }
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    let mut params = String::new();
                    let mut terminator = None;
                    for c in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&c) {
                            terminator = Some(c);
                            break;
                        }
                        params.push(c);
                    }
                    if terminator == Some('m') {
                        self.flush(&mut text, &mut out);
                        self.style.apply_sgr(&params);
                    }
                }
                Some(']') => {
                    // OSC, terminated by BEL or ESC \
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == BEL {
                            break;
                        }
                        if c == ESC && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                Some(_) => {
                    chars.next();
                }
                None => {}
            }
        }
        self.flush(&mut text, &mut out);
        out
    }

    fn flush(&self, text: &mut String, out: &mut String) {
        if text.is_empty() {
            return;
        }
        if self.style.is_plain() {
            escape_html(text, out);
        } else {
            let _ = write!(out, "<span style=\"{}\">", self.style.css());
            escape_html(text, out);
            out.push_str("</span>");
        }
        text.clear();
    }
}
