//! Light markdown styling for terminal output.
//!
//! Handles headings, bullet points, fenced code blocks, `**bold**` and
//! `` `code` `` spans. Everything else is printed as-is.

use colored::Colorize;

const FENCE: &str = "```";
const BULLET: &str = "•";

/// Line-oriented renderer. Carries fenced-code state across lines so it
/// can style a reply as it streams in.
#[derive(Debug, Default)]
pub struct MarkdownRenderer {
    in_code_block: bool,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a complete text.
    pub fn render(text: &str) -> String {
        let mut renderer = Self::new();
        text.lines()
            .map(|line| renderer.render_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render one line (without its newline).
    pub fn render_line(&mut self, line: &str) -> String {
        let trimmed = line.trim_start();

        if trimmed.starts_with(FENCE) {
            self.in_code_block = !self.in_code_block;
            return line.dimmed().to_string();
        }
        if self.in_code_block {
            return line.yellow().to_string();
        }

        if let Some((level, title)) = heading(trimmed) {
            let title = render_inline(title);
            return if level == 1 {
                title.bold().underline().cyan().to_string()
            } else {
                title.bold().cyan().to_string()
            };
        }

        let indent = &line[..line.len() - trimmed.len()];
        for marker in ["- ", "* ", "+ "] {
            if let Some(item) = trimmed.strip_prefix(marker) {
                return format!("{}{} {}", indent, BULLET.cyan(), render_inline(item));
            }
        }

        render_inline(line)
    }
}

/// `# Title` through `###### Title`.
fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    line[level..].strip_prefix(' ').map(|title| (level, title.trim()))
}

/// Style `**bold**` and `` `code` `` spans. Unmatched markers are kept.
fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    loop {
        let bold = rest.find("**");
        let code = rest.find('`');
        let (start, marker) = match (bold, code) {
            (Some(b), Some(c)) if c < b => (c, "`"),
            (Some(b), _) => (b, "**"),
            (None, Some(c)) => (c, "`"),
            (None, None) => break,
        };

        out.push_str(&rest[..start]);
        let after = &rest[start + marker.len()..];
        match after.find(marker) {
            Some(end) if end > 0 => {
                let span = &after[..end];
                if marker == "`" {
                    out.push_str(&span.yellow().to_string());
                } else {
                    out.push_str(&span.bold().to_string());
                }
                rest = &after[end + marker.len()..];
            }
            _ => {
                out.push_str(marker);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
