use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};
use syntect::{
    easy::HighlightLines,
    highlighting::{Color as SyntectColor, Theme, ThemeSet},
    parsing::{SyntaxReference, SyntaxSet},
};

/// Maximum line length for syntax highlighting (skip longer lines for
/// performance).
const MAX_LINE_LENGTH: usize = 10_000;

/// Syntax highlighter for fixture diff hunks.
///
/// Loading the bundled syntaxes and themes takes ~250ms; construct once
/// and reuse.
pub struct DiffHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl DiffHighlighter {
    pub fn new() -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .get("base16-ocean.dark")
            .or_else(|| theme_set.themes.values().next())
            .cloned()
            .unwrap_or_default();

        Self { syntax_set, theme }
    }

    /// Highlight one hunk text block into renderable lines.
    ///
    /// Hunk headers (`@@`) and git file headers get fixed colors; added
    /// and removed lines keep their diff prefix colors with the content
    /// syntax-highlighted when the file type is known. Highlighting
    /// state is kept across the lines of the block, so multi-line
    /// constructs color correctly within a hunk.
    pub fn hunk_lines(&self, file_ext: &str, hunk: &str) -> Vec<Line<'static>> {
        let mut session = self
            .syntax_for(file_ext)
            .map(|syntax| HighlightLines::new(syntax, &self.theme));
        hunk.lines()
            .map(|raw| self.diff_line(raw, &mut session))
            .collect()
    }

    /// Resolve a syntax for a file extension. The bundled syntax set has
    /// no TypeScript definition, so `.ts`/`.tsx` fall back to JavaScript.
    fn syntax_for(&self, file_ext: &str) -> Option<&SyntaxReference> {
        self.syntax_set
            .find_syntax_by_extension(file_ext)
            .or_else(|| match file_ext {
                "ts" | "tsx" => self.syntax_set.find_syntax_by_name("JavaScript"),
                _ => None,
            })
    }

    fn diff_line(&self, raw: &str, session: &mut Option<HighlightLines>) -> Line<'static> {
        if raw.starts_with("@@") {
            return Line::from(Span::styled(
                raw.to_string(),
                Style::default().fg(Color::Cyan),
            ));
        }
        if raw.starts_with("diff --git")
            || raw.starts_with("index ")
            || raw.starts_with("--- ")
            || raw.starts_with("+++ ")
        {
            return Line::from(Span::styled(
                raw.to_string(),
                Style::default().fg(Color::DarkGray),
            ));
        }

        let (prefix, prefix_color) = if raw.starts_with('+') {
            ("+", Color::Green)
        } else if raw.starts_with('-') {
            ("-", Color::Red)
        } else if raw.starts_with(' ') {
            (" ", Color::Reset)
        } else {
            return Line::from(Span::raw(raw.to_string()));
        };

        if raw.len() > MAX_LINE_LENGTH {
            return Line::from(Span::styled(
                raw.to_string(),
                Style::default().fg(prefix_color),
            ));
        }

        let content = if raw.len() > 1 { &raw[1..] } else { "" };

        let Some(highlighter) = session else {
            return Line::from(Span::styled(
                raw.to_string(),
                Style::default().fg(prefix_color),
            ));
        };

        match highlighter.highlight_line(content, &self.syntax_set) {
            Ok(regions) => {
                let mut spans = Vec::with_capacity(regions.len() + 1);
                spans.push(Span::styled(
                    prefix.to_string(),
                    Style::default().fg(prefix_color),
                ));
                for (style, text) in regions {
                    spans.push(Span::styled(
                        text.to_string(),
                        Style::default().fg(syntect_to_ratatui(style.foreground)),
                    ));
                }
                Line::from(spans)
            }
            Err(_) => Line::from(Span::styled(
                raw.to_string(),
                Style::default().fg(prefix_color),
            )),
        }
    }
}

impl Default for DiffHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

fn syntect_to_ratatui(color: SyntectColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hunk_header_is_cyan() {
        let h = DiffHighlighter::new();
        let lines = h.hunk_lines("go", "@@ -1,2 +1,2 @@ func main() {\n+\tx := 1");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Cyan));
    }

    #[test]
    fn added_line_keeps_green_prefix() {
        let h = DiffHighlighter::new();
        let lines = h.hunk_lines("go", "+\tx := 1");
        assert_eq!(lines[0].spans[0].content.as_ref(), "+");
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Green));
        assert!(lines[0].spans.len() > 1, "content should be highlighted");
    }

    #[test]
    fn typescript_falls_back_to_javascript_syntax() {
        let h = DiffHighlighter::new();
        assert!(h.syntax_for("ts").is_some());
        assert!(h.syntax_for("tsx").is_some());
    }

    #[test]
    fn unknown_extension_gets_plain_diff_coloring() {
        let h = DiffHighlighter::new();
        let lines = h.hunk_lines("unknown_ext_xyz", "-old line");
        assert_eq!(lines[0].spans.len(), 1);
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Red));
    }

    #[test]
    fn git_file_headers_are_dimmed() {
        let h = DiffHighlighter::new();
        let diff = "diff --git a/x.go b/x.go\nindex 111..222 100644\n--- a/x.go\n+++ b/x.go";
        for line in h.hunk_lines("go", diff) {
            assert_eq!(line.spans[0].style.fg, Some(Color::DarkGray));
        }
    }
}
