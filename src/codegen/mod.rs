//! G-code line rendering
//! Assembles output lines and appends them to the program text

use crate::config::Configuration;

pub const SUPPRESSED_PREFIX: &str = ";suppcommands(";

/// Sequence numbers, incremented before each use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumbering {
    current: u32,
    step: u32,
}

impl LineNumbering {
    pub fn new(start: u32, step: u32) -> Self {
        Self {
            current: start,
            step,
        }
    }

    pub fn next_number(&mut self) -> u32 {
        self.current += self.step;
        self.current
    }

    pub fn current(&self) -> u32 {
        self.current
    }
}

/// Program text under construction. Lines are only ever appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GCodeOutput {
    text: String,
    numbering: Option<LineNumbering>,
    line_count: usize,
}

impl GCodeOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn numbered(start: u32, step: u32) -> Self {
        Self {
            numbering: Some(LineNumbering::new(start, step)),
            ..Self::default()
        }
    }

    pub fn from_config(config: &Configuration) -> Self {
        if config.line_numbers {
            Self::numbered(config.line_number_start, config.line_number_step)
        } else {
            Self::new()
        }
    }

    pub fn emit(&mut self, code: &str) {
        if let Some(numbering) = self.numbering.as_mut() {
            let number = numbering.next_number();
            self.text.push('N');
            self.text.push_str(&number.to_string());
            self.text.push(' ');
        }
        self.text.push_str(code);
        self.text.push('\n');
        self.line_count += 1;
    }

    /// Machine-readable comment: `(text)`
    pub fn emit_comment(&mut self, comment: &str) {
        self.emit(&format!("({})", comment));
    }

    /// Remark ignored by the controller: `;(text)`
    pub fn emit_remark(&mut self, remark: &str) {
        self.emit(&format!(";({})", remark));
    }

    /// Message shown on the controller display
    pub fn emit_message(&mut self, message: &str) {
        self.emit(&format!("M117({})", message));
    }

    /// Emit every non-blank line of a text block
    pub fn emit_block(&mut self, block: &str) {
        for line in block.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.emit(line);
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn line_number(&self) -> Option<u32> {
        self.numbering.map(|n| n.current())
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl std::fmt::Display for GCodeOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Join a command's tokens into one line; `None` when nothing is left to say
pub fn render_line(tokens: &[String], suppressed: bool) -> Option<String> {
    if tokens.is_empty() {
        return None;
    }
    let line = tokens.join(" ");
    if suppressed {
        Some(format!("{}{})", SUPPRESSED_PREFIX, line))
    } else {
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_render_line() {
        assert_eq!(
            render_line(&tokens(&["G1", "X1.000", "F600.000"]), false),
            Some("G1 X1.000 F600.000".to_string())
        );
        assert_eq!(render_line(&[], false), None);
    }

    #[test]
    fn test_suppressed_wrapping() {
        assert_eq!(
            render_line(&tokens(&["G80"]), true),
            Some(";suppcommands(G80)".to_string())
        );
    }

    #[test]
    fn test_line_numbers_increase_by_step() {
        let mut out = GCodeOutput::numbered(100, 10);
        out.emit("G90");
        out.emit_comment("hello");
        out.emit("G17");
        assert_eq!(out.as_str(), "N110 G90\nN120 (hello)\nN130 G17\n");
        assert_eq!(out.line_number(), Some(130));
        assert_eq!(out.line_count(), 3);
    }

    #[test]
    fn test_unnumbered_output() {
        let mut out = GCodeOutput::new();
        out.emit_message("begin preamble");
        out.emit_remark("machine units: mm/min");
        out.emit_block("\nG90\n  \nG17\n");
        assert_eq!(
            out.to_string(),
            "M117(begin preamble)\n;(machine units: mm/min)\nG90\nG17\n"
        );
    }
}
