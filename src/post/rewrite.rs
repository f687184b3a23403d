//! Command rewriting: machine-control commands replaced by macros

use crate::config::MacroTemplate;
use crate::toolpath::Command;
use crate::units::{Dimension, Formatter};
use tracing::warn;

/// Written where a placeholder names a parameter the command lacks
const MISSING_VALUE: &str = "?";

/// Lines of `template` with every `{L}` placeholder filled from `cmd`
pub fn expand_macro(template: &MacroTemplate, cmd: &Command, fmt: &Formatter) -> Vec<String> {
    template
        .lines
        .iter()
        .map(|line| substitute(line, cmd, fmt))
        .collect()
}

fn substitute(line: &str, cmd: &Command, fmt: &Formatter) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open..];

        match placeholder(after) {
            Some(letter) => {
                match cmd.param(letter) {
                    Some(value) => out.push_str(&fmt.format(value, Dimension::of(letter))),
                    None => {
                        warn!(command = %cmd.name, "macro placeholder {{{}}} has no value", letter);
                        out.push_str(MISSING_VALUE);
                    }
                }
                rest = &after[3..];
            }
            None => {
                out.push('{');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// `{L}` at the start of `text`
fn placeholder(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('{'), Some(letter), Some('}')) if letter.is_ascii_alphabetic() => {
            Some(letter.to_ascii_uppercase())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MacroTable;
    use crate::units::UnitSystem;

    fn metric() -> Formatter {
        Formatter::new(UnitSystem::Metric, 3)
    }

    #[test]
    fn test_tool_number_substituted() {
        let table = MacroTable::marlin();
        let template = table.get("M6").expect("built-in tool change");
        let lines = expand_macro(template, &Command::new("M6").with_param('T', 3.0), &metric());

        assert!(lines.contains(&"M0 Install tool: 3; change bit".to_string()));
        assert_eq!(lines.len(), template.lines.len());
    }

    #[test]
    fn test_placeholder_uses_dimension() {
        let template = MacroTemplate::new(&["G0 Z{z}", "M3 S{S}"]);
        let cmd = Command::new("M3").with_param('Z', 25.4).with_param('S', 12000.0);
        let imperial = Formatter::new(UnitSystem::Imperial, 3);
        assert_eq!(
            expand_macro(&template, &cmd, &imperial),
            vec!["G0 Z1.0000".to_string(), "M3 S12000".to_string()]
        );
    }

    #[test]
    fn test_missing_and_literal_braces() {
        let template = MacroTemplate::new(&["M0 tool {T}", "M117 {not a placeholder}", "{"]);
        assert_eq!(
            expand_macro(&template, &Command::new("M6"), &metric()),
            vec![
                "M0 tool ?".to_string(),
                "M117 {not a placeholder}".to_string(),
                "{".to_string()
            ]
        );
    }
}
