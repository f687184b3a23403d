//! Post-processor for Marlin G-code output
//!
//! Walks a toolpath tree once, depth first, and renders every command into
//! Marlin's dialect. Marlin has no canned cycles, so drill cycles are
//! rewritten into plain moves, and tool change / spindle start are replaced
//! by the configured macros.

use crate::codegen::render_line;
use crate::config::{ConfigError, Configuration};
use crate::toolpath::{Command, CoolantMode, ToolpathNode};
use crate::units::Formatter;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub mod cycles;
pub mod modal;
pub mod rewrite;
pub mod state;

use cycles::{CycleContext, DrillCycle};
use modal::{ModalOptions, Visible};
use rewrite::expand_macro;
use state::EmitterState;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Post-processor trait - implemented for each controller type
pub trait PostProcessor {
    /// Render a whole program
    fn export(&self, nodes: &[ToolpathNode]) -> String;

    /// Machine/controller name
    fn name(&self) -> &str;

    /// Whether this controller supports canned cycles (G81, G83, etc.)
    fn supports_canned_cycles(&self) -> bool;
}

/// Marlin 2.x post-processor
#[derive(Debug, Clone)]
pub struct MarlinPost {
    config: Configuration,
    formatter: Formatter,
    suppressed: HashSet<String>,
    /// Fixed header time; the clock is read when unset
    timestamp: Option<DateTime<Local>>,
}

impl MarlinPost {
    pub fn new(config: Configuration) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            formatter: config.formatter(),
            suppressed: config.effective_suppressed().into_iter().collect(),
            config,
            timestamp: None,
        })
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    fn comments(&self) -> bool {
        self.config.output_comments
    }

    fn modal_options(&self) -> ModalOptions {
        ModalOptions {
            modal: self.config.modal,
            suppress_duplicates: self.config.suppress_duplicates,
        }
    }

    fn write_header(&self, st: &mut EmitterState) {
        let now = self.timestamp.unwrap_or_else(Local::now);
        st.output
            .emit_comment(&format!("Exported by {}", self.config.exporter));
        st.output
            .emit_comment(&format!("Post Processor: {}", self.config.postprocessor));
        st.output
            .emit(&format!("(Output Time:{})", now.format(TIMESTAMP_FORMAT)));
    }

    /// One top-level operation with its framing
    fn emit_operation(&self, node: &ToolpathNode, st: &mut EmitterState) {
        if !node.is_active() {
            debug!(label = node.label(), "skipping inactive operation");
            return;
        }
        if let ToolpathNode::Decoration { .. } = node {
            debug!(label = node.label(), "not a path, nothing to render");
            return;
        }

        if self.comments() {
            st.output
                .emit_message(&format!("begin operation: {}", node.label()));
            st.output.emit_remark(&format!(
                "machine units: {}",
                self.config.units.velocity_unit()
            ));
        }
        st.output.emit_block(&self.config.pre_operation);

        self.with_coolant(node.coolant(), st, |st| {
            self.render_node(node, st);

            if self.comments() {
                st.output
                    .emit_message(&format!("finish operation: {}", node.label()));
            }
            st.output.emit_block(&self.config.post_operation);
        });
    }

    /// Switch `mode` on around `body` unless it is already running
    fn with_coolant<F>(&self, mode: CoolantMode, st: &mut EmitterState, body: F)
    where
        F: FnOnce(&mut EmitterState),
    {
        let enclosing = st.coolant;
        let on_code = match mode.on_code() {
            Some(code) if mode != enclosing => code,
            _ => return body(st),
        };

        if self.comments() {
            st.output
                .emit_message(&format!("Coolant On:{}", mode.name()));
        }
        st.output.emit(on_code);
        st.coolant = mode;

        body(st);

        if self.comments() {
            st.output
                .emit_message(&format!("Coolant Off:{}", mode.name()));
        }
        st.output.emit("M9");
        st.coolant = enclosing;
        if let Some(code) = enclosing.on_code() {
            if self.comments() {
                st.output
                    .emit_message(&format!("Coolant On:{}", enclosing.name()));
            }
            st.output.emit(code);
        }
    }

    /// Render a node and everything below it
    pub fn render_node(&self, node: &ToolpathNode, st: &mut EmitterState) {
        if !node.is_active() {
            debug!(label = node.label(), "skipping inactive node");
            return;
        }

        match node {
            ToolpathNode::Compound { info, children } => {
                self.with_coolant(node.coolant(), st, |st| {
                    if self.comments() {
                        st.output.emit_comment(&format!("compound: {}", info.label));
                    }
                    for child in children {
                        self.render_node(child, st);
                    }
                });
            }
            ToolpathNode::Leaf { info, commands } => {
                self.with_coolant(node.coolant(), st, |st| {
                    // Every path restates its first coordinates
                    st.modal.reset();
                    if self.comments() {
                        st.output.emit(&format!(";Path({})", info.label));
                    }
                    for cmd in commands {
                        self.render_command(cmd, st);
                    }
                });
            }
            ToolpathNode::Decoration { info } => {
                debug!(label = %info.label, "not a path, nothing to render");
            }
        }
    }

    pub fn render_command(&self, cmd: &Command, st: &mut EmitterState) {
        if cmd.is_comment() && !self.comments() {
            return;
        }

        let visible = st.modal.visible(cmd, self.modal_options());
        let tokens = self.tokens(cmd, &visible);

        // Input values are remembered whatever ends up written
        st.modal.record(cmd);
        st.track(cmd);

        if self.config.translate_drill_cycles {
            if let Some(kind) = DrillCycle::from_name(&cmd.name) {
                self.translate_cycle(kind, cmd, &tokens, st);
                return;
            }
        }

        if let Some(template) = self.config.macros.get(&cmd.name) {
            for line in expand_macro(template, cmd, &self.formatter) {
                st.output.emit(&line);
            }
            return;
        }

        let suppressed = self.suppressed.contains(&cmd.name);
        if let Some(line) = render_line(&tokens, suppressed) {
            st.output.emit(&line);
        }
    }

    fn tokens(&self, cmd: &Command, visible: &Visible) -> Vec<String> {
        let name = visible.name.then(|| cmd.name.clone());
        let params = visible.params.iter().filter_map(|&letter| {
            cmd.param(letter)
                .map(|value| self.formatter.word(letter, value))
        });
        name.into_iter().chain(params).collect()
    }

    fn translate_cycle(
        &self,
        kind: DrillCycle,
        cmd: &Command,
        tokens: &[String],
        st: &mut EmitterState,
    ) {
        if self.comments() {
            if let Some(original) = render_line(tokens, false) {
                st.output.emit_remark(&original);
            }
        }

        let ctx = CycleContext {
            position: st.position,
            retract_mode: st.retract_mode,
            plane: st.plane,
            dwell_scale: self.config.dwell_scale,
        };

        match cycles::expand(kind, cmd, &ctx) {
            Ok(expansion) => {
                for line in expansion.render(&self.formatter) {
                    st.output.emit(&line);
                }
                // The machine ends up at the retract height, not at the hole bottom
                st.position = expansion.end_position;
            }
            Err(e) => {
                warn!(command = %cmd.name, error = %e, "drill cycle not translated");
                st.output.emit_remark(&format!("drill cycle error: {}", e));
            }
        }
    }
}

impl PostProcessor for MarlinPost {
    fn export(&self, nodes: &[ToolpathNode]) -> String {
        info!(operations = nodes.len(), units = ?self.config.units, "postprocessing");
        let mut st = EmitterState::new(&self.config);

        if self.config.output_header {
            self.write_header(&mut st);
        }

        if self.comments() {
            st.output.emit_message("begin preamble");
        }
        st.output.emit_block(&self.config.preamble);
        st.output.emit(self.config.units.units_code());

        for node in nodes {
            self.emit_operation(node, &mut st);
        }

        if self.comments() {
            st.output.emit_message("begin postamble");
        }
        st.output.emit_block(&self.config.postamble);

        info!(lines = st.output.line_count(), "done postprocessing");
        st.output.into_string()
    }

    fn name(&self) -> &str {
        "Marlin"
    }

    fn supports_canned_cycles(&self) -> bool {
        false
    }
}
