//! Running state of one export

use super::modal::ModalState;
use crate::codegen::GCodeOutput;
use crate::config::Configuration;
use crate::toolpath::{Command, CoolantMode};

/// Last known machine position; `None` until a move names the axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// Take over the axes a motion command names
    pub fn update(&mut self, cmd: &Command) {
        if let Some(x) = cmd.param('X') {
            self.x = Some(x);
        }
        if let Some(y) = cmd.param('Y') {
            self.y = Some(y);
        }
        if let Some(z) = cmd.param('Z') {
            self.z = Some(z);
        }
    }
}

/// Height a drill returns to once the hole is done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetractMode {
    /// G98: back to the Z the cycle started from
    #[default]
    InitialZ,
    /// G99: stay at the R plane
    RPlane,
}

impl RetractMode {
    pub fn from_command(name: &str) -> Option<Self> {
        match name {
            "G98" => Some(RetractMode::InitialZ),
            "G99" => Some(RetractMode::RPlane),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Plane {
    #[default]
    XY, // G17
    ZX, // G18
    YZ, // G19
}

impl Plane {
    pub fn from_command(name: &str) -> Option<Self> {
        match name {
            "G17" => Some(Plane::XY),
            "G18" => Some(Plane::ZX),
            "G19" => Some(Plane::YZ),
            _ => None,
        }
    }
}

impl std::fmt::Display for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Plane::XY => "G17",
            Plane::ZX => "G18",
            Plane::YZ => "G19",
        };
        write!(f, "{}", code)
    }
}

/// Everything the renderer remembers between commands
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterState {
    pub modal: ModalState,
    pub position: Position,
    pub retract_mode: RetractMode,
    pub plane: Plane,
    /// Coolant currently switched on
    pub coolant: CoolantMode,
    pub output: GCodeOutput,
}

impl EmitterState {
    pub fn new(config: &Configuration) -> Self {
        Self {
            modal: ModalState::new(),
            position: Position::default(),
            retract_mode: RetractMode::default(),
            plane: Plane::default(),
            coolant: CoolantMode::None,
            output: GCodeOutput::from_config(config),
        }
    }

    /// Follow position and modal groups through a command
    pub fn track(&mut self, cmd: &Command) {
        if cmd.is_motion() {
            self.position.update(cmd);
        }
        if let Some(mode) = RetractMode::from_command(&cmd.name) {
            self.retract_mode = mode;
        }
        if let Some(plane) = Plane::from_command(&cmd.name) {
            self.plane = plane;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_follows_motion_only() {
        let mut state = EmitterState::new(&Configuration::default());
        state.track(&Command::new("G0").with_param('X', 4.0).with_param('Z', 10.0));
        state.track(&Command::new("G81").with_param('Z', -5.0));
        assert_eq!(state.position.x, Some(4.0));
        assert_eq!(state.position.y, None);
        assert_eq!(state.position.z, Some(10.0));
    }

    #[test]
    fn test_modal_groups() {
        let mut state = EmitterState::new(&Configuration::default());
        assert_eq!(state.retract_mode, RetractMode::InitialZ);
        state.track(&Command::new("G99"));
        state.track(&Command::new("G18"));
        assert_eq!(state.retract_mode, RetractMode::RPlane);
        assert_eq!(state.plane, Plane::ZX);
        assert_eq!(state.plane.to_string(), "G18");
    }
}
