//! Drill cycle expansion
//!
//! Marlin has no canned cycles. G81, G82 and G83 are rewritten into G0/G1
//! moves. Only the XY plane (G17) is supported; any other active plane is
//! reported instead of producing wrong geometry.

use super::state::{Plane, Position, RetractMode};
use crate::toolpath::Command;
use crate::units::Formatter;
use thiserror::Error;

/// Upper bound on pecks per hole
pub const MAX_PECKS: f64 = 10_000.0;

/// Feed words on generated moves carry two decimals
const FEED_DIGITS: usize = 2;

/// Dwell seconds carry three decimals (milliseconds)
const DWELL_DIGITS: usize = 3;

/// Slack when checking whether a peck lands on the hole bottom
const DEPTH_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillCycle {
    Drill,      // G81
    DrillDwell, // G82
    Peck,       // G83
}

impl DrillCycle {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "G81" => Some(DrillCycle::Drill),
            "G82" => Some(DrillCycle::DrillDwell),
            "G83" => Some(DrillCycle::Peck),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CycleError {
    #[error("missing {0} word")]
    MissingParameter(char),

    #[error("{0} is not a finite number")]
    NotFinite(char),

    #[error("R less than Z")]
    RetractBelowDepth,

    #[error("peck step Q must be positive")]
    PeckStep,

    #[error("more than 10000 pecks")]
    TooManyPecks,

    #[error("plane {0} not supported, select G17")]
    UnsupportedPlane(Plane),
}

/// State the expansion reads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleContext {
    pub position: Position,
    pub retract_mode: RetractMode,
    pub plane: Plane,
    pub dwell_scale: f64,
}

/// One primitive move of an expanded cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Move {
    RapidXY(f64, f64),
    RapidZ(f64),
    FeedZ(f64),
    /// Seconds
    Dwell(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub moves: Vec<Move>,
    pub feed: f64,
    pub retract_z: f64,
    /// Where the tool is once the cycle finished
    pub end_position: Position,
}

impl Expansion {
    pub fn render(&self, fmt: &Formatter) -> Vec<String> {
        self.moves
            .iter()
            .map(|m| render_move(m, self.feed, fmt))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Hole {
    x: f64,
    y: f64,
    z: f64,
    r: f64,
    feed: f64,
}

fn required(cmd: &Command, letter: char) -> Result<f64, CycleError> {
    let value = cmd
        .param(letter)
        .ok_or(CycleError::MissingParameter(letter))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CycleError::NotFinite(letter))
    }
}

/// Expand one drill cycle command into primitive moves
pub fn expand(
    kind: DrillCycle,
    cmd: &Command,
    ctx: &CycleContext,
) -> Result<Expansion, CycleError> {
    if ctx.plane != Plane::XY {
        return Err(CycleError::UnsupportedPlane(ctx.plane));
    }

    let hole = Hole {
        x: required(cmd, 'X')?,
        y: required(cmd, 'Y')?,
        z: required(cmd, 'Z')?,
        r: required(cmd, 'R')?,
        feed: required(cmd, 'F')?,
    };

    if hole.r < hole.z {
        return Err(CycleError::RetractBelowDepth);
    }

    let body = match kind {
        DrillCycle::Drill => vec![Move::FeedZ(hole.z)],
        DrillCycle::DrillDwell => {
            let dwell = required(cmd, 'P')?;
            vec![Move::FeedZ(hole.z), Move::Dwell(dwell * ctx.dwell_scale)]
        }
        DrillCycle::Peck => peck_moves(hole.r, hole.z, required(cmd, 'Q')?)?,
    };

    let retract_z = retract_height(ctx, hole.r);

    let mut moves = Vec::with_capacity(body.len() + 4);
    // Never travel below the retract height
    if ctx.position.z.map_or(true, |z| z < retract_z) {
        moves.push(Move::RapidZ(retract_z));
    }
    moves.push(Move::RapidXY(hole.x, hole.y));
    moves.push(Move::RapidZ(hole.r));
    moves.extend(body);
    moves.push(Move::RapidZ(retract_z));

    Ok(Expansion {
        moves,
        feed: hole.feed,
        retract_z,
        end_position: Position::new(hole.x, hole.y, retract_z),
    })
}

/// G98 returns to the starting Z when it is above R, otherwise R
pub fn retract_height(ctx: &CycleContext, r: f64) -> f64 {
    match (ctx.retract_mode, ctx.position.z) {
        (RetractMode::InitialZ, Some(z)) if z > r => z,
        _ => r,
    }
}

/// Peck from R down to Z in steps, clearing chips at R between pecks
pub fn peck_moves(r: f64, z: f64, step: f64) -> Result<Vec<Move>, CycleError> {
    if !step.is_finite() {
        return Err(CycleError::NotFinite('Q'));
    }
    if step <= 0.0 {
        return Err(CycleError::PeckStep);
    }
    if ((r - z) / step).ceil() > MAX_PECKS {
        return Err(CycleError::TooManyPecks);
    }

    let mut moves = Vec::new();
    if r - z <= DEPTH_EPSILON {
        return Ok(moves);
    }

    let chip_clear = step * 0.5;
    let mut peck = 1.0;
    let mut stop = r - step;

    // Shallower than one peck
    if stop < z - DEPTH_EPSILON {
        moves.push(Move::FeedZ(z));
        return Ok(moves);
    }

    loop {
        if (stop - z).abs() <= DEPTH_EPSILON {
            moves.push(Move::FeedZ(z));
            break;
        }
        moves.push(Move::FeedZ(stop));
        moves.push(Move::RapidZ(r));
        moves.push(Move::RapidZ(stop + chip_clear));

        peck += 1.0;
        let next = r - peck * step;
        if next >= z - DEPTH_EPSILON {
            stop = next;
        } else {
            // Less than a full step left
            moves.push(Move::FeedZ(z));
            break;
        }
    }

    Ok(moves)
}

fn render_move(m: &Move, feed: f64, fmt: &Formatter) -> String {
    match *m {
        Move::RapidXY(x, y) => format!("G0 X{} Y{}", fmt.length(x), fmt.length(y)),
        Move::RapidZ(z) => format!("G0 Z{}", fmt.length(z)),
        Move::FeedZ(z) => format!(
            "G1 Z{} F{}",
            fmt.length(z),
            fmt.velocity_with_digits(feed, FEED_DIGITS)
        ),
        // Marlin: P is milliseconds, S is seconds
        Move::Dwell(seconds) => format!("G4 S{}", fmt.plain_with_digits(seconds, DWELL_DIGITS)),
    }
}
