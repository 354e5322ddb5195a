//! Difficulty levels 1-10 mapped to engine strength options and search budgets.

use std::time::Duration;

use crate::error::EngineError;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 10;

/// How long a single search may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    pub depth: u32,
    /// `None` means depth-limited only (`go depth D`)
    pub movetime: Option<Duration>,
}

impl SearchBudget {
    pub fn depth_only(depth: u32) -> Self {
        Self { depth, movetime: None }
    }

    /// The `go` command for this budget.
    pub fn go_command(&self) -> String {
        match self.movetime {
            Some(t) => format!("go depth {} movetime {}", self.depth, t.as_millis()),
            None => format!("go depth {}", self.depth),
        }
    }
}

/// Engine configuration for one difficulty level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineProfile {
    pub level: u8,
    pub skill: u8,
    pub elo: u32,
    pub contempt: i32,
    pub budget: SearchBudget,
}

impl EngineProfile {
    /// `setoption` lines written during the handshake, in order.
    pub fn option_commands(&self) -> Vec<String> {
        vec![
            format!("setoption name Skill Level value {}", self.skill),
            "setoption name UCI_LimitStrength value true".to_string(),
            format!("setoption name UCI_Elo value {}", self.elo),
            format!("setoption name Contempt value {}", self.contempt),
        ]
    }
}

// (skill, elo, contempt, depth, movetime_ms)
const LEVELS: [(u8, u32, i32, u32, u64); 10] = [
    (0, 1350, 0, 1, 50),
    (2, 1500, 0, 2, 100),
    (4, 1650, 10, 4, 150),
    (6, 1800, 10, 6, 200),
    (8, 1950, 20, 8, 300),
    (10, 2100, 20, 10, 400),
    (13, 2250, 30, 12, 600),
    (16, 2400, 30, 15, 800),
    (18, 2600, 40, 18, 1000),
    (20, 2850, 50, 22, 1500),
];

/// Look up the profile for `level`. Levels outside 1-10 are rejected.
pub fn configuration_for(level: u8) -> Result<EngineProfile, EngineError> {
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        return Err(EngineError::InvalidDifficulty(level));
    }
    let (skill, elo, contempt, depth, movetime_ms) = LEVELS[usize::from(level - 1)];
    Ok(EngineProfile {
        level,
        skill,
        elo,
        contempt,
        budget: SearchBudget {
            depth,
            movetime: Some(Duration::from_millis(movetime_ms)),
        },
    })
}
