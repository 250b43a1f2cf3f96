//! Fixed probability tables for mining actions.
//!
//! None of these are formulas: the values are game constants and levels
//! outside a table resolve to a zero-effect entry.

use crate::input::as_level;
use serde::Serialize;

/// Outcome of a skill roll: chance per action and how many units it grants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SkillRoll {
    pub probability: f64,
    pub count: f64,
}

impl SkillRoll {
    pub const NONE: SkillRoll = SkillRoll {
        probability: 0.0,
        count: 0.0,
    };
}

/// Shards gathered per action by pickaxe enhancement level.
pub const SHARD_YIELD_TABLE: [(i64, u32); 7] = [
    (0, 6),
    (5, 7),
    (10, 8),
    (13, 10),
    (15, 12),
    (17, 14),
    (20, 16),
];

/// Shards per action for an enhancement level; 0 when the level is not in the table.
pub fn shard_yield(enhancement_level: f64) -> u32 {
    as_level(enhancement_level)
        .and_then(|lvl| SHARD_YIELD_TABLE.iter().find(|(l, _)| *l == lvl))
        .map(|(_, shards)| *shards)
        .unwrap_or(0)
}

/// Secondary gem drop by gem-skill level (1..=3).
pub fn gem_skill_rule(level: f64) -> SkillRoll {
    match as_level(level) {
        Some(1) => SkillRoll {
            probability: 0.02,
            count: 1.0,
        },
        Some(2) => SkillRoll {
            probability: 0.035,
            count: 1.0,
        },
        Some(3) => SkillRoll {
            probability: 0.05,
            count: 2.0,
        },
        _ => SkillRoll::NONE,
    }
}

/// Fire-skill smelt: with this probability an action yields one whole ore
/// instead of its shards.
///
/// 1% per level up to 9; level 10 jumps to 15%. Levels past 10 keep the cap
/// and fractional levels truncate.
pub fn fire_skill_rule(level: f64) -> SkillRoll {
    if !level.is_finite() || level <= 0.0 {
        return SkillRoll {
            probability: 0.0,
            count: 1.0,
        };
    }
    let lvl = level.trunc();
    let probability = if lvl >= 10.0 { 0.15 } else { lvl / 100.0 };
    SkillRoll {
        probability,
        count: 1.0,
    }
}
