#![deny(warnings)]

//! Core domain vocabulary for the mining EV calculator.
//!
//! This crate defines the fixed resource vocabulary, supply modes, the recipe
//! book and the normalised [`Scenario`] snapshot consumed by the calculators,
//! together with the numeric input normaliser and the probability rule tables.

pub mod input;
pub mod rules;

pub use input::{as_level, clamp01, normalize_number, InputValue};
pub use rules::{fire_skill_rule, gem_skill_rule, shard_yield, SkillRoll};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default enhancement level of a fresh save.
pub const DEFAULT_ENHANCE_LEVEL: f64 = 15.0;
/// Default gem-skill level (0..=3).
pub const DEFAULT_GEM_SKILL: f64 = 1.0;
/// Default fire-skill level (0..=10).
pub const DEFAULT_FIRE_SKILL: f64 = 10.0;
/// Default stamina spent per mining action.
pub const DEFAULT_STAMINA_PER_ACTION: f64 = 10.0;
/// Default number of shards refined into one ore.
pub const DEFAULT_SHARDS_PER_UNIT: f64 = 16.0;
/// Default marketplace sell fee (5%).
pub const DEFAULT_FEE_RATE: f64 = 0.05;

/// Errors raised when parsing the fixed vocabularies from text.
#[derive(Debug, Error, PartialEq)]
pub enum KeyError {
    #[error("unknown resource key: {0}")]
    UnknownResource(String),
    #[error("unknown supply mode: {0}")]
    UnknownSupplyMode(String),
}

/// Every tradeable resource known to the calculator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKey {
    /// Refined from shards; the derived unit of a mining action.
    Ore,
    /// Secondary drop rolled by the gem skill.
    Gem,
    /// Bought fuel used by some recipes.
    Coal,
    Ingot,
    Ring,
    Pickaxe,
    Crown,
}

impl ResourceKey {
    pub const ALL: [ResourceKey; 7] = [
        ResourceKey::Ore,
        ResourceKey::Gem,
        ResourceKey::Coal,
        ResourceKey::Ingot,
        ResourceKey::Ring,
        ResourceKey::Pickaxe,
        ResourceKey::Crown,
    ];

    /// Recipe inputs; everything else is a finished good.
    pub const RAW: [ResourceKey; 3] = [ResourceKey::Ore, ResourceKey::Gem, ResourceKey::Coal];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKey::Ore => "ore",
            ResourceKey::Gem => "gem",
            ResourceKey::Coal => "coal",
            ResourceKey::Ingot => "ingot",
            ResourceKey::Ring => "ring",
            ResourceKey::Pickaxe => "pickaxe",
            ResourceKey::Crown => "crown",
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| KeyError::UnknownResource(s.to_string()))
    }
}

/// How a recipe input is costed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplyMode {
    /// Already in the inventory; free.
    Owned,
    /// Purchased at the market rate (no fee on purchases).
    Buy,
    /// Mined by the player; costs the after-fee sale that is forgone.
    #[default]
    Opportunity,
}

impl SupplyMode {
    pub const ALL: [SupplyMode; 3] = [SupplyMode::Owned, SupplyMode::Buy, SupplyMode::Opportunity];

    pub fn as_str(self) -> &'static str {
        match self {
            SupplyMode::Owned => "owned",
            SupplyMode::Buy => "buy",
            SupplyMode::Opportunity => "opportunity",
        }
    }
}

impl fmt::Display for SupplyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupplyMode {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SupplyMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| KeyError::UnknownSupplyMode(s.to_string()))
    }
}

/// A fixed crafting recipe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Recipe {
    /// Stable identifier, also stored in saves as the selected recipe.
    pub id: &'static str,
    /// Finished good; its market rate is the gross sell price.
    pub output: ResourceKey,
    /// Required inputs and quantities.
    pub inputs: &'static [(ResourceKey, u32)],
}

/// The recipe book. Quantities are constants of the game.
pub static RECIPES: [Recipe; 4] = [
    Recipe {
        id: "ingot",
        output: ResourceKey::Ingot,
        inputs: &[(ResourceKey::Ore, 3)],
    },
    Recipe {
        id: "ring",
        output: ResourceKey::Ring,
        inputs: &[(ResourceKey::Ore, 1), (ResourceKey::Gem, 2)],
    },
    Recipe {
        id: "pickaxe",
        output: ResourceKey::Pickaxe,
        inputs: &[(ResourceKey::Ore, 4), (ResourceKey::Coal, 2)],
    },
    Recipe {
        id: "crown",
        output: ResourceKey::Crown,
        inputs: &[
            (ResourceKey::Ore, 5),
            (ResourceKey::Gem, 3),
            (ResourceKey::Coal, 1),
        ],
    },
];

/// Look up a recipe by id.
pub fn find_recipe(id: &str) -> Option<&'static Recipe> {
    RECIPES.iter().find(|r| r.id == id)
}

/// Player skills and equipment after normalisation.
///
/// Levels stay as `f64` so the rule tables can decide what counts as a
/// recognised level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfiguration {
    pub enhancement_level: f64,
    pub gem_skill: f64,
    pub fire_skill: f64,
    pub stamina_per_action: f64,
    pub shards_per_unit: f64,
}

impl Default for PlayerConfiguration {
    fn default() -> Self {
        Self {
            enhancement_level: DEFAULT_ENHANCE_LEVEL,
            gem_skill: DEFAULT_GEM_SKILL,
            fire_skill: DEFAULT_FIRE_SKILL,
            stamina_per_action: DEFAULT_STAMINA_PER_ACTION,
            shards_per_unit: DEFAULT_SHARDS_PER_UNIT,
        }
    }
}

/// Gross market unit prices, one per resource.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketRates(BTreeMap<ResourceKey, f64>);

impl MarketRates {
    /// Default price sheet of a fresh save.
    pub fn reference() -> Self {
        [
            (ResourceKey::Ore, 6000.0),
            (ResourceKey::Gem, 9000.0),
            (ResourceKey::Coal, 800.0),
            (ResourceKey::Ingot, 18000.0),
            (ResourceKey::Ring, 26000.0),
            (ResourceKey::Pickaxe, 27000.0),
            (ResourceKey::Crown, 62000.0),
        ]
        .into_iter()
        .collect()
    }

    /// Unit price for `key`; missing, negative or non-finite rates read as 0.
    pub fn get(&self, key: ResourceKey) -> f64 {
        match self.0.get(&key) {
            Some(r) if r.is_finite() => r.max(0.0),
            _ => 0.0,
        }
    }

    pub fn set(&mut self, key: ResourceKey, rate: f64) {
        self.0.insert(key, rate);
    }
}

impl FromIterator<(ResourceKey, f64)> for MarketRates {
    fn from_iter<I: IntoIterator<Item = (ResourceKey, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Supply mode per recipe input; unset resources are costed as opportunity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplyModes(BTreeMap<ResourceKey, SupplyMode>);

impl SupplyModes {
    /// Ore and gems are mined, coal is bought.
    pub fn reference() -> Self {
        [
            (ResourceKey::Ore, SupplyMode::Opportunity),
            (ResourceKey::Gem, SupplyMode::Opportunity),
            (ResourceKey::Coal, SupplyMode::Buy),
        ]
        .into_iter()
        .collect()
    }

    pub fn mode(&self, key: ResourceKey) -> SupplyMode {
        self.0.get(&key).copied().unwrap_or_default()
    }

    pub fn set(&mut self, key: ResourceKey, mode: SupplyMode) {
        self.0.insert(key, mode);
    }
}

impl FromIterator<(ResourceKey, SupplyMode)> for SupplyModes {
    fn from_iter<I: IntoIterator<Item = (ResourceKey, SupplyMode)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Immutable input snapshot for one round of calculations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub player: PlayerConfiguration,
    pub rates: MarketRates,
    pub supply: SupplyModes,
    /// Proportional sell fee in [0, 1].
    pub fee_rate: f64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            player: PlayerConfiguration::default(),
            rates: MarketRates::reference(),
            supply: SupplyModes::reference(),
            fee_rate: DEFAULT_FEE_RATE,
        }
    }
}
