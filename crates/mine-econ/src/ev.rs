//! Expected value of a single mining action.

use crate::net_price;
use mine_core::{clamp01, fire_skill_rule, gem_skill_rule, shard_yield, ResourceKey, Scenario};
use serde::Serialize;
use tracing::trace;

/// Inputs of the EV calculation, already normalised by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct EvInputs {
    pub stamina_per_action: f64,
    /// Shards gathered by a normal action.
    pub base_shard_yield: f64,
    /// Shards refined into one ore.
    pub shards_per_unit: f64,
    /// Gross market price of one ore.
    pub unit_gross_price: f64,
    pub secondary_drop_probability: f64,
    pub secondary_drop_count: f64,
    pub secondary_gross_price: f64,
    /// Chance that the action smelts a whole ore instead of yielding shards.
    pub replacement_probability: f64,
    /// Sell fee in [0, 1]; taken as given.
    pub fee_rate: f64,
}

/// Decomposition of the expected value of one action.
///
/// Both yield paths and every monetary sub-total are kept so a report can
/// show where the value comes from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvBreakdown {
    pub replacement_probability: f64,
    pub stamina_per_action: f64,
    pub shards_per_unit: f64,
    pub unit_net_price: f64,
    pub secondary_net_price: f64,
    /// Ore per action from shards, weighted by `1 - p`.
    pub normal_units_per_action: f64,
    /// Ore per action from the smelt, `p * 1`.
    pub replacement_units_per_action: f64,
    pub total_units_per_action: f64,
    pub normal_value_per_action: f64,
    pub replacement_value_per_action: f64,
    /// Ore value from both paths.
    pub unit_value_per_action: f64,
    pub secondary_units_per_action: f64,
    pub secondary_value_per_action: f64,
    pub total_value_per_action: f64,
    pub value_per_stamina: f64,
}

fn floor_one(x: f64) -> f64 {
    if x.is_finite() {
        x.max(1.0)
    } else {
        1.0
    }
}

/// Compute the EV breakdown.
///
/// The smelt substitutes for the shard yield of that action, so the normal
/// path is weighted by `1 - p`. The gem drop is rolled independently and does
/// not depend on `p`.
pub fn ev_breakdown(inputs: &EvInputs) -> EvBreakdown {
    let stamina = floor_one(inputs.stamina_per_action);
    let shards_per_unit = floor_one(inputs.shards_per_unit);
    let p = clamp01(inputs.replacement_probability);

    let unit_net = net_price(inputs.unit_gross_price, inputs.fee_rate);
    let secondary_net = net_price(inputs.secondary_gross_price, inputs.fee_rate);

    let base_units = inputs.base_shard_yield.max(0.0) / shards_per_unit;
    let normal_units = (1.0 - p) * base_units;
    let replacement_units = p * 1.0;

    let normal_value = normal_units * unit_net;
    let replacement_value = replacement_units * unit_net;

    let secondary_units =
        clamp01(inputs.secondary_drop_probability) * inputs.secondary_drop_count.max(0.0);
    let secondary_value = secondary_units * secondary_net;

    let total = normal_value + replacement_value + secondary_value;

    EvBreakdown {
        replacement_probability: p,
        stamina_per_action: stamina,
        shards_per_unit,
        unit_net_price: unit_net,
        secondary_net_price: secondary_net,
        normal_units_per_action: normal_units,
        replacement_units_per_action: replacement_units,
        total_units_per_action: normal_units + replacement_units,
        normal_value_per_action: normal_value,
        replacement_value_per_action: replacement_value,
        unit_value_per_action: normal_value + replacement_value,
        secondary_units_per_action: secondary_units,
        secondary_value_per_action: secondary_value,
        total_value_per_action: total,
        value_per_stamina: total / stamina,
    }
}

/// Resolve the rule tables and rates of a scenario and compute its EV.
pub fn evaluate(scenario: &Scenario) -> EvBreakdown {
    let player = &scenario.player;
    let gem = gem_skill_rule(player.gem_skill);
    let fire = fire_skill_rule(player.fire_skill);
    let inputs = EvInputs {
        stamina_per_action: player.stamina_per_action,
        base_shard_yield: f64::from(shard_yield(player.enhancement_level)),
        shards_per_unit: player.shards_per_unit,
        unit_gross_price: scenario.rates.get(ResourceKey::Ore),
        secondary_drop_probability: gem.probability,
        secondary_drop_count: gem.count,
        secondary_gross_price: scenario.rates.get(ResourceKey::Gem),
        replacement_probability: fire.probability,
        fee_rate: scenario.fee_rate,
    };
    trace!(?inputs, "evaluating mining action");
    ev_breakdown(&inputs)
}
