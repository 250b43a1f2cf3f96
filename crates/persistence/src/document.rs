//! Typed view of the persisted save document.

use crate::PersistenceError;
use mine_core::{
    clamp01, normalize_number, InputValue, MarketRates, PlayerConfiguration, ResourceKey,
    Scenario, SupplyMode, SupplyModes, DEFAULT_ENHANCE_LEVEL, DEFAULT_FEE_RATE,
    DEFAULT_FIRE_SKILL, DEFAULT_GEM_SKILL, DEFAULT_SHARDS_PER_UNIT, DEFAULT_STAMINA_PER_ACTION,
    RECIPES,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Schema version written by this release.
pub const CURRENT_SCHEMA_VERSION: u32 = 4;

/// Editable player fields, kept as typed-in values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerFields {
    #[serde(default)]
    pub enhance_level: Option<InputValue>,
    #[serde(default)]
    pub gem_skill: Option<InputValue>,
    #[serde(default)]
    pub fire_skill: Option<InputValue>,
    #[serde(default)]
    pub stamina_per_action: Option<InputValue>,
    #[serde(default)]
    pub shards_per_unit: Option<InputValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketFields {
    #[serde(default)]
    pub fee_rate: Option<InputValue>,
    /// Unit price per resource key.
    #[serde(default)]
    pub rates: BTreeMap<String, Option<InputValue>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFlags {
    pub show_breakdown: bool,
    pub show_per_stamina: bool,
    pub compact_tables: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftingPrefs {
    pub enabled: bool,
    pub selected_recipe: String,
}

/// The whole persisted document. Rewritten in full on every change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocument {
    pub schema_version: u32,
    pub player: PlayerFields,
    pub market: MarketFields,
    /// Supply mode per raw resource.
    pub supply: BTreeMap<String, String>,
    pub display: DisplayFlags,
    pub crafting: CraftingPrefs,
}

impl Default for SaveDocument {
    fn default() -> Self {
        let rates = MarketRates::reference();
        let supply = SupplyModes::reference();
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            player: PlayerFields {
                enhance_level: Some(DEFAULT_ENHANCE_LEVEL.into()),
                gem_skill: Some(DEFAULT_GEM_SKILL.into()),
                fire_skill: Some(DEFAULT_FIRE_SKILL.into()),
                stamina_per_action: Some(DEFAULT_STAMINA_PER_ACTION.into()),
                shards_per_unit: Some(DEFAULT_SHARDS_PER_UNIT.into()),
            },
            market: MarketFields {
                fee_rate: Some(DEFAULT_FEE_RATE.into()),
                rates: ResourceKey::ALL
                    .into_iter()
                    .map(|k| (k.as_str().to_string(), Some(InputValue::Number(rates.get(k)))))
                    .collect(),
            },
            supply: ResourceKey::RAW
                .into_iter()
                .map(|k| (k.as_str().to_string(), supply.mode(k).as_str().to_string()))
                .collect(),
            display: DisplayFlags {
                show_breakdown: true,
                show_per_stamina: true,
                compact_tables: false,
            },
            crafting: CraftingPrefs {
                enabled: true,
                selected_recipe: RECIPES[0].id.to_string(),
            },
        }
    }
}

impl SaveDocument {
    pub fn to_value(&self) -> Result<Value, PersistenceError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: Value) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Normalise every editable field into a calculation snapshot.
    ///
    /// Unparseable fields fall back to the defaults of a fresh save; the fee
    /// rate is clamped to [0, 1] and unknown resource keys are ignored.
    pub fn scenario(&self) -> Scenario {
        let p = &self.player;
        let player = PlayerConfiguration {
            enhancement_level: normalize_number(p.enhance_level.as_ref(), DEFAULT_ENHANCE_LEVEL),
            gem_skill: normalize_number(p.gem_skill.as_ref(), DEFAULT_GEM_SKILL),
            fire_skill: normalize_number(p.fire_skill.as_ref(), DEFAULT_FIRE_SKILL),
            stamina_per_action: normalize_number(
                p.stamina_per_action.as_ref(),
                DEFAULT_STAMINA_PER_ACTION,
            ),
            shards_per_unit: normalize_number(p.shards_per_unit.as_ref(), DEFAULT_SHARDS_PER_UNIT),
        };

        let reference_rates = MarketRates::reference();
        let rates = ResourceKey::ALL
            .into_iter()
            .map(|k| {
                let raw = self.market.rates.get(k.as_str()).and_then(Option::as_ref);
                (k, normalize_number(raw, reference_rates.get(k)))
            })
            .collect();

        let reference_supply = SupplyModes::reference();
        let supply = ResourceKey::RAW
            .into_iter()
            .map(|k| {
                let mode = self
                    .supply
                    .get(k.as_str())
                    .and_then(|s| s.parse::<SupplyMode>().ok())
                    .unwrap_or_else(|| reference_supply.mode(k));
                (k, mode)
            })
            .collect();

        Scenario {
            player,
            rates,
            supply,
            fee_rate: clamp01(normalize_number(self.market.fee_rate.as_ref(), DEFAULT_FEE_RATE)),
        }
    }
}
