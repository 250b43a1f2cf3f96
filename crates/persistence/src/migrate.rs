//! Schema migrations for save documents.
//!
//! A stored document is first deep-merged over the current defaults, then
//! every step newer than its `schemaVersion` is applied in order. A final
//! repair pass resets mistyped sections field by field, so the result always
//! decodes as a [`crate::SaveDocument`]. Steps are idempotent, so running the
//! chain on a current document changes nothing.

use crate::merge::deep_merge;
use mine_core::{find_recipe, ResourceKey, SupplyMode, RECIPES};
use serde_json::{Map, Value};
use tracing::debug;

/// Key holding the schema version at the document root.
pub const SCHEMA_VERSION_KEY: &str = "schemaVersion";

/// A JSON object at some level of a save document.
pub type Document = Map<String, Value>;

/// One upgrade `from -> from + 1`.
#[derive(Clone, Copy)]
pub struct Migration {
    pub from: u32,
    pub name: &'static str,
    /// Patches the merged document; the second argument is the default document root.
    pub apply: fn(&mut Document, &Document),
}

/// The upgrade chain, ordered by `from`.
pub const MIGRATIONS: [Migration; 4] = [
    Migration {
        from: 0,
        name: "ensure_display_flags",
        apply: ensure_display_flags,
    },
    Migration {
        from: 1,
        name: "unify_legacy_prices",
        apply: unify_legacy_prices,
    },
    Migration {
        from: 2,
        name: "introduce_supply_modes",
        apply: introduce_supply_modes,
    },
    Migration {
        from: 3,
        name: "ensure_crafting_container",
        apply: ensure_crafting_container,
    },
];

/// Alias preference when folding a legacy `{buy, sell}` price into one rate.
const LEGACY_PRICE_ALIASES: [&str; 4] = ["sell", "sellPrice", "price", "buy"];

/// Schema version of a document; absent, negative or non-numeric reads as 0.
pub fn schema_version(doc: &Value) -> u32 {
    doc.get(SCHEMA_VERSION_KEY)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.trunc().min(f64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

/// Bring `raw` up to the schema of `defaults`.
///
/// Anything that is not a JSON object is treated as an empty document. The
/// result always carries the defaults' schema version.
pub fn migrate(raw: &Value, defaults: &Value) -> Value {
    let empty = Value::Object(Map::new());
    let raw = if raw.is_object() { raw } else { &empty };
    let from = schema_version(raw);
    let target = schema_version(defaults);

    let no_defaults = Map::new();
    let default_root = defaults.as_object().unwrap_or(&no_defaults);

    let mut merged = deep_merge(defaults, raw);
    if let Value::Object(doc) = &mut merged {
        for step in MIGRATIONS
            .iter()
            .filter(|m| m.from < target && from < m.from + 1)
        {
            debug!(step = step.name, from = step.from, "applying save migration");
            (step.apply)(doc, default_root);
        }
        repair_sections(doc, default_root);
        doc.insert(SCHEMA_VERSION_KEY.to_string(), Value::from(target));
    }
    merged
}

/// Make `doc[key]` an object, resetting it to the default (or `{}`) otherwise.
fn object_slot<'a>(doc: &'a mut Document, key: &str, defaults: &Document) -> Option<&'a mut Document> {
    let fallback = defaults
        .get(key)
        .filter(|v| v.is_object())
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    let slot = doc.entry(key).or_insert_with(|| fallback.clone());
    if !slot.is_object() {
        *slot = fallback;
    }
    slot.as_object_mut()
}

fn default_section(defaults: &Document, key: &str) -> Document {
    defaults
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// v0 -> v1: the `display` flag group, with every flag a boolean.
fn ensure_display_flags(doc: &mut Document, defaults: &Document) {
    let default_flags = default_section(defaults, "display");
    let Some(display) = object_slot(doc, "display", defaults) else {
        return;
    };
    for (flag, value) in default_flags {
        if !display.get(&flag).is_some_and(Value::is_boolean) {
            display.insert(flag, value);
        }
    }
}

fn legacy_price(entry: &Value) -> Option<Value> {
    match entry {
        Value::Object(fields) => LEGACY_PRICE_ALIASES
            .iter()
            .filter_map(|alias| fields.get(*alias))
            .find(|v| v.is_number() || v.is_string())
            .cloned(),
        Value::Number(_) | Value::String(_) => Some(entry.clone()),
        _ => None,
    }
}

/// v1 -> v2: fold `market.prices.<key>` into the single `market.rates.<key>`.
fn unify_legacy_prices(doc: &mut Document, defaults: &Document) {
    let default_market = default_section(defaults, "market");
    let Some(market) = object_slot(doc, "market", defaults) else {
        return;
    };
    let legacy = market.remove("prices");
    let Some(rates) = object_slot(market, "rates", &default_market) else {
        return;
    };
    if let Some(Value::Object(prices)) = legacy {
        for (key, entry) in &prices {
            if let Some(rate) = legacy_price(entry) {
                rates.insert(key.clone(), rate);
            }
        }
    }
}

/// v2 -> v3: per-resource supply modes replace the `ownedInputs` checkboxes.
fn introduce_supply_modes(doc: &mut Document, defaults: &Document) {
    if let Some(Value::Object(owned)) = doc.remove("ownedInputs") {
        if let Some(supply) = object_slot(doc, "supply", defaults) {
            for (key, flag) in owned {
                if flag.as_bool() == Some(true) && key.parse::<ResourceKey>().is_ok() {
                    supply.insert(key, Value::from(SupplyMode::Owned.as_str()));
                }
            }
        }
    }
    ensure_supply_modes(doc, defaults);
}

/// Every supply entry is a known mode; missing raw resources get the default.
fn ensure_supply_modes(doc: &mut Document, defaults: &Document) {
    let default_supply = default_section(defaults, "supply");
    let Some(supply) = object_slot(doc, "supply", defaults) else {
        return;
    };
    for (key, value) in supply.iter_mut() {
        let valid = value
            .as_str()
            .is_some_and(|s| s.parse::<SupplyMode>().is_ok());
        if !valid {
            *value = default_supply
                .get(key)
                .cloned()
                .unwrap_or_else(|| Value::from(SupplyMode::default().as_str()));
        }
    }
    for (key, value) in default_supply {
        supply.entry(key).or_insert(value);
    }
}

/// v3 -> v4: the crafting panel's container with a known selected recipe.
fn ensure_crafting_container(doc: &mut Document, defaults: &Document) {
    let default_crafting = default_section(defaults, "crafting");
    let Some(crafting) = object_slot(doc, "crafting", defaults) else {
        return;
    };
    if !crafting.get("enabled").is_some_and(Value::is_boolean) {
        let enabled = default_crafting
            .get("enabled")
            .cloned()
            .unwrap_or(Value::Bool(true));
        crafting.insert("enabled".to_string(), enabled);
    }
    let known = crafting
        .get("selectedRecipe")
        .and_then(Value::as_str)
        .is_some_and(|id| find_recipe(id).is_some());
    if !known {
        let selected = default_crafting
            .get("selectedRecipe")
            .cloned()
            .unwrap_or_else(|| Value::from(RECIPES[0].id));
        crafting.insert("selectedRecipe".to_string(), selected);
    }
}

/// Shape checks for the typed sections, run after the chain whatever the
/// stored version claimed.
fn repair_sections(doc: &mut Document, defaults: &Document) {
    ensure_display_flags(doc, defaults);
    ensure_supply_modes(doc, defaults);
    ensure_crafting_container(doc, defaults);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{SaveDocument, CURRENT_SCHEMA_VERSION};
    use proptest::prelude::*;
    use serde_json::json;

    fn defaults() -> Value {
        SaveDocument::default().to_value().unwrap()
    }

    fn defaults_root() -> Document {
        defaults().as_object().cloned().unwrap()
    }

    fn run_twice(step: fn(&mut Document, &Document), doc: Value) -> (Value, Value) {
        let d = defaults_root();
        let mut once = doc.as_object().cloned().unwrap();
        step(&mut once, &d);
        let mut twice = once.clone();
        step(&mut twice, &d);
        (Value::Object(once), Value::Object(twice))
    }

    #[test]
    fn chain_is_contiguous() {
        for (i, m) in MIGRATIONS.iter().enumerate() {
            assert_eq!(m.from as usize, i);
        }
        assert_eq!(MIGRATIONS.len() as u32, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn empty_document_becomes_defaults() {
        let d = defaults();
        assert_eq!(migrate(&json!({}), &d), d);
        assert_eq!(schema_version(&migrate(&json!({}), &d)), 4);
    }

    #[test]
    fn non_object_raw_is_treated_as_empty() {
        let d = defaults();
        assert_eq!(migrate(&Value::Null, &d), d);
        assert_eq!(migrate(&json!([1, 2]), &d), d);
        assert_eq!(migrate(&json!("save"), &d), d);
    }

    #[test]
    fn schema_version_reading() {
        assert_eq!(schema_version(&json!({})), 0);
        assert_eq!(schema_version(&json!({"schemaVersion": "3"})), 0);
        assert_eq!(schema_version(&json!({"schemaVersion": -2})), 0);
        assert_eq!(schema_version(&json!({"schemaVersion": 2.7})), 2);
        assert_eq!(schema_version(&json!({"schemaVersion": 3})), 3);
    }

    #[test]
    fn legacy_document_is_fully_upgraded() {
        let raw = json!({
            "player": {"enhanceLevel": "13", "fireSkill": 5},
            "market": {
                "feeRate": "0.08",
                "prices": {
                    "ore": {"buy": 5500, "sell": "6100"},
                    "gem": {"price": 8000, "buy": 7000},
                    "coal": 700,
                    "ring": {"note": "n/a"}
                }
            },
            "ownedInputs": {"coal": true, "ore": false, "diamond": true},
            "display": "compact"
        });
        let out = migrate(&raw, &defaults());
        assert_eq!(out["schemaVersion"], json!(4));
        assert_eq!(out["player"]["enhanceLevel"], json!("13"));
        assert_eq!(out["player"]["shardsPerUnit"], json!(16.0));
        assert_eq!(out["market"]["feeRate"], json!("0.08"));
        assert_eq!(out["market"]["rates"]["ore"], json!("6100"));
        assert_eq!(out["market"]["rates"]["gem"], json!(8000));
        assert_eq!(out["market"]["rates"]["coal"], json!(700));
        assert_eq!(out["market"]["rates"]["ring"], json!(26000.0));
        assert!(out["market"].get("prices").is_none());
        assert!(out.get("ownedInputs").is_none());
        assert_eq!(out["supply"]["coal"], json!("owned"));
        assert_eq!(out["supply"]["ore"], json!("opportunity"));
        assert!(out["supply"].get("diamond").is_none());
        assert_eq!(out["display"], defaults()["display"]);
        assert_eq!(out["crafting"], defaults()["crafting"]);
        assert!(SaveDocument::from_value(out).is_ok());
    }

    #[test]
    fn gates_skip_steps_already_applied() {
        let raw = json!({
            "schemaVersion": 2,
            "market": {"prices": {"ore": {"sell": 1}}},
            "ownedInputs": {"ore": true}
        });
        let out = migrate(&raw, &defaults());
        // v1 -> v2 did not run again.
        assert_eq!(out["market"]["prices"], json!({"ore": {"sell": 1}}));
        assert_eq!(out["market"]["rates"]["ore"], json!(6000.0));
        // v2 -> v3 did.
        assert_eq!(out["supply"]["ore"], json!("owned"));
        assert!(out.get("ownedInputs").is_none());
    }

    #[test]
    fn current_document_is_left_alone() {
        let mut raw = defaults();
        raw["display"]["compactTables"] = json!(true);
        raw["supply"]["gem"] = json!("owned");
        raw["market"]["rates"]["ore"] = json!("6400");
        raw["player"]["fireSkill"] = Value::Null;
        let out = migrate(&raw, &defaults());
        assert_eq!(out, raw);
    }

    #[test]
    fn null_section_keeps_defaults_and_user_rates() {
        let raw = json!({"player": null, "market": {"rates": {"ore": 7777}}});
        let out = migrate(&raw, &defaults());
        assert_eq!(out["player"], defaults()["player"]);
        assert_eq!(out["market"]["rates"]["ore"], json!(7777));
        let doc = SaveDocument::from_value(out).unwrap();
        assert_eq!(doc.scenario().rates.get(ResourceKey::Ore), 7777.0);
    }

    #[test]
    fn current_version_with_bad_shapes_is_repaired() {
        let raw = json!({
            "schemaVersion": 4,
            "market": {"rates": {"ore": 7777}, "feeRate": 0.1},
            "supply": {"ore": 5, "gem": "owned"},
            "display": {"showBreakdown": "yes", "compactTables": true},
            "crafting": {"selectedRecipe": 7}
        });
        let out = migrate(&raw, &defaults());
        assert_eq!(out["supply"]["ore"], json!("opportunity"));
        assert_eq!(out["supply"]["gem"], json!("owned"));
        assert_eq!(out["display"]["showBreakdown"], json!(true));
        assert_eq!(out["display"]["compactTables"], json!(true));
        assert_eq!(out["crafting"]["selectedRecipe"], json!("ingot"));
        let doc = SaveDocument::from_value(out).unwrap();
        let s = doc.scenario();
        assert_eq!(s.rates.get(ResourceKey::Ore), 7777.0);
        assert_eq!(s.fee_rate, 0.1);
        assert_eq!(s.supply.mode(ResourceKey::Gem), SupplyMode::Owned);

        let mut flat = defaults();
        flat["display"] = Value::Null;
        flat["crafting"] = json!([]);
        flat["supply"] = json!("buy");
        assert_eq!(migrate(&flat, &defaults()), defaults());
    }

    #[test]
    fn newer_document_is_stamped_with_current_version() {
        let mut raw = defaults();
        raw["schemaVersion"] = json!(9);
        assert_eq!(migrate(&raw, &defaults()), defaults());
    }

    #[test]
    fn display_step_repairs_flags() {
        let (once, twice) = run_twice(
            ensure_display_flags,
            json!({"display": {"showBreakdown": false, "compactTables": "yes", "extra": 1}}),
        );
        assert_eq!(once, twice);
        assert_eq!(
            once["display"],
            json!({"showBreakdown": false, "showPerStamina": true, "compactTables": false, "extra": 1})
        );
        let (once, _) = run_twice(ensure_display_flags, json!({"display": 3}));
        assert_eq!(once["display"], defaults()["display"]);
    }

    #[test]
    fn price_step_prefers_sell_alias() {
        let (once, twice) = run_twice(
            unify_legacy_prices,
            json!({"market": {"prices": {
                "ore": {"buy": 1, "price": 2, "sellPrice": 3, "sell": 4},
                "gem": {"buy": 1, "price": 2, "sellPrice": 3},
                "coal": {"buy": 1, "price": null},
                "ingot": null
            }}}),
        );
        assert_eq!(once, twice);
        let mut expected = defaults()["market"]["rates"].clone();
        expected["ore"] = json!(4);
        expected["gem"] = json!(3);
        expected["coal"] = json!(1);
        assert_eq!(once["market"]["rates"], expected);
        assert!(once["market"].get("prices").is_none());
        let (once, _) = run_twice(unify_legacy_prices, json!({"market": 5}));
        assert_eq!(once["market"], defaults()["market"]);
    }

    #[test]
    fn supply_step_resets_invalid_modes() {
        let (once, twice) = run_twice(
            introduce_supply_modes,
            json!({"supply": {"ore": "rent", "gem": "buy"}, "ownedInputs": {"ore": true}}),
        );
        assert_eq!(once, twice);
        assert_eq!(
            once["supply"],
            json!({"ore": "owned", "gem": "buy", "coal": "buy"})
        );
        let (once, _) = run_twice(introduce_supply_modes, json!({"supply": {"gem": 7}}));
        assert_eq!(once["supply"]["gem"], json!("opportunity"));
    }

    #[test]
    fn crafting_step_fills_container() {
        let (once, twice) = run_twice(
            ensure_crafting_container,
            json!({"crafting": {"enabled": false, "selectedRecipe": "anvil"}}),
        );
        assert_eq!(once, twice);
        assert_eq!(
            once["crafting"],
            json!({"enabled": false, "selectedRecipe": "ingot"})
        );
        let (once, _) = run_twice(ensure_crafting_container, json!({}));
        assert_eq!(once["crafting"], defaults()["crafting"]);
    }

    fn arb_key() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("schemaVersion".to_string()),
            Just("player".to_string()),
            Just("market".to_string()),
            Just("rates".to_string()),
            Just("prices".to_string()),
            Just("supply".to_string()),
            Just("ownedInputs".to_string()),
            Just("display".to_string()),
            Just("crafting".to_string()),
            Just("ore".to_string()),
            Just("sell".to_string()),
            "[a-z]{1,5}",
        ]
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            (0u32..6).prop_map(Value::from),
            (-1.0e6f64..1.0e6).prop_map(Value::from),
            prop_oneof![
                Just("owned".to_string()),
                Just("buy".to_string()),
                "[a-z]{0,6}"
            ]
            .prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 48, 5, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..3).prop_map(Value::from),
                prop::collection::btree_map(arb_key(), inner, 0..5)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn migration_is_idempotent(raw in arb_json()) {
            let d = defaults();
            let once = migrate(&raw, &d);
            let twice = migrate(&once, &d);
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(schema_version(&once), CURRENT_SCHEMA_VERSION);
        }

        #[test]
        fn migrated_documents_always_decode(raw in arb_json()) {
            let out = migrate(&raw, &defaults());
            prop_assert!(SaveDocument::from_value(out).is_ok());
        }

        #[test]
        fn any_version_lands_on_current(v in 0u32..10) {
            let out = migrate(&json!({"schemaVersion": v}), &defaults());
            prop_assert_eq!(out, defaults());
        }
    }
}
