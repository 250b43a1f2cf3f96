//! Structural merge of save documents.

use mine_core::ResourceKey;
use serde_json::{Map, Value};
use tracing::debug;

/// Fields of `market` that the shared rate feed may overwrite.
pub const FEED_FIELDS: [&str; 2] = ["rates", "feeRate"];

/// Merge `overlay` onto `base`.
///
/// Objects present on both sides are merged key by key so nested fields that
/// only `base` knows about survive. An object slot in `base` is a section of
/// the schema: an overlay that is not an object there is dropped and the base
/// subtree kept. Elsewhere overlay values (scalars, arrays, `null`) replace
/// the base value outright.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(b), Value::Object(o)) => {
            let mut out = b.clone();
            for (key, ov) in o {
                let merged = match b.get(key) {
                    Some(bv) => deep_merge(bv, ov),
                    None => ov.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        (Value::Object(_), ov) => {
            debug!(found = %ov, "ignoring non-object value over an object section");
            base.clone()
        }
        (_, ov) => ov.clone(),
    }
}

/// Overlay a shared rate feed onto the live document's `market` section.
///
/// Only [`FEED_FIELDS`] are taken from the feed, and only known resource keys
/// inside `rates`. No version gating applies.
pub fn apply_rate_feed(doc: &Value, feed: &Value) -> Value {
    let Some(feed) = feed.as_object() else {
        return doc.clone();
    };
    let mut subset = Map::new();
    for (field, value) in feed.iter().filter(|(k, _)| FEED_FIELDS.contains(&k.as_str())) {
        let value = match value {
            Value::Object(rates) if field == "rates" => Value::Object(
                rates
                    .iter()
                    .filter(|(k, _)| {
                        let known = k.parse::<ResourceKey>().is_ok();
                        if !known {
                            debug!(key = %k, "ignoring unknown rate in feed");
                        }
                        known
                    })
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            other => other.clone(),
        };
        subset.insert(field.clone(), value);
    }
    if subset.is_empty() {
        return doc.clone();
    }

    let mut out = doc.clone();
    if let Value::Object(root) = &mut out {
        let market = root
            .get("market")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        root.insert("market".to_string(), deep_merge(&market, &Value::Object(subset)));
    }
    out
}
