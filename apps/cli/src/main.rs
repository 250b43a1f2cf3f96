#![deny(warnings)]

//! Headless CLI: load a save, optionally overlay a rate feed, and print the
//! mining EV decomposition with one crafting comparison per recipe.

use anyhow::{Context, Result};
use mine_core::Scenario;
use mine_econ::{best_recipe, compare_all, evaluate, CraftComparison, EvBreakdown, Verdict};
use persistence::{
    apply_rate_feed, default_save_path, load_document, save_document, JsonFileStore, SaveDocument,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Args {
    save: String,
    feed: Option<String>,
    write: bool,
    json: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        save: default_save_path().to_string(),
        feed: None,
        write: false,
        json: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--save" => {
                if let Some(path) = it.next() {
                    args.save = path;
                }
            }
            "--feed" => args.feed = it.next(),
            "--write" => args.write = true,
            "--json" => args.json = true,
            _ => {}
        }
    }
    args
}

/// Read a YAML rate feed, e.g. `rates: { ore: 6100 }` and `feeRate: 0.05`.
fn load_feed(path: &str) -> Result<serde_json::Value> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("failed to read rate feed {path}"))?;
    serde_yaml::from_str(&text).with_context(|| format!("failed to parse rate feed {path}"))
}

#[derive(Serialize)]
struct Report<'a> {
    scenario: &'a Scenario,
    ev: &'a EvBreakdown,
    crafting: &'a [CraftComparison],
}

fn print_ev(doc: &SaveDocument, ev: &EvBreakdown) {
    println!(
        "EV | per action: {:.2} | per stamina: {:.2} | smelt chance: {:.1}%",
        ev.total_value_per_action,
        ev.value_per_stamina,
        ev.replacement_probability * 100.0
    );
    if !doc.display.show_breakdown {
        return;
    }
    println!(
        "  shards: {:.4} ore x {:.2} = {:.2}",
        ev.normal_units_per_action, ev.unit_net_price, ev.normal_value_per_action
    );
    println!(
        "  smelt:  {:.4} ore x {:.2} = {:.2}",
        ev.replacement_units_per_action, ev.unit_net_price, ev.replacement_value_per_action
    );
    println!(
        "  gems:   {:.4} gem x {:.2} = {:.2}",
        ev.secondary_units_per_action, ev.secondary_net_price, ev.secondary_value_per_action
    );
    if doc.display.show_per_stamina {
        println!(
            "  stamina/action: {} | shards/ore: {}",
            ev.stamina_per_action, ev.shards_per_unit
        );
    }
}

fn print_crafting(doc: &SaveDocument, comparisons: &[CraftComparison]) {
    for c in comparisons {
        let verdict = match c.verdict {
            Verdict::Craft => "craft",
            Verdict::SellRaw => "sell raw",
        };
        if doc.display.compact_tables {
            println!("{}: {:+.2} ({})", c.recipe, c.delta, verdict);
            continue;
        }
        println!(
            "CRAFT {} | revenue: {:.2} | cost: {:.2} (buy {:.2}, opportunity {:.2}) | profit: {:.2} | sell raw: {:.2} | delta: {:+.2} | net gain: {:+.2} | {}",
            c.recipe,
            c.revenue,
            c.total_cost,
            c.cost_by_mode.buy,
            c.cost_by_mode.opportunity,
            c.profit,
            c.sell_raw_revenue,
            c.delta,
            c.net_gain,
            verdict
        );
    }
    if let Some(best) = best_recipe(comparisons) {
        println!("Best recipe: {} ({:+.2})", best.recipe, best.delta);
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    info!(?args, "starting CLI");

    let store = JsonFileStore::new(&args.save);
    let mut doc = load_document(&store)?;

    if let Some(feed_path) = &args.feed {
        let feed = load_feed(feed_path)?;
        let merged = apply_rate_feed(&doc.to_value()?, &feed);
        doc = SaveDocument::from_value(merged).context("rate feed produced an invalid save")?;
        info!(feed = %feed_path, "applied rate feed");
    }
    if args.write {
        save_document(&store, &doc)?;
    }

    let scenario = doc.scenario();
    let ev = evaluate(&scenario);
    let comparisons = if doc.crafting.enabled {
        compare_all(&scenario)
    } else {
        Vec::new()
    };

    if args.json {
        let report = Report {
            scenario: &scenario,
            ev: &ev,
            crafting: &comparisons,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_ev(&doc, &ev);
    print_crafting(&doc, &comparisons);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mine_core::ResourceKey;
    use std::path::PathBuf;

    #[test]
    fn sample_feed_overlays_rates() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/feeds/sample.yaml");
        let feed = load_feed(path.to_str().unwrap()).unwrap();
        let doc = SaveDocument::default();
        let merged = apply_rate_feed(&doc.to_value().unwrap(), &feed);
        let scenario = SaveDocument::from_value(merged).unwrap().scenario();
        assert_eq!(scenario.rates.get(ResourceKey::Ore), 6100.0);
        assert_eq!(scenario.rates.get(ResourceKey::Ingot), 18500.0);
        assert_eq!(scenario.rates.get(ResourceKey::Crown), 62000.0);
        assert_eq!(scenario.fee_rate, 0.05);
    }

    #[test]
    fn report_serializes() {
        let scenario = Scenario::default();
        let ev = evaluate(&scenario);
        let crafting = compare_all(&scenario);
        let report = Report {
            scenario: &scenario,
            ev: &ev,
            crafting: &crafting,
        };
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["crafting"].as_array().unwrap().len(), 4);
        assert!(v["ev"]["total_value_per_action"].is_number());
        assert_eq!(v["crafting"][0]["recipe"], "ingot");
        assert_eq!(v["crafting"][0]["verdict"], "sell_raw");
    }
}
