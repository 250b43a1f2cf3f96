//! Crafting versus selling raw materials.

use crate::{fee_fraction, money, net_amount};
use mine_core::{Recipe, ResourceKey, Scenario, SupplyMode, RECIPES};
use rust_decimal::Decimal;
use serde::Serialize;

/// Cost of one unit of input under a supply mode.
///
/// Owned inputs are free, bought inputs cost the market rate (fees only apply
/// to sales) and mined inputs cost the after-fee sale forgone.
pub fn unit_cost(mode: SupplyMode, rate: Decimal, fee: Decimal) -> Decimal {
    match mode {
        SupplyMode::Owned => Decimal::ZERO,
        SupplyMode::Buy => rate.max(Decimal::ZERO),
        SupplyMode::Opportunity => net_amount(rate, fee),
    }
}

/// One recipe input costed under its supply mode.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CostLine {
    pub resource: ResourceKey,
    pub quantity: u32,
    pub mode: SupplyMode,
    pub unit_cost: Decimal,
    pub total: Decimal,
}

/// Acquisition cost split by supply mode.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CostByMode {
    pub owned: Decimal,
    pub buy: Decimal,
    pub opportunity: Decimal,
}

impl CostByMode {
    fn add(&mut self, mode: SupplyMode, amount: Decimal) {
        let slot = match mode {
            SupplyMode::Owned => &mut self.owned,
            SupplyMode::Buy => &mut self.buy,
            SupplyMode::Opportunity => &mut self.opportunity,
        };
        *slot = slot.saturating_add(amount);
    }

    pub fn total(&self) -> Decimal {
        self.owned
            .saturating_add(self.buy)
            .saturating_add(self.opportunity)
    }
}

/// Which way to monetise the inputs of a recipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Craft,
    SellRaw,
}

/// Result of costing one recipe.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CraftComparison {
    pub recipe: &'static str,
    pub output: ResourceKey,
    pub lines: Vec<CostLine>,
    pub cost_by_mode: CostByMode,
    pub total_cost: Decimal,
    /// Sale of the finished good after fee.
    pub revenue: Decimal,
    pub profit: Decimal,
    /// Revenue from selling the non-bought inputs instead of crafting.
    pub sell_raw_revenue: Decimal,
    /// `profit - sell_raw_revenue`; drives the verdict.
    pub delta: Decimal,
    /// `revenue - bought cost - sell_raw_revenue`. Unlike `delta` it charges
    /// the forgone sale of mined inputs once instead of twice.
    pub net_gain: Decimal,
    pub verdict: Verdict,
}

/// Cost a recipe against the scenario's rates, supply modes and fee.
///
/// Crafting is favoured when `delta >= 0`, so ties go to crafting.
pub fn compare_recipe(recipe: &'static Recipe, scenario: &Scenario) -> CraftComparison {
    let fee = fee_fraction(scenario.fee_rate);
    let mut lines = Vec::with_capacity(recipe.inputs.len());
    let mut cost_by_mode = CostByMode::default();
    let mut sell_raw_revenue = Decimal::ZERO;

    for &(resource, quantity) in recipe.inputs {
        let mode = scenario.supply.mode(resource);
        let rate = money(scenario.rates.get(resource));
        let qty = Decimal::from(quantity);
        let unit = unit_cost(mode, rate, fee);
        let total = unit.saturating_mul(qty);
        cost_by_mode.add(mode, total);
        if mode != SupplyMode::Buy {
            let forgone = net_amount(rate, fee).saturating_mul(qty);
            sell_raw_revenue = sell_raw_revenue.saturating_add(forgone);
        }
        lines.push(CostLine {
            resource,
            quantity,
            mode,
            unit_cost: unit,
            total,
        });
    }

    let total_cost = cost_by_mode.total();
    let revenue = net_amount(money(scenario.rates.get(recipe.output)), fee);
    let profit = revenue.saturating_sub(total_cost);
    let delta = profit.saturating_sub(sell_raw_revenue);
    let net_gain = revenue
        .saturating_sub(cost_by_mode.buy)
        .saturating_sub(sell_raw_revenue);
    let verdict = if delta >= Decimal::ZERO {
        Verdict::Craft
    } else {
        Verdict::SellRaw
    };

    CraftComparison {
        recipe: recipe.id,
        output: recipe.output,
        lines,
        cost_by_mode,
        total_cost,
        revenue,
        profit,
        sell_raw_revenue,
        delta,
        net_gain,
        verdict,
    }
}

/// One comparison per recipe, in recipe-book order.
pub fn compare_all(scenario: &Scenario) -> Vec<CraftComparison> {
    RECIPES.iter().map(|r| compare_recipe(r, scenario)).collect()
}

/// The comparison with the largest delta, if any recipe favours crafting.
pub fn best_recipe(comparisons: &[CraftComparison]) -> Option<&CraftComparison> {
    comparisons
        .iter()
        .filter(|c| c.verdict == Verdict::Craft)
        .max_by_key(|c| c.delta)
}
