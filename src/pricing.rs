//! Aggregation of recorded trades into per-rarity price summaries.
//!
//! A "price" here is the going rate observed in completed trades: for every
//! rarity tier a pet was given away at, the summary totals what traders
//! received in return. Pure functions over already-fetched trades.

use crate::models::{Rarity, Trade};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    pub pet_name: String,
    pub days: u32,
    pub total_trades: usize,
    pub by_rarity: BTreeMap<Rarity, RarityPrice>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RarityPrice {
    pub trade_count: usize,
    /// Rendered going rate, e.g. `"5x Bramble (Mythic) + 2x Luma (Legendary)"`.
    pub price_text: String,
}

/// Summarizes trades where `pet_name` was given away, grouped by the rarity
/// tier it was given at.
pub fn summarize_prices(pet_name: &str, days: u32, trades: &[Trade]) -> PriceSummary {
    let mut grouped: BTreeMap<Rarity, Vec<&Trade>> = BTreeMap::new();
    for trade in trades {
        grouped.entry(trade.gave_rarity).or_default().push(trade);
    }

    let by_rarity = grouped
        .into_iter()
        .map(|(rarity, group)| {
            (
                rarity,
                RarityPrice {
                    trade_count: group.len(),
                    price_text: going_rate(&group),
                },
            )
        })
        .collect();

    PriceSummary {
        pet_name: pet_name.to_string(),
        days,
        total_trades: trades.len(),
        by_rarity,
    }
}

/// Totals what was received across a group of trades and renders it as
/// `"<qty>x <pet> (<rarity>)"` terms joined with `" + "`, alphabetically.
fn going_rate(trades: &[&Trade]) -> String {
    if trades.is_empty() {
        return "No data".to_string();
    }

    let mut received_totals: BTreeMap<String, u64> = BTreeMap::new();
    for trade in trades {
        let key = format!("{} ({})", trade.received_pet, trade.received_rarity);
        *received_totals.entry(key).or_insert(0) += u64::from(trade.received_qty);
    }

    received_totals
        .into_iter()
        .map(|(key, qty)| format!("{}x {}", qty, key))
        .collect::<Vec<_>>()
        .join(" + ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn trade(
        gave_rarity: Rarity,
        received_pet: &str,
        received_qty: u32,
        received_rarity: Rarity,
    ) -> Trade {
        Trade {
            id: 0,
            user_id: 1,
            gave_pet: "Aurelia".to_string(),
            gave_qty: 1,
            gave_rarity,
            received_pet: received_pet.to_string(),
            received_qty,
            received_rarity,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_groups_by_gave_rarity() {
        let trades = vec![
            trade(Rarity::Legendary, "Bramble", 5, Rarity::Mythic),
            trade(Rarity::Legendary, "Bramble", 3, Rarity::Mythic),
            trade(Rarity::Mythic, "Luma", 2, Rarity::Legendary),
        ];

        let summary = summarize_prices("Aurelia", 30, &trades);
        assert_eq!(summary.pet_name, "Aurelia");
        assert_eq!(summary.days, 30);
        assert_eq!(summary.total_trades, 3);
        assert_eq!(summary.by_rarity.len(), 2);

        let legendary = &summary.by_rarity[&Rarity::Legendary];
        assert_eq!(legendary.trade_count, 2);
        // Same received pet/rarity pairs are totalled, not listed twice.
        assert_eq!(legendary.price_text, "8x Bramble (Mythic)");

        let mythic = &summary.by_rarity[&Rarity::Mythic];
        assert_eq!(mythic.trade_count, 1);
        assert_eq!(mythic.price_text, "2x Luma (Legendary)");
    }

    #[test]
    fn test_going_rate_joins_distinct_terms() {
        let trades = vec![
            trade(Rarity::Legendary, "Bramble", 5, Rarity::Mythic),
            trade(Rarity::Legendary, "Luma", 2, Rarity::Legendary),
        ];
        let summary = summarize_prices("Aurelia", 7, &trades);
        assert_eq!(
            summary.by_rarity[&Rarity::Legendary].price_text,
            "5x Bramble (Mythic) + 2x Luma (Legendary)"
        );
    }

    #[test]
    fn test_summary_of_no_trades() {
        let summary = summarize_prices("Aurelia", 30, &[]);
        assert_eq!(summary.total_trades, 0);
        assert!(summary.by_rarity.is_empty());
    }
}
