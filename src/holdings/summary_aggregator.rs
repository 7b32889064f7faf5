//! Pure aggregation over the holding set.
//!
//! `aggregate` recomputes the summary from scratch; `apply_delta` maintains
//! it incrementally for a single changed holding. Both route the totals
//! through the same finalization, so the two are numerically identical for
//! any mutation sequence.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::constants::DECIMAL_PRECISION;
use crate::holdings::holdings_model::{Holding, PortfolioSummary};

const PERCENT: Decimal = dec!(100);

/// Recomputes the portfolio summary from the full holding set. O(n).
pub fn aggregate(holdings: &[Holding]) -> PortfolioSummary {
    let mut total_value = Decimal::ZERO;
    let mut total_investment = Decimal::ZERO;
    let mut day_change = Decimal::ZERO;

    for holding in holdings {
        total_value += holding.current_value;
        total_investment += holding.invested_amount;
        day_change += holding.day_change();
    }

    finalize(total_value, total_investment, day_change)
}

/// Incrementally updates the summary given the old and new value of a single
/// changed holding. `before` is `None` for an add, `after` is `None` for a
/// delete.
pub fn apply_delta(
    summary: &PortfolioSummary,
    before: Option<&Holding>,
    after: Option<&Holding>,
) -> PortfolioSummary {
    let value_of = |h: Option<&Holding>| h.map_or(Decimal::ZERO, |h| h.current_value);
    let invested_of = |h: Option<&Holding>| h.map_or(Decimal::ZERO, |h| h.invested_amount);
    let day_change_of = |h: Option<&Holding>| h.map_or(Decimal::ZERO, |h| h.day_change());

    let total_value = summary.total_value - value_of(before) + value_of(after);
    let total_investment = summary.total_investment - invested_of(before) + invested_of(after);
    let day_change = summary.day_change - day_change_of(before) + day_change_of(after);

    finalize(total_value, total_investment, day_change)
}

/// Derives the percentage metrics from the running totals, guarding the
/// zero-denominator cases.
fn finalize(total_value: Decimal, total_investment: Decimal, day_change: Decimal) -> PortfolioSummary {
    let overall_gain = total_value - total_investment;
    let overall_gain_percent = if total_investment.is_zero() {
        Decimal::ZERO
    } else {
        (overall_gain / total_investment * PERCENT).round_dp(DECIMAL_PRECISION)
    };
    let day_change_percent = if total_value.is_zero() {
        Decimal::ZERO
    } else {
        (day_change / total_value * PERCENT).round_dp(DECIMAL_PRECISION)
    };

    PortfolioSummary {
        total_value,
        total_investment,
        day_change,
        day_change_percent,
        overall_gain,
        overall_gain_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holdings::holdings_model::{Exchange, HoldingInput};
    use crate::holdings::holdings_repository::HoldingRepository;
    use crate::holdings::holdings_model::HoldingPatch;
    use proptest::prelude::*;

    fn holding(id: &str, quantity: Decimal, avg_cost: Decimal, price: Decimal) -> Holding {
        Holding::from_input(
            id.to_string(),
            HoldingInput {
                symbol: format!("SYM{}", id),
                name: format!("Company {}", id),
                exchange: Exchange::Nse,
                quantity,
                avg_cost,
                sector: None,
                current_price: None,
                day_change_percent: None,
            },
            price,
            dec!(1.5),
        )
    }

    #[test]
    fn aggregate_of_empty_set_is_zero() {
        assert_eq!(aggregate(&[]), PortfolioSummary::zero());
    }

    #[test]
    fn aggregate_sums_holdings() {
        let holdings = vec![
            holding("a", dec!(10), dec!(3000), dec!(3200)),
            holding("b", dec!(5), dec!(1000), dec!(900)),
        ];
        let summary = aggregate(&holdings);
        assert_eq!(summary.total_value, dec!(36500));
        assert_eq!(summary.total_investment, dec!(35000));
        assert_eq!(summary.overall_gain, dec!(1500));
        assert_eq!(
            summary.overall_gain_percent,
            (dec!(1500) / dec!(35000) * dec!(100)).round_dp(DECIMAL_PRECISION)
        );
    }

    #[test]
    fn add_then_delete_nets_to_zero() {
        let summary = PortfolioSummary::zero();
        let h = holding("a", dec!(10), dec!(3000), dec!(3200));

        let after_add = apply_delta(&summary, None, Some(&h));
        assert_eq!(after_add.total_value, dec!(32000));
        assert_eq!(after_add.total_investment, dec!(30000));
        assert_eq!(after_add.overall_gain, dec!(2000));
        assert_eq!(after_add.overall_gain_percent.round_dp(2), dec!(6.67));

        let after_delete = apply_delta(&after_add, Some(&h), None);
        assert_eq!(after_delete, PortfolioSummary::zero());
    }

    #[test]
    fn update_delta_matches_full_recompute() {
        let mut repo = HoldingRepository::new();
        repo.add(holding("a", dec!(10), dec!(100), dec!(110))).unwrap();
        repo.add(holding("b", dec!(3), dec!(50), dec!(40))).unwrap();
        let mut summary = aggregate(&repo.list());

        let (before, after) = repo
            .update(
                "a",
                &HoldingPatch {
                    quantity: Some(dec!(20)),
                    ..Default::default()
                },
            )
            .unwrap();
        summary = apply_delta(&summary, Some(&before), Some(&after));

        assert_eq!(summary, aggregate(&repo.list()));
        assert_eq!(after.invested_amount - before.invested_amount, dec!(1000));
        assert_eq!(after.current_value - before.current_value, dec!(1100));
    }

    // Strategy: small positive decimals with two fractional digits
    fn amount() -> impl Strategy<Value = Decimal> {
        (1i64..=500_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add { quantity: Decimal, avg_cost: Decimal, price: Decimal },
        Update { slot: usize, quantity: Decimal },
        Remove { slot: usize },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (amount(), amount(), amount())
                .prop_map(|(quantity, avg_cost, price)| Op::Add { quantity, avg_cost, price }),
            (any::<usize>(), amount()).prop_map(|(slot, quantity)| Op::Update { slot, quantity }),
            any::<usize>().prop_map(|slot| Op::Remove { slot }),
        ]
    }

    proptest! {
        /// For any mutation sequence, the incrementally maintained summary
        /// equals a full recompute over the final holding set.
        #[test]
        fn incremental_summary_equals_full_aggregate(ops in proptest::collection::vec(op(), 1..40)) {
            let mut repo = HoldingRepository::new();
            let mut summary = PortfolioSummary::zero();
            let mut next_id = 0usize;

            for op in ops {
                match op {
                    Op::Add { quantity, avg_cost, price } => {
                        let id = format!("h{}", next_id);
                        next_id += 1;
                        let added = repo.add(holding(&id, quantity, avg_cost, price)).unwrap();
                        summary = apply_delta(&summary, None, Some(&added));
                    }
                    Op::Update { slot, quantity } => {
                        let ids: Vec<String> = repo.list().into_iter().map(|h| h.id).collect();
                        if ids.is_empty() { continue; }
                        let id = &ids[slot % ids.len()];
                        let patch = HoldingPatch { quantity: Some(quantity), ..Default::default() };
                        let (before, after) = repo.update(id, &patch).unwrap();
                        summary = apply_delta(&summary, Some(&before), Some(&after));
                    }
                    Op::Remove { slot } => {
                        let ids: Vec<String> = repo.list().into_iter().map(|h| h.id).collect();
                        if ids.is_empty() { continue; }
                        let id = ids[slot % ids.len()].clone();
                        let removed = repo.remove(&id).unwrap();
                        summary = apply_delta(&summary, Some(&removed), None);
                    }
                }
            }

            prop_assert_eq!(summary, aggregate(&repo.list()));
        }
    }
}
