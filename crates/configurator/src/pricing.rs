use carkeeper_core::Money;

/// Configuration price rule.
///
/// `total = base_price + color_delta + sum(option_prices)`. Amounts are
/// integer minor units, so the result does not depend on option order.
#[derive(Debug, Default, Clone, Copy)]
pub struct PriceCalculator;

impl PriceCalculator {
    pub fn compute(base_price: Money, color_delta: Money, option_prices: &[Money]) -> Money {
        base_price + color_delta + option_prices.iter().sum::<Money>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sums_base_color_and_options() {
        let total = PriceCalculator::compute(
            Money::new(30_000),
            Money::new(500),
            &[Money::new(1_000), Money::new(200)],
        );
        assert_eq!(total, Money::new(31_700));
    }

    #[test]
    fn no_options_is_base_plus_color() {
        assert_eq!(
            PriceCalculator::compute(Money::new(20_000), Money::new(-250), &[]),
            Money::new(19_750)
        );
    }

    proptest! {
        #[test]
        fn option_order_does_not_change_total(
            base in 0i64..10_000_000,
            delta in -100_000i64..100_000,
            options in prop::collection::vec(0i64..1_000_000, 0..12),
            seed in any::<u64>(),
        ) {
            let prices: Vec<Money> = options.iter().copied().map(Money::new).collect();

            let mut shuffled = prices.clone();
            // Deterministic Fisher-Yates driven by the generated seed.
            let mut state = seed;
            for i in (1..shuffled.len()).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }

            let mut reversed = prices.clone();
            reversed.reverse();

            let base = Money::new(base);
            let delta = Money::new(delta);
            let expected = PriceCalculator::compute(base, delta, &prices);
            prop_assert_eq!(PriceCalculator::compute(base, delta, &shuffled), expected);
            prop_assert_eq!(PriceCalculator::compute(base, delta, &reversed), expected);
        }
    }
}
