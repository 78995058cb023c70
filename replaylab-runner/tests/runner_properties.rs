//! Property tests for runner-level invariants.
//!
//! Uses proptest to verify, over random synthetic series:
//! 1. Drawdown is never positive and never below -100%
//! 2. Trade counts partition the ledger
//! 3. Re-running an identical config yields an identical report

use proptest::prelude::*;
use replaylab_core::strategy::BuiltinHost;
use replaylab_runner::metrics::max_drawdown;
use replaylab_runner::{run_from_config, BacktestConfig, DataSection};

fn config(class: &str, seed: u64, bars: usize, volatility: f64) -> BacktestConfig {
    let mut config = BacktestConfig::from_toml(&format!(
        "[backtest]\nsymbol = \"PROP\"\n\n[strategy]\nclass = \"{class}\"\n"
    ))
    .unwrap();
    config.data = DataSection::Synthetic {
        seed,
        bars,
        volatility: Some(volatility),
    };
    config
}

fn arb_class() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("MACrossoverStrategy"),
        Just("RSIMeanReversionStrategy"),
        Just("MACDMomentumStrategy"),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn drawdown_is_bounded(curve in prop::collection::vec(1.0..1_000.0_f64, 0..100)) {
        let dd = max_drawdown(&curve);
        prop_assert!(dd <= 0.0);
        prop_assert!(dd > -1.0);
    }

    #[test]
    fn trade_counts_partition_the_ledger(
        class in arb_class(),
        seed in 0u64..1_000,
        bars in 40usize..200,
        volatility in 0.005..0.05_f64,
    ) {
        let host = BuiltinHost::with_builtins();
        let result = run_from_config(&config(class, seed, bars, volatility), &host)
            .unwrap()
            .result;
        prop_assert_eq!(result.total_trades, result.trades.len());
        prop_assert_eq!(result.total_trades, result.winning_trades + result.losing_trades);
        prop_assert_eq!(result.equity_curve.len(), bars + 1);
        prop_assert!(result.metrics.max_drawdown <= 0.0);
    }

    #[test]
    fn identical_configs_give_identical_reports(
        class in arb_class(),
        seed in 0u64..1_000,
    ) {
        let host = BuiltinHost::with_builtins();
        let config = config(class, seed, 120, 0.03);
        let first = run_from_config(&config, &host).unwrap();
        let second = run_from_config(&config, &host).unwrap();
        prop_assert_eq!(first, second);
    }
}
