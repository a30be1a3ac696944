//! Property tests for the signal core.
//!
//! Uses proptest to verify:
//! 1. Renko bricks are append-only as closes are added
//! 2. Brick counts follow floored whole-brick arithmetic
//! 3. %K stays inside [0, 100] whenever it is defined
//! 4. %K is unchanged when a constant is added to high/low/close
//! 5. `decide` is repeatable
//! 6. The session gate is closed on weekends and outside the session window

use chrono::{Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Weekday};
use nifty_renko_core::calendar::{ist, weekdays_of, StaticSchedule};
use nifty_renko_core::{build_bricks, Bar, Brick, RenkoStochStrategy, SessionGate, StochasticK};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Integer-valued closes keep the brick arithmetic exact.
fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(15_000i64..20_000, 1..80)
        .prop_map(|v| v.into_iter().map(|c| c as f64).collect())
}

fn arb_brick_size() -> impl Strategy<Value = f64> {
    prop::sample::select(vec![5.0, 10.0, 20.0, 25.0, 50.0])
}

/// Sane bars: low <= close <= high, integer-valued.
fn arb_bars() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((15_000i64..20_000, 0i64..100, 0i64..100), 2..60).prop_map(|rows| {
        let base = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        rows.into_iter()
            .enumerate()
            .map(|(i, (close, up, down))| {
                let close = close as f64;
                Bar {
                    date: base + Duration::days(i as i64),
                    open: close,
                    high: close + up as f64,
                    low: close - down as f64,
                    close,
                    volume: 1000,
                }
            })
            .collect()
    })
}

fn trading_gate() -> SessionGate {
    let schedule: StaticSchedule = weekdays_of(2026).collect();
    SessionGate::nse(Box::new(schedule))
}

// ── 1. Append-only bricks ────────────────────────────────────────────

proptest! {
    #[test]
    fn bricks_are_append_only(
        closes in arb_closes(),
        size in arb_brick_size(),
        split in 0usize..80,
    ) {
        let split = split.min(closes.len());
        let prefix = build_bricks(&closes[..split], size).unwrap();
        let full = build_bricks(&closes, size).unwrap();
        prop_assert!(full.len() >= prefix.len());
        prop_assert_eq!(&full[..prefix.len()], &prefix[..]);
    }
}

// ── 2. Brick count arithmetic ────────────────────────────────────────

proptest! {
    #[test]
    fn two_close_brick_count(
        a in 15_000i64..20_000,
        b in 15_000i64..20_000,
        size in prop::sample::select(vec![5i64, 10, 20, 25, 50]),
    ) {
        let bricks = build_bricks(&[a as f64, b as f64], size as f64).unwrap();
        let diff = b - a;
        if diff >= 0 {
            prop_assert_eq!(bricks.len() as i64, diff / size);
            prop_assert!(bricks.iter().all(|x| *x == Brick::Up));
        } else {
            prop_assert_eq!(bricks.len() as i64, (-diff) / size);
            prop_assert!(bricks.iter().all(|x| *x == Brick::Down));
        }
    }
}

// ── 3 & 4. %K bounds and shift invariance ────────────────────────────

proptest! {
    #[test]
    fn stoch_k_bounded(bars in arb_bars(), period in 1usize..20) {
        for k in StochasticK::new(period).unwrap().compute(&bars).into_iter().flatten() {
            prop_assert!((0.0..=100.0).contains(&k), "k out of range: {}", k);
        }
    }

    #[test]
    fn stoch_k_shift_invariant(bars in arb_bars(), shift in -5_000i64..5_000) {
        let shift = shift as f64;
        let shifted: Vec<Bar> = bars
            .iter()
            .map(|b| Bar {
                open: b.open + shift,
                high: b.high + shift,
                low: b.low + shift,
                close: b.close + shift,
                ..b.clone()
            })
            .collect();
        let stoch = StochasticK::new(14).unwrap();
        let before = stoch.compute(&bars);
        let after = stoch.compute(&shifted);
        for (x, y) in before.iter().zip(&after) {
            match (x, y) {
                (Some(x), Some(y)) => prop_assert!((x - y).abs() < 1e-9),
                (None, None) => {}
                _ => prop_assert!(false, "definedness changed: {:?} vs {:?}", x, y),
            }
        }
    }
}

// ── 5. Repeatable decisions ──────────────────────────────────────────

proptest! {
    #[test]
    fn decide_is_repeatable(bars in arb_bars()) {
        let strategy = RenkoStochStrategy::default();
        let at = ist().with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap();
        prop_assert_eq!(strategy.decide(&bars, at), strategy.decide(&bars, at));
    }
}

// ── 6. Session gate ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn weekends_are_closed(week in 0i64..52, sunday in any::<bool>(), secs in 0u32..86_400) {
        // 2026-01-03 is a Saturday
        let date = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap()
            + Duration::days(7 * week + i64::from(sunday));
        prop_assert!(matches!(date.weekday(), Weekday::Sat | Weekday::Sun));
        let now = ist()
            .from_local_datetime(&date.and_hms_opt(secs / 3600, (secs / 60) % 60, secs % 60).unwrap())
            .unwrap();
        prop_assert!(!trading_gate().is_market_open(now));
    }

    #[test]
    fn outside_window_is_closed(
        day in 0i64..365,
        // 09:17:00 = 33_420 s, 15:30:00 = 55_800 s
        secs in prop_oneof![0u32..33_420, 55_801u32..86_400],
    ) {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(day);
        let now = ist()
            .from_local_datetime(&date.and_hms_opt(secs / 3600, (secs / 60) % 60, secs % 60).unwrap())
            .unwrap();
        prop_assert!(!trading_gate().is_market_open(now));
    }

    #[test]
    fn utc_input_matches_ist_input(day in 0i64..365, secs in 0u32..86_400) {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(day);
        let local = ist()
            .from_local_datetime(&date.and_hms_opt(secs / 3600, (secs / 60) % 60, secs % 60).unwrap())
            .unwrap();
        let utc = local.with_timezone(&FixedOffset::east_opt(0).unwrap());
        let mut gate = trading_gate();
        prop_assert_eq!(gate.is_market_open(local), gate.is_market_open(utc));
    }
}
