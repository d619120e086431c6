//! Property tests for planning and normalization invariants.
//!
//! Uses proptest to verify:
//! 1. Batch partition — batches concatenate back to the input, every batch but
//!    the last is full, none is empty
//! 2. Normalization idempotence — re-normalizing a clean table changes nothing
//! 3. Normalization ordering — output stamps are strictly increasing
//! 4. Constituents — resolution never yields an empty list

use borsa_core::batch::plan_batches;
use borsa_core::data::{normalize_rows, resolve_constituents, DataError, ScriptedProvider};
use borsa_core::domain::RawRow;
use chrono::NaiveDate;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_tickers() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Z]{1,5}(\\.MI)?", 0..40)
}

fn arb_field() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        8 => (1.0..500.0_f64).prop_map(Some),
        1 => Just(None),
        1 => Just(Some(f64::NAN)),
    ]
}

fn arb_row() -> impl Strategy<Value = RawRow> {
    (
        0..60_i64,
        arb_field(),
        arb_field(),
        arb_field(),
        arb_field(),
        arb_field(),
        prop::option::weighted(0.9, 0..10_000_000_u64),
    )
        .prop_map(|(day, open, high, low, close, adj_close, volume)| RawRow {
            timestamp: (NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                + chrono::Duration::days(day))
            .and_hms_opt(0, 0, 0)
            .unwrap(),
            open,
            high,
            low,
            close,
            adj_close,
            volume,
        })
}

// ── 1. Batch partition ───────────────────────────────────────────────

proptest! {
    #[test]
    fn batches_partition_the_list(tickers in arb_tickers(), size in 1..12_usize) {
        let batches = plan_batches(&tickers, size).unwrap();

        let flat: Vec<String> = batches
            .iter()
            .flat_map(|b| b.tickers().iter().cloned())
            .collect();
        prop_assert_eq!(&flat, &tickers);

        if let Some((last, full)) = batches.split_last() {
            for b in full {
                prop_assert_eq!(b.len(), size);
            }
            prop_assert!(!last.is_empty());
            prop_assert!(last.len() <= size);
        } else {
            prop_assert!(tickers.is_empty());
        }

        prop_assert_eq!(batches.len(), tickers.len().div_ceil(size));
    }
}

// ── 2–3. Normalization ───────────────────────────────────────────────

proptest! {
    #[test]
    fn normalization_is_idempotent(rows in prop::collection::vec(arb_row(), 0..80)) {
        let once = normalize_rows(&rows);
        let back: Vec<RawRow> = once.iter().map(RawRow::from).collect();
        let twice = normalize_rows(&back);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalized_stamps_strictly_increase(rows in prop::collection::vec(arb_row(), 0..80)) {
        let out = normalize_rows(&rows);
        for w in out.windows(2) {
            prop_assert!(w[0].timestamp < w[1].timestamp);
        }
        for r in &out {
            prop_assert!(r.close.is_finite());
        }
    }
}

// ── 4. Constituents ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn resolution_never_empty_when_source_fails(index in "[A-Z.]{0,12}") {
        let provider = ScriptedProvider::synthetic(1)
            .with_constituents_error(DataError::NetworkUnreachable("offline".into()));
        let tickers = resolve_constituents(&index, &provider);
        prop_assert_eq!(tickers.len(), 6);
    }

    #[test]
    fn resolution_never_empty_for_any_member_list(members in prop::collection::vec("[A-Z ]{0,4}", 0..10)) {
        let provider = ScriptedProvider::synthetic(1).with_constituents(members);
        let tickers = resolve_constituents("TEST", &provider);
        prop_assert!(!tickers.is_empty());
    }
}
