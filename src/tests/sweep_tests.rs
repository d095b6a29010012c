//! tests/sweep_tests.rs - Daily sweep and history points

#[cfg(test)]
mod tests {
    use crate::{
        classify::{run_daily_sweep, ClassificationEngine},
        config::ClassificationParams,
        db::{changelog, ledger, report},
        models::{AddressRecord, Wallet},
        state::AppState,
        tests::common::{addr, day, setup, SZABO_PER_ETHER},
    };
    use chrono::{Duration, NaiveDate};

    async fn wallets(state: &AppState) -> Vec<AddressRecord> {
        let mut rows = report::top_addresses(&state.db_pool, 10_000).await.unwrap();
        rows.sort_by(|a, b| a.address.cmp(&b.address));
        rows
    }

    /// Twenty-five addresses with a mix of quiet, accumulating and draining histories.
    async fn seed_mixed_ledger(state: &AppState, reference: NaiveDate) {
        for i in 1..=25u32 {
            let a = addr(i);
            let balance = i64::from(i) * SZABO_PER_ETHER;
            ledger::upsert_balance(&state.db_pool, &a, balance).await.unwrap();

            if i % 2 == 0 {
                let small = i64::from(i) * SZABO_PER_ETHER / 10;
                changelog::record(&state.db_pool, &a, small, reference - Duration::days(1))
                    .await
                    .unwrap();
            }
            if i % 3 == 0 {
                changelog::record(&state.db_pool, &a, balance, reference - Duration::days(10))
                    .await
                    .unwrap();
            }
            if i % 5 == 0 {
                // Outside both windows
                changelog::record(&state.db_pool, &a, balance, reference - Duration::days(400))
                    .await
                    .unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_history_point_sums_wallets() {
        let (_dir, state) = setup().await;
        let reference = day(2016, 3, 1);

        ledger::upsert_balance(&state.db_pool, &addr(1), 100 * SZABO_PER_ETHER).await.unwrap();
        ledger::upsert_balance(&state.db_pool, &addr(2), 50 * SZABO_PER_ETHER).await.unwrap();
        ledger::upsert_balance(&state.db_pool, &addr(3), 25 * SZABO_PER_ETHER).await.unwrap();
        // Address 2 recently held far less than it holds now
        changelog::record(&state.db_pool, &addr(2), 10 * SZABO_PER_ETHER, reference - Duration::days(1))
            .await
            .unwrap();

        let summary = run_daily_sweep(&state.db_pool, &state.engine, reference, 1000)
            .await
            .unwrap();
        assert_eq!(summary.addresses, 3);
        assert_eq!(summary.long_term, 2);
        assert_eq!(summary.short_term, 1);

        let wallets: Vec<Wallet> = wallets(&state).await.iter().map(|r| r.wallet).collect();
        assert_eq!(wallets, vec![Wallet::LongTerm, Wallet::ShortTerm, Wallet::LongTerm]);

        let point = report::latest_history(&state.db_pool).await.unwrap().unwrap();
        assert_eq!(point.day, reference);
        assert_eq!(point.lth_total, 125.0);
        assert_eq!(point.sth_total, 50.0);
        assert_eq!(summary.history, point);
    }

    #[tokio::test]
    async fn test_empty_ledger_writes_zero_point() {
        let (_dir, state) = setup().await;
        let reference = day(2015, 7, 30);

        let summary = run_daily_sweep(&state.db_pool, &state.engine, reference, 10)
            .await
            .unwrap();
        assert_eq!(summary.addresses, 0);

        let points = report::history_range(&state.db_pool, reference, reference).await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].lth_total, 0.0);
        assert_eq!(points[0].sth_total, 0.0);
    }

    #[tokio::test]
    async fn test_chunk_size_does_not_change_outcome() {
        let reference = day(2016, 3, 1);

        let (_small_dir, small) = setup().await;
        seed_mixed_ledger(&small, reference).await;
        let by_one = run_daily_sweep(&small.db_pool, &small.engine, reference, 1)
            .await
            .unwrap();

        let (_large_dir, large) = setup().await;
        seed_mixed_ledger(&large, reference).await;
        let by_thousand = run_daily_sweep(&large.db_pool, &large.engine, reference, 1000)
            .await
            .unwrap();

        assert_eq!(by_one.addresses, 25);
        assert_eq!(by_one, by_thousand);
        assert_eq!(wallets(&small).await, wallets(&large).await);

        // A chunk size dividing the ledger exactly still visits everyone
        let by_five = run_daily_sweep(&small.db_pool, &small.engine, reference, 5)
            .await
            .unwrap();
        assert_eq!(by_five.addresses, 25);
        assert_eq!(by_five.history, by_one.history);
    }

    #[tokio::test]
    async fn test_sweep_rerun_repairs_partial_state() {
        let (_dir, state) = setup().await;
        let reference = day(2016, 3, 1);
        seed_mixed_ledger(&state, reference).await;

        run_daily_sweep(&state.db_pool, &state.engine, reference, 7).await.unwrap();
        let expected = wallets(&state).await;
        let expected_point = report::latest_history(&state.db_pool).await.unwrap();

        // Leave the ledger as an interrupted sweep might have
        for record in expected.iter().take(10) {
            ledger::set_wallet(&state.db_pool, &record.address, Wallet::LongTerm).await.unwrap();
        }

        let rerun = run_daily_sweep(&state.db_pool, &state.engine, reference, 7).await.unwrap();
        assert_eq!(wallets(&state).await, expected);
        assert_eq!(report::latest_history(&state.db_pool).await.unwrap(), expected_point);
        assert_eq!(
            report::history_range(&state.db_pool, reference, reference).await.unwrap().len(),
            1
        );
        assert!(rerun.wallet_changes <= 10);
    }

    #[tokio::test]
    async fn test_history_point_is_one_per_day() {
        let (_dir, state) = setup().await;
        let d1 = day(2016, 3, 1);
        let d2 = day(2016, 3, 2);
        ledger::upsert_balance(&state.db_pool, &addr(1), 3 * SZABO_PER_ETHER).await.unwrap();

        run_daily_sweep(&state.db_pool, &state.engine, d1, 100).await.unwrap();
        run_daily_sweep(&state.db_pool, &state.engine, d2, 100).await.unwrap();
        run_daily_sweep(&state.db_pool, &state.engine, d2, 100).await.unwrap();

        let points = report::history_range(&state.db_pool, d1, d2).await.unwrap();
        let days: Vec<NaiveDate> = points.iter().map(|p| p.day).collect();
        assert_eq!(days, vec![d1, d2]);
    }

    #[tokio::test]
    async fn test_sweep_with_unbounded_threshold_completes() {
        let (_dir, state) = setup().await;
        let reference = day(2016, 3, 1);
        let engine = ClassificationEngine::new(ClassificationParams {
            threshold_days: 200_000_000,
            window_size_days: 178,
        });

        ledger::upsert_balance(&state.db_pool, &addr(1), 4 * SZABO_PER_ETHER).await.unwrap();
        ledger::upsert_balance(&state.db_pool, &addr(2), 2 * SZABO_PER_ETHER).await.unwrap();
        // Active in the endless inactivity window, silent in the weighted one
        changelog::record(&state.db_pool, &addr(1), SZABO_PER_ETHER, reference - Duration::days(400))
            .await
            .unwrap();

        let summary = run_daily_sweep(&state.db_pool, &engine, reference, 100).await.unwrap();
        assert_eq!(summary.addresses, 2);

        let wallets: Vec<Wallet> = wallets(&state).await.iter().map(|r| r.wallet).collect();
        assert_eq!(wallets, vec![Wallet::ShortTerm, Wallet::LongTerm]);
    }
}
