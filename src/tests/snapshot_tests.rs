//! tests/snapshot_tests.rs - Day partition storage

#[cfg(test)]
mod tests {
    use crate::{
        error::PipelineError,
        tests::common::{addr, at, day, setup, snapshot},
    };

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let (_dir, state) = setup().await;
        let d = day(2015, 8, 1);
        let a = addr(1);

        let partition = state.partitions.open_or_create(d).await.unwrap();
        let snap = snapshot(&a, 1_500_000, at(d, 10, 0, 0));
        partition.upsert(&snap).await.unwrap();
        partition.upsert(&snap).await.unwrap();

        let rows = partition.read_all().await.unwrap();
        assert_eq!(rows, vec![snap]);
        assert_eq!(partition.total_balance().await.unwrap(), 1_500_000);
        partition.close().await;
    }

    #[tokio::test]
    async fn test_later_snapshot_replaces_earlier() {
        let (_dir, state) = setup().await;
        let d = day(2015, 8, 1);
        let a = addr(1);

        let partition = state.partitions.open_or_create(d).await.unwrap();
        partition
            .upsert_batch(&[
                snapshot(&a, 100, at(d, 9, 0, 0)),
                snapshot(&a, 250, at(d, 18, 30, 0)),
            ])
            .await
            .unwrap();

        let rows = partition.read_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].balance, 250);
        assert_eq!(rows[0].observed_at, at(d, 18, 30, 0));
        partition.close().await;
    }

    #[tokio::test]
    async fn test_zero_balance_closes_position() {
        let (_dir, state) = setup().await;
        let d = day(2015, 8, 1);
        let (a, b) = (addr(1), addr(2));

        let partition = state.partitions.open_or_create(d).await.unwrap();
        partition
            .upsert_batch(&[
                snapshot(&a, 100, at(d, 9, 0, 0)),
                snapshot(&b, 40, at(d, 9, 0, 0)),
                snapshot(&a, 0, at(d, 12, 0, 0)),
            ])
            .await
            .unwrap();

        let rows = partition.read_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].address, b);
        assert_eq!(partition.read_closures().await.unwrap(), vec![a.clone()]);

        // Reopening the position the same day clears the closure again
        partition.upsert(&snapshot(&a, 7, at(d, 20, 0, 0))).await.unwrap();
        assert_eq!(partition.read_all().await.unwrap().len(), 2);
        assert!(partition.read_closures().await.unwrap().is_empty());
        partition.close().await;
    }

    #[tokio::test]
    async fn test_partition_survives_reopen() {
        let (_dir, state) = setup().await;
        let d = day(2015, 8, 1);

        let partition = state.partitions.open_or_create(d).await.unwrap();
        partition
            .upsert_batch(&[
                snapshot(&addr(1), 30, at(d, 1, 0, 0)),
                snapshot(&addr(2), 90, at(d, 2, 0, 0)),
                snapshot(&addr(3), 60, at(d, 3, 0, 0)),
            ])
            .await
            .unwrap();
        partition.close().await;

        assert!(state.partitions.exists(d));
        let reopened = state.partitions.open_existing(d).await.unwrap();
        assert_eq!(reopened.path(), state.partitions.path_for(d).as_path());
        assert_eq!(reopened.total_balance().await.unwrap(), 180);

        let top = reopened.top_balances(2).await.unwrap();
        let balances: Vec<i64> = top.iter().map(|s| s.balance).collect();
        assert_eq!(balances, vec![90, 60]);
        reopened.close().await;
    }

    #[tokio::test]
    async fn test_open_existing_missing_partition() {
        let (_dir, state) = setup().await;
        let d = day(2015, 8, 2);

        match state.partitions.open_existing(d).await {
            Err(PipelineError::PartitionMissing(missing)) => assert_eq!(missing, d),
            other => panic!("expected PartitionMissing, got {:?}", other.map(|p| p.day())),
        }
        assert!(!state.partitions.exists(d));
    }

    #[tokio::test]
    async fn test_open_existing_corrupt_partition() {
        let (_dir, state) = setup().await;
        let d = day(2015, 8, 3);

        std::fs::create_dir_all(&state.config.partition_dir).unwrap();
        std::fs::write(state.partitions.path_for(d), vec![0x5a_u8; 8192]).unwrap();

        match state.partitions.open_existing(d).await {
            Err(PipelineError::PartitionCorrupt { day: corrupt, .. }) => assert_eq!(corrupt, d),
            other => panic!("expected PartitionCorrupt, got {:?}", other.map(|p| p.day())),
        }
    }
}
