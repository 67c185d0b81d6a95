use std::path::PathBuf;
use std::sync::Arc;

use sqlx_sqlite_conn_pool::{ConnectionPool, Error, ExhaustionPolicy, PoolConfig};
use tempfile::TempDir;

fn db_path(dir: &TempDir) -> PathBuf {
   dir.path().join("test.db")
}

#[tokio::test]
async fn connect_seeds_one_idle_connection() {
   let dir = TempDir::new().unwrap();
   let pool = ConnectionPool::connect(db_path(&dir), None).await.unwrap();

   let status = pool.status();
   assert_eq!(status.total, 1);
   assert_eq!(status.idle, 1);
   assert_eq!(status.max_connections, 10);
   assert!(!pool.is_closed());
}

#[tokio::test]
async fn connect_rejects_empty_path() {
   let result = ConnectionPool::connect("", None).await;
   assert!(matches!(result, Err(Error::Connection { .. })));
}

#[tokio::test]
async fn acquire_reuses_idle_connection() {
   let dir = TempDir::new().unwrap();
   let pool = ConnectionPool::connect(db_path(&dir), None).await.unwrap();

   let conn = pool.acquire().await.unwrap();
   let status = pool.status();
   assert_eq!(status.total, 1);
   assert_eq!(status.idle, 0);

   pool.release(conn).await;
   let status = pool.status();
   assert_eq!(status.total, 1);
   assert_eq!(status.idle, 1);

   // A second checkout must reuse the pooled connection, not open a new one.
   let conn = pool.acquire().await.unwrap();
   assert_eq!(pool.status().total, 1);
   pool.release(conn).await;
}

#[tokio::test]
async fn reject_policy_errors_at_the_bound() {
   let dir = TempDir::new().unwrap();
   let config = PoolConfig {
      max_connections: 2,
      exhaustion_policy: ExhaustionPolicy::Reject,
      ..PoolConfig::default()
   };
   let pool = ConnectionPool::connect(db_path(&dir), Some(config)).await.unwrap();

   let c1 = pool.acquire().await.unwrap();
   let c2 = pool.acquire().await.unwrap();

   let err = pool.acquire().await.unwrap_err();
   assert!(matches!(err, Error::PoolExhausted { max: 2 }));

   pool.release(c1).await;
   pool.release(c2).await;

   // Returned connections make the pool serviceable again.
   let conn = pool.acquire().await.unwrap();
   pool.release(conn).await;
}

#[tokio::test]
async fn overflow_policy_exceeds_the_bound_and_trims_on_release() {
   let dir = TempDir::new().unwrap();
   let config = PoolConfig {
      max_connections: 1,
      exhaustion_policy: ExhaustionPolicy::Overflow,
      ..PoolConfig::default()
   };
   let pool = ConnectionPool::connect(db_path(&dir), Some(config)).await.unwrap();

   let c1 = pool.acquire().await.unwrap();
   let c2 = pool.acquire().await.unwrap();
   assert_eq!(pool.status().total, 2);

   pool.release(c1).await;
   let status = pool.status();
   assert_eq!(status.idle, 1);
   assert_eq!(status.total, 2);

   // The idle list is already full, so the overflow connection is closed
   // rather than pooled.
   pool.release(c2).await;
   let status = pool.status();
   assert_eq!(status.idle, 1);
   assert_eq!(status.total, 1);
}

#[tokio::test]
async fn close_all_rejects_further_acquires() {
   let dir = TempDir::new().unwrap();
   let pool = ConnectionPool::connect(db_path(&dir), None).await.unwrap();

   pool.close_all().await;
   assert!(pool.is_closed());

   let status = pool.status();
   assert_eq!(status.total, 0);
   assert_eq!(status.idle, 0);

   let err = pool.acquire().await.unwrap_err();
   assert!(matches!(err, Error::PoolClosed));
}

#[tokio::test]
async fn release_after_close_drops_the_connection() {
   let dir = TempDir::new().unwrap();
   let pool = ConnectionPool::connect(db_path(&dir), None).await.unwrap();

   let conn = pool.acquire().await.unwrap();
   pool.close_all().await;

   pool.release(conn).await;
   let status = pool.status();
   assert_eq!(status.idle, 0);
   assert_eq!(status.total, 0);
}

#[tokio::test]
async fn close_during_checkout_closes_released_connections() {
   let dir = TempDir::new().unwrap();
   let pool = ConnectionPool::connect(db_path(&dir), None).await.unwrap();

   // Both connections are out when the pool closes; neither may land on
   // the drained idle list when returned.
   let c1 = pool.acquire().await.unwrap();
   let c2 = pool.acquire().await.unwrap();
   pool.close_all().await;

   pool.release(c1).await;
   pool.release(c2).await;

   let status = pool.status();
   assert_eq!(status.idle, 0);
   assert_eq!(status.total, 0);
}

#[tokio::test]
async fn panicking_closure_frees_its_slot() {
   let dir = TempDir::new().unwrap();
   let config = PoolConfig {
      max_connections: 1,
      exhaustion_policy: ExhaustionPolicy::Reject,
      ..PoolConfig::default()
   };
   let pool = ConnectionPool::connect(db_path(&dir), Some(config)).await.unwrap();

   let task_pool = Arc::clone(&pool);
   let handle = tokio::spawn(async move {
      let _: Result<(), Error> = task_pool
         .with_connection(|_conn| Box::pin(async move { panic!("boom") }))
         .await;
   });
   assert!(handle.await.is_err());

   // The slot came back even though the holder never released.
   let status = pool.status();
   assert_eq!(status.total, 0);

   let mut conn = pool.acquire().await.unwrap();
   sqlx::query("SELECT 1").execute(&mut conn).await.unwrap();
   pool.release(conn).await;
}

#[tokio::test]
async fn health_check_reflects_pool_state() {
   let dir = TempDir::new().unwrap();
   let pool = ConnectionPool::connect(db_path(&dir), None).await.unwrap();

   assert!(pool.health_check().await);

   pool.close_all().await;
   assert!(!pool.health_check().await);
}

#[tokio::test]
async fn with_connection_releases_on_error() {
   let dir = TempDir::new().unwrap();
   let pool = ConnectionPool::connect(db_path(&dir), None).await.unwrap();

   let result: Result<(), Error> = pool
      .with_connection(|conn| {
         Box::pin(async move {
            sqlx::query("SELECT no_such_column")
               .execute(&mut *conn)
               .await?;
            Ok(())
         })
      })
      .await;
   assert!(result.is_err());

   // The connection came back despite the error.
   let status = pool.status();
   assert_eq!(status.total, 1);
   assert_eq!(status.idle, 1);
}

#[tokio::test]
async fn with_connection_runs_statements() {
   let dir = TempDir::new().unwrap();
   let pool = ConnectionPool::connect(db_path(&dir), None).await.unwrap();

   let count: i64 = pool
      .with_connection(|conn| {
         Box::pin(async move {
            sqlx::query("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT)")
               .execute(&mut *conn)
               .await?;
            sqlx::query("INSERT INTO items (name) VALUES ('a'), ('b'), ('c')")
               .execute(&mut *conn)
               .await?;
            let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
               .fetch_one(&mut *conn)
               .await?;
            Ok::<_, Error>(n)
         })
      })
      .await
      .unwrap();

   assert_eq!(count, 3);
}

#[tokio::test]
async fn connections_carry_the_configured_pragmas() {
   let dir = TempDir::new().unwrap();
   let pool = ConnectionPool::connect(db_path(&dir), None).await.unwrap();

   let mut conn = pool.acquire().await.unwrap();

   let (foreign_keys,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
      .fetch_one(&mut conn)
      .await
      .unwrap();
   assert_eq!(foreign_keys, 1);

   let (journal_mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
      .fetch_one(&mut conn)
      .await
      .unwrap();
   assert_eq!(journal_mode.to_lowercase(), "wal");

   let (busy_timeout,): (i64,) = sqlx::query_as("PRAGMA busy_timeout")
      .fetch_one(&mut conn)
      .await
      .unwrap();
   assert_eq!(busy_timeout, 30_000);

   pool.release(conn).await;
}

#[tokio::test]
async fn concurrent_checkouts_stay_within_reject_bound() {
   let dir = TempDir::new().unwrap();
   let config = PoolConfig {
      max_connections: 4,
      exhaustion_policy: ExhaustionPolicy::Reject,
      ..PoolConfig::default()
   };
   let pool = ConnectionPool::connect(db_path(&dir), Some(config)).await.unwrap();

   pool
      .with_connection(|conn| {
         Box::pin(async move {
            sqlx::query("CREATE TABLE hits (id INTEGER PRIMARY KEY)")
               .execute(&mut *conn)
               .await?;
            Ok::<_, Error>(())
         })
      })
      .await
      .unwrap();

   let mut handles = Vec::new();
   for _ in 0..16 {
      let pool: Arc<ConnectionPool> = Arc::clone(&pool);
      handles.push(tokio::spawn(async move {
         pool
            .with_connection(|conn| {
               Box::pin(async move {
                  sqlx::query("INSERT INTO hits DEFAULT VALUES")
                     .execute(&mut *conn)
                     .await?;
                  Ok::<_, Error>(())
               })
            })
            .await
      }));
   }

   let mut completed = 0;
   for handle in handles {
      if handle.await.unwrap().is_ok() {
         completed += 1;
      }
   }
   assert!(completed >= 1);

   let status = pool.status();
   assert!(status.total <= 4);
   assert!(status.idle <= status.total);
}
