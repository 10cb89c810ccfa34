//! Test fixtures for integration tests.

use sqlx::PgPool;
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::ContainerAsync;
use testcontainers_modules::testcontainers::runners::AsyncRunner;

use evmscan::store::PostgresProgressStore;

use super::containers::build_connection_string;

/// A test database instance with pool and container.
///
/// The container is kept alive as long as this struct exists; when dropped,
/// it is stopped automatically.
pub struct TestDb {
    /// The connection pool to the test database.
    pub pool: PgPool,
    /// The `PostgresProgressStore` wrapping the pool.
    pub store: PostgresProgressStore,
    /// The container (kept alive for the duration of the test).
    _container: ContainerAsync<Postgres>,
}

impl TestDb {
    /// Start a fresh Postgres container, connect, and run migrations.
    ///
    /// # Panics
    ///
    /// Panics if container startup, connection, or migrations fail.
    pub async fn new() -> Self {
        let container = Postgres::default()
            .start()
            .await
            .expect("failed to start postgres container");

        let host = container.get_host().await.expect("failed to get host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("failed to get port");

        let connection_string = build_connection_string(&host.to_string(), port);

        let pool = connect_with_retries(&connection_string, 30)
            .await
            .expect("failed to connect to database");

        let store = PostgresProgressStore::new(pool.clone());
        store.run_migrations().await.expect("failed to run migrations");

        Self {
            pool,
            store,
            _container: container,
        }
    }
}

/// Connect with retries: the container's "ready" message can fire slightly
/// before Postgres actually accepts connections.
async fn connect_with_retries(url: &str, max_attempts: u32) -> Result<PgPool, sqlx::Error> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match PgPool::connect(url).await {
            Ok(pool) => match sqlx::query("SELECT 1").execute(&pool).await {
                Ok(_) => return Ok(pool),
                Err(e) if attempts < max_attempts => {
                    tracing::debug!("connection verify failed (attempt {attempts}): {e}");
                    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                }
                Err(e) => return Err(e),
            },
            Err(e) if attempts < max_attempts => {
                tracing::debug!("connection failed (attempt {attempts}): {e}");
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Fixtures for [`evmscan::types::DecodedEvent`] and related scanner types.
pub mod event_fixtures {
    use alloy::primitives::{Address, B256, U256};
    use alloy::rpc::types::Log as AlloyLog;
    use alloy::sol_types::SolEvent;

    use evmscan::abi::Transfer;
    use evmscan::types::{DecimalU256, EthAddress, EventSchema, RawLog};

    /// Build a raw ERC-20 `Transfer` log for block `block_number`, log index
    /// `log_index`, transferring `value` from `from` to `to`.
    #[must_use]
    pub fn transfer_log(
        contract: EthAddress,
        from: EthAddress,
        to: EthAddress,
        value: u64,
        block_number: u64,
        log_index: u64,
    ) -> RawLog {
        let event = Transfer {
            from: Address::from(from),
            to: Address::from(to),
            value: U256::from(value),
        };

        AlloyLog {
            inner: alloy::primitives::Log {
                address: Address::from(contract),
                data: event.encode_log_data(),
            },
            block_hash: Some(B256::repeat_byte(0xab)),
            block_number: Some(block_number),
            block_timestamp: None,
            transaction_hash: Some(B256::repeat_byte(0xcd)),
            transaction_index: None,
            log_index: Some(log_index),
            removed: false,
        }
    }

    /// Decode a [`transfer_log`] into a [`evmscan::types::DecodedEvent`] for
    /// assertions.
    #[must_use]
    pub fn expected_value(value: u64) -> DecimalU256 {
        DecimalU256::from_u256(U256::from(value))
    }

    /// The schema every fixture log here decodes against.
    #[must_use]
    pub const fn schema() -> EventSchema {
        EventSchema::Erc20Transfer
    }
}
