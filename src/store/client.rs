// file: src/store/client.rs
// description: LanceDB client wrapper with connection management
// reference: https://docs.rs/lancedb

use crate::error::{QaError, Result};
use lancedb::{Connection, Table, connect};
use tracing::{debug, info};

#[derive(Clone)]
pub struct LanceDbClient {
    connection: Connection,
    uri: String,
}

impl LanceDbClient {
    pub async fn new(uri: &str) -> Result<Self> {
        info!("Connecting to LanceDB at {}", uri);

        let connection = connect(uri)
            .execute()
            .await
            .map_err(|e| QaError::VectorStore(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self {
            connection,
            uri: uri.to_string(),
        })
    }

    pub fn get_connection(&self) -> &Connection {
        &self.connection
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Lists tables as a liveness check.
    pub async fn ping(&self) -> Result<bool> {
        debug!("Checking LanceDB connection");

        self.connection
            .table_names()
            .execute()
            .await
            .map(|_| true)
            .map_err(|e| QaError::VectorStore(format!("LanceDB connection failed: {}", e)))
    }

    pub async fn table_names(&self) -> Result<Vec<String>> {
        self.connection
            .table_names()
            .execute()
            .await
            .map_err(|e| QaError::VectorStore(format!("Failed to list tables: {}", e)))
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        Ok(self
            .table_names()
            .await?
            .iter()
            .any(|name| name == table_name))
    }

    pub async fn get_table(&self, table_name: &str) -> Result<Table> {
        self.connection
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| {
                QaError::VectorStore(format!("Failed to open table {}: {}", table_name, e))
            })
    }

    /// Row count, or 0 when the table does not exist.
    pub async fn count_rows(&self, table_name: &str) -> Result<usize> {
        if !self.table_exists(table_name).await? {
            return Ok(0);
        }

        let table = self.get_table(table_name).await?;
        table
            .count_rows(None)
            .await
            .map_err(|e| QaError::VectorStore(format!("Failed to count rows: {}", e)))
    }

    /// Returns whether a table was dropped.
    pub async fn drop_table(&self, table_name: &str) -> Result<bool> {
        if !self.table_exists(table_name).await? {
            return Ok(false);
        }

        self.connection.drop_table(table_name).await.map_err(|e| {
            QaError::VectorStore(format!("Failed to drop table {}: {}", table_name, e))
        })?;
        info!("Dropped table: {}", table_name);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_connect_and_ping_empty_database() {
        let temp = TempDir::new().unwrap();
        let uri = temp.path().join("db").display().to_string();
        let client = LanceDbClient::new(&uri).await.unwrap();

        assert!(client.ping().await.unwrap());
        assert_eq!(client.uri(), uri);
        assert!(!client.table_exists("summary_store").await.unwrap());
        assert_eq!(client.count_rows("summary_store").await.unwrap(), 0);
        assert!(!client.drop_table("summary_store").await.unwrap());
    }
}
