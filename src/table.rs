//! A handle binding one table name into every call.

use crate::query::{GetQuery, SaveRequest};
use crate::types::{ColumnDescription, Record};
use crate::{Client, Error};

/// A table-scoped view of a [`Client`].
///
/// Exposes exactly the operations the service supports, with the table name
/// injected into each one. Obtained from [`Client::table`].
pub struct Table<'a> {
    client: &'a Client,
    name: String,
}

impl<'a> Table<'a> {
    pub(crate) fn new(client: &'a Client, name: String) -> Self {
        Self { client, name }
    }

    /// The bound table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get(&self, query: &GetQuery) -> Result<Vec<Record>, Error> {
        self.client.get(&self.name, query).await
    }

    pub async fn first(&self, query: &GetQuery) -> Result<Option<Record>, Error> {
        self.client.first(&self.name, query).await
    }

    /// Fetches a single record by key.
    pub async fn find(&self, key: u64) -> Result<Option<Record>, Error> {
        let records = self
            .client
            .get(&self.name, &GetQuery::new().with_key(key))
            .await?;
        Ok(records.into_iter().next())
    }

    pub async fn save(&self, request: &SaveRequest) -> Result<String, Error> {
        self.client.save(&self.name, request).await
    }

    pub async fn post(&self, request: &SaveRequest) -> Result<String, Error> {
        self.client.post(&self.name, request).await
    }

    pub async fn put(&self, request: &SaveRequest) -> Result<String, Error> {
        self.client.put(&self.name, request).await
    }

    pub async fn delete(&self, key: u64) -> Result<bool, Error> {
        self.client.delete(&self.name, key).await
    }

    pub async fn count(&self, query: &GetQuery) -> Result<u64, Error> {
        self.client.count(&self.name, query).await
    }

    pub async fn columns(&self) -> Result<Vec<ColumnDescription>, Error> {
        self.client.columns(&self.name).await
    }
}
