use crate::config::EndpointConfig;
use crate::error::{FarmReportError, Result};
use crate::schema::{DashboardData, FinancialTransaction, ProductionRecord, Property};
use crate::store::DataSource;
use futures::future::{BoxFuture, FutureExt};
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Loads the three collections from the farm REST API.
#[derive(Clone)]
pub struct HttpDataSource {
    client: Client,
    endpoints: EndpointConfig,
}

impl HttpDataSource {
    pub fn new(endpoints: EndpointConfig) -> Self {
        Self {
            client: Client::new(),
            endpoints,
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let url = self.endpoints.url_for(path);
        debug!("GET {}", url);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.endpoints.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FarmReportError::DataUnavailable(format!(
                "GET {} failed (status {}): {}",
                url, status, body
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn load(&self) -> Result<DashboardData> {
        let (properties, productions, transactions) = futures::try_join!(
            self.fetch::<Property>(&self.endpoints.properties_path),
            self.fetch::<ProductionRecord>(&self.endpoints.productions_path),
            self.fetch::<FinancialTransaction>(&self.endpoints.transactions_path),
        )?;

        Ok(DashboardData::new(properties, productions, transactions))
    }
}

impl DataSource for HttpDataSource {
    fn load_dashboard_data(&self) -> BoxFuture<'_, Result<DashboardData>> {
        self.load().boxed()
    }
}
