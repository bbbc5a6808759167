use super::*;
use std::time::Duration;

/// Content store reached over HTTP.
///
/// `GET {base}/content?types=truth,dare&max_level=2&adult=false` returns a
/// JSON array of prompts, `GET {base}/content/count` with the same query
/// returns `{"count": n}`.
pub struct HttpContentStore {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: usize,
}

impl HttpContentStore {
    pub fn new(base_url: String, timeout: Duration) -> ContentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ContentError::Transport(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn query_params(query: &ContentQuery) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(3);
        if !query.types.is_empty() {
            let types: Vec<_> = query.types.iter().map(|t| t.as_str()).collect();
            params.push(("types", types.join(",")));
        }
        params.push(("max_level", query.max_level.get().to_string()));
        params.push(("adult", query.include_adult.to_string()));
        params
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &ContentQuery,
    ) -> ContentResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&Self::query_params(query))
            .send()
            .await
            .map_err(|e| ContentError::Transport(format!("GET {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(ContentError::Transport(format!(
                "GET {} returned status {}",
                url,
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ContentError::Transport(format!("Invalid response from {}: {}", url, e)))
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn fetch(&self, query: &ContentQuery) -> ContentResult<Vec<RawPrompt>> {
        let rows: Vec<Value> = self.get_json("/content", query).await?;
        Ok(decode_rows(rows))
    }

    async fn count(&self, query: &ContentQuery) -> ContentResult<usize> {
        let response: CountResponse = self.get_json("/content/count", query).await?;
        Ok(response.count)
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}
