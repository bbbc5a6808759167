use super::*;
use tokio::sync::RwLock;

/// Admin-curated prompt pool kept in memory
pub struct MemoryContentStore {
    prompts: RwLock<Vec<Prompt>>,
}

impl MemoryContentStore {
    pub fn new(prompts: Vec<Prompt>) -> Self {
        Self {
            prompts: RwLock::new(prompts),
        }
    }

    /// Store seeded with the built-in prompt list
    pub fn with_fallback() -> Self {
        let prompts = fallback_prompts()
            .into_iter()
            .map(|p| Prompt {
                source: PromptSource::System,
                ..p
            })
            .collect();
        Self::new(prompts)
    }

    /// Validate and add a prompt, generating an id if none was given
    pub async fn add(&self, mut raw: RawPrompt) -> ContentResult<Prompt> {
        if raw.id.as_ref().and_then(parse_id).is_none() {
            raw.id = Some(Value::String(ulid::Ulid::new().to_string()));
        }
        let prompt = raw.validate(PromptSource::System)?;

        let mut prompts = self.prompts.write().await;
        prompts.retain(|p| p.id != prompt.id);
        prompts.push(prompt.clone());

        tracing::info!("Added prompt {} ({})", prompt.id, prompt.content_type);
        Ok(prompt)
    }

    /// Remove a prompt by id. Returns true if it existed.
    pub async fn remove(&self, id: &str) -> bool {
        let mut prompts = self.prompts.write().await;
        let before = prompts.len();
        prompts.retain(|p| p.id != id);
        let removed = prompts.len() != before;
        if removed {
            tracing::info!("Removed prompt {}", id);
        }
        removed
    }

    pub async fn list(&self) -> Vec<Prompt> {
        self.prompts.read().await.clone()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn fetch(&self, query: &ContentQuery) -> ContentResult<Vec<RawPrompt>> {
        Ok(self
            .prompts
            .read()
            .await
            .iter()
            .filter(|p| query.matches(p))
            .map(RawPrompt::from)
            .collect())
    }

    async fn count(&self, query: &ContentQuery) -> ContentResult<usize> {
        Ok(self
            .prompts
            .read()
            .await
            .iter()
            .filter(|p| query.matches(p))
            .count())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
