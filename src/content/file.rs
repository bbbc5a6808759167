use super::*;
use std::path::PathBuf;

/// Content store backed by a JSON file holding an array of prompts.
/// The file is re-read on every fetch so edits apply to the next game.
pub struct FileContentStore {
    path: PathBuf,
    name: String,
}

impl FileContentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }
}

#[async_trait]
impl ContentStore for FileContentStore {
    async fn fetch(&self, _query: &ContentQuery) -> ContentResult<Vec<RawPrompt>> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let rows: Vec<Value> = serde_json::from_str(&contents)?;
        Ok(decode_rows(rows))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_prompts_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "q1", "text": "Favourite snack?", "type": "question"}},
                {{"id": "d1", "text": "Do ten squats", "type": "dare", "level": 2}},
                {{"id": "x", "text": "Broken", "type": "haiku"}}
            ]"#
        )
        .unwrap();

        let store = FileContentStore::new(file.path());
        let query = ContentQuery::from_settings(&GameSettings::default());

        assert_eq!(store.fetch(&query).await.unwrap().len(), 3);
        assert_eq!(store.count(&query).await.unwrap(), 2);
        assert!(store.name().starts_with("file:"));
    }

    #[tokio::test]
    async fn test_bad_row_does_not_sink_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "q1", "text": "Favourite snack?", "type": "question"}},
                {{"id": "q2", "text": 42, "type": "question"}}
            ]"#
        )
        .unwrap();

        let store = FileContentStore::new(file.path());
        let query = ContentQuery::from_settings(&GameSettings::default());
        let load = load_pool(&store, &query, &[]).await;

        assert!(!load.used_fallback);
        assert_eq!(load.rejected, 1);
        assert_eq!(load.prompts.len(), 1);
        assert_eq!(load.prompts[0].id, "q1");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileContentStore::new(dir.path().join("missing.json"));
        let query = ContentQuery::from_settings(&GameSettings::default());

        let result = store.fetch(&query).await;
        assert!(matches!(result, Err(ContentError::Io(_))));
    }

    #[tokio::test]
    async fn test_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let store = FileContentStore::new(file.path());
        let query = ContentQuery::from_settings(&GameSettings::default());
        assert!(matches!(
            store.fetch(&query).await,
            Err(ContentError::Parse(_))
        ));
    }
}
