use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Article,
    Set,
    Media,
}

/// A piece of content resolved from the content engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentModel {
    pub id: String,
    pub kind: ModelKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Tags of the models contained in a set.
    #[serde(default)]
    pub child_tags: Vec<String>,
    /// Ids of media resources referenced by an article.
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub sequence_number: Option<u64>,
}

impl ContentModel {
    pub fn new(id: impl Into<String>, kind: ModelKind) -> Self {
        Self {
            id: id.into(),
            kind,
            title: String::new(),
            tags: Vec::new(),
            child_tags: Vec::new(),
            resources: Vec::new(),
            sequence_number: None,
        }
    }

    pub fn article(id: impl Into<String>) -> Self {
        Self::new(id, ModelKind::Article)
    }

    pub fn set(id: impl Into<String>) -> Self {
        Self::new(id, ModelKind::Set)
    }

    pub fn media(id: impl Into<String>) -> Self {
        Self::new(id, ModelKind::Media)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_child_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.child_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sequence_number(mut self, sequence_number: u64) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }

    pub fn is_article(&self) -> bool {
        self.kind == ModelKind::Article
    }

    pub fn is_set(&self) -> bool {
        self.kind == ModelKind::Set
    }

    pub fn is_media(&self) -> bool {
        self.kind == ModelKind::Media
    }
}
