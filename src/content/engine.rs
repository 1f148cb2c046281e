use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{AppError, AppResult};

use super::model::ContentModel;

/// Tag the engine implicitly attaches to every set model.
pub const SET_OBJECT_TAG: &str = "EknSetObject";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuerySort {
    #[default]
    Relevance,
    SequenceNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentQuery {
    pub limit: Option<usize>,
    pub tags_match_any: Vec<String>,
    pub tags_match_all: Vec<String>,
    pub sort: QuerySort,
}

impl ContentQuery {
    /// First child set of `set`, ordered by sequence number.
    pub fn first_subset_of(set: &ContentModel) -> Self {
        Self {
            limit: Some(1),
            tags_match_any: set.child_tags.clone(),
            tags_match_all: vec![SET_OBJECT_TAG.to_string()],
            sort: QuerySort::SequenceNumber,
        }
    }

    pub fn matches(&self, model: &ContentModel) -> bool {
        let has_tag = |tag: &String| {
            (model.is_set() && tag == SET_OBJECT_TAG) || model.tags.iter().any(|own| own == tag)
        };
        let any = self.tags_match_any.is_empty() || self.tags_match_any.iter().any(has_tag);
        let all = self.tags_match_all.iter().all(has_tag);
        any && all
    }
}

pub trait ContentEngine {
    fn get_object(&self, id: &str) -> AppResult<ContentModel>;
    fn query(&self, query: &ContentQuery) -> AppResult<Vec<ContentModel>>;
}

/// Engine serving models held in memory, in load order.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    models: Vec<ContentModel>,
    by_id: HashMap<String, usize>,
}

impl MemoryEngine {
    pub fn from_models(models: Vec<ContentModel>) -> Self {
        let by_id = models
            .iter()
            .enumerate()
            .map(|(index, model)| (model.id.clone(), index))
            .collect();
        Self { models, by_id }
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| {
            AppError::io_with_context(
                source,
                format!("failed to read content file: {}", path.display()),
            )
        })?;
        let models = serde_json::from_str::<Vec<ContentModel>>(&raw).map_err(|source| {
            AppError::invalid_argument(format!(
                "failed to parse content file {}: {source}",
                path.display()
            ))
        })?;
        Ok(Self::from_models(models))
    }

    pub fn models(&self) -> &[ContentModel] {
        &self.models
    }

    pub fn sets(&self) -> impl Iterator<Item = &ContentModel> {
        self.models.iter().filter(|model| model.is_set())
    }
}

impl ContentEngine for MemoryEngine {
    fn get_object(&self, id: &str) -> AppResult<ContentModel> {
        self.by_id
            .get(id)
            .map(|&index| self.models[index].clone())
            .ok_or_else(|| AppError::content_not_found(id))
    }

    fn query(&self, query: &ContentQuery) -> AppResult<Vec<ContentModel>> {
        if query.limit == Some(0) {
            return Err(AppError::content_query("limit must be at least 1"));
        }
        let mut results: Vec<ContentModel> = self
            .models
            .iter()
            .filter(|model| query.matches(model))
            .cloned()
            .collect();
        if query.sort == QuerySort::SequenceNumber {
            results.sort_by_key(|model| model.sequence_number.unwrap_or(u64::MAX));
        }
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        Ok(results)
    }
}
