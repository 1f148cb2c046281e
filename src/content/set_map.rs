use std::collections::HashMap;

use super::model::ContentModel;

/// Parent lookup for sets, keyed by the child tags each set exposes.
#[derive(Debug, Clone, Default)]
pub struct SetMap {
    sets_by_child_tag: HashMap<String, Vec<ContentModel>>,
}

impl SetMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_models<'a, I>(models: I) -> Self
    where
        I: IntoIterator<Item = &'a ContentModel>,
    {
        let mut map = Self::new();
        map.init_with_models(models);
        map
    }

    pub fn init_with_models<'a, I>(&mut self, models: I)
    where
        I: IntoIterator<Item = &'a ContentModel>,
    {
        self.sets_by_child_tag.clear();
        for set in models.into_iter().filter(|model| model.is_set()) {
            for tag in &set.child_tags {
                self.sets_by_child_tag
                    .entry(tag.clone())
                    .or_default()
                    .push(set.clone());
            }
        }
    }

    pub fn parent_set(&self, model: &ContentModel) -> Option<&ContentModel> {
        model.tags.iter().find_map(|tag| {
            self.sets_by_child_tag
                .get(tag)?
                .iter()
                .find(|candidate| candidate.id != model.id)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.sets_by_child_tag.is_empty()
    }
}
