use serde::{Deserialize, Serialize};

use crate::content::ContentModel;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Home,
    Set,
    Search,
    Article,
    AllSets,
}

impl PageType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Set => "set",
            Self::Search => "search",
            Self::Article => "article",
            Self::AllSets => "all_sets",
        }
    }
}

/// Loose field set a history item is built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemProps {
    pub page_type: Option<PageType>,
    pub model: Option<ContentModel>,
    pub media_model: Option<ContentModel>,
    pub context: Vec<ContentModel>,
    pub search_terms: String,
    pub context_label: String,
    pub timestamp: u32,
    pub empty: bool,
    pub from_global_search: bool,
}

impl ItemProps {
    pub fn page(page_type: PageType) -> Self {
        Self {
            page_type: Some(page_type),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: ContentModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_media_model(mut self, media_model: ContentModel) -> Self {
        self.media_model = Some(media_model);
        self
    }

    pub fn with_context(mut self, context: Vec<ContentModel>) -> Self {
        self.context = context;
        self
    }

    pub fn with_search_terms(mut self, terms: impl Into<String>) -> Self {
        self.search_terms = terms.into();
        self
    }

    pub fn with_context_label(mut self, label: impl Into<String>) -> Self {
        self.context_label = label.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_empty(mut self, empty: bool) -> Self {
        self.empty = empty;
        self
    }

    pub fn with_from_global_search(mut self, from_global_search: bool) -> Self {
        self.from_global_search = from_global_search;
        self
    }
}

/// One navigable application state. Never mutated after construction.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryItem {
    page_type: PageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<ContentModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_model: Option<ContentModel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    context: Vec<ContentModel>,
    search_terms: String,
    context_label: String,
    timestamp: u32,
    empty: bool,
    from_global_search: bool,
}

impl HistoryItem {
    pub fn from_props(props: ItemProps) -> AppResult<Self> {
        let Some(page_type) = props.page_type else {
            return Err(AppError::invalid_item("page_type is required"));
        };
        if let Some(model) = &props.model
            && model.is_media()
        {
            return Err(AppError::invalid_item(format!(
                "model {} is media; use media_model",
                model.id
            )));
        }
        if let Some(media_model) = &props.media_model
            && !media_model.is_media()
        {
            return Err(AppError::invalid_item(format!(
                "media_model {} is not a media object",
                media_model.id
            )));
        }

        Ok(Self {
            page_type,
            model: props.model,
            media_model: props.media_model,
            context: props.context,
            search_terms: props.search_terms,
            context_label: props.context_label,
            timestamp: props.timestamp,
            empty: props.empty,
            from_global_search: props.from_global_search,
        })
    }

    /// A bare item of `page_type` with every other field defaulted.
    pub fn page(page_type: PageType) -> Self {
        Self {
            page_type,
            model: None,
            media_model: None,
            context: Vec::new(),
            search_terms: String::new(),
            context_label: String::new(),
            timestamp: 0,
            empty: false,
            from_global_search: false,
        }
    }

    pub fn to_props(&self) -> ItemProps {
        ItemProps {
            page_type: Some(self.page_type),
            model: self.model.clone(),
            media_model: self.media_model.clone(),
            context: self.context.clone(),
            search_terms: self.search_terms.clone(),
            context_label: self.context_label.clone(),
            timestamp: self.timestamp,
            empty: self.empty,
            from_global_search: self.from_global_search,
        }
    }

    pub fn page_type(&self) -> PageType {
        self.page_type
    }

    pub fn model(&self) -> Option<&ContentModel> {
        self.model.as_ref()
    }

    pub fn media_model(&self) -> Option<&ContentModel> {
        self.media_model.as_ref()
    }

    pub fn context(&self) -> &[ContentModel] {
        &self.context
    }

    pub fn search_terms(&self) -> &str {
        &self.search_terms
    }

    pub fn context_label(&self) -> &str {
        &self.context_label
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn from_global_search(&self) -> bool {
        self.from_global_search
    }
}

fn same_model(a: Option<&ContentModel>, b: Option<&ContentModel>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.id == b.id,
        _ => false,
    }
}

// Timestamp, context and label only affect presentation.
impl PartialEq for HistoryItem {
    fn eq(&self, other: &Self) -> bool {
        self.page_type == other.page_type
            && same_model(self.model(), other.model())
            && same_model(self.media_model(), other.media_model())
            && self.search_terms == other.search_terms
            && self.empty == other.empty
            && self.from_global_search == other.from_global_search
    }
}
