use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content::ContentModel;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    HomeClicked,
    LaunchedFromDesktop,
    ItemClicked,
    NavBackClicked,
    HistoryBackClicked,
    HistoryForwardClicked,
    LightboxClosed,
    SearchBoxFocused,
    ArticleLinkClicked,
    SearchTextEntered,
    DbusLoadQueryCalled,
    DbusLoadItemCalled,
    AllSetsClicked,
    SetClicked,
    SearchClicked,
    AutocompleteClicked,
    PreviousDocumentClicked,
    NextDocumentClicked,
    /// Identifier outside the built-in vocabulary.
    Other(String),
}

impl ActionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::HomeClicked => "HOME_CLICKED",
            Self::LaunchedFromDesktop => "LAUNCHED_FROM_DESKTOP",
            Self::ItemClicked => "ITEM_CLICKED",
            Self::NavBackClicked => "NAV_BACK_CLICKED",
            Self::HistoryBackClicked => "HISTORY_BACK_CLICKED",
            Self::HistoryForwardClicked => "HISTORY_FORWARD_CLICKED",
            Self::LightboxClosed => "LIGHTBOX_CLOSED",
            Self::SearchBoxFocused => "SEARCH_BOX_FOCUSED",
            Self::ArticleLinkClicked => "ARTICLE_LINK_CLICKED",
            Self::SearchTextEntered => "SEARCH_TEXT_ENTERED",
            Self::DbusLoadQueryCalled => "DBUS_LOAD_QUERY_CALLED",
            Self::DbusLoadItemCalled => "DBUS_LOAD_ITEM_CALLED",
            Self::AllSetsClicked => "ALL_SETS_CLICKED",
            Self::SetClicked => "SET_CLICKED",
            Self::SearchClicked => "SEARCH_CLICKED",
            Self::AutocompleteClicked => "AUTOCOMPLETE_CLICKED",
            Self::PreviousDocumentClicked => "PREVIOUS_DOCUMENT_CLICKED",
            Self::NextDocumentClicked => "NEXT_DOCUMENT_CLICKED",
            Self::Other(name) => name,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "HOME_CLICKED" => Self::HomeClicked,
            "LAUNCHED_FROM_DESKTOP" => Self::LaunchedFromDesktop,
            "ITEM_CLICKED" => Self::ItemClicked,
            "NAV_BACK_CLICKED" => Self::NavBackClicked,
            "HISTORY_BACK_CLICKED" => Self::HistoryBackClicked,
            "HISTORY_FORWARD_CLICKED" => Self::HistoryForwardClicked,
            "LIGHTBOX_CLOSED" => Self::LightboxClosed,
            "SEARCH_BOX_FOCUSED" => Self::SearchBoxFocused,
            "ARTICLE_LINK_CLICKED" => Self::ArticleLinkClicked,
            "SEARCH_TEXT_ENTERED" => Self::SearchTextEntered,
            "DBUS_LOAD_QUERY_CALLED" => Self::DbusLoadQueryCalled,
            "DBUS_LOAD_ITEM_CALLED" => Self::DbusLoadItemCalled,
            "ALL_SETS_CLICKED" => Self::AllSetsClicked,
            "SET_CLICKED" => Self::SetClicked,
            "SEARCH_CLICKED" => Self::SearchClicked,
            "AUTOCOMPLETE_CLICKED" => Self::AutocompleteClicked,
            "PREVIOUS_DOCUMENT_CLICKED" => Self::PreviousDocumentClicked,
            "NEXT_DOCUMENT_CLICKED" => Self::NextDocumentClicked,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl From<String> for ActionType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ActionType> for String {
    fn from(value: ActionType) -> Self {
        match value {
            ActionType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message submitted to the dispatcher. Immutable once built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action_type: Option<ActionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<ContentModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    context: Vec<ContentModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context_label: Option<String>,
    #[serde(default, alias = "query", skip_serializing_if = "Option::is_none")]
    search_terms: Option<String>,
    #[serde(default, alias = "ekn_id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<u32>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Action {
    pub fn new(action_type: ActionType) -> Self {
        Self {
            action_type: Some(action_type),
            ..Self::default()
        }
    }

    /// An action with no type. Dispatching it fails.
    pub fn untyped() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw)
            .map_err(|source| AppError::invalid_action(format!("malformed action json: {source}")))
    }

    pub fn with_model(mut self, model: ContentModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_context(mut self, context: Vec<ContentModel>) -> Self {
        self.context = context;
        self
    }

    pub fn with_context_label(mut self, label: impl Into<String>) -> Self {
        self.context_label = Some(label.into());
        self
    }

    pub fn with_search_terms(mut self, terms: impl Into<String>) -> Self {
        self.search_terms = Some(terms.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn action_type(&self) -> Option<&ActionType> {
        self.action_type.as_ref()
    }

    pub fn model(&self) -> Option<&ContentModel> {
        self.model.as_ref()
    }

    pub fn context(&self) -> &[ContentModel] {
        &self.context
    }

    pub fn context_label(&self) -> Option<&str> {
        self.context_label.as_deref()
    }

    pub fn search_terms(&self) -> Option<&str> {
        self.search_terms.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn timestamp(&self) -> Option<u32> {
        self.timestamp
    }

    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// The action type, or `InvalidAction` when missing or blank.
    pub fn require_type(&self) -> AppResult<&ActionType> {
        match &self.action_type {
            Some(action_type) if !action_type.is_blank() => Ok(action_type),
            Some(_) => Err(AppError::invalid_action("action_type is empty")),
            None => Err(AppError::invalid_action("action_type is missing")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::content::ModelKind;
    use crate::error::AppError;

    use super::{Action, ActionType};

    #[test]
    fn action_type_parse_falls_back_to_other() {
        assert_eq!(ActionType::parse("HOME_CLICKED"), ActionType::HomeClicked);
        assert_eq!(
            ActionType::parse("SHOW_MEDIA"),
            ActionType::Other("SHOW_MEDIA".to_string())
        );
        assert_eq!(ActionType::DbusLoadItemCalled.as_str(), "DBUS_LOAD_ITEM_CALLED");
    }

    #[test]
    fn from_json_reads_known_fields_and_keeps_extras() {
        let action = Action::from_json(
            r#"{
                "action_type": "DBUS_LOAD_ITEM_CALLED",
                "query": "foo",
                "ekn_id": "ekn:///foo",
                "timestamp": 42,
                "model": {"id": "ekn:///foo", "kind": "article"},
                "source": "shell"
            }"#,
        )
        .expect("action json should parse");

        assert_eq!(action.action_type(), Some(&ActionType::DbusLoadItemCalled));
        assert_eq!(action.search_terms(), Some("foo"));
        assert_eq!(action.id(), Some("ekn:///foo"));
        assert_eq!(action.timestamp(), Some(42));
        assert_eq!(action.model().map(|model| model.kind), Some(ModelKind::Article));
        assert_eq!(action.extra("source"), Some(&json!("shell")));
    }

    #[test]
    fn require_type_rejects_missing_and_blank_types() {
        let missing = Action::from_json("{}").expect("empty object should parse");
        assert!(matches!(
            missing.require_type(),
            Err(AppError::InvalidAction(_))
        ));

        let blank = Action::new(ActionType::Other("  ".to_string()));
        assert!(matches!(blank.require_type(), Err(AppError::InvalidAction(_))));

        let valid = Action::new(ActionType::HomeClicked);
        assert_eq!(
            valid.require_type().expect("typed action should validate"),
            &ActionType::HomeClicked
        );
    }

    #[test]
    fn serializes_type_by_name() {
        let action = Action::new(ActionType::SearchTextEntered).with_search_terms("cats");
        let value = serde_json::to_value(&action).expect("action should serialize");
        assert_eq!(value["action_type"], json!("SEARCH_TEXT_ENTERED"));
        assert_eq!(value["search_terms"], json!("cats"));
    }
}
