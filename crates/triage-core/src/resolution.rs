//! Effective-action resolution for a card.
//!
//! Resolution is layered, first match wins:
//! 1. a user override for the card id,
//! 2. the suggested action flagged primary,
//! 3. the suggested action with the lowest numeric priority,
//! 4. the first applicable entry of the per-category fallback table.
//!
//! Everything here is a pure function of its inputs.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Captures;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use super::state::Card;
use super::state::CardId;
use super::state::Category;
use super::state::SuggestedAction;

pub type OverrideMap = BTreeMap<CardId, String>;

pub const GENERIC_OVERRIDE_LABEL: &str = "Take Action";
pub const VIEW_DETAILS_ID: &str = "view_details";
pub const VIEW_DETAILS_LABEL: &str = "View Details";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Override,
    PrimarySuggestion,
    RankedSuggestion,
    Fallback,
    Generic,
    Selected,
}

impl ResolutionSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::PrimarySuggestion => "primary-suggestion",
            Self::RankedSuggestion => "ranked-suggestion",
            Self::Fallback => "fallback",
            Self::Generic => "generic",
            Self::Selected => "selected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAction {
    pub action_id: String,
    pub label: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub source: ResolutionSource,
}

impl ResolvedAction {
    fn view_details() -> Self {
        Self {
            action_id: VIEW_DETAILS_ID.to_string(),
            label: VIEW_DETAILS_LABEL.to_string(),
            description: None,
            url: None,
            source: ResolutionSource::Generic,
        }
    }

    pub fn from_suggestion(action: &SuggestedAction, source: ResolutionSource) -> Self {
        Self {
            action_id: action.id.clone(),
            label: action.display_name.clone(),
            description: action
                .description
                .as_deref()
                .map(|template| describe_action(template, &action.context).into_owned()),
            url: action.url.clone(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackCondition {
    RequiresSignature,
}

impl FallbackCondition {
    fn holds_for(self, card: &Card) -> bool {
        match self {
            Self::RequiresSignature => card.requires_signature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackEntry {
    pub action_id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub when: Option<FallbackCondition>,
}

impl FallbackEntry {
    fn new(action_id: &str, label: &str, description: &str, icon: &str) -> Self {
        Self {
            action_id: action_id.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            when: None,
        }
    }

    fn only_when(mut self, condition: FallbackCondition) -> Self {
        self.when = Some(condition);
        self
    }

    pub fn applies_to(&self, card: &Card) -> bool {
        self.when.map_or(true, |condition| condition.holds_for(card))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FallbackTableError {
    #[error("fallback table has no entries for category `{}`", .0.label())]
    MissingCategory(Category),
}

/// Static per-category action table, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackTable {
    entries: BTreeMap<Category, Vec<FallbackEntry>>,
}

impl FallbackTable {
    pub fn new(entries: BTreeMap<Category, Vec<FallbackEntry>>) -> Result<Self, FallbackTableError> {
        let table = Self { entries };
        table.validate()?;
        Ok(table)
    }

    pub fn from_yaml(text: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let table: FallbackTable = serde_yaml::from_str(text)?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), FallbackTableError> {
        for category in Category::ALL {
            if self.entries.get(&category).map_or(true, Vec::is_empty) {
                return Err(FallbackTableError::MissingCategory(category));
            }
        }
        Ok(())
    }

    pub fn entries_for(&self, category: Category) -> &[FallbackEntry] {
        self.entries
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn applicable<'a>(&'a self, card: &'a Card) -> impl Iterator<Item = &'a FallbackEntry> + 'a {
        self.entries_for(card.category)
            .iter()
            .filter(move |entry| entry.applies_to(card))
    }

    fn entry(&self, category: Category, action_id: &str) -> Option<&FallbackEntry> {
        self.entries_for(category)
            .iter()
            .find(|entry| entry.action_id == action_id)
    }
}

impl Default for FallbackTable {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            Category::Primary,
            vec![
                FallbackEntry::new(
                    "sign_send",
                    "Sign & Send",
                    "Sign the attached document and reply",
                    "signature",
                )
                .only_when(FallbackCondition::RequiresSignature),
                FallbackEntry::new(
                    "acknowledge",
                    "Acknowledge",
                    "Let the sender know you saw this",
                    "checkmark.circle",
                ),
                FallbackEntry::new(
                    "save_later",
                    "Save for Later",
                    "Keep this in your saved folder",
                    "bookmark",
                ),
            ],
        );
        entries.insert(
            Category::Promotional,
            vec![
                FallbackEntry::new("claim_deal", "Claim Deal", "Open the offer", "tag"),
                FallbackEntry::new("save_deal", "Save Deal", "Keep the offer for later", "bookmark"),
                FallbackEntry::new("check_in", "Check In", "Check in with the store", "location"),
            ],
        );
        Self { entries }
    }
}

pub fn resolve_effective_action(
    card: &Card,
    overrides: &OverrideMap,
    table: &FallbackTable,
) -> ResolvedAction {
    if let Some(action_id) = overrides.get(&card.id) {
        return resolve_override(card, action_id, table);
    }

    if let Some(action) = primary_suggestion(&card.suggested_actions) {
        return ResolvedAction::from_suggestion(action, ResolutionSource::PrimarySuggestion);
    }

    if let Some(action) = ranked_suggestion(&card.suggested_actions) {
        return ResolvedAction::from_suggestion(action, ResolutionSource::RankedSuggestion);
    }

    match table.applicable(card).next() {
        Some(entry) => ResolvedAction {
            action_id: entry.action_id.clone(),
            label: entry.label.clone(),
            description: (!entry.description.is_empty()).then(|| entry.description.clone()),
            url: None,
            source: ResolutionSource::Fallback,
        },
        None => ResolvedAction::view_details(),
    }
}

fn resolve_override(card: &Card, action_id: &str, table: &FallbackTable) -> ResolvedAction {
    if let Some(action) = card.suggested_action(action_id) {
        return ResolvedAction::from_suggestion(action, ResolutionSource::Override);
    }

    let (label, description) = match table.entry(card.category, action_id) {
        Some(entry) => (entry.label.clone(), Some(entry.description.clone())),
        None => (GENERIC_OVERRIDE_LABEL.to_string(), None),
    };
    ResolvedAction {
        action_id: action_id.to_string(),
        label,
        description: description.filter(|text| !text.is_empty()),
        url: None,
        source: ResolutionSource::Override,
    }
}

fn primary_suggestion(actions: &[SuggestedAction]) -> Option<&SuggestedAction> {
    actions.iter().find(|action| action.is_primary)
}

/// Missing priorities rank last; ties keep list order.
fn ranked_suggestion(actions: &[SuggestedAction]) -> Option<&SuggestedAction> {
    actions
        .iter()
        .enumerate()
        .min_by_key(|(idx, action)| (action.priority.unwrap_or(u32::MAX), *idx))
        .map(|(_, action)| action)
}

fn placeholder_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").ok())
        .as_ref()
}

/// Fills `{key}` placeholders from an action's context map. Unknown keys stay verbatim.
pub fn describe_action<'a>(template: &'a str, context: &BTreeMap<String, String>) -> Cow<'a, str> {
    let Some(pattern) = placeholder_pattern() else {
        return Cow::Borrowed(template);
    };
    if context.is_empty() {
        return Cow::Borrowed(template);
    }
    pattern.replace_all(template, |caps: &Captures<'_>| {
        context
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    })
}
