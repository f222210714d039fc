//! Inbox fixtures: the ordered card list handed over by ingestion, as YAML or JSON.

use std::path::Path;

use serde::Deserialize;

use super::collection::CardCollection;
use super::collection::CollectionError;
use super::state::Card;
use super::state::Category;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("parse json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InboxDocument {
    Wrapped { cards: Vec<Card> },
    Bare(Vec<Card>),
}

impl InboxDocument {
    fn into_cards(self) -> Vec<Card> {
        match self {
            Self::Wrapped { cards } | Self::Bare(cards) => cards,
        }
    }
}

pub fn parse_cards_yaml(text: &str) -> Result<Vec<Card>, FixtureError> {
    Ok(serde_yaml::from_str::<InboxDocument>(text)?.into_cards())
}

pub fn parse_cards_json(text: &str) -> Result<Vec<Card>, FixtureError> {
    Ok(serde_json::from_str::<InboxDocument>(text)?.into_cards())
}

/// Loads a fixture by extension (`.json`, otherwise YAML) into a collection that
/// starts on `category`.
pub fn load_collection(path: &Path, category: Category) -> Result<CardCollection, FixtureError> {
    let text = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let cards = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => parse_cards_json(&text)?,
        _ => parse_cards_yaml(&text)?,
    };
    Ok(CardCollection::new(cards, category)?)
}
