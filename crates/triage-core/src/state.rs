use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::collection::CardCollection;
use super::config::TriageConfig;
use super::gesture::GestureMachine;
use super::resolution::FallbackTable;
use super::resolution::OverrideMap;
use super::undo::UndoWindow;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Primary,
    Promotional,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Primary, Category::Promotional];

    pub fn other(self) -> Self {
        match self {
            Self::Primary => Self::Promotional,
            Self::Promotional => Self::Primary,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Promotional => "promotional",
        }
    }
}

/// Declaration order is precedence order: `Critical` sorts first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardState {
    #[default]
    Unseen,
    ActedUpon,
}

impl CardState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unseen => "unseen",
            Self::ActedUpon => "acted upon",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    #[default]
    InApp,
    ExternalLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub kind: ActionKind,
    #[serde(default)]
    pub is_primary: bool,
    /// Lower numbers win. Upstream does not always populate this.
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl SuggestedAction {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            kind: ActionKind::InApp,
            is_primary: false,
            priority: None,
            description: None,
            url: None,
            context: BTreeMap::new(),
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub state: CardState,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub requires_signature: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub suggested_actions: Vec<SuggestedAction>,
}

impl Card {
    pub fn new(id: impl Into<String>, category: Category) -> Self {
        Self {
            id: CardId::new(id),
            category,
            priority: Priority::default(),
            state: CardState::Unseen,
            urgent: false,
            requires_signature: false,
            title: String::new(),
            sender: String::new(),
            suggested_actions: Vec::new(),
        }
    }

    pub fn is_unseen(&self) -> bool {
        self.state == CardState::Unseen
    }

    pub fn suggested_action(&self, action_id: &str) -> Option<&SuggestedAction> {
        self.suggested_actions
            .iter()
            .find(|action| action.id == action_id)
    }

    /// Returns the first suggested action id that appears more than once.
    pub fn duplicate_action_id(&self) -> Option<&str> {
        self.suggested_actions
            .iter()
            .enumerate()
            .find(|(idx, action)| {
                self.suggested_actions[..*idx]
                    .iter()
                    .any(|earlier| earlier.id == action.id)
            })
            .map(|(_, action)| action.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SwipeDirection {
    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DragTranslation {
    pub width: f64,
    pub height: f64,
}

impl DragTranslation {
    pub const ZERO: DragTranslation = DragTranslation {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// What a committed gesture did to its card; drives undo labels and reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommitKind {
    TookAction { action_id: String },
    MarkedRead,
    SavedToFolder { folder: String },
    Snoozed { until_ms: i64 },
}

impl CommitKind {
    pub fn undo_label(&self) -> String {
        match self {
            Self::TookAction { .. } => "Action Taken".to_string(),
            Self::MarkedRead => "Marked as Read".to_string(),
            Self::SavedToFolder { folder } => format!("Saved to {folder}"),
            Self::Snoozed { .. } => "Snoozed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Gesture,
    Collection,
    Undo,
    Resolution,
    Host,
}

impl LogSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Gesture => "gesture",
            Self::Collection => "collection",
            Self::Undo => "undo",
            Self::Resolution => "resolution",
            Self::Host => "host",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub seq: u64,
    pub level: LogLevel,
    pub ts_ms: Option<i64>,
    pub source: LogSource,
    pub context: Option<String>,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, source: LogSource, message: impl Into<String>) -> Self {
        Self {
            seq: 0,
            level,
            ts_ms: None,
            source,
            context: None,
            message: message.into(),
        }
    }

    pub fn at(mut self, ts_ms: i64) -> Self {
        self.ts_ms = Some(ts_ms);
        self
    }

    pub fn for_card(mut self, card_id: &CardId) -> Self {
        self.context = Some(card_id.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct LogBuffer {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            next_seq: 0,
            buf: VecDeque::with_capacity(cap.min(256)),
        }
    }

    pub fn append(&mut self, mut entry: LogEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;

        if self.cap == 0 {
            return;
        }
        while self.buf.len() >= self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.buf.iter()
    }

    pub fn at_least(&self, level: LogLevel) -> impl Iterator<Item = &LogEntry> {
        self.buf.iter().filter(move |entry| entry.level >= level)
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(2_000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FirstCardHint {
    pub has_seen: bool,
}

/// Whole-session state owned by the reducer. Rendering code only reads it.
#[derive(Debug, Clone)]
pub struct TriageState {
    pub config: TriageConfig,
    pub collection: CardCollection,
    pub cursor: usize,
    pub gesture: GestureMachine,
    pub undo: UndoWindow,
    pub overrides: OverrideMap,
    pub fallback_table: Arc<FallbackTable>,
    pub hint: FirstCardHint,
    pub exhausted: bool,
    pub logs: LogBuffer,
}

impl TriageState {
    pub fn new(config: TriageConfig, collection: CardCollection) -> Self {
        let gesture = GestureMachine::new(config.gesture);
        let undo = UndoWindow::new(config.undo.window());
        Self {
            config,
            collection,
            cursor: 0,
            gesture,
            undo,
            overrides: OverrideMap::new(),
            fallback_table: Arc::new(FallbackTable::default()),
            hint: FirstCardHint::default(),
            exhausted: false,
            logs: LogBuffer::default(),
        }
    }

    pub fn with_fallback_table(mut self, table: FallbackTable) -> Self {
        self.fallback_table = Arc::new(table);
        self
    }

    pub fn with_preferences(mut self, overrides: OverrideMap, has_seen_hint: bool) -> Self {
        self.overrides = overrides;
        self.hint.has_seen = has_seen_hint;
        self
    }

    pub fn active_category(&self) -> Category {
        self.collection.category()
    }

    /// The card the gesture machine acts on, if the active view has one.
    pub fn top_card(&self) -> Option<&Card> {
        let filtered = self.collection.filtered();
        let cursor = super::stack::clamp_cursor(self.cursor, filtered.len());
        filtered.get(cursor).copied()
    }

    pub fn should_show_first_card_hint(&self) -> bool {
        !self.hint.has_seen && self.top_card().is_some()
    }

    pub fn log(&mut self, entry: LogEntry) {
        self.logs.append(entry);
    }
}
