use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::resolution::OverrideMap;
use super::state::CardId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreferenceEvent {
    OverrideSet { card_id: CardId, action_id: String },
    OverrideCleared { card_id: CardId },
    FirstCardHintSeen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub seq: u64,
    pub ts_ms: i64,
    #[serde(flatten)]
    pub event: PreferenceEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub overrides: OverrideMap,
    pub has_seen_first_card_hint: bool,
}

/// Append-only JSONL log of preference changes, read once at session start.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    next_seq: u64,
}

impl PreferenceStore {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let existing = load_records(path.as_path())?;
        let next_seq = existing
            .iter()
            .map(|record| record.seq)
            .max()
            .map_or(1, |seq| seq.saturating_add(1));
        Ok(Self { path, next_seq })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn append(&mut self, event: PreferenceEvent) -> std::io::Result<u64> {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        let record = PreferenceRecord {
            seq,
            ts_ms: chrono::Utc::now().timestamp_millis(),
            event,
        };
        let line = serde_json::to_string(&record)
            .map_err(|err| std::io::Error::other(format!("serialize: {err}")))?;
        append_line(self.path.as_path(), line.as_str())?;
        Ok(seq)
    }

    pub fn load(&self) -> std::io::Result<Vec<PreferenceRecord>> {
        load_records(self.path.as_path())
    }

    pub fn preferences(&self) -> std::io::Result<Preferences> {
        Ok(replay_preferences(&self.load()?))
    }
}

/// Folds a preference log into its current value. Later records win.
pub fn replay_preferences(records: &[PreferenceRecord]) -> Preferences {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|record| record.seq);

    let mut prefs = Preferences::default();
    for record in sorted {
        match record.event {
            PreferenceEvent::OverrideSet { card_id, action_id } => {
                prefs.overrides.insert(card_id, action_id);
            }
            PreferenceEvent::OverrideCleared { card_id } => {
                prefs.overrides.remove(&card_id);
            }
            PreferenceEvent::FirstCardHintSeen => {
                prefs.has_seen_first_card_hint = true;
            }
        }
    }
    prefs
}

fn load_records(path: &Path) -> std::io::Result<Vec<PreferenceRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        // A torn final line from a crash is skipped rather than failing the session.
        if let Ok(record) = serde_json::from_str::<PreferenceRecord>(&line) {
            records.push(record);
        }
    }
    Ok(records)
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.flush()?;
    Ok(())
}
