// Heuristic reward table: fixed per-action rewards nudged by an EMA update.
//
// This is a lookup table, not a trained policy. `learn_from_result` is the
// only mutation path; callers sharing a table must serialize writes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::SnapshotError;

pub const LEARNING_RATE: f64 = 0.1;

pub const SEED_REWARDS: &[(&str, f64)] = &[
    ("gank_response_kill", 100.0),
    ("gank_response_escape", 50.0),
    ("gank_response_flash", 30.0),
    ("gank_response_death", -50.0),
    ("gank_ignore_ping", -30.0),
    ("cs_share_wave", 20.0),
    ("cs_contest_enemy", 30.0),
    ("cs_freeze_wave", 25.0),
    ("cs_steal_teammate", -40.0),
    ("dragon_secure", 80.0),
    ("dragon_steal", 120.0),
    ("baron_secure", 150.0),
    ("baron_throw", -100.0),
    ("objective_vision_setup", 40.0),
    ("objective_contest_losing", -60.0),
    ("objective_ignore", -20.0),
];

/// Serializable learning state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningSnapshot {
    pub rewards: BTreeMap<String, f64>,
    /// situation -> action -> value
    #[serde(default)]
    pub action_values: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Clone)]
pub struct HeuristicRewardTable {
    rewards: BTreeMap<String, f64>,
    action_values: BTreeMap<String, BTreeMap<String, f64>>,
}

impl HeuristicRewardTable {
    pub fn new() -> Self {
        Self {
            rewards: SEED_REWARDS
                .iter()
                .map(|(name, reward)| (name.to_string(), *reward))
                .collect(),
            action_values: BTreeMap::new(),
        }
    }

    /// Base reward for an action; unknown actions are worth 0.
    pub fn reward(&self, action: &str) -> f64 {
        self.rewards.get(action).copied().unwrap_or(0.0)
    }

    /// Whether `action` has a reward entry. Feedback is only accepted for these.
    pub fn contains(&self, action: &str) -> bool {
        self.rewards.contains_key(action)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Value learned for `action` within `situation`, if any feedback was recorded.
    pub fn action_value(&self, situation: &str, action: &str) -> Option<f64> {
        self.action_values
            .get(situation)
            .and_then(|actions| actions.get(action))
            .copied()
    }

    /// Move the stored reward toward `observed` by `LEARNING_RATE`.
    /// Returns the updated table reward.
    pub fn learn_from_result(&mut self, action: &str, situation: &str, observed: f64) -> f64 {
        let current = self.reward(action);
        let updated = current + LEARNING_RATE * (observed - current);
        self.rewards.insert(action.to_string(), updated);

        let per_situation = self.action_values.entry(situation.to_string()).or_default();
        let value = per_situation.get(action).copied().unwrap_or(current);
        per_situation.insert(action.to_string(), value + LEARNING_RATE * (observed - value));

        tracing::debug!(action, situation, observed, from = current, to = updated, "reward updated");
        updated
    }

    pub fn export(&self) -> LearningSnapshot {
        LearningSnapshot {
            rewards: self.rewards.clone(),
            action_values: self.action_values.clone(),
        }
    }

    /// Replace the whole table with `snapshot`. No shape validation.
    pub fn import(&mut self, snapshot: LearningSnapshot) {
        self.rewards = snapshot.rewards;
        self.action_values = snapshot.action_values;
    }

    /// Load a snapshot file. A missing file yields the seeded table.
    pub fn load_or_seed(path: &Path) -> Result<Self, SnapshotError> {
        let mut table = Self::new();
        if !path.exists() {
            return Ok(table);
        }
        let raw = std::fs::read_to_string(path)?;
        let snapshot: LearningSnapshot = serde_json::from_str(&raw)?;
        table.import(snapshot);
        tracing::info!("Loaded learning snapshot from {}", path.display());
        Ok(table)
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_string_pretty(&self.export())?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl Default for HeuristicRewardTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rewards() {
        let table = HeuristicRewardTable::new();
        assert_eq!(table.len(), 16);
        assert_eq!(table.reward("gank_response_kill"), 100.0);
        assert_eq!(table.reward("cs_steal_teammate"), -40.0);
    }

    #[test]
    fn test_unknown_action_is_zero() {
        let table = HeuristicRewardTable::new();
        assert_eq!(table.reward("afk_in_fountain"), 0.0);
    }

    #[test]
    fn test_contains_known_actions_only() {
        let table = HeuristicRewardTable::new();
        assert!(SEED_REWARDS.iter().all(|(name, _)| table.contains(name)));
        assert!(!table.contains("afk_in_fountain"));
    }

    #[test]
    fn test_learning_moves_toward_observed() {
        let mut table = HeuristicRewardTable::new();
        let updated = table.learn_from_result("gank_response_kill", "갱킹", 0.0);
        assert!((updated - 90.0).abs() < 1e-9); // 100 + 0.1 * (0 - 100)
        assert!((table.reward("gank_response_kill") - 90.0).abs() < 1e-9);

        let value = table.action_value("갱킹", "gank_response_kill").unwrap();
        assert!((value - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_learning_unknown_action_starts_at_zero() {
        let mut table = HeuristicRewardTable::new();
        let updated = table.learn_from_result("new_action", "situation", 50.0);
        assert!((updated - 5.0).abs() < 1e-9);
        assert_eq!(table.len(), 17);
    }

    #[test]
    fn test_per_situation_values_diverge() {
        let mut table = HeuristicRewardTable::new();
        table.learn_from_result("dragon_secure", "드래곤 한타", 100.0);
        table.learn_from_result("dragon_secure", "드래곤 한타", 100.0);
        table.learn_from_result("dragon_secure", "라인전", 0.0);
        let a = table.action_value("드래곤 한타", "dragon_secure").unwrap();
        let b = table.action_value("라인전", "dragon_secure").unwrap();
        assert!(a > 80.0);
        assert!(b < 80.0);
    }

    #[test]
    fn test_export_import_roundtrip() {
        let mut table = HeuristicRewardTable::new();
        table.learn_from_result("baron_throw", "바론", -200.0);
        let snapshot = table.export();

        let mut restored = HeuristicRewardTable::new();
        restored.import(snapshot.clone());
        assert_eq!(restored.export(), snapshot);
        assert_eq!(restored.reward("baron_throw"), table.reward("baron_throw"));
    }

    #[test]
    fn test_import_replaces_wholesale() {
        let mut table = HeuristicRewardTable::new();
        let mut rewards = BTreeMap::new();
        rewards.insert("only_action".to_string(), 7.0);
        table.import(LearningSnapshot {
            rewards,
            action_values: BTreeMap::new(),
        });
        assert_eq!(table.len(), 1);
        assert_eq!(table.reward("gank_response_kill"), 0.0);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = r#"{"rewards":{"dragon_secure":10.5}}"#;
        let snapshot: LearningSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.rewards["dragon_secure"], 10.5);
        assert!(snapshot.action_values.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("lolcourt-snapshot-{}.json", std::process::id()));
        let mut table = HeuristicRewardTable::new();
        table.learn_from_result("cs_share_wave", "CS", 40.0);
        table.save(&path).unwrap();

        let loaded = HeuristicRewardTable::load_or_seed(&path).unwrap();
        assert_eq!(loaded.export(), table.export());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_seeds() {
        let path = std::env::temp_dir().join("lolcourt-definitely-missing.json");
        let table = HeuristicRewardTable::load_or_seed(&path).unwrap();
        assert_eq!(table.len(), SEED_REWARDS.len());
    }
}
