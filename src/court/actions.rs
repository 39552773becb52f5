// Game state snapshot and the situational candidate-action generator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::keywords::contains_any;
use super::rewards::HeuristicRewardTable;

/// Match context used for scoring. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameState {
    /// Elapsed game time in seconds.
    pub game_time: f64,
    pub player_level: u32,
    pub team_gold: f64,
    pub enemy_gold: f64,
    pub objectives: BTreeSet<String>,
    pub team_fights: u32,
    pub vision_score: f64,
    pub pressure_score: f64,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            game_time: 600.0,
            player_level: 6,
            team_gold: 0.0,
            enemy_gold: 0.0,
            objectives: BTreeSet::new(),
            team_fights: 0,
            vision_score: 0.5,
            pressure_score: 0.5,
        }
    }
}

const OBJECTIVE_KEYWORDS: &[(&str, &str)] = &[
    ("드래곤", "dragon"),
    ("바론", "baron"),
    ("전령", "herald"),
    ("타워", "tower"),
];

impl GameState {
    /// Clamp the ratio fields into [0, 1].
    pub fn normalized(mut self) -> Self {
        self.vision_score = self.vision_score.clamp(0.0, 1.0);
        self.pressure_score = self.pressure_score.clamp(0.0, 1.0);
        self
    }

    /// Best-effort extraction from a case description.
    ///
    /// Recognizes `N분` (minutes), `레벨 N` / `N레벨`, objective names and
    /// counts of `한타`. Anything missing keeps its default.
    pub fn from_description(text: &str) -> Self {
        let mut state = GameState::default();

        if let Some(minutes) = number_before(text, "분") {
            state.game_time = minutes as f64 * 60.0;
        }
        if let Some(level) = number_after(text, "레벨").or_else(|| number_before(text, "레벨")) {
            state.player_level = level.clamp(1, 18);
        }
        for (keyword, objective) in OBJECTIVE_KEYWORDS {
            if text.contains(keyword) {
                state.objectives.insert(objective.to_string());
            }
        }
        state.team_fights = text.matches("한타").count() as u32;
        state
    }

    /// `(team - enemy) / max(team, enemy, 1)`
    pub fn gold_delta_ratio(&self) -> f64 {
        let denom = self.team_gold.max(self.enemy_gold).max(1.0);
        (self.team_gold - self.enemy_gold) / denom
    }
}

/// Digits immediately preceding the first occurrence of `marker`.
fn number_before(text: &str, marker: &str) -> Option<u32> {
    text.match_indices(marker).find_map(|(idx, _)| {
        let head = text[..idx].trim_end();
        let digits: String = head
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        digits.parse().ok()
    })
}

/// Digits immediately following the first occurrence of `marker`.
fn number_after(text: &str, marker: &str) -> Option<u32> {
    text.match_indices(marker).find_map(|(idx, m)| {
        let tail = text[idx + m.len()..].trim_start();
        let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    })
}

/// A candidate behavior in a given situation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAction {
    pub action: String,
    pub situation: String,
    pub expected_reward: f64,
    pub risk: f64,
    /// Seconds spent on the action.
    pub time_cost: f64,
    pub team_benefit: f64,
    pub personal_benefit: f64,
}

impl GameAction {
    pub fn new(
        action: &str,
        situation: &str,
        expected_reward: f64,
        risk: f64,
        time_cost: f64,
        team_benefit: f64,
        personal_benefit: f64,
    ) -> Self {
        Self {
            action: action.to_string(),
            situation: situation.to_string(),
            expected_reward,
            risk: risk.clamp(0.0, 1.0),
            time_cost: time_cost.max(0.0),
            team_benefit: team_benefit.clamp(0.0, 1.0),
            personal_benefit: personal_benefit.clamp(0.0, 1.0),
        }
    }
}

/// (action, risk, time cost, team benefit, personal benefit)
type ActionTemplate = (&'static str, f64, f64, f64, f64);

struct SituationGroup {
    keywords: &'static [&'static str],
    actions: &'static [ActionTemplate],
}

const SITUATION_GROUPS: &[SituationGroup] = &[
    SituationGroup {
        keywords: &["갱킹", "gank"],
        actions: &[
            ("gank_response_kill", 0.6, 15.0, 0.8, 0.7),
            ("gank_response_escape", 0.2, 10.0, 0.4, 0.6),
            ("gank_response_flash", 0.3, 5.0, 0.3, 0.5),
            ("gank_response_death", 0.9, 30.0, 0.0, 0.0),
        ],
    },
    SituationGroup {
        keywords: &["CS", "미니언"],
        actions: &[
            ("cs_share_wave", 0.1, 20.0, 0.7, 0.3),
            ("cs_contest_enemy", 0.4, 25.0, 0.5, 0.6),
            ("cs_freeze_wave", 0.2, 40.0, 0.4, 0.5),
            ("cs_steal_teammate", 0.1, 15.0, 0.0, 0.8),
        ],
    },
    SituationGroup {
        keywords: &["드래곤", "바론", "오브젝트"],
        actions: &[
            ("dragon_secure", 0.4, 30.0, 0.9, 0.3),
            ("baron_secure", 0.6, 45.0, 1.0, 0.3),
            ("objective_vision_setup", 0.2, 40.0, 0.7, 0.2),
            ("objective_contest_losing", 0.8, 40.0, 0.3, 0.2),
        ],
    },
];

/// Enumerate the actions relevant to `situation`. Empty when no group keyword matches.
pub fn candidate_actions(situation: &str, table: &HeuristicRewardTable) -> Vec<GameAction> {
    SITUATION_GROUPS
        .iter()
        .filter(|group| contains_any(situation, group.keywords))
        .flat_map(|group| group.actions.iter())
        .map(|&(name, risk, time_cost, team, personal)| {
            GameAction::new(name, situation, table.reward(name), risk, time_cost, team, personal)
        })
        .collect()
}
