// Optimal-action selection and fault estimation against the reward table.

use serde::{Deserialize, Serialize};

use super::actions::{candidate_actions, GameAction, GameState};
use super::rewards::HeuristicRewardTable;

const RISK_PENALTY: f64 = -50.0;
const TEAM_BENEFIT_WEIGHT: f64 = 0.7;
const PERSONAL_BENEFIT_WEIGHT: f64 = 0.3;

const CORRECT_THRESHOLD: f64 = 0.2;
const IMPROVEMENT_THRESHOLD: f64 = 0.5;

/// Weight by elapsed game time: later decisions matter more.
pub fn time_weight(game_time: f64) -> f64 {
    if game_time < 300.0 {
        0.8
    } else if game_time < 900.0 {
        1.0
    } else if game_time < 1800.0 {
        1.2
    } else {
        1.5
    }
}

/// Weight by relative gold lead.
pub fn team_weight(gold_delta_ratio: f64) -> f64 {
    if gold_delta_ratio > 0.2 {
        1.3
    } else if gold_delta_ratio > 0.0 {
        1.1
    } else if gold_delta_ratio > -0.2 {
        1.0
    } else {
        0.8
    }
}

/// Weighted score of one candidate.
pub fn score_action(action: &GameAction, state: &GameState, table: &HeuristicRewardTable) -> f64 {
    let base = table.reward(&action.action);
    let blended = action.team_benefit * TEAM_BENEFIT_WEIGHT + action.personal_benefit * PERSONAL_BENEFIT_WEIGHT;
    base * time_weight(state.game_time) * team_weight(state.gold_delta_ratio())
        + action.risk * RISK_PENALTY
        + blended * 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAction {
    pub action: String,
    pub score: f64,
}

/// Highest-scoring candidate; the first one wins ties.
pub fn select_optimal(
    candidates: &[GameAction],
    state: &GameState,
    table: &HeuristicRewardTable,
) -> Option<ScoredAction> {
    candidates
        .iter()
        .map(|a| ScoredAction {
            action: a.action.clone(),
            score: score_action(a, state, table),
        })
        .fold(None, |best: Option<ScoredAction>, next| match best {
            Some(b) if b.score >= next.score => Some(b),
            _ => Some(next),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Judgment {
    Correct,
    RoomForImprovement,
    Incorrect,
    /// No candidate action applied to the situation.
    Undetermined,
}

impl Judgment {
    pub fn from_fault(fault: f64) -> Self {
        if fault < CORRECT_THRESHOLD {
            Judgment::Correct
        } else if fault < IMPROVEMENT_THRESHOLD {
            Judgment::RoomForImprovement
        } else {
            Judgment::Incorrect
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Judgment::Correct => "correct",
            Judgment::RoomForImprovement => "room_for_improvement",
            Judgment::Incorrect => "incorrect",
            Judgment::Undetermined => "undetermined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultEstimate {
    pub judgment: Judgment,
    pub verdict: String,
    pub reasoning: String,
    pub optimal_action: Option<String>,
    pub expected_reward: f64,
    pub actual_action: String,
    pub actual_reward: f64,
    /// Normalized shortfall against the optimal action, in [0, 1].
    pub fault: f64,
    pub candidates: Vec<ScoredAction>,
}

/// `(optimal - actual) / optimal`, clamped into [0, 1]; 0 when optimal <= 0.
pub fn normalized_fault(optimal_score: f64, actual_reward: f64) -> f64 {
    if optimal_score <= 0.0 {
        return 0.0;
    }
    ((optimal_score - actual_reward) / optimal_score).clamp(0.0, 1.0)
}

pub fn estimate_fault(
    situation: &str,
    state: &GameState,
    actual_action: &str,
    table: &HeuristicRewardTable,
) -> FaultEstimate {
    let candidates = candidate_actions(situation, table);
    let actual_reward = table.reward(actual_action);
    let scored: Vec<ScoredAction> = candidates
        .iter()
        .map(|a| ScoredAction {
            action: a.action.clone(),
            score: score_action(a, state, table),
        })
        .collect();

    let Some(optimal) = select_optimal(&candidates, state, table) else {
        return FaultEstimate {
            judgment: Judgment::Undetermined,
            verdict: "판단 불가: 상황에 맞는 행동 후보가 없습니다.".to_string(),
            reasoning: "설명에서 갱킹, CS, 오브젝트 상황을 찾지 못해 비교할 기준이 없습니다.".to_string(),
            optimal_action: None,
            expected_reward: 0.0,
            actual_action: actual_action.to_string(),
            actual_reward,
            fault: 0.0,
            candidates: scored,
        };
    };

    let fault = normalized_fault(optimal.score, actual_reward);
    let judgment = Judgment::from_fault(fault);
    let verdict = match judgment {
        Judgment::Correct => format!("올바른 판단입니다. 최적의 선택은 {}였습니다.", optimal.action),
        Judgment::RoomForImprovement => {
            format!("개선의 여지가 있습니다. {}이(가) 더 나은 선택이었습니다.", optimal.action)
        }
        _ => format!("잘못된 판단입니다. {}을(를) 선택했어야 합니다.", optimal.action),
    };
    let reasoning = format!(
        "최적 행동 {}의 기대 점수 {:.1} 대비 실제 행동 {}의 보상은 {:.1}입니다 (과실 {:.0}%).",
        optimal.action,
        optimal.score,
        actual_action,
        actual_reward,
        fault * 100.0
    );

    FaultEstimate {
        judgment,
        verdict,
        reasoning,
        optimal_action: Some(optimal.action),
        expected_reward: optimal.score,
        actual_action: actual_action.to_string(),
        actual_reward,
        fault,
        candidates: scored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(game_time: f64) -> GameState {
        GameState {
            game_time,
            ..GameState::default()
        }
    }

    #[test]
    fn test_time_weight_steps() {
        assert_eq!(time_weight(0.0), 0.8);
        assert_eq!(time_weight(299.0), 0.8);
        assert_eq!(time_weight(300.0), 1.0);
        assert_eq!(time_weight(900.0), 1.2);
        assert_eq!(time_weight(1800.0), 1.5);
    }

    #[test]
    fn test_team_weight_steps() {
        assert_eq!(team_weight(0.5), 1.3);
        assert_eq!(team_weight(0.1), 1.1);
        assert_eq!(team_weight(0.0), 1.0);
        assert_eq!(team_weight(-0.1), 1.0);
        assert_eq!(team_weight(-0.2), 0.8);
    }

    #[test]
    fn test_score_formula() {
        let table = HeuristicRewardTable::new();
        let action = GameAction::new("gank_response_kill", "갱킹", 100.0, 0.6, 15.0, 0.8, 0.7);
        // 100 * 1.0 * 1.0 - 30 + (0.56 + 0.21) * 100
        let score = score_action(&action, &state_at(600.0), &table);
        assert!((score - 147.0).abs() < 1e-9);
    }

    #[test]
    fn test_gank_optimal_is_kill() {
        let table = HeuristicRewardTable::new();
        let est = estimate_fault("갱킹 당함", &state_at(600.0), "gank_response_kill", &table);
        assert_eq!(est.optimal_action.as_deref(), Some("gank_response_kill"));
        assert_eq!(est.actual_reward, 100.0);
        // (147 - 100) / 147
        assert!((est.fault - 47.0 / 147.0).abs() < 1e-9);
        assert_eq!(est.judgment, Judgment::RoomForImprovement);
        assert_eq!(est.candidates.len(), 4);
    }

    #[test]
    fn test_negative_actual_reward_caps_fault() {
        let table = HeuristicRewardTable::new();
        let est = estimate_fault("갱킹", &state_at(600.0), "gank_response_death", &table);
        assert_eq!(est.fault, 1.0);
        assert_eq!(est.judgment, Judgment::Incorrect);
    }

    #[test]
    fn test_unknown_actual_action_rewards_zero() {
        let table = HeuristicRewardTable::new();
        let est = estimate_fault("CS 문제", &state_at(600.0), "dance", &table);
        assert_eq!(est.actual_reward, 0.0);
        assert_eq!(est.fault, 1.0);
    }

    #[test]
    fn test_empty_candidates_undetermined() {
        let table = HeuristicRewardTable::new();
        let est = estimate_fault("아무 말", &state_at(600.0), "gank_response_kill", &table);
        assert_eq!(est.judgment, Judgment::Undetermined);
        assert!(est.optimal_action.is_none());
        assert_eq!(est.fault, 0.0);
        assert_eq!(est.expected_reward, 0.0);
    }

    #[test]
    fn test_normalized_fault_guards() {
        assert_eq!(normalized_fault(0.0, 10.0), 0.0);
        assert_eq!(normalized_fault(-5.0, 10.0), 0.0);
        assert_eq!(normalized_fault(100.0, 150.0), 0.0);
        assert_eq!(normalized_fault(100.0, 50.0), 0.5);
    }

    #[test]
    fn test_ties_keep_first() {
        let table = HeuristicRewardTable::new();
        let a = GameAction::new("unknown_a", "s", 0.0, 0.0, 0.0, 0.5, 0.5);
        let b = GameAction::new("unknown_b", "s", 0.0, 0.0, 0.0, 0.5, 0.5);
        let best = select_optimal(&[a, b], &state_at(600.0), &table).unwrap();
        assert_eq!(best.action, "unknown_a");
    }

    #[test]
    fn test_late_game_lead_amplifies_objectives() {
        let table = HeuristicRewardTable::new();
        let state = GameState {
            game_time: 2000.0,
            team_gold: 60000.0,
            enemy_gold: 40000.0,
            ..GameState::default()
        };
        let est = estimate_fault("바론 앞", &state, "baron_secure", &table);
        assert_eq!(est.optimal_action.as_deref(), Some("baron_secure"));
        // 150 * 1.5 * 1.3 - 30 + 79
        assert!((est.expected_reward - 341.5).abs() < 1e-6);
        // the raw reward is compared against the weighted score
        assert!((est.fault - (341.5 - 150.0) / 341.5).abs() < 1e-6);
    }

    #[test]
    fn test_learning_changes_estimate() {
        let mut table = HeuristicRewardTable::new();
        let state = state_at(600.0);
        let before = estimate_fault("갱킹", &state, "gank_response_escape", &table);
        for _ in 0..20 {
            table.learn_from_result("gank_response_escape", "갱킹", 300.0);
        }
        let after = estimate_fault("갱킹", &state, "gank_response_escape", &table);
        assert!(after.fault < before.fault);
    }
}
