// Keyword-rule verdict analyzer.
//
// Total over every input string: each extraction step has a fallback, so an
// empty description still produces a structurally valid verdict.

use serde::{Deserialize, Serialize};

use super::keywords::*;

pub const VERDICT_GUILTY: &str = "유죄";
pub const VERDICT_PARTIAL: &str = "부분 유죄";
pub const VERDICT_JUSTIFIED: &str = "정당한 행동";
pub const VERDICT_INNOCENT: &str = "무죄";

pub const CONFIDENCE_LEVELS: [f64; 4] = [0.75, 0.8, 0.85, 0.9];

const DOWNGRADE_RESPONSIBILITY: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseContext {
    pub phase: Phase,
    pub team_state: TeamState,
    pub roles: Vec<Role>,
    pub champions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Behavior {
    pub label: String,
    pub intent: Intent,
    pub severity: i8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Responsibility {
    pub primary: String,
    pub secondary: Option<String>,
    pub level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterAnalysis {
    pub primary_fault: String,
    pub secondary_fault: String,
    /// Fault share of `primary_fault`, in [0.5, 1].
    pub primary_share: f64,
    pub comparison: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictAnalysis {
    pub verdict: String,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punishment: Option<String>,
    pub confidence: f64,
    pub factors: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_analysis: Option<CharacterAnalysis>,
}

// ── Extraction ───────────────────────────────────────────────────────

fn classify<T: Copy>(text: &str, rules: &[(T, &[&str])], default: T) -> T {
    rules
        .iter()
        .find(|(_, keywords)| contains_any(text, keywords))
        .map(|(class, _)| *class)
        .unwrap_or(default)
}

pub fn extract_context(text: &str) -> CaseContext {
    let roles = ROLE_KEYWORDS
        .iter()
        .filter(|(_, keywords)| contains_any(text, keywords))
        .map(|(role, _)| *role)
        .collect();

    let mut found: Vec<(usize, &str)> = CHAMPIONS
        .iter()
        .filter_map(|name| text.find(name).map(|pos| (pos, *name)))
        .collect();
    found.sort_by_key(|(pos, _)| *pos);

    CaseContext {
        phase: classify(text, PHASE_RULES, DEFAULT_PHASE),
        team_state: classify(text, TEAM_STATE_RULES, DEFAULT_TEAM_STATE),
        roles,
        champions: found.into_iter().map(|(_, name)| name.to_string()).collect(),
    }
}

/// The matching behavior with the largest absolute severity; earlier rows win ties.
pub fn extract_behavior(text: &str) -> Behavior {
    let rule = BEHAVIOR_RULES
        .iter()
        .filter(|rule| text.contains(rule.keyword))
        .fold(NEUTRAL_BEHAVIOR, |best, rule| {
            if rule.severity.unsigned_abs() > best.severity.unsigned_abs() {
                *rule
            } else {
                best
            }
        });
    Behavior {
        label: rule.label.to_string(),
        intent: rule.intent,
        severity: rule.severity,
    }
}

pub fn extract_responsibility(text: &str, context: &CaseContext) -> Responsibility {
    let rule = RESPONSIBILITY_RULES
        .iter()
        .find(|rule| rule.groups.iter().all(|group| contains_any(text, group)));

    let Some(rule) = rule else {
        return Responsibility {
            primary: context
                .roles
                .first()
                .map(|r| r.label().to_string())
                .unwrap_or_else(|| UNKNOWN_RESPONSIBLE.to_string()),
            secondary: None,
            level: DEFAULT_RESPONSIBILITY,
        };
    };

    let primary = match rule.blame {
        Blame::Role(role) => Some(role),
        Blame::FirstMentioned => context.roles.first().copied(),
    };
    let secondary = context
        .roles
        .iter()
        .find(|r| Some(**r) != primary)
        .map(|r| r.label().to_string());

    Responsibility {
        primary: primary
            .map(|r| r.label().to_string())
            .unwrap_or_else(|| UNKNOWN_RESPONSIBLE.to_string()),
        secondary,
        level: rule.level,
    }
}

/// Fault split between the first two named champions; `None` with fewer than two.
pub fn compare_characters(text: &str, context: &CaseContext) -> Option<CharacterAnalysis> {
    let [first, second, ..] = context.champions.as_slice() else {
        return None;
    };

    let (first_share, note) = CHARACTER_RULES
        .iter()
        .find(|rule| contains_any(text, rule.keywords))
        .map(|rule| (rule.first_share, rule.note))
        .unwrap_or((0.5, EVEN_SPLIT_NOTE));

    let (primary, secondary, share) = if first_share >= 0.5 {
        (first, second, first_share)
    } else {
        (second, first, 1.0 - first_share)
    };
    let share_pct = (share * 100.0).round() as u32;

    Some(CharacterAnalysis {
        primary_fault: primary.clone(),
        secondary_fault: secondary.clone(),
        primary_share: share,
        comparison: format!(
            "{primary} {share_pct}% / {secondary} {}%: {note}.",
            100 - share_pct
        ),
    })
}

// ── Verdict synthesis ────────────────────────────────────────────────

struct Ruling {
    verdict: &'static str,
    confidence: f64,
}

fn rule_verdict(behavior: &Behavior, context: &CaseContext) -> Ruling {
    let (verdict, confidence) = match (behavior.intent, behavior.severity) {
        (Intent::Negative, s) if s >= 3 => (VERDICT_GUILTY, 0.9),
        (Intent::Negative, 2) => (VERDICT_PARTIAL, 0.85),
        (Intent::Negative, _) => (VERDICT_PARTIAL, 0.75),
        (Intent::Positive, _) => (VERDICT_JUSTIFIED, 0.85),
        (Intent::Neutral, s) if s >= 2 => match context.team_state {
            TeamState::Losing => (VERDICT_PARTIAL, 0.75),
            _ => (VERDICT_INNOCENT, 0.8),
        },
        (Intent::Neutral, _) => match context.phase {
            Phase::Late => (VERDICT_INNOCENT, 0.75),
            _ => (VERDICT_INNOCENT, 0.8),
        },
    };
    Ruling { verdict, confidence }
}

fn phase_reasoning(phase: Phase) -> &'static str {
    match phase {
        Phase::Early => "라인전 단계의 손해는 이후 성장 격차로 이어지기 쉽습니다",
        Phase::Mid => "중반 운영에서는 오브젝트와 합류 타이밍이 승패를 가릅니다",
        Phase::Late => "후반에는 한 번의 실수가 곧바로 게임 패배로 이어집니다",
    }
}

fn team_state_reasoning(state: TeamState) -> &'static str {
    match state {
        TeamState::Winning => "유리한 상황에서는 무리한 선택을 피해야 했습니다",
        TeamState::Losing => "불리한 상황이었던 만큼 팀 전체의 판단도 함께 고려했습니다",
        TeamState::Even => "팽팽한 상황에서의 선택으로 판단했습니다",
    }
}

fn punishment_for(verdict: &str, behavior: &Behavior) -> Option<String> {
    match verdict {
        VERDICT_GUILTY => Some(format!("{}에 대해 채팅 제한 및 랭크 게임 제한을 권고합니다", behavior.label)),
        VERDICT_PARTIAL => Some("경고 조치와 함께 플레이 복기를 권고합니다".to_string()),
        _ => None,
    }
}

fn phase_recommendation(phase: Phase) -> &'static str {
    match phase {
        Phase::Early => "라인전 단계에서는 정글 위치를 확인하고 와드를 활용하세요",
        Phase::Mid => "오브젝트 1분 전부터 시야를 장악하고 합류를 준비하세요",
        Phase::Late => "한타 전에는 팀원과 진입 타이밍을 맞추세요",
    }
}

pub fn analyze_case(text: &str) -> VerdictAnalysis {
    let context = extract_context(text);
    let behavior = extract_behavior(text);
    let responsibility = extract_responsibility(text, &context);
    let character_analysis = compare_characters(text, &context);

    let mut ruling = rule_verdict(&behavior, &context);
    if responsibility.level > DOWNGRADE_RESPONSIBILITY && ruling.verdict == VERDICT_INNOCENT {
        ruling.verdict = VERDICT_PARTIAL;
    }

    let mut reasoning = format!(
        "{} 단계, 팀 상황 {}에서 '{}' 행동이 확인되었습니다. {}. {}.",
        context.phase.label(),
        context.team_state.label(),
        behavior.label,
        phase_reasoning(context.phase),
        team_state_reasoning(context.team_state),
    );
    reasoning.push_str(&format!(
        " 주 책임: {} ({:.0}%)",
        responsibility.primary,
        responsibility.level * 100.0
    ));
    if let Some(secondary) = &responsibility.secondary {
        reasoning.push_str(&format!(", 부 책임: {secondary}"));
    }
    reasoning.push('.');

    let mut factors = vec![
        format!("게임 단계: {}", context.phase.label()),
        format!("팀 상황: {}", context.team_state.label()),
        format!("행동: {}", behavior.label),
    ];
    factors.extend(context.roles.iter().map(|r| format!("관련 포지션: {}", r.label())));
    factors.extend(context.champions.iter().map(|c| format!("관련 챔피언: {c}")));

    let mut recommendations = vec![phase_recommendation(context.phase).to_string()];
    if behavior.intent == Intent::Negative {
        recommendations.push("감정적인 대응보다 핑과 채팅으로 의도를 공유하세요".to_string());
    }
    if context.roles.len() >= 2 {
        recommendations.push("팀원 간 역할 분담과 소통을 명확히 하세요".to_string());
    }

    VerdictAnalysis {
        verdict: ruling.verdict.to_string(),
        reasoning,
        punishment: punishment_for(ruling.verdict, &behavior),
        confidence: ruling.confidence,
        factors,
        recommendations,
        character_analysis,
    }
}
