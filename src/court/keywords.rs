// Classification vocabulary for the keyword-rule analyzer.
//
// Every table here is evaluated in order; earlier rows win ties.

use serde::{Deserialize, Serialize};

// ── Game phase ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Early,
    Mid,
    Late,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Early => "초반",
            Phase::Mid => "중반",
            Phase::Late => "후반",
        }
    }
}

pub const PHASE_RULES: &[(Phase, &[&str])] = &[
    (Phase::Early, &["초반", "라인전", "갱"]),
    (Phase::Late, &["후반", "한타", "넥서스"]),
];

pub const DEFAULT_PHASE: Phase = Phase::Mid;

// ── Team state ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamState {
    Winning,
    Losing,
    Even,
}

impl TeamState {
    pub fn label(self) -> &'static str {
        match self {
            TeamState::Winning => "우세",
            TeamState::Losing => "열세",
            TeamState::Even => "비등",
        }
    }
}

pub const TEAM_STATE_RULES: &[(TeamState, &[&str])] = &[
    (TeamState::Winning, &["이기고", "유리", "앞서", "이기는"]),
    (TeamState::Losing, &["지고", "불리", "밀리", "지는"]),
];

pub const DEFAULT_TEAM_STATE: TeamState = TeamState::Even;

// ── Roles ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Top,
    Jungle,
    Mid,
    Adc,
    Support,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Top => "탑",
            Role::Jungle => "정글",
            Role::Mid => "미드",
            Role::Adc => "원딜",
            Role::Support => "서포터",
        }
    }
}

pub const ROLE_KEYWORDS: &[(Role, &[&str])] = &[
    (Role::Top, &["탑"]),
    (Role::Jungle, &["정글"]),
    (Role::Mid, &["미드"]),
    (Role::Adc, &["원딜", "바텀", "ADC"]),
    (Role::Support, &["서폿", "서포터"]),
];

// ── Champions ────────────────────────────────────────────────────────

pub const CHAMPIONS: &[&str] = &[
    "야스오", "리신", "제드", "티모", "이즈리얼", "징크스", "쓰레쉬", "블리츠크랭크",
    "아리", "럭스", "가렌", "다리우스", "카타리나", "케이틀린", "베인", "룰루",
    "나미", "모르가나", "엘리스", "그레이브즈", "카직스", "렝가", "녹턴", "아무무",
    "세주아니", "자르반", "오리아나", "신드라", "빅토르", "르블랑", "피오라", "이렐리아",
    "카밀", "레넥톤", "말파이트", "애쉬", "카이사", "루시안", "유미", "레오나",
];

// ── Behaviors ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Negative,
    Neutral,
    Positive,
}

#[derive(Debug, Clone, Copy)]
pub struct BehaviorRule {
    pub keyword: &'static str,
    pub label: &'static str,
    pub intent: Intent,
    /// Positive behaviors carry negative severity.
    pub severity: i8,
}

const fn behavior(keyword: &'static str, label: &'static str, intent: Intent, severity: i8) -> BehaviorRule {
    BehaviorRule {
        keyword,
        label,
        intent,
        severity,
    }
}

pub const BEHAVIOR_RULES: &[BehaviorRule] = &[
    behavior("트롤", "고의적 트롤링", Intent::Negative, 3),
    behavior("비난", "팀원 비난", Intent::Negative, 3),
    behavior("욕", "욕설", Intent::Negative, 3),
    behavior("고의", "고의적 방해", Intent::Negative, 3),
    behavior("탈주", "게임 이탈", Intent::Negative, 3),
    behavior("던졌", "무리한 플레이", Intent::Negative, 2),
    behavior("무시", "콜 무시", Intent::Negative, 2),
    behavior("스틸", "자원 가로채기", Intent::Negative, 2),
    behavior("도망", "전투 회피", Intent::Neutral, 2),
    behavior("실패", "플레이 실패", Intent::Neutral, 1),
    behavior("실수", "단순 실수", Intent::Neutral, 1),
    behavior("도움", "팀 지원", Intent::Positive, -1),
    behavior("세이브", "팀원 구출", Intent::Positive, -1),
    behavior("희생", "팀을 위한 희생", Intent::Positive, -2),
    behavior("캐리", "게임 주도", Intent::Positive, -2),
];

pub const NEUTRAL_BEHAVIOR: BehaviorRule = behavior("", "특이 행동 없음", Intent::Neutral, 0);

// ── Responsibility ───────────────────────────────────────────────────

/// Who a responsibility rule blames.
#[derive(Debug, Clone, Copy)]
pub enum Blame {
    Role(Role),
    /// The first role mentioned in the case text.
    FirstMentioned,
}

/// Fires when every group has at least one keyword present.
#[derive(Debug, Clone, Copy)]
pub struct ResponsibilityRule {
    pub groups: &'static [&'static [&'static str]],
    pub blame: Blame,
    pub level: f64,
}

pub const RESPONSIBILITY_RULES: &[ResponsibilityRule] = &[
    ResponsibilityRule {
        groups: &[&["트롤", "고의"]],
        blame: Blame::FirstMentioned,
        level: 0.9,
    },
    ResponsibilityRule {
        groups: &[&["정글"], &["갱"], &["안 와", "안와", "오지 않"]],
        blame: Blame::Role(Role::Jungle),
        level: 0.75,
    },
    ResponsibilityRule {
        groups: &[&["정글"], &["갱"], &["실패"]],
        blame: Blame::Role(Role::Jungle),
        level: 0.7,
    },
    ResponsibilityRule {
        groups: &[&["CS", "미니언"], &["뺏", "스틸"]],
        blame: Blame::FirstMentioned,
        level: 0.65,
    },
    ResponsibilityRule {
        groups: &[&["드래곤", "바론", "오브젝트"], &["뺏", "놓"]],
        blame: Blame::Role(Role::Jungle),
        level: 0.6,
    },
    ResponsibilityRule {
        groups: &[&["한타"], &["혼자", "따로", "늦게"]],
        blame: Blame::FirstMentioned,
        level: 0.6,
    },
    ResponsibilityRule {
        groups: &[&["와드", "시야"], &["없", "안 "]],
        blame: Blame::Role(Role::Support),
        level: 0.5,
    },
];

pub const UNKNOWN_RESPONSIBLE: &str = "상황에 따라 다름";
pub const DEFAULT_RESPONSIBILITY: f64 = 0.5;

// ── Character comparison ─────────────────────────────────────────────

/// Splits fault between the first two champions named in a case.
#[derive(Debug, Clone, Copy)]
pub struct CharacterRule {
    pub keywords: &'static [&'static str],
    /// Share of fault assigned to the first-mentioned champion.
    pub first_share: f64,
    pub note: &'static str,
}

pub const CHARACTER_RULES: &[CharacterRule] = &[
    CharacterRule {
        keywords: &["먼저 들어", "먼저 진입", "이니시"],
        first_share: 0.7,
        note: "먼저 교전을 연 쪽의 판단 책임이 더 큽니다",
    },
    CharacterRule {
        keywords: &["킬 스틸", "막타"],
        first_share: 0.65,
        note: "자원을 가져간 쪽에 책임이 더 있습니다",
    },
    CharacterRule {
        keywords: &["따라가", "따라 들어"],
        first_share: 0.4,
        note: "무리하게 따라 들어간 쪽의 책임도 작지 않습니다",
    },
    CharacterRule {
        keywords: &["버렸", "안 도와", "도와주지"],
        first_share: 0.35,
        note: "도움을 주지 않은 쪽의 책임이 더 큽니다",
    },
];

pub const EVEN_SPLIT_NOTE: &str = "양측의 책임이 비슷합니다";

/// Returns `true` if any keyword occurs in `text`.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_champion_table_has_no_duplicates() {
        let mut names: Vec<&str> = CHAMPIONS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CHAMPIONS.len());
        assert_eq!(CHAMPIONS.len(), 40);
    }

    #[test]
    fn test_behavior_intent_matches_severity_sign() {
        for rule in BEHAVIOR_RULES {
            match rule.intent {
                Intent::Positive => assert!(rule.severity < 0, "{}", rule.keyword),
                _ => assert!(rule.severity > 0, "{}", rule.keyword),
            }
        }
    }

    #[test]
    fn test_responsibility_levels_in_range() {
        for rule in RESPONSIBILITY_RULES {
            assert!((0.0..=1.0).contains(&rule.level));
            assert!(!rule.groups.is_empty());
        }
    }

    #[test]
    fn test_contains_any() {
        assert!(contains_any("정글러가 갱킹", &["갱"]));
        assert!(!contains_any("", &["갱"]));
    }
}
