// Replay records synthesized from uploaded `.rofl` files.
//
// Nothing here is decoded game data: the header supplies a few sizes and the
// rest is generated. `ReplaySource` says whether the header was readable.

pub mod generator;
pub mod header;

use serde::Serialize;

use crate::court::keywords::Role;
use header::RoflHeader;

pub use generator::generate_replay;

pub const TEAM_BLUE: u16 = 100;
pub const TEAM_RED: u16 = 200;
pub const PARTICIPANT_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: u8,
    pub champion: String,
    pub role: Role,
    pub team: u16,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub cs: u32,
    pub level: u32,
    /// 1 is best; a permutation of 1..=10 across the record.
    pub rank: u8,
    pub evaluation: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonsterType {
    Dragon,
    Baron,
    Herald,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildingType {
    Tower,
    Inhibitor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WardType {
    Stealth,
    Control,
    Farsight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventData {
    #[serde(rename_all = "camelCase")]
    ChampionKill { victim_id: u8, assisting_ids: Vec<u8> },
    #[serde(rename_all = "camelCase")]
    EliteMonsterKill { monster_type: MonsterType },
    #[serde(rename_all = "camelCase")]
    BuildingKill { building_type: BuildingType },
    #[serde(rename_all = "camelCase")]
    WardPlaced { ward_type: WardType },
    #[serde(rename_all = "camelCase")]
    ItemPurchased { item_id: u32 },
    #[serde(rename_all = "camelCase")]
    SkillLevelUp { skill_slot: u8 },
    LevelUp { level: u32 },
}

impl EventData {
    /// Kills, elite monsters and buildings.
    pub fn is_highlight(&self) -> bool {
        matches!(
            self,
            EventData::ChampionKill { .. }
                | EventData::EliteMonsterKill { .. }
                | EventData::BuildingKill { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    /// Seconds since game start.
    pub timestamp: u32,
    pub participant_id: u8,
    #[serde(flatten)]
    pub data: EventData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamBreakdown {
    pub team_id: u16,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub objectives: u32,
    pub teamfight_wins: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaAnalysis {
    pub game_phase: String,
    pub key_moments: Vec<String>,
    pub turning_points: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    pub total_kills: u32,
    pub total_deaths: u32,
    pub total_assists: u32,
    pub dragons: u32,
    pub barons: u32,
    pub heralds: u32,
    pub towers: u32,
    pub inhibitors: u32,
    pub highlights: Vec<String>,
    pub teams: Vec<TeamBreakdown>,
    pub meta: MetaAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRecord {
    pub file_name: String,
    pub file_size: u64,
    /// Hex SHA-256 of the upload.
    pub file_hash: String,
    /// Seconds.
    pub duration: u32,
    pub game_mode: String,
    pub map_id: u32,
    pub map_name: String,
    pub game_version: String,
    pub participants: Vec<Participant>,
    pub events: Vec<GameEvent>,
    pub analysis: ReplaySummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    TooShort,
    BadMagic,
}

impl FallbackReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FallbackReason::TooShort => "too_short",
            FallbackReason::BadMagic => "bad_magic",
        }
    }
}

/// Whether a record was derived from a readable header or fabricated from size alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplaySource {
    Parsed { header: RoflHeader },
    Fallback { reason: FallbackReason },
}

impl ReplaySource {
    pub fn label(&self) -> &'static str {
        match self {
            ReplaySource::Parsed { .. } => "parsed",
            ReplaySource::Fallback { .. } => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayAnalysis {
    pub source: ReplaySource,
    #[serde(flatten)]
    pub record: ReplayRecord,
}
