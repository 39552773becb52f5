// Replay synthesis. Sizes from the header steer a seeded RNG; the same upload
// always produces the same record.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use super::header::RoflHeader;
use super::*;
use crate::court::keywords::{Role, CHAMPIONS};
use crate::error::HeaderError;

const MIN_MINUTES: f64 = 10.0;
const MAX_MINUTES: f64 = 40.0;
const MINUTES_PER_MB: f64 = 1.5;
const FULL_SECTIONS_BONUS: f64 = 1.2;

const BYTES_PER_INTENSITY: f64 = 8.0 * 1024.0 * 1024.0;
const MIN_INTENSITY: f64 = 0.5;
const MAX_INTENSITY: f64 = 3.0;

/// Stat multiplier applied to team 100.
const BLUE_SIDE_BONUS: f64 = 1.1;

const KDA_WEIGHT: f64 = 0.5;
const CS_WEIGHT: f64 = 0.3;
const LEVEL_WEIGHT: f64 = 0.2;

const MAX_EVENTS: usize = 400;
const MAX_HIGHLIGHTS: usize = 8;

const ROLES: [Role; 5] = [Role::Top, Role::Jungle, Role::Mid, Role::Adc, Role::Support];
const ITEM_IDS: &[u32] = &[1055, 1056, 2055, 3006, 3031, 3071, 3089, 3153, 3157, 6672];

/// Synthesize a replay record for an upload. Never fails: an unreadable
/// header switches to the size-only generator.
pub fn generate_replay(bytes: &[u8], file_name: &str) -> ReplayAnalysis {
    let digest = Sha256::digest(bytes);
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    let mut rng = StdRng::seed_from_u64(u64::from_le_bytes(seed));
    let file_hash = hex::encode(digest);
    let file_size = bytes.len() as u64;

    match RoflHeader::parse(bytes) {
        Ok(header) => ReplayAnalysis {
            source: ReplaySource::Parsed { header },
            record: from_header(&header, file_size, file_name, file_hash, &mut rng),
        },
        Err(e) => {
            let reason = match e {
                HeaderError::TooShort(_) => FallbackReason::TooShort,
                HeaderError::BadMagic => FallbackReason::BadMagic,
            };
            tracing::warn!(
                reason = reason.as_str(),
                "Replay {file_name} ({file_size} bytes) not readable, fabricating: {e}"
            );
            ReplayAnalysis {
                source: ReplaySource::Fallback { reason },
                record: from_size_only(file_size, file_name, file_hash, &mut rng),
            }
        }
    }
}

/// Game length in seconds derived from file size and section presence.
pub fn estimate_duration(file_size: u64, header: &RoflHeader, rng: &mut impl Rng) -> u32 {
    let size_mb = file_size as f64 / (1024.0 * 1024.0);
    let mut minutes = (MIN_MINUTES + size_mb * MINUTES_PER_MB).clamp(MIN_MINUTES, MAX_MINUTES);
    if header.has_metadata() && header.has_payload() {
        minutes *= FULL_SECTIONS_BONUS;
    }
    let seconds = (minutes.clamp(MIN_MINUTES, MAX_MINUTES) * 60.0) as u32 + rng.gen_range(0..60);
    seconds.clamp((MIN_MINUTES * 60.0) as u32, (MAX_MINUTES * 60.0) as u32)
}

pub fn estimate_intensity(file_size: u64) -> f64 {
    (file_size as f64 / BYTES_PER_INTENSITY).clamp(MIN_INTENSITY, MAX_INTENSITY)
}

fn from_header(
    header: &RoflHeader,
    file_size: u64,
    file_name: &str,
    file_hash: String,
    rng: &mut StdRng,
) -> ReplayRecord {
    let duration = estimate_duration(file_size, header, rng);
    let intensity = estimate_intensity(file_size);
    let participants = generate_participants(duration, intensity, rng);
    let events = generate_events(duration, intensity, &participants, rng);
    let analysis = summarize(duration, &participants, &events);

    ReplayRecord {
        file_name: file_name.to_string(),
        file_size,
        file_hash,
        duration,
        game_mode: "CLASSIC".to_string(),
        map_id: 11,
        map_name: "소환사의 협곡".to_string(),
        game_version: format!("14.{}", header.version % 24 + 1),
        participants,
        events,
        analysis,
    }
}

/// Used when the header cannot be read at all.
fn from_size_only(file_size: u64, file_name: &str, file_hash: String, rng: &mut StdRng) -> ReplayRecord {
    let minutes = (15.0 + file_size as f64 / (1024.0 * 1024.0)).clamp(15.0, 35.0);
    let duration = (minutes * 60.0) as u32 + rng.gen_range(0..60);
    let participants = generate_participants(duration, 1.0, rng);
    let events = generate_events(duration, 1.0, &participants, rng);
    let analysis = summarize(duration, &participants, &events);

    ReplayRecord {
        file_name: file_name.to_string(),
        file_size,
        file_hash,
        duration,
        game_mode: "CLASSIC".to_string(),
        map_id: 11,
        map_name: "소환사의 협곡".to_string(),
        game_version: "unknown".to_string(),
        participants,
        events,
        analysis,
    }
}

// ── Participants ─────────────────────────────────────────────────────

/// 50% KDA, 30% CS per minute, 20% level; each term scaled to 0..=100.
pub fn participant_score(kills: u32, deaths: u32, assists: u32, cs: u32, level: u32, minutes: f64) -> f64 {
    let kda = (kills + assists) as f64 / deaths.max(1) as f64;
    let kda_term = (kda / 6.0).min(1.0) * 100.0;
    let cs_term = (cs as f64 / (minutes.max(1.0) * 10.0)).min(1.0) * 100.0;
    let level_term = (level as f64 / 18.0).min(1.0) * 100.0;
    let score = kda_term * KDA_WEIGHT + cs_term * CS_WEIGHT + level_term * LEVEL_WEIGHT;
    (score * 10.0).round() / 10.0
}

fn evaluation(score: f64) -> &'static str {
    if score >= 80.0 {
        "MVP급 활약"
    } else if score >= 60.0 {
        "좋은 플레이"
    } else if score >= 40.0 {
        "평균적인 플레이"
    } else {
        "개선이 필요한 플레이"
    }
}

/// Assign ranks 1..=n by score descending; ties keep id order.
pub fn assign_ranks(participants: &mut [Participant]) {
    let mut order: Vec<usize> = (0..participants.len()).collect();
    order.sort_by(|&a, &b| {
        participants[b]
            .score
            .total_cmp(&participants[a].score)
            .then(participants[a].id.cmp(&participants[b].id))
    });
    for (rank, idx) in order.into_iter().enumerate() {
        participants[idx].rank = rank as u8 + 1;
    }
}

fn generate_participants(duration: u32, intensity: f64, rng: &mut StdRng) -> Vec<Participant> {
    let minutes = duration as f64 / 60.0;
    let champions: Vec<&str> = CHAMPIONS.choose_multiple(rng, PARTICIPANT_COUNT).copied().collect();

    let mut participants: Vec<Participant> = champions
        .into_iter()
        .enumerate()
        .map(|(i, champion)| {
            let team = if i < 5 { TEAM_BLUE } else { TEAM_RED };
            let role = ROLES[i % 5];
            let bonus = if team == TEAM_BLUE { BLUE_SIDE_BONUS } else { 1.0 };
            let kill_share = if role == Role::Support { 0.4 } else { 1.0 };

            let kills = (rng.gen_range(0.0..8.0) * intensity * bonus * kill_share).round() as u32;
            let deaths = (rng.gen_range(0.0..7.0) * intensity).round() as u32;
            let assists = (rng.gen_range(0.0..12.0) * intensity * bonus).round() as u32;
            let cs_per_minute = match role {
                Role::Support => rng.gen_range(1.0..2.5),
                Role::Jungle => rng.gen_range(4.5..6.5),
                _ => rng.gen_range(6.0..9.0),
            };
            let cs = (cs_per_minute * minutes * bonus).round() as u32;
            let level = ((6.0 + minutes / 2.5 + rng.gen_range(0.0..2.0)) as u32).min(18);
            let score = participant_score(kills, deaths, assists, cs, level, minutes);

            Participant {
                id: i as u8 + 1,
                champion: champion.to_string(),
                role,
                team,
                kills,
                deaths,
                assists,
                cs,
                level,
                rank: 0,
                evaluation: evaluation(score).to_string(),
                score,
            }
        })
        .collect();

    assign_ranks(&mut participants);
    participants
}

// ── Events ───────────────────────────────────────────────────────────

fn generate_events(duration: u32, intensity: f64, participants: &[Participant], rng: &mut StdRng) -> Vec<GameEvent> {
    let minutes = duration as f64 / 60.0;
    let count = ((minutes * 6.0 * intensity) as usize).clamp(20, MAX_EVENTS);

    let mut events: Vec<GameEvent> = (0..count)
        .map(|_| {
            let timestamp = rng.gen_range(0..duration.max(1));
            let actor = &participants[rng.gen_range(0..participants.len())];
            let data = random_event(timestamp, actor, participants, rng);
            GameEvent {
                timestamp,
                participant_id: actor.id,
                data,
            }
        })
        .collect();

    events.sort_by_key(|e| e.timestamp);
    events
}

fn random_event(timestamp: u32, actor: &Participant, participants: &[Participant], rng: &mut StdRng) -> EventData {
    match rng.gen_range(0..100) {
        0..=24 => {
            let enemies: Vec<u8> = participants.iter().filter(|p| p.team != actor.team).map(|p| p.id).collect();
            let allies: Vec<u8> = participants
                .iter()
                .filter(|p| p.team == actor.team && p.id != actor.id)
                .map(|p| p.id)
                .collect();
            let victim_id = enemies[rng.gen_range(0..enemies.len())];
            let helpers = rng.gen_range(0..=2);
            let mut assisting_ids: Vec<u8> = allies.choose_multiple(rng, helpers).copied().collect();
            assisting_ids.sort_unstable();
            EventData::ChampionKill {
                victim_id,
                assisting_ids,
            }
        }
        25..=31 => {
            let monster_type = if timestamp >= 1200 && rng.gen_bool(0.3) {
                MonsterType::Baron
            } else if timestamp < 840 && rng.gen_bool(0.4) {
                MonsterType::Herald
            } else {
                MonsterType::Dragon
            };
            EventData::EliteMonsterKill { monster_type }
        }
        32..=39 => {
            let building_type = if timestamp >= 900 && rng.gen_bool(0.2) {
                BuildingType::Inhibitor
            } else {
                BuildingType::Tower
            };
            EventData::BuildingKill { building_type }
        }
        40..=59 => {
            let ward_type = match rng.gen_range(0..10) {
                0..=5 => WardType::Stealth,
                6..=8 => WardType::Control,
                _ => WardType::Farsight,
            };
            EventData::WardPlaced { ward_type }
        }
        60..=77 => EventData::ItemPurchased {
            item_id: ITEM_IDS[rng.gen_range(0..ITEM_IDS.len())],
        },
        78..=91 => EventData::SkillLevelUp {
            skill_slot: rng.gen_range(1..=4),
        },
        _ => EventData::LevelUp {
            level: rng.gen_range(2..=18),
        },
    }
}

// ── Summary ──────────────────────────────────────────────────────────

fn clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn champion_of(participants: &[Participant], id: u8) -> &str {
    participants
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.champion.as_str())
        .unwrap_or("알 수 없음")
}

fn describe(event: &GameEvent, participants: &[Participant]) -> Option<String> {
    let actor = champion_of(participants, event.participant_id);
    let text = match &event.data {
        EventData::ChampionKill { victim_id, .. } => {
            format!("{actor}이(가) {}을(를) 처치", champion_of(participants, *victim_id))
        }
        EventData::EliteMonsterKill { monster_type } => {
            let name = match monster_type {
                MonsterType::Dragon => "드래곤",
                MonsterType::Baron => "바론",
                MonsterType::Herald => "협곡의 전령",
            };
            format!("{actor}이(가) {name} 처치")
        }
        EventData::BuildingKill { building_type } => {
            let name = match building_type {
                BuildingType::Tower => "포탑",
                BuildingType::Inhibitor => "억제기",
            };
            format!("{actor}이(가) {name} 파괴")
        }
        _ => return None,
    };
    Some(format!("{} {}", clock(event.timestamp), text))
}

/// 60% of `total` to the favored side, the rest to the other.
fn split_60_40(total: u32) -> (u32, u32) {
    let favored = (total as f64 * 0.6).round() as u32;
    (favored, total - favored)
}

fn count_monsters(events: &[GameEvent], kind: MonsterType) -> u32 {
    events
        .iter()
        .filter(|e| matches!(&e.data, EventData::EliteMonsterKill { monster_type } if *monster_type == kind))
        .count() as u32
}

fn count_buildings(events: &[GameEvent], kind: BuildingType) -> u32 {
    events
        .iter()
        .filter(|e| matches!(&e.data, EventData::BuildingKill { building_type } if *building_type == kind))
        .count() as u32
}

fn first_monster(events: &[GameEvent], kind: MonsterType) -> Option<u32> {
    events
        .iter()
        .find(|e| matches!(&e.data, EventData::EliteMonsterKill { monster_type } if *monster_type == kind))
        .map(|e| e.timestamp)
}

fn summarize(duration: u32, participants: &[Participant], events: &[GameEvent]) -> ReplaySummary {
    let dragons = count_monsters(events, MonsterType::Dragon);
    let barons = count_monsters(events, MonsterType::Baron);
    let heralds = count_monsters(events, MonsterType::Herald);
    let towers = count_buildings(events, BuildingType::Tower);
    let inhibitors = count_buildings(events, BuildingType::Inhibitor);

    let kill_events = events
        .iter()
        .filter(|e| matches!(e.data, EventData::ChampionKill { .. }))
        .count() as u32;
    let (blue_objectives, red_objectives) = split_60_40(dragons + barons + heralds + towers + inhibitors);
    let (blue_fights, red_fights) = split_60_40(kill_events / 5);

    let team = |team_id: u16, objectives: u32, teamfight_wins: u32| {
        let members = participants.iter().filter(|p| p.team == team_id);
        TeamBreakdown {
            team_id,
            kills: members.clone().map(|p| p.kills).sum(),
            deaths: members.clone().map(|p| p.deaths).sum(),
            assists: members.map(|p| p.assists).sum(),
            objectives,
            teamfight_wins,
        }
    };

    let highlights = events
        .iter()
        .filter(|e| e.data.is_highlight())
        .take(MAX_HIGHLIGHTS)
        .filter_map(|e| describe(e, participants))
        .collect();

    let total_deaths: u32 = participants.iter().map(|p| p.deaths).sum();

    ReplaySummary {
        total_kills: participants.iter().map(|p| p.kills).sum(),
        total_deaths,
        total_assists: participants.iter().map(|p| p.assists).sum(),
        dragons,
        barons,
        heralds,
        towers,
        inhibitors,
        highlights,
        teams: vec![
            team(TEAM_BLUE, blue_objectives, blue_fights),
            team(TEAM_RED, red_objectives, red_fights),
        ],
        meta: meta_analysis(duration, dragons, barons, total_deaths, events),
    }
}

fn meta_analysis(duration: u32, dragons: u32, barons: u32, total_deaths: u32, events: &[GameEvent]) -> MetaAnalysis {
    let minutes = duration / 60;
    let game_phase = if minutes < 20 {
        "초반 스노우볼 게임"
    } else if minutes < 30 {
        "중반 운영 게임"
    } else {
        "후반 한타 게임"
    };

    let mut key_moments = Vec::new();
    if dragons > 0 {
        key_moments.push(format!("드래곤 {dragons}회 처치로 오브젝트 주도권이 갈렸습니다"));
    }
    if barons > 0 {
        key_moments.push(format!("바론 {barons}회 처치가 후반 운영을 결정했습니다"));
    }
    if key_moments.is_empty() {
        key_moments.push("큰 오브젝트 교전 없이 라인전 위주로 진행되었습니다".to_string());
    }

    let mut turning_points = Vec::new();
    if let Some(ts) = first_monster(events, MonsterType::Baron) {
        turning_points.push(format!("{} 첫 바론 처치가 승부의 분수령이었습니다", clock(ts)));
    }
    if let Some(ts) = first_monster(events, MonsterType::Dragon) {
        turning_points.push(format!("{} 첫 드래곤 이후 교전 양상이 바뀌었습니다", clock(ts)));
    }
    if turning_points.is_empty() {
        turning_points.push("뚜렷한 전환점이 없었습니다".to_string());
    }

    let mut recommendations = Vec::new();
    if minutes >= 30 {
        recommendations.push("후반 한타 전 시야 확보에 집중하세요".to_string());
    }
    if dragons == 0 {
        recommendations.push("드래곤 타이밍에 맞춰 바텀 주도권을 잡으세요".to_string());
    }
    if total_deaths as usize > PARTICIPANT_COUNT * 6 {
        recommendations.push("불필요한 데스를 줄이고 안전하게 운영하세요".to_string());
    }
    if recommendations.is_empty() {
        recommendations.push("현재 운영 방식을 유지하며 오브젝트 타이밍을 챙기세요".to_string());
    }

    MetaAnalysis {
        game_phase: game_phase.to_string(),
        key_moments,
        turning_points,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rofl_bytes(size: usize, metadata_length: u32) -> Vec<u8> {
        let header = RoflHeader {
            version: 3,
            file_length: size as u32,
            metadata_offset: 32,
            metadata_length,
            payload_header_offset: 32 + metadata_length,
            payload_header_length: 34,
            payload_offset: 66 + metadata_length,
        };
        let mut bytes = header.to_bytes().to_vec();
        bytes.resize(size.max(32), 7);
        bytes
    }

    fn assert_invariants(analysis: &ReplayAnalysis) {
        let record = &analysis.record;
        assert_eq!(record.participants.len(), PARTICIPANT_COUNT);
        let blue = record.participants.iter().filter(|p| p.team == TEAM_BLUE).count();
        let red = record.participants.iter().filter(|p| p.team == TEAM_RED).count();
        assert_eq!((blue, red), (5, 5));

        let mut ranks: Vec<u8> = record.participants.iter().map(|p| p.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=10).collect::<Vec<u8>>());

        let mut by_rank = record.participants.clone();
        by_rank.sort_by_key(|p| p.rank);
        for pair in by_rank.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }

        for pair in record.events.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        assert!(record.events.iter().all(|e| e.timestamp < record.duration));
        assert!(record.analysis.highlights.len() <= MAX_HIGHLIGHTS);
    }

    #[test]
    fn test_parsed_replay() {
        let bytes = rofl_bytes(4096, 512);
        let analysis = generate_replay(&bytes, "match.rofl");
        assert!(matches!(analysis.source, ReplaySource::Parsed { .. }));
        assert_eq!(analysis.record.file_name, "match.rofl");
        assert_eq!(analysis.record.file_size, 4096);
        assert_eq!(analysis.record.game_version, "14.4");
        assert_invariants(&analysis);
    }

    #[test]
    fn test_same_bytes_same_record() {
        let bytes = rofl_bytes(2048, 64);
        assert_eq!(generate_replay(&bytes, "a.rofl"), generate_replay(&bytes, "a.rofl"));
    }

    #[test]
    fn test_empty_buffer_falls_back() {
        let analysis = generate_replay(&[], "empty.rofl");
        assert_eq!(
            analysis.source,
            ReplaySource::Fallback {
                reason: FallbackReason::TooShort
            }
        );
        assert_eq!(analysis.record.game_version, "unknown");
        assert_invariants(&analysis);
    }

    #[test]
    fn test_wrong_magic_falls_back() {
        let mut bytes = rofl_bytes(1024, 0);
        bytes[..4].copy_from_slice(b"RIOT");
        let analysis = generate_replay(&bytes, "video.mp4");
        assert_eq!(
            analysis.source,
            ReplaySource::Fallback {
                reason: FallbackReason::BadMagic
            }
        );
        assert_invariants(&analysis);
    }

    #[test]
    fn test_duration_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let small = RoflHeader::parse(&rofl_bytes(64, 0)).unwrap();
        let d = estimate_duration(64, &small, &mut rng);
        assert!((600..660).contains(&d));

        let huge = RoflHeader::parse(&rofl_bytes(64, 16)).unwrap();
        let d = estimate_duration(500 * 1024 * 1024, &huge, &mut rng);
        assert_eq!(d, 2400);
    }

    #[test]
    fn test_full_sections_lengthen_game() {
        let size = 8 * 1024 * 1024;
        let with = RoflHeader {
            file_length: size as u32,
            ..RoflHeader::parse(&rofl_bytes(64, 128)).unwrap()
        };
        let without = RoflHeader {
            metadata_length: 0,
            ..with
        };
        let mut rng = StdRng::seed_from_u64(9);
        let a = estimate_duration(size, &with, &mut rng);
        let mut rng = StdRng::seed_from_u64(9);
        let b = estimate_duration(size, &without, &mut rng);
        assert!(a > b);
    }

    #[test]
    fn test_intensity_clamped() {
        assert_eq!(estimate_intensity(0), MIN_INTENSITY);
        assert_eq!(estimate_intensity(u64::MAX), MAX_INTENSITY);
        assert!((estimate_intensity(16 * 1024 * 1024) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_participant_score_weights() {
        // perfect KDA, 10 cs/min, level 18
        assert_eq!(participant_score(6, 0, 0, 200, 18, 20.0), 100.0);
        assert_eq!(participant_score(0, 5, 0, 0, 0, 20.0), 0.0);
        // only level counts
        assert_eq!(participant_score(0, 1, 0, 0, 9, 20.0), 10.0);
    }

    #[test]
    fn test_assign_ranks_ties_by_id() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut participants = generate_participants(1500, 1.0, &mut rng);
        for p in participants.iter_mut() {
            p.score = 50.0;
        }
        assign_ranks(&mut participants);
        for p in &participants {
            assert_eq!(p.rank, p.id);
        }
    }

    #[test]
    fn test_split_60_40() {
        assert_eq!(split_60_40(0), (0, 0));
        assert_eq!(split_60_40(10), (6, 4));
        assert_eq!(split_60_40(1), (1, 0));
    }

    #[test]
    fn test_summary_totals_match_participants() {
        let analysis = generate_replay(&rofl_bytes(10_000, 100), "x.rofl");
        let record = &analysis.record;
        let kills: u32 = record.participants.iter().map(|p| p.kills).sum();
        assert_eq!(record.analysis.total_kills, kills);
        let team_kills: u32 = record.analysis.teams.iter().map(|t| t.kills).sum();
        assert_eq!(team_kills, kills);
        assert!(!record.analysis.meta.recommendations.is_empty());
        assert!(!record.analysis.meta.key_moments.is_empty());
    }

    #[test]
    fn test_event_json_shape() {
        let analysis = generate_replay(&rofl_bytes(4096, 512), "match.rofl");
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["source"]["kind"], "parsed");
        assert_eq!(json["mapId"], 11);
        let event = &json["events"][0];
        assert!(event["type"].is_string());
        assert!(event["timestamp"].is_number());
        assert!(event["participantId"].is_number());
    }

    proptest! {
        #[test]
        fn prop_any_bytes_produce_valid_record(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let analysis = generate_replay(&bytes, "fuzz.rofl");
            assert_invariants(&analysis);
        }

        #[test]
        fn prop_valid_headers_parse(size in 32usize..20_000, meta in 0u32..4096) {
            let analysis = generate_replay(&rofl_bytes(size, meta), "ok.rofl");
            prop_assert!(matches!(analysis.source, ReplaySource::Parsed { .. }), "expected ReplaySource::Parsed");
            assert_invariants(&analysis);
        }
    }
}
