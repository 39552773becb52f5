// LLM-friendly documentation endpoint content.

pub const LLMS_TXT: &str = r#"# LoL Court API
> Submit League of Legends gameplay disputes and receive a rule-based verdict assigning fault.

## API Base URL
/api/

## Key Endpoints
- POST /api/verdict - Judge a case: {caseDescription, gameData?, actualAction?, situation?}
- GET /api/cases - List past cases (?limit, ?offset)
- GET/DELETE /api/cases/{id} - Get/delete a case
- POST /api/replays/analyze?fileName=... - Upload raw .rofl bytes for a synthesized match report
- POST /api/cost/estimate - Estimate analysis cost: {duration, fileType: video|rofl|text, quality}
- POST /api/payments - Record a mock payment: {amount, currency, paymentMethod, fileName, duration}
- GET /api/payments/{paymentId} - Look up a mock payment
- POST /api/learning/feedback - Nudge a known action's reward: {action, situation, reward}
- GET /api/learning/export - Download the reward table
- PUT /api/learning/import - Replace the reward table
- POST /api/learning/save - Write the reward table to the snapshot file

## Verdicts
Labels: 유죄, 부분 유죄, 정당한 행동, 무죄. Confidence is one of 0.75, 0.8, 0.85, 0.9.

## Replays
Only the 32-byte header is read. Match statistics are generated, not decoded.
`source.kind` is `parsed` when the header was readable and `fallback` otherwise.
"#;
