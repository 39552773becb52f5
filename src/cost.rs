// Analysis cost estimation: token usage per upload type, plus platform fee.

use serde::{Deserialize, Serialize};

pub const PLATFORM_FEE_RATE: f64 = 0.3;
pub const USD_TO_KRW: f64 = 1300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Video,
    Rofl,
    Text,
}

impl FileType {
    pub fn tokens_per_second(self) -> f64 {
        match self {
            FileType::Video => 100.0,
            FileType::Rofl => 30.0,
            FileType::Text => 10.0,
        }
    }

    /// USD per 1000 tokens.
    pub fn rate_per_1k_tokens(self) -> f64 {
        match self {
            FileType::Video => 0.03,
            FileType::Rofl => 0.02,
            FileType::Text => 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    #[default]
    Standard,
    High,
    Premium,
}

impl Quality {
    pub fn multiplier(self) -> f64 {
        match self {
            Quality::Low => 0.5,
            Quality::Standard => 1.0,
            Quality::High => 1.5,
            Quality::Premium => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRequest {
    /// Seconds of footage or replay.
    pub duration: f64,
    pub file_type: FileType,
    #[serde(default)]
    pub quality: Quality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub tokens: f64,
    pub api_cost: f64,
    pub platform_fee: f64,
    pub total_cost: f64,
    pub currency: String,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn calculate_cost(req: &CostRequest) -> CostEstimate {
    let duration = req.duration.max(0.0);
    let tokens = duration * req.file_type.tokens_per_second() * req.quality.multiplier();
    let api_cost = round2(tokens / 1000.0 * req.file_type.rate_per_1k_tokens());
    let platform_fee = round2(api_cost * PLATFORM_FEE_RATE);
    CostEstimate {
        tokens,
        api_cost,
        platform_fee,
        total_cost: round2(api_cost + platform_fee),
        currency: "USD".to_string(),
    }
}

pub fn usd_to_krw(usd: f64) -> f64 {
    (usd * USD_TO_KRW).round()
}
