// Verdict logic: reward-table fault estimation and keyword-rule case analysis.

pub mod actions;
pub mod analyzer;
pub mod fault;
pub mod keywords;
pub mod rewards;
