//! Aggregate statistics screen: rates, health score and mood derived from the
//! stats overview endpoint.

use shared::protocol::StatsOverview;
use tracing::warn;

use crate::ClientsApi;

const PAID_WEIGHT: f64 = 0.6;
const ACTIVE_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Excellent,
    Good,
    NeedsAttention,
}

impl Mood {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::Excellent,
            60..=79 => Self::Good,
            _ => Self::NeedsAttention,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsAttention => "Needs attention",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            Self::Excellent => "Everything looks solid.",
            Self::Good => "Minor improvements possible.",
            Self::NeedsAttention => "Focus on unpaid & inactive.",
        }
    }
}

/// Clamps a percentage into `0..=100`; non-finite input becomes 0.
pub fn clamp_pct(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

fn rate(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

fn rounded_pct(value: f64) -> u8 {
    clamp_pct(value).round() as u8
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub stats: StatsOverview,
    pub paid_rate: f64,
    pub active_rate: f64,
    pub health_score: u8,
    pub mood: Mood,
}

impl DashboardSummary {
    pub fn from_stats(stats: StatsOverview) -> Self {
        let paid_rate = rate(stats.paid, stats.total);
        let active_rate = rate(stats.active, stats.total);
        let health_score = rounded_pct(paid_rate * PAID_WEIGHT + active_rate * ACTIVE_WEIGHT);
        Self {
            stats,
            paid_rate,
            active_rate,
            health_score,
            mood: Mood::from_score(health_score),
        }
    }

    pub fn paid_rate_pct(&self) -> u8 {
        rounded_pct(self.paid_rate)
    }

    pub fn active_rate_pct(&self) -> u8 {
        rounded_pct(self.active_rate)
    }

    pub fn today_new(&self) -> u64 {
        self.stats.today_new.unwrap_or(0)
    }

    pub fn last7_new(&self) -> u64 {
        self.stats.last7_new.unwrap_or(0)
    }
}

/// Fetches the overview; a failed fetch renders as all-zero stats.
pub async fn load_dashboard(api: &dyn ClientsApi) -> DashboardSummary {
    let stats = match api.stats_overview().await {
        Ok(stats) => stats,
        Err(error) => {
            warn!(%error, "dashboard: stats unavailable, showing zeros");
            StatsOverview::default()
        }
    };
    DashboardSummary::from_stats(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(total: u64, paid: u64, active: u64) -> StatsOverview {
        StatsOverview {
            total,
            paid,
            unpaid: total.saturating_sub(paid),
            active,
            today_new: None,
            last7_new: None,
        }
    }

    #[test]
    fn empty_collection_scores_zero() {
        let summary = DashboardSummary::from_stats(StatsOverview::default());
        assert_eq!(summary.paid_rate, 0.0);
        assert_eq!(summary.active_rate, 0.0);
        assert_eq!(summary.health_score, 0);
        assert_eq!(summary.mood, Mood::NeedsAttention);
        assert_eq!(summary.today_new(), 0);
    }

    #[test]
    fn health_score_weights_paid_over_active() {
        // 50% paid, 100% active -> 30 + 40
        let summary = DashboardSummary::from_stats(stats(10, 5, 10));
        assert_eq!(summary.health_score, 70);
        assert_eq!(summary.mood, Mood::Good);

        // 100% paid, 50% active -> 60 + 20
        let summary = DashboardSummary::from_stats(stats(10, 10, 5));
        assert_eq!(summary.health_score, 80);
        assert_eq!(summary.mood, Mood::Excellent);
    }

    #[test]
    fn mood_thresholds() {
        assert_eq!(Mood::from_score(100), Mood::Excellent);
        assert_eq!(Mood::from_score(79), Mood::Good);
        assert_eq!(Mood::from_score(60), Mood::Good);
        assert_eq!(Mood::from_score(59), Mood::NeedsAttention);
    }

    #[test]
    fn rates_are_clamped_for_display() {
        // inconsistent server counts must not produce > 100%
        let summary = DashboardSummary::from_stats(stats(4, 6, 1));
        assert_eq!(summary.paid_rate_pct(), 100);
        assert_eq!(summary.active_rate_pct(), 25);
        assert_eq!(clamp_pct(f64::NAN), 0.0);
        assert_eq!(clamp_pct(-3.0), 0.0);
    }
}
