use crate::rollup::config::Thresholds;
use crate::rollup::manifest::Manifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    DailyPublish,
    MonthlyConsolidate,
    YearlyConsolidate,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DailyPublish => "daily-publish",
            Self::MonthlyConsolidate => "monthly-consolidate",
            Self::YearlyConsolidate => "yearly-consolidate",
        }
    }
}

pub fn daily_publish_due(manifest: &Manifest, thresholds: &Thresholds) -> bool {
    !manifest.daily.is_empty() && manifest.daily.len() <= thresholds.monthly
}

pub fn monthly_due(manifest: &Manifest, thresholds: &Thresholds) -> bool {
    manifest.daily.len() > thresholds.monthly
}

pub fn yearly_due(manifest: &Manifest, thresholds: &Thresholds) -> bool {
    manifest.monthly.len() > thresholds.yearly
}

pub fn monthly_publish_due(manifest: &Manifest, thresholds: &Thresholds) -> bool {
    !manifest.monthly.is_empty() && manifest.monthly.len() <= thresholds.yearly
}

/// Cascade the current manifest would run through, without side effects.
///
/// Consolidations are simulated on a copy so a monthly rollup that tips the
/// monthly count over its threshold also lists the yearly rollup.
pub fn plan(manifest: &Manifest, thresholds: &Thresholds) -> Vec<Transition> {
    let mut sim = manifest.clone();
    let mut out = Vec::new();

    if daily_publish_due(&sim, thresholds) {
        out.push(Transition::DailyPublish);
    }
    if monthly_due(&sim, thresholds) {
        out.push(Transition::MonthlyConsolidate);
        sim.daily.clear();
        sim.monthly.push(String::new());
    }
    if yearly_due(&sim, thresholds) {
        out.push(Transition::YearlyConsolidate);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(daily: usize, monthly: usize) -> Manifest {
        Manifest {
            daily: (1..=daily).map(|d| format!("202401{d:02}")).collect(),
            monthly: (1..=monthly)
                .map(|m| format!("monthly_2023{m:02}01_2023{m:02}28"))
                .collect(),
            yearly: Vec::new(),
        }
    }

    const T: Thresholds = Thresholds {
        monthly: 3,
        yearly: 2,
    };

    #[test]
    fn empty_manifest_plans_nothing() {
        assert!(plan(&Manifest::default(), &T).is_empty());
    }

    #[test]
    fn within_threshold_only_publishes_daily() {
        assert_eq!(plan(&manifest(3, 0), &T), vec![Transition::DailyPublish]);
    }

    #[test]
    fn over_threshold_skips_daily_publish_and_consolidates() {
        assert_eq!(
            plan(&manifest(4, 0), &T),
            vec![Transition::MonthlyConsolidate]
        );
    }

    #[test]
    fn monthly_consolidation_cascades_into_yearly() {
        assert_eq!(
            plan(&manifest(4, 2), &T),
            vec![
                Transition::MonthlyConsolidate,
                Transition::YearlyConsolidate
            ]
        );
        assert_eq!(
            plan(&manifest(2, 3), &T),
            vec![Transition::DailyPublish, Transition::YearlyConsolidate]
        );
    }
}
