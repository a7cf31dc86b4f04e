//! Phenotype classification
//!
//! Scores four mutually exclusive deviation patterns, picks the strongest, and
//! attaches the fixed body-system mapping for that pattern. Confidence comes
//! from how clearly the winner beats the runner-up, not from its magnitude.

use tracing::debug;

use crate::config::PhenotypeConfig;
use crate::types::{EvidenceStrength, HealthDomain, RiskPattern, RiskPhenotype, TrendAnalysis, ZScores};

/// Fixed association of a pattern with health domains and evidence strength
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternProfile {
    pub pattern: RiskPattern,
    pub domains: &'static [HealthDomain],
    pub evidence: EvidenceStrength,
}

/// Pattern lookup table, in enumeration order
pub static PATTERN_PROFILES: [PatternProfile; 4] = [
    PatternProfile {
        pattern: RiskPattern::FragmentationDominant,
        domains: &[HealthDomain::Cardiovascular, HealthDomain::Metabolic],
        evidence: EvidenceStrength::Strong,
    },
    PatternProfile {
        pattern: RiskPattern::DeepSleepReduction,
        domains: &[HealthDomain::Cardiometabolic, HealthDomain::Cognitive],
        evidence: EvidenceStrength::Strong,
    },
    PatternProfile {
        pattern: RiskPattern::RemInstability,
        domains: &[HealthDomain::Cognitive, HealthDomain::Neurological],
        evidence: EvidenceStrength::Moderate,
    },
    PatternProfile {
        pattern: RiskPattern::EfficiencyInstability,
        domains: &[HealthDomain::Metabolic, HealthDomain::MentalHealth],
        evidence: EvidenceStrength::Moderate,
    },
];

impl RiskPattern {
    pub fn profile(&self) -> &'static PatternProfile {
        // Table rows follow enumeration order
        &PATTERN_PROFILES[*self as usize]
    }

    pub fn associated_domains(&self) -> &'static [HealthDomain] {
        self.profile().domains
    }

    pub fn evidence_strength(&self) -> EvidenceStrength {
        self.profile().evidence
    }
}

/// Match score of every pattern, in enumeration order
///
/// Formula:
/// ```text
/// fragmentation_dominant = max(0,  z_awakenings)
/// deep_sleep_reduction   = max(0, -z_deep_sleep)
/// rem_instability        = |z_rem_sleep| + SVI/50
/// efficiency_instability = max(0, -efficiency_slope * 30) + SVI/50
/// ```
pub fn pattern_scores(
    z: &ZScores,
    trends: &TrendAnalysis,
    svi: f64,
    config: &PhenotypeConfig,
) -> [(RiskPattern, f64); 4] {
    let svi_term = svi / config.svi_divisor;
    [
        (RiskPattern::FragmentationDominant, z.awakenings.max(0.0)),
        (RiskPattern::DeepSleepReduction, (-z.deep_sleep).max(0.0)),
        (RiskPattern::RemInstability, z.rem_sleep.abs() + svi_term),
        (
            RiskPattern::EfficiencyInstability,
            (-trends.efficiency_slope * config.efficiency_slope_scale).max(0.0) + svi_term,
        ),
    ]
}

/// Classify the dominant deviation pattern
///
/// Ties go to the earlier pattern in enumeration order. Confidence is
/// `min(1, max(floor, floor + (1 - floor) * min(1, separation / 2)))`.
pub fn classify_phenotype(
    z: &ZScores,
    trends: &TrendAnalysis,
    svi: f64,
    config: &PhenotypeConfig,
) -> RiskPhenotype {
    let scores = pattern_scores(z, trends, svi, config);

    let (winner, best) = scores
        .iter()
        .copied()
        .fold(scores[0], |acc, candidate| if candidate.1 > acc.1 { candidate } else { acc });

    let runner_up = scores
        .iter()
        .filter(|(pattern, _)| *pattern != winner)
        .map(|(_, score)| *score)
        .fold(f64::NEG_INFINITY, f64::max);

    let separation = (best - runner_up).max(0.0);
    let confidence = separation_confidence(separation, config);

    debug!(
        pattern = winner.as_str(),
        best,
        runner_up,
        confidence,
        "classified phenotype"
    );

    RiskPhenotype {
        primary_pattern: winner,
        confidence,
        associated_domains: winner.associated_domains().to_vec(),
        evidence_strength: winner.evidence_strength(),
    }
}

fn separation_confidence(separation: f64, config: &PhenotypeConfig) -> f64 {
    let floor = config.confidence_floor;
    let scaled = (separation / config.separation_saturation).min(1.0);
    let confidence = (floor + (1.0 - floor) * scaled).max(floor).min(1.0);
    if confidence.is_nan() {
        floor
    } else {
        confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeros() -> ZScores {
        ZScores {
            efficiency: 0.0,
            deep_sleep: 0.0,
            rem_sleep: 0.0,
            awakenings: 0.0,
        }
    }

    fn flat_trend() -> TrendAnalysis {
        TrendAnalysis {
            efficiency_slope: 0.0,
            deep_slope: 0.0,
            rem_slope: 0.0,
            awakenings_slope: 0.0,
            efficiency_pvalue: 1.0,
            has_significant_trend: false,
        }
    }

    fn classify(z: &ZScores, trends: &TrendAnalysis, svi: f64) -> RiskPhenotype {
        classify_phenotype(z, trends, svi, &PhenotypeConfig::default())
    }

    #[test]
    fn test_profile_table() {
        use EvidenceStrength::*;
        use HealthDomain::*;

        let expected = [
            (RiskPattern::FragmentationDominant, vec![Cardiovascular, Metabolic], Strong),
            (RiskPattern::DeepSleepReduction, vec![Cardiometabolic, Cognitive], Strong),
            (RiskPattern::RemInstability, vec![Cognitive, Neurological], Moderate),
            (RiskPattern::EfficiencyInstability, vec![Metabolic, MentalHealth], Moderate),
        ];
        for (pattern, domains, evidence) in expected {
            assert_eq!(pattern.profile().pattern, pattern);
            assert_eq!(pattern.associated_domains(), domains.as_slice());
            assert_eq!(pattern.evidence_strength(), evidence);
        }
    }

    #[test]
    fn test_fragmentation_wins() {
        let z = ZScores {
            awakenings: 4.0,
            deep_sleep: -1.0,
            ..zeros()
        };
        let result = classify(&z, &flat_trend(), 0.0);
        assert_eq!(result.primary_pattern, RiskPattern::FragmentationDominant);
        // separation 3 → saturated
        assert_eq!(result.confidence, 1.0);
        assert_eq!(
            result.associated_domains,
            vec![HealthDomain::Cardiovascular, HealthDomain::Metabolic]
        );
        assert_eq!(result.evidence_strength, EvidenceStrength::Strong);
    }

    #[test]
    fn test_deep_sleep_reduction_partial_confidence() {
        let z = ZScores {
            deep_sleep: -3.0,
            awakenings: 2.0,
            ..zeros()
        };
        let result = classify(&z, &flat_trend(), 0.0);
        assert_eq!(result.primary_pattern, RiskPattern::DeepSleepReduction);
        // separation 1 → 0.2 + 0.8 * 0.5
        assert!((result.confidence - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_svi_feeds_rem_and_efficiency() {
        let scores = pattern_scores(&zeros(), &flat_trend(), 50.0, &PhenotypeConfig::default());
        assert_eq!(scores[2], (RiskPattern::RemInstability, 1.0));
        assert_eq!(scores[3], (RiskPattern::EfficiencyInstability, 1.0));
    }

    #[test]
    fn test_efficiency_decline_wins() {
        let trends = TrendAnalysis {
            efficiency_slope: -0.2,
            ..flat_trend()
        };
        let result = classify(&zeros(), &trends, 10.0);
        assert_eq!(result.primary_pattern, RiskPattern::EfficiencyInstability);
        assert_eq!(
            result.associated_domains,
            vec![HealthDomain::Metabolic, HealthDomain::MentalHealth]
        );
    }

    #[test]
    fn test_all_zero_tie_breaks_in_enumeration_order() {
        let result = classify(&zeros(), &flat_trend(), 0.0);
        assert_eq!(result.primary_pattern, RiskPattern::FragmentationDominant);
        assert_eq!(result.confidence, 0.2);
    }

    #[test]
    fn test_rem_and_efficiency_tie() {
        // Equal SVI terms only: rem_instability precedes efficiency_instability
        let result = classify(&zeros(), &flat_trend(), 25.0);
        assert_eq!(result.primary_pattern, RiskPattern::RemInstability);
        assert_eq!(result.confidence, 0.2);
    }

    #[test]
    fn test_confidence_bounds() {
        let config = PhenotypeConfig::default();
        assert_eq!(separation_confidence(0.0, &config), 0.2);
        assert_eq!(separation_confidence(2.0, &config), 1.0);
        assert_eq!(separation_confidence(1e9, &config), 1.0);
        assert_eq!(separation_confidence(f64::NAN, &config), 0.2);
    }
}
