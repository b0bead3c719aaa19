//! Explainable repurposing score over a small built-in trial registry and
//! competitor list.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::server::schema::{FieldSpec, Shape};

struct RegistryTrial {
    registry_id: &'static str,
    molecule: &'static str,
    disease: &'static str,
    status: &'static str,
    phase: &'static str,
    summary: &'static str,
}

struct CompetitorProgram {
    company: &'static str,
    trial_id: &'static str,
    disease: &'static str,
    molecule: &'static str,
}

const TRIALS: &[RegistryTrial] = &[
    RegistryTrial {
        registry_id: "NCT0001",
        molecule: "Metformin",
        disease: "Alzheimer",
        status: "Completed",
        phase: "Phase-3",
        summary: "Reduced cognitive decline in small cohort.",
    },
    RegistryTrial {
        registry_id: "NCT0002",
        molecule: "Hydroxychloroquine",
        disease: "COVID-19",
        status: "Completed",
        phase: "Phase-3",
        summary: "No significant benefit observed.",
    },
    RegistryTrial {
        registry_id: "NCT0003",
        molecule: "Metformin",
        disease: "Parkinson",
        status: "Ongoing",
        phase: "Phase-2",
        summary: "Early biomarker improvement.",
    },
    RegistryTrial {
        registry_id: "NCT0004",
        molecule: "Ivermectin",
        disease: "COVID-19",
        status: "Ongoing",
        phase: "Phase-2",
        summary: "Recruiting.",
    },
    RegistryTrial {
        registry_id: "NCT0005",
        molecule: "Metformin",
        disease: "Alzheimer",
        status: "Ongoing",
        phase: "Phase-2",
        summary: "Repurposing study - metabolic pathway targets.",
    },
];

const COMPETITORS: &[CompetitorProgram] = &[
    CompetitorProgram {
        company: "NeuroGenix",
        trial_id: "NCT9001",
        disease: "Alzheimer",
        molecule: "NGX-100",
    },
    CompetitorProgram {
        company: "GloboPharm",
        trial_id: "NCT9002",
        disease: "Alzheimer",
        molecule: "GXP-201",
    },
    CompetitorProgram {
        company: "RepurCo",
        trial_id: "NCT9003",
        disease: "Parkinson",
        molecule: "RPR-77",
    },
];

const POSITIVE_WORDS: [&str; 5] = ["reduced", "improvement", "benefit", "positive", "biomarker"];

const BASE_SCORE: f64 = 0.2;
const PER_TRIAL: f64 = 0.15;
const TRIAL_CAP: f64 = 0.5;
const MAX_HIGHLIGHTS: usize = 5;
const MAX_TRIALS: usize = 5;
const MAX_COMPETITORS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub molecule: String,
    pub disease: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialSummary {
    pub registry_id: String,
    pub status: String,
    pub phase: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorSummary {
    pub company: String,
    pub trial_id: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub molecule: String,
    pub disease: String,
    pub repurpose_score: f64,
    pub overall_verdict: String,
    pub analysis_id: String,
    pub trials: Vec<TrialSummary>,
    pub competitors: Vec<CompetitorSummary>,
    pub evidence_highlights: Vec<String>,
}

pub fn request_shape() -> Shape {
    Shape::new()
        .field(FieldSpec::string("molecule").message("molecule is required and must be a non-empty string"))
        .field(FieldSpec::string("disease").message("disease is required and must be a non-empty string"))
}

pub fn verdict(score: f64) -> &'static str {
    if score >= 0.75 {
        "High potential - recommend further development"
    } else if score >= 0.45 {
        "Moderate potential - further investigation warranted"
    } else {
        "Low potential - deprioritize"
    }
}

fn competitor_penalty(count: usize) -> f64 {
    match count {
        0 => 0.0,
        1 => -0.03,
        2 => -0.06,
        _ => -0.12,
    }
}

/// Scores one molecule/disease pair. Matching is case-insensitive; a trial
/// matches on molecule or on disease.
pub fn score(request: &ScoreRequest) -> ScoreResponse {
    let molecule = request.molecule.to_lowercase();
    let disease = request.disease.to_lowercase();

    let matching: Vec<&RegistryTrial> = TRIALS
        .iter()
        .filter(|t| t.molecule.to_lowercase() == molecule || t.disease.to_lowercase() == disease)
        .collect();

    let mut total = BASE_SCORE;
    let mut evidence = Vec::new();

    if matching.is_empty() {
        evidence.push("No existing trials found that directly link the molecule and disease.".to_string());
    } else {
        total += (PER_TRIAL * matching.len() as f64).min(TRIAL_CAP);
        evidence.push(format!(
            "Found {} related trial(s) in registry supporting investigation.",
            matching.len()
        ));
    }

    for trial in &matching {
        let phase = trial.phase.to_lowercase();
        if phase.contains("phase-3") {
            total += 0.2;
            evidence.push(format!(
                "Phase-3 trial found (registry {}) - stronger clinical evidence.",
                trial.registry_id
            ));
        } else if phase.contains("phase-2") {
            total += 0.08;
            evidence.push(format!(
                "Phase-2 trial found (registry {}) - moderate evidence.",
                trial.registry_id
            ));
        } else if phase.contains("phase-1") {
            total += 0.03;
        }
        if trial.status.to_lowercase().contains("completed") {
            total += 0.03;
        }
    }

    let (same_disease, others): (Vec<&CompetitorProgram>, Vec<&CompetitorProgram>) = COMPETITORS
        .iter()
        .partition(|c| c.disease.to_lowercase() == disease);
    if !same_disease.is_empty() {
        total += competitor_penalty(same_disease.len());
        evidence.push(format!(
            "{} competitor program(s) target the same disease - may reduce repurposing attractiveness.",
            same_disease.len()
        ));
    }

    for trial in &matching {
        let summary = trial.summary.to_lowercase();
        for word in POSITIVE_WORDS {
            if summary.contains(word) {
                total += 0.03;
                evidence.push(format!(
                    "Trial {} summary contains positive signal: '{}'.",
                    trial.registry_id, word
                ));
            }
        }
    }

    let score = ((total * 1000.0).round() / 1000.0).clamp(0.0, 1.0);

    let mut highlights: Vec<String> = Vec::new();
    for line in evidence {
        if !highlights.contains(&line) {
            highlights.push(line);
        }
        if highlights.len() >= MAX_HIGHLIGHTS {
            break;
        }
    }
    if highlights.is_empty() {
        highlights.push("No direct evidence found in trial registry.".to_string());
    }

    let trials = matching
        .iter()
        .take(MAX_TRIALS)
        .map(|t| TrialSummary {
            registry_id: t.registry_id.to_string(),
            status: t.status.to_string(),
            phase: t.phase.to_string(),
            summary: t.summary.to_string(),
        })
        .collect();

    let competitors = same_disease
        .iter()
        .chain(others.iter())
        .take(MAX_COMPETITORS)
        .map(|c| CompetitorSummary {
            company: c.company.to_string(),
            trial_id: c.trial_id.to_string(),
            note: format!("Sponsor of {} for {}", c.molecule, c.disease),
        })
        .collect();

    ScoreResponse {
        molecule: request.molecule.clone(),
        disease: request.disease.clone(),
        repurpose_score: score,
        overall_verdict: verdict(score).to_string(),
        analysis_id: Uuid::new_v4().simple().to_string(),
        trials,
        competitors,
        evidence_highlights: highlights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::schema::Reason;
    use serde_json::json;

    fn request(molecule: &str, disease: &str) -> ScoreRequest {
        ScoreRequest {
            molecule: molecule.into(),
            disease: disease.into(),
        }
    }

    #[test]
    fn well_studied_pair_is_capped_at_one() {
        let response = score(&request("Metformin", "Alzheimer"));
        assert_eq!(response.repurpose_score, 1.0);
        assert_eq!(response.overall_verdict, "High potential - recommend further development");
        assert_eq!(response.trials.len(), 3);
        assert_eq!(response.evidence_highlights.len(), 5);
        assert_eq!(
            response.evidence_highlights[0],
            "Found 3 related trial(s) in registry supporting investigation."
        );
        assert_eq!(response.competitors[0].company, "NeuroGenix");
        assert_eq!(response.competitors[0].note, "Sponsor of NGX-100 for Alzheimer");
        assert_eq!(response.competitors.len(), 3);
    }

    #[test]
    fn matching_ignores_case() {
        let upper = score(&request("METFORMIN", "alzheimer"));
        assert_eq!(upper.trials.len(), 3);
        assert_eq!(upper.molecule, "METFORMIN");
    }

    #[test]
    fn disease_only_match_scores_phase_and_positive_words() {
        let response = score(&request("Ivermectin", "COVID-19"));
        assert!((response.repurpose_score - 0.84).abs() < 1e-9);
        assert!(response
            .evidence_highlights
            .contains(&"Trial NCT0002 summary contains positive signal: 'benefit'.".to_string()));
        assert!(response.competitors.iter().all(|c| c.note.starts_with("Sponsor of")));
    }

    #[test]
    fn unknown_pair_is_low_potential() {
        let response = score(&request("UnknownDrug", "RareDisease"));
        assert!((response.repurpose_score - 0.2).abs() < 1e-9);
        assert_eq!(response.overall_verdict, "Low potential - deprioritize");
        assert!(response.trials.is_empty());
        assert_eq!(
            response.evidence_highlights,
            vec!["No existing trials found that directly link the molecule and disease.".to_string()]
        );
        assert_eq!(response.competitors.len(), 3);
        assert_eq!(response.analysis_id.len(), 32);
    }

    #[test]
    fn verdict_thresholds() {
        assert_eq!(verdict(0.75), "High potential - recommend further development");
        assert_eq!(verdict(0.45), "Moderate potential - further investigation warranted");
        assert_eq!(verdict(0.449), "Low potential - deprioritize");
    }

    #[test]
    fn blank_fields_fail_request_shape() {
        let errors = request_shape()
            .parse_value::<ScoreRequest>(&json!({"molecule": "  ", "disease": "Alzheimer"}))
            .unwrap_err();
        assert_eq!(errors.reason_for("molecule"), Some(Reason::Missing));
    }
}
