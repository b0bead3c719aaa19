//! Repurpose bot: hidden off-label signals for a molecule across selected
//! data sources.

use serde::{Deserialize, Serialize};

use super::StructuredPrompt;
use crate::server::schema::{FieldSpec, Shape};
use crate::server::services::prompt::PromptError;

pub const PROMPT_NAME: &str = "offLabelSignalSetPrompt";

/// Sources analyzed when the form submits none.
pub const DEFAULT_DATA_SOURCES: [&str; 3] = [
    "Anonymized Patient Forums",
    "Guideline Updates",
    "Observational Studies",
];

const TEMPLATE: &str = "You are an AI assistant that analyzes data from various sources to identify hidden off-label signals for a given molecule.

Molecule Name: {{{moleculeName}}}
Data Sources: {{{dataSources}}}

Analyze the provided data sources to identify potential off-label uses of the molecule. Focus on patterns and insights that may not be immediately obvious.

Provide a list of off-label signals, including the source, a description of the signal, and supporting evidence. Format the output as a JSON object with an array of offLabelSignals, where each signal has a source, signal and evidence field.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffLabelSignalsInput {
    pub molecule_name: String,
    pub data_sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffLabelSignal {
    pub source: String,
    pub signal: String,
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffLabelSignalSet {
    pub off_label_signals: Vec<OffLabelSignal>,
}

/// Form submission before defaults are applied.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffLabelSignalsForm {
    pub molecule_name: String,
    #[serde(default)]
    pub data_sources: Vec<String>,
}

impl From<OffLabelSignalsForm> for OffLabelSignalsInput {
    fn from(form: OffLabelSignalsForm) -> Self {
        let data_sources = if form.data_sources.is_empty() {
            DEFAULT_DATA_SOURCES.iter().map(|s| s.to_string()).collect()
        } else {
            form.data_sources
        };
        Self {
            molecule_name: form.molecule_name,
            data_sources,
        }
    }
}

fn signal_shape() -> Shape {
    Shape::new()
        .field(FieldSpec::string("source").describe("The data source where the signal was found."))
        .field(FieldSpec::string("signal").describe("The description of the off-label signal."))
        .field(FieldSpec::string("evidence").describe("Evidence supporting the off-label signal."))
}

pub fn input_shape() -> Shape {
    Shape::new()
        .field(FieldSpec::string("moleculeName").describe("The name of the molecule to analyze."))
        .field(FieldSpec::string_list("dataSources").describe(
            "A list of data sources to analyze, such as patient forums and guideline updates.",
        ))
}

pub fn output_shape() -> Shape {
    Shape::new().field(
        FieldSpec::records("offLabelSignals", signal_shape())
            .describe("A list of off-label signals found."),
    )
}

pub fn form_shape() -> Shape {
    Shape::new()
        .field(
            FieldSpec::string("moleculeName")
                .min_len(2)
                .message("Molecule name is required."),
        )
        .field(FieldSpec::string_list("dataSources").optional())
}

pub type Prompt = StructuredPrompt<OffLabelSignalsInput, OffLabelSignalSet>;

pub fn prompt() -> Result<Prompt, PromptError> {
    StructuredPrompt::new(PROMPT_NAME, input_shape(), output_shape(), TEMPLATE)
}

pub fn offline(input: &OffLabelSignalsInput) -> OffLabelSignalSet {
    let molecule = &input.molecule_name;
    OffLabelSignalSet {
        off_label_signals: vec![
            OffLabelSignal {
                source: "Patient Forum (HealthUnlocked)".into(),
                signal: "Reported improvement in joint stiffness for patients with early-stage osteoarthritis.".into(),
                evidence: "Multiple anecdotal reports from users over the past 6 months.".into(),
            },
            OffLabelSignal {
                source: "Guideline Update (NICE)".into(),
                signal: "Mentioned as a potential area for future research in fibromyalgia management.".into(),
                evidence: "NICE Guideline NG193, Appendix A: Research Recommendations.".into(),
            },
            OffLabelSignal {
                source: "Observational Study (JMIR)".into(),
                signal: format!(
                    "Retrospective analysis of patient-reported outcomes showed a correlation between use of {molecule} and reduced migraine frequency."
                ),
                evidence: "doi:10.2196/12345".into(),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::schema::{RawFields, Reason};

    #[test]
    fn empty_selection_falls_back_to_default_sources() {
        let raw = RawFields::new().with("moleculeName", "Metformin");
        let form: OffLabelSignalsForm = form_shape().parse_form(&raw).unwrap();
        let input = OffLabelSignalsInput::from(form);
        assert_eq!(input.data_sources, DEFAULT_DATA_SOURCES);
    }

    #[test]
    fn selected_sources_are_kept_in_order() {
        let raw = RawFields::new()
            .with("moleculeName", "Metformin")
            .with("dataSources", "Observational Studies")
            .with("dataSources", "Guideline Updates");
        let form: OffLabelSignalsForm = form_shape().parse_form(&raw).unwrap();
        let input = OffLabelSignalsInput::from(form);
        assert_eq!(input.data_sources, ["Observational Studies", "Guideline Updates"]);

        let text = prompt().unwrap().render(&input).unwrap();
        assert!(text.contains("Data Sources: Observational Studies, Guideline Updates"));
    }

    #[test]
    fn short_molecule_name_is_rejected() {
        let raw = RawFields::new().with("moleculeName", "M");
        let errors = form_shape().parse_form::<OffLabelSignalsForm>(&raw).unwrap_err();
        assert_eq!(errors.reason_for("moleculeName"), Some(Reason::TooShort));
    }

    #[test]
    fn offline_signals_satisfy_the_output_shape() {
        let input = OffLabelSignalsInput {
            molecule_name: "Metformin".into(),
            data_sources: vec!["Guideline Updates".into()],
        };
        let set = offline(&input);
        let value = serde_json::to_value(&set).unwrap();
        assert!(output_shape().check(&value).is_ok());
        assert_eq!(set.off_label_signals.len(), 3);
        assert!(set.off_label_signals[2].signal.contains("Metformin"));
    }

    #[test]
    fn empty_signal_list_is_a_valid_reply() {
        let parsed = prompt()
            .unwrap()
            .parse_reply(r#"{"offLabelSignals": []}"#)
            .unwrap();
        assert!(parsed.off_label_signals.is_empty());
    }
}
