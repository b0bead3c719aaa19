//! Competitor radar: an alert describing a competitor's new trial or patent
//! filing for a watched molecule.

use serde::{Deserialize, Serialize};

use super::StructuredPrompt;
use crate::server::schema::{FieldSpec, Shape};
use crate::server::services::prompt::PromptError;

pub const PROMPT_NAME: &str = "competitorFilingAlertPrompt";

const TEMPLATE: &str = "A competitor, {{{competitorName}}}, has filed a new {{{filingType}}} related to the molecule {{{moleculeName}}}.

Provide a brief summary of the filing that names both the competitor and the molecule, and a link to the filing, if available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilingType {
    Trial,
    Patent,
}

impl FilingType {
    pub const ALL: [&'static str; 2] = ["trial", "patent"];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilingType::Trial => "trial",
            FilingType::Patent => "patent",
        }
    }
}

impl std::fmt::Display for FilingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorFilingInput {
    pub molecule_name: String,
    pub competitor_name: String,
    pub filing_type: FilingType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorFilingAlert {
    pub alert_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filing_link: Option<String>,
}

pub fn input_shape() -> Shape {
    Shape::new()
        .field(FieldSpec::string("moleculeName").describe("The name of the molecule to monitor."))
        .field(FieldSpec::string("competitorName").describe("The name of the competitor to watch for."))
        .field(
            FieldSpec::one_of("filingType", &FilingType::ALL)
                .describe("The type of filing to monitor (trial or patent)."),
        )
}

pub fn output_shape() -> Shape {
    Shape::new()
        .field(FieldSpec::string("alertMessage").describe("A message describing the competitor filing."))
        .field(
            FieldSpec::url("filingLink")
                .optional()
                .describe("A link to the competitor filing, if available."),
        )
}

pub fn form_shape() -> Shape {
    Shape::new()
        .field(
            FieldSpec::string("moleculeName")
                .min_len(2)
                .message("Molecule name is required."),
        )
        .field(
            FieldSpec::string("competitorName")
                .min_len(2)
                .message("Competitor name is required."),
        )
        .field(FieldSpec::one_of("filingType", &FilingType::ALL))
}

pub type Prompt = StructuredPrompt<CompetitorFilingInput, CompetitorFilingAlert>;

pub fn prompt() -> Result<Prompt, PromptError> {
    StructuredPrompt::new(PROMPT_NAME, input_shape(), output_shape(), TEMPLATE)
}

pub fn offline(input: &CompetitorFilingInput) -> CompetitorFilingAlert {
    CompetitorFilingAlert {
        alert_message: format!(
            "New {} filing detected for competitor {} in the {} space. The filing (ID: NCT12345678) outlines a Phase II study for a novel formulation.",
            input.filing_type, input.competitor_name, input.molecule_name
        ),
        filing_link: Some("https://clinicaltrials.gov/ct2/show/NCT04518874".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::schema::RawFields;

    fn ozempic() -> CompetitorFilingInput {
        CompetitorFilingInput {
            molecule_name: "Ozempic".into(),
            competitor_name: "PharmaCorp".into(),
            filing_type: FilingType::Trial,
        }
    }

    #[test]
    fn form_parses_into_typed_filing_type() {
        let raw = RawFields::new()
            .with("moleculeName", "Ozempic")
            .with("competitorName", "PharmaCorp")
            .with("filingType", "trial");
        let input: CompetitorFilingInput = form_shape().parse_form(&raw).unwrap();
        assert_eq!(input, ozempic());
    }

    #[test]
    fn offline_alert_names_competitor_and_molecule() {
        let alert = offline(&ozempic());
        assert!(alert.alert_message.contains("PharmaCorp"));
        assert!(alert.alert_message.contains("Ozempic"));
        assert!(alert.alert_message.starts_with("New trial filing"));
        let value = serde_json::to_value(&alert).unwrap();
        assert!(output_shape().check(&value).is_ok());
    }

    #[test]
    fn reply_without_link_omits_it() {
        let alert = prompt()
            .unwrap()
            .parse_reply(r#"{"alertMessage": "PharmaCorp filed a trial for Ozempic."}"#)
            .unwrap();
        assert_eq!(alert.filing_link, None);
        let value = serde_json::to_value(&alert).unwrap();
        assert!(value.get("filingLink").is_none());
    }

    #[test]
    fn reply_with_broken_link_is_malformed() {
        let err = prompt()
            .unwrap()
            .parse_reply(r#"{"alertMessage": "x", "filingLink": "see registry"}"#)
            .unwrap_err();
        assert!(matches!(err, super::super::FlowError::MalformedResponse(_)));
    }

    #[test]
    fn prompt_mentions_filing_type() {
        let text = prompt().unwrap().render(&ozempic()).unwrap();
        assert!(text.starts_with("A competitor, PharmaCorp, has filed a new trial related to the molecule Ozempic."));
    }
}
