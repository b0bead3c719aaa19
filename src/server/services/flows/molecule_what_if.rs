//! Molecule "what-if" simulator: a hypothetical innovation case for a
//! molecule/disease pair.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::StructuredPrompt;
use crate::server::schema::{FieldSpec, Shape};
use crate::server::services::prompt::PromptError;

pub const PROMPT_NAME: &str = "moleculeWhatIfPrompt";

pub const SECTION_LABELS: [&str; 4] = [
    "Mechanism of Action",
    "Trial History",
    "Competitor Filings",
    "Market Size",
];

const TEMPLATE: &str = "You are an AI assistant for pharmaceutical research.
Given a molecule and a disease, generate a hypothetical innovation case including mechanism of action, trial history, competitor filings, and market size.
Write the case as four paragraphs separated by blank lines, each starting with its bold label: **Mechanism of Action:**, **Trial History:**, **Competitor Filings:**, **Market Size:**.

Molecule: {{{molecule}}}
Disease: {{{disease}}}

Innovation Case:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoleculeWhatIfInput {
    pub molecule: String,
    pub disease: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoleculeWhatIfOutput {
    pub innovation_case: String,
}

/// One `**Label:** text` paragraph of an innovation case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub label: String,
    pub body: String,
}

fn section_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^\*\*([^*]+?):?\*\*:?\s*(.*)$").expect("section pattern is valid")
    })
}

impl MoleculeWhatIfOutput {
    /// Splits the case into labeled sections. Paragraphs without a label are
    /// folded into the section before them.
    pub fn sections(&self) -> Vec<ReportSection> {
        let mut sections: Vec<ReportSection> = Vec::new();
        for paragraph in self.innovation_case.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            match section_pattern().captures(paragraph) {
                Some(caps) => sections.push(ReportSection {
                    label: caps[1].trim().to_string(),
                    body: caps[2].trim().to_string(),
                }),
                None => match sections.last_mut() {
                    Some(last) => {
                        last.body.push_str("\n\n");
                        last.body.push_str(paragraph);
                    }
                    None => sections.push(ReportSection {
                        label: String::new(),
                        body: paragraph.to_string(),
                    }),
                },
            }
        }
        sections
    }
}

pub fn input_shape() -> Shape {
    Shape::new()
        .field(FieldSpec::string("molecule").describe("The name of the molecule."))
        .field(FieldSpec::string("disease").describe("The name of the disease."))
}

pub fn output_shape() -> Shape {
    Shape::new().field(FieldSpec::string("innovationCase").describe(
        "A hypothetical innovation case, including mechanism of action, trial history, competitor filings, and market size.",
    ))
}

/// What the simulator form accepts.
pub fn form_shape() -> Shape {
    Shape::new()
        .field(
            FieldSpec::string("molecule")
                .min_len(2)
                .message("Molecule name is required."),
        )
        .field(
            FieldSpec::string("disease")
                .min_len(2)
                .message("Disease name is required."),
        )
}

pub type Prompt = StructuredPrompt<MoleculeWhatIfInput, MoleculeWhatIfOutput>;

pub fn prompt() -> Result<Prompt, PromptError> {
    StructuredPrompt::new(PROMPT_NAME, input_shape(), output_shape(), TEMPLATE)
}

/// Deterministic stand-in used in offline mode.
pub fn offline(input: &MoleculeWhatIfInput) -> MoleculeWhatIfOutput {
    let MoleculeWhatIfInput { molecule, disease } = input;
    MoleculeWhatIfOutput {
        innovation_case: format!(
            "**Mechanism of Action:** {molecule} is hypothesized to modulate the XYZ pathway, which is implicated in the pathophysiology of {disease}. This could potentially reduce inflammation and slow disease progression.\n\n\
             **Trial History:** No direct trials of {molecule} for {disease} have been conducted. However, related compounds have shown promise in pre-clinical models.\n\n\
             **Competitor Filings:** InnovatePharma recently filed a patent for a similar compound targeting the XYZ pathway for autoimmune disorders. Phase I trials are expected to begin in Q4.\n\n\
             **Market Size:** The estimated market for {disease} treatments is $5 billion annually, with a projected CAGR of 8%."
        ),
    }
}
