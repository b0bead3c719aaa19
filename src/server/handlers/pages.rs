use askama::Template;
use axum::{extract::State, response::Response, Form};
use std::collections::BTreeMap;

use super::render;
use crate::server::config::AppState;
use crate::server::schema::RawFields;
use crate::server::services::actions::ActionState;
use crate::server::services::flows::{
    competitor_filings::CompetitorFilingAlert,
    molecule_what_if::ReportSection,
    off_label_signals::{OffLabelSignal, DEFAULT_DATA_SOURCES},
};

/// Sources offered on the repurpose bot form; the defaults start checked.
const SOURCE_OPTIONS: [&str; 4] = [
    "Anonymized Patient Forums",
    "Guideline Updates",
    "Observational Studies",
    "Social Media Analysis",
];

const FILING_OPTIONS: [(&str, &str); 2] = [("trial", "Clinical Trial"), ("patent", "Patent")];

/// An input as it should be redrawn: last submitted value and its error.
pub struct FieldView {
    pub value: String,
    pub error: Option<String>,
}

impl FieldView {
    fn empty() -> Self {
        Self {
            value: String::new(),
            error: None,
        }
    }

    fn from_submission(raw: &RawFields, errors: &BTreeMap<String, String>, name: &str) -> Self {
        Self {
            value: raw.first(name).unwrap_or_default().to_string(),
            error: errors.get(name).cloned(),
        }
    }
}

pub struct CheckOption {
    pub value: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

#[derive(Template)]
#[template(path = "pages/simulator.html")]
struct SimulatorTemplate {
    title: &'static str,
    molecule: FieldView,
    disease: FieldView,
    notice: Option<String>,
    flow_error: Option<String>,
    sections: Vec<ReportSection>,
}

#[derive(Template)]
#[template(path = "pages/repurpose_bot.html")]
struct RepurposeBotTemplate {
    title: &'static str,
    molecule_name: FieldView,
    sources: Vec<CheckOption>,
    notice: Option<String>,
    flow_error: Option<String>,
    signals: Vec<OffLabelSignal>,
}

#[derive(Template)]
#[template(path = "pages/radar.html")]
struct RadarTemplate {
    title: &'static str,
    molecule_name: FieldView,
    competitor_name: FieldView,
    filing_types: Vec<CheckOption>,
    filing_type_error: Option<String>,
    notice: Option<String>,
    flow_error: Option<String>,
    alert: Option<CompetitorFilingAlert>,
}

fn notice<T>(state: &ActionState<T>) -> Option<String> {
    state.is_success().then(|| state.message.clone())
}

fn flow_error<T>(state: &ActionState<T>) -> Option<String> {
    state
        .flow_message()
        .map(|detail| format!("{}: {}", state.message, detail))
}

fn source_options(selected: &[&str]) -> Vec<CheckOption> {
    SOURCE_OPTIONS
        .iter()
        .map(|&source| CheckOption {
            value: source,
            label: source,
            checked: selected.contains(&source),
        })
        .collect()
}

fn filing_options(selected: Option<&str>) -> Vec<CheckOption> {
    FILING_OPTIONS
        .iter()
        .map(|&(value, label)| CheckOption {
            value,
            label,
            checked: selected == Some(value),
        })
        .collect()
}

pub async fn simulator() -> Response {
    render(&SimulatorTemplate {
        title: "Molecule \"What-If\" Simulator",
        molecule: FieldView::empty(),
        disease: FieldView::empty(),
        notice: None,
        flow_error: None,
        sections: Vec::new(),
    })
}

pub async fn submit_simulator(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let raw = RawFields::from(pairs);
    let result = state.actions.simulator.run(&state.backend, &raw).await;
    let errors = result.field_messages();

    render(&SimulatorTemplate {
        title: "Molecule \"What-If\" Simulator",
        molecule: FieldView::from_submission(&raw, &errors, "molecule"),
        disease: FieldView::from_submission(&raw, &errors, "disease"),
        notice: notice(&result),
        flow_error: flow_error(&result),
        sections: result.data.map(|case| case.sections()).unwrap_or_default(),
    })
}

pub async fn repurpose_bot() -> Response {
    render(&RepurposeBotTemplate {
        title: "Patient-First RepurposeBot",
        molecule_name: FieldView::empty(),
        sources: source_options(&DEFAULT_DATA_SOURCES),
        notice: None,
        flow_error: None,
        signals: Vec::new(),
    })
}

pub async fn submit_repurpose_bot(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let raw = RawFields::from(pairs);
    let result = state.actions.repurpose.run(&state.backend, &raw).await;
    let errors = result.field_messages();

    let submitted = raw.all("dataSources");
    let selected: &[&str] = if submitted.is_empty() {
        &DEFAULT_DATA_SOURCES[..]
    } else {
        submitted.as_slice()
    };

    render(&RepurposeBotTemplate {
        title: "Patient-First RepurposeBot",
        molecule_name: FieldView::from_submission(&raw, &errors, "moleculeName"),
        sources: source_options(selected),
        notice: notice(&result),
        flow_error: flow_error(&result),
        signals: result
            .data
            .map(|set| set.off_label_signals)
            .unwrap_or_default(),
    })
}

pub async fn radar() -> Response {
    render(&RadarTemplate {
        title: "Competitive Innovation Radar",
        molecule_name: FieldView::empty(),
        competitor_name: FieldView::empty(),
        filing_types: filing_options(None),
        filing_type_error: None,
        notice: None,
        flow_error: None,
        alert: None,
    })
}

pub async fn submit_radar(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let raw = RawFields::from(pairs);
    let result = state.actions.radar.run(&state.backend, &raw).await;
    let mut errors = result.field_messages();

    render(&RadarTemplate {
        title: "Competitive Innovation Radar",
        molecule_name: FieldView::from_submission(&raw, &errors, "moleculeName"),
        competitor_name: FieldView::from_submission(&raw, &errors, "competitorName"),
        filing_types: filing_options(raw.first("filingType")),
        filing_type_error: errors.remove("filingType"),
        notice: notice(&result),
        flow_error: flow_error(&result),
        alert: result.data,
    })
}
