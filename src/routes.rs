use askama::Template;
use axum::{response::Response, Json};
use serde_json::json;

use crate::server::handlers::render;

pub struct Tool {
    pub name: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

const TOOLS: [Tool; 3] = [
    Tool {
        name: "Molecule \"What-If\" Simulator",
        path: "/simulator",
        description: "Instantly generate a hypothetical innovation case for a molecule and disease pair.",
    },
    Tool {
        name: "Patient-First RepurposeBot",
        path: "/repurpose-bot",
        description: "Surface hidden off-label signals from real-world evidence like patient forums.",
    },
    Tool {
        name: "Competitive Innovation Radar",
        path: "/radar",
        description: "Get real-time alerts on competitor filings, trials, and research in your space.",
    },
];

#[derive(Template)]
#[template(path = "pages/home.html")]
struct HomeTemplate<'a> {
    title: &'a str,
    tools: &'a [Tool],
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn home() -> Response {
    render(&HomeTemplate {
        title: "Home",
        tools: &TOOLS,
    })
}
