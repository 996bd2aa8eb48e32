//! Read-only projections of a [`Response`] for per-kind result panels.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::model::{OperationStatus, Response, ToolKind, ToolOperation};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindSummary {
    pub kind: ToolKind,
    pub active: usize,
    pub completed: usize,
    /// Distinct queries or URLs the operations of this kind were asked for.
    pub inputs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub score: f64,
    pub published_date: String,
    pub content: String,
}

/// Page body returned by an extract or crawl.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageContent {
    pub url: String,
    pub raw_content: String,
    pub images: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStep {
    pub kind: ToolKind,
    pub status: OperationStatus,
    pub count: usize,
}

pub fn summarize(response: &Response, kind: ToolKind) -> KindSummary {
    let mut summary = KindSummary {
        kind,
        active: 0,
        completed: 0,
        inputs: Vec::new(),
    };

    for operation in response.operations_of(kind) {
        match operation.status {
            OperationStatus::Active => summary.active += 1,
            OperationStatus::Complete => summary.completed += 1,
        }
        for input in operation_inputs(operation) {
            if !summary.inputs.contains(&input) {
                summary.inputs.push(input);
            }
        }
    }

    summary
}

fn operation_inputs(operation: &ToolOperation) -> Vec<String> {
    let field = match operation.kind {
        ToolKind::Search => "query",
        ToolKind::Extract => "urls",
        ToolKind::Crawl => "url",
    };
    match operation.parameters.get(field) {
        Some(Value::String(value)) if !value.is_empty() => vec![value.clone()],
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

pub fn search_results(response: &Response) -> Vec<SearchHit> {
    completed_results(response, ToolKind::Search)
        .map(|item| SearchHit {
            url: string_field(item, "url"),
            title: string_field(item, "title"),
            score: item.get("score").and_then(Value::as_f64).unwrap_or(0.0),
            published_date: string_field(item, "published_date"),
            content: string_field(item, "content"),
        })
        .filter(unique_by_url(|hit: &SearchHit| hit.url.clone()))
        .collect()
}

pub fn extract_results(response: &Response) -> Vec<PageContent> {
    page_results(response, ToolKind::Extract)
}

pub fn crawl_results(response: &Response) -> Vec<PageContent> {
    page_results(response, ToolKind::Crawl)
}

/// `base_url` of the most recent completed crawl that reported one.
pub fn crawl_base_url(response: &Response) -> Option<String> {
    response
        .operations_of(ToolKind::Crawl)
        .filter(|operation| operation.status == OperationStatus::Complete)
        .filter_map(|operation| operation.result.as_ref()?.get("base_url")?.as_str())
        .filter(|url| !url.is_empty())
        .last()
        .map(str::to_owned)
}

/// Collapse consecutive operations of the same kind into one step.
pub fn pipeline(response: &Response) -> Vec<PipelineStep> {
    let mut steps: Vec<PipelineStep> = Vec::new();
    for operation in &response.operations {
        match steps.last_mut() {
            Some(step) if step.kind == operation.kind => {
                step.count += 1;
                if operation.status == OperationStatus::Active {
                    step.status = OperationStatus::Active;
                }
            }
            _ => steps.push(PipelineStep {
                kind: operation.kind,
                status: operation.status,
                count: 1,
            }),
        }
    }
    steps
}

fn page_results(response: &Response, kind: ToolKind) -> Vec<PageContent> {
    completed_results(response, kind)
        .map(|item| PageContent {
            url: string_field(item, "url"),
            raw_content: string_field(item, "raw_content"),
            images: item
                .get("images")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        })
        .filter(unique_by_url(|page: &PageContent| page.url.clone()))
        .collect()
}

fn completed_results(response: &Response, kind: ToolKind) -> impl Iterator<Item = &Value> {
    response
        .operations_of(kind)
        .filter(|operation| operation.status == OperationStatus::Complete)
        .filter_map(|operation| operation.result.as_ref()?.get("results")?.as_array())
        .flatten()
}

fn unique_by_url<T>(url: impl Fn(&T) -> String) -> impl FnMut(&T) -> bool {
    let mut seen = HashSet::new();
    move |item: &T| seen.insert(url(item))
}

fn string_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}
