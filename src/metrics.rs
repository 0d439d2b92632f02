// ABOUTME: Prometheus metrics for API requests, dispatched intents and scheduled task runs
// ABOUTME: Thin wrappers over the metrics macros so call sites stay one-liners

use anyhow::{Context, Result};
use butler_core::Outcome;
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

const API_REQUESTS: &str = "butler_api_requests_total";
const INTENTS: &str = "butler_intents_total";
const TASK_RUNS: &str = "butler_scheduled_task_runs_total";
const TELEGRAM_UPDATES: &str = "butler_telegram_updates_total";
const ERRORS: &str = "butler_errors_total";

/// Install the global Prometheus recorder. Call once, from main.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    describe_counter!(API_REQUESTS, "Intent API requests by response status");
    describe_counter!(INTENTS, "Intents dispatched to gears by outcome");
    describe_counter!(TASK_RUNS, "Scheduled task executions by outcome");
    describe_counter!(TELEGRAM_UPDATES, "Telegram webhook updates received by kind");
    describe_counter!(ERRORS, "Errors by kind");

    Ok(handle)
}

pub fn record_api_request(status: &'static str) {
    counter!(API_REQUESTS, "status" => status).increment(1);
}

pub fn record_intent(intent: &str, outcome: Outcome) {
    counter!(INTENTS, "intent" => intent.to_lowercase(), "outcome" => outcome.to_string())
        .increment(1);
}

pub fn record_task_run(outcome: &'static str) {
    counter!(TASK_RUNS, "outcome" => outcome).increment(1);
}

pub fn record_telegram_update(kind: &'static str) {
    counter!(TELEGRAM_UPDATES, "kind" => kind).increment(1);
}

pub fn record_error(kind: &'static str) {
    counter!(ERRORS, "kind" => kind).increment(1);
}
