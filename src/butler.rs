// ABOUTME: The butler - wires configuration, surfaces, gears and scheduled tasks together
// ABOUTME: Entry points for API intents, chat messages, admin notifications and scheduler ticks

use anyhow::Result;
use butler_core::intents::notify_admin;
use butler_core::{
    infer_intent_and_params, Dispatcher, EchoMessageGear, ExecutionResult, NotifyAdminGear,
    NotifyAdminSurface, Outcome, Params, ScheduledTask, SendMessageGear, SurfaceMessage,
    SurfaceRegistry, TaskScheduler,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::gears::{http_client, MusicGear, WeatherGear};
use crate::metrics;

/// Answer for chat messages no rule understands.
pub const UNKNOWN_REQUEST_MESSAGE: &str = "Sorry, I don't know how to help with that";

pub struct Butler {
    config: Arc<Config>,
    dispatcher: Dispatcher,
    surfaces: Arc<SurfaceRegistry>,
    scheduler: TaskScheduler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Ok,
    Error,
    /// The gear panicked; the run was contained and nothing was relayed.
    Panicked,
}

impl TaskStatus {
    fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Ok => "ok",
            TaskStatus::Error => "error",
            TaskStatus::Panicked => "panicked",
        }
    }
}

/// What happened to one scheduled task during a tick.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRun {
    pub name: String,
    pub intent: String,
    pub status: TaskStatus,
    pub messages: Vec<String>,
    /// Messages that reached the task's output surface.
    pub delivered: usize,
}

impl Butler {
    pub fn new(
        config: Arc<Config>,
        mut dispatcher: Dispatcher,
        surfaces: Arc<SurfaceRegistry>,
        scheduler: TaskScheduler,
    ) -> Self {
        // Counts relayed sends too, not only the intents asked for
        dispatcher.set_observer(Arc::new(metrics::record_intent));
        Self {
            config,
            dispatcher,
            surfaces,
            scheduler,
        }
    }

    /// Build surfaces and gears from configuration.
    ///
    /// Gears are registered in a fixed order: echo, music (when configured),
    /// weather, notify_admin (when configured), send_message.
    pub async fn from_config(config: Config, scheduler: TaskScheduler) -> Result<Self> {
        let config = Arc::new(config);
        let (registry, admin) = build_surfaces(&config).await?;
        let surfaces = Arc::new(registry);
        let client = http_client(config.gears.http_timeout_secs)?;

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Arc::new(EchoMessageGear::new()));
        if let Some(ref url) = config.gears.music_destination_url {
            dispatcher.register(Arc::new(MusicGear::new(client.clone(), url.clone())));
        }
        dispatcher.register(Arc::new(WeatherGear::new(
            client,
            &config.gears.weather_base_url,
        )?));
        if let Some(admin) = admin {
            dispatcher.register(Arc::new(NotifyAdminGear::new(admin)));
        }
        dispatcher.register(Arc::new(SendMessageGear::new(Arc::clone(&surfaces))));

        tracing::info!(
            gears = ?dispatcher.gear_names(),
            surfaces = ?surfaces.surface_ids(),
            tasks = scheduler.tasks().len(),
            "Butler ready"
        );

        Ok(Self::new(config, dispatcher, surfaces, scheduler))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    pub fn surfaces(&self) -> &SurfaceRegistry {
        &self.surfaces
    }

    /// Static shared-secret check.
    pub fn is_client_authorized(&self, key: Option<&str>) -> bool {
        key.is_some_and(|k| self.config.is_key_authorized(k))
    }

    pub async fn process_intent(&self, intent: &str, params: &Params) -> ExecutionResult {
        self.dispatcher.dispatch(intent, params).await
    }

    /// Handle a chat message: understand it, act, and answer on the same channel.
    pub async fn receive_message(&self, message: &SurfaceMessage) -> ExecutionResult {
        if !message.has_text() {
            return ExecutionResult::ok_silent();
        }

        let (intent, params) = infer_intent_and_params(message.text());
        let result = match intent {
            Some(intent) => self.process_intent(&intent, &params).await,
            None => {
                tracing::info!(
                    surface_id = message.surface_id().unwrap_or_default(),
                    "No intent found in chat message"
                );
                ExecutionResult::new(Outcome::Error, vec![UNKNOWN_REQUEST_MESSAGE.to_string()])
            }
        };

        self.dispatcher
            .relay(
                message.surface_id(),
                message.channel_id(),
                Some(result.messages()),
            )
            .await;
        result
    }

    pub async fn notify_admin(&self, text: &str) -> ExecutionResult {
        let mut params = Params::new();
        params.insert(
            notify_admin::PARAM_MESSAGE.to_string(),
            Value::String(text.to_string()),
        );
        self.process_intent(notify_admin::INTENT, &params).await
    }

    /// Run every task due at `instant`, each on its own tokio task.
    ///
    /// Runs are reported in task order. A task whose gear panics is reported
    /// as panicked and does not affect the others.
    pub async fn run_scheduled_tasks(self: &Arc<Self>, instant: DateTime<Utc>) -> Vec<TaskRun> {
        let due: Vec<ScheduledTask> = self.scheduler.find_due(&instant).into_iter().cloned().collect();
        tracing::info!(at = %instant.to_rfc3339(), due = due.len(), "Scheduler tick");

        let handles: Vec<_> = due
            .into_iter()
            .map(|task| {
                let butler = Arc::clone(self);
                let name = task.name.clone();
                let intent = task.intent.clone();
                let handle = tokio::spawn(async move { butler.run_task(&task).await });
                (name, intent, handle)
            })
            .collect();

        let mut runs = Vec::with_capacity(handles.len());
        for (name, intent, handle) in handles {
            let run = match handle.await {
                Ok(run) => run,
                Err(e) => {
                    tracing::error!(task = %name, error = %e, "Scheduled task crashed");
                    metrics::record_error("scheduled_task_panic");
                    TaskRun {
                        name,
                        intent,
                        status: TaskStatus::Panicked,
                        messages: Vec::new(),
                        delivered: 0,
                    }
                }
            };
            metrics::record_task_run(run.status.as_str());
            runs.push(run);
        }
        runs
    }

    async fn run_task(&self, task: &ScheduledTask) -> TaskRun {
        let params = task.params.clone().unwrap_or_default();
        let result = self.process_intent(&task.intent, &params).await;
        let status = if result.went_well() {
            TaskStatus::Ok
        } else {
            TaskStatus::Error
        };

        let mut messages = result.into_messages();
        if messages.is_empty() {
            if let Some(fallback) = task.fallback_message() {
                messages.push(fallback.to_string());
            }
        }

        let delivered = match &task.output {
            Some(output) => {
                self.dispatcher
                    .relay(
                        output.surface_id.as_deref(),
                        output.channel_id.as_deref(),
                        Some(&messages),
                    )
                    .await
            }
            None => {
                for message in &messages {
                    tracing::info!(task = %task.name, message = %message, "Scheduled task output");
                }
                0
            }
        };

        tracing::info!(
            task = %task.name,
            intent = %task.intent,
            status = status.as_str(),
            delivered,
            "Scheduled task finished"
        );
        TaskRun {
            name: task.name.clone(),
            intent: task.intent.clone(),
            status,
            messages,
            delivered,
        }
    }
}

#[cfg(feature = "telegram")]
async fn build_surfaces(
    config: &Config,
) -> Result<(SurfaceRegistry, Option<Arc<NotifyAdminSurface>>)> {
    use crate::surfaces::TelegramSurface;
    use butler_core::intents::surfaces as surface_ids;
    use butler_core::Surface;

    let mut registry = SurfaceRegistry::new();
    let mut chat: Option<Arc<dyn Surface>> = None;

    if let Some(ref telegram) = config.telegram {
        let surface = Arc::new(TelegramSurface::new(
            telegram.surface_id.clone(),
            &telegram.bot_token,
        ));
        if let Some(ref url) = telegram.webhook_url {
            if let Err(e) = surface.register_webhook(url).await {
                tracing::warn!(error = %e, "Could not register the Telegram webhook");
            }
        }
        registry.register(surface.clone());
        chat = Some(surface as Arc<dyn Surface>);
    }

    let admin = match config.notify_admin {
        Some(ref admin_config) => {
            let inner: Option<Arc<dyn Surface>> = match admin_config.bot_token {
                Some(ref token) if !token.trim().is_empty() => Some(Arc::new(
                    TelegramSurface::new(surface_ids::NOTIFY_ADMIN, token),
                )),
                _ => chat.clone(),
            };
            inner.map(|inner| {
                Arc::new(NotifyAdminSurface::new(
                    surface_ids::NOTIFY_ADMIN,
                    admin_config.chat_id.clone(),
                    inner,
                ))
            })
        }
        None => None,
    };
    if let Some(ref admin) = admin {
        registry.register(admin.clone());
    }

    Ok((registry, admin))
}

#[cfg(not(feature = "telegram"))]
async fn build_surfaces(
    config: &Config,
) -> Result<(SurfaceRegistry, Option<Arc<NotifyAdminSurface>>)> {
    if config.telegram.is_some() || config.notify_admin.is_some() {
        tracing::warn!("Built without the telegram feature, chat surfaces are disabled");
    }
    Ok((SurfaceRegistry::new(), None))
}
