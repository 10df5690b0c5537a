use std::{
    fmt::{Debug, Display},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinError,
};

use crate::api::{GardenApi, HttpGardenApi};
use crate::controller::{Controller, Notice, Prompter};
use crate::panel::Panel;
use crate::poller::Poller;

mod api;
mod controller;
pub mod models;
mod panel;
mod poller;
mod telemetry;

/// The controller's access point serves the panel and its API.
const BASE_URL: &str = "http://192.168.4.1";
const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber =
        telemetry::create_panel_subscriber("hochbeet_panel".to_string(), std::io::stdout);
    telemetry::init_subscriber(subscriber);

    tracing::info!("Starting panel");

    let api: Arc<dyn GardenApi> =
        Arc::new(HttpGardenApi::new(BASE_URL).context("Failed to build API client")?);
    let panel = Arc::new(Mutex::new(Panel::new()));

    // The sender is the seam the presentation layer drives; it stays open for
    // the lifetime of the panel.
    let (_ui_commands, command_rx) = mpsc::channel(16);

    let poller = Poller::new(Arc::clone(&api), Arc::clone(&panel), POLL_INTERVAL);
    let controller = Controller::new(api, panel, Arc::new(ConsolePrompter), command_rx);

    let poller_task = tokio::spawn(poller.run());
    let controller_task = tokio::spawn(controller.run());
    let signal_task = tokio::signal::ctrl_c();

    tokio::select! {
        result = poller_task => report_exit("poller", result),
        result = controller_task => report_exit("controller", result),
        result = signal_task => report_exit("closed by user", Ok(result)),
    };

    Ok(())
}

/// Console stand-in for the presentation layer's alert/confirm dialogs.
struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Info(message) => println!("{message}"),
            Notice::Error(message) => eprintln!("{message}"),
        }
    }

    fn confirm(&self, question: &str) -> bool {
        dialoguer::Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => tracing::info!("{} has exited", task_name),
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{}' task failed to complete",
                task_name
            )
        }
    }
}
