use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, Mutex};

use crate::api::{ApiError, GardenApi};
use crate::models::Plant;
use crate::panel::Panel;

/// A blocking message surfaced to the user, the way the dashboard's alert
/// dialog behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Blocking notification and confirmation dialogs. The presentation layer
/// owns the modality; tests mock it.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter: Send + Sync {
    fn notify(&self, notice: Notice);

    /// Ask the user to confirm a destructive action.
    fn confirm(&self, question: &str) -> bool;
}

/// User input events, processed strictly in arrival order.
#[derive(Debug, Clone)]
pub enum PanelCommand {
    ShowSection(String),
    SliderInput { bed: usize, value: i64 },
    LightTargetInput(i64),
    SaveConfig,
    ReloadPlants,
    NewPlantName(String),
    NewPlantMoisture(String),
    AddPlant,
    SelectPlantForBed { bed: usize, name: Option<String> },
    ApplyPlantToBed { bed: usize },
    SelectDeletion(Option<String>),
    DeletePlant,
}

pub struct Controller {
    api: Arc<dyn GardenApi>,
    panel: Arc<Mutex<Panel>>,
    prompter: Arc<dyn Prompter>,
    commands: mpsc::Receiver<PanelCommand>,
}

impl Controller {
    pub fn new(
        api: Arc<dyn GardenApi>,
        panel: Arc<Mutex<Panel>>,
        prompter: Arc<dyn Prompter>,
        commands: mpsc::Receiver<PanelCommand>,
    ) -> Self {
        Self {
            api,
            panel,
            prompter,
            commands,
        }
    }

    /// Load the persisted state, then serve user commands until the input
    /// channel closes. No command failure ends the loop.
    pub async fn run(mut self) -> Result<()> {
        self.load_config().await;
        self.reload_plants().await;

        while let Some(command) = self.commands.recv().await {
            self.handle_command(command).await;
        }

        Ok(())
    }

    async fn handle_command(&self, command: PanelCommand) {
        match command {
            PanelCommand::ShowSection(id) => {
                if let Err(e) = self.panel.lock().await.show_section(&id) {
                    tracing::warn!(error = %e, "Ignoring section switch");
                }
            }
            PanelCommand::SliderInput { bed, value } => {
                if let Err(e) = self.panel.lock().await.set_bed_slider(bed, value) {
                    tracing::warn!(error = %e, "Ignoring slider input");
                }
            }
            PanelCommand::LightTargetInput(lux) => {
                self.panel.lock().await.set_light_target(lux);
            }
            PanelCommand::SaveConfig => self.save_config().await,
            PanelCommand::ReloadPlants => self.reload_plants().await,
            PanelCommand::NewPlantName(name) => {
                self.panel.lock().await.set_new_plant_name(name);
            }
            PanelCommand::NewPlantMoisture(moisture) => {
                self.panel.lock().await.set_new_plant_moisture(moisture);
            }
            PanelCommand::AddPlant => self.add_plant().await,
            PanelCommand::SelectPlantForBed { bed, name } => {
                if let Err(e) = self.panel.lock().await.select_plant_for_bed(bed, name) {
                    tracing::warn!(error = %e, "Ignoring plant selection");
                }
            }
            PanelCommand::ApplyPlantToBed { bed } => {
                if let Err(e) = self.panel.lock().await.apply_plant_to_bed(bed) {
                    tracing::warn!(error = %e, "Ignoring plant apply");
                }
            }
            PanelCommand::SelectDeletion(name) => {
                self.panel.lock().await.select_deletion(name);
            }
            PanelCommand::DeletePlant => self.delete_plant().await,
        }
    }

    /// Fetch the persisted configuration into the controls. A failure is
    /// logged and the controls keep their defaults.
    #[tracing::instrument(skip(self))]
    async fn load_config(&self) {
        match self.api.load_config().await {
            Ok(config) => self.panel.lock().await.apply_config(&config),
            Err(e) => tracing::warn!(error = %e, "Failed to load configuration"),
        }
    }

    /// Submit the configuration the controls currently describe.
    #[tracing::instrument(skip(self))]
    async fn save_config(&self) {
        let config = self.panel.lock().await.current_config();

        match self.api.save_config(config).await {
            Ok(text) => {
                self.prompter
                    .notify(Notice::Info(format!("Configuration saved: {text}")));
            }
            Err(e) => {
                self.prompter
                    .notify(Notice::Error(format!("Saving configuration failed: {e}")));
            }
        }
    }

    /// Fetch the registry and swap it into the panel wholesale. A failure is
    /// logged and the previous list stays.
    #[tracing::instrument(skip(self))]
    async fn reload_plants(&self) {
        match self.api.plants().await {
            Ok(plants) => self.panel.lock().await.replace_plants(plants),
            Err(e) => tracing::warn!(error = %e, "Failed to load plant registry"),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn add_plant(&self) {
        let (name, moisture) = {
            let panel = self.panel.lock().await;
            let (name, moisture) = panel.new_plant_form();
            (name.trim().to_string(), moisture.trim().to_string())
        };

        if name.is_empty() {
            self.prompter
                .notify(Notice::Error("Enter a plant name first".to_string()));
            return;
        }
        let Ok(target_moisture) = moisture.parse::<i64>() else {
            self.prompter.notify(Notice::Error(
                "Target moisture must be a number".to_string(),
            ));
            return;
        };

        match self.api.add_plant(Plant::new(name.clone(), target_moisture)).await {
            Ok(text) => {
                self.prompter
                    .notify(Notice::Info(format!("Plant added: {text}")));
                self.panel.lock().await.clear_new_plant_form();
                self.reload_plants().await;
            }
            Err(ApiError::Conflict) => {
                self.prompter.notify(Notice::Error(format!(
                    "A plant named `{name}` already exists"
                )));
            }
            Err(e) => {
                self.prompter
                    .notify(Notice::Error(format!("Adding plant failed: {e}")));
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete_plant(&self) {
        let Some(name) = self
            .panel
            .lock()
            .await
            .deletion_selection()
            .map(str::to_string)
        else {
            self.prompter
                .notify(Notice::Error("Select a plant to delete first".to_string()));
            return;
        };

        if !self.prompter.confirm(&format!("Delete plant `{name}`?")) {
            return;
        }

        match self.api.delete_plant(name.clone()).await {
            Ok(text) => {
                self.prompter
                    .notify(Notice::Info(format!("Plant deleted: {text}")));
                self.panel.lock().await.select_deletion(None);
                self.reload_plants().await;
            }
            Err(ApiError::NotFound) => {
                self.prompter
                    .notify(Notice::Error(format!("Plant `{name}` not found")));
            }
            Err(e) => {
                self.prompter
                    .notify(Notice::Error(format!("Deleting plant failed: {e}")));
            }
        }
    }
}
