use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{IrrigationConfig, Plant, SensorSnapshot, BED_COUNT};

/// Moisture target the bed sliders start out on before the persisted
/// configuration has been loaded.
const DEFAULT_BED_TARGET: u8 = 50;
const DEFAULT_LIGHT_TARGET: i64 = 500;

/// Placeholder shown in a display slot before its first reading arrives.
const EMPTY_SLOT: &str = "–";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PanelError {
    #[error("unknown section `{0}`")]
    UnknownSection(String),
    #[error("no bed {0}")]
    UnknownBed(usize),
}

/// The three tabs of the panel.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::AsRefStr,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
)]
pub enum Section {
    #[strum(serialize = "dashboard")]
    Dashboard,
    #[strum(serialize = "beds")]
    Beds,
    #[strum(serialize = "system")]
    System,
}

/// One bed's target-moisture controls: the slider, its echo display and the
/// plant dropdown next to them.
#[derive(Debug, Clone)]
pub struct BedControl {
    slider: u8,
    echo: String,
    selection: Option<String>,
}

impl BedControl {
    fn new(initial: u8) -> Self {
        Self {
            slider: initial,
            echo: initial.to_string(),
            selection: None,
        }
    }

    /// Move the slider and mirror the new position into the echo display.
    /// Values outside the control's 0..=100 range stop at the end of travel.
    fn set(&mut self, value: i64) {
        self.slider = value.clamp(0, 100) as u8;
        self.echo = self.slider.to_string();
    }

    pub fn slider(&self) -> u8 {
        self.slider
    }

    pub fn echo(&self) -> &str {
        &self.echo
    }

    /// Plant currently selected in this bed's dropdown, if any.
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }
}

/// Read-only display slots on the dashboard tab. Each holds the rendered
/// string, unit suffix included, exactly as the presentation layer shows it.
#[derive(Debug, Clone)]
pub struct DashboardView {
    light: String,
    temperature: String,
    humidity: String,
    pump_status: String,
    bed_moisture: [String; BED_COUNT],
    float_high: String,
    float_low: String,
    roof_status: String,
}

impl DashboardView {
    fn new() -> Self {
        Self {
            light: EMPTY_SLOT.to_string(),
            temperature: EMPTY_SLOT.to_string(),
            humidity: EMPTY_SLOT.to_string(),
            pump_status: EMPTY_SLOT.to_string(),
            bed_moisture: std::array::from_fn(|_| EMPTY_SLOT.to_string()),
            float_high: EMPTY_SLOT.to_string(),
            float_low: EMPTY_SLOT.to_string(),
            roof_status: EMPTY_SLOT.to_string(),
        }
    }

    fn apply(&mut self, snapshot: &SensorSnapshot) {
        self.light = format!("{} lx", snapshot.light());
        self.temperature = format!("{} °C", snapshot.temperature());
        self.humidity = format!("{} %", snapshot.humidity());

        // Fields older firmware does not send keep their last value.
        if let Some(status) = snapshot.pump_status() {
            self.pump_status = status.to_string();
        }
        for (slot, reading) in self.bed_moisture.iter_mut().zip(snapshot.bed_moistures()) {
            if let Some(percent) = reading {
                *slot = format!("{} %", percent.clamp(0.0, 100.0));
            }
        }
        if let Some(closed) = snapshot.float_high() {
            self.float_high = float_label(*closed).to_string();
        }
        if let Some(closed) = snapshot.float_low() {
            self.float_low = float_label(*closed).to_string();
        }
        if let Some(roof) = snapshot.roof_status() {
            self.roof_status = roof.clone();
        }
    }

    pub fn light(&self) -> &str {
        &self.light
    }

    pub fn temperature(&self) -> &str {
        &self.temperature
    }

    pub fn humidity(&self) -> &str {
        &self.humidity
    }

    pub fn pump_status(&self) -> &str {
        &self.pump_status
    }

    pub fn bed_moisture(&self) -> &[String; BED_COUNT] {
        &self.bed_moisture
    }

    pub fn float_high(&self) -> &str {
        &self.float_high
    }

    pub fn float_low(&self) -> &str {
        &self.float_low
    }

    pub fn roof_status(&self) -> &str {
        &self.roof_status
    }
}

fn float_label(closed: bool) -> &'static str {
    if closed {
        "closed"
    } else {
        "open"
    }
}

/// Connection indicator on the system tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum LinkState {
    #[strum(serialize = "connected")]
    Connected,
    #[strum(serialize = "disconnected")]
    Disconnected,
    #[strum(serialize = "unknown")]
    Unknown,
}

#[derive(Debug, Clone)]
pub struct SystemView {
    link: LinkState,
    last_update: Option<DateTime<Utc>>,
}

impl SystemView {
    pub fn link(&self) -> LinkState {
        self.link
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}

/// The panel's entire UI state. The presentation layer renders from this and
/// feeds user input back in as commands; nothing here touches the network.
#[derive(Debug, Clone)]
pub struct Panel {
    active_section: Section,
    beds: [BedControl; BED_COUNT],
    light_target: i64,
    dashboard: DashboardView,
    system: SystemView,
    plants: Vec<Plant>,
    deletion_selection: Option<String>,
    new_plant_name: String,
    new_plant_moisture: String,
}

impl Panel {
    pub fn new() -> Self {
        Self {
            active_section: Section::Dashboard,
            beds: std::array::from_fn(|_| BedControl::new(DEFAULT_BED_TARGET)),
            light_target: DEFAULT_LIGHT_TARGET,
            dashboard: DashboardView::new(),
            system: SystemView {
                link: LinkState::Unknown,
                last_update: None,
            },
            plants: Vec::new(),
            deletion_selection: None,
            new_plant_name: String::new(),
            new_plant_moisture: String::new(),
        }
    }

    /// Switch to the section with the given id. Unknown ids are an error
    /// rather than a silent miss.
    pub fn show_section(&mut self, id: &str) -> Result<(), PanelError> {
        let section = id
            .parse::<Section>()
            .map_err(|_| PanelError::UnknownSection(id.to_string()))?;
        self.active_section = section;
        Ok(())
    }

    pub fn active_section(&self) -> Section {
        self.active_section
    }

    /// Bed controls for a 1-based bed index.
    pub fn bed(&self, bed: usize) -> Result<&BedControl, PanelError> {
        bed.checked_sub(1)
            .and_then(|i| self.beds.get(i))
            .ok_or(PanelError::UnknownBed(bed))
    }

    fn bed_mut(&mut self, bed: usize) -> Result<&mut BedControl, PanelError> {
        bed.checked_sub(1)
            .and_then(|i| self.beds.get_mut(i))
            .ok_or(PanelError::UnknownBed(bed))
    }

    /// A slider was dragged or stepped: store the value and echo it.
    pub fn set_bed_slider(&mut self, bed: usize, value: i64) -> Result<(), PanelError> {
        self.bed_mut(bed)?.set(value);
        Ok(())
    }

    pub fn set_light_target(&mut self, lux: i64) {
        self.light_target = lux;
    }

    pub fn light_target(&self) -> i64 {
        self.light_target
    }

    /// Push a freshly loaded configuration into the controls.
    pub fn apply_config(&mut self, config: &IrrigationConfig) {
        for bed in 1..=BED_COUNT {
            if let Some(target) = config.bed_target(bed) {
                // Bed indices are in range by construction.
                let _ = self.set_bed_slider(bed, target);
            }
        }
        self.light_target = config.lux();
    }

    /// The configuration the controls currently describe, as it would be
    /// submitted to the controller.
    pub fn current_config(&self) -> IrrigationConfig {
        let targets = std::array::from_fn(|i| self.beds[i].slider);
        IrrigationConfig::new(targets, self.light_target)
    }

    /// Replace the plant list wholesale and rebuild every dropdown from it.
    /// All selections fall back to the "none selected" sentinel, as rebuilding
    /// the options does in the markup.
    pub fn replace_plants(&mut self, plants: Vec<Plant>) {
        self.plants = plants;
        for bed in &mut self.beds {
            bed.selection = None;
        }
        self.deletion_selection = None;
    }

    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    /// Entries of every plant dropdown, in registry order. The leading
    /// sentinel is the `None` selection, not an entry.
    pub fn dropdown_entries(&self) -> Vec<&str> {
        self.plants.iter().map(|plant| plant.name().as_str()).collect()
    }

    pub fn select_plant_for_bed(
        &mut self,
        bed: usize,
        name: Option<String>,
    ) -> Result<(), PanelError> {
        self.bed_mut(bed)?.selection = name;
        Ok(())
    }

    /// Copy the selected plant's moisture target onto the bed's slider,
    /// clamped to the control's range. A selection that no longer matches the
    /// list (stale dropdown) does nothing.
    pub fn apply_plant_to_bed(&mut self, bed: usize) -> Result<(), PanelError> {
        let Some(name) = self.bed(bed)?.selection() else {
            return Ok(());
        };
        let Some(target) = self
            .plants
            .iter()
            .find(|plant| plant.name() == name)
            .map(|plant| *plant.target_moisture())
        else {
            return Ok(());
        };

        self.bed_mut(bed)?.set(target);
        Ok(())
    }

    pub fn select_deletion(&mut self, name: Option<String>) {
        self.deletion_selection = name;
    }

    pub fn deletion_selection(&self) -> Option<&str> {
        self.deletion_selection.as_deref()
    }

    pub fn set_new_plant_name(&mut self, name: String) {
        self.new_plant_name = name;
    }

    pub fn set_new_plant_moisture(&mut self, moisture: String) {
        self.new_plant_moisture = moisture;
    }

    pub fn new_plant_form(&self) -> (&str, &str) {
        (&self.new_plant_name, &self.new_plant_moisture)
    }

    pub fn clear_new_plant_form(&mut self) {
        self.new_plant_name.clear();
        self.new_plant_moisture.clear();
    }

    /// A poll came back: refresh the dashboard and stamp the system tab.
    pub fn record_snapshot(&mut self, snapshot: &SensorSnapshot) {
        self.dashboard.apply(snapshot);
        self.system.link = LinkState::Connected;
        self.system.last_update = Some(Utc::now());
    }

    /// A poll failed: flip the link indicator, leave every reading as it was.
    pub fn record_poll_failure(&mut self) {
        self.system.link = LinkState::Disconnected;
    }

    pub fn dashboard(&self) -> &DashboardView {
        &self.dashboard
    }

    pub fn system(&self) -> &SystemView {
        &self.system
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;

    fn snapshot(value: serde_json::Value) -> SensorSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn every_section_id_activates_its_section() {
        let mut panel = Panel::new();

        for section in Section::iter() {
            panel.show_section(section.as_ref()).unwrap();
            assert_eq!(panel.active_section(), section);
        }
    }

    #[test]
    fn unknown_section_id_is_an_error_and_changes_nothing() {
        let mut panel = Panel::new();
        panel.show_section("beds").unwrap();

        let result = panel.show_section("pumps");

        assert_eq!(
            result,
            Err(PanelError::UnknownSection("pumps".to_string()))
        );
        assert_eq!(panel.active_section(), Section::Beds);
    }

    #[test]
    fn showing_the_active_section_again_is_a_no_op() {
        let mut panel = Panel::new();
        panel.show_section("system").unwrap();
        panel.show_section("system").unwrap();

        assert_eq!(panel.active_section(), Section::System);
    }

    #[test]
    fn slider_moves_echo_into_the_display() {
        let mut panel = Panel::new();

        for value in [0, 37, 100] {
            panel.set_bed_slider(3, value).unwrap();
            assert_eq!(panel.bed(3).unwrap().slider(), value as u8);
            assert_eq!(panel.bed(3).unwrap().echo(), value.to_string());
        }
    }

    #[test]
    fn slider_stops_at_the_end_of_travel() {
        let mut panel = Panel::new();

        panel.set_bed_slider(1, 150).unwrap();
        assert_eq!(panel.bed(1).unwrap().echo(), "100");

        panel.set_bed_slider(1, -10).unwrap();
        assert_eq!(panel.bed(1).unwrap().echo(), "0");
    }

    #[test]
    fn bed_zero_and_bed_six_do_not_exist() {
        let mut panel = Panel::new();

        assert_eq!(panel.set_bed_slider(0, 10), Err(PanelError::UnknownBed(0)));
        assert_eq!(panel.set_bed_slider(6, 10), Err(PanelError::UnknownBed(6)));
    }

    #[test]
    fn loaded_config_lands_on_sliders_echoes_and_light_input() {
        let mut panel = Panel::new();
        let config = IrrigationConfig::new([10, 30, 50, 70, 90], 500);

        panel.apply_config(&config);

        for (bed, expected) in [(1, 10), (2, 30), (3, 50), (4, 70), (5, 90)] {
            assert_eq!(panel.bed(bed).unwrap().slider(), expected);
            assert_eq!(panel.bed(bed).unwrap().echo(), expected.to_string());
        }
        assert_eq!(panel.light_target(), 500);
    }

    #[test]
    fn current_config_reads_the_controls_back_exactly() {
        let mut panel = Panel::new();
        for (bed, value) in [(1, 10), (2, 20), (3, 30), (4, 40), (5, 50)] {
            panel.set_bed_slider(bed, value).unwrap();
        }
        panel.set_light_target(500);

        assert_eq!(
            panel.current_config(),
            IrrigationConfig::new([10, 20, 30, 40, 50], 500)
        );
    }

    #[test]
    fn replacing_plants_rebuilds_dropdowns_and_resets_selections() {
        let mut panel = Panel::new();
        panel.replace_plants(vec![Plant::new("Basil", 40)]);
        panel
            .select_plant_for_bed(2, Some("Basil".to_string()))
            .unwrap();
        panel.select_deletion(Some("Basil".to_string()));

        panel.replace_plants(vec![Plant::new("Mint", 65), Plant::new("Sage", 30)]);

        assert_eq!(panel.dropdown_entries(), vec!["Mint", "Sage"]);
        assert_eq!(panel.bed(2).unwrap().selection(), None);
        assert_eq!(panel.deletion_selection(), None);
    }

    #[test]
    fn applying_a_plant_clamps_its_target_into_the_slider_range() {
        let mut panel = Panel::new();
        panel.replace_plants(vec![Plant::new("Fern", 150), Plant::new("Cactus", -10)]);

        panel
            .select_plant_for_bed(1, Some("Fern".to_string()))
            .unwrap();
        panel.apply_plant_to_bed(1).unwrap();
        assert_eq!(panel.bed(1).unwrap().slider(), 100);
        assert_eq!(panel.bed(1).unwrap().echo(), "100");

        panel
            .select_plant_for_bed(2, Some("Cactus".to_string()))
            .unwrap();
        panel.apply_plant_to_bed(2).unwrap();
        assert_eq!(panel.bed(2).unwrap().slider(), 0);
        assert_eq!(panel.bed(2).unwrap().echo(), "0");
    }

    #[test]
    fn stale_or_missing_selection_applies_nothing() {
        let mut panel = Panel::new();
        panel.replace_plants(vec![Plant::new("Mint", 65)]);
        panel.set_bed_slider(4, 42).unwrap();

        // No selection at all.
        panel.apply_plant_to_bed(4).unwrap();
        assert_eq!(panel.bed(4).unwrap().slider(), 42);

        // Selection left over from a list that no longer contains it.
        panel
            .select_plant_for_bed(4, Some("Basil".to_string()))
            .unwrap();
        panel.apply_plant_to_bed(4).unwrap();
        assert_eq!(panel.bed(4).unwrap().slider(), 42);
    }

    #[test]
    fn snapshot_lands_in_the_display_slots_with_units() {
        let mut panel = Panel::new();

        panel.record_snapshot(&snapshot(json!({
            "light": 512.0,
            "temperature": 21.5,
            "humidity": 48.0,
            "pumpStatus": "on",
            "beet2": 130.0,
        })));

        assert_eq!(panel.dashboard().light(), "512 lx");
        assert_eq!(panel.dashboard().temperature(), "21.5 °C");
        assert_eq!(panel.dashboard().humidity(), "48 %");
        assert_eq!(panel.dashboard().pump_status(), "on");
        // Readings clamp into the 0..=100 display range.
        assert_eq!(panel.dashboard().bed_moisture()[1], "100 %");
        assert_eq!(panel.system().link(), LinkState::Connected);
        assert!(panel.system().last_update().is_some());
    }

    #[test]
    fn absent_optional_fields_leave_their_slots_alone() {
        let mut panel = Panel::new();
        panel.record_snapshot(&snapshot(json!({
            "light": 100.0,
            "temperature": 20.0,
            "humidity": 40.0,
            "pumpStatus": "off",
            "roofStatus": "open",
        })));

        panel.record_snapshot(&snapshot(json!({
            "light": 101.0,
            "temperature": 20.5,
            "humidity": 41.0,
        })));

        assert_eq!(panel.dashboard().light(), "101 lx");
        assert_eq!(panel.dashboard().pump_status(), "off");
        assert_eq!(panel.dashboard().roof_status(), "open");
    }

    #[test]
    fn a_failed_poll_only_flips_the_link_indicator() {
        let mut panel = Panel::new();
        panel.record_snapshot(&snapshot(json!({
            "light": 512.0,
            "temperature": 21.5,
            "humidity": 48.0,
        })));

        panel.record_poll_failure();

        assert_eq!(panel.dashboard().light(), "512 lx");
        assert_eq!(panel.dashboard().temperature(), "21.5 °C");
        assert_eq!(panel.system().link(), LinkState::Disconnected);
        assert!(panel.system().last_update().is_some());
    }
}
