use std::collections::HashMap;

use eframe::egui::{self, RichText, Ui};
use log::debug;
use serde_json::Value;

use sunburst_nav::engine::Selection;
use sunburst_nav::util::format_weight;

use super::super::ViewModel;

/// Draws the payload of one `detail_kind`.
///
/// A renderer that changes the underlying data calls `on_mutated`, which
/// reloads the tree and reopens the selection if its node survives.
pub(in crate::app) trait DetailRenderer {
    fn name(&self) -> &'static str;

    fn show(&self, ui: &mut Ui, selection: &Selection, on_mutated: &mut dyn FnMut());
}

struct JsonDetail;

impl DetailRenderer for JsonDetail {
    fn name(&self) -> &'static str {
        "json"
    }

    fn show(&self, ui: &mut Ui, selection: &Selection, _on_mutated: &mut dyn FnMut()) {
        match serde_json::to_string_pretty(&selection.payload) {
            Ok(text) => {
                ui.label(RichText::new(text).monospace());
            }
            Err(error) => {
                ui.label(format!("Payload cannot be displayed: {error}"));
            }
        }
    }
}

/// Payloads of the shape `{ "title"?: .., "items": [..] }`.
struct ItemListDetail;

impl DetailRenderer for ItemListDetail {
    fn name(&self) -> &'static str {
        "list"
    }

    fn show(&self, ui: &mut Ui, selection: &Selection, on_mutated: &mut dyn FnMut()) {
        let Some(items) = selection.payload.get("items").and_then(Value::as_array) else {
            JsonDetail.show(ui, selection, on_mutated);
            return;
        };

        if let Some(title) = selection.payload.get("title").and_then(Value::as_str) {
            ui.label(RichText::new(title).strong());
        }
        if items.is_empty() {
            ui.label("No items.");
            return;
        }

        egui::Grid::new(("detail_items", selection.id.as_str()))
            .striped(true)
            .show(ui, |ui| {
                for item in items {
                    let (label, value) = item_columns(item);
                    ui.label(label);
                    ui.label(value);
                    ui.end_row();
                }
            });
    }
}

fn item_columns(item: &Value) -> (String, String) {
    match item {
        Value::String(text) => (text.clone(), String::new()),
        Value::Object(fields) => {
            let label = ["name", "label", "title", "id"]
                .iter()
                .find_map(|key| fields.get(*key).and_then(Value::as_str))
                .unwrap_or("item")
                .to_owned();
            let value = match fields.get("value") {
                Some(Value::Number(number)) => number
                    .as_f64()
                    .map(format_weight)
                    .unwrap_or_else(|| number.to_string()),
                Some(Value::String(text)) => text.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            (label, value)
        }
        other => (other.to_string(), String::new()),
    }
}

/// Picks a renderer by `detail_kind`, falling back to the item list for
/// payloads carrying `items` and to raw JSON otherwise.
pub(in crate::app) struct DetailRegistry {
    renderers: HashMap<String, Box<dyn DetailRenderer>>,
    fallback: Box<dyn DetailRenderer>,
}

impl Default for DetailRegistry {
    fn default() -> Self {
        let mut registry = Self {
            renderers: HashMap::new(),
            fallback: Box::new(JsonDetail),
        };
        registry.register("list", Box::new(ItemListDetail));
        registry.register("json", Box::new(JsonDetail));
        registry
    }
}

impl DetailRegistry {
    pub(in crate::app) fn register(&mut self, kind: &str, renderer: Box<dyn DetailRenderer>) {
        self.renderers.insert(kind.to_owned(), renderer);
    }

    pub(in crate::app) fn renderer_for(&self, selection: &Selection) -> &dyn DetailRenderer {
        if let Some(renderer) = self.renderers.get(&selection.detail_kind) {
            return renderer.as_ref();
        }
        if selection.payload.get("items").is_some_and(Value::is_array) {
            return &ItemListDetail;
        }
        self.fallback.as_ref()
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Details");
        ui.add_space(6.0);

        let Some(selection) = self.engine.selection().cloned() else {
            ui.label("Click an arc or a search result to open its details.");
            return;
        };

        let (name, weight) = self
            .engine
            .node_by_id(&selection.id)
            .map(|node| (node.name.clone(), Some(node.weight)))
            .unwrap_or_else(|| (selection.id.clone(), None));
        let renderer = self.details.renderer_for(&selection);

        ui.label(RichText::new(name).strong());
        ui.small(selection.id.as_str());
        ui.label(format!("kind: {} ({} view)", selection.detail_kind, renderer.name()));
        if let Some(weight) = weight {
            ui.label(format!("weight: {}", format_weight(weight)));
        }

        let mut mutated = false;
        let mut close_requested = false;
        ui.horizontal(|ui| {
            mutated = ui
                .button("Data changed")
                .on_hover_text("Reload the tree; this view stays open while its node exists.")
                .clicked();
            close_requested = ui.button("Close").clicked();
        });
        ui.separator();

        egui::ScrollArea::vertical()
            .id_salt("detail_payload")
            .show(ui, |ui| renderer.show(ui, &selection, &mut || mutated = true));

        if mutated {
            debug!("{} reported a data change", selection.id);
            self.request_refresh();
        }
        if close_requested {
            self.engine.close_selection();
        }
    }
}
