use std::sync::Arc;

use eframe::egui::{self, Button, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use sunburst_nav::util::format_weight;

use super::super::{SearchMatch, SearchMatchCache, ViewModel};

impl ViewModel {
    pub(in crate::app) const SEARCH_RESULT_ROWS: usize = 40;

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Navigate");
        ui.separator();
        ui.add_space(4.0);

        let focus = self.engine.focus_node();
        let focus_name = focus.name.clone();
        let focus_weight = focus.weight;
        let can_zoom_out = focus.parent.is_some();

        ui.label(format!("Focus: {focus_name}"));
        ui.label(format!("Weight: {}", format_weight(focus_weight)));
        ui.horizontal(|ui| {
            if ui
                .add_enabled(can_zoom_out, Button::new("Zoom out"))
                .on_hover_text("Same as clicking the center of the sunburst.")
                .clicked()
            {
                self.engine.zoom_out();
            }
            if ui
                .add_enabled(can_zoom_out, Button::new("Whole tree"))
                .clicked()
            {
                let root = self.engine.hierarchy().root();
                if let Err(error) = self.engine.set_focus(root) {
                    self.report_error(&error);
                }
            }
        });

        ui.separator();
        ui.label("Search")
            .on_hover_text("Fuzzy match on node names and ids.");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Click a result to bring it into view and open its details.");
        ui.add_space(4.0);

        let matches = self.search_matches();
        if !self.search.trim().is_empty() && matches.is_empty() {
            ui.label("No matching nodes.");
        }

        let selected_id = self
            .engine
            .selection()
            .map(|selection| selection.id.clone());
        let mut target = None;
        egui::ScrollArea::vertical()
            .id_salt("search_results")
            .show(ui, |ui| {
                for entry in matches.iter().take(Self::SEARCH_RESULT_ROWS) {
                    let is_selected = selected_id.as_deref() == Some(entry.id.as_str());
                    let response = ui
                        .selectable_label(is_selected, entry.name.as_str())
                        .on_hover_text(entry.path.as_str());
                    if response.clicked() {
                        target = Some(entry.id.clone());
                    }
                }
                if matches.len() > Self::SEARCH_RESULT_ROWS {
                    ui.small(format!(
                        "{} more matches, refine the query",
                        matches.len() - Self::SEARCH_RESULT_ROWS
                    ));
                }
            });

        if let Some(id) = target
            && let Err(error) = self.engine.navigate_to(&id)
        {
            self.report_error(&error);
        }
    }

    fn search_matches(&mut self) -> Arc<Vec<SearchMatch>> {
        let query = self.search.trim();
        if query.is_empty() {
            self.search_match_cache = None;
            return Arc::default();
        }

        let generation = self.engine.hierarchy().generation();
        if let Some(cache) = &self.search_match_cache
            && cache.query == query
            && cache.generation == generation
        {
            return Arc::clone(&cache.matches);
        }

        let matcher = SkimMatcherV2::default();
        let hierarchy = self.engine.hierarchy();
        let mut matches = hierarchy
            .iter()
            .filter_map(|(handle, node)| {
                let score = matcher
                    .fuzzy_match(&node.name, query)
                    .max(matcher.fuzzy_match(&node.id, query))?;
                let path = hierarchy.ancestor_names(handle).ok()?.join("/");
                Some(SearchMatch {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    path,
                    score,
                })
            })
            .collect::<Vec<_>>();
        matches.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));

        let matches = Arc::new(matches);
        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            generation,
            matches: Arc::clone(&matches),
        });
        matches
    }
}
