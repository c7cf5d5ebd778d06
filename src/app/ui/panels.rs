use std::collections::VecDeque;
use std::time::Duration;

use eframe::egui::{self, Align, Color32, Context, Layout, RichText, Ui};
use log::{debug, info};

use sunburst_nav::engine::{CloseReason, FocusReconcile, RefreshRequest};
use sunburst_nav::label::BREADCRUMB_SEPARATOR;
use sunburst_nav::{Sunburst, SunburstError, SunburstEvent};

use super::super::{Notice, NoticeSeverity, ViewModel};
use super::details::DetailRegistry;

impl ViewModel {
    pub(in crate::app) const NOTICE_SECS: f64 = 6.0;
    pub(in crate::app) const MAX_NOTICES: usize = 4;

    pub(in crate::app) fn new(engine: Sunburst, source_label: String) -> Self {
        Self {
            engine,
            source_label,
            search: String::new(),
            search_match_cache: None,
            details: DetailRegistry::default(),
            notices: VecDeque::new(),
            hovered: None,
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        let now = ctx.input(|input| input.time);
        self.engine.tick(now);
        self.apply_refresh();
        self.collect_events();
        self.expire_notices(now);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_top_bar(ui));

        if !self.notices.is_empty() {
            egui::TopBottomPanel::bottom("notices")
                .resizable(false)
                .show(ctx, |ui| self.draw_notices(ui));
        }

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_sunburst(ui));

        if self.engine.is_animating() {
            ctx.request_repaint();
        } else if self.engine.is_refreshing() || !self.notices.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn draw_top_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("sunburst-nav");
            ui.separator();
            ui.label(self.engine.breadcrumb().join(BREADCRUMB_SEPARATOR));
            ui.separator();
            ui.label(format!("nodes: {}", self.engine.hierarchy().len()));
            ui.label(format!("depth: {}", self.engine.hierarchy().height()));
            ui.label(format!("source: {}", self.source_label));

            let refresh_button = ui
                .button("Refresh")
                .on_hover_text("Fetch the tree again; the current view stays usable meanwhile.");
            if refresh_button.clicked() {
                self.request_refresh();
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if self.engine.is_refreshing() {
                    ui.label("refreshing");
                    ui.spinner();
                }
            });
        });
    }

    fn draw_notices(&mut self, ui: &mut Ui) {
        let mut dismissed = None;
        for (position, notice) in self.notices.iter().enumerate() {
            ui.horizontal(|ui| {
                let color = match notice.severity {
                    NoticeSeverity::Info => Color32::from_gray(220),
                    NoticeSeverity::Error => Color32::from_rgb(241, 126, 104),
                };
                ui.label(RichText::new(notice.message.as_str()).color(color));
                if ui.small_button("Dismiss").clicked() {
                    dismissed = Some(position);
                }
            });
        }

        if let Some(position) = dismissed {
            self.notices.remove(position);
        }
    }

    pub(in crate::app) fn request_refresh(&mut self) {
        if self.engine.refresh() == RefreshRequest::Joined {
            debug!("refresh request joined the running fetch");
        }
    }

    pub(in crate::app) fn report_error(&mut self, error: &SunburstError) {
        if error.is_user_visible() {
            self.push_notice(NoticeSeverity::Error, error.to_string());
        } else {
            debug!("ignoring {error}");
        }
    }

    fn push_notice(&mut self, severity: NoticeSeverity, message: String) {
        while self.notices.len() >= Self::MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            message,
            severity,
            expires_at: None,
        });
    }

    fn expire_notices(&mut self, now: f64) {
        for notice in &mut self.notices {
            if notice.expires_at.is_none() {
                notice.expires_at = Some(now + Self::NOTICE_SECS);
            }
        }
        self.notices
            .retain(|notice| notice.expires_at.is_none_or(|expires_at| expires_at > now));
    }

    fn apply_refresh(&mut self) {
        match self.engine.poll_refresh() {
            Some(Ok(report)) => {
                self.hovered = None;
                if report.focus == FocusReconcile::ResetToRoot {
                    self.push_notice(
                        NoticeSeverity::Info,
                        "The focused node is gone; showing the whole tree.".to_owned(),
                    );
                }
                self.push_notice(
                    NoticeSeverity::Info,
                    format!("Refreshed: {} nodes", report.node_count),
                );
            }
            Some(Err(error)) => debug!("refresh rejected: {error}"),
            None => {}
        }
    }

    fn collect_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                SunburstEvent::Activated {
                    id, detail_kind, ..
                } => {
                    info!("opened {detail_kind} view for {id}");
                }
                SunburstEvent::SelectionClosed {
                    id,
                    reason: CloseReason::StaleAfterRefresh,
                } => {
                    self.report_error(&SunburstError::SelectionStaleAfterRefresh(id));
                }
                SunburstEvent::RefreshFailed { message } => {
                    self.push_notice(NoticeSeverity::Error, message);
                }
                SunburstEvent::SelectionClosed { .. }
                | SunburstEvent::FocusChanged { .. }
                | SunburstEvent::Refreshed { .. } => {}
            }
        }
    }
}
