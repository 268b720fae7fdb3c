use eframe::egui;
use egui::{Color32, CornerRadius, RichText, ScrollArea, Stroke, Ui};
use std::time::Duration;
use tracing::{error, warn};

use crate::coordinator::FetchCoordinator;
use crate::db::PersistedValue;
use crate::models::{ObjectId, StoryItem};
use crate::store::{visible_items, StoriesStore};

struct AppTheme {
    background: Color32,
    card_background: Color32,
    text: Color32,
    secondary_text: Color32,
    highlight: Color32,
    error: Color32,
    separator: Color32,
    score_high: Color32,
    score_medium: Color32,
    score_low: Color32,
    button_background: Color32,
    button_foreground: Color32,
    button_hover_background: Color32,
}

impl AppTheme {
    fn dark() -> Self {
        Self {
            background: Color32::from_rgb(18, 18, 18),
            card_background: Color32::from_rgb(30, 30, 30),
            text: Color32::from_rgb(240, 240, 240),
            secondary_text: Color32::from_rgb(180, 180, 180),
            highlight: Color32::from_rgb(255, 102, 0), // HN orange
            error: Color32::from_rgb(239, 83, 80),
            separator: Color32::from_rgb(60, 60, 60),
            score_high: Color32::from_rgb(76, 175, 80),
            score_medium: Color32::from_rgb(255, 193, 7),
            score_low: Color32::from_rgb(158, 158, 158),
            button_background: Color32::from_rgb(66, 66, 66),
            button_foreground: Color32::from_rgb(240, 240, 240),
            button_hover_background: Color32::from_rgb(80, 80, 80),
        }
    }

    fn light() -> Self {
        Self {
            background: Color32::from_rgb(245, 245, 245),
            card_background: Color32::from_rgb(255, 255, 255),
            text: Color32::from_rgb(20, 20, 20),
            secondary_text: Color32::from_rgb(90, 90, 90),
            highlight: Color32::from_rgb(235, 92, 0),
            error: Color32::from_rgb(198, 40, 40),
            separator: Color32::from_rgb(200, 200, 200),
            score_high: Color32::from_rgb(30, 110, 40),
            score_medium: Color32::from_rgb(190, 130, 0),
            score_low: Color32::from_rgb(80, 80, 80),
            button_background: Color32::from_rgb(235, 235, 235),
            button_foreground: Color32::from_rgb(20, 20, 20),
            button_hover_background: Color32::from_rgb(210, 210, 210),
        }
    }

    fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.card_background;
        style.visuals.window_stroke = Stroke::new(1.0, self.separator);
        style.visuals.widgets.noninteractive.bg_fill = self.card_background;
        style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text);

        style.visuals.widgets.inactive.bg_fill = self.button_background;
        style.visuals.widgets.inactive.weak_bg_fill = self.button_background;
        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.hovered.bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.weak_bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.active.bg_fill = self.highlight;
        style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.button_foreground);

        style.visuals.selection.bg_fill = self.highlight;
        style.visuals.selection.stroke = Stroke::new(1.0, self.highlight);
        style.visuals.extreme_bg_color = self.card_background;

        style.visuals.widgets.inactive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.hovered.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.active.corner_radius = CornerRadius::same(4);

        ctx.set_style(style);
    }

    fn score_color(&self, points: i64) -> Color32 {
        if points >= 300 {
            self.score_high
        } else if points >= 100 {
            self.score_medium
        } else {
            self.score_low
        }
    }
}

pub struct StoriesApp {
    store: StoriesStore,
    coordinator: FetchCoordinator,
    search_term: PersistedValue,
    // Text edit buffer, mirrored into `search_term` on every change
    input: String,
    client_filter: bool,
    theme: AppTheme,
    is_dark_mode: bool,
}

impl StoriesApp {
    pub fn new(
        coordinator: FetchCoordinator,
        search_term: PersistedValue,
        startup_term: &str,
        client_filter: bool,
    ) -> Self {
        let mut app = Self {
            store: StoriesStore::new(),
            coordinator,
            input: search_term.get().to_string(),
            search_term,
            client_filter,
            theme: AppTheme::dark(),
            is_dark_mode: true,
        };

        app.coordinator.search(&mut app.store, startup_term);
        app
    }

    // Restores the theme saved by `save`
    pub fn restore(&mut self, storage: &dyn eframe::Storage) {
        if let Some(is_dark_mode) = storage.get_string("is_dark_mode").and_then(|s| s.parse::<bool>().ok()) {
            self.is_dark_mode = is_dark_mode;
            self.theme = if is_dark_mode { AppTheme::dark() } else { AppTheme::light() };
        }
    }

    fn toggle_theme(&mut self) {
        self.is_dark_mode = !self.is_dark_mode;
        self.theme = if self.is_dark_mode {
            AppTheme::dark()
        } else {
            AppTheme::light()
        };
    }

    fn on_input_change(&mut self) {
        if let Err(e) = self.search_term.set(&self.input) {
            error!(error = %e, "failed to persist search term");
        }
    }

    fn submit(&mut self) {
        let term = self.search_term.get().to_string();
        self.coordinator.search(&mut self.store, &term);
    }

    fn open_link(&self, url: &str) {
        if let Err(e) = open::that(url) {
            warn!(url, error = %e, "failed to open URL");
        }
    }

    fn render_header(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading(
                RichText::new("My Hacker Stories")
                    .color(self.theme.highlight)
                    .size(24.0),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let label = if self.is_dark_mode { "☀ Light" } else { "🌙 Dark" };
                if ui.button(label).clicked() {
                    self.toggle_theme();
                }
            });
        });
    }

    fn render_search_form(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Search:").strong().color(self.theme.text));

            let response = ui.add(
                egui::TextEdit::singleline(&mut self.input)
                    .id_salt("search")
                    .desired_width(320.0),
            );
            if response.changed() {
                self.on_input_change();
            }

            let enter_pressed = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let submit = ui.add_enabled(!self.input.is_empty(), egui::Button::new("Submit"));
            if submit.clicked() || enter_pressed {
                self.submit();
            }
        });
    }

    // Returns the story whose Remove button was clicked this frame
    fn render_story_list(&self, ui: &mut Ui) -> Option<ObjectId> {
        let state = self.store.state();
        let stories: Vec<&StoryItem> = if self.client_filter {
            visible_items(&state.items, self.search_term.get())
        } else {
            state.items.iter().collect()
        };

        if stories.is_empty() && state.loaded {
            ui.label(
                RichText::new("No stories to show.")
                    .color(self.theme.secondary_text)
                    .italics(),
            );
            return None;
        }

        let mut removed = None;
        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            for story in stories {
                ui.push_id(story.object_id.as_str(), |ui| {
                    if self.render_story(ui, story) {
                        removed = Some(story.object_id.clone());
                    }
                });
            }
        });
        removed
    }

    fn render_story(&self, ui: &mut Ui, story: &StoryItem) -> bool {
        let mut remove_clicked = false;

        egui::Frame::new()
            .fill(self.theme.card_background)
            .corner_radius(CornerRadius::same(8))
            .stroke(Stroke::new(1.0, self.theme.separator))
            .inner_margin(12.0)
            .outer_margin(egui::vec2(8.0, 4.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let title = ui.add(
                        egui::Label::new(
                            RichText::new(&story.title)
                                .color(self.theme.text)
                                .size(16.0)
                                .strong(),
                        )
                        .sense(egui::Sense::click()),
                    );
                    if title.clicked() && !story.url.is_empty() {
                        self.open_link(&story.url);
                    }
                    if title.hovered() && !story.url.is_empty() {
                        ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
                    }

                    let domain = story.domain();
                    if !domain.is_empty() {
                        ui.label(
                            RichText::new(format!("({})", domain))
                                .color(self.theme.secondary_text)
                                .italics(),
                        );
                    }
                });

                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("by {}", story.author)).color(self.theme.secondary_text));
                    ui.add_space(8.0);

                    let comments = story
                        .num_comments
                        .map(|n| format!("{} comments", n))
                        .unwrap_or_else(|| "no comments".to_string());
                    ui.label(RichText::new(comments).color(self.theme.secondary_text));
                    ui.add_space(8.0);

                    ui.label(
                        RichText::new(format!("{} pts", story.points))
                            .color(self.theme.score_color(story.points))
                            .strong(),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let remove = ui.add(
                            egui::Button::new(RichText::new("Remove").color(self.theme.button_foreground))
                                .corner_radius(CornerRadius::same(6))
                                .fill(self.theme.button_background),
                        );
                        if remove.clicked() {
                            remove_clicked = true;
                        }
                    });
                });
            });

        remove_clicked
    }
}

impl eframe::App for StoriesApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        storage.set_string("is_dark_mode", self.is_dark_mode.to_string());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);

        self.coordinator.poll(&mut self.store);
        if self.coordinator.is_in_flight() {
            // Nothing wakes the UI when a worker finishes, so keep polling
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_header(ui);
            ui.add_space(8.0);
            self.render_search_form(ui);
            ui.add_space(8.0);

            let state = self.store.state();
            if state.is_error {
                ui.label(RichText::new("Something went wrong...").color(self.theme.error).strong());
            }

            if state.is_loading {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(RichText::new("List is loading...").color(self.theme.secondary_text));
                });
            } else if let Some(id) = self.render_story_list(ui) {
                self.store.remove_item(&id);
            }
        });
    }
}
