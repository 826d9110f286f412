use eframe::egui;
use egui::{Color32, CornerRadius, RichText, ScrollArea, Stroke, Ui, ViewportBuilder};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use blog_reader::models::{CategoryKind, ContentSection};
use blog_reader::{
    AppConfig, Article, BlogClient, BlogData, BlogError, BlogStore, CreateArticleInput, Panel,
    StoreEvent, ViewController,
};

// How long a status notice stays in the top bar
const NOTICE_TTL: Duration = Duration::from_secs(3);

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let _log_guard = blog_reader::logging::init_logging()?;
    let client = BlogClient::new(&config.api_base_url, config.request_timeout)?;
    info!(api = %client.base_url(), "starting blog reader");

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("CA Monk Blog"),
        ..Default::default()
    };

    eframe::run_native(
        "CA Monk Blog",
        options,
        Box::new(move |cc| {
            let mut app = BlogReaderApp::new(cc.egui_ctx.clone(), client, &config);

            if let Some(storage) = cc.storage {
                // Restore the saved theme preference
                if let Some(theme_str) = storage.get_string("is_dark_mode") {
                    if let Ok(is_dark_mode) = theme_str.parse::<bool>() {
                        app.set_dark_mode(is_dark_mode);
                    }
                }
            }

            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("failed to run the window: {}", e))
}

struct AppTheme {
    background: Color32,
    card_background: Color32,
    selected_card_background: Color32,
    text: Color32,
    secondary_text: Color32,
    highlight: Color32,
    accent: Color32,
    separator: Color32,
    error_background: Color32,
    error_text: Color32,
    button_background: Color32,
    button_foreground: Color32,
    button_active_background: Color32,
    button_hover_background: Color32,
}

impl AppTheme {
    fn dark() -> Self {
        Self {
            background: Color32::from_rgb(17, 19, 33),
            card_background: Color32::from_rgb(30, 32, 52),
            selected_card_background: Color32::from_rgb(45, 42, 82),
            text: Color32::from_rgb(238, 238, 245),
            secondary_text: Color32::from_rgb(170, 172, 190),
            highlight: Color32::from_rgb(129, 140, 248), // Indigo
            accent: Color32::from_rgb(192, 132, 252),    // Purple
            separator: Color32::from_rgb(58, 60, 84),
            error_background: Color32::from_rgb(69, 26, 30),
            error_text: Color32::from_rgb(252, 165, 165),
            button_background: Color32::from_rgb(52, 54, 80),
            button_foreground: Color32::from_rgb(238, 238, 245),
            button_active_background: Color32::from_rgb(99, 102, 241),
            button_hover_background: Color32::from_rgb(66, 68, 98),
        }
    }

    fn light() -> Self {
        Self {
            background: Color32::from_rgb(241, 245, 255),
            card_background: Color32::from_rgb(255, 255, 255),
            selected_card_background: Color32::from_rgb(238, 235, 255),
            text: Color32::from_rgb(24, 24, 36),
            secondary_text: Color32::from_rgb(90, 92, 110),
            highlight: Color32::from_rgb(79, 70, 229),
            accent: Color32::from_rgb(147, 51, 234),
            separator: Color32::from_rgb(210, 212, 228),
            error_background: Color32::from_rgb(254, 242, 242),
            error_text: Color32::from_rgb(185, 28, 28),
            button_background: Color32::from_rgb(232, 234, 246),
            button_foreground: Color32::from_rgb(24, 24, 36),
            button_active_background: Color32::from_rgb(79, 70, 229),
            button_hover_background: Color32::from_rgb(214, 216, 238),
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
        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.active.bg_fill = self.button_active_background;
        style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.hovered.bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.button_foreground);

        style.visuals.selection.bg_fill = self.highlight;
        style.visuals.selection.stroke = Stroke::new(1.0, self.highlight);

        style.visuals.window_corner_radius = CornerRadius::same(10);
        style.visuals.widgets.noninteractive.corner_radius = CornerRadius::same(6);
        style.visuals.widgets.inactive.corner_radius = CornerRadius::same(6);
        style.visuals.widgets.hovered.corner_radius = CornerRadius::same(6);
        style.visuals.widgets.active.corner_radius = CornerRadius::same(6);

        ctx.set_style(style);
    }
}

fn category_glyph(kind: CategoryKind) -> &'static str {
    match kind {
        CategoryKind::Growth => "📈",
        CategoryKind::Career => "💼",
        CategoryKind::Regulation => "📄",
        CategoryKind::General => "💡",
    }
}

struct BlogReaderApp {
    client: Arc<BlogClient>,
    store: BlogStore,
    view: ViewController,
    theme: AppTheme,
    is_dark_mode: bool,
    // Creation form
    draft: CreateArticleInput,
    category_input: String,
    form_error: Option<String>,
    confirm_discard: bool,
    // Article awaiting delete confirmation
    confirm_delete: Option<Article>,
    // (article id, message) of the last failed delete
    delete_error: Option<(String, String)>,
    notice: Option<(String, Instant)>,
}

impl BlogReaderApp {
    fn new(ctx: egui::Context, client: BlogClient, config: &AppConfig) -> Self {
        let client = Arc::new(client);
        let store = BlogStore::new(client.clone(), config.query)
            .with_notifier(move || ctx.request_repaint());

        Self {
            client,
            store,
            view: ViewController::new(),
            theme: AppTheme::dark(),
            is_dark_mode: true,
            draft: CreateArticleInput::default(),
            category_input: String::new(),
            form_error: None,
            confirm_discard: false,
            confirm_delete: None,
            delete_error: None,
            notice: None,
        }
    }

    fn set_dark_mode(&mut self, is_dark_mode: bool) {
        self.is_dark_mode = is_dark_mode;
        self.theme = if is_dark_mode {
            AppTheme::dark()
        } else {
            AppTheme::light()
        };
    }

    fn toggle_theme(&mut self) {
        self.set_dark_mode(!self.is_dark_mode);
    }

    fn show_notice(&mut self, text: impl Into<String>) {
        self.notice = Some((text.into(), Instant::now()));
    }

    fn open_link(&mut self, url: &str) {
        if let Err(e) = open::that(url) {
            warn!(%url, error = %e, "failed to open link");
            self.show_notice("Could not open the link");
        }
    }

    fn copy_share_link(&mut self, article: &Article) {
        let link = self.client.article_url(&article.id);
        let copied = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(link));
        match copied {
            Ok(()) => self.show_notice("Link copied to clipboard"),
            Err(e) => {
                warn!(error = %e, "failed to copy share link");
                self.show_notice("Could not copy the link");
            }
        }
    }

    fn handle_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Created(article) => {
                self.draft.reset();
                self.category_input.clear();
                self.form_error = None;
                self.view.create_succeeded();
                self.show_notice(format!("Published \"{}\"", article.title));
            }
            StoreEvent::CreateFailed(error) => {
                self.form_error = Some(format!(
                    "Failed to create blog post. Please try again. ({})",
                    error
                ));
            }
            StoreEvent::Deleted(id) => {
                self.delete_error = None;
                self.view.delete_succeeded(&id);
                self.show_notice("Article deleted");
            }
            StoreEvent::DeleteFailed { id, error } => {
                self.delete_error = Some((id, format!("Failed to delete article. ({})", error)));
            }
        }
    }

    fn submit_draft(&mut self) {
        match self.store.create_article(self.draft.clone()) {
            Ok(true) => self.form_error = None,
            Ok(false) => self.show_notice("Still publishing the previous article"),
            Err(BlogError::Validation(_)) => {
                self.form_error = Some(
                    "Please fill in all required fields and add at least one category".to_string(),
                );
            }
            Err(e) => self.form_error = Some(e.to_string()),
        }
    }

    fn add_draft_category(&mut self) {
        if self.draft.add_category(&self.category_input) {
            self.category_input.clear();
        }
    }

    fn discard_draft(&mut self) {
        self.draft.reset();
        self.category_input.clear();
        self.form_error = None;
        self.store.clear_create_error();
        self.view.cancel_create();
    }

    fn error_box(&self, ui: &mut Ui, title: &str, message: &str) {
        egui::Frame::new()
            .fill(self.theme.error_background)
            .corner_radius(CornerRadius::same(8))
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.label(RichText::new(title).color(self.theme.error_text).strong());
                ui.label(RichText::new(message).color(self.theme.error_text).size(13.0));
            });
    }

    fn render_top_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            let brand = ui.add(
                egui::Button::new(
                    RichText::new("CM  CA MONK")
                        .color(self.theme.highlight)
                        .size(20.0)
                        .strong(),
                )
                .frame(false),
            );
            if brand.clicked() {
                self.view.go_home();
            }
            if brand.hovered() {
                ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
            }

            if let Some((notice, shown_at)) = &self.notice {
                if shown_at.elapsed() < NOTICE_TTL {
                    ui.add_space(20.0);
                    ui.label(RichText::new(notice).color(self.theme.accent).italics());
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let theme_icon = if self.is_dark_mode { "☀" } else { "🌙" };
                if ui
                    .add(
                        egui::Button::new(RichText::new(theme_icon).size(18.0))
                            .min_size(egui::Vec2::new(32.0, 32.0))
                            .corner_radius(CornerRadius::same(16)),
                    )
                    .on_hover_text("Toggle theme")
                    .clicked()
                {
                    self.toggle_theme();
                }

                if ui
                    .add(
                        egui::Button::new(RichText::new("⟳").size(18.0))
                            .min_size(egui::Vec2::new(32.0, 32.0))
                            .corner_radius(CornerRadius::same(16)),
                    )
                    .on_hover_text("Reload articles")
                    .clicked()
                {
                    self.store.refresh_articles();
                }

                let new_btn = ui.add(
                    egui::Button::new(
                        RichText::new("＋ New").color(Color32::WHITE).strong(),
                    )
                    .fill(self.theme.button_active_background)
                    .min_size(egui::Vec2::new(72.0, 32.0))
                    .corner_radius(CornerRadius::same(8)),
                );
                if new_btn.clicked() {
                    self.view.start_create();
                }
            });
        });
    }

    // Returns true when the card was clicked
    fn render_card(&self, ui: &mut Ui, article: &Article, is_selected: bool) -> bool {
        let (fill, stroke) = if is_selected {
            (
                self.theme.selected_card_background,
                Stroke::new(2.0, self.theme.highlight),
            )
        } else {
            (
                self.theme.card_background,
                Stroke::new(1.0, self.theme.separator),
            )
        };

        let frame = egui::Frame::new()
            .fill(fill)
            .corner_radius(CornerRadius::same(10))
            .stroke(stroke)
            .inner_margin(12.0)
            .outer_margin(egui::vec2(4.0, 6.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(RichText::new(category_glyph(article.category_kind())).size(16.0));
                    ui.label(
                        RichText::new(article.primary_category().unwrap_or_default())
                            .color(self.theme.highlight)
                            .size(12.0)
                            .strong(),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            RichText::new(article.relative_time())
                                .color(self.theme.secondary_text)
                                .size(12.0),
                        );
                    });
                });

                ui.add_space(4.0);
                ui.label(
                    RichText::new(&article.title)
                        .color(self.theme.text)
                        .size(16.0)
                        .strong(),
                );
                ui.label(
                    RichText::new(&article.description)
                        .color(self.theme.secondary_text)
                        .size(13.0),
                );
                ui.add_space(4.0);
                ui.label(
                    RichText::new(article.tag_label())
                        .color(self.theme.accent)
                        .size(11.0)
                        .strong(),
                );
            });

        let response = frame.response.interact(egui::Sense::click());
        if response.hovered() {
            ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
        }
        response.clicked()
    }

    fn render_article_list(&mut self, ui: &mut Ui) {
        ui.add_space(8.0);
        ui.heading(RichText::new("Latest Articles").color(self.theme.highlight).strong());
        ui.add_space(8.0);

        let state = self.store.articles();
        let selected = self.view.selected_id().map(str::to_string);
        let mut clicked = None;
        let mut retry = false;

        if state.is_loading() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new("Loading articles...").color(self.theme.secondary_text));
            });
        }

        if let Some(error) = &state.error {
            self.error_box(ui, "Error loading blogs", &error.to_string());
            if ui.button("Retry").clicked() {
                retry = true;
            }
            ui.add_space(8.0);
        }

        if let Some(articles) = state.data.as_deref().and_then(BlogData::as_articles) {
            if articles.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.label(
                        RichText::new("No blogs found. Create your first blog post!")
                            .color(self.theme.secondary_text)
                            .italics(),
                    );
                });
            }

            ScrollArea::vertical()
                .id_salt("article_list")
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    for article in articles {
                        let is_selected = selected.as_deref() == Some(article.id.as_str());
                        if self.render_card(ui, article, is_selected) {
                            clicked = Some(article.id.clone());
                        }
                    }
                });
        }

        if retry {
            self.store.refresh_articles();
        }
        if let Some(id) = clicked {
            self.view.select_article(&id);
        }
    }

    fn render_welcome(&self, ui: &mut Ui) {
        let has_articles = self
            .store
            .articles()
            .data
            .as_deref()
            .and_then(BlogData::as_articles)
            .is_some_and(|articles| !articles.is_empty());
        if !has_articles {
            return;
        }

        ui.vertical_centered(|ui| {
            ui.add_space(120.0);
            ui.label(RichText::new("📰").size(56.0));
            ui.add_space(12.0);
            ui.label(
                RichText::new("Welcome to CA Monk Blog")
                    .color(self.theme.highlight)
                    .size(28.0)
                    .strong(),
            );
            ui.add_space(8.0);
            ui.label(
                RichText::new("Click on any article to read")
                    .color(self.theme.secondary_text)
                    .size(16.0),
            );
            ui.label(
                RichText::new("or click \"New\" to create a new post")
                    .color(self.theme.secondary_text)
                    .size(16.0),
            );
        });
    }

    fn render_detail(&mut self, ui: &mut Ui, id: &str) {
        let state = self.store.article(id);

        if state.is_loading() {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.spinner();
                ui.label(RichText::new("Loading article...").color(self.theme.secondary_text));
            });
        }

        if let Some(error) = &state.error {
            self.error_box(ui, "Error loading article", &error.to_string());
        }

        if let Some(article) = state.data.as_deref().and_then(BlogData::as_article) {
            ScrollArea::vertical()
                .id_salt("article_detail")
                .auto_shrink([false; 2])
                .show(ui, |ui| self.render_article(ui, article));
        }
    }

    fn render_article(&mut self, ui: &mut Ui, article: &Article) {
        ui.add_space(12.0);

        if !article.cover_image.is_empty() {
            if ui
                .link(RichText::new("🖼 View cover image").color(self.theme.accent))
                .clicked()
            {
                let url = article.cover_image.clone();
                self.open_link(&url);
            }
            ui.add_space(8.0);
        }

        ui.horizontal(|ui| {
            ui.label(
                RichText::new(article.primary_category().unwrap_or_default())
                    .color(self.theme.highlight)
                    .strong(),
            );
            ui.label(RichText::new("•").color(self.theme.secondary_text));
            ui.label(
                RichText::new(format!("{} min read", article.read_time_minutes()))
                    .color(self.theme.secondary_text),
            );
        });

        ui.add_space(6.0);
        ui.label(
            RichText::new(&article.title)
                .color(self.theme.text)
                .size(30.0)
                .strong(),
        );
        ui.add_space(6.0);

        if ui.button("🔗 Share Article").clicked() {
            self.copy_share_link(article);
        }

        ui.add_space(12.0);
        egui::Grid::new("article_meta")
            .num_columns(3)
            .spacing([40.0, 4.0])
            .show(ui, |ui| {
                for heading in ["CATEGORY", "READ TIME", "DATE"] {
                    ui.label(RichText::new(heading).color(self.theme.secondary_text).size(11.0));
                }
                ui.end_row();
                ui.label(article.categories.join(", "));
                ui.label(format!("{} Mins", article.read_time_minutes()));
                ui.label(article.formatted_date());
                ui.end_row();
            });

        ui.add_space(12.0);
        ui.separator();
        ui.add_space(12.0);

        for section in article.sections() {
            match section {
                ContentSection::Heading(text) => {
                    ui.add_space(6.0);
                    ui.label(RichText::new(text).color(self.theme.text).size(20.0).strong());
                }
                ContentSection::Quote(text) => {
                    egui::Frame::new()
                        .fill(self.theme.selected_card_background)
                        .stroke(Stroke::new(1.0, self.theme.highlight))
                        .corner_radius(CornerRadius::same(6))
                        .inner_margin(12.0)
                        .show(ui, |ui| {
                            ui.label(RichText::new(text).color(self.theme.text).italics().size(15.0));
                        });
                }
                ContentSection::Paragraph(text) => {
                    ui.label(RichText::new(text).color(self.theme.text).size(15.0));
                }
            }
            ui.add_space(8.0);
        }

        ui.add_space(12.0);
        ui.separator();
        ui.horizontal(|ui| {
            ui.label(RichText::new("Written by CA Monk").color(self.theme.secondary_text));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let deleting = self.store.is_deleting();
                let label = if deleting { "Deleting..." } else { "🗑 Delete" };
                let delete_btn = ui.add_enabled(
                    !deleting,
                    egui::Button::new(RichText::new(label).color(self.theme.error_text)),
                );
                if delete_btn.clicked() {
                    self.confirm_delete = Some(article.clone());
                }
            });
        });

        if let Some((failed_id, message)) = &self.delete_error {
            if failed_id == &article.id {
                ui.add_space(8.0);
                self.error_box(ui, "Delete failed", message);
            }
        }
        ui.add_space(24.0);
    }

    fn render_form(&mut self, ui: &mut Ui) {
        let label_color = self.theme.text;
        let field_label = move |text: &str| RichText::new(text).color(label_color).strong();

        ScrollArea::vertical()
            .id_salt("create_form")
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                ui.add_space(12.0);
                ui.heading(
                    RichText::new("Create New Article")
                        .color(self.theme.highlight)
                        .size(26.0)
                        .strong(),
                );
                ui.add_space(12.0);

                ui.label(field_label("Article Title *"));
                ui.add(
                    egui::TextEdit::singleline(&mut self.draft.title)
                        .hint_text("Enter an engaging title...")
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(10.0);

                ui.label(field_label("Categories *"));
                let mut add_category = false;
                ui.horizontal(|ui| {
                    let input = ui.add(
                        egui::TextEdit::singleline(&mut self.category_input)
                            .hint_text("e.g., FINANCE, TECH, CAREER"),
                    );
                    if input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        add_category = true;
                    }
                    if ui.button("Add").clicked() {
                        add_category = true;
                    }
                });
                if add_category {
                    self.add_draft_category();
                }

                let mut removed = None;
                ui.horizontal_wrapped(|ui| {
                    for category in &self.draft.categories {
                        if ui
                            .button(RichText::new(format!("{} ✕", category)).color(self.theme.highlight))
                            .clicked()
                        {
                            removed = Some(category.clone());
                        }
                    }
                });
                if let Some(category) = removed {
                    self.draft.remove_category(&category);
                }
                ui.add_space(10.0);

                ui.label(field_label("Brief Description *"));
                ui.add(
                    egui::TextEdit::multiline(&mut self.draft.description)
                        .hint_text("A short summary that will appear in the blog list...")
                        .desired_rows(3)
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(10.0);

                ui.label(field_label("Cover Image URL"));
                ui.add(
                    egui::TextEdit::singleline(&mut self.draft.cover_image)
                        .hint_text("https://example.com/image.jpg")
                        .desired_width(f32::INFINITY),
                );
                ui.label(
                    RichText::new("Recommended size: 1200x600px for best results")
                        .color(self.theme.secondary_text)
                        .size(11.0),
                );
                ui.add_space(10.0);

                ui.label(field_label("Article Content *"));
                ui.add(
                    egui::TextEdit::multiline(&mut self.draft.content)
                        .hint_text("Write your full article content here... Use double line breaks for paragraphs.")
                        .desired_rows(15)
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(12.0);

                if let Some(message) = self.form_error.clone() {
                    self.error_box(ui, "Could not publish", &message);
                    ui.add_space(8.0);
                }

                ui.horizontal(|ui| {
                    let publishing = self.store.is_creating();
                    let label = if publishing { "Publishing..." } else { "Publish Article" };
                    let publish = ui.add_enabled(
                        !publishing,
                        egui::Button::new(RichText::new(label).color(Color32::WHITE).strong())
                            .fill(self.theme.button_active_background)
                            .min_size(egui::Vec2::new(140.0, 34.0)),
                    );
                    if publish.clicked() {
                        self.submit_draft();
                    }

                    if ui
                        .add(egui::Button::new("Cancel").min_size(egui::Vec2::new(90.0, 34.0)))
                        .clicked()
                    {
                        self.confirm_discard = true;
                    }
                });
                ui.add_space(24.0);
            });
    }

    fn render_dialogs(&mut self, ctx: &egui::Context) {
        if let Some(article) = self.confirm_delete.clone() {
            let mut confirmed = false;
            let mut dismissed = false;
            egui::Window::new("Delete article")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(format!(
                        "Are you sure you want to delete \"{}\"? This action cannot be undone.",
                        article.title
                    ));
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        if ui
                            .button(RichText::new("Delete").color(self.theme.error_text))
                            .clicked()
                        {
                            confirmed = true;
                        }
                        if ui.button("Cancel").clicked() {
                            dismissed = true;
                        }
                    });
                });

            if confirmed {
                self.delete_error = None;
                self.store.delete_article(&article.id);
            }
            if confirmed || dismissed {
                self.confirm_delete = None;
            }
        }

        if self.confirm_discard {
            let mut discard = false;
            let mut keep = false;
            egui::Window::new("Discard draft")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label("Are you sure you want to discard this draft?");
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        if ui.button("Discard").clicked() {
                            discard = true;
                        }
                        if ui.button("Keep editing").clicked() {
                            keep = true;
                        }
                    });
                });

            if discard {
                self.discard_draft();
            }
            if discard || keep {
                self.confirm_discard = false;
            }
        }
    }
}

impl eframe::App for BlogReaderApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        storage.set_string("is_dark_mode", self.is_dark_mode.to_string());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);

        self.store.watch_articles();
        for event in self.store.poll() {
            self.handle_event(event);
        }
        // The detail query follows the selection
        let selected = self.view.selected_id().map(str::to_string);
        self.store.watch_article(selected.as_deref());

        // Writes report through polling, so keep frames coming while busy
        if self.store.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        if let Some((_, shown_at)) = &self.notice {
            if shown_at.elapsed() >= NOTICE_TTL {
                self.notice = None;
            } else {
                ctx.request_repaint_after(NOTICE_TTL);
            }
        }

        egui::TopBottomPanel::top("top_bar")
            .frame(
                egui::Frame::new()
                    .fill(self.theme.card_background)
                    .inner_margin(10.0),
            )
            .show(ctx, |ui| self.render_top_bar(ui));

        match self.view.panel() {
            Panel::CreateForm => {
                egui::CentralPanel::default().show(ctx, |ui| self.render_form(ui));
            }
            Panel::List | Panel::Detail => {
                egui::SidePanel::left("article_list_panel")
                    .resizable(true)
                    .default_width(420.0)
                    .min_width(300.0)
                    .show(ctx, |ui| self.render_article_list(ui));

                egui::CentralPanel::default().show(ctx, |ui| match selected {
                    Some(id) => self.render_detail(ui, &id),
                    None => self.render_welcome(ui),
                });
            }
        }

        self.render_dialogs(ctx);
    }
}
