use crate::chat_api::{build_request_messages, ChatClient, ChatConfig, MODEL_OPTIONS};
use crate::layout::wrap_text;
use crate::scroll::ScrollPair;
use crate::store::{ConversationStore, Message};
use crate::theme::{Theme, ThemeChoice};
use anyhow::{anyhow, Result};
use eframe::egui::{
    self, Align, Align2, Button, Color32, CornerRadius, FontId, Frame, Layout, Mesh, RichText,
    ScrollArea, Sense, Shape, Stroke,
};
use log::{info, warn};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

const SIDEBAR_WIDTH: f32 = 240.0;
const BUTTON_HEIGHT: f32 = 36.0;
const ROW_HEIGHT: f32 = 30.0;
const BUBBLE_PADDING: f32 = 10.0;
const BUBBLE_SPACING: f32 = 10.0;
const BUBBLE_RADIUS: u8 = 10;
const BUBBLE_MAX_WIDTH_RATIO: f32 = 0.8;
const LINE_SPACING: f32 = 4.0;
const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful and polite chatbot.";

enum WorkerEvent {
    Reply(Message),
    Failed { kind: &'static str, detail: String },
}

fn failure_message(detail: &str) -> String {
    format!("Error getting response: {detail}")
}

pub fn run_gui(config: ChatConfig) -> Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 600.0])
            .with_min_inner_size([640.0, 420.0])
            .with_title("Confab"),
        ..Default::default()
    };

    eframe::run_native(
        "Confab",
        native_options,
        Box::new(move |cc| {
            let store = ConversationStore::open_default()?;
            let app = ChatApp::new(store, config.clone())?;
            apply_theme(&cc.egui_ctx, app.theme.palette());
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow!("cannot start the graphical interface: {err}"))
}

fn apply_theme(ctx: &egui::Context, theme: &Theme) {
    // Dark text implies a light theme.
    let light = theme.text.r() < 128;
    let mut style = (*ctx.style()).clone();
    style.visuals = if light {
        egui::Visuals::light()
    } else {
        egui::Visuals::dark()
    };
    style.visuals.override_text_color = Some(theme.text);
    style.visuals.panel_fill = theme.gradient_top;
    style.visuals.window_fill = theme.dialog;
    style.visuals.window_stroke = Stroke::new(1.0, theme.active_row);
    style.visuals.extreme_bg_color = theme.input;
    style.visuals.widgets.hovered.bg_fill = theme.button_hover;
    style.visuals.widgets.active.bg_fill = theme.button_hover;
    style.visuals.selection.bg_fill = theme.button;
    style.spacing.item_spacing = egui::vec2(8.0, 8.0);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);
    ctx.set_style(style);
}

fn paint_vertical_gradient(painter: &egui::Painter, rect: egui::Rect, top: Color32, bottom: Color32) {
    let mut mesh = Mesh::default();
    mesh.colored_vertex(rect.left_top(), top);
    mesh.colored_vertex(rect.right_top(), top);
    mesh.colored_vertex(rect.right_bottom(), bottom);
    mesh.colored_vertex(rect.left_bottom(), bottom);
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(0, 2, 3);
    painter.add(Shape::mesh(mesh));
}

fn text_width(ui: &egui::Ui, font_id: &FontId, text: &str) -> f32 {
    ui.fonts(|fonts| {
        fonts
            .layout_no_wrap(text.to_owned(), font_id.clone(), Color32::WHITE)
            .size()
            .x
    })
}

fn painted_button(ui: &mut egui::Ui, theme: &Theme, label: &str) -> egui::Response {
    let size = egui::vec2(ui.available_width(), BUTTON_HEIGHT);
    let (rect, response) = ui.allocate_exact_size(size, Sense::click());
    let fill = if response.hovered() {
        theme.button_hover
    } else {
        theme.button
    };
    ui.painter()
        .rect_filled(rect, CornerRadius::same(12), fill);
    ui.painter().text(
        rect.center(),
        Align2::CENTER_CENTER,
        label,
        egui::TextStyle::Button.resolve(ui.style()),
        Color32::WHITE,
    );
    response
}

fn conversation_row(ui: &mut egui::Ui, theme: &Theme, name: &str, active: bool) -> egui::Response {
    let size = egui::vec2(ui.available_width(), ROW_HEIGHT);
    let (rect, response) = ui.allocate_exact_size(size, Sense::click());
    if active {
        ui.painter()
            .rect_filled(rect, CornerRadius::same(8), theme.active_row);
    } else if response.hovered() {
        ui.painter().rect_filled(
            rect,
            CornerRadius::same(8),
            theme.active_row.gamma_multiply(0.6),
        );
    }
    let color = if active {
        theme.assistant_bubble
    } else {
        theme.text
    };
    ui.painter().with_clip_rect(rect).text(
        egui::pos2(rect.min.x + 10.0, rect.center().y),
        Align2::LEFT_CENTER,
        name,
        egui::TextStyle::Body.resolve(ui.style()),
        color,
    );
    response
}

fn draw_bubble(ui: &mut egui::Ui, theme: &Theme, message: &Message) -> egui::Rect {
    let font_id = egui::TextStyle::Body.resolve(ui.style());
    let row_height = ui.fonts(|fonts| fonts.row_height(&font_id));
    let pane_width = ui.available_width();
    let wrap_width = (pane_width * BUBBLE_MAX_WIDTH_RATIO - 2.0 * BUBBLE_PADDING).max(60.0);

    let lines = wrap_text(&message.content, wrap_width, |s| {
        text_width(ui, &font_id, s)
    });
    let widest = lines
        .iter()
        .map(|line| text_width(ui, &font_id, line))
        .fold(0.0_f32, f32::max);
    let line_count = lines.len().max(1);
    let bubble_width = widest + 2.0 * BUBBLE_PADDING;
    let bubble_height = line_count as f32 * row_height
        + (line_count as f32 - 1.0) * LINE_SPACING
        + 2.0 * BUBBLE_PADDING;

    let (row_rect, _) =
        ui.allocate_exact_size(egui::vec2(pane_width, bubble_height), Sense::hover());
    let is_user = message.role == "user";
    let fill = if is_user {
        theme.user_bubble
    } else {
        theme.assistant_bubble
    };
    let bubble_rect = if is_user {
        egui::Rect::from_min_size(
            egui::pos2(row_rect.max.x - bubble_width, row_rect.min.y),
            egui::vec2(bubble_width, bubble_height),
        )
    } else {
        egui::Rect::from_min_size(row_rect.min, egui::vec2(bubble_width, bubble_height))
    };

    let painter = ui.painter();
    painter.rect_filled(bubble_rect, CornerRadius::same(BUBBLE_RADIUS), fill);
    let mut cursor = bubble_rect.min + egui::vec2(BUBBLE_PADDING, BUBBLE_PADDING);
    for line in &lines {
        painter.text(
            cursor,
            Align2::LEFT_TOP,
            line,
            font_id.clone(),
            theme.bubble_text,
        );
        cursor.y += row_height + LINE_SPACING;
    }
    ui.add_space(BUBBLE_SPACING);

    bubble_rect
}

/// Viewport geometry recorded during the previous frame, used to route
/// wheel events and clamp the scroll offsets on the next one.
#[derive(Clone, Copy, Default)]
struct PaneMetrics {
    rect: Option<egui::Rect>,
    content_height: f32,
    visible_height: f32,
}

pub struct ChatApp {
    store: ConversationStore,
    base: ChatConfig,
    conversations: Vec<String>,
    active: String,
    history: Vec<Message>,
    input: String,
    system_prompt: String,
    model: String,
    theme: ThemeChoice,
    status: String,
    pending: bool,
    worker_rx: Option<Receiver<WorkerEvent>>,
    settings_open: bool,
    naming_open: bool,
    naming_buffer: String,
    naming_error: Option<String>,
    sidebar_scroll: ScrollPair,
    chat_scroll: ScrollPair,
    sidebar_area: PaneMetrics,
    chat_area: PaneMetrics,
}

impl ChatApp {
    pub fn new(store: ConversationStore, base: ChatConfig) -> Result<Self> {
        let mut conversations = store.list()?;
        let active = match conversations.last() {
            Some(name) => name.clone(),
            None => {
                let name = store.create("New Chat")?;
                conversations.push(name.clone());
                name
            }
        };
        let history = store.load(&active)?;
        info!("opened conversation '{active}' ({} message(s))", history.len());

        Ok(Self {
            model: base.model.clone(),
            store,
            base,
            conversations,
            active,
            history,
            input: String::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            theme: ThemeChoice::Midnight,
            status: "Ready".to_string(),
            pending: false,
            worker_rx: None,
            settings_open: false,
            naming_open: false,
            naming_buffer: String::new(),
            naming_error: None,
            sidebar_scroll: ScrollPair::default(),
            chat_scroll: ScrollPair::default(),
            sidebar_area: PaneMetrics::default(),
            chat_area: PaneMetrics::default(),
        })
    }

    /// Appends the trimmed input as a user turn and returns the request
    /// history for the worker. None when the buffer is blank or a request
    /// is already in flight.
    fn begin_user_turn(&mut self) -> Option<Vec<Message>> {
        let prompt = self.input.trim().to_string();
        if prompt.is_empty() || self.pending {
            return None;
        }
        self.input.clear();
        self.history.push(Message::new("user", prompt));
        self.pending = true;
        self.status = "Thinking...".to_string();
        Some(build_request_messages(&self.system_prompt, &self.history))
    }

    fn launch_worker(&mut self, messages: Vec<Message>) {
        let config = ChatConfig {
            model: self.model.clone(),
            ..self.base.clone()
        };
        let (tx, rx) = mpsc::channel::<WorkerEvent>();
        self.worker_rx = Some(rx);

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    let _ = tx.send(WorkerEvent::Failed {
                        kind: "runtime",
                        detail: err.to_string(),
                    });
                    return;
                }
            };

            let result = runtime.block_on(async {
                let client = ChatClient::new(config)?;
                client.complete(messages).await
            });

            let event = match result {
                Ok(reply) => WorkerEvent::Reply(reply),
                Err(err) => WorkerEvent::Failed {
                    kind: err.kind(),
                    detail: err.to_string(),
                },
            };
            let _ = tx.send(event);
        });
    }

    fn send_message(&mut self) {
        if let Some(messages) = self.begin_user_turn() {
            self.chat_scroll
                .to_end(self.chat_area.content_height, self.chat_area.visible_height);
            self.launch_worker(messages);
        }
    }

    fn handle_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Reply(reply) => {
                self.history.push(reply);
                self.status = "Ready".to_string();
            }
            WorkerEvent::Failed { kind, detail } => {
                warn!("chat request failed ({kind}): {detail}");
                self.history
                    .push(Message::new("assistant", failure_message(&detail)));
                self.status = format!("Error ({kind})");
            }
        }
        self.pending = false;
        self.worker_rx = None;
        self.chat_scroll
            .to_end(self.chat_area.content_height, self.chat_area.visible_height);
    }

    fn drain_worker_events(&mut self) {
        loop {
            let event = match self.worker_rx.as_ref() {
                Some(rx) => rx.try_recv(),
                None => break,
            };
            match event {
                Ok(event) => self.handle_worker_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.pending = false;
                    self.worker_rx = None;
                    self.status = "Ready".to_string();
                    break;
                }
            }
        }
    }

    fn save_active(&mut self) {
        if let Err(err) = self.store.save(&self.active, &self.history) {
            warn!("saving '{}' failed: {err:#}", self.active);
            self.status = format!("Save failed: {err}");
        }
    }

    fn switch_conversation(&mut self, name: &str) {
        if name == self.active {
            return;
        }
        self.save_active();
        match self.store.load(name) {
            Ok(history) => {
                info!("switched to conversation '{name}'");
                self.active = name.to_string();
                self.history = history;
                self.chat_scroll.reset();
                self.status = "Ready".to_string();
            }
            Err(err) => {
                warn!("loading '{name}' failed: {err:#}");
                self.status = format!("Load failed: {err}");
            }
        }
    }

    fn confirm_new_conversation(&mut self) {
        let name = self.naming_buffer.trim().to_string();
        if name.is_empty() {
            self.naming_error = Some("Enter a name for the conversation".to_string());
            return;
        }
        self.save_active();
        match self.store.create(&name) {
            Ok(stem) => {
                info!("created conversation '{stem}'");
                self.conversations = self
                    .store
                    .list()
                    .unwrap_or_else(|_| vec![stem.clone()]);
                self.active = stem;
                self.history = Vec::new();
                self.chat_scroll.reset();
                self.naming_open = false;
                self.naming_buffer.clear();
                self.naming_error = None;
                self.status = "Ready".to_string();
            }
            Err(err) => self.naming_error = Some(err.to_string()),
        }
    }

    fn route_wheel_events(&mut self, ctx: &egui::Context) {
        // Open modals intercept all input.
        if self.settings_open || self.naming_open {
            return;
        }
        let Some(pointer) = ctx.pointer_hover_pos() else {
            return;
        };
        let notches: Vec<f32> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::MouseWheel { delta, .. } if delta.y != 0.0 => {
                        Some(delta.y.signum())
                    }
                    _ => None,
                })
                .collect()
        });
        for notch in notches {
            if self
                .sidebar_area
                .rect
                .is_some_and(|rect| rect.contains(pointer))
            {
                self.sidebar_scroll.wheel(notch);
            } else if self
                .chat_area
                .rect
                .is_some_and(|rect| rect.contains(pointer))
            {
                self.chat_scroll.wheel(notch);
            }
        }
    }

    fn draw_sidebar(&mut self, ctx: &egui::Context) {
        let theme = self.theme.palette();
        let mut clicked_conversation: Option<String> = None;
        let mut open_naming = false;
        let mut open_settings = false;

        egui::SidePanel::left("sidebar")
            .exact_width(SIDEBAR_WIDTH)
            .resizable(false)
            .frame(
                Frame::default()
                    .fill(theme.sidebar)
                    .inner_margin(egui::Margin::same(10)),
            )
            .show(ctx, |ui| {
                if painted_button(ui, theme, "New chat").clicked() {
                    open_naming = true;
                }
                ui.add_space(6.0);

                let list_height = (ui.available_height() - BUTTON_HEIGHT - 12.0).max(60.0);
                let output = ScrollArea::vertical()
                    .id_salt("conversation_list")
                    .max_height(list_height)
                    .auto_shrink([false, false])
                    .vertical_scroll_offset(self.sidebar_scroll.view_offset())
                    .show(ui, |ui| {
                        for name in &self.conversations {
                            let active = *name == self.active;
                            if conversation_row(ui, theme, name, active).clicked() {
                                clicked_conversation = Some(name.clone());
                            }
                        }
                    });
                self.sidebar_area = PaneMetrics {
                    rect: Some(output.inner_rect),
                    content_height: output.content_size.y,
                    visible_height: output.inner_rect.height(),
                };

                ui.add_space(6.0);
                if painted_button(ui, theme, "Settings").clicked() {
                    open_settings = true;
                }
            });

        if let Some(name) = clicked_conversation {
            self.switch_conversation(&name);
        }
        if open_naming {
            self.naming_open = true;
            self.naming_buffer.clear();
            self.naming_error = None;
        }
        if open_settings {
            self.settings_open = true;
        }
    }

    fn draw_input_panel(&mut self, ctx: &egui::Context) {
        let theme = self.theme.palette();
        let mut send_now = false;

        egui::TopBottomPanel::bottom("input_panel")
            .resizable(false)
            .frame(
                Frame::default()
                    .fill(theme.sidebar)
                    .inner_margin(egui::Margin::same(8)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let send_width = 80.0;
                    let input_width = (ui.available_width() - send_width - 16.0).max(120.0);
                    let response = ui.add_enabled(
                        !self.pending,
                        egui::TextEdit::singleline(&mut self.input)
                            .desired_width(input_width)
                            .hint_text("Type a message..."),
                    );

                    let modal_open = self.settings_open || self.naming_open;
                    let enter_pressed = !modal_open
                        && response.lost_focus()
                        && ui.input(|i| i.key_pressed(egui::Key::Enter));

                    let send_clicked = ui
                        .add_enabled(
                            !self.pending,
                            Button::new("Send")
                                .min_size(egui::vec2(send_width, 24.0))
                                .fill(theme.button),
                        )
                        .clicked();

                    if enter_pressed || send_clicked {
                        send_now = true;
                    }
                    if enter_pressed {
                        response.request_focus();
                    }
                });
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&self.status).small().color(theme.muted_text));
                    if self.pending {
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            ui.spinner();
                        });
                    }
                });
            });

        if send_now {
            self.send_message();
        }
    }

    fn draw_messages(&mut self, ctx: &egui::Context) {
        let theme = self.theme.palette();
        egui::CentralPanel::default()
            .frame(Frame::NONE)
            .show(ctx, |ui| {
                paint_vertical_gradient(
                    ui.painter(),
                    ui.max_rect(),
                    theme.gradient_top,
                    theme.gradient_bottom,
                );

                Frame::default()
                    .inner_margin(egui::Margin::symmetric(12, 8))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(&self.active).strong().color(theme.text));
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                ui.label(
                                    RichText::new(format!("{} message(s)", self.history.len()))
                                        .small()
                                        .color(theme.muted_text),
                                );
                            });
                        });
                    });

                let output = ScrollArea::vertical()
                    .id_salt("message_pane")
                    .auto_shrink([false, false])
                    .vertical_scroll_offset(self.chat_scroll.view_offset())
                    .show(ui, |ui| {
                        Frame::default()
                            .inner_margin(egui::Margin::symmetric(12, 8))
                            .show(ui, |ui| {
                                for message in &self.history {
                                    draw_bubble(ui, theme, message);
                                }
                            });
                    });
                self.chat_area = PaneMetrics {
                    rect: Some(output.inner_rect),
                    content_height: output.content_size.y,
                    visible_height: output.inner_rect.height(),
                };
            });
    }

    fn draw_settings_modal(&mut self, ctx: &egui::Context) {
        if !self.settings_open {
            return;
        }
        let previous_theme = self.theme;
        let mut close = false;

        let modal = egui::Modal::new(egui::Id::new("settings_modal")).show(ctx, |ui| {
            ui.set_width(360.0);
            ui.heading("Settings");
            ui.add_space(4.0);

            ui.label(RichText::new("Theme").strong());
            ui.horizontal(|ui| {
                for choice in ThemeChoice::all() {
                    ui.selectable_value(&mut self.theme, choice, choice.name());
                }
            });
            ui.add_space(4.0);

            ui.label(RichText::new("Model").strong());
            egui::ComboBox::from_id_salt("model_selector")
                .selected_text(self.model.as_str())
                .show_ui(ui, |ui| {
                    for option in MODEL_OPTIONS {
                        ui.selectable_value(&mut self.model, option.to_string(), option);
                    }
                });
            ui.add_space(4.0);

            ui.label(RichText::new("System prompt").strong());
            ui.add(
                egui::TextEdit::multiline(&mut self.system_prompt)
                    .desired_rows(3)
                    .desired_width(f32::INFINITY),
            );
            ui.add_space(8.0);

            if ui.button("Close").clicked() {
                close = true;
            }
        });

        if modal.should_close() || close {
            self.settings_open = false;
        }
        if self.theme != previous_theme {
            apply_theme(ctx, self.theme.palette());
        }
    }

    fn draw_naming_modal(&mut self, ctx: &egui::Context) {
        if !self.naming_open {
            return;
        }
        let mut confirm = false;
        let mut cancel = false;

        let modal = egui::Modal::new(egui::Id::new("naming_modal")).show(ctx, |ui| {
            ui.set_width(320.0);
            ui.heading("New conversation");
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.naming_buffer)
                    .hint_text("Conversation name"),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                confirm = true;
            }
            if let Some(error) = &self.naming_error {
                ui.label(RichText::new(error).color(Color32::from_rgb(220, 80, 80)));
            }
            ui.horizontal(|ui| {
                if ui.button("Create").clicked() {
                    confirm = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

        if modal.should_close() || cancel {
            self.naming_open = false;
            self.naming_buffer.clear();
            self.naming_error = None;
        } else if confirm {
            self.confirm_new_conversation();
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_worker_events();

        self.route_wheel_events(ctx);
        self.sidebar_scroll.step();
        self.sidebar_scroll
            .clamp(self.sidebar_area.content_height, self.sidebar_area.visible_height);
        self.chat_scroll.step();
        self.chat_scroll
            .clamp(self.chat_area.content_height, self.chat_area.visible_height);

        self.draw_sidebar(ctx);
        self.draw_input_panel(ctx);
        self.draw_messages(ctx);
        self.draw_settings_modal(ctx);
        self.draw_naming_modal(ctx);

        ctx.request_repaint_after(FRAME_INTERVAL);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("saving '{}' before exit", self.active);
        self.save_active();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_app() -> (TempDir, ChatApp) {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::open(dir.path()).unwrap();
        let app = ChatApp::new(store, ChatConfig::default()).unwrap();
        (dir, app)
    }

    fn bubble_rects(messages: &[Message], available_width: f32) -> Vec<egui::Rect> {
        let ctx = egui::Context::default();
        let mut rects = Vec::new();

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.allocate_ui_with_layout(
                    egui::vec2(available_width, 600.0),
                    Layout::top_down(Align::LEFT),
                    |ui| {
                        let theme = ThemeChoice::Midnight.palette();
                        for message in messages {
                            rects.push(draw_bubble(ui, theme, message));
                        }
                    },
                );
            });
        });

        rects
    }

    #[test]
    fn new_bootstraps_an_empty_store_with_a_default_conversation() {
        let (_dir, app) = test_app();

        assert_eq!(app.conversations, vec!["New Chat"]);
        assert_eq!(app.active, "New Chat");
        assert!(app.history.is_empty());
        assert!(!app.pending);
    }

    #[test]
    fn new_opens_the_last_existing_conversation() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::open(dir.path()).unwrap();
        store.create("alpha").unwrap();
        store.create("zulu").unwrap();
        store
            .save("zulu", &[Message::new("user", "most recent")])
            .unwrap();

        let app = ChatApp::new(store, ChatConfig::default()).unwrap();

        assert_eq!(app.active, "zulu");
        assert_eq!(app.history, vec![Message::new("user", "most recent")]);
    }

    #[test]
    fn begin_user_turn_appends_the_prompt_and_clears_the_buffer() {
        let (_dir, mut app) = test_app();
        app.input = "  hello  ".to_string();

        let messages = app.begin_user_turn().unwrap();

        assert!(app.input.is_empty());
        assert!(app.pending);
        assert_eq!(app.history, vec![Message::new("user", "hello")]);
        assert_eq!(messages.first().unwrap().role, "system");
        assert_eq!(messages.last().unwrap().content, "hello");
    }

    #[test]
    fn begin_user_turn_omits_a_blank_system_instruction() {
        let (_dir, mut app) = test_app();
        app.system_prompt = "  ".to_string();
        app.input = "hello".to_string();

        let messages = app.begin_user_turn().unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    #[test]
    fn begin_user_turn_ignores_blank_input_and_inflight_requests() {
        let (_dir, mut app) = test_app();

        app.input = "   ".to_string();
        assert!(app.begin_user_turn().is_none());

        app.input = "hello".to_string();
        app.pending = true;
        assert!(app.begin_user_turn().is_none());
        assert_eq!(app.input, "hello");
    }

    #[test]
    fn a_failed_call_appends_exactly_two_records_and_clears_the_input() {
        let (_dir, mut app) = test_app();
        app.input = "hello".to_string();

        app.begin_user_turn().unwrap();
        app.handle_worker_event(WorkerEvent::Failed {
            kind: "network",
            detail: "connection refused".to_string(),
        });

        assert_eq!(app.history.len(), 2);
        assert_eq!(app.history[0], Message::new("user", "hello"));
        assert_eq!(app.history[1].role, "assistant");
        assert!(app.history[1].content.starts_with("Error getting response"));
        assert!(app.history[1].content.contains("connection refused"));
        assert!(app.input.is_empty());
        assert!(!app.pending);
        assert!(app.status.contains("network"));
    }

    #[test]
    fn a_reply_appends_one_assistant_record() {
        let (_dir, mut app) = test_app();
        app.input = "hello".to_string();

        app.begin_user_turn().unwrap();
        app.handle_worker_event(WorkerEvent::Reply(Message::new("assistant", "hi there")));

        assert_eq!(
            app.history,
            vec![
                Message::new("user", "hello"),
                Message::new("assistant", "hi there"),
            ]
        );
        assert!(!app.pending);
        assert_eq!(app.status, "Ready");
    }

    #[test]
    fn switching_saves_the_previous_conversation() {
        let (_dir, mut app) = test_app();
        app.history.push(Message::new("user", "remember me"));
        let stem = app.store.create("second").unwrap();
        app.conversations.push(stem.clone());

        app.switch_conversation(&stem);

        assert_eq!(app.active, "second");
        assert!(app.history.is_empty());
        assert_eq!(
            app.store.load("New Chat").unwrap(),
            vec![Message::new("user", "remember me")]
        );
    }

    #[test]
    fn switching_to_the_active_conversation_is_a_no_op() {
        let (_dir, mut app) = test_app();
        app.history.push(Message::new("user", "unsaved"));

        app.switch_conversation("New Chat");

        // No save point was crossed, so the turn stays in memory only.
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.store.load("New Chat").unwrap(), Vec::<Message>::new());
    }

    #[test]
    fn confirm_new_conversation_switches_to_the_created_thread() {
        let (_dir, mut app) = test_app();
        app.history.push(Message::new("user", "before"));
        app.naming_open = true;
        app.naming_buffer = "Trip/Plans?".to_string();

        app.confirm_new_conversation();

        assert!(!app.naming_open);
        assert_eq!(app.active, "Trip_Plans_");
        assert!(app.history.is_empty());
        assert!(app.conversations.contains(&"Trip_Plans_".to_string()));
        assert_eq!(
            app.store.load("New Chat").unwrap(),
            vec![Message::new("user", "before")]
        );
    }

    #[test]
    fn confirm_new_conversation_surfaces_name_collisions() {
        let (_dir, mut app) = test_app();
        app.naming_open = true;
        app.naming_buffer = "New Chat".to_string();

        app.confirm_new_conversation();

        assert!(app.naming_open);
        assert!(app
            .naming_error
            .as_deref()
            .unwrap()
            .contains("already exists"));
        assert_eq!(app.active, "New Chat");
    }

    #[test]
    fn confirm_new_conversation_rejects_a_blank_name() {
        let (_dir, mut app) = test_app();
        app.naming_open = true;
        app.naming_buffer = "   ".to_string();

        app.confirm_new_conversation();

        assert!(app.naming_open);
        assert!(app.naming_error.is_some());
        assert_eq!(app.conversations.len(), 1);
    }

    #[test]
    fn a_long_bubble_stays_within_the_width_ratio() {
        let message = Message::new("assistant", "a fairly long reply ".repeat(40));
        let available_width = 500.0;

        let rects = bubble_rects(&[message], available_width);

        assert!(
            rects[0].width() <= available_width * BUBBLE_MAX_WIDTH_RATIO + 1.0,
            "bubble width {} exceeded max {}",
            rects[0].width(),
            available_width * BUBBLE_MAX_WIDTH_RATIO
        );
    }

    #[test]
    fn user_bubbles_right_align_and_others_left_align() {
        let rects = bubble_rects(
            &[
                Message::new("user", "hi"),
                Message::new("assistant", "hello there"),
            ],
            500.0,
        );
        let (user, assistant) = (rects[0], rects[1]);

        assert!(user.min.x > assistant.min.x);
        assert!(user.max.x > assistant.max.x);
    }

    #[test]
    fn failure_message_carries_the_error_text() {
        assert_eq!(
            failure_message("HTTP 401: bad key"),
            "Error getting response: HTTP 401: bad key"
        );
    }
}
