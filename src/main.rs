use eframe::{egui, NativeOptions};
use egui::{CentralPanel, TopBottomPanel, ScrollArea, Color32, RichText, Key, Modifiers};
use log::{info, error, warn, debug, trace};
use std::time::{Instant, Duration};

// Project Modules
mod errors;
mod config;
mod model;
mod deck_loader;
mod navigation;
mod autoplay;
mod music;
mod audio_output;
mod controller;
mod state_manager;
mod text_renderer;

use errors::*;
use config::*;
use model::*;
use deck_loader::*;
use audio_output::*;
use controller::*;
use state_manager::*;


// --- Constants ---
/// Keys the presentation listens to, in the order they are checked each frame.
const BOUND_KEYS: [Key; 4] = [Key::ArrowRight, Key::ArrowLeft, Key::Space, Key::M];
/// Upper bound on frame spacing while a play request is pending.
const PENDING_POLL_INTERVAL: Duration = Duration::from_millis(50);


/// Everything needed to present, produced once at startup.
struct Presentation {
    config: AppConfig,
    deck: LoadedDeck,
    music: BackgroundMusic,
}

fn load_presentation(config_path: &str) -> Result<Presentation, AppError> {
    let config = load_config(config_path)?;
    let deck = load_deck(&config.deck_path)?;
    let music = match deck.music_path(config.music_path.as_deref()) {
        Some(path) => BackgroundMusic::new(&path).unwrap_or_else(|e| {
            warn!("Background music '{}' unavailable: {}. Music toggle will stay off.", path.display(), e);
            BackgroundMusic::silent()
        }),
        None => {
            debug!("No background music configured.");
            BackgroundMusic::silent()
        }
    };
    Ok(Presentation { config, deck, music })
}

/// Reads the bound keys pressed this frame without Ctrl/Cmd held.
/// Matching presses are consumed so focused widgets never see them.
fn keyboard_commands(ctx: &egui::Context) -> Vec<Command> {
    ctx.input_mut(|input| {
        BOUND_KEYS
            .iter()
            .filter(|&&key| input.consume_key(Modifiers::NONE, key))
            .filter_map(|&key| command_for_key(key))
            .collect()
    })
}

struct SlideDeckApp {
    app_state: AppState,
    deck: Option<LoadedDeck>,
    controller: Option<PresentationController<BackgroundMusic>>,
    image_cache: SlideImageCache,
    font_assets: FontAssets,
    slides_hovered: bool,
}

impl SlideDeckApp {
    fn new(startup: Result<Presentation, AppError>) -> Self {
        info!("Initializing SlideDeckApp...");
        let mut app = Self {
            app_state: AppState::Error("Initializing...".to_string()),
            deck: None,
            controller: None,
            image_cache: SlideImageCache::new(),
            font_assets: FontAssets::new(),
            slides_hovered: false,
        };

        match startup {
            Ok(Presentation { config, deck, music }) => {
                match PresentationController::new(&deck.document.slides, config.autoplay_interval, music) {
                    Some(controller) => {
                        app.controller = Some(controller);
                        app.deck = Some(deck);
                        app.set_app_state(AppState::Presenting, "Deck loaded.");
                    }
                    None => app.set_app_state(AppState::Error("Deck has no slides.".to_string()), "Deck has no slides."),
                }
            }
            Err(e) => {
                let err_msg = format!("Failed to start presentation: {}", e);
                app.set_app_state(AppState::Error(err_msg.clone()), &err_msg);
            }
        }
        app
    }

    fn set_app_state(&mut self, new_state: AppState, message: &str) {
        info!("Transitioning AppState from {:?} to {:?}. Message: {}", self.app_state, new_state, message);
        if let AppState::Error(_) = new_state {
            error!("AppState changed to Error: {}", message);
        }
        self.app_state = new_state;
    }

    /// Starts decoding images for the current and the following slide.
    fn request_images(&mut self, ctx: &egui::Context) {
        let (Some(deck), Some(controller)) = (&self.deck, &self.controller) else { return };
        let count = controller.slide_count();
        for index in [controller.current(), (controller.current() + 1) % count] {
            if let Some(image) = deck.document.slides[index].image.as_deref() {
                self.image_cache.request(index, deck.resolve_asset(image), ctx.clone());
            }
        }
    }

    fn schedule_repaint(&self, ctx: &egui::Context, now: Instant) {
        let Some(controller) = &self.controller else { return };
        let mut wait = controller.time_until_next_firing(now);
        if controller.music_state() == music::MusicState::Requesting {
            wait = Some(wait.map_or(PENDING_POLL_INTERVAL, |w| w.min(PENDING_POLL_INTERVAL)));
        }
        if let Some(wait) = wait {
            trace!("Next repaint in {:?}", wait);
            ctx.request_repaint_after(wait);
        }
    }
}

impl eframe::App for SlideDeckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.image_cache.collect_finished(ctx);

        if let AppState::Error(message) = &self.app_state {
            CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui| { ui.colored_label(Color32::RED, format!("Error: {}", message)); });
            });
            return;
        }

        let mut commands = keyboard_commands(ctx);
        if let Some(controller) = self.controller.as_mut() {
            for command in commands.drain(..) {
                controller.handle(command, now);
            }
            controller.tick(now);
        }
        self.request_images(ctx);

        let (Some(controller), Some(deck)) = (self.controller.as_ref(), self.deck.as_ref()) else { return };

        TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ScrollArea::horizontal().show(ui, |ui| {
                ui.horizontal(|ui| {
                    for thumb in controller.thumbnails() {
                        if ui.selectable_label(thumb.is_active, &thumb.label).clicked() {
                            commands.push(Command::GoTo(thumb.index));
                        }
                    }
                });
            });
            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("◀ Prev").clicked() {
                    commands.push(Command::Previous);
                }
                if ui.button("Next ▶").clicked() {
                    commands.push(Command::Next);
                }
                if ui.button(controller.autoplay().label()).clicked() {
                    commands.push(Command::ToggleAutoplay);
                }
                let music = controller.music();
                let music_button = egui::Button::new(music.label()).selected(music.is_pressed());
                if ui.add(music_button).on_hover_text(format!("pressed: {}", music.aria_pressed())).clicked() {
                    commands.push(Command::ToggleMusic);
                }
                ui.label(RichText::new(format!("{} / {}", controller.current() + 1, controller.slide_count())).weak());
            });
        });

        let mut hovered = self.slides_hovered;
        CentralPanel::default().show(ctx, |ui| {
            let rect = ui.available_rect_before_wrap();
            hovered = ui.rect_contains_pointer(rect);
            let index = controller.current();
            if !controller.is_slide_active(index) {
                warn!("Current slide {} is not marked active.", index);
            }
            let slide = &deck.document.slides[index];
            let style = text_renderer::parse_slide_style(slide, index);
            text_renderer::draw_slide(ui.painter(), rect, slide, &style, &self.font_assets, self.image_cache.texture(index));
            if self.image_cache.is_loading(index) {
                trace!("Image for slide {} still loading.", index);
            }
        });

        if let Some(command) = hover_command(self.slides_hovered, hovered) {
            commands.push(command);
        }
        self.slides_hovered = hovered;

        let had_commands = !commands.is_empty();
        if let Some(controller) = self.controller.as_mut() {
            for command in commands {
                controller.handle(command, now);
            }
        }
        if had_commands {
            ctx.request_repaint();
        }
        self.schedule_repaint(ctx, now);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("SlideDeckApp on_exit called. Releasing background music.");
        self.controller = None;
    }
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    env_logger::init(); // Initialize logger
    info!("Starting slide_deck_rs application...");
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let startup = load_presentation(&config_path);

    let (width, height, fullscreen) = match &startup {
        Ok(p) => (p.config.window_width, p.config.window_height, p.config.fullscreen),
        Err(_) => (1024.0, 768.0, false),
    };
    let title = startup
        .as_ref()
        .ok()
        .and_then(|p| p.deck.document.title.clone())
        .unwrap_or_else(|| "Slide Deck".to_string());

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_fullscreen(fullscreen),
        ..Default::default()
    };
    eframe::run_native(&title, options, Box::new(move |_cc| Box::new(SlideDeckApp::new(startup))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands_for(events: Vec<egui::Event>) -> Vec<Command> {
        let ctx = egui::Context::default();
        ctx.begin_frame(egui::RawInput { events, ..Default::default() });
        let commands = keyboard_commands(&ctx);
        let _ = ctx.end_frame();
        commands
    }

    fn key(key: Key, modifiers: Modifiers) -> egui::Event {
        egui::Event::Key { key, physical_key: None, pressed: true, repeat: false, modifiers }
    }

    #[test]
    fn bare_keys_map_to_commands() {
        let commands = commands_for(vec![
            key(Key::ArrowRight, Modifiers::NONE),
            key(Key::ArrowLeft, Modifiers::NONE),
            key(Key::Space, Modifiers::NONE),
            key(Key::M, Modifiers::NONE),
        ]);
        assert_eq!(
            commands,
            vec![Command::Next, Command::Previous, Command::ToggleAutoplay, Command::ToggleMusic]
        );
    }

    #[test]
    fn command_chords_are_ignored() {
        let commands = commands_for(vec![
            key(Key::M, Modifiers::COMMAND),
            key(Key::M, Modifiers::CTRL),
            key(Key::ArrowRight, Modifiers::CTRL),
            key(Key::Space, Modifiers::COMMAND),
        ]);
        assert!(commands.is_empty());
    }
}
