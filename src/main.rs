//! Pomolog - A menubar Pomodoro timer with an editable session log.
//!
//! Sessions run from the tray; every finished or abandoned session is
//! logged and can be renamed, corrected, deleted or exported as CSV.

use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use muda::MenuEvent;
use tray_icon::{TrayIcon, TrayIconBuilder};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

mod app;
mod audio;
mod display;
mod event;
mod export;
mod menu;
mod models;
mod notifications;
mod persistence;
mod prompt;
mod session;
mod session_log;
mod timer;
mod tray;

use app::{App, CompletionEvent};
use audio::{AmbientNoise, AudioPlayer};
use event::{EventResult, Intent};
use menu::MenuItems;
use prompt::DialogPrompter;
use timer::{ThreadTicker, TimerMessage};

/// How often the event loop wakes to drain ticks and menu events.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Application handler for the winit event loop.
struct Pomolog {
    app: App,
    tray: Option<TrayIcon>,
    menu_items: Option<MenuItems>,
    timer_rx: Receiver<TimerMessage>,
    audio: Option<AudioPlayer>,
    ambient: Option<AmbientNoise>,
    prompter: DialogPrompter,
}

impl Pomolog {
    fn new(app: App, tray: TrayIcon, menu_items: MenuItems, timer_rx: Receiver<TimerMessage>) -> Self {
        // Audio is created on the main thread to avoid Send issues
        let audio = AudioPlayer::new()
            .map_err(|e| log::warn!("Chime disabled: {e}"))
            .ok();
        let ambient = AmbientNoise::spawn()
            .map_err(|e| log::warn!("Ambient noise disabled: {e}"))
            .ok();

        Self {
            app,
            tray: Some(tray),
            menu_items: Some(menu_items),
            timer_rx,
            audio,
            ambient,
            prompter: DialogPrompter,
        }
    }

    /// Refreshes the tray title and the per-tick menu items.
    fn update_menu(&self) {
        let model = self.app.display();
        if let Some(ref items) = self.menu_items {
            menu::update_menu_items(items, &model);
        }
        if let Some(ref tray) = self.tray {
            tray.set_title(Some(&model.tray_title));
        }
    }

    /// Replaces the whole menu and icon after structural changes.
    fn rebuild_menu(&mut self) {
        let model = self.app.display();
        let Some(ref tray) = self.tray else {
            return;
        };

        match menu::build_menu(&model, &self.app.settings) {
            Ok((built_menu, items)) => {
                tray.set_menu(Some(Box::new(built_menu)));
                self.menu_items = Some(items);
            }
            Err(e) => log::error!("Failed to rebuild menu: {e}"),
        }

        match tray::load_icon(model.mode, model.theme) {
            Ok(icon) => {
                if let Err(e) = tray.set_icon(Some(icon)) {
                    log::warn!("Failed to update tray icon: {e}");
                }
            }
            Err(e) => log::warn!("{e}"),
        }
        tray.set_title(Some(&model.tray_title));
    }

    fn apply_ambient(&self) {
        if let Some(ref ambient) = self.ambient {
            let settings = &self.app.settings;
            ambient.apply(settings.ambient_noise_enabled, settings.ambient_noise_volume);
        }
    }

    fn handle_completion(&self, event: CompletionEvent) {
        let sound = self.app.settings.notification_sound_enabled;
        if sound {
            if let Some(ref audio) = self.audio {
                audio.play_chime();
            }
        }
        notifications::notify_completion(event, sound);
    }

    fn process_timer_messages(&mut self) {
        let mut changed = false;
        let mut completed = false;

        while let Ok(msg) = self.timer_rx.try_recv() {
            match msg {
                TimerMessage::Tick(generation) => {
                    changed = true;
                    if let Some(event) = self.app.handle_tick(generation) {
                        completed = true;
                        self.handle_completion(event);
                    }
                }
            }
        }

        if completed {
            // Mode and log changed
            self.rebuild_menu();
        } else if changed {
            self.update_menu();
        }
    }

    fn process_menu_events(&mut self, event_loop: &ActiveEventLoop) {
        while let Ok(event) = MenuEvent::receiver().try_recv() {
            let Some(intent) = Intent::from_menu_id(event.id().as_ref()) else {
                continue;
            };

            match event::dispatch(&mut self.app, intent, &self.prompter) {
                EventResult::Quit => {
                    event_loop.exit();
                    return;
                }
                EventResult::StateChanged => self.update_menu(),
                EventResult::Rebuild => self.rebuild_menu(),
                EventResult::AmbientChanged => {
                    self.apply_ambient();
                    self.rebuild_menu();
                }
                EventResult::Exported(Some(path)) => {
                    log::info!("Exported session log to {}", path.display());
                    notifications::notify_exported(&path);
                }
                EventResult::Exported(None) => notifications::notify_export_empty(),
                EventResult::Continue => {}
            }
        }
    }
}

impl ApplicationHandler for Pomolog {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        // Nothing to do on resume for a tray-only app
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
        // No window events for a tray-only app
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + POLL_INTERVAL));

        // Process ticks from the countdown thread
        self.process_timer_messages();

        // Process menu events
        self.process_menu_events(event_loop);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Countdown ticks come back to the main thread over this channel
    let (tx, rx) = mpsc::channel();
    let app = App::open(Box::new(ThreadTicker::new(tx)))?;

    // Create event loop (required for tray on macOS)
    let event_loop = EventLoop::new()?;

    let model = app.display();
    let (built_menu, menu_items) = menu::build_menu(&model, &app.settings)?;

    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(built_menu))
        .with_icon(tray::load_icon(model.mode, model.theme)?)
        .with_title(&model.tray_title)
        .with_tooltip("Pomolog - Pomodoro Timer")
        .build()?;

    let mut pomolog = Pomolog::new(app, tray, menu_items, rx);
    pomolog.apply_ambient();

    log::info!("Pomolog started");
    event_loop.run_app(&mut pomolog)?;

    Ok(())
}
