// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns the annotation [`Session`] and the in-progress rectangle
//! [`Capture`]. Key presses, menu entries, the toolbar and the canvas are
//! all turned into [`Command`]s that drive the session; frames are decoded
//! on a background thread and uploaded as a texture when they arrive.

use crate::capture::Capture;
use crate::models::annotation::{Point, Target};
use crate::session::Session;
use crate::tracking::BackendKind;
use crate::ui::{canvas, help, plot, status, toolbar};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};

/// A user request, from the keyboard, menus or toolbar.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PrevFolder,
    NextFolder,
    PrevFrame,
    NextFrame,
    NextTrial,
    ToggleTarget,
    SelectTarget(Target),
    ToggleManual,
    SelectBackend(BackendKind),
    ResetTrial,
    ResetAll,
    Export,
    ExportTo(PathBuf),
    ToggleHelp,
    Quit,
}

/// Map this frame's key presses to commands.
fn read_keys(input: &egui::InputState) -> Vec<Command> {
    use egui::Key;

    const BACKEND_KEYS: [Key; 8] = [
        Key::Num1,
        Key::Num2,
        Key::Num3,
        Key::Num4,
        Key::Num5,
        Key::Num6,
        Key::Num7,
        Key::Num8,
    ];

    let mut commands = Vec::new();
    let pairs = [
        (Key::W, Command::PrevFolder),
        (Key::S, Command::NextFolder),
        (Key::A, Command::PrevFrame),
        (Key::D, Command::NextFrame),
        (Key::Tab, Command::NextTrial),
        (Key::Space, Command::ToggleTarget),
        (Key::E, Command::ToggleManual),
        (Key::O, Command::Export),
        (Key::H, Command::ToggleHelp),
        (Key::Escape, Command::Quit),
    ];
    for (key, command) in pairs {
        if input.key_pressed(key) {
            commands.push(command);
        }
    }
    if input.key_pressed(Key::Q) {
        commands.push(if input.modifiers.shift {
            Command::ResetAll
        } else {
            Command::ResetTrial
        });
    }
    for (index, key) in BACKEND_KEYS.iter().enumerate() {
        if input.key_pressed(*key) {
            if let Some(kind) = BackendKind::from_key(index + 1) {
                commands.push(Command::SelectBackend(kind));
            }
        }
    }
    commands
}

/// Result of background frame loading.
struct LoadedFrame {
    path: PathBuf,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Main application state.
pub struct TrackerApp {
    session: Session,

    /// Rectangle being drawn on the canvas
    capture: Capture,

    /// View epoch at the start of the current gesture
    capture_epoch: u64,

    /// Texture of the displayed frame
    image_texture: Option<egui::TextureHandle>,

    /// Frame dimensions (width, height)
    image_size: Option<(u32, u32)>,

    /// Frame the texture was requested for
    requested_frame: Option<PathBuf>,

    /// Receiver for background frame loading
    image_loader: Option<Receiver<Result<LoadedFrame, String>>>,

    show_help: bool,

    /// Last outcome shown in the status bar
    status_message: Option<String>,
}

impl TrackerApp {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            capture: Capture::new(),
            capture_epoch: 0,
            image_texture: None,
            image_size: None,
            requested_frame: None,
            image_loader: None,
            show_help: false,
            status_message: None,
        }
    }

    fn apply(&mut self, ctx: &egui::Context, command: Command) {
        match command {
            Command::PrevFolder => {
                let result = self.session.prev_folder();
                self.report_switch(result);
            }
            Command::NextFolder => {
                let result = self.session.next_folder();
                self.report_switch(result);
            }
            Command::PrevFrame => self.session.prev_frame(),
            Command::NextFrame => self.session.next_frame(),
            Command::NextTrial => self.session.next_trial(),
            Command::ToggleTarget => self.session.toggle_target(),
            Command::SelectTarget(target) => self.session.select_target(target),
            Command::ToggleManual => self.session.toggle_manual(),
            Command::SelectBackend(kind) => self.session.select_backend(kind),
            Command::ResetTrial => self.session.reset_trial(),
            Command::ResetAll => self.session.reset_all(),
            Command::Export => {
                let result = self.session.export_results();
                self.report_export(result);
            }
            Command::ExportTo(path) => {
                let result = self.session.export_to(&path);
                self.report_export(result);
            }
            Command::ToggleHelp => self.show_help = !self.show_help,
            Command::Quit => {
                if let Err(e) = self.session.flush() {
                    log::error!("Failed to save tracking data: {:#}", e);
                }
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    /// A refused folder switch stays visible until the next outcome.
    fn report_switch(&mut self, result: anyhow::Result<()>) {
        if let Err(e) = result {
            self.status_message = Some(format!("{:#}", e));
        }
    }

    fn report_export(&mut self, result: anyhow::Result<crate::io::export::ExportReport>) {
        self.status_message = Some(match result {
            Ok(report) if report.written => {
                format!("Exported {} rows to {}", report.rows, report.path.display())
            }
            Ok(report) => format!("Cannot write {}, is it open elsewhere?", report.path.display()),
            Err(e) => {
                log::error!("Export failed: {:#}", e);
                format!("Export failed: {}", e)
            }
        });
    }

    /// Start loading the current frame if it is not the one on display.
    fn request_frame(&mut self) {
        let wanted = self.session.frame_path();
        if wanted == self.requested_frame {
            return;
        }
        self.requested_frame = wanted.clone();

        let Some(path) = wanted else {
            self.image_texture = None;
            self.image_size = None;
            self.image_loader = None;
            return;
        };

        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);

        std::thread::spawn(move || {
            let result = crate::io::media::load_image(&path)
                .map(|loaded| LoadedFrame {
                    path: path.clone(),
                    width: loaded.width,
                    height: loaded.height,
                    pixels: loaded.pixels,
                })
                .map_err(|e| format!("{:#}", e));
            let _ = sender.send(result);
        });
    }

    /// Upload a finished frame load.
    fn receive_frame(&mut self, ctx: &egui::Context) {
        let Some(ref receiver) = self.image_loader else {
            return;
        };
        let Ok(result) = receiver.try_recv() else {
            ctx.request_repaint();
            return;
        };
        self.image_loader = None;

        match result {
            Ok(frame) if Some(&frame.path) == self.requested_frame.as_ref() => {
                let size = [frame.width as usize, frame.height as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &frame.pixels);
                let texture = ctx.load_texture("frame", color_image, egui::TextureOptions::LINEAR);
                self.image_texture = Some(texture);
                self.image_size = Some((frame.width, frame.height));
            }
            Ok(_) => {}
            Err(e) => {
                log::error!("Failed to load frame: {}", e);
                self.image_texture = None;
                self.image_size = None;
            }
        }
    }

    fn handle_canvas(&mut self, action: canvas::CanvasAction) {
        match action {
            canvas::CanvasAction::Press(pos) => {
                self.capture.press(pos);
                self.capture_epoch = self.session.view_epoch();
            }
            canvas::CanvasAction::Drag(pos) => {
                self.capture.drag(pos);
            }
            canvas::CanvasAction::Release(pos) => {
                let pos = pos.or_else(|| self.capture.draft().map(|r| Point::new(r.x2, r.y2)));
                let Some(rect) = pos.and_then(|pos| self.capture.release(pos)) else {
                    self.capture.cancel();
                    return;
                };
                if let Some(report) = self.session.commit_rectangle(rect) {
                    self.status_message = Some(format!(
                        "{}: tracked {} frames, {} failed",
                        report.backend,
                        report.tracked.len(),
                        report.failed.len()
                    ));
                }
            }
            canvas::CanvasAction::None => {}
        }
    }
}

impl eframe::App for TrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut commands = ctx.input(read_keys);

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Export Results").clicked() {
                        commands.push(Command::Export);
                        ui.close_menu();
                    }
                    if ui.button("Export To...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("CSV", &["csv"])
                            .set_file_name("results.csv")
                            .save_file()
                        {
                            commands.push(Command::ExportTo(path));
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        commands.push(Command::Quit);
                        ui.close_menu();
                    }
                });

                ui.menu_button("Session", |ui| {
                    if ui.button("Next Trial (Tab)").clicked() {
                        commands.push(Command::NextTrial);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Reset Trial (Q)").clicked() {
                        commands.push(Command::ResetTrial);
                        ui.close_menu();
                    }
                    if ui.button("Reset All Trials (Shift+Q)").clicked() {
                        commands.push(Command::ResetAll);
                        ui.close_menu();
                    }
                });

                ui.menu_button("Help", |ui| {
                    if ui.button("Key Bindings (H)").clicked() {
                        commands.push(Command::ToggleHelp);
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, self.session.nav()))
            .inner;
        match toolbar_action {
            toolbar::ToolbarAction::SelectBackend(kind) => commands.push(Command::SelectBackend(kind)),
            toolbar::ToolbarAction::SelectTarget(target) => commands.push(Command::SelectTarget(target)),
            toolbar::ToolbarAction::ToggleManual => commands.push(Command::ToggleManual),
            toolbar::ToolbarAction::None => {}
        }

        for command in commands {
            self.apply(ctx, command);
        }

        // A gesture cannot outlive the frame it started on
        if self.capture.is_active() && self.session.view_epoch() != self.capture_epoch {
            self.capture.cancel();
        }

        self.request_frame();
        self.receive_frame(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.image_loader.is_some() {
                    ui.spinner();
                }
                if let Some(ref message) = self.status_message {
                    ui.label(message);
                }
            });
        });

        egui::TopBottomPanel::bottom("displacement")
            .resizable(true)
            .default_height(180.0)
            .show(ctx, |ui| plot::show(ui, self.session.displacement()));

        egui::SidePanel::right("status")
            .default_width(230.0)
            .show(ctx, |ui| status::show(ui, &self.session));

        // Main canvas (center)
        let overlays: Vec<canvas::Overlay> = Target::ALL
            .into_iter()
            .filter_map(|target| {
                self.session
                    .rectangle(target)
                    .map(|rect| canvas::Overlay { rect, target })
            })
            .collect();
        let draft = self.capture.draft().map(|rect| canvas::Overlay {
            rect,
            target: self.session.nav().target,
        });
        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| canvas::show(ui, &self.image_texture, self.image_size, &overlays, draft))
            .inner;
        self.handle_canvas(canvas_action);

        help::show(ctx, &mut self.show_help);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Commands read from a single frame in which `key` was pressed.
    fn commands_for(key: egui::Key, shift: bool) -> Vec<Command> {
        let mut raw = egui::RawInput::default();
        raw.modifiers.shift = shift;
        raw.events.push(egui::Event::Key {
            key,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers: raw.modifiers,
        });
        let ctx = egui::Context::default();
        ctx.begin_frame(raw);
        let commands = ctx.input(read_keys);
        let _ = ctx.end_frame();
        commands
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(commands_for(egui::Key::D, false), vec![Command::NextFrame]);
        assert_eq!(commands_for(egui::Key::W, false), vec![Command::PrevFolder]);
        assert_eq!(commands_for(egui::Key::Q, false), vec![Command::ResetTrial]);
        assert_eq!(commands_for(egui::Key::Q, true), vec![Command::ResetAll]);
        assert_eq!(
            commands_for(egui::Key::Num8, false),
            vec![Command::SelectBackend(BackendKind::Csrt)]
        );
    }
}
