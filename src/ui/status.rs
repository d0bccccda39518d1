// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Status panel: position, coordinates, tracker and trial progress.

use crate::models::annotation::Target;
use crate::models::store::NTRIALS;
use crate::session::Session;
use crate::ui::canvas::target_color;

const STRIP_WIDTH: f32 = 18.0;
const MAX_ROW_HEIGHT: f32 = 12.0;

/// Display the status panel for the current session state.
pub fn show(ui: &mut egui::Ui, session: &Session) {
    let nav = session.nav();

    ui.heading("Status");
    ui.separator();

    egui::Grid::new("status_grid")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Folder:");
            ui.label(format!("{} / {}", nav.folder + 1, session.folders().len()));
            ui.end_row();

            ui.label("");
            ui.label(egui::RichText::new(session.folder_label()).monospace().small());
            ui.end_row();

            ui.label("Frame:");
            let frame_count = session.frames().len();
            if frame_count == 0 {
                ui.label("none");
            } else {
                ui.label(format!("{} / {}", nav.frame + 1, frame_count));
            }
            ui.end_row();

            ui.label("Trial:");
            ui.label(format!("{} / {}", nav.trial + 1, NTRIALS));
            ui.end_row();

            for target in Target::ALL {
                let (x, y) = match session.point(target) {
                    Some(p) => (p.x.to_string(), p.y.to_string()),
                    None => ("-".to_string(), "-".to_string()),
                };
                ui.label(egui::RichText::new(format!("{}:", target.as_str())).color(target_color(target)));
                ui.label(format!("x {}  y {}", x, y));
                ui.end_row();
            }

            ui.label("Tracker:");
            ui.horizontal(|ui| {
                ui.label(nav.backend.name());
                if !session.backend_available() {
                    ui.label(egui::RichText::new("(native)").weak())
                        .on_hover_text("Not available in this build, the native tracker is used");
                }
            });
            ui.end_row();
        });

    if nav.manual {
        ui.add_space(4.0);
        ui.label(
            egui::RichText::new(" MANUAL ")
                .strong()
                .color(egui::Color32::BLACK)
                .background_color(egui::Color32::from_rgb(230, 160, 40)),
        );
    }

    ui.add_space(8.0);
    ui.separator();
    ui.label("Trial progress:");
    show_strips(ui, session);
}

/// One column per target, one row per frame: green where a point exists.
/// The active target's column is outlined and the current frame is marked
/// with an arrow.
fn show_strips(ui: &mut egui::Ui, session: &Session) {
    let nav = session.nav();
    let frame_count = session.frames().len();
    if frame_count == 0 {
        return;
    }

    let available = ui.available_height().max(40.0);
    let row_height = (available / frame_count as f32).min(MAX_ROW_HEIGHT);
    let size = egui::vec2(STRIP_WIDTH * 3.0 + 24.0, row_height * frame_count as f32);
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    let painter = ui.painter_at(rect);

    for (column, target) in Target::ALL.into_iter().enumerate() {
        let left = rect.min.x + 16.0 + column as f32 * (STRIP_WIDTH + 6.0);
        for (row, present) in session.trial_status(target).into_iter().enumerate() {
            let top = rect.min.y + row as f32 * row_height;
            let cell = egui::Rect::from_min_size(
                egui::pos2(left, top),
                egui::vec2(STRIP_WIDTH, (row_height - 1.0).max(1.0)),
            );
            let color = if present {
                egui::Color32::from_rgb(60, 170, 60)
            } else {
                egui::Color32::from_rgb(170, 50, 50)
            };
            painter.rect_filled(cell, 0.0, color);
        }

        if target == nav.target {
            let column_rect = egui::Rect::from_min_size(
                egui::pos2(left - 1.0, rect.min.y),
                egui::vec2(STRIP_WIDTH + 2.0, size.y),
            );
            painter.rect_stroke(column_rect, 0.0, egui::Stroke::new(2.0, target_color(target)));
        }
    }

    let arrow_y = rect.min.y + (nav.frame as f32 + 0.5) * row_height;
    painter.text(
        egui::pos2(rect.min.x, arrow_y),
        egui::Align2::LEFT_CENTER,
        "▶",
        egui::FontId::proportional(row_height.max(8.0)),
        ui.visuals().text_color(),
    );
}
