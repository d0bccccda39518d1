// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Key binding reference window.

const BINDINGS: &[(&str, &str)] = &[
    ("W / S", "Previous / next folder"),
    ("A / D", "Previous / next frame"),
    ("Tab", "Next trial"),
    ("Space", "Switch between nerve and fixpoint"),
    ("E", "Toggle manual mode"),
    ("1 - 8", "Select tracker"),
    ("Q", "Reset current trial"),
    ("Shift + Q", "Reset all trials of this folder"),
    ("O", "Export results"),
    ("H", "Show or hide this help"),
    ("Esc", "Quit"),
];

pub fn show(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Help")
        .open(open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label("Drag on the frame to draw a rectangle for the active target.");
            ui.label("Outside manual mode it is then tracked through the remaining frames.");
            ui.add_space(6.0);
            egui::Grid::new("help_grid").striped(true).show(ui, |ui| {
                for (keys, action) in BINDINGS {
                    ui.label(egui::RichText::new(*keys).monospace().strong());
                    ui.label(*action);
                    ui.end_row();
                }
            });
        });
}
