// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with tracker, target and mode selection.

use crate::models::annotation::Target;
use crate::navigation::Navigation;
use crate::tracking::BackendKind;

/// Selection made on the toolbar this frame.
pub enum ToolbarAction {
    None,
    SelectBackend(BackendKind),
    SelectTarget(Target),
    ToggleManual,
}

/// Display the toolbar for the current navigation state.
pub fn show(ui: &mut egui::Ui, nav: &Navigation) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tracker:");
        egui::ComboBox::from_id_source("tracker_backend")
            .selected_text(nav.backend.name())
            .show_ui(ui, |ui| {
                for (index, kind) in BackendKind::ALL.iter().enumerate() {
                    let label = format!("{} {}", index + 1, kind.name());
                    if ui.selectable_label(nav.backend == *kind, label).clicked() {
                        action = ToolbarAction::SelectBackend(*kind);
                    }
                }
            });

        ui.separator();

        ui.label("Target:");
        for target in Target::ALL {
            if ui.selectable_label(nav.target == target, target.as_str()).clicked() {
                action = ToolbarAction::SelectTarget(target);
            }
        }

        ui.separator();

        if ui.selectable_label(nav.manual, "✏ Manual").clicked() {
            action = ToolbarAction::ToggleManual;
        }

        ui.separator();

        let hint = if nav.manual {
            "Drag a rectangle to set this frame only"
        } else {
            "Drag a rectangle to track it through the remaining frames"
        };
        ui.label(egui::RichText::new(hint).italics().weak());
    });

    action
}
