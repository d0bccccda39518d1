// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Nerve displacement relative to the fixpoint, one line per trial.

use crate::analysis::DisplacementSeries;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

pub fn show(ui: &mut egui::Ui, series: &[DisplacementSeries]) {
    Plot::new("displacement_plot")
        .legend(Legend::default())
        .data_aspect(1.0)
        .x_axis_label("dx")
        .y_axis_label("dy")
        .show(ui, |plot_ui| {
            for s in series {
                let name = format!("Trial {}", s.trial);
                plot_ui.line(Line::new(PlotPoints::from(s.points.clone())).name(&name));
                if let Some(last) = s.points.last() {
                    plot_ui.points(Points::new(vec![*last]).radius(4.0).name(&name));
                }
            }
        });
}
