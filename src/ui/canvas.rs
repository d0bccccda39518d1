// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for frame display and rectangle capture.
//!
//! This module shows the current frame scaled to the available space,
//! draws each target's rectangle with a crosshair through its center, and
//! reports pointer gestures in image pixel coordinates.

use crate::models::annotation::{Point, Rectangle, Target};
use crate::util::geometry::{pixel_to_relative, relative_to_pixel};

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    Press(Point),
    Drag(Point),
    /// Pointer released; the position may be unknown if it left the window
    Release(Option<Point>),
}

/// A rectangle to draw over the frame.
pub struct Overlay {
    pub rect: Rectangle,
    pub target: Target,
}

pub fn target_color(target: Target) -> egui::Color32 {
    match target {
        Target::Nerve => egui::Color32::GREEN,
        Target::Fix => egui::Color32::YELLOW,
    }
}

/// Display the frame canvas and handle pointer gestures.
pub fn show(
    ui: &mut egui::Ui,
    image_texture: &Option<egui::TextureHandle>,
    image_size: Option<(u32, u32)>,
    overlays: &[Overlay],
    draft: Option<Overlay>,
) -> CanvasAction {
    let mut action = CanvasAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let (Some(texture), Some((img_width, img_height))) = (image_texture, image_size) else {
            ui.centered_and_justified(|ui| {
                ui.label(
                    egui::RichText::new("No frames to display in this folder")
                        .color(egui::Color32::from_gray(180)),
                );
            });
            return;
        };

        // Fit the frame into the available space, keeping its aspect
        let available = ui.available_size();
        let img_aspect = img_width as f32 / img_height as f32;
        let available_aspect = available.x / available.y;
        let (display_width, display_height) = if img_aspect > available_aspect {
            (available.x, available.x / img_aspect)
        } else {
            (available.y * img_aspect, available.y)
        };

        let x_offset = (available.x - display_width) / 2.0;
        let y_offset = (available.y - display_height) / 2.0;
        let image_rect = egui::Rect::from_min_size(
            ui.min_rect().min + egui::vec2(x_offset, y_offset),
            egui::vec2(display_width, display_height),
        );

        ui.painter().image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let response = ui.allocate_rect(image_rect, egui::Sense::drag());
        let to_pixel = |pos: egui::Pos2| {
            relative_to_pixel(
                (pos.x - image_rect.min.x) / display_width,
                (pos.y - image_rect.min.y) / display_height,
                img_width,
                img_height,
            )
        };
        let pointer = response.interact_pointer_pos().or(response.hover_pos());

        if response.drag_started() {
            if let Some(pos) = pointer {
                action = CanvasAction::Press(to_pixel(pos));
            }
        } else if response.drag_stopped() {
            action = CanvasAction::Release(pointer.map(to_pixel));
        } else if response.dragged() {
            if let Some(pos) = pointer {
                action = CanvasAction::Drag(to_pixel(pos));
            }
        }

        let painter = ui.painter();
        let to_screen = |x: i32, y: i32| {
            let (rx, ry) = pixel_to_relative(x, y, img_width, img_height);
            egui::pos2(
                image_rect.min.x + rx * image_rect.width(),
                image_rect.min.y + ry * image_rect.height(),
            )
        };

        for overlay in overlays {
            draw_rectangle(painter, &overlay.rect, target_color(overlay.target), &to_screen);
        }
        if let Some(overlay) = draft {
            draw_rectangle(painter, &overlay.rect, target_color(overlay.target), &to_screen);
        }
    });

    action
}

/// Draw a rectangle with red lines through its midpoint.
fn draw_rectangle(
    painter: &egui::Painter,
    rect: &Rectangle,
    color: egui::Color32,
    to_screen: &dyn Fn(i32, i32) -> egui::Pos2,
) {
    let screen = egui::Rect::from_two_pos(to_screen(rect.x1, rect.y1), to_screen(rect.x2, rect.y2));
    painter.rect_stroke(screen, 0.0, egui::Stroke::new(1.0, color));

    let mid = rect.midpoint();
    let crosshair = egui::Stroke::new(1.0, egui::Color32::RED);
    painter.line_segment([to_screen(mid.x, rect.y1), to_screen(mid.x, rect.y2)], crosshair);
    painter.line_segment([to_screen(rect.x1, mid.y), to_screen(rect.x2, mid.y)], crosshair);
}
