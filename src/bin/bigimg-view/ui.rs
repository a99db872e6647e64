//! UI rendering and input translation for the image viewer.

use crate::BigImageApp;
use crate::constants::ZOOM_STEP;
use bigimg_view::{InputEvent, OutputSurface, ViewError};
use eframe::egui;
use std::time::Duration;

impl BigImageApp {
    /// Handles keyboard shortcuts for zoom and reload.
    pub fn handle_keyboard_input(&mut self, ctx: &egui::Context) {
        let mut reload = false;
        ctx.input(|i| {
            if i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals) {
                self.view.handle(InputEvent::Pinch { factor: ZOOM_STEP });
            }
            if i.key_pressed(egui::Key::Minus) {
                self.view.handle(InputEvent::Pinch {
                    factor: 1.0 / ZOOM_STEP,
                });
            }
            if i.key_pressed(egui::Key::R) {
                reload = true;
            }
        });
        if reload {
            self.open_image();
        }
    }

    /// Renders the bottom status bar with controls hint and view position.
    pub fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Drag: Pan | Scroll/Pinch: Zoom | Double-click: Zoom | R: Reload");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(viewport) = self.view.viewport() {
                        let window = viewport.window();
                        let extent = viewport.extent();
                        ui.label(format!(
                            "{:.0}% | {}x{} | ({}, {}) - ({}, {})",
                            viewport.zoom_factor() * 100.0,
                            extent.width,
                            extent.height,
                            window.left,
                            window.top,
                            window.right,
                            window.bottom,
                        ));
                    }
                });
            });
        });
    }

    /// Renders the central panel containing the image.
    pub fn show_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if !self.view.has_image() {
                    let message = match &self.open_error {
                        Some(err) => format!("No image.\n{err}"),
                        None => "No image.".to_owned(),
                    };
                    ui.centered_and_justified(|ui| {
                        ui.label(message);
                    });
                    return;
                }
                self.show_image(ui);
            });
    }

    /// Lays out the view on the panel, feeds it pointer input and paints the
    /// last decoded frame.
    fn show_image(&mut self, ui: &mut egui::Ui) {
        let (viewport_rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        let ppp = ui.ctx().pixels_per_point();

        let surface = OutputSurface::new(
            (viewport_rect.width() * ppp).round() as u32,
            (viewport_rect.height() * ppp).round() as u32,
        );
        match self.view.layout(surface) {
            Ok(_) => {}
            Err(ViewError::DegenerateLayout { .. }) => return,
            Err(err) => {
                log::warn!("layout failed: {err}");
                return;
            }
        }

        for event in pointer_events(ui, &response, viewport_rect, ppp) {
            self.view.handle(event);
        }

        if self.view.is_animating() {
            let dt = ui.input(|i| i.stable_dt);
            self.view.tick(Duration::from_secs_f32(dt.max(0.0)));
            ui.ctx().request_repaint();
        }

        let (Some(frame), Some(texture)) = (self.view.frame(), &self.texture) else {
            ui.put(viewport_rect, egui::Spinner::new());
            return;
        };

        let (width, height) = frame
            .transform
            .dest_size(frame.pixels.width(), frame.pixels.height());
        let image_rect =
            egui::Rect::from_min_size(viewport_rect.min, egui::vec2(width, height) / ppp);

        ui.painter().with_clip_rect(viewport_rect).image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }
}

/// Translates this frame's pointer activity over the image into view events.
///
/// Deltas and velocities are converted from points to surface pixels. Drags
/// move the window opposite to the pointer; fling velocity is passed in
/// pointer direction.
fn pointer_events(
    ui: &egui::Ui,
    response: &egui::Response,
    viewport_rect: egui::Rect,
    ppp: f32,
) -> Vec<InputEvent> {
    let mut events = Vec::new();

    let (pressed, hover_pos, velocity, zoom_delta, scroll_delta) = ui.input(|i| {
        (
            i.pointer.any_pressed(),
            i.pointer.hover_pos(),
            i.pointer.velocity(),
            i.zoom_delta(),
            i.raw_scroll_delta.y,
        )
    });
    let hovered = hover_pos.is_some_and(|p| viewport_rect.contains(p));

    if pressed && hovered {
        events.push(InputEvent::Down);
    }

    if response.dragged() {
        let delta = response.drag_delta() * ppp;
        if delta != egui::Vec2::ZERO {
            events.push(InputEvent::Move {
                dx: -delta.x,
                dy: -delta.y,
            });
        }
    }

    if response.drag_stopped() {
        events.push(InputEvent::Up {
            vx: velocity.x * ppp,
            vy: velocity.y * ppp,
        });
    }

    // Trackpad pinch and ctrl+scroll arrive as a zoom delta; a plain wheel
    // steps by a fixed factor.
    if hovered {
        if zoom_delta != 1.0 {
            events.push(InputEvent::Pinch { factor: zoom_delta });
        } else if scroll_delta != 0.0 {
            let factor = if scroll_delta > 0.0 {
                ZOOM_STEP
            } else {
                1.0 / ZOOM_STEP
            };
            events.push(InputEvent::Pinch { factor });
        }
    }

    if response.double_clicked() {
        events.push(InputEvent::DoubleTap);
    }

    events
}
