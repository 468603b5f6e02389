// main.rs - globe window: event loop, pointer wiring, menu and status bar

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // no console window in release builds

mod i18n;
mod renderer;
mod viewer;

use glam::DVec2;
use globe_viewer::{DragOutcome, Settings};
use renderer::Renderer;
use viewer::GlobeViewer;

use winit::{
    dpi::LogicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowBuilder},
};

use image::io::Reader as ImageReader;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How often the loop wakes without input, to pick up decoded images.
const IDLE_TICK: Duration = Duration::from_millis(100);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut current_lang = i18n::resolve_lang_from_args();
    i18n::init(current_lang.clone());

    let settings = Settings::load_or_default(globe_viewer::settings::resolve_config_from_args());

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title(i18n::tr("app.title"))
        .with_inner_size(LogicalSize::new(1280, 800))
        .build(&event_loop)
    {
        Ok(w) => Arc::new(w),
        Err(e) => {
            log::error!("failed to create window: {}", e);
            return;
        }
    };

    let mut renderer = pollster::block_on(Renderer::new(window.clone()));
    let mut viewer = GlobeViewer::new(
        settings,
        f64::from(renderer.size.width),
        f64::from(renderer.size.height),
    );

    let mut needs_redraw = true;
    let mut is_loading = false;

    let (tx, rx): (Sender<image::RgbaImage>, Receiver<image::RgbaImage>) = channel();

    if let Some(path) = image_path_from_args() {
        is_loading = true;
        start_load_image(path, tx.clone());
    }

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::WaitUntil(Instant::now() + IDLE_TICK);

        if let Ok(rgba) = rx.try_recv() {
            renderer.load_texture(rgba);
            is_loading = false;
            needs_redraw = true;
        }

        match event {
            Event::WindowEvent { event, .. } => {
                // A release must end the drag even when it lands on a menu.
                if let WindowEvent::MouseInput {
                    state: ElementState::Released,
                    button: MouseButton::Left,
                    ..
                } = event
                {
                    viewer.controller.pointer_up();
                }

                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.repaint {
                    needs_redraw = true;
                }
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                        viewer.resize(f64::from(new_size.width), f64::from(new_size.height));
                        needs_redraw = true;
                    }

                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size);
                        viewer.resize(
                            f64::from(new_inner_size.width),
                            f64::from(new_inner_size.height),
                        );
                        needs_redraw = true;
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => {
                                    if let Some(path) = pick_image() {
                                        is_loading = true;
                                        start_load_image(path, tx.clone());
                                    }
                                }
                                Some(VirtualKeyCode::F11) => {
                                    toggle_fullscreen(&mut viewer, &window);
                                }
                                Some(VirtualKeyCode::R) => {
                                    viewer.reset_view();
                                    needs_redraw = true;
                                }
                                Some(VirtualKeyCode::M) => {
                                    viewer.show_markers = !viewer.show_markers;
                                    needs_redraw = true;
                                }
                                Some(VirtualKeyCode::Escape) => {
                                    viewer.controller.cancel();
                                }
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => {
                        if let Some(cursor) = viewer.cursor {
                            if let Err(e) = viewer.pointer_down(cursor) {
                                log::warn!("ignoring press: {}", e);
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        match viewer.pointer_move(DVec2::new(position.x, position.y)) {
                            Ok(DragOutcome::Rotated(_)) => needs_redraw = true,
                            Ok(DragOutcome::Ignored) => {}
                            Err(e) => log::warn!("ignoring pointer move: {}", e),
                        }
                        // hover readout in the status bar
                        needs_redraw = true;
                    }

                    WindowEvent::CursorLeft { .. } => {
                        viewer.cursor = None;
                        viewer.controller.cancel();
                        needs_redraw = true;
                    }

                    WindowEvent::Focused(false) => {
                        viewer.controller.cancel();
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let notches = match delta {
                            MouseScrollDelta::LineDelta(_, y) => f64::from(y),
                            MouseScrollDelta::PixelDelta(pos) => pos.y / 50.0,
                        };
                        viewer.zoom_by(notches);
                        needs_redraw = true;
                    }

                    WindowEvent::DroppedFile(path) => {
                        is_loading = true;
                        start_load_image(path, tx.clone());
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                renderer.update_globe(viewer.controller.orientation(), &viewer.params);

                let mut next_image = None;
                let mut ui_changed = false;
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_markers(ctx, &viewer);
                    ui_changed = draw_ui(
                        ctx,
                        &mut viewer,
                        &mut next_image,
                        is_loading,
                        &window,
                        &mut current_lang,
                    );
                });

                // UI edits (reset, toggles) land after the globe was uploaded.
                if ui_changed {
                    needs_redraw = true;
                }

                if let Some(path) = next_image {
                    is_loading = true;
                    start_load_image(path, tx.clone());
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::error!("render error: {:?}", e),
                }
            }

            Event::MainEventsCleared => {
                if needs_redraw {
                    needs_redraw = false;
                    window.request_redraw();
                }
            }

            _ => {}
        }
    });
}

/// First positional argument, skipping `--lang <code>` and `--config <path>`.
fn image_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(a) = args.next() {
        if a == "--lang" || a == "--config" {
            args.next();
            continue;
        }
        if !a.starts_with("--") {
            return Some(PathBuf::from(a));
        }
    }
    None
}

fn pick_image() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(&i18n::tr("file.filter.images"), &["jpg", "jpeg", "png", "bmp"])
        .pick_file()
}

fn toggle_fullscreen(viewer: &mut GlobeViewer, window: &Window) {
    viewer.is_fullscreen = !viewer.is_fullscreen;
    if viewer.is_fullscreen {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        window.set_fullscreen(None);
    }
}

fn start_load_image(path: PathBuf, tx: Sender<image::RgbaImage>) {
    thread::spawn(move || {
        log::info!(
            "{}",
            i18n::tr_with("log.loading_image_bg", &[("path", format!("{:?}", path))])
        );

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                log::error!("{}", i18n::tr_with("error.open_file", &[("err", e.to_string())]));
                return;
            }
        };

        let img_result = ImageReader::new(BufReader::new(file))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)
            .and_then(|mut r| {
                r.no_limits();
                r.decode()
            });

        match img_result {
            Ok(img) => {
                log::info!(
                    "{}",
                    i18n::tr_with(
                        "log.image_loaded_size",
                        &[("w", img.width().to_string()), ("h", img.height().to_string())]
                    )
                );
                if tx.send(img.to_rgba8()).is_err() {
                    log::error!("{}", i18n::tr("error.send_to_main_failed"));
                }
            }
            Err(e) => log::error!("{}", i18n::tr_with("error.decode_image", &[("err", e.to_string())])),
        }
    });
}

/// Labels for configured markers on the visible hemisphere. Drawn on the
/// background layer so menus stay on top.
fn draw_markers(ctx: &egui::Context, viewer: &GlobeViewer) {
    if !viewer.show_markers {
        return;
    }

    let pixels_per_point = f64::from(ctx.pixels_per_point());
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Background,
        egui::Id::new("globe_markers"),
    ));
    let projection = viewer.projection();

    for marker in &viewer.settings.markers {
        let Some(screen) = projection.project_visible(marker.geo()) else {
            continue;
        };
        let pos = egui::pos2(
            (screen.x / pixels_per_point) as f32,
            (screen.y / pixels_per_point) as f32,
        );
        painter.circle_filled(pos, 3.5, egui::Color32::from_rgb(255, 96, 64));
        painter.text(
            pos + egui::vec2(6.0, 0.0),
            egui::Align2::LEFT_CENTER,
            &marker.name,
            egui::FontId::proportional(13.0),
            egui::Color32::WHITE,
        );
    }
}

/// Menu and status bar. Returns true when the globe state changed.
fn draw_ui(
    ctx: &egui::Context,
    viewer: &mut GlobeViewer,
    next_image: &mut Option<PathBuf>,
    is_loading: bool,
    window: &Window,
    current_lang: &mut String,
) -> bool {
    let mut changed = false;

    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button(i18n::tr("menu.file"), |ui| {
                if ui.button(i18n::tr("menu.open_image")).clicked() {
                    ui.close_menu();
                    *next_image = pick_image();
                }
                if ui.button(i18n::tr("menu.exit")).clicked() {
                    std::process::exit(0);
                }
            });

            ui.menu_button(i18n::tr("menu.view"), |ui| {
                if ui.button(i18n::tr("view.reset")).clicked() {
                    viewer.reset_view();
                    changed = true;
                    ui.close_menu();
                }

                let fullscreen_label = if viewer.is_fullscreen {
                    i18n::tr("view.fullscreen.exit")
                } else {
                    i18n::tr("view.fullscreen.enter")
                };
                if ui.button(fullscreen_label).clicked() {
                    toggle_fullscreen(viewer, window);
                    ui.close_menu();
                }

                ui.separator();
                if ui.button(i18n::tr("view.zoom_in")).clicked() {
                    viewer.zoom_by(1.0);
                    changed = true;
                }
                if ui.button(i18n::tr("view.zoom_out")).clicked() {
                    viewer.zoom_by(-1.0);
                    changed = true;
                }

                ui.separator();
                if ui
                    .checkbox(&mut viewer.show_markers, i18n::tr("view.show_markers"))
                    .clicked()
                {
                    changed = true;
                }
            });

            ui.menu_button(i18n::tr("menu.language"), |ui| {
                let langs: [(&str, &str); 2] = [("en", "English"), ("zh-Hans", "简体中文")];
                for (code, name) in langs {
                    if ui.radio_value(current_lang, code.to_string(), name).clicked() {
                        i18n::init(current_lang.clone());
                        window.set_title(&i18n::tr("app.title"));
                        changed = true;
                        ui.close_menu();
                    }
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if is_loading {
                ui.label(
                    egui::RichText::new(i18n::tr("status.loading_image"))
                        .color(egui::Color32::YELLOW),
                );
                ui.label("|");
            }

            let o = viewer.controller.orientation();
            ui.label(i18n::tr_with(
                "status.orientation",
                &[
                    ("yaw", format!("{:.1}", o.yaw)),
                    ("pitch", format!("{:.1}", o.pitch)),
                    ("roll", format!("{:.1}", o.roll)),
                ],
            ));
            ui.label("|");

            let center = viewer.projection().center();
            ui.label(i18n::tr_with(
                "status.center",
                &[
                    ("lon", format!("{:.2}", center.lon)),
                    ("lat", format!("{:.2}", center.lat)),
                ],
            ));
            ui.label("|");
            ui.label(i18n::tr_with(
                "status.zoom",
                &[("zoom", format!("{:.2}", viewer.zoom))],
            ));

            if let Some(geo) = viewer.hovered() {
                ui.label("|");
                ui.label(i18n::tr_with(
                    "status.cursor",
                    &[
                        ("lon", format!("{:.2}", geo.lon)),
                        ("lat", format!("{:.2}", geo.lat)),
                    ],
                ));
            }

            if viewer.controller.is_dragging() {
                ui.label("|");
                ui.label(
                    egui::RichText::new(i18n::tr("status.dragging")).color(egui::Color32::GREEN),
                );
            }
        });
    });

    changed
}
