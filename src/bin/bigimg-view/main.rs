#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod constants;
mod decode_worker;
mod image_watcher;
mod ui;

use bigimg_view::{
    BigImageView, ConfigError, FrameStatus, ImageRegionDecoder, PixelFormat, RegionDecoder,
    ViewConfig,
};
use clap::{Parser, ValueEnum};
use constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, ERROR_TOAST_SECONDS, WINDOW_SIZE};
use decode_worker::DecodeWorker;
use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use image_watcher::ImageWatcher;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bigimg-view", about = "Pan and zoom very large images")]
#[command(version)]
struct Cli {
    /// Image file to open
    image: PathBuf,

    /// RON config file (defaults to <config dir>/bigimg-view/config.ron)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pixel format for decoded regions, overriding the config file
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Do not reload the image when the file changes on disk
    #[arg(long)]
    no_watch: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Rgba8888,
    Rgb565,
}

impl From<FormatArg> for PixelFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Rgba8888 => Self::Rgba8888,
            FormatArg::Rgb565 => Self::Rgb565,
        }
    }
}

/// Main application state for the image viewer.
pub struct BigImageApp {
    image_path: PathBuf,
    view: BigImageView,
    worker: DecodeWorker,
    watcher: Option<ImageWatcher>,
    texture: Option<TextureHandle>,
    toasts: Toasts,
    /// Why the current image could not be opened, if it couldn't.
    open_error: Option<String>,
}

impl BigImageApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        cli: Cli,
        config: ViewConfig,
        config_error: Option<ConfigError>,
    ) -> Self {
        let toasts = Toasts::new()
            .anchor(egui::Align2::RIGHT_TOP, (-10.0, 10.0))
            .direction(egui::Direction::TopDown);

        let watcher = if cli.no_watch {
            None
        } else {
            ImageWatcher::new(cc.egui_ctx.clone(), &cli.image)
        };
        if watcher.is_none() && !cli.no_watch {
            log::info!("File watcher not available - automatic reload disabled");
        }

        let mut app = Self {
            image_path: cli.image,
            view: BigImageView::new(config),
            worker: DecodeWorker::spawn(cc.egui_ctx.clone()),
            watcher,
            texture: None,
            toasts,
            open_error: None,
        };

        if let Some(err) = config_error {
            app.show_error(format!("{err}; using default settings"));
        }
        app.open_image();
        app
    }

    /// Opens (or re-opens) the image file, entering the no-image state on
    /// failure.
    pub fn open_image(&mut self) {
        let format = self.view.config().pixel_format;
        match ImageRegionDecoder::open(&self.image_path, format) {
            Ok(decoder) => {
                self.view.set_image(decoder.extent());
                self.worker.replace(decoder);
                self.open_error = None;
            }
            Err(err) => {
                log::warn!("{err}");
                self.view.clear_image();
                self.texture = None;
                let message = err.to_string();
                self.open_error = Some(message.clone());
                self.show_error(message);
            }
        }
    }

    pub fn show_error(&mut self, message: String) {
        self.toasts.add(Toast {
            kind: ToastKind::Error,
            text: message.into(),
            options: ToastOptions::default()
                .duration_in_seconds(ERROR_TOAST_SECONDS)
                .show_icon(true),
            ..Default::default()
        });
    }

    /// Reloads the image if the watcher saw the file change.
    fn poll_watcher(&mut self) {
        let changed = self.watcher.as_mut().is_some_and(ImageWatcher::poll);
        if changed {
            log::info!("{} changed on disk, reloading", self.image_path.display());
            self.open_image();
        }
    }

    /// Applies finished decodes and uploads newly presented frames.
    fn poll_decoded(&mut self, ctx: &egui::Context) {
        while let Some(decoded) = self.worker.poll() {
            match self.view.finish_frame(decoded.revision, decoded.result) {
                Ok(FrameStatus::Presented) => self.upload_frame(ctx),
                Ok(FrameStatus::Stale) => {}
                Err(err) => self.show_error(err.to_string()),
            }
        }
    }

    /// Sends the current window to the decoder if it has not been decoded yet.
    fn request_frame(&mut self) {
        if let Some(request) = self.view.begin_frame() {
            self.worker.submit(request);
        }
    }

    fn upload_frame(&mut self, ctx: &egui::Context) {
        let Some(frame) = self.view.frame() else {
            return;
        };
        let pixels = frame.pixels;
        let image = ColorImage::from_rgba_unmultiplied(
            [pixels.width() as usize, pixels.height() as usize],
            &pixels.to_rgba8(),
        );

        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("region", image, TextureOptions::LINEAR));
            }
        }
    }
}

impl eframe::App for BigImageApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_watcher();
        self.poll_decoded(ctx);
        self.handle_keyboard_input(ctx);

        self.show_status_bar(ctx);
        self.show_central_panel(ctx);

        self.request_frame();

        self.toasts.show(ctx);
    }
}

fn default_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME);
    path.exists().then_some(path)
}

/// Loads the config file, falling back to defaults when it cannot be used.
fn load_config(cli: &Cli) -> (ViewConfig, Option<ConfigError>) {
    let (mut config, error) = match cli.config.clone().or_else(default_config_path) {
        Some(path) => match ViewConfig::load(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                (config, None)
            }
            Err(err) => {
                log::warn!("{err}");
                (ViewConfig::default(), Some(err))
            }
        },
        None => (ViewConfig::default(), None),
    };

    if let Some(format) = cli.format {
        config.pixel_format = format.into();
    }
    (config, error)
}

fn main() -> eframe::Result {
    env_logger::init();

    let cli = Cli::parse();
    let (config, config_error) = load_config(&cli);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size(WINDOW_SIZE),
        ..Default::default()
    };

    eframe::run_native(
        "Big Image Viewer",
        options,
        Box::new(|cc| Ok(Box::new(BigImageApp::new(cc, cli, config, config_error)))),
    )
}
