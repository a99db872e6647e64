//! Background thread that owns the region decoder.
//!
//! The UI thread sends [`FrameRequest`]s; decoded buffers come back tagged
//! with the request revision so the view can drop results for windows that
//! have since moved.

use bigimg_view::{DecodeError, FrameRequest, ImageRegionDecoder, PixelBuffer, RegionDecoder};
use eframe::egui;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

enum Command {
    Replace(Box<ImageRegionDecoder>),
    Decode(FrameRequest),
}

/// A finished decode.
pub struct Decoded {
    pub revision: u64,
    pub result: Result<PixelBuffer, DecodeError>,
}

pub struct DecodeWorker {
    command_tx: Sender<Command>,
    result_rx: Receiver<Decoded>,
}

impl DecodeWorker {
    pub fn spawn(ctx: egui::Context) -> Self {
        let (command_tx, command_rx) = mpsc::channel::<Command>();
        let (result_tx, result_rx) = mpsc::channel();

        thread::spawn(move || {
            let mut decoder: Option<ImageRegionDecoder> = None;
            for command in command_rx {
                match command {
                    Command::Replace(next) => decoder = Some(*next),
                    Command::Decode(request) => {
                        let Some(decoder) = decoder.as_mut() else {
                            log::warn!("decode requested before an image was opened");
                            continue;
                        };
                        let result = decoder.decode_region(request.window, request.target);
                        let decoded = Decoded {
                            revision: request.revision,
                            result,
                        };
                        if result_tx.send(decoded).is_err() {
                            break;
                        }
                        ctx.request_repaint();
                    }
                }
            }
            log::debug!("decode worker stopped");
        });

        Self {
            command_tx,
            result_rx,
        }
    }

    /// Hands a freshly opened image to the worker.
    pub fn replace(&self, decoder: ImageRegionDecoder) {
        if self.command_tx.send(Command::Replace(Box::new(decoder))).is_err() {
            log::warn!("decode worker is gone; image not replaced");
        }
    }

    pub fn submit(&self, request: FrameRequest) {
        if self.command_tx.send(Command::Decode(request)).is_err() {
            log::warn!("decode worker is gone; frame request dropped");
        }
    }

    /// Returns the next finished decode, if any.
    pub fn poll(&self) -> Option<Decoded> {
        match self.result_rx.try_recv() {
            Ok(decoded) => Some(decoded),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("decode worker channel disconnected");
                None
            }
        }
    }
}
