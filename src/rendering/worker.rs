use crate::card::RenderTarget;
use crate::rendering::{CardRasterizer, RasterImage, RasterOptions, Rasterizer};
use crate::{Error, Result};
use async_trait::async_trait;
use log::debug;
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Rasterize(Box<RenderTarget>, RasterOptions, oneshot::Sender<Result<RasterImage>>),
    Close(oneshot::Sender<()>),
}

/// An async rasterizer backed by a dedicated worker thread.
///
/// The worker thread owns a `CardRasterizer` and executes jobs in order.
/// A job that has started always runs to completion: dropping the future
/// returned by [`Rasterizer::rasterize`] only discards the result.
#[derive(Clone)]
pub struct RasterWorker {
    cmd_tx: Sender<Command>,
}

impl RasterWorker {
    /// Spawn the worker thread.
    pub fn spawn() -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

        thread::Builder::new()
            .name("cartaz-raster".into())
            .spawn(move || {
                let rasterizer = CardRasterizer::new();
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        Command::Rasterize(target, options, resp) => {
                            let res = rasterizer.render(&target, &options);
                            let _ = resp.send(res);
                        }
                        Command::Close(resp) => {
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
                debug!("raster worker stopped");
            })
            .map_err(|e| Error::Other(format!("Failed to spawn raster worker: {}", e)))?;

        Ok(Self { cmd_tx })
    }

    /// Stop the worker once queued jobs are done.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Close(tx))
            .map_err(|_| Error::Other("Raster worker already stopped".into()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))
    }
}

#[async_trait]
impl Rasterizer for RasterWorker {
    async fn rasterize(&self, target: &RenderTarget, options: &RasterOptions) -> Result<RasterImage> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Rasterize(Box::new(target.clone()), options.clone(), tx))
            .map_err(|_| Error::RasterizationFailed("raster worker is not running".into()))?;
        rx.await
            .map_err(|e| Error::RasterizationFailed(format!("Rasterize canceled: {}", e)))?
    }
}
