//! Terminal application loop
//!
//! Reads lines from stdin on a background task, forwards them to the turn
//! controller, polls the running reveal on a fixed tick and writes whatever
//! the engine publishes to stdout.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use chat_core::{AnswerBackend, EngineMessage, SurfaceEvent, TurnController};

use crate::input::parse_line;
use crate::render::Renderer;

/// Reveal polling interval
const TICK: Duration = Duration::from_millis(10);

/// Terminal surface driving one controller
pub struct App<B: AnswerBackend> {
    controller: TurnController<B>,
    engine_rx: mpsc::Receiver<EngineMessage>,
    renderer: Renderer,
    running: bool,
}

impl<B: AnswerBackend> App<B> {
    /// Create the app around a controller and its message channel
    pub fn new(controller: TurnController<B>, engine_rx: mpsc::Receiver<EngineMessage>) -> Self {
        Self {
            controller,
            engine_rx,
            renderer: Renderer::new(),
            running: true,
        }
    }

    /// Run until `/quit`, end of input or Ctrl+C
    pub async fn run<W: AsyncWrite + Unpin>(
        &mut self,
        mut line_rx: mpsc::Receiver<String>,
        out: &mut W,
    ) -> Result<()> {
        let mut tick = tokio::time::interval(TICK);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Created once so a signal that arrives mid-request is not lost
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        while self.running {
            tokio::select! {
                line = line_rx.recv() => match line {
                    Some(line) => match parse_line(&line, self.controller.is_progressing()) {
                        Some(SurfaceEvent::Submit { text }) => {
                            self.dispatch(text, &mut line_rx, &mut ctrl_c, out).await?;
                        }
                        Some(event) => self.handle_event(event).await,
                        None => {}
                    },
                    None => {
                        tracing::debug!("Input closed");
                        self.handle_event(SurfaceEvent::Quit).await;
                    }
                },

                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    self.handle_event(SurfaceEvent::Quit).await;
                }

                _ = tick.tick() => {
                    self.controller.poll_reveal().await;
                }
            }

            self.flush_messages(out).await?;
        }

        Ok(())
    }

    async fn handle_event(&mut self, event: SurfaceEvent) {
        if event == SurfaceEvent::Quit {
            self.running = false;
        }
        self.controller.handle_event(event).await;
    }

    /// Submit a question, writing engine messages and watching for quit
    /// while the service is asked
    async fn dispatch<W, C>(
        &mut self,
        text: String,
        line_rx: &mut mpsc::Receiver<String>,
        ctrl_c: &mut Pin<&mut C>,
        out: &mut W,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
        C: Future<Output = std::io::Result<()>>,
    {
        let Self {
            controller,
            engine_rx,
            renderer,
            running,
        } = self;

        let quit = {
            let submit = controller.submit(text);
            tokio::pin!(submit);

            loop {
                tokio::select! {
                    outcome = &mut submit => {
                        tracing::debug!(?outcome, "Submit finished");
                        break false;
                    }

                    Some(msg) = engine_rx.recv() => {
                        write_text(out, &renderer.apply(&msg)).await?;
                    }

                    _ = ctrl_c.as_mut() => {
                        tracing::info!("Received Ctrl+C, abandoning request");
                        break true;
                    }

                    line = line_rx.recv() => match line.as_deref().map(|l| parse_line(l, false)) {
                        Some(Some(SurfaceEvent::Quit)) | None => break true,
                        Some(Some(_)) => tracing::warn!("Still waiting for an answer, input ignored"),
                        Some(None) => {}
                    },
                }
            }
        };

        if quit {
            *running = false;
            controller.shutdown().await;
        }
        Ok(())
    }

    /// Write all pending engine messages
    async fn flush_messages<W: AsyncWrite + Unpin>(&mut self, out: &mut W) -> Result<()> {
        let mut text = String::new();
        while let Ok(msg) = self.engine_rx.try_recv() {
            text.push_str(&self.renderer.apply(&msg));
        }
        write_text(out, &text).await
    }
}

async fn write_text<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<()> {
    if !text.is_empty() {
        out.write_all(text.as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}

/// Forward stdin lines until end of input
pub fn spawn_stdin_reader(buffer: usize) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(buffer);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read input");
                    break;
                }
            }
        }
    });
    rx
}
