//! Manual render driver for tests and offline bouncing.
//!
//! Stands in for the output device: each call runs the render engine exactly
//! as the device callback would, but on the caller's thread and schedule.

use crate::input::InputWriter;
use crate::render::RenderEngine;

pub struct OfflineDriver {
    engine: RenderEngine,
    input: Option<InputWriter>,
    block: Box<[f32]>,
}

impl OfflineDriver {
    pub fn new(engine: RenderEngine) -> Self {
        let block = vec![0.0; engine.block_size() * 2].into_boxed_slice();
        Self {
            engine,
            input: None,
            block,
        }
    }

    pub fn block_size(&self) -> usize {
        self.engine.block_size()
    }

    /// Absolute frame of the next block.
    pub fn now(&self) -> u64 {
        self.engine.now()
    }

    /// Keep the writer end of an input channel so tests can feed audio
    /// block by block with [`render_with_input`](Self::render_with_input).
    pub fn set_input_writer(&mut self, writer: InputWriter) {
        self.input = Some(writer);
    }

    pub fn input_writer(&mut self) -> Option<&mut InputWriter> {
        self.input.as_mut()
    }

    /// Render one block and return it as interleaved stereo.
    pub fn render_block(&mut self) -> &[f32] {
        self.engine.process_block(&mut self.block);
        &self.block
    }

    /// Render `blocks` blocks and return the interleaved stereo output.
    pub fn render_blocks(&mut self, blocks: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(blocks * self.block.len());
        for _ in 0..blocks {
            self.engine.process_block(&mut self.block);
            out.extend_from_slice(&self.block);
        }
        out
    }

    /// Render until the clock reaches at least `frame`.
    pub fn render_until(&mut self, frame: u64) -> Vec<f32> {
        let mut out = Vec::new();
        while self.engine.now() < frame {
            self.engine.process_block(&mut self.block);
            out.extend_from_slice(&self.block);
        }
        out
    }

    /// Push one block of interleaved input (from `source`, called with the
    /// absolute frame and channel count) before rendering each block.
    pub fn render_with_input<F>(&mut self, blocks: usize, mut source: F) -> Vec<f32>
    where
        F: FnMut(u64, usize) -> Vec<f32>,
    {
        let mut out = Vec::with_capacity(blocks * self.block.len());
        for _ in 0..blocks {
            if let Some(writer) = self.input.as_mut() {
                let samples = source(self.engine.now(), writer.channels());
                writer.push_interleaved(&samples);
            }
            self.engine.process_block(&mut self.block);
            out.extend_from_slice(&self.block);
        }
        out
    }
}
