//! CPAL audio output (requires std).
//!
//! The device asks for whatever buffer size it likes; the render engine
//! always works in fixed blocks. [`BlockAdapter`] sits between the two and
//! renders a new block whenever the previous one has been consumed.
//!
//! The adapter lives behind a shared slot so a running engine can move to
//! another device without being rebuilt.

use crate::lockfree::AtomicFlag;
use crate::render::RenderEngine;
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use std::sync::Arc;

/// Render engine shared by the callbacks of successive streams.
type SharedAdapter = Arc<Mutex<BlockAdapter>>;

/// Wrapper to hold `cpal::Stream` in a `Send` context.
///
/// # Safety
/// `cpal::Stream` is `!Send` due to platform internals. The stream is only
/// touched through its owning [`OutputStream`], which the engine keeps behind
/// a `Mutex`.
struct StreamHandle(cpal::Stream);

unsafe impl Send for StreamHandle {}

/// Summary of an output device.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDeviceInfo {
    pub index: usize,
    pub name: String,
    pub channels: u16,
    pub sample_rate: u32,
}

/// An output device chosen but not yet started.
pub struct OutputDevice {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
}

impl OutputDevice {
    /// Open the device at `index`, or the host default when `None`.
    pub fn open(index: Option<usize>) -> Result<Self> {
        let device = get_device(index)?;
        let config = device.default_output_config()?;
        Ok(Self { device, config })
    }

    /// Open a device for an engine that already runs at `sample_rate`.
    ///
    /// Takes the default config when its rate matches, otherwise the first
    /// supported range that covers the rate.
    pub fn open_at_rate(index: Option<usize>, sample_rate: u32) -> Result<Self> {
        let device = get_device(index)?;
        let default = device.default_output_config()?;
        if default.sample_rate().0 == sample_rate {
            return Ok(Self {
                device,
                config: default,
            });
        }

        let rate = cpal::SampleRate(sample_rate);
        let config = device
            .supported_output_configs()?
            .filter(|range| is_supported_format(range.sample_format()))
            .find(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
            .map(|range| range.with_sample_rate(rate))
            .ok_or_else(|| {
                let name = device.name().unwrap_or_else(|_| "unknown".into());
                Error::InvalidDevice(format!("{name} does not support {sample_rate} Hz"))
            })?;
        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate().0 as f64
    }

    pub fn channels(&self) -> usize {
        self.config.channels() as usize
    }

    pub fn name(&self) -> Result<String> {
        Ok(self.device.name()?)
    }

    /// Build and start the stream. The render engine moves onto the audio
    /// thread.
    pub fn start(self, engine: RenderEngine) -> Result<OutputStream> {
        self.start_shared(Arc::new(Mutex::new(BlockAdapter::new(engine))))
    }

    fn start_shared(self, adapter: SharedAdapter) -> Result<OutputStream> {
        let name = self.device.name().unwrap_or_else(|_| "unknown".into());
        let failed = Arc::new(AtomicFlag::default());
        let stream_config: cpal::StreamConfig = self.config.clone().into();
        let shared = Arc::clone(&adapter);

        let stream = match self.config.sample_format() {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&self.device, &stream_config, shared, Arc::clone(&failed))?
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&self.device, &stream_config, shared, Arc::clone(&failed))?
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&self.device, &stream_config, shared, Arc::clone(&failed))?
            }
            format => {
                return Err(Error::InvalidConfig(format!(
                    "Unsupported sample format: {format:?}"
                )));
            }
        };

        stream.play()?;

        Ok(OutputStream {
            sample_rate: self.sample_rate(),
            channels: self.channels(),
            device_name: name,
            failed,
            adapter,
            stream: StreamHandle(stream),
        })
    }
}

/// A running output stream. Dropping it stops audio.
pub struct OutputStream {
    sample_rate: f64,
    channels: usize,
    device_name: String,
    failed: Arc<AtomicFlag>,
    adapter: SharedAdapter,
    stream: StreamHandle,
}

impl OutputStream {
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// True once the host has reported a stream error.
    pub fn has_failed(&self) -> bool {
        self.failed.get()
    }

    /// Move the render engine onto `device`.
    ///
    /// This stream pauses first and resumes if the new one fails to start.
    pub fn switch_device(&mut self, device: OutputDevice) -> Result<()> {
        self.stream.0.pause()?;
        match device.start_shared(Arc::clone(&self.adapter)) {
            Ok(next) => {
                *self = next;
                Ok(())
            }
            Err(err) => {
                if let Err(resume) = self.stream.0.play() {
                    tracing::error!("could not resume previous output: {resume}");
                    self.failed.set(true);
                }
                Err(err)
            }
        }
    }
}

fn is_supported_format(format: cpal::SampleFormat) -> bool {
    matches!(
        format,
        cpal::SampleFormat::F32 | cpal::SampleFormat::I16 | cpal::SampleFormat::U16
    )
}

/// Enumerate output devices on the default host.
pub fn list_output_devices() -> Result<Vec<OutputDeviceInfo>> {
    cpal::default_host()
        .output_devices()?
        .enumerate()
        .map(|(index, device)| {
            let name = device.name()?;
            let (channels, sample_rate) = device
                .default_output_config()
                .map(|c| (c.channels(), c.sample_rate().0))
                .unwrap_or((0, 0));
            Ok(OutputDeviceInfo {
                index,
                name,
                channels,
                sample_rate,
            })
        })
        .collect()
}

fn get_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.output_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::InvalidDevice(format!("Device index {i} out of range ({count} available)"))
            })
        }
        None => host
            .default_output_device()
            .ok_or_else(|| Error::InvalidDevice("No output device available".into())),
    }
}

/// Serves frames one at a time from fixed-size render blocks.
struct BlockAdapter {
    engine: RenderEngine,
    block: Box<[f32]>,
    position: usize,
}

impl BlockAdapter {
    fn new(engine: RenderEngine) -> Self {
        let frames = engine.block_size();
        Self {
            engine,
            block: vec![0.0; frames * 2].into_boxed_slice(),
            position: frames,
        }
    }

    #[inline]
    fn next_frame(&mut self) -> (f32, f32) {
        if self.position * 2 >= self.block.len() {
            self.engine.process_block(&mut self.block);
            self.position = 0;
        }
        let i = self.position * 2;
        self.position += 1;
        (self.block[i], self.block[i + 1])
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    adapter: SharedAdapter,
    failed: Arc<AtomicFlag>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            render_callback(data, channels, &adapter);
        },
        move |err| {
            tracing::error!("output stream error: {err}");
            failed.set(true);
        },
        None,
    )?;

    Ok(stream)
}

/// Fill one device buffer. Silence while another stream's callback holds the
/// adapter, or if rendering panicked.
#[inline]
fn render_callback<T: cpal::SizedSample + cpal::FromSample<f32>>(
    data: &mut [T],
    channels: usize,
    adapter: &Mutex<BlockAdapter>,
) {
    let Some(mut adapter) = adapter.try_lock() else {
        output_silence(data);
        return;
    };
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        write_output(data, channels, &mut adapter);
    }));

    if result.is_err() {
        output_silence(data);
    }
}

/// Pull stereo frames from the adapter and write them in the device format.
/// Mono devices get the average of both channels; extra channels are silent.
#[inline]
fn write_output<T: cpal::SizedSample + cpal::FromSample<f32>>(
    data: &mut [T],
    channels: usize,
    adapter: &mut BlockAdapter,
) {
    for frame in data.chunks_mut(channels) {
        let (left, right) = adapter.next_frame();
        if channels == 1 {
            frame[0] = T::from_sample(0.5 * (left + right));
            continue;
        }
        for (ch, sample) in frame.iter_mut().enumerate() {
            let value = match ch {
                0 => left,
                1 => right,
                _ => 0.0,
            };
            *sample = T::from_sample(value);
        }
    }
}

/// Output silence (panic recovery).
#[inline]
fn output_silence<T: cpal::SizedSample + cpal::FromSample<f32>>(data: &mut [T]) {
    for sample in data.iter_mut() {
        *sample = T::from_sample(0.0);
    }
}
