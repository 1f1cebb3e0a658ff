//! CPAL input stream feeding an [`InputWriter`].
//!
//! The device callback converts to `f32` and pushes interleaved frames into
//! the input ring; the render engine reads them back one block at a time
//! through the matching [`InputFeed`].

use crate::device::{get_device, InputDeviceInfo};
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use std::sync::Arc;
use tapedeck_core::{input_channel, InputFeed, InputStatus, InputWriter};

/// Wrapper to hold `cpal::Stream` in a `Send` context.
///
/// # Safety
/// `cpal::Stream` is `!Send` due to platform internals. The stream is only
/// created, held and dropped by its owning [`InputStream`], which the engine
/// keeps behind a `Mutex`.
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

unsafe impl Send for StreamHandle {}

/// A running input stream. Dropping it closes the device.
pub struct InputStream {
    info: InputDeviceInfo,
    sample_rate: u32,
    status: Arc<InputStatus>,
    _stream: StreamHandle,
}

impl InputStream {
    /// Open an input device and start capturing.
    ///
    /// Returns the stream together with the feed to attach to the render
    /// engine. The ring holds `buffer_seconds` of audio; the feed reads
    /// `block_size` frames per render block.
    pub fn open(
        device_index: Option<usize>,
        buffer_seconds: f64,
        block_size: usize,
    ) -> Result<(InputStream, InputFeed)> {
        let (index, device) = get_device(device_index)?;
        let config = device.default_input_config()?;
        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        let capacity = (buffer_seconds * sample_rate as f64).ceil() as usize;

        let (writer, feed) = input_channel(channels, capacity, block_size);
        let status = Arc::clone(writer.status());
        let stream_config: cpal::StreamConfig = config.clone().into();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, writer)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, writer)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, writer)?,
            format => return Err(Error::UnsupportedFormat(format!("{format:?}"))),
        };
        stream.play()?;

        let info = InputDeviceInfo {
            index,
            name: device.name()?,
            channels: channels as u16,
            sample_rates: vec![sample_rate],
        };
        tracing::info!(
            device = %info.name,
            channels,
            sample_rate,
            "input stream opened"
        );

        Ok((
            InputStream {
                info,
                sample_rate,
                status,
                _stream: StreamHandle(stream),
            },
            feed,
        ))
    }

    pub fn info(&self) -> &InputDeviceInfo {
        &self.info
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn status(&self) -> &Arc<InputStatus> {
        &self.status
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut writer: InputWriter,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    let status = Arc::clone(writer.status());

    // Grows on the first callback, then stable.
    let mut scratch = Vec::<f32>::new();

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            push_converted(data, &mut scratch, &mut writer);
        },
        move |err| {
            tracing::warn!("input stream error: {err}");
            status.mark_lost();
        },
        None,
    )?;

    Ok(stream)
}

/// Convert device samples to `f32` and push them into the ring.
#[inline]
fn push_converted<T>(data: &[T], scratch: &mut Vec<f32>, writer: &mut InputWriter) -> usize
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    if scratch.len() < data.len() {
        scratch.resize(data.len(), 0.0);
    }
    for (out, &sample) in scratch.iter_mut().zip(data.iter()) {
        *out = <f32 as cpal::FromSample<T>>::from_sample_(sample);
    }
    writer.push_interleaved(&scratch[..data.len()])
}
