//! Background music playback.
//!
//! `BackgroundMusic` is the real [`MediaResource`]. A dedicated thread owns the
//! decoded track and the `cpal` output stream (streams cannot leave the thread
//! that created them). On the first play request the thread decodes the whole
//! file with FFmpeg, resampled to the output device's rate, and opens a stream
//! that loops the track. Pausing only silences the stream. Dropping the
//! player cancels a decode still in progress before joining the thread.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ffmpeg_next as ffmpeg;
use tokio::sync::oneshot;

use super::errors::MediaError;
use super::music::{MediaResource, PlayReply};
use log::{info, error, warn, debug};

/// Capacity of each frame drained from the resampler at end of stream.
const FLUSH_CHUNK_SAMPLES: usize = 4096;

enum PlayerCommand {
    Play(oneshot::Sender<Result<(), MediaError>>),
    Pause,
    Shutdown,
}

/// Interleaved f32 samples of a fully decoded track.
#[derive(Debug)]
struct Track {
    samples: Vec<f32>,
    channels: usize,
}

impl Track {
    fn new(samples: Vec<f32>, channels: usize) -> Result<Self, MediaError> {
        let channels = channels.max(1);
        if samples.len() < channels {
            return Err(MediaError::Generic("decoded track contains no audio".to_string()));
        }
        Ok(Self { samples, channels })
    }

    fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// Sample for output channel `channel` of `frame`; extra output channels repeat the last track channel.
    fn sample(&self, frame: usize, channel: usize) -> f32 {
        self.samples[frame * self.channels + channel.min(self.channels - 1)]
    }

    /// Writes interleaved frames into `out`, looping at the end of the track.
    /// Returns the frame to continue from.
    fn fill<T: cpal::Sample + cpal::FromSample<f32>>(&self, out: &mut [T], out_channels: usize, mut frame: usize) -> usize {
        for out_frame in out.chunks_mut(out_channels.max(1)) {
            for (channel, sample) in out_frame.iter_mut().enumerate() {
                *sample = T::from_sample(self.sample(frame, channel));
            }
            frame = (frame + 1) % self.frames();
        }
        frame
    }
}

/// State shared with the audio callback.
struct PlaybackShared {
    paused: AtomicBool,
    frame: AtomicUsize,
}

/// An open output stream looping one track.
struct LoopingOutput {
    shared: Arc<PlaybackShared>,
    _stream: cpal::Stream,
}

impl LoopingOutput {
    fn open(path: &Path, cancel: &AtomicBool) -> Result<Self, MediaError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| MediaError::PlayRejected("no audio output device found".to_string()))?;
        let supported = device
            .default_output_config()
            .map_err(|e| MediaError::AudioDevice(format!("failed to get output config: {}", e)))?;
        let sample_rate = supported.sample_rate().0;
        let out_channels = supported.channels();
        debug!("Audio output device: {} Hz, {} channel(s), {:?}", sample_rate, out_channels, supported.sample_format());

        let track = Arc::new(decode_track(path, sample_rate, out_channels, cancel)?);
        info!("Decoded background music '{}': {} frame(s).", path.display(), track.frames());

        let shared = Arc::new(PlaybackShared { paused: AtomicBool::new(true), frame: AtomicUsize::new(0) });
        let config: cpal::StreamConfig = supported.config();
        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, track, shared.clone())?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, track, shared.clone())?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, track, shared.clone())?,
            other => return Err(MediaError::AudioDevice(format!("unsupported sample format {:?}", other))),
        };
        stream
            .play()
            .map_err(|e| MediaError::PlayRejected(format!("failed to start output stream: {}", e)))?;
        Ok(Self { shared, _stream: stream })
    }

    fn resume(&self) {
        self.shared.paused.store(false, Ordering::Relaxed);
    }

    fn pause(&self) {
        self.shared.paused.store(true, Ordering::Relaxed);
    }
}

fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    track: Arc<Track>,
    shared: Arc<PlaybackShared>,
) -> Result<cpal::Stream, MediaError> {
    let out_channels = config.channels as usize;
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if shared.paused.load(Ordering::Relaxed) {
                    data.iter_mut().for_each(|s| *s = T::from_sample(0.0f32));
                    return;
                }
                let start = shared.frame.load(Ordering::Relaxed);
                let next = track.fill(data, out_channels, start);
                shared.frame.store(next, Ordering::Relaxed);
            },
            |err| error!("Audio output error: {}", err),
            None,
        )
        .map_err(|e| MediaError::AudioDevice(format!("failed to build output stream: {}", e)))
}

fn cancelled() -> MediaError {
    MediaError::Generic("background music decode cancelled".to_string())
}

/// Decodes `path` into packed f32 at `sample_rate`, mono or stereo depending on `out_channels`.
/// Gives up between packets once `cancel` is set.
fn decode_track(path: &Path, sample_rate: u32, out_channels: u16, cancel: &AtomicBool) -> Result<Track, MediaError> {
    if cancel.load(Ordering::Relaxed) {
        return Err(cancelled());
    }
    ffmpeg::init()?;
    let mut ictx = ffmpeg::format::input(&path)?;
    let (stream_index, mut decoder) = {
        let input = ictx
            .streams()
            .best(ffmpeg::media::Type::Audio)
            .ok_or(MediaError::Ffmpeg(ffmpeg::Error::StreamNotFound))?;
        let context = ffmpeg::codec::context::Context::from_parameters(input.parameters())?;
        (input.index(), context.decoder().audio()?)
    };

    let (layout, track_channels) = match out_channels {
        1 => (ffmpeg::ChannelLayout::MONO, 1),
        _ => (ffmpeg::ChannelLayout::STEREO, 2),
    };
    let source_layout = match decoder.channel_layout() {
        l if l.is_empty() => ffmpeg::ChannelLayout::default(i32::from(decoder.channels())),
        l => l,
    };
    let mut resampler = ffmpeg::software::resampling::Context::get(
        decoder.format(),
        source_layout,
        decoder.rate(),
        ffmpeg::format::Sample::F32(ffmpeg::format::sample::Type::Packed),
        layout,
        sample_rate,
    )?;

    let mut samples = Vec::new();
    for (stream, packet) in ictx.packets() {
        if cancel.load(Ordering::Relaxed) {
            return Err(cancelled());
        }
        if stream.index() != stream_index {
            continue;
        }
        if let Err(e) = decoder.send_packet(&packet) {
            warn!("Skipping undecodable audio packet in '{}': {}", path.display(), e);
            continue;
        }
        drain_decoder(&mut decoder, &mut resampler, track_channels, &mut samples)?;
    }
    decoder.send_eof()?;
    drain_decoder(&mut decoder, &mut resampler, track_channels, &mut samples)?;
    flush_resampler(&mut resampler, layout, sample_rate, track_channels, &mut samples)?;
    Track::new(samples, track_channels)
}

/// Collects the samples the resampler still buffers after the last frame.
fn flush_resampler(
    resampler: &mut ffmpeg::software::resampling::Context,
    layout: ffmpeg::ChannelLayout,
    sample_rate: u32,
    channels: usize,
    out: &mut Vec<f32>,
) -> Result<(), MediaError> {
    loop {
        let mut tail = ffmpeg::frame::Audio::new(
            ffmpeg::format::Sample::F32(ffmpeg::format::sample::Type::Packed),
            FLUSH_CHUNK_SAMPLES,
            layout,
        );
        tail.set_rate(sample_rate);
        resampler.flush(&mut tail)?;
        if tail.samples() == 0 {
            return Ok(());
        }
        append_packed(&tail, channels, out);
    }
}

fn append_packed(frame: &ffmpeg::frame::Audio, channels: usize, out: &mut Vec<f32>) {
    let wanted = frame.samples() * channels;
    out.extend(
        frame
            .data(0)
            .chunks_exact(4)
            .take(wanted)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]])),
    );
}

fn drain_decoder(
    decoder: &mut ffmpeg::decoder::Audio,
    resampler: &mut ffmpeg::software::resampling::Context,
    channels: usize,
    out: &mut Vec<f32>,
) -> Result<(), MediaError> {
    let mut decoded = ffmpeg::frame::Audio::empty();
    while decoder.receive_frame(&mut decoded).is_ok() {
        let mut resampled = ffmpeg::frame::Audio::empty();
        resampler.run(&decoded, &mut resampled)?;
        append_packed(&resampled, channels, out);
    }
    Ok(())
}

fn player_loop(path: PathBuf, commands: std_mpsc::Receiver<PlayerCommand>, cancel: Arc<AtomicBool>) {
    let mut output: Option<LoopingOutput> = None;
    while let Ok(command) = commands.recv() {
        match command {
            PlayerCommand::Play(reply) => {
                if output.is_none() {
                    match LoopingOutput::open(&path, &cancel) {
                        Ok(opened) => output = Some(opened),
                        Err(e) => {
                            error!("Cannot open background music '{}': {}", path.display(), e);
                            let _ = reply.send(Err(e));
                            continue;
                        }
                    }
                }
                if let Some(out) = &output {
                    out.resume();
                }
                let _ = reply.send(Ok(()));
            }
            PlayerCommand::Pause => {
                if let Some(out) = &output {
                    out.pause();
                }
            }
            PlayerCommand::Shutdown => break,
        }
    }
    debug!("Background music thread finished.");
}

/// Background music backed by an audio file, or nothing when none is configured.
pub struct BackgroundMusic {
    command_tx: Option<std_mpsc::Sender<PlayerCommand>>,
    cancel: Arc<AtomicBool>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl BackgroundMusic {
    /// Prepares playback of `path`. Nothing is decoded or opened until the first play request.
    ///
    /// # Errors
    /// Returns `MediaError::Io` if the file does not exist or the player thread cannot be spawned.
    #[must_use = "preparing background music can fail; the Result must be handled"]
    pub fn new(path: &Path) -> Result<Self, MediaError> {
        std::fs::metadata(path)?;
        let (command_tx, command_rx) = std_mpsc::channel();
        let thread_path = path.to_path_buf();
        let cancel = Arc::new(AtomicBool::new(false));
        let thread_cancel = cancel.clone();
        debug!("Spawning background music thread for: {}", path.display());
        let thread_handle = thread::Builder::new()
            .name("background-music".to_string())
            .spawn(move || player_loop(thread_path, command_rx, thread_cancel))?;
        Ok(Self { command_tx: Some(command_tx), cancel, thread_handle: Some(thread_handle) })
    }

    /// A resource that rejects every play request.
    pub fn silent() -> Self {
        Self { command_tx: None, cancel: Arc::new(AtomicBool::new(false)), thread_handle: None }
    }
}

impl MediaResource for BackgroundMusic {
    fn play(&mut self) -> PlayReply {
        let (reply_tx, reply_rx) = oneshot::channel();
        match &self.command_tx {
            None => {
                let _ = reply_tx.send(Err(MediaError::PlayRejected("no background music configured".to_string())));
            }
            Some(tx) => {
                if let Err(std_mpsc::SendError(PlayerCommand::Play(reply_tx))) = tx.send(PlayerCommand::Play(reply_tx)) {
                    let _ = reply_tx.send(Err(MediaError::ChannelClosed("background music thread stopped".to_string())));
                }
            }
        }
        reply_rx
    }

    fn pause(&mut self) {
        if let Some(tx) = &self.command_tx {
            if tx.send(PlayerCommand::Pause).is_err() {
                warn!("Pause ignored: background music thread stopped.");
            }
        }
    }
}

impl Drop for BackgroundMusic {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(PlayerCommand::Shutdown);
        }
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                error!("Error joining background music thread: {:?}", e);
            }
        }
    }
}
