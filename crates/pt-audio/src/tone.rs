use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use pt_core::config::AudioConfig;
use triple_buffer::TripleBuffer;

use crate::error::AudioError;
use crate::osc::Oscillator;

/// Paire (fréquence, volume) publiée par la boucle d'acquisition et
/// consommée par le callback temps réel via triple buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ToneParams {
    /// Fréquence du ton, en Hz.
    pub frequency: f32,
    /// Volume du ton, dans [0, 1].
    pub volume: f32,
}

/// Map detector-domain values to tone parameters.
///
/// Pure: `ratio = clamp(strength / max_expected_strength, 0, 1)`, then
/// frequency and volume are linear in `ratio` between their min/max.
///
/// # Example
/// ```
/// use pt_audio::tone::map_signal;
/// use pt_core::config::DetectorConfig;
///
/// let cfg = DetectorConfig::default().audio;
/// let silent = map_signal(&cfg, 0.0);
/// assert!((silent.frequency - cfg.min_freq).abs() < f32::EPSILON);
/// assert!((silent.volume - cfg.min_volume).abs() < f32::EPSILON);
/// ```
#[must_use]
pub fn map_signal(config: &AudioConfig, strength: f64) -> ToneParams {
    let ratio = (strength / config.max_expected_strength).clamp(0.0, 1.0) as f32;
    ToneParams {
        frequency: config.min_freq + (config.max_freq - config.min_freq) * ratio,
        volume: config.min_volume + (config.max_volume - config.min_volume) * ratio,
    }
}

/// Poignée côté acquisition du ton continu.
///
/// Toutes les opérations sont wait-free : une écriture triple buffer
/// plus des stores atomiques. Rien ici ne peut bloquer le callback audio.
pub struct ToneControl {
    input: triple_buffer::Input<ToneParams>,
    playing: Arc<AtomicBool>,
    epoch: Arc<AtomicUsize>,
    current: ToneParams,
    config: AudioConfig,
}

impl ToneControl {
    fn new(
        input: triple_buffer::Input<ToneParams>,
        playing: Arc<AtomicBool>,
        epoch: Arc<AtomicUsize>,
        config: AudioConfig,
    ) -> Self {
        let current = ToneParams {
            frequency: config.min_freq,
            volume: 0.0,
        };
        Self {
            input,
            playing,
            epoch,
            current,
            config,
        }
    }

    /// Update the tone frequency; audible from the next block.
    pub fn set_frequency(&mut self, hz: f32) {
        self.current.frequency = hz;
        self.input.write(self.current);
    }

    /// Update the tone volume, clamped to [0, 1]; audible from the next block.
    pub fn set_volume(&mut self, volume: f32) {
        self.current.volume = volume.clamp(0.0, 1.0);
        self.input.write(self.current);
    }

    /// Map a detector signal to (frequency, volume) and publish it.
    ///
    /// Starts the tone when it is not already playing, matching the
    /// hands-on behavior of the detector: any signal makes sound. The
    /// shape ratio is accepted for the collaborator interface but does
    /// not influence the mapping, which is driven by strength alone.
    pub fn apply_signal(&mut self, strength: f64, _shape_ratio: f64) {
        self.current = map_signal(&self.config, strength);
        self.input.write(self.current);
        self.start();
    }

    /// Begin tone generation; no-op when already playing.
    ///
    /// Bumps the reset epoch before raising the playing flag, so the
    /// generator restarts from phase 0 even when stop and start land
    /// inside the same block period, with no silent block in between.
    pub fn start(&mut self) {
        if !self.playing.load(Ordering::Acquire) {
            self.epoch.fetch_add(1, Ordering::Release);
            self.playing.store(true, Ordering::Release);
        }
    }

    /// Halt tone generation; no-op when already stopped. Silent from the
    /// start of the next block.
    pub fn stop(&mut self) {
        self.playing.store(false, Ordering::Release);
    }

    /// `true` while the tone is being generated.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }
}

/// Côté callback du ton continu : oscillateur, derniers paramètres,
/// drapeau playing et époque de reset.
struct ToneRenderer {
    osc: Oscillator,
    params: triple_buffer::Output<ToneParams>,
    playing: Arc<AtomicBool>,
    epoch: Arc<AtomicUsize>,
    seen_epoch: usize,
}

impl ToneRenderer {
    /// Generate one block: apply the latest params (between blocks,
    /// never mid-block), honor any pending phase reset, then fill or
    /// silence.
    fn render(&mut self, data: &mut [f32]) {
        let params = *self.params.read();
        self.osc.set_frequency(params.frequency);
        self.osc.set_volume(params.volume);

        let epoch = self.epoch.load(Ordering::Acquire);
        if epoch != self.seen_epoch {
            self.seen_epoch = epoch;
            self.osc.reset();
        }

        if self.playing.load(Ordering::Acquire) {
            self.osc.fill(data);
        } else {
            data.fill(0.0);
            self.osc.reset();
        }
    }
}

/// Build the renderer/control pair around a fresh triple buffer.
fn split_tone(config: &AudioConfig) -> (ToneRenderer, ToneControl) {
    let initial = ToneParams {
        frequency: config.min_freq,
        volume: 0.0,
    };
    let (input, output) = TripleBuffer::new(&initial).split();
    let playing = Arc::new(AtomicBool::new(false));
    let epoch = Arc::new(AtomicUsize::new(0));

    let renderer = ToneRenderer {
        osc: Oscillator::new(config.sample_rate),
        params: output,
        playing: Arc::clone(&playing),
        epoch: Arc::clone(&epoch),
        seen_epoch: 0,
    };
    let control = ToneControl::new(input, playing, epoch, config.clone());
    (renderer, control)
}

/// Flux de sortie continu : possède le stream cpal et le garde vivant.
///
/// Le callback possède le rendu complet (oscillateur, sortie du triple
/// buffer, drapeaux) ; il applique les derniers paramètres entre deux
/// blocs, génère quand `playing` est vrai, sinon écrit du silence et
/// remet la phase à zéro.
pub struct ToneOutput {
    _stream: cpal::Stream,
}

impl ToneOutput {
    /// Build the output stream once and hand back the acquisition-side
    /// control handle.
    ///
    /// # Errors
    /// Returns an error if no output device exists or the stream cannot
    /// be built or started.
    pub fn start(config: &AudioConfig) -> Result<(Self, ToneControl), AudioError> {
        let (mut renderer, control) = split_tone(config);

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let stream_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    renderer.render(data);
                },
                |err| {
                    log::error!("Erreur de stream audio : {err}");
                },
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        log::info!("Sortie ton continue démarrée @ {}Hz", config.sample_rate);

        Ok((Self { _stream: stream }, control))
    }
}
