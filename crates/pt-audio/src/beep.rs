use std::f64::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::error::AudioError;

/// Bip one-shot : synthétise un buffer complet (phase 0) et le joue
/// jusqu'au bout sur un stream dédié, indépendamment du ton continu.
///
/// Bloque l'appelant jusqu'à la fin de la lecture. Utilisé comme
/// auto-test sonore au démarrage.
///
/// # Errors
/// Returns an error if no output device exists or the stream cannot be
/// built or started.
pub fn beep(
    sample_rate: u32,
    frequency: f32,
    duration_secs: f32,
    volume: f32,
) -> Result<(), AudioError> {
    let samples = synth_beep(sample_rate, frequency, duration_secs, volume);
    let total = samples.len();
    let samples = Arc::new(samples);
    let pos = Arc::new(AtomicUsize::new(0));
    let pos_cb = Arc::clone(&pos);

    // Signalé une fois le buffer entièrement consommé
    let (done_tx, done_rx) = flume::bounded::<()>(1);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(AudioError::NoOutputDevice)?;

    let stream_config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut p = pos_cb.load(Ordering::Relaxed);
                for sample in data.iter_mut() {
                    *sample = samples.get(p).copied().unwrap_or(0.0);
                    p += 1;
                }
                pos_cb.store(p, Ordering::Relaxed);
                if p >= total {
                    let _ = done_tx.try_send(());
                }
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

    let timeout = Duration::from_secs_f32(duration_secs.clamp(0.0, 60.0)) + Duration::from_millis(500);
    let _ = done_rx.recv_timeout(timeout);
    Ok(())
}

/// Synthèse du buffer de bip : sinus à phase initiale nulle.
fn synth_beep(sample_rate: u32, frequency: f32, duration_secs: f32, volume: f32) -> Vec<f32> {
    let frames = (f64::from(sample_rate) * f64::from(duration_secs.max(0.0))) as usize;
    let step = TAU * f64::from(frequency) / f64::from(sample_rate);
    let volume = f64::from(volume.clamp(0.0, 1.0));
    (0..frames)
        .map(|i| (volume * (step * i as f64).sin()) as f32)
        .collect()
}
