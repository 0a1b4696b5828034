use std::thread;

use anyhow::Result;
use pt_dsp::extract::Trigger;

/// Message de la file d'annonces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announce {
    /// Un code de conductivité à annoncer.
    Code(Trigger),
    /// Sentinelle d'arrêt du worker.
    Quit,
}

/// Couture vers les collaborateurs voix/WAV : reçoit le code à deux
/// chiffres, décide comment le restituer.
pub trait Announcer: Send + 'static {
    /// Restitue un code de conductivité ("00".."99").
    fn announce(&mut self, code: &str);
}

/// Annonceur par défaut : trace le code au niveau info. La lecture
/// vocale/WAV réelle vit hors de ce workspace.
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&mut self, code: &str) {
        log::info!("Conductivité détectée : {code}");
    }
}

/// Poignée du worker d'annonces : envoie la sentinelle puis join.
pub struct AnnouncerHandle {
    tx: flume::Sender<Announce>,
    thread: Option<thread::JoinHandle<()>>,
}

impl AnnouncerHandle {
    /// Stop the worker and wait for it to drain.
    pub fn stop(mut self) {
        let _ = self.tx.send(Announce::Quit);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Spawn the announcement worker thread with a bounded queue.
///
/// Le producteur (boucle d'acquisition) utilise `try_send` : une file
/// pleine fait tomber l'annonce, jamais bloquer l'acquisition.
///
/// # Errors
/// Returns an error if the worker thread cannot be spawned.
pub fn spawn_announcer(
    capacity: usize,
    mut announcer: impl Announcer,
) -> Result<(flume::Sender<Announce>, AnnouncerHandle)> {
    let (tx, rx) = flume::bounded::<Announce>(capacity.max(1));

    let thread = thread::Builder::new()
        .name("pt-announce".to_string())
        .spawn(move || {
            // Un Quit ou la déconnexion de tous les senders termine
            while let Ok(msg) = rx.recv() {
                match msg {
                    Announce::Code(trigger) => announcer.announce(&trigger.to_string()),
                    Announce::Quit => break,
                }
            }
        })?;

    let handle = AnnouncerHandle {
        tx: tx.clone(),
        thread: Some(thread),
    };
    Ok((tx, handle))
}
