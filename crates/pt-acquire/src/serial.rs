use std::io::{BufRead, BufReader, ErrorKind};
use std::time::Duration;

use serialport::{DataBits, Parity, SerialPort, StopBits};

use crate::error::AcquireError;

/// Fournit des lignes de texte à la boucle d'acquisition.
///
/// `Ok(None)` signale un timeout sans donnée complète — la boucle
/// re-vérifie son drapeau d'arrêt puis retente. Implémenté par
/// `SerialSource` en production, par des sources scriptées dans les
/// tests.
pub trait LineSource: Send + 'static {
    /// Next newline-terminated line, stripped, or `None` on timeout.
    ///
    /// # Errors
    /// `Channel` on a read failure worth a backoff retry.
    fn read_line(&mut self) -> Result<Option<String>, AcquireError>;
}

/// Canal série du détecteur : 8N1, timeout de lecture borné.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use pt_acquire::serial::SerialSource;
/// let source = SerialSource::open("/dev/ttyACM0", 230_400, Duration::from_secs(1)).unwrap();
/// ```
pub struct SerialSource {
    reader: BufReader<Box<dyn SerialPort>>,
}

impl SerialSource {
    /// Open the serial device.
    ///
    /// # Errors
    /// Returns `Open` when the device cannot be opened at the requested
    /// baud rate.
    pub fn open(device: &str, baud: u32, timeout: Duration) -> Result<Self, AcquireError> {
        let port = serialport::new(device, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(timeout)
            .open()
            .map_err(|source| AcquireError::Open {
                device: device.to_string(),
                source,
            })?;

        log::info!("Port série initialisé : {device} @ {baud} bauds");
        Ok(Self {
            reader: BufReader::new(port),
        })
    }
}

/// Read one line from a buffered stream, serial-flavored.
///
/// EOF is an error here, not a quiet `None` : un port série vivant ne
/// renvoie jamais 0 octet, donc un EOF signifie flux fermé (câble
/// débranché, pseudo-terminal disparu) et mérite le backoff de la
/// boucle de lecture au lieu d'une re-tentative immédiate.
fn next_line(reader: &mut impl BufRead) -> Result<Option<String>, AcquireError> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => Err(AcquireError::Channel("flux série fermé (EOF)".to_string())),
        Ok(_) => {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        // Timeout without a complete line: not an error, just retry.
        // A partial line caught mid-transfer is dropped with it.
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
            ) =>
        {
            Ok(None)
        }
        Err(e) => Err(AcquireError::Channel(e.to_string())),
    }
}

impl LineSource for SerialSource {
    fn read_line(&mut self) -> Result<Option<String>, AcquireError> {
        next_line(&mut self.reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read};

    #[test]
    fn complete_line_is_trimmed() {
        let mut reader = Cursor::new(b"  270 135 67 \n".to_vec());
        let line = next_line(&mut reader).unwrap();
        assert_eq!(line.as_deref(), Some("270 135 67"));
    }

    #[test]
    fn blank_line_yields_none() {
        let mut reader = Cursor::new(b"   \n".to_vec());
        assert!(next_line(&mut reader).unwrap().is_none());
    }

    #[test]
    fn closed_stream_is_a_channel_error() {
        // A Cursor at EOF models a vanished device: every read returns
        // 0 bytes, and mapping that to Ok(None) would spin the read
        // loop without ever reaching its backoff
        let mut reader = Cursor::new(Vec::new());
        let err = next_line(&mut reader).unwrap_err();
        assert!(matches!(err, AcquireError::Channel(_)));
        // And again: the stream stays dead, the error stays an error
        assert!(next_line(&mut reader).is_err());
    }

    struct TimedOutReader;

    impl Read for TimedOutReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::TimedOut, "timeout"))
        }
    }

    #[test]
    fn timeout_yields_none() {
        let mut reader = io::BufReader::new(TimedOutReader);
        assert!(next_line(&mut reader).unwrap().is_none());
    }

    #[test]
    fn hard_io_error_is_a_channel_error() {
        struct BrokenReader;
        impl Read for BrokenReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(ErrorKind::BrokenPipe, "pipe cassé"))
            }
        }
        let mut reader = io::BufReader::new(BrokenReader);
        assert!(matches!(
            next_line(&mut reader).unwrap_err(),
            AcquireError::Channel(_)
        ));
    }
}
