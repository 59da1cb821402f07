//! Alarm output backends.
//!
//! A sink only knows how to start a looping sound, restart it and stop it.
//! Timing (auto-stop) lives in the controller.

use std::io::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::AudioError;

/// Something that can play the alarm sound.
pub trait AlarmSink {
    /// Start playing in a loop until stopped.
    fn play_looping(&mut self) -> Result<(), AudioError>;

    /// Start over from the beginning of the sound.
    fn restart_from_beginning(&mut self) -> Result<(), AudioError>;

    /// Halt playback. Stopping a silent sink is a no-op.
    fn stop_playing(&mut self);
}

impl<S: AlarmSink + ?Sized> AlarmSink for Box<S> {
    fn play_looping(&mut self) -> Result<(), AudioError> {
        (**self).play_looping()
    }

    fn restart_from_beginning(&mut self) -> Result<(), AudioError> {
        (**self).restart_from_beginning()
    }

    fn stop_playing(&mut self) {
        (**self).stop_playing()
    }
}

/// Which sink to build from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmSound {
    /// Log only.
    Silent,
    /// Terminal bell, repeated.
    #[default]
    Bell,
    /// Sine tone on the default audio device (needs the `tone` feature).
    Tone,
}

/// Build the configured sink, falling back to the bell when the audio
/// device cannot be opened.
pub fn sink_for(sound: AlarmSound, volume: u32) -> Box<dyn AlarmSink> {
    match sound {
        AlarmSound::Silent => Box::new(SilentSink),
        AlarmSound::Bell => Box::new(BellSink::default()),
        AlarmSound::Tone => open_tone(volume),
    }
}

#[cfg(feature = "tone")]
fn open_tone(volume: u32) -> Box<dyn AlarmSink> {
    match ToneSink::open(volume) {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            warn!("Tone alarm unavailable ({e}), using terminal bell");
            Box::new(BellSink::default())
        }
    }
}

#[cfg(not(feature = "tone"))]
fn open_tone(_volume: u32) -> Box<dyn AlarmSink> {
    warn!("Built without the `tone` feature, using terminal bell");
    Box::new(BellSink::default())
}

/// Logs instead of making a sound.
#[derive(Debug, Default)]
pub struct SilentSink;

impl AlarmSink for SilentSink {
    fn play_looping(&mut self) -> Result<(), AudioError> {
        info!("alarm (silent)");
        Ok(())
    }

    fn restart_from_beginning(&mut self) -> Result<(), AudioError> {
        info!("alarm restarted (silent)");
        Ok(())
    }

    fn stop_playing(&mut self) {}
}

/// Rings the terminal bell on stderr every `period` from a tokio task.
///
/// Must be used from inside a tokio runtime.
pub struct BellSink {
    period: Duration,
    ringer: Option<JoinHandle<()>>,
}

impl BellSink {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            ringer: None,
        }
    }

    pub fn is_ringing(&self) -> bool {
        self.ringer.is_some()
    }
}

impl Default for BellSink {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

async fn ring(period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        let mut err = std::io::stderr();
        if err.write_all(b"\x07").and_then(|_| err.flush()).is_err() {
            debug!("terminal bell write failed");
        }
    }
}

impl AlarmSink for BellSink {
    fn play_looping(&mut self) -> Result<(), AudioError> {
        self.stop_playing();
        let handle = tokio::runtime::Handle::try_current().map_err(|_| AudioError::NoRuntime)?;
        self.ringer = Some(handle.spawn(ring(self.period)));
        Ok(())
    }

    fn restart_from_beginning(&mut self) -> Result<(), AudioError> {
        self.play_looping()
    }

    fn stop_playing(&mut self) {
        if let Some(ringer) = self.ringer.take() {
            ringer.abort();
        }
    }
}

impl Drop for BellSink {
    fn drop(&mut self) {
        self.stop_playing();
    }
}

#[cfg(feature = "tone")]
pub use tone::ToneSink;

#[cfg(feature = "tone")]
mod tone {
    use rodio::source::SineWave;
    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use super::AlarmSink;
    use crate::error::AudioError;

    const TONE_HZ: f32 = 880.0;

    /// Continuous sine tone on the default output device.
    ///
    /// The output stream is held for the sink's whole lifetime and released
    /// on drop.
    pub struct ToneSink {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sink: Option<Sink>,
        volume: f32,
    }

    impl ToneSink {
        pub fn open(volume: u32) -> Result<Self, AudioError> {
            let (stream, handle) =
                OutputStream::try_default().map_err(|e| AudioError::Device(e.to_string()))?;
            Ok(Self {
                _stream: stream,
                handle,
                sink: None,
                volume: volume.min(100) as f32 / 100.0,
            })
        }
    }

    impl AlarmSink for ToneSink {
        fn play_looping(&mut self) -> Result<(), AudioError> {
            self.stop_playing();
            let sink =
                Sink::try_new(&self.handle).map_err(|e| AudioError::Playback(e.to_string()))?;
            sink.set_volume(self.volume);
            sink.append(SineWave::new(TONE_HZ).amplify(0.5));
            self.sink = Some(sink);
            Ok(())
        }

        fn restart_from_beginning(&mut self) -> Result<(), AudioError> {
            self.play_looping()
        }

        fn stop_playing(&mut self) {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_needs_a_runtime() {
        let mut sink = BellSink::default();
        assert!(matches!(sink.play_looping(), Err(AudioError::NoRuntime)));
        assert!(!sink.is_ringing());
    }

    #[tokio::test]
    async fn bell_rings_until_stopped() {
        let mut sink = BellSink::new(Duration::from_secs(3600));
        sink.play_looping().unwrap();
        assert!(sink.is_ringing());
        sink.restart_from_beginning().unwrap();
        assert!(sink.is_ringing());
        sink.stop_playing();
        assert!(!sink.is_ringing());
    }

    #[test]
    fn alarm_sound_parses_lowercase() {
        let sound: AlarmSound = serde_json::from_str("\"tone\"").unwrap();
        assert_eq!(sound, AlarmSound::Tone);
        assert_eq!(AlarmSound::default(), AlarmSound::Bell);
    }
}
