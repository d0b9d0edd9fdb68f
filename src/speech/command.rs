//! Subprocess speech engine.
//!
//! [`CommandEngine`] drives a command-line synthesiser (`espeak-ng` by
//! default) through `tokio::process`.  Each utterance is one child process:
//!
//! ```text
//! speak()  ── spawn child ──▶ Started
//!              │
//!              ├─ child exits 0        ──▶ Ended
//!              ├─ child exits non-zero ──▶ Failed("synthesis-failed")
//!              └─ cancel() kills child ──▶ Failed("interrupted")
//! ```
//!
//! Pause and resume suspend the child with `SIGSTOP` / `SIGCONT` on unix.
//! `speak` must be called from inside a tokio runtime.

use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::config::SpeechConfig;

use super::builder::UtteranceConfig;
use super::engine::{
    EngineError, EngineEvent, EngineEventKind, EventSink, Generation, SpeechEngine, INTERRUPTED,
};
use super::mode::VoiceGender;
use super::voice::VoiceInfo;

/// Failure reason for a child that exited unsuccessfully.
pub const SYNTHESIS_FAILED: &str = "synthesis-failed";

/// espeak-ng pitch scale is 0–99 with 50 as the default.
const PITCH_SCALE: f32 = 50.0;
const PITCH_MAX: f32 = 99.0;

/// espeak-ng amplitude is 0–200 with 100 as the default.
const AMPLITUDE_SCALE: f32 = 100.0;

/// Voice variant appended for female voices without a female marker.
const FEMALE_VARIANT: &str = "+f3";

// ---------------------------------------------------------------------------
// ActiveChild
// ---------------------------------------------------------------------------

/// Bookkeeping for the utterance currently being spoken.
struct ActiveChild {
    generation: Generation,
    pid: Option<u32>,
    /// Dropping or firing this kills the child.
    kill: oneshot::Sender<()>,
    events: EventSink,
}

// ---------------------------------------------------------------------------
// CommandEngine
// ---------------------------------------------------------------------------

/// Speech engine backed by an external synthesiser program.
pub struct CommandEngine {
    program: String,
    base_wpm: u32,
    catalog: Vec<VoiceInfo>,
    active: Arc<Mutex<Option<ActiveChild>>>,
}

impl std::fmt::Debug for CommandEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEngine")
            .field("program", &self.program)
            .field("base_wpm", &self.base_wpm)
            .field("voices", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

impl CommandEngine {
    /// Create an engine for `program`, discovering its voice catalog.
    ///
    /// A program that cannot be run yields an empty catalog; the failure only
    /// surfaces once something is spoken.
    pub fn new(program: impl Into<String>, base_wpm: u32) -> Self {
        let program = program.into();
        let catalog = discover_voices(&program);
        log::info!(
            "speech: using `{program}` with {} voice(s) at {base_wpm} wpm",
            catalog.len()
        );
        Self {
            program,
            base_wpm,
            catalog,
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(config.program.clone(), config.base_wpm)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command-line arguments for `utterance`, text last.
    pub fn args_for(&self, utterance: &UtteranceConfig) -> Vec<String> {
        let wpm = (utterance.rate * self.base_wpm as f32).round().max(1.0) as u32;
        let pitch = (utterance.pitch * PITCH_SCALE).round().clamp(0.0, PITCH_MAX) as u32;
        let amplitude = (utterance.volume.clamp(0.0, 1.0) * AMPLITUDE_SCALE).round() as u32;

        let mut args = vec![
            "-s".to_string(),
            wpm.to_string(),
            "-p".to_string(),
            pitch.to_string(),
            "-a".to_string(),
            amplitude.to_string(),
        ];

        if let Some(voice) = &utterance.voice {
            let mut id = voice.language.clone();
            if utterance.selector.gender == VoiceGender::Female
                && !voice.matches_gender(VoiceGender::Female)
            {
                id.push_str(FEMALE_VARIANT);
            }
            args.push("-v".to_string());
            args.push(id);
        }

        args.push("--".to_string());
        args.push(utterance.text.clone());
        args
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveChild>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send `signal` to the active child.  The event is emitted once `kill`
    /// has succeeded; a failing `kill` is only logged.
    #[cfg(unix)]
    fn signal_active(
        &self,
        signal: &'static str,
        kind: EngineEventKind,
    ) -> Result<(), EngineError> {
        let target = {
            let active = self.active();
            active
                .as_ref()
                .and_then(|c| c.pid.map(|pid| (pid, c.generation, c.events.clone())))
        };
        let Some((pid, generation, events)) = target else {
            return Ok(());
        };

        if tokio::runtime::Handle::try_current().is_err() {
            return Err(EngineError::Unsupported("signalling outside a tokio runtime"));
        }

        let mut kill = tokio::process::Command::new("kill")
            .arg(signal)
            .arg(pid.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        tokio::spawn(async move {
            match kill.wait().await {
                Ok(status) if status.success() => {
                    let _ = events.send(EngineEvent::new(generation, kind));
                }
                Ok(status) => log::warn!("speech: kill {signal} {pid} exited with {status}"),
                Err(e) => log::warn!("speech: kill {signal} {pid} failed: {e}"),
            }
        });
        Ok(())
    }
}

impl SpeechEngine for CommandEngine {
    fn speak(
        &self,
        utterance: &UtteranceConfig,
        generation: Generation,
        events: EventSink,
    ) -> Result<(), EngineError> {
        let args = self.args_for(utterance);

        let mut child = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let (kill_tx, kill_rx) = oneshot::channel::<()>();

        // Replacing a previous entry drops its kill sender, which stops it.
        *self.active() = Some(ActiveChild {
            generation,
            pid: child.id(),
            kill: kill_tx,
            events: events.clone(),
        });

        log::debug!("speech: {generation} spawned {} ({} args)", self.program, args.len());
        let _ = events.send(EngineEvent::new(generation, EngineEventKind::Started));

        let active = Arc::clone(&self.active);
        tokio::spawn(async move {
            let kind = tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if status.success() => EngineEventKind::Ended,
                    Ok(status) => {
                        log::warn!("speech: {generation} synthesiser exited with {status}");
                        EngineEventKind::Failed(SYNTHESIS_FAILED.into())
                    }
                    Err(e) => {
                        log::warn!("speech: {generation} wait failed: {e}");
                        EngineEventKind::Failed(SYNTHESIS_FAILED.into())
                    }
                },
                _ = kill_rx => {
                    let _ = child.kill().await;
                    EngineEventKind::Failed(INTERRUPTED.into())
                }
            };

            {
                let mut slot = active.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.as_ref().is_some_and(|c| c.generation == generation) {
                    *slot = None;
                }
            }

            let _ = events.send(EngineEvent::new(generation, kind));
        });

        Ok(())
    }

    fn cancel(&self) {
        if let Some(child) = self.active().take() {
            log::debug!("speech: cancelling {}", child.generation);
            let _ = child.kill.send(());
        }
    }

    #[cfg(unix)]
    fn pause(&self) -> Result<(), EngineError> {
        self.signal_active("-STOP", EngineEventKind::Paused)
    }

    #[cfg(not(unix))]
    fn pause(&self) -> Result<(), EngineError> {
        Err(EngineError::Unsupported("pause"))
    }

    #[cfg(unix)]
    fn resume(&self) -> Result<(), EngineError> {
        self.signal_active("-CONT", EngineEventKind::Resumed)
    }

    #[cfg(not(unix))]
    fn resume(&self) -> Result<(), EngineError> {
        Err(EngineError::Unsupported("resume"))
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.catalog.clone()
    }
}

// ---------------------------------------------------------------------------
// Voice discovery
// ---------------------------------------------------------------------------

fn discover_voices(program: &str) -> Vec<VoiceInfo> {
    match std::process::Command::new(program).arg("--voices").output() {
        Ok(output) if output.status.success() => {
            parse_voice_list(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            log::warn!("speech: `{program} --voices` exited with {}", output.status);
            Vec::new()
        }
        Err(e) => {
            log::warn!("speech: could not list voices of `{program}`: {e}");
            Vec::new()
        }
    }
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File          Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US     (en 10)
/// ```
///
/// Voice names of female entries get a `(female)` suffix so gender matching
/// can find them.
pub fn parse_voice_list(output: &str) -> Vec<VoiceInfo> {
    output
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 || cols[0].parse::<u32>().is_err() {
                return None;
            }
            let name = if cols[2].ends_with('F') {
                format!("{} (female)", cols[3])
            } else {
                cols[3].to_string()
            };
            Some(VoiceInfo::new(name, cols[1]))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::engine::{event_channel, EventStream};
    use crate::speech::{build_utterance, Mode};

    const VOICES: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en-gb           --/M      English_(Great_Britain) gmw/en            (en 2)
 5  en-us           --/F      English_(America)  gmw/en-US            (en 3)
";

    fn engine() -> CommandEngine {
        CommandEngine {
            program: "espeak-ng".into(),
            base_wpm: 175,
            catalog: parse_voice_list(VOICES),
            active: Arc::new(Mutex::new(None)),
        }
    }

    #[test]
    fn parses_voice_table() {
        let voices = parse_voice_list(VOICES);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[0], VoiceInfo::new("Afrikaans", "af"));
        assert_eq!(voices[1].language, "en-gb");
        assert_eq!(voices[2].name, "English_(America) (female)");
    }

    #[test]
    fn garbage_yields_empty_catalog() {
        assert!(parse_voice_list("").is_empty());
        assert!(parse_voice_list("not a voice table").is_empty());
    }

    #[test]
    fn args_map_rate_pitch_volume_and_voice() {
        let e = engine();
        let u = build_utterance("Hello world", Some(Mode::News), VoiceGender::Male, &e.voices());
        let args = e.args_for(&u);

        // 1.1 × 175 = 192.5 → 193 wpm; 0.7 × 50 = 35.
        assert_eq!(
            args,
            vec!["-s", "193", "-p", "35", "-a", "100", "-v", "en-gb", "--", "Hello world"]
        );
    }

    #[test]
    fn female_request_picks_female_voice_without_variant() {
        let e = engine();
        let u = build_utterance("Hi", Some(Mode::Podcast), VoiceGender::Female, &e.voices());
        let args = e.args_for(&u);
        let v = args.iter().position(|a| a == "-v").unwrap();
        assert_eq!(args[v + 1], "en-us");
    }

    #[test]
    fn female_variant_added_when_catalog_has_no_female_voice() {
        let mut e = engine();
        e.catalog.truncate(2);
        let u = build_utterance("Hi", Some(Mode::Podcast), VoiceGender::Female, &e.voices());
        let args = e.args_for(&u);
        assert!(args.contains(&"en-gb+f3".to_string()));
    }

    #[test]
    fn no_voice_flag_for_empty_catalog() {
        let mut e = engine();
        e.catalog.clear();
        let u = build_utterance("Hi", None, VoiceGender::Male, &e.voices());
        assert!(!e.args_for(&u).contains(&"-v".to_string()));
    }

    #[test]
    fn pitch_is_clamped() {
        let e = engine();
        let mut u = build_utterance("Hi", None, VoiceGender::Female, &[]);
        u.pitch = 5.0;
        let args = e.args_for(&u);
        assert_eq!(args[3], "99");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let e = CommandEngine::new("definitely-not-a-speech-program", 175);
        assert!(e.voices().is_empty());

        let (sink, _stream) = event_channel();
        let u = build_utterance("Hi", None, VoiceGender::Male, &[]);
        let err = e.speak(&u, Generation::ZERO.next(), sink).unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }));
        assert!(err.to_string().contains("definitely-not-a-speech-program"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_exit_reports_started_then_ended() {
        let e = CommandEngine::new("true", 175);
        let (sink, mut stream) = event_channel();
        let g = Generation::ZERO.next();
        let u = build_utterance("Hi", None, VoiceGender::Male, &[]);

        e.speak(&u, g, sink).unwrap();

        assert_eq!(stream.recv().await.unwrap().kind, EngineEventKind::Started);
        let done = stream.recv().await.unwrap();
        assert_eq!(done, EngineEvent::new(g, EngineEventKind::Ended));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_exit_reports_synthesis_failure() {
        let e = CommandEngine::new("false", 175);
        let (sink, mut stream) = event_channel();
        let g = Generation::ZERO.next();
        let u = build_utterance("Hi", None, VoiceGender::Male, &[]);

        e.speak(&u, g, sink).unwrap();

        let _started = stream.recv().await.unwrap();
        let done = stream.recv().await.unwrap();
        assert_eq!(done, EngineEvent::failed(g, SYNTHESIS_FAILED));
    }

    /// Executable script that ignores its arguments and sleeps.
    #[cfg(unix)]
    fn sleeper(dir: &tempfile::TempDir) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("slow-synth");
        std::fs::write(&path, "#!/bin/sh\nexec sleep 5\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn pause_resume_and_cancel_a_running_child() {
        let dir = tempfile::tempdir().unwrap();
        let e = CommandEngine::new(sleeper(&dir), 175);
        let (sink, mut stream) = event_channel();
        let g = Generation::ZERO.next();
        let u = build_utterance("Hi", None, VoiceGender::Male, &[]);

        e.speak(&u, g, sink).unwrap();
        assert_eq!(stream.recv().await.unwrap().kind, EngineEventKind::Started);

        e.pause().unwrap();
        assert_eq!(next_event(&mut stream).await, EngineEvent::new(g, EngineEventKind::Paused));

        e.resume().unwrap();
        assert_eq!(next_event(&mut stream).await, EngineEvent::new(g, EngineEventKind::Resumed));

        e.cancel();
        assert_eq!(next_event(&mut stream).await, EngineEvent::failed(g, INTERRUPTED));
    }

    async fn next_event(stream: &mut EventStream) -> EngineEvent {
        tokio::time::timeout(std::time::Duration::from_secs(2), stream.recv())
            .await
            .expect("event in time")
            .expect("stream open")
    }

    #[test]
    fn cancel_without_active_child_is_a_no_op() {
        let e = engine();
        e.cancel();
        e.cancel();
        assert!(e.pause().is_ok() || cfg!(not(unix)));
    }
}
