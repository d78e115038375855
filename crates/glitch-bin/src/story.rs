//! Scripted producer standing in for the shell simulation and story logic.
//! Talks to the engine only through an `EngineHandle`.

use core_effects::{EffectKind, EffectRequest, Target};
use core_engine::{EngineHandle, HandleError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

enum Beat {
    Out(&'static str),
    Thinking(&'static str),
    Level(f32),
    /// Effect on the `n`th most recent line (0 = newest).
    OnRecent(EffectKind, usize),
    Global(EffectKind, u32),
    Pause(u32),
}

const SCRIPT: &[Beat] = &[
    Beat::Out("Last login: Thu Oct 31 23:58:01 on ttys000"),
    Beat::Out("root@kali:~# ls -la /home/ghost"),
    Beat::Out("drwx------  2 ghost ghost 4096 .memories"),
    Beat::Out("-rw-------  1 ghost ghost  666 letter.txt"),
    Beat::Pause(2),
    Beat::Level(15.0),
    Beat::Out("root@kali:~# cat /home/ghost/letter.txt"),
    Beat::Thinking("..."),
    Beat::Pause(3),
    Beat::Out("if you are reading this the process is still running"),
    Beat::OnRecent(EffectKind::Typing, 0),
    Beat::Out("do not trust the timestamps"),
    Beat::OnRecent(EffectKind::CharacterDecay, 0),
    Beat::Level(35.0),
    Beat::Pause(2),
    Beat::Out("they rewrote the logs at 03:00"),
    Beat::OnRecent(EffectKind::Redaction, 0),
    Beat::OnRecent(EffectKind::Flicker, 2),
    Beat::Level(60.0),
    Beat::Global(EffectKind::Scanline, 120),
    Beat::Pause(4),
    Beat::Out("root@kali:~# whoami"),
    Beat::Out("ghost"),
    Beat::OnRecent(EffectKind::ColorBleed, 0),
    Beat::Level(85.0),
    Beat::Global(EffectKind::GlyphNoise, 40),
];

/// Play the script on a background thread, `pace` apart per beat.
pub fn spawn(handle: EngineHandle, pace: Duration) -> JoinHandle<()> {
    thread::spawn(move || match play(&handle, pace) {
        Ok(()) => info!(target: "runtime", "story_finished"),
        Err(HandleError::EngineGone) => debug!(target: "runtime", "story_abandoned"),
    })
}

/// Post every beat through `handle`. A zero `pace` queues the whole script
/// for the next tick.
pub fn play(handle: &EngineHandle, pace: Duration) -> Result<(), HandleError> {
    let mut posted = 0usize;
    for beat in SCRIPT {
        match beat {
            Beat::Out(text) => {
                handle.post_text([*text])?;
                posted += 1;
                wait(pace);
            }
            Beat::Thinking(text) => handle.set_placeholder(Some((*text).to_string()))?,
            Beat::Level(level) => handle.set_level(*level)?,
            Beat::OnRecent(kind, back) => {
                let Some(line) = posted.checked_sub(back + 1) else {
                    continue;
                };
                handle.submit(EffectRequest::of(*kind, Target::line(line)))?;
            }
            Beat::Global(kind, ticks) => {
                handle.submit(EffectRequest::of(*kind, Target::Global).ticks(*ticks))?;
            }
            Beat::Pause(n) => {
                for _ in 0..*n {
                    wait(pace);
                }
            }
        }
    }
    Ok(())
}

fn wait(pace: Duration) {
    if !pace.is_zero() {
        thread::sleep(pace);
    }
}
