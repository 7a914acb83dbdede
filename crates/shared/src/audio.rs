//! Background music and popup clip crossfading.
//!
//! The coordinator owns the background track and a single task slot for
//! it. A task is either a pending delay or a linear volume ramp, advanced
//! one step per rendered frame through [`AudioCoordinator::tick`].
//! Scheduling a new task drops whatever was in the slot.

use std::collections::BTreeSet;

use crate::config::AudioConfig;

/// Browser refused to start playback (autoplay policy and the like).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("playback was rejected")]
pub struct PlaybackRejected;

pub trait AudioSink {
    fn volume(&self) -> f64;
    fn set_volume(&mut self, volume: f64);
    fn play(&mut self) -> Result<(), PlaybackRejected>;
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn current_time(&self) -> f64;
    /// Track length in seconds; NaN or zero while unknown.
    fn duration(&self) -> f64;
    fn seek(&mut self, secs: f64);
}

/// Identifies one popup clip player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Direction {
    /// Ramp down to silence, then pause and put `restore` back.
    Out { restore: f64 },
    In,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ramp {
    direction: Direction,
    from: f64,
    target: f64,
    step: u32,
    steps: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Task {
    /// Start a fade-in at `at_ms` unless a clip is playing by then.
    DelayedFadeIn { at_ms: f64 },
    Ramp(Ramp),
}

pub struct AudioCoordinator<S: AudioSink> {
    background: S,
    config: AudioConfig,
    started: bool,
    playing: BTreeSet<ClipId>,
    task: Option<Task>,
}

impl<S: AudioSink> AudioCoordinator<S> {
    pub fn new(background: S, config: AudioConfig) -> Self {
        Self {
            background,
            config,
            started: false,
            playing: BTreeSet::new(),
            task: None,
        }
    }

    pub fn background(&self) -> &S {
        &self.background
    }

    /// Whether a task still needs ticks.
    pub fn is_busy(&self) -> bool {
        self.task.is_some()
    }

    pub fn any_clip_playing(&self) -> bool {
        !self.playing.is_empty()
    }

    /// Start the background track on the first click, key press or touch.
    /// Returns true only for the gesture that started it.
    pub fn first_gesture(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        self.background.set_volume(self.config.start_volume);
        self.try_play();
        tracing::debug!("Background music started");
        true
    }

    /// Loop guard: jump back to the start just before the natural loop point.
    pub fn time_update(&mut self) {
        let duration = self.background.duration();
        if !duration.is_finite() || duration <= 0.0 {
            return;
        }
        let current = self.background.current_time();
        if current > 0.0 && duration - current < self.config.loop_guard_secs {
            self.background.seek(0.0);
            if self.background.is_paused() {
                self.try_play();
            }
        }
    }

    pub fn clip_started(&mut self, clip: ClipId) {
        self.playing.insert(clip);
        self.fade_out();
    }

    /// A clip ended or was paused.
    pub fn clip_stopped(&mut self, clip: ClipId, now_ms: f64) {
        self.playing.remove(&clip);
        self.task = Some(Task::DelayedFadeIn {
            at_ms: now_ms + f64::from(self.config.resume_delay_ms),
        });
    }

    pub fn popup_closed(&mut self) {
        if !self.any_clip_playing() {
            self.fade_in();
        }
    }

    /// Advance the current task by one frame.
    pub fn tick(&mut self, now_ms: f64) {
        match self.task {
            None => {}
            Some(Task::DelayedFadeIn { at_ms }) => {
                if now_ms < at_ms {
                    return;
                }
                if self.any_clip_playing() {
                    self.task = None;
                } else {
                    self.fade_in();
                }
            }
            Some(Task::Ramp(mut ramp)) => {
                ramp.step += 1;
                let progress = f64::from(ramp.step) / f64::from(ramp.steps);
                match ramp.direction {
                    Direction::Out { restore } => {
                        self.background.set_volume((ramp.from * (1.0 - progress)).max(0.0));
                        if ramp.step >= ramp.steps {
                            self.background.pause();
                            self.background.set_volume(restore);
                        }
                    }
                    Direction::In => {
                        self.background.set_volume((ramp.target * progress).min(ramp.target));
                    }
                }
                self.task = (ramp.step < ramp.steps).then_some(Task::Ramp(ramp));
            }
        }
    }

    fn fade_out(&mut self) {
        let from = self.background.volume();
        self.task = Some(Task::Ramp(Ramp {
            direction: Direction::Out { restore: from },
            from,
            target: 0.0,
            step: 0,
            steps: self.config.fade_steps(self.config.fade_ms),
        }));
    }

    fn fade_in(&mut self) {
        self.background.set_volume(0.0);
        self.try_play();
        self.task = Some(Task::Ramp(Ramp {
            direction: Direction::In,
            from: 0.0,
            target: self.config.resume_volume,
            step: 0,
            steps: self.config.fade_steps(self.config.fade_ms),
        }));
    }

    fn try_play(&mut self) {
        if let Err(err) = self.background.play() {
            tracing::debug!(%err, "Ignoring background playback failure");
        }
    }
}
