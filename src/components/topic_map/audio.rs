//! Procedural hover tick.
//!
//! One engine per page, shared by every topic map, built lazily on the first
//! sound request. Each tick layers a short pitched tone over a burst of
//! low-passed noise, both scheduled from the same start time. Requests that
//! arrive inside the cooldown window are dropped. Failures are logged and
//! swallowed: the widget works the same without sound.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use wasm_bindgen::JsValue;
use web_sys::{
	AudioContext, AudioContextState, AudioParam, AudioScheduledSourceNode, BiquadFilterType,
	OscillatorType,
};

#[derive(Debug, Error)]
pub enum AudioError {
	#[error("audio unavailable: {0}")]
	Unavailable(String),
	#[error("failed to schedule sound: {0}")]
	Schedule(String),
}

impl From<JsValue> for AudioError {
	fn from(value: JsValue) -> Self {
		AudioError::Schedule(format!("{value:?}"))
	}
}

/// Gain envelope: linear attack from `floor` to `peak`, then exponential
/// decay back to `floor`. Times are seconds after the voice start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
	pub peak: f32,
	pub floor: f32,
	pub attack: f64,
	pub decay_end: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToneLayer {
	pub frequency: f32,
	pub end_frequency: f32,
	/// Duration of the pitch drop from `frequency` to `end_frequency`.
	pub sweep: f64,
	pub envelope: Envelope,
	pub stop: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NoiseLayer {
	pub samples: Vec<f32>,
	pub sample_rate: f32,
	pub cutoff: f32,
	pub q: f32,
	pub envelope: Envelope,
	pub stop: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TickVoice {
	pub tone: ToneLayer,
	pub noise: NoiseLayer,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HoverSoundConfig {
	/// Minimum spacing between two tick starts, in milliseconds.
	pub cooldown_ms: f64,
	/// Start frequency band for the tone, `[low, high)` Hz.
	pub tone_band: (f32, f32),
	pub tone_end_frequency: f32,
	pub tone_sweep: f64,
	pub tone_gain: f32,
	pub tone_attack: f64,
	pub tone_decay: f64,
	pub tone_stop: f64,
	pub noise_duration: f64,
	pub noise_cutoff: f32,
	pub noise_q: f32,
	pub noise_gain: f32,
	pub noise_attack: f64,
	pub noise_decay: f64,
	/// Near-silence level; exponential ramps cannot reach zero.
	pub floor: f32,
}

impl Default for HoverSoundConfig {
	fn default() -> Self {
		Self {
			cooldown_ms: 50.0,
			tone_band: (140.0, 170.0),
			tone_end_frequency: 40.0,
			tone_sweep: 0.040,
			tone_gain: 0.07,
			tone_attack: 0.002,
			tone_decay: 0.038,
			tone_stop: 0.045,
			noise_duration: 0.018,
			noise_cutoff: 2000.0,
			noise_q: 0.7,
			noise_gain: 0.05,
			noise_attack: 0.001,
			noise_decay: 0.016,
			floor: 0.0001,
		}
	}
}

impl HoverSoundConfig {
	/// Draw one voice: jittered tone frequency and a fresh noise buffer.
	pub fn voice<R: Rng>(&self, rng: &mut R, sample_rate: f32) -> TickVoice {
		let (low, high) = self.tone_band;
		let frequency = if high > low {
			rng.gen_range(low..high)
		} else {
			low
		};
		let len = ((sample_rate as f64 * self.noise_duration).round() as usize).max(1);
		let samples = (0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect();

		TickVoice {
			tone: ToneLayer {
				frequency,
				end_frequency: self.tone_end_frequency,
				sweep: self.tone_sweep,
				envelope: Envelope {
					peak: self.tone_gain,
					floor: self.floor,
					attack: self.tone_attack,
					decay_end: self.tone_decay,
				},
				stop: self.tone_stop,
			},
			noise: NoiseLayer {
				samples,
				sample_rate,
				cutoff: self.noise_cutoff,
				q: self.noise_q,
				envelope: Envelope {
					peak: self.noise_gain,
					floor: self.floor,
					attack: self.noise_attack,
					decay_end: self.noise_decay,
				},
				stop: self.noise_duration,
			},
		}
	}
}

/// Where voices get scheduled. The browser implementation is
/// [`WebAudioBackend`]; tests substitute a recorder.
pub trait AudioBackend {
	/// Backend clock in seconds; voices start at this time.
	fn current_time(&self) -> f64;
	fn sample_rate(&self) -> f32;
	/// Ask a suspended backend to resume. Does not wait.
	fn resume(&self) -> Result<(), AudioError>;
	fn play_tone(&self, tone: &ToneLayer, at: f64) -> Result<(), AudioError>;
	fn play_noise(&self, noise: &NoiseLayer, at: f64) -> Result<(), AudioError>;
}

pub type BackendFactory = Box<dyn FnOnce() -> Result<Box<dyn AudioBackend>, AudioError>>;

enum Backend {
	Uninit(BackendFactory),
	Ready(Box<dyn AudioBackend>),
	Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
	Played,
	/// Dropped because the previous tick started inside the cooldown.
	Throttled,
	/// No usable audio backend, or scheduling failed.
	Muted,
}

pub struct HoverSound {
	config: HoverSoundConfig,
	backend: Backend,
	last_trigger_ms: Option<f64>,
	rng: SmallRng,
}

impl HoverSound {
	pub fn new(config: HoverSoundConfig, factory: BackendFactory) -> Self {
		Self::with_rng(config, factory, SmallRng::from_entropy())
	}

	pub fn with_rng(config: HoverSoundConfig, factory: BackendFactory, rng: SmallRng) -> Self {
		Self {
			config,
			backend: Backend::Uninit(factory),
			last_trigger_ms: None,
			rng,
		}
	}

	/// Request a tick at `now_ms` (page clock, milliseconds).
	pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
		if let Some(last) = self.last_trigger_ms {
			if now_ms - last < self.config.cooldown_ms {
				debug!("hover tick throttled ({:.1}ms since last)", now_ms - last);
				return TickOutcome::Throttled;
			}
		}
		self.last_trigger_ms = Some(now_ms);

		self.ensure_backend();
		let Backend::Ready(backend) = &self.backend else {
			return TickOutcome::Muted;
		};
		match schedule(backend.as_ref(), &self.config, &mut self.rng) {
			Ok(()) => TickOutcome::Played,
			Err(e) => {
				debug!("hover tick dropped: {e}");
				TickOutcome::Muted
			}
		}
	}

	/// Runs the factory on first use only. A failed attempt is final.
	fn ensure_backend(&mut self) {
		self.backend = match std::mem::replace(&mut self.backend, Backend::Failed) {
			Backend::Uninit(factory) => match factory() {
				Ok(backend) => {
					info!("hover sound ready ({} Hz)", backend.sample_rate());
					Backend::Ready(backend)
				}
				Err(e) => {
					warn!("hover sound disabled: {e}");
					Backend::Failed
				}
			},
			other => other,
		};
	}
}

fn schedule(
	backend: &dyn AudioBackend,
	config: &HoverSoundConfig,
	rng: &mut SmallRng,
) -> Result<(), AudioError> {
	if let Err(e) = backend.resume() {
		debug!("audio resume failed: {e}");
	}
	let voice = config.voice(rng, backend.sample_rate());
	let t = backend.current_time();
	backend.play_tone(&voice.tone, t)?;
	backend.play_noise(&voice.noise, t)?;
	Ok(())
}

/// Cloneable handle to a [`HoverSound`] engine.
#[derive(Clone)]
pub struct SoundHandle(Rc<RefCell<HoverSound>>);

thread_local! {
	static SHARED: SoundHandle = SoundHandle::new(HoverSound::new(
		HoverSoundConfig::default(),
		Box::new(WebAudioBackend::create),
	));
}

impl SoundHandle {
	pub fn new(engine: HoverSound) -> Self {
		Self(Rc::new(RefCell::new(engine)))
	}

	/// The page-wide engine. Every topic map shares its cooldown clock.
	pub fn shared() -> Self {
		SHARED.with(Clone::clone)
	}

	pub fn tick(&self, now_ms: f64) -> TickOutcome {
		self.0.borrow_mut().tick(now_ms)
	}
}

/// Web Audio implementation.
pub struct WebAudioBackend {
	ctx: AudioContext,
}

impl WebAudioBackend {
	pub fn create() -> Result<Box<dyn AudioBackend>, AudioError> {
		let ctx = AudioContext::new().map_err(|e| AudioError::Unavailable(format!("{e:?}")))?;
		Ok(Box::new(Self { ctx }))
	}
}

fn apply_envelope(param: &AudioParam, env: &Envelope, t: f64) -> Result<(), JsValue> {
	param.set_value_at_time(env.floor, t)?;
	param.linear_ramp_to_value_at_time(env.peak, t + env.attack)?;
	param.exponential_ramp_to_value_at_time(env.floor, t + env.decay_end)?;
	Ok(())
}

impl AudioBackend for WebAudioBackend {
	fn current_time(&self) -> f64 {
		self.ctx.current_time()
	}

	fn sample_rate(&self) -> f32 {
		self.ctx.sample_rate()
	}

	fn resume(&self) -> Result<(), AudioError> {
		if self.ctx.state() == AudioContextState::Suspended {
			// Resolves once a user gesture has unlocked playback; not awaited.
			let _pending: js_sys::Promise = self.ctx.resume()?;
		}
		Ok(())
	}

	fn play_tone(&self, tone: &ToneLayer, at: f64) -> Result<(), AudioError> {
		let osc = self.ctx.create_oscillator()?;
		osc.set_type(OscillatorType::Sine);
		let frequency = osc.frequency();
		frequency.set_value_at_time(tone.frequency, at)?;
		frequency.exponential_ramp_to_value_at_time(tone.end_frequency, at + tone.sweep)?;

		let gain = self.ctx.create_gain()?;
		apply_envelope(&gain.gain(), &tone.envelope, at)?;

		osc.connect_with_audio_node(&gain)?
			.connect_with_audio_node(&self.ctx.destination())?;
		let source: &AudioScheduledSourceNode = osc.as_ref();
		source.start_with_when(at)?;
		source.stop_with_when(at + tone.stop)?;
		Ok(())
	}

	fn play_noise(&self, noise: &NoiseLayer, at: f64) -> Result<(), AudioError> {
		let buffer = self
			.ctx
			.create_buffer(1, noise.samples.len() as u32, noise.sample_rate)?;
		let mut samples = noise.samples.clone();
		buffer.copy_to_channel(&mut samples, 0)?;

		let source = self.ctx.create_buffer_source()?;
		source.set_buffer(Some(&buffer));

		let filter = self.ctx.create_biquad_filter()?;
		filter.set_type(BiquadFilterType::Lowpass);
		filter.frequency().set_value(noise.cutoff);
		filter.q().set_value(noise.q);

		let gain = self.ctx.create_gain()?;
		apply_envelope(&gain.gain(), &noise.envelope, at)?;

		source
			.connect_with_audio_node(&filter)?
			.connect_with_audio_node(&gain)?
			.connect_with_audio_node(&self.ctx.destination())?;
		let scheduled: &AudioScheduledSourceNode = source.as_ref();
		scheduled.start_with_when(at)?;
		scheduled.stop_with_when(at + noise.stop)?;
		Ok(())
	}
}

#[cfg(test)]
pub(crate) mod fake {
	use super::*;

	#[derive(Clone, Debug, PartialEq)]
	pub enum Scheduled {
		Tone { at: f64, frequency: f32 },
		Noise { at: f64, len: usize },
	}

	/// Records what would have been played. Clones share one log.
	#[derive(Clone, Default)]
	pub struct RecordingBackend {
		pub log: Rc<RefCell<Vec<Scheduled>>>,
		pub resumes: Rc<RefCell<usize>>,
		pub clock: Rc<RefCell<f64>>,
	}

	impl RecordingBackend {
		pub fn tones(&self) -> usize {
			self.log
				.borrow()
				.iter()
				.filter(|s| matches!(s, Scheduled::Tone { .. }))
				.count()
		}

		pub fn factory(&self) -> BackendFactory {
			let backend = self.clone();
			Box::new(move || Ok(Box::new(backend) as Box<dyn AudioBackend>))
		}
	}

	impl AudioBackend for RecordingBackend {
		fn current_time(&self) -> f64 {
			*self.clock.borrow()
		}

		fn sample_rate(&self) -> f32 {
			48_000.0
		}

		fn resume(&self) -> Result<(), AudioError> {
			*self.resumes.borrow_mut() += 1;
			Ok(())
		}

		fn play_tone(&self, tone: &ToneLayer, at: f64) -> Result<(), AudioError> {
			self.log.borrow_mut().push(Scheduled::Tone {
				at,
				frequency: tone.frequency,
			});
			Ok(())
		}

		fn play_noise(&self, noise: &NoiseLayer, at: f64) -> Result<(), AudioError> {
			self.log.borrow_mut().push(Scheduled::Noise {
				at,
				len: noise.samples.len(),
			});
			Ok(())
		}
	}

	pub fn engine(backend: &RecordingBackend) -> HoverSound {
		HoverSound::with_rng(
			HoverSoundConfig::default(),
			backend.factory(),
			SmallRng::seed_from_u64(7),
		)
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::fake::{RecordingBackend, Scheduled, engine};
	use super::*;

	#[test]
	fn both_layers_share_one_start_time() {
		let backend = RecordingBackend::default();
		*backend.clock.borrow_mut() = 1.25;
		let mut sound = engine(&backend);

		assert_eq!(sound.tick(0.0), TickOutcome::Played);
		let log = backend.log.borrow();
		assert_eq!(log.len(), 2);
		assert!(matches!(log[0], Scheduled::Tone { at, .. } if at == 1.25));
		// 18ms at 48kHz
		assert!(matches!(log[1], Scheduled::Noise { at, len: 864 } if at == 1.25));
		assert_eq!(*backend.resumes.borrow(), 1);
	}

	#[test]
	fn requests_inside_cooldown_are_dropped() {
		let backend = RecordingBackend::default();
		let mut sound = engine(&backend);

		assert_eq!(sound.tick(1000.0), TickOutcome::Played);
		assert_eq!(sound.tick(1020.0), TickOutcome::Throttled);
		assert_eq!(sound.tick(1049.9), TickOutcome::Throttled);
		assert_eq!(sound.tick(1050.0), TickOutcome::Played);
		assert_eq!(backend.tones(), 2);
	}

	#[test]
	fn throttled_requests_do_not_extend_the_window() {
		let backend = RecordingBackend::default();
		let mut sound = engine(&backend);

		sound.tick(0.0);
		sound.tick(40.0);
		assert_eq!(sound.tick(55.0), TickOutcome::Played);
	}

	#[test]
	fn backend_is_built_at_most_once() {
		let calls = Rc::new(Cell::new(0));
		let backend = RecordingBackend::default();
		let counted: BackendFactory = {
			let calls = calls.clone();
			let backend = backend.clone();
			Box::new(move || {
				calls.set(calls.get() + 1);
				Ok(Box::new(backend) as Box<dyn AudioBackend>)
			})
		};
		let mut sound = HoverSound::with_rng(
			HoverSoundConfig::default(),
			counted,
			SmallRng::seed_from_u64(1),
		);
		for i in 0..5 {
			sound.tick(i as f64 * 100.0);
		}
		assert_eq!(calls.get(), 1);
		assert_eq!(backend.tones(), 5);
	}

	#[test]
	fn unavailable_backend_is_silent_and_final() {
		let calls = Rc::new(Cell::new(0));
		let failing: BackendFactory = {
			let calls = calls.clone();
			Box::new(move || {
				calls.set(calls.get() + 1);
				Err(AudioError::Unavailable("no audio".into()))
			})
		};
		let mut sound = HoverSound::with_rng(
			HoverSoundConfig::default(),
			failing,
			SmallRng::seed_from_u64(1),
		);
		assert_eq!(sound.tick(0.0), TickOutcome::Muted);
		assert_eq!(sound.tick(500.0), TickOutcome::Muted);
		assert_eq!(calls.get(), 1);
	}

	#[test]
	fn voices_are_jittered_within_band() {
		let config = HoverSoundConfig::default();
		let mut rng = SmallRng::seed_from_u64(42);
		let a = config.voice(&mut rng, 44_100.0);
		let b = config.voice(&mut rng, 44_100.0);
		for v in [&a, &b] {
			assert!(v.tone.frequency >= 140.0 && v.tone.frequency < 170.0);
			assert!(v.noise.samples.iter().all(|s| (-1.0..1.0).contains(s)));
			assert!(v.tone.envelope.attack < v.tone.envelope.decay_end);
			assert!(v.tone.envelope.decay_end <= v.tone.stop);
			assert!(v.noise.envelope.decay_end <= v.noise.stop);
		}
		assert_ne!(a.tone.frequency, b.tone.frequency);
	}
}
