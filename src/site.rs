//! Page bootstrap.
//!
//! Builds the enabled behavior units from a [`SiteConfig`] once the page is
//! ready, then routes host events, timers, animation frames and background
//! task results to them. A unit that fails to start is disabled; every other
//! unit keeps working.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::behavior::{BehaviorUnit, UnitContext};
use crate::config::{ConfigError, FeatureFlags, SiteConfig};
use crate::modules::content::{Counters, FadeIn, Parallax, ScrollToTop};
use crate::modules::events::{
	EventDispatcher, EventHandler, LoggingHandler, SiteEvent, UnitPhase,
};
use crate::modules::form::{
	ContactForm, FormSubmitter, HttpSubmitter, SimulatedSubmitter, SubmitError,
};
use crate::modules::lifecycle::{
	HoverPrefetch, LazyImages, OfflineCache, OfflineRegistrar, Preloader,
};
use crate::modules::navigation::{ActiveLink, HeaderStyle, MobileMenu, SmoothScroll};
use crate::platform::{
	Clock, DispatchOutcome, Host, PageEvent, Scheduler, SystemClock, TaskQueue, UnitId,
};

/// Result alias for site setup.
pub type SiteResult<T> = Result<T, SiteError>;

#[derive(Debug, Error)]
pub enum SiteError {
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),
	#[error("form submitter initialisation failed: {0}")]
	Submitter(#[from] SubmitError),
	#[error("site already started")]
	AlreadyStarted,
}

/// Builder for [`Site`].
pub struct SiteBuilder {
	config: SiteConfig,
	clock: Option<Arc<dyn Clock>>,
	submitter: Option<Arc<dyn FormSubmitter>>,
	registrar: Option<Arc<dyn OfflineRegistrar>>,
	handlers: Vec<Arc<dyn EventHandler>>,
	logging: bool,
	extra_units: Vec<Box<dyn BehaviorUnit>>,
}

impl SiteBuilder {
	pub fn new() -> Self {
		Self {
			config: SiteConfig::default(),
			clock: None,
			submitter: None,
			registrar: None,
			handlers: Vec::new(),
			logging: true,
			extra_units: Vec::new(),
		}
	}

	pub fn with_config(mut self, config: SiteConfig) -> Self {
		self.config = config;
		self
	}

	pub fn with_features(mut self, features: FeatureFlags) -> Self {
		self.config.features = features;
		self
	}

	/// Time source shared by the scheduler and the default form submitter.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = Some(clock);
		self
	}

	pub fn with_submitter(mut self, submitter: Arc<dyn FormSubmitter>) -> Self {
		self.submitter = Some(submitter);
		self
	}

	/// Without a registrar the offline cache unit is not created.
	pub fn with_offline_registrar(mut self, registrar: Arc<dyn OfflineRegistrar>) -> Self {
		self.registrar = Some(registrar);
		self
	}

	pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
		self.handlers.push(handler);
		self
	}

	/// Register an additional unit, started after the built-in ones.
	pub fn with_unit(mut self, unit: Box<dyn BehaviorUnit>) -> Self {
		self.extra_units.push(unit);
		self
	}

	pub fn disable_logging(mut self) -> Self {
		self.logging = false;
		self
	}

	pub fn disable_mobile_menu(mut self) -> Self {
		self.config.features.mobile_menu = false;
		self
	}

	pub fn disable_parallax(mut self) -> Self {
		self.config.features.parallax = false;
		self
	}

	pub fn disable_counters(mut self) -> Self {
		self.config.features.counters = false;
		self
	}

	pub fn disable_contact_form(mut self) -> Self {
		self.config.features.contact_form = false;
		self
	}

	pub fn disable_preloader(mut self) -> Self {
		self.config.features.preloader = false;
		self
	}

	pub fn disable_prefetch(mut self) -> Self {
		self.config.features.prefetch = false;
		self
	}

	pub fn disable_offline_cache(mut self) -> Self {
		self.config.features.offline_cache = false;
		self
	}

	pub fn build<H: Host>(self, host: H) -> SiteResult<Site<H>> {
		self.config.validate()?;

		let clock: Arc<dyn Clock> = self
			.clock
			.unwrap_or_else(|| Arc::new(SystemClock::new()));

		let submitter: Arc<dyn FormSubmitter> = match self.submitter {
			Some(submitter) => submitter,
			None => match self.config.form.endpoint_url()? {
				Some(endpoint) => Arc::new(HttpSubmitter::new(
					endpoint,
					self.config.form.request_timeout(),
				)?),
				None => Arc::new(SimulatedSubmitter::new(
					clock.clone(),
					self.config.form.simulated_delay(),
				)),
			},
		};

		let mut telemetry = EventDispatcher::new();
		if self.logging {
			telemetry.register_handler(Arc::new(LoggingHandler));
		}
		for handler in self.handlers {
			telemetry.register_handler(handler);
		}

		Ok(Site {
			host,
			config: self.config,
			clock,
			submitter,
			registrar: self.registrar,
			scheduler: Scheduler::default(),
			tasks: TaskQueue::default(),
			telemetry,
			extra_units: self.extra_units,
			units: Vec::new(),
			started: false,
		})
	}
}

impl Default for SiteBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct UnitSlot {
	unit: Box<dyn BehaviorUnit>,
	active: bool,
}

/// Owns the page host and every behavior unit bound to it.
pub struct Site<H: Host> {
	host: H,
	config: SiteConfig,
	clock: Arc<dyn Clock>,
	submitter: Arc<dyn FormSubmitter>,
	registrar: Option<Arc<dyn OfflineRegistrar>>,
	scheduler: Scheduler,
	tasks: TaskQueue,
	telemetry: EventDispatcher,
	extra_units: Vec<Box<dyn BehaviorUnit>>,
	units: Vec<UnitSlot>,
	started: bool,
}

impl<H: Host> Site<H> {
	/// Site with default configuration and the system clock.
	pub fn new(host: H) -> SiteResult<Self> {
		SiteBuilder::new().build(host)
	}

	pub fn config(&self) -> &SiteConfig {
		&self.config
	}

	pub fn host(&self) -> &H {
		&self.host
	}

	/// Mutable host access, e.g. for moving the scroll position before
	/// dispatching `Scroll`.
	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	pub fn now(&self) -> Duration {
		self.clock.now()
	}

	pub fn is_started(&self) -> bool {
		self.started
	}

	pub fn is_active(&self, name: &str) -> bool {
		self.units
			.iter()
			.any(|slot| slot.active && slot.unit.name() == name)
	}

	/// Names of units currently receiving events, in start order.
	pub fn active_units(&self) -> Vec<&'static str> {
		self.units
			.iter()
			.filter(|slot| slot.active)
			.map(|slot| slot.unit.name())
			.collect()
	}

	/// Construct and start every enabled unit. Call once, on page-ready.
	pub fn start(&mut self) -> SiteResult<()> {
		if self.started {
			return Err(SiteError::AlreadyStarted);
		}
		self.started = true;

		let units = self.enabled_units();
		for unit in units {
			self.units.push(UnitSlot { unit, active: true });
		}

		let now = self.clock.now();
		for index in 0..self.units.len() {
			let slot = &mut self.units[index];
			let name = slot.unit.name();
			let mut ctx = UnitContext::new(
				&mut self.host,
				&mut self.scheduler,
				&mut self.tasks,
				&self.telemetry,
				UnitId(index),
				now,
			);
			match slot.unit.start(&mut ctx) {
				Ok(()) => {
					self.telemetry.dispatch(SiteEvent::unit_started(name));
				}
				Err(err) => {
					slot.active = false;
					self.scheduler.cancel_owner(UnitId(index));
					self.tasks.cancel_owner(UnitId(index));
					self.telemetry
						.dispatch(SiteEvent::unit_failed(name, UnitPhase::Start, err));
				}
			}
		}

		log::info!(
			"site started with {} of {} behaviors active",
			self.active_units().len(),
			self.units.len()
		);
		Ok(())
	}

	fn enabled_units(&mut self) -> Vec<Box<dyn BehaviorUnit>> {
		let features = self.config.features;
		let navigation = &self.config.navigation;
		let content = &self.config.content;
		let lifecycle = &self.config.lifecycle;
		let mut units: Vec<Box<dyn BehaviorUnit>> = Vec::new();

		if features.preloader {
			units.push(Box::new(Preloader::new(lifecycle.clone())));
		}
		if features.mobile_menu {
			units.push(Box::new(MobileMenu::new(navigation.clone())));
		}
		if features.header_style {
			units.push(Box::new(HeaderStyle::new(navigation.clone())));
		}
		if features.active_link {
			units.push(Box::new(ActiveLink::new(navigation.clone())));
		}
		if features.smooth_scroll {
			units.push(Box::new(SmoothScroll::new(navigation.clone())));
		}
		if features.parallax {
			units.push(Box::new(Parallax::new(content.clone())));
		}
		if features.counters {
			units.push(Box::new(Counters::new(content.clone())));
		}
		if features.scroll_to_top {
			units.push(Box::new(ScrollToTop::new(content.clone())));
		}
		if features.fade_in {
			units.push(Box::new(FadeIn::new(content.clone())));
		}
		if features.contact_form {
			units.push(Box::new(ContactForm::new(
				self.config.form.clone(),
				self.submitter.clone(),
			)));
		}
		if features.lazy_images {
			units.push(Box::new(LazyImages::new(lifecycle.clone())));
		}
		if features.prefetch {
			units.push(Box::new(HoverPrefetch::new(lifecycle.clone())));
		}
		if features.offline_cache {
			match &self.registrar {
				Some(registrar) => units.push(Box::new(OfflineCache::new(
					lifecycle.clone(),
					registrar.clone(),
				))),
				None => log::debug!("offline cache skipped: host has no registrar"),
			}
		}

		units.append(&mut self.extra_units);
		units
	}

	/// Broadcast a host event to every active unit.
	///
	/// `Timer`, `AnimationFrame` and `TaskComplete` are delivered by
	/// [`Site::step`] and ignored here.
	pub fn dispatch(&mut self, event: PageEvent) -> DispatchOutcome {
		let mut outcome = DispatchOutcome::default();
		if !self.started {
			log::debug!("{} dispatched before start, ignored", event.kind());
			return outcome;
		}
		if matches!(
			event,
			PageEvent::Timer { .. } | PageEvent::AnimationFrame { .. } | PageEvent::TaskComplete { .. }
		) {
			log::debug!("{} is routed by step(), ignored", event.kind());
			return outcome;
		}

		let now = self.clock.now();
		for index in 0..self.units.len() {
			if self.deliver(index, &event, now) {
				outcome.default_prevented = true;
			}
		}
		outcome
	}

	/// Deliver whatever is due at the current clock time: finished
	/// background tasks, then expired timers, then the animation frame.
	/// Returns the number of callbacks delivered.
	pub fn step(&mut self) -> usize {
		if !self.started {
			return 0;
		}
		let now = self.clock.now();
		let mut delivered = 0;

		for done in self.tasks.poll_ready() {
			let event = PageEvent::TaskComplete {
				tag: done.tag,
				result: done.result,
			};
			self.deliver(done.owner.0, &event, now);
			delivered += 1;
		}

		while let Some(timer) = self.scheduler.pop_due(now) {
			let event = PageEvent::Timer {
				id: timer.id,
				tag: timer.tag,
			};
			self.deliver(timer.owner.0, &event, now);
			delivered += 1;
		}

		if let Some(frames) = self.scheduler.take_frame(now) {
			for (owner, tag) in frames {
				self.deliver(owner.0, &PageEvent::AnimationFrame { tag }, now);
				delivered += 1;
			}
		}
		delivered
	}

	/// Earliest instant at which [`Site::step`] has timer or frame work.
	pub fn next_deadline(&self) -> Option<Duration> {
		self.scheduler.next_deadline()
	}

	/// Whether any timer, frame or background task is outstanding.
	pub fn has_pending_work(&self) -> bool {
		self.scheduler.next_deadline().is_some() || !self.tasks.is_empty()
	}

	/// Global error hook: record an uncaught page error. Never fatal.
	pub fn report_error(&self, message: impl Into<String>) {
		self.telemetry.dispatch(SiteEvent::runtime_error(message));
	}

	/// Stop every active unit and drop its pending work.
	pub fn stop(&mut self) {
		let now = self.clock.now();
		for index in 0..self.units.len() {
			let slot = &mut self.units[index];
			if !slot.active {
				continue;
			}
			slot.active = false;
			let name = slot.unit.name();
			let mut ctx = UnitContext::new(
				&mut self.host,
				&mut self.scheduler,
				&mut self.tasks,
				&self.telemetry,
				UnitId(index),
				now,
			);
			if let Err(err) = slot.unit.stop(&mut ctx) {
				self.telemetry
					.dispatch(SiteEvent::unit_failed(name, UnitPhase::Stop, err));
			}
			self.scheduler.cancel_owner(UnitId(index));
			self.tasks.cancel_owner(UnitId(index));
			self.telemetry.dispatch(SiteEvent::unit_stopped(name));
		}
	}

	/// Hand one event to one unit. Returns whether it prevented the default.
	fn deliver(&mut self, index: usize, event: &PageEvent, now: Duration) -> bool {
		let Some(slot) = self.units.get_mut(index) else {
			return false;
		};
		if !slot.active {
			return false;
		}
		let name = slot.unit.name();
		let mut ctx = UnitContext::new(
			&mut self.host,
			&mut self.scheduler,
			&mut self.tasks,
			&self.telemetry,
			UnitId(index),
			now,
		);
		let result = slot.unit.handle(event, &mut ctx);
		let prevented = ctx.default_prevented();
		if let Err(err) = result {
			self.telemetry
				.dispatch(SiteEvent::unit_failed(name, UnitPhase::Event(event.kind()), err));
		}
		prevented
	}
}

impl<H: Host> std::fmt::Debug for Site<H> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Site")
			.field("started", &self.started)
			.field("units", &self.active_units())
			.field("submitter", &self.submitter.name())
			.field("scheduler", &self.scheduler)
			.field("tasks", &self.tasks)
			.finish()
	}
}
