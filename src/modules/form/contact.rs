use std::sync::Arc;

use crate::behavior::{BehaviorResult, BehaviorUnit, UnitContext};
use crate::config::FormConfig;
use crate::modules::events::SiteEvent;
use crate::platform::{
    DomResult, ElementId, Host, PageEvent, Selector, TaskFailure, TaskResult, TimerId,
};

use super::submitter::{FormSubmission, FormSubmitter};
use super::validation::{ErrorDisplay, validate_field};

const SUBMISSION: u64 = 1;
const BANNER_EXPIRED: u64 = 2;

const CONTROLS: &str = "input, textarea, select";
const SUBMIT_CONTROLS: &str = "button[type=submit], input[type=submit]";
/// Input types that are controls rather than fields.
const BUTTON_TYPES: &[&str] = &["submit", "button", "reset", "image"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BannerKind {
    Success,
    Error,
}

impl BannerKind {
    fn class(self) -> &'static str {
        match self {
            BannerKind::Success => "form-success",
            BannerKind::Error => "form-error",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Banner {
    element: ElementId,
    close: Option<ElementId>,
    timer: Option<TimerId>,
}

/// Contact form: inline validation, submit gating and result banners.
pub struct ContactForm {
    config: FormConfig,
    submitter: Arc<dyn FormSubmitter>,
    form: Option<ElementId>,
    controls: Vec<ElementId>,
    submit_button: Option<ElementId>,
    original_label: Option<String>,
    errors: ErrorDisplay,
    banner: Option<Banner>,
    state: SubmissionState,
    in_flight_fields: usize,
}

impl std::fmt::Debug for ContactForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactForm")
            .field("submitter", &self.submitter.name())
            .field("form", &self.form)
            .field("state", &self.state)
            .finish()
    }
}

impl ContactForm {
    pub fn new(config: FormConfig, submitter: Arc<dyn FormSubmitter>) -> Self {
        Self {
            config,
            submitter,
            form: None,
            controls: Vec::new(),
            submit_button: None,
            original_label: None,
            errors: ErrorDisplay::new(),
            banner: None,
            state: SubmissionState::Idle,
            in_flight_fields: 0,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    fn validate(&mut self, field: ElementId, ctx: &mut UnitContext<'_>) -> BehaviorResult<bool> {
        let outcome = validate_field(ctx.view(), field)?;
        self.errors.apply(ctx.host(), field, outcome)?;
        Ok(outcome.is_ok())
    }

    fn collect(&self, ctx: &UnitContext<'_>) -> BehaviorResult<FormSubmission> {
        let view = ctx.view();
        let mut submission = FormSubmission::new();
        for &control in &self.controls {
            if let Some(name) = view.attr(control, "name")?
                && !name.is_empty()
            {
                submission.insert(name, view.value(control)?);
            }
        }
        Ok(submission)
    }

    fn on_submit(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        if self.state == SubmissionState::Submitting {
            log::debug!("submit ignored while a submission is in flight");
            return Ok(());
        }
        self.remove_banner(ctx)?;

        let mut valid = true;
        for control in self.controls.clone() {
            if ctx.view().attr(control, "required")?.is_some() {
                valid &= self.validate(control, ctx)?;
            }
        }
        if !valid {
            let message = self.config.invalid_message.clone();
            return self.show_banner(ctx, BannerKind::Error, &message);
        }

        let submission = self.collect(ctx)?;
        self.in_flight_fields = submission.len();
        self.set_pending(ctx, true)?;
        self.state = SubmissionState::Submitting;

        let submitter = self.submitter.clone();
        ctx.spawn(SUBMISSION, async move {
            submitter
                .submit(submission)
                .await
                .map_err(|err| TaskFailure::new(err.to_string()))
        });
        Ok(())
    }

    fn on_complete(&mut self, result: &TaskResult, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        if self.state != SubmissionState::Submitting {
            return Ok(());
        }
        self.state = match result {
            Ok(()) => SubmissionState::Succeeded,
            Err(_) => SubmissionState::Failed,
        };
        if let Err(err) = self.set_pending(ctx, false) {
            log::warn!("submit control not restored: {err}");
        }

        match result {
            Ok(()) => {
                ctx.emit(SiteEvent::submission(true, self.in_flight_fields, None));
                let message = self.config.success_message.clone();
                self.show_banner(ctx, BannerKind::Success, &message)?;
                self.clear_fields(ctx)?;
            }
            Err(failure) => {
                ctx.emit(SiteEvent::submission(
                    false,
                    self.in_flight_fields,
                    Some(failure.message.clone()),
                ));
                let message = self.config.failure_message.clone();
                self.show_banner(ctx, BannerKind::Error, &message)?;
            }
        }
        Ok(())
    }

    fn set_pending(&mut self, ctx: &mut UnitContext<'_>, pending: bool) -> BehaviorResult<()> {
        let Some(button) = self.submit_button else {
            return Ok(());
        };
        if !ctx.view().is_connected(button) {
            log::debug!("submit control {button} left the page");
            self.submit_button = None;
            self.original_label = None;
            return Ok(());
        }
        let host = ctx.host();
        // An <input> shows its value, a <button> its content.
        let is_input = host.tag_name(button)? == "input";
        if pending {
            let label = if is_input { host.value(button)? } else { host.text(button)? };
            self.original_label = Some(label);
            host.set_attr(button, "disabled", "")?;
            set_label(host, button, is_input, &self.config.pending_label)?;
        } else {
            host.remove_attr(button, "disabled")?;
            if let Some(label) = self.original_label.take() {
                set_label(host, button, is_input, &label)?;
            }
        }
        Ok(())
    }

    fn clear_fields(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let host = ctx.host();
        for &control in &self.controls {
            if host.attr(control, "type")?.as_deref() == Some("hidden") {
                continue;
            }
            host.set_value(control, "")?;
        }
        self.errors.clear_all(host)?;
        Ok(())
    }

    fn show_banner(
        &mut self,
        ctx: &mut UnitContext<'_>,
        kind: BannerKind,
        message: &str,
    ) -> BehaviorResult<()> {
        let Some(form) = self.form else {
            return Ok(());
        };
        let host = ctx.host();
        let element = host.create_element("div");
        host.add_class(element, kind.class())?;
        host.set_attr(element, "role", if kind == BannerKind::Error { "alert" } else { "status" })?;
        host.set_text(element, message)?;

        let close = if kind == BannerKind::Success {
            let close = host.create_element("button");
            host.set_attr(close, "type", "button")?;
            host.add_class(close, "close-message")?;
            host.set_attr(close, "aria-label", "Close")?;
            host.set_text(close, "\u{d7}")?;
            host.append_child(element, close)?;
            Some(close)
        } else {
            None
        };
        host.append_child(form, element)?;

        let timer = (kind == BannerKind::Success)
            .then(|| ctx.set_timeout(self.config.success_banner(), BANNER_EXPIRED));
        self.banner = Some(Banner {
            element,
            close,
            timer,
        });
        Ok(())
    }

    fn remove_banner(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let Some(banner) = self.banner.take() else {
            return Ok(());
        };
        if let Some(timer) = banner.timer {
            ctx.clear_timeout(timer);
        }
        if ctx.view().is_connected(banner.element) {
            ctx.host().remove(banner.element)?;
        }
        Ok(())
    }

    fn on_click(&mut self, target: ElementId, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let Some(close) = self.banner.and_then(|banner| banner.close) else {
            return Ok(());
        };
        if ctx.view().contains(close, target) {
            self.remove_banner(ctx)?;
        }
        Ok(())
    }
}

fn is_button_like(view: &dyn Host, control: ElementId) -> DomResult<bool> {
    if view.tag_name(control)? != "input" {
        return Ok(false);
    }
    let kind = view.attr(control, "type")?.unwrap_or_default().to_ascii_lowercase();
    Ok(BUTTON_TYPES.contains(&kind.as_str()))
}

fn set_label(host: &mut dyn Host, button: ElementId, is_input: bool, label: &str) -> DomResult<()> {
    if is_input {
        host.set_value(button, label)
    } else {
        host.set_text(button, label)
    }
}

impl BehaviorUnit for ContactForm {
    fn name(&self) -> &'static str {
        "contact-form"
    }

    fn start(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let selector = Selector::parse(&self.config.form_selector)?;
        let view = ctx.view();
        let Some(form) = view.query_first(&selector) else {
            log::debug!("no contact form on this page");
            return Ok(());
        };
        self.controls = Vec::new();
        for control in view.query_within(form, &Selector::parse(CONTROLS)?)? {
            if !is_button_like(view, control)? {
                self.controls.push(control);
            }
        }
        self.submit_button = view
            .query_within(form, &Selector::parse(SUBMIT_CONTROLS)?)?
            .into_iter()
            .next();
        self.form = Some(form);
        log::debug!(
            "contact form bound with {} controls via {} submitter",
            self.controls.len(),
            self.submitter.name()
        );
        Ok(())
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        match event {
            PageEvent::Submit { form } if Some(*form) == self.form => {
                ctx.prevent_default();
                self.on_submit(ctx)
            }
            PageEvent::Blur { target } if self.controls.contains(target) => {
                self.validate(*target, ctx)?;
                Ok(())
            }
            PageEvent::Input { target } if self.controls.contains(target) => {
                self.errors.clear(ctx.host(), *target)?;
                Ok(())
            }
            PageEvent::Click { target } => self.on_click(*target, ctx),
            PageEvent::Timer { id, tag: BANNER_EXPIRED } => {
                if self.banner.and_then(|banner| banner.timer) == Some(*id) {
                    if let Some(banner) = self.banner.as_mut() {
                        banner.timer = None;
                    }
                    self.remove_banner(ctx)?;
                }
                Ok(())
            }
            PageEvent::TaskComplete { tag: SUBMISSION, result } => self.on_complete(result, ctx),
            _ => Ok(()),
        }
    }

    fn stop(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        self.remove_banner(ctx)?;
        self.errors.clear_all(ctx.host())?;
        if self.state == SubmissionState::Submitting {
            self.set_pending(ctx, false)?;
            self.state = SubmissionState::Idle;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::testing::Harness;
    use crate::modules::form::SimulatedSubmitter;
    use crate::platform::{Dom, ManualClock};
    use std::time::Duration;

    const PAGE: &str = r#"
        <html><body>
          <form id="contact-form">
            <input name="name" type="text" required>
            <input name="email" type="email" required>
            <input name="phone" type="tel">
            <textarea name="message" required></textarea>
            <button type="submit">Send Message</button>
          </form>
        </body></html>
    "#;

    struct Fixture {
        harness: Harness,
        unit: ContactForm,
        clock: Arc<ManualClock>,
        submitter: Arc<SimulatedSubmitter>,
    }

    fn fixture(failing: bool) -> Fixture {
        fixture_with(PAGE, failing)
    }

    fn fixture_with(page: &str, failing: bool) -> Fixture {
        let clock = Arc::new(ManualClock::new());
        let mut submitter = SimulatedSubmitter::new(clock.clone(), Duration::from_millis(2000));
        if failing {
            submitter = submitter.failing("backend down");
        }
        let submitter = Arc::new(submitter);
        let mut harness = Harness::parse(page);
        let mut unit = ContactForm::new(FormConfig::default(), submitter.clone());
        harness.start(&mut unit).unwrap();
        Fixture {
            harness,
            unit,
            clock,
            submitter,
        }
    }

    impl Fixture {
        fn fill(&mut self, selector: &str, value: &str) {
            let field = self.harness.first(selector);
            self.harness.doc.set_value(field, value).unwrap();
        }

        fn fill_valid(&mut self) {
            self.fill("[name=name]", "Ada Lovelace");
            self.fill("[name=email]", "ada@example.com");
            self.fill("[name=message]", "Hello there");
        }

        fn submit(&mut self) -> bool {
            let form = self.harness.first("#contact-form");
            self.harness.send(&mut self.unit, PageEvent::Submit { form })
        }

        /// Advance page time and the clock the submitter waits on together.
        fn advance(&mut self, ms: u64) {
            for _ in 0..ms {
                self.clock.advance(Duration::from_millis(1));
                self.harness.advance(&mut self.unit, Duration::from_millis(1));
            }
        }

        fn button_label(&self) -> String {
            let button = self.harness.first("button[type=submit]");
            self.harness.doc.text(button).unwrap()
        }

        fn button_disabled(&self) -> bool {
            let button = self.harness.first("button[type=submit]");
            self.harness.doc.attr(button, "disabled").unwrap().is_some()
        }
    }

    #[test]
    fn blur_shows_and_input_clears_field_error() {
        let mut fx = fixture(false);
        fx.fill("[name=email]", "a@b");
        let email = fx.harness.first("[name=email]");
        fx.harness.send(&mut fx.unit, PageEvent::Blur { target: email });
        assert!(fx.harness.doc.has_class(email, "error").unwrap());
        let message = fx.harness.first(".error-message");
        assert_eq!(
            fx.harness.doc.text(message).unwrap(),
            "Please enter a valid e-mail address"
        );

        fx.harness.send(&mut fx.unit, PageEvent::Input { target: email });
        assert!(!fx.harness.doc.has_class(email, "error").unwrap());
        assert!(fx.harness.select(".error-message").is_empty());
    }

    #[test]
    fn invalid_submit_never_reaches_submitter() {
        let mut fx = fixture(false);
        fx.fill("[name=name]", "Ada");
        fx.fill("[name=email]", "not-an-address");

        assert!(fx.submit());
        assert!(fx.submitter.received().is_empty());
        assert_eq!(fx.harness.select(".form-error").len(), 1);
        assert_eq!(fx.harness.select(".error-message").len(), 2);
        assert!(!fx.button_disabled());

        let name = fx.harness.first("[name=name]");
        assert_eq!(fx.harness.doc.value(name).unwrap(), "Ada");
        assert_eq!(fx.unit.state(), SubmissionState::Idle);

        // A retry replaces the banner rather than stacking another.
        fx.submit();
        assert_eq!(fx.harness.select(".form-error").len(), 1);
    }

    #[test]
    fn successful_submission_flow() {
        let mut fx = fixture(false);
        fx.fill_valid();

        assert!(fx.submit());
        assert_eq!(fx.unit.state(), SubmissionState::Submitting);
        assert!(fx.button_disabled());
        assert_eq!(fx.button_label(), "Sending...");

        // A second submit while in flight is ignored.
        fx.submit();
        fx.advance(2001);
        assert_eq!(fx.submitter.received().len(), 1);
        assert_eq!(fx.submitter.received()[0].get("email"), Some("ada@example.com"));

        assert_eq!(fx.unit.state(), SubmissionState::Succeeded);
        assert!(!fx.button_disabled());
        assert_eq!(fx.button_label(), "Send Message");
        assert_eq!(fx.harness.select(".form-success").len(), 1);
        let email = fx.harness.first("[name=email]");
        assert_eq!(fx.harness.doc.value(email).unwrap(), "");

        fx.advance(4990);
        assert_eq!(fx.harness.select(".form-success").len(), 1);
        fx.advance(20);
        assert!(fx.harness.select(".form-success").is_empty());
    }

    #[test]
    fn close_button_dismisses_success_banner() {
        let mut fx = fixture(false);
        fx.fill_valid();
        fx.submit();
        fx.advance(2001);

        let close = fx.harness.first(".close-message");
        fx.harness.send(&mut fx.unit, PageEvent::Click { target: close });
        assert!(fx.harness.select(".form-success").is_empty());
        assert_eq!(fx.harness.scheduler.pending_timers(), 0);
    }

    #[test]
    fn failed_submission_restores_button_and_keeps_values() {
        let mut fx = fixture(true);
        fx.fill_valid();
        fx.submit();
        fx.advance(2001);

        assert_eq!(fx.unit.state(), SubmissionState::Failed);
        assert!(!fx.button_disabled());
        assert_eq!(fx.button_label(), "Send Message");
        assert_eq!(fx.harness.select(".form-error").len(), 1);
        let message = fx.harness.first("[name=message]");
        assert_eq!(fx.harness.doc.value(message).unwrap(), "Hello there");

        // Failure is retryable.
        fx.submit();
        assert_eq!(fx.unit.state(), SubmissionState::Submitting);
        assert!(fx.harness.select(".form-error").is_empty());
    }

    const INPUT_SUBMIT_PAGE: &str = r#"
        <html><body>
          <form id="contact-form">
            <input name="source" type="hidden" value="landing">
            <input name="email" type="email" required>
            <select name="service" required>
              <option value="">Pick one</option>
              <option value="web" selected>Web</option>
            </select>
            <input type="submit" value="Send Message">
          </form>
        </body></html>
    "#;

    #[test]
    fn input_submit_label_is_swapped_and_restored() {
        let mut fx = fixture_with(INPUT_SUBMIT_PAGE, false);
        fx.fill("[name=email]", "ada@example.com");
        let button = fx.harness.first("input[type=submit]");

        assert!(fx.submit());
        assert_eq!(fx.unit.state(), SubmissionState::Submitting);
        assert_eq!(fx.harness.doc.value(button).unwrap(), "Sending...");

        fx.advance(2001);
        assert_eq!(fx.unit.state(), SubmissionState::Succeeded);
        assert_eq!(fx.harness.doc.value(button).unwrap(), "Send Message");
        assert!(fx.harness.doc.attr(button, "disabled").unwrap().is_none());

        let received = fx.submitter.received();
        let sent = &received[0];
        assert_eq!(sent.len(), 3);
        assert_eq!(sent.get("service"), Some("web"));
        assert_eq!(sent.get("source"), Some("landing"));

        let hidden = fx.harness.first("[name=source]");
        assert_eq!(fx.harness.doc.value(hidden).unwrap(), "landing");
        let email = fx.harness.first("[name=email]");
        assert_eq!(fx.harness.doc.value(email).unwrap(), "");
    }

    #[test]
    fn required_select_with_empty_choice_blocks_submit() {
        let mut fx = fixture_with(INPUT_SUBMIT_PAGE, false);
        fx.fill("[name=email]", "ada@example.com");
        fx.fill("[name=service]", "");

        assert!(fx.submit());
        assert_eq!(fx.unit.state(), SubmissionState::Idle);
        assert_eq!(fx.harness.select(".error-message").len(), 1);
        assert!(fx.submitter.received().is_empty());
    }

    #[test]
    fn submission_resolves_when_button_leaves_the_page() {
        let mut fx = fixture(false);
        fx.fill_valid();
        fx.submit();
        let button = fx.harness.first("button[type=submit]");
        fx.harness.doc.remove(button).unwrap();

        fx.advance(2001);
        assert_eq!(fx.unit.state(), SubmissionState::Succeeded);
        assert_eq!(fx.harness.select(".form-success").len(), 1);

        fx.fill_valid();
        fx.submit();
        assert_eq!(fx.unit.state(), SubmissionState::Submitting);
        fx.advance(2001);
        assert_eq!(fx.submitter.received().len(), 2);
        assert_eq!(fx.unit.state(), SubmissionState::Succeeded);
    }
}
