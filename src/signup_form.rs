//! View state of the newsletter signup form.
//!
//! The form has two independent pieces of state: the submission `Status` and
//! whether the captcha `Panel` is expanded. Both only change through
//! `SignupForm::apply`, which looks the transition up in a single table
//! (`transition`). Events that have no entry for the current state are ignored.
//!
//! The server replays the events of a form post (`EmailFocused`, `Submitted`,
//! `Responded`) to decide how to render the page; the inline script in the
//! page template applies the same table to focus, outside clicks and
//! dismissal in the browser.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Idle,
    Loading,
    Error,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Collapsed,
    Expanded,
}

/// Result of a submission, as far as the view is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Subscribed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// The email input gained focus
    EmailFocused,
    Submitted,
    Responded(Outcome),
    /// A click anywhere outside the form
    ClickedOutside,
    /// The "ok" button under an error message
    ErrorDismissed,
    /// The "ok" button under the success message
    Reset,
}

/// Side effect of a transition, carried out by `SignupForm::apply`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    None,
    ClearForm,
}

/// The outside-click listener belongs to a mounted form only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listener {
    Detached,
    Attached,
}

/// Transition table: `(status, panel)` x event -> new `(status, panel)`.
/// `None` means the event is ignored in that state.
fn transition(
    status: Status,
    panel: Panel,
    event: Event,
) -> Option<(Status, Panel, Effect)> {
    use Event::*;
    use Panel::*;
    use Status::*;

    let next = match (status, event) {
        // focusing the input reveals the captcha, unless a request is in flight
        (Idle | Error | Success, EmailFocused) => (status, Expanded, Effect::None),

        (Idle | Error, Submitted) => (Loading, panel, Effect::None),

        (Loading, Responded(Outcome::Subscribed)) => (Success, Collapsed, Effect::ClearForm),
        (Loading, Responded(Outcome::Failed)) => (Error, panel, Effect::None),

        // the error message lives inside the panel, so clicking away or
        // dismissing it both return to a collapsed, idle form
        (Error, ClickedOutside | ErrorDismissed) => (Idle, Collapsed, Effect::None),
        (Idle | Success, ClickedOutside) => (status, Collapsed, Effect::None),

        (Idle | Error | Success, Reset) => (Idle, Collapsed, Effect::ClearForm),

        _ => return None,
    };
    Some(next)
}

/// One row of the transition table, in the shape the page script reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub status: Status,
    pub panel: Panel,
    pub event: Event,
    pub next_status: Status,
    pub next_panel: Panel,
    pub clear_form: bool,
}

/// Every transition the browser can trigger without a round trip. A response
/// arrives as a new page, so `Responded` has no rows here.
pub fn browser_transitions() -> Vec<Transition> {
    use Event::*;

    let statuses = [Status::Idle, Status::Loading, Status::Error, Status::Success];
    let panels = [Panel::Collapsed, Panel::Expanded];
    let events = [EmailFocused, Submitted, ClickedOutside, ErrorDismissed, Reset];

    let mut rows = vec![];
    for status in statuses {
        for panel in panels {
            for event in events {
                let Some((next_status, next_panel, effect)) = transition(status, panel, event)
                else {
                    continue;
                };
                rows.push(Transition {
                    status,
                    panel,
                    event,
                    next_status,
                    next_panel,
                    clear_form: effect == Effect::ClearForm,
                });
            }
        }
    }
    rows
}

#[derive(Debug, Clone)]
pub struct SignupForm {
    status: Status,
    panel: Panel,
    listener: Listener,
    /// Current content of the email input
    email: String,
}

impl Default for SignupForm {
    fn default() -> Self {
        Self {
            status: Status::Idle,
            panel: Panel::Collapsed,
            listener: Listener::Detached,
            email: String::new(),
        }
    }
}

impl SignupForm {
    /// A freshly mounted, empty form
    pub fn mounted() -> Self {
        let mut form = Self::default();
        form.mount();
        form
    }

    /// Attach the outside-click listener. An unmounted form never sees
    /// outside clicks. In the browser the listener is detached on `pagehide`.
    fn mount(&mut self) { self.listener = Listener::Attached; }

    pub fn status(&self) -> Status { self.status }

    pub fn panel(&self) -> Panel { self.panel }

    pub fn email(&self) -> &str { &self.email }

    /// Typing into the email input. Ignored while a submission is in flight,
    /// since the fieldset is disabled.
    pub fn input(
        &mut self,
        email: impl Into<String>,
    ) {
        if self.status != Status::Loading {
            self.email = email.into();
        }
    }

    /// Returns whether the event changed anything.
    pub fn apply(
        &mut self,
        event: Event,
    ) -> bool {
        if event == Event::ClickedOutside && self.listener == Listener::Detached {
            return false;
        }
        match transition(self.status, self.panel, event) {
            Some((status, panel, effect)) => {
                let changed = (status, panel) != (self.status, self.panel);
                self.status = status;
                self.panel = panel;
                if effect == Effect::ClearForm {
                    self.email.clear();
                }
                changed || effect == Effect::ClearForm
            }
            None => {
                tracing::debug!(?event, status = ?self.status, "ignored form event");
                false
            }
        }
    }

    /// Replay a completed form post: the user focused the input, typed
    /// `email`, submitted, and the action answered with `outcome`.
    pub fn after_submission(
        email: impl Into<String>,
        outcome: Outcome,
    ) -> Self {
        let mut form = Self::mounted();
        form.apply(Event::EmailFocused);
        form.input(email);
        form.apply(Event::Submitted);
        form.apply(Event::Responded(outcome));
        form
    }

    pub fn is_active(&self) -> bool { self.panel == Panel::Expanded }

    pub fn is_loading(&self) -> bool { self.status == Status::Loading }
}
