//! Scripted [`LoginPage`] double for driving the login engine without a
//! browser. Tests describe the page as sets of fillable/clickable patterns
//! plus an ordered queue of transitions that fire when a given pattern is
//! clicked, mimicking the screen changes of a real sign-in flow.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::login::LoginPage;
use crate::selectors::Matcher;

fn pattern_of(matcher: &Matcher) -> &'static str {
    match matcher {
        Matcher::Css(p) | Matcher::Text(p) => p,
    }
}

/// Page mutation applied when its trigger pattern is clicked.
#[derive(Default)]
pub struct Transition {
    pub url: Option<String>,
    pub fillable: Option<Vec<String>>,
    pub clickable: Option<Vec<String>>,
    pub login_fields: Option<bool>,
    pub digit_boxes: Option<usize>,
}

struct PageState {
    url: String,
    fillable: BTreeSet<String>,
    clickable: BTreeSet<String>,
    login_fields: bool,
    digit_boxes: usize,
    transitions: VecDeque<(String, Transition)>,
    fills: Vec<(String, String)>,
    clicks: Vec<String>,
    digit_fills: Vec<(usize, char)>,
}

pub struct MockLoginPage {
    state: Mutex<PageState>,
}

impl MockLoginPage {
    pub fn new(url: &str) -> Self {
        Self {
            state: Mutex::new(PageState {
                url: url.to_string(),
                fillable: BTreeSet::new(),
                clickable: BTreeSet::new(),
                login_fields: false,
                digit_boxes: 0,
                transitions: VecDeque::new(),
                fills: Vec::new(),
                clicks: Vec::new(),
                digit_fills: Vec::new(),
            }),
        }
    }

    pub fn with_fillable(self, patterns: &[&str]) -> Self {
        {
            let mut state = self.lock();
            state.fillable = patterns.iter().map(|p| p.to_string()).collect();
            state.login_fields = !state.fillable.is_empty();
        }
        self
    }

    pub fn with_clickable(self, patterns: &[&str]) -> Self {
        self.lock().clickable = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Queue a transition fired by the next click on `pattern`. Transitions
    /// are consumed front to back, so the same pattern can mean different
    /// screen changes at different stages.
    pub fn on_click(self, pattern: &str, transition: Transition) -> Self {
        self.lock()
            .transitions
            .push_back((pattern.to_string(), transition));
        self
    }

    pub fn fills(&self) -> Vec<(String, String)> {
        self.lock().fills.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.lock().clicks.clone()
    }

    pub fn digit_fills(&self) -> Vec<(usize, char)> {
        self.lock().digit_fills.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PageState> {
        self.state.lock().unwrap()
    }
}

impl PageState {
    fn apply(&mut self, transition: Transition) {
        if let Some(url) = transition.url {
            self.url = url;
        }
        if let Some(fillable) = transition.fillable {
            self.fillable = fillable.into_iter().collect();
        }
        if let Some(clickable) = transition.clickable {
            self.clickable = clickable.into_iter().collect();
        }
        if let Some(login_fields) = transition.login_fields {
            self.login_fields = login_fields;
        }
        if let Some(digit_boxes) = transition.digit_boxes {
            self.digit_boxes = digit_boxes;
        }
    }
}

#[async_trait]
impl LoginPage for MockLoginPage {
    async fn current_url(&self) -> Result<String> {
        Ok(self.lock().url.clone())
    }

    async fn try_fill(&self, matcher: &Matcher, value: &str) -> Result<bool> {
        let pattern = pattern_of(matcher);
        let mut state = self.lock();
        if state.fillable.contains(pattern) {
            state.fills.push((pattern.to_string(), value.to_string()));
            return Ok(true);
        }
        Ok(false)
    }

    async fn try_click(&self, matcher: &Matcher) -> Result<bool> {
        let pattern = pattern_of(matcher);
        let mut state = self.lock();
        if !state.clickable.contains(pattern) {
            return Ok(false);
        }
        state.clicks.push(pattern.to_string());
        if state
            .transitions
            .front()
            .is_some_and(|(trigger, _)| trigger == pattern)
        {
            let (_, transition) = state.transitions.pop_front().unwrap();
            state.apply(transition);
        }
        Ok(true)
    }

    async fn login_fields_visible(&self) -> Result<bool> {
        Ok(self.lock().login_fields)
    }

    async fn digit_box_count(&self) -> Result<usize> {
        Ok(self.lock().digit_boxes)
    }

    async fn fill_digit_box(&self, index: usize, digit: char) -> Result<bool> {
        let mut state = self.lock();
        if index < state.digit_boxes {
            state.digit_fills.push((index, digit));
            return Ok(true);
        }
        Ok(false)
    }
}
