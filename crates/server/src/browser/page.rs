//! [`LoginPage`] implementation over a chromiumoxide page.
//!
//! Every probe is a single injected-JS evaluation returning JSON, the same
//! shape as the evaluate-probe pattern used for login detection elsewhere
//! in CDP automation. Visibility means non-empty client rects and no
//! `visibility: hidden`. Fills go through the native value setter and fire
//! `input`/`change` so framework-bound widgets (Okta's sign-in widget is
//! one) see the change.

use async_trait::async_trait;
use serde_json::json;

use crate::error::Result;
use crate::login::LoginPage;
use crate::selectors::{LOGIN_FIELD_PROBE, Matcher};

/// Matches the rows of one-character inputs Okta uses for code entry.
const DIGIT_BOX_SELECTOR: &str = "input[aria-label*=\"digit\" i], input[maxlength=\"1\"]";

pub struct PageDriver<'a> {
    page: &'a chromiumoxide::Page,
}

impl<'a> PageDriver<'a> {
    pub fn new(page: &'a chromiumoxide::Page) -> Self {
        Self { page }
    }

    async fn eval_bool(&self, js: String) -> Result<bool> {
        let value: serde_json::Value = self.page.evaluate(js).await?.into_value()?;
        Ok(value.as_bool().unwrap_or(false))
    }
}

/// Shared JS prologue: element lookup by matcher and a visibility check.
const FIND_HELPERS: &str = r#"
  function visible(el) {
    if (!el) return false;
    const style = window.getComputedStyle(el);
    if (style.visibility === 'hidden' || style.display === 'none') return false;
    return el.getClientRects().length > 0;
  }
  function findFirst(matcher) {
    if (matcher.kind === 'css') {
      for (const el of document.querySelectorAll(matcher.pattern)) {
        if (visible(el)) return el;
      }
      return null;
    }
    const needle = matcher.pattern.toLowerCase();
    const clickable = document.querySelectorAll('button, a, [role="button"], input[type="submit"], span, div[tabindex]');
    for (const el of clickable) {
      const text = (el.innerText || el.value || '').trim().toLowerCase();
      if (text && text.includes(needle) && visible(el)) return el;
    }
    return null;
  }
  function setValue(el, value) {
    const proto = el instanceof HTMLTextAreaElement
      ? window.HTMLTextAreaElement.prototype
      : window.HTMLInputElement.prototype;
    const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
    setter.call(el, value);
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
  }
"#;

#[async_trait]
impl LoginPage for PageDriver<'_> {
    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn try_fill(&self, matcher: &Matcher, value: &str) -> Result<bool> {
        let args = json!({ "matcher": matcher, "value": value });
        let js = format!(
            "(function(args) {{ {FIND_HELPERS}
               const el = findFirst(args.matcher);
               if (!el) return false;
               el.focus();
               setValue(el, args.value);
               return true;
             }})({args})"
        );
        self.eval_bool(js).await
    }

    async fn try_click(&self, matcher: &Matcher) -> Result<bool> {
        let args = json!({ "matcher": matcher });
        let js = format!(
            "(function(args) {{ {FIND_HELPERS}
               const el = findFirst(args.matcher);
               if (!el) return false;
               el.click();
               return true;
             }})({args})"
        );
        self.eval_bool(js).await
    }

    async fn login_fields_visible(&self) -> Result<bool> {
        let matchers = serde_json::to_value(LOGIN_FIELD_PROBE)?;
        let js = format!(
            "(function(matchers) {{ {FIND_HELPERS}
               return matchers.some(m => findFirst(m) !== null);
             }})({matchers})"
        );
        self.eval_bool(js).await
    }

    async fn digit_box_count(&self) -> Result<usize> {
        let js = format!(
            "(function() {{ {FIND_HELPERS}
               let n = 0;
               for (const el of document.querySelectorAll('{DIGIT_BOX_SELECTOR}')) {{
                 if (visible(el)) n++;
               }}
               return n;
             }})()"
        );
        let value: serde_json::Value = self.page.evaluate(js).await?.into_value()?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn fill_digit_box(&self, index: usize, digit: char) -> Result<bool> {
        let args = json!({ "index": index, "digit": digit.to_string() });
        let js = format!(
            "(function(args) {{ {FIND_HELPERS}
               const boxes = [...document.querySelectorAll('{DIGIT_BOX_SELECTOR}')].filter(visible);
               const el = boxes[args.index];
               if (!el) return false;
               el.focus();
               setValue(el, args.digit);
               return true;
             }})({args})"
        );
        self.eval_bool(js).await
    }
}
