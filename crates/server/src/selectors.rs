//! Selector cascades for Okta login UI variants.
//!
//! Each bank is an ordered list of matchers for one semantic role, tried in
//! priority order until one finds a usable element: specific, stable
//! matchers first, generic last-resort matchers (like a bare visible text
//! input) at the end. Supporting a new Okta template means appending a
//! matcher, not branching code.

use serde::Serialize;

/// One UI-element matcher: a CSS selector, or a case-insensitive text
/// pattern matched against clickable elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "lowercase")]
pub enum Matcher {
    Css(&'static str),
    Text(&'static str),
}

pub const USERNAME_SELECTORS: &[Matcher] = &[
    Matcher::Css("#okta-signin-username"),
    Matcher::Css("input[name=\"identifier\"]"),
    Matcher::Css("input[name=\"username\"]"),
    Matcher::Css("input[autocomplete=\"username\"]"),
    Matcher::Css("input[type=\"email\"]"),
    Matcher::Css("input[data-se=\"o-form-input-username\"]"),
    Matcher::Css("input[data-se*=\"username\"]"),
    Matcher::Css("input[id=\"idp-discovery-username\"]"),
    Matcher::Css("input[placeholder*=\"user\" i]"),
    Matcher::Css("input[placeholder*=\"email\" i]"),
    Matcher::Css("input[id*=\"username\" i]"),
    Matcher::Css("input[id*=\"user\" i]"),
    Matcher::Css("input[name*=\"user\"]"),
    Matcher::Css("input[name*=\"login\"]"),
    Matcher::Css("input[name*=\"email\"]"),
    Matcher::Css("input[type=\"text\"]"),
    Matcher::Css("input:not([type])"),
];

pub const PASSWORD_SELECTORS: &[Matcher] = &[
    Matcher::Css("#okta-signin-password"),
    Matcher::Css("input[name=\"password\"]"),
    Matcher::Css("input[autocomplete=\"current-password\"]"),
    Matcher::Css("input[type=\"password\"]"),
    Matcher::Css("input[data-se=\"o-form-input-password\"]"),
    Matcher::Css("input[data-se*=\"password\"]"),
    Matcher::Css("input[placeholder*=\"pass\" i]"),
    Matcher::Css("input[id*=\"password\" i]"),
    Matcher::Css("input[name*=\"pass\"]"),
    Matcher::Css("input[name*=\"pwd\"]"),
];

pub const SUBMIT_SELECTORS: &[Matcher] = &[
    Matcher::Css("button[type=\"submit\"]"),
    Matcher::Css("input[type=\"submit\"]"),
    Matcher::Text("Sign in"),
    Matcher::Text("Log in"),
    Matcher::Css("#okta-signin-submit"),
];

pub const NEXT_SELECTORS: &[Matcher] = &[
    Matcher::Css("button[type=\"submit\"]"),
    Matcher::Css("input[type=\"submit\"]"),
    Matcher::Text("Next"),
    Matcher::Text("Continue"),
];

pub const OTP_SELECTORS: &[Matcher] = &[
    Matcher::Css("input[name=\"credentials.passcode\"]"),
    Matcher::Css("input[name=\"credentials.otp\"]"),
    Matcher::Css("input[name=\"otp\"]"),
    Matcher::Css("input[name=\"code\"]"),
    Matcher::Css("input[name=\"passcode\"]"),
    Matcher::Css("input[autocomplete=\"one-time-code\"]"),
    Matcher::Css("input[inputmode=\"numeric\"]"),
    Matcher::Css("input[type=\"tel\"]"),
    Matcher::Css("input[type=\"text\"][autocomplete=\"off\"]"),
    Matcher::Css("input[id*=\"code\" i]"),
    Matcher::Css("input[placeholder*=\"code\" i]"),
    Matcher::Css("input[placeholder*=\"OTP\" i]"),
    Matcher::Css("input[type=\"text\"]"),
];

pub const MFA_SUBMIT_SELECTORS: &[Matcher] = &[
    Matcher::Css("button[type=\"submit\"]"),
    Matcher::Css("input[type=\"submit\"]"),
    Matcher::Text("Verify"),
    Matcher::Text("Submit"),
];

/// "Use a code instead" affordances across Okta MFA factor pickers.
/// Clicking any of these is best-effort; absence is not an error.
pub const CODE_FACTOR_SELECTORS: &[Matcher] = &[
    Matcher::Text("enter code"),
    Matcher::Text("use code"),
    Matcher::Text("use a code"),
    Matcher::Text("use verification code"),
    Matcher::Text("enter a verification code"),
    Matcher::Text("verification code"),
    Matcher::Text("verify with something else"),
    Matcher::Text("enter a code"),
    Matcher::Text("authenticator app"),
    Matcher::Text("google authenticator"),
    Matcher::Text("okta verify"),
];

/// Login-field probe backing the authentication signal: any of these
/// visible means the page is still presenting a login form.
pub const LOGIN_FIELD_PROBE: &[Matcher] = &[
    Matcher::Css("#okta-signin-username"),
    Matcher::Css("input[name=\"username\"]"),
    Matcher::Css("input[name=\"identifier\"]"),
    Matcher::Css("input[type=\"password\"]"),
    Matcher::Css("#okta-signin-password"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matcher_serializes_for_js_handoff() {
        let json = serde_json::to_value(Matcher::Css("#okta-signin-username")).unwrap();
        assert_eq!(json["kind"], "css");
        assert_eq!(json["pattern"], "#okta-signin-username");

        let json = serde_json::to_value(Matcher::Text("Sign in")).unwrap();
        assert_eq!(json["kind"], "text");
    }

    #[test]
    fn generic_matchers_come_last() {
        // The bare visible-text-input fallbacks must stay at the bottom of
        // their banks; anything after them would never be reached.
        assert_eq!(
            USERNAME_SELECTORS.last(),
            Some(&Matcher::Css("input:not([type])"))
        );
        assert_eq!(
            OTP_SELECTORS.last(),
            Some(&Matcher::Css("input[type=\"text\"]"))
        );
    }
}
