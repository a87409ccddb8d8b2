//! Login engine flow tests driven through scripted pages. Paused tokio time
//! fast-forwards the engine's bounded waits, so a full attempt runs in
//! microseconds of wall clock.

use okta_auth_mcp::login::{Credentials, auto_login, is_authenticated};
use okta_auth_mcp::testing::{MockLoginPage, Transition};

const USERNAME: &str = "#okta-signin-username";
const PASSWORD: &str = "#okta-signin-password";
const SUBMIT: &str = "button[type=\"submit\"]";

const IDP_URL: &str = "https://corp.okta.com/login";
const APP_URL: &str = "https://portal.example.com/home";

fn creds() -> Credentials {
    Credentials {
        identifier: Some("alex@example.com".to_string()),
        secret: Some("hunter2".to_string()),
        totp_seed: None,
    }
}

fn authenticated_transition() -> Transition {
    Transition {
        url: Some(APP_URL.to_string()),
        fillable: Some(vec![]),
        login_fields: Some(false),
        ..Transition::default()
    }
}

#[tokio::test(start_paused = true)]
async fn single_step_login_succeeds() {
    let page = MockLoginPage::new(IDP_URL)
        .with_fillable(&[USERNAME, PASSWORD])
        .with_clickable(&[SUBMIT])
        .on_click(SUBMIT, authenticated_transition());

    assert!(auto_login(&page, &creds()).await.unwrap());

    let fills = page.fills();
    assert_eq!(fills[0], (USERNAME.to_string(), "alex@example.com".to_string()));
    assert_eq!(fills[1], (PASSWORD.to_string(), "hunter2".to_string()));
    assert_eq!(page.clicks(), vec![SUBMIT.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn two_step_login_waits_for_secret_field() {
    // The secret field only exists after the "next" click.
    let page = MockLoginPage::new(IDP_URL)
        .with_fillable(&[USERNAME])
        .with_clickable(&[SUBMIT])
        .on_click(
            SUBMIT,
            Transition {
                fillable: Some(vec![PASSWORD.to_string()]),
                ..Transition::default()
            },
        )
        .on_click(SUBMIT, authenticated_transition());

    assert!(auto_login(&page, &creds()).await.unwrap());

    let fills = page.fills();
    assert_eq!(fills.len(), 2);
    assert_eq!(fills[1].0, PASSWORD);
    // One click for "next", one for the credential submit.
    assert_eq!(page.clicks().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn mfa_code_is_distributed_across_digit_boxes() {
    let page = MockLoginPage::new(IDP_URL)
        .with_fillable(&[USERNAME, PASSWORD])
        .with_clickable(&[SUBMIT])
        .on_click(
            SUBMIT,
            Transition {
                fillable: Some(vec![]),
                login_fields: Some(false),
                digit_boxes: Some(6),
                ..Transition::default()
            },
        )
        .on_click(SUBMIT, authenticated_transition());

    let creds = Credentials {
        totp_seed: Some("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ".to_string()),
        ..creds()
    };
    assert!(auto_login(&page, &creds).await.unwrap());

    let digit_fills = page.digit_fills();
    assert_eq!(digit_fills.len(), 6);
    for (slot, (index, digit)) in digit_fills.iter().enumerate() {
        assert_eq!(*index, slot);
        assert!(digit.is_ascii_digit());
    }
    // Credential submit followed by MFA submit.
    assert_eq!(page.clicks().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn too_few_digit_boxes_fails_the_attempt() {
    let page = MockLoginPage::new(IDP_URL)
        .with_fillable(&[USERNAME, PASSWORD])
        .with_clickable(&[SUBMIT])
        .on_click(
            SUBMIT,
            Transition {
                fillable: Some(vec![]),
                digit_boxes: Some(4),
                ..Transition::default()
            },
        );

    let creds = Credentials {
        totp_seed: Some("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ".to_string()),
        ..creds()
    };
    assert!(!auto_login(&page, &creds).await.unwrap());
    assert!(page.digit_fills().is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_secret_field_exhausts_the_wait() {
    // Identifier-only screen where nothing can be clicked and the secret
    // field never materializes.
    let page = MockLoginPage::new(IDP_URL).with_fillable(&[USERNAME]);

    assert!(!auto_login(&page, &creds()).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn login_on_authenticated_page_is_a_noop() {
    let page = MockLoginPage::new(APP_URL);

    assert!(auto_login(&page, &creds()).await.unwrap());
    assert!(page.fills().is_empty());
    assert!(page.clicks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_credentials_skip_the_attempt() {
    let page = MockLoginPage::new(IDP_URL).with_fillable(&[USERNAME, PASSWORD]);

    let creds = Credentials {
        identifier: Some("alex@example.com".to_string()),
        ..Credentials::default()
    };
    assert!(!auto_login(&page, &creds).await.unwrap());
    assert!(page.fills().is_empty());
}

#[tokio::test(start_paused = true)]
async fn idp_host_is_never_authenticated() {
    let page = MockLoginPage::new(IDP_URL);
    assert!(!is_authenticated(&page).await);

    let page = MockLoginPage::new(APP_URL);
    assert!(is_authenticated(&page).await);
}
