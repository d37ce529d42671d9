#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Visit-state gate for the home page.
//!
//! Decides whether a request to `/` gets the introductory page or the main
//! map page, and which cookies to set or expire along the way. All state
//! lives in the client's cookie jar:
//!
//! - `seen` (1 hour) marks a visitor who clicked through the intro once. It
//!   is a one-shot marker: the next GET that observes it expires it.
//! - `skip` (31,104,000 seconds, about a year) marks a visitor who opted
//!   out of the intro.
//!
//! [`decide`] is a pure function of the request's cookies and form fields,
//! so it can be tested without an HTTP stack.

use strum_macros::{AsRefStr, Display, EnumString};

/// Lifetime of the `seen` cookie, in seconds.
pub const SEEN_COOKIE_SECS: i64 = 3_600;

/// Lifetime of the `skip` cookie, in seconds.
pub const SKIP_COOKIE_SECS: i64 = 31_104_000;

/// Form field that marks the intro form as submitted.
pub const POSTED_FIELD: &str = "posted";

/// Form field carrying the "skip the intro from now on" checkbox.
pub const SKIP_FIELD: &str = "skipintro";

/// Cookies the gate reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum VisitCookie {
    /// The visitor clicked through the intro without opting out.
    Seen,
    /// The visitor opted out of the intro.
    Skip,
}

impl VisitCookie {
    /// Cookie name as sent on the wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Seen => "seen",
            Self::Skip => "skip",
        }
    }
}

/// A static landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Page {
    /// The introductory page shown to new visitors.
    Intro,
    /// The main map page.
    Main,
}

/// What to send back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Serve a landing page with status 200.
    Serve(Page),
    /// Redirect (302) to the base path.
    Redirect,
}

/// A cookie mutation to attach to the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieOp {
    /// Set the cookie to expire `max_age_secs` from now.
    Set {
        /// Cookie to set.
        cookie: VisitCookie,
        /// Seconds until expiry.
        max_age_secs: i64,
    },
    /// Expire the cookie immediately.
    Expire(VisitCookie),
}

/// The gate's inputs, taken from the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisitInput<'a> {
    /// Whether the `skip` cookie was sent.
    pub has_skip_cookie: bool,
    /// Whether the `seen` cookie was sent.
    pub has_seen_cookie: bool,
    /// Value of the `posted` form field, empty when absent.
    pub posted: &'a str,
    /// Value of the `skipintro` form field, empty when absent.
    pub skip_intro: &'a str,
}

/// The gate's decision: a response outcome plus cookie mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitDecision {
    /// Page to serve or redirect.
    pub outcome: Outcome,
    /// Cookies to set or expire, in order.
    pub cookies: Vec<CookieOp>,
}

/// Decides the response for a request to the home page.
///
/// A submitted intro form always redirects to the base path after setting
/// `skip` (if the opt-out box was ticked) or `seen`. Otherwise `skip` wins
/// over `seen` when both are present; `seen` alone is expired and the main
/// page served; with neither the intro is served.
#[must_use]
pub fn decide(input: &VisitInput<'_>) -> VisitDecision {
    if !input.posted.is_empty() {
        let op = if input.skip_intro.is_empty() {
            CookieOp::Set {
                cookie: VisitCookie::Seen,
                max_age_secs: SEEN_COOKIE_SECS,
            }
        } else {
            CookieOp::Set {
                cookie: VisitCookie::Skip,
                max_age_secs: SKIP_COOKIE_SECS,
            }
        };

        return VisitDecision {
            outcome: Outcome::Redirect,
            cookies: vec![op],
        };
    }

    if input.has_skip_cookie {
        VisitDecision {
            outcome: Outcome::Serve(Page::Main),
            cookies: vec![],
        }
    } else if input.has_seen_cookie {
        VisitDecision {
            outcome: Outcome::Serve(Page::Main),
            cookies: vec![CookieOp::Expire(VisitCookie::Seen)],
        }
    } else {
        VisitDecision {
            outcome: Outcome::Serve(Page::Intro),
            cookies: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_visitor_gets_intro() {
        let decision = decide(&VisitInput::default());
        assert_eq!(decision.outcome, Outcome::Serve(Page::Intro));
        assert!(decision.cookies.is_empty());
    }

    #[test]
    fn opted_out_visitor_gets_main_without_cookie_changes() {
        let decision = decide(&VisitInput {
            has_skip_cookie: true,
            ..VisitInput::default()
        });
        assert_eq!(decision.outcome, Outcome::Serve(Page::Main));
        assert!(decision.cookies.is_empty());
    }

    #[test]
    fn seen_visitor_gets_main_and_seen_is_expired() {
        let decision = decide(&VisitInput {
            has_seen_cookie: true,
            ..VisitInput::default()
        });
        assert_eq!(decision.outcome, Outcome::Serve(Page::Main));
        assert_eq!(decision.cookies, [CookieOp::Expire(VisitCookie::Seen)]);
    }

    #[test]
    fn skip_wins_when_both_cookies_are_present() {
        let decision = decide(&VisitInput {
            has_skip_cookie: true,
            has_seen_cookie: true,
            ..VisitInput::default()
        });
        assert_eq!(decision.outcome, Outcome::Serve(Page::Main));
        assert!(decision.cookies.is_empty());
    }

    #[test]
    fn posted_without_opt_out_sets_seen_and_redirects() {
        let decision = decide(&VisitInput {
            posted: "true",
            ..VisitInput::default()
        });
        assert_eq!(decision.outcome, Outcome::Redirect);
        assert_eq!(
            decision.cookies,
            [CookieOp::Set {
                cookie: VisitCookie::Seen,
                max_age_secs: 3_600,
            }]
        );
    }

    #[test]
    fn posted_with_opt_out_sets_skip_and_redirects() {
        let decision = decide(&VisitInput {
            posted: "true",
            skip_intro: "on",
            ..VisitInput::default()
        });
        assert_eq!(decision.outcome, Outcome::Redirect);
        assert_eq!(
            decision.cookies,
            [CookieOp::Set {
                cookie: VisitCookie::Skip,
                max_age_secs: 31_104_000,
            }]
        );
    }

    #[test]
    fn posted_form_ignores_existing_cookies() {
        let decision = decide(&VisitInput {
            has_skip_cookie: true,
            has_seen_cookie: true,
            posted: "true",
            skip_intro: "",
        });
        assert_eq!(decision.outcome, Outcome::Redirect);
        assert!(matches!(
            decision.cookies[..],
            [CookieOp::Set {
                cookie: VisitCookie::Seen,
                ..
            }]
        ));
    }

    #[test]
    fn opt_out_without_posted_is_ignored() {
        let decision = decide(&VisitInput {
            skip_intro: "on",
            ..VisitInput::default()
        });
        assert_eq!(decision.outcome, Outcome::Serve(Page::Intro));
        assert!(decision.cookies.is_empty());
    }

    #[test]
    fn cookie_names() {
        assert_eq!(VisitCookie::Seen.name(), "seen");
        assert_eq!(VisitCookie::Skip.name(), "skip");
        assert_eq!(VisitCookie::Skip.to_string(), "skip");
        assert_eq!("seen".parse::<VisitCookie>().unwrap(), VisitCookie::Seen);
    }
}
