use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use rubric_types::Verdict;

use crate::check::{subject_text, Check};
use crate::error::EvalError;

/// Permissive URL shape; email-like tokens are filtered out after
/// matching since the candidate must not be an address.
const LINK_PATTERN: &str = r"(?:https?://)?(?:www\.)?\S+\.\S+";

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Single HEAD probe against a URL.
///
/// Implementations must enforce the configured timeout and never retry;
/// the engine treats one failed attempt as definitive.
#[async_trait]
pub trait UrlProber: Send + Sync {
	async fn head(&self, url: &str) -> Result<u16, EvalError>;
}

/// Default prober backed by reqwest with a per-request timeout.
pub struct HttpProber {
	client: reqwest::Client,
	timeout: Duration,
}

impl HttpProber {
	pub fn new(timeout: Duration) -> Self {
		Self { client: reqwest::Client::new(), timeout }
	}
}

impl Default for HttpProber {
	fn default() -> Self {
		Self::new(DEFAULT_PROBE_TIMEOUT)
	}
}

#[async_trait]
impl UrlProber for HttpProber {
	async fn head(&self, url: &str) -> Result<u16, EvalError> {
		let response = self
			.client
			.head(url)
			.timeout(self.timeout)
			.send()
			.await
			.map_err(|e| EvalError::Unreachable { url: url.to_string(), message: e.to_string() })?;
		Ok(response.status().as_u16())
	}
}

fn link_regex() -> Result<Regex, EvalError> {
	Ok(Regex::new(LINK_PATTERN)?)
}

/// First URL-like token in the text, skipping email-like tokens.
fn find_link<'a>(pattern: &Regex, text: &'a str) -> Option<&'a str> {
	pattern
		.find_iter(text)
		.map(|m| m.as_str())
		.find(|token| !token.contains('@'))
}

fn standardize_url(url: &str) -> String {
	if url.starts_with("http://") || url.starts_with("https://") {
		url.to_string()
	} else {
		format!("http://{url}")
	}
}

/// Probe one link; every outcome, including transport failure, resolves
/// to a Verdict with the status captured in the reason.
async fn probe_link(prober: &dyn UrlProber, link: &str) -> Verdict {
	let target = standardize_url(link);
	match prober.head(&target).await {
		Ok(200) => Verdict::pass(format!("link {link} found in output and is valid (status 200)")),
		Ok(status) => {
			Verdict::fail(format!("link {link} found in output but is invalid (status {status})"))
				.with_details(json!({"status": status}))
		}
		Err(e) => {
			tracing::warn!(link, error = %e, "link probe failed");
			Verdict::fail(format!("link {link} found in output but is unreachable"))
		}
	}
}

/// Checks that the subject contains a URL-like token. No probe.
pub struct ContainsLink {
	pattern: Regex,
}

impl ContainsLink {
	pub fn new() -> Result<Self, EvalError> {
		Ok(Self { pattern: link_regex()? })
	}
}

#[async_trait]
impl Check for ContainsLink {
	fn name(&self) -> &'static str {
		"ContainsLink"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = subject_text(subject);
		let verdict = match find_link(&self.pattern, &text) {
			Some(_) => Verdict::pass("link found in output"),
			None => Verdict::fail("no link found in output"),
		};
		Ok(verdict)
	}
}

/// Checks that the subject contains a link and that the link answers a
/// HEAD probe with status 200. Fails when no link is present.
pub struct ContainsValidLink {
	pattern: Regex,
	prober: Arc<dyn UrlProber>,
}

impl ContainsValidLink {
	pub fn new(prober: Arc<dyn UrlProber>) -> Result<Self, EvalError> {
		Ok(Self { pattern: link_regex()?, prober })
	}
}

#[async_trait]
impl Check for ContainsValidLink {
	fn name(&self) -> &'static str {
		"ContainsValidLink"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = subject_text(subject);
		let verdict = match find_link(&self.pattern, &text) {
			Some(link) => probe_link(self.prober.as_ref(), link).await,
			None => Verdict::fail("no link found in output"),
		};
		Ok(verdict)
	}
}

/// Checks that the subject contains no broken link. A subject with no
/// link at all passes: absence of a link is not an invalid link.
pub struct NoInvalidLinks {
	pattern: Regex,
	prober: Arc<dyn UrlProber>,
}

impl NoInvalidLinks {
	pub fn new(prober: Arc<dyn UrlProber>) -> Result<Self, EvalError> {
		Ok(Self { pattern: link_regex()?, prober })
	}
}

#[async_trait]
impl Check for NoInvalidLinks {
	fn name(&self) -> &'static str {
		"NoInvalidLinks"
	}

	async fn check(&self, subject: &Value) -> Result<Verdict, EvalError> {
		let text = subject_text(subject);
		let verdict = match find_link(&self.pattern, &text) {
			Some(link) => probe_link(self.prober.as_ref(), link).await,
			None => Verdict::pass("no invalid link found in output"),
		};
		Ok(verdict)
	}
}
