//! Process-wide credential store.
//!
//! Keys are configuration read at call time; writing one is an
//! out-of-band configuration change, not part of any evaluation.

use std::sync::RwLock;

static OPENAI_API_KEY: RwLock<Option<String>> = RwLock::new(None);

pub fn set_openai_api_key(key: impl Into<String>) {
	*OPENAI_API_KEY.write().unwrap() = Some(key.into());
}

pub fn openai_api_key() -> Option<String> {
	OPENAI_API_KEY.read().unwrap().clone()
}

pub fn clear_openai_api_key() {
	*OPENAI_API_KEY.write().unwrap() = None;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn set_then_get_round_trips() {
		clear_openai_api_key();
		assert_eq!(openai_api_key(), None);
		set_openai_api_key("sk-test");
		assert_eq!(openai_api_key(), Some("sk-test".to_string()));
		clear_openai_api_key();
	}
}
