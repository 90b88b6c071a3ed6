use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EvalError;

type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<f32>, EvalError>> + Send + 'a>>;

/// Injected capability scoring how similar two texts are, in `[0, 1]`.
///
/// Consumed by the `CosineSimilarity` comparison strategy; the engine
/// never implements an embedding client itself.
#[async_trait]
pub trait TextSimilarity: Send + Sync {
	async fn similarity(&self, left: &str, right: &str) -> Result<f64, EvalError>;
}

/// Adapter turning an embedding function into a similarity capability
/// via cosine distance.
pub struct EmbeddingSimilarity {
	embed_fn: Arc<dyn for<'a> Fn(&'a str) -> EmbedFuture<'a> + Send + Sync>,
}

impl EmbeddingSimilarity {
	pub fn new(embed_fn: Arc<dyn for<'a> Fn(&'a str) -> EmbedFuture<'a> + Send + Sync>) -> Self {
		Self { embed_fn }
	}
}

#[async_trait]
impl TextSimilarity for EmbeddingSimilarity {
	async fn similarity(&self, left: &str, right: &str) -> Result<f64, EvalError> {
		let l_vec = (self.embed_fn)(left).await?;
		let r_vec = (self.embed_fn)(right).await?;
		Ok(cosine_similarity(&l_vec, &r_vec))
	}
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
	if a.len() != b.len() || a.is_empty() || b.is_empty() {
		return 0.0;
	}

	let mut dot = 0.0f64;
	let mut norm_a = 0.0f64;
	let mut norm_b = 0.0f64;

	for (a_val, b_val) in a.iter().zip(b.iter()) {
		let x = *a_val as f64;
		let y = *b_val as f64;

		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a.sqrt() * norm_b.sqrt())
}
