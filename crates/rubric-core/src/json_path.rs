use serde_json::Value;

/// Result of resolving a JSON path: either the located value (which may
/// legitimately be `null`) or a distinct absent marker when the path did
/// not resolve.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
	Present(Value),
	Absent,
}

impl Extracted {
	pub fn is_absent(&self) -> bool {
		matches!(self, Extracted::Absent)
	}

	/// Text form of a present value; `None` when absent.
	pub fn as_text(&self) -> Option<String> {
		match self {
			Extracted::Present(v) => Some(crate::check::subject_text(v)),
			Extracted::Absent => None,
		}
	}
}

/// Resolve a dotted/bracketed path expression (`a.b[0].c`, with an
/// optional leading `$.`) against a JSON value.
///
/// Missing intermediate keys, out-of-range indices, and type mismatches
/// (indexing into a scalar) all resolve to [`Extracted::Absent`]; this
/// function never fails.
pub fn extract_json_path(root: &Value, path: &str) -> Extracted {
	let path = path.strip_prefix("$.").or_else(|| path.strip_prefix('$')).unwrap_or(path);
	if path.is_empty() {
		return Extracted::Present(root.clone());
	}

	let mut current = root;
	for segment in path.split('.') {
		let (key, indices) = match parse_segment(segment) {
			Some(parsed) => parsed,
			None => return Extracted::Absent,
		};
		if !key.is_empty() {
			current = match current.get(key) {
				Some(next) => next,
				None => return Extracted::Absent,
			};
		}
		for index in indices {
			current = match current.get(index) {
				Some(next) => next,
				None => return Extracted::Absent,
			};
		}
	}
	Extracted::Present(current.clone())
}

/// `"items[0][1]"` → `("items", [0, 1])`; `"items"` → `("items", [])`.
fn parse_segment(segment: &str) -> Option<(&str, Vec<usize>)> {
	let open = match segment.find('[') {
		None => return Some((segment, Vec::new())),
		Some(i) => i,
	};
	let key = &segment[..open];
	let mut indices = Vec::new();
	let mut rest = &segment[open..];
	while !rest.is_empty() {
		if !rest.starts_with('[') {
			return None;
		}
		let close = rest.find(']')?;
		let index: usize = rest[1..close].parse().ok()?;
		indices.push(index);
		rest = &rest[close + 1..];
	}
	Some((key, indices))
}
