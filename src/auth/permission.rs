//! Permission set modeling used by authorization checks.

// std
use std::slice::Iter;
// crates.io
use serde::{Deserializer, Serializer, ser::SerializeSeq};
// self
use crate::{_prelude::*, auth::PermissionCode};

/// Normalized, deduplicated set of permission codes held by a user.
///
/// Codes are kept sorted so membership checks are a binary search and equality does not depend
/// on the order codes were granted in.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
	codes: Arc<[PermissionCode]>,
}
impl PermissionSet {
	/// Creates a normalized permission set from any iterator of codes.
	pub fn new<I>(codes: I) -> Self
	where
		I: IntoIterator<Item = PermissionCode>,
	{
		let set = codes.into_iter().collect::<BTreeSet<_>>();

		Self { codes: Arc::from(set.into_iter().collect::<Vec<_>>()) }
	}

	/// Number of distinct codes.
	pub fn len(&self) -> usize {
		self.codes.len()
	}

	/// Returns true if no codes are granted.
	pub fn is_empty(&self) -> bool {
		self.codes.is_empty()
	}

	/// Returns true if the set grants `code`.
	pub fn contains(&self, code: &str) -> bool {
		self.codes.binary_search_by(|candidate| candidate.as_ref().cmp(code)).is_ok()
	}

	/// Iterator over the granted codes in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.codes.iter().map(|code| code.as_ref())
	}

	/// Returns a new set holding the union of `self` and `codes`.
	pub fn with<I>(&self, codes: I) -> Self
	where
		I: IntoIterator<Item = PermissionCode>,
	{
		Self::new(self.codes.iter().cloned().chain(codes))
	}
}
impl Debug for PermissionSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.iter()).finish()
	}
}
impl FromIterator<PermissionCode> for PermissionSet {
	fn from_iter<T: IntoIterator<Item = PermissionCode>>(iter: T) -> Self {
		Self::new(iter)
	}
}

/// Iterator over permission codes.
pub struct PermissionIter<'a> {
	inner: Iter<'a, PermissionCode>,
}
impl<'a> Iterator for PermissionIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|code| code.as_ref())
	}
}
impl<'a> IntoIterator for &'a PermissionSet {
	type IntoIter = PermissionIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		PermissionIter { inner: self.codes.iter() }
	}
}
impl Serialize for PermissionSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.codes.len()))?;

		for code in self.codes.iter() {
			seq.serialize_element(code)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for PermissionSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let codes = <Vec<PermissionCode>>::deserialize(deserializer)?;

		Ok(Self::new(codes))
	}
}
