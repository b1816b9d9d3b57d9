//! # Scopes and the Digest Engine
//!
//! A [`Scope`] is a named value to be digested together with the fields
//! that must be removed first. The exclusion rules are fixed per
//! [`ScopeKind`], so a transcript can never be digested with its own
//! `transcript_digest` still attached.
//!
//! ## Two digest paths
//!
//! - [`digest`] is the read-only path used for recomputation: drop the
//!   excluded fields from a working copy, canonicalize, hash.
//! - [`digest_unsealed`] is the sealing path. Before hashing it asserts that
//!   every self-referential field of the scope kind is absent or `null`, and
//!   fails with `CircularDigestDependency` otherwise.
//!
//! Both are pure functions of their input. The caller's value is never
//! mutated.

use std::fmt;
use std::str::FromStr;

use crate::canonical::{canonicalize, CanonicalValue};
use crate::digest::{sha256_digest, ContentDigest};
use crate::error::FossilError;

/// Field holding a transcript's own digest.
pub const TRANSCRIPT_DIGEST_FIELD: &str = "transcript_digest";
/// Field holding an external signature over the transcript digest.
pub const ATTESTATION_SIGNATURE_FIELD: &str = "attestation.signature";
/// Field holding an envelope's own digest.
pub const ARTIFACT_DIGEST_FIELD: &str = "artifact_digest";

/// A dotted path to a field inside nested mappings, e.g. `attestation.signature`.
///
/// A key that itself contains a dot is written with `\.`, so `a\.b` names
/// the top-level key `a.b`. A literal backslash is `\\`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Split a dotted path into segments, honoring `\.` and `\\` escapes.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = path.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => current.push(chars.next().unwrap_or('\\')),
                '.' => segments.push(std::mem::take(&mut current)),
                other => current.push(other),
            }
        }
        segments.push(current);
        Self(segments)
    }

    /// Build a path from raw segments; dots inside a segment are literal.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Borrow the value at this path, if every segment resolves.
    pub fn get<'a>(&self, value: &'a CanonicalValue) -> Option<&'a CanonicalValue> {
        self.0
            .iter()
            .try_fold(value, |current, segment| current.get(segment))
    }

    /// Remove the value at this path. Absent paths and paths through
    /// non-mappings are a no-op.
    pub fn remove_from(&self, value: &mut CanonicalValue) -> Option<CanonicalValue> {
        let (last, parents) = self.0.split_last()?;
        let mut current = value;
        for segment in parents {
            current = current.as_mapping_mut()?.get_mut(segment)?;
        }
        current.as_mapping_mut()?.remove(last)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let escaped: Vec<String> = self
            .0
            .iter()
            .map(|segment| segment.replace('\\', "\\\\").replace('.', "\\."))
            .collect();
        f.write_str(&escaped.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// The kind of a scope, which fixes its exclusion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// An independent component object.
    Component,
    /// The initial state derived from the raw input.
    InitialState,
    /// The control sequence derived from the raw input.
    Controls,
    /// The input reference: digests of every raw input scope.
    Inputs,
    /// One per-step snapshot; a Merkle leaf.
    Snapshot,
    /// The full transcript.
    Transcript,
    /// The top-level envelope.
    Envelope,
    /// Anything else; exclusions are supplied by the caller.
    Custom,
}

impl ScopeKind {
    /// Fields always removed before digesting a scope of this kind.
    pub fn exclusions(&self) -> &'static [&'static str] {
        match self {
            Self::Transcript => &[TRANSCRIPT_DIGEST_FIELD, ATTESTATION_SIGNATURE_FIELD],
            Self::Envelope => &[ARTIFACT_DIGEST_FIELD],
            _ => &[],
        }
    }

    /// Fields that will hold this scope's own digest. They must be
    /// placeholders when the scope is sealed.
    pub fn self_referential_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Transcript => &[TRANSCRIPT_DIGEST_FIELD],
            Self::Envelope => &[ARTIFACT_DIGEST_FIELD],
            _ => &[],
        }
    }

    /// Lowercase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::InitialState => "initial_state",
            Self::Controls => "controls",
            Self::Inputs => "inputs",
            Self::Snapshot => "snapshot",
            Self::Transcript => "transcript",
            Self::Envelope => "envelope",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named logical unit to be digested.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    name: String,
    kind: ScopeKind,
    value: CanonicalValue,
    extra_exclusions: Vec<FieldPath>,
}

impl Scope {
    /// Create a scope of the given kind.
    pub fn new(kind: ScopeKind, name: impl Into<String>, value: CanonicalValue) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
            extra_exclusions: Vec::new(),
        }
    }

    /// A component object, named `component:<name>`.
    pub fn component(name: &str, value: CanonicalValue) -> Self {
        Self::new(ScopeKind::Component, format!("component:{name}"), value)
    }

    /// The initial-state scope.
    pub fn initial_state(value: CanonicalValue) -> Self {
        Self::new(ScopeKind::InitialState, "initial_state", value)
    }

    /// The control-sequence scope.
    pub fn controls(value: CanonicalValue) -> Self {
        Self::new(ScopeKind::Controls, "controls", value)
    }

    /// The input-reference scope.
    pub fn inputs(value: CanonicalValue) -> Self {
        Self::new(ScopeKind::Inputs, "inputs", value)
    }

    /// The snapshot at `index`, named `snapshot[<index>]`.
    pub fn snapshot(index: usize, value: CanonicalValue) -> Self {
        Self::new(ScopeKind::Snapshot, format!("snapshot[{index}]"), value)
    }

    /// The transcript scope.
    pub fn transcript(value: CanonicalValue) -> Self {
        Self::new(ScopeKind::Transcript, "transcript", value)
    }

    /// The envelope scope.
    pub fn envelope(value: CanonicalValue) -> Self {
        Self::new(ScopeKind::Envelope, "envelope", value)
    }

    /// A caller-defined scope with no built-in exclusions.
    pub fn custom(name: impl Into<String>, value: CanonicalValue) -> Self {
        Self::new(ScopeKind::Custom, name, value)
    }

    /// Add an exclusion on top of the kind's fixed set.
    pub fn with_exclusion(mut self, path: impl Into<FieldPath>) -> Self {
        self.extra_exclusions.push(path.into());
        self
    }

    /// The scope name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scope kind.
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// The value as supplied, exclusions not applied.
    pub fn value(&self) -> &CanonicalValue {
        &self.value
    }

    /// Every excluded path: the kind's fixed set followed by extras.
    pub fn exclusions(&self) -> Vec<FieldPath> {
        self.kind
            .exclusions()
            .iter()
            .map(|p| FieldPath::parse(p))
            .chain(self.extra_exclusions.iter().cloned())
            .collect()
    }

    /// A copy of the value with every excluded path removed.
    pub fn working_copy(&self) -> CanonicalValue {
        let mut copy = self.value.clone();
        for path in self.exclusions() {
            path.remove_from(&mut copy);
        }
        copy
    }
}

/// Digest a scope: exclude, canonicalize, SHA-256.
///
/// Excluding a field that is not present is a no-op.
pub fn digest(scope: &Scope) -> Result<ContentDigest, FossilError> {
    let bytes = canonicalize(&scope.working_copy())?;
    Ok(sha256_digest(&bytes))
}

/// Digest a scope that is being sealed.
///
/// Fails with `CircularDigestDependency` when a field that is meant to
/// receive this scope's digest already holds a non-null value.
pub fn digest_unsealed(scope: &Scope) -> Result<ContentDigest, FossilError> {
    for field in scope.kind.self_referential_fields() {
        let path = FieldPath::parse(field);
        if path.get(&scope.value).is_some_and(|v| !v.is_null()) {
            return Err(FossilError::CircularDigestDependency {
                scope: scope.name.clone(),
                field: path.to_string(),
            });
        }
    }
    digest(scope)
}

/// Outcome of checking a digest stored inside the value it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedDigestCheck {
    /// The digest found in the value.
    pub stored: ContentDigest,
    /// The digest recomputed with the digest field removed.
    pub computed: ContentDigest,
}

impl EmbeddedDigestCheck {
    /// True when the stored digest is correct.
    pub fn matches(&self) -> bool {
        self.stored == self.computed
    }
}

/// Verify an artifact that carries its own digest in `field`.
///
/// The field is removed from a copy, the remainder is digested, and the
/// result is compared against the stored value.
pub fn verify_embedded_digest(
    value: &CanonicalValue,
    field: &str,
) -> Result<EmbeddedDigestCheck, FossilError> {
    let path = FieldPath::parse(field);
    let stored = path
        .get(value)
        .ok_or_else(|| FossilError::MissingScope(format!("embedded digest field `{field}`")))?;
    let stored = match stored.as_str() {
        Some(text) => ContentDigest::parse(text)?,
        None => {
            return Err(FossilError::MalformedDigest {
                value: stored.kind().to_string(),
                reason: "digest field must hold a string",
            })
        }
    };
    let computed = digest(&Scope::custom(field, value.clone()).with_exclusion(path))?;
    Ok(EmbeddedDigestCheck { stored, computed })
}
