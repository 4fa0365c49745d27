//! Identifier generation: opaque IDs, slugs and reference codes.
//!
//! Every generator has a `*_with` variant accepting an explicit random source,
//! so the output is deterministic for a seeded generator.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{fmt, ops::RangeInclusive, str::FromStr};

use derive_more::{Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use rand::{rngs::OsRng, RngCore, TryRngCore as _};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use tracing as log;

/// Alphabet of opaque IDs.
const ALPHANUMERIC: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Alphabet of slug suffixes, without the visually ambiguous `i`, `l`, `o`,
/// `0` and `1`.
const UNAMBIGUOUS: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";

/// Alphabet of reference codes.
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Allowed lengths of an opaque ID.
pub const ID_LENGTH: RangeInclusive<usize> = 10..=20;

/// Length of an [`OpaqueId`] generated by [`OpaqueId::generate()`].
pub const DEFAULT_ID_LENGTH: usize = 16;

/// Length of a slug suffix and of a reference code.
const SUFFIX_LENGTH: usize = 6;

/// Upper bound of [`ID_LENGTH`], sizing the inline storage of [`OpaqueId`].
const MAX_ID_LENGTH: usize = 20;

/// Random source backed by the operating system, falling back to the
/// thread-local generator if the former is unavailable.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRng;

impl RngCore for SystemRng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        if let Err(e) = OsRng.try_fill_bytes(dst) {
            log::warn!(
                "OS random source is unavailable, falling back to the \
                 thread-local generator: {e}",
            );
            rand::rng().fill_bytes(dst);
        }
    }
}

/// Generates an opaque alphanumeric ID of the provided `length`.
///
/// The `length` is clamped into [`ID_LENGTH`].
#[must_use]
pub fn generate_id(length: usize) -> String {
    generate_id_with(&mut SystemRng, length)
}

/// Generates an opaque alphanumeric ID of the provided `length` using the
/// provided random source.
///
/// The `length` is clamped into [`ID_LENGTH`].
#[must_use]
pub fn generate_id_with(rng: &mut impl RngCore, length: usize) -> String {
    let length = length.clamp(*ID_LENGTH.start(), *ID_LENGTH.end());
    sample(rng, ALPHANUMERIC, length)
}

/// Converts the provided `title` into a URL slug.
///
/// The `title` is lowercased, non-word characters are stripped, runs of
/// whitespace, `_` and `-` become a single `-`, and leading/trailing `-` are
/// trimmed.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '_' || c == '-' {
            pending_separator = true;
        }
    }
    slug
}

/// Converts the provided `title` into a URL slug with a short random suffix.
#[must_use]
pub fn unique_slug(title: &str) -> String {
    unique_slug_with(&mut SystemRng, title)
}

/// Converts the provided `title` into a URL slug with a short random suffix
/// generated by the provided random source.
#[must_use]
pub fn unique_slug_with(rng: &mut impl RngCore, title: &str) -> String {
    let suffix = sample(rng, UNAMBIGUOUS, SUFFIX_LENGTH);
    let slug = slugify(title);
    if slug.is_empty() {
        suffix
    } else {
        format!("{slug}-{suffix}")
    }
}

/// Generates an uppercase reference code, optionally prefixed
/// (like `OFF-A1B2C3`).
#[must_use]
pub fn reference_code(prefix: Option<&str>) -> String {
    reference_code_with(&mut SystemRng, prefix)
}

/// Generates an uppercase reference code, optionally prefixed, using the
/// provided random source.
#[must_use]
pub fn reference_code_with(
    rng: &mut impl RngCore,
    prefix: Option<&str>,
) -> String {
    let code = sample(rng, UPPERCASE, SUFFIX_LENGTH);
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}-{code}"),
        Some(_) | None => code,
    }
}

/// Opaque alphanumeric identifier stored inline, so it stays [`Copy`].
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OpaqueId {
    /// Number of meaningful bytes in `bytes`.
    len: u8,

    /// ASCII alphanumeric bytes, zero-padded.
    bytes: [u8; MAX_ID_LENGTH],
}

impl OpaqueId {
    /// Generates a new random [`OpaqueId`] of the [`DEFAULT_ID_LENGTH`].
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut SystemRng)
    }

    /// Generates a new [`OpaqueId`] of the [`DEFAULT_ID_LENGTH`] using the
    /// provided random source.
    #[expect(clippy::cast_possible_truncation, reason = "fits into `u8`")]
    #[must_use]
    pub fn generate_with(rng: &mut impl RngCore) -> Self {
        let id = generate_id_with(rng, DEFAULT_ID_LENGTH);
        let mut bytes = [0; MAX_ID_LENGTH];
        bytes[..id.len()].copy_from_slice(id.as_bytes());
        Self {
            len: DEFAULT_ID_LENGTH as u8,
            bytes,
        }
    }

    /// Returns this [`OpaqueId`] as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..usize::from(self.len)])
            .unwrap_or_default()
    }
}

impl fmt::Debug for OpaqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OpaqueId").field(&self.as_str()).finish()
    }
}

impl fmt::Display for OpaqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error of parsing an [`OpaqueId`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("invalid `OpaqueId`: expected 10 to 20 ASCII alphanumerics")]
pub struct InvalidOpaqueId;

impl FromStr for OpaqueId {
    type Err = InvalidOpaqueId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !ID_LENGTH.contains(&s.len())
            || !s.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(InvalidOpaqueId);
        }
        let mut bytes = [0; MAX_ID_LENGTH];
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Ok(Self {
            len: u8::try_from(s.len()).map_err(|_| InvalidOpaqueId)?,
            bytes,
        })
    }
}

impl Serialize for OpaqueId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OpaqueId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl<'a> FromSql<'a> for OpaqueId {
    fn from_sql(
        ty: &Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Ok(<&str>::from_sql(ty, raw)?.parse()?)
    }

    fn accepts(ty: &Type) -> bool {
        <&str as FromSql<'_>>::accepts(ty)
    }
}

#[cfg(feature = "postgres")]
impl ToSql for OpaqueId {
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.as_str().to_sql(ty, w)
    }

    fn accepts(ty: &Type) -> bool {
        <&str as ToSql>::accepts(ty)
    }
}

/// Samples `len` characters uniformly from the provided ASCII `alphabet`.
fn sample(rng: &mut impl RngCore, alphabet: &[u8], len: usize) -> String {
    // Bytes at or above the largest multiple of the alphabet size are
    // rejected, otherwise the first characters would be favored.
    let size = alphabet.len();
    let span = usize::from(u8::MAX) + 1;
    let zone = span - span % size;

    let mut out = String::with_capacity(len);
    let mut buf = [0_u8; 32];
    while out.len() < len {
        rng.fill_bytes(&mut buf);
        for &b in &buf {
            if usize::from(b) < zone && out.len() < len {
                out.push(char::from(alphabet[usize::from(b) % size]));
            }
        }
    }
    out
}

#[cfg(test)]
mod spec {
    use rand::{rngs::StdRng, SeedableRng as _};

    use super::{
        generate_id, generate_id_with, reference_code, reference_code_with,
        slugify, unique_slug, unique_slug_with, OpaqueId, UNAMBIGUOUS,
    };

    #[test]
    fn clamps_id_length() {
        assert_eq!(generate_id(1).len(), 10);
        assert_eq!(generate_id(16).len(), 16);
        assert_eq!(generate_id(64).len(), 20);
        assert!(generate_id(16).chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn ids_do_not_collide() {
        let ids = (0..1000)
            .map(|_| generate_id(16))
            .collect::<std::collections::HashSet<_>>();

        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn deterministic_for_seeded_source() {
        let a = generate_id_with(&mut StdRng::seed_from_u64(7), 16);
        let b = generate_id_with(&mut StdRng::seed_from_u64(7), 16);
        assert_eq!(a, b);

        let a = unique_slug_with(&mut StdRng::seed_from_u64(7), "Acme");
        let b = unique_slug_with(&mut StdRng::seed_from_u64(7), "Acme");
        assert_eq!(a, b);

        let a = reference_code_with(&mut StdRng::seed_from_u64(7), None);
        let b = reference_code_with(&mut StdRng::seed_from_u64(7), None);
        assert_eq!(a, b);
    }

    #[test]
    fn slugifies() {
        assert_eq!(
            slugify("Profitable SaaS Business"),
            "profitable-saas-business",
        );
        assert_eq!(slugify("  --Hello,   World!--  "), "hello-world");
        assert_eq!(slugify("snake_case and-kebab"), "snake-case-and-kebab");
        assert_eq!(slugify("$$$"), "");
        assert_eq!(slugify("R&D Agency 2.0"), "rd-agency-20");
    }

    #[test]
    fn slugify_is_a_fixed_point() {
        for title in [
            "Profitable SaaS Business",
            "  --Hello,   World!--  ",
            "Über café — niche blog",
            "a_b-c d",
            "",
        ] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once, "title: {title:?}");
        }
    }

    #[test]
    fn unique_slug_has_unambiguous_suffix() {
        let slug = unique_slug("Newsletter Empire");
        let (base, suffix) = slug.rsplit_once('-').unwrap();

        assert_eq!(base, "newsletter-empire");
        assert_eq!(suffix.len(), 6);
        assert!(suffix.bytes().all(|b| UNAMBIGUOUS.contains(&b)));
        assert_eq!(unique_slug("!!!").len(), 6);
    }

    #[test]
    fn reference_codes() {
        let code = reference_code(Some("OFF"));
        let (prefix, suffix) = code.split_once('-').unwrap();

        assert_eq!(prefix, "OFF");
        assert_eq!(suffix.len(), 6);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert_eq!(reference_code(None).len(), 6);
        assert_eq!(reference_code(Some("")).len(), 6);
    }

    #[test]
    fn opaque_id_parses_back() {
        let id = OpaqueId::generate();
        let parsed = id.to_string().parse::<OpaqueId>().unwrap();

        assert_eq!(parsed, id);
        assert_eq!(id.as_str().len(), 16);
        assert!("short".parse::<OpaqueId>().is_err());
        assert!("has-a-hyphen-inside".parse::<OpaqueId>().is_err());
        assert_eq!(
            "abcdefghij".parse::<OpaqueId>().unwrap().as_str(),
            "abcdefghij",
        );
    }
}
