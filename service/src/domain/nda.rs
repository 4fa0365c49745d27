//! NDA [`Signature`] definitions.

use std::{sync::LazyLock, time::Duration};

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, ident::OpaqueId, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{listing, user};

/// Proof of a user accepting the confidentiality terms of a listing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    /// ID of this [`Signature`].
    pub id: Id,

    /// ID of the user who signed this [`Signature`].
    pub user_id: user::Id,

    /// ID of the listing this [`Signature`] covers.
    pub listing_id: listing::Id,

    /// [`SignatureName`] typed by the signer.
    pub signature_name: SignatureName,

    /// [`DateTime`] when this [`Signature`] was signed.
    pub signed_at: SigningDateTime,

    /// [`DateTime`] when this [`Signature`] expires.
    pub expires_at: ExpirationDateTime,
}

impl Signature {
    /// Creates a new [`Signature`] signed right now for the provided [`Term`].
    #[must_use]
    pub fn new(
        user_id: user::Id,
        listing_id: listing::Id,
        signature_name: SignatureName,
        term: Term,
    ) -> Self {
        let signed_at = SigningDateTime::now();
        Self {
            id: Id::new(),
            user_id,
            listing_id,
            signature_name,
            signed_at,
            expires_at: (signed_at + term.0).coerce(),
        }
    }

    /// Returns [`Status`] of this [`Signature`] at the provided moment, given
    /// the current status of its listing.
    #[must_use]
    pub fn status(
        &self,
        listing_status: listing::Status,
        now: common::DateTime,
    ) -> Status {
        if listing_status.is_terminal() {
            Status::ListingClosed
        } else if now.coerce() > self.expires_at {
            Status::Expired
        } else {
            Status::Active
        }
    }
}

/// ID of a [`Signature`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(OpaqueId);

impl Id {
    /// Generates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(OpaqueId::generate())
    }
}

/// Full name typed by a signer.
///
/// Must look like a full name: at least two whitespace-separated words,
/// each containing a letter.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq, Serialize)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct SignatureName(String);

impl SignatureName {
    /// Maximum number of characters.
    pub const MAX_LEN: usize = 256;

    /// Creates a new [`SignatureName`] if the provided `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the provided `name` is a valid [`SignatureName`].
    fn check(name: impl AsRef<str>) -> bool {
        static WORD: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\p{L}").expect("valid regex"));

        let name = name.as_ref();
        let mut words = name.split_whitespace();
        name.trim() == name
            && name.chars().count() <= Self::MAX_LEN
            && words.clone().count() >= 2
            && words.all(|w| WORD.is_match(w))
    }
}

impl std::str::FromStr for SignatureName {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `SignatureName`")
    }
}

/// Period an NDA [`Signature`] stays valid for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Term(Duration);

impl Term {
    /// Two years, the platform's standard term.
    pub const DEFAULT: Self = Self(Duration::from_secs(2 * 365 * 24 * 60 * 60));

    /// Creates a new [`Term`] if the provided `duration` is not zero.
    #[must_use]
    pub fn new(duration: Duration) -> Option<Self> {
        (!duration.is_zero()).then_some(Self(duration))
    }

    /// Returns the [`Duration`] of this [`Term`].
    #[must_use]
    pub fn duration(self) -> Duration {
        self.0
    }
}

impl Default for Term {
    fn default() -> Self {
        Self::DEFAULT
    }
}

define_kind! {
    #[doc = "Status of a [`Signature`], computed at read time."]
    enum Status {
        #[doc = "Grants access to confidential fields."]
        Active = 1,

        #[doc = "Term of the [`Signature`] has elapsed."]
        Expired = 2,

        #[doc = "Listing is sold or withdrawn."]
        ListingClosed = 3,
    }
}

/// [`DateTime`] when a [`Signature`] was signed.
pub type SigningDateTime = DateTimeOf<(Signature, unit::Signing)>;

/// [`DateTime`] when a [`Signature`] expires.
pub type ExpirationDateTime = DateTimeOf<(Signature, unit::Expiration)>;
