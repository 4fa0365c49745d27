//! Macros for defining bounded text types.

/// Macro for defining a bounded text type.
///
/// A bounded text is a non-empty [`String`] without surrounding whitespace
/// and with at most `max_len` characters. It is (de)serialized and stored as
/// a plain string, and validated on every way in.
///
/// The calling crate must depend on [`serde`] directly.
///
/// # Example
///
/// ```rust
/// # use common::define_text;
///
/// define_text! {
///     #[doc = "Name of a pet."]
///     struct PetName(max_len = 8);
/// }
///
/// assert!(PetName::new("Rex").is_some());
/// assert!(PetName::new(" Rex").is_none());
/// assert!(PetName::new("Sir Barksalot").is_none());
/// ```
#[macro_export]
macro_rules! define_text {
    (
        #[doc = $doc:literal]
        struct $name:ident(max_len = $max:expr);
    ) => {
        #[derive(Clone, Debug, Eq, Hash, PartialEq)]
        #[derive(
            $crate::private::serde::Deserialize,
            $crate::private::serde::Serialize,
        )]
        #[doc = $doc]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Maximum number of characters.
            pub const MAX_LEN: usize = $max;

            #[doc = ::core::concat!(
                "Creates a new [`", ::core::stringify!($name),
                "`] if the provided `text` is valid.",
            )]
            #[must_use]
            pub fn new(text: impl Into<String>) -> Option<Self> {
                let text = text.into();
                Self::check(&text).then_some(Self(text))
            }

            /// Returns the text as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Unwraps the inner [`String`].
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            fn check(text: &str) -> bool {
                text.trim() == text
                    && !text.is_empty()
                    && text.chars().count() <= Self::MAX_LEN
            }
        }

        impl ::core::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(
                &self,
                f: &mut ::core::fmt::Formatter<'_>,
            ) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s).ok_or(::core::concat!(
                    "invalid `", ::core::stringify!($name), "`",
                ))
            }
        }

        impl ::core::convert::TryFrom<String> for $name {
            type Error = &'static str;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s).ok_or(::core::concat!(
                    "invalid `", ::core::stringify!($name), "`",
                ))
            }
        }

        impl ::core::convert::From<$name> for String {
            fn from(text: $name) -> Self {
                text.0
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &'a [u8],
            ) -> Result<
                $name,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                let raw = <String as $crate::private::postgres_types::FromSql<'a>>
                    ::from_sql(ty, raw)?;
                Ok(Self::try_from(raw)?)
            }

            fn accepts(ty: &$crate::private::postgres_types::Type) -> bool {
                <String as $crate::private::postgres_types::FromSql<'_>>
                    ::accepts(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                <&str as $crate::private::postgres_types::ToSql>
                    ::to_sql(&self.0.as_str(), ty, w)
            }

            fn accepts(ty: &$crate::private::postgres_types::Type) -> bool {
                <&str as $crate::private::postgres_types::ToSql>::accepts(ty)
            }
        }
    };
}
