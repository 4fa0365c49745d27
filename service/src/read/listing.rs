//! [`Listing`] read model definitions.

use common::{DateTime, Money, Percent};
use serde::Serialize;

use crate::domain::{
    listing::{self, Listing, Multiple},
    nda, user, Viewer,
};

/// How much of a [`Listing`] a viewer is allowed to see.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Visibility {
    /// Public fields only.
    Redacted,

    /// Public and confidential fields.
    Full,

    /// Everything, including the seller's own bookkeeping.
    Owner,
}

impl Visibility {
    /// Decides what the provided [`Viewer`] may see of the provided
    /// [`Listing`], given the viewer's NDA [`nda::Signature`] for it, if any.
    ///
    /// Never fails: a missing or lapsed NDA results in
    /// [`Visibility::Redacted`].
    #[must_use]
    pub fn of(
        viewer: &Viewer,
        listing: &Listing,
        signature: Option<&nda::Signature>,
        now: DateTime,
    ) -> Self {
        if viewer.is_admin() || viewer.is(listing.seller_id) {
            return Self::Owner;
        }
        if !listing.nda_required {
            return Self::Full;
        }
        let signed = signature.is_some_and(|s| {
            viewer.is(s.user_id)
                && s.listing_id == listing.id
                && s.status(listing.status, now) == nda::Status::Active
        });
        if signed {
            Self::Full
        } else {
            Self::Redacted
        }
    }
}

/// Fields of a [`Listing`] visible to a specific viewer.
///
/// Serializes into a flat map where the fields hidden by the [`Visibility`]
/// are absent rather than `null`.
#[derive(Clone, Debug, Serialize)]
pub struct FieldSet {
    /// Fields visible to everyone.
    #[serde(flatten)]
    pub public: PublicFields,

    /// Fields visible under NDA.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub confidential: Option<ConfidentialFields>,

    /// Fields visible to the seller and admins.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub ownership: Option<OwnershipFields>,

    /// [`Visibility`] these fields were cut to.
    #[serde(skip)]
    visibility: Visibility,
}

impl FieldSet {
    /// Cuts the provided [`Listing`] to the provided [`Visibility`].
    #[must_use]
    pub fn new(listing: &Listing, visibility: Visibility) -> Self {
        let confidential = (visibility >= Visibility::Full).then(|| {
            ConfidentialFields {
                revenue: listing.revenue,
                profit: listing.profit,
                margin: listing.margin(),
                multiple: listing.multiple(),
                description: listing.description.clone(),
                website_url: listing.website_url.clone(),
                seller_contact: listing.seller_contact.clone(),
                confidential_notes: listing.confidential_notes.clone(),
            }
        });
        let ownership = (visibility == Visibility::Owner).then(|| {
            OwnershipFields {
                seller_id: listing.seller_id,
                rejection_reason: listing.rejection_reason.clone(),
                created_at: listing.created_at,
                updated_at: listing.updated_at,
            }
        });
        Self {
            public: PublicFields {
                id: listing.id,
                slug: listing.slug.clone(),
                title: listing.title.clone(),
                summary: listing.summary.clone(),
                category: listing.category,
                business_model: listing.business_model,
                asking_price: listing.asking_price,
                status: listing.status,
                is_verified: listing.is_verified,
                is_confidential: listing.is_confidential,
                nda_required: listing.nda_required,
                founded_year: listing.founded_year,
                monthly_visitors: listing.monthly_visitors,
                listed_at: listing.listed_at,
            },
            confidential,
            ownership,
            visibility,
        }
    }

    /// Returns [`Visibility`] of this [`FieldSet`].
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }
}

/// [`Listing`] fields visible to everyone.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicFields {
    /// [`Listing::id`].
    pub id: listing::Id,

    /// [`Listing::slug`].
    pub slug: Option<listing::Slug>,

    /// [`Listing::title`].
    pub title: listing::Title,

    /// [`Listing::summary`].
    pub summary: Option<listing::Summary>,

    /// [`Listing::category`].
    pub category: listing::Category,

    /// [`Listing::business_model`].
    pub business_model: listing::BusinessModel,

    /// [`Listing::asking_price`].
    pub asking_price: Money,

    /// [`Listing::status`].
    pub status: listing::Status,

    /// [`Listing::is_verified`].
    pub is_verified: bool,

    /// [`Listing::is_confidential`].
    pub is_confidential: bool,

    /// [`Listing::nda_required`].
    pub nda_required: bool,

    /// [`Listing::founded_year`].
    pub founded_year: Option<listing::FoundedYear>,

    /// [`Listing::monthly_visitors`].
    pub monthly_visitors: Option<listing::MonthlyVisitors>,

    /// [`Listing::listed_at`].
    pub listed_at: Option<listing::ListingDateTime>,
}

/// [`Listing`] fields visible under NDA.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidentialFields {
    /// [`Listing::revenue`].
    pub revenue: Option<Money>,

    /// [`Listing::profit`].
    pub profit: Option<Money>,

    /// [`Listing::margin()`].
    pub margin: Option<Percent>,

    /// [`Listing::multiple()`].
    pub multiple: Option<Multiple>,

    /// [`Listing::description`].
    pub description: Option<listing::Description>,

    /// [`Listing::website_url`].
    pub website_url: Option<listing::WebsiteUrl>,

    /// [`Listing::seller_contact`].
    pub seller_contact: Option<listing::SellerContact>,

    /// [`Listing::confidential_notes`].
    pub confidential_notes: Option<listing::ConfidentialNotes>,
}

/// [`Listing`] fields visible to its seller and admins.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipFields {
    /// [`Listing::seller_id`].
    pub seller_id: user::Id,

    /// [`Listing::rejection_reason`].
    pub rejection_reason: Option<listing::RejectionReason>,

    /// [`Listing::created_at`].
    pub created_at: listing::CreationDateTime,

    /// [`Listing::updated_at`].
    pub updated_at: listing::ModificationDateTime,
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::domain::{
        listing::{self, spec::draft},
        nda, user, Viewer,
    };

    use super::{FieldSet, Visibility};

    const CONFIDENTIAL: &[&str] = &[
        "revenue",
        "profit",
        "margin",
        "multiple",
        "description",
        "websiteUrl",
        "sellerContact",
        "confidentialNotes",
    ];

    fn keys(fields: &FieldSet) -> Vec<String> {
        serde_json::to_value(fields)
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }

    fn signature(
        user_id: user::Id,
        listing_id: listing::Id,
    ) -> nda::Signature {
        nda::Signature::new(
            user_id,
            listing_id,
            nda::SignatureName::new("Jane Doe").unwrap(),
            nda::Term::DEFAULT,
        )
    }

    #[test]
    fn owner_and_admin_see_everything() {
        let listing = draft();
        let now = DateTime::now();

        assert_eq!(
            Visibility::of(&Viewer::User(listing.seller_id), &listing, None, now),
            Visibility::Owner,
        );
        assert_eq!(
            Visibility::of(&Viewer::Admin(user::Id::new()), &listing, None, now),
            Visibility::Owner,
        );
    }

    #[test]
    fn nda_gates_confidential_fields() {
        let mut listing = draft();
        listing.status = listing::Status::Active;
        let buyer = user::Id::new();
        let now = DateTime::now();

        for viewer in [Viewer::Anonymous, Viewer::User(buyer)] {
            let visibility = Visibility::of(&viewer, &listing, None, now);
            assert_eq!(visibility, Visibility::Redacted);

            let keys = keys(&FieldSet::new(&listing, visibility));
            for field in CONFIDENTIAL {
                assert!(!keys.iter().any(|k| k == field), "leaked: {field}");
            }
            assert!(keys.iter().any(|k| k == "askingPrice"));
            assert!(!keys.iter().any(|k| k == "sellerId"));
        }

        let sig = signature(buyer, listing.id);
        let visibility =
            Visibility::of(&Viewer::User(buyer), &listing, Some(&sig), now);
        assert_eq!(visibility, Visibility::Full);

        let value =
            serde_json::to_value(FieldSet::new(&listing, visibility)).unwrap();
        assert_eq!(value["revenue"], "840000");
        assert_eq!(value["profit"], "420000");
        assert!(value.get("sellerId").is_none());
    }

    #[test]
    fn lapsed_or_foreign_signature_redacts() {
        let mut listing = draft();
        listing.status = listing::Status::Active;
        let buyer = user::Id::new();
        let sig = signature(buyer, listing.id);
        let later = DateTime::now() + Duration::from_secs(731 * 86_400);

        assert_eq!(
            Visibility::of(&Viewer::User(buyer), &listing, Some(&sig), later),
            Visibility::Redacted,
        );
        assert_eq!(
            Visibility::of(
                &Viewer::User(user::Id::new()),
                &listing,
                Some(&sig),
                DateTime::now(),
            ),
            Visibility::Redacted,
        );

        listing.status = listing::Status::Withdrawn;
        assert_eq!(
            Visibility::of(
                &Viewer::User(buyer),
                &listing,
                Some(&sig),
                DateTime::now(),
            ),
            Visibility::Redacted,
        );
    }

    #[test]
    fn no_nda_required_shows_full() {
        let mut listing = draft();
        listing.nda_required = false;

        assert_eq!(
            Visibility::of(&Viewer::Anonymous, &listing, None, DateTime::now()),
            Visibility::Full,
        );
    }
}
