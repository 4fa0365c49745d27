//! [`Listing`] definitions.

use std::fmt;

#[cfg(doc)]
use common::DateTime;
use common::{
    define_kind, define_text, ident, ident::OpaqueId, unit, DateTimeOf, Money,
    Percent,
};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::user;

/// Online business offered for sale.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// ID of this [`Listing`].
    pub id: Id,

    /// Human-friendly [`Slug`] of this [`Listing`].
    pub slug: Option<Slug>,

    /// ID of the user selling this [`Listing`].
    ///
    /// Never changes after creation.
    pub seller_id: user::Id,

    /// [`Title`] of this [`Listing`].
    pub title: Title,

    /// Public pitch of this [`Listing`].
    pub summary: Option<Summary>,

    /// Confidential long-form description of this [`Listing`].
    pub description: Option<Description>,

    /// [`Category`] of this [`Listing`].
    pub category: Category,

    /// [`BusinessModel`] of this [`Listing`].
    pub business_model: BusinessModel,

    /// Price the seller asks for the business.
    pub asking_price: Money,

    /// Annual revenue of the business.
    pub revenue: Option<Money>,

    /// Annual profit of the business.
    pub profit: Option<Money>,

    /// Year the business was founded.
    pub founded_year: Option<FoundedYear>,

    /// Average number of monthly visitors.
    pub monthly_visitors: Option<MonthlyVisitors>,

    /// Website of the business, revealing its identity.
    pub website_url: Option<WebsiteUrl>,

    /// How the seller may be contacted directly.
    pub seller_contact: Option<SellerContact>,

    /// Notes shared only under NDA.
    pub confidential_notes: Option<ConfidentialNotes>,

    /// Indicator whether the platform verified this [`Listing`].
    pub is_verified: bool,

    /// Indicator whether the identity of the business is hidden.
    pub is_confidential: bool,

    /// Indicator whether confidential fields require a signed NDA.
    pub nda_required: bool,

    /// [`Status`] of this [`Listing`].
    pub status: Status,

    /// Why the last verification of this [`Listing`] was rejected.
    pub rejection_reason: Option<RejectionReason>,

    /// [`DateTime`] when this [`Listing`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Listing`] was activated for the first time.
    pub listed_at: Option<ListingDateTime>,

    /// [`DateTime`] when this [`Listing`] was modified last time.
    pub updated_at: ModificationDateTime,
}

impl Listing {
    /// Returns profit margin of this [`Listing`].
    ///
    /// [`None`] if revenue or profit is unknown, or revenue is zero.
    #[must_use]
    pub fn margin(&self) -> Option<Percent> {
        Percent::of(self.profit?, self.revenue?)
    }

    /// Returns asking price multiple of the annual profit of this
    /// [`Listing`].
    ///
    /// [`None`] if profit is unknown or zero.
    #[must_use]
    pub fn multiple(&self) -> Option<Multiple> {
        self.asking_price
            .ratio(self.profit?)
            .map(|m| Multiple(m.round_dp(2)))
    }

    /// Returns [`RequiredField`]s missing for a review submission.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<RequiredField> {
        let mut missing = vec![];
        if self.summary.is_none() {
            missing.push(RequiredField::Summary);
        }
        if self.asking_price.is_zero() {
            missing.push(RequiredField::AskingPrice);
        }
        if self.revenue.is_none() {
            missing.push(RequiredField::Revenue);
        }
        if self.profit.is_none() {
            missing.push(RequiredField::Profit);
        }
        missing
    }

    /// Returns number of whole days this [`Listing`] is listed by the
    /// provided moment.
    #[must_use]
    pub fn days_listed(&self, now: common::DateTime) -> Option<u64> {
        self.listed_at.map(|at| at.whole_days_until(now))
    }

    /// Applies the provided lifecycle [`Event`] to this [`Listing`].
    ///
    /// Changes the [`Status`] and the fields bound to it only, leaving
    /// timestamps to the caller.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::InvalidTransition`] if the [`Event`] is not
    ///   allowed in the current [`Status`];
    /// - [`TransitionError::GuardFailed`] if the [`Event`] is allowed, but
    ///   its precondition doesn't hold.
    pub fn transition(mut self, event: Event) -> Result<Self, TransitionError> {
        use Event as E;
        use Status as S;

        self.status = match (self.status, event) {
            (S::Draft, E::SubmitForReview) => {
                let missing = self.missing_fields();
                if !missing.is_empty() {
                    return Err(TransitionError::GuardFailed(
                        Guard::MissingFields(missing),
                    ));
                }
                S::Pending
            }
            (S::Pending, E::ApproveVerification) => {
                self.is_verified = true;
                self.rejection_reason = None;
                S::Active
            }
            (S::Pending, E::RejectVerification(reason)) => {
                self.rejection_reason = Some(reason);
                S::Draft
            }
            (S::Active, E::Pause) => S::Paused,
            (S::Paused, E::Resume) => S::Active,
            (S::Active, E::AcceptOffer { accepted_offers }) => {
                if accepted_offers != 1 {
                    return Err(TransitionError::GuardFailed(
                        Guard::AcceptedOffers(accepted_offers),
                    ));
                }
                S::UnderOffer
            }
            (S::UnderOffer, E::OfferFellThrough) => S::Active,
            (S::UnderOffer, E::CompleteTransaction) => S::Sold,
            (S::Draft | S::Pending | S::Active | S::Paused, E::Withdraw) => {
                S::Withdrawn
            }
            (from, event) => {
                return Err(TransitionError::InvalidTransition {
                    from,
                    event: event.kind(),
                })
            }
        };
        Ok(self)
    }
}

/// ID of a [`Listing`].
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
    Ord,
    PartialEq,
    PartialOrd,
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

define_text! {
    #[doc = "URL slug of a [`Listing`], unique across all listings."]
    struct Slug(max_len = 300);
}

impl Slug {
    /// Generates a new unique [`Slug`] out of the provided [`Title`].
    #[must_use]
    pub fn generate(title: &Title) -> Self {
        Self(ident::unique_slug(title.as_str()))
    }
}

define_text! {
    #[doc = "Title of a [`Listing`]."]
    struct Title(max_len = 256);
}

define_text! {
    #[doc = "Public pitch of a [`Listing`]."]
    struct Summary(max_len = 1024);
}

define_text! {
    #[doc = "Long-form description of a [`Listing`]."]
    struct Description(max_len = 20_000);
}

define_text! {
    #[doc = "Direct contact of a [`Listing`] seller (email, phone, etc)."]
    struct SellerContact(max_len = 256);
}

define_text! {
    #[doc = "Notes of a [`Listing`] disclosed only under NDA."]
    struct ConfidentialNotes(max_len = 10_000);
}

define_text! {
    #[doc = "Reason of a [`Listing`] verification rejection."]
    struct RejectionReason(max_len = 1024);
}

/// Website URL of a [`Listing`].
#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(try_from = "String", into = "String")]
pub struct WebsiteUrl(String);

impl WebsiteUrl {
    /// Creates a new [`WebsiteUrl`] if the provided `url` is an absolute
    /// HTTP(S) URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        Self::check(&url).then_some(Self(url))
    }

    /// Checks whether the provided `url` is a valid [`WebsiteUrl`].
    fn check(url: &str) -> bool {
        let Some(rest) = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
        else {
            return false;
        };
        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        url.len() <= 2048
            && host.contains('.')
            && !url.chars().any(char::is_whitespace)
    }
}

impl TryFrom<String> for WebsiteUrl {
    type Error = &'static str;

    fn try_from(url: String) -> Result<Self, Self::Error> {
        Self::new(url).ok_or("invalid `WebsiteUrl`")
    }
}

impl From<WebsiteUrl> for String {
    fn from(url: WebsiteUrl) -> Self {
        url.0
    }
}

/// Year a business was founded.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct FoundedYear(i16);

impl FoundedYear {
    /// Creates a new [`FoundedYear`] if the provided `year` is plausible.
    #[must_use]
    pub fn new(year: i16) -> Option<Self> {
        (1990..=2100).contains(&year).then_some(Self(year))
    }
}

/// Average number of monthly visitors of a business website.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct MonthlyVisitors(i64);

/// Ratio of an asking price to an annual profit.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[display("{}x", _0.normalize())]
pub struct Multiple(Decimal);

impl Multiple {
    /// Returns the ratio value.
    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }
}

define_kind! {
    #[doc = "Category of a [`Listing`]."]
    enum Category {
        #[doc = "Software as a service."]
        Saas = 1,

        #[doc = "Online store."]
        Ecommerce = 2,

        #[doc = "Content website or blog."]
        Content = 3,

        #[doc = "Service agency."]
        Agency = 4,

        #[doc = "Two-sided marketplace."]
        Marketplace = 5,

        #[doc = "Mobile application."]
        MobileApp = 6,

        #[doc = "Email newsletter."]
        Newsletter = 7,

        #[doc = "Anything else."]
        Other = 8,
    }
}

define_kind! {
    #[doc = "Business model of a [`Listing`]."]
    enum BusinessModel {
        #[doc = "Recurring subscriptions."]
        Subscription = 1,

        #[doc = "One-time purchases."]
        OneTime = 2,

        #[doc = "Advertising revenue."]
        Advertising = 3,

        #[doc = "Affiliate commissions."]
        Affiliate = 4,

        #[doc = "Paid services."]
        Services = 5,

        #[doc = "Mix of several models."]
        Hybrid = 6,
    }
}

define_kind! {
    #[doc = "Lifecycle status of a [`Listing`]."]
    enum Status {
        #[doc = "Being prepared by the seller."]
        Draft = 1,

        #[doc = "Awaiting verification."]
        Pending = 2,

        #[doc = "Published and open for offers."]
        Active = 3,

        #[doc = "Temporarily hidden by the seller."]
        Paused = 4,

        #[doc = "An offer was accepted and a transaction is in progress."]
        UnderOffer = 5,

        #[doc = "Business is sold."]
        Sold = 6,

        #[doc = "Withdrawn by the seller."]
        Withdrawn = 7,
    }
}

impl Status {
    /// Indicates whether no further transitions are possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sold | Self::Withdrawn)
    }

    /// Indicates whether a [`Listing`] in this [`Status`] is visible to the
    /// public.
    #[must_use]
    pub fn is_published(self) -> bool {
        !matches!(self, Self::Draft | Self::Pending)
    }

    /// Indicates whether a [`Listing`] in this [`Status`] accepts inquiries.
    #[must_use]
    pub fn accepts_inquiries(self) -> bool {
        matches!(self, Self::Active | Self::Paused | Self::UnderOffer)
    }

    /// Indicates whether a [`Listing`] in this [`Status`] accepts offers.
    #[must_use]
    pub fn accepts_offers(self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }
}

/// Lifecycle event of a [`Listing`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// Seller submits the [`Listing`] for verification.
    SubmitForReview,

    /// Verification approved the [`Listing`].
    ApproveVerification,

    /// Verification rejected the [`Listing`] for the provided reason.
    RejectVerification(RejectionReason),

    /// Seller pauses the [`Listing`].
    Pause,

    /// Seller resumes the [`Listing`].
    Resume,

    /// An offer on the [`Listing`] was accepted.
    AcceptOffer {
        /// Number of live accepted offers on the [`Listing`], including the
        /// just accepted one.
        accepted_offers: usize,
    },

    /// The accepted offer fell through and no other live one remains.
    OfferFellThrough,

    /// The transaction of the accepted offer is completed.
    CompleteTransaction,

    /// Seller withdraws the [`Listing`].
    Withdraw,
}

impl Event {
    /// Returns [`EventKind`] of this [`Event`].
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::SubmitForReview => EventKind::SubmitForReview,
            Self::ApproveVerification => EventKind::ApproveVerification,
            Self::RejectVerification(_) => EventKind::RejectVerification,
            Self::Pause => EventKind::Pause,
            Self::Resume => EventKind::Resume,
            Self::AcceptOffer { .. } => EventKind::AcceptOffer,
            Self::OfferFellThrough => EventKind::OfferFellThrough,
            Self::CompleteTransaction => EventKind::CompleteTransaction,
            Self::Withdraw => EventKind::Withdraw,
        }
    }
}

define_kind! {
    #[doc = "Kind of a lifecycle [`Event`]."]
    enum EventKind {
        #[doc = "[`Event::SubmitForReview`]."]
        SubmitForReview = 1,

        #[doc = "[`Event::ApproveVerification`]."]
        ApproveVerification = 2,

        #[doc = "[`Event::RejectVerification`]."]
        RejectVerification = 3,

        #[doc = "[`Event::Pause`]."]
        Pause = 4,

        #[doc = "[`Event::Resume`]."]
        Resume = 5,

        #[doc = "[`Event::AcceptOffer`]."]
        AcceptOffer = 6,

        #[doc = "[`Event::OfferFellThrough`]."]
        OfferFellThrough = 7,

        #[doc = "[`Event::CompleteTransaction`]."]
        CompleteTransaction = 8,

        #[doc = "[`Event::Withdraw`]."]
        Withdraw = 9,
    }
}

/// Error of applying a lifecycle [`Event`] to a [`Listing`].
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum TransitionError {
    /// [`Event`] is not allowed in the current [`Status`].
    #[display("cannot `{event}` a `{from}` listing")]
    InvalidTransition {
        /// [`Status`] the transition was attempted from.
        from: Status,

        /// Kind of the attempted [`Event`].
        event: EventKind,
    },

    /// Precondition of the [`Event`] doesn't hold.
    #[display("guard failed: {_0}")]
    GuardFailed(#[error(not(source))] Guard),
}

/// Precondition of a lifecycle [`Event`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Guard {
    /// The listed fields must be filled before submission.
    MissingFields(Vec<RequiredField>),

    /// Exactly one live accepted offer must exist, but there are this many.
    AcceptedOffers(usize),
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields(fields) => {
                f.write_str("missing required fields:")?;
                for field in fields {
                    write!(f, " `{field}`")?;
                }
                Ok(())
            }
            Self::AcceptedOffers(n) => {
                write!(f, "expected exactly one accepted offer, found {n}")
            }
        }
    }
}

define_kind! {
    #[doc = "Field of a [`Listing`] required for a review submission."]
    enum RequiredField {
        #[doc = "[`Listing::summary`]."]
        Summary = 1,

        #[doc = "[`Listing::asking_price`], which must be positive."]
        AskingPrice = 2,

        #[doc = "[`Listing::revenue`]."]
        Revenue = 3,

        #[doc = "[`Listing::profit`]."]
        Profit = 4,
    }
}

/// [`DateTime`] when a [`Listing`] was created.
pub type CreationDateTime = DateTimeOf<(Listing, unit::Creation)>;

/// [`DateTime`] when a [`Listing`] was activated for the first time.
pub type ListingDateTime = DateTimeOf<(Listing, unit::Activation)>;

/// [`DateTime`] when a [`Listing`] was modified last time.
pub type ModificationDateTime = DateTimeOf<(Listing, unit::Modification)>;

#[cfg(test)]
pub(crate) mod spec {
    use common::{DateTime, Money};

    use crate::domain::user;

    use super::{
        BusinessModel, Category, Event, Guard, Listing, RejectionReason,
        RequiredField, Status, Summary, Title, TransitionError,
    };

    /// Creates a complete draft [`Listing`] ready for submission.
    pub(crate) fn draft() -> Listing {
        let now = DateTime::now();
        Listing {
            id: super::Id::new(),
            slug: None,
            seller_id: user::Id::new(),
            title: Title::new("Profitable SaaS Business").unwrap(),
            summary: Summary::new("B2B analytics tool"),
            description: None,
            category: Category::Saas,
            business_model: BusinessModel::Subscription,
            asking_price: Money::from_dollars(2_800_000),
            revenue: Some(Money::from_dollars(840_000)),
            profit: Some(Money::from_dollars(420_000)),
            founded_year: None,
            monthly_visitors: None,
            website_url: None,
            seller_contact: None,
            confidential_notes: None,
            is_verified: false,
            is_confidential: true,
            nda_required: true,
            status: Status::Draft,
            rejection_reason: None,
            created_at: now.coerce(),
            listed_at: None,
            updated_at: now.coerce(),
        }
    }

    fn with_status(status: Status) -> Listing {
        Listing { status, ..draft() }
    }

    fn all_events() -> Vec<Event> {
        vec![
            Event::SubmitForReview,
            Event::ApproveVerification,
            Event::RejectVerification(RejectionReason::new("nope").unwrap()),
            Event::Pause,
            Event::Resume,
            Event::AcceptOffer { accepted_offers: 1 },
            Event::OfferFellThrough,
            Event::CompleteTransaction,
            Event::Withdraw,
        ]
    }

    #[test]
    fn walks_happy_path() {
        let listing = draft()
            .transition(Event::SubmitForReview)
            .unwrap()
            .transition(Event::ApproveVerification)
            .unwrap();
        assert_eq!(listing.status, Status::Active);
        assert!(listing.is_verified);

        let listing = listing
            .transition(Event::Pause)
            .unwrap()
            .transition(Event::Resume)
            .unwrap()
            .transition(Event::AcceptOffer { accepted_offers: 1 })
            .unwrap();
        assert_eq!(listing.status, Status::UnderOffer);

        let listing = listing
            .transition(Event::OfferFellThrough)
            .unwrap()
            .transition(Event::AcceptOffer { accepted_offers: 1 })
            .unwrap()
            .transition(Event::CompleteTransaction)
            .unwrap();
        assert_eq!(listing.status, Status::Sold);
    }

    #[test]
    fn rejection_returns_to_draft_with_reason() {
        let reason = RejectionReason::new("Financials unclear").unwrap();
        let listing = with_status(Status::Pending)
            .transition(Event::RejectVerification(reason.clone()))
            .unwrap();

        assert_eq!(listing.status, Status::Draft);
        assert_eq!(listing.rejection_reason, Some(reason));
        assert!(!listing.is_verified);
    }

    #[test]
    fn terminal_rejects_every_event() {
        for status in [Status::Sold, Status::Withdrawn] {
            for event in all_events() {
                let kind = event.kind();
                assert_eq!(
                    with_status(status).transition(event).unwrap_err(),
                    TransitionError::InvalidTransition {
                        from: status,
                        event: kind,
                    },
                );
            }
        }
    }

    #[test]
    fn withdraws_from_non_terminal_except_under_offer() {
        for status in Status::ALL.iter().copied() {
            let res = with_status(status).transition(Event::Withdraw);
            match status {
                Status::Draft
                | Status::Pending
                | Status::Active
                | Status::Paused => {
                    assert_eq!(res.unwrap().status, Status::Withdrawn);
                }
                Status::UnderOffer | Status::Sold | Status::Withdrawn => {
                    assert!(res.is_err(), "status: {status}");
                }
            }
        }
    }

    #[test]
    fn submission_requires_fields() {
        let mut listing = draft();
        listing.summary = None;
        listing.revenue = None;
        listing.asking_price = Money::ZERO;

        assert_eq!(
            listing.transition(Event::SubmitForReview).unwrap_err(),
            TransitionError::GuardFailed(Guard::MissingFields(vec![
                RequiredField::Summary,
                RequiredField::AskingPrice,
                RequiredField::Revenue,
            ])),
        );
    }

    #[test]
    fn offer_acceptance_requires_exactly_one() {
        for n in [0, 2] {
            assert_eq!(
                with_status(Status::Active)
                    .transition(Event::AcceptOffer { accepted_offers: n })
                    .unwrap_err(),
                TransitionError::GuardFailed(Guard::AcceptedOffers(n)),
            );
        }
        assert!(matches!(
            with_status(Status::Paused)
                .transition(Event::AcceptOffer { accepted_offers: 1 }),
            Err(TransitionError::InvalidTransition { .. }),
        ));
    }

    #[test]
    fn computes_margin_and_multiple() {
        let listing = draft();

        assert_eq!(listing.margin().unwrap().to_string(), "50%");
        assert_eq!(listing.multiple().unwrap().to_string(), "6.67x");

        let listing = Listing {
            revenue: Some(Money::ZERO),
            profit: Some(Money::ZERO),
            ..draft()
        };
        assert_eq!(listing.margin(), None);
        assert_eq!(listing.multiple(), None);
    }

    #[test]
    fn validates_website_url() {
        use super::WebsiteUrl;

        assert!(WebsiteUrl::new("https://example.com").is_some());
        assert!(WebsiteUrl::new("http://shop.example.com/about").is_some());
        assert!(WebsiteUrl::new("example.com").is_none());
        assert!(WebsiteUrl::new("https://localhost").is_none());
        assert!(WebsiteUrl::new("https://exa mple.com").is_none());
    }
}
