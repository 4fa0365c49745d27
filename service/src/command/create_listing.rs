//! [`Command`] for creating a new [`Listing`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{listing, user, Listing},
    infra::{database, Database},
    Service,
};

use super::Command;

/// Number of attempts to generate a [`listing::Slug`] not taken yet.
const SLUG_ATTEMPTS: usize = 3;

/// [`Command`] for creating a new [`Listing`] in [`listing::Status::Draft`].
#[derive(Clone, Debug)]
pub struct CreateListing {
    /// ID of the seller creating the [`Listing`].
    pub seller_id: user::Id,

    /// [`listing::Title`] of a new [`Listing`].
    pub title: listing::Title,

    /// [`listing::Summary`] of a new [`Listing`].
    pub summary: Option<listing::Summary>,

    /// [`listing::Description`] of a new [`Listing`].
    pub description: Option<listing::Description>,

    /// [`listing::Category`] of a new [`Listing`].
    pub category: listing::Category,

    /// [`listing::BusinessModel`] of a new [`Listing`].
    pub business_model: listing::BusinessModel,

    /// Asking price of a new [`Listing`].
    pub asking_price: Money,

    /// Annual revenue of a new [`Listing`].
    pub revenue: Option<Money>,

    /// Annual profit of a new [`Listing`].
    pub profit: Option<Money>,

    /// [`listing::FoundedYear`] of a new [`Listing`].
    pub founded_year: Option<listing::FoundedYear>,

    /// [`listing::MonthlyVisitors`] of a new [`Listing`].
    pub monthly_visitors: Option<listing::MonthlyVisitors>,

    /// [`listing::WebsiteUrl`] of a new [`Listing`].
    pub website_url: Option<listing::WebsiteUrl>,

    /// [`listing::SellerContact`] of a new [`Listing`].
    pub seller_contact: Option<listing::SellerContact>,

    /// [`listing::ConfidentialNotes`] of a new [`Listing`].
    pub confidential_notes: Option<listing::ConfidentialNotes>,

    /// Indicates whether the identity of the business is confidential.
    ///
    /// Implies `nda_required`.
    pub is_confidential: bool,

    /// Indicates whether an NDA is required to see the confidential fields.
    pub nda_required: bool,
}

impl<Db> Command<CreateListing> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Listing>, listing::Slug>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<Insert<Listing>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Listing;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateListing) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateListing {
            seller_id,
            title,
            summary,
            description,
            category,
            business_model,
            asking_price,
            revenue,
            profit,
            founded_year,
            monthly_visitors,
            website_url,
            seller_contact,
            confidential_notes,
            is_confidential,
            nda_required,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut slug = None;
        for _ in 0..SLUG_ATTEMPTS {
            let candidate = listing::Slug::generate(&title);
            let taken = tx
                .execute(Select(By::<Option<Listing>, _>::new(
                    candidate.clone(),
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .is_some();
            if !taken {
                slug = Some(candidate);
                break;
            }
            log::debug!("slug `{candidate}` is taken, regenerating");
        }
        let slug = slug
            .ok_or_else(|| E::SlugExhausted(title.clone()))
            .map_err(tracerr::wrap!())?;

        let now = DateTime::now();
        let listing = Listing {
            id: listing::Id::new(),
            slug: Some(slug),
            seller_id,
            title,
            summary,
            description,
            category,
            business_model,
            asking_price,
            revenue,
            profit,
            founded_year,
            monthly_visitors,
            website_url,
            seller_contact,
            confidential_notes,
            is_verified: false,
            is_confidential,
            nda_required: nda_required || is_confidential,
            status: listing::Status::Draft,
            rejection_reason: None,
            created_at: now.coerce(),
            listed_at: None,
            updated_at: now.coerce(),
        };

        tx.execute(Insert(listing.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`Listing(id: {})` created by `{seller_id}`", listing.id);

        Ok(listing)
    }
}

/// Error of [`CreateListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// No free [`listing::Slug`] was generated for the [`listing::Title`].
    #[display("failed to generate a free slug for `{_0}`")]
    SlugExhausted(#[error(not(source))] listing::Title),
}
