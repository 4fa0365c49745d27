//! In-memory [`Database`] implementation.
//!
//! Keeps the whole [`State`] in process memory. Transactions are serializable:
//! a [`Tx`] holds the single writer permit for its whole lifetime and works on
//! a private copy of the [`State`], swapped in on [`Commit`].

use std::{
    collections::HashMap,
    future::Future,
    mem,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Update};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{
        event, inquiry, listing, nda, offer, transaction, user, Event,
        Inquiry, Listing, Offer, Transaction,
    },
    infra::{database, Database},
    read::{self, transaction::Stranded},
};

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Snapshot of all the stored data.
#[derive(Clone, Debug, Default)]
pub struct State {
    listings: HashMap<listing::Id, Listing>,
    signatures: HashMap<(user::Id, listing::Id), nda::Signature>,
    inquiries: HashMap<inquiry::Id, Inquiry>,
    offers: HashMap<offer::Id, Offer>,
    transactions: HashMap<transaction::Id, Transaction>,
    events: Vec<event::Record>,
}

/// Access to a [`State`].
pub trait Storage {
    /// Reads the [`State`].
    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R;

    /// Modifies the [`State`].
    fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> R,
    ) -> impl Future<Output = R>;
}

/// [`State`] shared by all the clients of the same [`Memory`] database.
#[derive(Debug, Default)]
struct Shared {
    /// Committed [`State`].
    state: RwLock<State>,

    /// Permit to write into the committed [`State`].
    writer: Arc<AsyncMutex<()>>,
}

/// Non-transactional [`Storage`], writing right into the committed [`State`].
#[derive(Clone, Debug, Default)]
pub struct NonTx(Arc<Shared>);

impl Storage for NonTx {
    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&self.0.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    async fn write<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let _permit = self.0.writer.lock().await;
        f(&mut self.0.state.write().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Transactional [`Storage`], working on a private copy of the [`State`].
#[derive(Debug)]
pub struct Tx {
    /// [`Shared`] state to [`Commit`] into.
    shared: Arc<Shared>,

    /// Private copy of the [`State`] with uncommitted changes.
    staged: Mutex<State>,

    /// Writer permit held till this [`Tx`] is dropped.
    _permit: OwnedMutexGuard<()>,
}

impl Storage for Tx {
    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&self.staged.lock().unwrap_or_else(PoisonError::into_inner))
    }

    async fn write<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.staged.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Database<Transact> for Memory {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let shared = Arc::clone(&self.0 .0);
        let permit = Arc::clone(&shared.writer).lock_owned().await;
        let staged = NonTx(Arc::clone(&shared)).read(State::clone);
        Ok(Memory(Tx {
            shared,
            staged: Mutex::new(staged),
            _permit: permit,
        }))
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let staged = mem::take(
            &mut *self.0.staged.lock().unwrap_or_else(PoisonError::into_inner),
        );
        *self
            .0
            .shared
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = staged;
        Ok(())
    }
}

/// The writer permit of a [`Tx`] already excludes everyone else.
impl<S: Storage> Database<Lock<By<Listing, listing::Id>>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl<S: Storage> Database<Select<By<Option<Listing>, listing::Id>>>
    for Memory<S>
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| s.listings.get(&id).cloned()))
    }
}

impl<S: Storage> Database<Select<By<Option<Listing>, listing::Slug>>>
    for Memory<S>
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Slug>>,
    ) -> Result<Self::Ok, Self::Err> {
        let slug = by.into_inner();
        Ok(self.0.read(|s| {
            s.listings
                .values()
                .find(|l| l.slug.as_ref() == Some(&slug))
                .cloned()
        }))
    }
}

impl<S: Storage> Database<Select<By<Vec<Listing>, user::Id>>> for Memory<S> {
    type Ok = Vec<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Listing>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let seller_id = by.into_inner();
        let mut listings = self.0.read(|s| {
            s.listings
                .values()
                .filter(|l| l.seller_id == seller_id)
                .cloned()
                .collect::<Vec<_>>()
        });
        listings.sort_by_key(|l| (l.created_at, l.id));
        Ok(listings)
    }
}

impl<S: Storage> Database<Insert<Listing>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(listing): Insert<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(|s| _ = s.listings.entry(listing.id).or_insert(listing))
            .await;
        Ok(())
    }
}

impl<S: Storage> Database<Update<Listing>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(listing): Update<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(|s| {
                if let Some(stored) = s.listings.get_mut(&listing.id) {
                    // Ownership and creation are immutable.
                    *stored = Listing {
                        seller_id: stored.seller_id,
                        created_at: stored.created_at,
                        ..listing
                    };
                }
            })
            .await;
        Ok(())
    }
}

impl<S: Storage>
    Database<Select<By<Option<nda::Signature>, (user::Id, listing::Id)>>>
    for Memory<S>
{
    type Ok = Option<nda::Signature>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<nda::Signature>, (user::Id, listing::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = by.into_inner();
        Ok(self.0.read(|s| s.signatures.get(&key).cloned()))
    }
}

impl<S: Storage> Database<Select<By<Vec<nda::Signature>, listing::Id>>>
    for Memory<S>
{
    type Ok = Vec<nda::Signature>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<nda::Signature>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let listing_id = by.into_inner();
        let mut signatures = self.0.read(|s| {
            s.signatures
                .values()
                .filter(|sig| sig.listing_id == listing_id)
                .cloned()
                .collect::<Vec<_>>()
        });
        signatures.sort_by_key(|sig| sig.signed_at);
        Ok(signatures)
    }
}

/// Inserts the [`nda::Signature`] unless an unexpired one already exists for
/// the same user and listing, returning the stored one.
impl<S: Storage> Database<Insert<nda::Signature>> for Memory<S> {
    type Ok = nda::Signature;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(sig): Insert<nda::Signature>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .0
            .write(|s| {
                let stored = s
                    .signatures
                    .entry((sig.user_id, sig.listing_id))
                    .or_insert_with(|| sig.clone());
                if stored.expires_at <= sig.signed_at.coerce() {
                    *stored = sig;
                }
                stored.clone()
            })
            .await)
    }
}

impl<S: Storage> Database<Select<By<Option<Inquiry>, inquiry::Id>>>
    for Memory<S>
{
    type Ok = Option<Inquiry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Inquiry>, inquiry::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| s.inquiries.get(&id).cloned()))
    }
}

impl<S: Storage> Database<Select<By<Vec<Inquiry>, listing::Id>>>
    for Memory<S>
{
    type Ok = Vec<Inquiry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Inquiry>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let listing_id = by.into_inner();
        let mut inquiries = self.0.read(|s| {
            s.inquiries
                .values()
                .filter(|i| i.listing_id == listing_id)
                .cloned()
                .collect::<Vec<_>>()
        });
        inquiries.sort_by_key(|i| i.created_at);
        Ok(inquiries)
    }
}

impl<S: Storage> Database<Insert<Inquiry>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(inquiry): Insert<Inquiry>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(|s| _ = s.inquiries.entry(inquiry.id).or_insert(inquiry))
            .await;
        Ok(())
    }
}

impl<S: Storage> Database<Update<Inquiry>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(inquiry): Update<Inquiry>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(|s| {
                if let Some(stored) = s.inquiries.get_mut(&inquiry.id) {
                    stored.status = inquiry.status;
                    stored.updated_at = inquiry.updated_at;
                }
            })
            .await;
        Ok(())
    }
}

impl<S: Storage> Database<Select<By<Option<Offer>, offer::Id>>> for Memory<S> {
    type Ok = Option<Offer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Offer>, offer::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| s.offers.get(&id).cloned()))
    }
}

impl<S: Storage> Database<Select<By<Vec<Offer>, listing::Id>>> for Memory<S> {
    type Ok = Vec<Offer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Offer>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let listing_id = by.into_inner();
        let mut offers = self.0.read(|s| {
            s.offers
                .values()
                .filter(|o| o.listing_id == listing_id)
                .cloned()
                .collect::<Vec<_>>()
        });
        offers.sort_by_key(|o| o.created_at);
        Ok(offers)
    }
}

impl<S: Storage> Database<Insert<Offer>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(offer): Insert<Offer>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(|s| _ = s.offers.entry(offer.id).or_insert(offer))
            .await;
        Ok(())
    }
}

impl<S: Storage> Database<Update<Offer>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(offer): Update<Offer>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(|s| {
                if let Some(stored) = s.offers.get_mut(&offer.id) {
                    stored.status = offer.status;
                    stored.counter_amount = offer.counter_amount;
                    stored.updated_at = offer.updated_at;
                }
            })
            .await;
        Ok(())
    }
}

impl<S: Storage> Database<Select<By<Option<Transaction>, transaction::Id>>>
    for Memory<S>
{
    type Ok = Option<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Transaction>, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| s.transactions.get(&id).cloned()))
    }
}

impl<S: Storage> Database<Select<By<Option<Transaction>, offer::Id>>>
    for Memory<S>
{
    type Ok = Option<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Transaction>, offer::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let offer_id = by.into_inner();
        Ok(self.0.read(|s| {
            s.transactions
                .values()
                .find(|t| t.offer_id == offer_id)
                .cloned()
        }))
    }
}

impl<S: Storage> Database<Select<By<Vec<Transaction>, listing::Id>>>
    for Memory<S>
{
    type Ok = Vec<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Transaction>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let listing_id = by.into_inner();
        let mut transactions = self.0.read(|s| {
            s.transactions
                .values()
                .filter(|t| t.listing_id == listing_id)
                .cloned()
                .collect::<Vec<_>>()
        });
        transactions.sort_by_key(|t| t.created_at);
        Ok(transactions)
    }
}

impl<S: Storage> Database<Select<By<Vec<Stranded<Transaction>>, ()>>>
    for Memory<S>
{
    type Ok = Vec<Stranded<Transaction>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Stranded<Transaction>>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut stranded = self.0.read(|s| {
            s.transactions
                .values()
                .filter(|t| {
                    t.stage == transaction::Stage::Completed
                        && s.listings.get(&t.listing_id).is_some_and(|l| {
                            l.status != listing::Status::Sold
                        })
                })
                .cloned()
                .collect::<Vec<_>>()
        });
        stranded.sort_by_key(|t| t.updated_at);
        Ok(stranded.into_iter().map(Stranded).collect())
    }
}

impl<S: Storage> Database<Insert<Transaction>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(tx): Insert<Transaction>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(|s| _ = s.transactions.entry(tx.id).or_insert(tx))
            .await;
        Ok(())
    }
}

impl<S: Storage> Database<Update<Transaction>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(tx): Update<Transaction>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(|s| {
                if let Some(stored) = s.transactions.get_mut(&tx.id) {
                    stored.stage = tx.stage;
                    stored.cancelled_at = tx.cancelled_at;
                    stored.updated_at = tx.updated_at;
                }
            })
            .await;
        Ok(())
    }
}

impl<S: Storage> Database<Insert<Event>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(event): Insert<Event>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(|s| {
                let seq = s.events.last().map_or(1, |r| i64::from(r.seq) + 1);
                s.events.push(event::Record {
                    seq: seq.into(),
                    event,
                    occurred_at: event::OccurrenceDateTime::now(),
                });
            })
            .await;
        Ok(())
    }
}

impl<S: Storage> Database<Select<By<Vec<event::Record>, read::event::After>>>
    for Memory<S>
{
    type Ok = Vec<event::Record>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<event::Record>, read::event::After>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::event::After { seq, limit } = by.into_inner();
        Ok(self.0.read(|s| {
            s.events
                .iter()
                .filter(|r| seq.is_none_or(|after| r.seq > after))
                .take(limit.get())
                .cloned()
                .collect()
        }))
    }
}
