//! [`Command`] for marking an [`Inquiry`] by its seller.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{inquiry, listing, user, Inquiry, Listing},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for moving an [`Inquiry`] into a new [`inquiry::Status`].
#[derive(Clone, Copy, Debug)]
pub struct MarkInquiry {
    /// ID of the seller marking the [`Inquiry`].
    pub seller_id: user::Id,

    /// ID of the [`Inquiry`] to mark.
    pub inquiry_id: inquiry::Id,

    /// New [`inquiry::Status`].
    pub status: inquiry::Status,
}

impl<Db> Command<MarkInquiry> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Inquiry>, inquiry::Id>>,
            Ok = Option<Inquiry>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Inquiry>, inquiry::Id>>,
            Ok = Option<Inquiry>,
            Err = Traced<database::Error>,
        > + Database<Update<Inquiry>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Inquiry;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: MarkInquiry) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkInquiry {
            seller_id,
            inquiry_id,
            status,
        } = cmd;

        let inquiry = self
            .database()
            .execute(Select(By::<Option<Inquiry>, _>::new(inquiry_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::InquiryNotExists(inquiry_id))
            .map_err(tracerr::wrap!())?;
        if inquiry.seller_id != seller_id {
            return Err(tracerr::new!(E::NotSeller(seller_id)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(inquiry.listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut inquiry = tx
            .execute(Select(By::<Option<Inquiry>, _>::new(inquiry_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::InquiryNotExists(inquiry_id))
            .map_err(tracerr::wrap!())?;

        inquiry
            .mark(status)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        inquiry.updated_at = DateTime::now().coerce();

        tx.execute(Update(inquiry.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(inquiry)
    }
}

/// Error of [`MarkInquiry`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Inquiry`] with the provided ID does not exist.
    #[display("`Inquiry(id: {_0})` does not exist")]
    InquiryNotExists(#[error(not(source))] inquiry::Id),

    /// [`inquiry::Status`] move is not allowed.
    #[display("Invalid transition: {_0}")]
    #[from]
    InvalidTransition(inquiry::TransitionError),

    /// [`Inquiry`] is marked by someone other than its seller.
    #[display("`User(id: {_0})` is not the seller of the inquired listing")]
    NotSeller(#[error(not(source))] user::Id),
}
