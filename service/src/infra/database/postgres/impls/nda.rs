//! [`nda::Signature`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{listing, nda, user},
    infra::{
        database::{
            self,
            postgres::{self, Connection},
            Postgres,
        },
        Database,
    },
};

/// Builds an [`nda::Signature`] out of the provided [`Row`].
fn from_row(row: &Row) -> nda::Signature {
    nda::Signature {
        id: row.get("id"),
        user_id: row.get("user_id"),
        listing_id: row.get("listing_id"),
        signature_name: row.get("signature_name"),
        signed_at: row.get("signed_at"),
        expires_at: row.get("expires_at"),
    }
}

impl<C> Database<Select<By<Option<nda::Signature>, (user::Id, listing::Id)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<nda::Signature>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<nda::Signature>, (user::Id, listing::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (user_id, listing_id) = by.into_inner();

        const SQL: &str = "\
            SELECT id, user_id, listing_id, signature_name, \
                   signed_at, expires_at \
            FROM nda_signatures \
            WHERE user_id = $1::UUID \
              AND listing_id = $2::VARCHAR";
        Ok(self
            .query_opt(SQL, &[&user_id, &listing_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<nda::Signature>, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<nda::Signature>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<nda::Signature>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let listing_id: listing::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, user_id, listing_id, signature_name, \
                   signed_at, expires_at \
            FROM nda_signatures \
            WHERE listing_id = $1::VARCHAR \
            ORDER BY signed_at ASC";
        Ok(self
            .query(SQL, &[&listing_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

/// Inserts the [`nda::Signature`] unless an unexpired one already exists for
/// the same user and listing, returning the stored one.
impl<C> Database<Insert<nda::Signature>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<nda::Signature>, (user::Id, listing::Id)>>,
        Ok = Option<nda::Signature>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = nda::Signature;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(sig): Insert<nda::Signature>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO nda_signatures (\
                id, user_id, listing_id, signature_name, \
                signed_at, expires_at\
            ) VALUES (\
                $1::VARCHAR, $2::UUID, $3::VARCHAR, $4::VARCHAR, \
                $5::TIMESTAMPTZ, $6::TIMESTAMPTZ\
            ) \
            ON CONFLICT (user_id, listing_id) DO UPDATE \
            SET id = EXCLUDED.id, \
                signature_name = EXCLUDED.signature_name, \
                signed_at = EXCLUDED.signed_at, \
                expires_at = EXCLUDED.expires_at \
            WHERE nda_signatures.expires_at <= EXCLUDED.signed_at \
            RETURNING id, user_id, listing_id, signature_name, \
                      signed_at, expires_at";
        let row = self
            .query_opt(
                SQL,
                &[
                    &sig.id,
                    &sig.user_id,
                    &sig.listing_id,
                    &sig.signature_name,
                    &sig.signed_at,
                    &sig.expires_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;
        if let Some(row) = row {
            return Ok(from_row(&row));
        }

        // Conflicting unexpired signature is kept as is.
        self.execute(Select(By::new((sig.user_id, sig.listing_id))))
            .await
            .map_err(tracerr::wrap!())?
            .ok_or(database::Error::from(postgres::Error::RowVanished))
            .map_err(tracerr::wrap!())
    }
}
