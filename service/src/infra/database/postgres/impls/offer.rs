//! [`Offer`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{listing, offer, Offer},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Builds an [`Offer`] out of the provided [`Row`].
fn from_row(row: &Row) -> Offer {
    Offer {
        id: row.get("id"),
        reference: row.get("reference"),
        listing_id: row.get("listing_id"),
        buyer_id: row.get("buyer_id"),
        amount: row.get("amount"),
        message: row.get("message"),
        status: row.get("status"),
        counter_amount: row.get("counter_amount"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Offer>, offer::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Offer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Offer>, offer::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: offer::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, reference, listing_id, buyer_id, \
                   amount, message, status, counter_amount, \
                   created_at, updated_at \
            FROM offers \
            WHERE id = $1::VARCHAR";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Offer>, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Offer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Offer>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let listing_id: listing::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, reference, listing_id, buyer_id, \
                   amount, message, status, counter_amount, \
                   created_at, updated_at \
            FROM offers \
            WHERE listing_id = $1::VARCHAR \
            ORDER BY created_at ASC";
        Ok(self
            .query(SQL, &[&listing_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Offer>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(offer): Insert<Offer>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO offers (\
                id, reference, listing_id, buyer_id, \
                amount, message, status, counter_amount, \
                created_at, updated_at\
            ) VALUES (\
                $1::VARCHAR, $2::VARCHAR, $3::VARCHAR, $4::UUID, \
                $5::NUMERIC, $6::TEXT, $7::INT2, $8::NUMERIC, \
                $9::TIMESTAMPTZ, $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(
            SQL,
            &[
                &offer.id,
                &offer.reference,
                &offer.listing_id,
                &offer.buyer_id,
                &offer.amount,
                &offer.message,
                &offer.status,
                &offer.counter_amount,
                &offer.created_at,
                &offer.updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Offer>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(offer): Update<Offer>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE offers \
            SET status = $2::INT2, \
                counter_amount = $3::NUMERIC, \
                updated_at = $4::TIMESTAMPTZ \
            WHERE id = $1::VARCHAR";
        self.exec(
            SQL,
            &[
                &offer.id,
                &offer.status,
                &offer.counter_amount,
                &offer.updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
