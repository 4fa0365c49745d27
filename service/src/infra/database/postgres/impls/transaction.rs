//! [`Transaction`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{listing, offer, transaction, Transaction},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::transaction::Stranded,
};

/// Builds a [`Transaction`] out of the provided [`Row`].
fn from_row(row: &Row) -> Transaction {
    Transaction {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        offer_id: row.get("offer_id"),
        buyer_id: row.get("buyer_id"),
        seller_id: row.get("seller_id"),
        amount: row.get("amount"),
        stage: row.get("stage"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        cancelled_at: row.get("cancelled_at"),
    }
}

impl<C> Database<Select<By<Option<Transaction>, transaction::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Transaction>, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: transaction::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, listing_id, offer_id, buyer_id, seller_id, \
                   amount, stage, \
                   created_at, updated_at, cancelled_at \
            FROM transactions \
            WHERE id = $1::VARCHAR";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Option<Transaction>, offer::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Transaction>, offer::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let offer_id: offer::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, listing_id, offer_id, buyer_id, seller_id, \
                   amount, stage, \
                   created_at, updated_at, cancelled_at \
            FROM transactions \
            WHERE offer_id = $1::VARCHAR";
        Ok(self
            .query_opt(SQL, &[&offer_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Transaction>, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Transaction>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let listing_id: listing::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, listing_id, offer_id, buyer_id, seller_id, \
                   amount, stage, \
                   created_at, updated_at, cancelled_at \
            FROM transactions \
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

impl<C> Database<Select<By<Vec<Stranded<Transaction>>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Stranded<Transaction>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Stranded<Transaction>>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let completed = transaction::Stage::Completed;
        let sold = listing::Status::Sold;

        const SQL: &str = "\
            SELECT t.id, t.listing_id, t.offer_id, t.buyer_id, t.seller_id, \
                   t.amount, t.stage, \
                   t.created_at, t.updated_at, t.cancelled_at \
            FROM transactions AS t \
            INNER JOIN listings AS l ON l.id = t.listing_id \
            WHERE t.stage = $1::INT2 \
              AND l.status <> $2::INT2 \
            ORDER BY t.updated_at ASC";
        Ok(self
            .query(SQL, &[&completed, &sold])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| Stranded(from_row(row)))
            .collect())
    }
}

impl<C> Database<Insert<Transaction>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(tx): Insert<Transaction>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO transactions (\
                id, listing_id, offer_id, buyer_id, seller_id, \
                amount, stage, \
                created_at, updated_at, cancelled_at\
            ) VALUES (\
                $1::VARCHAR, $2::VARCHAR, $3::VARCHAR, $4::UUID, $5::UUID, \
                $6::NUMERIC, $7::INT2, \
                $8::TIMESTAMPTZ, $9::TIMESTAMPTZ, $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(
            SQL,
            &[
                &tx.id,
                &tx.listing_id,
                &tx.offer_id,
                &tx.buyer_id,
                &tx.seller_id,
                &tx.amount,
                &tx.stage,
                &tx.created_at,
                &tx.updated_at,
                &tx.cancelled_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Transaction>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(tx): Update<Transaction>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE transactions \
            SET stage = $2::INT2, \
                updated_at = $3::TIMESTAMPTZ, \
                cancelled_at = $4::TIMESTAMPTZ \
            WHERE id = $1::VARCHAR";
        self.exec(
            SQL,
            &[&tx.id, &tx.stage, &tx.updated_at, &tx.cancelled_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
