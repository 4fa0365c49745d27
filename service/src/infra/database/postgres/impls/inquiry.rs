//! [`Inquiry`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{inquiry, listing, Inquiry},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Builds an [`Inquiry`] out of the provided [`Row`].
fn from_row(row: &Row) -> Inquiry {
    Inquiry {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        buyer_id: row.get("buyer_id"),
        seller_id: row.get("seller_id"),
        message: row.get("message"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Inquiry>, inquiry::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Inquiry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Inquiry>, inquiry::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: inquiry::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, listing_id, buyer_id, seller_id, \
                   message, status, \
                   created_at, updated_at \
            FROM inquiries \
            WHERE id = $1::VARCHAR";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Inquiry>, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Inquiry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Inquiry>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let listing_id: listing::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, listing_id, buyer_id, seller_id, \
                   message, status, \
                   created_at, updated_at \
            FROM inquiries \
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

impl<C> Database<Insert<Inquiry>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(inquiry): Insert<Inquiry>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO inquiries (\
                id, listing_id, buyer_id, seller_id, \
                message, status, \
                created_at, updated_at\
            ) VALUES (\
                $1::VARCHAR, $2::VARCHAR, $3::UUID, $4::UUID, \
                $5::TEXT, $6::INT2, \
                $7::TIMESTAMPTZ, $8::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(
            SQL,
            &[
                &inquiry.id,
                &inquiry.listing_id,
                &inquiry.buyer_id,
                &inquiry.seller_id,
                &inquiry.message,
                &inquiry.status,
                &inquiry.created_at,
                &inquiry.updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Inquiry>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(inquiry): Update<Inquiry>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE inquiries \
            SET status = $2::INT2, \
                updated_at = $3::TIMESTAMPTZ \
            WHERE id = $1::VARCHAR";
        self.exec(
            SQL,
            &[&inquiry.id, &inquiry.status, &inquiry.updated_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
