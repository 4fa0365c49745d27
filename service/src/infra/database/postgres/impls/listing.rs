//! [`Listing`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{listing, user, Listing},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Builds a [`Listing`] out of the provided [`Row`] having all its columns.
fn from_row(row: &Row) -> Listing {
    Listing {
        id: row.get("id"),
        slug: row.get("slug"),
        seller_id: row.get("seller_id"),
        title: row.get("title"),
        summary: row.get("summary"),
        description: row.get("description"),
        category: row.get("category"),
        business_model: row.get("business_model"),
        asking_price: row.get("asking_price"),
        revenue: row.get("revenue"),
        profit: row.get("profit"),
        founded_year: row.get("founded_year"),
        monthly_visitors: row.get("monthly_visitors"),
        website_url: row.get("website_url"),
        seller_contact: row.get("seller_contact"),
        confidential_notes: row.get("confidential_notes"),
        is_verified: row.get("is_verified"),
        is_confidential: row.get("is_confidential"),
        nda_required: row.get("nda_required"),
        status: row.get("status"),
        rejection_reason: row.get("rejection_reason"),
        created_at: row.get("created_at"),
        listed_at: row.get("listed_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Listing>, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: listing::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, slug, seller_id, \
                   title, summary, description, \
                   category, business_model, \
                   asking_price, revenue, profit, \
                   founded_year, monthly_visitors, website_url, \
                   seller_contact, confidential_notes, \
                   is_verified, is_confidential, nda_required, \
                   status, rejection_reason, \
                   created_at, listed_at, updated_at \
            FROM listings \
            WHERE id = $1::VARCHAR";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Option<Listing>, listing::Slug>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Slug>>,
    ) -> Result<Self::Ok, Self::Err> {
        let slug = by.into_inner();

        const SQL: &str = "\
            SELECT id, slug, seller_id, \
                   title, summary, description, \
                   category, business_model, \
                   asking_price, revenue, profit, \
                   founded_year, monthly_visitors, website_url, \
                   seller_contact, confidential_notes, \
                   is_verified, is_confidential, nda_required, \
                   status, rejection_reason, \
                   created_at, listed_at, updated_at \
            FROM listings \
            WHERE slug = $1::VARCHAR";
        Ok(self
            .query_opt(SQL, &[&slug])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Listing>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Listing>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let seller_id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, slug, seller_id, \
                   title, summary, description, \
                   category, business_model, \
                   asking_price, revenue, profit, \
                   founded_year, monthly_visitors, website_url, \
                   seller_contact, confidential_notes, \
                   is_verified, is_confidential, nda_required, \
                   status, rejection_reason, \
                   created_at, listed_at, updated_at \
            FROM listings \
            WHERE seller_id = $1::UUID \
            ORDER BY created_at ASC";
        Ok(self
            .query(SQL, &[&seller_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Listing>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(listing): Insert<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO listings (\
                id, slug, seller_id, \
                title, summary, description, \
                category, business_model, \
                asking_price, revenue, profit, \
                founded_year, monthly_visitors, website_url, \
                seller_contact, confidential_notes, \
                is_verified, is_confidential, nda_required, \
                status, rejection_reason, \
                created_at, listed_at, updated_at\
            ) VALUES (\
                $1::VARCHAR, $2::VARCHAR, $3::UUID, \
                $4::VARCHAR, $5::TEXT, $6::TEXT, \
                $7::INT2, $8::INT2, \
                $9::NUMERIC, $10::NUMERIC, $11::NUMERIC, \
                $12::INT2, $13::INT8, $14::TEXT, \
                $15::VARCHAR, $16::TEXT, \
                $17::BOOLEAN, $18::BOOLEAN, $19::BOOLEAN, \
                $20::INT2, $21::TEXT, \
                $22::TIMESTAMPTZ, $23::TIMESTAMPTZ, $24::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(
            SQL,
            &[
                &listing.id,
                &listing.slug,
                &listing.seller_id,
                &listing.title,
                &listing.summary,
                &listing.description,
                &listing.category,
                &listing.business_model,
                &listing.asking_price,
                &listing.revenue,
                &listing.profit,
                &listing.founded_year,
                &listing.monthly_visitors,
                &listing.website_url,
                &listing.seller_contact,
                &listing.confidential_notes,
                &listing.is_verified,
                &listing.is_confidential,
                &listing.nda_required,
                &listing.status,
                &listing.rejection_reason,
                &listing.created_at,
                &listing.listed_at,
                &listing.updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Listing>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(listing): Update<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE listings \
            SET slug = $2::VARCHAR, \
                title = $3::VARCHAR, \
                summary = $4::TEXT, \
                description = $5::TEXT, \
                category = $6::INT2, \
                business_model = $7::INT2, \
                asking_price = $8::NUMERIC, \
                revenue = $9::NUMERIC, \
                profit = $10::NUMERIC, \
                founded_year = $11::INT2, \
                monthly_visitors = $12::INT8, \
                website_url = $13::TEXT, \
                seller_contact = $14::VARCHAR, \
                confidential_notes = $15::TEXT, \
                is_verified = $16::BOOLEAN, \
                is_confidential = $17::BOOLEAN, \
                nda_required = $18::BOOLEAN, \
                status = $19::INT2, \
                rejection_reason = $20::TEXT, \
                listed_at = $21::TIMESTAMPTZ, \
                updated_at = $22::TIMESTAMPTZ \
            WHERE id = $1::VARCHAR";
        self.exec(
            SQL,
            &[
                &listing.id,
                &listing.slug,
                &listing.title,
                &listing.summary,
                &listing.description,
                &listing.category,
                &listing.business_model,
                &listing.asking_price,
                &listing.revenue,
                &listing.profit,
                &listing.founded_year,
                &listing.monthly_visitors,
                &listing.website_url,
                &listing.seller_contact,
                &listing.confidential_notes,
                &listing.is_verified,
                &listing.is_confidential,
                &listing.nda_required,
                &listing.status,
                &listing.rejection_reason,
                &listing.listed_at,
                &listing.updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Listing, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: listing::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM listings \
            WHERE id = $1::VARCHAR \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
