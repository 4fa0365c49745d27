//! [`Event`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use postgres_types::Json;
use tracerr::Traced;

use crate::{
    domain::{event, Event},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

impl<C> Database<Insert<Event>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(event): Insert<Event>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO events (kind, payload, occurred_at) \
            VALUES ($1::INT2, $2::JSONB, $3::TIMESTAMPTZ)";
        self.exec(
            SQL,
            &[
                &event.kind(),
                &Json(&event),
                &event::OccurrenceDateTime::now(),
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<event::Record>, read::event::After>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<event::Record>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<event::Record>, read::event::After>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::event::After { seq, limit } = by.into_inner();
        let after = seq.map_or(0, i64::from);
        let limit = i64::try_from(limit.get()).unwrap_or(i64::MAX);

        const SQL: &str = "\
            SELECT seq, payload, occurred_at \
            FROM events \
            WHERE seq > $1::INT8 \
            ORDER BY seq ASC \
            LIMIT $2::INT8";
        Ok(self
            .query(SQL, &[&after, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| event::Record {
                seq: row.get("seq"),
                event: row.get::<_, Json<Event>>("payload").0,
                occurred_at: row.get("occurred_at"),
            })
            .collect())
    }
}
