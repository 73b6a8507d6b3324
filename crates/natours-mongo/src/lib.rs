//! # natours-mongo
//!
//! MongoDB implementation of the natours store traits.
//!
//! Collections: `tours`, `users`, `reviews`, `bookings`. Documents use the
//! domain types' serde shape directly (`_id` string keys, camelCase fields).
//! Uniqueness rules are enforced by indexes created in [`MongoStore::connect`]:
//!
//! | Collection | Unique key |
//! |------------|------------|
//! | tours | `name` |
//! | users | `email` |
//! | reviews | `(tour, user)` |
//! | bookings | `paymentId` |

mod filters;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use natours_core::{
    AppError, AppResult, Booking, BookingFilter, BookingStore, RatingStats, Review, ReviewStore,
    Tour, TourQuery, TourStore, User, UserStore,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

pub use filters::{booking_filter, tour_filter, tour_sort};

const DUPLICATE_KEY: i32 = 11000;

/// Store backed by a MongoDB database
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect, ping, and make sure the unique indexes exist.
    ///
    /// The database named in the URI wins over `default_db`.
    pub async fn connect(uri: &str, default_db: &str) -> AppResult<Self> {
        let client = Client::with_uri_str(uri).await.map_err(store_error)?;
        let db = client
            .default_database()
            .unwrap_or_else(|| client.database(default_db));

        db.run_command(doc! { "ping": 1 }).await.map_err(store_error)?;
        info!("Connected to MongoDB database '{}'", db.name());

        let store = Self { db };
        store.ensure_indexes().await?;
        Ok(store)
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    fn tours(&self) -> Collection<Tour> {
        self.db.collection("tours")
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn reviews(&self) -> Collection<Review> {
        self.db.collection("reviews")
    }

    fn bookings(&self) -> Collection<Booking> {
        self.db.collection("bookings")
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.tours()
            .create_index(IndexModel::builder().keys(doc! { "name": 1 }).options(unique()).build())
            .await
            .map_err(store_error)?;
        self.users()
            .create_index(IndexModel::builder().keys(doc! { "email": 1 }).options(unique()).build())
            .await
            .map_err(store_error)?;
        self.reviews()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "tour": 1, "user": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(store_error)?;
        self.bookings()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "paymentId": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(store_error)?;

        debug!("MongoDB indexes ensured");
        Ok(())
    }
}

fn store_error(err: mongodb::error::Error) -> AppError {
    AppError::Store(err.to_string())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// Map an insert failure, turning duplicate keys into `Conflict`
fn insert_error(err: mongodb::error::Error, conflict: &str) -> AppError {
    if is_duplicate_key(&err) {
        AppError::Conflict(conflict.to_string())
    } else {
        store_error(err)
    }
}

async fn find_by_id<T>(coll: Collection<T>, id: &str) -> AppResult<Option<T>>
where
    T: DeserializeOwned + Send + Sync,
{
    coll.find_one(doc! { "_id": id }).await.map_err(store_error)
}

async fn collect<T>(coll: Collection<T>, filter: Document) -> AppResult<Vec<T>>
where
    T: DeserializeOwned + Send + Sync,
{
    coll.find(filter)
        .await
        .map_err(store_error)?
        .try_collect()
        .await
        .map_err(store_error)
}

#[async_trait]
impl TourStore for MongoStore {
    async fn list_tours(&self, query: &TourQuery) -> AppResult<Vec<Tour>> {
        self.tours()
            .find(tour_filter(query))
            .sort(tour_sort(query.sort))
            .skip(query.skip())
            .limit(i64::from(query.limit))
            .await
            .map_err(store_error)?
            .try_collect()
            .await
            .map_err(store_error)
    }

    async fn find_tour(&self, id: &str) -> AppResult<Option<Tour>> {
        find_by_id(self.tours(), id).await
    }

    async fn insert_tour(&self, tour: Tour) -> AppResult<Tour> {
        self.tours()
            .insert_one(&tour)
            .await
            .map_err(|e| insert_error(e, "A tour with that name already exists"))?;
        Ok(tour)
    }

    async fn replace_tour(&self, tour: &Tour) -> AppResult<bool> {
        let result = self
            .tours()
            .replace_one(doc! { "_id": &tour.id }, tour)
            .await
            .map_err(|e| insert_error(e, "A tour with that name already exists"))?;
        Ok(result.matched_count == 1)
    }

    async fn delete_tour(&self, id: &str) -> AppResult<bool> {
        let result = self
            .tours()
            .delete_one(doc! { "_id": id })
            .await
            .map_err(store_error)?;
        Ok(result.deleted_count == 1)
    }

    async fn set_tour_ratings(&self, id: &str, stats: RatingStats) -> AppResult<()> {
        self.tours()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "ratingsQuantity": i64::from(stats.quantity),
                    "ratingsAverage": stats.average,
                } },
            )
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn insert_user(&self, user: User) -> AppResult<User> {
        self.users()
            .insert_one(&user)
            .await
            .map_err(|e| insert_error(e, "Email is already registered"))?;
        Ok(user)
    }

    async fn find_user(&self, id: &str) -> AppResult<Option<User>> {
        find_by_id(self.users(), id).await
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.users()
            .find_one(doc! { "email": email })
            .await
            .map_err(store_error)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        collect(self.users(), doc! {}).await
    }
}

#[async_trait]
impl ReviewStore for MongoStore {
    async fn insert_review(&self, review: Review) -> AppResult<Review> {
        self.reviews()
            .insert_one(&review)
            .await
            .map_err(|e| insert_error(e, "You have already reviewed this tour"))?;
        Ok(review)
    }

    async fn find_review(&self, id: &str) -> AppResult<Option<Review>> {
        find_by_id(self.reviews(), id).await
    }

    async fn list_reviews(&self, tour_id: Option<&str>) -> AppResult<Vec<Review>> {
        let filter = match tour_id {
            Some(tour) => doc! { "tour": tour },
            None => doc! {},
        };
        collect(self.reviews(), filter).await
    }

    async fn delete_review(&self, id: &str) -> AppResult<bool> {
        let result = self
            .reviews()
            .delete_one(doc! { "_id": id })
            .await
            .map_err(store_error)?;
        Ok(result.deleted_count == 1)
    }
}

#[async_trait]
impl BookingStore for MongoStore {
    async fn insert_booking(&self, booking: Booking) -> AppResult<Booking> {
        self.bookings()
            .insert_one(&booking)
            .await
            .map_err(|e| {
                insert_error(
                    e,
                    &format!("Booking already recorded for payment {}", booking.payment_id),
                )
            })?;
        Ok(booking)
    }

    async fn find_booking(&self, id: &str) -> AppResult<Option<Booking>> {
        find_by_id(self.bookings(), id).await
    }

    async fn find_booking_by_payment(&self, payment_id: &str) -> AppResult<Option<Booking>> {
        self.bookings()
            .find_one(doc! { "paymentId": payment_id })
            .await
            .map_err(store_error)
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> AppResult<Vec<Booking>> {
        collect(self.bookings(), booking_filter(filter)).await
    }
}
