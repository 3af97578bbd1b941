//! Repository traits + Postgres implementation.

mod postgres;
mod traits;

pub use postgres::{
    create_pool, PgJobRepository, PgPaymentMethodRepository, PgRetryEntryRepository, PgSubscriptionRepository,
    PgTransactionRepository,
};
pub use traits::{
    JobRepository, PaymentMethodRepository, RetryEntryRepository, SubscriptionRepository, TransactionRepository,
    TransactionStats,
};
