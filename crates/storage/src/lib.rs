pub mod db;

pub use db::{
    create_db, get_all_transactions, insert_candidate, insert_transaction, DbPool,
    StorageError, StoredTransaction,
};
