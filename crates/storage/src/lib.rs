pub mod db;

pub use db::{
    create_db, get_all_accounts, get_all_categories, get_all_tags, get_user, insert_account,
    insert_category, insert_tag, insert_user, seed_demo, DbPool, SqliteBookkeeping,
    DEMO_USERNAME,
};
