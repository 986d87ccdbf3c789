//! Seed rows for the store-backed tests.
//!
//! Those tests run against a throwaway database created by `#[sqlx::test]`
//! and are ignored by default; run them with a Postgres `DATABASE_URL` and
//! `cargo test -- --ignored`.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) async fn user(pool: &PgPool, is_staff: bool) -> Uuid {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, is_staff)
        VALUES ($1, 'unused', 'Test', 'User', $2)
        RETURNING id
        "#,
    )
    .bind(format!("{}@hostel.local", Uuid::new_v4().simple()))
    .bind(is_staff)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

pub(crate) async fn hostel(pool: &PgPool) -> Uuid {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO hostels (
            name, hostel_type, total_rooms, address, contract_start_date,
            deposit_fee, initial_fee, internet_fee, utilities_fee, rent
        )
        VALUES ($1, 'boys', 4, '1-2-3 Shinjuku', '2024-04-01', 30000, 20000, 3000, 2000, 50000)
        RETURNING id
        "#,
    )
    .bind(format!("Sakura {}", Uuid::new_v4().simple()))
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

pub(crate) async fn bedroom(pool: &PgPool, hostel_id: Uuid, room_num: &str) -> Uuid {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO units (hostel_id, unit_type, room_num, num_of_beds)
        VALUES ($1, 'bedroom', $2, 4)
        RETURNING id
        "#,
    )
    .bind(hostel_id)
    .bind(room_num)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

pub(crate) async fn bed(pool: &PgPool, unit_id: Uuid, bed_num: &str) -> Uuid {
    let (id,): (Uuid,) =
        sqlx::query_as("INSERT INTO beds (unit_id, bed_num) VALUES ($1, $2) RETURNING id")
            .bind(unit_id)
            .bind(bed_num)
            .fetch_one(pool)
            .await
            .unwrap();
    id
}

pub(crate) async fn customer(pool: &PgPool, name: &str) -> Uuid {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO customers (
            name, date_of_birth, phone, nationality, visa_type,
            residence_card_number, residence_card_expiry
        )
        VALUES ($1, '1999-07-01', '090-1234-5678', 'VN', 'student', 'AB1234567', '2027-03-31')
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

pub(crate) async fn count(pool: &PgPool, table: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap();
    n
}
