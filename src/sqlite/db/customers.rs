use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Customer, LockerDetails},
    traits::MirrorError,
};

/// Inserts a customer, or brings the stored row up to date if the incoming version both differs
/// and carries a strictly later source `modified` timestamp (last-writer-wins by source time, not
/// by local write time).
pub async fn upsert_customer(customer: &Customer, conn: &mut SqliteConnection) -> Result<(), MirrorError> {
    let inserted = insert_customer(customer, conn).await?;
    if inserted {
        return Ok(());
    }
    let stored: Customer =
        sqlx::query_as("SELECT * FROM customers WHERE id = $1").bind(customer.id).fetch_one(&mut *conn).await?;
    let newer = match (customer.modified, stored.modified) {
        (Some(incoming), Some(current)) => incoming > current,
        (Some(_), None) => true,
        _ => false,
    };
    if !customer.same_except_dates(&stored) && newer {
        debug!("🗃️ Updating customer {}", customer.id);
        update_customer(customer, conn).await?;
    }
    Ok(())
}

async fn insert_customer(c: &Customer, conn: &mut SqliteConnection) -> Result<bool, MirrorError> {
    let result = sqlx::query(
        r#"
        INSERT INTO customers (
            id, mkt_id, name, email, company, gender, code, registration_number, bank, iban,
            legal_entity, is_vat_payer, phone_1, billing_name, billing_phone, billing_country,
            billing_city, billing_street, billing_postal_code, shipping_country, shipping_city,
            shipping_street, shipping_postal_code, shipping_contact, shipping_phone, created, modified
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19,
            $20, $21, $22, $23, $24, $25, $26, $27
        ) ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(c.id)
    .bind(c.mkt_id)
    .bind(&c.name)
    .bind(&c.email)
    .bind(&c.company)
    .bind(&c.gender)
    .bind(&c.code)
    .bind(&c.registration_number)
    .bind(&c.bank)
    .bind(&c.iban)
    .bind(c.legal_entity)
    .bind(c.is_vat_payer)
    .bind(&c.phone_1)
    .bind(&c.billing_name)
    .bind(&c.billing_phone)
    .bind(&c.billing_country)
    .bind(&c.billing_city)
    .bind(&c.billing_street)
    .bind(&c.billing_postal_code)
    .bind(&c.shipping_country)
    .bind(&c.shipping_city)
    .bind(&c.shipping_street)
    .bind(&c.shipping_postal_code)
    .bind(&c.shipping_contact)
    .bind(&c.shipping_phone)
    .bind(c.created)
    .bind(c.modified)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

async fn update_customer(c: &Customer, conn: &mut SqliteConnection) -> Result<(), MirrorError> {
    sqlx::query(
        r#"
        UPDATE customers SET
            mkt_id = $2, name = $3, email = $4, company = $5, gender = $6, code = $7,
            registration_number = $8, bank = $9, iban = $10, legal_entity = $11, is_vat_payer = $12,
            phone_1 = $13, billing_name = $14, billing_phone = $15, billing_country = $16,
            billing_city = $17, billing_street = $18, billing_postal_code = $19,
            shipping_country = $20, shipping_city = $21, shipping_street = $22,
            shipping_postal_code = $23, shipping_contact = $24, shipping_phone = $25, modified = $26
        WHERE id = $1
        "#,
    )
    .bind(c.id)
    .bind(c.mkt_id)
    .bind(&c.name)
    .bind(&c.email)
    .bind(&c.company)
    .bind(&c.gender)
    .bind(&c.code)
    .bind(&c.registration_number)
    .bind(&c.bank)
    .bind(&c.iban)
    .bind(c.legal_entity)
    .bind(c.is_vat_payer)
    .bind(&c.phone_1)
    .bind(&c.billing_name)
    .bind(&c.billing_phone)
    .bind(&c.billing_country)
    .bind(&c.billing_city)
    .bind(&c.billing_street)
    .bind(&c.billing_postal_code)
    .bind(&c.shipping_country)
    .bind(&c.shipping_city)
    .bind(&c.shipping_street)
    .bind(&c.shipping_postal_code)
    .bind(&c.shipping_contact)
    .bind(&c.shipping_phone)
    .bind(c.modified)
    .execute(conn)
    .await?;
    Ok(())
}

/// Lockers carry no source timestamp, so the stored row is refreshed whenever the incoming version
/// differs.
pub async fn upsert_locker(locker: &LockerDetails, conn: &mut SqliteConnection) -> Result<(), MirrorError> {
    let result = sqlx::query(
        "INSERT INTO lockers (locker_id, name, locker_delivery_eligible, courier_external_office_id) VALUES ($1, \
         $2, $3, $4) ON CONFLICT (locker_id) DO NOTHING",
    )
    .bind(&locker.locker_id)
    .bind(&locker.name)
    .bind(locker.locker_delivery_eligible)
    .bind(&locker.courier_external_office_id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() > 0 {
        return Ok(());
    }
    let stored: LockerDetails = sqlx::query_as("SELECT * FROM lockers WHERE locker_id = $1")
        .bind(&locker.locker_id)
        .fetch_one(&mut *conn)
        .await?;
    if stored != *locker {
        debug!("🗃️ Updating locker {}", locker.locker_id);
        sqlx::query(
            "UPDATE lockers SET name = $2, locker_delivery_eligible = $3, courier_external_office_id = $4 WHERE \
             locker_id = $1",
        )
        .bind(&locker.locker_id)
        .bind(&locker.name)
        .bind(locker.locker_delivery_eligible)
        .bind(&locker.courier_external_office_id)
        .execute(conn)
        .await?;
    }
    Ok(())
}
