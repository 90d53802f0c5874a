//! House queries

use chrono::Utc;
use core_kernel::HouseId;
use domain_sales::house::{House, HouseFilter, HouseStatus, NewHouse};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::rows::{convert_all, HouseRow, HOUSE_COLUMNS};
use crate::error::DatabaseError;

/// Houses matching the filter, by house number; deleted houses never match
pub async fn list(conn: &mut SqliteConnection, filter: &HouseFilter) -> Result<Vec<House>, DatabaseError> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {HOUSE_COLUMNS} FROM houses WHERE COALESCE(status, 'available') != 'deleted'"
    ));
    if !filter.include_sold {
        query.push(" AND COALESCE(status, 'available') = 'available'");
    }
    if let Some(phase) = filter.phase {
        query.push(" AND phase = ").push_bind(i64::from(phase));
    }
    query.push(" ORDER BY house_number");

    let rows: Vec<HouseRow> = query.build_query_as().fetch_all(&mut *conn).await?;
    convert_all(rows)
}

pub async fn find(conn: &mut SqliteConnection, id: HouseId) -> Result<Option<House>, DatabaseError> {
    let row: Option<HouseRow> = sqlx::query_as(&format!("SELECT {HOUSE_COLUMNS} FROM houses WHERE id = ?"))
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await?;
    row.map(House::try_from).transpose()
}

pub async fn find_by_number(conn: &mut SqliteConnection, house_number: i64) -> Result<Option<House>, DatabaseError> {
    let row: Option<HouseRow> =
        sqlx::query_as(&format!("SELECT {HOUSE_COLUMNS} FROM houses WHERE house_number = ?"))
            .bind(house_number)
            .fetch_optional(&mut *conn)
            .await?;
    row.map(House::try_from).transpose()
}

pub async fn max_number(conn: &mut SqliteConnection) -> Result<Option<i64>, DatabaseError> {
    let max: Option<i64> = sqlx::query_scalar("SELECT MAX(house_number) FROM houses")
        .fetch_one(&mut *conn)
        .await?;
    Ok(max)
}

/// Inserts a new `available` house under the given id
pub async fn insert(conn: &mut SqliteConnection, id: HouseId, house: &NewHouse) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO houses (
            id, house_number, block_number, total_area, building_area, total_price,
            down_payment, loan_amount, phase, outlook, floors, building_material,
            additional_specs, status, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.get())
    .bind(house.house_number)
    .bind(house.block_number)
    .bind(house.total_area.to_string())
    .bind(house.building_area.to_string())
    .bind(house.total_price.amount().to_string())
    .bind(house.down_payment.amount().to_string())
    .bind(house.loan_amount.amount().to_string())
    .bind(i64::from(house.phase))
    .bind(house.outlook.map(|m| m.amount().to_string()))
    .bind(house.floors)
    .bind(house.building_material.as_deref())
    .bind(house.additional_specs.as_deref())
    .bind(HouseStatus::Available.as_str())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Replaces the editable fields; status is left as it is
pub async fn update(conn: &mut SqliteConnection, id: HouseId, house: &NewHouse) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE houses SET
            house_number = ?, block_number = ?, total_area = ?, building_area = ?,
            total_price = ?, down_payment = ?, loan_amount = ?, phase = ?, outlook = ?,
            floors = ?, building_material = ?, additional_specs = ?
        WHERE id = ?
        "#,
    )
    .bind(house.house_number)
    .bind(house.block_number)
    .bind(house.total_area.to_string())
    .bind(house.building_area.to_string())
    .bind(house.total_price.amount().to_string())
    .bind(house.down_payment.amount().to_string())
    .bind(house.loan_amount.amount().to_string())
    .bind(i64::from(house.phase))
    .bind(house.outlook.map(|m| m.amount().to_string()))
    .bind(house.floors)
    .bind(house.building_material.as_deref())
    .bind(house.additional_specs.as_deref())
    .bind(id.get())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("House", id));
    }
    Ok(())
}

pub async fn set_status(conn: &mut SqliteConnection, id: HouseId, status: HouseStatus) -> Result<(), DatabaseError> {
    let result = sqlx::query("UPDATE houses SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id.get())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("House", id));
    }
    Ok(())
}
