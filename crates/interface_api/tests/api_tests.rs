//! HTTP tests for the REST surface
//!
//! Each test serves the router over a fresh in-memory ledger whose clock
//! reads 2024-03-15.

use axum::http::StatusCode;
use axum_test::TestServer;
use core_kernel::Money;
use domain_sales::contract::{Contract, RemainingBalance};
use domain_sales::house::{BulkHouseReport, House, HouseStatus};
use domain_sales::overdue::DebtAssessment;
use domain_sales::payment::Payment;
use domain_sales::receipt::{ReceiptIssued, ReceiptRemoval};
use domain_sales::resale::ResaleView;
use domain_sales::statistics::SalesStatistics;
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use test_utils::{
    assert_money_eq, date, NewContractBuilder, NewHouseBuilder, NewPaymentBuilder, NewReceiptBuilder,
    NewResaleBuilder, TestLedger,
};

async fn serve() -> anyhow::Result<(TestServer, TestLedger)> {
    let ledger = TestLedger::new().await?;
    let state = AppState::new(ledger.port(), ledger.clock.clone(), ApiConfig::default())
        .with_store(ledger.store.clone());
    let server = TestServer::new(create_router(state))?;
    Ok((server, ledger))
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_store() -> anyhow::Result<()> {
        let (server, _ledger) = serve().await?;

        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"]["adapter_id"], "sqlite");
        assert!(response.headers().get("x-request-id").is_some());
        Ok(())
    }
}

mod house_tests {
    use super::*;

    #[tokio::test]
    async fn test_house_lifecycle() -> anyhow::Result<()> {
        let (server, _ledger) = serve().await?;

        let response = server.post("/api/houses").json(&NewHouseBuilder::new(14).build()).await;
        response.assert_status(StatusCode::CREATED);
        let house: House = response.json();

        let fetched: House = server.get(&format!("/api/houses/{}", house.id)).await.json();
        assert_eq!(fetched.house_number, 14);

        let updated = NewHouseBuilder::new(14).phase(3).build();
        let response = server.put(&format!("/api/houses/{}", house.id)).json(&updated).await;
        response.assert_status_ok();
        assert_eq!(response.json::<House>().phase, 3);

        let phase_three: Vec<House> = server.get("/api/houses").add_query_param("phase", 3).await.json();
        assert_eq!(phase_three.len(), 1);

        server
            .delete(&format!("/api/houses/{}", house.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        let remaining: Vec<House> = server.get("/api/houses").await.json();
        assert!(remaining.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_house_is_404_with_entity() -> anyhow::Result<()> {
        let (server, _ledger) = serve().await?;

        let response = server.get("/api/houses/77").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["entity"], "House");
        assert_eq!(body["id"], "77");
        Ok(())
    }

    #[tokio::test]
    async fn test_every_invalid_field_is_reported() -> anyhow::Result<()> {
        let (server, _ledger) = serve().await?;

        let mut input = NewHouseBuilder::new(0).phase(9).build();
        input.block_number = 0;
        let response = server.post("/api/houses").json(&input).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .map(|a| a.iter().filter_map(|f| f["field"].as_str()).collect())
            .unwrap_or_default();
        assert!(fields.contains(&"house_number"));
        assert!(fields.contains(&"block_number"));
        assert!(fields.contains(&"phase"));
        Ok(())
    }

    #[tokio::test]
    async fn test_every_absent_key_is_reported() -> anyhow::Result<()> {
        let (server, _ledger) = serve().await?;

        let response = server
            .post("/api/receipts")
            .json(&json!({
                "receipt_number": 7,
                "unit_number": 12,
                "block_number": 3,
                "unit_area": "200",
                "amount_received": "-5",
                "remaining_amount": "100000"
            }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        let fields: Vec<(&str, &str)> = body["fields"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|f| Some((f["field"].as_str()?, f["message"].as_str()?)))
                    .collect()
            })
            .unwrap_or_default();
        assert_eq!(
            fields,
            vec![
                ("amount_received", "must be greater than zero"),
                ("buyer_name", "is required"),
                ("mobile_number", "is required"),
                ("receipt_date", "is required"),
            ]
        );

        let receipts: Vec<Value> = server.get("/api/receipts").await.json();
        assert!(receipts.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_creation_numbers_after_existing_houses() -> anyhow::Result<()> {
        let (server, _ledger) = serve().await?;
        server.post("/api/houses").json(&NewHouseBuilder::new(7).build()).await;

        let response = server.post("/api/houses/bulk").json(&json!({ "count": 3, "seed": 11 })).await;
        response.assert_status(StatusCode::CREATED);
        let report: BulkHouseReport = response.json();
        assert_eq!(report.added, 3);
        assert_eq!(report.errors, 0);
        assert_eq!(report.first_house_number, Some(8));
        assert_eq!(report.last_house_number, Some(10));

        let houses: Vec<House> = server.get("/api/houses").await.json();
        assert_eq!(houses.len(), 4);

        let defaulted: BulkHouseReport = server.post("/api/houses/bulk").json(&json!({})).await.json();
        assert_eq!(defaulted.added, 100);
        assert_eq!(defaulted.first_house_number, Some(11));

        let response = server.post("/api/houses/bulk").json(&json!({ "count": 1001 })).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["fields"][0]["field"], "count");
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() -> anyhow::Result<()> {
        let (server, _ledger) = serve().await?;

        let response = server
            .post("/api/houses")
            .json(&json!({ "house_number": "twelve" }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["fields"][0]["field"], "body");
        Ok(())
    }
}

mod sales_flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_receipt_payment_and_removal() -> anyhow::Result<()> {
        let (server, _ledger) = serve().await?;

        let house: House = server.post("/api/houses").json(&NewHouseBuilder::new(3).build()).await.json();

        let response = server
            .post("/api/receipts")
            .json(&NewReceiptBuilder::new(100, 3).for_house(house.id).build())
            .await;
        response.assert_status(StatusCode::CREATED);
        let issued: ReceiptIssued = response.json();
        let contract_id = issued.contract.id;

        let payment: Payment = server
            .post("/api/payments")
            .json(&NewPaymentBuilder::new(contract_id).amount(Money::new(dec!(20000))).build())
            .await
            .json();

        let balance: RemainingBalance = server.get(&format!("/api/contracts/{contract_id}/remaining")).await.json();
        assert_money_eq(balance.remaining_amount, Money::new(dec!(100000)));

        let by_contract: Vec<Payment> = server.get(&format!("/api/contracts/{contract_id}/payments")).await.json();
        let by_alias: Vec<Payment> = server.get(&format!("/api/payments/contract/{contract_id}")).await.json();
        assert_eq!(by_contract, by_alias);
        assert_eq!(by_contract.len(), 1);

        let deleted: Payment = server.delete(&format!("/api/payments/{}", payment.id)).await.json();
        assert_eq!(deleted.id, payment.id);

        let removal: ReceiptRemoval = server
            .delete(&format!("/api/receipts/{}", issued.receipt.id))
            .await
            .json();
        assert_eq!(removal.contract_id, Some(contract_id));
        assert_eq!(removal.house_released, Some(house.id));

        server
            .get(&format!("/api/contracts/{contract_id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_manual_contract_and_sold_houses() -> anyhow::Result<()> {
        let (server, _ledger) = serve().await?;

        let house: House = server.post("/api/houses").json(&NewHouseBuilder::new(8).build()).await.json();
        let response = server
            .post("/api/contracts")
            .json(&NewContractBuilder::new(8).buyer("Noor Saleh").build())
            .await;
        response.assert_status(StatusCode::CREATED);
        let contract: Contract = response.json();
        assert_eq!(contract.contract_number, 1);

        let sold: Value = server.get("/api/contracts/sold-houses").await.json();
        assert_eq!(sold[0]["house_number"], 8);
        assert_eq!(sold[0]["buyer_name"], "Noor Saleh");

        server
            .delete(&format!("/api/contracts/{}", contract.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get(&format!("/api/contracts/{}", contract.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        let freed: House = server.get(&format!("/api/houses/{}", house.id)).await.json();
        assert_eq!(freed.status, HouseStatus::Available);
        let sold: Value = server.get("/api/contracts/sold-houses").await.json();
        assert_eq!(sold, json!([]));
        Ok(())
    }

    #[tokio::test]
    async fn test_resale_listing_for_sold_house() -> anyhow::Result<()> {
        let (server, _ledger) = serve().await?;

        let house: House = server.post("/api/houses").json(&NewHouseBuilder::new(5).build()).await.json();

        // Not sold yet
        server
            .post("/api/resale")
            .json(&NewResaleBuilder::new(house.id).build())
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        server
            .post("/api/receipts")
            .json(&NewReceiptBuilder::new(1, 5).for_house(house.id).build())
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.post("/api/resale").json(&NewResaleBuilder::new(house.id).build()).await;
        response.assert_status(StatusCode::CREATED);
        let view: ResaleView = response.json();
        assert_eq!(view.house.map(|h| h.house_number), Some(5));

        let listed: Vec<ResaleView> = server.get("/api/resale").await.json();
        assert_eq!(listed.len(), 1);
        Ok(())
    }
}

mod report_tests {
    use super::*;

    #[tokio::test]
    async fn test_debts_lists_and_searches() -> anyhow::Result<()> {
        let (server, _ledger) = serve().await?;

        server
            .post("/api/contracts")
            .json(&NewContractBuilder::new(1).dated(date(2024, 1, 1)).build())
            .await
            .assert_status(StatusCode::CREATED);

        let overdue: Vec<DebtAssessment> = server.get("/api/debts").await.json();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].next_due_date, date(2024, 1, 31));
        assert_eq!(overdue[0].days_overdue, 44);

        let none: Vec<DebtAssessment> = server.get("/api/debts").add_query_param("search", "nobody").await.json();
        assert!(none.is_empty());

        let by_mobile: Vec<DebtAssessment> = server.get("/api/debts").add_query_param("search", "0770").await.json();
        assert_eq!(by_mobile.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_statistics_endpoint() -> anyhow::Result<()> {
        let (server, _ledger) = serve().await?;

        let empty: SalesStatistics = server.get("/api/statistics").await.json();
        assert_eq!(empty.total_sold_houses, 0);
        assert!(empty.total_debts.is_zero());

        server
            .post("/api/contracts")
            .json(&NewContractBuilder::new(2).build())
            .await
            .assert_status(StatusCode::CREATED);

        let stats: SalesStatistics = server.get("/api/statistics").await.json();
        assert_eq!(stats.total_sold_houses, 1);
        assert_money_eq(stats.total_debts, Money::new(dec!(120000)));
        Ok(())
    }
}

mod database_tests {
    use super::*;
    use axum::body::Bytes;
    use interface_api::dto::database::ImportReport;

    #[tokio::test]
    async fn test_export_then_import_into_another_ledger() -> anyhow::Result<()> {
        let (source, _source_ledger) = serve().await?;
        let house: House = source.post("/api/houses").json(&NewHouseBuilder::new(3).build()).await.json();
        source
            .post("/api/receipts")
            .json(&NewReceiptBuilder::new(1, 3).for_house(house.id).build())
            .await
            .assert_status(StatusCode::CREATED);

        let response = source.get("/api/database/export").await;
        response.assert_status_ok();
        let disposition = response
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"realty-"));
        let file = response.as_bytes().clone();
        assert!(file.starts_with(b"SQLite format 3\0"));

        let (target, _target_ledger) = serve().await?;
        target.post("/api/houses").json(&NewHouseBuilder::new(50).build()).await;

        let response = target.post("/api/database/import").bytes(file).await;
        response.assert_status_ok();
        let report: ImportReport = response.json();
        assert_eq!(report.houses, 1);
        assert_eq!(report.receipts, 1);
        assert_eq!(report.contracts, 1);

        let houses: Vec<House> = target.get("/api/houses").await.json();
        assert_eq!(houses.len(), 1);
        assert_eq!(houses[0].house_number, 3);
        assert_eq!(houses[0].status, HouseStatus::Sold);
        let contracts: Vec<Contract> = target.get("/api/contracts").await.json();
        assert_eq!(contracts.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_of_non_database_is_rejected() -> anyhow::Result<()> {
        let (server, _ledger) = serve().await?;
        server.post("/api/houses").json(&NewHouseBuilder::new(1).build()).await;

        let response = server
            .post("/api/database/import")
            .bytes(Bytes::from_static(b"plain text, not sqlite"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let houses: Vec<House> = server.get("/api/houses").await.json();
        assert_eq!(houses.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_needs_embedded_store() -> anyhow::Result<()> {
        let ledger = TestLedger::new().await?;
        let state = AppState::new(ledger.port(), ledger.clock.clone(), ApiConfig::default());
        let server = TestServer::new(create_router(state))?;

        server.get("/api/database/export").await.assert_status(StatusCode::BAD_REQUEST);
        server
            .post("/api/database/import")
            .bytes(Bytes::from_static(b"SQLite format 3\0"))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        Ok(())
    }
}
