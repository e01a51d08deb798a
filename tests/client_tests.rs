use milk_ledger::LedgerError;
use milk_ledger::api::{LedgerClient, SettingsUpdate};
use milk_ledger::db::{EntryInput, PaymentInput};
use milk_ledger::types::{Month, Theme};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use url::Url;

/// Serve the router on a loopback port; returns the base URL.
async fn serve() -> Url {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut db_path = std::env::temp_dir();
    db_path.push(format!(
        "milk-ledger-client-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let store = milk_ledger::LedgerStore::connect(&database_url, 1)
        .await
        .expect("failed to open store");
    let cfg = milk_ledger::config::Config::default();
    let state = milk_ledger::LedgerState::new(store, &cfg).expect("state");
    let app = milk_ledger::ledger_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Url::parse(&format!("http://{addr}/")).expect("base url")
}

fn client(base: &Url, pin: &str) -> LedgerClient {
    let http = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("http client");
    LedgerClient::with_client(http, base.clone(), pin)
}

fn entry(date: &str, quantity: f64) -> EntryInput {
    EntryInput {
        date: date.parse().unwrap(),
        quantity,
        rate: 60.0,
    }
}

#[tokio::test]
async fn month_snapshot_derives_the_dashboard() {
    let base = serve().await;
    let api = client(&base, "2580");
    api.login().await.expect("default PIN logs in");

    let first = api.save_entry(&entry("2024-03-01", 4.0)).await.unwrap();
    api.save_entry(&entry("2024-03-02", 2.0)).await.unwrap();
    let replaced = api.save_entry(&entry("2024-03-01", 1.0)).await.unwrap();
    assert_eq!(first, replaced);

    let keep = api
        .save_payment(&PaymentInput {
            id: None,
            date: "2024-03-01".parse().unwrap(),
            amount: 100.0,
        })
        .await
        .unwrap();
    let extra = api
        .save_payment(&PaymentInput {
            id: None,
            date: "2024-03-01".parse().unwrap(),
            amount: 20.0,
        })
        .await
        .unwrap();
    api.delete_payment(extra).await.unwrap();

    let month: Month = "2024-03".parse().unwrap();
    let snapshot = api.month_snapshot(month).await.unwrap();
    assert_eq!(snapshot.payments.len(), 1);
    assert_eq!(snapshot.payments[0].id, keep);

    let summary = snapshot.summary();
    assert_eq!(summary.total_liters, 3.0);
    assert_eq!(summary.total_amount, 180.0);
    assert_eq!(summary.paid_amount, 100.0);
    assert_eq!(summary.balance, 80.0);
    assert_eq!(summary.total_days, 2);

    let chart = snapshot.chart();
    assert_eq!(chart.len(), 31);
    assert_eq!(chart[1].liters, 2.0);
    assert!(snapshot.report().share_text().contains("*Balance Due: ₹80.00*"));
}

#[tokio::test]
async fn settings_update_round_trips() {
    let base = serve().await;
    let api = client(&base, "2580");

    api.update_settings(&SettingsUpdate {
        default_rate: Some(65.5),
        theme: Some(Theme::Forest),
    })
    .await
    .unwrap();

    let settings = api.settings().await.unwrap();
    assert_eq!(settings.default_rate, 65.5);
    assert_eq!(settings.theme, Theme::Forest);
}

#[tokio::test]
async fn pin_change_flow() {
    let base = serve().await;
    let mut api = client(&base, "2580");

    assert!(matches!(
        api.change_pin("2580", "1234", "1243").await,
        Err(LedgerError::PinConfirmationMismatch)
    ));
    assert!(matches!(
        api.change_pin("2580", "12", "12").await,
        Err(LedgerError::InvalidPinFormat)
    ));
    assert!(matches!(
        api.change_pin("0000", "1234", "1234").await,
        Err(LedgerError::PinMismatch)
    ));

    api.change_pin("2580", "1234", "1234").await.unwrap();
    api.login().await.expect("client switched to the new PIN");
    api.entries("2024-03".parse().unwrap()).await.unwrap();

    let stale = client(&base, "2580");
    assert!(matches!(stale.login().await, Err(LedgerError::IncorrectPin)));
}

#[tokio::test]
async fn missing_entry_update_is_not_found() {
    let base = serve().await;
    let api = client(&base, "2580");
    assert!(matches!(
        api.update_entry(404, &entry("2024-03-01", 1.0)).await,
        Err(LedgerError::NotFound(_))
    ));
}
