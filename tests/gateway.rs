//! End-to-end tests against a local stand-in for the marketplace API

mod support;

use immpression_admin::error::{AdminError, AuthFailure};
use immpression_admin::gateway::{ArtworkStage, GatewayClient, ReportStatus, DEFAULT_TIMEOUT};
use immpression_admin::list::{FetchOutcome, FilterKey, ListController, ListOptions, LoadStatus};
use immpression_admin::resources::{
    ArtworkFilter, ArtworkSource, OrderFilter, OrderSource, ReportAction, ReportFilter,
    ReportSource, UserFilter, UserSource,
};
use immpression_admin::session::{Credential, SessionStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use support::{ok, status, Recorded, StubServer};

fn signed_in(server: &StubServer) -> (SessionStore, Arc<GatewayClient>) {
    let session = SessionStore::in_memory();
    session.login(Credential::new("tok-1"), "admin@immpression.art");
    let client = GatewayClient::new(&server.base_url, DEFAULT_TIMEOUT, session.clone()).unwrap();
    (session, Arc::new(client))
}

fn no_debounce<F: FilterKey>(filter: F) -> ListOptions<F> {
    ListOptions {
        debounce: Duration::from_millis(1),
        filter,
        ..ListOptions::default()
    }
}

fn artwork(id: &str, stage: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "name": format!("Artwork {}", id),
        "artistName": "Mira",
        "stage": stage,
        "price": "120.5",
        "views": 4,
        "createdAt": "2024-05-01T10:00:00Z"
    })
}

#[tokio::test]
async fn test_sign_in_and_renew() {
    let server = StubServer::start(|req: &Recorded| match req.path.as_str() {
        "/api/admin/login" => {
            if req.json()["password"] == "hunter2" {
                ok(json!({ "token": "tok-login", "email": "admin@immpression.art" }))
            } else {
                status(401, json!({ "message": "Invalid email or password" }))
            }
        }
        "/api/admin/renew_token" => ok(json!({ "token": "tok-renewed" })),
        _ => status(404, json!({})),
    })
    .await;

    let session = SessionStore::in_memory();
    let client = GatewayClient::new(&server.base_url, DEFAULT_TIMEOUT, session.clone()).unwrap();

    let err = session
        .sign_in(&client, "admin@immpression.art", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AdminError::Auth(AuthFailure::InvalidCredentials(ref m)) if m == "Invalid email or password"
    ));
    assert!(!session.is_authenticated());

    let signed = session
        .sign_in(&client, " admin@immpression.art ", "hunter2")
        .await
        .unwrap();
    assert_eq!(signed.identity(), "admin@immpression.art");
    assert_eq!(signed.credential().expose(), "tok-login");

    let renewed = session.renew(&client).await.unwrap();
    assert_eq!(renewed.expose(), "tok-renewed");
    assert_eq!(session.identity().as_deref(), Some("admin@immpression.art"));

    let renewal = &server.hits("/api/admin/renew_token")[0];
    assert_eq!(renewal.authorization.as_deref(), Some("Bearer tok-login"));
}

#[tokio::test]
async fn test_rejected_renewal_ends_session() {
    let server = StubServer::start(|_req: &Recorded| status(401, json!({ "error": "expired" }))).await;
    let (session, client) = signed_in(&server);

    let err = session.renew(client.as_ref()).await.unwrap_err();
    assert!(err.is_auth_error());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_artwork_list_and_moderation() {
    let server = StubServer::start(|req: &Recorded| match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/api/admin/all_images") => ok(json!({
            "success": true,
            "data": [artwork("a1", "review"), artwork("a2", "review")],
            "pagination": { "totalPages": 3 }
        })),
        ("GET", "/api/admin/all_images/stats") => ok(json!({
            "success": true,
            "data": { "total": 10, "pending": 4, "approved": 5, "rejected": 1 }
        })),
        ("PUT", "/api/admin/art/a1/approve") => ok(json!({ "success": true, "message": "Artwork approved" })),
        _ => status(404, json!({ "message": "not found" })),
    })
    .await;
    let (_session, client) = signed_in(&server);

    let ctrl = ListController::new(
        Arc::new(ArtworkSource::new(client)),
        no_debounce(ArtworkFilter::Review),
    );
    assert!(ctrl.fetch_page().await.is_applied());
    assert_eq!(ctrl.total_pages(), 3);
    assert_eq!(ctrl.status(), LoadStatus::Ready);

    let items = ctrl.visible_items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].price, Some(120.5));
    assert_eq!(items[0].stage, ArtworkStage::Review);

    let listing = &server.hits("/api/admin/all_images")[0];
    assert_eq!(listing.query.get("stage").map(String::as_str), Some("review"));
    assert_eq!(listing.query.get("page").map(String::as_str), Some("1"));
    assert_eq!(listing.query.get("limit").map(String::as_str), Some("50"));
    assert_eq!(listing.authorization.as_deref(), Some("Bearer tok-1"));

    let receipt = ctrl.approve("a1").await.unwrap();
    assert_eq!(receipt.message, "Artwork approved");
    // approved work leaves the review tile
    let ids: Vec<_> = ctrl.visible_items().into_iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["a2"]);
    assert_eq!(ctrl.stats().approved, 5);
}

#[tokio::test]
async fn test_search_reaches_server_as_input() {
    let server = StubServer::start(|req: &Recorded| {
        let data = match req.query.get("input").map(String::as_str) {
            Some("van gogh") => vec![artwork("vg", "approved")],
            _ => vec![artwork("a1", "review"), artwork("a2", "approved")],
        };
        let total = data.len();
        ok(json!({ "data": data, "pagination": { "total": total } }))
    })
    .await;
    let (_session, client) = signed_in(&server);
    let ctrl = ListController::new(
        Arc::new(ArtworkSource::new(client)),
        no_debounce(ArtworkFilter::All),
    );
    ctrl.fetch_page().await;
    assert_eq!(ctrl.visible_items().len(), 2);

    let mut revisions = ctrl.revisions();
    ctrl.set_search_text("van gogh");
    assert!(ctrl.search_pending());
    tokio::time::timeout(Duration::from_secs(5), async {
        while ctrl.visible_items().len() != 1 {
            revisions.changed().await.unwrap();
        }
    })
    .await
    .unwrap();
    assert_eq!(ctrl.visible_items()[0].id, "vg");
    assert_eq!(ctrl.page(), 1);
}

#[tokio::test]
async fn test_rejected_credential_requires_login() {
    let server = StubServer::start(|_req: &Recorded| status(401, json!({ "message": "jwt expired" }))).await;
    let (_session, client) = signed_in(&server);

    let ctrl = ListController::new(Arc::new(UserSource::new(client)), no_debounce(UserFilter::All));
    match ctrl.fetch_page().await {
        FetchOutcome::Failed(e) => assert!(e.is_auth_error()),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(ctrl.status(), LoadStatus::LoginRequired);
    assert!(ctrl.visible_items().is_empty());
}

#[tokio::test]
async fn test_missing_credential_sends_nothing() {
    let server = StubServer::start(|_req: &Recorded| ok(json!({ "data": [] }))).await;
    let client = GatewayClient::new(&server.base_url, DEFAULT_TIMEOUT, SessionStore::in_memory()).unwrap();

    let err = client.get_user("u1").await.unwrap_err();
    assert!(err.is_auth_error());
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_users_narrow_loaded_page() {
    let server = StubServer::start(|_req: &Recorded| {
        ok(json!({
            "users": [
                { "_id": "u1", "name": "Ana", "email": "ana@x.io", "stripeAccountId": "acct_1" },
                { "_id": "u2", "name": "Ben", "email": "ben@x.io" },
                { "_id": "u3", "name": "Cy", "email": "cy@x.io", "stripeAccountId": "acct_3" }
            ]
        }))
    })
    .await;
    let (_session, client) = signed_in(&server);
    let ctrl = ListController::new(
        Arc::new(UserSource::new(client)),
        no_debounce(UserFilter::StripeLinked),
    );
    ctrl.fetch_page().await;

    let ids: Vec<_> = ctrl.visible_items().into_iter().map(|u| u.id).collect();
    assert_eq!(ids, vec!["u1", "u3"]);
    let stats = ctrl.stats();
    assert_eq!((stats.total, stats.stripe_linked, stats.stripe_unlinked), (3, 2, 1));
}

#[tokio::test]
async fn test_payout_updates_loaded_order() {
    let server = StubServer::start(|req: &Recorded| match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/orders") => ok(json!({
            "data": [{
                "_id": "o1",
                "artName": "Dunes",
                "status": "completed",
                "totalAmount": 200,
                "sellerTransferredCents": 0,
                "sellerRemainingCents": 18_000
            }],
            "pagination": { "totalPages": 1 }
        })),
        ("GET", "/order/o1/payout-preview") => ok(json!({
            "success": true,
            "data": { "seller": { "remaining": 18_000, "due": 18_000 }, "stripe": { "fee": 610 } }
        })),
        ("POST", "/order/o1/payout") => {
            let cents = req.json()["amountCents"].as_i64().unwrap_or(18_000);
            ok(json!({
                "success": true,
                "data": {
                    "transferId": "tr_1",
                    "amountCents": cents,
                    "sellerTransferredCents": cents,
                    "sellerRemainingCents": 18_000 - cents
                }
            }))
        }
        _ => status(404, json!({})),
    })
    .await;
    let (_session, client) = signed_in(&server);
    let ctrl = ListController::new(Arc::new(OrderSource::new(client)), no_debounce(OrderFilter::All));
    ctrl.fetch_page().await;

    let preview = ctrl.payout_preview("o1").await.unwrap();
    assert_eq!(preview.remaining_cents, 18_000);
    assert_eq!(preview.stripe_fee_cents, Some(610));

    let receipt = ctrl.send_payout("o1", Some(5_050)).await.unwrap();
    assert_eq!(receipt.transfer_id.as_deref(), Some("tr_1"));
    assert_eq!(server.hits("/order/o1/payout")[0].json()["amountCents"], 5_050);

    let order = &ctrl.visible_items()[0];
    assert_eq!(order.seller_transferred_cents, 5_050);
    assert_eq!(order.seller_remaining_cents, Some(12_950));
}

#[tokio::test]
async fn test_report_moderation_and_stats() {
    let server = StubServer::start(|req: &Recorded| match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/api/admin/reports") => ok(json!({
            "success": true,
            "data": {
                "reports": [
                    { "_id": "r1", "reason": "spam", "status": "pending", "targetType": "user",
                      "targetUserId": { "_id": "u9", "name": "Spammy" } },
                    { "_id": "r2", "reason": "copyright", "status": "pending", "targetType": "image",
                      "targetImageId": "img-3" }
                ],
                "pagination": { "total": 2 }
            }
        })),
        ("GET", "/api/admin/reports/stats") => ok(json!({
            "success": true,
            "data": {
                "byStatus": { "pending": 1, "under_review": 0, "resolved": 3, "dismissed": 1 },
                "needsAttention": 1,
                "sla": { "breached": 2 }
            }
        })),
        ("POST", "/api/admin/reports/r1/suspend") => ok(json!({ "success": true, "message": "User suspended" })),
        _ => status(404, json!({})),
    })
    .await;
    let (_session, client) = signed_in(&server);
    let ctrl = ListController::new(
        Arc::new(ReportSource::new(client)),
        no_debounce(ReportFilter::status(ReportStatus::Pending)),
    );
    ctrl.fetch_page().await;
    assert_eq!(ctrl.visible_items().len(), 2);
    assert_eq!(ctrl.visible_items()[0].target_label(), "Spammy");

    let listing = &server.hits("/api/admin/reports")[0];
    assert_eq!(listing.query.get("status").map(String::as_str), Some("pending"));

    let blank = ReportAction::Warn { message: " ".into() };
    assert!(matches!(
        ctrl.moderate("r1", &blank).await,
        Err(AdminError::Validation { .. })
    ));
    assert!(server.hits("/api/admin/reports/r1/warn").is_empty());

    let suspend = ReportAction::Suspend {
        days: 7,
        message: "Spam listings".into(),
    };
    let receipt = ctrl.moderate("r1", &suspend).await.unwrap();
    assert_eq!(receipt.message, "User suspended");
    let body = server.hits("/api/admin/reports/r1/suspend")[0].json();
    assert_eq!(body["days"], 7);
    assert_eq!(body["message"], "Spam listings");

    // resolved reports drop out of the pending queue
    let ids: Vec<_> = ctrl.visible_items().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["r2"]);

    let stats = ctrl.stats();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.urgent, 1);
    assert_eq!(stats.overdue, 2);
}

#[tokio::test]
async fn test_server_error_message_surfaces() {
    let server = StubServer::start(|_req: &Recorded| {
        status(500, json!({ "error": "Database unavailable" }))
    })
    .await;
    let (_session, client) = signed_in(&server);

    let err = client.get_order("o1").await.unwrap_err();
    assert!(matches!(err, AdminError::Api { status: 500, ref message } if message == "Database unavailable"));
    assert!(!err.is_auth_error());
}
